use super::{
    config::Config,
    events::{Event, EventKind, EventSink},
    io::Device,
    random::RandomSource,
    state::SimState,
    Pid, ProcessStatus,
};

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The process used up its CPU demand and is FINISHED.
    Done,
    /// The process asked for I/O and already sits on a device queue.
    Blocked,
    /// The quantum ran out with work left. The caller must requeue it.
    Preempted,
}

/// Runs `pid` for up to one quantum.
///
/// Every CPU tick advances the clock, burns one unit of the process's demand
/// and then gives the devices their tick. Only after that can the process ask
/// for I/O, which forfeits the rest of the quantum.
///
/// Returns `None` if `pid` is not in the table.
pub fn execute_quantum(
    state: &mut SimState,
    config: &Config,
    pid: Pid,
    random: &mut dyn RandomSource,
    sink: &mut dyn EventSink,
) -> Option<Outcome> {
    let clock = state.table.clock();
    let pcb = state.table.get_mut(pid)?;
    if pcb.status() != ProcessStatus::Ready {
        log::warn!("dispatching {pid} while it is {}", pcb.status());
    }

    pcb.set_status(ProcessStatus::Running);
    sink.emit(Event::new(
        clock,
        EventKind::Dispatched {
            pid,
            cpu_remaining: pcb.cpu_remaining(),
            priority: pcb.priority(),
        },
    ));

    let mut consumed = 0;
    let mut remaining = pcb.cpu_remaining();
    while consumed < config.quantum && remaining > 0 {
        let clock = state.table.advance_clock();
        remaining = state.table.get_mut(pid)?.consume_cpu();
        consumed += 1;

        state.io.tick(&mut state.table, &mut state.ready, sink);

        if remaining > 0 && random.trigger_io(config.io_chance) {
            let device = draw_device(random);
            let range = config.io_range(device);
            let duration = random.uniform(range.min, range.max);

            state.table.get_mut(pid)?.block_on(device, duration);
            if let Err(err) = state.io.enqueue(device, pid) {
                log::error!("{err}");
            }
            sink.emit(Event::new(
                clock,
                EventKind::IoRequested {
                    pid,
                    device,
                    duration,
                },
            ));
            return Some(Outcome::Blocked);
        }
    }

    let clock = state.table.clock();
    let pcb = state.table.get_mut(pid)?;
    if pcb.cpu_remaining() == 0 {
        pcb.set_status(ProcessStatus::Finished);
        sink.emit(Event::new(clock, EventKind::Finished { pid }));
        Some(Outcome::Done)
    } else {
        pcb.set_status(ProcessStatus::Ready);
        sink.emit(Event::new(
            clock,
            EventKind::Preempted {
                pid,
                cpu_remaining: pcb.cpu_remaining(),
            },
        ));
        Some(Outcome::Preempted)
    }
}

fn draw_device(random: &mut dyn RandomSource) -> Device {
    match random.uniform(1, 3) {
        1 => Device::Disk,
        2 => Device::Tape,
        _ => Device::Printer,
    }
}
