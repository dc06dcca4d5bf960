use super::{
    error::QueueOverflow,
    events::{Event, EventKind, EventSink},
    queue::{ProcessQueue, ReadyQueues},
    Pid, Priority, ProcessStatus, ProcessTable,
};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    Disk,
    Tape,
    Printer,
}

impl Device {
    /// Service order within a tick.
    pub const ALL: [Device; 3] = [Device::Disk, Device::Tape, Device::Printer];

    /// The ready queue a process lands in once its I/O on this device completes.
    /// Disk waits demote, tape and printer waits promote.
    pub fn completion_priority(self) -> Priority {
        match self {
            Device::Disk => Priority::Low,
            Device::Tape | Device::Printer => Priority::High,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Device::Disk => "disk",
            Device::Tape => "tape",
            Device::Printer => "printer",
        })
    }
}

/// The three device queues.
#[derive(Debug, Clone)]
pub struct IoSubsystem {
    disk: ProcessQueue,
    tape: ProcessQueue,
    printer: ProcessQueue,
}

impl IoSubsystem {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            disk: ProcessQueue::with_capacity(capacity),
            tape: ProcessQueue::with_capacity(capacity),
            printer: ProcessQueue::with_capacity(capacity),
        }
    }

    pub fn queue(&self, device: Device) -> &ProcessQueue {
        match device {
            Device::Disk => &self.disk,
            Device::Tape => &self.tape,
            Device::Printer => &self.printer,
        }
    }

    fn queue_mut(&mut self, device: Device) -> &mut ProcessQueue {
        match device {
            Device::Disk => &mut self.disk,
            Device::Tape => &mut self.tape,
            Device::Printer => &mut self.printer,
        }
    }

    pub fn enqueue(&mut self, device: Device, pid: Pid) -> Result<(), QueueOverflow> {
        self.queue_mut(device).push(pid)
    }

    pub fn is_idle(&self) -> bool {
        Device::ALL.iter().all(|&device| self.queue(device).is_empty())
    }

    /// Advances every blocked process by one I/O tick, disk first, then tape, then printer.
    pub fn tick(
        &mut self,
        table: &mut ProcessTable,
        ready: &mut ReadyQueues,
        sink: &mut dyn EventSink,
    ) {
        for device in Device::ALL {
            self.tick_device(device, table, ready, sink);
        }
    }

    fn tick_device(
        &mut self,
        device: Device,
        table: &mut ProcessTable,
        ready: &mut ReadyQueues,
        sink: &mut dyn EventSink,
    ) {
        let clock = table.clock();
        let queue = self.queue_mut(device);

        // Only the residents present at the start of the pass get a tick.
        for _ in 0..queue.len() {
            let Some(pid) = queue.pop() else {
                break;
            };

            let Some(pcb) = table.get_mut(pid) else {
                log::error!("{device} queue held unknown {pid}, dropping it");
                continue;
            };

            if pcb.status() != ProcessStatus::Blocked {
                log::warn!("{pid} is {} but still queued on {device}", pcb.status());
                requeue(queue, pid);
                continue;
            }

            if pcb.advance_io() > 0 {
                requeue(queue, pid);
                continue;
            }

            let destination = device.completion_priority();
            pcb.complete_io(destination);
            if let Err(err) = ready.push(destination, pid) {
                log::error!("{err}");
            }
            sink.emit(Event::new(
                clock,
                EventKind::IoCompleted {
                    pid,
                    device,
                    destination,
                },
            ));
        }
    }
}

fn requeue(queue: &mut ProcessQueue, pid: Pid) {
    if let Err(err) = queue.push(pid) {
        log::error!("{err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::events::NullSink;

    fn blocked_table(blocks: &[(Device, u32)]) -> (ProcessTable, IoSubsystem) {
        let mut table = ProcessTable::new();
        let mut io = IoSubsystem::with_capacity(blocks.len());
        for &(device, duration) in blocks {
            let pid = table.spawn(10).pid();
            table.get_mut(pid).unwrap().block_on(device, duration);
            io.enqueue(device, pid).unwrap();
        }
        (table, io)
    }

    #[test]
    fn disk_completion_demotes_to_low() {
        let (mut table, mut io) = blocked_table(&[(Device::Disk, 1)]);
        let mut ready = ReadyQueues::with_capacity(1);
        let mut events: Vec<Event> = Vec::new();

        io.tick(&mut table, &mut ready, &mut events);

        let pcb = table.get(Pid::new(0)).unwrap();
        assert_eq!(pcb.status(), ProcessStatus::Ready);
        assert_eq!(pcb.priority(), Priority::Low);
        assert_eq!(pcb.io_kind(), None);
        assert!(ready.queue(Priority::Low).contains(Pid::new(0)));
        assert!(io.is_idle());
        assert_eq!(
            events,
            vec![Event::new(
                0,
                EventKind::IoCompleted {
                    pid: Pid::new(0),
                    device: Device::Disk,
                    destination: Priority::Low,
                }
            )]
        );
    }

    #[test]
    fn tape_and_printer_completion_promote_to_high() {
        let (mut table, mut io) = blocked_table(&[(Device::Tape, 1), (Device::Printer, 1)]);
        table.get_mut(Pid::new(0)).unwrap().set_priority(Priority::Low);
        table.get_mut(Pid::new(1)).unwrap().set_priority(Priority::Low);
        let mut ready = ReadyQueues::with_capacity(2);

        io.tick(&mut table, &mut ready, &mut NullSink);

        for pcb in table.processes() {
            assert_eq!(pcb.priority(), Priority::High);
            assert_eq!(pcb.status(), ProcessStatus::Ready);
        }
        assert_eq!(
            ready.queue(Priority::High).iter().collect::<Vec<_>>(),
            vec![Pid::new(0), Pid::new(1)]
        );
    }

    #[test]
    fn still_blocked_processes_keep_their_order() {
        let (mut table, mut io) =
            blocked_table(&[(Device::Disk, 3), (Device::Disk, 1), (Device::Disk, 2)]);
        let mut ready = ReadyQueues::with_capacity(3);

        io.tick(&mut table, &mut ready, &mut NullSink);

        assert_eq!(
            io.queue(Device::Disk).iter().collect::<Vec<_>>(),
            vec![Pid::new(0), Pid::new(2)]
        );
        assert_eq!(table.get(Pid::new(0)).unwrap().io_remaining(), 2);
        assert_eq!(table.get(Pid::new(2)).unwrap().io_remaining(), 1);
        assert!(ready.queue(Priority::Low).contains(Pid::new(1)));
    }

    #[test]
    fn devices_complete_in_fixed_order() {
        let (mut table, mut io) =
            blocked_table(&[(Device::Printer, 1), (Device::Tape, 1), (Device::Disk, 1)]);
        let mut ready = ReadyQueues::with_capacity(3);
        let mut events: Vec<Event> = Vec::new();

        io.tick(&mut table, &mut ready, &mut events);

        let devices: Vec<_> = events
            .iter()
            .map(|event| match event.kind {
                EventKind::IoCompleted { device, .. } => device,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(devices, vec![Device::Disk, Device::Tape, Device::Printer]);
    }

    #[test]
    fn stale_entries_are_requeued_untouched() {
        let (mut table, mut io) = blocked_table(&[(Device::Tape, 4)]);
        table.get_mut(Pid::new(0)).unwrap().set_status(ProcessStatus::Ready);
        let mut ready = ReadyQueues::with_capacity(1);
        let mut events: Vec<Event> = Vec::new();

        io.tick(&mut table, &mut ready, &mut events);

        assert!(events.is_empty());
        assert!(io.queue(Device::Tape).contains(Pid::new(0)));
        assert_eq!(table.get(Pid::new(0)).unwrap().io_remaining(), 4);
        assert!(ready.is_empty());
    }
}
