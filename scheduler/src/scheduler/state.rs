use super::{
    events::EventSink,
    io::{Device, IoSubsystem},
    queue::{ProcessQueue, ReadyQueues},
    Pid, Priority, ProcessTable, Tick,
};

/// Everything the simulation mutates: the PCBs, the clock and the five queues.
#[derive(Debug, Clone)]
pub struct SimState {
    pub table: ProcessTable,
    pub ready: ReadyQueues,
    pub io: IoSubsystem,
}

/// Names and contents of the five queues, in FIFO order.
pub type QueueSnapshot = Vec<(&'static str, Vec<Pid>)>;

impl SimState {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: ProcessTable::new(),
            ready: ReadyQueues::with_capacity(capacity),
            io: IoSubsystem::with_capacity(capacity),
        }
    }

    /// One clock tick with nothing on the CPU. Devices still make progress.
    pub fn idle_tick(&mut self, sink: &mut dyn EventSink) -> Tick {
        let clock = self.table.advance_clock();
        log::trace!("t={clock}: idle tick");
        self.io.tick(&mut self.table, &mut self.ready, sink);
        clock
    }

    pub fn queue_snapshot(&self) -> QueueSnapshot {
        let collect = |queue: &ProcessQueue| queue.iter().collect::<Vec<_>>();
        vec![
            ("high", collect(self.ready.queue(Priority::High))),
            ("low", collect(self.ready.queue(Priority::Low))),
            ("disk", collect(self.io.queue(Device::Disk))),
            ("tape", collect(self.io.queue(Device::Tape))),
            ("printer", collect(self.io.queue(Device::Printer))),
        ]
    }

    /// Checks that every process sits where its status says it should.
    ///
    /// READY means exactly one ready queue, BLOCKED means exactly its own
    /// device queue, RUNNING and FINISHED mean no queue at all. At most one
    /// process is RUNNING.
    #[cfg(test)]
    pub fn check_invariants(&self) -> Result<(), String> {
        use super::ProcessStatus;

        let snapshot = self.queue_snapshot();
        let mut running = 0;

        for pcb in self.table.processes() {
            let pid = pcb.pid();
            let homes: Vec<&str> = snapshot
                .iter()
                .flat_map(|(name, pids)| {
                    pids.iter()
                        .filter(move |&&queued| queued == pid)
                        .map(move |_| *name)
                })
                .collect();

            let expected: Option<&str> = match pcb.status() {
                ProcessStatus::Ready => match pcb.priority() {
                    Priority::High => Some("high"),
                    Priority::Low => Some("low"),
                },
                ProcessStatus::Blocked => match pcb.io_kind() {
                    Some(Device::Disk) => Some("disk"),
                    Some(Device::Tape) => Some("tape"),
                    Some(Device::Printer) => Some("printer"),
                    None => return Err(format!("{} blocked without a device", pcb.pid())),
                },
                ProcessStatus::Running => {
                    running += 1;
                    None
                }
                ProcessStatus::Finished => None,
            };

            let expected: Vec<&str> = expected.into_iter().collect();
            if homes != expected {
                return Err(format!(
                    "{} is {} ({}) but queued in {:?}",
                    pcb.pid(),
                    pcb.status(),
                    pcb.priority(),
                    homes
                ));
            }
        }

        if running > 1 {
            return Err(format!("{running} processes running at once"));
        }
        Ok(())
    }
}
