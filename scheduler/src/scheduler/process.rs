use super::{io::Device, Tick};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Pid(usize);

impl Pid {
    pub fn new(pid: usize) -> Self {
        Pid(pid)
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::High => "HIGH",
            Priority::Low => "LOW",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    Ready,
    Running,
    Blocked,
    Finished,
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProcessStatus::Ready => "READY",
            ProcessStatus::Running => "RUNNING",
            ProcessStatus::Blocked => "BLOCKED",
            ProcessStatus::Finished => "FINISHED",
        })
    }
}

/// Process control block of one simulated process.
#[derive(Debug, Clone)]
pub struct Pcb {
    pid: Pid,
    parent: Option<Pid>,
    priority: Priority,
    status: ProcessStatus,
    cpu_total: u32,
    cpu_remaining: u32,
    io_kind: Option<Device>,
    io_remaining: u32,
}

impl Pcb {
    pub fn new(pid: Pid, parent: Option<Pid>, cpu_total: u32) -> Self {
        Self {
            pid,
            parent,
            priority: Priority::High,
            status: ProcessStatus::Ready,
            cpu_total,
            cpu_remaining: cpu_total,
            io_kind: None,
            io_remaining: 0,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn parent(&self) -> Option<Pid> {
        self.parent
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn status(&self) -> ProcessStatus {
        self.status
    }

    pub fn cpu_total(&self) -> u32 {
        self.cpu_total
    }

    pub fn cpu_remaining(&self) -> u32 {
        self.cpu_remaining
    }

    /// The device this process waits on, only set while blocked.
    pub fn io_kind(&self) -> Option<Device> {
        self.io_kind
    }

    pub fn io_remaining(&self) -> u32 {
        self.io_remaining
    }

    pub(super) fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    pub(super) fn set_status(&mut self, status: ProcessStatus) {
        self.status = status;
    }

    /// Burns one tick of CPU and returns what is still owed.
    pub(super) fn consume_cpu(&mut self) -> u32 {
        self.cpu_remaining = self.cpu_remaining.saturating_sub(1);
        self.cpu_remaining
    }

    pub(super) fn block_on(&mut self, device: Device, duration: u32) {
        self.status = ProcessStatus::Blocked;
        self.io_kind = Some(device);
        self.io_remaining = duration;
    }

    /// Advances the pending I/O by one tick and returns what is still owed.
    pub(super) fn advance_io(&mut self) -> u32 {
        self.io_remaining = self.io_remaining.saturating_sub(1);
        self.io_remaining
    }

    pub(super) fn complete_io(&mut self, priority: Priority) {
        self.io_kind = None;
        self.status = ProcessStatus::Ready;
        self.priority = priority;
    }
}

/// Owns every PCB, indexed by pid, and the global clock.
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    pcbs: Vec<Pcb>,
    clock: Tick,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the next process. The first one is the root, every later one is its child.
    pub fn spawn(&mut self, cpu_total: u32) -> &Pcb {
        let pid = Pid::new(self.pcbs.len());
        let parent = if self.pcbs.is_empty() {
            None
        } else {
            Some(Pid::new(0))
        };

        self.pcbs.push(Pcb::new(pid, parent, cpu_total));
        &self.pcbs[pid.get()]
    }

    pub fn get(&self, pid: Pid) -> Option<&Pcb> {
        self.pcbs.get(pid.get())
    }

    pub(super) fn get_mut(&mut self, pid: Pid) -> Option<&mut Pcb> {
        self.pcbs.get_mut(pid.get())
    }

    pub fn processes(&self) -> &[Pcb] {
        &self.pcbs
    }

    pub fn len(&self) -> usize {
        self.pcbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pcbs.is_empty()
    }

    pub fn clock(&self) -> Tick {
        self.clock
    }

    pub(super) fn advance_clock(&mut self) -> Tick {
        self.clock += 1;
        self.clock
    }
}
