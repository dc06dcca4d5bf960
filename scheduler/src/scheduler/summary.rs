use super::{
    events::{Event, EventKind, EventSink},
    Pid, Tick,
};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessStats {
    pub pid: Pid,
    pub cpu_total: u32,
    pub dispatches: u32,
    pub io_requests: u32,
    /// Also the turnaround, since every process arrives at t=0.
    pub finished_at: Option<Tick>,
}

/// Per-process totals gathered from the event stream.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    processes: Vec<ProcessStats>,
    final_clock: Option<Tick>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn processes(&self) -> &[ProcessStats] {
        &self.processes
    }

    pub fn final_clock(&self) -> Option<Tick> {
        self.final_clock
    }

    pub fn average_turnaround(&self) -> Option<f64> {
        let finished: Vec<Tick> = self
            .processes
            .iter()
            .filter_map(|stats| stats.finished_at)
            .collect();
        if finished.is_empty() {
            return None;
        }
        Some(finished.iter().sum::<Tick>() as f64 / finished.len() as f64)
    }

    fn stats_mut(&mut self, pid: Pid) -> Option<&mut ProcessStats> {
        self.processes.get_mut(pid.get())
    }
}

impl EventSink for RunSummary {
    fn emit(&mut self, event: Event) {
        match event.kind {
            EventKind::ProcessCreated { pid, cpu_total, .. } => self.processes.push(ProcessStats {
                pid,
                cpu_total,
                dispatches: 0,
                io_requests: 0,
                finished_at: None,
            }),
            EventKind::Dispatched { pid, .. } => {
                if let Some(stats) = self.stats_mut(pid) {
                    stats.dispatches += 1;
                }
            }
            EventKind::IoRequested { pid, .. } => {
                if let Some(stats) = self.stats_mut(pid) {
                    stats.io_requests += 1;
                }
            }
            EventKind::Finished { pid } => {
                if let Some(stats) = self.stats_mut(pid) {
                    stats.finished_at = Some(event.clock);
                }
            }
            EventKind::SimulationComplete { final_clock, .. } => {
                self.final_clock = Some(final_clock)
            }
            EventKind::Preempted { .. } | EventKind::IoCompleted { .. } => {}
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PID  | CPU | Dispatches | I/O | Finished")?;
        for stats in &self.processes {
            let finished = stats
                .finished_at
                .map_or_else(|| "-".to_owned(), |clock| format!("t={clock}"));
            writeln!(
                f,
                "{:<4} | {:>3} | {:>10} | {:>3} | {}",
                stats.pid.to_string(),
                stats.cpu_total,
                stats.dispatches,
                stats.io_requests,
                finished
            )?;
        }
        if let Some(average) = self.average_turnaround() {
            writeln!(f, "Average turnaround: {average:.2}")?;
        }
        Ok(())
    }
}
