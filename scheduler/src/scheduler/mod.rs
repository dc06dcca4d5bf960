mod config;
mod dispatcher;
mod display;
mod error;
mod events;
mod feedback;
mod io;
mod process;
mod queue;
mod random;
mod runner;
mod state;
mod summary;

pub use config::{Config, OutputMode, TickRange, USAGE};
pub use dispatcher::{execute_quantum, Outcome};
pub use error::{ConfigError, QueueOverflow};
pub use events::{ConsoleSink, Event, EventKind, EventSink, JsonSink, NullSink};
pub use feedback::FeedbackScheduler;
pub use io::{Device, IoSubsystem};
pub use process::{Pcb, Pid, Priority, ProcessStatus, ProcessTable};
pub use queue::{ProcessQueue, ReadyQueues};
pub use random::{RandomSource, SeededRandom};
pub use runner::{EventLog, ProcessRunner};
pub use state::{QueueSnapshot, SimState};
pub use summary::{ProcessStats, RunSummary};

/// Simulated time, in ticks.
pub type Tick = u64;

pub trait Scheduler {
    const NAME: &'static str;

    fn processes(&self) -> &[Pcb];
    fn clock(&self) -> Tick;
    fn queues(&self) -> QueueSnapshot;
    fn is_finished(&self) -> bool;
    /// Runs one iteration of the scheduling loop. Returns false once there is nothing left to run.
    fn step(&mut self, sink: &mut dyn EventSink) -> bool;
}
