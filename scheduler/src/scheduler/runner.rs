use std::{collections::VecDeque, io};

use super::{
    display::DisplayTerminal,
    events::{Event, EventSink},
    Scheduler,
};

pub enum RunnerEvent {
    Quit,
    Pause,
    Resume,
    Step,
    None,
}

/// The most recent transcript lines, oldest first.
pub struct EventLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl EventLog {
    pub const DEFAULT_CAPACITY: usize = 10;

    pub fn new() -> Self {
        EventLog::with_capacity(EventLog::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &String> {
        self.lines.iter()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        EventLog::new()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: Event) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(event.to_string());
    }
}

/// Drives a scheduler one iteration per display tick.
pub struct ProcessRunner<S> {
    terminal: DisplayTerminal,
    scheduler: S,
    log: EventLog,
    paused: bool,
}

impl<S: Scheduler> ProcessRunner<S> {
    pub fn new(scheduler: S, log: EventLog) -> Result<Self, io::Error> {
        let terminal = DisplayTerminal::new()?;

        Ok(Self {
            terminal,
            scheduler,
            log,
            paused: false,
        })
    }

    fn step(&mut self) {
        self.scheduler.step(&mut self.log);
    }

    // Returns false if the program should quit
    pub fn run(&mut self) -> Result<bool, io::Error> {
        if !self.paused {
            self.step();
        }
        self.terminal
            .draw(&self.scheduler, self.paused, self.log.lines())?;

        match self.terminal.get_input() {
            RunnerEvent::Quit => return Ok(false),
            RunnerEvent::Pause if !self.paused => self.paused = true,
            RunnerEvent::Resume if self.paused => self.paused = false,
            RunnerEvent::Step if self.paused => self.step(),
            _ => {}
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{EventKind, Pid};

    #[test]
    fn event_log_keeps_the_newest_lines() {
        let mut log = EventLog::with_capacity(2);
        for n in 0..3 {
            log.emit(Event::new(n, EventKind::Finished { pid: Pid::new(n as usize) }));
        }

        let lines: Vec<_> = log.lines().cloned().collect();
        assert_eq!(lines, vec!["[t=01] P1 finished", "[t=02] P2 finished"]);
    }
}
