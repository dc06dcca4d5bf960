use super::{io::Device, Pid, Priority, Tick};
use serde::Serialize;
use std::{
    fmt,
    io::{self, Write},
};

/// Something the scheduler did, stamped with the clock value it happened at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Event {
    pub clock: Tick,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    ProcessCreated {
        pid: Pid,
        parent: Option<Pid>,
        cpu_total: u32,
    },
    Dispatched {
        pid: Pid,
        cpu_remaining: u32,
        priority: Priority,
    },
    Preempted {
        pid: Pid,
        cpu_remaining: u32,
    },
    Finished {
        pid: Pid,
    },
    IoRequested {
        pid: Pid,
        device: Device,
        duration: u32,
    },
    IoCompleted {
        pid: Pid,
        device: Device,
        destination: Priority,
    },
    SimulationComplete {
        final_clock: Tick,
        process_count: usize,
    },
}

impl Event {
    pub fn new(clock: Tick, kind: EventKind) -> Self {
        Self { clock, kind }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let EventKind::SimulationComplete {
            final_clock,
            process_count,
        } = self.kind
        {
            return write!(
                f,
                "=== Done: all {process_count} processes finished at t={final_clock} ==="
            );
        }

        write!(f, "[t={:02}] ", self.clock)?;
        match self.kind {
            EventKind::ProcessCreated {
                pid,
                parent,
                cpu_total,
            } => {
                let parent = parent.map_or_else(|| "none".to_owned(), |parent| parent.to_string());
                write!(f, "Created {pid} (parent = {parent}, CPU = {cpu_total}) -> HIGH queue")
            }
            EventKind::Dispatched {
                pid,
                cpu_remaining,
                priority,
            } => write!(
                f,
                "Running {pid} (remaining = {cpu_remaining}, priority = {priority})"
            ),
            EventKind::Preempted { pid, cpu_remaining } => {
                write!(f, "{pid} preempted (remaining = {cpu_remaining})")
            }
            EventKind::Finished { pid } => write!(f, "{pid} finished"),
            EventKind::IoRequested {
                pid,
                device,
                duration,
            } => write!(f, "{pid} requested I/O ({device}) for {duration}"),
            EventKind::IoCompleted {
                pid,
                device,
                destination,
            } => write!(f, "{pid} completed I/O ({device}) -> {destination} queue"),
            EventKind::SimulationComplete { .. } => unreachable!(),
        }
    }
}

/// Receives the ordered event stream of a simulation.
pub trait EventSink {
    fn emit(&mut self, event: Event);
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) {
        self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: Event) {
        (**self).emit(event);
    }
}

impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: Event) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

/// Drops every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: Event) {}
}

/// Writes one transcript line per event.
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> EventSink for ConsoleSink<W> {
    fn emit(&mut self, event: Event) {
        if let EventKind::SimulationComplete { .. } = event.kind {
            report(writeln!(self.out));
        }
        report(writeln!(self.out, "{event}"));
    }
}

/// Writes one JSON object per event per line.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> EventSink for JsonSink<W> {
    fn emit(&mut self, event: Event) {
        match serde_json::to_writer(&mut self.out, &event) {
            Ok(()) => report(writeln!(self.out)),
            Err(err) => log::error!("failed to serialise event at t={}: {err}", event.clock),
        }
    }
}

fn report(result: io::Result<()>) {
    if let Err(err) = result {
        log::error!("failed to write event: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_lines() {
        let created = Event::new(
            0,
            EventKind::ProcessCreated {
                pid: Pid::new(1),
                parent: Some(Pid::new(0)),
                cpu_total: 12,
            },
        );
        assert_eq!(
            created.to_string(),
            "[t=00] Created P1 (parent = P0, CPU = 12) -> HIGH queue"
        );

        let completed = Event::new(
            14,
            EventKind::IoCompleted {
                pid: Pid::new(3),
                device: Device::Disk,
                destination: Priority::Low,
            },
        );
        assert_eq!(completed.to_string(), "[t=14] P3 completed I/O (disk) -> LOW queue");

        let done = Event::new(
            99,
            EventKind::SimulationComplete {
                final_clock: 99,
                process_count: 8,
            },
        );
        assert_eq!(
            done.to_string(),
            "=== Done: all 8 processes finished at t=99 ==="
        );
    }

    #[test]
    fn json_lines_are_tagged() {
        let mut out = Vec::new();
        let mut sink = JsonSink::new(&mut out);
        sink.emit(Event::new(
            5,
            EventKind::IoRequested {
                pid: Pid::new(2),
                device: Device::Printer,
                duration: 7,
            },
        ));
        sink.emit(Event::new(
            0,
            EventKind::ProcessCreated {
                pid: Pid::new(0),
                parent: None,
                cpu_total: 9,
            },
        ));

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            r#"{"clock":5,"event":"io_requested","pid":2,"device":"printer","duration":7}"#
        );
        assert_eq!(
            lines[1],
            r#"{"clock":0,"event":"process_created","pid":0,"parent":null,"cpu_total":9}"#
        );
    }

    #[test]
    fn console_sink_writes_each_event() {
        let mut out = Vec::new();
        {
            let mut sink = ConsoleSink::new(&mut out);
            sink.emit(Event::new(3, EventKind::Finished { pid: Pid::new(0) }));
        }
        assert_eq!(String::from_utf8(out).unwrap(), "[t=03] P0 finished\n");
    }
}
