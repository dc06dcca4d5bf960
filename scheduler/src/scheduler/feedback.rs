use super::{
    config::Config,
    dispatcher::{execute_quantum, Outcome},
    error::ConfigError,
    events::{Event, EventKind, EventSink},
    random::RandomSource,
    state::{QueueSnapshot, SimState},
    Pcb, Priority, Scheduler, Tick,
};

/// Round robin over two ready queues with feedback between them.
///
/// Processes start HIGH. Running out a full quantum or finishing a disk wait
/// demotes them to LOW, and finishing a tape or printer wait is the only way
/// back up to HIGH. HIGH is always served first.
pub struct FeedbackScheduler<R> {
    config: Config,
    state: SimState,
    random: R,
    finished: usize,
}

impl<R: RandomSource> FeedbackScheduler<R> {
    /// Validates `config`, then creates the whole population on the HIGH queue.
    pub fn new(
        config: Config,
        mut random: R,
        sink: &mut dyn EventSink,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!(
            "{} processes, quantum {}, cpu {}, I/O chance {}%",
            config.processes,
            config.quantum,
            config.cpu,
            config.io_chance
        );

        let mut state = SimState::with_capacity(config.processes);
        for _ in 0..config.processes {
            let cpu_total = random.uniform(config.cpu.min, config.cpu.max);
            let pcb = state.table.spawn(cpu_total);
            let (pid, parent) = (pcb.pid(), pcb.parent());

            if let Err(err) = state.ready.push(Priority::High, pid) {
                log::error!("{err}");
            }
            sink.emit(Event::new(
                state.table.clock(),
                EventKind::ProcessCreated {
                    pid,
                    parent,
                    cpu_total,
                },
            ));
        }

        Ok(Self {
            config,
            state,
            random,
            finished: 0,
        })
    }

    /// Runs to completion and returns the final clock.
    pub fn run(&mut self, sink: &mut dyn EventSink) -> Tick {
        while self.step(sink) {}
        self.state.table.clock()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn finished_count(&self) -> usize {
        self.finished
    }

    #[cfg(test)]
    pub(super) fn state(&self) -> &SimState {
        &self.state
    }

    fn complete(&mut self, sink: &mut dyn EventSink) {
        let final_clock = self.state.table.clock();
        log::info!("all {} processes finished at t={final_clock}", self.finished);
        sink.emit(Event::new(
            final_clock,
            EventKind::SimulationComplete {
                final_clock,
                process_count: self.state.table.len(),
            },
        ));
    }
}

impl<R: RandomSource> Scheduler for FeedbackScheduler<R> {
    const NAME: &'static str = "Multilevel Feedback Queue";

    fn processes(&self) -> &[Pcb] {
        self.state.table.processes()
    }

    fn clock(&self) -> Tick {
        self.state.table.clock()
    }

    fn queues(&self) -> QueueSnapshot {
        self.state.queue_snapshot()
    }

    fn is_finished(&self) -> bool {
        self.finished == self.state.table.len()
    }

    fn step(&mut self, sink: &mut dyn EventSink) -> bool {
        if self.is_finished() {
            return false;
        }

        let Some(pid) = self.state.ready.pop_next() else {
            if self.state.io.is_idle() {
                log::error!(
                    "nothing ready or blocked with {} of {} processes unfinished, halting",
                    self.state.table.len() - self.finished,
                    self.state.table.len()
                );
                return false;
            }
            self.state.idle_tick(sink);
            return true;
        };

        log::debug!("t={}: selected {pid}", self.state.table.clock());
        match execute_quantum(
            &mut self.state,
            &self.config,
            pid,
            &mut self.random,
            sink,
        ) {
            Some(Outcome::Done) => self.finished += 1,
            Some(Outcome::Blocked) => {}
            Some(Outcome::Preempted) => {
                if let Some(pcb) = self.state.table.get_mut(pid) {
                    pcb.set_priority(Priority::Low);
                }
                if let Err(err) = self.state.ready.push(Priority::Low, pid) {
                    log::error!("{err}");
                }
            }
            None => log::error!("ready queue held unknown {pid}"),
        }

        if self.is_finished() {
            self.complete(sink);
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{
        config::TickRange,
        events::NullSink,
        io::Device,
        random::{ScriptedRandom, SeededRandom},
        Pid, ProcessStatus,
    };

    fn config(processes: usize, cpu: TickRange) -> Config {
        Config {
            processes,
            cpu,
            ..Config::default()
        }
    }

    #[test]
    fn creates_population_on_high_queue() {
        let mut events: Vec<Event> = Vec::new();
        let random = ScriptedRandom::new(&[8, 20, 13], &[]);
        let scheduler =
            FeedbackScheduler::new(config(3, TickRange::new(8, 25)), random, &mut events).unwrap();

        let totals: Vec<_> = scheduler.processes().iter().map(Pcb::cpu_total).collect();
        assert_eq!(totals, vec![8, 20, 13]);
        assert_eq!(
            scheduler.queues()[0],
            ("high", vec![Pid::new(0), Pid::new(1), Pid::new(2)])
        );
        assert_eq!(
            events[1],
            Event::new(
                0,
                EventKind::ProcessCreated {
                    pid: Pid::new(1),
                    parent: Some(Pid::new(0)),
                    cpu_total: 20
                }
            )
        );
        assert_eq!(scheduler.clock(), 0);
    }

    #[test]
    fn invalid_config_creates_nothing() {
        let mut events: Vec<Event> = Vec::new();
        let result = FeedbackScheduler::new(
            Config {
                quantum: 0,
                ..Config::default()
            },
            ScriptedRandom::default(),
            &mut events,
        );

        assert!(matches!(
            result,
            Err(ConfigError::NonPositive { name: "quantum" })
        ));
        assert!(events.is_empty());
    }

    #[test]
    fn single_process_without_io() {
        let mut events: Vec<Event> = Vec::new();
        let mut scheduler = FeedbackScheduler::new(
            Config {
                io_chance: 0,
                ..config(1, TickRange::new(5, 5))
            },
            ScriptedRandom::default(),
            &mut events,
        )
        .unwrap();

        assert_eq!(scheduler.run(&mut events), 5);

        let pid = Pid::new(0);
        assert_eq!(
            events,
            vec![
                Event::new(
                    0,
                    EventKind::ProcessCreated {
                        pid,
                        parent: None,
                        cpu_total: 5
                    }
                ),
                Event::new(
                    0,
                    EventKind::Dispatched {
                        pid,
                        cpu_remaining: 5,
                        priority: Priority::High
                    }
                ),
                Event::new(
                    3,
                    EventKind::Preempted {
                        pid,
                        cpu_remaining: 2
                    }
                ),
                Event::new(
                    3,
                    EventKind::Dispatched {
                        pid,
                        cpu_remaining: 2,
                        priority: Priority::Low
                    }
                ),
                Event::new(5, EventKind::Finished { pid }),
                Event::new(
                    5,
                    EventKind::SimulationComplete {
                        final_clock: 5,
                        process_count: 1
                    }
                ),
            ]
        );
    }

    #[test]
    fn disk_wait_comes_back_low() {
        let mut events: Vec<Event> = Vec::new();
        // cpu 10, then device draw 1 (disk) with duration 3.
        let random = ScriptedRandom::new(&[10, 1, 3], &[true]);
        let mut scheduler =
            FeedbackScheduler::new(config(1, TickRange::new(10, 10)), random, &mut events)
                .unwrap();
        let pid = Pid::new(0);

        assert!(scheduler.step(&mut events));
        assert_eq!(scheduler.clock(), 1);
        let pcb = &scheduler.processes()[0];
        assert_eq!(pcb.status(), ProcessStatus::Blocked);
        assert_eq!(pcb.io_remaining(), 3);

        // Three idle ticks drain the disk wait.
        for expected_clock in 2..=4 {
            assert!(scheduler.step(&mut events));
            assert_eq!(scheduler.clock(), expected_clock);
        }

        let pcb = &scheduler.processes()[0];
        assert_eq!(pcb.status(), ProcessStatus::Ready);
        assert_eq!(pcb.priority(), Priority::Low);
        assert_eq!(scheduler.queues()[1], ("low", vec![pid]));
        assert_eq!(
            events.last(),
            Some(&Event::new(
                4,
                EventKind::IoCompleted {
                    pid,
                    device: Device::Disk,
                    destination: Priority::Low
                }
            ))
        );

        // Nine ticks of CPU left: 4..7, 7..10, 10..13.
        assert_eq!(scheduler.run(&mut events), 13);
    }

    #[test]
    fn short_job_finishes_while_long_job_cycles() {
        let mut events: Vec<Event> = Vec::new();
        let random = ScriptedRandom::new(&[1, 100], &[]);
        let mut scheduler =
            FeedbackScheduler::new(config(2, TickRange::new(1, 100)), random, &mut events)
                .unwrap();

        assert!(scheduler.step(&mut events));
        assert_eq!(scheduler.finished_count(), 1);
        assert_eq!(scheduler.processes()[0].status(), ProcessStatus::Finished);
        assert_eq!(scheduler.processes()[1].status(), ProcessStatus::Ready);

        let mut priorities_seen = Vec::new();
        while scheduler.step(&mut events) {
            assert!(scheduler.finished_count() <= 2);
            priorities_seen.push(scheduler.processes()[1].priority());
        }

        assert_eq!(scheduler.finished_count(), 2);
        assert_eq!(scheduler.clock(), 101);
        assert!(priorities_seen.contains(&Priority::Low));
        assert!(!scheduler.step(&mut events));
        assert_eq!(scheduler.finished_count(), 2);

        let completions = events
            .iter()
            .filter(|event| matches!(event.kind, EventKind::SimulationComplete { .. }))
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn invariants_hold_after_every_step() {
        for seed in 1..=40 {
            let mut events: Vec<Event> = Vec::new();
            let mut scheduler = FeedbackScheduler::new(
                Config::default(),
                SeededRandom::new(seed),
                &mut events,
            )
            .unwrap();
            let mut previous: Vec<Pcb> = scheduler.processes().to_vec();

            loop {
                let seen = events.len();
                let more = scheduler.step(&mut events);
                let step_events = &events[seen..];

                if let Err(violation) = scheduler.state().check_invariants() {
                    panic!("seed {seed}, t={}: {violation}", scheduler.clock());
                }

                for (before, after) in previous.iter().zip(scheduler.processes()) {
                    let pid = after.pid();
                    assert!(after.cpu_remaining() <= before.cpu_remaining());
                    assert_eq!(
                        after.cpu_remaining() == 0,
                        after.status() == ProcessStatus::Finished,
                        "seed {seed}: {pid} finished out of step with its demand"
                    );
                    if before.status() == ProcessStatus::Finished {
                        assert_eq!(after.status(), ProcessStatus::Finished);
                    }

                    if after.priority() != before.priority() {
                        let explained = step_events.iter().any(|event| match event.kind {
                            EventKind::Preempted { pid: p, .. } => {
                                p == pid && after.priority() == Priority::Low
                            }
                            EventKind::IoCompleted {
                                pid: p,
                                destination,
                                ..
                            } => p == pid && destination == after.priority(),
                            _ => false,
                        });
                        assert!(explained, "seed {seed}: {pid} changed priority silently");
                    }
                }

                previous = scheduler.processes().to_vec();
                if !more {
                    break;
                }
            }

            assert!(scheduler.is_finished());
        }
    }

    #[test]
    fn terminates_across_seeds_and_configs() {
        let configs = [
            Config::default(),
            Config {
                io_chance: 100,
                ..Config::default()
            },
            Config {
                processes: 20,
                quantum: 1,
                cpu: TickRange::new(1, 40),
                ..Config::default()
            },
        ];

        for config in configs {
            for seed in 1..=50 {
                let mut scheduler =
                    FeedbackScheduler::new(config.clone(), SeededRandom::new(seed), &mut NullSink)
                        .unwrap();

                let mut steps = 0;
                while scheduler.step(&mut NullSink) {
                    steps += 1;
                    assert!(steps < 1_000_000, "seed {seed} did not terminate");
                }
                assert!(scheduler.is_finished(), "seed {seed} halted early");
                assert_eq!(scheduler.finished_count(), config.processes);
            }
        }
    }

    #[test]
    fn same_seed_same_transcript() {
        let run = |seed| {
            let mut events: Vec<Event> = Vec::new();
            let mut scheduler =
                FeedbackScheduler::new(Config::default(), SeededRandom::new(seed), &mut events)
                    .unwrap();
            let clock = scheduler.run(&mut events);
            (events, clock)
        };

        let (first, first_clock) = run(1234);
        let (second, second_clock) = run(1234);
        assert_eq!(first, second);
        assert_eq!(first_clock, second_clock);
        assert_eq!(
            first.last().map(|event| event.kind),
            Some(EventKind::SimulationComplete {
                final_clock: first_clock,
                process_count: 8
            })
        );
    }
}
