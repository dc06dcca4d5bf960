use super::{runner::RunnerEvent, ProcessStatus, Scheduler};
use crossterm::event::{self, Event, KeyCode, KeyEvent};
use std::{
    io::{self, Stdout},
    sync::mpsc::{self, Receiver},
    thread,
    time::{Duration, Instant},
};
use tui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Spans,
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table},
    Terminal,
};

pub enum DisplayEvent {
    Input(KeyEvent),
    Tick,
}

const TICK_RATE: Duration = Duration::from_millis(200);

pub struct DisplayTerminal {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    input_rx: Receiver<DisplayEvent>,
}

impl DisplayTerminal {
    pub fn new() -> Result<Self, io::Error> {
        crossterm::terminal::enable_raw_mode()?;

        // Set up the input handling thread
        let (input_tx, input_rx) = mpsc::channel();
        thread::spawn(move || {
            let mut last_tick = Instant::now();
            loop {
                let timeout = TICK_RATE
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::ZERO);

                match event::poll(timeout) {
                    Ok(true) => match event::read() {
                        Ok(Event::Key(key)) => {
                            if input_tx.send(DisplayEvent::Input(key)).is_err() {
                                return;
                            }
                        }
                        Ok(_) => {}
                        Err(err) => {
                            log::error!("failed to read terminal input: {err}");
                            return;
                        }
                    },
                    Ok(false) => {}
                    Err(err) => {
                        log::error!("failed to poll terminal input: {err}");
                        return;
                    }
                }

                if last_tick.elapsed() >= TICK_RATE {
                    if input_tx.send(DisplayEvent::Tick).is_err() {
                        return;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        Ok(Self { terminal, input_rx })
    }

    pub fn draw<'a, S, I>(
        &mut self,
        scheduler: &S,
        paused: bool,
        recent: I,
    ) -> Result<(), io::Error>
    where
        S: Scheduler,
        I: IntoIterator<Item = &'a String>,
    {
        let recent: Vec<Spans> = recent
            .into_iter()
            .map(|line| Spans::from(line.as_str()))
            .collect();

        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(6),
                    Constraint::Length(7),
                    Constraint::Length(12),
                ])
                .split(f.size());

            let finished = scheduler
                .processes()
                .iter()
                .filter(|pcb| pcb.status() == ProcessStatus::Finished)
                .count();
            let state = if scheduler.is_finished() {
                "complete, press q to quit"
            } else if paused {
                "paused"
            } else {
                "running"
            };
            let clock = Paragraph::new(format!(
                "t={} | finished {}/{} | {}",
                scheduler.clock(),
                finished,
                scheduler.processes().len(),
                state
            ))
            .style(
                Style::default()
                    .add_modifier(Modifier::BOLD)
                    .fg(Color::LightBlue),
            )
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Clock")
                    .border_type(BorderType::Rounded),
            );

            f.render_widget(clock, chunks[0]);

            let items = scheduler.processes().iter().map(|pcb| {
                let parent = pcb
                    .parent()
                    .map_or_else(|| "-".to_owned(), |parent| parent.to_string());
                let io = match pcb.io_kind() {
                    Some(device) => format!("{device} ({})", pcb.io_remaining()),
                    None => String::new(),
                };

                Row::new(vec![
                    Cell::from(pcb.pid().to_string())
                        .style(Style::default().add_modifier(Modifier::BOLD)),
                    Cell::from(parent),
                    Cell::from(pcb.priority().to_string()),
                    Cell::from(pcb.status().to_string()),
                    Cell::from(format!("{}/{}", pcb.cpu_remaining(), pcb.cpu_total())),
                    Cell::from(io),
                ])
            });

            let table = Table::new(items)
                .header(
                    Row::new(vec!["PID", "Parent", "Priority", "Status", "CPU", "I/O"])
                        .style(Style::default().add_modifier(Modifier::BOLD)),
                )
                .widths(&[
                    Constraint::Length(4),
                    Constraint::Length(6),
                    Constraint::Length(8),
                    Constraint::Length(8),
                    Constraint::Length(7),
                    Constraint::Length(12),
                ])
                .block(Block::default().title(S::NAME).borders(Borders::ALL))
                .style(Style::default().fg(Color::LightGreen))
                .column_spacing(1);

            f.render_widget(table, chunks[1]);

            let queues: Vec<Spans> = scheduler
                .queues()
                .into_iter()
                .map(|(name, pids)| {
                    let pids: Vec<String> = pids.iter().map(ToString::to_string).collect();
                    Spans::from(format!("{name:>7}: {}", pids.join(" ")))
                })
                .collect();
            let queues = Paragraph::new(queues)
                .block(Block::default().title("Queues").borders(Borders::ALL))
                .style(Style::default().fg(Color::Yellow));

            f.render_widget(queues, chunks[2]);

            let events = Paragraph::new(recent)
                .block(Block::default().title("Events").borders(Borders::ALL));

            f.render_widget(events, chunks[3]);
        })?;
        Ok(())
    }

    pub fn get_input(&self) -> RunnerEvent {
        // A closed channel means the input thread died, nothing else will ever arrive
        let Ok(event) = self.input_rx.recv() else {
            return RunnerEvent::Quit;
        };

        if let DisplayEvent::Input(key) = event {
            if key.modifiers.is_empty() {
                match key.code {
                    KeyCode::Char('q') => return RunnerEvent::Quit,
                    KeyCode::Char('p') => return RunnerEvent::Pause,
                    KeyCode::Char('r') => return RunnerEvent::Resume,
                    KeyCode::Char('s') => return RunnerEvent::Step,
                    _ => {}
                };
            }
        }
        RunnerEvent::None
    }
}

impl Drop for DisplayTerminal {
    fn drop(&mut self) {
        if let Err(err) = crossterm::terminal::disable_raw_mode() {
            log::error!("failed to leave raw mode: {err}");
        }
    }
}
