use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::{
    env,
    io::{self, Write},
};

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_ENV: &str = "MLFQ_LOG";

/// Writes log records to stderr, keeping stdout for the event transcript.
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // Nothing sensible to do if stderr itself is gone
        let _ = writeln!(
            io::stderr().lock(),
            "[{:<5}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

pub fn level_from_env() -> Option<LevelFilter> {
    let value = env::var(LOG_ENV).ok()?;
    match value.parse() {
        Ok(level) => Some(level),
        Err(_) => {
            eprintln!("ignoring {LOG_ENV}={value}: not a log level");
            None
        }
    }
}
