use super::Pid;
use std::{error::Error, fmt};

/// A configuration that can't start a simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyRange { name: &'static str, min: u32, max: u32 },
    NonPositive { name: &'static str },
    ProbabilityOutOfRange(u32),
    UnknownArgument(String),
    MissingValue(String),
    InvalidValue { name: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyRange { name, min, max } => {
                write!(f, "{name}: range {min}..{max} is empty (min > max)")
            }
            ConfigError::NonPositive { name } => write!(f, "{name} must be at least 1"),
            ConfigError::ProbabilityOutOfRange(pct) => {
                write!(f, "I/O chance must be between 0 and 100, got {pct}")
            }
            ConfigError::UnknownArgument(arg) => write!(f, "unknown argument `{arg}`"),
            ConfigError::MissingValue(arg) => write!(f, "`{arg}` expects a value"),
            ConfigError::InvalidValue { name, value } => {
                write!(f, "invalid value `{value}` for `{name}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// A push onto a queue that is already holding `capacity` processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueOverflow {
    pub pid: Pid,
    pub capacity: usize,
}

impl fmt::Display for QueueOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "queue overflow: cannot push {} onto a full queue of capacity {}",
            self.pid, self.capacity
        )
    }
}

impl Error for QueueOverflow {}
