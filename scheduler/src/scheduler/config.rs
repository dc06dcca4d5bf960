use super::{error::ConfigError, io::Device};
use log::LevelFilter;
use std::{fmt, str::FromStr};

pub const USAGE: &str = "\
Usage: mlfq [OPTIONS]

Options:
  --processes N        number of simulated processes (default 8)
  --quantum N          CPU ticks per dispatch (default 3)
  --cpu MIN..MAX       CPU demand per process (default 8..25)
  --io-chance PCT      chance of an I/O request per CPU tick (default 25)
  --disk MIN..MAX      disk I/O duration (default 3..7)
  --tape MIN..MAX      tape I/O duration (default 4..9)
  --printer MIN..MAX   printer I/O duration (default 5..10)
  --seed N             random seed, 0 seeds from the OS (default 0)
  --mode MODE          console, json or tui (default console)
  --log-level LEVEL    off, error, warn, info, debug or trace
  -h, --help           print this message";

/// An inclusive range of ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRange {
    pub min: u32,
    pub max: u32,
}

impl TickRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.min == 0 {
            return Err(ConfigError::NonPositive { name });
        }
        if self.min > self.max {
            return Err(ConfigError::EmptyRange {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl fmt::Display for TickRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}

impl FromStr for TickRange {
    type Err = ();

    /// Accepts `MIN..MAX`, `MIN..=MAX` or a single `N`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, max) = match s.split_once("..") {
            Some((min, max)) => (min, max.strip_prefix('=').unwrap_or(max)),
            None => (s, s),
        };
        let min = min.trim().parse().map_err(|_| ())?;
        let max = max.trim().parse().map_err(|_| ())?;
        Ok(TickRange::new(min, max))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Console,
    Json,
    Tui,
}

impl FromStr for OutputMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "console" => Ok(OutputMode::Console),
            "json" => Ok(OutputMode::Json),
            "tui" => Ok(OutputMode::Tui),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub processes: usize,
    pub quantum: u32,
    pub cpu: TickRange,
    /// Percent chance, checked once per CPU tick that leaves work behind.
    pub io_chance: u32,
    pub disk: TickRange,
    pub tape: TickRange,
    pub printer: TickRange,
    /// 0 seeds from the OS.
    pub seed: u64,
    pub mode: OutputMode,
    pub log_level: Option<LevelFilter>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            processes: 8,
            quantum: 3,
            cpu: TickRange::new(8, 25),
            io_chance: 25,
            disk: TickRange::new(3, 7),
            tape: TickRange::new(4, 9),
            printer: TickRange::new(5, 10),
            seed: 0,
            mode: OutputMode::Console,
            log_level: None,
        }
    }
}

impl Config {
    pub fn io_range(&self, device: Device) -> TickRange {
        match device {
            Device::Disk => self.disk,
            Device::Tape => self.tape,
            Device::Printer => self.printer,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processes == 0 {
            return Err(ConfigError::NonPositive { name: "processes" });
        }
        if self.quantum == 0 {
            return Err(ConfigError::NonPositive { name: "quantum" });
        }
        if self.io_chance > 100 {
            return Err(ConfigError::ProbabilityOutOfRange(self.io_chance));
        }

        self.cpu.validate("cpu")?;
        self.disk.validate("disk")?;
        self.tape.validate("tape")?;
        self.printer.validate("printer")
    }

    /// Parses long options on top of the defaults. `args` excludes the program name.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let (name, inline) = match arg.split_once('=') {
                Some((name, value)) => (name.to_owned(), Some(value.to_owned())),
                None => (arg, None),
            };

            if !name.starts_with("--") {
                return Err(ConfigError::UnknownArgument(name));
            }

            let value = match inline.or_else(|| args.next()) {
                Some(value) => value,
                None => return Err(ConfigError::MissingValue(name)),
            };

            match name.as_str() {
                "--processes" => config.processes = parse(&name, &value)?,
                "--quantum" => config.quantum = parse(&name, &value)?,
                "--cpu" => config.cpu = parse(&name, &value)?,
                "--io-chance" => config.io_chance = parse(&name, &value)?,
                "--disk" => config.disk = parse(&name, &value)?,
                "--tape" => config.tape = parse(&name, &value)?,
                "--printer" => config.printer = parse(&name, &value)?,
                "--seed" => config.seed = parse(&name, &value)?,
                "--mode" => config.mode = parse(&name, &value)?,
                "--log-level" => config.log_level = Some(parse(&name, &value)?),
                _ => return Err(ConfigError::UnknownArgument(name)),
            }
        }

        Ok(config)
    }
}

fn parse<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_owned(),
        value: value.to_owned(),
    })
}
