mod logger;

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use log::LevelFilter;
use mlfq_scheduler::scheduler::{
    Config, ConsoleSink, EventLog, FeedbackScheduler, JsonSink, OutputMode, ProcessRunner,
    RunSummary, SeededRandom, USAGE,
};
use std::{env, error::Error, io, process};

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        println!("{USAGE}");
        return Ok(());
    }

    let config = match Config::from_args(args).and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}\n\n{USAGE}");
            process::exit(2);
        }
    };

    // Log lines on stderr would tear up the tui unless asked for
    let default_level = match config.mode {
        OutputMode::Tui => LevelFilter::Off,
        OutputMode::Console | OutputMode::Json => LevelFilter::Warn,
    };
    let level = config
        .log_level
        .or_else(logger::level_from_env)
        .unwrap_or(default_level);
    logger::init(level)?;

    let random = SeededRandom::new(config.seed);
    match config.mode {
        OutputMode::Console => run_console(config, random),
        OutputMode::Json => run_json(config, random),
        OutputMode::Tui => run_tui(config, random),
    }
}

fn run_console(config: Config, random: SeededRandom) -> Result<(), Box<dyn Error>> {
    println!(
        "- processes={}, quantum={}, I/O chance={}%\n",
        config.processes, config.quantum, config.io_chance
    );

    let mut summary = RunSummary::new();
    {
        let mut sink = (ConsoleSink::new(io::stdout().lock()), &mut summary);
        let mut scheduler = FeedbackScheduler::new(config, random, &mut sink)?;
        scheduler.run(&mut sink);
    }

    println!("\n{summary}");
    Ok(())
}

fn run_json(config: Config, random: SeededRandom) -> Result<(), Box<dyn Error>> {
    let mut sink = JsonSink::new(io::stdout().lock());
    let mut scheduler = FeedbackScheduler::new(config, random, &mut sink)?;
    scheduler.run(&mut sink);
    Ok(())
}

fn run_tui(config: Config, random: SeededRandom) -> Result<(), Box<dyn Error>> {
    let mut recent = EventLog::new();
    let scheduler = FeedbackScheduler::new(config, random, &mut recent)?;

    execute!(io::stdout(), Clear(ClearType::All))?;
    {
        let mut runner = ProcessRunner::new(scheduler, recent)?;
        while runner.run()? {}
    }
    execute!(io::stdout(), Clear(ClearType::All))?;
    Ok(())
}
