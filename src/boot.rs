use chrono::Local;
use log::LevelFilter;
use std::io::{self, Write};

use env_logger::{Builder, Target};

/// Route diagnostics away from the terminal the dashboard draws on.
///
/// An explicit path wins; debug builds fall back to a timestamped file in the
/// working directory, release builds to the plain `env_logger` setup.
pub fn init_logging(log_file: Option<&str>) {
    let log_file = log_file.map(str::to_string).or_else(|| {
        cfg!(debug_assertions)
            .then(|| format!("./logbench_{}.log", Local::now().format("%Y%m%d%H%M%S")))
    });

    if let Some(path) = log_file {
        if let Err(err) = init_file_logger(&path) {
            eprintln!("Failed to initialize file logger at '{path}': {err}");
            env_logger::init();
        }
    } else {
        env_logger::init();
    }
}

fn init_file_logger(path: &str) -> io::Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{}:{} {} [{}] - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(file)))
        .filter_level(LevelFilter::Debug)
        .parse_default_env()
        .try_init()
        .map_err(io::Error::other)?;

    log::info!("File logger initialized at {path}");

    Ok(())
}
