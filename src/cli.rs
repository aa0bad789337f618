use anyhow::{anyhow, Result};
use std::{path::PathBuf, time::Duration};

use clap::{Arg, ArgMatches, Command};
use serde::Serialize;

use crate::{core::buffer::DEFAULT_RETENTION, log::source::DEFAULT_LOG_PATH};

pub const LOG_FILE_ENV: &str = "LOGBENCH_LOG_FILE";

/// Runtime settings, built once from the command line and passed by value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppConfig {
    pub log_path: PathBuf,
    pub poll_interval: Duration,
    pub error_backoff: Duration,
    pub retention: usize,
    pub input_timeout: Duration,
    /// Where diagnostics go while the terminal is taken over.
    pub diagnostic_log: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            poll_interval: Duration::from_millis(500),
            error_backoff: Duration::from_secs(1),
            retention: DEFAULT_RETENTION,
            input_timeout: Duration::from_millis(100),
            diagnostic_log: None,
        }
    }
}

impl AppConfig {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let defaults = Self::default();
        let log_path = matches
            .get_one::<String>("LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.log_path);
        let poll_ms = *matches
            .get_one::<u64>("poll-interval-ms")
            .ok_or_else(|| anyhow!("--poll-interval-ms is required"))?;
        let retention = *matches
            .get_one::<usize>("retention")
            .ok_or_else(|| anyhow!("--retention is required"))?;
        if retention == 0 {
            return Err(anyhow!("--retention must be at least 1"));
        }
        let diagnostic_log = matches
            .get_one::<String>("log-file")
            .cloned()
            .or_else(|| std::env::var(LOG_FILE_ENV).ok());

        Ok(Self {
            log_path,
            poll_interval: Duration::from_millis(poll_ms.max(1)),
            retention,
            diagnostic_log,
            ..defaults
        })
    }
}

pub fn build_command() -> Command {
    Command::new("logbench")
        .about("Live terminal viewer for request-correlated Rails JSON logs")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("LOG_FILE")
                .help("Log file to follow")
                .default_value(DEFAULT_LOG_PATH),
        )
        .arg(
            Arg::new("poll-interval-ms")
                .long("poll-interval-ms")
                .help("How often the log file is checked for new lines")
                .value_parser(clap::value_parser!(u64))
                .default_value("500"),
        )
        .arg(
            Arg::new("retention")
                .long("retention")
                .help("Maximum number of requests kept in memory")
                .value_parser(clap::value_parser!(usize))
                .default_value("1000"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("PATH")
                .help("Write diagnostic logs to this file (also LOGBENCH_LOG_FILE)"),
        )
}

pub fn parse_args() -> ArgMatches {
    build_command().get_matches()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let matches = build_command().get_matches_from(["logbench"]);
        let config = AppConfig::from_matches(&matches).unwrap();
        assert_eq!(config.log_path, PathBuf::from("log/development.log"));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.retention, 1000);
        assert_eq!(config.error_backoff, Duration::from_secs(1));
    }

    #[test]
    fn test_explicit_arguments() {
        let matches = build_command().get_matches_from([
            "logbench",
            "tmp/app.log",
            "--poll-interval-ms",
            "50",
            "--retention",
            "20",
            "--log-file",
            "diag.log",
        ]);
        let config = AppConfig::from_matches(&matches).unwrap();
        assert_eq!(config.log_path, PathBuf::from("tmp/app.log"));
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.retention, 20);
        assert_eq!(config.diagnostic_log.as_deref(), Some("diag.log"));
    }

    #[test]
    fn test_zero_retention_rejected() {
        let matches = build_command().get_matches_from(["logbench", "--retention", "0"]);
        assert!(AppConfig::from_matches(&matches).is_err());
    }
}
