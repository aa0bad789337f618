use anyhow::{anyhow, Result};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use logbench::{
    boot,
    cli::{self, AppConfig},
    core::{buffer::RequestBuffer, monitor::MonitorConfig, task_manager::spawn_blocking_task, Monitor},
    log::LogSource,
    tui,
};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::parse_args();
    let config = AppConfig::from_matches(&matches)?;
    boot::init_logging(config.diagnostic_log.as_deref());
    log::debug!("Config: {}", serde_json::to_string(&config)?);

    // Fail before the terminal is taken over.
    let (source, initial) = match LogSource::open(&config.log_path) {
        Ok(opened) => opened,
        Err(err) => {
            eprintln!("Error: {err}");
            eprintln!("Please run from a Rails project directory or specify a valid log file");
            std::process::exit(1);
        }
    };

    let buffer = RequestBuffer::shared(config.retention);
    let trimmed = buffer.write().append_and_trim(initial.into_requests());
    log::info!(
        "Loaded {} requests from {} ({trimmed} over retention)",
        buffer.read().len(),
        config.log_path.display()
    );

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::Release))
            .map_err(|e| anyhow!("Failed to install Ctrl-C handler: {}", e))?;
    }

    let handle = Monitor::spawn(
        source,
        buffer.clone(),
        running.clone(),
        MonitorConfig {
            poll_interval: config.poll_interval,
            error_backoff: config.error_backoff,
        },
    );

    let ui_result = {
        let running = running.clone();
        let log_path = config.log_path.clone();
        let input_timeout = config.input_timeout;
        spawn_blocking_task(move || tui::start(&log_path, buffer, running, input_timeout))
            .await
            .map_err(|e| anyhow!("TUI task failed: {}", e))?
    };

    running.store(false, Ordering::Release);
    handle.stop().await?;
    ui_result?;

    log::info!("👋 Bye");
    Ok(())
}
