pub mod filter;
pub mod input;
pub mod rendering;
pub mod sort;
pub mod state;
pub mod ui;

use anyhow::Result;
use std::{
    path::Path,
    sync::{atomic::AtomicBool, Arc},
    time::Duration,
};

use crate::core::buffer::SharedBuffer;
use state::AppState;

/// Run the dashboard on the current thread until the user quits or the run
/// flag is cleared elsewhere.
pub fn start(
    log_path: &Path,
    buffer: SharedBuffer,
    running: Arc<AtomicBool>,
    input_timeout: Duration,
) -> Result<()> {
    log::info!("🖥️ TUI starting for {}", log_path.display());

    let log_file = log_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| log_path.display().to_string());
    let state = AppState::new(log_file, running);

    let result = rendering::run_rendering_loop(buffer, state, input_timeout);
    log::info!("TUI stopped");
    result
}
