//! Background tailing of the log file.
//!
//! The monitor owns the [`LogSource`] and is the only writer of the shared
//! [`RequestBuffer`](crate::core::buffer::RequestBuffer). It stops at the next
//! iteration after a shutdown message arrives, the shutdown sender is dropped,
//! or the shared run flag is cleared.

use anyhow::{anyhow, Result};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use flume::{Receiver, Sender};
use tokio::task::JoinHandle;

use crate::{
    core::{
        buffer::SharedBuffer,
        task_manager::{spawn_blocking_task, spawn_task},
    },
    log::source::LogSource,
};

#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    pub error_backoff: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            error_backoff: Duration::from_secs(1),
        }
    }
}

/// Owner side of a running monitor task.
pub struct MonitorHandle {
    shutdown_tx: Sender<()>,
    join: JoinHandle<()>,
}

impl MonitorHandle {
    /// Ask the task to stop and wait until it has.
    pub async fn stop(self) -> Result<()> {
        // A closed channel means the task is already gone.
        let _ = self.shutdown_tx.try_send(());
        self.join
            .await
            .map_err(|e| anyhow!("Monitor task failed: {}", e))
    }
}

pub struct Monitor;

impl Monitor {
    pub fn spawn(
        source: LogSource,
        buffer: SharedBuffer,
        running: Arc<AtomicBool>,
        config: MonitorConfig,
    ) -> MonitorHandle {
        let (shutdown_tx, shutdown_rx) = flume::bounded::<()>(1);
        let join = spawn_task(run(source, buffer, running, shutdown_rx, config));
        MonitorHandle { shutdown_tx, join }
    }
}

/// Sleep for `duration` unless shutdown arrives first. Returns `false` on shutdown.
async fn sleep_or_shutdown(shutdown_rx: &Receiver<()>, duration: Duration) -> bool {
    tokio::select! {
        _ = shutdown_rx.recv_async() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

async fn run(
    mut source: LogSource,
    buffer: SharedBuffer,
    running: Arc<AtomicBool>,
    shutdown_rx: Receiver<()>,
    config: MonitorConfig,
) {
    log::info!("👀 Monitor started on {}", source.path().display());

    loop {
        if !running.load(Ordering::Acquire) {
            break;
        }
        if !sleep_or_shutdown(&shutdown_rx, config.poll_interval).await {
            break;
        }

        let polled = spawn_blocking_task(move || {
            let batch = source.poll();
            (source, batch)
        })
        .await;
        let (returned, batch) = match polled {
            Ok(pair) => pair,
            Err(err) => {
                log::error!("Monitor read task failed: {err}");
                break;
            }
        };
        source = returned;

        match batch {
            Ok(batch) if batch.is_empty() => {}
            Ok(batch) => {
                let requests = batch.into_requests();
                let added = requests.len();
                let dropped = buffer.write().append_and_trim(requests);
                log::debug!("Merged {added} new requests ({dropped} trimmed)");
            }
            Err(err) => {
                log::warn!("Failed to read {}: {err:#}", source.path().display());
                if !sleep_or_shutdown(&shutdown_rx, config.error_backoff).await {
                    break;
                }
            }
        }
    }

    log::info!("Monitor stopped");
}
