use anyhow::{anyhow, Context, Result};
use std::{
    fs::File,
    io::{Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use crate::log::parser::Collection;

pub const DEFAULT_LOG_PATH: &str = "log/development.log";

/// A log file read incrementally by byte offset.
#[derive(Debug, Clone)]
pub struct LogSource {
    path: PathBuf,
    offset: u64,
}

impl LogSource {
    /// First existing file of `[path, log/development.log]`.
    pub fn resolve(path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        [path, Path::new(DEFAULT_LOG_PATH)]
            .into_iter()
            .find(|candidate| candidate.is_file())
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow!("No log file found at {}!", path.display()))
    }

    /// Resolve the file and read everything written so far as one batch.
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, Collection)> {
        let mut source = Self {
            path: Self::resolve(path)?,
            offset: 0,
        };
        let initial = source.poll()?;
        log::info!(
            "📂 Opened {} ({} entries, {} bytes)",
            source.path.display(),
            initial.len(),
            source.offset
        );
        Ok((source, initial))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Parse the complete lines appended since the previous read.
    ///
    /// A trailing line without its newline stays unread. A file that shrank
    /// below the recorded offset is read again from the start.
    pub fn poll(&mut self) -> Result<Collection> {
        let mut file = File::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let len = file
            .metadata()
            .with_context(|| format!("Failed to stat {}", self.path.display()))?
            .len();

        if len < self.offset {
            log::info!(
                "{} shrank from {} to {} bytes, rereading",
                self.path.display(),
                self.offset,
                len
            );
            self.offset = 0;
        }
        if len == self.offset {
            return Ok(Collection::default());
        }

        file.seek(SeekFrom::Start(self.offset))?;
        let mut buf = Vec::with_capacity((len - self.offset) as usize);
        file.take(len - self.offset)
            .read_to_end(&mut buf)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        let Some(last_newline) = buf.iter().rposition(|b| *b == b'\n') else {
            return Ok(Collection::default());
        };
        let complete = &buf[..=last_newline];
        self.offset += complete.len() as u64;

        Ok(Collection::parse_str(&String::from_utf8_lossy(complete)))
    }
}
