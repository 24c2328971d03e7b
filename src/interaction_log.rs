//! Append-only JSON-lines log of every question/answer event

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::warn;

use crate::errors::Result;
use crate::models::InteractionRecord;

pub struct InteractionLogger {
    path: PathBuf,
}

impl InteractionLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line, creating the file and its
    /// directory if needed.
    ///
    /// The line is written with one `write_all` on an append-mode handle, so
    /// readers never see two records interleaved.
    pub fn log(&self, record: &InteractionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;

        debug!(
            "Logged interaction to {} (failed={})",
            self.path.display(),
            record.failed
        );
        Ok(())
    }

    /// Read back every complete record.
    ///
    /// A trailing line without a newline may still be in flight and is
    /// skipped. A missing file reads as empty.
    pub fn read_records(&self) -> Result<Vec<InteractionRecord>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let complete = match content.rfind('\n') {
            Some(pos) => &content[..=pos],
            None => "",
        };

        let mut records = Vec::new();
        for line in complete.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable interaction log line: {}", e),
            }
        }
        Ok(records)
    }
}
