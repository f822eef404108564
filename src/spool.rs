//! Spool directory: the durable queue between the bridge and the printer driver.
//!
//! One JSON file per accepted operation. A file is complete on disk before
//! its operation is acknowledged and is never rewritten afterwards. The
//! directory is (re)created on every write, so deleting it while the bridge
//! runs is harmless.

use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::fiscal::FiscalOperation;

#[derive(Debug, Error)]
pub enum SpoolError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode spool record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("spool writer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SpoolError {
    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        SpoolError::Io {
            context: context.into(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Spool {
    dir: PathBuf,
}

impl Spool {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write `operation` to the spool and return the path of the new file.
    pub async fn persist(&self, operation: &FiscalOperation) -> Result<PathBuf, SpoolError> {
        let bytes = serde_json::to_vec_pretty(&operation.record())?;
        let dir = self.dir.clone();
        let path = self.dir.join(operation.file_name());

        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &target, &bytes)).await??;

        debug!(path = %path.display(), "spool record written");
        Ok(path)
    }

    /// Number of records currently waiting in the spool directory.
    pub async fn pending(&self) -> Result<usize, SpoolError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(SpoolError::io("cannot read spool directory", e)),
        };

        let mut count = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SpoolError::io("cannot read spool directory", e))?
        {
            if entry.file_name().to_string_lossy().ends_with(".json") {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Writes through a temp file in the same directory, fsyncs, then renames
/// into place. Fails rather than replacing an existing record.
fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), SpoolError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| SpoolError::io(format!("cannot create {}", dir.display()), e))?;

    let mut temp = tempfile::Builder::new()
        .prefix(".pending-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| SpoolError::io("cannot create spool temp file", e))?;

    temp.write_all(bytes)
        .map_err(|e| SpoolError::io("cannot write spool temp file", e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| SpoolError::io("cannot sync spool temp file", e))?;

    temp.persist_noclobber(path)
        .map_err(|e| SpoolError::io(format!("cannot persist {}", path.display()), e.error))?;

    Ok(())
}
