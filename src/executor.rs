//! Applies instructions to uploaded videos.
//!
//! Every call writes a brand-new output file and hands its ownership to the
//! caller as an [`EditedVideo`]. The input is only read. When the engine
//! cannot perform an edit, the output is a byte copy of the input, so callers
//! always get a playable file back.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::ExecutorConfig;
use crate::error::{Result, ReelError};
use crate::instruction::Instruction;
use crate::media::{EngineCapability, MediaEngine, copy_asset};

/// Output of one edit; the file is deleted when this value is dropped unless
/// it has been persisted
#[derive(Debug)]
pub struct EditedVideo {
    path: TempPath,
    applied: bool,
}

impl EditedVideo {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// False when the output is an unmodified copy of the input
    pub fn was_edited(&self) -> bool {
        self.applied
    }

    /// Move the output to `destination`, keeping it after this value is gone
    pub async fn persist<P: AsRef<Path>>(self, destination: P) -> Result<PathBuf> {
        let destination = destination.as_ref().to_path_buf();
        match self.path.persist(&destination) {
            Ok(()) => Ok(destination),
            // Renames fail across filesystems; copy instead
            Err(e) => {
                tokio::fs::copy(&e.path, &destination).await?;
                Ok(destination)
            }
        }
    }
}

/// Video operation executor
pub struct VideoExecutor {
    engine: Arc<dyn MediaEngine>,
    work_dir: Option<PathBuf>,
    permits: Semaphore,
}

impl VideoExecutor {
    pub fn new(engine: Arc<dyn MediaEngine>, config: &ExecutorConfig) -> Self {
        Self {
            engine,
            work_dir: config.work_dir.clone(),
            permits: Semaphore::new(config.max_concurrent_jobs.max(1)),
        }
    }

    pub fn capability(&self) -> EngineCapability {
        self.engine.capability()
    }

    /// True when edits can only return the original file
    pub fn is_degraded(&self) -> bool {
        self.capability() == EngineCapability::PassthroughOnly
    }

    /// Apply `instruction` to the video at `input`.
    ///
    /// Engine failures are logged and answered with a copy of the input. An
    /// error is returned only when that copy cannot be made either.
    pub async fn execute(&self, input: &Path, instruction: &Instruction) -> Result<EditedVideo> {
        let output = self.allocate_output().await?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| ReelError::Media(format!("Executor closed: {}", e)))?;

        info!("Applying {} to {}", instruction, input.display());

        let applied = match self.engine.apply(input, instruction, &output).await {
            Ok(()) if self.is_degraded() || !instruction.operation().is_executable() => false,
            Ok(()) => true,
            Err(e) => {
                warn!("Error processing video, returning original: {}", e);
                copy_asset(input, &output).await?;
                false
            }
        };

        Ok(EditedVideo {
            path: output,
            applied,
        })
    }

    /// Fresh output file, unique per call
    async fn allocate_output(&self) -> Result<TempPath> {
        if let Some(dir) = &self.work_dir {
            tokio::fs::create_dir_all(dir).await?;
        }

        let work_dir = self.work_dir.clone();
        tokio::task::spawn_blocking(move || -> Result<TempPath> {
            let mut builder = tempfile::Builder::new();
            builder.prefix("reelcraft-").suffix(".mp4");

            let file = match work_dir {
                Some(dir) => builder.tempfile_in(dir)?,
                None => builder.tempfile()?,
            };
            Ok(file.into_temp_path())
        })
        .await
        .map_err(|e| ReelError::Media(format!("Output allocation task failed: {}", e)))?
    }
}
