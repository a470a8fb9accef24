use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, ReelError};
use crate::instruction::Instruction;
use super::{EngineCapability, MediaEngine};

/// Engine used when ffmpeg cannot be run: every operation returns the input
/// unchanged
#[derive(Debug, Default)]
pub struct PassthroughEngine;

impl PassthroughEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaEngine for PassthroughEngine {
    fn capability(&self) -> EngineCapability {
        EngineCapability::PassthroughOnly
    }

    async fn apply(&self, input: &Path, instruction: &Instruction, output: &Path) -> Result<()> {
        info!("Media engine unavailable, returning input unchanged for {}", instruction.operation());
        copy_asset(input, output).await
    }
}

/// Byte-for-byte copy of a video asset
pub async fn copy_asset(input: &Path, output: &Path) -> Result<()> {
    debug!("Copying {} -> {}", input.display(), output.display());

    if !fs::try_exists(input).await.unwrap_or(false) {
        return Err(ReelError::FileNotFound(input.display().to_string()));
    }

    fs::copy(input, output).await?;
    Ok(())
}
