// Media processing
//
// This module applies instructions to video files:
// - Commands: ffmpeg command builders and the fixed output profile
// - Probe: ffprobe wrapper for duration and stream layout
// - Ffmpeg: the real engine
// - Passthrough: the engine used when ffmpeg is missing

pub mod commands;
pub mod ffmpeg;
pub mod passthrough;
pub mod probe;

use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

pub use commands::*;
pub use ffmpeg::FfmpegEngine;
pub use passthrough::{PassthroughEngine, copy_asset};
pub use probe::{MediaProbe, ProbeInfo};

use crate::config::MediaConfig;
use crate::error::Result;
use crate::instruction::Instruction;

/// What an engine can do with an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCapability {
    /// Operations transform the video
    Full,
    /// Every operation returns the input unchanged
    PassthroughOnly,
}

impl fmt::Display for EngineCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => f.write_str("full"),
            Self::PassthroughOnly => f.write_str("passthrough-only"),
        }
    }
}

/// Applies one instruction to a video file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaEngine: Send + Sync {
    fn capability(&self) -> EngineCapability;

    /// Write the edited version of `input` to `output`
    async fn apply(&self, input: &Path, instruction: &Instruction, output: &Path) -> Result<()>;
}

/// Factory for media engine instances
pub struct MediaEngineFactory;

impl MediaEngineFactory {
    /// The ffmpeg engine when its binaries run, otherwise the passthrough engine
    pub async fn create(config: MediaConfig) -> Arc<dyn MediaEngine> {
        let engine = FfmpegEngine::new(config);
        match engine.check_availability().await {
            Ok(()) => Arc::new(engine),
            Err(e) => {
                warn!("Video processing unavailable, edits will return the original file: {}", e);
                Arc::new(PassthroughEngine::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn test_factory_degrades_without_binaries() {
        let mut config = Config::default().media;
        config.ffmpeg_path = "/nonexistent/ffmpeg".to_string();
        config.ffprobe_path = "/nonexistent/ffprobe".to_string();

        let engine = MediaEngineFactory::create(config).await;
        assert_eq!(engine.capability(), EngineCapability::PassthroughOnly);
    }
}
