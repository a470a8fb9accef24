use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{Result, ReelError};
use crate::instruction::{Instruction, Operation};
use super::commands::{Anchor, MediaCommandBuilder, TextOverlay};
use super::passthrough::copy_asset;
use super::probe::{MediaProbe, ProbeInfo};
use super::{EngineCapability, MediaEngine};

/// Media engine backed by the ffmpeg and ffprobe binaries
pub struct FfmpegEngine {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
    probe: MediaProbe,
}

impl FfmpegEngine {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            command_builder: MediaCommandBuilder::new(config.clone()),
            probe: MediaProbe::new(&config.ffprobe_path),
            config,
        }
    }

    /// Check that ffmpeg and ffprobe can be executed
    pub async fn check_availability(&self) -> Result<()> {
        for binary in [&self.config.ffmpeg_path, &self.config.ffprobe_path] {
            MediaCommandBuilder::version_check(binary)
                .execute()
                .await
                .map_err(|e| ReelError::Media(format!("{} not available: {}", binary, e)))?;
        }
        info!("Media engine is available");
        Ok(())
    }

    async fn trim(&self, input: &Path, instruction: &Instruction, output: &Path, total: f64) -> Result<()> {
        let (start, end) = trim_range(instruction, total)?;
        self.command_builder
            .trim(input, output, start, end - start)
            .execute()
            .await
    }

    async fn add_text(&self, input: &Path, instruction: &Instruction, output: &Path, total: f64) -> Result<()> {
        let overlay = text_overlay(instruction, total)?;
        self.command_builder
            .overlay_text(input, output, &overlay)
            .execute()
            .await
    }

    async fn change_speed(&self, input: &Path, instruction: &Instruction, output: &Path, info: &ProbeInfo) -> Result<()> {
        let speed = playback_speed(instruction)?;
        let sample_rate = audio_sample_rate(info)?;
        self.command_builder
            .change_speed(input, output, speed, sample_rate)
            .execute()
            .await
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    fn capability(&self) -> EngineCapability {
        EngineCapability::Full
    }

    async fn apply(&self, input: &Path, instruction: &Instruction, output: &Path) -> Result<()> {
        let operation = instruction.operation();
        if !operation.is_executable() {
            info!("Operation {} has no effect, returning input unchanged", operation);
            return copy_asset(input, output).await;
        }

        let info = self.probe.probe(input).await?;
        debug!("Input duration {:.3}s, audio: {}", info.duration, info.has_audio);

        match operation {
            Operation::Trim => self.trim(input, instruction, output, info.duration).await,
            Operation::AddText => self.add_text(input, instruction, output, info.duration).await,
            Operation::SpeedChange => self.change_speed(input, instruction, output, &info).await,
            Operation::Crop | Operation::AddMusic | Operation::Filter => copy_asset(input, output).await,
        }
    }
}

/// Clip range `[max(start, 0), min(end, total)]`; empty or inverted ranges are
/// rejected
fn trim_range(instruction: &Instruction, total: f64) -> Result<(f64, f64)> {
    let start = instruction.number_or("start_time", 0.0).max(0.0);
    let end = instruction.number_or("end_time", total).min(total);

    if !start.is_finite() || !end.is_finite() || start >= end {
        return Err(ReelError::InvalidInstruction(format!(
            "Empty trim range: start {} >= end {} (video is {:.3}s)",
            start, end, total
        )));
    }
    Ok((start, end))
}

fn text_overlay(instruction: &Instruction, total: f64) -> Result<TextOverlay> {
    let duration = instruction.number_or("duration", 5.0).min(total);
    if !duration.is_finite() || duration <= 0.0 {
        return Err(ReelError::InvalidInstruction(format!(
            "Text duration must be positive, got {}",
            duration
        )));
    }

    Ok(TextOverlay {
        text: instruction.text_or("text", "Sample Text"),
        anchor: Anchor::parse(&instruction.text_or("position", "center")),
        duration,
    })
}

fn playback_speed(instruction: &Instruction) -> Result<f64> {
    let speed = instruction.number_or("speed", 1.0);
    if !speed.is_finite() || speed <= 0.0 {
        return Err(ReelError::InvalidInstruction(format!(
            "Speed must be a positive number, got {}",
            speed
        )));
    }
    Ok(speed)
}

/// Audio without a known sample rate cannot be resampled in step with the video
fn audio_sample_rate(info: &ProbeInfo) -> Result<Option<u32>> {
    match (info.has_audio, info.sample_rate) {
        (false, _) => Ok(None),
        (true, Some(rate)) => Ok(Some(rate)),
        (true, None) => Err(ReelError::Media("Audio stream has no sample rate".to_string())),
    }
}
