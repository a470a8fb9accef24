use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, ReelError};

/// Stream facts the engine needs before building a command
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeInfo {
    /// Container duration in seconds
    pub duration: f64,
    pub has_video: bool,
    pub has_audio: bool,
    /// Sample rate of the first audio stream
    pub sample_rate: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    duration: Option<String>,
    sample_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// ffprobe wrapper
#[derive(Debug, Clone)]
pub struct MediaProbe {
    ffprobe_path: String,
}

impl MediaProbe {
    pub fn new<S: Into<String>>(ffprobe_path: S) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    pub async fn probe(&self, path: &Path) -> Result<ProbeInfo> {
        debug!("Probing {}", path.display());

        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ReelError::Media(format!("Failed to execute ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReelError::Media(format!(
                "Probe of {} failed: {}",
                path.display(),
                stderr.trim()
            )));
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_probe_output(json: &str) -> Result<ProbeInfo> {
    let parsed: ProbeOutput = serde_json::from_str(json)?;

    let has_video = parsed.streams.iter().any(|s| s.codec_type.as_deref() == Some("video"));
    let has_audio = parsed.streams.iter().any(|s| s.codec_type.as_deref() == Some("audio"));

    if !has_video {
        return Err(ReelError::Media("No video stream found".to_string()));
    }

    let sample_rate = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .and_then(|s| s.sample_rate.as_deref()?.parse::<u32>().ok())
        .filter(|rate| *rate > 0);

    // Some containers only report duration per stream
    let duration = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .or_else(|| {
            parsed
                .streams
                .iter()
                .filter_map(|s| s.duration.as_deref()?.parse::<f64>().ok())
                .reduce(f64::max)
        })
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| ReelError::Media("Could not determine video duration".to_string()))?;

    Ok(ProbeInfo {
        duration,
        has_video,
        has_audio,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_duration() {
        let info = parse_probe_output(
            r#"{
                "streams": [
                    {"index": 0, "codec_type": "video", "duration": "59.9"},
                    {"index": 1, "codec_type": "audio", "duration": "60.0", "sample_rate": "44100"}
                ],
                "format": {"duration": "60.010000", "format_name": "mov,mp4"}
            }"#,
        )
        .unwrap();

        assert_eq!(info.duration, 60.01);
        assert!(info.has_video);
        assert!(info.has_audio);
        assert_eq!(info.sample_rate, Some(44100));
    }

    #[test]
    fn test_stream_duration_when_format_has_none() {
        let info = parse_probe_output(
            r#"{"streams": [{"codec_type": "video", "duration": "12.5"}], "format": {}}"#,
        )
        .unwrap();

        assert_eq!(info.duration, 12.5);
        assert!(!info.has_audio);
        assert_eq!(info.sample_rate, None);
    }

    #[test]
    fn test_rejects_audio_only_and_unknown_duration() {
        assert!(parse_probe_output(
            r#"{"streams": [{"codec_type": "audio", "duration": "3.0"}], "format": {"duration": "3.0"}}"#
        )
        .is_err());
        assert!(parse_probe_output(r#"{"streams": [{"codec_type": "video"}]}"#).is_err());
        assert!(parse_probe_output("{}").is_err());
        assert!(parse_probe_output("garbage").is_err());
    }
}
