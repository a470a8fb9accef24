use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, ReelError};

// Default values for optional configuration keys
fn default_temperature() -> f64 {
    0.1
}

fn default_max_concurrent_jobs() -> usize {
    num_cpus::get().max(1)
}

fn default_per_page() -> u32 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub interpreter: InterpreterConfig,
    pub media: MediaConfig,
    pub executor: ExecutorConfig,
    pub stock: StockConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Chat-completion endpoint URL
    pub endpoint: String,
    /// Model name sent with every completion request
    pub model: String,
    /// Bearer credential; AI translation is disabled when absent or blank
    #[serde(default)]
    pub api_key: Option<String>,
    /// Sampling temperature for the completion request
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Request timeout override in seconds (transport default when unset)
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl InterpreterConfig {
    /// The configured credential, ignoring blank values
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub ffmpeg_path: String,
    /// Path to ffprobe binary
    pub ffprobe_path: String,
    /// Video codec of the fixed output profile
    pub video_codec: String,
    /// Audio codec of the fixed output profile
    pub audio_codec: String,
    /// Font file for text overlays (fontconfig default when unset)
    #[serde(default)]
    pub font_file: Option<String>,
    pub font_size: u32,
    pub font_color: String,
    /// Additional encoder options appended to every re-encode
    /// Common options: ["-preset", "medium", "-crf", "23"]
    #[serde(default)]
    pub encoder_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Directory for per-request output files (system temp dir when unset)
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
    /// Upper bound on concurrently running media syntheses
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockConfig {
    pub pixabay_endpoint: String,
    #[serde(default)]
    pub pixabay_api_key: Option<String>,
    pub pexels_endpoint: String,
    #[serde(default)]
    pub pexels_api_key: Option<String>,
    /// Results requested per provider
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Pixabay video type filter (all, film, animation)
    pub video_type: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interpreter: InterpreterConfig {
                endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
                model: "llama3-8b-8192".to_string(),
                api_key: None,
                temperature: default_temperature(),
                request_timeout_secs: None,
            },
            media: MediaConfig {
                ffmpeg_path: "ffmpeg".to_string(),
                ffprobe_path: "ffprobe".to_string(),
                video_codec: "libx264".to_string(),
                audio_codec: "aac".to_string(),
                font_file: None,
                font_size: 50,
                font_color: "white".to_string(),
                encoder_options: vec![
                    // "-preset".to_string(), "medium".to_string(),
                    // "-crf".to_string(), "23".to_string(),
                ],
            },
            executor: ExecutorConfig {
                work_dir: None,
                max_concurrent_jobs: default_max_concurrent_jobs(),
            },
            stock: StockConfig {
                pixabay_endpoint: "https://pixabay.com/api/videos/".to_string(),
                pixabay_api_key: None,
                pexels_endpoint: "https://api.pexels.com/videos/search".to_string(),
                pexels_api_key: None,
                per_page: default_per_page(),
                video_type: "film".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ReelError::Config(format!("Failed to read config file: {}", e)))?;

        Ok(toml::from_str(&content)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ReelError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ReelError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Apply credentials from the process environment.
    ///
    /// Called once at startup; the resulting value is then passed to each
    /// component and never changed afterwards.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_blank("REELCRAFT_LLM_API_KEY").or_else(|| non_blank("GROQ_API_KEY")) {
            debug!("Using language model credential from environment");
            self.interpreter.api_key = Some(key);
        }
        if let Some(key) = non_blank("PIXABAY_API_KEY") {
            self.stock.pixabay_api_key = Some(key);
        }
        if let Some(key) = non_blank("PEXELS_API_KEY") {
            self.stock.pexels_api_key = Some(key);
        }
        self
    }
}
