use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::config::MediaConfig;
use crate::error::{Result, ReelError};

/// Number of stderr lines kept in error messages
const STDERR_TAIL_LINES: usize = 8;

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Seek position in seconds; applies to the next input when placed before it
    pub fn seek(self, seconds: f64) -> Self {
        self.arg("-ss").arg(format_seconds(seconds))
    }

    /// Limit output duration in seconds
    pub fn duration(self, seconds: f64) -> Self {
        self.arg("-t").arg(format_seconds(seconds))
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Add video filter
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Add audio filter
    pub fn audio_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-af").arg(filter)
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ReelError::Media(format!("Failed to execute media processor: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReelError::Media(format!(
                "{} failed: {}",
                self.description,
                stderr_tail(&stderr)
            )));
        }

        Ok(())
    }
}

/// Builder for the edit commands, all sharing one fixed output profile
pub struct MediaCommandBuilder {
    config: MediaConfig,
}

impl MediaCommandBuilder {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Build version check command
    pub fn version_check<S: Into<String>>(binary_path: S) -> MediaCommand {
        MediaCommand::new(binary_path, "Version check").arg("-version")
    }

    /// Build trim command for `[start, start + duration]`
    pub fn trim<P: AsRef<Path>>(&self, input: P, output: P, start: f64, duration: f64) -> MediaCommand {
        let cmd = MediaCommand::new(
            &self.config.ffmpeg_path,
            format!("Trim ({:.3}s from {:.3}s)", duration, start),
        )
        .overwrite()
        .seek(start)
        .input(input)
        .duration(duration);

        self.encode_profile(cmd).output(output)
    }

    /// Build text overlay command
    pub fn overlay_text<P: AsRef<Path>>(&self, input: P, output: P, overlay: &TextOverlay) -> MediaCommand {
        let cmd = MediaCommand::new(&self.config.ffmpeg_path, "Text overlay")
            .overwrite()
            .input(input)
            .video_filter(overlay.to_filter(&self.config));

        self.encode_profile(cmd).output(output)
    }

    /// Build playback speed command; audio is resampled so its pitch and
    /// duration follow the video
    pub fn change_speed<P: AsRef<Path>>(&self, input: P, output: P, speed: f64, sample_rate: Option<u32>) -> MediaCommand {
        let mut cmd = MediaCommand::new(&self.config.ffmpeg_path, format!("Speed change (x{})", speed))
            .overwrite()
            .input(input)
            .video_filter(format!("setpts=PTS/{}", speed));

        if let Some(rate) = sample_rate {
            cmd = cmd.audio_filter(resample_audio(rate, speed));
        }

        self.encode_profile(cmd).output(output)
    }

    /// Fixed output profile: configured codecs in an mp4 container
    fn encode_profile(&self, cmd: MediaCommand) -> MediaCommand {
        cmd.video_codec(&self.config.video_codec)
            .arg("-pix_fmt").arg("yuv420p")
            .audio_codec(&self.config.audio_codec)
            .args(self.config.encoder_options.iter().cloned())
            .arg("-movflags").arg("+faststart")
            .arg("-f").arg("mp4")
    }
}

/// Named anchor for overlay placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Center,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Anchor {
    /// Parse names like `center`, `top`, `bottom-left`, `left top`, `top_right`.
    /// Unknown names fall back to center.
    pub fn parse(name: &str) -> Self {
        let name = name.to_lowercase();
        let words: Vec<&str> = name
            .split(|c: char| !c.is_ascii_alphabetic())
            .filter(|w| !w.is_empty())
            .collect();
        let top = words.contains(&"top");
        let bottom = words.contains(&"bottom");
        let left = words.contains(&"left");
        let right = words.contains(&"right");

        match (top, bottom, left, right) {
            (true, false, true, false) => Self::TopLeft,
            (true, false, false, true) => Self::TopRight,
            (false, true, true, false) => Self::BottomLeft,
            (false, true, false, true) => Self::BottomRight,
            (true, false, false, false) => Self::Top,
            (false, true, false, false) => Self::Bottom,
            (false, false, true, false) => Self::Left,
            (false, false, false, true) => Self::Right,
            _ => Self::Center,
        }
    }

    /// drawtext x/y expressions
    fn coordinates(&self) -> (&'static str, &'static str) {
        const CX: &str = "(w-text_w)/2";
        const CY: &str = "(h-text_h)/2";
        const LEFT: &str = "w*0.05";
        const RIGHT: &str = "w-text_w-w*0.05";
        const TOP: &str = "h*0.05";
        const BOTTOM: &str = "h-text_h-h*0.05";

        match self {
            Self::Center => (CX, CY),
            Self::Top => (CX, TOP),
            Self::Bottom => (CX, BOTTOM),
            Self::Left => (LEFT, CY),
            Self::Right => (RIGHT, CY),
            Self::TopLeft => (LEFT, TOP),
            Self::TopRight => (RIGHT, TOP),
            Self::BottomLeft => (LEFT, BOTTOM),
            Self::BottomRight => (RIGHT, BOTTOM),
        }
    }
}

/// Text layer shown from t=0 for `duration` seconds
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub text: String,
    pub anchor: Anchor,
    pub duration: f64,
}

impl TextOverlay {
    /// Render as a drawtext filter description
    pub fn to_filter(&self, config: &MediaConfig) -> String {
        let (x, y) = self.anchor.coordinates();
        let mut options = vec![
            ("text", self.text.clone()),
            ("expansion", "none".to_string()),
            ("fontsize", config.font_size.to_string()),
            ("fontcolor", config.font_color.clone()),
            ("x", x.to_string()),
            ("y", y.to_string()),
            ("enable", format!("between(t,0,{})", format_seconds(self.duration))),
        ];
        if let Some(font_file) = &config.font_file {
            options.push(("fontfile", font_file.clone()));
        }

        let args = options
            .iter()
            .map(|(key, value)| format!("{}={}", key, quote_option(value)))
            .collect::<Vec<_>>()
            .join(":");

        format!("drawtext={}", escape_filtergraph(&args))
    }
}

/// Quote a filter option value so `:` and `'` survive option parsing
fn quote_option(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Escape characters the filtergraph parser treats specially
fn escape_filtergraph(args: &str) -> String {
    let mut escaped = String::with_capacity(args.len());
    for c in args.chars() {
        if matches!(c, '\\' | '\'' | '[' | ']' | ',' | ';') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Play audio `speed` times faster by relabelling its sample rate, then
/// resample back to the original rate. Pitch shifts with the tempo.
pub fn resample_audio(sample_rate: u32, speed: f64) -> String {
    format!("asetrate={}*{},aresample={}", sample_rate, speed, sample_rate)
}

fn format_seconds(seconds: f64) -> String {
    format!("{:.3}", seconds)
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn builder() -> MediaCommandBuilder {
        MediaCommandBuilder::new(Config::default().media)
    }

    fn position(args: &[String], flag: &str) -> usize {
        args.iter().position(|a| a == flag).unwrap()
    }

    #[test]
    fn test_trim_seeks_before_input() {
        let cmd = builder().trim("in.mp4", "out.mp4", 5.0, 25.0);

        assert_eq!(cmd.binary_path, "ffmpeg");
        assert!(position(&cmd.args, "-ss") < position(&cmd.args, "-i"));
        assert_eq!(cmd.args[position(&cmd.args, "-ss") + 1], "5.000");
        assert_eq!(cmd.args[position(&cmd.args, "-t") + 1], "25.000");
        assert_eq!(cmd.args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn test_fixed_encoding_profile() {
        let mut config = Config::default().media;
        config.encoder_options = vec!["-preset".to_string(), "ultrafast".to_string()];
        let cmd = MediaCommandBuilder::new(config).trim("in.mp4", "out.mp4", 0.0, 1.0);

        assert_eq!(cmd.args[position(&cmd.args, "-c:v") + 1], "libx264");
        assert_eq!(cmd.args[position(&cmd.args, "-c:a") + 1], "aac");
        assert_eq!(cmd.args[position(&cmd.args, "-pix_fmt") + 1], "yuv420p");
        assert_eq!(cmd.args[position(&cmd.args, "-preset") + 1], "ultrafast");
        assert_eq!(cmd.args[position(&cmd.args, "-f") + 1], "mp4");
    }

    #[test]
    fn test_speed_filters() {
        let cmd = builder().change_speed("in.mp4", "out.mp4", 2.0, Some(44100));
        assert_eq!(cmd.args[position(&cmd.args, "-vf") + 1], "setpts=PTS/2");
        assert_eq!(cmd.args[position(&cmd.args, "-af") + 1], "asetrate=44100*2,aresample=44100");

        let silent = builder().change_speed("in.mp4", "out.mp4", 0.5, None);
        assert!(!silent.args.contains(&"-af".to_string()));
    }

    #[test]
    fn test_audio_pitch_follows_speed() {
        assert_eq!(resample_audio(48000, 1.5), "asetrate=48000*1.5,aresample=48000");
        assert_eq!(resample_audio(44100, 0.5), "asetrate=44100*0.5,aresample=44100");
        assert_eq!(resample_audio(22050, 4.0), "asetrate=22050*4,aresample=22050");
        assert!(!resample_audio(44100, 2.0).contains("atempo"));
    }

    #[test]
    fn test_anchor_names() {
        assert_eq!(Anchor::parse("center"), Anchor::Center);
        assert_eq!(Anchor::parse("TOP"), Anchor::Top);
        assert_eq!(Anchor::parse("bottom-left"), Anchor::BottomLeft);
        assert_eq!(Anchor::parse("left top"), Anchor::TopLeft);
        assert_eq!(Anchor::parse("top_right"), Anchor::TopRight);
        assert_eq!(Anchor::parse("somewhere"), Anchor::Center);
        assert_eq!(Anchor::parse("top bottom"), Anchor::Center);
    }

    #[test]
    fn test_option_quoting() {
        assert_eq!(quote_option("hello"), "'hello'");
        assert_eq!(quote_option("it's"), r"'it'\''s'");
        assert_eq!(escape_filtergraph("a,b;[c]"), r"a\,b\;\[c\]");
        assert_eq!(escape_filtergraph(r"'x\'"), r"\'x\\\'");
    }

    #[test]
    fn test_drawtext_filter() {
        let overlay = TextOverlay {
            text: "Hello: world".to_string(),
            anchor: Anchor::Center,
            duration: 5.0,
        };
        let filter = overlay.to_filter(&Config::default().media);

        assert!(filter.starts_with("drawtext="));
        assert!(filter.contains(r"text=\'Hello: world\'"));
        assert!(filter.contains(r"expansion=\'none\'"));
        assert!(filter.contains(r"fontsize=\'50\'"));
        assert!(filter.contains(r"enable=\'between(t\,0\,5.000)\'"));
        assert!(!filter.contains("fontfile"));
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let stderr = (1..=20).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        let tail = stderr_tail(&stderr);
        assert!(tail.starts_with("line 13"));
        assert!(tail.ends_with("line 20"));
    }
}
