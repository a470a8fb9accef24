//! Edit instructions exchanged between command interpretation and execution.
//!
//! An [`Instruction`] is plain data: an [`Operation`] tag plus a flat map of
//! scalar parameters. It never references a file and is not modified after it
//! has been built.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;

/// Edit action requested by a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Trim,
    Crop,
    AddText,
    AddMusic,
    SpeedChange,
    Filter,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trim => "trim",
            Self::Crop => "crop",
            Self::AddText => "add_text",
            Self::AddMusic => "add_music",
            Self::SpeedChange => "speed_change",
            Self::Filter => "filter",
        }
    }

    /// Whether the media engine transforms video for this operation.
    /// The remaining operations are accepted but pass the input through.
    pub fn is_executable(&self) -> bool {
        matches!(self, Self::Trim | Self::AddText | Self::SpeedChange)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

impl ParamValue {
    /// Numeric view; numeric strings such as `"10"` are accepted
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Structured edit command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    operation: Operation,
    #[serde(default)]
    parameters: BTreeMap<String, ParamValue>,
}

impl Instruction {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            parameters: BTreeMap::new(),
        }
    }

    /// Add a parameter while building an instruction
    pub fn with_param<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn parameters(&self) -> &BTreeMap<String, ParamValue> {
        &self.parameters
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.parameters.get(key).and_then(ParamValue::as_f64)
    }

    pub fn number_or(&self, key: &str, default: f64) -> f64 {
        self.number(key).unwrap_or(default)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.parameters.get(key) {
            Some(ParamValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Textual view of a parameter; numbers are rendered as text
    pub fn text_or(&self, key: &str, default: &str) -> String {
        self.parameters
            .get(key)
            .map(ToString::to_string)
            .unwrap_or_else(|| default.to_string())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operation)?;
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        if !params.is_empty() {
            write!(f, " ({})", params.join(", "))?;
        }
        Ok(())
    }
}

/// Caller-supplied descriptive hints about the video (duration, resolution, ...).
///
/// Only the interpreter looks at these; the executor probes the actual file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoMetadata(serde_json::Map<String, serde_json::Value>);

impl VideoMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<K: Into<String>, V: Into<serde_json::Value>>(mut self, key: K, value: V) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn duration(&self) -> Option<f64> {
        self.0.get("duration").and_then(serde_json::Value::as_f64)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> String {
        serde_json::Value::Object(self.0.clone()).to_string()
    }
}
