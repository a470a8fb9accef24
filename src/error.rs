use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Command interpretation error: {0}")]
    Interpret(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Invalid instruction: {0}")]
    InvalidInstruction(String),

    #[error("Stock footage error: {0}")]
    Stock(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, ReelError>;
