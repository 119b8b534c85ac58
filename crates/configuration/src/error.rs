use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from file: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Failed to parse configuration document: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}
