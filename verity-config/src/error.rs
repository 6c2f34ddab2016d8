// Error types for profile loading

use thiserror::Error;
use verity_core::ConfigurationError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load profile: {0}")]
    LoadError(String),

    #[error("Failed to parse profile: {0}")]
    ParseError(String),

    #[error("Malformed profile: {0}")]
    MalformedProfile(String),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Environment variable error: {0}")]
    EnvError(#[from] std::env::VarError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
