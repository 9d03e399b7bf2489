use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("invalid service URL '{value}'")]
    InvalidBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("service URL must use http or https, got '{scheme}'")]
    UnsupportedScheme { scheme: String },
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
    #[error("{field} must be at most {max_ms} ms, got {value}")]
    DurationTooLong {
        field: &'static str,
        value: u64,
        max_ms: u64,
    },
    #[error("invalid duration in {var}: '{value}'")]
    InvalidDuration {
        var: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error("failed to read client config from {path}")]
    ConfigFileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse client configuration: {0}")]
    Parse(#[source] anyhow::Error),
    #[error("contract credential {var} is not set")]
    MissingCredential { var: &'static str },
}
