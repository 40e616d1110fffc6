use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("missing API key - set TALOS_API_KEY or api_key in the configuration file")]
    MissingApiKey,

    #[error("compression_threshold {threshold} must be below max_context_tokens {max}")]
    InvalidBudget { threshold: u64, max: u64 },

    #[error("max_iterations must be at least 1")]
    InvalidIterations,
}
