use super::defaults;
use super::error::ConfigError;
use dotenvy::from_filename;
use serde::Deserialize;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::debug;

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
pub(super) struct RawConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_iterations: Option<u32>,
    pub max_context_tokens: Option<u64>,
    pub compression_threshold: Option<u64>,
    pub tool_timeout_secs: Option<u64>,
    pub tools_dir: Option<String>,
    pub tasks_file: Option<String>,
    pub system_prompt: Option<String>,
}

/// Ensures environment variables are loaded from .env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename(".env");
    });
}

/// Load and validate configuration from a file path.
///
/// An explicit path must exist. The default path is optional: when it is
/// absent the configuration is built from environment variables and
/// defaults alone.
pub fn load_config(path: Option<&Path>) -> Result<super::AgentConfig, ConfigError> {
    ensure_env_loaded();

    let parsed = match path {
        Some(explicit) => read_config(explicit)?,
        None => {
            let default_path = expand_path(super::CONFIG_PATH);
            match read_config(&default_path) {
                Ok(raw) => raw,
                Err(ConfigError::NotFound { path }) => {
                    debug!(path = %path.display(), "No configuration file, using defaults");
                    RawConfig::default()
                }
                Err(other) => return Err(other),
            }
        }
    };

    validate_and_build(parsed)
}

fn read_config(path: &Path) -> Result<RawConfig, ConfigError> {
    debug!(path = %path.display(), "Reading agent configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

fn env_override(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn validate_and_build(parsed: RawConfig) -> Result<super::AgentConfig, ConfigError> {
    let api_key = env_override("TALOS_API_KEY")
        .or(parsed.api_key.filter(|value| !value.trim().is_empty()))
        .ok_or(ConfigError::MissingApiKey)?;
    let model = env_override("TALOS_MODEL")
        .or(parsed.model)
        .unwrap_or_else(|| defaults::DEFAULT_MODEL.to_string());
    let base_url = env_override("TALOS_BASE_URL")
        .or(parsed.base_url)
        .unwrap_or_else(|| defaults::DEFAULT_BASE_URL.to_string());

    let max_iterations = parsed
        .max_iterations
        .unwrap_or(defaults::DEFAULT_MAX_ITERATIONS);
    if max_iterations == 0 {
        return Err(ConfigError::InvalidIterations);
    }

    let max_context_tokens = parsed
        .max_context_tokens
        .unwrap_or(defaults::DEFAULT_MAX_CONTEXT_TOKENS);
    let compression_threshold = parsed
        .compression_threshold
        .unwrap_or(defaults::DEFAULT_COMPRESSION_THRESHOLD);
    if compression_threshold >= max_context_tokens {
        return Err(ConfigError::InvalidBudget {
            threshold: compression_threshold,
            max: max_context_tokens,
        });
    }

    let tools_dir = expand_path(
        parsed
            .tools_dir
            .as_deref()
            .unwrap_or(defaults::DEFAULT_TOOLS_DIR),
    );
    let tasks_file = expand_path(
        parsed
            .tasks_file
            .as_deref()
            .unwrap_or(defaults::DEFAULT_TASKS_FILE),
    );

    Ok(super::AgentConfig {
        api_key,
        model,
        base_url,
        max_iterations,
        max_context_tokens,
        compression_threshold,
        tool_timeout_secs: parsed
            .tool_timeout_secs
            .unwrap_or(defaults::DEFAULT_TOOL_TIMEOUT_SECS),
        tools_dir,
        tasks_file,
        system_prompt: parsed.system_prompt,
    })
}
