use super::error::ConfigError;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Agent configuration loaded from config.toml plus environment overrides
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_iterations: u32,
    pub max_context_tokens: u64,
    pub compression_threshold: u64,
    pub tool_timeout_secs: u64,
    pub tools_dir: PathBuf,
    pub tasks_file: PathBuf,
    pub system_prompt: Option<String>,
}

impl AgentConfig {
    /// Load configuration from a file path (or the default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}
