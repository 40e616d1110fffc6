pub mod app;
pub mod defaults;
pub mod error;
pub mod loader;

/// Default config file path - can be overridden via CLI argument
pub const CONFIG_PATH: &str = "~/.config/talos/config.toml";

pub use app::AgentConfig;
pub use error::ConfigError;
