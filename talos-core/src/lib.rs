//! Core engine of the Talos command-line agent.
//!
//! The crate wires four layers together:
//! - `domain` holds the chat transcript and task-board types.
//! - `config` loads the TOML configuration with environment overrides.
//! - `infrastructure::model` speaks the chat-completions protocol behind the
//!   [`ModelProvider`](infrastructure::model::ModelProvider) trait.
//! - `application` holds the tooling layer (discovery, registry, invoker) and
//!   the agent loop itself.
//!
//! A typical embedding builds a [`ToolRegistry`] from a
//! [`FolderDiscovery`](application::tooling::FolderDiscovery), constructs an
//! [`Agent`] with a provider and an input source, and calls
//! [`Agent::run`](application::agent::Agent::run).

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::agent::{Agent, AgentError, AgentOptions, AgentOutcome, UserInput};
pub use application::tooling::ToolRegistry;
pub use config::{AgentConfig, ConfigError};
