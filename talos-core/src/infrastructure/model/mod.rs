//! Model infrastructure module
//!
//! HTTP chat-completions access behind the `ModelProvider` trait.
//!
//! # Structure
//! - `types` - Request, Response, Error types
//! - `traits` - ModelProvider trait
//! - `clients` - HTTP client implementations

pub mod clients;
pub mod traits;
pub mod types;

pub use clients::OpenAIClient;
pub use traits::ModelProvider;
pub use types::{ModelError, ModelRequest, ModelResponse};
