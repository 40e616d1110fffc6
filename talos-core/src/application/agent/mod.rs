//! The agent loop and its supporting state: transcript, token budget,
//! history compression, and the destructive-command confirmation gate.

mod budget;
mod compaction;
mod confirmation;
mod errors;
mod models;
mod runner;
mod session;
mod tasks;


pub use budget::TokenBudget;
pub use compaction::{COMPRESSED_PREFIX, CompressionOutcome, compress_history};
pub use confirmation::{
    ConfirmationClassifier, ConfirmationState, KeywordClassifier, RETRY_AUTHORIZATION,
};
pub use errors::AgentError;
pub use models::{AgentOptions, AgentOutcome, ToolStep};
pub use runner::{Agent, UserInput};
pub use session::AgentSession;
pub use tasks::{load_tasks, status_message, status_summary};
