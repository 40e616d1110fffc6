use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Per-run options supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct AgentOptions {
    /// Replaces the built-in system prompt when set.
    pub system_prompt: Option<String>,
    /// Suspend for human input after every assistant answer instead of only
    /// when a confirmation is pending.
    pub interactive: bool,
}

/// Record of one executed (or refused) tool call.
#[derive(Debug, Clone)]
pub struct ToolStep {
    pub tool: String,
    pub arguments: Value,
    pub success: bool,
    pub exit_status: i32,
    pub cancelled: bool,
    pub output: Value,
    pub executed_at: DateTime<Utc>,
}

/// Final result of a finished run.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub run_id: Uuid,
    pub response: String,
    pub iterations: u32,
    /// Total tokens billed across every model call of the run, compression
    /// sub-calls included.
    pub tokens_used: u64,
    pub steps: Vec<ToolStep>,
}
