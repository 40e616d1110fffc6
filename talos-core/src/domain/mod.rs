pub mod types;

pub use types::{
    ChatMessage, FinishReason, FunctionCall, MessageRole, TaskItem, TaskStatus, TokenUsage,
    ToolCall,
};
