use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::budget::TokenBudget;
use super::confirmation::ConfirmationState;
use super::errors::AgentError;
use crate::domain::types::{ChatMessage, MessageRole};

/// One agent run: the ordered transcript plus the loop state that travels
/// with it. The transcript is append-only; the single exception is the
/// wholesale replacement performed by history compression.
pub struct AgentSession {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    messages: Vec<ChatMessage>,
    budget: TokenBudget,
    confirmation: ConfirmationState,
    iterations: u32,
}

impl AgentSession {
    pub fn new(budget: TokenBudget) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            messages: Vec::new(),
            budget,
            confirmation: ConfirmationState::default(),
            iterations: 0,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn budget(&self) -> &TokenBudget {
        &self.budget
    }

    pub fn budget_mut(&mut self) -> &mut TokenBudget {
        &mut self.budget
    }

    pub fn confirmation(&self) -> &ConfirmationState {
        &self.confirmation
    }

    pub fn confirmation_mut(&mut self) -> &mut ConfirmationState {
        &mut self.confirmation
    }

    /// Count of model passes so far; increments before each pass.
    pub fn begin_iteration(&mut self) -> u32 {
        self.iterations += 1;
        self.iterations
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn push_system(&mut self, content: impl Into<String>) {
        self.append(ChatMessage::system(content));
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.append(ChatMessage::user(content));
    }

    /// Appends an assistant turn, with or without tool calls.
    pub fn push_assistant(&mut self, message: ChatMessage) {
        debug_assert_eq!(message.role, MessageRole::Assistant);
        self.append(message);
    }

    /// Appends a tool result. The referenced call id must have been announced
    /// by a prior assistant message; anything else is a loop bug.
    pub fn push_tool(&mut self, message: ChatMessage) -> Result<(), AgentError> {
        debug_assert_eq!(message.role, MessageRole::Tool);
        let id = message.tool_call_id.clone().unwrap_or_default();
        if id.is_empty() || !self.has_announced_call(&id) {
            return Err(AgentError::OrphanToolMessage { id });
        }
        self.append(message);
        Ok(())
    }

    /// Swap in the compressed transcript. The context reading falls back to
    /// the serialized-length heuristic until the next response reports usage.
    pub(crate) fn replace_messages(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
        let len = self.serialized_len();
        self.budget.re_estimate(len);
    }

    fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
        if self.budget.is_estimated() {
            let len = self.serialized_len();
            self.budget.re_estimate(len);
        }
    }

    fn has_announced_call(&self, id: &str) -> bool {
        self.messages.iter().any(|message| {
            message.role == MessageRole::Assistant
                && message.calls().iter().any(|call| call.id == id)
        })
    }

    fn serialized_len(&self) -> usize {
        serde_json::to_string(&self.messages)
            .map(|serialized| serialized.len())
            .unwrap_or(0)
    }
}
