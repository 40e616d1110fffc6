use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::budget::TokenBudget;
use super::compaction;
use super::confirmation::{ConfirmationClassifier, KeywordClassifier, RETRY_AUTHORIZATION};
use super::errors::AgentError;
use super::models::{AgentOptions, AgentOutcome, ToolStep};
use super::session::AgentSession;
use super::tasks;
use crate::application::tooling::{ToolInvoker, ToolRegistry};
use crate::config::AgentConfig;
use crate::config::defaults::DEFAULT_SYSTEM_PROMPT;
use crate::domain::types::{ChatMessage, FinishReason};
use crate::infrastructure::model::{ModelProvider, ModelRequest, ModelResponse};

/// Replies that end a suspended session instead of continuing it.
const EXIT_WORDS: &[&str] = &["exit", "quit", "keluar"];

/// Source of literal human input during a suspension. Implementations show
/// the assistant's pending message, then read one line; `None` means the
/// input stream is closed.
#[async_trait]
pub trait UserInput: Send {
    async fn solicit(&mut self, assistant_message: &str) -> Result<Option<String>, std::io::Error>;
}

enum Resumption {
    Continue,
    End,
}

/// The iteration controller. Drives model passes, executes requested tools in
/// declaration order, folds history when the context fills up, and suspends
/// for the human when a destructive command waits on confirmation.
pub struct Agent<P: ModelProvider> {
    provider: P,
    config: AgentConfig,
    registry: ToolRegistry,
    invoker: ToolInvoker,
    classifier: Box<dyn ConfirmationClassifier>,
    input: Box<dyn UserInput>,
}

impl<P: ModelProvider> Agent<P> {
    pub fn new(
        provider: P,
        config: AgentConfig,
        registry: ToolRegistry,
        input: Box<dyn UserInput>,
    ) -> Self {
        let invoker = ToolInvoker::new(config.tool_timeout());
        Self {
            provider,
            config,
            registry,
            invoker,
            classifier: Box::new(KeywordClassifier),
            input,
        }
    }

    pub fn with_classifier(mut self, classifier: Box<dyn ConfirmationClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub async fn run(
        &mut self,
        query: impl Into<String>,
        options: AgentOptions,
    ) -> Result<AgentOutcome, AgentError> {
        let budget = TokenBudget::new(
            self.config.max_context_tokens,
            self.config.compression_threshold,
        );
        let mut session = AgentSession::new(budget);
        info!(
            run_id = %session.run_id(),
            model = %self.config.model,
            tools = self.registry.len(),
            "Agent run started"
        );

        let system_prompt = options
            .system_prompt
            .clone()
            .or_else(|| self.config.system_prompt.clone())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.trim().to_string());
        session.push_system(system_prompt);
        session.push_user(query);

        let mut steps: Vec<ToolStep> = Vec::new();

        loop {
            let iteration = session.begin_iteration();
            if iteration > self.config.max_iterations {
                warn!(
                    limit = self.config.max_iterations,
                    "Iteration limit reached without a final answer"
                );
                return Err(AgentError::IterationLimit {
                    limit: self.config.max_iterations,
                });
            }

            self.compress_if_needed(&mut session).await?;

            let response = self.call_model(&session).await?;
            if let Some(usage) = &response.usage {
                session.budget_mut().record_usage(usage);
            }

            match response.finish_reason.clone() {
                FinishReason::Stop => {
                    let content = response.content.clone().unwrap_or_default();
                    if content.trim().is_empty() {
                        return Err(AgentError::EmptyResponse);
                    }
                    session.push_assistant(ChatMessage::assistant(content.clone()));

                    let wants_input = options.interactive
                        || session.confirmation().needs_user_input()
                        || self.classifier.seeks_confirmation(&content);
                    if !wants_input {
                        return Ok(self.finish(&session, content, steps));
                    }

                    debug!(
                        interactive = options.interactive,
                        pending_confirmation = session.confirmation().needs_user_input(),
                        "Suspending for user input"
                    );
                    match self.suspend(&mut session, &content).await? {
                        Resumption::Continue => {}
                        Resumption::End => {
                            info!("User ended the session");
                            return Ok(self.finish(&session, content, steps));
                        }
                    }
                }
                FinishReason::ToolCalls => {
                    if response.tool_calls.is_empty() {
                        return Err(AgentError::EmptyResponse);
                    }
                    self.run_tool_cycle(&mut session, &response, &mut steps)
                        .await?;
                }
                FinishReason::Other(reason) => {
                    warn!(reason = %reason, "Model ended the turn with an unsupported finish reason");
                    return Err(AgentError::UnexpectedFinish { reason });
                }
            }
        }
    }

    /// One tool-calls cycle: record the assistant turn, spend any pending
    /// approval on it, then execute the calls one at a time in declaration
    /// order, answering each with a Tool message.
    async fn run_tool_cycle(
        &self,
        session: &mut AgentSession,
        response: &ModelResponse,
        steps: &mut Vec<ToolStep>,
    ) -> Result<(), AgentError> {
        let calls = response.tool_calls.clone();
        session.push_assistant(ChatMessage::assistant_tool_calls(
            response.content.clone(),
            calls.clone(),
        ));

        let approved = session.confirmation().user_just_confirmed();
        session.confirmation_mut().reset();

        for call in &calls {
            info!(tool = %call.function.name, call_id = %call.id, "Model requested tool execution");
            let invocation = self
                .invoker
                .invoke(
                    &self.registry,
                    &call.function.name,
                    &call.function.arguments,
                    approved,
                )
                .await;
            if invocation.cancelled {
                session.confirmation_mut().block();
            }

            steps.push(ToolStep {
                tool: call.function.name.clone(),
                arguments: parse_arguments(&call.function.arguments),
                success: invocation.success,
                exit_status: invocation.exit_status,
                cancelled: invocation.cancelled,
                output: invocation.payload.clone(),
                executed_at: Utc::now(),
            });

            let content = invocation.payload.to_string();
            session.push_tool(ChatMessage::tool(
                call.id.clone(),
                call.function.name.clone(),
                content,
            ))?;
        }
        Ok(())
    }

    async fn compress_if_needed(&self, session: &mut AgentSession) -> Result<(), AgentError> {
        if !session.budget().should_compress() {
            return Ok(());
        }
        info!(
            context_tokens = session.budget().current_context_tokens(),
            threshold = session.budget().compression_threshold(),
            "Context threshold crossed, compressing tool-result history"
        );
        let compression =
            compaction::compress_history(&self.provider, &self.config.model, session.messages())
                .await;
        session.budget_mut().record_sub_usage(compression.tokens_used);
        if compression.changed {
            session.replace_messages(compression.messages);
        }
        if session.budget().over_ceiling() {
            return Err(AgentError::ContextCeiling {
                tokens: session.budget().current_context_tokens(),
                max: session.budget().max_context_tokens(),
            });
        }
        Ok(())
    }

    async fn call_model(&self, session: &AgentSession) -> Result<ModelResponse, AgentError> {
        let mut messages = session.messages().to_vec();
        // The task board rides along for this call only, never persisted.
        if let Some(board) = tasks::status_message(&self.config.tasks_file) {
            messages.push(board);
        }
        debug!(
            messages = messages.len(),
            context_tokens = session.budget().current_context_tokens(),
            "Submitting turn to the model"
        );
        let request = ModelRequest {
            model: self.config.model.clone(),
            messages,
            tools: self.registry.schemas(),
        };
        Ok(self.provider.chat(request).await?)
    }

    async fn suspend(
        &mut self,
        session: &mut AgentSession,
        assistant_message: &str,
    ) -> Result<Resumption, AgentError> {
        loop {
            let line = self
                .input
                .solicit(assistant_message)
                .await
                .map_err(|source| AgentError::Input { source })?;
            let Some(reply) = line else {
                return Ok(Resumption::End);
            };
            let trimmed = reply.trim();
            if trimmed.is_empty() {
                continue;
            }
            if EXIT_WORDS.contains(&trimmed.to_lowercase().as_str()) {
                return Ok(Resumption::End);
            }
            if session.confirmation().needs_user_input() && self.classifier.is_affirmative(trimmed)
            {
                info!("User approved the blocked command, authorizing one retry");
                session.confirmation_mut().confirm();
                session.push_system(RETRY_AUTHORIZATION);
            } else {
                session.push_user(trimmed);
            }
            return Ok(Resumption::Continue);
        }
    }

    fn finish(&self, session: &AgentSession, response: String, steps: Vec<ToolStep>) -> AgentOutcome {
        info!(
            run_id = %session.run_id(),
            iterations = session.iterations(),
            tokens_used = session.budget().cumulative_used(),
            tool_steps = steps.len(),
            "Agent run finished"
        );
        AgentOutcome {
            run_id: session.run_id(),
            response,
            iterations: session.iterations(),
            tokens_used: session.budget().cumulative_used(),
            steps,
        }
    }
}

fn parse_arguments(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
