// Confirmation gate tests - approval classification and the one-shot rule.
//
// The end-to-end case drives a scripted conversation in which the model tries
// to reuse an approval for a second destructive command.

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use talos_core::application::agent::{
    Agent, AgentOptions, ConfirmationClassifier, ConfirmationState, KeywordClassifier,
    RETRY_AUTHORIZATION, UserInput,
};
use talos_core::application::tooling::{Tool, ToolDescriptor, ToolError, ToolExecution, ToolRegistry};
use talos_core::config::AgentConfig;
use talos_core::domain::types::{FinishReason, TokenUsage, ToolCall};
use talos_core::infrastructure::model::{ModelError, ModelProvider, ModelRequest, ModelResponse};

#[test]
fn approvals_are_whole_reply_keywords() {
    let classifier = KeywordClassifier;
    for reply in ["yes", "Y", " ok ", "OKAY", "confirm", "proceed!", "ya", "setuju", "boleh"] {
        assert!(classifier.is_affirmative(reply), "expected approval: {reply:?}");
    }
    for reply in [
        "no",
        "never",
        "yes and then delete everything else too",
        "okey-dokey",
        "proceeding",
        "",
    ] {
        assert!(!classifier.is_affirmative(reply), "expected refusal: {reply:?}");
    }
}

#[test]
fn confirmation_questions_require_phrase_and_question_mark() {
    let classifier = KeywordClassifier;
    assert!(classifier.seeks_confirmation("Are you sure you want to remove the cache?"));
    assert!(classifier.seeks_confirmation("Should I proceed with the cleanup?"));
    assert!(classifier.seeks_confirmation("Apakah Anda yakin ingin menghapus berkas ini?"));
    assert!(!classifier.seeks_confirmation("The cache was removed."));
    assert!(!classifier.seeks_confirmation("Are you sure you want this."));
    assert!(!classifier.seeks_confirmation("Which file should be kept?"));
}

#[test]
fn gate_flags_reset_as_one_unit() {
    let mut state = ConfirmationState::default();
    assert!(!state.needs_user_input());
    assert!(!state.user_just_confirmed());

    state.block();
    state.confirm();
    assert!(state.needs_user_input());
    assert!(state.user_just_confirmed());

    state.reset();
    assert!(!state.needs_user_input());
    assert!(!state.user_just_confirmed());
}

#[test]
fn authorization_message_grants_exactly_one_retry() {
    assert!(RETRY_AUTHORIZATION.contains("\"user_confirmed\": true"));
    assert!(RETRY_AUTHORIZATION.contains("single retry"));
}

struct ScriptedProvider {
    responses: Mutex<Vec<ModelResponse>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ModelResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
        }
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn chat(&self, _request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let mut responses = self.responses.lock().expect("responses lock");
        if responses.is_empty() {
            return Err(ModelError::api("scripted responses exhausted"));
        }
        Ok(responses.remove(0))
    }
}

struct ScriptedInput {
    replies: Vec<Option<String>>,
}

#[async_trait]
impl UserInput for ScriptedInput {
    async fn solicit(&mut self, _assistant_message: &str) -> Result<Option<String>, std::io::Error> {
        if self.replies.is_empty() {
            Ok(None)
        } else {
            Ok(self.replies.remove(0))
        }
    }
}

struct MarkerTool {
    executions: Arc<Mutex<Vec<Value>>>,
}

#[async_trait]
impl Tool for MarkerTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("shell")
    }

    async fn execute(
        &self,
        arguments: Value,
        _timeout: Duration,
    ) -> Result<ToolExecution, ToolError> {
        self.executions
            .lock()
            .expect("executions lock")
            .push(arguments);
        Ok(ToolExecution {
            exit_code: 0,
            output: r#"{"ok":true}"#.to_string(),
            timed_out: false,
        })
    }
}

fn config() -> AgentConfig {
    AgentConfig {
        api_key: "sk-test".to_string(),
        model: "test-model".to_string(),
        base_url: "http://localhost".to_string(),
        max_iterations: 10,
        max_context_tokens: 100_000,
        compression_threshold: 80_000,
        tool_timeout_secs: 5,
        tools_dir: PathBuf::from("/nonexistent/talos-tools"),
        tasks_file: PathBuf::from("/nonexistent/talos-tasks.json"),
        system_prompt: None,
    }
}

fn stop(content: &str) -> ModelResponse {
    ModelResponse {
        content: Some(content.to_string()),
        tool_calls: Vec::new(),
        finish_reason: FinishReason::Stop,
        usage: Some(TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 10,
            total_tokens: 110,
        }),
    }
}

fn destructive_call(id: &str, confirmed: bool) -> ModelResponse {
    let arguments = if confirmed {
        r#"{"command":"rm -rf /srv/data","user_confirmed":true}"#
    } else {
        r#"{"command":"rm -rf /srv/data"}"#
    };
    ModelResponse {
        content: None,
        tool_calls: vec![ToolCall::function_call(id, "shell", arguments)],
        finish_reason: FinishReason::ToolCalls,
        usage: Some(TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 20,
            total_tokens: 120,
        }),
    }
}

#[tokio::test]
async fn an_approval_does_not_carry_over_to_the_next_cycle() {
    let executions = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(MarkerTool {
            executions: executions.clone(),
        }))
        .expect("registration should succeed");

    let provider = ScriptedProvider::new(vec![
        destructive_call("call_1", false),
        stop("Perintah diblokir. Apakah Anda yakin ingin melanjutkan?"),
        destructive_call("call_2", true),
        // The model immediately tries a second destructive command, reusing
        // the flag without a fresh approval.
        destructive_call("call_3", true),
        stop("Saya berhenti; perintah kedua butuh persetujuan baru?"),
    ]);
    let input = ScriptedInput {
        replies: vec![Some("ya".to_string())],
    };
    let mut agent = Agent::new(provider, config(), registry, Box::new(input));

    let outcome = agent
        .run("bersihkan /srv/data", AgentOptions::default())
        .await
        .expect("run should finish");

    // Only the authorized retry executed; the banked flag was refused.
    let recorded = executions.lock().expect("executions lock");
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0]["user_confirmed"], true);

    assert_eq!(outcome.steps.len(), 3);
    assert!(outcome.steps[0].cancelled);
    assert!(outcome.steps[1].success);
    assert!(outcome.steps[2].cancelled);
}
