// History compression tests - folding tool-result runs through the public API.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use talos_core::application::agent::{COMPRESSED_PREFIX, compress_history};
use talos_core::domain::types::{ChatMessage, FinishReason, MessageRole, TokenUsage, ToolCall};
use talos_core::infrastructure::model::{ModelError, ModelProvider, ModelRequest, ModelResponse};

struct PanickingProvider;

#[async_trait]
impl ModelProvider for PanickingProvider {
    async fn chat(&self, _request: ModelRequest) -> Result<ModelResponse, ModelError> {
        panic!("no summarization call was expected");
    }
}

struct ScriptedSummarizer {
    summaries: Mutex<Vec<(String, u64)>>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
}

impl ScriptedSummarizer {
    fn new(summaries: Vec<(&str, u64)>) -> Self {
        Self {
            summaries: Mutex::new(
                summaries
                    .into_iter()
                    .map(|(text, tokens)| (text.to_string(), tokens))
                    .collect(),
            ),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl ModelProvider for ScriptedSummarizer {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        self.requests.lock().expect("request lock").push(request);
        let (content, tokens) = {
            let mut summaries = self.summaries.lock().expect("summaries lock");
            if summaries.is_empty() {
                return Err(ModelError::api("scripted summaries exhausted"));
            }
            summaries.remove(0)
        };
        Ok(ModelResponse {
            content: Some(content),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
            usage: Some(TokenUsage {
                prompt_tokens: 0,
                completion_tokens: 0,
                total_tokens: tokens,
            }),
        })
    }
}

struct FailingProvider;

#[async_trait]
impl ModelProvider for FailingProvider {
    async fn chat(&self, _request: ModelRequest) -> Result<ModelResponse, ModelError> {
        Err(ModelError::api("summarizer unavailable"))
    }
}

fn tool_msg(id: &str, content: &str) -> ChatMessage {
    ChatMessage::tool(id, "shell", content)
}

#[tokio::test]
async fn a_history_without_fresh_tool_runs_is_returned_untouched() {
    let plain = vec![
        ChatMessage::system("You are helpful."),
        ChatMessage::user("hello"),
        ChatMessage::assistant("hi"),
    ];
    let outcome = compress_history(&PanickingProvider, "test-model", &plain).await;
    assert!(!outcome.changed);
    assert_eq!(outcome.tokens_used, 0);
    assert_eq!(outcome.messages.len(), plain.len());

    // Previously folded results count as already compressed, not as fresh.
    let folded_only = vec![
        ChatMessage::user("hello"),
        tool_msg("call_1", "[Compressed 3 tool results] old summary"),
        ChatMessage::assistant("done"),
    ];
    let outcome = compress_history(&PanickingProvider, "test-model", &folded_only).await;
    assert!(!outcome.changed);
    assert_eq!(outcome.messages[1].text(), "[Compressed 3 tool results] old summary");
}

#[tokio::test]
async fn a_tool_run_folds_to_one_summary_keeping_the_first_id() {
    let provider = ScriptedSummarizer::new(vec![("disk usage sits at 93%", 40)]);
    let history = vec![
        ChatMessage::system("You are helpful."),
        ChatMessage::user("check the disk"),
        ChatMessage::assistant_tool_calls(
            None,
            vec![
                ToolCall::function_call("call_1", "shell", r#"{"command":"df -h"}"#),
                ToolCall::function_call("call_2", "shell", r#"{"command":"du -sh /var"}"#),
            ],
        ),
        tool_msg("call_1", "Filesystem use 93%"),
        tool_msg("call_2", "4.2G /var"),
        ChatMessage::assistant("The disk is nearly full."),
    ];

    let outcome = compress_history(&provider, "test-model", &history).await;

    assert!(outcome.changed);
    assert_eq!(outcome.tokens_used, 40);
    assert_eq!(outcome.messages.len(), 5);
    let folded = &outcome.messages[3];
    assert_eq!(folded.role, MessageRole::Tool);
    assert_eq!(folded.text(), "[Compressed 2 tool results] disk usage sits at 93%");
    assert_eq!(folded.tool_call_id.as_deref(), Some("call_1"));
    // Everything that is not a tool result survives verbatim.
    assert_eq!(outcome.messages[0].text(), "You are helpful.");
    assert_eq!(outcome.messages[1].text(), "check the disk");
    assert_eq!(outcome.messages[4].text(), "The disk is nearly full.");

    // The summarizer saw the raw outputs and the user's request, with no tools.
    let requests = provider.requests.lock().expect("request lock");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].tools.is_empty());
    assert_eq!(requests[0].messages[0].role, MessageRole::System);
    let material = requests[0].messages[1].text();
    assert!(material.contains("check the disk"));
    assert!(material.contains("Filesystem use 93%"));
    assert!(material.contains("4.2G /var"));
}

#[tokio::test]
async fn each_run_consumes_the_next_summary_in_order() {
    let provider = ScriptedSummarizer::new(vec![("first batch", 30), ("second batch", 25)]);
    let history = vec![
        ChatMessage::user("do two things"),
        tool_msg("call_1", "alpha"),
        ChatMessage::assistant("halfway"),
        tool_msg("call_2", "beta"),
        tool_msg("call_3", "gamma"),
    ];

    let outcome = compress_history(&provider, "test-model", &history).await;

    assert!(outcome.changed);
    assert_eq!(outcome.tokens_used, 55);
    assert_eq!(outcome.messages.len(), 4);
    assert_eq!(outcome.messages[1].text(), "[Compressed 1 tool results] first batch");
    assert_eq!(outcome.messages[1].tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(outcome.messages[3].text(), "[Compressed 2 tool results] second batch");
    assert_eq!(outcome.messages[3].tool_call_id.as_deref(), Some("call_2"));
}

#[tokio::test]
async fn summarization_failure_degrades_to_a_placeholder() {
    let history = vec![
        ChatMessage::user("inspect"),
        tool_msg("call_1", "very long output"),
        tool_msg("call_2", "more output"),
    ];

    let outcome = compress_history(&FailingProvider, "test-model", &history).await;

    assert!(outcome.changed);
    assert_eq!(outcome.tokens_used, 0);
    assert_eq!(outcome.messages.len(), 2);
    let folded = outcome.messages[1].text();
    assert!(folded.starts_with("[Compressed 2 tool results]"));
    assert!(folded.contains("summary unavailable"));
    assert!(!folded.contains("very long output"));
}

#[tokio::test]
async fn a_blank_summary_degrades_to_a_placeholder() {
    let provider = ScriptedSummarizer::new(vec![("   ", 10)]);
    let history = vec![ChatMessage::user("inspect"), tool_msg("call_1", "output")];

    let outcome = compress_history(&provider, "test-model", &history).await;

    assert!(outcome.changed);
    assert!(outcome.messages[1].text().contains("summary unavailable"));
}

#[tokio::test]
async fn a_second_pass_over_folded_history_changes_nothing() {
    let provider = ScriptedSummarizer::new(vec![("condensed", 20)]);
    let history = vec![
        ChatMessage::user("inspect"),
        tool_msg("call_1", "raw output"),
        ChatMessage::assistant("done"),
    ];

    let first = compress_history(&provider, "test-model", &history).await;
    assert!(first.changed);
    assert!(first.messages[1].text().starts_with(COMPRESSED_PREFIX));

    let second = compress_history(&PanickingProvider, "test-model", &first.messages).await;
    assert!(!second.changed);
    assert_eq!(second.messages.len(), first.messages.len());
}
