//! Tool-result history compression.
//!
//! When the context reading crosses the threshold, contiguous runs of tool
//! results are folded into single summary messages. System, User, and
//! Assistant messages are never touched, and an already-folded message is
//! recognizable by its marker prefix so a second pass leaves it alone.

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::domain::types::{ChatMessage, MessageRole};
use crate::infrastructure::model::{ModelError, ModelProvider, ModelRequest};

/// Marker prefix of a folded tool-result message.
pub const COMPRESSED_PREFIX: &str = "[Compressed ";

const PLACEHOLDER_SUMMARY: &str =
    "summary unavailable; original tool results were dropped to reclaim context";

const SUMMARIZER_INSTRUCTION: &str = "You condense tool output for an agent's working memory. \
Reply with a summary of at most 200 words that keeps only facts relevant to the user's \
requests: identifiers, paths, values, errors, and outcomes. No preamble.";

/// What a compression pass produced.
#[derive(Debug, Clone)]
pub struct CompressionOutcome {
    pub messages: Vec<ChatMessage>,
    /// False when the history had no fresh tool-result runs; in that case
    /// `messages` equals the input and no model call was made.
    pub changed: bool,
    /// Tokens billed by the summarization sub-calls.
    pub tokens_used: u64,
}

/// Folds every fresh tool-result run into one summary message. A history
/// without such runs comes back unchanged and causes no model calls.
/// Summarization failures degrade to a placeholder; the originals are
/// dropped either way.
pub async fn compress_history<P: ModelProvider>(
    provider: &P,
    model: &str,
    messages: &[ChatMessage],
) -> CompressionOutcome {
    let runs = find_runs(messages);
    if runs.is_empty() {
        return CompressionOutcome {
            messages: messages.to_vec(),
            changed: false,
            tokens_used: 0,
        };
    }

    let user_context = user_context(messages);
    let mut result = Vec::with_capacity(messages.len());
    let mut tokens_used = 0u64;
    let mut i = 0;
    while i < messages.len() {
        let Some(&len) = runs.get(&i) else {
            result.push(messages[i].clone());
            i += 1;
            continue;
        };

        let run = &messages[i..i + len];
        let summary = match summarize(provider, model, run, &user_context).await {
            Ok((summary, tokens)) => {
                tokens_used += tokens;
                if summary.trim().is_empty() {
                    PLACEHOLDER_SUMMARY.to_string()
                } else {
                    summary.trim().to_string()
                }
            }
            Err(err) => {
                warn!(error = %err, "Tool-run summarization failed, using placeholder");
                PLACEHOLDER_SUMMARY.to_string()
            }
        };
        result.push(folded_message(run, &summary));
        i += len;
    }

    info!(
        runs = runs.len(),
        before = messages.len(),
        after = result.len(),
        "Compressed tool-result history"
    );
    CompressionOutcome {
        messages: result,
        changed: true,
        tokens_used,
    }
}

/// Start index and length of every maximal run of fresh tool messages.
fn find_runs(messages: &[ChatMessage]) -> BTreeMap<usize, usize> {
    let mut runs = BTreeMap::new();
    let mut i = 0;
    while i < messages.len() {
        if is_fresh_tool_message(&messages[i]) {
            let start = i;
            while i < messages.len() && is_fresh_tool_message(&messages[i]) {
                i += 1;
            }
            runs.insert(start, i - start);
        } else {
            i += 1;
        }
    }
    runs
}

fn is_fresh_tool_message(message: &ChatMessage) -> bool {
    message.role == MessageRole::Tool && !message.text().starts_with(COMPRESSED_PREFIX)
}

/// The replacement keeps the first message's correlation id so the transcript
/// still answers the assistant turn that announced the run.
fn folded_message(run: &[ChatMessage], summary: &str) -> ChatMessage {
    let first = &run[0];
    ChatMessage {
        role: MessageRole::Tool,
        content: Some(format!("{COMPRESSED_PREFIX}{} tool results] {summary}", run.len())),
        tool_calls: None,
        tool_call_id: first.tool_call_id.clone(),
        name: first.name.clone(),
    }
}

fn user_context(messages: &[ChatMessage]) -> Vec<String> {
    messages
        .iter()
        .filter(|message| message.role == MessageRole::User)
        .map(|message| message.text().to_string())
        .collect()
}

async fn summarize<P: ModelProvider>(
    provider: &P,
    model: &str,
    run: &[ChatMessage],
    user_context: &[String],
) -> Result<(String, u64), ModelError> {
    let mut material = String::new();
    if !user_context.is_empty() {
        material.push_str("User requests so far:\n");
        for request in user_context {
            material.push_str("- ");
            material.push_str(request);
            material.push('\n');
        }
        material.push('\n');
    }
    material.push_str("Tool results to condense:\n");
    for message in run {
        let name = message.name.as_deref().unwrap_or("tool");
        material.push_str(&format!("[{name}] {}\n", message.text()));
    }

    debug!(run_len = run.len(), "Requesting tool-run summary");
    let request = ModelRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(SUMMARIZER_INSTRUCTION),
            ChatMessage::user(material),
        ],
        tools: Vec::new(),
    };
    let response = provider.chat(request).await?;
    let tokens = response
        .usage
        .map(|usage| {
            if usage.total_tokens > 0 {
                usage.total_tokens
            } else {
                usage.prompt_tokens + usage.completion_tokens
            }
        })
        .unwrap_or(0);
    Ok((response.content.unwrap_or_default(), tokens))
}
