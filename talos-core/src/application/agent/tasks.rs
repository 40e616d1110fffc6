//! Read-only task board injection.
//!
//! When a task file exists next to the agent's config, every model call gets
//! an ephemeral System message summarizing it. The file is never written and
//! the summary is never persisted into the transcript.

use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

use crate::domain::types::{ChatMessage, TaskItem, TaskStatus};

/// Loads the task board. A missing file is the normal case and yields `None`;
/// an unreadable or malformed file is logged and also yields `None`.
pub fn load_tasks(path: &Path) -> Option<Vec<TaskItem>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "No task board to inject");
            return None;
        }
    };
    match parse_tasks(&raw) {
        Some(tasks) => Some(tasks),
        None => {
            warn!(path = %path.display(), "Task board is not valid JSON, ignoring it");
            None
        }
    }
}

/// One-paragraph board summary: counts per status plus the titles currently
/// in progress or blocked.
pub fn status_summary(tasks: &[TaskItem]) -> String {
    let mut pending = 0usize;
    let mut in_progress = 0usize;
    let mut completed = 0usize;
    let mut blocked = 0usize;
    for task in tasks {
        match task.status {
            TaskStatus::Pending => pending += 1,
            TaskStatus::InProgress => in_progress += 1,
            TaskStatus::Completed => completed += 1,
            TaskStatus::Blocked => blocked += 1,
        }
    }

    let mut summary = format!(
        "Task board: {} tasks - {} pending, {} in progress, {} completed, {} blocked.",
        tasks.len(),
        pending,
        in_progress,
        completed,
        blocked
    );
    if let Some(titles) = titles_with(tasks, TaskStatus::InProgress) {
        summary.push_str(&format!(" In progress: {titles}."));
    }
    if let Some(titles) = titles_with(tasks, TaskStatus::Blocked) {
        summary.push_str(&format!(" Blocked: {titles}."));
    }
    summary
}

/// The ephemeral System message for one model call, or `None` when there is
/// no board or it is empty.
pub fn status_message(path: &Path) -> Option<ChatMessage> {
    let tasks = load_tasks(path)?;
    if tasks.is_empty() {
        return None;
    }
    Some(ChatMessage::system(status_summary(&tasks)))
}

fn parse_tasks(raw: &str) -> Option<Vec<TaskItem>> {
    if let Ok(tasks) = serde_json::from_str::<Vec<TaskItem>>(raw) {
        return Some(tasks);
    }

    #[derive(Deserialize)]
    struct Board {
        tasks: Vec<TaskItem>,
    }
    serde_json::from_str::<Board>(raw).ok().map(|board| board.tasks)
}

fn titles_with(tasks: &[TaskItem], status: TaskStatus) -> Option<String> {
    let titles: Vec<String> = tasks
        .iter()
        .filter(|task| task.status == status)
        .map(|task| format!("\"{}\"", task.title))
        .collect();
    if titles.is_empty() {
        None
    } else {
        Some(titles.join(", "))
    }
}
