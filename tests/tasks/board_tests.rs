// Task board tests - loading tasks.json and building the per-call summary.

use std::fs;
use std::path::Path;
use tempfile::tempdir;

use talos_core::application::agent::{load_tasks, status_message, status_summary};
use talos_core::domain::types::{MessageRole, TaskItem, TaskStatus};

fn write_board(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("tasks.json");
    fs::write(&path, content).expect("Failed to write tasks.json");
    path
}

#[test]
fn loads_a_bare_task_array() {
    let dir = tempdir().expect("tempdir");
    let path = write_board(
        dir.path(),
        r#"[
            {"id": "1", "title": "Refactor loader", "status": "in_progress", "priority": "high"},
            {"id": "2", "title": "Write release notes", "status": "pending"}
        ]"#,
    );

    let tasks = load_tasks(&path).expect("board should load");
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].status, TaskStatus::InProgress);
    assert_eq!(tasks[0].priority.as_deref(), Some("high"));
    assert!(tasks[1].notes.is_none());
}

#[test]
fn loads_a_wrapped_board_object() {
    let dir = tempdir().expect("tempdir");
    let path = write_board(
        dir.path(),
        r#"{"tasks": [{"id": "1", "title": "Ship it", "status": "completed"}]}"#,
    );

    let tasks = load_tasks(&path).expect("board should load");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Ship it");
}

#[test]
fn missing_and_malformed_boards_are_ignored() {
    assert!(load_tasks(Path::new("/nonexistent/talos-tasks.json")).is_none());

    let dir = tempdir().expect("tempdir");
    let path = write_board(dir.path(), "not json at all {");
    assert!(load_tasks(&path).is_none());
}

#[test]
fn summary_counts_every_status_and_names_active_work() {
    let tasks = vec![
        TaskItem {
            id: "1".to_string(),
            title: "Migrate database".to_string(),
            status: TaskStatus::InProgress,
            notes: Some("waiting on backup".to_string()),
            priority: None,
        },
        TaskItem {
            id: "2".to_string(),
            title: "Update docs".to_string(),
            status: TaskStatus::Pending,
            notes: None,
            priority: None,
        },
        TaskItem {
            id: "3".to_string(),
            title: "Renew certificate".to_string(),
            status: TaskStatus::Blocked,
            notes: None,
            priority: None,
        },
    ];

    let summary = status_summary(&tasks);
    assert!(summary.starts_with("Task board: 3 tasks"));
    assert!(summary.contains("1 pending"));
    assert!(summary.contains("1 in progress"));
    assert!(summary.contains("0 completed"));
    assert!(summary.contains("1 blocked"));
    assert!(summary.contains("In progress: \"Migrate database\""));
    assert!(summary.contains("Blocked: \"Renew certificate\""));
}

#[test]
fn status_message_is_a_system_message() {
    let dir = tempdir().expect("tempdir");
    let path = write_board(
        dir.path(),
        r#"[{"id": "1", "title": "Ship it", "status": "pending"}]"#,
    );

    let message = status_message(&path).expect("board message should exist");
    assert_eq!(message.role, MessageRole::System);
    assert!(message.text().starts_with("Task board: 1 tasks"));
}

#[test]
fn an_empty_board_produces_no_message() {
    let dir = tempdir().expect("tempdir");
    let path = write_board(dir.path(), "[]");
    assert!(status_message(&path).is_none());

    assert!(status_message(Path::new("/nonexistent/talos-tasks.json")).is_none());
}
