// Config loading tests - AgentConfig::load error handling and precedence.
//
// Validation reads TALOS_* environment overrides, so every test runs
// serially and scrubs the variables it depends on.

use serial_test::serial;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

use talos_core::config::{AgentConfig, ConfigError, defaults};

/// Write a config.toml with the given content to the temp directory
fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, content).expect("Failed to write config.toml");
    path
}

/// Remove every TALOS_* override so a test sees only its own file
fn clear_env() {
    for name in ["TALOS_API_KEY", "TALOS_MODEL", "TALOS_BASE_URL"] {
        unsafe { std::env::remove_var(name) };
    }
}

#[test]
#[serial]
fn returns_error_when_explicit_file_not_found() {
    let result = AgentConfig::load(Some(Path::new("/nonexistent/talos/config.toml")));
    assert!(matches!(result, Err(ConfigError::NotFound { .. })));
}

#[test]
#[serial]
fn full_file_parses_and_tilde_paths_expand() {
    clear_env();
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
api_key = "sk-from-file"
model = "gpt-4o"
base_url = "https://llm.internal/v1"
max_iterations = 12
max_context_tokens = 50000
compression_threshold = 40000
tool_timeout_secs = 30
tools_dir = "~/talos-tools"
tasks_file = "~/talos-tasks.json"
system_prompt = "Jawab dengan singkat."
"#,
    );

    let config = AgentConfig::load(Some(&path)).expect("full config should load");
    assert_eq!(config.api_key, "sk-from-file");
    assert_eq!(config.model, "gpt-4o");
    assert_eq!(config.base_url, "https://llm.internal/v1");
    assert_eq!(config.max_iterations, 12);
    assert_eq!(config.max_context_tokens, 50_000);
    assert_eq!(config.compression_threshold, 40_000);
    assert_eq!(config.tool_timeout_secs, 30);
    assert_eq!(config.system_prompt.as_deref(), Some("Jawab dengan singkat."));
    assert!(!config.tools_dir.to_string_lossy().starts_with('~'));
    assert!(config.tools_dir.ends_with("talos-tools"));
    assert!(!config.tasks_file.to_string_lossy().starts_with('~'));
}

#[test]
#[serial]
fn defaults_fill_everything_but_the_api_key() {
    clear_env();
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "api_key = \"sk-minimal\"\n");

    let config = AgentConfig::load(Some(&path)).expect("minimal config should load");
    assert_eq!(config.model, defaults::DEFAULT_MODEL);
    assert_eq!(config.base_url, defaults::DEFAULT_BASE_URL);
    assert_eq!(config.max_iterations, defaults::DEFAULT_MAX_ITERATIONS);
    assert_eq!(config.max_context_tokens, defaults::DEFAULT_MAX_CONTEXT_TOKENS);
    assert_eq!(
        config.compression_threshold,
        defaults::DEFAULT_COMPRESSION_THRESHOLD
    );
    assert_eq!(config.tool_timeout_secs, defaults::DEFAULT_TOOL_TIMEOUT_SECS);
    assert!(config.system_prompt.is_none());
}

#[test]
#[serial]
fn environment_overrides_beat_the_file() {
    clear_env();
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
api_key = "sk-from-file"
model = "file-model"
base_url = "https://file.example/v1"
"#,
    );

    unsafe {
        std::env::set_var("TALOS_API_KEY", "sk-from-env");
        std::env::set_var("TALOS_MODEL", "env-model");
        std::env::set_var("TALOS_BASE_URL", "https://env.example/v1");
    }
    let config = AgentConfig::load(Some(&path));
    clear_env();

    let config = config.expect("config should load");
    assert_eq!(config.api_key, "sk-from-env");
    assert_eq!(config.model, "env-model");
    assert_eq!(config.base_url, "https://env.example/v1");
}

#[test]
#[serial]
fn returns_error_when_api_key_missing_everywhere() {
    clear_env();
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "model = \"gpt-4o\"\n");

    let result = AgentConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::MissingApiKey)));
}

#[test]
#[serial]
fn a_blank_api_key_counts_as_missing() {
    clear_env();
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "api_key = \"   \"\n");

    let result = AgentConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::MissingApiKey)));
}

#[test]
#[serial]
fn returns_error_when_threshold_is_not_below_max() {
    clear_env();
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
api_key = "sk-test"
max_context_tokens = 200
compression_threshold = 200
"#,
    );

    let result = AgentConfig::load(Some(&path));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidBudget {
            threshold: 200,
            max: 200
        })
    ));
}

#[test]
#[serial]
fn returns_error_when_max_iterations_is_zero() {
    clear_env();
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "api_key = \"sk-test\"\nmax_iterations = 0\n");

    let result = AgentConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::InvalidIterations)));
}

#[test]
#[serial]
fn returns_error_when_toml_is_invalid() {
    clear_env();
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "model = [unclosed\n");

    let result = AgentConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}
