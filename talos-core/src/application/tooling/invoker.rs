use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::policy;
use super::process::TIMEOUT_EXIT_CODE;
use super::registry::ToolRegistry;

/// Reason string embedded in the refusal payload for a blocked command.
pub const CANCELLED_REASON: &str = "destructive_command_not_confirmed";

/// Outcome of a single invocation. `payload` is the structured value that
/// becomes the Tool message content; failures are values here, never errors,
/// so one bad call can never take down the loop.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub success: bool,
    pub exit_status: i32,
    pub cancelled: bool,
    pub payload: Value,
}

impl Invocation {
    fn failure(exit_status: i32, payload: Value) -> Self {
        Self {
            success: false,
            exit_status,
            cancelled: false,
            payload,
        }
    }

    fn refusal() -> Self {
        Self {
            success: false,
            exit_status: 1,
            cancelled: true,
            payload: json!({
                "success": false,
                "cancelled": true,
                "reason": CANCELLED_REASON,
            }),
        }
    }
}

/// Executes model-requested tool calls against the registry, enforcing the
/// destructive-command gate and the per-call timeout.
pub struct ToolInvoker {
    timeout: Duration,
}

impl ToolInvoker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs one call. `approved` states whether the confirmation gate holds a
    /// recorded human approval for this tool cycle; a `user_confirmed` flag in
    /// the arguments is honored only together with it.
    pub async fn invoke(
        &self,
        registry: &ToolRegistry,
        name: &str,
        raw_arguments: &str,
        approved: bool,
    ) -> Invocation {
        let Some(tool) = registry.get(name) else {
            warn!(tool = %name, "Model requested an unknown tool");
            return Invocation::failure(
                1,
                json!({"success": false, "exit_status": 1, "error": "Tool not found"}),
            );
        };

        let trimmed = raw_arguments.trim();
        let arguments: Value = if trimmed.is_empty() {
            json!({})
        } else {
            match serde_json::from_str(trimmed) {
                Ok(value) => value,
                Err(err) => {
                    warn!(tool = %name, error = %err, "Model produced unparseable tool arguments");
                    return Invocation::failure(
                        1,
                        json!({
                            "success": false,
                            "exit_status": 1,
                            "error": format!("invalid tool arguments: {err}"),
                        }),
                    );
                }
            }
        };

        if let Some(command) = arguments.get("command").and_then(Value::as_str) {
            if policy::is_destructive(command) {
                let confirmed = arguments
                    .get("user_confirmed")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if !(confirmed && approved) {
                    if confirmed {
                        warn!(
                            tool = %name,
                            "Model set user_confirmed without a recorded user approval, refusing"
                        );
                    } else {
                        info!(tool = %name, "Destructive command blocked pending user confirmation");
                    }
                    return Invocation::refusal();
                }
                info!(tool = %name, "User-approved destructive command, executing");
            }

            if policy::is_privileged(command) && !authenticate_privileged().await {
                return Invocation::failure(
                    1,
                    json!({
                        "success": false,
                        "exit_status": 1,
                        "error": "privileged command authentication failed",
                    }),
                );
            }
        }

        debug!(tool = %name, "Executing tool");
        let execution = match tool.execute(arguments, self.timeout).await {
            Ok(execution) => execution,
            Err(err) => {
                warn!(tool = %name, error = %err, "Tool execution failed before completion");
                return Invocation::failure(
                    1,
                    json!({
                        "success": false,
                        "exit_status": 1,
                        "error": format!("failed to execute tool: {err}"),
                    }),
                );
            }
        };

        if execution.timed_out {
            let timeout_secs = self.timeout.as_secs();
            return Invocation::failure(
                TIMEOUT_EXIT_CODE,
                json!({
                    "success": false,
                    "exit_status": TIMEOUT_EXIT_CODE,
                    "error": format!("Tool '{name}' timed out after {timeout_secs}s"),
                    "timeout": true,
                }),
            );
        }

        let success = execution.exit_code == 0;
        let mut payload = json!({
            "success": success,
            "exit_status": execution.exit_code,
            "result": parse_output(&execution.output),
        });
        if !success {
            payload["error"] = Value::String(format!(
                "tool exited with status {}",
                execution.exit_code
            ));
        }
        Invocation {
            success,
            exit_status: execution.exit_code,
            cancelled: false,
            payload,
        }
    }
}

/// Validates sudo credentials up front so the tool itself never blocks on a
/// password prompt. Runs with inherited stdio; the prompt goes straight to
/// the operator's terminal.
async fn authenticate_privileged() -> bool {
    info!("Privileged command requested, validating sudo credentials");
    match tokio::process::Command::new("sudo").arg("-v").status().await {
        Ok(status) if status.success() => true,
        Ok(_) => {
            warn!("sudo authentication was refused");
            false
        }
        Err(err) => {
            warn!(error = %err, "Could not run sudo for authentication");
            false
        }
    }
}

/// Tool output is embedded structurally when it is JSON, verbatim otherwise.
fn parse_output(output: &str) -> Value {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Value::String(String::new());
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}
