//! External tool processes.
//!
//! Every discovered tool is an executable speaking a two-command protocol:
//! `<tool> get_definition` prints the tool's JSON schema on stdout, and
//! `<tool> execute '<argsJSON>'` runs it with the given arguments. The exit
//! code carries success or failure.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use super::error::ToolError;
use super::interface::{Tool, ToolDescriptor, ToolExecution};

/// Exit code reported for a run that was killed at its deadline, matching the
/// convention of coreutils `timeout`.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// How long a terminated process group gets to exit before SIGKILL.
const KILL_GRACE: Duration = Duration::from_secs(2);

/// A tool backed by an executable on disk.
pub struct ProcessTool {
    name: String,
    binary: PathBuf,
    descriptor: ToolDescriptor,
}

impl ProcessTool {
    pub fn new(name: impl Into<String>, binary: impl Into<PathBuf>, descriptor: ToolDescriptor) -> Self {
        Self {
            name: name.into(),
            binary: binary.into(),
            descriptor,
        }
    }

    /// Asks the executable for its definition and builds the tool from the
    /// answer. A binary that hangs, exits non-zero, or prints something that
    /// is not a JSON object is rejected.
    pub async fn load(
        name: impl Into<String>,
        binary: impl Into<PathBuf>,
        definition_timeout: Duration,
    ) -> Result<Self, ToolError> {
        let name = name.into();
        let binary = binary.into();

        let mut command = Command::new(&binary);
        command
            .arg("get_definition")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(definition_timeout, command.output()).await {
            Ok(result) => result.map_err(|source| ToolError::spawn(name.as_str(), source))?,
            Err(_) => return Err(ToolError::DefinitionTimeout { tool: name }),
        };

        if !output.status.success() {
            return Err(ToolError::io(
                name.as_str(),
                std::io::Error::other(format!(
                    "get_definition exited with status {}",
                    output.status.code().unwrap_or(-1)
                )),
            ));
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        let descriptor = parse_definition(&name, &raw)?;
        debug!(tool = %name, path = %binary.display(), "Loaded tool definition");

        Ok(Self {
            name,
            binary,
            descriptor,
        })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl Tool for ProcessTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> ToolDescriptor {
        self.descriptor.clone()
    }

    async fn execute(&self, arguments: Value, timeout: Duration) -> Result<ToolExecution, ToolError> {
        let payload = arguments.to_string();

        let mut command = Command::new(&self.binary);
        command
            .arg("execute")
            .arg(&payload)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout can take down the whole subtree.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|source| ToolError::spawn(self.name.as_str(), source))?;
        let group = child.id();

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_task = tokio::spawn(read_stream(stdout));
        let stderr_task = tokio::spawn(read_stream(stderr));

        let started = Instant::now();
        let (exit_code, timed_out) = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => (status.code().unwrap_or(-1), false),
            Ok(Err(source)) => {
                terminate_group(&mut child, group).await;
                return Err(ToolError::io(self.name.as_str(), source));
            }
            Err(_) => {
                warn!(
                    tool = %self.name,
                    timeout_secs = timeout.as_secs(),
                    "Tool run exceeded its timeout, terminating process group"
                );
                terminate_group(&mut child, group).await;
                (TIMEOUT_EXIT_CODE, true)
            }
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();
        let output = combine_output(stdout, stderr);

        debug!(
            tool = %self.name,
            exit_code,
            timed_out,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tool process finished"
        );

        Ok(ToolExecution {
            exit_code,
            output,
            timed_out,
        })
    }
}

async fn read_stream<R>(stream: Option<R>) -> String
where
    R: tokio::io::AsyncRead + Unpin + Send,
{
    let Some(mut stream) = stream else {
        return String::new();
    };
    let mut buffer = Vec::new();
    let _ = stream.read_to_end(&mut buffer).await;
    String::from_utf8_lossy(&buffer).into_owned()
}

fn combine_output(stdout: String, stderr: String) -> String {
    if stderr.trim().is_empty() {
        return stdout;
    }
    if stdout.trim().is_empty() {
        return stderr;
    }
    format!("{stdout}\n{stderr}")
}

/// SIGTERM the group, wait out the grace period, then SIGKILL whatever is
/// left. Always reaps the direct child.
#[cfg(unix)]
async fn terminate_group(child: &mut Child, group: Option<u32>) {
    let Some(pid) = group else {
        let _ = child.kill().await;
        return;
    };
    signal_group(pid, libc::SIGTERM);
    if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_err() {
        signal_group(pid, libc::SIGKILL);
        let _ = child.wait().await;
    }
}

#[cfg(not(unix))]
async fn terminate_group(child: &mut Child, _group: Option<u32>) {
    let _ = child.kill().await;
}

/// The child is its own group leader, so the group id equals its pid.
#[cfg(unix)]
fn signal_group(pid: u32, signal: i32) {
    unsafe {
        libc::killpg(pid as libc::pid_t, signal);
    }
}

fn parse_definition(name: &str, raw: &str) -> Result<ToolDescriptor, ToolError> {
    let value: Value = serde_json::from_str(raw.trim()).map_err(|source| ToolError::InvalidDefinition {
        tool: name.to_string(),
        source,
    })?;

    // Accept both a bare definition and one wrapped in the wire envelope.
    let body = value.get("function").cloned().unwrap_or(value);

    let mut descriptor = ToolDescriptor::new(name);
    descriptor.description = body
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);
    descriptor.parameters = body.get("parameters").filter(|p| p.is_object()).cloned();
    Ok(descriptor)
}
