use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;

use super::error::ToolError;

/// Declarative description of one tool, as advertised to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: Option<String>,
    /// JSON-schema object for the tool's arguments.
    pub parameters: Option<Value>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameters: None,
        }
    }

    /// Chat-completions wire form: `{"type":"function","function":{...}}`.
    pub fn to_wire(&self) -> Value {
        let parameters = self
            .parameters
            .clone()
            .unwrap_or_else(|| json!({"type": "object", "properties": {}}));
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description.clone().unwrap_or_default(),
                "parameters": parameters,
            }
        })
    }
}

/// Raw capture of one tool execution: combined output and exit code.
///
/// A timed-out run carries exit code 124 with `timed_out` set; the invoker
/// turns that into the structured payload fed back to the model.
#[derive(Debug, Clone)]
pub struct ToolExecution {
    pub exit_code: i32,
    pub output: String,
    pub timed_out: bool,
}

impl ToolExecution {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// The capability every registered tool exposes: a schema and an execute
/// operation. Implementations decide how execution happens (the shipped one
/// spawns an external process).
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn descriptor(&self) -> ToolDescriptor;

    async fn execute(&self, arguments: Value, timeout: Duration) -> Result<ToolExecution, ToolError>;
}
