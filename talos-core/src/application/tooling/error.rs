use thiserror::Error;

/// Failures raised by the tooling layer. Execution-level failures (non-zero
/// exit, timeout) are not errors here; they travel inside `ToolExecution` so
/// the model can react to them.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool '{name}' is already registered")]
    DuplicateName { name: String },

    #[error("failed to spawn tool '{tool}'")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o failure while running tool '{tool}'")]
    Io {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("tool '{tool}' returned an invalid definition")]
    InvalidDefinition {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("tool '{tool}' did not answer the definition request in time")]
    DefinitionTimeout { tool: String },
}

impl ToolError {
    pub fn spawn(tool: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            tool: tool.into(),
            source,
        }
    }

    pub fn io(tool: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            tool: tool.into(),
            source,
        }
    }
}
