use thiserror::Error;

use crate::infrastructure::model::ModelError;

/// Terminal failures of an agent run. Tool-level failures never appear here;
/// they are fed back to the model as structured results instead.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("iteration limit of {limit} reached without a final answer")]
    IterationLimit { limit: u32 },

    #[error("context still holds ~{tokens} tokens after compression, ceiling is {max}")]
    ContextCeiling { tokens: u64, max: u64 },

    #[error("model ended the turn with unexpected finish reason '{reason}'")]
    UnexpectedFinish { reason: String },

    #[error("model response carried neither content nor tool calls")]
    EmptyResponse,

    #[error("tool message references unknown call id '{id}'")]
    OrphanToolMessage { id: String },

    #[error("failed to read user input")]
    Input {
        #[source]
        source: std::io::Error,
    },
}

impl AgentError {
    /// Short operator-facing description, aligned with the console language.
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Model(err) => err.user_message(),
            AgentError::IterationLimit { limit } => {
                format!("Agen berhenti setelah {limit} iterasi tanpa jawaban akhir.")
            }
            AgentError::ContextCeiling { .. } => {
                "Riwayat percakapan tetap melebihi batas konteks meskipun sudah dikompresi."
                    .to_string()
            }
            AgentError::UnexpectedFinish { reason } => {
                format!("Model mengakhiri giliran dengan alasan tak terduga: {reason}.")
            }
            AgentError::EmptyResponse => "Model mengembalikan respons kosong.".to_string(),
            AgentError::OrphanToolMessage { .. } => {
                "Terjadi ketidaksesuaian internal pada riwayat percakapan.".to_string()
            }
            AgentError::Input { .. } => "Gagal membaca input dari pengguna.".to_string(),
        }
    }
}
