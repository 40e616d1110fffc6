//! Model types - Request, Response, and Error types

use crate::domain::{ChatMessage, FinishReason, TokenUsage, ToolCall};
use reqwest::StatusCode;
use thiserror::Error;

const MAX_ERROR_BODY: usize = 600;

/// Model request for LLM chat
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Wire-format tool schemas. Empty when no tools are registered.
    pub tools: Vec<serde_json::Value>,
}

/// Model response from LLM
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: FinishReason,
    pub usage: Option<TokenUsage>,
}

/// Model errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("API key is not configured")]
    MissingApiKey,
    #[error("network error calling model endpoint: {source}")]
    Network {
        #[source]
        source: reqwest::Error,
    },
    #[error("model endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("model API reported an error: {message}")]
    Api { message: String },
    #[error("malformed model response: {reason}")]
    Malformed { reason: String },
}

impl ModelError {
    pub fn network(source: reqwest::Error) -> Self {
        Self::Network { source }
    }

    pub fn http(status: u16, body: impl Into<String>) -> Self {
        let mut body: String = body.into();
        if body.len() > MAX_ERROR_BODY {
            let mut end = MAX_ERROR_BODY;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            body.truncate(end);
            body.push_str("...");
        }
        Self::Http { status, body }
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    /// User-friendly error message in Indonesian
    pub fn user_message(&self) -> String {
        match self {
            ModelError::MissingApiKey => {
                "API key belum dikonfigurasi. Setel TALOS_API_KEY atau api_key pada berkas konfigurasi.".to_string()
            }
            ModelError::Network { source } => {
                if source.is_connect() {
                    "Tidak dapat terhubung ke endpoint model.".to_string()
                } else if source.is_timeout() {
                    "Permintaan ke endpoint model melebihi batas waktu.".to_string()
                } else {
                    "Kesalahan jaringan saat menghubungi endpoint model.".to_string()
                }
            }
            ModelError::Http { status, .. } => match StatusCode::from_u16(*status) {
                Ok(StatusCode::UNAUTHORIZED) | Ok(StatusCode::FORBIDDEN) => {
                    "API key ditolak oleh penyedia model.".to_string()
                }
                Ok(StatusCode::NOT_FOUND) => {
                    "Endpoint model tidak ditemukan. Periksa pengaturan base_url.".to_string()
                }
                Ok(StatusCode::TOO_MANY_REQUESTS) => {
                    "Penyedia model membatasi permintaan. Coba lagi nanti.".to_string()
                }
                Ok(StatusCode::SERVICE_UNAVAILABLE) | Ok(StatusCode::BAD_GATEWAY) => {
                    "Penyedia model sedang tidak tersedia.".to_string()
                }
                _ => format!("Request ke penyedia model gagal: {status}"),
            },
            ModelError::Api { message } => {
                format!("Penyedia model menolak permintaan: {message}")
            }
            ModelError::Malformed { .. } => {
                "Respons dari penyedia model tidak valid.".to_string()
            }
        }
    }
}
