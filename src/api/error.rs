use thiserror::Error;

/// Failure taxonomy for the school REST backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable response came back at all.
    #[error("network error: check your connection")]
    Transport(#[from] reqwest::Error),
    /// Non-2xx response; the body's `message`/`error` is surfaced verbatim
    /// when present.
    #[error("{message}")]
    Api { status: u16, message: String },
    /// A 401 anywhere. The dispatch layer tears the whole session down.
    #[error("session expired")]
    SessionExpired,
    /// A 2xx response whose body failed to parse.
    #[error("unexpected response body: {0}")]
    Decode(String),
    /// A request that could not even be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Stable error code surfaced to the shell.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Transport(_) => "network_error",
            ApiError::Api { .. } => "api_error",
            ApiError::SessionExpired => "session_expired",
            ApiError::Decode(_) => "bad_response",
            ApiError::InvalidRequest(_) => "api_error",
        }
    }

    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .or_else(|| v.get("error"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("request failed with status {status}"));
        ApiError::Api { status, message }
    }
}
