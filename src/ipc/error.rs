use serde_json::json;

use crate::api::ApiError;
use crate::ipc::types::AppState;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

/// Map a backend failure to an error envelope. A 401 tears the whole session
/// down before the error is surfaced, so the shell can redirect to login.
pub fn backend_err(state: &mut AppState, id: &str, e: ApiError) -> serde_json::Value {
    if matches!(e, ApiError::SessionExpired) {
        state.clear_session();
    }
    let details = match &e {
        ApiError::Api { status, .. } => Some(json!({ "status": status })),
        _ => None,
    };
    err(id, e.code(), e.to_string(), details)
}
