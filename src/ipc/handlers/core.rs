use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::sync::Arc;

use crate::ipc::error::{backend_err, ok, HandlerErr};
use crate::ipc::helpers::require_str;
use crate::ipc::types::{AppState, Request, Session};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

pub fn is_valid_email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

fn handle_health(state: &AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "loggedIn": state.session.is_some(),
        }),
    )
}

async fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    // Local validation short-circuits before any network call.
    let parsed = require_str(&req.params, "email").and_then(|email| {
        let password = require_str(&req.params, "password")?;
        if !is_valid_email(&email) {
            return Err(HandlerErr::bad_params("invalid email address"));
        }
        Ok((email, password))
    });
    let (email, password) = match parsed {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    let backend = Arc::clone(&state.backend);
    match backend.login(&email, &password).await {
        Ok(resp) => {
            state.backend.set_token(Some(resp.token.clone()));
            state.session = Some(Session {
                token: resp.token,
                user: resp.user.clone(),
            });
            ok(&req.id, json!({ "user": resp.user }))
        }
        Err(e) => backend_err(state, &req.id, e),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.clear_session();
    ok(&req.id, json!({ "loggedIn": false }))
}

fn handle_status(state: &AppState, req: &Request) -> serde_json::Value {
    match &state.session {
        Some(session) => ok(
            &req.id,
            json!({ "loggedIn": true, "user": session.user }),
        ),
        None => ok(&req.id, json!({ "loggedIn": false })),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "session.login" => Some(handle_login(state, req).await),
        "session.logout" => Some(handle_logout(state, req)),
        "session.status" => Some(handle_status(state, req)),
        _ => None,
    }
}
