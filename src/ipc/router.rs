use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;

/// Methods served without a live session.
fn is_open_method(method: &str) -> bool {
    matches!(
        method,
        "health" | "session.login" | "session.logout" | "session.status"
    )
}

pub async fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    if !is_open_method(&req.method) && state.session.is_none() {
        return err(&req.id, "no_session", "not logged in", None);
    }

    if let Some(resp) = handlers::core::try_handle(state, &req).await {
        return resp;
    }
    if let Some(resp) = handlers::directory::try_handle(state, &req).await {
        return resp;
    }
    if let Some(resp) = handlers::dashboard::try_handle(state, &req).await {
        return resp;
    }
    if let Some(resp) = handlers::attendance::try_handle(state, &req).await {
        return resp;
    }
    if let Some(resp) = handlers::marks::try_handle(state, &req).await {
        return resp;
    }
    if let Some(resp) = handlers::comments::try_handle(state, &req).await {
        return resp;
    }
    if let Some(resp) = handlers::reports::try_handle(state, &req).await {
        return resp;
    }
    if let Some(resp) = handlers::analytics::try_handle(state, &req).await {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
