//! Narrative comments: teacher comments carry success story / challenge,
//! mentor comments carry model lesson / lesson observation. The role check
//! happens here; the backend stores whatever passes it.
use serde_json::json;
use std::sync::Arc;

use crate::api::CommentFilters;
use crate::ipc::error::{backend_err, ok, HandlerErr};
use crate::ipc::helpers::{opt_date, opt_parsed, opt_str, payload_from, require_date, require_parsed, require_str};
use crate::ipc::types::{AppState, Request};
use crate::model::CommenterRole;

const COMMENT_FIELDS: &[&str] = &[
    "classId",
    "schoolId",
    "commenterRole",
    "numberOfStudents",
    "date",
    "successStory",
    "challenge",
    "modelLesson",
    "lessonObservation",
];
const TEACHER_ONLY: &[&str] = &["successStory", "challenge"];
const MENTOR_ONLY: &[&str] = &["modelLesson", "lessonObservation"];

fn has_field(params: &serde_json::Value, key: &str) -> bool {
    params.get(key).map(|v| !v.is_null()).unwrap_or(false)
}

fn check_role_fields(
    params: &serde_json::Value,
    role: CommenterRole,
) -> Result<(), HandlerErr> {
    let forbidden = match role {
        CommenterRole::Teacher => MENTOR_ONLY,
        CommenterRole::Mentor => TEACHER_ONLY,
    };
    for key in forbidden {
        if has_field(params, key) {
            return Err(HandlerErr::bad_params(format!(
                "{key} is not a {} field",
                match role {
                    CommenterRole::Teacher => "teacher",
                    CommenterRole::Mentor => "mentor",
                }
            )));
        }
    }
    Ok(())
}

async fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let parsed = (|| {
        Ok::<_, HandlerErr>(CommentFilters {
            class_id: opt_str(&req.params, "classId"),
            commenter_role: opt_parsed(&req.params, "commenterRole")?,
            from: opt_date(&req.params, "from")?,
            to: opt_date(&req.params, "to")?,
        })
    })();
    let filters = match parsed {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let backend = Arc::clone(&state.backend);
    match backend.comments_list(&filters).await {
        Ok(comments) => ok(&req.id, json!({ "comments": comments })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let checked = (|| {
        require_str(&req.params, "classId")?;
        require_date(&req.params, "date")?;
        let role: CommenterRole = require_parsed(&req.params, "commenterRole")?;
        check_role_fields(&req.params, role)
    })();
    if let Err(e) = checked {
        return e.response(&req.id);
    }
    let backend = Arc::clone(&state.backend);
    match backend
        .comment_create(payload_from(&req.params, COMMENT_FIELDS))
        .await
    {
        Ok(comment) => ok(&req.id, json!({ "comment": comment })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let checked = (|| {
        let id = require_str(&req.params, "id")?;
        if let Some(role) = opt_parsed::<CommenterRole>(&req.params, "commenterRole")? {
            check_role_fields(&req.params, role)?;
        }
        Ok::<_, HandlerErr>(id)
    })();
    let id = match checked {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let backend = Arc::clone(&state.backend);
    match backend
        .comment_update(&id, payload_from(&req.params, COMMENT_FIELDS))
        .await
    {
        Ok(comment) => ok(&req.id, json!({ "comment": comment })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match require_str(&req.params, "id") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let backend = Arc::clone(&state.backend);
    match backend.comment_delete(&id).await {
        Ok(()) => ok(&req.id, json!({ "deleted": id })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "comments.list" => Some(handle_list(state, req).await),
        "comments.create" => Some(handle_create(state, req).await),
        "comments.update" => Some(handle_update(state, req).await),
        "comments.delete" => Some(handle_delete(state, req).await),
        _ => None,
    }
}
