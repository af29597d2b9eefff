//! Thin CRUD passthroughs for the directory resources: schools, classes,
//! students and users. Required-field checks short-circuit locally; the
//! backend's own validation errors come back through `backend_err`.
use serde_json::json;
use std::sync::Arc;

use crate::api::{ClassFilters, StudentFilters, UserFilters};
use crate::ipc::error::{backend_err, ok, HandlerErr};
use crate::ipc::helpers::{opt_str, payload_from, require_str};
use crate::ipc::types::{AppState, Request};

use super::core::is_valid_email;

const SCHOOL_FIELDS: &[&str] = &["name", "address", "principal", "phone", "email"];
const CLASS_FIELDS: &[&str] = &[
    "className",
    "subjectName",
    "classRoom",
    "classCredit",
    "schoolId",
];
const STUDENT_FIELDS: &[&str] = &["studentName", "classId", "schoolId"];
const USER_FIELDS: &[&str] = &["name", "email", "role", "password", "schoolId"];

async fn schools_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = Arc::clone(&state.backend);
    match backend.schools_list().await {
        Ok(schools) => ok(&req.id, json!({ "schools": schools })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn school_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(e) = require_str(&req.params, "name") {
        return e.response(&req.id);
    }
    let backend = Arc::clone(&state.backend);
    match backend
        .school_create(payload_from(&req.params, SCHOOL_FIELDS))
        .await
    {
        Ok(school) => ok(&req.id, json!({ "school": school })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn school_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match require_str(&req.params, "id") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let backend = Arc::clone(&state.backend);
    match backend
        .school_update(&id, payload_from(&req.params, SCHOOL_FIELDS))
        .await
    {
        Ok(school) => ok(&req.id, json!({ "school": school })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn school_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match require_str(&req.params, "id") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let backend = Arc::clone(&state.backend);
    match backend.school_delete(&id).await {
        Ok(()) => ok(&req.id, json!({ "deleted": id })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let filters = ClassFilters {
        school_id: opt_str(&req.params, "schoolId"),
    };
    let backend = Arc::clone(&state.backend);
    match backend.classes_list(&filters).await {
        Ok(classes) => ok(&req.id, json!({ "classes": classes })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn class_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match require_str(&req.params, "id") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let backend = Arc::clone(&state.backend);
    match backend.class_get(&id).await {
        Ok(class) => ok(&req.id, json!({ "class": class })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn class_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(e) = require_str(&req.params, "className") {
        return e.response(&req.id);
    }
    let backend = Arc::clone(&state.backend);
    match backend
        .class_create(payload_from(&req.params, CLASS_FIELDS))
        .await
    {
        Ok(class) => ok(&req.id, json!({ "class": class })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn class_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match require_str(&req.params, "id") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let backend = Arc::clone(&state.backend);
    match backend
        .class_update(&id, payload_from(&req.params, CLASS_FIELDS))
        .await
    {
        Ok(class) => ok(&req.id, json!({ "class": class })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn class_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match require_str(&req.params, "id") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let backend = Arc::clone(&state.backend);
    match backend.class_delete(&id).await {
        Ok(()) => ok(&req.id, json!({ "deleted": id })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let filters = StudentFilters {
        class_id: opt_str(&req.params, "classId"),
        school_id: opt_str(&req.params, "schoolId"),
    };
    let backend = Arc::clone(&state.backend);
    match backend.students_list(&filters).await {
        Ok(students) => ok(&req.id, json!({ "students": students })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn student_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let checked = require_str(&req.params, "studentName")
        .and_then(|_| require_str(&req.params, "classId"));
    if let Err(e) = checked {
        return e.response(&req.id);
    }
    let backend = Arc::clone(&state.backend);
    match backend
        .student_create(payload_from(&req.params, STUDENT_FIELDS))
        .await
    {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn student_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match require_str(&req.params, "id") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let backend = Arc::clone(&state.backend);
    match backend
        .student_update(&id, payload_from(&req.params, STUDENT_FIELDS))
        .await
    {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn student_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match require_str(&req.params, "id") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let backend = Arc::clone(&state.backend);
    match backend.student_delete(&id).await {
        Ok(()) => ok(&req.id, json!({ "deleted": id })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn users_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let filters = UserFilters {
        role: opt_str(&req.params, "role"),
    };
    let backend = Arc::clone(&state.backend);
    match backend.users_list(&filters).await {
        Ok(users) => ok(&req.id, json!({ "users": users })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

fn validate_new_user(params: &serde_json::Value) -> Result<(), HandlerErr> {
    require_str(params, "name")?;
    let email = require_str(params, "email")?;
    if !is_valid_email(&email) {
        return Err(HandlerErr::bad_params("invalid email address"));
    }
    require_str(params, "role")?;
    let password = require_str(params, "password")?;
    let confirm = require_str(params, "confirmPassword")?;
    if password != confirm {
        return Err(HandlerErr::bad_params("passwords do not match"));
    }
    Ok(())
}

async fn user_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(e) = validate_new_user(&req.params) {
        return e.response(&req.id);
    }
    let backend = Arc::clone(&state.backend);
    match backend
        .user_create(payload_from(&req.params, USER_FIELDS))
        .await
    {
        Ok(user) => ok(&req.id, json!({ "user": user })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn user_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match require_str(&req.params, "id") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    if let Some(email) = opt_str(&req.params, "email") {
        if !is_valid_email(&email) {
            return HandlerErr::bad_params("invalid email address").response(&req.id);
        }
    }
    let backend = Arc::clone(&state.backend);
    match backend
        .user_update(&id, payload_from(&req.params, USER_FIELDS))
        .await
    {
        Ok(user) => ok(&req.id, json!({ "user": user })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn user_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match require_str(&req.params, "id") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let backend = Arc::clone(&state.backend);
    match backend.user_delete(&id).await {
        Ok(()) => ok(&req.id, json!({ "deleted": id })),
        Err(e) => backend_err(state, &req.id, e),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "schools.list" => Some(schools_list(state, req).await),
        "schools.create" => Some(school_create(state, req).await),
        "schools.update" => Some(school_update(state, req).await),
        "schools.delete" => Some(school_delete(state, req).await),
        "classes.list" => Some(classes_list(state, req).await),
        "classes.get" => Some(class_get(state, req).await),
        "classes.create" => Some(class_create(state, req).await),
        "classes.update" => Some(class_update(state, req).await),
        "classes.delete" => Some(class_delete(state, req).await),
        "students.list" => Some(students_list(state, req).await),
        "students.create" => Some(student_create(state, req).await),
        "students.update" => Some(student_update(state, req).await),
        "students.delete" => Some(student_delete(state, req).await),
        "users.list" => Some(users_list(state, req).await),
        "users.create" => Some(user_create(state, req).await),
        "users.update" => Some(user_update(state, req).await),
        "users.delete" => Some(user_delete(state, req).await),
        _ => None,
    }
}
