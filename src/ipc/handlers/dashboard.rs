//! Dashboard bootstrap: one parallel fetch of the reference collections plus
//! today's attendance summary.
use chrono::Local;
use serde_json::json;
use std::sync::Arc;

use crate::api::{AttendanceFilters, ClassFilters, CommentFilters, StudentFilters, UserFilters};
use crate::ipc::error::{backend_err, ok};
use crate::ipc::helpers::opt_str;
use crate::ipc::types::{AppState, Request};
use crate::summary;

async fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let school_id = opt_str(&req.params, "schoolId");
    let backend = Arc::clone(&state.backend);

    let class_filters = ClassFilters {
        school_id: school_id.clone(),
    };
    let student_filters = StudentFilters {
        school_id,
        ..Default::default()
    };
    let user_filters = UserFilters::default();
    let comment_filters = CommentFilters::default();
    // The reference collections are independent; fetch them in flight
    // together.
    let fetched = futures::try_join!(
        backend.classes_list(&class_filters),
        backend.students_list(&student_filters),
        backend.users_list(&user_filters),
        backend.comments_list(&comment_filters),
    );
    let (classes, students, users, comments) = match fetched {
        Ok(v) => v,
        Err(e) => return backend_err(state, &req.id, e),
    };

    let today = Local::now().date_naive();
    let attendance = match backend
        .attendance_list(&AttendanceFilters {
            date: Some(today),
            ..Default::default()
        })
        .await
    {
        Ok(v) => v,
        Err(e) => return backend_err(state, &req.id, e),
    };

    let counts = json!({
        "classes": classes.len(),
        "students": students.len(),
        "users": users.len(),
        "comments": comments.len(),
    });
    ok(
        &req.id,
        json!({
            "classes": classes,
            "students": students,
            "users": users,
            "comments": comments,
            "counts": counts,
            "todayAttendance": summary::summarize(&attendance, today),
            "classAttendance": summary::per_class(&attendance, today),
        }),
    )
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.open" => Some(handle_open(state, req).await),
        _ => None,
    }
}
