//! Analytics passthroughs: the backend computes these; the sidecar just
//! forwards filters and hands the JSON back.
use std::sync::Arc;

use crate::api::ReportFilters;
use crate::ipc::error::{backend_err, ok, HandlerErr};
use crate::ipc::helpers::{opt_date, opt_str};
use crate::ipc::types::{AppState, Request};

fn filters_from(params: &serde_json::Value) -> Result<ReportFilters, HandlerErr> {
    Ok(ReportFilters {
        class_id: opt_str(params, "classId"),
        academic_year: opt_str(params, "academicYear"),
        from: opt_date(params, "from")?,
        to: opt_date(params, "to")?,
    })
}

async fn handle(state: &mut AppState, req: &Request, marks: bool) -> serde_json::Value {
    let filters = match filters_from(&req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let backend = Arc::clone(&state.backend);
    let result = if marks {
        backend.analytics_marks(&filters).await
    } else {
        backend.analytics_attendance(&filters).await
    };
    match result {
        Ok(value) => ok(&req.id, value),
        Err(e) => backend_err(state, &req.id, e),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.attendance" => Some(handle(state, req, false).await),
        "analytics.marks" => Some(handle(state, req, true).await),
        _ => None,
    }
}
