//! Report export: flatten a fetched report into a table and write it to the
//! export directory, or save a server-generated file as-is.
use chrono::Local;
use serde_json::json;
use std::sync::Arc;

use crate::api::ReportFilters;
use crate::export::{self, Sheet};
use crate::ipc::error::{backend_err, err, ok, HandlerErr};
use crate::ipc::helpers::{opt_date, opt_str, require_str};
use crate::ipc::types::{AppState, Request};
use crate::model::Report;

const KINDS: &[&str] = &["marks", "attendance", "comments"];

fn filters_from(params: &serde_json::Value) -> Result<ReportFilters, HandlerErr> {
    Ok(ReportFilters {
        class_id: opt_str(params, "classId"),
        academic_year: opt_str(params, "academicYear"),
        from: opt_date(params, "from")?,
        to: opt_date(params, "to")?,
    })
}

fn require_kind(params: &serde_json::Value) -> Result<String, HandlerErr> {
    let kind = require_str(params, "kind")?;
    if !KINDS.contains(&kind.as_str()) {
        return Err(HandlerErr::bad_params(format!(
            "kind must be one of: {}",
            KINDS.join(", ")
        )));
    }
    Ok(kind)
}

fn rows_for(kind: &str, report: &Report) -> Vec<Vec<export::Cell>> {
    match kind {
        "marks" => export::mark_rows(report),
        "attendance" => export::attendance_rows(report),
        _ => export::comment_rows(report),
    }
}

fn sheet_name(kind: &str) -> String {
    let mut name = kind.to_string();
    if let Some(first) = name.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    name
}

async fn handle_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let parsed = require_kind(&req.params).and_then(|kind| {
        let format = opt_str(&req.params, "format").unwrap_or_else(|| "xlsx".to_string());
        if format != "xlsx" && format != "csv" {
            return Err(HandlerErr::bad_params("format must be xlsx or csv"));
        }
        Ok((kind, format, filters_from(&req.params)?))
    });
    let (kind, format, filters) = match parsed {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    let backend = Arc::clone(&state.backend);
    let report = match backend.report_fetch(&kind, &filters).await {
        Ok(v) => v,
        Err(e) => return backend_err(state, &req.id, e),
    };

    let rows = rows_for(&kind, &report);
    let stamp = Local::now().format("%Y-%m-%d");
    let path = state.export_dir.join(format!("{kind}-report-{stamp}.{format}"));
    let written = if format == "xlsx" {
        export::write_workbook(
            &path,
            &[Sheet {
                name: sheet_name(&kind),
                rows,
            }],
        )
    } else {
        export::write_csv(&path, &rows)
    };
    match written {
        Ok(count) => ok(
            &req.id,
            json!({ "path": path.to_string_lossy(), "rows": count }),
        ),
        Err(e) => err(&req.id, "export_failed", format!("{e:#}"), None),
    }
}

async fn handle_download(state: &mut AppState, req: &Request) -> serde_json::Value {
    let parsed = require_kind(&req.params).and_then(|kind| Ok((kind, filters_from(&req.params)?)));
    let (kind, filters) = match parsed {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    let backend = Arc::clone(&state.backend);
    let download = match backend.report_download(&kind, &filters).await {
        Ok(v) => v,
        Err(e) => return backend_err(state, &req.id, e),
    };

    // Content-Disposition is untrusted input; keep it a bare file name.
    let filename = download.filename.replace(['/', '\\'], "_");
    let path = state.export_dir.join(filename);
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            return err(&req.id, "export_failed", e.to_string(), None);
        }
    }
    match std::fs::write(&path, &download.bytes) {
        Ok(()) => ok(
            &req.id,
            json!({ "path": path.to_string_lossy(), "bytes": download.bytes.len() }),
        ),
        Err(e) => err(&req.id, "export_failed", e.to_string(), None),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.export" => Some(handle_export(state, req).await),
        "reports.download" => Some(handle_download(state, req).await),
        _ => None,
    }
}
