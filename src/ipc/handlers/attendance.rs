//! Attendance data entry: open a class+date context, stage per-student
//! statuses, and reconcile the buffer against the backend on save.
//!
//! Creates go out as one bulk call, updates individually; the per-student
//! save path never submits an empty entry, while the whole-class path
//! defaults untouched students to absent.
use serde_json::json;
use std::sync::Arc;

use crate::api::{ApiError, AttendanceFilters, StudentFilters};
use crate::ipc::error::{backend_err, err, ok, HandlerErr};
use crate::ipc::helpers::{opt_parsed, opt_str, require_date, require_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{AttendanceRecord, AttendanceStatus, NewAttendance, Student};
use crate::roster::{AttendanceCtx, EditBuffer, SavePlan, SlotKey};
use crate::summary;

fn ctx_from(params: &serde_json::Value) -> Result<AttendanceCtx, HandlerErr> {
    Ok(AttendanceCtx {
        class_id: require_str(params, "classId")?,
        date: require_date(params, "date")?,
    })
}

/// Merge a server record back under the record's OWN (student, class, date),
/// not the context the user happens to have active.
fn merge_record(buf: &mut EditBuffer<AttendanceCtx, AttendanceStatus>, rec: &AttendanceRecord) {
    let ctx = AttendanceCtx {
        class_id: rec.class_id.id().to_string(),
        date: rec.date,
    };
    buf.merge_saved(rec.student_id.id(), &ctx, rec.id.clone(), rec.status);
}

fn entries_view(
    buf: &EditBuffer<AttendanceCtx, AttendanceStatus>,
    ctx: &AttendanceCtx,
    roster: &[Student],
) -> Vec<serde_json::Value> {
    roster
        .iter()
        .map(|s| {
            let slot = buf.slot(&s.id, ctx);
            json!({
                "studentId": s.id,
                "studentName": s.student_name,
                "entered": slot.and_then(|sl| sl.entered),
                "saved": slot.and_then(|sl| sl.saved),
                "recordId": slot.and_then(|sl| sl.saved_record_id.clone()),
            })
        })
        .collect()
}

fn roster_ids(state: &AppState, class_id: &str) -> Option<Vec<String>> {
    state
        .rosters
        .get(class_id)
        .map(|roster| roster.iter().map(|s| s.id.clone()).collect())
}

async fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match ctx_from(&req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let backend = Arc::clone(&state.backend);
    let student_filters = StudentFilters {
        class_id: Some(ctx.class_id.clone()),
        ..Default::default()
    };
    let attendance_filters = AttendanceFilters {
        class_id: Some(ctx.class_id.clone()),
        date: Some(ctx.date),
        ..Default::default()
    };
    let fetched = futures::try_join!(
        backend.students_list(&student_filters),
        backend.attendance_list(&attendance_filters),
    );
    let (roster, records) = match fetched {
        Ok(v) => v,
        Err(e) => return backend_err(state, &req.id, e),
    };

    for rec in &records {
        merge_record(&mut state.attendance_buf, rec);
    }
    state.rosters.insert(ctx.class_id.clone(), roster.clone());

    let ids: Vec<String> = roster.iter().map(|s| s.id.clone()).collect();
    ok(
        &req.id,
        json!({
            "entries": entries_view(&state.attendance_buf, &ctx, &roster),
            "records": records,
            "dirty": state.attendance_buf.is_dirty(&ctx, &ids),
        }),
    )
}

fn handle_stage(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match ctx_from(&req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let student_id = match require_str(&req.params, "studentId") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let status: Option<AttendanceStatus> = match opt_parsed(&req.params, "status") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    state.attendance_buf.stage(&student_id, &ctx, status);
    let ids = roster_ids(state, &ctx.class_id).unwrap_or_default();
    ok(
        &req.id,
        json!({ "dirty": state.attendance_buf.is_dirty(&ctx, &ids) }),
    )
}

async fn run_save(
    state: &mut AppState,
    ctx: &AttendanceCtx,
    plan: SavePlan<AttendanceStatus>,
) -> Result<(usize, usize), ApiError> {
    let backend = Arc::clone(&state.backend);
    let mut created = 0usize;
    if !plan.creates.is_empty() {
        let records: Vec<NewAttendance> = plan
            .creates
            .iter()
            .map(|(student_id, status)| NewAttendance {
                student_id: student_id.clone(),
                class_id: ctx.class_id.clone(),
                date: ctx.date,
                status: *status,
                remarks: None,
            })
            .collect();
        // The create batch is awaited before any merge-back.
        let returned = backend.attendance_bulk_create(&records).await?;
        created = returned.len();
        for rec in &returned {
            merge_record(&mut state.attendance_buf, rec);
        }
    }

    let update_futs: Vec<_> = plan
        .updates
        .iter()
        .map(|u| backend.attendance_update(&u.record_id, json!({ "status": u.value })))
        .collect();
    let returned = futures::future::try_join_all(update_futs).await?;
    for rec in &returned {
        merge_record(&mut state.attendance_buf, rec);
    }
    Ok((created, returned.len()))
}

async fn handle_save(state: &mut AppState, req: &Request, whole_class: bool) -> serde_json::Value {
    let ctx = match ctx_from(&req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let Some(ids) = roster_ids(state, &ctx.class_id) else {
        return err(
            &req.id,
            "bad_params",
            "class roster not loaded; call attendance.open first",
            None,
        );
    };

    let plan = if whole_class {
        state
            .attendance_buf
            .plan_save_all(&ctx, &ids, AttendanceStatus::Absent)
    } else {
        if !state.attendance_buf.is_dirty(&ctx, &ids) {
            return err(&req.id, "no_changes", "nothing to save", None);
        }
        state.attendance_buf.plan_save(&ctx, &ids)
    };
    if plan.is_empty() {
        return err(&req.id, "no_changes", "nothing to save", None);
    }

    let keys: Vec<SlotKey<AttendanceCtx>> = plan
        .creates
        .iter()
        .map(|(student_id, _)| student_id)
        .chain(plan.updates.iter().map(|u| &u.student_id))
        .map(|student_id| SlotKey {
            student_id: student_id.clone(),
            ctx: ctx.clone(),
        })
        .collect();
    if keys.iter().any(|k| state.saving_attendance.contains(k)) {
        return err(
            &req.id,
            "save_in_progress",
            "a save for this student is already in flight",
            None,
        );
    }
    state.saving_attendance.extend(keys.iter().cloned());

    let outcome = run_save(state, &ctx, plan).await;
    // Cleared on every exit path so a failed save never wedges the buffer.
    for key in &keys {
        state.saving_attendance.remove(key);
    }

    match outcome {
        Ok((created, updated)) => ok(
            &req.id,
            json!({
                "created": created,
                "updated": updated,
                "dirty": state.attendance_buf.is_dirty(&ctx, &ids),
            }),
        ),
        Err(e) => backend_err(state, &req.id, e),
    }
}

async fn handle_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let date = match require_date(&req.params, "date") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let filters = AttendanceFilters {
        class_id: opt_str(&req.params, "classId"),
        date: Some(date),
        ..Default::default()
    };
    let backend = Arc::clone(&state.backend);
    let records = match backend.attendance_list(&filters).await {
        Ok(v) => v,
        Err(e) => return backend_err(state, &req.id, e),
    };
    ok(
        &req.id,
        json!({
            "summary": summary::summarize(&records, date),
            "perClass": summary::per_class(&records, date),
        }),
    )
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.open" => Some(handle_open(state, req).await),
        "attendance.stage" => Some(handle_stage(state, req)),
        "attendance.save" => Some(handle_save(state, req, false).await),
        "attendance.saveAll" => Some(handle_save(state, req, true).await),
        "attendance.summary" => Some(handle_summary(state, req).await),
        _ => None,
    }
}
