//! Marks data entry for a class + academic period: staged entries are
//! clamped to the exam's ceiling, creates are batched through the bare-array
//! bulk endpoint, updates go out per record.
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::api::{ApiError, MarksFilters, StudentFilters};
use crate::ipc::error::{backend_err, err, ok, HandlerErr};
use crate::ipc::helpers::{opt_parsed, opt_str, require_parsed, require_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{ExamType, Mark, NewMark, Student};
use crate::roster::{clamp_entry, EditBuffer, MarksCtx, SavePlan, SlotKey};

const DEFAULT_OUT_OF: f64 = 100.0;

fn ctx_from(params: &serde_json::Value) -> Result<MarksCtx, HandlerErr> {
    Ok(MarksCtx {
        class_id: require_str(params, "classId")?,
        academic_year: require_str(params, "academicYear")?,
        term: require_parsed(params, "academicTerm")?,
        exam_type: require_parsed(params, "examType")?,
    })
}

fn merge_record(buf: &mut EditBuffer<MarksCtx, f64>, mark: &Mark) {
    let ctx = MarksCtx {
        class_id: mark.class_id.id().to_string(),
        academic_year: mark.academic_year.clone(),
        term: mark.academic_term,
        exam_type: mark.exam_type,
    };
    buf.merge_saved(mark.student_id.id(), &ctx, mark.id.clone(), mark.total_marks);
}

fn entries_view(
    buf: &EditBuffer<MarksCtx, f64>,
    ctx: &MarksCtx,
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
    let out_of = match opt_parsed::<f64>(&req.params, "outOf") {
        Ok(v) => v.unwrap_or(DEFAULT_OUT_OF),
        Err(e) => return e.response(&req.id),
    };
    if !(out_of > 0.0) {
        return err(&req.id, "bad_params", "outOf must be positive", None);
    }

    let backend = Arc::clone(&state.backend);
    let student_filters = StudentFilters {
        class_id: Some(ctx.class_id.clone()),
        ..Default::default()
    };
    let marks_filters = MarksFilters {
        class_id: Some(ctx.class_id.clone()),
        academic_year: Some(ctx.academic_year.clone()),
        term: Some(ctx.term),
        exam_type: Some(ctx.exam_type),
        ..Default::default()
    };
    let fetched = futures::try_join!(
        backend.students_list(&student_filters),
        backend.marks_list(&marks_filters),
    );
    let (roster, marks) = match fetched {
        Ok(v) => v,
        Err(e) => return backend_err(state, &req.id, e),
    };

    for mark in &marks {
        merge_record(&mut state.marks_buf, mark);
    }
    state.marks_out_of.insert(ctx.clone(), out_of);
    state.rosters.insert(ctx.class_id.clone(), roster.clone());

    let ids: Vec<String> = roster.iter().map(|s| s.id.clone()).collect();
    ok(
        &req.id,
        json!({
            "entries": entries_view(&state.marks_buf, &ctx, &roster),
            "outOf": out_of,
            "dirty": state.marks_buf.is_dirty(&ctx, &ids),
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
    let out_of = state
        .marks_out_of
        .get(&ctx)
        .copied()
        .unwrap_or(DEFAULT_OUT_OF);

    // Raw text goes through the clamp; out-of-range numbers are clamped too;
    // anything unparseable becomes "no entry", never zero.
    let staged: Option<f64> = match req.params.get("value") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(raw)) => clamp_entry(raw, out_of),
        Some(v) if v.is_number() => v.as_f64().map(|n| n.clamp(0.0, out_of)),
        Some(_) => {
            return err(&req.id, "bad_params", "value must be a number or string", None)
        }
    };

    state.marks_buf.stage(&student_id, &ctx, staged);
    let ids = roster_ids(state, &ctx.class_id).unwrap_or_default();
    ok(
        &req.id,
        json!({
            "staged": staged,
            "dirty": state.marks_buf.is_dirty(&ctx, &ids),
        }),
    )
}

async fn run_save(
    state: &mut AppState,
    ctx: &MarksCtx,
    plan: SavePlan<f64>,
) -> Result<(usize, usize), ApiError> {
    let backend = Arc::clone(&state.backend);
    let mut created = 0usize;
    if !plan.creates.is_empty() {
        let new_marks: Vec<NewMark> = plan
            .creates
            .iter()
            .map(|(student_id, value)| NewMark {
                student_id: student_id.clone(),
                class_id: ctx.class_id.clone(),
                academic_year: ctx.academic_year.clone(),
                academic_term: ctx.term,
                exam_type: ctx.exam_type,
                total_marks: *value,
                subject_id: None,
                exam_date: None,
            })
            .collect();
        let returned = backend.marks_bulk_create(&new_marks).await?;
        created = returned.len();
        for mark in &returned {
            merge_record(&mut state.marks_buf, mark);
        }
    }

    let update_futs: Vec<_> = plan
        .updates
        .iter()
        .map(|u| backend.mark_update(&u.record_id, json!({ "totalMarks": u.value })))
        .collect();
    let returned = futures::future::try_join_all(update_futs).await?;
    for mark in &returned {
        merge_record(&mut state.marks_buf, mark);
    }
    Ok((created, returned.len()))
}

async fn handle_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match ctx_from(&req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let Some(ids) = roster_ids(state, &ctx.class_id) else {
        return err(
            &req.id,
            "bad_params",
            "class roster not loaded; call marks.open first",
            None,
        );
    };
    if !state.marks_buf.is_dirty(&ctx, &ids) {
        return err(&req.id, "no_changes", "nothing to save", None);
    }
    let plan = state.marks_buf.plan_save(&ctx, &ids);
    if plan.is_empty() {
        return err(&req.id, "no_changes", "nothing to save", None);
    }

    let keys: Vec<SlotKey<MarksCtx>> = plan
        .creates
        .iter()
        .map(|(student_id, _)| student_id)
        .chain(plan.updates.iter().map(|u| &u.student_id))
        .map(|student_id| SlotKey {
            student_id: student_id.clone(),
            ctx: ctx.clone(),
        })
        .collect();
    if keys.iter().any(|k| state.saving_marks.contains(k)) {
        return err(
            &req.id,
            "save_in_progress",
            "a save for this student is already in flight",
            None,
        );
    }
    state.saving_marks.extend(keys.iter().cloned());

    let outcome = run_save(state, &ctx, plan).await;
    for key in &keys {
        state.saving_marks.remove(key);
    }

    match outcome {
        Ok((created, updated)) => ok(
            &req.id,
            json!({
                "created": created,
                "updated": updated,
                "dirty": state.marks_buf.is_dirty(&ctx, &ids),
            }),
        ),
        Err(e) => backend_err(state, &req.id, e),
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

async fn handle_review_table(state: &mut AppState, req: &Request) -> serde_json::Value {
    let class_id = match require_str(&req.params, "classId") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let term = match opt_parsed(&req.params, "academicTerm") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let filters = MarksFilters {
        class_id: Some(class_id.clone()),
        academic_year: opt_str(&req.params, "academicYear"),
        term,
        ..Default::default()
    };

    let backend = Arc::clone(&state.backend);
    let student_filters = StudentFilters {
        class_id: Some(class_id),
        ..Default::default()
    };
    let fetched = futures::try_join!(
        backend.students_list(&student_filters),
        backend.marks_list(&filters),
    );
    let (roster, marks) = match fetched {
        Ok(v) => v,
        Err(e) => return backend_err(state, &req.id, e),
    };

    let mut by_student: BTreeMap<String, HashMap<ExamType, f64>> = BTreeMap::new();
    for mark in &marks {
        by_student
            .entry(mark.student_id.id().to_string())
            .or_default()
            .insert(mark.exam_type, mark.total_marks);
    }

    let rows: Vec<serde_json::Value> = roster
        .iter()
        .map(|s| {
            let scores = by_student.get(&s.id);
            let get = |et: ExamType| scores.and_then(|m| m.get(&et)).copied();
            let present: Vec<f64> = [
                get(ExamType::BeginningTerm),
                get(ExamType::Midterm),
                get(ExamType::Endterm),
            ]
            .into_iter()
            .flatten()
            .collect();
            let average = if present.is_empty() {
                None
            } else {
                Some(round1(present.iter().sum::<f64>() / present.len() as f64))
            };
            json!({
                "studentId": s.id,
                "studentName": s.student_name,
                "beginningTerm": get(ExamType::BeginningTerm),
                "midterm": get(ExamType::Midterm),
                "endterm": get(ExamType::Endterm),
                "average": average,
            })
        })
        .collect();

    ok(&req.id, json!({ "rows": rows }))
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "marks.open" => Some(handle_open(state, req).await),
        "marks.stage" => Some(handle_stage(state, req)),
        "marks.save" => Some(handle_save(state, req).await),
        "marks.reviewTable" => Some(handle_review_table(state, req).await),
        _ => None,
    }
}
