mod common;

use common::*;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::tempdir;

use classdeskd::model::{Class, Download, ExamType, Report};

fn seeded_report() -> Report {
    Report {
        marks: vec![
            mark("m-1", "st-1", "cls-1", ExamType::Midterm, 82.5),
            mark("m-2", "st-2", "cls-1", ExamType::Midterm, 64.0),
        ],
        students: vec![
            student("st-1", "Ama Mensah", "cls-1"),
            student("st-2", "Kofi Owusu", "cls-1"),
        ],
        classes: vec![Class {
            id: "cls-1".into(),
            class_name: "JHS 2A".into(),
            subject_name: Some("Mathematics".into()),
            class_room: None,
            class_credit: None,
            school_id: None,
        }],
        ..Default::default()
    }
}

fn result_path(result: &serde_json::Value) -> PathBuf {
    PathBuf::from(result["path"].as_str().unwrap())
}

#[tokio::test]
async fn csv_export_writes_the_flattened_table() {
    let td = tempdir().unwrap();
    let fake = FakeBackend::new();
    *fake.report.lock().unwrap() = seeded_report();
    let mut state = state_with(fake, td.path());
    login(&mut state).await;

    let result = request_ok(
        &mut state,
        "1",
        "reports.export",
        json!({ "kind": "marks", "format": "csv" }),
    )
    .await;
    assert_eq!(result["rows"], json!(2));

    let path = result_path(&result);
    assert!(path.starts_with(td.path()));
    let body = std::fs::read_to_string(&path).unwrap();
    let mut lines = body.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Student,Class,Subject,Academic Year,Term,Exam,Marks"
    );
    assert!(body.contains("Ama Mensah,JHS 2A,Mathematics"));
    assert!(body.contains("82.5"));
}

#[tokio::test]
async fn xlsx_export_defaults_and_produces_a_workbook() {
    let td = tempdir().unwrap();
    let fake = FakeBackend::new();
    *fake.report.lock().unwrap() = seeded_report();
    let mut state = state_with(fake, td.path());
    login(&mut state).await;

    let result = request_ok(&mut state, "1", "reports.export", json!({ "kind": "marks" })).await;
    assert_eq!(result["rows"], json!(2));

    let path = result_path(&result);
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("xlsx"));
    let file = std::fs::File::open(&path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    assert!(archive.by_name("xl/worksheets/sheet1.xml").is_ok());
}

#[tokio::test]
async fn export_rejects_unknown_kinds_and_formats() {
    let td = tempdir().unwrap();
    let mut state = state_with(FakeBackend::new(), td.path());
    login(&mut state).await;

    let resp = request(&mut state, "1", "reports.export", json!({ "kind": "grades" })).await;
    assert_eq!(error_code(&resp), "bad_params");

    let resp = request(
        &mut state,
        "2",
        "reports.export",
        json!({ "kind": "marks", "format": "pdf" }),
    )
    .await;
    assert_eq!(error_code(&resp), "bad_params");
}

#[tokio::test]
async fn download_saves_the_server_file_under_a_sanitized_name() {
    let td = tempdir().unwrap();
    let fake = FakeBackend::new();
    *fake.download.lock().unwrap() = Some(Download {
        filename: "../escape/marks-report.xlsx".into(),
        bytes: b"PK-fake-workbook".to_vec(),
    });
    let mut state = state_with(fake, td.path());
    login(&mut state).await;

    let result = request_ok(
        &mut state,
        "1",
        "reports.download",
        json!({ "kind": "marks" }),
    )
    .await;
    assert_eq!(result["bytes"], json!(16));

    let path = result_path(&result);
    assert!(path.starts_with(td.path()));
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some(".._escape_marks-report.xlsx")
    );
    assert_eq!(std::fs::read(&path).unwrap(), b"PK-fake-workbook");
}

#[tokio::test]
async fn download_surfaces_a_backend_refusal() {
    let td = tempdir().unwrap();
    let fake = FakeBackend::new();
    let mut state = state_with(Arc::clone(&fake), td.path());
    login(&mut state).await;

    // No download seeded: the fake answers the way the client does when the
    // server returns a JSON error body instead of a file.
    let resp = request(&mut state, "1", "reports.download", json!({ "kind": "marks" })).await;
    assert_eq!(error_code(&resp), "api_error");
}
