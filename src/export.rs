//! Spreadsheet export: flattening report payloads into rectangular tables
//! and writing them out as minimal OOXML workbooks or quoted CSV.
use anyhow::Context;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::model::{class_label, student_label, subject_label, Report, NOT_AVAILABLE};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    fn as_csv_field(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

pub fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Spreadsheet column reference for a 0-based index: A, B, ... Z, AA, AB...
fn column_ref(mut idx: usize) -> String {
    let mut out = String::new();
    loop {
        out.insert(0, (b'A' + (idx % 26) as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    out
}

fn sheet_xml(rows: &[Vec<Cell>]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
         <sheetData>",
    );
    for (r, row) in rows.iter().enumerate() {
        xml.push_str(&format!("<row r=\"{}\">", r + 1));
        for (c, cell) in row.iter().enumerate() {
            let cell_ref = format!("{}{}", column_ref(c), r + 1);
            match cell {
                Cell::Text(s) => xml.push_str(&format!(
                    "<c r=\"{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                    cell_ref,
                    xml_escape(s)
                )),
                Cell::Number(n) => {
                    xml.push_str(&format!("<c r=\"{}\"><v>{}</v></c>", cell_ref, n))
                }
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Write an `.xlsx` workbook, one worksheet per sheet, inline strings only.
/// Returns the total data row count.
pub fn write_workbook(out_path: &Path, sheets: &[Sheet]) -> anyhow::Result<usize> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create workbook file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut content_types = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
         <Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>",
    );
    for i in 0..sheets.len() {
        content_types.push_str(&format!(
            "<Override PartName=\"/xl/worksheets/sheet{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>",
            i + 1
        ));
    }
    content_types.push_str("</Types>");
    zip.start_file("[Content_Types].xml", opts)
        .context("failed to start content types entry")?;
    zip.write_all(content_types.as_bytes())
        .context("failed to write content types entry")?;

    zip.start_file("_rels/.rels", opts)
        .context("failed to start package rels entry")?;
    zip.write_all(
        b"<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
          <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
          <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"xl/workbook.xml\"/>\
          </Relationships>",
    )
    .context("failed to write package rels entry")?;

    let mut workbook = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
         xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"><sheets>",
    );
    let mut workbook_rels = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    );
    for (i, sheet) in sheets.iter().enumerate() {
        workbook.push_str(&format!(
            "<sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"/>",
            xml_escape(&sheet.name),
            i + 1,
            i + 1
        ));
        workbook_rels.push_str(&format!(
            "<Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet{}.xml\"/>",
            i + 1,
            i + 1
        ));
    }
    workbook.push_str("</sheets></workbook>");
    workbook_rels.push_str("</Relationships>");

    zip.start_file("xl/workbook.xml", opts)
        .context("failed to start workbook entry")?;
    zip.write_all(workbook.as_bytes())
        .context("failed to write workbook entry")?;
    zip.start_file("xl/_rels/workbook.xml.rels", opts)
        .context("failed to start workbook rels entry")?;
    zip.write_all(workbook_rels.as_bytes())
        .context("failed to write workbook rels entry")?;

    let mut row_count = 0usize;
    for (i, sheet) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), opts)
            .context("failed to start worksheet entry")?;
        zip.write_all(sheet_xml(&sheet.rows).as_bytes())
            .context("failed to write worksheet entry")?;
        row_count += sheet.rows.len().saturating_sub(1);
    }

    zip.finish().context("failed to finalize workbook")?;
    Ok(row_count)
}

/// Write rows as CSV with quoting for embedded commas/quotes/newlines.
/// Returns the data row count (header excluded).
pub fn write_csv(out_path: &Path, rows: &[Vec<Cell>]) -> anyhow::Result<usize> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let mut out = String::new();
    for row in rows {
        let line: Vec<String> = row.iter().map(|c| csv_quote(&c.as_csv_field())).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    std::fs::write(out_path, out)
        .with_context(|| format!("failed to write csv {}", out_path.to_string_lossy()))?;
    Ok(rows.len().saturating_sub(1))
}

/// Flatten the marks section of a report, resolving relations through the
/// report's own lookup tables and falling back to "N/A".
pub fn mark_rows(report: &Report) -> Vec<Vec<Cell>> {
    let mut rows = vec![vec![
        Cell::text("Student"),
        Cell::text("Class"),
        Cell::text("Subject"),
        Cell::text("Academic Year"),
        Cell::text("Term"),
        Cell::text("Exam"),
        Cell::text("Marks"),
    ]];
    for mark in &report.marks {
        rows.push(vec![
            Cell::text(student_label(&mark.student_id, &report.students)),
            Cell::text(class_label(&mark.class_id, &report.classes)),
            Cell::text(subject_label(&mark.class_id, &report.classes)),
            Cell::text(&mark.academic_year),
            Cell::text(enum_label(&mark.academic_term)),
            Cell::text(enum_label(&mark.exam_type)),
            Cell::Number(mark.total_marks),
        ]);
    }
    rows
}

pub fn attendance_rows(report: &Report) -> Vec<Vec<Cell>> {
    let mut rows = vec![vec![
        Cell::text("Student"),
        Cell::text("Class"),
        Cell::text("Date"),
        Cell::text("Status"),
        Cell::text("Remarks"),
    ]];
    for rec in &report.attendance {
        rows.push(vec![
            Cell::text(student_label(&rec.student_id, &report.students)),
            Cell::text(class_label(&rec.class_id, &report.classes)),
            Cell::text(rec.date.to_string()),
            Cell::text(rec.status.as_str()),
            Cell::text(rec.remarks.clone().unwrap_or_default()),
        ]);
    }
    rows
}

pub fn comment_rows(report: &Report) -> Vec<Vec<Cell>> {
    let mut rows = vec![vec![
        Cell::text("Class"),
        Cell::text("Role"),
        Cell::text("Date"),
        Cell::text("Students"),
        Cell::text("Narrative"),
    ]];
    for comment in &report.comments {
        // Teacher comments carry success story / challenge; mentor comments
        // carry model lesson / observation. Whichever is present wins.
        let narrative = comment
            .success_story
            .as_deref()
            .or(comment.challenge.as_deref())
            .or(comment.model_lesson.as_deref())
            .or(comment.lesson_observation.as_deref())
            .unwrap_or(NOT_AVAILABLE);
        rows.push(vec![
            Cell::text(class_label(&comment.class_id, &report.classes)),
            Cell::text(match comment.commenter_role {
                crate::model::CommenterRole::Teacher => "teacher",
                crate::model::CommenterRole::Mentor => "mentor",
            }),
            Cell::text(comment.date.to_string()),
            Cell::Number(comment.number_of_students.unwrap_or(0) as f64),
            Cell::text(narrative),
        ]);
    }
    rows
}

fn enum_label<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
