//! Attendance aggregation for the dashboard and summary views.
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::{AttendanceRecord, AttendanceStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub excused: usize,
    /// `round(present / total * 100)`; 0 when the roster is empty.
    pub attendance_rate: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassAttendanceSummary {
    pub class_id: String,
    #[serde(flatten)]
    pub summary: AttendanceSummary,
}

fn tally<'a, I>(records: I) -> AttendanceSummary
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let mut s = AttendanceSummary::default();
    for rec in records {
        s.total += 1;
        match rec.status {
            AttendanceStatus::Present => s.present += 1,
            AttendanceStatus::Absent => s.absent += 1,
            AttendanceStatus::Late => s.late += 1,
            AttendanceStatus::Excused => s.excused += 1,
        }
    }
    s.attendance_rate = if s.total == 0 {
        0
    } else {
        ((s.present as f64 / s.total as f64) * 100.0).round() as u32
    };
    s
}

/// Summarize the records that fall on `date`; other dates are excluded
/// before counting.
pub fn summarize(records: &[AttendanceRecord], date: NaiveDate) -> AttendanceSummary {
    tally(records.iter().filter(|r| r.date == date))
}

/// The same computation repeated per class id, unweighted, ordered by class
/// id for stable display.
pub fn per_class(records: &[AttendanceRecord], date: NaiveDate) -> Vec<ClassAttendanceSummary> {
    let mut by_class: BTreeMap<String, Vec<&AttendanceRecord>> = BTreeMap::new();
    for rec in records.iter().filter(|r| r.date == date) {
        by_class
            .entry(rec.class_id.id().to_string())
            .or_default()
            .push(rec);
    }
    by_class
        .into_iter()
        .map(|(class_id, recs)| ClassAttendanceSummary {
            class_id,
            summary: tally(recs),
        })
        .collect()
}
