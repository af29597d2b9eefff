//! Wire models for the school REST backend.
//!
//! Relation fields arrive in two shapes depending on the endpoint: a bare id
//! string, or the populated object. `Ref<T>` captures both; consumers go
//! through `Ref::id`/`Ref::resolve` instead of unwrapping at every call site.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder for a relation that cannot be resolved locally.
pub const NOT_AVAILABLE: &str = "N/A";

pub trait HasId {
    fn id(&self) -> &str;
}

/// A relation field: either the raw id or the populated object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref<T> {
    Id(String),
    Populated(Box<T>),
}

impl<T: HasId> Ref<T> {
    pub fn id(&self) -> &str {
        match self {
            Ref::Id(id) => id,
            Ref::Populated(t) => t.id(),
        }
    }

    /// Resolve to the populated object, falling back to a lookup table.
    pub fn resolve<'a>(&'a self, lookup: &'a [T]) -> Option<&'a T> {
        match self {
            Ref::Populated(t) => Some(t),
            Ref::Id(id) => lookup.iter().find(|t| t.id() == id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExamType {
    BeginningTerm,
    Midterm,
    Endterm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcademicTerm {
    FirstTerm,
    SecondTerm,
    ThirdTerm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommenterRole {
    Teacher,
    Mentor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_credit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<Ref<School>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub student_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<Ref<Class>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<Ref<School>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<Ref<School>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub student_id: Ref<Student>,
    pub class_id: Ref<Class>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<Ref<School>>,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
    pub id: String,
    pub student_id: Ref<Student>,
    pub class_id: Ref<Class>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<Ref<User>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<Ref<School>>,
    pub exam_type: ExamType,
    pub academic_year: String,
    pub academic_term: AcademicTerm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_date: Option<NaiveDate>,
    pub total_marks: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub teacher_id: Ref<User>,
    pub class_id: Ref<Class>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<Ref<School>>,
    pub commenter_role: CommenterRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_students: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_story: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_lesson: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_observation: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Payload for the bulk attendance endpoint (wrapped in `{"records": [...]}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAttendance {
    pub student_id: String,
    pub class_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// Payload for the bulk marks endpoint (sent as a bare array).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMark {
    pub student_id: String,
    pub class_id: String,
    pub academic_year: String,
    pub academic_term: AcademicTerm,
    pub exam_type: ExamType,
    pub total_marks: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_date: Option<NaiveDate>,
}

/// A report payload: nested arrays plus the lookup tables the backend
/// happens to include, used by the export fallback chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default)]
    pub marks: Vec<Mark>,
    #[serde(default)]
    pub attendance: Vec<AttendanceRecord>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub classes: Vec<Class>,
}

/// A server-generated file.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl HasId for School {
    fn id(&self) -> &str {
        &self.id
    }
}
impl HasId for Class {
    fn id(&self) -> &str {
        &self.id
    }
}
impl HasId for Student {
    fn id(&self) -> &str {
        &self.id
    }
}
impl HasId for User {
    fn id(&self) -> &str {
        &self.id
    }
}
impl HasId for AttendanceRecord {
    fn id(&self) -> &str {
        &self.id
    }
}
impl HasId for Mark {
    fn id(&self) -> &str {
        &self.id
    }
}
impl HasId for Comment {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Display name for a student relation, falling back through the lookup table.
pub fn student_label(r: &Ref<Student>, lookup: &[Student]) -> String {
    r.resolve(lookup)
        .map(|s| s.student_name.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Display name for a class relation.
pub fn class_label(r: &Ref<Class>, lookup: &[Class]) -> String {
    r.resolve(lookup)
        .map(|c| c.class_name.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Subject name carried on the class (subjects are denormalized onto classes).
pub fn subject_label(r: &Ref<Class>, lookup: &[Class]) -> String {
    r.resolve(lookup)
        .and_then(|c| c.subject_name.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn student(id: &str, name: &str) -> Student {
        Student {
            id: id.into(),
            student_name: name.into(),
            class_id: None,
            school_id: None,
        }
    }

    #[test]
    fn ref_deserializes_both_shapes() {
        let raw: Ref<Student> = serde_json::from_value(json!("st-1")).unwrap();
        assert_eq!(raw.id(), "st-1");

        let populated: Ref<Student> =
            serde_json::from_value(json!({"id": "st-2", "studentName": "Ama"})).unwrap();
        assert_eq!(populated.id(), "st-2");
        match populated {
            Ref::Populated(s) => assert_eq!(s.student_name, "Ama"),
            Ref::Id(_) => panic!("expected populated shape"),
        }
    }

    #[test]
    fn resolve_prefers_populated_then_lookup() {
        let lookup = vec![student("st-1", "Kofi")];
        let by_id: Ref<Student> = Ref::Id("st-1".into());
        assert_eq!(by_id.resolve(&lookup).unwrap().student_name, "Kofi");

        let populated: Ref<Student> = Ref::Populated(Box::new(student("st-1", "Populated")));
        assert_eq!(populated.resolve(&lookup).unwrap().student_name, "Populated");

        let missing: Ref<Student> = Ref::Id("st-9".into());
        assert!(missing.resolve(&lookup).is_none());
        assert_eq!(student_label(&missing, &lookup), NOT_AVAILABLE);
    }

    #[test]
    fn enum_wire_names() {
        assert_eq!(
            serde_json::to_value(ExamType::BeginningTerm).unwrap(),
            json!("BEGINNING_TERM")
        );
        assert_eq!(
            serde_json::to_value(AcademicTerm::ThirdTerm).unwrap(),
            json!("THIRD_TERM")
        );
        assert_eq!(
            serde_json::to_value(AttendanceStatus::Excused).unwrap(),
            json!("excused")
        );
        assert_eq!(
            serde_json::to_value(CommenterRole::Mentor).unwrap(),
            json!("mentor")
        );
        let et: ExamType = serde_json::from_value(json!("MIDTERM")).unwrap();
        assert_eq!(et, ExamType::Midterm);
    }

    #[test]
    fn attendance_record_wire_shape() {
        let rec: AttendanceRecord = serde_json::from_value(json!({
            "id": "att-1",
            "studentId": {"id": "st-1", "studentName": "Ama"},
            "classId": "cls-1",
            "date": "2026-03-02",
            "status": "late"
        }))
        .unwrap();
        assert_eq!(rec.student_id.id(), "st-1");
        assert_eq!(rec.class_id.id(), "cls-1");
        assert_eq!(rec.status, AttendanceStatus::Late);
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }
}
