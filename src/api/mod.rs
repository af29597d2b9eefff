//! Client for the school REST backend: one configured HTTP client, one
//! stateless function module per resource, and a service trait at the seam
//! so tests can substitute a recording fake.
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::model::{
    AcademicTerm, AttendanceRecord, Class, Comment, CommenterRole, Download, ExamType,
    LoginResponse, Mark, NewAttendance, NewMark, Report, School, Student, User,
};

pub mod analytics;
pub mod attendance;
pub mod auth;
pub mod classes;
mod client;
pub mod comments;
mod error;
pub mod marks;
pub mod reports;
pub mod schools;
pub mod students;
pub mod users;

pub use client::ApiClient;
pub use error::ApiError;

fn push_opt(query: &mut Vec<(String, String)>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        if !v.trim().is_empty() {
            query.push((key.to_string(), v.clone()));
        }
    }
}

fn push_date(query: &mut Vec<(String, String)>, key: &str, value: &Option<NaiveDate>) {
    if let Some(d) = value {
        query.push((key.to_string(), d.to_string()));
    }
}

fn push_enum<T: Serialize>(query: &mut Vec<(String, String)>, key: &str, value: &Option<T>) {
    if let Some(v) = value {
        if let Some(s) = serde_json::to_value(v)
            .ok()
            .and_then(|x| x.as_str().map(str::to_string))
        {
            query.push((key.to_string(), s));
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassFilters {
    pub school_id: Option<String>,
}

impl ClassFilters {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut q = Vec::new();
        push_opt(&mut q, "schoolId", &self.school_id);
        q
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentFilters {
    pub class_id: Option<String>,
    pub school_id: Option<String>,
}

impl StudentFilters {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut q = Vec::new();
        push_opt(&mut q, "classId", &self.class_id);
        push_opt(&mut q, "schoolId", &self.school_id);
        q
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilters {
    pub role: Option<String>,
}

impl UserFilters {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut q = Vec::new();
        push_opt(&mut q, "role", &self.role);
        q
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceFilters {
    pub class_id: Option<String>,
    pub student_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl AttendanceFilters {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut q = Vec::new();
        push_opt(&mut q, "classId", &self.class_id);
        push_opt(&mut q, "studentId", &self.student_id);
        push_date(&mut q, "date", &self.date);
        push_date(&mut q, "from", &self.from);
        push_date(&mut q, "to", &self.to);
        q
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarksFilters {
    pub class_id: Option<String>,
    pub student_id: Option<String>,
    pub academic_year: Option<String>,
    pub term: Option<AcademicTerm>,
    pub exam_type: Option<ExamType>,
}

impl MarksFilters {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut q = Vec::new();
        push_opt(&mut q, "classId", &self.class_id);
        push_opt(&mut q, "studentId", &self.student_id);
        push_opt(&mut q, "academicYear", &self.academic_year);
        push_enum(&mut q, "academicTerm", &self.term);
        push_enum(&mut q, "examType", &self.exam_type);
        q
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentFilters {
    pub class_id: Option<String>,
    pub commenter_role: Option<CommenterRole>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl CommentFilters {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut q = Vec::new();
        push_opt(&mut q, "classId", &self.class_id);
        push_enum(&mut q, "commenterRole", &self.commenter_role);
        push_date(&mut q, "from", &self.from);
        push_date(&mut q, "to", &self.to);
        q
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilters {
    pub class_id: Option<String>,
    pub academic_year: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ReportFilters {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut q = Vec::new();
        push_opt(&mut q, "classId", &self.class_id);
        push_opt(&mut q, "academicYear", &self.academic_year);
        push_date(&mut q, "from", &self.from);
        push_date(&mut q, "to", &self.to);
        q
    }
}

/// The backend seam. Every operation issues exactly one HTTP call, validates
/// nothing, and lets `ApiError` bubble unchanged; handlers substitute a
/// recording fake in tests.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Store (or clear) the bearer token used on subsequent requests.
    fn set_token(&self, token: Option<String>);

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError>;

    async fn schools_list(&self) -> Result<Vec<School>, ApiError>;
    async fn school_create(&self, payload: Value) -> Result<School, ApiError>;
    async fn school_update(&self, id: &str, payload: Value) -> Result<School, ApiError>;
    async fn school_delete(&self, id: &str) -> Result<(), ApiError>;

    async fn classes_list(&self, filters: &ClassFilters) -> Result<Vec<Class>, ApiError>;
    async fn class_get(&self, id: &str) -> Result<Class, ApiError>;
    async fn class_create(&self, payload: Value) -> Result<Class, ApiError>;
    async fn class_update(&self, id: &str, payload: Value) -> Result<Class, ApiError>;
    async fn class_delete(&self, id: &str) -> Result<(), ApiError>;

    async fn students_list(&self, filters: &StudentFilters) -> Result<Vec<Student>, ApiError>;
    async fn student_create(&self, payload: Value) -> Result<Student, ApiError>;
    async fn student_update(&self, id: &str, payload: Value) -> Result<Student, ApiError>;
    async fn student_delete(&self, id: &str) -> Result<(), ApiError>;

    async fn users_list(&self, filters: &UserFilters) -> Result<Vec<User>, ApiError>;
    async fn user_create(&self, payload: Value) -> Result<User, ApiError>;
    async fn user_update(&self, id: &str, payload: Value) -> Result<User, ApiError>;
    async fn user_delete(&self, id: &str) -> Result<(), ApiError>;

    async fn attendance_list(
        &self,
        filters: &AttendanceFilters,
    ) -> Result<Vec<AttendanceRecord>, ApiError>;
    async fn attendance_bulk_create(
        &self,
        records: &[NewAttendance],
    ) -> Result<Vec<AttendanceRecord>, ApiError>;
    async fn attendance_update(
        &self,
        id: &str,
        payload: Value,
    ) -> Result<AttendanceRecord, ApiError>;
    async fn attendance_delete(&self, id: &str) -> Result<(), ApiError>;

    async fn marks_list(&self, filters: &MarksFilters) -> Result<Vec<Mark>, ApiError>;
    async fn marks_bulk_create(&self, marks: &[NewMark]) -> Result<Vec<Mark>, ApiError>;
    async fn mark_update(&self, id: &str, payload: Value) -> Result<Mark, ApiError>;
    async fn mark_delete(&self, id: &str) -> Result<(), ApiError>;

    async fn comments_list(&self, filters: &CommentFilters) -> Result<Vec<Comment>, ApiError>;
    async fn comment_create(&self, payload: Value) -> Result<Comment, ApiError>;
    async fn comment_update(&self, id: &str, payload: Value) -> Result<Comment, ApiError>;
    async fn comment_delete(&self, id: &str) -> Result<(), ApiError>;

    async fn report_fetch(&self, kind: &str, filters: &ReportFilters) -> Result<Report, ApiError>;
    async fn report_download(
        &self,
        kind: &str,
        filters: &ReportFilters,
    ) -> Result<Download, ApiError>;

    async fn analytics_attendance(&self, filters: &ReportFilters) -> Result<Value, ApiError>;
    async fn analytics_marks(&self, filters: &ReportFilters) -> Result<Value, ApiError>;
}

#[async_trait]
impl Backend for ApiClient {
    fn set_token(&self, token: Option<String>) {
        self.set_bearer(token);
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        auth::login(self, email, password).await
    }

    async fn schools_list(&self) -> Result<Vec<School>, ApiError> {
        schools::list(self).await
    }
    async fn school_create(&self, payload: Value) -> Result<School, ApiError> {
        schools::create(self, &payload).await
    }
    async fn school_update(&self, id: &str, payload: Value) -> Result<School, ApiError> {
        schools::update(self, id, &payload).await
    }
    async fn school_delete(&self, id: &str) -> Result<(), ApiError> {
        schools::delete(self, id).await
    }

    async fn classes_list(&self, filters: &ClassFilters) -> Result<Vec<Class>, ApiError> {
        classes::list(self, filters).await
    }
    async fn class_get(&self, id: &str) -> Result<Class, ApiError> {
        classes::get(self, id).await
    }
    async fn class_create(&self, payload: Value) -> Result<Class, ApiError> {
        classes::create(self, &payload).await
    }
    async fn class_update(&self, id: &str, payload: Value) -> Result<Class, ApiError> {
        classes::update(self, id, &payload).await
    }
    async fn class_delete(&self, id: &str) -> Result<(), ApiError> {
        classes::delete(self, id).await
    }

    async fn students_list(&self, filters: &StudentFilters) -> Result<Vec<Student>, ApiError> {
        students::list(self, filters).await
    }
    async fn student_create(&self, payload: Value) -> Result<Student, ApiError> {
        students::create(self, &payload).await
    }
    async fn student_update(&self, id: &str, payload: Value) -> Result<Student, ApiError> {
        students::update(self, id, &payload).await
    }
    async fn student_delete(&self, id: &str) -> Result<(), ApiError> {
        students::delete(self, id).await
    }

    async fn users_list(&self, filters: &UserFilters) -> Result<Vec<User>, ApiError> {
        users::list(self, filters).await
    }
    async fn user_create(&self, payload: Value) -> Result<User, ApiError> {
        users::create(self, &payload).await
    }
    async fn user_update(&self, id: &str, payload: Value) -> Result<User, ApiError> {
        users::update(self, id, &payload).await
    }
    async fn user_delete(&self, id: &str) -> Result<(), ApiError> {
        users::delete(self, id).await
    }

    async fn attendance_list(
        &self,
        filters: &AttendanceFilters,
    ) -> Result<Vec<AttendanceRecord>, ApiError> {
        attendance::list(self, filters).await
    }
    async fn attendance_bulk_create(
        &self,
        records: &[NewAttendance],
    ) -> Result<Vec<AttendanceRecord>, ApiError> {
        attendance::bulk_create(self, records).await
    }
    async fn attendance_update(
        &self,
        id: &str,
        payload: Value,
    ) -> Result<AttendanceRecord, ApiError> {
        attendance::update(self, id, &payload).await
    }
    async fn attendance_delete(&self, id: &str) -> Result<(), ApiError> {
        attendance::delete(self, id).await
    }

    async fn marks_list(&self, filters: &MarksFilters) -> Result<Vec<Mark>, ApiError> {
        marks::list(self, filters).await
    }
    async fn marks_bulk_create(&self, new_marks: &[NewMark]) -> Result<Vec<Mark>, ApiError> {
        marks::bulk_create(self, new_marks).await
    }
    async fn mark_update(&self, id: &str, payload: Value) -> Result<Mark, ApiError> {
        marks::update(self, id, &payload).await
    }
    async fn mark_delete(&self, id: &str) -> Result<(), ApiError> {
        marks::delete(self, id).await
    }

    async fn comments_list(&self, filters: &CommentFilters) -> Result<Vec<Comment>, ApiError> {
        comments::list(self, filters).await
    }
    async fn comment_create(&self, payload: Value) -> Result<Comment, ApiError> {
        comments::create(self, &payload).await
    }
    async fn comment_update(&self, id: &str, payload: Value) -> Result<Comment, ApiError> {
        comments::update(self, id, &payload).await
    }
    async fn comment_delete(&self, id: &str) -> Result<(), ApiError> {
        comments::delete(self, id).await
    }

    async fn report_fetch(&self, kind: &str, filters: &ReportFilters) -> Result<Report, ApiError> {
        reports::fetch(self, kind, filters).await
    }
    async fn report_download(
        &self,
        kind: &str,
        filters: &ReportFilters,
    ) -> Result<Download, ApiError> {
        reports::download(self, kind, filters).await
    }

    async fn analytics_attendance(&self, filters: &ReportFilters) -> Result<Value, ApiError> {
        analytics::attendance_overview(self, filters).await
    }
    async fn analytics_marks(&self, filters: &ReportFilters) -> Result<Value, ApiError> {
        analytics::marks_overview(self, filters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_filter_values_are_stripped() {
        let filters = StudentFilters {
            class_id: Some("cls-1".into()),
            school_id: Some("   ".into()),
        };
        assert_eq!(
            filters.to_query(),
            vec![("classId".to_string(), "cls-1".to_string())]
        );
        assert!(StudentFilters::default().to_query().is_empty());
    }

    #[test]
    fn enum_filters_use_wire_names() {
        let filters = MarksFilters {
            class_id: Some("cls-1".into()),
            term: Some(AcademicTerm::SecondTerm),
            exam_type: Some(ExamType::Endterm),
            ..Default::default()
        };
        let q = filters.to_query();
        assert!(q.contains(&("academicTerm".to_string(), "SECOND_TERM".to_string())));
        assert!(q.contains(&("examType".to_string(), "ENDTERM".to_string())));
    }

    #[test]
    fn date_filters_render_iso() {
        let filters = AttendanceFilters {
            date: Some("2026-03-02".parse().unwrap()),
            ..Default::default()
        };
        assert_eq!(
            filters.to_query(),
            vec![("date".to_string(), "2026-03-02".to_string())]
        );
    }
}
