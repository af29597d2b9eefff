#![allow(dead_code)]
//! Shared test scaffolding: a recording fake backend behind the `Backend`
//! seam, plus request helpers for driving the IPC surface in-process.
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use classdeskd::api::{
    ApiError, AttendanceFilters, Backend, ClassFilters, CommentFilters, MarksFilters,
    ReportFilters, StudentFilters, UserFilters,
};
use classdeskd::config::{self, Config};
use classdeskd::ipc::{self, AppState, Request};
use classdeskd::model::{
    AttendanceRecord, AttendanceStatus, Class, Comment, CommenterRole, Download, LoginResponse,
    Mark, NewAttendance, NewMark, Ref, Report, School, Student, User,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailKind {
    SessionExpired,
    Api,
}

#[derive(Default)]
pub struct FakeBackend {
    pub token: Mutex<Option<String>>,
    pub students: Mutex<Vec<Student>>,
    pub classes: Mutex<Vec<Class>>,
    pub users: Mutex<Vec<User>>,
    pub comments: Mutex<Vec<Comment>>,
    pub attendance: Mutex<Vec<AttendanceRecord>>,
    pub marks: Mutex<Vec<Mark>>,
    pub report: Mutex<Report>,
    pub download: Mutex<Option<Download>>,
    pub analytics: Mutex<Value>,
    /// Resource names, in call order, for every list-style fetch.
    pub list_calls: Mutex<Vec<String>>,
    pub bulk_attendance_calls: Mutex<Vec<Vec<NewAttendance>>>,
    pub attendance_update_calls: Mutex<Vec<(String, Value)>>,
    pub bulk_marks_calls: Mutex<Vec<Vec<NewMark>>>,
    pub mark_update_calls: Mutex<Vec<(String, Value)>>,
    pub create_calls: Mutex<Vec<(String, Value)>>,
    pub fail_next: Mutex<Option<FailKind>>,
    next_id: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next_with(&self, kind: FailKind) {
        *self.fail_next.lock().unwrap() = Some(kind);
    }

    fn take_failure(&self) -> Result<(), ApiError> {
        match self.fail_next.lock().unwrap().take() {
            None => Ok(()),
            Some(FailKind::SessionExpired) => Err(ApiError::SessionExpired),
            Some(FailKind::Api) => Err(ApiError::Api {
                status: 500,
                message: "backend exploded".into(),
            }),
        }
    }

    fn next(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn note_list(&self, resource: &str) {
        self.list_calls.lock().unwrap().push(resource.to_string());
    }
}

#[async_trait]
impl Backend for FakeBackend {
    fn set_token(&self, token: Option<String>) {
        *self.token.lock().unwrap() = token;
    }

    async fn login(&self, email: &str, _password: &str) -> Result<LoginResponse, ApiError> {
        self.take_failure()?;
        Ok(LoginResponse {
            token: "tok-1".into(),
            user: User {
                id: "u-1".into(),
                name: "Test Teacher".into(),
                email: email.to_string(),
                role: "teacher".into(),
                school_id: None,
            },
        })
    }

    async fn schools_list(&self) -> Result<Vec<School>, ApiError> {
        self.take_failure()?;
        self.note_list("schools");
        Ok(vec![])
    }
    async fn school_create(&self, payload: Value) -> Result<School, ApiError> {
        self.take_failure()?;
        let school = School {
            id: self.next("sch"),
            name: payload
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("School")
                .into(),
            address: None,
            principal: None,
            phone: None,
            email: None,
        };
        self.create_calls
            .lock()
            .unwrap()
            .push(("schools".into(), payload));
        Ok(school)
    }
    async fn school_update(&self, id: &str, payload: Value) -> Result<School, ApiError> {
        self.take_failure()?;
        Ok(School {
            id: id.to_string(),
            name: payload
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("School")
                .into(),
            address: None,
            principal: None,
            phone: None,
            email: None,
        })
    }
    async fn school_delete(&self, _id: &str) -> Result<(), ApiError> {
        self.take_failure()
    }

    async fn classes_list(&self, _filters: &ClassFilters) -> Result<Vec<Class>, ApiError> {
        self.take_failure()?;
        self.note_list("classes");
        Ok(self.classes.lock().unwrap().clone())
    }
    async fn class_get(&self, id: &str) -> Result<Class, ApiError> {
        self.take_failure()?;
        self.classes
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(ApiError::Api {
                status: 404,
                message: "class not found".into(),
            })
    }
    async fn class_create(&self, payload: Value) -> Result<Class, ApiError> {
        self.take_failure()?;
        let class = Class {
            id: self.next("cls"),
            class_name: payload
                .get("className")
                .and_then(|v| v.as_str())
                .unwrap_or("Class")
                .into(),
            subject_name: payload
                .get("subjectName")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            class_room: None,
            class_credit: None,
            school_id: None,
        };
        self.create_calls
            .lock()
            .unwrap()
            .push(("classes".into(), payload));
        Ok(class)
    }
    async fn class_update(&self, id: &str, payload: Value) -> Result<Class, ApiError> {
        self.take_failure()?;
        Ok(Class {
            id: id.to_string(),
            class_name: payload
                .get("className")
                .and_then(|v| v.as_str())
                .unwrap_or("Class")
                .into(),
            subject_name: None,
            class_room: None,
            class_credit: None,
            school_id: None,
        })
    }
    async fn class_delete(&self, _id: &str) -> Result<(), ApiError> {
        self.take_failure()
    }

    async fn students_list(&self, filters: &StudentFilters) -> Result<Vec<Student>, ApiError> {
        self.take_failure()?;
        self.note_list("students");
        let students = self.students.lock().unwrap();
        Ok(students
            .iter()
            .filter(|s| match &filters.class_id {
                None => true,
                Some(class_id) => s
                    .class_id
                    .as_ref()
                    .map(|r| r.id() == class_id)
                    .unwrap_or(false),
            })
            .cloned()
            .collect())
    }
    async fn student_create(&self, payload: Value) -> Result<Student, ApiError> {
        self.take_failure()?;
        let student = Student {
            id: self.next("st"),
            student_name: payload
                .get("studentName")
                .and_then(|v| v.as_str())
                .unwrap_or("Student")
                .into(),
            class_id: payload
                .get("classId")
                .and_then(|v| v.as_str())
                .map(|s| Ref::Id(s.to_string())),
            school_id: None,
        };
        self.create_calls
            .lock()
            .unwrap()
            .push(("students".into(), payload));
        Ok(student)
    }
    async fn student_update(&self, id: &str, payload: Value) -> Result<Student, ApiError> {
        self.take_failure()?;
        Ok(Student {
            id: id.to_string(),
            student_name: payload
                .get("studentName")
                .and_then(|v| v.as_str())
                .unwrap_or("Student")
                .into(),
            class_id: None,
            school_id: None,
        })
    }
    async fn student_delete(&self, _id: &str) -> Result<(), ApiError> {
        self.take_failure()
    }

    async fn users_list(&self, _filters: &UserFilters) -> Result<Vec<User>, ApiError> {
        self.take_failure()?;
        self.note_list("users");
        Ok(self.users.lock().unwrap().clone())
    }
    async fn user_create(&self, payload: Value) -> Result<User, ApiError> {
        self.take_failure()?;
        let user = User {
            id: self.next("u"),
            name: payload
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("User")
                .into(),
            email: payload
                .get("email")
                .and_then(|v| v.as_str())
                .unwrap_or("user@school.test")
                .into(),
            role: payload
                .get("role")
                .and_then(|v| v.as_str())
                .unwrap_or("teacher")
                .into(),
            school_id: None,
        };
        self.create_calls
            .lock()
            .unwrap()
            .push(("users".into(), payload));
        Ok(user)
    }
    async fn user_update(&self, id: &str, payload: Value) -> Result<User, ApiError> {
        self.take_failure()?;
        Ok(User {
            id: id.to_string(),
            name: payload
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("User")
                .into(),
            email: "user@school.test".into(),
            role: "teacher".into(),
            school_id: None,
        })
    }
    async fn user_delete(&self, _id: &str) -> Result<(), ApiError> {
        self.take_failure()
    }

    async fn attendance_list(
        &self,
        filters: &AttendanceFilters,
    ) -> Result<Vec<AttendanceRecord>, ApiError> {
        self.take_failure()?;
        self.note_list("attendance");
        let records = self.attendance.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| match &filters.class_id {
                None => true,
                Some(class_id) => r.class_id.id() == class_id,
            })
            .filter(|r| match filters.date {
                None => true,
                Some(date) => r.date == date,
            })
            .cloned()
            .collect())
    }
    async fn attendance_bulk_create(
        &self,
        records: &[NewAttendance],
    ) -> Result<Vec<AttendanceRecord>, ApiError> {
        self.take_failure()?;
        self.bulk_attendance_calls
            .lock()
            .unwrap()
            .push(records.to_vec());
        let created: Vec<AttendanceRecord> = records
            .iter()
            .map(|r| AttendanceRecord {
                id: self.next("att"),
                student_id: Ref::Id(r.student_id.clone()),
                class_id: Ref::Id(r.class_id.clone()),
                school_id: None,
                date: r.date,
                status: r.status,
                remarks: r.remarks.clone(),
            })
            .collect();
        self.attendance.lock().unwrap().extend(created.clone());
        Ok(created)
    }
    async fn attendance_update(
        &self,
        id: &str,
        payload: Value,
    ) -> Result<AttendanceRecord, ApiError> {
        self.take_failure()?;
        self.attendance_update_calls
            .lock()
            .unwrap()
            .push((id.to_string(), payload.clone()));
        let mut records = self.attendance.lock().unwrap();
        let rec = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ApiError::Api {
                status: 404,
                message: "attendance record not found".into(),
            })?;
        if let Some(status) = payload
            .get("status")
            .cloned()
            .and_then(|v| serde_json::from_value::<AttendanceStatus>(v).ok())
        {
            rec.status = status;
        }
        Ok(rec.clone())
    }
    async fn attendance_delete(&self, _id: &str) -> Result<(), ApiError> {
        self.take_failure()
    }

    async fn marks_list(&self, filters: &MarksFilters) -> Result<Vec<Mark>, ApiError> {
        self.take_failure()?;
        self.note_list("marks");
        let marks = self.marks.lock().unwrap();
        Ok(marks
            .iter()
            .filter(|m| match &filters.class_id {
                None => true,
                Some(class_id) => m.class_id.id() == class_id,
            })
            .filter(|m| match filters.exam_type {
                None => true,
                Some(exam_type) => m.exam_type == exam_type,
            })
            .cloned()
            .collect())
    }
    async fn marks_bulk_create(&self, new_marks: &[NewMark]) -> Result<Vec<Mark>, ApiError> {
        self.take_failure()?;
        self.bulk_marks_calls.lock().unwrap().push(new_marks.to_vec());
        let created: Vec<Mark> = new_marks
            .iter()
            .map(|m| Mark {
                id: self.next("m"),
                student_id: Ref::Id(m.student_id.clone()),
                class_id: Ref::Id(m.class_id.clone()),
                subject_id: m.subject_id.clone(),
                teacher_id: None,
                school_id: None,
                exam_type: m.exam_type,
                academic_year: m.academic_year.clone(),
                academic_term: m.academic_term,
                exam_date: m.exam_date,
                total_marks: m.total_marks,
            })
            .collect();
        self.marks.lock().unwrap().extend(created.clone());
        Ok(created)
    }
    async fn mark_update(&self, id: &str, payload: Value) -> Result<Mark, ApiError> {
        self.take_failure()?;
        self.mark_update_calls
            .lock()
            .unwrap()
            .push((id.to_string(), payload.clone()));
        let mut marks = self.marks.lock().unwrap();
        let mark = marks.iter_mut().find(|m| m.id == id).ok_or(ApiError::Api {
            status: 404,
            message: "mark not found".into(),
        })?;
        if let Some(total) = payload.get("totalMarks").and_then(|v| v.as_f64()) {
            mark.total_marks = total;
        }
        Ok(mark.clone())
    }
    async fn mark_delete(&self, _id: &str) -> Result<(), ApiError> {
        self.take_failure()
    }

    async fn comments_list(&self, _filters: &CommentFilters) -> Result<Vec<Comment>, ApiError> {
        self.take_failure()?;
        self.note_list("comments");
        Ok(self.comments.lock().unwrap().clone())
    }
    async fn comment_create(&self, payload: Value) -> Result<Comment, ApiError> {
        self.take_failure()?;
        let comment = comment_from_payload(&self.next("com"), &payload);
        self.create_calls
            .lock()
            .unwrap()
            .push(("comments".into(), payload));
        Ok(comment)
    }
    async fn comment_update(&self, id: &str, payload: Value) -> Result<Comment, ApiError> {
        self.take_failure()?;
        Ok(comment_from_payload(id, &payload))
    }
    async fn comment_delete(&self, _id: &str) -> Result<(), ApiError> {
        self.take_failure()
    }

    async fn report_fetch(&self, _kind: &str, _filters: &ReportFilters) -> Result<Report, ApiError> {
        self.take_failure()?;
        Ok(self.report.lock().unwrap().clone())
    }
    async fn report_download(
        &self,
        _kind: &str,
        _filters: &ReportFilters,
    ) -> Result<Download, ApiError> {
        self.take_failure()?;
        self.download
            .lock()
            .unwrap()
            .clone()
            .ok_or(ApiError::Api {
                status: 200,
                message: "no report available".into(),
            })
    }

    async fn analytics_attendance(&self, _filters: &ReportFilters) -> Result<Value, ApiError> {
        self.take_failure()?;
        Ok(self.analytics.lock().unwrap().clone())
    }
    async fn analytics_marks(&self, _filters: &ReportFilters) -> Result<Value, ApiError> {
        self.take_failure()?;
        Ok(self.analytics.lock().unwrap().clone())
    }
}

fn comment_from_payload(id: &str, payload: &Value) -> Comment {
    let text = |key: &str| {
        payload
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };
    Comment {
        id: id.to_string(),
        teacher_id: Ref::Id(text("teacherId").unwrap_or_else(|| "u-1".into())),
        class_id: Ref::Id(text("classId").unwrap_or_else(|| "cls-1".into())),
        school_id: None,
        commenter_role: payload
            .get("commenterRole")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or(CommenterRole::Teacher),
        number_of_students: payload.get("numberOfStudents").and_then(|v| v.as_i64()),
        success_story: text("successStory"),
        challenge: text("challenge"),
        model_lesson: text("modelLesson"),
        lesson_observation: text("lessonObservation"),
        date: text("date")
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()),
    }
}

pub fn test_config(export_dir: &Path) -> Config {
    Config {
        backend: config::Backend {
            base_url: "http://backend.test/api/".into(),
            timeout_seconds: 5,
        },
        export: config::Export {
            dir: export_dir.to_string_lossy().to_string(),
        },
    }
}

pub fn state_with(fake: Arc<FakeBackend>, export_dir: &Path) -> AppState {
    AppState::new(&test_config(export_dir), fake)
}

pub async fn request(state: &mut AppState, id: &str, method: &str, params: Value) -> Value {
    ipc::handle_request(
        state,
        Request {
            id: id.to_string(),
            method: method.to_string(),
            params,
        },
    )
    .await
}

pub async fn request_ok(state: &mut AppState, id: &str, method: &str, params: Value) -> Value {
    let resp = request(state, id, method, params).await;
    assert_eq!(
        resp.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "expected ok for {method}: {resp}"
    );
    resp.get("result").cloned().unwrap_or(Value::Null)
}

pub fn error_code(resp: &Value) -> &str {
    resp.get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

pub async fn login(state: &mut AppState) {
    let result = request_ok(
        state,
        "login",
        "session.login",
        json!({ "email": "teacher@school.test", "password": "pw" }),
    )
    .await;
    assert_eq!(
        result.pointer("/user/id").and_then(|v| v.as_str()),
        Some("u-1")
    );
}

pub fn student(id: &str, name: &str, class_id: &str) -> Student {
    Student {
        id: id.into(),
        student_name: name.into(),
        class_id: Some(Ref::Id(class_id.into())),
        school_id: None,
    }
}

pub fn att_record(
    id: &str,
    student_id: &str,
    class_id: &str,
    date: &str,
    status: AttendanceStatus,
) -> AttendanceRecord {
    AttendanceRecord {
        id: id.into(),
        student_id: Ref::Id(student_id.into()),
        class_id: Ref::Id(class_id.into()),
        school_id: None,
        date: date.parse().unwrap(),
        status,
        remarks: None,
    }
}

pub fn mark(
    id: &str,
    student_id: &str,
    class_id: &str,
    exam_type: classdeskd::model::ExamType,
    total_marks: f64,
) -> Mark {
    Mark {
        id: id.into(),
        student_id: Ref::Id(student_id.into()),
        class_id: Ref::Id(class_id.into()),
        subject_id: None,
        teacher_id: None,
        school_id: None,
        exam_type,
        academic_year: "2025/2026".into(),
        academic_term: classdeskd::model::AcademicTerm::FirstTerm,
        exam_date: None,
        total_marks,
    }
}
