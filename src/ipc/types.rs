use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::Backend;
use crate::config::Config;
use crate::model::{AttendanceStatus, Student, User};
use crate::roster::{AttendanceCtx, EditBuffer, MarksCtx, SlotKey};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub export_dir: PathBuf,
    pub session: Option<Session>,
    /// Edit buffers: transient mirrors of the last server response plus any
    /// staged user input, across every context visited this session.
    pub attendance_buf: EditBuffer<AttendanceCtx, AttendanceStatus>,
    pub marks_buf: EditBuffer<MarksCtx, f64>,
    /// Clamp ceiling per marks context, set when the context is opened.
    pub marks_out_of: HashMap<MarksCtx, f64>,
    /// Last-fetched roster per class id, seeded by the open handlers.
    pub rosters: HashMap<String, Vec<Student>>,
    /// In-flight guards: suppress a duplicate save for the same entity while
    /// the first one is still out. The stdio loop services requests serially,
    /// so these never trip there; they hold the invariant for any dispatcher
    /// that overlaps saves. Always cleared when the save returns.
    pub saving_attendance: HashSet<SlotKey<AttendanceCtx>>,
    pub saving_marks: HashSet<SlotKey<MarksCtx>>,
}

impl AppState {
    pub fn new(cfg: &Config, backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            export_dir: PathBuf::from(&cfg.export.dir),
            session: None,
            attendance_buf: EditBuffer::new(),
            marks_buf: EditBuffer::new(),
            marks_out_of: HashMap::new(),
            rosters: HashMap::new(),
            saving_attendance: HashSet::new(),
            saving_marks: HashSet::new(),
        }
    }

    /// Global session teardown: the token, the session and every transient
    /// mirror go together. Not scoped to whichever request hit the 401.
    pub fn clear_session(&mut self) {
        self.backend.set_token(None);
        self.session = None;
        self.attendance_buf.clear();
        self.marks_buf.clear();
        self.marks_out_of.clear();
        self.rosters.clear();
        self.saving_attendance.clear();
        self.saving_marks.clear();
    }
}
