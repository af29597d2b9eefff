//! Edit buffer and save-plan reconciliation for bulk data entry.
//!
//! One buffer holds slots from many contexts (class+date for attendance,
//! class+period for marks) without cross-contamination: a slot belongs to the
//! active context only when its key's context matches. Classification into
//! creates/updates/no-ops is idempotent, and merge-back is keyed by the
//! returned record's own context rather than the active one, so switching
//! back to a previously saved context shows correct state without a re-fetch.
use chrono::NaiveDate;
use std::collections::HashMap;
use std::hash::Hash;

use crate::model::{AcademicTerm, ExamType};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttendanceCtx {
    pub class_id: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarksCtx {
    pub class_id: String,
    pub academic_year: String,
    pub term: AcademicTerm,
    pub exam_type: ExamType,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey<C> {
    pub student_id: String,
    pub ctx: C,
}

#[derive(Debug, Clone)]
pub struct Slot<V> {
    pub entered: Option<V>,
    pub saved: Option<V>,
    pub saved_record_id: Option<String>,
}

// Not derived: a fresh slot is empty for any V, including value types
// with no Default of their own.
impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            entered: None,
            saved: None,
            saved_record_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedUpdate<V> {
    pub record_id: String,
    pub student_id: String,
    pub value: V,
}

/// The minimal set of operations a save must issue: creates are batched into
/// one bulk call, updates go out individually.
#[derive(Debug, Clone, PartialEq)]
pub struct SavePlan<V> {
    pub creates: Vec<(String, V)>,
    pub updates: Vec<PlannedUpdate<V>>,
}

impl<V> Default for SavePlan<V> {
    fn default() -> Self {
        Self {
            creates: Vec::new(),
            updates: Vec::new(),
        }
    }
}

impl<V> SavePlan<V> {
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct EditBuffer<C, V> {
    slots: HashMap<SlotKey<C>, Slot<V>>,
}

impl<C, V> EditBuffer<C, V>
where
    C: Clone + Eq + Hash,
    V: Clone + PartialEq,
{
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    fn key(student_id: &str, ctx: &C) -> SlotKey<C> {
        SlotKey {
            student_id: student_id.to_string(),
            ctx: ctx.clone(),
        }
    }

    pub fn slot(&self, student_id: &str, ctx: &C) -> Option<&Slot<V>> {
        self.slots.get(&Self::key(student_id, ctx))
    }

    /// Stage an entry for the given context. `None` means "no entry": it is
    /// never submitted and never defaulted on the per-student path.
    pub fn stage(&mut self, student_id: &str, ctx: &C, value: Option<V>) {
        let slot = self.slots.entry(Self::key(student_id, ctx)).or_default();
        slot.entered = value;
    }

    /// Seed a slot from a fetched record: saved and entered start equal, so a
    /// freshly opened context is clean.
    pub fn seed_saved(&mut self, student_id: &str, ctx: &C, record_id: String, value: V) {
        let slot = self.slots.entry(Self::key(student_id, ctx)).or_default();
        slot.entered = Some(value.clone());
        slot.saved = Some(value);
        slot.saved_record_id = Some(record_id);
    }

    /// Merge a server record back, keyed by the record's OWN context.
    pub fn merge_saved(&mut self, student_id: &str, ctx: &C, record_id: String, value: V) {
        self.seed_saved(student_id, ctx, record_id, value);
    }

    /// True iff any roster student's entered value differs from its saved
    /// value for the active context.
    pub fn is_dirty(&self, ctx: &C, roster: &[String]) -> bool {
        roster.iter().any(|student_id| {
            self.slot(student_id, ctx)
                .map(|s| s.entered != s.saved)
                .unwrap_or(false)
        })
    }

    /// Classify every roster student into create / update / no-op.
    ///
    /// Update: a saved record exists for (student, active ctx) and the entered
    /// value differs from the saved one. Create: entered value present and no
    /// saved record for the active ctx. Everything else is skipped.
    pub fn plan_save(&self, ctx: &C, roster: &[String]) -> SavePlan<V> {
        let mut plan = SavePlan::default();
        for student_id in roster {
            let Some(slot) = self.slot(student_id, ctx) else {
                continue;
            };
            let Some(entered) = slot.entered.as_ref() else {
                continue;
            };
            match slot.saved_record_id.as_ref() {
                Some(record_id) => {
                    if slot.saved.as_ref() != Some(entered) {
                        plan.updates.push(PlannedUpdate {
                            record_id: record_id.clone(),
                            student_id: student_id.clone(),
                            value: entered.clone(),
                        });
                    }
                }
                None => plan.creates.push((student_id.clone(), entered.clone())),
            }
        }
        plan
    }

    /// Whole-class save: like `plan_save`, but roster students with no entry
    /// and no saved record for the active context are created with `default`.
    pub fn plan_save_all(&self, ctx: &C, roster: &[String], default: V) -> SavePlan<V> {
        let mut plan = self.plan_save(ctx, roster);
        for student_id in roster {
            let untouched = match self.slot(student_id, ctx) {
                None => true,
                Some(slot) => slot.entered.is_none() && slot.saved_record_id.is_none(),
            };
            if untouched {
                plan.creates.push((student_id.clone(), default.clone()));
            }
        }
        plan
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Parse and clamp a raw numeric entry to `[0, max]`.
/// Non-numeric input maps to `None` ("no entry", never zero).
pub fn clamp_entry(raw: &str, max: f64) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value: f64 = trimmed.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.clamp(0.0, max))
}
