use crate::model::{Record, RecordPatch};
use std::collections::HashMap;
use std::fmt;

/// Translates a display-order row index (newest first) into the
/// insertion-order storage index. Callers must recompute this against the
/// collection length at action time, never against a length cached at
/// render time, because intervening deletes shift indices.
pub fn storage_index(len: usize, display_index: usize) -> Option<usize> {
    if display_index < len {
        Some(len - 1 - display_index)
    } else {
        None
    }
}

/// The bound input fields of a row in Editing state. Fields hold raw input
/// text; `score` left empty commits as "no score".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDraft {
    pub student_email: String,
    pub subject: String,
    pub category: String,
    pub score: String,
}

impl RowDraft {
    fn from_record(record: &Record) -> Self {
        RowDraft {
            student_email: record.student_email.clone(),
            subject: record.subject.clone(),
            category: record.category.as_str().to_string(),
            score: record.score.map(|s| s.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowState {
    Viewing,
    Editing(RowDraft),
}

#[derive(Debug)]
pub enum EditError {
    NotEditing,
    UnknownField(String),
    BadScore(String),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::NotEditing => write!(f, "row is not in editing state"),
            EditError::UnknownField(field) => write!(f, "unknown editable field: {}", field),
            EditError::BadScore(raw) => write!(f, "score is not a number: {}", raw),
        }
    }
}

impl std::error::Error for EditError {}

/// Per-view row edit transactions, keyed by stable record id so that no
/// operation depends on a volatile display index.
///
/// Multiple rows may be in Editing at once; drafts are independent. A
/// draft whose record is deleted underneath it simply fails to resolve at
/// commit time and gets dropped by the next render.
#[derive(Debug, Default)]
pub struct TableSession {
    drafts: HashMap<String, RowDraft>,
}

impl TableSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters Editing for a row, pre-populating the draft from the caller's
    /// current record values (not from a redundant storage re-read).
    /// Re-entering resets the draft to the record's values.
    pub fn begin_edit(&mut self, record: &Record) -> RowDraft {
        let draft = RowDraft::from_record(record);
        self.drafts.insert(record.id.clone(), draft.clone());
        draft
    }

    pub fn is_editing(&self, record_id: &str) -> bool {
        self.drafts.contains_key(record_id)
    }

    pub fn row_state(&self, record_id: &str) -> RowState {
        match self.drafts.get(record_id) {
            Some(draft) => RowState::Editing(draft.clone()),
            None => RowState::Viewing,
        }
    }

    pub fn set_field(
        &mut self,
        record_id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), EditError> {
        let draft = self.drafts.get_mut(record_id).ok_or(EditError::NotEditing)?;
        match field {
            "studentEmail" => draft.student_email = value.to_string(),
            "subject" => draft.subject = value.to_string(),
            "category" => draft.category = value.to_string(),
            "score" => draft.score = value.to_string(),
            other => return Err(EditError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    /// Discards an in-progress edit with no storage effect.
    pub fn cancel(&mut self, record_id: &str) -> bool {
        self.drafts.remove(record_id).is_some()
    }

    /// Resolves the draft into a full-field patch and returns the row to
    /// Viewing. A non-numeric score input fails the commit and keeps the
    /// row in Editing so the input can be corrected.
    pub fn take_commit(&mut self, record_id: &str) -> Result<RecordPatch, EditError> {
        let draft = self.drafts.get(record_id).ok_or(EditError::NotEditing)?;
        let score_raw = draft.score.trim();
        let score = if score_raw.is_empty() {
            None
        } else {
            match score_raw.parse::<f64>() {
                Ok(v) => Some(v),
                Err(_) => return Err(EditError::BadScore(score_raw.to_string())),
            }
        };
        let draft = self.drafts.remove(record_id).expect("draft present");
        Ok(RecordPatch {
            student_email: draft.student_email,
            subject: draft.subject,
            category: draft.category,
            score,
        })
    }

    /// Drops drafts whose record no longer exists. Called on render so a
    /// cascade or remote delete cannot leave a phantom Editing row.
    pub fn prune(&mut self, records: &[Record]) {
        self.drafts
            .retain(|id, _| records.iter().any(|r| &r.id == id));
    }
}

/// A rendered row: the record plus its edit state, in display order.
#[derive(Debug)]
pub struct RowView<'a> {
    pub display_index: usize,
    pub record: &'a Record,
    pub state: RowState,
}

/// Renders a collection as rows in reverse insertion order (newest first).
pub fn rows<'a>(session: &TableSession, records: &'a [Record]) -> Vec<RowView<'a>> {
    records
        .iter()
        .rev()
        .enumerate()
        .map(|(display_index, record)| RowView {
            display_index,
            record,
            state: session.row_state(&record.id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::{records, students, subjects};
    use crate::model::NewRecord;
    use crate::store::{MemoryStore, Store};
    use crate::sync::UpdateBus;

    fn seed_three_records() -> (MemoryStore, UpdateBus) {
        let mut store = MemoryStore::new();
        let mut bus = UpdateBus::new();
        students::add(&mut store, &mut bus, None, "a@x", "A").expect("student");
        subjects::add(&mut store, &mut bus, None, "Math").expect("subject");
        for score in [10.0, 20.0, 30.0] {
            records::add(
                &mut store,
                &mut bus,
                None,
                NewRecord {
                    student_email: "a@x".to_string(),
                    subject: "Math".to_string(),
                    category: "Quiz".to_string(),
                    score: Some(score),
                    paper: None,
                },
            )
            .expect("record");
        }
        (store, bus)
    }

    #[test]
    fn storage_index_reverses_and_bounds_checks() {
        assert_eq!(storage_index(3, 0), Some(2));
        assert_eq!(storage_index(3, 2), Some(0));
        assert_eq!(storage_index(3, 3), None);
        assert_eq!(storage_index(0, 0), None);
    }

    #[test]
    fn rows_render_newest_first() {
        let (store, _bus) = seed_three_records();
        let all = records::list(&store);
        let session = TableSession::new();
        let rendered = rows(&session, &all);
        let scores: Vec<Option<f64>> = rendered.iter().map(|r| r.record.score).collect();
        assert_eq!(scores, vec![Some(30.0), Some(20.0), Some(10.0)]);
        assert!(rendered.iter().all(|r| r.state == RowState::Viewing));
    }

    #[test]
    fn deleting_displayed_row_zero_removes_newest_record() {
        let (mut store, mut bus) = seed_three_records();
        let all = records::list(&store);
        let newest_id = all[all.len() - 1].id.clone();

        // Translation is recomputed against the current length at action
        // time, surviving an intervening delete.
        let idx = storage_index(all.len(), 0).expect("in range");
        records::remove(&mut store, &mut bus, None, idx).expect("remove");

        let left = records::list(&store);
        assert_eq!(left.len(), 2);
        assert!(left.iter().all(|r| r.id != newest_id));
        let displayed: Vec<Option<f64>> = left.iter().rev().map(|r| r.score).collect();
        assert_eq!(displayed, vec![Some(20.0), Some(10.0)]);
    }

    #[test]
    fn edit_save_roundtrip_changes_only_the_score() {
        let (mut store, mut bus) = seed_three_records();
        let all = records::list(&store);
        let target = all[0].clone();

        let mut session = TableSession::new();
        let draft = session.begin_edit(&target);
        assert_eq!(draft.score, "10");
        assert_eq!(draft.category, "Quiz");

        session
            .set_field(&target.id, "score", "95")
            .expect("set score");
        let patch = session.take_commit(&target.id).expect("commit");

        let index = records::find_index_by_id(&all, &target.id).expect("index");
        records::update(&mut store, &mut bus, None, index, patch).expect("update");

        let after = records::list(&store);
        assert_eq!(after[0].score, Some(95.0));
        assert_eq!(after[0].id, target.id);
        assert_eq!(after[0].subject, target.subject);
        assert_eq!(after[0].created_at, target.created_at);
        assert_eq!(&after[1..], &all[1..]);
    }

    #[test]
    fn edit_cancel_leaves_collection_byte_identical() {
        let (store, _bus) = seed_three_records();
        let before = store
            .get_item(crate::model::RECORDS_KEY)
            .expect("get")
            .expect("payload");

        let all = records::list(&store);
        let mut session = TableSession::new();
        session.begin_edit(&all[1]);
        session
            .set_field(&all[1].id, "score", "999")
            .expect("set score");
        assert!(session.cancel(&all[1].id));
        assert_eq!(session.row_state(&all[1].id), RowState::Viewing);

        let after = store
            .get_item(crate::model::RECORDS_KEY)
            .expect("get")
            .expect("payload");
        assert_eq!(before, after);
    }

    #[test]
    fn bad_score_input_keeps_row_in_editing() {
        let (store, _bus) = seed_three_records();
        let all = records::list(&store);
        let mut session = TableSession::new();
        session.begin_edit(&all[0]);
        session
            .set_field(&all[0].id, "score", "ninety")
            .expect("set score");

        let err = session.take_commit(&all[0].id).expect_err("bad score");
        assert!(matches!(err, EditError::BadScore(_)));
        assert!(session.is_editing(&all[0].id));
    }

    #[test]
    fn concurrent_row_drafts_are_independent() {
        let (store, _bus) = seed_three_records();
        let all = records::list(&store);
        let mut session = TableSession::new();
        session.begin_edit(&all[0]);
        session.begin_edit(&all[1]);
        session
            .set_field(&all[0].id, "score", "1")
            .expect("set score");
        session
            .set_field(&all[1].id, "score", "2")
            .expect("set score");

        let patch0 = session.take_commit(&all[0].id).expect("commit 0");
        assert_eq!(patch0.score, Some(1.0));
        assert!(session.is_editing(&all[1].id));
        let patch1 = session.take_commit(&all[1].id).expect("commit 1");
        assert_eq!(patch1.score, Some(2.0));
    }

    #[test]
    fn prune_drops_drafts_for_deleted_records() {
        let (store, _bus) = seed_three_records();
        let mut all = records::list(&store);
        let mut session = TableSession::new();
        session.begin_edit(&all[0]);
        let gone = all.remove(0);
        session.prune(&all);
        assert!(!session.is_editing(&gone.id));
    }
}
