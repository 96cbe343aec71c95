use super::CollectionError;
use crate::model::{Category, NewRecord, Record, RecordPatch, RECORDS_KEY};
use crate::store::{read_collection, write_collection, Store};
use crate::sync::UpdateBus;
use chrono::Utc;
use uuid::Uuid;

pub fn list(store: &dyn Store) -> Vec<Record> {
    read_collection(store, RECORDS_KEY)
}

pub fn find_index_by_id(records: &[Record], id: &str) -> Option<usize> {
    records.iter().position(|r| r.id == id)
}

/// Checks the shared field invariants for a record: required fields,
/// a known category, a finite score, and live student/subject references.
fn validate_fields(
    store: &dyn Store,
    student_email: &str,
    subject: &str,
    category: &str,
    score: Option<f64>,
) -> Result<Category, CollectionError> {
    if student_email.is_empty() {
        return Err(CollectionError::validation("missing studentEmail"));
    }
    if subject.is_empty() {
        return Err(CollectionError::validation("missing subject"));
    }
    if category.is_empty() {
        return Err(CollectionError::validation("missing category"));
    }
    let Some(category) = Category::parse(category) else {
        return Err(CollectionError::validation(format!(
            "unknown category: {}",
            category
        )));
    };
    if let Some(score) = score {
        if !score.is_finite() {
            return Err(CollectionError::validation("score must be a number"));
        }
    }

    let students = crate::collections::students::list(store);
    if !students.iter().any(|s| s.email == student_email) {
        return Err(CollectionError::validation(format!(
            "unknown student: {}",
            student_email
        )));
    }
    let subjects = crate::collections::subjects::list(store);
    if !subjects.iter().any(|s| s == subject) {
        return Err(CollectionError::validation(format!(
            "unknown subject: {}",
            subject
        )));
    }

    Ok(category)
}

/// Pre-flight check for the upload path: the paper file is ingested only
/// after its record passes validation, so a rejected upload leaves no
/// stored file behind.
pub fn validate_new(store: &dyn Store, input: &NewRecord) -> Result<(), CollectionError> {
    validate_fields(
        store,
        input.student_email.trim(),
        input.subject.trim(),
        input.category.trim(),
        input.score,
    )
    .map(|_| ())
}

/// The single creation path. Accepts both the "record score" input (score,
/// no attachment) and the "upload paper" input (attachment, optional
/// score). A failed add mutates nothing and publishes nothing.
pub fn add(
    store: &mut dyn Store,
    bus: &mut UpdateBus,
    origin: Option<&str>,
    input: NewRecord,
) -> Result<Record, CollectionError> {
    let student_email = input.student_email.trim().to_string();
    let subject = input.subject.trim().to_string();
    let category = validate_fields(
        store,
        &student_email,
        &subject,
        input.category.trim(),
        input.score,
    )?;

    let record = Record {
        id: Uuid::new_v4().to_string(),
        student_email,
        subject,
        category,
        score: input.score,
        paper_name: input.paper.as_ref().map(|p| p.name.clone()),
        paper_ref: input.paper.as_ref().map(|p| p.content_ref.clone()),
        created_at: Utc::now().timestamp_millis(),
    };

    let mut records = list(store);
    records.push(record.clone());
    write_collection(store, RECORDS_KEY, &records)?;
    bus.publish(store, origin, &[RECORDS_KEY])?;
    Ok(record)
}

/// Removes the record at `index` in insertion order. Display-order indices
/// must be translated before this call.
pub fn remove(
    store: &mut dyn Store,
    bus: &mut UpdateBus,
    origin: Option<&str>,
    index: usize,
) -> Result<Record, CollectionError> {
    let mut records = list(store);
    if index >= records.len() {
        return Err(CollectionError::not_found("record index out of range"));
    }
    let removed = records.remove(index);
    write_collection(store, RECORDS_KEY, &records)?;
    bus.publish(store, origin, &[RECORDS_KEY])?;
    Ok(removed)
}

/// Applies a committed row edit as a full-field patch to the record at
/// `index` in insertion order. Identity, attachment, and timestamp fields
/// are untouched; the patched references are revalidated.
pub fn update(
    store: &mut dyn Store,
    bus: &mut UpdateBus,
    origin: Option<&str>,
    index: usize,
    patch: RecordPatch,
) -> Result<Record, CollectionError> {
    let mut records = list(store);
    if index >= records.len() {
        return Err(CollectionError::not_found("record index out of range"));
    }
    let student_email = patch.student_email.trim().to_string();
    let subject = patch.subject.trim().to_string();
    let category = validate_fields(
        store,
        &student_email,
        &subject,
        patch.category.trim(),
        patch.score,
    )?;

    let record = &mut records[index];
    record.student_email = student_email;
    record.subject = subject;
    record.category = category;
    record.score = patch.score;
    let updated = record.clone();

    write_collection(store, RECORDS_KEY, &records)?;
    bus.publish(store, origin, &[RECORDS_KEY])?;
    Ok(updated)
}
