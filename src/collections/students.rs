use super::CollectionError;
use crate::model::{Record, Student, RECORDS_KEY, STUDENTS_KEY};
use crate::store::{read_collection, write_collection, Store};
use crate::sync::UpdateBus;

pub fn list(store: &dyn Store) -> Vec<Student> {
    read_collection(store, STUDENTS_KEY)
}

/// Appends a student. Emails are the unique key of the collection.
pub fn add(
    store: &mut dyn Store,
    bus: &mut UpdateBus,
    origin: Option<&str>,
    email: &str,
    name: &str,
) -> Result<Student, CollectionError> {
    let email = email.trim();
    let name = name.trim();
    if email.is_empty() {
        return Err(CollectionError::validation("missing email"));
    }
    if name.is_empty() {
        return Err(CollectionError::validation("missing name"));
    }

    let mut students = list(store);
    if students.iter().any(|s| s.email == email) {
        return Err(CollectionError::DuplicateKey {
            key: email.to_string(),
        });
    }

    let student = Student {
        email: email.to_string(),
        name: name.to_string(),
    };
    students.push(student.clone());
    write_collection(store, STUDENTS_KEY, &students)?;
    bus.publish(store, origin, &[STUDENTS_KEY])?;
    Ok(student)
}

#[derive(Debug, Clone, Copy)]
pub struct RemoveSummary {
    pub removed_records: usize,
}

/// Removes a student and, in the same logical transaction, every record
/// whose `studentEmail` references it. Both collections are written before
/// the single publish that covers both keys, so no view can observe a
/// dangling reference.
pub fn remove(
    store: &mut dyn Store,
    bus: &mut UpdateBus,
    origin: Option<&str>,
    email: &str,
) -> Result<RemoveSummary, CollectionError> {
    let mut students = list(store);
    let before = students.len();
    students.retain(|s| s.email != email);
    if students.len() == before {
        return Err(CollectionError::not_found("student not found"));
    }
    write_collection(store, STUDENTS_KEY, &students)?;

    let mut records: Vec<Record> = read_collection(store, RECORDS_KEY);
    let records_before = records.len();
    records.retain(|r| r.student_email != email);
    let removed_records = records_before - records.len();
    write_collection(store, RECORDS_KEY, &records)?;

    bus.publish(store, origin, &[STUDENTS_KEY, RECORDS_KEY])?;
    Ok(RemoveSummary { removed_records })
}
