use super::CollectionError;
use crate::model::{Record, Subject, RECORDS_KEY, SUBJECTS_KEY};
use crate::store::{read_collection, write_collection, Store};
use crate::sync::UpdateBus;

pub fn list(store: &dyn Store) -> Vec<Subject> {
    read_collection(store, SUBJECTS_KEY)
}

pub fn add(
    store: &mut dyn Store,
    bus: &mut UpdateBus,
    origin: Option<&str>,
    name: &str,
) -> Result<Subject, CollectionError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CollectionError::validation("missing name"));
    }

    let mut subjects = list(store);
    if subjects.iter().any(|s| s == name) {
        return Err(CollectionError::DuplicateKey {
            key: name.to_string(),
        });
    }

    subjects.push(name.to_string());
    write_collection(store, SUBJECTS_KEY, &subjects)?;
    bus.publish(store, origin, &[SUBJECTS_KEY])?;
    Ok(name.to_string())
}

#[derive(Debug, Clone, Copy)]
pub struct RemoveSummary {
    pub removed_records: usize,
}

/// Removes a subject and every record referencing it, written together
/// before one publish covering both keys.
pub fn remove(
    store: &mut dyn Store,
    bus: &mut UpdateBus,
    origin: Option<&str>,
    name: &str,
) -> Result<RemoveSummary, CollectionError> {
    let mut subjects = list(store);
    let before = subjects.len();
    subjects.retain(|s| s != name);
    if subjects.len() == before {
        return Err(CollectionError::not_found("subject not found"));
    }
    write_collection(store, SUBJECTS_KEY, &subjects)?;

    let mut records: Vec<Record> = read_collection(store, RECORDS_KEY);
    let records_before = records.len();
    records.retain(|r| r.subject != name);
    let removed_records = records_before - records.len();
    write_collection(store, RECORDS_KEY, &records)?;

    bus.publish(store, origin, &[SUBJECTS_KEY, RECORDS_KEY])?;
    Ok(RemoveSummary { removed_records })
}
