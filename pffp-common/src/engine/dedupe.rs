//! First-occurrence deduplication and entity extraction

use std::collections::HashSet;
use std::hash::Hash;

use crate::models::ProgramRecord;

/// Keep the first item per distinct key, preserving first-seen order
///
/// Items whose key is the "absent" value (e.g. `None`) are deduplicated
/// among themselves like any other key, so they collapse to one entry.
/// Use [`extract_entities`] to drop keyless rows instead.
pub fn dedupe_by<T, K, F>(items: impl IntoIterator<Item = T>, mut key_fn: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key_fn(item)))
        .collect()
}

/// Entity identified by one of the wide row's keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKey {
    Farmer,
    Plot,
    Record,
}

impl EntityKey {
    pub fn key_of(self, record: &ProgramRecord) -> Option<&str> {
        match self {
            EntityKey::Farmer => record.farmer_id(),
            EntityKey::Plot => record.plot_id(),
            EntityKey::Record => record.record_id(),
        }
    }
}

/// One representative row per entity; rows lacking the key are ignored
pub fn extract_entities<'a, I>(records: I, entity: EntityKey) -> Vec<&'a ProgramRecord>
where
    I: IntoIterator<Item = &'a ProgramRecord>,
{
    let keyed = records
        .into_iter()
        .filter(|r| entity.key_of(r).is_some());
    dedupe_by(keyed, |r: &&'a ProgramRecord| entity.key_of(*r))
}
