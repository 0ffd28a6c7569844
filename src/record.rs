//! Badge records keyed by tag id.
//!
//! The real store lives outside this crate; [`RecordStore`] is the interface
//! it is consumed through, and [`MemoryStore`] a simple in-process version.

use log::debug;
use std::collections::HashMap;

use crate::error::Error;

/// Owner of a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub comment: String,
}

impl Record {
    pub fn new<N: Into<String>, C: Into<String>>(name: N, comment: C) -> Self {
        Record {
            name: name.into(),
            comment: comment.into(),
        }
    }

    /// Name badge lines: the name, then the comment if there is one.
    pub fn badge_lines(&self) -> Vec<Vec<String>> {
        let mut lines = vec![vec![self.name.clone()]];
        if !self.comment.trim().is_empty() {
            lines.push(vec![self.comment.clone()]);
        }
        lines
    }
}

/// Storage label lines: the owner, then the date in and date out side by side.
pub fn storage_lines(owner: &str, date_in: &str, date_out: &str) -> Vec<Vec<String>> {
    vec![
        vec![owner.to_string()],
        vec![date_in.to_string(), date_out.to_string()],
    ]
}

/// Lowercase hex form of a tag id.
pub fn tag_hex(tag: &[u8]) -> String {
    tag.iter().map(|b| format!("{:02x}", b)).collect()
}

pub trait RecordStore {
    fn lookup(&self, tag: &[u8]) -> Result<Record, Error>;

    /// Enrol a new tag. Fails if the tag is already known.
    fn insert(&mut self, tag: &[u8], record: Record) -> Result<(), Error>;

    /// Replace the record of a known tag.
    fn update(&mut self, tag: &[u8], record: Record) -> Result<(), Error>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<Vec<u8>, Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn lookup(&self, tag: &[u8]) -> Result<Record, Error> {
        self.records
            .get(tag)
            .cloned()
            .ok_or_else(|| Error::RecordNotFound(tag_hex(tag)))
    }

    fn insert(&mut self, tag: &[u8], record: Record) -> Result<(), Error> {
        if self.records.contains_key(tag) {
            return Err(Error::DuplicateRecord(tag_hex(tag)));
        }
        debug!("enrolling tag {}", tag_hex(tag));
        self.records.insert(tag.to_vec(), record);
        Ok(())
    }

    fn update(&mut self, tag: &[u8], record: Record) -> Result<(), Error> {
        match self.records.get_mut(tag) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(Error::RecordNotFound(tag_hex(tag))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG: &[u8] = &[0x04, 0xA2, 0x1F, 0x00];

    #[test]
    fn lookup_missing_tag() {
        let store = MemoryStore::new();
        match store.lookup(TAG) {
            Err(Error::RecordNotFound(hex)) => assert_eq!(hex, "04a21f00"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn enrol_then_update() {
        let mut store = MemoryStore::new();
        store.insert(TAG, Record::new("Jane Doe", "jane@example.org")).unwrap();
        assert!(matches!(
            store.insert(TAG, Record::new("Other", "")),
            Err(Error::DuplicateRecord(_))
        ));

        store.update(TAG, Record::new("Jane Doe", "Woodwork")).unwrap();
        assert_eq!(store.lookup(TAG).unwrap().comment, "Woodwork");
    }

    #[test]
    fn update_unknown_tag() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            store.update(TAG, Record::new("x", "y")),
            Err(Error::RecordNotFound(_))
        ));
    }

    #[test]
    fn badge_and_storage_lines() {
        let record = Record::new("Jane Doe", "Widget Storage");
        assert_eq!(
            record.badge_lines(),
            vec![vec!["Jane Doe".to_string()], vec!["Widget Storage".to_string()]]
        );
        assert_eq!(Record::new("Jane", " ").badge_lines().len(), 1);

        let lines = storage_lines("Jane", "2024-01-01", "2024-03-01");
        assert_eq!(lines[1], vec!["2024-01-01".to_string(), "2024-03-01".to_string()]);
    }
}
