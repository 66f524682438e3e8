// src/snapshot.rs
//
// Canonical in-memory shape of one fetch: entity name → tracked values.
// Serialized as-is by the store, so field names double as the on-disk keys.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tracked columns. Order matters: it is the order changes are reported in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Location,
    Time,
}

impl Field {
    pub const ALL: [Field; 2] = [Field::Location, Field::Time];

    pub fn key(self) -> &'static str {
        match self {
            Field::Location => "local",
            Field::Time => "hora",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Tracked values for one entity. Missing keys in a stored file read as "".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub local: String,
    #[serde(default)]
    pub hora: String,
}

impl Entry {
    pub fn new(local: impl Into<String>, hora: impl Into<String>) -> Self {
        Self { local: local.into(), hora: hora.into() }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Location => &self.local,
            Field::Time => &self.hora,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Location => self.local = value,
            Field::Time => self.hora = value,
        }
    }
}

/// Entity name → tracked values. Never holds an empty name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: BTreeMap<String, Entry>,
}

impl Snapshot {
    pub fn new() -> Self { Self::default() }

    /// Insert or replace (last occurrence wins). Blank names are ignored;
    /// returns whether the entry was stored.
    pub fn insert(&mut self, name: &str, entry: Entry) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.entries.insert(s!(name), entry);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Entry> { self.entries.get(name) }
    pub fn contains(&self, name: &str) -> bool { self.entries.contains_key(name) }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Drop names that snuck in blank (e.g. hand-edited state files).
    pub(crate) fn sanitize(mut self) -> Self {
        self.entries.retain(|k, _| !k.trim().is_empty());
        self
    }
}

impl<'a> FromIterator<(&'a str, Entry)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (&'a str, Entry)>>(iter: I) -> Self {
        let mut snap = Snapshot::new();
        for (name, entry) in iter {
            snap.insert(name, entry);
        }
        snap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_never_enter() {
        let mut snap = Snapshot::new();
        assert!(!snap.insert("   ", Entry::new("a", "b")));
        assert!(snap.is_empty());
    }

    #[test]
    fn duplicates_keep_last() {
        let snap: Snapshot = [
            ("BlocoX", Entry::new("Praça A", "14h")),
            ("BlocoX", Entry::new("Praça B", "15h")),
        ].into_iter().collect();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.get("BlocoX"), Some(&Entry::new("Praça B", "15h")));
    }

    #[test]
    fn json_shape_matches_state_file() {
        let snap: Snapshot = [("BlocoX", Entry::new("Praça A", "14h"))].into_iter().collect();
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json, serde_json::json!({ "BlocoX": { "local": "Praça A", "hora": "14h" } }));

        let partial: Snapshot = serde_json::from_str(r#"{ "Y": { "local": "Rua" } }"#).unwrap();
        assert_eq!(partial.get("Y").unwrap().hora, "");
    }
}
