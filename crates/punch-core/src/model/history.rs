//! Append-only per-attribute history timelines.
//!
//! Every mutable deficiency attribute carries a full audit trail: a map of
//! generated entry ids to immutable [`HistoryEntry`] values. Entries are
//! never replaced or removed; an update appends a fresh entry and the
//! matching `current_*` field is persisted alongside it in the same diff.
//!
//! # Current value
//!
//! The "current" value of an attribute is the newest entry of its
//! timeline. Ties on `created_at` are broken by the lexicographically
//! greatest entry id, so [`Timeline::latest`] is total and deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One immutable ledger entry for a single attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry<T> {
    /// Unix seconds at which the entry was written.
    #[serde(deserialize_with = "crate::time::lenient_seconds")]
    pub created_at: i64,
    /// The historical value.
    pub value: T,
    /// Remediation window this entry belongs to, when known.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::time::lenient_seconds_opt"
    )]
    pub start_date: Option<i64>,
    /// Author of the change, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// An append-only ledger of [`HistoryEntry`] values keyed by entry id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeline<T> {
    entries: BTreeMap<String, HistoryEntry<T>>,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> Timeline<T> {
    /// Create an empty timeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry under `id`.
    ///
    /// Existing entries are never replaced: a colliding id leaves the
    /// ledger unchanged and returns `false`.
    pub fn insert(&mut self, id: impl Into<String>, entry: HistoryEntry<T>) -> bool {
        use std::collections::btree_map::Entry;

        match self.entries.entry(id.into()) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Look up an entry by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&HistoryEntry<T>> {
        self.entries.get(id)
    }

    /// The newest entry: greatest `created_at`, ties broken by the
    /// lexicographically greatest entry id.
    #[must_use]
    pub fn latest(&self) -> Option<(&str, &HistoryEntry<T>)> {
        self.entries
            .iter()
            .max_by(|(id_a, a), (id_b, b)| {
                a.created_at.cmp(&b.created_at).then_with(|| id_a.cmp(id_b))
            })
            .map(|(id, entry)| (id.as_str(), entry))
    }

    /// The newest entry's value.
    #[must_use]
    pub fn latest_value(&self) -> Option<&T> {
        self.latest().map(|(_, entry)| &entry.value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HistoryEntry<T>)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    /// Merge freshly appended entries into the ledger. Existing entries
    /// are left untouched (append-only).
    pub fn extend_from(&mut self, appended: &BTreeMap<String, HistoryEntry<T>>)
    where
        T: Clone,
    {
        for (id, entry) in appended {
            self.insert(id.clone(), entry.clone());
        }
    }

    /// True when every entry of `earlier` is present and identical here.
    /// Used to assert the append-only invariant across updates.
    #[must_use]
    pub fn contains_all(&self, earlier: &Self) -> bool
    where
        T: PartialEq,
    {
        earlier
            .entries
            .iter()
            .all(|(id, entry)| self.entries.get(id) == Some(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::{HistoryEntry, Timeline};

    fn entry(created_at: i64, value: &str) -> HistoryEntry<String> {
        HistoryEntry {
            created_at,
            value: value.to_string(),
            start_date: None,
            user: None,
        }
    }

    #[test]
    fn latest_picks_greatest_created_at() {
        let mut timeline = Timeline::new();
        timeline.insert("a", entry(100, "first"));
        timeline.insert("b", entry(300, "third"));
        timeline.insert("c", entry(200, "second"));

        assert_eq!(timeline.latest_value().map(String::as_str), Some("third"));
    }

    #[test]
    fn latest_tie_breaks_on_entry_id() {
        let mut timeline = Timeline::new();
        timeline.insert("aaa", entry(100, "low-id"));
        timeline.insert("zzz", entry(100, "high-id"));

        let (id, winner) = timeline.latest().expect("timeline is non-empty");
        assert_eq!(id, "zzz");
        assert_eq!(winner.value, "high-id");
    }

    #[test]
    fn insert_never_replaces() {
        let mut timeline = Timeline::new();
        assert!(timeline.insert("a", entry(100, "original")));
        assert!(!timeline.insert("a", entry(999, "impostor")));

        assert_eq!(timeline.len(), 1);
        assert_eq!(
            timeline.get("a").map(|e| e.value.as_str()),
            Some("original")
        );
    }

    #[test]
    fn contains_all_detects_lost_entries() {
        let mut earlier = Timeline::new();
        earlier.insert("a", entry(100, "one"));
        earlier.insert("b", entry(200, "two"));

        let mut later = earlier.clone();
        later.insert("c", entry(300, "three"));
        assert!(later.contains_all(&earlier));
        assert!(!earlier.contains_all(&later));
    }

    #[test]
    fn empty_timeline_has_no_latest() {
        let timeline: Timeline<String> = Timeline::new();
        assert!(timeline.latest().is_none());
        assert!(timeline.is_empty());
    }

    #[test]
    fn serde_is_transparent() {
        let mut timeline = Timeline::new();
        timeline.insert("e1", entry(100, "painted"));

        let json = serde_json::to_string(&timeline).expect("serialize");
        assert!(json.starts_with('{'));
        assert!(json.contains("\"e1\""));
        assert!(!json.contains("entries"));

        let back: Timeline<String> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, timeline);
    }

    #[test]
    fn entry_serde_skips_absent_metadata() {
        let bare = entry(100, "v");
        let json = serde_json::to_string(&bare).expect("serialize");
        assert!(!json.contains("start_date"));
        assert!(!json.contains("user"));

        let full = HistoryEntry {
            created_at: 100,
            value: "v".to_string(),
            start_date: Some(50),
            user: Some("inspector-1".to_string()),
        };
        let json = serde_json::to_string(&full).expect("serialize");
        let back: HistoryEntry<String> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, full);
    }
}
