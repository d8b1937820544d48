//! Persistence and aggregate boundaries.
//!
//! The sweep owns none of its storage; it talks to a [`DeficiencyStore`]
//! and a [`MetaRecomputer`] supplied by the embedder. The one contract a
//! store must honor is atomicity per record: a diff's current-value
//! fields, appended history entries, and `updated_at` stamp are written
//! as a unit, so a reader never observes a `current_*` value without its
//! ledger entry or vice versa.

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use punch_core::engine::DeficiencyDiff;
use punch_core::model::{Deficiency, DeficiencyState};

/// Read/write access to deficiency records.
pub trait DeficiencyStore {
    /// Load one record.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store cannot be read.
    fn load(&self, id: &str) -> Result<Option<Deficiency>>;

    /// Load every record whose state is in `states`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store cannot be read.
    fn load_eligible(&self, states: &[DeficiencyState]) -> Result<Vec<Deficiency>>;

    /// Persist a diff for one record, atomically.
    ///
    /// # Errors
    ///
    /// Returns an error when the record is missing or the write fails.
    fn apply_diff(&self, id: &str, diff: &DeficiencyDiff) -> Result<()>;
}

/// Recomputes a property's open/overdue/required-action counters.
pub trait MetaRecomputer {
    /// # Errors
    ///
    /// Returns an error when the recomputation cannot be persisted.
    fn recompute(&self, property_id: &str) -> Result<()>;
}

/// In-memory reference store. Applies diffs under one lock, which is the
/// in-memory equivalent of the atomic multi-field write a real store owes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, Deficiency>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record wholesale (test/setup path; updates go
    /// through [`DeficiencyStore::apply_diff`]).
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    pub fn seed(&self, record: Deficiency) {
        let mut records = self.records.lock().expect("memory store mutex poisoned");
        records.insert(record.id.clone(), record);
    }

    /// Snapshot one record.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Deficiency> {
        let records = self.records.lock().expect("memory store mutex poisoned");
        records.get(id).cloned()
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Deficiency>>> {
        self.records
            .lock()
            .map_err(|_| anyhow!("memory store mutex poisoned"))
    }
}

impl DeficiencyStore for MemoryStore {
    fn load(&self, id: &str) -> Result<Option<Deficiency>> {
        Ok(self.locked()?.get(id).cloned())
    }

    fn load_eligible(&self, states: &[DeficiencyState]) -> Result<Vec<Deficiency>> {
        Ok(self
            .locked()?
            .values()
            .filter(|record| states.contains(&record.state))
            .cloned()
            .collect())
    }

    fn apply_diff(&self, id: &str, diff: &DeficiencyDiff) -> Result<()> {
        let mut records = self.locked()?;
        let record = records
            .get_mut(id)
            .with_context(|| format!("deficiency {id} not found"))?;
        diff.apply_to(record);
        Ok(())
    }
}
