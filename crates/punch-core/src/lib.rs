//! punch-core: deficiency lifecycle model and state engine.
//!
//! A deficiency is a defect found during a property inspection, tracked
//! through identification, planning, execution, verification, and closure
//! with a fully auditable history of every attribute change. This crate
//! owns the pure computation: the record model with its append-only
//! history ledger ([`model`]), the state engine that turns a requested
//! change set into a persistable diff ([`engine`]), and the eligibility
//! rules shared with the sweep driver ([`classify`]).
//!
//! Persistence, scheduling, and notification delivery live behind trait
//! boundaries in `punch-sweep`; nothing in this crate performs I/O or
//! reads the clock.
//!
//! # Conventions
//!
//! - **Errors**: `anyhow::Result` with `.context(...)` at fallible
//!   boundaries; the engine itself has no error path.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod classify;
pub mod config;
pub mod engine;
pub mod entry_id;
pub mod model;
pub mod time;

pub use config::Tuning;
pub use engine::{Apply, DeficiencyChanges, DeficiencyDiff, Engine, UpdateRequest};
pub use entry_id::{EntryIdSource, RandomEntryIds, SequentialEntryIds};
pub use model::{CompletedPhoto, Deficiency, DeficiencyState, HistoryEntry, Timeline};
