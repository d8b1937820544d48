//! punch-sweep: the overdue/progress sweep driver.
//!
//! A sweep is one scheduled batch pass over every in-flight deficiency:
//! each record is re-evaluated against wall-clock time by the punch-core
//! engine, non-empty diffs are persisted, and the resulting side effects
//! (property aggregate recomputation, change notifications) are fanned
//! out best-effort after the loop. The schedule itself is the embedder's
//! concern; [`driver::Sweep::run`] takes `now` explicitly.
//!
//! Everything stateful is a trait boundary: [`store::DeficiencyStore`],
//! [`store::MetaRecomputer`], and [`notify::Notifier`].

pub mod driver;
pub mod error;
pub mod notify;
pub mod store;

pub use driver::{Sweep, SweepOutcome};
pub use error::SweepError;
pub use notify::{LogNotifier, Notifier, StateChangeEvent};
pub use store::{DeficiencyStore, MemoryStore, MetaRecomputer};
