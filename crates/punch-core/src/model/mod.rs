//! Deficiency record, lifecycle states, and the append-only history
//! ledger.

pub mod deficiency;
pub mod history;
pub mod photo;

pub use deficiency::{Deficiency, DeficiencyState, ParseStateError};
pub use history::{HistoryEntry, Timeline};
pub use photo::CompletedPhoto;
