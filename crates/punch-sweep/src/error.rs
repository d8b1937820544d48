//! Sweep error types.
//!
//! Only the eligible-record fetch is a hard error: everything after it is
//! best-effort per record and per side effect, logged and skipped.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SweepError {
    /// The eligible-record fetch failed; nothing was evaluated.
    #[error("failed to load sweep-eligible deficiencies: {0}")]
    Fetch(anyhow::Error),
}
