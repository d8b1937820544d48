//! History-entry id minting.
//!
//! Entry ids are minted through an injected [`EntryIdSource`] rather than
//! a global generator, so the engine is deterministic under test: supply
//! [`SequentialEntryIds`] and two identical calls produce identical diffs.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::Rng;

/// Source of collision-resistant ids for new history entries.
pub trait EntryIdSource {
    fn next_id(&mut self) -> String;
}

const HEX: &[u8; 16] = b"0123456789abcdef";
const ENTRY_ID_LEN: usize = 20;

/// Random 20-character lowercase-hex ids.
#[derive(Debug)]
pub struct RandomEntryIds {
    rng: StdRng,
}

impl RandomEntryIds {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for RandomEntryIds {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryIdSource for RandomEntryIds {
    fn next_id(&mut self) -> String {
        (0..ENTRY_ID_LEN)
            .map(|_| char::from(HEX[self.rng.gen_range(0..HEX.len())]))
            .collect()
    }
}

/// Deterministic ids for tests: `<prefix>-0001`, `<prefix>-0002`, ...
#[derive(Debug, Clone)]
pub struct SequentialEntryIds {
    prefix: String,
    next: u64,
}

impl SequentialEntryIds {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }
}

impl EntryIdSource for SequentialEntryIds {
    fn next_id(&mut self) -> String {
        self.next += 1;
        format!("{}-{:04}", self.prefix, self.next)
    }
}
