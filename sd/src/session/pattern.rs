//! Pattern reference detection
//!
//! Looks for an exclusive reference to one of the three slot markers in the
//! user's request ("Bパターンを明るく" refers to slot B).

use tracing::debug;

use super::slot::Slot;
use super::warning::Warning;

/// Result of scanning user text for slot markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternRef {
    /// No marker present
    None,
    /// Exactly one marker present
    Single(Slot),
    /// More than one marker present; treated as no reference
    Ambiguous(Vec<Slot>),
}

impl PatternRef {
    /// The referenced slot, if the reference is unambiguous
    pub fn slot(&self) -> Option<Slot> {
        match self {
            Self::Single(slot) => Some(*slot),
            Self::None | Self::Ambiguous(_) => None,
        }
    }

    /// The user-visible warning this detection raises, if any
    pub fn warning(&self) -> Option<Warning> {
        match self {
            Self::Ambiguous(_) => Some(Warning::AmbiguousPattern),
            Self::None | Self::Single(_) => None,
        }
    }
}

/// Detect which slot, if any, the text refers to
///
/// Matching is a case-insensitive substring search for each slot's marker.
pub fn detect(text: &str) -> PatternRef {
    let haystack = text.to_lowercase();
    let found: Vec<Slot> = Slot::ALL
        .into_iter()
        .filter(|slot| haystack.contains(&slot.marker().to_lowercase()))
        .collect();

    debug!(?found, "detect: scanned markers");
    match found.as_slice() {
        [] => PatternRef::None,
        [slot] => PatternRef::Single(*slot),
        _ => PatternRef::Ambiguous(found),
    }
}
