//! Entity detectors
//!
//! Each detector finds one kind of personal information and reports it as
//! spans against the exact text it was handed. Detectors never mutate text;
//! the redaction engine owns rewriting.
//!
//! ```text
//! text → [PersonDetector] → [EmailDetector] → [PhoneDetector] → [AddressDetector]
//!             ↓                   ↓                  ↓                  ↓
//!           spans               spans              spans              spans
//! ```

pub mod address;
pub mod email;
pub mod person;
pub mod phone;

pub use address::{AddressDetector, AddressParser, Country, ParsedAddress, PatternAddressParser};
pub use email::EmailDetector;
pub use person::PersonDetector;
pub use phone::{LibPhoneMatcher, PhoneDetector, PhoneLeniency, PhoneMatch, PhoneMatcher, Region};

use crate::error::Result;
use crate::redaction::{EntityKind, Span};

/// Pluggable entity detector interface.
///
/// Implementations may use regular expressions, a named-entity model or a
/// third-party parser. Spans may overlap or repeat; the engine reconciles
/// them. An `Err` aborts the whole redaction.
pub trait Detector: Send + Sync {
    /// Find all spans of this detector's kind in `text`.
    fn find(&self, text: &str) -> Result<Vec<Span>>;

    /// Kind of entity this detector reports.
    fn kind(&self) -> EntityKind;

    /// Human-readable name (used in pass reports and logs).
    fn name(&self) -> &str;
}

/// Spans for every occurrence of `needle` in `text`.
pub(crate) fn literal_spans(kind: EntityKind, text: &str, needle: &str) -> Vec<Span> {
    if needle.is_empty() {
        return Vec::new();
    }
    text.match_indices(needle)
        .map(|(start, m)| Span::from_range(kind, text, start, start + m.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_spans() {
        let text = "Ann Lee met Ann Lee";
        let spans = literal_spans(EntityKind::Person, text, "Ann Lee");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].start, 12);
        assert!(literal_spans(EntityKind::Person, text, "").is_empty());
    }
}
