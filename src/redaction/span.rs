//! Spans and entity kinds shared by detectors and the engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of personal information a detector finds.
///
/// Declaration order is the fixed pass order of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Person,
    Email,
    Phone,
    Address,
}

impl EntityKind {
    /// All kinds in pass order
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Person,
        EntityKind::Email,
        EntityKind::Phone,
        EntityKind::Address,
    ];

    /// Tag used inside placeholder tokens
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Email => "EMAIL",
            Self::Phone => "PHONE",
            Self::Address => "ADDRESS",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PERSON" => Ok(Self::Person),
            "EMAIL" => Ok(Self::Email),
            "PHONE" => Ok(Self::Phone),
            "ADDRESS" => Ok(Self::Address),
            other => Err(format!(
                "Unknown entity kind: {}. Valid: person, email, phone, address",
                other
            )),
        }
    }
}

/// A detected entity in the text a detector was given.
///
/// `start..end` is a half-open byte range on char boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Kind of entity
    pub kind: EntityKind,
    /// Start byte offset
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// Exact matched substring (the surface form)
    pub text: String,
}

impl Span {
    /// Build a span from a range of `source`
    pub fn from_range(kind: EntityKind, source: &str, start: usize, end: usize) -> Self {
        Self {
            kind,
            start,
            end,
            text: source[start..end].to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether two spans share at least one byte
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}
