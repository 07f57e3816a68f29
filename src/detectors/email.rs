//! Email address detector

use super::Detector;
use crate::error::{Error, Result};
use crate::redaction::{EntityKind, Span};
use regex::Regex;

/// `local@domain.tld` with a TLD of two or more letters
pub const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";

/// Regex-based email detector
pub struct EmailDetector {
    pattern: Regex,
}

impl EmailDetector {
    /// Create a detector with the default pattern
    pub fn new() -> Result<Self> {
        Self::with_pattern(EMAIL_PATTERN)
    }

    /// Create a detector with a custom pattern
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::Detector(format!("Invalid email pattern: {}", e)))?;
        Ok(Self { pattern })
    }
}

impl Detector for EmailDetector {
    fn find(&self, text: &str) -> Result<Vec<Span>> {
        Ok(self
            .pattern
            .find_iter(text)
            .map(|m| Span::from_range(EntityKind::Email, text, m.start(), m.end()))
            .collect())
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Email
    }

    fn name(&self) -> &str {
        "email"
    }
}
