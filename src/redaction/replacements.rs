//! Surface form to placeholder bookkeeping for replace mode

use super::span::EntityKind;
use crate::error::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

const PLACEHOLDER_PATTERN: &str = r"\[(?:PERSON|EMAIL|PHONE|ADDRESS)_\d+\]";

/// One registered replacement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Replacement {
    /// Original surface form
    pub surface: String,
    /// Placeholder token, e.g. `[EMAIL_2]`
    pub placeholder: String,
    /// Kind the surface form was first detected as
    pub kind: EntityKind,
}

/// Mapping from surface form to placeholder.
///
/// Indices come from one counter shared by every kind, so `[PERSON_1]` and
/// `[EMAIL_2]` can coexist but `[EMAIL_1]` and `[PERSON_1]` cannot.
#[derive(Debug, Clone, Default)]
pub struct ReplacementMap {
    entries: Vec<Replacement>,
    by_surface: HashMap<String, usize>,
}

impl ReplacementMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Placeholder for `surface`, registering it on first sight
    pub fn placeholder_for(&mut self, surface: &str, kind: EntityKind) -> &str {
        let idx = match self.by_surface.get(surface) {
            Some(idx) => *idx,
            None => {
                let idx = self.entries.len();
                self.entries.push(Replacement {
                    surface: surface.to_string(),
                    placeholder: format!("[{}_{}]", kind.tag(), idx + 1),
                    kind,
                });
                self.by_surface.insert(surface.to_string(), idx);
                idx
            }
        };
        &self.entries[idx].placeholder
    }

    /// Existing placeholder for `surface`
    pub fn get(&self, surface: &str) -> Option<&str> {
        self.by_surface
            .get(surface)
            .map(|idx| self.entries[*idx].placeholder.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count of replacements per kind, keyed by the tag parsed back out of
    /// each placeholder.
    pub fn kind_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            if let Some(tag) = placeholder_kind(&entry.placeholder) {
                *counts.entry(tag.to_string()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Surface form to placeholder, for serializing to callers
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|e| (e.surface.clone(), e.placeholder.clone()))
            .collect()
    }
}

/// Kind tag of a placeholder token: `[PHONE_12]` → `PHONE`
pub fn placeholder_kind(placeholder: &str) -> Option<&str> {
    let inner = placeholder.strip_prefix('[')?.strip_suffix(']')?;
    let (tag, index) = inner.rsplit_once('_')?;
    if tag.is_empty() || index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(tag)
}

/// Compile the pattern matching any placeholder token
pub fn placeholder_pattern() -> Result<Regex> {
    Regex::new(PLACEHOLDER_PATTERN)
        .map_err(|e| Error::Internal(format!("Invalid placeholder pattern: {}", e)))
}

/// Byte ranges of placeholder tokens already present in `text`
pub fn placeholder_ranges(pattern: &Regex, text: &str) -> Vec<(usize, usize)> {
    pattern
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect()
}
