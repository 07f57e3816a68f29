//! Multi-pass redaction engine
//!
//! Detectors run in a fixed order (person, email, phone, address). Each pass
//! sees the output of the previous one, collects spans against that
//! snapshot, merges overlaps and then rewrites the whole string once.
//! Intermediate snapshots still hold personal information and are wiped
//! when replaced.

use super::replacements::{placeholder_pattern, placeholder_ranges, ReplacementMap};
use super::span::{EntityKind, Span};
use crate::detectors::Detector;
use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

/// What happens to a detected span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactionMode {
    /// Substitute a stable `[KIND_N]` placeholder
    #[default]
    Replace,
    /// Remove the span
    Delete,
}

impl fmt::Display for RedactionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => write!(f, "replace"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl FromStr for RedactionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "delete" => Ok(Self::Delete),
            other => Err(format!(
                "Unknown redaction mode: {}. Valid: replace, delete",
                other
            )),
        }
    }
}

/// Summary of one detector pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    /// Detector name
    pub detector: String,
    /// Kind the detector reports
    pub kind: EntityKind,
    /// Spans the detector returned
    pub found: usize,
    /// Spans rewritten after overlap resolution
    pub applied: usize,
}

/// Result of redacting one text
#[derive(Debug, Clone, Default)]
pub struct Redaction {
    /// Sanitized text
    pub text: String,
    /// Surface forms and their placeholders (replace mode only)
    pub replacements: Option<ReplacementMap>,
    /// One report per pass, in pass order
    pub passes: Vec<PassReport>,
}

impl Redaction {
    /// Nothing was redacted because there was no text to begin with
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.passes.is_empty()
    }

    /// Number of distinct replaced surface forms
    pub fn replacement_count(&self) -> usize {
        self.replacements.as_ref().map_or(0, ReplacementMap::len)
    }

    /// Replacements per kind tag (empty in delete mode)
    pub fn kind_counts(&self) -> BTreeMap<String, usize> {
        self.replacements
            .as_ref()
            .map(ReplacementMap::kind_counts)
            .unwrap_or_default()
    }
}

/// Runs detectors in pass order and rewrites text
pub struct RedactionEngine {
    detectors: Vec<Box<dyn Detector>>,
    mode: RedactionMode,
    placeholders: Regex,
}

impl RedactionEngine {
    /// Create an engine. Detectors are reordered into pass order; at most
    /// one detector per kind is allowed.
    pub fn new(mut detectors: Vec<Box<dyn Detector>>, mode: RedactionMode) -> Result<Self> {
        detectors.sort_by_key(|d| d.kind());
        if let Some(pair) = detectors.windows(2).find(|w| w[0].kind() == w[1].kind()) {
            return Err(Error::Config(format!(
                "Duplicate detectors for {}: {} and {}",
                pair[0].kind(),
                pair[0].name(),
                pair[1].name()
            )));
        }
        Ok(Self {
            detectors,
            mode,
            placeholders: placeholder_pattern()?,
        })
    }

    pub fn mode(&self) -> RedactionMode {
        self.mode
    }

    /// Kinds this engine redacts, in pass order
    pub fn kinds(&self) -> Vec<EntityKind> {
        self.detectors.iter().map(|d| d.kind()).collect()
    }

    /// Redact `text` with the engine's configured mode
    pub fn redact(&self, text: &str) -> Result<Redaction> {
        self.redact_with(text, self.mode)
    }

    /// Redact `text` with an explicit mode.
    ///
    /// Any detector failure aborts the redaction; no partially redacted text
    /// is returned.
    pub fn redact_with(&self, text: &str, mode: RedactionMode) -> Result<Redaction> {
        if text.is_empty() {
            return Ok(Redaction::default());
        }

        let mut current = Zeroizing::new(text.to_string());
        let mut replacements = match mode {
            RedactionMode::Replace => Some(ReplacementMap::new()),
            RedactionMode::Delete => None,
        };
        let mut passes = Vec::with_capacity(self.detectors.len());

        for detector in &self.detectors {
            let spans = detector.find(&current).map_err(|e| {
                Error::Redaction(format!("{} detector failed: {}", detector.name(), e))
            })?;
            let found = spans.len();

            let protected = placeholder_ranges(&self.placeholders, &current);
            let kept = resolve_overlaps(&current, spans, &protected);
            let applied = kept.len();

            if !kept.is_empty() {
                current = Zeroizing::new(rewrite(&current, &kept, replacements.as_mut()));
            }

            tracing::debug!(
                detector = detector.name(),
                kind = %detector.kind(),
                found,
                applied,
                "Redaction pass complete"
            );
            passes.push(PassReport {
                detector: detector.name().to_string(),
                kind: detector.kind(),
                found,
                applied,
            });
        }

        Ok(Redaction {
            text: std::mem::take(&mut *current),
            replacements,
            passes,
        })
    }
}

/// Drop empty spans and spans touching a protected range, then merge
/// overlapping spans into their union so no detected byte survives.
fn resolve_overlaps(text: &str, mut spans: Vec<Span>, protected: &[(usize, usize)]) -> Vec<Span> {
    spans.retain(|s| {
        !s.is_empty()
            && !protected
                .iter()
                .any(|&(start, end)| s.start < end && start < s.end)
    });
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut kept: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match kept.last_mut() {
            Some(last) if last.overlaps(&span) => {
                if span.end > last.end {
                    *last = Span::from_range(last.kind, text, last.start, span.end);
                }
            }
            _ => kept.push(span),
        }
    }
    kept
}

/// Rewrite `text` in one sweep over sorted, disjoint spans.
///
/// With a replacement map each span becomes its placeholder; without one
/// the span is deleted.
fn rewrite(text: &str, spans: &[Span], mut replacements: Option<&mut ReplacementMap>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans {
        out.push_str(&text[cursor..span.start]);
        if let Some(map) = replacements.as_deref_mut() {
            out.push_str(map.placeholder_for(&span.text, span.kind));
        }
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::{EmailDetector, PersonDetector, PhoneDetector, PhoneLeniency, Region};
    use crate::ner::LexiconModel;
    use std::sync::Arc;

    fn detectors() -> Vec<Box<dyn Detector>> {
        let model = LexiconModel::new("test", ["jane", "john"], ["street"]).unwrap();
        vec![
            Box::new(
                PhoneDetector::with_leniency(PhoneLeniency::Possible, vec![Region::Us]).unwrap(),
            ),
            Box::new(EmailDetector::new().unwrap()),
            Box::new(PersonDetector::new(Arc::new(model))),
        ]
    }

    fn engine(mode: RedactionMode) -> RedactionEngine {
        RedactionEngine::new(detectors(), mode).unwrap()
    }

    const CONTACT: &str = "Contact Jane Doe at jane@example.com or 555-123-4567.";

    #[test]
    fn test_replace_scenario() {
        let result = engine(RedactionMode::Replace).redact(CONTACT).unwrap();
        assert_eq!(result.text, "Contact [PERSON_1] at [EMAIL_2] or [PHONE_3].");

        let map = result.replacements.as_ref().unwrap();
        assert_eq!(map.get("Jane Doe"), Some("[PERSON_1]"));
        assert_eq!(map.get("jane@example.com"), Some("[EMAIL_2]"));
        assert_eq!(map.get("555-123-4567"), Some("[PHONE_3]"));
        assert_eq!(result.replacement_count(), 3);

        let counts = result.kind_counts();
        assert_eq!(counts.get("PERSON"), Some(&1));
        assert_eq!(counts.get("EMAIL"), Some(&1));
        assert_eq!(counts.get("PHONE"), Some(&1));
    }

    #[test]
    fn test_pass_order_and_reports() {
        let engine = engine(RedactionMode::Replace);
        assert_eq!(
            engine.kinds(),
            vec![EntityKind::Person, EntityKind::Email, EntityKind::Phone]
        );
        let result = engine.redact(CONTACT).unwrap();
        let names: Vec<&str> = result.passes.iter().map(|p| p.detector.as_str()).collect();
        assert_eq!(names, vec!["person", "email", "phone"]);
        assert!(result.passes.iter().all(|p| p.applied == 1));
    }

    #[test]
    fn test_idempotent() {
        let engine = engine(RedactionMode::Replace);
        let once = engine.redact(CONTACT).unwrap();
        let twice = engine.redact(&once.text).unwrap();
        assert_eq!(twice.text, once.text);
        assert_eq!(twice.replacement_count(), 0);
    }

    #[test]
    fn test_delete_mode() {
        let result = engine(RedactionMode::Delete).redact(CONTACT).unwrap();
        assert_eq!(result.text, "Contact  at  or .");
        assert!(result.replacements.is_none());
        assert!(result.kind_counts().is_empty());
        assert!(EmailDetector::new().unwrap().find(&result.text).unwrap().is_empty());
    }

    #[test]
    fn test_every_name_occurrence_replaced() {
        let text = "Jane Doe (lead). Reviewed by John Roe and Jane Doe.";
        let result = engine(RedactionMode::Replace).redact(text).unwrap();
        assert_eq!(
            result.text,
            "[PERSON_1] (lead). Reviewed by [PERSON_2] and [PERSON_1]."
        );
    }

    #[test]
    fn test_repeated_surface_reuses_placeholder() {
        let text = "a@b.io, c@d.io, a@b.io";
        let result = engine(RedactionMode::Replace).redact(text).unwrap();
        assert_eq!(result.text, "[EMAIL_1], [EMAIL_2], [EMAIL_1]");
    }

    #[test]
    fn test_empty_text() {
        let result = engine(RedactionMode::Replace).redact("").unwrap();
        assert!(result.is_empty());
        assert!(result.passes.is_empty());
    }

    #[test]
    fn test_mode_override() {
        let engine = engine(RedactionMode::Replace);
        let result = engine.redact_with("mail a@b.io", RedactionMode::Delete).unwrap();
        assert_eq!(result.text, "mail ");
    }

    #[test]
    fn test_resolve_overlaps_merges_into_union() {
        let text = "0123456789";
        let spans = vec![
            Span::from_range(EntityKind::Phone, text, 2, 5),
            Span::from_range(EntityKind::Phone, text, 0, 3),
            Span::from_range(EntityKind::Phone, text, 0, 4),
            Span::from_range(EntityKind::Phone, text, 6, 8),
            Span::from_range(EntityKind::Phone, text, 6, 8),
            Span::from_range(EntityKind::Phone, text, 8, 9),
        ];
        let kept = resolve_overlaps(text, spans, &[]);
        let ranges: Vec<(usize, usize)> = kept.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(ranges, vec![(0, 5), (6, 8), (8, 9)]);
        assert_eq!(kept[0].text, "01234");
    }

    /// Detector returning fixed, partly overlapping ranges
    struct OverlappingDetector;

    impl Detector for OverlappingDetector {
        fn find(&self, text: &str) -> Result<Vec<Span>> {
            Ok(vec![
                Span::from_range(EntityKind::Address, text, 4, 15),
                Span::from_range(EntityKind::Address, text, 9, 24),
            ])
        }

        fn kind(&self) -> EntityKind {
            EntityKind::Address
        }

        fn name(&self) -> &str {
            "overlapping"
        }
    }

    #[test]
    fn test_partial_overlap_leaves_nothing_behind() {
        let engine =
            RedactionEngine::new(vec![Box::new(OverlappingDetector)], RedactionMode::Replace).unwrap();
        let result = engine.redact("At: 12 Elm Rd, Oakton IL. Thanks").unwrap();
        assert_eq!(result.text, "At: [ADDRESS_1]. Thanks");
        let map = result.replacements.as_ref().unwrap();
        assert_eq!(map.get("12 Elm Rd, Oakton IL"), Some("[ADDRESS_1]"));
    }

    #[test]
    fn test_resolve_overlaps_skips_placeholders() {
        let text = "[EMAIL_1] x";
        let spans = vec![
            Span::from_range(EntityKind::Person, text, 1, 6),
            Span::from_range(EntityKind::Person, text, 10, 11),
        ];
        let kept = resolve_overlaps(text, spans, &[(0, 9)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text, "x");
    }

    #[test]
    fn test_rewrite_delete_keeps_offsets() {
        let text = "aXXbYYc";
        let spans = vec![
            Span::from_range(EntityKind::Email, text, 1, 3),
            Span::from_range(EntityKind::Email, text, 4, 6),
        ];
        assert_eq!(rewrite(text, &spans, None), "abc");
    }

    struct BrokenDetector;

    impl Detector for BrokenDetector {
        fn find(&self, _text: &str) -> Result<Vec<Span>> {
            Err(Error::Detector("pattern failed to compile".to_string()))
        }

        fn kind(&self) -> EntityKind {
            EntityKind::Address
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn test_detector_failure_aborts() {
        let mut detectors = detectors();
        detectors.push(Box::new(BrokenDetector));
        let engine = RedactionEngine::new(detectors, RedactionMode::Replace).unwrap();
        let err = engine.redact(CONTACT).unwrap_err();
        assert!(matches!(err, Error::Redaction(_)));
    }

    #[test]
    fn test_duplicate_kind_rejected() {
        let detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(EmailDetector::new().unwrap()),
            Box::new(EmailDetector::new().unwrap()),
        ];
        assert!(RedactionEngine::new(detectors, RedactionMode::Replace).is_err());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("DELETE".parse::<RedactionMode>().unwrap(), RedactionMode::Delete);
        assert!("mask".parse::<RedactionMode>().is_err());
    }
}
