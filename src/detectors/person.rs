//! Person name detector

use super::Detector;
use crate::error::{Error, Result};
use crate::ner::{EntityLabel, EntityRecognizer};
use crate::redaction::{EntityKind, Span};
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

/// Detects person names with a named-entity recognizer.
///
/// The recognizer only has to flag a name once: the flagged span itself and
/// every other literal occurrence of the name are reported.
pub struct PersonDetector {
    recognizer: Arc<dyn EntityRecognizer>,
}

impl PersonDetector {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self { recognizer }
    }
}

/// Pattern for other occurrences of `name`. Word boundaries are only
/// required on edges that are word characters, so names ending in `'` or
/// `-` still match.
fn occurrence_pattern(name: &str) -> Result<Regex> {
    let edge = |c: Option<char>| {
        if c.is_some_and(|c| c.is_alphanumeric() || c == '_') {
            r"\b"
        } else {
            ""
        }
    };
    let pattern = format!(
        "{}{}{}",
        edge(name.chars().next()),
        regex::escape(name),
        edge(name.chars().next_back())
    );
    Regex::new(&pattern).map_err(|e| Error::Detector(format!("Invalid name pattern: {}", e)))
}

impl Detector for PersonDetector {
    fn find(&self, text: &str) -> Result<Vec<Span>> {
        let entities = self.recognizer.recognize(text)?;

        let mut seen = HashSet::new();
        let mut spans = Vec::new();
        for entity in entities {
            if entity.label != EntityLabel::Person || entity.text.is_empty() {
                continue;
            }
            if text.get(entity.start..entity.end) == Some(entity.text.as_str()) {
                spans.push(Span::from_range(EntityKind::Person, text, entity.start, entity.end));
            }
            if !seen.insert(entity.text.clone()) {
                continue;
            }
            spans.extend(
                occurrence_pattern(&entity.text)?
                    .find_iter(text)
                    .map(|m| Span::from_range(EntityKind::Person, text, m.start(), m.end())),
            );
        }
        spans.sort_by_key(|s| (s.start, s.end));
        spans.dedup_by_key(|s| (s.start, s.end));

        tracing::debug!(
            model = self.recognizer.name(),
            names = seen.len(),
            spans = spans.len(),
            "Person detection complete"
        );
        Ok(spans)
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Person
    }

    fn name(&self) -> &str {
        "person"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ner::{LexiconModel, NamedEntity};

    fn detector() -> PersonDetector {
        let model = LexiconModel::new("test", ["jane", "john"], ["street"]).unwrap();
        PersonDetector::new(Arc::new(model))
    }

    /// Recognizer that flags fixed strings, labelled as given
    struct FixedRecognizer(Vec<(EntityLabel, &'static str)>);

    impl EntityRecognizer for FixedRecognizer {
        fn recognize(&self, text: &str) -> Result<Vec<NamedEntity>> {
            Ok(self
                .0
                .iter()
                .filter_map(|(label, needle)| {
                    text.find(needle).map(|start| NamedEntity {
                        label: label.clone(),
                        text: needle.to_string(),
                        start,
                        end: start + needle.len(),
                    })
                })
                .collect())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_every_occurrence_matched() {
        let text = "Jane Doe wrote this. Later, Jane Doe led the team (Jane Doe, 2021).";
        let spans = detector().find(text).unwrap();
        assert_eq!(spans.len(), 3);
        assert!(spans.iter().all(|s| s.text == "Jane Doe"));
    }

    #[test]
    fn test_word_boundaries_respected() {
        let recognizer = FixedRecognizer(vec![(EntityLabel::Person, "Ann Lee")]);
        let detector = PersonDetector::new(Arc::new(recognizer));
        let spans = detector.find("Ann Lee and Ann Leeds").unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, 0);
    }

    #[test]
    fn test_non_person_labels_ignored() {
        let recognizer = FixedRecognizer(vec![
            (EntityLabel::Other("ORG".to_string()), "Acme Corp"),
            (EntityLabel::Person, "Bo Chen"),
        ]);
        let detector = PersonDetector::new(Arc::new(recognizer));
        let spans = detector.find("Bo Chen joined Acme Corp").unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Bo Chen");
        assert_eq!(spans[0].kind, EntityKind::Person);
    }

    #[test]
    fn test_regex_metacharacters_escaped() {
        let recognizer = FixedRecognizer(vec![(EntityLabel::Person, "J.R. Smith")]);
        let detector = PersonDetector::new(Arc::new(recognizer));
        let spans = detector.find("J.R. Smith vs JxR. Smith").unwrap();
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn test_possessive_name_redacted() {
        let text = "Reference: Jane Jones' former manager.";
        let spans = detector().find(text).unwrap();
        assert!(!spans.is_empty());
        assert!(spans.iter().all(|s| s.text == "Jane Jones"));
    }

    #[test]
    fn test_name_hyphenated_across_lines() {
        let text = "Written by Jane Doe-\nSmith for the team.";
        let spans = detector().find(text).unwrap();
        assert!(!spans.is_empty());
        assert!(spans.iter().all(|s| s.text == "Jane Doe-\nSmith"));
    }

    #[test]
    fn test_flagged_span_kept_when_edge_is_punctuation() {
        let recognizer = FixedRecognizer(vec![(EntityLabel::Person, "Ann O'")]);
        let detector = PersonDetector::new(Arc::new(recognizer));
        let text = "Signed Ann O' and Ann O'";
        let spans = detector.find(text).unwrap();
        let ranges: Vec<(usize, usize)> = spans.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(ranges, vec![(7, 13), (18, 24)]);
    }

    #[test]
    fn test_no_names() {
        assert!(detector().find("Built a compiler in Rust").unwrap().is_empty());
    }
}
