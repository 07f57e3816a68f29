//! Lexicon-driven person name recognizer
//!
//! A person entity is a run of capitalized tokens (Title or UPPER case)
//! that starts at a known given name and continues for one to three more
//! tokens separated only by spaces. Single-letter middle initials (`J.`)
//! are absorbed into the run. Stopwords end a run, so `Jordan Street`
//! or `Grace Hopper University` do not turn into longer false names.

use super::{EntityLabel, EntityRecognizer, NamedEntity};
use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashSet;

/// Maximum number of name tokens in one entity, initials excluded
const MAX_NAME_TOKENS: usize = 4;

/// Characters the word pattern allows inside a token but not at its end
const TRAILING_PUNCTUATION: &[char] = &['\'', '’', '-'];

/// Lexicon named-entity model
#[derive(Debug)]
pub struct LexiconModel {
    name: String,
    given_names: HashSet<String>,
    stopwords: HashSet<String>,
    word: Regex,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    start: usize,
    end: usize,
    text: &'a str,
}

impl Token<'_> {
    fn is_capitalized(&self) -> bool {
        self.text.chars().next().is_some_and(char::is_uppercase)
    }

    fn is_initial(&self) -> bool {
        let mut chars = self.text.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase())
    }
}

impl LexiconModel {
    /// Build a model from in-memory word lists
    pub fn new<I, S, J, T>(name: impl Into<String>, given_names: I, stopwords: J) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        J: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let given_names: HashSet<String> = given_names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        if given_names.is_empty() {
            return Err(Error::Model("Lexicon contains no given names".to_string()));
        }

        let stopwords = stopwords
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        let word = Regex::new(r"\p{L}[\p{L}'’-]*")
            .map_err(|e| Error::Model(format!("Invalid token pattern: {}", e)))?;

        Ok(Self {
            name: name.into(),
            given_names,
            stopwords,
            word,
        })
    }

    /// Build a model from lexicon file contents (one entry per line, `#`
    /// starts a comment)
    pub fn from_lists(name: impl Into<String>, given_names: &str, stopwords: &str) -> Result<Self> {
        Self::new(name, parse_list(given_names), parse_list(stopwords))
    }

    /// Number of given names in the lexicon
    pub fn lexicon_size(&self) -> usize {
        self.given_names.len()
    }

    fn is_given_name(&self, token: &Token<'_>) -> bool {
        token.is_capitalized() && self.given_names.contains(&token.text.to_lowercase())
    }

    fn is_stopword(&self, token: &Token<'_>) -> bool {
        self.stopwords.contains(&token.text.to_lowercase())
    }

    /// Word tokens with trailing apostrophes and hyphens stripped.
    ///
    /// A word hyphenated across a line break (`Doe-\nSmith`) is kept as one
    /// token.
    fn tokens<'a>(&self, text: &'a str) -> Vec<Token<'a>> {
        let mut tokens: Vec<Token<'a>> = Vec::new();
        for m in self.word.find_iter(text) {
            if let Some(prev) = tokens.last_mut() {
                let gap = &text[prev.end..m.start()];
                if prev.text.ends_with('-') && gap.contains('\n') && gap.trim().is_empty() {
                    prev.end = m.end();
                    prev.text = &text[prev.start..prev.end];
                    continue;
                }
            }
            tokens.push(Token {
                start: m.start(),
                end: m.end(),
                text: m.as_str(),
            });
        }

        for token in &mut tokens {
            let trimmed = token.text.trim_end_matches(TRAILING_PUNCTUATION);
            token.end = token.start + trimmed.len();
            token.text = trimmed;
        }
        tokens
    }

    /// Split tokens into runs of capitalized words joined only by spaces.
    fn capitalized_runs<'a>(&self, text: &'a str) -> Vec<Vec<Token<'a>>> {
        let mut runs = Vec::new();
        let mut current: Vec<Token<'a>> = Vec::new();

        for token in self.tokens(text) {
            if !token.is_capitalized() {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
                continue;
            }
            if let Some(prev) = current.last() {
                let gap = &text[prev.end..token.start];
                if !joins_name(gap, prev.is_initial()) {
                    runs.push(std::mem::take(&mut current));
                }
            }
            current.push(token);
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }

    fn entities_in_run(&self, text: &str, run: &[Token<'_>], out: &mut Vec<NamedEntity>) {
        let mut i = 0;
        while i < run.len() {
            if !self.is_given_name(&run[i]) || self.is_stopword(&run[i]) {
                i += 1;
                continue;
            }

            let mut last_name_token = i;
            let mut name_tokens = 1;
            let mut j = i + 1;
            while j < run.len() && name_tokens < MAX_NAME_TOKENS && !self.is_stopword(&run[j]) {
                if !run[j].is_initial() {
                    name_tokens += 1;
                    last_name_token = j;
                }
                j += 1;
            }

            if name_tokens >= 2 {
                let start = run[i].start;
                let end = run[last_name_token].end;
                out.push(NamedEntity {
                    label: EntityLabel::Person,
                    text: text[start..end].to_string(),
                    start,
                    end,
                });
                i = last_name_token + 1;
            } else {
                i += 1;
            }
        }
    }
}

impl EntityRecognizer for LexiconModel {
    fn recognize(&self, text: &str) -> Result<Vec<NamedEntity>> {
        let mut entities = Vec::new();
        for run in self.capitalized_runs(text) {
            self.entities_in_run(text, &run, &mut entities);
        }
        Ok(entities)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Whether the text between two capitalized tokens keeps them in one name.
fn joins_name(gap: &str, after_initial: bool) -> bool {
    let gap = match gap.strip_prefix('.') {
        Some(rest) if after_initial => rest,
        _ => gap,
    };
    !gap.is_empty() && gap.chars().all(|c| c == ' ' || c == '\t')
}

fn parse_list(contents: &str) -> impl Iterator<Item = &str> {
    contents
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LexiconModel {
        LexiconModel::new(
            "test",
            ["jane", "john", "maria", "jordan"],
            ["street", "university", "experience"],
        )
        .unwrap()
    }

    fn names(text: &str) -> Vec<String> {
        model()
            .recognize(text)
            .unwrap()
            .into_iter()
            .map(|e| e.text)
            .collect()
    }

    #[test]
    fn test_two_token_name() {
        assert_eq!(names("Contact Jane Doe at the office"), vec!["Jane Doe"]);
    }

    #[test]
    fn test_uppercase_header_name() {
        assert_eq!(names("JOHN SMITH\nSoftware Engineer"), vec!["JOHN SMITH"]);
    }

    #[test]
    fn test_middle_initial() {
        assert_eq!(names("Maria J. Garcia leads the team"), vec!["Maria J. Garcia"]);
    }

    #[test]
    fn test_single_given_name_ignored() {
        assert!(names("Ask Jane about it").is_empty());
    }

    #[test]
    fn test_stopword_ends_run() {
        assert!(names("He lives on Jordan Street").is_empty());
        assert_eq!(names("Jane Doe University"), vec!["Jane Doe"]);
    }

    #[test]
    fn test_newline_breaks_run() {
        assert!(names("Jane\nDoe").is_empty());
        assert!(names("Jane, Doe").is_empty());
    }

    #[test]
    fn test_offsets_match_text() {
        let text = "Refs: Jane Doe and John Smith.";
        let entities = model().recognize(text).unwrap();
        assert_eq!(entities.len(), 2);
        for e in &entities {
            assert_eq!(&text[e.start..e.end], e.text);
            assert_eq!(e.label, EntityLabel::Person);
        }
    }

    #[test]
    fn test_possessive_name() {
        let text = "Reference: Jane Jones' former manager.";
        let entities = model().recognize(text).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "Jane Jones");
        assert_eq!(&text[entities[0].start..entities[0].end], "Jane Jones");
        assert_eq!(names("Jane Jones’ report"), vec!["Jane Jones"]);
    }

    #[test]
    fn test_hyphenated_surname_across_line_break() {
        assert_eq!(
            names("Written by Jane Doe-\nSmith for the team."),
            vec!["Jane Doe-\nSmith"]
        );
        assert_eq!(names("Jane Doe- and others"), vec!["Jane Doe"]);
        assert_eq!(names("Jane Doe-Smith"), vec!["Jane Doe-Smith"]);
    }

    #[test]
    fn test_max_tokens() {
        assert_eq!(
            names("Maria Anna Lopez Ruiz Ortega"),
            vec!["Maria Anna Lopez Ruiz"]
        );
    }

    #[test]
    fn test_from_lists_skips_comments() {
        let model = LexiconModel::from_lists("t", "# names\njane\n\njohn # common\n", "").unwrap();
        assert_eq!(model.lexicon_size(), 2);
    }

    #[test]
    fn test_empty_lexicon_rejected() {
        assert!(LexiconModel::from_lists("t", "# nothing\n", "").is_err());
    }
}
