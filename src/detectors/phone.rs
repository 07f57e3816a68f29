//! Phone number detector
//!
//! Candidates are digit runs with the usual phone punctuation. Each candidate
//! is confirmed by parsing it with libphonenumber metadata (`phonenumber`)
//! for one region at a time, so a number written in a national format is
//! found by the region that owns that format.

use super::Detector;
use crate::error::{Error, Result};
use crate::redaction::{EntityKind, Span};
use phonenumber::country;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Phone-number regions probed by default
pub const DEFAULT_REGIONS: [Region; 5] = [Region::Us, Region::Gb, Region::Ca, Region::Au, Region::In];

/// Region used to interpret numbers without an international prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Us,
    Gb,
    Ca,
    Au,
    In,
}

impl Region {
    fn id(&self) -> country::Id {
        match self {
            Self::Us => country::Id::US,
            Self::Gb => country::Id::GB,
            Self::Ca => country::Id::CA,
            Self::Au => country::Id::AU,
            Self::In => country::Id::IN,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Us => "US",
            Self::Gb => "GB",
            Self::Ca => "CA",
            Self::Au => "AU",
            Self::In => "IN",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "US" => Ok(Self::Us),
            "GB" | "UK" => Ok(Self::Gb),
            "CA" => Ok(Self::Ca),
            "AU" => Ok(Self::Au),
            "IN" => Ok(Self::In),
            other => Err(format!("Unsupported phone region: {}. Valid: US, GB, CA, AU, IN", other)),
        }
    }
}

/// How strictly a parsed candidate must look like a real number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneLeniency {
    /// National number length is plausible for its country code
    #[default]
    Possible,
    /// Number passes full libphonenumber validation
    Valid,
}

/// A phone number found in text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneMatch {
    pub start: usize,
    pub end: usize,
    /// Text exactly as written
    pub raw: String,
}

/// Phone-number matching capability, parameterized by region.
pub trait PhoneMatcher: Send + Sync {
    /// Find phone numbers in `text` as interpreted for `region`.
    fn find_numbers(&self, text: &str, region: Region) -> Result<Vec<PhoneMatch>>;
}

/// Candidate digit runs. Separators include the Unicode dashes, spaces and
/// fullwidth punctuation PDF extraction tends to produce.
const CANDIDATE_PATTERN: &str = "[+\u{FF0B}]?[(\u{FF08}]?\\d[\\d \\t().\\-/\u{00A0}\u{2009}\u{200B}\u{2010}-\u{2015}\u{2212}\u{3000}\u{FF08}\u{FF09}\u{FF0D}\u{FF0E}\u{FF0F}]{4,24}\\d";

/// `PhoneMatcher` backed by the `phonenumber` crate
pub struct LibPhoneMatcher {
    leniency: PhoneLeniency,
    candidate: Regex,
}

impl LibPhoneMatcher {
    pub fn new(leniency: PhoneLeniency) -> Result<Self> {
        let candidate = Regex::new(CANDIDATE_PATTERN)
            .map_err(|e| Error::Detector(format!("Invalid phone candidate pattern: {}", e)))?;
        Ok(Self {
            leniency,
            candidate,
        })
    }

    fn accepts(&self, raw: &str, region: Region) -> bool {
        let raw = ascii_punctuation(raw);
        let digits = raw.chars().filter(char::is_ascii_digit).count();
        if !(7..=15).contains(&digits) {
            return false;
        }
        let number = match phonenumber::parse(Some(region.id()), &raw) {
            Ok(number) => number,
            Err(_) => return false,
        };
        match self.leniency {
            PhoneLeniency::Valid => phonenumber::is_valid(&number),
            PhoneLeniency::Possible => {
                let national_digits = number.national().value().to_string().len();
                possible_lengths(number.code().value()).contains(&national_digits)
            }
        }
    }

    /// Accepted sub-ranges of one candidate, merged where they overlap.
    ///
    /// A candidate can glue a number to neighbouring digits ("2019 555 123
    /// 4567"); sub-ranges start and end on whitespace or `/` group
    /// boundaries. Every start is tried with its longest accepted end, so a
    /// prefix accepted from an earlier start never hides the rest of a
    /// number.
    fn accepted_ranges(&self, candidate: &str, region: Region) -> Vec<(usize, usize)> {
        let chars: Vec<(usize, char)> = candidate.char_indices().collect();
        let mut starts = Vec::new();
        let mut ends = Vec::new();
        for (i, &(offset, c)) in chars.iter().enumerate() {
            let after_separator = i == 0 || is_group_separator(chars[i - 1].1);
            if after_separator && (is_digit(c) || matches!(c, '+' | '(' | '\u{FF0B}' | '\u{FF08}')) {
                starts.push(offset);
            }
            let before_separator = chars
                .get(i + 1)
                .map_or(true, |&(_, next)| is_group_separator(next));
            if is_digit(c) && before_separator {
                ends.push(offset + c.len_utf8());
            }
        }

        let mut ranges: Vec<(usize, usize)> = Vec::new();
        for &start in &starts {
            let accepted = ends
                .iter()
                .rev()
                .take_while(|&&end| end > start)
                .find(|&&end| self.accepts(&candidate[start..end], region));
            if let Some(&end) = accepted {
                match ranges.last_mut() {
                    Some(last) if start < last.1 => last.1 = last.1.max(end),
                    _ => ranges.push((start, end)),
                }
            }
        }
        ranges
    }
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit() || ('\u{FF10}'..='\u{FF19}').contains(&c)
}

fn is_group_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '/' | '\u{200B}' | '\u{FF0F}')
}

/// Map phone punctuation and fullwidth digits onto their ASCII forms
fn ascii_punctuation(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| match c {
            '\u{200B}' => None,
            '\u{2010}'..='\u{2015}' | '\u{2212}' | '\u{FF0D}' => Some('-'),
            '\u{FF08}' => Some('('),
            '\u{FF09}' => Some(')'),
            '\u{FF0B}' => Some('+'),
            '\u{FF0E}' => Some('.'),
            '\u{FF0F}' => Some('/'),
            '\u{FF10}'..='\u{FF19}' => char::from_digit(c as u32 - 0xFF10, 10),
            c if c.is_whitespace() => Some(' '),
            c => Some(c),
        })
        .collect()
}

impl PhoneMatcher for LibPhoneMatcher {
    fn find_numbers(&self, text: &str, region: Region) -> Result<Vec<PhoneMatch>> {
        let mut found = Vec::new();
        for m in self.candidate.find_iter(text) {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            if before.is_some_and(char::is_alphanumeric) || after.is_some_and(char::is_alphanumeric)
            {
                continue;
            }
            for (start, end) in self.accepted_ranges(m.as_str(), region) {
                let (start, end) = (m.start() + start, m.start() + end);
                found.push(PhoneMatch {
                    start,
                    end,
                    raw: text[start..end].to_string(),
                });
            }
        }
        Ok(found)
    }
}

/// National number lengths considered possible per country calling code
fn possible_lengths(calling_code: u16) -> RangeInclusive<usize> {
    match calling_code {
        1 => 10..=10,
        44 => 9..=10,
        61 => 9..=9,
        91 => 10..=10,
        _ => 6..=14,
    }
}

/// Detects phone numbers for each configured region
pub struct PhoneDetector {
    matcher: Box<dyn PhoneMatcher>,
    regions: Vec<Region>,
}

impl PhoneDetector {
    pub fn new(matcher: Box<dyn PhoneMatcher>, regions: Vec<Region>) -> Self {
        Self { matcher, regions }
    }

    /// Detector using `LibPhoneMatcher`
    pub fn with_leniency(leniency: PhoneLeniency, regions: Vec<Region>) -> Result<Self> {
        Ok(Self::new(Box::new(LibPhoneMatcher::new(leniency)?), regions))
    }
}

impl Detector for PhoneDetector {
    fn find(&self, text: &str) -> Result<Vec<Span>> {
        let mut spans = Vec::new();
        for region in &self.regions {
            let matches = self.matcher.find_numbers(text, *region)?;
            tracing::debug!(region = %region, matches = matches.len(), "Phone region scanned");
            spans.extend(
                matches
                    .into_iter()
                    .map(|m| Span::from_range(EntityKind::Phone, text, m.start, m.end)),
            );
        }
        Ok(spans)
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Phone
    }

    fn name(&self) -> &str {
        "phone"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> LibPhoneMatcher {
        LibPhoneMatcher::new(PhoneLeniency::Possible).unwrap()
    }

    fn raws(text: &str, region: Region) -> Vec<String> {
        matcher()
            .find_numbers(text, region)
            .unwrap()
            .into_iter()
            .map(|m| m.raw)
            .collect()
    }

    #[test]
    fn test_us_formats() {
        assert_eq!(raws("Call 555-123-4567.", Region::Us), vec!["555-123-4567"]);
        assert_eq!(raws("Cell: (555) 123-4567", Region::Us), vec!["(555) 123-4567"]);
        assert_eq!(raws("Tel +1 555 123 4567", Region::Us), vec!["+1 555 123 4567"]);
    }

    #[test]
    fn test_international_prefix_from_other_region() {
        assert_eq!(
            raws("London office +44 20 7946 0958", Region::Us),
            vec!["+44 20 7946 0958"]
        );
    }

    #[test]
    fn test_years_and_zip_codes_ignored() {
        assert!(raws("2015 - 2019 at Acme, IL 62704", Region::Us).is_empty());
        assert!(raws("Dates 01/02/2020", Region::Us).is_empty());
    }

    #[test]
    fn test_number_glued_to_year() {
        assert_eq!(raws("Since 2019 555-123-4567", Region::Us), vec!["555-123-4567"]);
    }

    #[test]
    fn test_number_glued_to_year_with_spaces() {
        let text = "Since 2019 555 123 4567 on call";
        let found = matcher().find_numbers(text, Region::Us).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].raw.ends_with("555 123 4567"));
        assert_eq!(&text[found[0].end..], " on call");
    }

    #[test]
    fn test_unicode_separators() {
        assert_eq!(
            raws("Call 555\u{2013}123\u{2013}4567 anytime", Region::Us),
            vec!["555\u{2013}123\u{2013}4567"]
        );
        assert_eq!(
            raws("Call (555)\u{a0}123\u{a0}4567 anytime", Region::Us),
            vec!["(555)\u{a0}123\u{a0}4567"]
        );
        assert_eq!(
            raws("Tel +44\u{2009}20\u{2009}7946\u{2009}0958", Region::Us),
            vec!["+44\u{2009}20\u{2009}7946\u{2009}0958"]
        );
    }

    #[test]
    fn test_ascii_punctuation() {
        assert_eq!(ascii_punctuation("\u{FF08}555\u{FF09}\u{3000}123\u{2014}4567"), "(555) 123-4567");
        assert_eq!(ascii_punctuation("\u{FF15}\u{FF15}\u{FF15}"), "555");
    }

    #[test]
    fn test_letters_adjacent_rejected() {
        assert!(raws("order A5551234567B", Region::Us).is_empty());
    }

    #[test]
    fn test_offsets_point_at_raw_text() {
        let text = "Phone: 555.123.4567 (mobile)";
        let found = matcher().find_numbers(text, Region::Us).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(&text[found[0].start..found[0].end], "555.123.4567");
    }

    #[test]
    fn test_detector_probes_every_region() {
        let detector = PhoneDetector::with_leniency(PhoneLeniency::Possible, DEFAULT_REGIONS.to_vec())
            .unwrap();
        let spans = detector.find("Reach me on 555-123-4567").unwrap();
        assert!(!spans.is_empty());
        assert!(spans.iter().all(|s| s.text == "555-123-4567"));
        assert_eq!(detector.kind(), EntityKind::Phone);
    }

    #[test]
    fn test_region_parse() {
        assert_eq!("uk".parse::<Region>().unwrap(), Region::Gb);
        assert_eq!("IN".parse::<Region>().unwrap(), Region::In);
        assert!("FR".parse::<Region>().is_err());
    }

    struct FailingMatcher;

    impl PhoneMatcher for FailingMatcher {
        fn find_numbers(&self, _text: &str, _region: Region) -> Result<Vec<PhoneMatch>> {
            Err(Error::Detector("matcher unavailable".to_string()))
        }
    }

    #[test]
    fn test_matcher_error_propagates() {
        let detector = PhoneDetector::new(Box::new(FailingMatcher), vec![Region::Us]);
        assert!(detector.find("555-123-4567").is_err());
    }
}
