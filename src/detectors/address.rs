//! Postal address detector
//!
//! Punctuation left over from PDF extraction (bullets, pipes, stray line
//! breaks) breaks address grammars, so parsing runs on a normalized copy of
//! the text in which every character other than word characters, whitespace,
//! commas and periods is blanked. Each parsed address is then located in the
//! original text with a pattern that allows any non-word separators between
//! its tokens.
//!
//! This is best-effort: a parse that cannot be located in the original text
//! is dropped, and a located fragment may be wider or narrower than the real
//! address.

use super::{literal_spans, Detector};
use crate::error::{Error, Result};
use crate::redaction::{EntityKind, Span};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Address countries probed by default
pub const DEFAULT_COUNTRIES: [Country; 4] = [Country::Us, Country::Ca, Country::Gb, Country::Au];

/// Country whose address grammar is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Country {
    Us,
    Ca,
    Gb,
    Au,
}

impl Country {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Us => "US",
            Self::Ca => "CA",
            Self::Gb => "GB",
            Self::Au => "AU",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Country {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "US" => Ok(Self::Us),
            "CA" => Ok(Self::Ca),
            "GB" | "UK" => Ok(Self::Gb),
            "AU" => Ok(Self::Au),
            other => Err(format!("Unsupported address country: {}. Valid: US, CA, GB, AU", other)),
        }
    }
}

/// An address found by a parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    /// Full address as it appears in the parsed text
    pub full_address: String,
}

/// Postal-address parsing capability, parameterized by country.
pub trait AddressParser: Send + Sync {
    /// Parse all addresses in `text` using the grammar of `country`.
    fn parse(&self, text: &str, country: Country) -> Result<Vec<ParsedAddress>>;
}

const NORTH_AMERICAN_STREET_TYPES: &[&str] = &[
    "Street", "St", "Avenue", "Ave", "Av", "Boulevard", "Blvd", "Road", "Rd", "Drive", "Dr",
    "Lane", "Ln", "Court", "Ct", "Place", "Pl", "Way", "Parkway", "Pkwy", "Highway", "Hwy",
    "Circle", "Cir", "Terrace", "Ter", "Trail", "Trl", "Square", "Sq", "Crescent", "Cres",
    "Close", "Plaza", "Plz", "Loop", "Route", "Rte", "Pike", "Row", "Alley", "Crossing",
];

const GB_STREET_TYPES: &[&str] = &[
    "Street", "St", "Road", "Rd", "Lane", "Ln", "Avenue", "Ave", "Drive", "Dr", "Close",
    "Crescent", "Cres", "Court", "Ct", "Gardens", "Gdns", "Grove", "Hill", "Mews", "Place", "Pl",
    "Row", "Square", "Sq", "Terrace", "Way", "Walk", "Park", "Green", "Rise", "Vale", "View",
];

const US_STATES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM",
    "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA",
    "WV", "WI", "WY", "Alabama", "Alaska", "Arizona", "Arkansas", "California", "Colorado",
    "Connecticut", "Delaware", "Florida", "Georgia", "Hawaii", "Idaho", "Illinois", "Indiana",
    "Iowa", "Kansas", "Kentucky", "Louisiana", "Maine", "Maryland", "Massachusetts", "Michigan",
    "Minnesota", "Mississippi", "Missouri", "Montana", "Nebraska", "Nevada", "New Hampshire",
    "New Jersey", "New Mexico", "New York", "North Carolina", "North Dakota", "Ohio", "Oklahoma",
    "Oregon", "Pennsylvania", "Rhode Island", "South Carolina", "South Dakota", "Tennessee",
    "Texas", "Utah", "Vermont", "Virginia", "Washington", "West Virginia", "Wisconsin", "Wyoming",
];

const CA_PROVINCES: &[&str] = &[
    "AB", "BC", "MB", "NB", "NL", "NS", "NT", "NU", "ON", "PE", "QC", "SK", "YT", "Alberta",
    "British Columbia", "Manitoba", "New Brunswick", "Newfoundland and Labrador", "Nova Scotia",
    "Northwest Territories", "Nunavut", "Ontario", "Prince Edward Island", "Quebec",
    "Saskatchewan", "Yukon",
];

const AU_STATES: &[&str] = &[
    "NSW", "VIC", "QLD", "SA", "WA", "TAS", "NT", "ACT", "New South Wales", "Victoria",
    "Queensland", "South Australia", "Western Australia", "Tasmania", "Northern Territory",
    "Australian Capital Territory",
];

const UNIT: &str = r"(?:apartment|apt|suite|ste|unit|floor|fl|room|rm|#)\.?\s*[A-Z0-9-]+";
const DIRECTION: &str = r"(?:north|south|east|west|NE|NW|SE|SW|N|S|E|W)\.?";
const LOCALITY: &str = r"(?:[A-Z][A-Z.'-]*\s+){0,3}?[A-Z][A-Z.'-]*";

/// `AddressParser` built from per-country street-address grammars.
///
/// US, CA and AU addresses need a number, street words, a street type,
/// a locality, a state or province and a postal code. GB addresses need a
/// number, street words, a street type, an optional town and a postcode.
pub struct PatternAddressParser {
    us: Regex,
    ca: Regex,
    gb: Regex,
    au: Regex,
}

impl PatternAddressParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            us: compile(&regional_pattern(
                NORTH_AMERICAN_STREET_TYPES,
                US_STATES,
                r"\d{5}(?:-\d{4})?",
            ))?,
            ca: compile(&regional_pattern(
                NORTH_AMERICAN_STREET_TYPES,
                CA_PROVINCES,
                r"[ABCEGHJ-NPRSTVXY]\d[ABCEGHJ-NPRSTV-Z][ -]?\d[ABCEGHJ-NPRSTV-Z]\d",
            ))?,
            gb: compile(&format!(
                r"(?i)\b\d{{1,5}}[A-Z]?\s+(?:[A-Z0-9.'-]+\s+){{0,4}}?(?:{types})\.?(?:[\s,]+{locality})?[\s,]+[A-Z]{{1,2}}\d[A-Z\d]?\s*\d[A-Z]{{2}}\b",
                types = alternation(GB_STREET_TYPES),
                locality = LOCALITY,
            ))?,
            au: compile(&regional_pattern(
                NORTH_AMERICAN_STREET_TYPES,
                AU_STATES,
                r"\d{4}",
            ))?,
        })
    }

    fn grammar(&self, country: Country) -> &Regex {
        match country {
            Country::Us => &self.us,
            Country::Ca => &self.ca,
            Country::Gb => &self.gb,
            Country::Au => &self.au,
        }
    }
}

impl AddressParser for PatternAddressParser {
    fn parse(&self, text: &str, country: Country) -> Result<Vec<ParsedAddress>> {
        Ok(self
            .grammar(country)
            .find_iter(text)
            .map(|m| ParsedAddress {
                full_address: m.as_str().to_string(),
            })
            .collect())
    }
}

fn regional_pattern(street_types: &[&str], regions: &[&str], postal: &str) -> String {
    format!(
        r"(?i)\b\d{{1,6}}[A-Z]?(?:-\d{{1,6}})?\s+(?:[A-Z0-9.'-]+\s+){{0,4}}?(?:{types})\.?(?:\s+{direction})?(?:[\s,]+{unit})?[\s,]+{locality}[\s,]+(?:{regions})[\s,]+{postal}\b",
        types = alternation(street_types),
        direction = DIRECTION,
        unit = UNIT,
        locality = LOCALITY,
        regions = alternation(regions),
        postal = postal,
    )
}

/// Longest-first alternation; spaces inside entries match any whitespace
fn alternation(words: &[&str]) -> String {
    let mut sorted: Vec<&str> = words.to_vec();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    sorted
        .iter()
        .map(|w| {
            w.split(' ')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|")
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Detector(format!("Invalid address grammar: {}", e)))
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Detects postal addresses for each configured country
pub struct AddressDetector {
    parser: Box<dyn AddressParser>,
    countries: Vec<Country>,
    title_case_variant: bool,
    normalizer: Regex,
    token_split: Regex,
}

impl AddressDetector {
    pub fn new(
        parser: Box<dyn AddressParser>,
        countries: Vec<Country>,
        title_case_variant: bool,
    ) -> Result<Self> {
        let normalizer = Regex::new(r"[^\w\s,.]")
            .map_err(|e| Error::Detector(format!("Invalid normalizer pattern: {}", e)))?;
        let token_split = Regex::new(r"[\s,]+")
            .map_err(|e| Error::Detector(format!("Invalid token pattern: {}", e)))?;
        Ok(Self {
            parser,
            countries,
            title_case_variant,
            normalizer,
            token_split,
        })
    }

    /// Detector using `PatternAddressParser`
    pub fn with_countries(countries: Vec<Country>, title_case_variant: bool) -> Result<Self> {
        Self::new(Box::new(PatternAddressParser::new()?), countries, title_case_variant)
    }

    /// Copy of `text` with every character outside word characters,
    /// whitespace, commas and periods replaced by a space
    pub fn normalize(&self, text: &str) -> String {
        self.normalizer.replace_all(text, " ").into_owned()
    }

    /// Locate the original text of an address parsed from normalized text.
    ///
    /// Tokens of the parsed address must appear in order, separated only by
    /// non-word characters; matching is case-insensitive.
    pub fn locate_original(&self, original: &str, parsed_address: &str) -> Result<Option<String>> {
        let parts: Vec<String> = self
            .token_split
            .split(parsed_address)
            .filter(|part| !part.is_empty())
            .map(regex::escape)
            .collect();
        if parts.is_empty() {
            return Ok(None);
        }

        let pattern = format!(r"(?i){}", parts.join(r"[^\w]*"));
        let located = Regex::new(&pattern)
            .map_err(|e| Error::Detector(format!("Invalid address locator pattern: {}", e)))?;
        Ok(located.find(original).map(|m| m.as_str().to_string()))
    }
}

impl Detector for AddressDetector {
    fn find(&self, text: &str) -> Result<Vec<Span>> {
        let normalized = self.normalize(text);
        let mut variants = Vec::with_capacity(2);
        if self.title_case_variant {
            variants.push(title_case(&normalized));
        }
        variants.insert(0, normalized);

        let mut located = Vec::new();
        let mut seen = HashSet::new();
        let mut discarded = 0usize;
        for country in &self.countries {
            for variant in &variants {
                for parsed in self.parser.parse(variant, *country)? {
                    match self.locate_original(text, &parsed.full_address)? {
                        Some(original) => {
                            if seen.insert(original.clone()) {
                                located.push(original);
                            }
                        }
                        None => discarded += 1,
                    }
                }
            }
        }

        if discarded > 0 {
            tracing::debug!(discarded, "Parsed addresses not found in original text");
        }

        Ok(located
            .iter()
            .flat_map(|original| literal_spans(EntityKind::Address, text, original))
            .collect())
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Address
    }

    fn name(&self) -> &str {
        "address"
    }
}
