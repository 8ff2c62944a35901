//! Per-field extraction strategies.
//!
//! Each field owns an ordered catalog of candidates (a CSS locator plus how to
//! read a value from the match), a cleaner and a validator. Candidates are
//! tried in priority order and the first cleaned value the validator accepts
//! wins. Extraction failures at the candidate level are misses, never errors.

pub mod company;
pub mod job_type;
pub mod location;
pub mod requisition;
pub mod title;

use regex::Regex;
use tracing::{debug, info};

use super::driver::PageDriver;
use crate::types::Field;

pub use company::COMPANY;
pub use job_type::JOB_TYPE;
pub use location::LOCATION;
pub use requisition::REQUISITION;
pub use title::TITLE;

/// How a value is read from the matched element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    /// Rendered text content
    Text,
    /// Named attribute
    Attr(&'static str),
    /// `content` attribute of a meta tag
    Meta,
}

/// One locator within a field's catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub selector: &'static str,
    pub extract: Extract,
}

impl Candidate {
    pub const fn text(selector: &'static str) -> Self {
        Self {
            selector,
            extract: Extract::Text,
        }
    }

    pub const fn attr(selector: &'static str, name: &'static str) -> Self {
        Self {
            selector,
            extract: Extract::Attr(name),
        }
    }

    pub const fn meta(selector: &'static str) -> Self {
        Self {
            selector,
            extract: Extract::Meta,
        }
    }
}

/// Regex scanned over body text. `value` replaces the matched text when set.
#[derive(Debug, Clone, Copy)]
pub struct PatternRule {
    pub pattern: &'static str,
    pub value: Option<&'static str>,
}

/// What to try once every candidate has missed
#[derive(Debug, Clone, Copy)]
pub enum Fallback {
    None,
    /// Scan the page's visible text
    BodyPatterns(&'static [PatternRule]),
    /// Read the token following a label such as "Job ID"
    Markers(&'static [&'static str]),
}

/// Outcome of cleaning and validating one raw value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedField {
    pub raw: String,
    pub cleaned: String,
    pub accepted: bool,
}

/// Catalog, cleaner and validator for one field
pub struct FieldStrategy {
    pub field: Field,
    pub candidates: &'static [Candidate],
    pub clean: fn(&str) -> String,
    pub validate: fn(&str) -> bool,
    pub fallback: Fallback,
}

impl FieldStrategy {
    /// Clean `raw` and validate the result. Raw text carrying boilerplate is
    /// rejected even when cleaning would normalize it into something valid.
    pub fn apply(&self, raw: &str) -> ExtractedField {
        let cleaned = (self.clean)(raw);
        let accepted = !is_boilerplate(raw) && (self.validate)(&cleaned);
        ExtractedField {
            raw: raw.to_string(),
            cleaned,
            accepted,
        }
    }

    /// Resolve the field on the current page, trying at most
    /// `max_candidates` catalog entries before the fallback.
    pub async fn resolve(&self, driver: &dyn PageDriver, max_candidates: usize) -> Option<String> {
        for candidate in self.candidates.iter().take(max_candidates) {
            let Some(raw) = evaluate(driver, candidate).await else {
                continue;
            };
            let extracted = self.apply(&raw);
            if extracted.accepted {
                info!("{} found: {}", self.field, extracted.cleaned);
                return Some(extracted.cleaned);
            }
            debug!(
                "{} candidate {} rejected: {:?}",
                self.field, candidate.selector, extracted.raw
            );
        }

        let fallback = match self.fallback {
            Fallback::None => None,
            Fallback::BodyPatterns(rules) => match driver.body_text().await {
                Ok(text) => self.scan_patterns(&text, rules),
                Err(e) => {
                    debug!("{} body scan failed: {}", self.field, e);
                    None
                }
            },
            Fallback::Markers(markers) => match driver.marker_contexts(markers).await {
                Ok(contexts) => contexts
                    .iter()
                    .filter_map(|ctx| requisition::value_after_marker(ctx, markers))
                    .map(|token| self.apply(&token))
                    .find(|extracted| extracted.accepted)
                    .map(|extracted| extracted.cleaned),
                Err(e) => {
                    debug!("{} marker scan failed: {}", self.field, e);
                    None
                }
            },
        };

        match fallback {
            Some(value) => {
                info!("{} found via fallback: {}", self.field, value);
                Some(value)
            }
            None => {
                info!("{} not found", self.field);
                None
            }
        }
    }

    /// First pattern match in `text` that survives cleaning and validation
    pub fn scan_patterns(&self, text: &str, rules: &[PatternRule]) -> Option<String> {
        for rule in rules {
            let Ok(re) = Regex::new(rule.pattern) else {
                continue;
            };
            for m in re.find_iter(text) {
                let extracted = self.apply(rule.value.unwrap_or(m.as_str()));
                if extracted.accepted {
                    return Some(extracted.cleaned);
                }
            }
        }
        None
    }
}

async fn evaluate(driver: &dyn PageDriver, candidate: &Candidate) -> Option<String> {
    let result = match candidate.extract {
        Extract::Text => driver.element_text(candidate.selector).await,
        Extract::Attr(name) => driver.element_attr(candidate.selector, name).await,
        Extract::Meta => driver.element_attr(candidate.selector, "content").await,
    };
    match result {
        Ok(Some(value)) if !value.trim().is_empty() => Some(value),
        Ok(_) => None,
        Err(e) => {
            debug!("Candidate {} failed: {}", candidate.selector, e);
            None
        }
    }
}

/// Strategies run by a session, in priority order
pub fn strategies(extended: bool) -> Vec<&'static FieldStrategy> {
    let mut all = vec![&TITLE, &COMPANY, &LOCATION];
    if extended {
        all.extend([&JOB_TYPE, &REQUISITION]);
    }
    all
}

/// Boilerplate no field value may contain
pub const BOILERPLATE: &[&str] = &[
    "apply now",
    "click here",
    "see more",
    "view all",
    "sign in",
    "log in",
    "requirements",
    "responsibilities",
    "qualifications",
    "privacy policy",
    "cookie policy",
    "terms of service",
];

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn contains_any(lower: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| lower.contains(n))
}

pub(crate) fn is_boilerplate(text: &str) -> bool {
    contains_any(&text.to_lowercase(), BOILERPLATE)
}

pub(crate) fn char_len_within(text: &str, min: usize, max: usize) -> bool {
    let len = text.chars().count();
    len >= min && len < max
}

/// Repeatedly strip case-insensitive label prefixes and suffixes until none
/// apply, collapsing whitespace along the way.
///
/// A prefix only matches as a whole phrase: it must end in punctuation or be
/// followed by whitespace.
pub(crate) fn strip_affixes(text: &str, prefixes: &[&str], suffixes: &[&str]) -> String {
    let mut current = collapse_whitespace(text);
    loop {
        let mut changed = false;
        for prefix in prefixes {
            if let Some(rest) = strip_prefix_ci(&current, prefix) {
                current = rest.trim().to_string();
                changed = true;
            }
        }
        for suffix in suffixes {
            if let Some(rest) = strip_suffix_ci(&current, suffix) {
                current = rest.trim().to_string();
                changed = true;
            }
        }
        if !changed {
            return current;
        }
    }
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let rest = &text[prefix.len()..];
    let ends_in_punct = prefix.ends_with(|c: char| c.is_ascii_punctuation());
    let at_boundary = rest.is_empty() || rest.starts_with(char::is_whitespace);
    (ends_in_punct || at_boundary).then_some(rest)
}

fn strip_suffix_ci<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let split = text.len().checked_sub(suffix.len())?;
    let tail = text.get(split..)?;
    tail.eq_ignore_ascii_case(suffix).then(|| &text[..split])
}
