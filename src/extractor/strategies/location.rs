//! Location strategy, with a body-text pattern fallback

use super::{
    char_len_within, contains_any, is_boilerplate, strip_affixes, Candidate, Fallback,
    FieldStrategy, PatternRule,
};
use crate::types::Field;

pub static LOCATION: FieldStrategy = FieldStrategy {
    field: Field::Location,
    candidates: CANDIDATES,
    clean,
    validate,
    fallback: Fallback::BodyPatterns(PATTERNS),
};

const CANDIDATES: &[Candidate] = &[
    Candidate::text("[class*='jobs-unified-top-card__bullet']"),
    Candidate::text("[data-testid='job-location']"),
    Candidate::text("[class*='jobsearch-JobInfoHeader-subtitle']"),
    Candidate::text("[class*='job-details-location']"),
    Candidate::text("[class*='job-location']"),
    Candidate::text("[class*='location']"),
    Candidate::text("[class*='workplace-type']"),
    Candidate::meta("meta[property='og:locality']"),
    Candidate::meta("meta[name='location']"),
];

// "City, ST ZIP" is tried before "City, ST" so the longer match wins;
// "City, Country" comes last as the loosest form
const PATTERNS: &[PatternRule] = &[
    PatternRule {
        pattern: r"\b(?:Remote|Hybrid|On-site|Onsite)\b",
        value: None,
    },
    PatternRule {
        pattern: r"\b[A-Z][a-z]+(?: [A-Z][a-z]+)?,\s*[A-Z]{2}\s+\d{5}\b",
        value: None,
    },
    PatternRule {
        pattern: r"\b[A-Z][a-z]+(?: [A-Z][a-z]+)?,\s*[A-Z]{2}\b",
        value: None,
    },
    PatternRule {
        pattern: r"\b[A-Z][a-z]+,\s*[A-Z][a-z]+\b",
        value: None,
    },
];

const PREFIXES: &[&str] = &[
    "Location:",
    "Work Location:",
    "Job Location:",
    "Office Location:",
    "Address:",
    "City:",
    "Based in",
];

const REMOTE: &[&str] = &["remote", "work from home", "wfh", "telecommute", "virtual"];
const HYBRID: &[&str] = &["hybrid"];
const ON_SITE: &[&str] = &["on-site", "onsite", "in-office"];

const PHRASE_INDICATORS: &[&str] = &[
    ",",
    "remote",
    "work from home",
    "wfh",
    "telecommute",
    "virtual",
    "hybrid",
    "on-site",
    "onsite",
    "in-office",
    "united states",
    "united kingdom",
    "canada",
    "europe",
    "california",
    "new york",
    "texas",
    "florida",
    "washington",
    "illinois",
];

/// Matched as whole words only
const WORD_INDICATORS: &[&str] = &[
    "usa", "us", "uk", "ca", "ny", "tx", "fl", "wa", "il", "pa", "oh", "ga", "nc", "mi", "nj",
    "va", "ma", "tn", "az", "mo", "md", "wi", "co", "mn",
];

const EXCLUDES: &[&str] = &[
    "apply",
    "requirements",
    "responsibilities",
    "description",
    "qualifications",
    "benefits",
    "salary",
    "company",
    "job",
    "career",
    "position",
    "role",
    "experience",
    "skills",
    "education",
    "degree",
    "years",
    "team",
    "manage",
    "develop",
    "create",
    "build",
    "design",
    "implement",
    "support",
    "maintain",
    "improve",
    "ensure",
    "provide",
    "deliver",
    "lead",
    "drive",
];

/// Phrases that may contain an excluded word and still name a location
const REMOTE_WORK_PHRASES: &[&str] = &["work from home", "work remotely", "remote work"];

/// Strips label prefixes and maps work-arrangement synonyms to
/// "Remote", "Hybrid" or "On-site"
pub fn clean(raw: &str) -> String {
    let stripped = strip_affixes(raw, PREFIXES, &[]);
    let lower = stripped.to_lowercase();
    if contains_any(&lower, REMOTE) {
        "Remote".to_string()
    } else if contains_any(&lower, HYBRID) {
        "Hybrid".to_string()
    } else if contains_any(&lower, ON_SITE) {
        "On-site".to_string()
    } else {
        stripped
    }
}

pub fn validate(location: &str) -> bool {
    if !char_len_within(location, 2, 100) || is_boilerplate(location) {
        return false;
    }
    let word_count = location.split_whitespace().count();
    if !(1..=10).contains(&word_count) {
        return false;
    }

    let lower = location.to_lowercase();
    let has_indicator = contains_any(&lower, PHRASE_INDICATORS)
        || lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|word| WORD_INDICATORS.contains(&word));
    let excluded =
        contains_any(&lower, EXCLUDES) && !contains_any(&lower, REMOTE_WORK_PHRASES);

    has_indicator && !excluded
}
