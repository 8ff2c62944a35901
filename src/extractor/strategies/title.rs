//! Job title strategy

use super::{
    char_len_within, collapse_whitespace, contains_any, is_boilerplate, strip_affixes, Candidate,
    Fallback, FieldStrategy,
};
use crate::types::Field;

pub static TITLE: FieldStrategy = FieldStrategy {
    field: Field::Title,
    candidates: CANDIDATES,
    clean,
    validate,
    fallback: Fallback::None,
};

const CANDIDATES: &[Candidate] = &[
    Candidate::text("h1"),
    // Indeed
    Candidate::text("[class*='jobsearch-JobInfoHeader-title']"),
    // LinkedIn
    Candidate::text("[class*='jobs-unified-top-card__job-title']"),
    // Microsoft Careers
    Candidate::text("[class*='job-details-title']"),
    // Greenhouse
    Candidate::text("[class*='opening-title']"),
    Candidate::text("[class*='job-title'], [class*='jobTitle']"),
    Candidate::meta("meta[property='og:title']"),
    Candidate::text("title"),
    Candidate::text("h2"),
    Candidate::text("[id*='jobTitle'], [id*='job-title']"),
    Candidate::meta("meta[name='title']"),
];

const PREFIXES: &[&str] = &["Job Title:", "Position:", "Role:", "Apply for", "Apply to"];
const SUFFIXES: &[&str] = &["- job post", "- Careers", "- Jobs"];

const EXCLUDES: &[&str] = &[
    "apply now",
    "click here",
    "view job",
    "see more",
    "job search",
    "company profile",
    "about us",
    "contact",
    "privacy policy",
    "terms of service",
    "cookie policy",
    "home",
    "careers",
];

/// Keeps the part before a `|` site separator and strips label affixes
pub fn clean(raw: &str) -> String {
    let collapsed = collapse_whitespace(raw);
    let head = collapsed.split('|').next().unwrap_or_default();
    strip_affixes(head, PREFIXES, SUFFIXES)
}

pub fn validate(title: &str) -> bool {
    char_len_within(title, 3, 200)
        && !contains_any(&title.to_lowercase(), EXCLUDES)
        && !is_boilerplate(title)
}
