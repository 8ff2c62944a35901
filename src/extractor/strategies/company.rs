//! Hiring organization strategy

use super::{
    char_len_within, contains_any, is_boilerplate, strip_affixes, Candidate, Fallback,
    FieldStrategy,
};
use crate::types::Field;

pub static COMPANY: FieldStrategy = FieldStrategy {
    field: Field::Company,
    candidates: CANDIDATES,
    clean,
    validate,
    fallback: Fallback::None,
};

const CANDIDATES: &[Candidate] = &[
    Candidate::text("[class*='jobs-unified-top-card__company-name']"),
    Candidate::text("[data-testid='company-name']"),
    Candidate::text("[class*='jobsearch-CompanyInfoContainer']"),
    Candidate::text("[class*='company-name'], [class*='companyName']"),
    Candidate::text("[class*='employer-name'], [class*='employerName']"),
    Candidate::meta("meta[property='og:site_name']"),
    Candidate::meta("meta[name='company']"),
    Candidate::attr("img[class*='company-logo']", "alt"),
    Candidate::attr("img[class*='logo']", "alt"),
];

const PREFIXES: &[&str] = &["Company:", "Employer:", "Jobs at", "Careers at"];
const SUFFIXES: &[&str] = &["- Jobs", "- Careers"];

const EXCLUDES: &[&str] = &[
    "apply", "job", "career", "hiring", "search", "find", "browse", "view all", "see more",
    "click here", "home", "about", "contact", "privacy", "terms", "cookie", "login", "sign in",
    "register",
];

pub fn clean(raw: &str) -> String {
    strip_affixes(raw, PREFIXES, SUFFIXES)
}

pub fn validate(company: &str) -> bool {
    char_len_within(company, 2, 100)
        && !contains_any(&company.to_lowercase(), EXCLUDES)
        && !is_boilerplate(company)
}
