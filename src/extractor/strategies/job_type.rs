//! Employment type strategy

use super::{
    char_len_within, contains_any, is_boilerplate, strip_affixes, Candidate, Fallback,
    FieldStrategy, PatternRule,
};
use crate::types::Field;

pub static JOB_TYPE: FieldStrategy = FieldStrategy {
    field: Field::JobType,
    candidates: CANDIDATES,
    clean,
    validate,
    fallback: Fallback::BodyPatterns(PATTERNS),
};

const CANDIDATES: &[Candidate] = &[
    Candidate::text("[class*='jobs-unified-top-card__job-insight'] span"),
    Candidate::text("[class*='jobs-unified-top-card__workplace-type']"),
    Candidate::text("[data-testid='job-type']"),
    Candidate::text("[class*='job-type'], [class*='jobType']"),
    Candidate::text("[class*='employment-type']"),
    Candidate::attr("[data-job-type]", "data-job-type"),
    Candidate::text("[itemprop='employmentType']"),
    Candidate::text("[id*='job-type']"),
    Candidate::text("[class*='schedule']"),
];

const PATTERNS: &[PatternRule] = &[
    PatternRule {
        pattern: r"(?i)\bfull[\s-]?time\b",
        value: Some("Full-time"),
    },
    PatternRule {
        pattern: r"(?i)\bpart[\s-]?time\b",
        value: Some("Part-time"),
    },
    PatternRule {
        pattern: r"(?i)\bcontract\b",
        value: Some("Contract"),
    },
];

const PREFIXES: &[&str] = &["Job Type:", "Employment Type:", "Work Type:", "Schedule:"];

/// Checked in order, first hit wins
const CANONICAL: &[(&[&str], &str)] = &[
    (&["contract"], "Contract"),
    (&["temp"], "Temporary"),
    (&["permanent", "perm"], "Permanent"),
    (&["freelance"], "Freelance"),
    (&["intern"], "Internship"),
    (&["volunteer"], "Volunteer"),
    (&["seasonal"], "Seasonal"),
    (&["remote", "wfh", "work from home"], "Remote"),
    (&["hybrid"], "Hybrid"),
    (&["on-site", "onsite", "in-office"], "On-site"),
];

const INDICATORS: &[&str] = &[
    "full",
    "part",
    "time",
    "contract",
    "temp",
    "permanent",
    "perm",
    "freelance",
    "intern",
    "volunteer",
    "seasonal",
    "remote",
    "hybrid",
    "on-site",
    "onsite",
    "wfh",
    "work from home",
    "in-office",
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
    "location",
    "experience",
    "skills",
    "education",
    "degree",
    "years",
    "team",
    "manage",
    "develop",
    "create",
];

pub fn clean(raw: &str) -> String {
    let stripped = strip_affixes(raw, PREFIXES, &[]);
    let lower = stripped.to_lowercase();

    if lower.contains("time") {
        if lower.contains("full") {
            return "Full-time".to_string();
        }
        if lower.contains("part") {
            return "Part-time".to_string();
        }
    }
    CANONICAL
        .iter()
        .find(|(needles, _)| contains_any(&lower, needles))
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(stripped)
}

pub fn validate(job_type: &str) -> bool {
    let lower = job_type.to_lowercase();
    let word_count = job_type.split_whitespace().count();

    char_len_within(job_type, 3, 100)
        && (1..=5).contains(&word_count)
        && contains_any(&lower, INDICATORS)
        && !contains_any(&lower, EXCLUDES)
        && !is_boilerplate(job_type)
}
