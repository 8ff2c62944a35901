//! Job requisition number strategy.
//!
//! When no dedicated element carries the identifier, the page is searched for
//! labels such as "Job ID" and the token that follows the label in the
//! enclosing element's text is taken as the value.

use super::{char_len_within, is_boilerplate, strip_affixes, Candidate, Fallback, FieldStrategy};
use crate::extractor::driver::MarkerContext;
use crate::types::Field;

pub static REQUISITION: FieldStrategy = FieldStrategy {
    field: Field::Requisition,
    candidates: CANDIDATES,
    clean,
    validate,
    fallback: Fallback::Markers(MARKERS),
};

const CANDIDATES: &[Candidate] = &[
    Candidate::attr("[data-job-id]", "data-job-id"),
    Candidate::attr("[data-requisition]", "data-requisition"),
    Candidate::text("[data-testid='job-id']"),
    Candidate::text("[class*='job-id'], [class*='jobId']"),
    Candidate::text("[class*='requisition']"),
    Candidate::text("[id*='job-id'], [id*='requisition']"),
    Candidate::text("[class*='posting-id']"),
    Candidate::text("[class*='reference']"),
];

/// Lowercase label markers
pub const MARKERS: &[&str] = &["job id", "job number", "requisition id"];

const PREFIXES: &[&str] = &[
    "Job ID:",
    "Job ID",
    "Job Number:",
    "Job Number",
    "Requisition ID:",
    "Requisition ID",
    "Req ID:",
    "Reference:",
    "Job #",
    "Req #",
    "#",
];

const LABEL_PUNCTUATION: &[char] = &[':', '#', '.'];

pub fn clean(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let next = strip_affixes(&current, PREFIXES, &[])
            .trim_matches(|c: char| LABEL_PUNCTUATION.contains(&c) || c.is_whitespace())
            .to_string();
        if next == current {
            return next;
        }
        current = next;
    }
}

pub fn validate(requisition: &str) -> bool {
    char_len_within(requisition, 3, 50)
        && requisition.split_whitespace().count() <= 3
        && requisition.chars().any(|c| c.is_ascii_digit())
        && !is_boilerplate(requisition)
}

/// Token immediately following the first marker in the context text.
///
/// Contexts no longer than their label hold only the label and are skipped.
pub fn value_after_marker(ctx: &MarkerContext, markers: &[&str]) -> Option<String> {
    if ctx.context.chars().count() <= ctx.label.chars().count() {
        return None;
    }
    let lower = ctx.context.to_ascii_lowercase();
    markers.iter().find_map(|marker| {
        let start = lower.find(marker)? + marker.len();
        let rest = ctx.context[start..]
            .trim_start_matches(|c: char| LABEL_PUNCTUATION.contains(&c) || c.is_whitespace());
        let token = rest
            .split_whitespace()
            .next()?
            .trim_end_matches(|c: char| matches!(c, ',' | ';' | '.' | ')' | '|'));
        (!token.is_empty()).then(|| token.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::StaticPage;

    fn ctx(label: &str, context: &str) -> MarkerContext {
        MarkerContext {
            label: label.to_string(),
            context: context.to_string(),
        }
    }

    #[test]
    fn test_clean_requisition() {
        assert_eq!(clean("Job ID: R-10042"), "R-10042");
        assert_eq!(clean("#48213"), "48213");
        assert_eq!(clean("Requisition ID  JR-7781 "), "JR-7781");
    }

    #[test]
    fn test_validate_requisition() {
        assert!(validate("R-10042"));
        assert!(validate("2024-ENG-118"));
        assert!(!validate("12"));
        assert!(!validate("Engineering"));
        assert!(!validate("We hire 5 people every month"));
    }

    #[test]
    fn test_value_after_marker() {
        assert_eq!(
            value_after_marker(&ctx("Job ID:", "Job ID: R-10042"), MARKERS).as_deref(),
            Some("R-10042")
        );
        assert_eq!(
            value_after_marker(&ctx("Requisition ID", "Requisition ID #5531, Seattle"), MARKERS)
                .as_deref(),
            Some("5531")
        );
    }

    #[test]
    fn test_label_only_context_is_skipped() {
        assert_eq!(value_after_marker(&ctx("Job ID", "Job ID"), MARKERS), None);
        assert_eq!(value_after_marker(&ctx("Job ID: ", "Job ID:"), MARKERS), None);
    }

    #[tokio::test]
    async fn test_resolve_via_marker_fallback() {
        let page = StaticPage::new(
            r#"<html><body><ul><li><strong>Job Number</strong> 2024-118</li></ul></body></html>"#,
        );
        assert_eq!(
            REQUISITION.resolve(&page, 8).await.as_deref(),
            Some("2024-118")
        );
    }

    #[tokio::test]
    async fn test_resolve_prefers_data_attribute() {
        let page = StaticPage::new(
            r#"<html><body><div data-job-id="JR-5512"><span>Job ID</span> 99999</div></body></html>"#,
        );
        assert_eq!(REQUISITION.resolve(&page, 8).await.as_deref(), Some("JR-5512"));
    }
}
