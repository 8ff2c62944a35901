//! Result types shared by the extractor and its callers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder for a field the extractor could not resolve.
pub const UNKNOWN: &str = "Unknown";

/// Logical fields the extractor knows how to recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Title,
    Company,
    Location,
    JobType,
    Requisition,
}

impl Field {
    /// Column name used by the record store.
    pub fn label(&self) -> &'static str {
        match self {
            Field::Title => "Job Title",
            Field::Company => "Company",
            Field::Location => "Location",
            Field::JobType => "Job Type",
            Field::Requisition => "Job/Req #",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fields recovered from one job posting.
///
/// The three primary fields are always present. The extended fields are
/// `Some` exactly when the extended strategy set was requested, and then
/// carry [`UNKNOWN`] when unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInfo {
    #[serde(rename = "Job Title")]
    pub title: String,
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Job Type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(rename = "Job/Req #", default, skip_serializing_if = "Option::is_none")]
    pub requisition: Option<String>,
}

impl JobInfo {
    /// Every field set to [`UNKNOWN`].
    pub fn unknown(extended: bool) -> Self {
        let ext = || extended.then(|| UNKNOWN.to_string());
        Self {
            title: UNKNOWN.to_string(),
            company: UNKNOWN.to_string(),
            location: UNKNOWN.to_string(),
            job_type: ext(),
            requisition: ext(),
        }
    }

    /// Store a resolved value. Extended fields are ignored unless the
    /// extended set was requested.
    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Title => self.title = value,
            Field::Company => self.company = value,
            Field::Location => self.location = value,
            Field::JobType => {
                if let Some(slot) = self.job_type.as_mut() {
                    *slot = value;
                }
            }
            Field::Requisition => {
                if let Some(slot) = self.requisition.as_mut() {
                    *slot = value;
                }
            }
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Title => Some(&self.title),
            Field::Company => Some(&self.company),
            Field::Location => Some(&self.location),
            Field::JobType => self.job_type.as_deref(),
            Field::Requisition => self.requisition.as_deref(),
        }
    }

    /// Whether every present field is still [`UNKNOWN`].
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, v)| *v == UNKNOWN)
    }

    /// Present fields in display order.
    pub fn fields(&self) -> Vec<(Field, &str)> {
        [
            Field::Title,
            Field::Company,
            Field::Location,
            Field::JobType,
            Field::Requisition,
        ]
        .into_iter()
        .filter_map(|f| self.get(f).map(|v| (f, v)))
        .collect()
    }
}
