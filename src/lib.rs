//! Job-posting field extractor.
//!
//! Drives a pooled headless browser to recover the title, company and
//! location of a job posting, with bounded retries, cooperative cancellation
//! and a watchdog on every parse.

pub mod cancel;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod parser;
pub mod retry;
pub mod types;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use cancel::{CancelCheck, CancelFlag, NotCancelled};
pub use config::{AppConfig, BrowserConfig, ParserConfig};
pub use error::{DriverError, ExtractError};
pub use parser::JobParser;
pub use types::{Field, JobInfo, UNKNOWN};
pub use worker::{ParseEvent, ParseReport, ParseWorker, WorkerError};
