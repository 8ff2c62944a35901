//! CLI commands for jobtrack.
//!
//! Parses live postings through headless Chrome, or runs the field
//! strategies over a saved HTML file.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cancel::NotCancelled;
use crate::config::AppConfig;
use crate::extractor::{ExtractionSession, StaticPage};
use crate::parser::JobParser;
use crate::types::JobInfo;
use crate::worker::{ParseEvent, ParseWorker};

#[derive(Parser)]
#[command(name = "jobtrack")]
#[command(version, about = "Extract job title, company and location from job postings", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a live job posting with headless Chrome
    Parse {
        /// Job posting URL
        url: String,

        /// Additional attempts after a failed one
        #[arg(short, long)]
        retries: Option<u32>,

        /// Also extract Job Type and Job/Req #
        #[arg(short, long)]
        extended: bool,

        /// Output format (json, table)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Chrome executable override
        #[arg(long)]
        chrome: Option<PathBuf>,

        /// Show the browser window
        #[arg(long)]
        headful: bool,
    },

    /// Run the field strategies over a saved HTML page
    Inspect {
        /// Path to the HTML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// URL the page was saved from
        #[arg(short, long, default_value = "https://example.com/")]
        url: String,

        /// Also extract Job Type and Job/Req #
        #[arg(short, long)]
        extended: bool,

        /// Output format (json, table)
        #[arg(short, long, default_value = "json")]
        format: String,
    },
}

/// Parse one live posting. Ctrl-C asks the parse to stop.
pub async fn run_parse(
    url: String,
    retries: Option<u32>,
    extended: bool,
    format: String,
    chrome: Option<PathBuf>,
    headful: bool,
) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;

    if let Some(path) = chrome {
        config.browser.chrome_executable = Some(path.to_string_lossy().to_string());
    }
    if headful {
        config.browser.headless = false;
    }
    if let Some(retries) = retries {
        config.parser.max_retries = retries;
    }
    config.parser.extended_fields |= extended;

    let parser = Arc::new(JobParser::chrome(&config));
    let (worker, mut events) = ParseWorker::new(parser.clone());
    worker.submit(url.as_str())?;

    let event = loop {
        tokio::select! {
            event = events.recv() => break event,
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Stopping...");
                worker.stop();
            }
        }
    };
    parser.shutdown().await;

    match event {
        Some(ParseEvent::Finished(report)) => {
            let Some(info) = report.info else {
                bail!("Failed to parse job information from {}", report.url);
            };
            eprintln!(
                "Parsed in {:.1}s at {}",
                report.elapsed.as_secs_f64(),
                report.finished_at.to_rfc3339()
            );
            print_job(&info, &format)
        }
        Some(ParseEvent::Cancelled { url, .. }) => bail!("Parsing of {} was cancelled", url),
        Some(ParseEvent::ForceStopped { url }) => {
            bail!("Parsing of {} did not stop in time and was abandoned", url)
        }
        None => bail!("Parse worker exited without a result"),
    }
}

/// Run the extraction session over a saved HTML file.
pub async fn run_inspect(
    file: PathBuf,
    url: String,
    extended: bool,
    format: String,
) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    config.parser.extended_fields |= extended;

    let html = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let mut page = StaticPage::new(html);

    let info = ExtractionSession::new(&mut page, &config.parser, &NotCancelled)
        .run(&url)
        .await?;
    match info {
        Some(info) => print_job(&info, &format),
        None => bail!("Extraction was cancelled"),
    }
}

fn print_job(info: &JobInfo, format: &str) -> anyhow::Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(info)?),
        "table" => print_table(info),
        _ => {
            eprintln!("Unknown format: {}. Using JSON.", format);
            println!("{}", serde_json::to_string_pretty(info)?);
        }
    }
    Ok(())
}

/// Print fields in table format.
fn print_table(info: &JobInfo) {
    for (field, value) in info.fields() {
        println!("  {:<10} {}", format!("{}:", field), value);
    }
    if info.is_empty() {
        println!();
        println!("No fields recovered; the record needs manual entry.");
    }
}
