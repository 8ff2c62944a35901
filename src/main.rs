//! jobtrack CLI
//!
//! Extracts job title, company and location from job-posting pages.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobtrack::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobtrack=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            url,
            retries,
            extended,
            format,
            chrome,
            headful,
        } => cli::run_parse(url, retries, extended, format, chrome, headful).await,
        Commands::Inspect {
            file,
            url,
            extended,
            format,
        } => cli::run_inspect(file, url, extended, format).await,
    }
}
