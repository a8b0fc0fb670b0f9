use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use tracing::{debug, Level};

mod config;
mod fetch;
mod output;
mod pipeline;
mod stats;

use crate::config::Config;
use crate::fetch::HttpTransport;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (toml, yaml or json); defaults to ./contrib-stats.* if present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Organization to collect contributor stats for
    #[arg(long)]
    org: Option<String>,

    /// Stats endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Output file (e.g. _data/github_stats.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Retries when the response is not valid JSON
    #[arg(long)]
    max_retries: Option<u32>,

    /// Request timeout in seconds (0 = no timeout)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(org) = self.org {
            config.fetch.org = org;
        }
        if let Some(endpoint) = self.endpoint {
            config.fetch.endpoint = endpoint;
        }
        if let Some(output) = self.output {
            config.output.path = output;
        }
        if let Some(max_retries) = self.max_retries {
            config.fetch.max_retries = max_retries;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.fetch.timeout_secs = timeout_secs;
        }
        if self.pretty {
            config.output.pretty = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;
    debug!("Effective configuration: {:?}", config);

    println!("{}", "Contributor Stats Generator".bright_cyan().bold());
    println!("Organization: {}", config.fetch.org.bright_white());

    let transport = HttpTransport::new(config.fetch.timeout())
        .context("Failed to set up HTTP transport")?;
    let report = pipeline::run(&config, transport).await?;

    println!(
        "\n{} {} contributors written to {}",
        "Github stats file generated:".bright_green().bold(),
        report.contributors,
        report.output_path.display().to_string().bright_white()
    );

    Ok(())
}
