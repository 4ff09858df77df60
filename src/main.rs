//! Discern CLI entry point.

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use discern::cli::{preflight, Cli, Output};
use discern::config::Settings;
use discern::orchestrator::Pipeline;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        // Wrong arguments exit quietly.
        Err(_) => std::process::exit(1),
    };

    if let Err(e) = run(cli).await {
        Output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging
    let log_level = cli.log_level(&settings.general.log_level).to_string();
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("discern={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    Output::info("Analyzing video...");

    if let Some(model) = &cli.model {
        settings.summary.apply_model_override(model);
    }

    preflight::check(&settings)?;

    let pipeline = Pipeline::from_settings(&settings)?;
    let mut stdout = std::io::stdout();
    let report = pipeline.run(&cli.url, &mut stdout).await?;
    info!(
        transcript_chars = report.transcript_chars,
        summary_chars = report.summary.chars().count(),
        "Done"
    );

    Ok(())
}
