//! prairie-ome-inject - OME-XML injection for Prairie acquisitions.
//!
//! Parses the configuration, runs the injector, and prints the summary.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prairie_ome_inject::{Config, Injector, RunSummary, SummaryFormat};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!(
        "prairie-ome-inject v{} processing {}",
        env!("CARGO_PKG_VERSION"),
        config.descriptor.display()
    );

    let injector = Injector::new(config.inject_options());
    let summary = match injector.run(&config.descriptor).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = print_summary(&summary, config.format) {
        error!("Failed to print summary: {}", e);
        return ExitCode::FAILURE;
    }

    match summary.check() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize the tracing/logging subsystem. Logs go to stderr so stdout
/// carries only the summary.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "prairie_ome_inject=debug"
    } else {
        "prairie_ome_inject=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_summary(summary: &RunSummary, format: SummaryFormat) -> Result<(), serde_json::Error> {
    match format {
        SummaryFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        SummaryFormat::Text => {
            println!("Descriptor:   {}", summary.descriptor.display());
            println!("Planes:       {}", summary.planes);
            if let Some(ref master) = summary.master_file {
                println!("Master file:  {}", master);
            }
            println!("Full:         {}", summary.full_documents);
            println!("Stub:         {}", summary.stub_documents);

            if !summary.skipped.is_empty() {
                println!();
                println!("Skipped ({}):", summary.skipped.len());
                for skipped in &summary.skipped {
                    println!("  {}", skipped.path.display());
                }
            }

            if !summary.failures.is_empty() {
                println!();
                println!("Failed ({}):", summary.failures.len());
                for failure in &summary.failures {
                    println!("  {}: {}", failure.path.display(), failure.error);
                }
            }
        }
    }
    Ok(())
}
