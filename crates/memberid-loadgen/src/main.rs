#![doc = include_str!("../README.md")]

mod config;
mod driver;
mod pool;
mod report;
mod telemetry;

use clap::Parser;
use config::{CliArgs, LoadConfig};
use telemetry::init_telemetry;
use tokio::signal;
use tokio_util::sync::CancellationToken;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = LoadConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let shutdown_token = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown_token.clone()));

    let report = driver::run(config, shutdown_token).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_clean() {
        anyhow::bail!(
            "uniqueness check failed: {} duplicate ids, {} mismatched users",
            report.duplicates.len(),
            report.mismatched.len()
        );
    }

    tracing::info!(
        registered = report.registered,
        failed = report.failed,
        elapsed_ms = report.elapsed_ms,
        "Load run complete"
    );
    Ok(())
}

fn log_startup_info(config: &LoadConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting load run with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting load run: {} registrations on {} workers",
            config.registrations,
            config.num_workers
        );
    }
}

async fn shutdown_signal(shutdown_token: CancellationToken) {
    tokio::select! {
        res = signal::ctrl_c() => match res {
            Ok(()) => {
                tracing::info!("Received Ctrl+C signal, finishing queued registrations");
                shutdown_token.cancel();
            }
            Err(err) => tracing::error!("Failed to install Ctrl+C handler: {err}"),
        },
        () = shutdown_token.cancelled() => {}
    }
}
