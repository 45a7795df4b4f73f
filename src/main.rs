//! Main entry point for the gnss-data-downloader CLI

use clap::Parser;
use gnss_data_downloader::cli::Cli;
use gnss_data_downloader::metrics::init_metrics;
use gnss_data_downloader::shutdown::ShutdownCoordinator;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing; `LOG_FORMAT=json` switches to JSON lines and
/// `RUST_LOG` overrides the verbosity-derived filter
fn init_tracing(verbosity: u8) {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let default_level = match verbosity {
        0 | 1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gnss_data_downloader={default_level}")));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Some(addr) = cli.metrics_addr {
        init_metrics(addr)?;
    }

    // Ctrl+C only flips the flag; the run loop stops between requests
    let shutdown = ShutdownCoordinator::shared();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() && shutdown.request_shutdown() {
                tracing::warn!("Ctrl+C received - finishing the current request");
            }
        }
    });

    // external tools block, keep them off the async workers
    let result = tokio::task::spawn_blocking(move || cli.execute(shutdown)).await?;

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
