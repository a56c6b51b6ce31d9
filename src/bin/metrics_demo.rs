//! Publishes the demo instruments on a Prometheus scrape endpoint until
//! interrupted.

use std::{error::Error, net::SocketAddr, process};

use clap::Parser;
use opentelemetry::metrics::MeterProvider as _;
use prometheus::Registry;
use telemetry_demos::{metrics_demo, server, setup};

/// Metrics demo - serve a counter, a histogram and a gauge for Prometheus
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address the scrape endpoint listens on
    #[arg(short, long, default_value = server::DEFAULT_LISTEN)]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() {
    setup::init_logging();

    let args = Args::parse();
    if let Err(err) = run(args).await {
        tracing::error!(error = %err, "metrics demo failed");
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let registry = Registry::new();
    let provider = setup::init_meter_provider(registry.clone())?;
    let _instruments = metrics_demo::record(&provider.meter(metrics_demo::METER));

    let listener = server::bind(args.listen).await?;
    server::run(listener, registry, provider, async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("interrupt received, shutting down"),
            Err(err) => tracing::error!(error = %err, "cannot listen for interrupt, shutting down"),
        }
    })
    .await
}
