//! Emits one demo trace to a Jaeger collector and exits once every span has
//! been exported.

use std::{error::Error, process};

use clap::Parser;
use telemetry_demos::{setup, trace_demo};

/// Trace demo - send a two-span trace with baggage to Jaeger
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Jaeger collector endpoint
    #[arg(short = 'j', long = "jaeger", default_value = setup::DEFAULT_COLLECTOR_ENDPOINT)]
    jaeger: String,
}

#[tokio::main]
async fn main() {
    setup::init_logging();

    let args = Args::parse();
    if let Err(err) = run(args).await {
        tracing::error!(error = %err, "trace demo failed");
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing::info!(endpoint = %args.jaeger, "exporting traces to jaeger");
    let provider = setup::init_trace_provider(&args.jaeger)?;

    let baggage = trace_demo::demo_baggage();
    let emitted = trace_demo::emit_trace(&provider, &baggage);
    tracing::info!(trace_id = %emitted.trace_id, "trace emitted");
    tracing::debug!(headers = ?emitted.headers, "propagation headers for downstream calls");

    setup::shutdown_trace_provider(provider).await?;
    tracing::info!("all spans exported");
    Ok(())
}
