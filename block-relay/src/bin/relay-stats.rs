// 2022-2025 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;

use block_relay::byte_tracker::ThinBlockByteTracker;
use block_relay::clock::SystemClock;
use block_relay::config::load_config_from_file;
use block_relay::config::RelayConfig;
use block_relay::events::EventReplay;
use block_relay::helper::init_tracing;
use block_relay::helper::metrics::RelayMetrics;
use block_relay::stats::format_bytes;
use block_relay::stats::RollingStatsRecorder;
use clap::Parser;
use serde_json::json;
use telemetry_utils::get_metrics_endpoint;
use telemetry_utils::init_meter_provider;

/// Replays a thin block accounting event log and prints relay statistics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML relay config, defaults are used when omitted
    #[arg(short, long)]
    config_path: Option<PathBuf>,

    /// Newline delimited JSON event log
    #[arg(short, long)]
    events: PathBuf,

    /// Print statistics as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), std::io::Error> {
    let args = Args::parse();
    init_tracing();

    let exit_code = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async {
            match execute(args).await {
                Ok(_) => 0,
                Err(err) => {
                    tracing::error!("{err}");
                    1
                }
            }
        });
    exit(exit_code);
}

async fn execute(args: Args) -> anyhow::Result<()> {
    let config = match &args.config_path {
        Some(path) => load_config_from_file(path)?,
        None => RelayConfig::default(),
    };
    tracing::info!("Relay config: {}", serde_json::to_string(&config)?);

    let meter_provider = match get_metrics_endpoint() {
        Some(endpoint) => {
            tracing::info!("Exporting metrics to {endpoint}");
            let provider = init_meter_provider("block-relay")?;
            opentelemetry::global::set_meter_provider(provider.clone());
            Some(provider)
        }
        None => None,
    };
    let metrics = meter_provider
        .as_ref()
        .map(|_| RelayMetrics::new(&opentelemetry::global::meter("block_relay")));

    let mut tracker = ThinBlockByteTracker::new();
    let mut recorder = RollingStatsRecorder::from_config(&config, Arc::new(SystemClock::default()));
    if let Some(metrics) = metrics {
        tracker = tracker.with_metrics(metrics.clone());
        recorder = recorder.with_metrics(metrics);
    }
    let recorder = Arc::new(recorder);

    let file = File::open(&args.events).map_err(|e| {
        anyhow::format_err!("Failed to open event log {}: {e}", args.events.display())
    })?;
    let mut replay = EventReplay::new(tracker.clone(), recorder.clone());
    let applied = replay.replay(BufReader::new(file))?;
    tracing::info!("Replayed {applied} events");

    let in_flight = tracker.total();
    if tracker.exceeds(config.max_in_flight_bytes) {
        tracing::warn!(
            "In-flight thin block bytes {in_flight} exceed the configured limit {}",
            config.max_in_flight_bytes
        );
    }

    if args.json {
        let output = json!({
            "summary": recorder.summaries(),
            "quick_stats": recorder.quick_stats(),
            "lifetime": recorder.lifetime(),
            "in_flight_bytes": in_flight,
            "in_flight_blocks": replay.in_flight_blocks(),
            "max_in_flight_bytes": config.max_in_flight_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", recorder.report());
        println!(
            "In-flight thin block bytes: {} of {} ({} blocks)",
            format_bytes(in_flight as f64),
            format_bytes(config.max_in_flight_bytes as f64),
            replay.in_flight_blocks()
        );
    }

    if let Some(provider) = meter_provider {
        if let Err(err) = provider.shutdown() {
            tracing::warn!("Failed to shutdown meter provider: {err}");
        }
    }
    Ok(())
}
