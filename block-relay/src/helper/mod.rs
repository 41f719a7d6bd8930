// 2022-2025 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

pub mod metrics;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

fn default_verbose_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::new(
        "block_relay=trace,\
            relay_stats=trace,\
            telemetry_utils=trace",
    )
}

fn default_non_verbose_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::new(
        "block_relay=info,\
            relay_stats=info,\
            telemetry_utils=warn",
    )
}

fn default_filter() -> tracing_subscriber::EnvFilter {
    if std::env::var("BLOCK_RELAY_VERBOSE").is_ok() {
        default_verbose_filter()
    } else {
        default_non_verbose_filter()
    }
}

pub fn init_tracing() {
    let filter = if std::env::var(tracing_subscriber::EnvFilter::DEFAULT_ENV).is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        default_filter()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_thread_ids(true)
                .with_ansi(false)
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();
}
