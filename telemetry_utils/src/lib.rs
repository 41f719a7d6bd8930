// 2022-2025 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::PeriodicReader;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::runtime::Tokio;

const METRICS_EXPORT_INTERVAL: Duration = Duration::from_secs(30);
const METRICS_EXPORT_TIMEOUT: Duration = Duration::from_secs(5);

/// Skips reporting of a metric value that falls outside the expected range.
/// Must be used inside a function returning `()`.
#[macro_export]
macro_rules! out_of_bounds_guard {
    // Version with explicit bounds
    ($value:expr,($low:expr, $high:expr), $metric_name:expr) => {{
        #[allow(unused_comparisons)]
        if !($low..=$high).contains(&$value) {
            tracing::warn!(
                "Metric {}: value {} is out of bounds {}..={}",
                $metric_name,
                $value,
                $low,
                $high
            );
            return;
        }
    }};

    // Version with default bounds.
    ($value:expr, $metric_name:expr) => {
        $crate::out_of_bounds_guard!($value, (0, 100_000), $metric_name);
    };
}

pub fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Whole milliseconds of a duration, saturated to `u64`.
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

pub fn get_metrics_endpoint() -> Option<String> {
    std::env::var("OTEL_EXPORTER_OTLP_METRICS_ENDPOINT")
        .or_else(|_| std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT"))
        .ok()
}

/// Builds an OTLP meter provider. Must be called inside a tokio runtime,
/// the periodic reader spawns its export task there.
pub fn init_meter_provider(service_name: &'static str) -> anyhow::Result<SdkMeterProvider> {
    let resource = opentelemetry_sdk::Resource::new(vec![KeyValue::new(
        "service.name",
        service_name,
    )])
    .merge(&opentelemetry_sdk::Resource::default());

    let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .build()
        .map_err(|e| anyhow::format_err!("Failed to build OTLP metrics exporter: {e}"))?;

    Ok(SdkMeterProvider::builder()
        .with_reader(
            PeriodicReader::builder(metric_exporter, Tokio)
                .with_interval(METRICS_EXPORT_INTERVAL)
                .with_timeout(METRICS_EXPORT_TIMEOUT)
                .build(),
        )
        .with_resource(resource)
        .build())
}
