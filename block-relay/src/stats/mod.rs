// 2022-2025 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

mod channel;
mod format;
mod kind;
mod quick_stats;
#[cfg(test)]
mod tests;

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

pub use channel::Aggregate;
pub use channel::Aggregation;
pub use channel::MetricChannel;
pub use channel::Sample;
pub use format::format_bytes;
pub use format::format_percent;
pub use format::format_seconds;
pub use format::format_window;
pub use format::Presentation;
pub use kind::Direction;
pub use kind::MetricKind;
pub use quick_stats::LifetimeStats;
pub use quick_stats::QuickStats;
pub use quick_stats::StatsSummary;

use crate::clock::Clock;
use crate::config::RelayConfig;
use crate::helper::metrics::RelayMetrics;

pub const DEFAULT_STATS_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Rolling statistics of the thin block protocol across all peers.
///
/// Every metric lives in its own [`MetricChannel`] with its own lock, so
/// updates of unrelated metrics never wait on each other. Samples are
/// stamped with the injected [`Clock`] and expire after the configured
/// window. Lifetime totals are kept next to the channels and never expire.
pub struct RollingStatsRecorder {
    clock: Arc<dyn Clock>,
    window: Duration,
    channels: [MetricChannel; MetricKind::COUNT],
    totals: LifetimeTotals,
    metrics: Option<RelayMetrics>,
}

impl RollingStatsRecorder {
    pub fn new(clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self {
            clock,
            window,
            channels: MetricKind::ALL.map(|kind| MetricChannel::new(kind.aggregation(), window)),
            totals: LifetimeTotals::default(),
            metrics: None,
        }
    }

    pub fn from_config(config: &RelayConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(clock, config.stats_window())
    }

    pub fn with_metrics(mut self, metrics: RelayMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn channel(&self, kind: MetricKind) -> &MetricChannel {
        &self.channels[kind.index()]
    }

    pub fn update_inbound(&self, thin_size: u64, full_size: u64) {
        self.update_size_saved(Direction::Inbound, thin_size, full_size);
    }

    pub fn update_outbound(&self, thin_size: u64, full_size: u64) {
        self.update_size_saved(Direction::Outbound, thin_size, full_size);
    }

    pub fn update_inbound_bloom_filter(&self, size: u64) {
        self.update_bloom_filter(Direction::Inbound, size);
    }

    pub fn update_outbound_bloom_filter(&self, size: u64) {
        self.update_bloom_filter(Direction::Outbound, size);
    }

    pub fn update_response_time(&self, elapsed: Duration) {
        self.record(MetricKind::ResponseTime, elapsed.as_secs_f64(), 0.0);
        if let Some(metrics) = &self.metrics {
            metrics.report_response_time(elapsed);
        }
    }

    pub fn update_validation_time(&self, elapsed: Duration) {
        self.record(MetricKind::ValidationTime, elapsed.as_secs_f64(), 0.0);
        if let Some(metrics) = &self.metrics {
            metrics.report_validation_time(elapsed);
        }
    }

    pub fn update_re_requested_tx(&self, count: u64) {
        self.record(MetricKind::ReRequestedTx, count as f64, 0.0);
        if let Some(metrics) = &self.metrics {
            metrics.report_re_requested_tx(count);
        }
    }

    pub fn update_mempool_limiter_bytes_saved(&self, bytes_saved: u64) {
        self.record(MetricKind::MempoolLimiterBytesSaved, bytes_saved as f64, 0.0);
        saturating_add(&self.totals.mempool_limiter_bytes_saved, bytes_saved);
        if let Some(metrics) = &self.metrics {
            metrics.report_mempool_limiter_bytes_saved(bytes_saved);
        }
    }

    fn update_size_saved(&self, direction: Direction, thin_size: u64, full_size: u64) {
        let (kind, blocks) = match direction {
            Direction::Inbound => (MetricKind::InboundSizeSaved, &self.totals.inbound_blocks),
            Direction::Outbound => (MetricKind::OutboundSizeSaved, &self.totals.outbound_blocks),
        };
        self.record(kind, thin_size as f64, full_size as f64);
        saturating_add(blocks, 1);
        saturating_add(&self.totals.full_size, full_size);
        saturating_add(&self.totals.thin_size, thin_size);
        if let Some(metrics) = &self.metrics {
            metrics.report_thin_block(direction, thin_size, full_size);
        }
    }

    fn update_bloom_filter(&self, direction: Direction, size: u64) {
        let kind = match direction {
            Direction::Inbound => MetricKind::InboundBloomFilter,
            Direction::Outbound => MetricKind::OutboundBloomFilter,
        };
        self.record(kind, size as f64, 0.0);
        saturating_add(&self.totals.bloom_filter_bytes, size);
        if let Some(metrics) = &self.metrics {
            metrics.report_bloom_filter(direction, size);
        }
    }

    fn record(&self, kind: MetricKind, primary: f64, secondary: f64) {
        self.channel(kind).record_now(&*self.clock, primary, secondary);
    }

    pub fn aggregate(&self, kind: MetricKind) -> Aggregate {
        self.channel(kind).aggregate(self.clock.now_ms())
    }

    /// One line summary of a single metric over the window.
    pub fn summary(&self, kind: MetricKind) -> String {
        let now = self.clock.now_ms();
        let aggregate = self.channel(kind).aggregate(now);
        let window = format_window(self.window);
        let value = kind.presentation().render(aggregate.value);
        match kind {
            MetricKind::InboundSizeSaved => format!(
                "Compression for {} inbound thin blocks ({window}): {value}",
                aggregate.samples
            ),
            MetricKind::OutboundSizeSaved => format!(
                "Compression for {} outbound thin blocks ({window}): {value}",
                aggregate.samples
            ),
            MetricKind::InboundBloomFilter => {
                format!("Inbound bloom filter size ({window}) AVG: {value}")
            }
            MetricKind::OutboundBloomFilter => {
                format!("Outbound bloom filter size ({window}) AVG: {value}")
            }
            MetricKind::ResponseTime => format!("Response time ({window}) AVG: {value}"),
            MetricKind::ValidationTime => format!("Validation time ({window}) AVG: {value}"),
            MetricKind::ReRequestedTx => {
                let inbound = self.channel(MetricKind::InboundSizeSaved).aggregate(now).samples;
                let rate = re_request_rate(aggregate.samples, inbound);
                format!(
                    "Tx re-request rate ({window}): {} Total re-requests:{value}",
                    format_percent(rate)
                )
            }
            MetricKind::MempoolLimiterBytesSaved => {
                format!("Thin block mempool limiting has saved {value} of bandwidth ({window})")
            }
        }
    }

    pub fn inbound_percent_to_string(&self) -> String {
        self.summary(MetricKind::InboundSizeSaved)
    }

    pub fn outbound_percent_to_string(&self) -> String {
        self.summary(MetricKind::OutboundSizeSaved)
    }

    pub fn inbound_bloom_filters_to_string(&self) -> String {
        self.summary(MetricKind::InboundBloomFilter)
    }

    pub fn outbound_bloom_filters_to_string(&self) -> String {
        self.summary(MetricKind::OutboundBloomFilter)
    }

    pub fn response_time_to_string(&self) -> String {
        self.summary(MetricKind::ResponseTime)
    }

    pub fn validation_time_to_string(&self) -> String {
        self.summary(MetricKind::ValidationTime)
    }

    pub fn re_requested_tx_to_string(&self) -> String {
        self.summary(MetricKind::ReRequestedTx)
    }

    pub fn mempool_limiter_bytes_saved_to_string(&self) -> String {
        self.summary(MetricKind::MempoolLimiterBytesSaved)
    }

    /// Lifetime bandwidth savings, independent of the window.
    pub fn summary_line(&self) -> String {
        let lifetime = self.lifetime();
        format!(
            "{} inbound and {} outbound thin blocks have saved {} of bandwidth",
            lifetime.inbound_blocks,
            lifetime.outbound_blocks,
            format_bytes(lifetime.bandwidth_saved() as f64)
        )
    }

    pub fn summaries(&self) -> StatsSummary {
        StatsSummary {
            summary: self.summary_line(),
            inbound_percent: self.inbound_percent_to_string(),
            outbound_percent: self.outbound_percent_to_string(),
            inbound_bloom_filters: self.inbound_bloom_filters_to_string(),
            outbound_bloom_filters: self.outbound_bloom_filters_to_string(),
            response_time: self.response_time_to_string(),
            validation_time: self.validation_time_to_string(),
            re_requested_tx: self.re_requested_tx_to_string(),
            mempool_limiter_bytes_saved: self.mempool_limiter_bytes_saved_to_string(),
        }
    }

    /// Multi-line report of everything the recorder knows.
    pub fn report(&self) -> String {
        let mut lines = vec![self.summary_line()];
        lines.extend(MetricKind::ALL.into_iter().map(|kind| self.summary(kind)));
        lines.join("\n")
    }

    pub fn lifetime(&self) -> LifetimeStats {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        LifetimeStats {
            inbound_blocks: load(&self.totals.inbound_blocks),
            outbound_blocks: load(&self.totals.outbound_blocks),
            full_size: load(&self.totals.full_size),
            thin_size: load(&self.totals.thin_size),
            bloom_filter_bytes: load(&self.totals.bloom_filter_bytes),
            mempool_limiter_bytes_saved: load(&self.totals.mempool_limiter_bytes_saved),
        }
    }

    pub fn quick_stats(&self) -> QuickStats {
        let now = self.clock.now_ms();
        let lifetime = self.lifetime();
        let inbound = self.channel(MetricKind::InboundSizeSaved).aggregate(now);
        let outbound = self.channel(MetricKind::OutboundSizeSaved).aggregate(now);
        let re_requested = self.channel(MetricKind::ReRequestedTx).aggregate(now);
        QuickStats {
            total_inbound: lifetime.inbound_blocks,
            total_outbound: lifetime.outbound_blocks,
            total_bandwidth_savings: lifetime.bandwidth_saved(),
            window_inbound_compression: inbound.value * 100.0,
            window_inbound: inbound.samples,
            window_outbound_compression: outbound.value * 100.0,
            window_outbound: outbound.samples,
            window_re_requested_tx: re_requested.samples,
            window_re_requested_tx_percent: re_request_rate(re_requested.samples, inbound.samples)
                * 100.0,
        }
    }

    /// Drops all samples and lifetime totals.
    pub fn clear(&self) {
        for channel in &self.channels {
            channel.clear();
        }
        self.totals.reset();
        tracing::debug!("Thin block statistics cleared");
    }
}

impl std::fmt::Debug for RollingStatsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("RollingStatsRecorder")
            .field("window", &self.window)
            .field("lifetime", &self.lifetime())
            .finish()
    }
}

#[derive(Default)]
struct LifetimeTotals {
    inbound_blocks: AtomicU64,
    outbound_blocks: AtomicU64,
    full_size: AtomicU64,
    thin_size: AtomicU64,
    bloom_filter_bytes: AtomicU64,
    mempool_limiter_bytes_saved: AtomicU64,
}

impl LifetimeTotals {
    fn reset(&self) {
        for counter in [
            &self.inbound_blocks,
            &self.outbound_blocks,
            &self.full_size,
            &self.thin_size,
            &self.bloom_filter_bytes,
            &self.mempool_limiter_bytes_saved,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

fn saturating_add(counter: &AtomicU64, amount: u64) {
    // The closure never returns None, so the update can't fail
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |value| {
        Some(value.saturating_add(amount))
    });
}

fn re_request_rate(re_requests: usize, inbound_blocks: usize) -> f64 {
    if inbound_blocks == 0 {
        0.0
    } else {
        re_requests as f64 / inbound_blocks as f64
    }
}
