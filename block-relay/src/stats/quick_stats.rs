// 2022-2025 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use serde::Serialize;

/// Counters accumulated since start (or since the last clear).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LifetimeStats {
    pub inbound_blocks: u64,
    pub outbound_blocks: u64,
    /// Size the thin blocks would have had as full blocks
    pub full_size: u64,
    pub thin_size: u64,
    pub bloom_filter_bytes: u64,
    pub mempool_limiter_bytes_saved: u64,
}

impl LifetimeStats {
    pub fn bandwidth_saved(&self) -> u64 {
        self.full_size.saturating_sub(self.thin_size)
    }
}

/// Numeric snapshot for diagnostics endpoints.
/// Percentages are in `0..=100`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct QuickStats {
    pub total_inbound: u64,
    pub total_outbound: u64,
    pub total_bandwidth_savings: u64,
    pub window_inbound_compression: f64,
    pub window_inbound: usize,
    pub window_outbound_compression: f64,
    pub window_outbound: usize,
    pub window_re_requested_tx: usize,
    pub window_re_requested_tx_percent: f64,
}

/// Human readable summaries, one per metric.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub summary: String,
    pub inbound_percent: String,
    pub outbound_percent: String,
    pub inbound_bloom_filters: String,
    pub outbound_bloom_filters: String,
    pub response_time: String,
    pub validation_time: String,
    pub re_requested_tx: String,
    pub mempool_limiter_bytes_saved: String,
}
