// 2022-2025 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::sync::Arc;
use std::time::Duration;

use opentelemetry::metrics::Counter;
use opentelemetry::metrics::Gauge;
use opentelemetry::metrics::Histogram;
use opentelemetry::metrics::Meter;
use opentelemetry::KeyValue;
use telemetry_utils::duration_millis;
use telemetry_utils::out_of_bounds_guard;

use crate::stats::Direction;

// Upper bound for timing histograms, anything above is treated as garbage
const MAX_REPORTED_MILLIS: u64 = 600_000;

#[derive(Clone)]
pub struct RelayMetrics(Arc<RelayMetricsInner>);

struct RelayMetricsInner {
    in_flight_bytes: Gauge<u64>,
    rejected_byte_deletions: Counter<u64>,
    thin_blocks: Counter<u64>,
    thin_block_size: Histogram<u64>,
    full_block_size: Histogram<u64>,
    bloom_filter_size: Histogram<u64>,
    response_time: Histogram<u64>,
    validation_time: Histogram<u64>,
    re_requested_tx: Counter<u64>,
    mempool_limiter_bytes_saved: Counter<u64>,
}

impl RelayMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self(Arc::new(RelayMetricsInner {
            in_flight_bytes: meter
                .u64_gauge("node_thin_block_in_flight_bytes")
                .with_description("Bytes held by thin blocks under reconstruction")
                .build(),
            rejected_byte_deletions: meter
                .u64_counter("node_thin_block_rejected_byte_deletions")
                .with_description("Deletions larger than the tracked total")
                .build(),
            thin_blocks: meter.u64_counter("node_thin_blocks").build(),
            thin_block_size: meter.u64_histogram("node_thin_block_size").build(),
            full_block_size: meter.u64_histogram("node_thin_block_full_size").build(),
            bloom_filter_size: meter.u64_histogram("node_thin_block_bloom_filter_size").build(),
            response_time: meter.u64_histogram("node_thin_block_response_time").build(),
            validation_time: meter.u64_histogram("node_thin_block_validation_time").build(),
            re_requested_tx: meter.u64_counter("node_thin_block_re_requested_tx").build(),
            mempool_limiter_bytes_saved: meter
                .u64_counter("node_thin_block_mempool_limiter_bytes_saved")
                .build(),
        }))
    }

    pub fn report_in_flight_bytes(&self, total: u64) {
        self.0.in_flight_bytes.record(total, &[]);
    }

    pub fn report_rejected_byte_deletion(&self) {
        self.0.rejected_byte_deletions.add(1, &[]);
    }

    pub fn report_thin_block(&self, direction: Direction, thin_size: u64, full_size: u64) {
        let attrs = [direction_attr(direction)];
        self.0.thin_blocks.add(1, &attrs);
        self.0.thin_block_size.record(thin_size, &attrs);
        self.0.full_block_size.record(full_size, &attrs);
    }

    pub fn report_bloom_filter(&self, direction: Direction, size: u64) {
        self.0.bloom_filter_size.record(size, &[direction_attr(direction)]);
    }

    pub fn report_response_time(&self, elapsed: Duration) {
        let millis = duration_millis(elapsed);
        out_of_bounds_guard!(millis, (0, MAX_REPORTED_MILLIS), "response_time");
        self.0.response_time.record(millis, &[]);
    }

    pub fn report_validation_time(&self, elapsed: Duration) {
        let millis = duration_millis(elapsed);
        out_of_bounds_guard!(millis, (0, MAX_REPORTED_MILLIS), "validation_time");
        self.0.validation_time.record(millis, &[]);
    }

    pub fn report_re_requested_tx(&self, count: u64) {
        self.0.re_requested_tx.add(count, &[]);
    }

    pub fn report_mempool_limiter_bytes_saved(&self, bytes: u64) {
        self.0.mempool_limiter_bytes_saved.add(bytes, &[]);
    }
}

fn direction_attr(direction: Direction) -> KeyValue {
    KeyValue::new("direction", direction.as_str())
}

impl std::fmt::Debug for RelayMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "RelayMetrics")
    }
}
