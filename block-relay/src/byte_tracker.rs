// 2022-2025 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::sync::Arc;

use parking_lot::Mutex;

use crate::helper::metrics::RelayMetrics;
use crate::utilities::guarded::Guarded;
use crate::utilities::guarded::GuardedMut;

/// Bytes accumulated for one thin block under reconstruction.
/// Owned by the peer session building the block.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BlockBuildState {
    current_size: u64,
}

impl BlockBuildState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_size(&self) -> u64 {
        self.current_size
    }
}

/// Total bytes held by all in-flight thin block reconstructions.
///
/// A single instance is created per process and shared by cloning the
/// handle. The tracker itself never enforces a limit: callers compare
/// [`ThinBlockByteTracker::total`] against the configured ceiling.
#[derive(Clone, Default)]
pub struct ThinBlockByteTracker {
    total: Arc<Mutex<u64>>,
    metrics: Option<RelayMetrics>,
}

impl ThinBlockByteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(mut self, metrics: RelayMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn add_bytes(&self, amount: u64, block: &mut BlockBuildState) {
        let total = self.total.guarded_mut(|total| {
            *total = total.saturating_add(amount);
            *total
        });
        block.current_size = block.current_size.saturating_add(amount);
        self.report(total);
    }

    /// Subtracts `amount` from the total. A deletion larger than the
    /// tracked total is ignored: resetting to zero here would let blocks
    /// still being built escape the ceiling.
    pub fn delete_bytes(&self, amount: u64) {
        let result = self.total.guarded_mut(|total| {
            if amount > *total {
                Err(*total)
            } else {
                *total -= amount;
                Ok(*total)
            }
        });
        match result {
            Ok(total) => self.report(total),
            Err(total) => {
                tracing::debug!(
                    "Ignoring thin block byte deletion: {amount} exceeds tracked total {total}"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.report_rejected_byte_deletion();
                }
            }
        }
    }

    /// Returns the bytes of a finished, failed or timed out block and
    /// zeroes its counter.
    pub fn release_block(&self, block: &mut BlockBuildState) {
        let amount = std::mem::take(&mut block.current_size);
        self.delete_bytes(amount);
    }

    pub fn reset_total(&self) {
        self.total.guarded_mut(|total| *total = 0);
        self.report(0);
    }

    pub fn total(&self) -> u64 {
        self.total.guarded(|total| *total)
    }

    pub fn exceeds(&self, limit: u64) -> bool {
        self.total() > limit
    }

    pub fn would_exceed(&self, amount: u64, limit: u64) -> bool {
        self.total().saturating_add(amount) > limit
    }

    fn report(&self, total: u64) {
        if let Some(metrics) = &self.metrics {
            metrics.report_in_flight_bytes(total);
        }
    }
}

impl std::fmt::Debug for ThinBlockByteTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "ThinBlockByteTracker({})", self.total())
    }
}
