// 2022-2025 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::byte_tracker::BlockBuildState;
use crate::byte_tracker::ThinBlockByteTracker;
use crate::stats::RollingStatsRecorder;

/// Accounting event as emitted by the block relay layer, one JSON object
/// per line in a replay log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RelayEvent {
    AddBytes { block: String, amount: u64 },
    DeleteBytes { amount: u64 },
    ReleaseBlock { block: String },
    ResetTotal,
    Inbound { thin_size: u64, full_size: u64 },
    Outbound { thin_size: u64, full_size: u64 },
    InboundBloomFilter { size: u64 },
    OutboundBloomFilter { size: u64 },
    ResponseTime { millis: u64 },
    ValidationTime { millis: u64 },
    ReRequestedTx { count: u64 },
    MempoolLimiterBytesSaved { bytes: u64 },
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read event log: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse event on line {line}: {source}")]
    Parse { line: usize, source: serde_json::Error },
}

/// Feeds relay events into a tracker and a recorder, keeping one
/// [`BlockBuildState`] per block id in the log.
pub struct EventReplay {
    tracker: ThinBlockByteTracker,
    recorder: Arc<RollingStatsRecorder>,
    blocks: HashMap<String, BlockBuildState>,
}

impl EventReplay {
    pub fn new(tracker: ThinBlockByteTracker, recorder: Arc<RollingStatsRecorder>) -> Self {
        Self { tracker, recorder, blocks: HashMap::new() }
    }

    pub fn apply(&mut self, event: &RelayEvent) {
        match event {
            RelayEvent::AddBytes { block, amount } => {
                let state = self.blocks.entry(block.clone()).or_default();
                self.tracker.add_bytes(*amount, state);
            }
            RelayEvent::DeleteBytes { amount } => self.tracker.delete_bytes(*amount),
            RelayEvent::ReleaseBlock { block } => match self.blocks.remove(block) {
                Some(mut state) => self.tracker.release_block(&mut state),
                None => tracing::warn!("Release of unknown block {block}"),
            },
            RelayEvent::ResetTotal => {
                self.tracker.reset_total();
                self.blocks.clear();
            }
            RelayEvent::Inbound { thin_size, full_size } => {
                self.recorder.update_inbound(*thin_size, *full_size)
            }
            RelayEvent::Outbound { thin_size, full_size } => {
                self.recorder.update_outbound(*thin_size, *full_size)
            }
            RelayEvent::InboundBloomFilter { size } => {
                self.recorder.update_inbound_bloom_filter(*size)
            }
            RelayEvent::OutboundBloomFilter { size } => {
                self.recorder.update_outbound_bloom_filter(*size)
            }
            RelayEvent::ResponseTime { millis } => {
                self.recorder.update_response_time(Duration::from_millis(*millis))
            }
            RelayEvent::ValidationTime { millis } => {
                self.recorder.update_validation_time(Duration::from_millis(*millis))
            }
            RelayEvent::ReRequestedTx { count } => self.recorder.update_re_requested_tx(*count),
            RelayEvent::MempoolLimiterBytesSaved { bytes } => {
                self.recorder.update_mempool_limiter_bytes_saved(*bytes)
            }
        }
    }

    /// Applies every event of a newline delimited JSON log. Blank lines and
    /// lines starting with `#` are skipped. Returns the number of applied
    /// events.
    pub fn replay<R: BufRead>(&mut self, reader: R) -> Result<usize, ReplayError> {
        let mut applied = 0;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let event: RelayEvent = serde_json::from_str(line)
                .map_err(|source| ReplayError::Parse { line: index + 1, source })?;
            tracing::trace!("Replaying {event:?}");
            self.apply(&event);
            applied += 1;
        }
        Ok(applied)
    }

    /// Blocks with bytes still accounted in the tracker.
    pub fn in_flight_blocks(&self) -> usize {
        self.blocks.values().filter(|state| state.current_size() > 0).count()
    }
}
