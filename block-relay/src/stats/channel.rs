// 2022-2025 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;

use crate::clock::Clock;
use crate::utilities::guarded::GuardedMut;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub timestamp_ms: u64,
    pub primary: f64,
    pub secondary: f64,
}

impl Sample {
    pub fn scalar(timestamp_ms: u64, value: f64) -> Self {
        Self { timestamp_ms, primary: value, secondary: 0.0 }
    }

    pub fn pair(timestamp_ms: u64, primary: f64, secondary: f64) -> Self {
        Self { timestamp_ms, primary, secondary }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aggregation {
    /// `1 - sum(primary) / sum(secondary)`, zero when nothing to compare to.
    RatioSaved,
    /// Mean of `primary`, zero for an empty window.
    Average,
    /// Sum of `primary`.
    Sum,
    /// Number of samples. Values are kept but not aggregated.
    Count,
}

impl Aggregation {
    pub fn apply<'a>(self, samples: impl IntoIterator<Item = &'a Sample>) -> f64 {
        let (count, primary, secondary) = samples
            .into_iter()
            .fold((0usize, 0.0f64, 0.0f64), |(count, primary, secondary), sample| {
                (count + 1, primary + sample.primary, secondary + sample.secondary)
            });
        match self {
            Aggregation::RatioSaved => {
                if secondary == 0.0 {
                    0.0
                } else {
                    1.0 - primary / secondary
                }
            }
            Aggregation::Average => {
                if count == 0 {
                    0.0
                } else {
                    primary / count as f64
                }
            }
            Aggregation::Sum => primary,
            Aggregation::Count => count as f64,
        }
    }
}

/// Aggregated value of a channel together with the number of samples it
/// was computed from.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aggregate {
    pub value: f64,
    pub samples: usize,
}

/// Time windowed list of samples with one aggregation policy.
pub struct MetricChannel {
    aggregation: Aggregation,
    window_ms: u64,
    samples: Mutex<VecDeque<Sample>>,
}

impl MetricChannel {
    pub fn new(aggregation: Aggregation, window: Duration) -> Self {
        Self {
            aggregation,
            window_ms: telemetry_utils::duration_millis(window),
            samples: Mutex::new(VecDeque::new()),
        }
    }

    /// Inserts a sample in timestamp order and drops everything that fell
    /// out of the window relative to the newest sample.
    pub fn record(&self, sample: Sample) {
        let window_ms = self.window_ms;
        self.samples.guarded_mut(|samples| insert(samples, sample, window_ms));
    }

    /// Stamps a sample with `clock` while holding the channel lock, so
    /// concurrent writers append in clock order.
    pub fn record_now(&self, clock: &dyn Clock, primary: f64, secondary: f64) {
        let window_ms = self.window_ms;
        self.samples.guarded_mut(|samples| {
            let sample = Sample::pair(clock.now_ms(), primary, secondary);
            insert(samples, sample, window_ms);
        });
    }

    pub fn aggregate(&self, now_ms: u64) -> Aggregate {
        let window_ms = self.window_ms;
        let aggregation = self.aggregation;
        self.samples.guarded_mut(|samples| {
            prune(samples, now_ms, window_ms);
            Aggregate { value: aggregation.apply(samples.iter()), samples: samples.len() }
        })
    }

    /// Copy of the samples still inside the window.
    pub fn samples(&self, now_ms: u64) -> Vec<Sample> {
        let window_ms = self.window_ms;
        self.samples.guarded_mut(|samples| {
            prune(samples, now_ms, window_ms);
            samples.iter().copied().collect()
        })
    }

    pub fn clear(&self) {
        self.samples.guarded_mut(|samples| samples.clear());
    }
}

impl std::fmt::Debug for MetricChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("MetricChannel")
            .field("aggregation", &self.aggregation)
            .field("window_ms", &self.window_ms)
            .finish()
    }
}

fn insert(samples: &mut VecDeque<Sample>, sample: Sample, window_ms: u64) {
    let position = samples.partition_point(|s| s.timestamp_ms <= sample.timestamp_ms);
    samples.insert(position, sample);
    if let Some(newest) = samples.back().map(|s| s.timestamp_ms) {
        prune(samples, newest, window_ms);
    }
}

// Samples are kept sorted by timestamp, so expired ones are always at the front.
fn prune(samples: &mut VecDeque<Sample>, now_ms: u64, window_ms: u64) {
    let cutoff = now_ms.saturating_sub(window_ms);
    let before = samples.len();
    while samples.front().is_some_and(|sample| sample.timestamp_ms < cutoff) {
        samples.pop_front();
    }
    let expired = before - samples.len();
    if expired > 0 {
        tracing::trace!("Pruned {expired} samples older than {cutoff}");
    }
}
