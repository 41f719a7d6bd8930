// 2022-2025 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//
mod serde_config;

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
pub use serde_config::load_config_from_file;
pub use serde_config::save_config_to_file;
use typed_builder::TypedBuilder;

use crate::stats::DEFAULT_STATS_WINDOW;

/// Default ceiling for bytes held by all thin blocks under reconstruction.
pub const DEFAULT_MAX_IN_FLIGHT_BYTES: u64 = 128_000_000;

/// Thin block relay accounting settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TypedBuilder)]
#[serde(default)]
pub struct RelayConfig {
    /// Retention window of rolling statistics in seconds.
    /// Defaults to 86400 (24 hours)
    #[builder(default = DEFAULT_STATS_WINDOW.as_secs())]
    pub stats_window_secs: u64,

    /// Total bytes all in-flight thin blocks may hold before new thin
    /// block data should be refused. Defaults to 128 MB
    #[builder(default = DEFAULT_MAX_IN_FLIGHT_BYTES)]
    pub max_in_flight_bytes: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            stats_window_secs: DEFAULT_STATS_WINDOW.as_secs(),
            max_in_flight_bytes: DEFAULT_MAX_IN_FLIGHT_BYTES,
        }
    }
}

impl RelayConfig {
    pub fn stats_window(&self) -> Duration {
        Duration::from_secs(self.stats_window_secs)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.stats_window_secs > 0, "stats_window_secs must be greater than zero");
        anyhow::ensure!(
            self.max_in_flight_bytes > 0,
            "max_in_flight_bytes must be greater than zero"
        );
        Ok(())
    }
}
