// 2022-2025 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

#[cfg(test)]
use mockall::automock;

/// Source of timestamps for rolling statistics, in milliseconds.
/// Implementations must never go backwards.
#[cfg_attr(test, automock)]
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall clock. A system time jump backwards is flattened to the last
/// returned value.
#[derive(Debug, Default)]
pub struct SystemClock {
    last_ms: AtomicU64,
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        let now = telemetry_utils::now_ms();
        let previous = self.last_ms.fetch_max(now, Ordering::AcqRel);
        previous.max(now)
    }
}

/// Replays a fixed list of timestamps, one per call. Once the list is
/// exhausted the last timestamp is returned forever.
#[derive(Debug)]
pub struct ScriptedClock {
    times: Vec<u64>,
    cursor: AtomicUsize,
}

impl ScriptedClock {
    pub fn new(times: Vec<u64>) -> anyhow::Result<Self> {
        anyhow::ensure!(!times.is_empty(), "Scripted clock requires at least one timestamp");
        Ok(Self { times, cursor: AtomicUsize::new(0) })
    }

    /// One timestamp every `step_ms`, starting at zero.
    pub fn with_step(step_ms: u64, count: usize) -> anyhow::Result<Self> {
        Self::new((0..count as u64).map(|i| i * step_ms).collect())
    }

    pub fn rewind(&self) {
        self.cursor.store(0, Ordering::Release);
    }

    /// Number of timestamps handed out so far.
    pub fn calls(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }
}

impl Clock for ScriptedClock {
    fn now_ms(&self) -> u64 {
        let index = self.cursor.fetch_add(1, Ordering::AcqRel);
        self.times[index.min(self.times.len() - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_clock_repeats_last_value() -> anyhow::Result<()> {
        let clock = ScriptedClock::new(vec![5, 10, 20])?;
        assert_eq!(clock.now_ms(), 5);
        assert_eq!(clock.now_ms(), 10);
        assert_eq!(clock.now_ms(), 20);
        assert_eq!(clock.now_ms(), 20);
        assert_eq!(clock.calls(), 4);

        clock.rewind();
        assert_eq!(clock.now_ms(), 5);
        Ok(())
    }

    #[test]
    fn scripted_clock_with_step() -> anyhow::Result<()> {
        let clock = ScriptedClock::with_step(60_000, 3)?;
        assert_eq!(clock.now_ms(), 0);
        assert_eq!(clock.now_ms(), 60_000);
        assert_eq!(clock.now_ms(), 120_000);
        assert_eq!(clock.now_ms(), 120_000);
        Ok(())
    }

    #[test]
    fn scripted_clock_rejects_empty_script() {
        assert!(ScriptedClock::new(vec![]).is_err());
        assert!(ScriptedClock::with_step(1000, 0).is_err());
    }

    #[test]
    fn system_clock_never_goes_backwards() {
        let clock = SystemClock::default();
        let mut previous = clock.now_ms();
        for _ in 0..1000 {
            let now = clock.now_ms();
            assert!(now >= previous);
            previous = now;
        }
    }
}
