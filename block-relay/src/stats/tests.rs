// 2022-2025 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::clock::MockClock;
use crate::clock::ScriptedClock;

const MINUTE_MS: u64 = 60 * 1000;

fn minutes_recorder() -> RollingStatsRecorder {
    let clock = Arc::new(ScriptedClock::with_step(MINUTE_MS, 1000).unwrap());
    RollingStatsRecorder::new(clock, DEFAULT_STATS_WINDOW)
}

#[test]
fn summaries_on_empty_channels_are_well_formed() {
    let recorder = minutes_recorder();
    assert_eq!(
        recorder.summary_line(),
        "0 inbound and 0 outbound thin blocks have saved 0.00B of bandwidth"
    );
    assert_eq!(
        recorder.inbound_percent_to_string(),
        "Compression for 0 inbound thin blocks (last 24hrs): 0.0%"
    );
    assert_eq!(
        recorder.outbound_percent_to_string(),
        "Compression for 0 outbound thin blocks (last 24hrs): 0.0%"
    );
    assert_eq!(
        recorder.inbound_bloom_filters_to_string(),
        "Inbound bloom filter size (last 24hrs) AVG: 0.00B"
    );
    assert_eq!(
        recorder.outbound_bloom_filters_to_string(),
        "Outbound bloom filter size (last 24hrs) AVG: 0.00B"
    );
    assert_eq!(recorder.response_time_to_string(), "Response time (last 24hrs) AVG: 0.00sec");
    assert_eq!(recorder.validation_time_to_string(), "Validation time (last 24hrs) AVG: 0.00sec");
    assert_eq!(
        recorder.re_requested_tx_to_string(),
        "Tx re-request rate (last 24hrs): 0.0% Total re-requests:0"
    );
    assert_eq!(
        recorder.mempool_limiter_bytes_saved_to_string(),
        "Thin block mempool limiting has saved 0.00B of bandwidth (last 24hrs)"
    );
    assert_eq!(recorder.report().lines().count(), 1 + MetricKind::COUNT);
    assert_eq!(recorder.quick_stats(), QuickStats::default());
}

#[test]
fn inbound_compression() {
    let recorder = minutes_recorder();
    for i in 0..100 {
        recorder.update_inbound(i, 3 * i);
    }
    let res = recorder.inbound_percent_to_string();
    assert!(res.contains("66.7%"), "inbound_percent_to_string() is {res}");
    assert!(res.contains("100 inbound"), "inbound_percent_to_string() is {res}");
}

#[test]
fn outbound_compression() {
    let recorder = minutes_recorder();
    for i in 0..100 {
        recorder.update_outbound(i, 3 * i);
    }
    let res = recorder.outbound_percent_to_string();
    assert!(res.contains("66.7%"), "outbound_percent_to_string() is {res}");
}

#[test]
fn bloom_filter_averages() {
    let recorder = minutes_recorder();
    for i in 0..100 {
        recorder.update_inbound_bloom_filter(1000 * i);
    }
    let res = recorder.inbound_bloom_filters_to_string();
    assert!(res.contains("49.50KB"), "inbound_bloom_filters_to_string() is {res}");

    let recorder = minutes_recorder();
    for i in 0..100 {
        recorder.update_outbound_bloom_filter(1000 * i);
    }
    let res = recorder.outbound_bloom_filters_to_string();
    assert!(res.contains("49.50KB"), "outbound_bloom_filters_to_string() is {res}");
}

#[test]
fn re_requested_tx_count() {
    let recorder = minutes_recorder();
    for i in 0..100 {
        recorder.update_re_requested_tx(1000 * i);
    }
    let res = recorder.re_requested_tx_to_string();
    assert!(res.contains(":100"), "re_requested_tx_to_string() is {res}");
}

#[test]
fn re_request_rate_is_relative_to_inbound_blocks() {
    let recorder = minutes_recorder();
    for i in 0..4 {
        recorder.update_inbound(100 * i, 1000 * i);
    }
    recorder.update_re_requested_tx(3);
    assert_eq!(
        recorder.re_requested_tx_to_string(),
        "Tx re-request rate (last 24hrs): 25.0% Total re-requests:1"
    );
    let stats = recorder.quick_stats();
    assert_eq!(stats.window_re_requested_tx, 1);
    assert_eq!(stats.window_re_requested_tx_percent, 25.0);
}

#[test]
fn mempool_limiter_sum() {
    let recorder = minutes_recorder();
    for i in 0..100 {
        recorder.update_mempool_limiter_bytes_saved(1000 * i);
    }
    let res = recorder.mempool_limiter_bytes_saved_to_string();
    assert!(res.contains("4.95MB"), "mempool_limiter_bytes_saved_to_string() is {res}");
}

#[test]
fn timing_averages() {
    let recorder = minutes_recorder();
    recorder.update_response_time(Duration::from_millis(1000));
    recorder.update_response_time(Duration::from_millis(2000));
    recorder.update_validation_time(Duration::from_millis(250));
    assert_eq!(recorder.response_time_to_string(), "Response time (last 24hrs) AVG: 1.50sec");
    assert_eq!(recorder.validation_time_to_string(), "Validation time (last 24hrs) AVG: 0.25sec");
}

#[test]
fn samples_expire_after_window() {
    // One update per minute for an hour, then a read at minute 90
    let mut times: Vec<u64> = (0..60).map(|i| i * MINUTE_MS).collect();
    times.push(90 * MINUTE_MS);
    let clock = Arc::new(ScriptedClock::new(times).unwrap());
    let recorder = RollingStatsRecorder::new(clock, Duration::from_secs(60 * 60));

    for _ in 0..60 {
        recorder.update_mempool_limiter_bytes_saved(1000);
    }
    // Samples from minutes 30..60 are still inside the window
    let res = recorder.mempool_limiter_bytes_saved_to_string();
    assert_eq!(res, "Thin block mempool limiting has saved 30.00KB of bandwidth (last 1hr)");
    assert_eq!(recorder.aggregate(MetricKind::MempoolLimiterBytesSaved).samples, 30);

    // Lifetime totals do not expire
    assert_eq!(recorder.lifetime().mempool_limiter_bytes_saved, 60_000);
}

#[test]
fn compression_reflects_only_retained_samples() {
    let clock = Arc::new(ScriptedClock::new(vec![0, 0, 2 * MINUTE_MS, 2 * MINUTE_MS]).unwrap());
    let recorder = RollingStatsRecorder::new(clock, Duration::from_secs(60));

    // Old block saved nothing, the new one saved 90%
    recorder.update_inbound(1000, 1000);
    recorder.update_inbound(0, 0);
    recorder.update_inbound(100, 1000);
    assert_eq!(
        recorder.inbound_percent_to_string(),
        "Compression for 1 inbound thin blocks (last 1min): 90.0%"
    );
}

#[test]
fn late_sample_from_a_slow_peer_still_expires() {
    // The second update observes an older time than the first
    let clock = Arc::new(ScriptedClock::new(vec![200, 100, 250]).unwrap());
    let recorder = RollingStatsRecorder::new(clock, Duration::from_millis(100));

    recorder.update_inbound_bloom_filter(7);
    recorder.update_inbound_bloom_filter(1000);

    let aggregate = recorder.aggregate(MetricKind::InboundBloomFilter);
    assert_eq!(aggregate, Aggregate { value: 7.0, samples: 1 });
}

#[test]
fn lifetime_summary_line() {
    let recorder = minutes_recorder();
    recorder.update_inbound(1_000, 1_000_000);
    recorder.update_inbound(2_000, 1_000_000);
    recorder.update_outbound(500, 500_000);
    recorder.update_inbound_bloom_filter(300);
    recorder.update_outbound_bloom_filter(200);

    assert_eq!(
        recorder.summary_line(),
        "2 inbound and 1 outbound thin blocks have saved 2.50MB of bandwidth"
    );
    let lifetime = recorder.lifetime();
    assert_eq!(lifetime.bloom_filter_bytes, 500);
    assert_eq!(lifetime.bandwidth_saved(), 2_496_500);

    let stats = recorder.quick_stats();
    assert_eq!(stats.total_inbound, 2);
    assert_eq!(stats.total_outbound, 1);
    assert_eq!(stats.total_bandwidth_savings, 2_496_500);
    assert_eq!(stats.window_inbound, 2);
    assert_eq!(stats.window_outbound, 1);
    assert!((stats.window_inbound_compression - 99.85).abs() < 1e-9);
    assert!((stats.window_outbound_compression - 99.9).abs() < 1e-9);
}

#[test]
fn bandwidth_saved_never_underflows() {
    let recorder = minutes_recorder();
    recorder.update_inbound(2_000, 1_000);
    assert_eq!(recorder.lifetime().bandwidth_saved(), 0);
    assert!(recorder.summary_line().ends_with("0.00B of bandwidth"));
}

#[test]
fn clear_drops_samples_and_totals() {
    let recorder = minutes_recorder();
    recorder.update_inbound(10, 30);
    recorder.update_mempool_limiter_bytes_saved(1000);
    recorder.clear();
    assert_eq!(recorder.lifetime(), LifetimeStats::default());
    assert_eq!(recorder.aggregate(MetricKind::InboundSizeSaved), Aggregate::default());
}

#[test]
fn summaries_match_individual_strings() -> anyhow::Result<()> {
    let recorder = minutes_recorder();
    recorder.update_inbound(1, 3);
    recorder.update_re_requested_tx(2);
    let summary = recorder.summaries();
    assert_eq!(summary.inbound_percent, recorder.inbound_percent_to_string());
    assert_eq!(summary.re_requested_tx, recorder.re_requested_tx_to_string());

    let json = serde_json::to_value(&summary)?;
    assert_eq!(json["summary"], recorder.summary_line());
    Ok(())
}

#[test]
fn report_contains_every_metric() {
    let recorder = minutes_recorder();
    for i in 0..100 {
        recorder.update_inbound(i, 3 * i);
        recorder.update_inbound_bloom_filter(1000 * i);
        recorder.update_mempool_limiter_bytes_saved(1000 * i);
    }
    let report = recorder.report();
    assert!(report.starts_with("100 inbound and 0 outbound thin blocks"), "report is {report}");
    assert!(report.contains("66.7%"));
    assert!(report.contains("49.50KB"));
    assert!(report.contains("4.95MB"));
    assert!(report.contains("Response time"));
}

#[test]
fn every_update_reads_the_clock_once() {
    let mut clock = MockClock::new();
    clock.expect_now_ms().times(3).returning(|| 5_000);
    let recorder = RollingStatsRecorder::new(Arc::new(clock), DEFAULT_STATS_WINDOW);

    recorder.update_inbound(1, 2);
    recorder.update_outbound_bloom_filter(100);
    assert_eq!(recorder.aggregate(MetricKind::InboundSizeSaved).samples, 1);
}

#[test]
fn concurrent_updates_across_channels() {
    let clock = Arc::new(ScriptedClock::new(vec![0]).unwrap());
    let recorder = Arc::new(RollingStatsRecorder::new(clock, DEFAULT_STATS_WINDOW));

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let recorder = recorder.clone();
            scope.spawn(move || {
                for _ in 0..250 {
                    recorder.update_inbound(1, 4);
                    recorder.update_re_requested_tx(1);
                    recorder.update_mempool_limiter_bytes_saved(10);
                }
            });
        }
    });

    assert_eq!(recorder.aggregate(MetricKind::InboundSizeSaved).samples, 1000);
    assert_eq!(recorder.aggregate(MetricKind::ReRequestedTx).value, 1000.0);
    assert_eq!(recorder.aggregate(MetricKind::MempoolLimiterBytesSaved).value, 10_000.0);
    assert_eq!(recorder.lifetime().inbound_blocks, 1000);
    assert!(recorder.inbound_percent_to_string().contains("75.0%"));
}
