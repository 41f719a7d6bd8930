// 2022-2025 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use super::channel::Aggregation;
use super::format::Presentation;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Statistics tracked by the recorder, one rolling channel each.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricKind {
    InboundSizeSaved,
    OutboundSizeSaved,
    InboundBloomFilter,
    OutboundBloomFilter,
    ResponseTime,
    ValidationTime,
    ReRequestedTx,
    MempoolLimiterBytesSaved,
}

impl MetricKind {
    pub const COUNT: usize = 8;

    pub const ALL: [MetricKind; MetricKind::COUNT] = [
        MetricKind::InboundSizeSaved,
        MetricKind::OutboundSizeSaved,
        MetricKind::InboundBloomFilter,
        MetricKind::OutboundBloomFilter,
        MetricKind::ResponseTime,
        MetricKind::ValidationTime,
        MetricKind::ReRequestedTx,
        MetricKind::MempoolLimiterBytesSaved,
    ];

    pub fn aggregation(self) -> Aggregation {
        match self {
            MetricKind::InboundSizeSaved | MetricKind::OutboundSizeSaved => Aggregation::RatioSaved,
            MetricKind::InboundBloomFilter
            | MetricKind::OutboundBloomFilter
            | MetricKind::ResponseTime
            | MetricKind::ValidationTime => Aggregation::Average,
            MetricKind::ReRequestedTx => Aggregation::Count,
            MetricKind::MempoolLimiterBytesSaved => Aggregation::Sum,
        }
    }

    pub fn presentation(self) -> Presentation {
        match self {
            MetricKind::InboundSizeSaved | MetricKind::OutboundSizeSaved => Presentation::Percent,
            MetricKind::InboundBloomFilter
            | MetricKind::OutboundBloomFilter
            | MetricKind::MempoolLimiterBytesSaved => Presentation::ByteSize,
            MetricKind::ResponseTime | MetricKind::ValidationTime => Presentation::Seconds,
            MetricKind::ReRequestedTx => Presentation::Count,
        }
    }

    pub(super) fn index(self) -> usize {
        self as usize
    }
}
