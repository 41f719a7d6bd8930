// 2022-2025 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::time::Duration;

const BYTE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
const UNIT_STEP: f64 = 1000.0;

/// Formats a byte count with a decimal unit and two digits after the point,
/// e.g. `49.50KB`.
pub fn format_bytes(value: f64) -> String {
    let mut value = value;
    let mut unit = 0;
    while value.abs() > UNIT_STEP && unit < BYTE_UNITS.len() - 1 {
        value /= UNIT_STEP;
        unit += 1;
    }
    format!("{value:.2}{}", BYTE_UNITS[unit])
}

/// Formats a ratio in `0..=1` as a percentage with one decimal, e.g. `66.7%`.
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

pub fn format_seconds(seconds: f64) -> String {
    format!("{seconds:.2}sec")
}

/// Human readable window label: `last 24hrs`, `last 1hr`, `last 90mins`.
pub fn format_window(window: Duration) -> String {
    let secs = window.as_secs();
    if secs == 0 || window.subsec_millis() != 0 {
        return format!("last {}ms", telemetry_utils::duration_millis(window));
    }
    let (amount, unit) = if secs >= 3600 && secs % 3600 == 0 {
        (secs / 3600, "hr")
    } else if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "min")
    } else {
        (secs, "sec")
    };
    let plural = if amount == 1 { "" } else { "s" };
    format!("last {amount}{unit}{plural}")
}

/// How an aggregate of a channel is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presentation {
    Percent,
    ByteSize,
    Seconds,
    Count,
}

impl Presentation {
    pub fn render(self, value: f64) -> String {
        match self {
            Presentation::Percent => format_percent(value),
            Presentation::ByteSize => format_bytes(value),
            Presentation::Seconds => format_seconds(value),
            Presentation::Count => format!("{value:.0}"),
        }
    }
}
