//! Staff shift clock records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shift that is currently running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveShift {
    pub member_id: u64,
    pub started_at: DateTime<Utc>,
    /// `true` when started explicitly rather than by automation.
    pub manual: bool,
}

/// Result of ending a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSummary {
    pub member_id: u64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: i64,
    /// Human-readable duration, e.g. `1h 5m`.
    pub duration: String,
    pub reason: String,
}

/// Format seconds as `Xh Ym`. Seconds are shown only when the total is under a minute.
pub fn fmt_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (mins, secs) = (seconds / 60, seconds % 60);
    let (hrs, mins) = (mins / 60, mins % 60);

    let mut parts = Vec::new();
    if hrs > 0 {
        parts.push(format!("{}h", hrs));
    }
    if mins > 0 {
        parts.push(format!("{}m", mins));
    }
    if secs > 0 && parts.is_empty() {
        parts.push(format!("{}s", secs));
    }
    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}
