//! Typed activity messages decoded from a FIT file.

use chrono::{DateTime, Utc};

/// A single periodic telemetry sample.
///
/// Every field is optional: devices drop fields freely, and a sample with
/// no usable data is still a valid message.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecordMessage {
    /// When the sample was taken.
    pub timestamp: Option<DateTime<Utc>>,
    /// Cumulative distance since the start of the activity, in meters.
    pub distance_m: Option<f64>,
    /// Instantaneous heart rate, in beats per minute.
    pub heart_rate: Option<u8>,
}

/// Coarse per-activity totals, written once at the end of an activity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionMessage {
    /// When the session started.
    pub start_time: Option<DateTime<Utc>>,
    /// Active (timer) time, in seconds.
    pub total_timer_time_s: Option<f64>,
    /// Total distance covered, in meters.
    pub total_distance_m: Option<f64>,
    /// Average heart rate over the session, in beats per minute.
    pub avg_heart_rate: Option<u8>,
}

/// The activity marker carrying the authoritative start timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActivityMessage {
    /// Activity timestamp.
    pub timestamp: Option<DateTime<Utc>>,
}
