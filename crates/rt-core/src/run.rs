//! The run summary entity.

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// An immutable summary of one recorded run.
///
/// Built once by [`summarize`](crate::summarize); every build carries a
/// fresh [`Uuid`], so two summaries of the same activity are still
/// distinguishable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    /// Opaque identity, generated at build time.
    pub id: Uuid,
    /// When the run started.
    pub start_time: DateTime<Utc>,
    /// Active duration.
    #[serde(serialize_with = "duration_seconds")]
    pub duration: Duration,
    /// Distance covered, in kilometers.
    pub distance_km: f64,
    /// Average heart rate, in beats per minute (0 when unknown).
    pub average_heart_rate: u8,
    /// Time per kilometer; zero when the distance is zero.
    #[serde(serialize_with = "duration_seconds")]
    pub average_pace: Duration,
}

/// Serializes a duration as fractional seconds.
#[expect(
    clippy::cast_precision_loss,
    reason = "run durations are far below f64 precision limits"
)]
fn duration_seconds<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.num_milliseconds() as f64 / 1000.0)
}
