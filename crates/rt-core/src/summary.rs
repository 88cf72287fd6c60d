//! Builds a [`Run`] from accumulated aggregator state.
//!
//! Each output field resolves independently through a fallback chain:
//! fine-grained record statistics are preferred over the session totals,
//! with zero as the last resort. Missing data therefore degrades the
//! summary field by field instead of failing the whole build.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::aggregator::RunAggregator;
use crate::message::SessionMessage;
use crate::run::Run;

/// Summarizes the aggregated activity, or returns `None` when the stream
/// never produced both a session and an activity message.
///
/// The absence result is a legitimate outcome for a structurally valid
/// file, not an error: a device can power off before a session is written.
/// When neither message carries a start time the current wall-clock time
/// is used; see [`summarize_at`] to pin that fallback.
#[must_use]
pub fn summarize(aggregator: &RunAggregator) -> Option<Run> {
    summarize_at(aggregator, Utc::now())
}

/// Like [`summarize`], with an explicit substitute for the start-time
/// fallback instead of the current wall-clock time.
#[must_use]
pub fn summarize_at(aggregator: &RunAggregator, now: DateTime<Utc>) -> Option<Run> {
    let session = aggregator.session()?;
    let activity = aggregator.activity()?;

    let distance_km = resolve_distance_km(aggregator, session);
    let duration_s = session.total_timer_time_s.unwrap_or(0.0);
    let start_time = activity.timestamp.or(session.start_time).unwrap_or(now);

    let average_pace = if distance_km > 0.0 {
        duration_from_seconds(duration_s / distance_km)
    } else {
        Duration::zero()
    };

    Some(Run {
        id: Uuid::new_v4(),
        start_time,
        duration: duration_from_seconds(duration_s),
        distance_km,
        average_heart_rate: resolve_average_heart_rate(aggregator, session),
        average_pace,
    })
}

/// Record-derived distance when any sample produced one, session total
/// otherwise, zero as the last resort.
fn resolve_distance_km(aggregator: &RunAggregator, session: &SessionMessage) -> f64 {
    if aggregator.final_distance_m() > 0.0 {
        return aggregator.final_distance_m() / 1000.0;
    }
    session.total_distance_m.unwrap_or(0.0) / 1000.0
}

/// Record-derived mean truncated to whole beats per minute, session
/// average otherwise, zero as the last resort.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "a mean of u8 readings is always within 0..=255"
)]
fn resolve_average_heart_rate(aggregator: &RunAggregator, session: &SessionMessage) -> u8 {
    let computed = aggregator.average_heart_rate();
    if computed > 0.0 {
        return computed as u8;
    }
    session.avg_heart_rate.unwrap_or(0)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "durations here are bounded by u32 seconds from the wire"
)]
fn duration_from_seconds(seconds: f64) -> Duration {
    Duration::milliseconds((seconds * 1000.0).round() as i64)
}
