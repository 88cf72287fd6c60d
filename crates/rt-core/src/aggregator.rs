//! Single-pass reduction of an activity message stream.
//!
//! The decoder does not guarantee chronological delivery, so the aggregator
//! resolves distance by sample timestamp rather than by arrival order, and
//! keeps only running statistics instead of buffering the stream.

use chrono::{DateTime, Utc};

use crate::message::{ActivityMessage, RecordMessage, SessionMessage};

/// Consumer of decoded activity messages.
///
/// Implementations receive messages in file order, one call per message,
/// from a single caller. `on_complete` is invoked exactly once, strictly
/// after all other callbacks, and only when decoding succeeded.
pub trait MessageVisitor {
    fn visit_record(&mut self, record: RecordMessage);

    fn visit_session(&mut self, session: SessionMessage);

    fn visit_activity(&mut self, activity: ActivityMessage);

    fn on_complete(&mut self);
}

/// Accumulates the minimal state needed to summarize one activity.
///
/// One aggregator serves exactly one decode pass; create a fresh instance
/// per file.
#[derive(Debug, Default)]
pub struct RunAggregator {
    session: Option<SessionMessage>,
    activity: Option<ActivityMessage>,
    final_distance_m: f64,
    last_record_timestamp: Option<DateTime<Utc>>,
    heart_rate_sum: u64,
    heart_rate_count: u64,
}

impl RunAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently received session message, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&SessionMessage> {
        self.session.as_ref()
    }

    /// The most recently received activity message, if any.
    #[must_use]
    pub const fn activity(&self) -> Option<&ActivityMessage> {
        self.activity.as_ref()
    }

    /// Mean of the heart-rate readings seen so far, or 0 with no readings.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "heart-rate sums stay far below f64 precision limits"
    )]
    pub fn average_heart_rate(&self) -> f64 {
        if self.heart_rate_count == 0 {
            return 0.0;
        }
        self.heart_rate_sum as f64 / self.heart_rate_count as f64
    }

    /// Distance of the latest-by-timestamp sample, in meters (0 if none).
    #[must_use]
    pub const fn final_distance_m(&self) -> f64 {
        self.final_distance_m
    }
}

impl MessageVisitor for RunAggregator {
    /// Folds one sample into the running statistics.
    ///
    /// Distance is retained only from samples that carry both a timestamp
    /// and a distance, and only when the timestamp is strictly newer than
    /// the one already retained; ties and older samples are ignored no
    /// matter when they arrive. Heart-rate readings always count once,
    /// with or without a timestamp.
    fn visit_record(&mut self, record: RecordMessage) {
        if let (Some(timestamp), Some(distance)) = (record.timestamp, record.distance_m) {
            let newer = self
                .last_record_timestamp
                .is_none_or(|last| timestamp > last);
            if newer {
                self.final_distance_m = distance;
                self.last_record_timestamp = Some(timestamp);
            }
        }

        if let Some(heart_rate) = record.heart_rate {
            self.heart_rate_sum += u64::from(heart_rate);
            self.heart_rate_count += 1;
        }
    }

    /// Stores the session message; a repeated session overwrites the
    /// previous one (last received wins).
    fn visit_session(&mut self, session: SessionMessage) {
        if self.session.is_some() {
            tracing::debug!("replacing previously received session message");
        }
        self.session = Some(session);
    }

    /// Stores the activity message; a repeated activity overwrites the
    /// previous one (last received wins).
    fn visit_activity(&mut self, activity: ActivityMessage) {
        if self.activity.is_some() {
            tracing::debug!("replacing previously received activity message");
        }
        self.activity = Some(activity);
    }

    /// Completion hook. No validation is performed at end of stream yet.
    fn on_complete(&mut self) {}
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ts(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).single().expect("valid timestamp")
    }

    fn record_with_heart_rate(heart_rate: Option<u8>) -> RecordMessage {
        RecordMessage {
            heart_rate,
            ..RecordMessage::default()
        }
    }

    fn record_at(distance_m: f64, timestamp: Option<DateTime<Utc>>) -> RecordMessage {
        RecordMessage {
            timestamp,
            distance_m: Some(distance_m),
            heart_rate: None,
        }
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "defaults are exact zeros")]
    fn new_aggregator_starts_empty() {
        let agg = RunAggregator::new();

        assert!(agg.session().is_none());
        assert!(agg.activity().is_none());
        assert_eq!(agg.average_heart_rate(), 0.0);
        assert_eq!(agg.final_distance_m(), 0.0);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "mean of integers is exact here")]
    fn heart_rate_average_over_all_readings() {
        let mut agg = RunAggregator::new();
        agg.visit_record(record_with_heart_rate(Some(120)));
        agg.visit_record(record_with_heart_rate(Some(140)));
        agg.visit_record(record_with_heart_rate(Some(130)));

        assert_eq!(agg.average_heart_rate(), 130.0);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "mean of integers is exact here")]
    fn heart_rate_average_skips_absent_readings() {
        let mut agg = RunAggregator::new();
        agg.visit_record(record_with_heart_rate(Some(120)));
        agg.visit_record(record_with_heart_rate(None));
        agg.visit_record(record_with_heart_rate(Some(140)));

        // The absent reading contributes to neither sum nor count.
        assert_eq!(agg.average_heart_rate(), 130.0);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "zero sentinel is exact")]
    fn heart_rate_average_zero_without_readings() {
        let mut agg = RunAggregator::new();
        agg.visit_record(record_with_heart_rate(None));

        assert_eq!(agg.average_heart_rate(), 0.0);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "retained distances are copied verbatim")]
    fn distance_tracks_latest_timestamp() {
        let mut agg = RunAggregator::new();
        agg.visit_record(record_at(1500.0, Some(ts(1000))));
        agg.visit_record(record_at(3600.0, Some(ts(2000))));

        assert_eq!(agg.final_distance_m(), 3600.0);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "retained distances are copied verbatim")]
    fn distance_ignores_out_of_order_arrival() {
        let mut agg = RunAggregator::new();
        // Later sample delivered first; the earlier one must not win.
        agg.visit_record(record_at(3600.0, Some(ts(2000))));
        agg.visit_record(record_at(1500.0, Some(ts(1000))));

        assert_eq!(agg.final_distance_m(), 3600.0);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "retained distances are copied verbatim")]
    fn distance_ignores_timestamp_ties() {
        let mut agg = RunAggregator::new();
        agg.visit_record(record_at(3600.0, Some(ts(2000))));
        agg.visit_record(record_at(9999.0, Some(ts(2000))));

        assert_eq!(agg.final_distance_m(), 3600.0);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "zero sentinel is exact")]
    fn distance_requires_timestamp() {
        let mut agg = RunAggregator::new();
        agg.visit_record(record_at(1500.0, None));

        assert_eq!(agg.final_distance_m(), 0.0);
    }

    #[test]
    fn distance_only_sample_does_not_advance_timestamp() {
        let mut agg = RunAggregator::new();
        // A timestamped sample without distance must not block a later
        // sample carrying both fields.
        agg.visit_record(RecordMessage {
            timestamp: Some(ts(3000)),
            distance_m: None,
            heart_rate: None,
        });
        agg.visit_record(record_at(1500.0, Some(ts(1000))));

        #[expect(clippy::float_cmp, reason = "retained distances are copied verbatim")]
        {
            assert_eq!(agg.final_distance_m(), 1500.0);
        }
    }

    #[test]
    fn session_last_received_wins() {
        let mut agg = RunAggregator::new();
        agg.visit_session(SessionMessage {
            total_distance_m: Some(1000.0),
            ..SessionMessage::default()
        });
        agg.visit_session(SessionMessage {
            total_distance_m: Some(2000.0),
            ..SessionMessage::default()
        });

        let session = agg.session().expect("session retained");
        assert_eq!(session.total_distance_m, Some(2000.0));
    }

    #[test]
    fn activity_last_received_wins() {
        let mut agg = RunAggregator::new();
        agg.visit_activity(ActivityMessage {
            timestamp: Some(ts(100)),
        });
        agg.visit_activity(ActivityMessage {
            timestamp: Some(ts(200)),
        });

        let activity = agg.activity().expect("activity retained");
        assert_eq!(activity.timestamp, Some(ts(200)));
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "state must be byte-for-byte untouched")]
    fn on_complete_leaves_state_untouched() {
        let mut agg = RunAggregator::new();
        agg.visit_record(record_at(1500.0, Some(ts(1000))));
        agg.visit_record(record_with_heart_rate(Some(150)));

        agg.on_complete();

        assert_eq!(agg.final_distance_m(), 1500.0);
        assert_eq!(agg.average_heart_rate(), 150.0);
    }
}
