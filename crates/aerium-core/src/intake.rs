//! Intake normalization: raw deliveries → clean, ordered samples.
//!
//! Both intake paths funnel through here. The poll path returns a window
//! of records in whatever order the backend's storage produced them; the
//! push path delivers single messages for every room in the site. Either
//! way, the store only ever applies the newest sample per room, in
//! non-decreasing timestamp order.

use chrono::DateTime;

use aerium_api::PushMessage;

use crate::context::RoomContext;
use crate::model::Sample;

/// Sort a window batch by timestamp and drop duplicate timestamps.
///
/// The backend may return records ascending, descending, or interleaved
/// from several storage shards. First occurrence wins among duplicates.
pub fn normalize_batch(mut samples: Vec<Sample>) -> Vec<Sample> {
    samples.sort_by_key(|s| s.timestamp);
    samples.dedup_by_key(|s| s.timestamp);
    samples
}

/// The newest sample of a batch, if any.
pub fn latest_of_batch(samples: Vec<Sample>) -> Option<Sample> {
    normalize_batch(samples).pop()
}

/// Whether a push message is a measurement for the given room.
///
/// The push channel carries every room in the site; filtering happens
/// client-side by brand/room name match, exactly like the subscription
/// model of the backend.
pub fn measurement_matches(msg: &PushMessage, context: &RoomContext) -> bool {
    msg.topic == "measurement"
        && msg.brand.as_deref() == Some(context.brand.as_str())
        && msg.room.as_deref() == Some(context.room.as_str())
}

/// Decode a measurement push message into a [`Sample`].
///
/// Returns `None` when the envelope has no parseable timestamp — a
/// sample that can't be ordered can't be applied monotonically, so it is
/// treated as "no data" rather than guessed at.
pub fn sample_from_push(msg: &PushMessage) -> Option<Sample> {
    let timestamp = msg.timestamp.as_deref().and_then(parse_push_timestamp)?;

    let field = |name: &str| msg.data.get(name).and_then(serde_json::Value::as_f64);

    Some(Sample {
        timestamp,
        co2: field("co2").unwrap_or(f64::NAN),
        pm25: field("pm25").unwrap_or(f64::NAN),
        tvoc: field("tvoc").unwrap_or(f64::NAN),
        temperature: field("temperature").unwrap_or(f64::NAN),
        humidity: field("humidity").unwrap_or(f64::NAN),
        global_score: field("global_score"),
    })
}

/// Parse a push-envelope timestamp.
///
/// The backend stamps RFC 3339 with offset, but older versions emit naive
/// UTC (`2026-03-02T09:00:05.123456`) — accept both.
fn parse_push_timestamp(raw: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.to_utc());
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::sample::test_support::sample;
    use chrono::Duration;

    fn at(base: &Sample, offset_secs: i64, co2: f64) -> Sample {
        let mut s = base.clone();
        s.timestamp = base.timestamp + Duration::seconds(offset_secs);
        s.co2 = co2;
        s
    }

    #[test]
    fn normalize_sorts_and_dedupes() {
        let base = sample(400.0, 2.0, 100.0, 21.0, 50.0);
        let batch = vec![
            at(&base, 20, 430.0),
            at(&base, 0, 400.0),
            at(&base, 20, 999.0), // duplicate timestamp, later in the vec
            at(&base, 10, 410.0),
        ];

        let normalized = normalize_batch(batch);
        let co2s: Vec<f64> = normalized.iter().map(|s| s.co2).collect();
        // Ordered by time, first occurrence kept for the duplicate.
        assert_eq!(co2s, vec![400.0, 410.0, 430.0]);
    }

    #[test]
    fn latest_of_batch_picks_the_newest() {
        let base = sample(400.0, 2.0, 100.0, 21.0, 50.0);
        let batch = vec![at(&base, 30, 480.0), at(&base, 0, 400.0), at(&base, 10, 410.0)];
        assert_eq!(latest_of_batch(batch).unwrap().co2, 480.0);
        assert!(latest_of_batch(Vec::new()).is_none());
    }

    #[test]
    fn measurement_filter_requires_topic_and_scope() {
        let context = RoomContext::new("Maison", "Bureau");
        let msg: PushMessage = serde_json::from_value(serde_json::json!({
            "type": "measurement",
            "enseigne": "Maison",
            "salle": "Bureau",
            "timestamp": "2026-03-02T09:00:00Z",
            "values": { "co2": 900.0 }
        }))
        .unwrap();
        assert!(measurement_matches(&msg, &context));

        let other_room: PushMessage = serde_json::from_value(serde_json::json!({
            "type": "measurement",
            "enseigne": "Maison",
            "salle": "Chambre",
            "timestamp": "2026-03-02T09:00:00Z"
        }))
        .unwrap();
        assert!(!measurement_matches(&other_room, &context));

        let wrong_topic: PushMessage = serde_json::from_value(serde_json::json!({
            "type": "prediction",
            "enseigne": "Maison",
            "salle": "Bureau"
        }))
        .unwrap();
        assert!(!measurement_matches(&wrong_topic, &context));
    }

    #[test]
    fn push_sample_decodes_values_and_nans_the_rest() {
        let msg: PushMessage = serde_json::from_value(serde_json::json!({
            "type": "measurement",
            "enseigne": "Maison",
            "salle": "Bureau",
            "timestamp": "2026-03-02T09:00:05Z",
            "values": { "co2": 950.0, "humidity": 48.5 }
        }))
        .unwrap();

        let s = sample_from_push(&msg).unwrap();
        assert_eq!(s.co2, 950.0);
        assert_eq!(s.humidity, 48.5);
        assert!(s.pm25.is_nan());
        assert!(s.tvoc.is_nan());
    }

    #[test]
    fn naive_utc_timestamps_are_accepted() {
        let parsed = parse_push_timestamp("2026-03-02T09:00:05.123456").unwrap();
        assert_eq!(parsed.timestamp(), 1772442005);
        assert!(parse_push_timestamp("yesterday-ish").is_none());
    }

    #[test]
    fn push_sample_without_timestamp_is_no_data() {
        let msg: PushMessage = serde_json::from_value(serde_json::json!({
            "type": "measurement",
            "enseigne": "Maison",
            "salle": "Bureau",
            "values": { "co2": 950.0 }
        }))
        .unwrap();
        assert!(sample_from_push(&msg).is_none());
    }
}
