//! Per-decision view of a user's behavioral and cognitive state.
//!
//! Snapshots are produced by the host from already-computed telemetry. The
//! core tolerates sloppy inputs: bounded fields are clamped into their
//! domain on construction and non-finite values collapse to the lower bound.

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Raw readings as supplied by the host, before clamping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalReadings {
    pub cognitive_load: f64,
    pub focus_duration_minutes: f64,
    pub interruption_count_recent: i64,
    pub productivity_score: f64,
}

impl Default for SignalReadings {
    fn default() -> Self {
        Self {
            cognitive_load: 0.5,
            focus_duration_minutes: 0.0,
            interruption_count_recent: 0,
            productivity_score: 0.5,
        }
    }
}

/// Wire shape of a snapshot; deserialization goes through the clamping
/// constructor.
#[derive(Debug, Clone, Deserialize)]
struct SnapshotInput {
    user_id: String,
    persona: String,
    #[serde(flatten)]
    readings: SignalReadings,
    timestamp: DateTime<FixedOffset>,
}

/// Immutable snapshot of a user's current state.
///
/// The timestamp keeps the user's UTC offset so day-part resolution uses
/// the user's local hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SnapshotInput")]
pub struct SignalSnapshot {
    user_id: String,
    persona: String,
    cognitive_load: f64,
    focus_duration_minutes: f64,
    interruption_count_recent: u32,
    productivity_score: f64,
    timestamp: DateTime<FixedOffset>,
}

impl SignalSnapshot {
    /// Build a snapshot, clamping every bounded reading.
    pub fn new(
        user_id: impl Into<String>,
        persona: impl Into<String>,
        readings: SignalReadings,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        let user_id = user_id.into();

        let cognitive_load = clamp_unit(readings.cognitive_load);
        let productivity_score = clamp_unit(readings.productivity_score);
        let focus_duration_minutes = clamp_non_negative(readings.focus_duration_minutes);
        let interruption_count_recent =
            readings.interruption_count_recent.clamp(0, u32::MAX as i64) as u32;

        if cognitive_load != readings.cognitive_load
            || productivity_score != readings.productivity_score
            || focus_duration_minutes != readings.focus_duration_minutes
            || interruption_count_recent as i64 != readings.interruption_count_recent
        {
            tracing::warn!(
                user_id = %user_id,
                raw = ?readings,
                "signal readings out of range, clamped"
            );
        }

        Self {
            user_id,
            persona: persona.into(),
            cognitive_load,
            focus_duration_minutes,
            interruption_count_recent,
            productivity_score,
            timestamp,
        }
    }

    /// Snapshot stamped with a UTC instant.
    pub fn at_utc(
        user_id: impl Into<String>,
        persona: impl Into<String>,
        readings: SignalReadings,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(user_id, persona, readings, timestamp.fixed_offset())
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// Cognitive load in [0, 1].
    pub fn cognitive_load(&self) -> f64 {
        self.cognitive_load
    }

    /// Continuous minutes on the current task, >= 0.
    pub fn focus_duration_minutes(&self) -> f64 {
        self.focus_duration_minutes
    }

    pub fn interruption_count_recent(&self) -> u32 {
        self.interruption_count_recent
    }

    /// Productivity score in [0, 1].
    pub fn productivity_score(&self) -> f64 {
        self.productivity_score
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    /// Local hour of day (0-23) at the user's offset.
    pub fn local_hour(&self) -> u32 {
        self.timestamp.hour()
    }

    pub fn observed_at_utc(&self) -> DateTime<Utc> {
        self.timestamp.with_timezone(&Utc)
    }
}

impl From<SnapshotInput> for SignalSnapshot {
    fn from(input: SnapshotInput) -> Self {
        SignalSnapshot::new(input.user_id, input.persona, input.readings, input.timestamp)
    }
}

/// Clamp into [0, 1]; NaN maps to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Clamp into [0, f64::MAX]; NaN and negative values map to 0.
pub fn clamp_non_negative(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, f64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn readings(load: f64, focus: f64, interruptions: i64, productivity: f64) -> SignalReadings {
        SignalReadings {
            cognitive_load: load,
            focus_duration_minutes: focus,
            interruption_count_recent: interruptions,
            productivity_score: productivity,
        }
    }

    #[test]
    fn out_of_range_readings_are_clamped() {
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let snap = SignalSnapshot::at_utc("u1", "manager", readings(1.7, -4.0, -3, -0.2), at);

        assert_eq!(snap.cognitive_load(), 1.0);
        assert_eq!(snap.focus_duration_minutes(), 0.0);
        assert_eq!(snap.interruption_count_recent(), 0);
        assert_eq!(snap.productivity_score(), 0.0);
    }

    #[test]
    fn nan_collapses_to_lower_bound() {
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let snap = SignalSnapshot::at_utc("u1", "manager", readings(f64::NAN, f64::NAN, 0, f64::NAN), at);

        assert_eq!(snap.cognitive_load(), 0.0);
        assert_eq!(snap.focus_duration_minutes(), 0.0);
        assert_eq!(snap.productivity_score(), 0.0);
    }

    #[test]
    fn in_range_readings_pass_through() {
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let snap = SignalSnapshot::at_utc("u1", "analyst", readings(0.7, 31.5, 1, 0.9), at);

        assert_eq!(snap.cognitive_load(), 0.7);
        assert_eq!(snap.focus_duration_minutes(), 31.5);
        assert_eq!(snap.interruption_count_recent(), 1);
        assert_eq!(snap.productivity_score(), 0.9);
    }

    #[test]
    fn local_hour_respects_offset() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let at = tokyo.with_ymd_and_hms(2026, 3, 2, 10, 30, 0).unwrap();
        let snap = SignalSnapshot::new("u1", "manager", SignalReadings::default(), at);

        assert_eq!(snap.local_hour(), 10);
        assert_eq!(snap.observed_at_utc().hour(), 1);
    }

    #[test]
    fn deserialization_goes_through_clamping() {
        let json = r#"{
            "user_id": "u9",
            "persona": "designer",
            "cognitive_load": 3.0,
            "focus_duration_minutes": 12.0,
            "interruption_count_recent": 4,
            "productivity_score": 0.6,
            "timestamp": "2026-03-02T14:00:00+01:00"
        }"#;
        let snap: SignalSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snap.cognitive_load(), 1.0);
        assert_eq!(snap.local_hour(), 14);
        assert_eq!(snap.persona(), "designer");
    }
}
