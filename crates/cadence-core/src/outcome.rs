//! Outcome tracking with O(1) streaming statistics.
//!
//! Each delivered intervention reports whether it was accepted and how
//! long the user took to respond. Statistics are bucketed by
//! (persona, hour of day) and updated as running means; the full history
//! is never replayed. A bounded window of recent records is kept for audit.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::OutcomeError;
use crate::signal::clamp_non_negative;

/// One delivered intervention's result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub user_id: String,
    pub persona: String,
    /// Local hour (0-23) at delivery.
    pub hour_of_day: u32,
    pub accepted: bool,
    pub response_time_seconds: f64,
    pub timestamp: DateTime<Utc>,
}

impl OutcomeRecord {
    /// Reject structurally invalid records.
    pub fn validate(&self) -> Result<(), OutcomeError> {
        if self.user_id.trim().is_empty() {
            return Err(OutcomeError::MissingUserId);
        }
        if self.persona.trim().is_empty() {
            return Err(OutcomeError::MissingPersona);
        }
        if self.hour_of_day > 23 {
            return Err(OutcomeError::InvalidHour {
                hour: self.hour_of_day,
            });
        }
        Ok(())
    }
}

/// Running statistics for one (persona, hour) bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonaTimingStats {
    pub sample_count: u64,
    /// Running mean of acceptance, in [0, 1].
    pub acceptance_rate: f64,
    /// Running mean of response latency, >= 0.
    pub avg_response_time_seconds: f64,
}

impl PersonaTimingStats {
    /// Fold one observation into the running means.
    pub fn update(&mut self, accepted: bool, response_time_seconds: f64) {
        let n = self.sample_count as f64;
        let next = n + 1.0;
        let hit = if accepted { 1.0 } else { 0.0 };

        self.acceptance_rate = (self.acceptance_rate * n + hit) / next;
        self.avg_response_time_seconds =
            (self.avg_response_time_seconds * n + response_time_seconds) / next;
        self.sample_count += 1;
    }
}

/// Bucket key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatsKey {
    pub persona: String,
    pub hour_of_day: u8,
}

/// A bucket with its key, for export and introspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsBucket {
    pub persona: String,
    pub hour_of_day: u8,
    #[serde(flatten)]
    pub stats: PersonaTimingStats,
}

/// Streaming outcome aggregator.
#[derive(Debug)]
pub struct OutcomeTracker {
    buckets: DashMap<StatsKey, PersonaTimingStats>,
    recent: Mutex<VecDeque<OutcomeRecord>>,
    window: usize,
}

impl Default for OutcomeTracker {
    fn default() -> Self {
        Self::new(256)
    }
}

impl OutcomeTracker {
    /// Tracker keeping the `window` most recent records for audit.
    pub fn new(window: usize) -> Self {
        Self {
            buckets: DashMap::new(),
            recent: Mutex::new(VecDeque::with_capacity(window.min(1024))),
            window,
        }
    }

    /// Record an outcome and return the bucket's updated statistics.
    ///
    /// A negative or NaN response time is clamped to zero.
    pub fn record(&self, outcome: &OutcomeRecord) -> Result<PersonaTimingStats, OutcomeError> {
        outcome.validate()?;
        let response_time = clamp_non_negative(outcome.response_time_seconds);

        let key = StatsKey {
            persona: outcome.persona.clone(),
            hour_of_day: outcome.hour_of_day as u8,
        };
        let updated = {
            let mut bucket = self.buckets.entry(key).or_default();
            bucket.update(outcome.accepted, response_time);
            *bucket
        };

        if self.window > 0 {
            let mut recent = self.recent.lock();
            if recent.len() == self.window {
                recent.pop_front();
            }
            let mut kept = outcome.clone();
            kept.response_time_seconds = response_time;
            recent.push_back(kept);
        }

        Ok(updated)
    }

    pub fn stats(&self, persona: &str, hour_of_day: u8) -> Option<PersonaTimingStats> {
        let key = StatsKey {
            persona: persona.to_string(),
            hour_of_day,
        };
        self.buckets.get(&key).map(|b| *b)
    }

    /// All buckets for a persona, sorted by hour.
    pub fn persona_stats(&self, persona: &str) -> Vec<StatsBucket> {
        let mut rows: Vec<StatsBucket> = self
            .buckets
            .iter()
            .filter(|entry| entry.key().persona == persona)
            .map(|entry| StatsBucket {
                persona: entry.key().persona.clone(),
                hour_of_day: entry.key().hour_of_day,
                stats: *entry.value(),
            })
            .collect();
        rows.sort_by_key(|row| row.hour_of_day);
        rows
    }

    /// Every bucket, sorted by (persona, hour).
    pub fn export(&self) -> Vec<StatsBucket> {
        let mut rows: Vec<StatsBucket> = self
            .buckets
            .iter()
            .map(|entry| StatsBucket {
                persona: entry.key().persona.clone(),
                hour_of_day: entry.key().hour_of_day,
                stats: *entry.value(),
            })
            .collect();
        rows.sort_by(|a, b| {
            (a.persona.as_str(), a.hour_of_day).cmp(&(b.persona.as_str(), b.hour_of_day))
        });
        rows
    }

    /// Replace buckets from an export. Buckets with an hour outside 0-23
    /// are skipped; rates are re-clamped.
    pub fn restore(&self, buckets: Vec<StatsBucket>) {
        self.buckets.clear();
        for bucket in buckets {
            if bucket.hour_of_day > 23 {
                tracing::warn!(
                    persona = %bucket.persona,
                    hour = bucket.hour_of_day,
                    "skipping stats bucket with invalid hour"
                );
                continue;
            }
            let mut stats = bucket.stats;
            stats.acceptance_rate = crate::signal::clamp_unit(stats.acceptance_rate);
            stats.avg_response_time_seconds = clamp_non_negative(stats.avg_response_time_seconds);
            self.buckets.insert(
                StatsKey {
                    persona: bucket.persona,
                    hour_of_day: bucket.hour_of_day,
                },
                stats,
            );
        }
    }

    /// Most recent records, oldest first.
    pub fn recent_outcomes(&self) -> Vec<OutcomeRecord> {
        self.recent.lock().iter().cloned().collect()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(persona: &str, hour: u32, accepted: bool, rt: f64) -> OutcomeRecord {
        OutcomeRecord {
            user_id: "u1".to_string(),
            persona: persona.to_string(),
            hour_of_day: hour,
            accepted,
            response_time_seconds: rt,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn running_means() {
        let tracker = OutcomeTracker::default();
        tracker.record(&outcome("analyst", 10, true, 10.0)).unwrap();
        tracker.record(&outcome("analyst", 10, false, 20.0)).unwrap();
        let stats = tracker.record(&outcome("analyst", 10, true, 30.0)).unwrap();

        assert_eq!(stats.sample_count, 3);
        assert!((stats.acceptance_rate - 2.0 / 3.0).abs() < 1e-12);
        assert!((stats.avg_response_time_seconds - 20.0).abs() < 1e-12);
    }

    #[test]
    fn buckets_are_lazy_and_separate() {
        let tracker = OutcomeTracker::default();
        assert!(tracker.stats("analyst", 10).is_none());

        tracker.record(&outcome("analyst", 10, true, 1.0)).unwrap();
        tracker.record(&outcome("analyst", 11, false, 1.0)).unwrap();
        tracker.record(&outcome("manager", 10, false, 1.0)).unwrap();

        assert_eq!(tracker.bucket_count(), 3);
        assert_eq!(tracker.stats("analyst", 10).unwrap().acceptance_rate, 1.0);
        assert_eq!(tracker.stats("manager", 10).unwrap().acceptance_rate, 0.0);
    }

    #[test]
    fn structural_errors() {
        let tracker = OutcomeTracker::default();

        let mut bad = outcome("analyst", 10, true, 1.0);
        bad.user_id = " ".to_string();
        assert_eq!(tracker.record(&bad), Err(OutcomeError::MissingUserId));

        let bad = outcome("", 10, true, 1.0);
        assert_eq!(tracker.record(&bad), Err(OutcomeError::MissingPersona));

        let bad = outcome("analyst", 24, true, 1.0);
        assert_eq!(tracker.record(&bad), Err(OutcomeError::InvalidHour { hour: 24 }));

        assert_eq!(tracker.bucket_count(), 0);
    }

    #[test]
    fn negative_response_time_is_clamped() {
        let tracker = OutcomeTracker::default();
        let stats = tracker.record(&outcome("analyst", 10, true, -5.0)).unwrap();
        assert_eq!(stats.avg_response_time_seconds, 0.0);
        assert_eq!(tracker.recent_outcomes()[0].response_time_seconds, 0.0);
    }

    #[test]
    fn recent_window_is_bounded() {
        let tracker = OutcomeTracker::new(3);
        for hour in 0..5 {
            tracker.record(&outcome("analyst", hour, true, 1.0)).unwrap();
        }
        let hours: Vec<u32> = tracker.recent_outcomes().iter().map(|o| o.hour_of_day).collect();
        assert_eq!(hours, vec![2, 3, 4]);
    }

    #[test]
    fn zero_window_keeps_nothing() {
        let tracker = OutcomeTracker::new(0);
        tracker.record(&outcome("analyst", 9, true, 1.0)).unwrap();
        assert!(tracker.recent_outcomes().is_empty());
        assert_eq!(tracker.bucket_count(), 1);
    }

    #[test]
    fn export_restore_roundtrip() {
        let tracker = OutcomeTracker::default();
        tracker.record(&outcome("manager", 14, true, 3.0)).unwrap();
        tracker.record(&outcome("analyst", 9, false, 8.0)).unwrap();

        let exported = tracker.export();
        assert_eq!(exported[0].persona, "analyst");

        let restored = OutcomeTracker::default();
        restored.restore(exported.clone());
        assert_eq!(restored.export(), exported);
    }

    #[test]
    fn persona_stats_sorted_by_hour() {
        let tracker = OutcomeTracker::default();
        for hour in [15, 9, 11] {
            tracker.record(&outcome("designer", hour, true, 1.0)).unwrap();
        }
        let hours: Vec<u8> = tracker
            .persona_stats("designer")
            .iter()
            .map(|b| b.hour_of_day)
            .collect();
        assert_eq!(hours, vec![9, 11, 15]);
    }
}
