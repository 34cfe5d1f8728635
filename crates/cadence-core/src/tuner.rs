//! Outcome-driven retuning of persona base intervals.
//!
//! Once a (persona, hour) bucket has enough samples, every further outcome
//! for it may rescale the persona's morning and afternoon intervals:
//! low acceptance backs off (x1.2), high acceptance speeds up (x0.9).
//! The adjustment compounds across outcomes, an exponential backoff in
//! effect, and every result is clamped into the configured interval bounds
//! so sustained extremes cannot drift toward zero or without limit.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigError;
use crate::outcome::PersonaTimingStats;
use crate::profile::{BaseIntervals, DayPart, IntervalBounds, ProfileRegistry, TimingProfile};

/// Tuner parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TunerConfig {
    /// Samples a bucket needs before it may trigger a retune.
    #[serde(default = "default_min_samples")]
    pub min_samples: u64,
    /// Acceptance strictly below this backs off.
    #[serde(default = "default_low_acceptance")]
    pub low_acceptance: f64,
    /// Acceptance strictly above this speeds up.
    #[serde(default = "default_high_acceptance")]
    pub high_acceptance: f64,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    #[serde(default = "default_speedup_factor")]
    pub speedup_factor: f64,
    /// Day-parts whose intervals are rescaled.
    #[serde(default = "default_adjusted_day_parts")]
    pub adjusted_day_parts: Vec<DayPart>,
}

fn default_min_samples() -> u64 {
    10
}
fn default_low_acceptance() -> f64 {
    0.3
}
fn default_high_acceptance() -> f64 {
    0.8
}
fn default_backoff_factor() -> f64 {
    1.2
}
fn default_speedup_factor() -> f64 {
    0.9
}
fn default_adjusted_day_parts() -> Vec<DayPart> {
    vec![DayPart::Morning, DayPart::Afternoon]
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            min_samples: default_min_samples(),
            low_acceptance: default_low_acceptance(),
            high_acceptance: default_high_acceptance(),
            backoff_factor: default_backoff_factor(),
            speedup_factor: default_speedup_factor(),
            adjusted_day_parts: default_adjusted_day_parts(),
        }
    }
}

impl TunerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: String| ConfigError::InvalidValue {
            key: format!("tuner.{key}"),
            message,
        };

        for (key, value) in [
            ("low_acceptance", self.low_acceptance),
            ("high_acceptance", self.high_acceptance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(key, format!("must be within [0, 1], got {value}")));
            }
        }
        if self.low_acceptance > self.high_acceptance {
            return Err(invalid(
                "low_acceptance",
                format!(
                    "must not exceed high_acceptance ({} > {})",
                    self.low_acceptance, self.high_acceptance
                ),
            ));
        }
        for (key, value) in [
            ("backoff_factor", self.backoff_factor),
            ("speedup_factor", self.speedup_factor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(key, format!("must be a positive number, got {value}")));
            }
        }
        for (i, part) in self.adjusted_day_parts.iter().enumerate() {
            if self.adjusted_day_parts[..i].contains(part) {
                return Err(invalid(
                    "adjusted_day_parts",
                    format!("'{part}' is listed more than once"),
                ));
            }
        }
        Ok(())
    }
}

/// Which way a retune moved the intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetuneDirection {
    /// Intervals grew: the persona is over-nudged.
    Backoff,
    /// Intervals shrank: the persona is receptive.
    Speedup,
}

/// Record of one applied retune.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationEvent {
    pub id: Uuid,
    pub persona: String,
    pub hour_of_day: u8,
    pub direction: RetuneDirection,
    pub acceptance_rate: f64,
    pub sample_count: u64,
    pub before: BaseIntervals,
    pub after: BaseIntervals,
    /// At least one interval hit a bound.
    pub clamped: bool,
    pub at: DateTime<Utc>,
}

/// Adaptive tuner.
#[derive(Debug, Clone)]
pub struct AdaptiveTuner {
    config: TunerConfig,
    bounds: IntervalBounds,
}

impl AdaptiveTuner {
    pub fn new(config: TunerConfig, bounds: IntervalBounds) -> Self {
        Self { config, bounds }
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    /// Direction implied by a bucket's statistics, if any.
    pub fn direction(&self, stats: &PersonaTimingStats) -> Option<RetuneDirection> {
        if stats.sample_count < self.config.min_samples {
            return None;
        }
        if stats.acceptance_rate < self.config.low_acceptance {
            Some(RetuneDirection::Backoff)
        } else if stats.acceptance_rate > self.config.high_acceptance {
            Some(RetuneDirection::Speedup)
        } else {
            None
        }
    }

    /// Apply a retune to a profile in place. Returns `None` when the stats
    /// call for no change or every adjusted interval is already pinned at
    /// its bound.
    pub fn retune_profile(
        &self,
        persona: &str,
        hour_of_day: u8,
        stats: &PersonaTimingStats,
        profile: &mut TimingProfile,
    ) -> Option<AdaptationEvent> {
        let direction = self.direction(stats)?;
        let factor = match direction {
            RetuneDirection::Backoff => self.config.backoff_factor,
            RetuneDirection::Speedup => self.config.speedup_factor,
        };

        let before = profile.base_interval_minutes;
        let mut clamped = false;
        for part in &self.config.adjusted_day_parts {
            let scaled = profile.base_interval_minutes.get(*part) * factor;
            let bounded = self.bounds.clamp(scaled);
            clamped |= bounded != scaled;
            profile.base_interval_minutes.set(*part, bounded);
        }
        let after = profile.base_interval_minutes;

        if after == before {
            tracing::debug!(
                persona = %persona,
                direction = ?direction,
                "intervals pinned at bound, retune skipped"
            );
            return None;
        }

        tracing::info!(
            persona = %persona,
            hour = hour_of_day,
            direction = ?direction,
            acceptance_rate = stats.acceptance_rate,
            morning = after.morning,
            afternoon = after.afternoon,
            clamped,
            "persona intervals retuned"
        );

        Some(AdaptationEvent {
            id: Uuid::new_v4(),
            persona: persona.to_string(),
            hour_of_day,
            direction,
            acceptance_rate: stats.acceptance_rate,
            sample_count: stats.sample_count,
            before,
            after,
            clamped,
            at: Utc::now(),
        })
    }

    /// Retune a registered persona under its write lock. Personas without
    /// their own profile are never retuned, so outcomes for unknown
    /// personas cannot move the default profile.
    pub fn maybe_retune(
        &self,
        registry: &ProfileRegistry,
        persona: &str,
        hour_of_day: u8,
        stats: &PersonaTimingStats,
    ) -> Option<AdaptationEvent> {
        self.direction(stats)?;
        let Some(profile) = registry.get(persona) else {
            tracing::debug!(persona = %persona, "no profile registered, retune skipped");
            return None;
        };
        let mut guard = profile.write();
        self.retune_profile(persona, hour_of_day, stats, &mut guard)
    }
}

/// Bounded log of applied retunes, oldest first.
#[derive(Debug)]
pub struct AdaptationLog {
    events: Mutex<VecDeque<AdaptationEvent>>,
    capacity: usize,
}

impl AdaptationLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    pub fn push(&self, event: AdaptationEvent) {
        if self.capacity == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    pub fn events(&self) -> Vec<AdaptationEvent> {
        self.events.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
