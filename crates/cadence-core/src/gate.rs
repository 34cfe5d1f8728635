//! Intervention gate: may a nudge fire for this user right now?
//!
//! ## Decision order
//!
//! 1. Resolve the day-part from the snapshot's local hour and take the
//!    persona's base interval for it.
//! 2. Stretch the interval by 1.5x at or above the high cognitive load
//!    threshold, shrink it to 0.8x at or below the low threshold.
//! 3. If the user is in flow and the last intervention is more recent than
//!    the persona's minimum protection window, deny. Flow protection wins
//!    over the interval check.
//! 4. If the last intervention is more recent than the adjusted interval,
//!    deny.
//! 5. Otherwise grant, and record the grant in the user's history.
//!
//! ## Commit-on-check
//!
//! A granted check *claims* the intervention slot: the history's
//! `last_intervention_time` moves to the snapshot's timestamp. A caller
//! that asks and then does not deliver suppresses its own next nudge. The
//! gate is not an idempotent query, and checks for the same user must be
//! serialized by the caller (the engine does this with a per-user lock).
//!
//! ## Fail-open
//!
//! An internal failure (a profile with a non-finite interval, unordered
//! thresholds, ...) permits the intervention and leaves history untouched.
//! A missed coaching opportunity costs more than a spurious one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GateError;
use crate::flow::FlowDetector;
use crate::profile::{DayPart, TimingProfile};
use crate::signal::SignalSnapshot;

/// Interval multiplier at or above the high cognitive load threshold.
pub const HIGH_LOAD_STRETCH: f64 = 1.5;

/// Interval multiplier at or below the low cognitive load threshold.
pub const LOW_LOAD_SHRINK: f64 = 0.8;

/// Per-user gate state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterventionHistoryEntry {
    /// When the last intervention was granted, if ever.
    pub last_intervention_time: Option<DateTime<Utc>>,
    /// Flow result recorded with the last grant.
    pub flow_state_active: bool,
}

/// Why the gate decided the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateReason {
    /// No previous intervention on record.
    FirstIntervention,
    /// The adjusted interval has passed.
    IntervalElapsed,
    /// Denied: user is in flow inside the protection window.
    FlowProtected,
    /// Denied: too soon since the last intervention.
    IntervalNotElapsed,
    /// Permitted because the check itself failed.
    FailOpen,
}

/// Outcome of a gate check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateVerdict {
    pub permitted: bool,
    pub reason: GateReason,
    pub day_part: DayPart,
    /// Interval after cognitive load adjustment; `None` on fail-open.
    pub adjusted_interval_minutes: Option<f64>,
    pub in_flow: bool,
}

/// Gate over a flow detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterventionGate {
    detector: FlowDetector,
}

impl InterventionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detector(detector: FlowDetector) -> Self {
        Self { detector }
    }

    pub fn detector(&self) -> &FlowDetector {
        &self.detector
    }

    /// Base interval for the day-part, adjusted for cognitive load.
    pub fn adjusted_interval(profile: &TimingProfile, day_part: DayPart, cognitive_load: f64) -> f64 {
        let base = profile.base_interval_minutes.get(day_part);
        let thresholds = &profile.cognitive_load_thresholds;

        if cognitive_load >= thresholds.high {
            base * HIGH_LOAD_STRETCH
        } else if cognitive_load <= thresholds.low {
            base * LOW_LOAD_SHRINK
        } else {
            base
        }
    }

    /// Run the gate. On a grant, `history` is updated to the snapshot's
    /// timestamp and flow result.
    pub fn check(
        &self,
        snapshot: &SignalSnapshot,
        profile: &TimingProfile,
        history: &mut InterventionHistoryEntry,
    ) -> Result<GateVerdict, GateError> {
        let day_part = DayPart::from_hour(snapshot.local_hour());
        profile.check_gate_inputs(snapshot.persona(), day_part)?;

        let interval = Self::adjusted_interval(profile, day_part, snapshot.cognitive_load());
        let in_flow = self.detector.is_in_flow(snapshot);
        let now = snapshot.observed_at_utc();

        // No previous intervention: both time checks pass.
        let elapsed_seconds = history
            .last_intervention_time
            .map(|last| (now - last).num_milliseconds() as f64 / 1000.0);

        let verdict = |permitted, reason| GateVerdict {
            permitted,
            reason,
            day_part,
            adjusted_interval_minutes: Some(interval),
            in_flow,
        };

        if let Some(elapsed) = elapsed_seconds {
            let protection_seconds = profile.flow_protection.minimum_protection_minutes * 60.0;
            if in_flow && elapsed < protection_seconds {
                return Ok(verdict(false, GateReason::FlowProtected));
            }
            if elapsed < interval * 60.0 {
                return Ok(verdict(false, GateReason::IntervalNotElapsed));
            }
        }

        history.last_intervention_time = Some(now);
        history.flow_state_active = in_flow;

        let reason = if elapsed_seconds.is_some() {
            GateReason::IntervalElapsed
        } else {
            GateReason::FirstIntervention
        };
        Ok(verdict(true, reason))
    }

    /// Fail-open wrapper around [`check`](Self::check).
    pub fn decide(
        &self,
        user_id: &str,
        snapshot: &SignalSnapshot,
        profile: &TimingProfile,
        history: &mut InterventionHistoryEntry,
    ) -> GateVerdict {
        match self.check(snapshot, profile, history) {
            Ok(verdict) => {
                if !verdict.permitted {
                    tracing::debug!(
                        user_id = %user_id,
                        reason = ?verdict.reason,
                        day_part = %verdict.day_part,
                        "intervention denied"
                    );
                }
                verdict
            }
            Err(err) => {
                tracing::error!(
                    user_id = %user_id,
                    persona = %snapshot.persona(),
                    error = %err,
                    "gate check failed, permitting intervention"
                );
                GateVerdict {
                    permitted: true,
                    reason: GateReason::FailOpen,
                    day_part: DayPart::from_hour(snapshot.local_hour()),
                    adjusted_interval_minutes: None,
                    in_flow: false,
                }
            }
        }
    }

    /// Boolean form of [`decide`](Self::decide). Mutates `history` on grant.
    pub fn may_intervene(
        &self,
        user_id: &str,
        snapshot: &SignalSnapshot,
        profile: &TimingProfile,
        history: &mut InterventionHistoryEntry,
    ) -> bool {
        self.decide(user_id, snapshot, profile, history).permitted
    }
}
