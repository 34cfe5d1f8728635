//! Flow state detection.
//!
//! Four boolean indicators are evaluated against a snapshot and the user is
//! considered in flow when at least three hold. The indicator cutoffs and
//! the quorum are policy, not measurement; tune them through the constants
//! below or a custom [`FlowCriteria`].

use serde::{Deserialize, Serialize};

use crate::signal::SignalSnapshot;

/// Focus must have run strictly longer than this many minutes.
pub const MIN_FOCUS_MINUTES: f64 = 25.0;

/// Lower edge (inclusive) of the productive-tension cognitive load band.
pub const LOAD_BAND_LOW: f64 = 0.6;

/// Upper edge (inclusive) of the productive-tension cognitive load band.
pub const LOAD_BAND_HIGH: f64 = 0.8;

/// Recent interruptions must be strictly fewer than this.
pub const MAX_INTERRUPTIONS: u32 = 2;

/// Productivity must be strictly above this.
pub const MIN_PRODUCTIVITY: f64 = 0.8;

/// Number of indicators that must hold.
pub const FLOW_QUORUM: usize = 3;

/// Cutoffs used by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowCriteria {
    pub min_focus_minutes: f64,
    pub load_band_low: f64,
    pub load_band_high: f64,
    pub max_interruptions: u32,
    pub min_productivity: f64,
    pub quorum: usize,
}

impl Default for FlowCriteria {
    fn default() -> Self {
        Self {
            min_focus_minutes: MIN_FOCUS_MINUTES,
            load_band_low: LOAD_BAND_LOW,
            load_band_high: LOAD_BAND_HIGH,
            max_interruptions: MAX_INTERRUPTIONS,
            min_productivity: MIN_PRODUCTIVITY,
            quorum: FLOW_QUORUM,
        }
    }
}

/// Individual indicator results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlowIndicators {
    pub sustained_focus: bool,
    pub productive_tension: bool,
    pub few_interruptions: bool,
    pub high_productivity: bool,
}

impl FlowIndicators {
    pub fn count(&self) -> usize {
        [
            self.sustained_focus,
            self.productive_tension,
            self.few_interruptions,
            self.high_productivity,
        ]
        .iter()
        .filter(|held| **held)
        .count()
    }
}

/// Stateless flow classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowDetector {
    criteria: FlowCriteria,
}

impl FlowDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_criteria(criteria: FlowCriteria) -> Self {
        Self { criteria }
    }

    pub fn criteria(&self) -> &FlowCriteria {
        &self.criteria
    }

    /// Evaluate each indicator.
    pub fn indicators(&self, snapshot: &SignalSnapshot) -> FlowIndicators {
        let c = &self.criteria;
        let load = snapshot.cognitive_load();

        FlowIndicators {
            sustained_focus: snapshot.focus_duration_minutes() > c.min_focus_minutes,
            productive_tension: load >= c.load_band_low && load <= c.load_band_high,
            few_interruptions: snapshot.interruption_count_recent() < c.max_interruptions,
            high_productivity: snapshot.productivity_score() > c.min_productivity,
        }
    }

    /// True iff at least `quorum` indicators hold.
    pub fn is_in_flow(&self, snapshot: &SignalSnapshot) -> bool {
        let indicators = self.indicators(snapshot);
        let in_flow = indicators.count() >= self.criteria.quorum;
        tracing::debug!(
            user_id = %snapshot.user_id(),
            held = indicators.count(),
            in_flow,
            "flow indicators evaluated"
        );
        in_flow
    }
}
