//! Intervention category selection.
//!
//! Thin boundary to the content layer: picks *what kind* of nudge, never
//! its text. Pure function of the snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::signal::SignalSnapshot;

/// Category of an intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterventionCategory {
    /// Relief from overload: breaks, narrowing scope.
    Focus,
    /// Re-engagement when productivity sags.
    Motivation,
    /// Work-habit suggestions when the user keeps getting pulled away.
    Habit,
    /// Light-touch check-in.
    Maintenance,
}

impl InterventionCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            InterventionCategory::Focus => "FOCUS",
            InterventionCategory::Motivation => "MOTIVATION",
            InterventionCategory::Habit => "HABIT",
            InterventionCategory::Maintenance => "MAINTENANCE",
        }
    }
}

impl fmt::Display for InterventionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispatch cutoffs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyThresholds {
    /// Cognitive load at or above this selects `Focus`.
    #[serde(default = "default_focus_load")]
    pub focus_load: f64,
    /// Productivity (the motivation proxy) below this selects `Motivation`.
    #[serde(default = "default_low_motivation")]
    pub low_motivation: f64,
    /// Recent interruptions at or above this select `Habit`.
    #[serde(default = "default_habit_interruptions")]
    pub habit_interruptions: u32,
}

fn default_focus_load() -> f64 {
    0.8
}
fn default_low_motivation() -> f64 {
    0.4
}
fn default_habit_interruptions() -> u32 {
    5
}

impl Default for StrategyThresholds {
    fn default() -> Self {
        Self {
            focus_load: default_focus_load(),
            low_motivation: default_low_motivation(),
            habit_interruptions: default_habit_interruptions(),
        }
    }
}

/// Threshold dispatch, first match wins: overload, then low motivation,
/// then interruption habits, else maintenance.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategySelector {
    thresholds: StrategyThresholds,
}

impl StrategySelector {
    pub fn new(thresholds: StrategyThresholds) -> Self {
        Self { thresholds }
    }

    pub fn select_category(&self, snapshot: &SignalSnapshot) -> InterventionCategory {
        let t = &self.thresholds;
        if snapshot.cognitive_load() >= t.focus_load {
            InterventionCategory::Focus
        } else if snapshot.productivity_score() < t.low_motivation {
            InterventionCategory::Motivation
        } else if snapshot.interruption_count_recent() >= t.habit_interruptions {
            InterventionCategory::Habit
        } else {
            InterventionCategory::Maintenance
        }
    }
}
