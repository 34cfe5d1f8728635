//! Built-in persona timing packs.
//!
//! `manager` and `analyst` carry field-tuned cadences. `developer` and
//! `designer` follow the same shape with intervals derived from their
//! per-persona nudge spacing.

use serde::{Deserialize, Serialize};

use super::types::{BaseIntervals, CognitiveLoadThresholds, FlowProtection, TimingProfile};

/// A persona pack: a timing profile plus a documented rationale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaPack {
    /// Persona key (e.g. "manager").
    pub id: String,
    pub name: String,
    pub description: String,
    pub rationale: String,
    pub profile: TimingProfile,
}

/// Returns all built-in persona packs.
pub fn builtin_packs() -> Vec<PersonaPack> {
    vec![manager_pack(), analyst_pack(), developer_pack(), designer_pack()]
}

/// Find a built-in pack by persona key.
pub fn find_pack(id: &str) -> Option<PersonaPack> {
    builtin_packs().into_iter().find(|p| p.id == id)
}

/// Built-in persona keys.
pub fn persona_ids() -> Vec<&'static str> {
    vec!["manager", "analyst", "developer", "designer"]
}

fn profile(
    intervals: (f64, f64, f64),
    thresholds: (f64, f64, f64),
    detection_threshold: f64,
    minimum_protection_minutes: f64,
) -> TimingProfile {
    TimingProfile {
        base_interval_minutes: BaseIntervals {
            morning: intervals.0,
            afternoon: intervals.1,
            evening: intervals.2,
        },
        cognitive_load_thresholds: CognitiveLoadThresholds {
            low: thresholds.0,
            medium: thresholds.1,
            high: thresholds.2,
        },
        flow_protection: FlowProtection {
            detection_threshold,
            minimum_protection_minutes,
            gradual_reentry: true,
        },
    }
}

// ============================================================================
// BUILT-IN PACKS
// ============================================================================

/// Manager
///
/// Meeting-heavy days with frequent "busy" dismissals.
fn manager_pack() -> PersonaPack {
    PersonaPack {
        id: "manager".to_string(),
        name: "Manager".to_string(),
        description: "Meeting-heavy schedules, consultative nudges".to_string(),
        rationale: indoc::indoc! {"
            Managers dismiss nudges as \"busy\" more than any other persona,
            so the afternoon interval is the tightest window and evenings
            back off to an hour.

            Flow protection holds for 45 minutes once deep work is detected.
        "}
        .to_string(),
        profile: profile((45.0, 35.0, 60.0), (0.3, 0.6, 0.8), 0.75, 45.0),
    }
}

/// Analyst
fn analyst_pack() -> PersonaPack {
    PersonaPack {
        id: "analyst".to_string(),
        name: "Analyst".to_string(),
        description: "Long data sessions, highest acceptance rate".to_string(),
        rationale: indoc::indoc! {"
            Analysts accept most nudges, so base intervals are shorter than
            the manager's. Their data work runs long, so flow protection is
            a full hour and the overload cutoff sits higher at 0.85.
        "}
        .to_string(),
        profile: profile((40.0, 30.0, 50.0), (0.35, 0.65, 0.85), 0.8, 60.0),
    }
}

/// Developer
fn developer_pack() -> PersonaPack {
    PersonaPack {
        id: "developer".to_string(),
        name: "Developer".to_string(),
        description: "Peak coding hours, strict flow protection".to_string(),
        rationale: indoc::indoc! {"
            Developers complain about frequency more than content. Intervals
            stay long during core hours and flow protection matches the
            analyst's hour.
        "}
        .to_string(),
        profile: profile((50.0, 45.0, 60.0), (0.35, 0.65, 0.85), 0.8, 60.0),
    }
}

/// Designer
fn designer_pack() -> PersonaPack {
    PersonaPack {
        id: "designer".to_string(),
        name: "Designer".to_string(),
        description: "Creative sessions, supportive nudges".to_string(),
        rationale: indoc::indoc! {"
            Designers respond well to nudges but lose momentum when pulled
            out of creative sessions, so intervals mirror the analyst's with
            the manager's protection window.
        "}
        .to_string(),
        profile: profile((40.0, 35.0, 50.0), (0.3, 0.6, 0.8), 0.75, 45.0),
    }
}
