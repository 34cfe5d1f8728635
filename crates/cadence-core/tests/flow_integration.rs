//! Integration tests for flow detection and flow protection.
//!
//! Covers every combination of the four flow indicators and the precedence
//! of flow protection over the interval check.

use cadence_core::{
    find_pack, FlowDetector, GateReason, InterventionGate, InterventionHistoryEntry,
    SignalReadings, SignalSnapshot,
};
use chrono::{Duration, TimeZone, Utc};

fn readings(focus: bool, tension: bool, calm: bool, productive: bool) -> SignalReadings {
    SignalReadings {
        focus_duration_minutes: if focus { 40.0 } else { 10.0 },
        cognitive_load: if tension { 0.7 } else { 0.3 },
        interruption_count_recent: if calm { 1 } else { 4 },
        productivity_score: if productive { 0.9 } else { 0.5 },
    }
}

#[test]
fn test_all_sixteen_indicator_combinations() {
    let detector = FlowDetector::new();
    let when = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();

    for mask in 0u8..16 {
        let bits = [mask & 1 != 0, mask & 2 != 0, mask & 4 != 0, mask & 8 != 0];
        let snapshot = SignalSnapshot::at_utc(
            "u1",
            "developer",
            readings(bits[0], bits[1], bits[2], bits[3]),
            when,
        );

        let held = bits.iter().filter(|b| **b).count();
        let indicators = detector.indicators(&snapshot);
        assert_eq!(indicators.count(), held, "mask {mask:04b}");
        assert_eq!(
            detector.is_in_flow(&snapshot),
            held >= 3,
            "mask {mask:04b} with {held} indicators"
        );
    }
}

#[test]
fn test_flow_protection_ignores_interval_length() {
    let gate = InterventionGate::new();
    let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();

    // Shrink every interval to one minute; protection window stays 60.
    let mut profile = find_pack("analyst").unwrap().profile;
    profile.base_interval_minutes.morning = 1.0;

    let snapshot = SignalSnapshot::at_utc("u1", "analyst", readings(true, true, true, true), now);
    let mut history = InterventionHistoryEntry {
        last_intervention_time: Some(now - Duration::minutes(59)),
        flow_state_active: false,
    };

    let verdict = gate.check(&snapshot, &profile, &mut history).unwrap();
    assert!(!verdict.permitted);
    assert_eq!(verdict.reason, GateReason::FlowProtected);

    history.last_intervention_time = Some(now - Duration::minutes(60));
    assert!(gate.may_intervene("u1", &snapshot, &profile, &mut history));
}

#[test]
fn test_flow_without_prior_intervention_is_permitted() {
    let gate = InterventionGate::new();
    let now = Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap();
    let profile = find_pack("designer").unwrap().profile;
    let snapshot = SignalSnapshot::at_utc("u1", "designer", readings(true, true, true, true), now);

    let mut history = InterventionHistoryEntry::default();
    let verdict = gate.check(&snapshot, &profile, &mut history).unwrap();

    assert!(verdict.permitted);
    assert!(verdict.in_flow);
    assert!(history.flow_state_active);
}
