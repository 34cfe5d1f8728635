//! Seeded workday simulation.
//!
//! Drives a [`SchedulingEngine`] with synthetic users so the effect of the
//! gate and the tuner can be inspected without live telemetry. Each
//! simulated user has a hidden receptiveness; every tick produces a random
//! snapshot, and permitted interventions are accepted with a probability
//! derived from that receptiveness and the user's current state.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::engine::SchedulingEngine;
use crate::gate::GateReason;
use crate::outcome::OutcomeRecord;
use crate::profile::BaseIntervals;
use crate::signal::{SignalReadings, SignalSnapshot};

/// Longest tick accepted; larger values are clamped to one day.
const MAX_TICK_MINUTES: i64 = 24 * 60;

/// Simulation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulated workdays
    pub days: u32,

    /// Synthetic users per persona
    pub users_per_persona: usize,

    /// Minutes between snapshots
    pub tick_minutes: i64,

    /// First working hour (UTC)
    pub work_start_hour: u32,

    /// Hour at which the working day ends (exclusive)
    pub work_end_hour: u32,

    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            days: 5,
            users_per_persona: 3,
            tick_minutes: 15,
            work_start_hour: 8,
            work_end_hour: 18,
            seed: Some(42),
        }
    }
}

/// Per-persona summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaReport {
    pub offered: u64,
    pub accepted: u64,
    pub acceptance_rate: f64,
    pub final_intervals: BaseIntervals,
}

/// Simulation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub evaluations: u64,
    pub offered: u64,
    pub accepted: u64,
    pub acceptance_rate: f64,
    pub flow_protected: u64,
    pub retunes: u64,
    pub personas: BTreeMap<String, PersonaReport>,
}

struct SimulatedUser {
    id: String,
    persona: String,
    receptiveness: f64,
    focus_minutes: f64,
}

/// Workday simulator.
pub struct WorkdaySimulator {
    config: SimulationConfig,
}

impl WorkdaySimulator {
    pub fn new() -> Self {
        Self {
            config: SimulationConfig::default(),
        }
    }

    pub fn with_config(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Run the simulation against `engine` for the given personas.
    pub fn run(&self, engine: &SchedulingEngine, personas: &[String]) -> SimulationReport {
        let mut rng = match self.config.seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };

        let mut users: Vec<SimulatedUser> = personas
            .iter()
            .flat_map(|persona| {
                (0..self.config.users_per_persona).map(move |n| (persona.clone(), n))
            })
            .map(|(persona, n)| SimulatedUser {
                id: format!("sim-{persona}-{n}"),
                receptiveness: rng.gen_range(0.1..0.9),
                persona,
                focus_minutes: 0.0,
            })
            .collect();

        let mut report = SimulationReport {
            evaluations: 0,
            offered: 0,
            accepted: 0,
            acceptance_rate: 0.0,
            flow_protected: 0,
            retunes: 0,
            personas: BTreeMap::new(),
        };
        let mut per_persona: BTreeMap<String, (u64, u64)> = BTreeMap::new();

        let tick = Duration::minutes(self.config.tick_minutes.clamp(1, MAX_TICK_MINUTES));
        for day in 0..self.config.days {
            let (Some(day_start), Some(day_end)) = (
                Self::day_start(day, self.config.work_start_hour),
                Self::day_start(day, self.config.work_end_hour),
            ) else {
                tracing::warn!(day, "simulated calendar out of range, stopping early");
                break;
            };

            for user in users.iter_mut() {
                user.focus_minutes = 0.0;
            }

            let mut now = day_start;
            while now < day_end {
                for user in users.iter_mut() {
                    let snapshot = Self::next_snapshot(user, now, tick, &mut rng);
                    let decision = engine.evaluate(&user.id, &snapshot);
                    report.evaluations += 1;

                    if decision.reason == GateReason::FlowProtected {
                        report.flow_protected += 1;
                    }
                    if !decision.permitted {
                        continue;
                    }

                    let accepted = rng.gen_bool(Self::acceptance_probability(user, &snapshot));
                    let outcome = OutcomeRecord {
                        user_id: user.id.clone(),
                        persona: user.persona.clone(),
                        hour_of_day: snapshot.local_hour(),
                        accepted,
                        response_time_seconds: rng.gen_range(2.0..120.0),
                        timestamp: now,
                    };

                    let counts = per_persona.entry(user.persona.clone()).or_insert((0, 0));
                    counts.0 += 1;
                    report.offered += 1;
                    if accepted {
                        counts.1 += 1;
                        report.accepted += 1;
                        // a taken break resets the focus streak
                        user.focus_minutes = 0.0;
                    }

                    match engine.record_outcome(&outcome) {
                        Ok(Some(_)) => report.retunes += 1,
                        Ok(None) => {}
                        Err(err) => {
                            tracing::warn!(user_id = %user.id, error = %err, "simulated outcome rejected");
                        }
                    }
                }
                match now.checked_add_signed(tick) {
                    Some(next) => now = next,
                    None => break,
                }
            }
        }

        report.acceptance_rate = ratio(report.accepted, report.offered);
        report.personas = personas
            .iter()
            .map(|persona| {
                let (offered, accepted) = per_persona.get(persona).copied().unwrap_or((0, 0));
                (
                    persona.clone(),
                    PersonaReport {
                        offered,
                        accepted,
                        acceptance_rate: ratio(accepted, offered),
                        final_intervals: engine.get_timing_profile(persona).base_interval_minutes,
                    },
                )
            })
            .collect();

        tracing::info!(
            evaluations = report.evaluations,
            offered = report.offered,
            retunes = report.retunes,
            "simulation finished"
        );
        report
    }

    /// Start of `hour` on simulated `day`, or None past the representable
    /// calendar.
    fn day_start(day: u32, hour: u32) -> Option<DateTime<Utc>> {
        // Monday 2026-01-05 as the first simulated day
        let base = Utc
            .with_ymd_and_hms(2026, 1, 5, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        base.checked_add_signed(Duration::try_days(i64::from(day))?)?
            .checked_add_signed(Duration::try_hours(i64::from(hour))?)
    }

    fn next_snapshot(
        user: &mut SimulatedUser,
        now: DateTime<Utc>,
        tick: Duration,
        rng: &mut Mcg128Xsl64,
    ) -> SignalSnapshot {
        let interruptions: i64 = rng.gen_range(0..6);
        if interruptions >= 3 {
            user.focus_minutes = 0.0;
        } else {
            user.focus_minutes += tick.num_minutes() as f64;
        }

        SignalSnapshot::at_utc(
            user.id.clone(),
            user.persona.clone(),
            SignalReadings {
                cognitive_load: rng.gen_range(0.0..1.0),
                focus_duration_minutes: user.focus_minutes,
                interruption_count_recent: interruptions,
                productivity_score: rng.gen_range(0.0..1.0),
            },
            now,
        )
    }

    fn acceptance_probability(user: &SimulatedUser, snapshot: &SignalSnapshot) -> f64 {
        let mut p = user.receptiveness;
        if snapshot.cognitive_load() > 0.8 {
            p *= 0.6;
        }
        if snapshot.focus_duration_minutes() > 25.0 {
            p *= 0.7;
        }
        p.clamp(0.0, 1.0)
    }
}

impl Default for WorkdaySimulator {
    fn default() -> Self {
        Self::new()
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn personas() -> Vec<String> {
        vec!["manager".to_string(), "analyst".to_string()]
    }

    fn run(seed: u64) -> SimulationReport {
        let engine = SchedulingEngine::with_defaults().unwrap();
        WorkdaySimulator::with_config(SimulationConfig {
            days: 3,
            users_per_persona: 2,
            seed: Some(seed),
            ..SimulationConfig::default()
        })
        .run(&engine, &personas())
    }

    #[test]
    fn same_seed_same_report() {
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn counts_are_consistent() {
        let report = run(11);
        // 3 days * 10 hours * 4 ticks * 4 users
        assert_eq!(report.evaluations, 3 * 40 * 4);
        assert!(report.offered > 0);
        assert!(report.accepted <= report.offered);
        assert!(report.offered <= report.evaluations);

        let per_persona: u64 = report.personas.values().map(|p| p.offered).sum();
        assert_eq!(per_persona, report.offered);
    }

    #[test]
    fn final_intervals_stay_in_bounds() {
        let report = run(3);
        for persona in report.personas.values() {
            let i = persona.final_intervals;
            for minutes in [i.morning, i.afternoon, i.evening] {
                assert!((5.0..=180.0).contains(&minutes));
            }
        }
    }

    #[test]
    fn oversized_tick_is_clamped_to_one_day() {
        let engine = SchedulingEngine::with_defaults().unwrap();
        let report = WorkdaySimulator::with_config(SimulationConfig {
            days: 2,
            users_per_persona: 1,
            tick_minutes: i64::MAX,
            ..SimulationConfig::default()
        })
        .run(&engine, &personas());
        // one tick per day, two users
        assert_eq!(report.evaluations, 2 * 2);
    }

    #[test]
    fn unrepresentable_day_stops_early() {
        assert!(WorkdaySimulator::day_start(u32::MAX, 0).is_none());
        assert!(WorkdaySimulator::day_start(0, u32::MAX).is_none());

        let engine = SchedulingEngine::with_defaults().unwrap();
        let report = WorkdaySimulator::with_config(SimulationConfig {
            days: 2,
            users_per_persona: 1,
            work_end_hour: u32::MAX,
            ..SimulationConfig::default()
        })
        .run(&engine, &personas());
        assert_eq!(report.evaluations, 0);
    }

    #[test]
    fn zero_days_is_empty() {
        let engine = SchedulingEngine::with_defaults().unwrap();
        let report = WorkdaySimulator::with_config(SimulationConfig {
            days: 0,
            ..SimulationConfig::default()
        })
        .run(&engine, &personas());
        assert_eq!(report.evaluations, 0);
        assert_eq!(report.acceptance_rate, 0.0);
    }
}
