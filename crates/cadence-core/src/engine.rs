//! Scheduling engine: the public entry point of the core.
//!
//! One engine serves every user of a process. Calls are short, CPU-bound and
//! never block on I/O, so hosts are expected to call into a shared
//! `Arc<SchedulingEngine>` from a worker pool.
//!
//! ## Locking
//!
//! - Profiles: one `RwLock` per persona. `evaluate` copies the profile under
//!   a read lock before touching any user state; the tuner takes the write
//!   lock for the duration of one retune.
//! - User history: one `Mutex` per user, held across the whole gate check,
//!   so the check-then-commit sequence is atomic per user. Different users
//!   never contend.
//! - Statistics: per-bucket entries of a concurrent map.
//!
//! No lock is ever held while acquiring another of a different kind, so
//! there is no lock ordering to get wrong.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{ConfigError, OutcomeError};
use crate::flow::FlowDetector;
use crate::gate::{GateReason, InterventionGate, InterventionHistoryEntry};
use crate::outcome::{OutcomeRecord, OutcomeTracker, StatsBucket};
use crate::profile::{DayPart, ProfileRegistry, TimingProfile};
use crate::signal::SignalSnapshot;
use crate::strategy::{InterventionCategory, StrategySelector};
use crate::tuner::{AdaptationEvent, AdaptationLog, AdaptiveTuner};

/// Result of [`SchedulingEngine::evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDecision {
    pub permitted: bool,
    /// Set iff `permitted`.
    pub category: Option<InterventionCategory>,
    pub reason: GateReason,
    /// Persona key whose profile was used (the default persona when the
    /// snapshot's persona is unknown).
    pub persona: String,
    pub day_part: DayPart,
    pub adjusted_interval_minutes: Option<f64>,
    pub in_flow: bool,
}

/// Serializable engine state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    #[serde(default)]
    pub profiles: BTreeMap<String, TimingProfile>,
    #[serde(default)]
    pub stats: Vec<StatsBucket>,
    #[serde(default)]
    pub history: BTreeMap<String, InterventionHistoryEntry>,
    #[serde(default)]
    pub adaptations: Vec<AdaptationEvent>,
}

type SharedHistory = Arc<Mutex<InterventionHistoryEntry>>;

/// Adaptive intervention scheduler.
#[derive(Debug)]
pub struct SchedulingEngine {
    registry: ProfileRegistry,
    history: DashMap<String, SharedHistory>,
    outcomes: OutcomeTracker,
    tuner: AdaptiveTuner,
    adaptations: AdaptationLog,
    gate: InterventionGate,
    selector: StrategySelector,
}

impl SchedulingEngine {
    /// Build an engine from a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let registry = ProfileRegistry::new(
            config.profiles(),
            config.default_persona.clone(),
            config.interval_bounds,
        )?;

        tracing::info!(
            personas = registry.personas().len(),
            default_persona = %config.default_persona,
            "scheduling engine initialized"
        );

        Ok(Self {
            registry,
            history: DashMap::new(),
            outcomes: OutcomeTracker::new(config.audit.outcome_window),
            tuner: AdaptiveTuner::new(config.tuner, config.interval_bounds),
            adaptations: AdaptationLog::new(config.audit.adaptation_log),
            gate: InterventionGate::with_detector(FlowDetector::with_criteria(config.flow)),
            selector: StrategySelector::new(config.strategy),
        })
    }

    /// Engine over the built-in persona packs.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::new(EngineConfig::default())
    }

    /// Rebuild an engine from `config` and a previously exported state.
    /// Exported profiles replace the configured ones.
    pub fn restore(config: EngineConfig, state: EngineState) -> Result<Self, ConfigError> {
        let engine = Self::new(config)?;

        for (persona, profile) in state.profiles {
            engine.registry.insert(persona, profile)?;
        }
        let (stats, dropped): (Vec<_>, Vec<_>) = state
            .stats
            .into_iter()
            .partition(|bucket| engine.registry.contains(&bucket.persona));
        if !dropped.is_empty() {
            tracing::warn!(
                dropped = dropped.len(),
                "skipping stats buckets for unregistered personas"
            );
        }
        engine.outcomes.restore(stats);
        for (user_id, entry) in state.history {
            engine.history.insert(user_id, Arc::new(Mutex::new(entry)));
        }
        for event in state.adaptations {
            engine.adaptations.push(event);
        }

        tracing::debug!(
            users = engine.history.len(),
            buckets = engine.outcomes.bucket_count(),
            "engine state restored"
        );
        Ok(engine)
    }

    /// Decide whether to intervene now and, if so, with which category.
    ///
    /// This call mutates the user's history: a permitted decision claims
    /// the intervention slot at the snapshot's timestamp, whether or not the
    /// caller goes on to deliver anything. Concurrent calls for the same
    /// user are serialized internally; their order is whatever order the
    /// lock is acquired in.
    ///
    /// Never fails. A broken profile permits the intervention (fail-open)
    /// with a category chosen from the snapshot alone.
    pub fn evaluate(&self, user_id: &str, snapshot: &SignalSnapshot) -> ScheduleDecision {
        let (persona, profile) = self.registry.resolve(snapshot.persona());
        let profile = profile.read().clone();

        let entry = self.history_entry(user_id);
        let verdict = {
            let mut history = entry.lock();
            self.gate.decide(user_id, snapshot, &profile, &mut history)
        };

        let category = verdict
            .permitted
            .then(|| self.selector.select_category(snapshot));

        if let Some(category) = category {
            tracing::info!(
                user_id = %user_id,
                persona = %persona,
                category = %category,
                reason = ?verdict.reason,
                "intervention permitted"
            );
        }

        ScheduleDecision {
            permitted: verdict.permitted,
            category,
            reason: verdict.reason,
            persona,
            day_part: verdict.day_part,
            adjusted_interval_minutes: verdict.adjusted_interval_minutes,
            in_flow: verdict.in_flow,
        }
    }

    /// Record a delivered intervention's outcome and retune the persona if
    /// its bucket calls for it. Returns the applied retune, if any.
    ///
    /// Outcomes for unknown personas are bucketed under the default
    /// persona, keeping the table at 24 buckets per registered persona.
    /// They count toward the default persona's statistics but never
    /// trigger a retune themselves.
    ///
    /// Only structurally invalid records are rejected.
    pub fn record_outcome(
        &self,
        outcome: &OutcomeRecord,
    ) -> Result<Option<AdaptationEvent>, OutcomeError> {
        outcome.validate().map_err(|err| {
            tracing::warn!(user_id = %outcome.user_id, error = %err, "outcome rejected");
            err
        })?;

        let (persona, _) = self.registry.resolve(&outcome.persona);
        let known = persona == outcome.persona;
        let stats = if known {
            self.outcomes.record(outcome)?
        } else {
            let mut resolved = outcome.clone();
            resolved.persona = persona.clone();
            self.outcomes.record(&resolved)?
        };

        tracing::debug!(
            persona = %persona,
            hour = outcome.hour_of_day,
            samples = stats.sample_count,
            acceptance_rate = stats.acceptance_rate,
            "outcome recorded"
        );

        if !known {
            return Ok(None);
        }

        let event =
            self.tuner
                .maybe_retune(&self.registry, &persona, outcome.hour_of_day as u8, &stats);
        if let Some(event) = &event {
            self.adaptations.push(event.clone());
        }
        Ok(event)
    }

    /// Current profile for a persona, or the default profile when unknown.
    pub fn get_timing_profile(&self, persona: &str) -> TimingProfile {
        self.registry.snapshot(persona)
    }

    pub fn personas(&self) -> Vec<String> {
        self.registry.personas()
    }

    pub fn default_persona(&self) -> &str {
        self.registry.default_persona()
    }

    /// Statistics buckets for a persona, sorted by hour.
    pub fn persona_stats(&self, persona: &str) -> Vec<StatsBucket> {
        self.outcomes.persona_stats(persona)
    }

    /// Recent outcomes, oldest first.
    pub fn recent_outcomes(&self) -> Vec<OutcomeRecord> {
        self.outcomes.recent_outcomes()
    }

    /// Applied retunes, oldest first.
    pub fn adaptation_log(&self) -> Vec<AdaptationEvent> {
        self.adaptations.events()
    }

    pub fn history(&self, user_id: &str) -> Option<InterventionHistoryEntry> {
        self.history
            .get(user_id)
            .map(|entry| entry.value().lock().clone())
    }

    pub fn tracked_users(&self) -> usize {
        self.history.len()
    }

    /// Drop history for users with no grant in the last `idle`. Returns the
    /// number of users removed.
    ///
    /// A window reaching past the earliest representable instant prunes
    /// nothing.
    pub fn prune_history(&self, now: DateTime<Utc>, idle: Duration) -> usize {
        let cutoff = now
            .checked_sub_signed(idle)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let before = self.history.len();
        self.history.retain(|_, entry| {
            matches!(entry.lock().last_intervention_time, Some(last) if last >= cutoff)
        });
        let removed = before.saturating_sub(self.history.len());
        if removed > 0 {
            tracing::info!(removed, "pruned idle user history");
        }
        removed
    }

    /// Copy of all mutable state.
    pub fn export_state(&self) -> EngineState {
        let history = self
            .history
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().lock().clone()))
            .collect();

        EngineState {
            profiles: self.registry.export(),
            stats: self.outcomes.export(),
            history,
            adaptations: self.adaptations.events(),
        }
    }

    fn history_entry(&self, user_id: &str) -> SharedHistory {
        if let Some(entry) = self.history.get(user_id) {
            return Arc::clone(entry.value());
        }
        Arc::clone(
            self.history
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(InterventionHistoryEntry::default())))
                .value(),
        )
    }
}
