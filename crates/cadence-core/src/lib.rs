//! # Cadence Core Library
//!
//! This library decides when a coaching nudge may be delivered to a user and
//! what kind of nudge it should be. It is a pure in-process decision core:
//! content generation and persistence are left to the host, which calls into
//! a shared engine from its own worker threads.
//!
//! ## Architecture
//!
//! - **Signals**: clamped per-decision snapshots of cognitive state
//! - **Profiles**: per-persona timing profiles, seeded from built-in packs
//!   and overridable through TOML configuration
//! - **Gate**: day-part intervals adjusted by cognitive load, with flow
//!   protection and commit-on-check history
//! - **Feedback**: streaming outcome statistics driving clamped interval
//!   retuning
//!
//! ## Key Components
//!
//! - [`SchedulingEngine`]: Orchestrator and public entry point
//! - [`InterventionGate`]: Timing gate over a [`FlowDetector`]
//! - [`AdaptiveTuner`]: Outcome-driven interval retuning
//! - [`EngineConfig`]: Engine configuration management
//! - [`ContentGenerator`] / [`OutcomeSink`]: Host-side collaborator seams

pub mod collaborators;
pub mod config;
pub mod engine;
pub mod error;
pub mod flow;
pub mod gate;
pub mod outcome;
pub mod profile;
pub mod signal;
pub mod simulation;
pub mod strategy;
pub mod tuner;

pub use collaborators::{ContentGenerator, JsonLinesSink, OutcomeSink, TemplateContentGenerator};
pub use config::{data_dir, AuditConfig, EngineConfig};
pub use engine::{EngineState, ScheduleDecision, SchedulingEngine};
pub use error::{ConfigError, CoreError, GateError, OutcomeError};
pub use flow::{FlowCriteria, FlowDetector, FlowIndicators};
pub use gate::{GateReason, GateVerdict, InterventionGate, InterventionHistoryEntry};
pub use outcome::{OutcomeRecord, OutcomeTracker, PersonaTimingStats, StatsBucket, StatsKey};
pub use profile::{
    builtin_packs, find_pack, persona_ids, BaseIntervals, CognitiveLoadThresholds, DayPart,
    FlowProtection, IntervalBounds, PersonaPack, ProfileRegistry, TimingProfile,
};
pub use signal::{SignalReadings, SignalSnapshot};
pub use simulation::{PersonaReport, SimulationConfig, SimulationReport, WorkdaySimulator};
pub use strategy::{InterventionCategory, StrategySelector, StrategyThresholds};
pub use tuner::{AdaptationEvent, AdaptationLog, AdaptiveTuner, RetuneDirection, TunerConfig};
