//! Persona timing profiles.
//!
//! - [`types`]: `TimingProfile`, day-parts, thresholds and interval bounds
//! - [`packs`]: built-in persona packs (manager, analyst, developer, designer)
//! - [`registry`]: the engine's keyed, per-persona-locked profile table

mod packs;
mod registry;
mod types;

pub use packs::{builtin_packs, find_pack, persona_ids, PersonaPack};
pub use registry::{ProfileRegistry, SharedProfile};
pub use types::{
    BaseIntervals, CognitiveLoadThresholds, DayPart, FlowProtection, IntervalBounds, TimingProfile,
};
