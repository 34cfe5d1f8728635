//! Process-wide persona → profile table with one lock per persona.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;

use super::types::{IntervalBounds, TimingProfile};
use crate::error::ConfigError;

/// Shared, lockable timing profile.
pub type SharedProfile = Arc<RwLock<TimingProfile>>;

/// Keyed table of timing profiles.
///
/// Lookups go through the map's shard lock only long enough to clone the
/// `Arc`; reads and tuner writes then lock the single persona entry.
#[derive(Debug)]
pub struct ProfileRegistry {
    profiles: DashMap<String, SharedProfile>,
    default_persona: String,
    default_profile: SharedProfile,
    bounds: IntervalBounds,
}

impl ProfileRegistry {
    /// Build a registry. Every profile is validated and clamped into
    /// `bounds`; `default_persona` must be present.
    pub fn new(
        profiles: BTreeMap<String, TimingProfile>,
        default_persona: impl Into<String>,
        bounds: IntervalBounds,
    ) -> Result<Self, ConfigError> {
        bounds.validate()?;
        let default_persona = default_persona.into();

        let map = DashMap::new();
        for (persona, mut profile) in profiles {
            Self::prepare(&persona, &mut profile, &bounds)?;
            map.insert(persona, Arc::new(RwLock::new(profile)));
        }

        let default_profile = map
            .get(&default_persona)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "default_persona".to_string(),
                message: format!("no timing profile for '{default_persona}'"),
            })?;

        Ok(Self {
            profiles: map,
            default_persona,
            default_profile,
            bounds,
        })
    }

    fn prepare(
        persona: &str,
        profile: &mut TimingProfile,
        bounds: &IntervalBounds,
    ) -> Result<(), ConfigError> {
        profile.validate(persona)?;
        if profile.clamp_intervals(bounds) {
            tracing::warn!(persona = %persona, "base intervals outside bounds, clamped");
        }
        Ok(())
    }

    /// Insert or replace a persona's profile.
    pub fn insert(
        &self,
        persona: impl Into<String>,
        mut profile: TimingProfile,
    ) -> Result<(), ConfigError> {
        let persona = persona.into();
        Self::prepare(&persona, &mut profile, &self.bounds)?;

        match self.profiles.entry(persona) {
            Entry::Occupied(entry) => *entry.get().write() = profile,
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(RwLock::new(profile)));
            }
        }
        Ok(())
    }

    pub fn default_persona(&self) -> &str {
        &self.default_persona
    }

    pub fn bounds(&self) -> &IntervalBounds {
        &self.bounds
    }

    pub fn contains(&self, persona: &str) -> bool {
        self.profiles.contains_key(persona)
    }

    /// The persona's own profile, if registered.
    pub fn get(&self, persona: &str) -> Option<SharedProfile> {
        self.profiles.get(persona).map(|entry| Arc::clone(entry.value()))
    }

    /// Resolve a persona, falling back to the default persona when unknown.
    /// Returns the key actually used.
    pub fn resolve(&self, persona: &str) -> (String, SharedProfile) {
        if let Some(profile) = self.get(persona) {
            return (persona.to_string(), profile);
        }

        tracing::warn!(
            persona = %persona,
            fallback = %self.default_persona,
            "unknown persona, using default timing profile"
        );
        (self.default_persona.clone(), Arc::clone(&self.default_profile))
    }

    /// Copy of the resolved profile, taken under its read lock.
    pub fn snapshot(&self, persona: &str) -> TimingProfile {
        let (_, profile) = self.resolve(persona);
        let copy = profile.read().clone();
        copy
    }

    /// Sorted persona keys.
    pub fn personas(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.profiles.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Copy of every profile, for export.
    pub fn export(&self) -> BTreeMap<String, TimingProfile> {
        self.profiles
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().read().clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::packs::builtin_packs;

    fn builtin_map() -> BTreeMap<String, TimingProfile> {
        builtin_packs()
            .into_iter()
            .map(|p| (p.id, p.profile))
            .collect()
    }

    #[test]
    fn unknown_persona_falls_back_to_default() {
        let registry =
            ProfileRegistry::new(builtin_map(), "manager", IntervalBounds::default()).unwrap();

        let (key, profile) = registry.resolve("astronaut");
        assert_eq!(key, "manager");
        assert_eq!(profile.read().base_interval_minutes.morning, 45.0);
    }

    #[test]
    fn known_persona_resolves_to_itself() {
        let registry =
            ProfileRegistry::new(builtin_map(), "manager", IntervalBounds::default()).unwrap();

        let (key, profile) = registry.resolve("analyst");
        assert_eq!(key, "analyst");
        assert_eq!(profile.read().base_interval_minutes.morning, 40.0);
    }

    #[test]
    fn missing_default_persona_is_rejected() {
        let err = ProfileRegistry::new(builtin_map(), "ghost", IntervalBounds::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn insert_clamps_into_bounds() {
        let bounds = IntervalBounds {
            min_minutes: 10.0,
            max_minutes: 50.0,
        };
        let registry = ProfileRegistry::new(builtin_map(), "manager", bounds).unwrap();

        let manager = registry.snapshot("manager");
        assert_eq!(manager.base_interval_minutes.evening, 50.0);
    }

    #[test]
    fn insert_replaces_in_place() {
        let registry =
            ProfileRegistry::new(builtin_map(), "manager", IntervalBounds::default()).unwrap();
        let handle = registry.get("analyst").unwrap();

        let mut replacement = registry.snapshot("analyst");
        replacement.base_interval_minutes.morning = 77.0;
        registry.insert("analyst", replacement).unwrap();

        // Existing handles observe the replacement.
        assert_eq!(handle.read().base_interval_minutes.morning, 77.0);
    }

    #[test]
    fn personas_are_sorted() {
        let registry =
            ProfileRegistry::new(builtin_map(), "manager", IntervalBounds::default()).unwrap();
        assert_eq!(
            registry.personas(),
            vec!["analyst", "designer", "developer", "manager"]
        );
    }
}
