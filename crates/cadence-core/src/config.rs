//! TOML-based engine configuration.
//!
//! Holds the tunables of the scheduling core:
//! - Default persona used for unknown persona keys
//! - Interval bounds enforced after every retune
//! - Tuner, strategy and flow cutoffs
//! - Audit window sizes
//! - Persona timing profiles overriding or extending the built-in packs
//!
//! Configuration is stored at `~/.config/cadence/config.toml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::flow::FlowCriteria;
use crate::profile::{builtin_packs, IntervalBounds, TimingProfile};
use crate::strategy::StrategyThresholds;
use crate::tuner::TunerConfig;

/// Returns `~/.config/cadence[-dev]/` based on CADENCE_ENV, creating it if
/// needed.
///
/// Set CADENCE_ENV=dev to use the development data directory.
/// CADENCE_DATA_DIR overrides the location entirely.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CADENCE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if let Some(custom) = std::env::var_os("CADENCE_DATA_DIR") {
        PathBuf::from(custom)
    } else if env == "dev" {
        base_dir.join("cadence-dev")
    } else {
        base_dir.join("cadence")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}

/// Audit retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Recent outcome records kept in memory.
    #[serde(default = "default_outcome_window")]
    pub outcome_window: usize,
    /// Retune events kept in memory.
    #[serde(default = "default_adaptation_log")]
    pub adaptation_log: usize,
}

fn default_outcome_window() -> usize {
    256
}
fn default_adaptation_log() -> usize {
    128
}
fn default_persona() -> String {
    "manager".into()
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            outcome_window: default_outcome_window(),
            adaptation_log: default_adaptation_log(),
        }
    }
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/cadence/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Persona whose profile serves unknown persona keys.
    #[serde(default = "default_persona")]
    pub default_persona: String,
    #[serde(default)]
    pub interval_bounds: IntervalBounds,
    #[serde(default)]
    pub tuner: TunerConfig,
    #[serde(default)]
    pub strategy: StrategyThresholds,
    #[serde(default)]
    pub flow: FlowCriteria,
    #[serde(default)]
    pub audit: AuditConfig,
    /// Profiles layered over the built-in packs.
    #[serde(default)]
    pub personas: BTreeMap<String, TimingProfile>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_persona: default_persona(),
            interval_bounds: IntervalBounds::default(),
            tuner: TunerConfig::default(),
            strategy: StrategyThresholds::default(),
            flow: FlowCriteria::default(),
            audit: AuditConfig::default(),
            personas: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::InvalidValue {
            key: key.to_string(),
            message: "unknown config key".to_string(),
        };
        let unparsable = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| unparsable(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| unparsable(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(unparsable(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| unparsable(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file does
    /// not exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: EngineConfig = toml::from_str(&content)?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default engine config");
            Self::default()
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. The result is validated;
    /// on error `self` is unchanged. Does not persist.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: EngineConfig =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Built-in packs with configured personas layered on top.
    pub fn profiles(&self) -> BTreeMap<String, TimingProfile> {
        let mut profiles: BTreeMap<String, TimingProfile> = builtin_packs()
            .into_iter()
            .map(|pack| (pack.id, pack.profile))
            .collect();
        for (persona, profile) in &self.personas {
            profiles.insert(persona.clone(), profile.clone());
        }
        profiles
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.interval_bounds.validate()?;
        self.tuner.validate()?;

        let profiles = self.profiles();
        if !profiles.contains_key(&self.default_persona) {
            return Err(ConfigError::InvalidValue {
                key: "default_persona".to_string(),
                message: format!("no timing profile for '{}'", self.default_persona),
            });
        }
        for (persona, profile) in &self.personas {
            profile.validate(persona)?;
        }

        for (key, value) in [
            ("strategy.focus_load", self.strategy.focus_load),
            ("strategy.low_motivation", self.strategy.low_motivation),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("must be within [0, 1], got {value}"),
                });
            }
        }
        if !(1..=4).contains(&self.flow.quorum) {
            return Err(ConfigError::InvalidValue {
                key: "flow.quorum".to_string(),
                message: format!("must be within 1-4, got {}", self.flow.quorum),
            });
        }

        Ok(())
    }
}
