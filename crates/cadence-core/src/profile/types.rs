//! Timing profile types.
//!
//! A profile is plain configuration data: a per-persona table of base
//! intervals by day-part, cognitive load cutoffs and flow protection
//! parameters. Profiles are the mutation target of the adaptive tuner.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, GateError};

/// Coarse time-of-day bucket used to pick a base interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPart {
    /// 09:00-11:59
    Morning,
    /// 13:00-16:59
    Afternoon,
    /// Everything else, including the noon hour and the night.
    Evening,
}

impl DayPart {
    pub const ALL: [DayPart; 3] = [DayPart::Morning, DayPart::Afternoon, DayPart::Evening];

    /// Resolve the day-part for a local hour.
    ///
    /// The noon hour (12) and everything from 17:00 through 08:59 fall into
    /// `Evening`.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            9..=11 => DayPart::Morning,
            13..=16 => DayPart::Afternoon,
            _ => DayPart::Evening,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayPart::Morning => "morning",
            DayPart::Afternoon => "afternoon",
            DayPart::Evening => "evening",
        }
    }
}

impl fmt::Display for DayPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minutes between interventions for each day-part.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseIntervals {
    pub morning: f64,
    pub afternoon: f64,
    pub evening: f64,
}

impl BaseIntervals {
    pub fn get(&self, part: DayPart) -> f64 {
        match part {
            DayPart::Morning => self.morning,
            DayPart::Afternoon => self.afternoon,
            DayPart::Evening => self.evening,
        }
    }

    pub fn set(&mut self, part: DayPart, minutes: f64) {
        match part {
            DayPart::Morning => self.morning = minutes,
            DayPart::Afternoon => self.afternoon = minutes,
            DayPart::Evening => self.evening = minutes,
        }
    }
}

/// Cognitive load cutoffs; `low < medium < high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CognitiveLoadThresholds {
    /// At or below: intervene more often.
    pub low: f64,
    pub medium: f64,
    /// At or above: intervene less often.
    pub high: f64,
}

impl CognitiveLoadThresholds {
    fn is_ordered(&self) -> bool {
        [self.low, self.medium, self.high]
            .iter()
            .all(|v| v.is_finite() && (0.0..=1.0).contains(v))
            && self.low < self.medium
            && self.medium < self.high
    }
}

/// Flow protection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowProtection {
    pub detection_threshold: f64,
    pub minimum_protection_minutes: f64,
    /// Carried as persona data for the delivery layer.
    #[serde(default)]
    pub gradual_reentry: bool,
}

/// Allowed range for any base interval, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalBounds {
    #[serde(default = "default_min_minutes")]
    pub min_minutes: f64,
    #[serde(default = "default_max_minutes")]
    pub max_minutes: f64,
}

fn default_min_minutes() -> f64 {
    5.0
}
fn default_max_minutes() -> f64 {
    180.0
}

impl Default for IntervalBounds {
    fn default() -> Self {
        Self {
            min_minutes: default_min_minutes(),
            max_minutes: default_max_minutes(),
        }
    }
}

impl IntervalBounds {
    /// Clamp a value into the bounds. NaN maps to the minimum.
    pub fn clamp(&self, minutes: f64) -> f64 {
        if minutes.is_nan() {
            self.min_minutes
        } else {
            minutes.clamp(self.min_minutes, self.max_minutes)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ok = self.min_minutes.is_finite()
            && self.max_minutes.is_finite()
            && self.min_minutes > 0.0
            && self.min_minutes <= self.max_minutes;
        if ok {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue {
                key: "interval_bounds".to_string(),
                message: format!(
                    "expected 0 < min <= max, got min={} max={}",
                    self.min_minutes, self.max_minutes
                ),
            })
        }
    }
}

/// Per-persona timing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingProfile {
    pub base_interval_minutes: BaseIntervals,
    pub cognitive_load_thresholds: CognitiveLoadThresholds,
    pub flow_protection: FlowProtection,
}

impl TimingProfile {
    /// Full validation used when profiles enter the engine.
    pub fn validate(&self, persona: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidProfile {
            persona: persona.to_string(),
            message,
        };

        for part in DayPart::ALL {
            let value = self.base_interval_minutes.get(part);
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!("{part} interval must be positive, got {value}")));
            }
        }

        if !self.cognitive_load_thresholds.is_ordered() {
            let t = self.cognitive_load_thresholds;
            return Err(invalid(format!(
                "thresholds must satisfy 0 <= low < medium < high <= 1, got {}/{}/{}",
                t.low, t.medium, t.high
            )));
        }

        let fp = self.flow_protection;
        if !fp.minimum_protection_minutes.is_finite() || fp.minimum_protection_minutes < 0.0 {
            return Err(invalid(format!(
                "minimum_protection_minutes must be >= 0, got {}",
                fp.minimum_protection_minutes
            )));
        }
        if !(0.0..=1.0).contains(&fp.detection_threshold) {
            return Err(invalid(format!(
                "detection_threshold must be within [0, 1], got {}",
                fp.detection_threshold
            )));
        }

        Ok(())
    }

    /// The subset of checks the gate relies on at decision time.
    pub(crate) fn check_gate_inputs(&self, persona: &str, part: DayPart) -> Result<(), GateError> {
        let value = self.base_interval_minutes.get(part);
        if !value.is_finite() || value <= 0.0 {
            return Err(GateError::NonFiniteInterval {
                persona: persona.to_string(),
                day_part: part,
                value,
            });
        }

        if !self.cognitive_load_thresholds.is_ordered() {
            return Err(GateError::InvalidThresholds {
                persona: persona.to_string(),
            });
        }

        let protection = self.flow_protection.minimum_protection_minutes;
        if !protection.is_finite() || protection < 0.0 {
            return Err(GateError::NonFiniteProtection {
                persona: persona.to_string(),
                value: protection,
            });
        }

        Ok(())
    }

    /// Clamp every base interval into `bounds`. Returns true if any value
    /// changed.
    pub fn clamp_intervals(&mut self, bounds: &IntervalBounds) -> bool {
        let mut changed = false;
        for part in DayPart::ALL {
            let current = self.base_interval_minutes.get(part);
            let clamped = bounds.clamp(current);
            if clamped != current {
                self.base_interval_minutes.set(part, clamped);
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> TimingProfile {
        TimingProfile {
            base_interval_minutes: BaseIntervals {
                morning: 45.0,
                afternoon: 35.0,
                evening: 60.0,
            },
            cognitive_load_thresholds: CognitiveLoadThresholds {
                low: 0.3,
                medium: 0.6,
                high: 0.8,
            },
            flow_protection: FlowProtection {
                detection_threshold: 0.75,
                minimum_protection_minutes: 45.0,
                gradual_reentry: true,
            },
        }
    }

    #[test]
    fn day_part_partition() {
        for hour in 0..24 {
            let expected = match hour {
                9 | 10 | 11 => DayPart::Morning,
                13 | 14 | 15 | 16 => DayPart::Afternoon,
                _ => DayPart::Evening,
            };
            assert_eq!(DayPart::from_hour(hour), expected, "hour {hour}");
        }
    }

    #[test]
    fn noon_hour_is_evening() {
        assert_eq!(DayPart::from_hour(12), DayPart::Evening);
        assert_eq!(DayPart::from_hour(0), DayPart::Evening);
        assert_eq!(DayPart::from_hour(8), DayPart::Evening);
    }

    #[test]
    fn validate_accepts_default_shape() {
        assert!(profile().validate("manager").is_ok());
    }

    #[test]
    fn validate_rejects_unordered_thresholds() {
        let mut p = profile();
        p.cognitive_load_thresholds.medium = 0.9;
        let err = p.validate("manager").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProfile { .. }));
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut p = profile();
        p.base_interval_minutes.evening = 0.0;
        assert!(p.validate("manager").is_err());
    }

    #[test]
    fn clamp_intervals_reports_changes() {
        let bounds = IntervalBounds::default();
        let mut p = profile();
        assert!(!p.clamp_intervals(&bounds));

        p.base_interval_minutes.morning = 500.0;
        p.base_interval_minutes.afternoon = 1.0;
        assert!(p.clamp_intervals(&bounds));
        assert_eq!(p.base_interval_minutes.morning, 180.0);
        assert_eq!(p.base_interval_minutes.afternoon, 5.0);
    }

    #[test]
    fn bounds_validation() {
        assert!(IntervalBounds::default().validate().is_ok());
        let inverted = IntervalBounds {
            min_minutes: 90.0,
            max_minutes: 30.0,
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn gate_inputs_flag_nan_interval() {
        let mut p = profile();
        p.base_interval_minutes.afternoon = f64::NAN;
        assert!(p.check_gate_inputs("manager", DayPart::Morning).is_ok());
        assert!(matches!(
            p.check_gate_inputs("manager", DayPart::Afternoon),
            Err(GateError::NonFiniteInterval { .. })
        ));
    }
}
