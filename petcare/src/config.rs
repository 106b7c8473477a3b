//! Pipeline configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.
//! Values can be loaded from a JSON file and overridden from the environment.
//!
//! # Environment Variables
//!
//! - `PETCARE_MIN_INPUT_CHARS`: minimum description length - default: 3
//! - `PETCARE_MAX_IMAGES`: maximum image references per request - default: 5
//! - `PETCARE_MAX_CANDIDATES`: candidate conditions kept - default: 3
//! - `PETCARE_MIN_CONFIDENCE`: candidate confidence floor - default: 0.1
//! - `PETCARE_MAX_STEPS`: session step limit - default: 8

use crate::domain::UrgencyLevel;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Symptom intake settings.
    #[serde(default)]
    pub intake: IntakeConfig,
    /// Vision analysis settings.
    #[serde(default)]
    pub vision: VisionConfig,
    /// Medical analysis settings.
    #[serde(default)]
    pub medical: MedicalConfig,
    /// Triage scoring settings.
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Session loop settings.
    #[serde(default)]
    pub session: SessionConfig,
}

impl TriageConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads defaults and applies `PETCARE_*` overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `PETCARE_*` overrides to this configuration.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = env_var("PETCARE_MIN_INPUT_CHARS")? {
            self.intake.min_chars = v;
        }
        if let Some(v) = env_var("PETCARE_MAX_IMAGES")? {
            self.vision.max_images = v;
        }
        if let Some(v) = env_var("PETCARE_MAX_CANDIDATES")? {
            self.medical.max_candidates = v;
        }
        if let Some(v) = env_var("PETCARE_MIN_CONFIDENCE")? {
            self.medical.min_confidence = v;
        }
        if let Some(v) = env_var("PETCARE_MAX_STEPS")? {
            self.session.max_steps = v;
        }
        Ok(())
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vision.max_images == 0 {
            return Err(ConfigError::invalid("vision.max_images", "must be at least 1"));
        }
        if self.medical.max_candidates == 0 {
            return Err(ConfigError::invalid("medical.max_candidates", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.medical.min_confidence) {
            return Err(ConfigError::invalid(
                "medical.min_confidence",
                "must be within 0.0..=1.0",
            ));
        }
        let s = &self.scoring;
        if !(0.0 < s.yellow_threshold
            && s.yellow_threshold < s.orange_threshold
            && s.orange_threshold < s.red_threshold
            && s.red_threshold <= 5.0)
        {
            return Err(ConfigError::invalid(
                "scoring",
                "thresholds must satisfy 0 < yellow < orange < red <= 5",
            ));
        }
        if self.session.max_steps < PIPELINE_MAX_STAGES {
            return Err(ConfigError::invalid(
                "session.max_steps",
                format!("must be at least {PIPELINE_MAX_STAGES}"),
            ));
        }
        Ok(())
    }
}

/// The longest possible stage sequence (with vision analysis).
const PIPELINE_MAX_STAGES: usize = 6;

fn env_var<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Parse {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

/// Symptom intake settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Descriptions shorter than this (after trimming) are rejected.
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
}

fn default_min_chars() -> usize {
    3
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            min_chars: default_min_chars(),
        }
    }
}

/// Vision analysis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Maximum image references per request.
    #[serde(default = "default_max_images")]
    pub max_images: usize,
}

fn default_max_images() -> usize {
    5
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            max_images: default_max_images(),
        }
    }
}

/// Medical analysis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalConfig {
    /// Candidates kept after ranking.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    /// Candidates below this confidence are dropped.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

fn default_max_candidates() -> usize {
    3
}

fn default_min_confidence() -> f64 {
    0.1
}

impl Default for MedicalConfig {
    fn default() -> Self {
        Self {
            max_candidates: default_max_candidates(),
            min_confidence: default_min_confidence(),
        }
    }
}

/// Triage scoring settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Lowest score graded yellow.
    #[serde(default = "default_yellow_threshold")]
    pub yellow_threshold: f64,
    /// Lowest score graded orange.
    #[serde(default = "default_orange_threshold")]
    pub orange_threshold: f64,
    /// Lowest score graded red.
    #[serde(default = "default_red_threshold")]
    pub red_threshold: f64,
    /// Cap on the summed severity-cue weights.
    #[serde(default = "default_cue_cap")]
    pub cue_cap: f64,
    /// Symptoms lasting at least this long add `persistence_bonus`.
    #[serde(default = "default_persistent_after_hours")]
    pub persistent_after_hours: u32,
    /// Bonus for persistent symptoms.
    #[serde(default = "default_persistence_bonus")]
    pub persistence_bonus: f64,
    /// Bonus when three or more body systems are involved.
    #[serde(default = "default_multi_system_bonus")]
    pub multi_system_bonus: f64,
    /// Bonus for small and exotic species.
    #[serde(default = "default_small_species_bonus")]
    pub small_species_bonus: f64,
}

fn default_yellow_threshold() -> f64 {
    2.0
}

fn default_orange_threshold() -> f64 {
    3.0
}

fn default_red_threshold() -> f64 {
    4.0
}

fn default_cue_cap() -> f64 {
    2.0
}

fn default_persistent_after_hours() -> u32 {
    48
}

fn default_persistence_bonus() -> f64 {
    0.3
}

fn default_multi_system_bonus() -> f64 {
    0.5
}

fn default_small_species_bonus() -> f64 {
    0.5
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            yellow_threshold: default_yellow_threshold(),
            orange_threshold: default_orange_threshold(),
            red_threshold: default_red_threshold(),
            cue_cap: default_cue_cap(),
            persistent_after_hours: default_persistent_after_hours(),
            persistence_bonus: default_persistence_bonus(),
            multi_system_bonus: default_multi_system_bonus(),
            small_species_bonus: default_small_species_bonus(),
        }
    }
}

impl ScoringConfig {
    /// Grades a score.
    #[must_use]
    pub fn level_for(&self, score: f64) -> UrgencyLevel {
        if score >= self.red_threshold {
            UrgencyLevel::Red
        } else if score >= self.orange_threshold {
            UrgencyLevel::Orange
        } else if score >= self.yellow_threshold {
            UrgencyLevel::Yellow
        } else {
            UrgencyLevel::Green
        }
    }

    /// Lowest score graded at `level`.
    #[must_use]
    pub fn floor_for(&self, level: UrgencyLevel) -> f64 {
        match level {
            UrgencyLevel::Green => 0.0,
            UrgencyLevel::Yellow => self.yellow_threshold,
            UrgencyLevel::Orange => self.orange_threshold,
            UrgencyLevel::Red => self.red_threshold,
        }
    }
}

/// Session loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum driver calls per session.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

fn default_max_steps() -> usize {
    8
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = TriageConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.max_steps, 8);
        assert_eq!(config.medical.max_candidates, 3);
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: TriageConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TriageConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config: TriageConfig =
            serde_json::from_str(r#"{"scoring": {"red_threshold": 4.5}}"#).unwrap();
        assert!((config.scoring.red_threshold - 4.5).abs() < f64::EPSILON);
        assert!((config.scoring.yellow_threshold - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"medical": {{"max_candidates": 5}}}}"#).unwrap();

        let config = TriageConfig::from_file(file.path()).unwrap();
        assert_eq!(config.medical.max_candidates, 5);
    }

    #[test]
    fn test_from_file_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = TriageConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"vision": {{"max_images": 0}}}}"#).unwrap();

        let err = TriageConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_validate_thresholds() {
        let mut config = TriageConfig::default();
        config.scoring.orange_threshold = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_step_limit() {
        let mut config = TriageConfig::default();
        config.session.max_steps = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_level_for() {
        let scoring = ScoringConfig::default();
        assert_eq!(scoring.level_for(0.5), UrgencyLevel::Green);
        assert_eq!(scoring.level_for(2.0), UrgencyLevel::Yellow);
        assert_eq!(scoring.level_for(3.4), UrgencyLevel::Orange);
        assert_eq!(scoring.level_for(5.0), UrgencyLevel::Red);
        assert!((scoring.floor_for(UrgencyLevel::Orange) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_env_var_parse_error() {
        env::set_var("PETCARE_TEST_BAD_NUMBER", "many");
        let result: Result<Option<usize>, _> = env_var("PETCARE_TEST_BAD_NUMBER");
        env::remove_var("PETCARE_TEST_BAD_NUMBER");

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_env_var_missing() {
        let result: Option<usize> = env_var("PETCARE_TEST_SURELY_UNSET").unwrap();
        assert!(result.is_none());
    }
}
