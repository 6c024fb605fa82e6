//! Engine configuration
//!
//! Every rule constant used by the checks lives here, together with the two
//! data-quality policies and the storage/logging settings. All fields have
//! defaults, so an empty JSON object is a valid configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ApFlagRule;
use crate::observability::{log_event_with_fields, Event, LogLevel};

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON for this structure
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "ENROLL_CONFIG_READ_FAILED",
            ConfigError::Parse(_) => "ENROLL_CONFIG_PARSE_FAILED",
            ConfigError::Invalid(_) => "ENROLL_CONFIG_INVALID",
        }
    }
}

/// How students with an unparsable grade are treated by the AP check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnparsableGradePolicy {
    /// The grade is "not 11 and not 12", so the student is checked
    IncludeInApCheck,
    /// The student is skipped by the AP check
    ExcludeFromApCheck,
}

/// How a course with unparsable `credits_offered` affects a credit total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnparsableCreditsPolicy {
    /// The course contributes 0 credits
    CountAsZero,
    /// The student is reported, naming the offending courses
    FlagStudent,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_grade: i64,
    pub max_grade: i64,
    pub min_credits: i64,
    pub max_credits: i64,
    /// Subject tokens every student must cover, matched as uppercase substrings
    pub required_subjects: Vec<String>,
    pub advisory_course_code: String,
    /// Grades allowed to take AP courses
    pub ap_eligible_grades: Vec<i64>,
    pub ap_flag_literal: String,
    pub ap_flag_case_sensitive: bool,
    pub unparsable_grade_policy: UnparsableGradePolicy,
    pub unparsable_credits_policy: UnparsableCreditsPolicy,
    /// Upper bound on per-student joins in flight within one check
    pub max_in_flight_joins: usize,
    /// Directory for segment files; memory-only when unset
    pub data_dir: Option<PathBuf>,
    /// trace, info, warn, error, fatal or off
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_grade: 9,
            max_grade: 12,
            min_credits: 12,
            max_credits: 24,
            required_subjects: ["HISTORY", "ENGLISH", "SCIENCE", "MATH"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            advisory_course_code: "8027_2".to_string(),
            ap_eligible_grades: vec![11, 12],
            ap_flag_literal: "TRUE".to_string(),
            ap_flag_case_sensitive: true,
            unparsable_grade_policy: UnparsableGradePolicy::IncludeInApCheck,
            unparsable_credits_policy: UnparsableCreditsPolicy::CountAsZero,
            max_in_flight_joins: 16,
            data_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file and validate it
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: EngineConfig = serde_json::from_str(&content)?;
        config.normalize();
        config.validate()?;

        let shown = path.display().to_string();
        log_event_with_fields(Event::ConfigLoaded, &[("path", shown.as_str())]);
        Ok(config)
    }

    /// Uppercases subject tokens so matching is case-insensitive
    pub fn normalize(&mut self) {
        for subject in self.required_subjects.iter_mut() {
            *subject = subject.trim().to_uppercase();
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.min_grade > self.max_grade {
            return Err(ConfigError::Invalid(format!(
                "min_grade {} exceeds max_grade {}",
                self.min_grade, self.max_grade
            )));
        }

        if self.min_credits > self.max_credits {
            return Err(ConfigError::Invalid(format!(
                "min_credits {} exceeds max_credits {}",
                self.min_credits, self.max_credits
            )));
        }

        if self.required_subjects.is_empty()
            || self.required_subjects.iter().any(|s| s.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "required_subjects must be a non-empty list of non-blank tokens".into(),
            ));
        }

        if self.advisory_course_code.trim().is_empty() {
            return Err(ConfigError::Invalid("advisory_course_code must not be empty".into()));
        }

        if self.ap_flag_literal.is_empty() {
            return Err(ConfigError::Invalid("ap_flag_literal must not be empty".into()));
        }

        if self.max_in_flight_joins == 0 {
            return Err(ConfigError::Invalid("max_in_flight_joins must be > 0".into()));
        }

        self.log_level
            .parse::<LogLevel>()
            .map_err(ConfigError::Invalid)?;

        Ok(())
    }

    /// Rule used at ingestion to evaluate `is_ap`
    pub fn ap_rule(&self) -> ApFlagRule {
        ApFlagRule::new(self.ap_flag_literal.clone(), self.ap_flag_case_sensitive)
    }

    /// Parsed log level; falls back to INFO if unparsable
    pub fn log_level(&self) -> LogLevel {
        self.log_level
            .parse()
            .unwrap_or(LogLevel::At(crate::observability::Severity::Info))
    }

    /// Returns true if `grade` may take AP courses
    pub fn is_ap_eligible_grade(&self, grade: i64) -> bool {
        self.ap_eligible_grades.contains(&grade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_follow_rules() {
        let config = EngineConfig::default();
        assert_eq!((config.min_grade, config.max_grade), (9, 12));
        assert_eq!((config.min_credits, config.max_credits), (12, 24));
        assert_eq!(config.required_subjects, vec!["HISTORY", "ENGLISH", "SCIENCE", "MATH"]);
        assert_eq!(config.advisory_course_code, "8027_2");
        assert!(config.is_ap_eligible_grade(11));
        assert!(!config.is_ap_eligible_grade(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_in_flight_joins, 16);
        assert_eq!(
            config.unparsable_credits_policy,
            UnparsableCreditsPolicy::CountAsZero
        );
    }

    #[test]
    fn test_policies_parse_snake_case() {
        let config: EngineConfig = serde_json::from_str(
            r#"{"unparsable_grade_policy":"exclude_from_ap_check","unparsable_credits_policy":"flag_student"}"#,
        )
        .unwrap();
        assert_eq!(
            config.unparsable_grade_policy,
            UnparsableGradePolicy::ExcludeFromApCheck
        );
        assert_eq!(
            config.unparsable_credits_policy,
            UnparsableCreditsPolicy::FlagStudent
        );
    }

    #[test]
    fn test_inverted_ranges_rejected() {
        let config = EngineConfig {
            min_credits: 30,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_joins_rejected() {
        let config = EngineConfig {
            max_in_flight_joins: 0,
            ..EngineConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().code(), "ENROLL_CONFIG_INVALID");
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let config = EngineConfig {
            log_level: "chatty".into(),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_normalizes_subjects() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("enrollcheck.json");
        fs::write(&path, r#"{"required_subjects":["history"," math "]}"#).unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.required_subjects, vec!["HISTORY", "MATH"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/enrollcheck.json")).unwrap_err();
        assert_eq!(err.code(), "ENROLL_CONFIG_READ_FAILED");
    }
}
