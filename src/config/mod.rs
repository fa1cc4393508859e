pub mod parser;

pub use parser::{
    ConfigFormat, ConfigParser, ConfigParserOptions, ConfigSource, EnvConfigSource, EnvOverride,
    FileConfigSource,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::PredictorError;
use crate::ml::risk::DEFAULT_THRESHOLD;
use crate::ml::trainer::TrainerConfig;
use crate::monitoring::LogLevel;

/// Prefix of environment overrides, e.g. `STUDENT_PREDICTOR__STORE__PATH`
pub const ENV_PREFIX: &str = "STUDENT_PREDICTOR__";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub store: StoreConfig,
    pub model: TrainerConfig,
    pub warning: WarningConfig,
    pub logging: LoggingConfig,
}

/// Record store connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite file, or `:memory:`
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let path = directories::ProjectDirs::from("com", "student-predictor", "student-predictor")
            .map(|dirs| dirs.data_dir().join("students.db"))
            .unwrap_or_else(|| PathBuf::from("students.db"));
        Self { path }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarningConfig {
    /// Predicted scores strictly below this are flagged
    pub threshold: f64,
}

impl Default for WarningConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
        }
    }
}

impl PredictorConfig {
    /// Defaults, then the optional config file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut layers = Vec::new();

        if let Some(path) = path {
            // An explicitly named file must exist.
            if !path.exists() {
                return Err(PredictorError::Config(format!(
                    "configuration file not found: {}",
                    path.display()
                ))
                .into());
            }
            let source = FileConfigSource {
                path: path.to_path_buf(),
            };
            layers.extend(source.load_config()?);
        }

        let env = EnvConfigSource {
            prefix: ENV_PREFIX.to_string(),
        };
        let config: Self = ConfigParser::merge_layers(&Self::default(), &layers)?;
        let config = config.with_overrides(env.overrides())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides one at a time. A value is tried as a
    /// JSON scalar first and as the plain string if that does not fit.
    pub fn with_overrides<I>(self, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = EnvOverride>,
    {
        let mut config = self;
        for entry in overrides {
            config = ConfigParser::merge_layers(&config, std::slice::from_ref(&entry.typed))
                .or_else(|_| ConfigParser::merge_layers(&config, std::slice::from_ref(&entry.raw)))
                .with_context(|| format!("Invalid value in {}", entry.key))?;
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PredictorError> {
        let fraction = self.model.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(PredictorError::Config(format!(
                "model.test_fraction must be between 0 and 1, got {}",
                fraction
            )));
        }
        if !self.warning.threshold.is_finite() {
            return Err(PredictorError::Config(
                "warning.threshold must be a finite number".to_string(),
            ));
        }
        Ok(())
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = PredictorConfig::default();
        assert_eq!(config.model.test_fraction, 0.2);
        assert_eq!(config.model.split_seed, 0);
        assert_eq!(config.warning.threshold, 50.0);
        assert!(config.store.path.ends_with("students.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("predictor.toml");
        std::fs::write(&path, "[warning]\nthreshold = 200.0\n").unwrap();

        let config = PredictorConfig::load(Some(&path)).unwrap();
        assert_eq!(config.warning.threshold, 200.0);
        assert_eq!(config.model, TrainerConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("saved.toml");
        let mut config = PredictorConfig::default();
        config.store.path = dir.path().join("db.sqlite");
        config.model.split_seed = 42;
        config.logging.level = LogLevel::Debug;

        config.save(&path).unwrap();
        assert_eq!(PredictorConfig::load(Some(&path)).unwrap(), config);
    }

    fn env(vars: &[(&str, &str)]) -> Vec<EnvOverride> {
        let source = EnvConfigSource {
            prefix: ENV_PREFIX.to_string(),
        };
        source.overrides_from(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_numeric_looking_env_value_stays_a_path() {
        let config = PredictorConfig::default()
            .with_overrides(env(&[
                ("STUDENT_PREDICTOR__STORE__PATH", "2024"),
                ("STUDENT_PREDICTOR__MODEL__SPLIT_SEED", "7"),
                ("STUDENT_PREDICTOR__WARNING__THRESHOLD", "75.5"),
            ]))
            .unwrap();

        assert_eq!(config.store.path, PathBuf::from("2024"));
        assert_eq!(config.model.split_seed, 7);
        assert_eq!(config.warning.threshold, 75.5);
    }

    #[test]
    fn test_unusable_env_value_is_error() {
        let result = PredictorConfig::default()
            .with_overrides(env(&[("STUDENT_PREDICTOR__MODEL__SPLIT_SEED", "soon")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempdir().unwrap();
        assert!(PredictorConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_invalid_fraction_rejected() {
        let mut config = PredictorConfig::default();
        config.model.test_fraction = 1.0;
        assert!(matches!(config.validate(), Err(PredictorError::Config(_))));
    }
}
