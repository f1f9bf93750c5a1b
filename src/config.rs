//! Production configuration system
//!
//! Provides centralized configuration management with:
//! - Environment variable support
//! - Config file loading (optional, partial files allowed)
//! - Runtime defaults
//! - Validation

use crate::stats::{AnalysisSettings, PValueMethod};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Statistics configuration
    pub analysis: AnalysisConfig,

    /// Record store configuration
    pub storage: StorageConfig,

    /// Output configuration
    pub output: OutputConfig,

    /// Paths configuration
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Days per period in the period table
    pub period_days: usize,
    pub significance_level: f64,
    /// Allowed drop between halves before focus/energy count as declining
    pub stability_tolerance: f64,
    pub p_value_method: PValueMethod,
    /// Default variables of the `correlations` command
    pub correlation_variables: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub json_pretty: bool,
    /// Import errors listed before the rest are summarized
    pub max_errors_shown: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub log_directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "ERROR".to_string(),
            format: "pretty".to_string(),
            output: "console".to_string(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let settings = AnalysisSettings::default();
        Self {
            period_days: settings.period_days,
            significance_level: settings.significance_level,
            stability_tolerance: settings.stability_tolerance,
            p_value_method: settings.p_value_method,
            correlation_variables: [
                "anxiety",
                "tension",
                "sleep_quality",
                "brain_fog",
                "energy",
                "focus",
                "dose",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl AnalysisConfig {
    pub fn settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            period_days: self.period_days,
            significance_level: self.significance_level,
            stability_tolerance: self.stability_tolerance,
            p_value_method: self.p_value_method,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("symptom-tracker")
                .join("records.json"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_pretty: false,
            max_errors_shown: 10,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_directory: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Load configuration from environment, file, and defaults
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        let config_paths = [
            PathBuf::from("symptom-tracker.toml"),
            PathBuf::from(".symptom-tracker.toml"),
            dirs::config_dir()
                .map(|d| d.join("symptom-tracker").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        if let Ok(val) = env::var("SYMPTOM_TRACKER_PERIOD_DAYS") {
            self.analysis.period_days = val
                .parse()
                .context("Invalid SYMPTOM_TRACKER_PERIOD_DAYS")?;
        }
        if let Ok(val) = env::var("SYMPTOM_TRACKER_SIGNIFICANCE") {
            self.analysis.significance_level = val
                .parse()
                .context("Invalid SYMPTOM_TRACKER_SIGNIFICANCE")?;
        }
        if let Ok(val) = env::var("SYMPTOM_TRACKER_P_VALUE_METHOD") {
            self.analysis.p_value_method = val
                .parse()
                .context("Invalid SYMPTOM_TRACKER_P_VALUE_METHOD")?;
        }

        if let Ok(val) = env::var("SYMPTOM_TRACKER_DATA_FILE") {
            self.storage.data_file = PathBuf::from(val);
        }
        if let Ok(val) = env::var("SYMPTOM_TRACKER_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.analysis.period_days == 0 {
            return Err(anyhow::anyhow!("Period length must be greater than 0 days"));
        }

        let level = self.analysis.significance_level;
        if level.is_nan() || level <= 0.0 || level >= 1.0 {
            return Err(anyhow::anyhow!(
                "Significance level must be between 0 and 1, got {}",
                level
            ));
        }

        let tolerance = self.analysis.stability_tolerance;
        if tolerance.is_nan() || tolerance < 0.0 {
            return Err(anyhow::anyhow!("Stability tolerance cannot be negative"));
        }

        if self.analysis.p_value_method == PValueMethod::Approximate {
            warn!("Using approximate p-values; significance is only a rough indication");
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            warn!(format = %self.logging.format, "Unknown log format, falling back to pretty");
        }

        // Only file logging needs the directory
        if self.logging.output != "console" && !self.paths.log_directory.exists() {
            fs::create_dir_all(&self.paths.log_directory)
                .context("Failed to create log directory")?;
        }

        Ok(())
    }

    /// Save current configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }
}

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load the configuration once, reporting any error to the caller
pub fn init_config() -> Result<&'static Config> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }
    let config = Config::load()?;
    Ok(CONFIG.get_or_init(|| config))
}

/// Get the global configuration instance
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(|| {
        Config::load().unwrap_or_else(|err| {
            warn!(error = %err, "Invalid configuration, using defaults");
            Config::default()
        })
    })
}
