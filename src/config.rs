//! Configuration management for Octolog
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files with support for environment variable overrides.

use crate::error::{OctologError, Result};
use crate::tariff::PriceBasis;
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod defaults;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Octopus API access
    pub octopus: OctopusConfig,

    /// Time-series store connection
    pub influx: InfluxConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Peak/off-peak classification
    pub peak: PeakConfig,

    /// Timezone used for "today" and time-of-day cutoffs
    pub timezone: String,
}

/// Octopus API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OctopusConfig {
    /// API key (sent as the basic auth user name)
    pub api_key: String,

    /// Account number, e.g. A-1234ABCD
    pub account: String,

    /// Postcode used to find the region when no account is configured
    pub postcode: String,

    /// API base URL
    pub base_url: String,

    /// Requested page size for paged endpoints
    pub page_size: u32,

    /// Hard cap on pages followed for a single request
    pub max_pages: u32,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Which price column to use for cost calculations
    pub price_basis: PriceBasis,
}

/// InfluxDB 1.x connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluxConfig {
    pub url: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console-only level override
    pub console_level: Option<String>,

    /// Optional file-only level override
    pub file_level: Option<String>,

    /// Path to log file (its directory receives the rolling files)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Peak/off-peak classification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakConfig {
    /// Classifier (price or time)
    pub classifier: String,

    /// Off-peak window start in HH:MM (time classifier)
    pub off_peak_start: String,

    /// Off-peak window end in HH:MM, exclusive (time classifier)
    pub off_peak_end: String,
}

impl PeakConfig {
    /// Parse the off-peak window boundaries
    pub fn off_peak_window(&self) -> Result<(NaiveTime, NaiveTime)> {
        let start = parse_hhmm("peak.off_peak_start", &self.off_peak_start)?;
        let end = parse_hhmm("peak.off_peak_end", &self.off_peak_end)?;
        Ok((start, end))
    }
}

fn parse_hhmm(field: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| OctologError::validation(field, format!("'{}': {}", value, e)))
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default locations, falling back to defaults
    pub fn load() -> Result<Self> {
        for path in Self::default_paths() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        Ok(Config::default())
    }

    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("octolog.yaml")];
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(Path::new(&home).join(".config/octolog/config.yaml"));
        }
        paths.push(PathBuf::from("/etc/octolog/config.yaml"));
        paths
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Override secrets and endpoints from the environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override from an arbitrary lookup (environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let targets: [(&str, &mut String); 5] = [
            ("OCTOPUS_APIKEY", &mut self.octopus.api_key),
            ("OCTOPUS_ACCOUNT", &mut self.octopus.account),
            ("OCTOPUS_POSTCODE", &mut self.octopus.postcode),
            ("INFLUX_URL", &mut self.influx.url),
            ("INFLUX_DATABASE", &mut self.influx.database),
        ];
        for (key, slot) in targets {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *slot = value.trim().to_string();
            }
        }
    }

    /// Parsed timezone
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| OctologError::validation("timezone", e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.octopus.base_url.trim().is_empty() {
            return Err(OctologError::validation(
                "octopus.base_url",
                "Base URL cannot be empty",
            ));
        }

        if !self.octopus.account.trim().is_empty() && self.octopus.api_key.trim().is_empty() {
            return Err(OctologError::validation(
                "octopus.api_key",
                "Account provided without API key",
            ));
        }

        if self.octopus.page_size == 0 {
            return Err(OctologError::validation(
                "octopus.page_size",
                "Must be greater than 0",
            ));
        }

        if self.octopus.max_pages == 0 {
            return Err(OctologError::validation(
                "octopus.max_pages",
                "Must be greater than 0",
            ));
        }

        if self.octopus.timeout_secs == 0 {
            return Err(OctologError::validation(
                "octopus.timeout_secs",
                "Must be greater than 0",
            ));
        }

        if self.influx.database.trim().is_empty() {
            return Err(OctologError::validation(
                "influx.database",
                "Database name cannot be empty",
            ));
        }

        match self.peak.classifier.as_str() {
            "price" | "time" => {}
            other => {
                return Err(OctologError::validation(
                    "peak.classifier",
                    format!("Unknown classifier '{}' (expected price or time)", other),
                ));
            }
        }
        self.peak.off_peak_window()?;
        self.tz()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.octopus.base_url, "https://api.octopus.energy");
        assert_eq!(config.influx.database, "octopus");
        assert_eq!(config.peak.classifier, "price");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.octopus.account = "A-1234ABCD".to_string();
        assert!(config.validate().is_err());

        config.octopus.api_key = "sk_live_x".to_string();
        assert!(config.validate().is_ok());

        config = Config::default();
        config.peak.off_peak_start = "25:00".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_ignore_blank_values() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "OCTOPUS_APIKEY" => Some(" sk_test ".to_string()),
            "OCTOPUS_ACCOUNT" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.octopus.api_key, "sk_test");
        assert!(config.octopus.account.is_empty());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "octopus:\n  account: A-1\n  api_key: k\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.octopus.account, "A-1");
        assert_eq!(config.octopus.page_size, 25000);
        assert_eq!(config.timezone, "Europe/London");
    }
}
