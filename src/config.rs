//! Configuration for dynamic networks and their entity stores.
use crate::error::{DynError, Result};
use serde::de::Error;
use std::path::Path;

/// Network configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Column whose intervals mark an entity's own existence
    #[serde(default = "Config::default_identity_column")]
    pub identity_column: String,

    /// Returned by `min_time` when no finite endpoint was ever inserted
    #[serde(default = "Config::default_fallback_min_time")]
    pub fallback_min_time: f64,

    #[serde(default = "Config::default_fallback_max_time")]
    pub fallback_max_time: f64,

    /// Emit a warning for every overlap the overwrite policy cannot resolve
    #[serde(default = "Config::default_log_ambiguous_overlaps")]
    pub log_ambiguous_overlaps: bool,
}

impl Config {
    fn default_identity_column() -> String {
        "name".to_string()
    }

    const fn default_fallback_min_time() -> f64 {
        -1.0
    }

    const fn default_fallback_max_time() -> f64 {
        1.0
    }

    const fn default_log_ambiguous_overlaps() -> bool {
        true
    }

    pub fn with_identity_column(mut self, column: impl Into<String>) -> Self {
        self.identity_column = column.into();
        self
    }

    pub fn with_fallback_times(mut self, min: f64, max: f64) -> Self {
        self.fallback_min_time = min;
        self.fallback_max_time = max;
        self
    }

    pub fn with_log_ambiguous_overlaps(mut self, enabled: bool) -> Self {
        self.log_ambiguous_overlaps = enabled;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.identity_column.trim().is_empty() {
            return Err("Identity column must not be empty".to_string());
        }

        if !self.fallback_min_time.is_finite() || !self.fallback_max_time.is_finite() {
            return Err("Fallback times must be finite".to_string());
        }

        if self.fallback_min_time > self.fallback_max_time {
            return Err(format!(
                "Fallback min time {} is after fallback max time {}",
                self.fallback_min_time, self.fallback_max_time
            ));
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load a configuration file. `.toml` files need the `toml` feature;
    /// anything else is read as JSON.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            #[cfg(feature = "toml")]
            {
                return Self::from_toml(&contents)
                    .map_err(|e| DynError::InvalidConfig(e.to_string()));
            }
            #[cfg(not(feature = "toml"))]
            {
                return Err(DynError::InvalidConfig(format!(
                    "{} is a TOML file but the `toml` feature is disabled",
                    path.display()
                )));
            }
        }

        Self::from_json(&contents).map_err(|e| DynError::InvalidConfig(e.to_string()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identity_column: Self::default_identity_column(),
            fallback_min_time: Self::default_fallback_min_time(),
            fallback_max_time: Self::default_fallback_max_time(),
            log_ambiguous_overlaps: Self::default_log_ambiguous_overlaps(),
        }
    }
}
