use crate::error::{AgriSenseError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Agronomic cut-offs used by the rule catalog. The defaults are illustrative
/// and should be adapted to real lab ranges and crop needs.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Thresholds {
    pub npk: NpkThresholds,
    pub ph: PhThresholds,
    /// Relative humidity (%) above which leaf spots with stem lesions read as blight
    pub blight_humidity_above: f64,
    /// Nitrogen (ppm) below which yellowing reads as nitrogen deficiency
    pub nitrogen_deficiency_below: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            npk: NpkThresholds::default(),
            ph: PhThresholds::default(),
            blight_humidity_above: 75.0,
            nitrogen_deficiency_below: 50.0,
        }
    }
}

/// Nutrient level bands in ppm: below `low_below` is low, below
/// `medium_below` is medium, anything else is high.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NpkThresholds {
    pub low_below: f64,
    pub medium_below: f64,
}

impl Default for NpkThresholds {
    fn default() -> Self {
        Self {
            low_below: 50.0,
            medium_below: 150.0,
        }
    }
}

/// Soil pH band considered normal. Both bounds are exclusive triggers:
/// pH strictly below `acidic_below` or strictly above `alkaline_above` is extreme.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PhThresholds {
    pub acidic_below: f64,
    pub alkaline_above: f64,
}

impl Default for PhThresholds {
    fn default() -> Self {
        Self {
            acidic_below: 5.5,
            alkaline_above: 7.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on rule firings in one run
    pub max_iterations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
        }
    }
}

impl Config {
    /// Load configuration from an explicit path or the standard locations.
    ///
    /// An explicit path must exist. Without one, a missing file falls back to
    /// the built-in defaults.
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => {
                if !p.exists() {
                    return Err(AgriSenseError::Config(format!(
                        "Config file not found at {:?}",
                        p
                    )));
                }
                p
            }
            None => match Self::find_config_path() {
                Some(p) => p,
                None => {
                    tracing::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        tracing::debug!("Loading config from {}", config_path.display());

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| AgriSenseError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_yaml_str(&config_str)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content)?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| AgriSenseError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let npk = &self.thresholds.npk;
        if npk.low_below >= npk.medium_below {
            return Err(AgriSenseError::Config(format!(
                "thresholds.npk.low_below ({}) must be below medium_below ({})",
                npk.low_below, npk.medium_below
            )));
        }

        let ph = &self.thresholds.ph;
        if ph.acidic_below >= ph.alkaline_above {
            return Err(AgriSenseError::Config(format!(
                "thresholds.ph.acidic_below ({}) must be below alkaline_above ({})",
                ph.acidic_below, ph.alkaline_above
            )));
        }

        if self.engine.max_iterations == 0 {
            return Err(AgriSenseError::Config(
                "engine.max_iterations must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Search for a config file in standard locations.
    fn find_config_path() -> Option<PathBuf> {
        // Try current directory first
        let local_config = PathBuf::from("config/agrisense.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        let xdg_config = dirs::config_dir()?.join("agrisense").join("config.yaml");
        if xdg_config.exists() {
            return Some(xdg_config);
        }

        None
    }

    /// Path of the config file that `load(None)` would read, if any.
    pub fn located(config_override: Option<&PathBuf>) -> Option<PathBuf> {
        match config_override {
            Some(p) if p.exists() => Some(p.clone()),
            Some(_) => None,
            None => Self::find_config_path(),
        }
    }

    /// Default path for writing new config files (~/.config/agrisense/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AgriSenseError::Config("Cannot determine config directory".into()))?
            .join("agrisense");
        Ok(config_dir.join("config.yaml"))
    }

    /// Write this configuration with a header comment. Returns the path written.
    pub fn write_to(&self, path: Option<PathBuf>) -> Result<PathBuf> {
        let config_path = match path {
            Some(p) => p,
            None => Self::default_config_path()?,
        };
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)
            .map_err(|e| AgriSenseError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# AgriSense Configuration\n# Generated by `agrisense init`\n# Thresholds are illustrative; adapt them to local lab ranges.\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(&config_path, content)?;

        Ok(config_path)
    }

    fn substitute_env_vars(content: &str) -> Result<String> {
        let mut result = content.to_string();

        // Find all ${VAR_NAME} patterns and substitute
        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| AgriSenseError::Config(format!("Bad substitution pattern: {}", e)))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let config = Config::default();
        assert_eq!(config.thresholds.npk.low_below, 50.0);
        assert_eq!(config.thresholds.npk.medium_below, 150.0);
        assert_eq!(config.thresholds.ph.acidic_below, 5.5);
        assert_eq!(config.thresholds.ph.alkaline_above, 7.8);
        assert_eq!(config.thresholds.blight_humidity_above, 75.0);
        assert_eq!(config.engine.max_iterations, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = Config::from_yaml_str("thresholds:\n  npk:\n    low_below: 40\n").unwrap();
        assert_eq!(config.thresholds.npk.low_below, 40.0);
        assert_eq!(config.thresholds.npk.medium_below, 150.0);
        assert_eq!(config.thresholds.ph, PhThresholds::default());
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn inverted_npk_bands_are_rejected() {
        let yaml = "thresholds:\n  npk:\n    low_below: 200\n    medium_below: 150\n";
        let err = Config::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("low_below"));
    }

    #[test]
    fn inverted_ph_band_is_rejected() {
        let yaml = "thresholds:\n  ph:\n    acidic_below: 8.0\n    alkaline_above: 7.0\n";
        assert!(Config::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn zero_iterations_is_rejected() {
        let yaml = "engine:\n  max_iterations: 0\n";
        assert!(Config::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn env_vars_are_substituted() {
        std::env::set_var("AGRISENSE_TEST_MAX_ITER", "42");
        let yaml = "engine:\n  max_iterations: ${AGRISENSE_TEST_MAX_ITER}\n";
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.engine.max_iterations, 42);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let path = PathBuf::from("/nonexistent/agrisense/config.yaml");
        assert!(Config::load(Some(path)).is_err());
    }

    #[test]
    fn written_config_loads_back() {
        let path = std::env::temp_dir()
            .join(format!("agrisense-config-{}", std::process::id()))
            .join("config.yaml");
        let written = Config::default().write_to(Some(path.clone())).unwrap();
        assert_eq!(written, path);

        let loaded = Config::load(Some(path.clone())).unwrap();
        assert_eq!(loaded, Config::default());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
