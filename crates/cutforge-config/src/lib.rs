//! Configuration system for cutforge.
//!
//! Load learning-component configuration from TOML or YAML to control the
//! sample keys, the decision thresholds and fit parallelism without code
//! changes.
//!
//! # Examples
//!
//! ```
//! use cutforge_config::{FitThreadCount, LearnConfig, ThresholdConfig};
//!
//! let config = LearnConfig::from_toml_str(r#"
//!     fit_thread_count = { count = 4 }
//!
//!     [threshold]
//!     type = "min_precision"
//!     min_precision = [0.0, 0.95]
//!
//!     [user_cuts]
//!     enabled = false
//! "#).unwrap();
//!
//! assert_eq!(config.fit_thread_count, FitThreadCount::Count(4));
//! assert_eq!(config.threshold, ThresholdConfig::MinPrecision { min_precision: [0.0, 0.95] });
//! assert_eq!(config.lazy_attr(), "mip_constr_lazy_enforced");
//! assert!(!config.user_cuts.enabled);
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use cutforge_config::LearnConfig;
//!
//! let config = LearnConfig::load("learn.toml").unwrap_or_default();
//! assert_eq!(config.instance_features_key, "static_instance_features");
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sample key holding the enforced lazy constraints of a solve.
pub const DEFAULT_LAZY_ATTR: &str = "mip_constr_lazy_enforced";

/// Sample key holding the enforced user cuts of a solve.
pub const DEFAULT_USER_CUTS_ATTR: &str = "mip_user_cuts_enforced";

/// Sample key holding the instance-level feature vector.
pub const DEFAULT_INSTANCE_FEATURES_KEY: &str = "static_instance_features";

/// Sample key holding the list of lazy constraints a solve needed.
pub const DEFAULT_MEMORIZING_ATTR: &str = "mip_lazy";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main learning configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LearnConfig {
    /// Sample key of the static instance feature vector.
    #[serde(default = "default_instance_features_key")]
    pub instance_features_key: String,

    /// Threads used to fit per-category models.
    #[serde(default)]
    pub fit_thread_count: FitThreadCount,

    /// Decision threshold applied to every category.
    #[serde(default)]
    pub threshold: ThresholdConfig,

    /// Dynamic lazy-constraint component.
    #[serde(default)]
    pub lazy: ComponentConfig,

    /// User-cut component.
    #[serde(default)]
    pub user_cuts: ComponentConfig,

    /// Memorizing lazy-constraint component.
    #[serde(default)]
    pub memorizing: MemorizingConfig,
}

impl Default for LearnConfig {
    fn default() -> Self {
        Self {
            instance_features_key: default_instance_features_key(),
            fit_thread_count: FitThreadCount::default(),
            threshold: ThresholdConfig::default(),
            lazy: ComponentConfig::default(),
            user_cuts: ComponentConfig::default(),
            memorizing: MemorizingConfig::default(),
        }
    }
}

impl LearnConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the fit thread count.
    pub fn with_fit_thread_count(mut self, count: FitThreadCount) -> Self {
        self.fit_thread_count = count;
        self
    }

    /// Sets the decision threshold.
    pub fn with_threshold(mut self, threshold: ThresholdConfig) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the sample key of the instance feature vector.
    pub fn with_instance_features_key(mut self, key: impl Into<String>) -> Self {
        self.instance_features_key = key.into();
        self
    }

    /// Sample key of the enforced lazy constraints.
    pub fn lazy_attr(&self) -> &str {
        self.lazy.attr_or(DEFAULT_LAZY_ATTR)
    }

    /// Sample key of the enforced user cuts.
    pub fn user_cuts_attr(&self) -> &str {
        self.user_cuts.attr_or(DEFAULT_USER_CUTS_ATTR)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instance_features_key.is_empty() {
            return Err(ConfigError::Invalid(
                "instance_features_key must not be empty".to_string(),
            ));
        }
        if self.fit_thread_count == FitThreadCount::Count(0) {
            return Err(ConfigError::Invalid(
                "fit_thread_count must be positive".to_string(),
            ));
        }
        for (name, attr) in [("lazy", &self.lazy.attr), ("user_cuts", &self.user_cuts.attr)] {
            if attr.as_deref() == Some("") {
                return Err(ConfigError::Invalid(format!("{name}.attr must not be empty")));
            }
        }
        self.threshold.validate()?;
        self.memorizing.validate()
    }
}

fn default_instance_features_key() -> String {
    DEFAULT_INSTANCE_FEATURES_KEY.to_string()
}

/// Fit thread count configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitThreadCount {
    /// Use the global thread pool.
    #[default]
    Auto,

    /// Fit categories one after another.
    None,

    /// Dedicated pool with a specific number of threads.
    Count(usize),
}

/// Decision threshold configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThresholdConfig {
    /// Fixed minimum probability per class.
    MinProbability { min_probability: [f64; 2] },

    /// Lowest threshold reaching a minimum training precision per class.
    MinPrecision { min_precision: [f64; 2] },
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        ThresholdConfig::MinProbability {
            min_probability: [0.5, 0.5],
        }
    }
}

impl ThresholdConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let (name, values) = match self {
            ThresholdConfig::MinProbability { min_probability } => {
                ("min_probability", min_probability)
            }
            ThresholdConfig::MinPrecision { min_precision } => ("min_precision", min_precision),
        };
        if values.iter().any(|v| !(0.0..=1.0).contains(v)) {
            return Err(ConfigError::Invalid(format!(
                "{name} values must lie in [0, 1], got {values:?}"
            )));
        }
        Ok(())
    }
}

/// Dynamic constraint component configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ComponentConfig {
    /// Whether the driver assembling the components should build this one.
    ///
    /// Components never read this flag; constructing one always yields a
    /// working component.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Sample key of the enforced-violation set; the component default if unset.
    #[serde(default)]
    pub attr: Option<String>,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            attr: None,
        }
    }
}

impl ComponentConfig {
    /// Returns the configured attribute or `default`.
    pub fn attr_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.attr.as_deref().unwrap_or(default)
    }
}

fn default_true() -> bool {
    true
}

/// Memorizing lazy-constraint component configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MemorizingConfig {
    /// Whether the driver should build the memorizing component. Off by default.
    #[serde(default)]
    pub enabled: bool,

    /// Sample key of the list of needed lazy constraints.
    #[serde(default = "default_memorizing_attr")]
    pub attr: String,

    /// Scores above this value mark a constraint for enforcement.
    #[serde(default = "default_probability_cutoff")]
    pub probability_cutoff: f64,
}

impl Default for MemorizingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            attr: default_memorizing_attr(),
            probability_cutoff: default_probability_cutoff(),
        }
    }
}

impl MemorizingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.attr.is_empty() {
            return Err(ConfigError::Invalid("memorizing.attr must not be empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.probability_cutoff) {
            return Err(ConfigError::Invalid(format!(
                "memorizing.probability_cutoff must lie in [0, 1], got {}",
                self.probability_cutoff
            )));
        }
        Ok(())
    }
}

fn default_memorizing_attr() -> String {
    DEFAULT_MEMORIZING_ATTR.to_string()
}

fn default_probability_cutoff() -> f64 {
    0.5
}
