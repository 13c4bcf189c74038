//! Configuration system for logic tree runs.
//!
//! Load the logic tree inputs and the realization settings from TOML or YAML
//! files instead of wiring them in code.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use logictree_config::{LogicTreeConfig, RealizationMode};
//!
//! let config = LogicTreeConfig::from_toml_str(r#"
//!     base_path = "/data/hazard"
//!     source_model_logic_tree_file = "source_model_logic_tree.xml"
//!     gsim_logic_tree_file = "gmpe_logic_tree.xml"
//!     number_of_logic_tree_samples = 10
//!     random_seed = 23
//! "#).unwrap();
//!
//! assert_eq!(
//!     config.realization_mode(),
//!     RealizationMode::Sample { count: 10, seed: 23 }
//! );
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use logictree_config::LogicTreeConfig;
//!
//! let config = LogicTreeConfig::load("job.toml").unwrap_or_default();
//! // Full enumeration with validation enabled
//! assert!(config.validate);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum value for a seed number
pub const MIN_SINT_32: i64 = -(1 << 31);

/// Maximum value for a seed number
pub const MAX_SINT_32: i64 = (1 << 31) - 1;

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

/// How a tree is turned into realizations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealizationMode {
    /// Every root-to-leaf path, each with its exact weight.
    Enumerate,

    /// `count` independent weighted draws from a generator seeded with `seed`.
    Sample { count: usize, seed: i64 },
}

/// Main logic tree configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LogicTreeConfig {
    /// Directory that logic tree files and source models are relative to.
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,

    /// Source model logic tree document.
    #[serde(default)]
    pub source_model_logic_tree_file: Option<PathBuf>,

    /// Ground-motion-model logic tree document.
    #[serde(default)]
    pub gsim_logic_tree_file: Option<PathBuf>,

    /// Number of sampled realizations; zero means full enumeration.
    #[serde(default)]
    pub number_of_logic_tree_samples: usize,

    /// Seed for sampling.
    #[serde(default = "default_random_seed")]
    pub random_seed: i64,

    /// Whether trees are validated while parsed.
    #[serde(default = "default_validate")]
    pub validate: bool,

    /// Restricts the tectonic region types considered by the GMPE tree.
    #[serde(default)]
    pub tectonic_region_types: Option<Vec<String>>,
}

fn default_base_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_random_seed() -> i64 {
    42
}

fn default_validate() -> bool {
    true
}

impl Default for LogicTreeConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            source_model_logic_tree_file: None,
            gsim_logic_tree_file: None,
            number_of_logic_tree_samples: 0,
            random_seed: default_random_seed(),
            validate: default_validate(),
            tectonic_region_types: None,
        }
    }
}

impl LogicTreeConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, contains invalid TOML, or holds
    /// out-of-range values.
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
        config.validated()
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validated()
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate_values(&self) -> Result<(), ConfigError> {
        if !(MIN_SINT_32..=MAX_SINT_32).contains(&self.random_seed) {
            return Err(ConfigError::Invalid(format!(
                "random_seed {} is outside [{MIN_SINT_32}, {MAX_SINT_32}]",
                self.random_seed
            )));
        }
        if let Some(trts) = &self.tectonic_region_types {
            let mut sorted: Vec<&String> = trts.iter().collect();
            sorted.sort();
            if sorted.windows(2).any(|pair| pair[0] == pair[1]) {
                return Err(ConfigError::Invalid(format!(
                    "tectonic_region_types are not distinct: {}",
                    trts.join(",")
                )));
            }
        }
        Ok(())
    }

    fn validated(self) -> Result<Self, ConfigError> {
        self.validate_values()?;
        Ok(self)
    }

    /// Sets the base path.
    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Sets the source model logic tree file.
    pub fn with_source_model_logic_tree(mut self, file: impl Into<PathBuf>) -> Self {
        self.source_model_logic_tree_file = Some(file.into());
        self
    }

    /// Sets the GMPE logic tree file.
    pub fn with_gsim_logic_tree(mut self, file: impl Into<PathBuf>) -> Self {
        self.gsim_logic_tree_file = Some(file.into());
        self
    }

    /// Switches to sampling with the given count and seed.
    pub fn with_sampling(mut self, count: usize, seed: i64) -> Self {
        self.number_of_logic_tree_samples = count;
        self.random_seed = seed;
        self
    }

    /// Enables or disables validation while parsing.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Restricts the GMPE tree to the given tectonic region types.
    pub fn with_tectonic_region_types<I, S>(mut self, trts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tectonic_region_types = Some(trts.into_iter().map(Into::into).collect());
        self
    }

    /// Returns enumeration when no samples are requested, sampling otherwise.
    pub fn realization_mode(&self) -> RealizationMode {
        if self.number_of_logic_tree_samples == 0 {
            RealizationMode::Enumerate
        } else {
            RealizationMode::Sample {
                count: self.number_of_logic_tree_samples,
                seed: self.random_seed,
            }
        }
    }

    /// Resolves a configured file against the base path.
    pub fn resolve(&self, file: impl AsRef<Path>) -> PathBuf {
        self.base_path.join(file)
    }
}
