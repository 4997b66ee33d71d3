//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables
//! - CLI arguments (for `agentmodel run`)
//!
//! ```toml
//! [model]
//! num_nodes = 10
//! graph_type = "cycle"
//! convergence_data_key = "a_expectation"
//! convergence_std_dev = 0.05
//! max_timesteps = 5000
//! seed = 42
//!
//! [parameters]
//! a_objective = 0.49
//! b_objective = 0.51
//! num_trials = 1
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::model::{AgentModel, MAX_TIMESTEPS};
use crate::params::{CONVERGENCE_DATA_KEY, CONVERGENCE_STD_DEV, GRAPH_TYPE, NUM_NODES};
use crate::value::Value;

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Reserved model settings
    #[serde(default)]
    pub model: ModelSettings,

    /// Extra parameters merged into the parameter store
    #[serde(default)]
    pub parameters: IndexMap<String, Value>,
}

impl SimulationConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ModelError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        toml::from_str(&content)
            .map_err(|e| ModelError::Config(format!("Failed to parse config: {e}")))
    }

    /// Default config file location (`<config dir>/agentmodel/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("agentmodel").join("config.toml"))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("AGENTMODEL_NUM_NODES") {
            if let Ok(val) = val.parse() {
                config.model.num_nodes = val;
            }
        }
        if let Ok(val) = std::env::var("AGENTMODEL_GRAPH_TYPE") {
            config.model.graph_type = val;
        }
        if let Ok(val) = std::env::var("AGENTMODEL_SEED") {
            if let Ok(val) = val.parse() {
                config.model.seed = Some(val);
            }
        }
        if let Ok(val) = std::env::var("AGENTMODEL_MAX_TIMESTEPS") {
            if let Ok(val) = val.parse() {
                config.model.max_timesteps = val;
            }
        }

        config
    }

    /// Merge with another config (other takes precedence)
    pub fn merge(self, other: Self) -> Self {
        let defaults = ModelSettings::default();
        let pick = |mine: f64, theirs: f64, default: f64| {
            if (theirs - default).abs() > f64::EPSILON {
                theirs
            } else {
                mine
            }
        };

        let mut parameters = self.parameters;
        parameters.extend(other.parameters);

        Self {
            model: ModelSettings {
                num_nodes: if other.model.num_nodes == defaults.num_nodes {
                    self.model.num_nodes
                } else {
                    other.model.num_nodes
                },
                graph_type: if other.model.graph_type == defaults.graph_type {
                    self.model.graph_type
                } else {
                    other.model.graph_type
                },
                convergence_data_key: other
                    .model
                    .convergence_data_key
                    .or(self.model.convergence_data_key),
                convergence_std_dev: pick(
                    self.model.convergence_std_dev,
                    other.model.convergence_std_dev,
                    defaults.convergence_std_dev,
                ),
                max_timesteps: if other.model.max_timesteps == defaults.max_timesteps {
                    self.model.max_timesteps
                } else {
                    other.model.max_timesteps
                },
                seed: other.model.seed.or(self.model.seed),
            },
            parameters,
        }
    }

    /// Fill in a convergence criterion where none was configured.
    ///
    /// Applies only when no key is set. The threshold is replaced only if it
    /// is still the built-in default.
    pub fn with_convergence_fallback(mut self, data_key: &str, std_dev: f64) -> Self {
        if self.model.convergence_data_key.is_some() {
            return self;
        }
        self.model.convergence_data_key = Some(data_key.to_string());
        let default_std_dev = ModelSettings::default().convergence_std_dev;
        if (self.model.convergence_std_dev - default_std_dev).abs() <= f64::EPSILON {
            self.model.convergence_std_dev = std_dev;
        }
        self
    }

    /// Write this configuration into a model
    pub fn apply(&self, model: &mut AgentModel) {
        self.model.apply(model);
        model.update_parameters(self.parameters.clone());
    }

    /// Build a fresh model from this configuration
    pub fn build_model(&self) -> AgentModel {
        let mut model = match self.model.seed {
            Some(seed) => AgentModel::with_seed(seed),
            None => AgentModel::new(),
        };
        self.apply(&mut model);
        model
    }
}

/// Reserved model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Number of agents
    pub num_nodes: usize,

    /// Topology name (complete, cycle, wheel)
    pub graph_type: String,

    /// Node data field watched for convergence
    pub convergence_data_key: Option<String>,

    /// Convergence threshold on the field's standard deviation
    pub convergence_std_dev: f64,

    /// Iteration ceiling for run-to-convergence
    pub max_timesteps: usize,

    /// RNG seed (entropy when absent)
    pub seed: Option<u64>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            num_nodes: 3,
            graph_type: "complete".to_string(),
            convergence_data_key: None,
            convergence_std_dev: 100.0,
            max_timesteps: MAX_TIMESTEPS,
            seed: None,
        }
    }
}

impl ModelSettings {
    /// Write the reserved parameters, ceiling and seed into a model
    pub fn apply(&self, model: &mut AgentModel) {
        model.update_parameters([
            (NUM_NODES, Value::from(self.num_nodes)),
            (GRAPH_TYPE, Value::from(self.graph_type.as_str())),
            (
                CONVERGENCE_DATA_KEY,
                Value::from(self.convergence_data_key.clone()),
            ),
            (CONVERGENCE_STD_DEV, Value::from(self.convergence_std_dev)),
        ]);
        model.set_max_timesteps(self.max_timesteps);
        if let Some(seed) = self.seed {
            model.reseed(seed);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.model.num_nodes, 3);
        assert_eq!(config.model.graph_type, "complete");
        assert_eq!(config.model.max_timesteps, MAX_TIMESTEPS);
        assert!(config.parameters.is_empty());
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            [model]
            num_nodes = 10
            graph_type = "cycle"
            convergence_data_key = "a_expectation"
            convergence_std_dev = 0.05
            seed = 42

            [parameters]
            a_objective = 0.49
            num_trials = 2
            label = "zollman"
        "#;

        let config: SimulationConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.model.num_nodes, 10);
        assert_eq!(config.model.graph_type, "cycle");
        assert_eq!(config.model.convergence_data_key.as_deref(), Some("a_expectation"));
        assert_eq!(config.model.max_timesteps, MAX_TIMESTEPS);
        assert_eq!(config.model.seed, Some(42));
        assert_eq!(config.parameters["a_objective"], Value::Float(0.49));
        assert_eq!(config.parameters["num_trials"], Value::Integer(2));
        assert_eq!(config.parameters["label"], Value::from("zollman"));
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[model]\nnum_nodes = 7\ngraph_type = \"wheel\"").unwrap();
        let config = SimulationConfig::from_file(file.path()).unwrap();
        assert_eq!(config.model.num_nodes, 7);
        assert_eq!(config.model.graph_type, "wheel");
    }

    #[test]
    fn test_config_missing_file() {
        assert!(matches!(
            SimulationConfig::from_file("/nonexistent/agentmodel.toml"),
            Err(ModelError::Config(_))
        ));
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = SimulationConfig::default();
        base.model.num_nodes = 8;
        base.model.seed = Some(1);
        base.parameters.insert("x".to_string(), Value::from(1));

        let mut over = SimulationConfig::default();
        over.model.graph_type = "cycle".to_string();
        over.model.convergence_std_dev = 0.5;
        over.parameters.insert("x".to_string(), Value::from(2));

        let merged = base.merge(over);
        assert_eq!(merged.model.num_nodes, 8);
        assert_eq!(merged.model.graph_type, "cycle");
        assert_eq!(merged.model.convergence_std_dev, 0.5);
        assert_eq!(merged.model.seed, Some(1));
        assert_eq!(merged.parameters["x"], Value::from(2));
    }

    #[test]
    fn test_convergence_fallback_keeps_file_threshold() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[model]\nconvergence_std_dev = 0.01").unwrap();
        let config = SimulationConfig::from_file(file.path())
            .unwrap()
            .with_convergence_fallback("a_expectation", 0.05);
        assert_eq!(config.model.convergence_data_key.as_deref(), Some("a_expectation"));
        assert!((config.model.convergence_std_dev - 0.01).abs() < f64::EPSILON);
    }

    #[test]
    fn test_convergence_fallback_fills_defaults() {
        let config = SimulationConfig::default().with_convergence_fallback("a_expectation", 0.05);
        assert_eq!(config.model.convergence_data_key.as_deref(), Some("a_expectation"));
        assert!((config.model.convergence_std_dev - 0.05).abs() < f64::EPSILON);

        let mut keyed = SimulationConfig::default();
        keyed.model.convergence_data_key = Some("id".to_string());
        keyed.model.convergence_std_dev = 2.0;
        let keyed = keyed.with_convergence_fallback("a_expectation", 0.05);
        assert_eq!(keyed.model.convergence_data_key.as_deref(), Some("id"));
        assert!((keyed.model.convergence_std_dev - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_apply_to_model() {
        let mut config = SimulationConfig::default();
        config.model.num_nodes = 5;
        config.model.convergence_data_key = Some("id".to_string());
        config.model.max_timesteps = 10;
        config.parameters.insert("num_trials".to_string(), Value::from(4));

        let model = config.build_model();
        assert_eq!(model.num_nodes().unwrap(), 5);
        assert_eq!(model.get(CONVERGENCE_DATA_KEY).unwrap(), &Value::from("id"));
        assert_eq!(model.max_timesteps(), 10);
        assert_eq!(model.get("num_trials").unwrap(), &Value::from(4));
        assert_eq!(model.list_parameters().len(), 5);
    }
}
