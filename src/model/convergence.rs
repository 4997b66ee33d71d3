//! Convergence evaluation.
//!
//! A model is converged when the population standard deviation of one node
//! data field, taken over every node, is at or below a threshold.

use ndarray::aview1;

use crate::error::{ModelError, Result};
use crate::params::{ParameterStore, CONVERGENCE_DATA_KEY, CONVERGENCE_STD_DEV};
use crate::topology::AgentGraph;

/// Population standard deviation (ddof = 0). `NaN` for an empty slice.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    aview1(values).std(0.0)
}

/// Numeric value of `data_key` on every node, in label order
pub fn field_samples(graph: &AgentGraph, data_key: &str) -> Result<Vec<f64>> {
    graph
        .field_values(data_key)?
        .into_iter()
        .enumerate()
        .map(|(node, value)| {
            value.as_f64().ok_or_else(|| ModelError::NonNumericField {
                node,
                key: data_key.to_string(),
            })
        })
        .collect()
}

/// Standard deviation of `data_key` across all nodes
pub fn dispersion(graph: &AgentGraph, data_key: &str) -> Result<f64> {
    Ok(population_std_dev(&field_samples(graph, data_key)?))
}

/// Whether `data_key` has dispersion at or below `std_dev`
pub fn is_converged(graph: &AgentGraph, data_key: &str, std_dev: f64) -> Result<bool> {
    Ok(dispersion(graph, data_key)? <= std_dev)
}

/// Stopping rule read from the reserved convergence parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceCriterion {
    /// Node data field to watch
    pub data_key: String,
    /// Inclusive dispersion threshold
    pub std_dev: f64,
}

impl ConvergenceCriterion {
    /// Create a criterion directly
    pub fn new(data_key: impl Into<String>, std_dev: f64) -> Self {
        Self {
            data_key: data_key.into(),
            std_dev,
        }
    }

    /// Read `convergence_data_key` and `convergence_std_dev`.
    ///
    /// An unset or empty key fails with [`ModelError::NoConvergenceKey`]; a
    /// negative or NaN threshold is rejected.
    pub fn from_params(params: &ParameterStore) -> Result<Self> {
        let data_key = match params.get_optional_str(CONVERGENCE_DATA_KEY)? {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => return Err(ModelError::NoConvergenceKey),
        };

        let std_dev = params.get_f64(CONVERGENCE_STD_DEV)?;
        if std_dev.is_nan() || std_dev < 0.0 {
            return Err(ModelError::invalid_parameter(
                CONVERGENCE_STD_DEV,
                format!("must be a non-negative number, got {std_dev}"),
            ));
        }

        Ok(Self { data_key, std_dev })
    }

    /// Current dispersion of the watched field
    pub fn dispersion(&self, graph: &AgentGraph) -> Result<f64> {
        dispersion(graph, &self.data_key)
    }

    /// Whether a measured dispersion is within the threshold
    pub fn accepts(&self, dispersion: f64) -> bool {
        dispersion <= self.std_dev
    }

    /// Whether `graph` satisfies this criterion
    pub fn is_met(&self, graph: &AgentGraph) -> Result<bool> {
        Ok(self.accepts(self.dispersion(graph)?))
    }
}
