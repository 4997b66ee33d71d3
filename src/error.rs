//! Agent model error types.
//!
//! Every failure is surfaced synchronously to the caller. Nothing in the
//! crate retries or rolls back: a failed `initialize_graph` or `timestep`
//! leaves the model in whatever state the failure occurred in.

use thiserror::Error;

/// Agent model errors.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Delete requested for a key that is absent or reserved.
    #[error("Unknown or protected parameter: {0}")]
    UnknownOrProtectedKey(String),

    /// Lookup of a parameter that is not in the store.
    #[error("Unknown parameter: {0}")]
    UnknownKey(String),

    /// Parameter exists but holds a different value variant.
    #[error("Parameter {key} is not {expected}")]
    TypeMismatch {
        /// Parameter key.
        key: String,
        /// Expected variant description.
        expected: &'static str,
    },

    /// Parameter value is outside its valid domain.
    #[error("Invalid parameter {key}: {reason}")]
    InvalidParameter {
        /// Parameter key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Replacement graph does not satisfy the graph contract.
    #[error("Invalid graph assignment: {0}")]
    InvalidGraphAssignment(String),

    /// Operation needs a graph but none has been built.
    #[error("Graph not initialized")]
    GraphNotInitialized,

    /// No node data initializer registered.
    #[error("No node data initializer registered")]
    MissingInitializer,

    /// No timestep function registered.
    #[error("No timestep function registered")]
    MissingTimestepFunction,

    /// `convergence_data_key` is unset.
    #[error("No convergence data key specified")]
    NoConvergenceKey,

    /// A node lacks the field being inspected.
    #[error("Node {node} has no data field {key}")]
    MissingDataField {
        /// Node label.
        node: usize,
        /// Field name.
        key: String,
    },

    /// A node holds a non-numeric value in a numeric field.
    #[error("Node {node} field {key} is not numeric")]
    NonNumericField {
        /// Node label.
        node: usize,
        /// Field name.
        key: String,
    },

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for agent model operations
pub type Result<T> = std::result::Result<T, ModelError>;

impl From<toml::de::Error> for ModelError {
    fn from(err: toml::de::Error) -> Self {
        ModelError::Config(err.to_string())
    }
}

impl ModelError {
    pub(crate) fn invalid_parameter(key: &str, reason: impl Into<String>) -> Self {
        ModelError::InvalidParameter {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
