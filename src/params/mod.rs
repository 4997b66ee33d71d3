//! Model parameter storage.
//!
//! Parameters are an ordered mapping from string keys to [`Value`]s. Four
//! reserved keys always exist:
//!
//! | Key                    | Default      | Meaning                              |
//! |------------------------|--------------|--------------------------------------|
//! | `num_nodes`            | `3`          | Node count of the generated graph    |
//! | `graph_type`           | `"complete"` | Topology: complete, cycle or wheel   |
//! | `convergence_data_key` | `None`       | Node field watched for convergence   |
//! | `convergence_std_dev`  | `100`        | Dispersion threshold for convergence |
//!
//! Reserved keys can be overwritten but never deleted individually. Values
//! are not checked against their meaning here; consumers validate at use.

use indexmap::IndexMap;

use crate::error::{ModelError, Result};
use crate::value::Value;

/// Node count of the generated graph
pub const NUM_NODES: &str = "num_nodes";
/// Topology of the generated graph
pub const GRAPH_TYPE: &str = "graph_type";
/// Node data field used by the convergence check
pub const CONVERGENCE_DATA_KEY: &str = "convergence_data_key";
/// Standard deviation at or below which the model counts as converged
pub const CONVERGENCE_STD_DEV: &str = "convergence_std_dev";

/// Reserved keys, in construction order
pub const RESERVED_KEYS: [&str; 4] = [
    NUM_NODES,
    GRAPH_TYPE,
    CONVERGENCE_DATA_KEY,
    CONVERGENCE_STD_DEV,
];

/// Ordered parameter store with protected defaults
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterStore {
    values: IndexMap<String, Value>,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterStore {
    /// Create a store holding only the reserved defaults
    pub fn new() -> Self {
        let mut values = IndexMap::with_capacity(RESERVED_KEYS.len());
        values.insert(NUM_NODES.to_string(), Value::Integer(3));
        values.insert(GRAPH_TYPE.to_string(), Value::from("complete"));
        values.insert(CONVERGENCE_DATA_KEY.to_string(), Value::None);
        values.insert(CONVERGENCE_STD_DEV.to_string(), Value::Integer(100));
        Self { values }
    }

    /// Whether `key` is one of the reserved keys
    pub fn is_reserved(key: &str) -> bool {
        RESERVED_KEYS.contains(&key)
    }

    /// Merge key/value pairs into the store, inserting or overwriting
    pub fn update<I, K, V>(&mut self, parameters: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in parameters {
            self.values.insert(key.into(), value.into());
        }
    }

    /// Delete the given keys, or reset to defaults when `keys` is empty.
    ///
    /// All keys are validated before any is removed, so a failure leaves the
    /// store untouched.
    pub fn delete<S: AsRef<str>>(&mut self, keys: &[S]) -> Result<bool> {
        if keys.is_empty() {
            self.reset();
            return Ok(true);
        }

        if let Some(bad) = keys
            .iter()
            .map(AsRef::as_ref)
            .find(|k| Self::is_reserved(k) || !self.values.contains_key(*k))
        {
            return Err(ModelError::UnknownOrProtectedKey(bad.to_string()));
        }

        for key in keys {
            self.values.shift_remove(key.as_ref());
        }
        Ok(true)
    }

    /// Restore the reserved defaults and drop every other key
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// All keys in insertion order
    pub fn list(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    /// Number of stored parameters
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store holds no parameters
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether `key` is present
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate over key/value pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Value stored under `key`
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.values
            .get(key)
            .ok_or_else(|| ModelError::UnknownKey(key.to_string()))
    }

    /// Store `value` under `key`
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Integer stored under `key`
    pub fn get_i64(&self, key: &str) -> Result<i64> {
        self.get(key)?.as_i64().ok_or(ModelError::TypeMismatch {
            key: key.to_string(),
            expected: "an integer",
        })
    }

    /// Number stored under `key`, integers widened to `f64`
    pub fn get_f64(&self, key: &str) -> Result<f64> {
        self.get(key)?.as_f64().ok_or(ModelError::TypeMismatch {
            key: key.to_string(),
            expected: "a number",
        })
    }

    /// String stored under `key`
    pub fn get_str(&self, key: &str) -> Result<&str> {
        self.get(key)?.as_str().ok_or(ModelError::TypeMismatch {
            key: key.to_string(),
            expected: "a string",
        })
    }

    /// String stored under `key`, or `None` when the value is `Value::None`
    pub fn get_optional_str(&self, key: &str) -> Result<Option<&str>> {
        match self.get(key)? {
            Value::None => Ok(None),
            Value::String(s) => Ok(Some(s)),
            _ => Err(ModelError::TypeMismatch {
                key: key.to_string(),
                expected: "a string or none",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_in_order() {
        let params = ParameterStore::new();
        assert_eq!(
            params.list(),
            [
                "num_nodes",
                "graph_type",
                "convergence_data_key",
                "convergence_std_dev"
            ]
        );
        assert_eq!(params.get_i64(NUM_NODES).unwrap(), 3);
        assert_eq!(params.get_str(GRAPH_TYPE).unwrap(), "complete");
        assert_eq!(params.get_optional_str(CONVERGENCE_DATA_KEY).unwrap(), None);
        assert_eq!(params.get_f64(CONVERGENCE_STD_DEV).unwrap(), 100.0);
    }

    #[test]
    fn test_update_inserts_and_overwrites() {
        let mut params = ParameterStore::new();
        params.update([
            ("a_objective", Value::from(0.49)),
            ("num_nodes", Value::from(5)),
        ]);
        assert_eq!(params.get_f64("a_objective").unwrap(), 0.49);
        assert_eq!(params.get_i64(NUM_NODES).unwrap(), 5);
        assert_eq!(params.list().last().unwrap(), "a_objective");
    }

    #[test]
    fn test_update_accepts_semantically_wrong_types() {
        let mut params = ParameterStore::new();
        params.update([(NUM_NODES, 2.5)]);
        assert!(matches!(
            params.get_i64(NUM_NODES),
            Err(ModelError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_delete_reserved_fails() {
        let mut params = ParameterStore::new();
        for key in RESERVED_KEYS {
            assert!(matches!(
                params.delete(&[key]),
                Err(ModelError::UnknownOrProtectedKey(k)) if k == key
            ));
        }
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_delete_unknown_fails() {
        let mut params = ParameterStore::new();
        assert!(matches!(
            params.delete(&["missing"]),
            Err(ModelError::UnknownOrProtectedKey(_))
        ));
    }

    #[test]
    fn test_delete_is_all_or_nothing() {
        let mut params = ParameterStore::new();
        params.set("x", 1);
        params.set("y", 2);
        assert!(params.delete(&["x", "num_nodes"]).is_err());
        assert!(params.contains("x"));
        assert!(params.contains("y"));

        assert!(params.delete(&["x", "y"]).unwrap());
        assert!(!params.contains("x"));
        assert!(!params.contains("y"));
    }

    #[test]
    fn test_delete_nothing_resets() {
        let mut params = ParameterStore::new();
        params.set("num_trials", 1);
        params.set(NUM_NODES, 10);
        params.set(CONVERGENCE_DATA_KEY, "id");
        assert!(params.delete::<&str>(&[]).unwrap());
        assert_eq!(params, ParameterStore::new());
    }

    #[test]
    fn test_get_unknown_key() {
        let params = ParameterStore::new();
        assert!(matches!(params.get("nope"), Err(ModelError::UnknownKey(k)) if k == "nope"));
    }

    #[test]
    fn test_zero_is_present() {
        let mut params = ParameterStore::new();
        params.set("count", 0);
        assert_eq!(params.get_i64("count").unwrap(), 0);
        params.set("label", "");
        assert_eq!(params.get_str("label").unwrap(), "");
    }
}
