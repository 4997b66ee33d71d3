//! Two-armed bandit learning model.
//!
//! Each agent keeps Beta-distribution counters for two arms, `a` and `b`, and
//! a point expectation `alpha / (alpha + beta)` for each. Every timestep an
//! agent greedily pulls the arm it currently expects to pay off more (ties go
//! to `b`), observes `num_trials` Bernoulli trials with that arm's objective
//! success rate, and updates the arm:
//!
//! ```text
//! alpha += successes ~ Binomial(num_trials, objective)
//! beta  += num_trials
//! expectation = alpha / (alpha + beta)
//! ```
//!
//! # Node data
//!
//! | Field           | Type    | Initial value                  |
//! |-----------------|---------|--------------------------------|
//! | `a_alpha`       | integer | uniform in 1..=4               |
//! | `a_beta`        | integer | uniform in 1..=4               |
//! | `b_alpha`       | integer | uniform in 1..=4               |
//! | `b_beta`        | integer | uniform in 1..=4               |
//! | `a_expectation` | float   | `a_alpha / (a_alpha + a_beta)` |
//! | `b_expectation` | float   | `b_alpha / (b_alpha + b_beta)` |
//!
//! # Parameters
//!
//! | Key           | Default |
//! |---------------|---------|
//! | `a_objective` | 0.49    |
//! | `b_objective` | 0.51    |
//! | `num_trials`  | 1       |

use rand::Rng;
use rand_distr::{Binomial, Distribution};

use crate::error::{ModelError, Result};
use crate::model::{AgentModel, ModelParts, ModelRng};
use crate::params::ParameterStore;
use crate::value::{NodeData, Value};

/// Success rate of arm `a`
pub const A_OBJECTIVE: &str = "a_objective";
/// Success rate of arm `b`
pub const B_OBJECTIVE: &str = "b_objective";
/// Bernoulli trials per pull
pub const NUM_TRIALS: &str = "num_trials";

/// Bandit arm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arm {
    /// First arm
    A,
    /// Second arm
    B,
}

impl Arm {
    /// `alpha` counter field
    pub fn alpha_key(self) -> &'static str {
        match self {
            Arm::A => "a_alpha",
            Arm::B => "b_alpha",
        }
    }

    /// `beta` counter field
    pub fn beta_key(self) -> &'static str {
        match self {
            Arm::A => "a_beta",
            Arm::B => "b_beta",
        }
    }

    /// Expectation field
    pub fn expectation_key(self) -> &'static str {
        match self {
            Arm::A => "a_expectation",
            Arm::B => "b_expectation",
        }
    }

    /// Arm a node with the given data would pull next
    pub fn preferred(node: usize, data: &NodeData) -> Result<Self> {
        let a = numeric_field(node, data, Arm::A.expectation_key())?;
        let b = numeric_field(node, data, Arm::B.expectation_key())?;
        Ok(if a > b { Arm::A } else { Arm::B })
    }
}

/// Bandit parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BanditConfig {
    /// Success rate of arm `a`
    pub a_objective: f64,
    /// Success rate of arm `b`
    pub b_objective: f64,
    /// Bernoulli trials per pull
    pub num_trials: u64,
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            a_objective: 0.49,
            b_objective: 0.51,
            num_trials: 1,
        }
    }
}

impl BanditConfig {
    /// Read the bandit parameters from a parameter store
    pub fn from_params(params: &ParameterStore) -> Result<Self> {
        let num_trials = params.get_i64(NUM_TRIALS)?;
        let num_trials = u64::try_from(num_trials).map_err(|_| {
            ModelError::invalid_parameter(NUM_TRIALS, format!("must be non-negative, got {num_trials}"))
        })?;
        Ok(Self {
            a_objective: params.get_f64(A_OBJECTIVE)?,
            b_objective: params.get_f64(B_OBJECTIVE)?,
            num_trials,
        })
    }

    /// Write these values into the model parameters
    pub fn apply(&self, model: &mut AgentModel) {
        model.update_parameters([
            (A_OBJECTIVE, Value::from(self.a_objective)),
            (B_OBJECTIVE, Value::from(self.b_objective)),
            (NUM_TRIALS, Value::Integer(self.num_trials as i64)),
        ]);
    }

    /// Write the parameters and register the bandit plug-ins
    pub fn install(&self, model: &mut AgentModel) {
        self.apply(model);
        model.set_initializer(initial_data);
        model.set_timestep_function(timestep);
    }

    fn distribution(&self, arm: Arm) -> Result<Binomial> {
        let (key, p) = match arm {
            Arm::A => (A_OBJECTIVE, self.a_objective),
            Arm::B => (B_OBJECTIVE, self.b_objective),
        };
        Binomial::new(self.num_trials, p)
            .map_err(|e| ModelError::invalid_parameter(key, format!("{e} (got {p})")))
    }
}

fn numeric_field(node: usize, data: &NodeData, key: &str) -> Result<f64> {
    data.get(key)
        .ok_or_else(|| ModelError::MissingDataField {
            node,
            key: key.to_string(),
        })?
        .as_f64()
        .ok_or_else(|| ModelError::NonNumericField {
            node,
            key: key.to_string(),
        })
}

fn counter_field(node: usize, data: &NodeData, key: &str) -> Result<i64> {
    data.get(key)
        .ok_or_else(|| ModelError::MissingDataField {
            node,
            key: key.to_string(),
        })?
        .as_i64()
        .ok_or_else(|| ModelError::NonNumericField {
            node,
            key: key.to_string(),
        })
}

fn expectation(alpha: i64, beta: i64) -> f64 {
    alpha as f64 / (alpha + beta) as f64
}

/// Initial node data: random Beta counters in 1..=4 and their expectations
pub fn initial_data(rng: &mut ModelRng) -> NodeData {
    let a_alpha: i64 = rng.gen_range(1..=4);
    let a_beta: i64 = rng.gen_range(1..=4);
    let b_alpha: i64 = rng.gen_range(1..=4);
    let b_beta: i64 = rng.gen_range(1..=4);

    NodeData::from([
        (Arm::A.alpha_key().to_string(), Value::from(a_alpha)),
        (Arm::A.beta_key().to_string(), Value::from(a_beta)),
        (Arm::B.alpha_key().to_string(), Value::from(b_alpha)),
        (Arm::B.beta_key().to_string(), Value::from(b_beta)),
        (
            Arm::A.expectation_key().to_string(),
            Value::from(expectation(a_alpha, a_beta)),
        ),
        (
            Arm::B.expectation_key().to_string(),
            Value::from(expectation(b_alpha, b_beta)),
        ),
    ])
}

/// One round: every agent pulls its preferred arm and updates that arm
pub fn timestep(model: &mut AgentModel) -> Result<()> {
    let config = BanditConfig::from_params(model.params())?;
    let arm_a = config.distribution(Arm::A)?;
    let arm_b = config.distribution(Arm::B)?;
    let trials = config.num_trials as i64;

    let ModelParts { graph, rng, .. } = model.parts_mut()?;
    for (node, data) in graph.nodes_mut() {
        let arm = Arm::preferred(node, data)?;
        let successes = match arm {
            Arm::A => arm_a.sample(rng),
            Arm::B => arm_b.sample(rng),
        } as i64;

        let alpha = counter_field(node, data, arm.alpha_key())? + successes;
        let beta = counter_field(node, data, arm.beta_key())? + trials;
        data.insert(arm.alpha_key().to_string(), Value::from(alpha));
        data.insert(arm.beta_key().to_string(), Value::from(beta));
        data.insert(
            arm.expectation_key().to_string(),
            Value::from(expectation(alpha, beta)),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_initial_data_ranges() {
        let mut rng = ModelRng::seed_from_u64(11);
        for _ in 0..200 {
            let data = initial_data(&mut rng);
            for arm in [Arm::A, Arm::B] {
                let alpha = data[arm.alpha_key()].as_i64().unwrap();
                let beta = data[arm.beta_key()].as_i64().unwrap();
                assert!((1..=4).contains(&alpha));
                assert!((1..=4).contains(&beta));
                let e = data[arm.expectation_key()].as_f64().unwrap();
                assert!((0.0..=1.0).contains(&e));
                assert!((e - expectation(alpha, beta)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_preferred_arm_tie_goes_to_b() {
        let data = NodeData::from([
            ("a_expectation".to_string(), Value::from(0.5)),
            ("b_expectation".to_string(), Value::from(0.5)),
        ]);
        assert_eq!(Arm::preferred(0, &data).unwrap(), Arm::B);
    }

    #[test]
    fn test_config_from_params() {
        let mut model = AgentModel::new();
        assert!(matches!(
            BanditConfig::from_params(model.params()),
            Err(ModelError::UnknownKey(_))
        ));
        BanditConfig::default().apply(&mut model);
        assert_eq!(
            BanditConfig::from_params(model.params()).unwrap(),
            BanditConfig::default()
        );
    }

    #[test]
    fn test_invalid_objective_rejected() {
        let mut model = AgentModel::with_seed(3);
        BanditConfig {
            a_objective: 1.5,
            ..BanditConfig::default()
        }
        .install(&mut model);
        model.initialize_graph().unwrap();
        assert!(matches!(
            model.timestep(),
            Err(ModelError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_certain_arm_updates() {
        let mut model = AgentModel::with_seed(5);
        BanditConfig {
            a_objective: 1.0,
            b_objective: 0.0,
            num_trials: 3,
        }
        .install(&mut model);
        model.set_initializer(|_rng: &mut ModelRng| {
            NodeData::from([
                ("a_alpha".to_string(), Value::from(3)),
                ("a_beta".to_string(), Value::from(1)),
                ("b_alpha".to_string(), Value::from(1)),
                ("b_beta".to_string(), Value::from(1)),
                ("a_expectation".to_string(), Value::from(0.75)),
                ("b_expectation".to_string(), Value::from(0.5)),
            ])
        });
        model.initialize_graph().unwrap();
        model.timestep().unwrap();
        for (_, data) in model.graph().unwrap().nodes() {
            assert_eq!(data["a_alpha"], Value::from(6));
            assert_eq!(data["a_beta"], Value::from(4));
            assert_eq!(data["a_expectation"], Value::from(0.6));
            assert_eq!(data["b_alpha"], Value::from(1));
            assert_eq!(data["b_beta"], Value::from(1));
        }
    }

    #[test]
    fn test_timestep_missing_fields() {
        let mut model = AgentModel::new();
        BanditConfig::default().install(&mut model);
        model.set_initializer(|_rng: &mut ModelRng| NodeData::new());
        model.initialize_graph().unwrap();
        assert!(matches!(
            model.timestep(),
            Err(ModelError::MissingDataField { .. })
        ));
    }
}
