//! # AgentModel - Agent-Based Modeling Harness
//!
//! A small, single-threaded driver for agent-based simulations. A population
//! of agents sits on the nodes of a graph; callers plug in how each agent's
//! state starts and how the whole population advances by one timestep, and
//! the harness repeats timesteps until a convergence criterion holds.
//!
//! ## Features
//!
//! - **Parameter store**: ordered string-keyed parameters with protected defaults
//! - **Canonical topologies**: complete, cycle and wheel graphs (petgraph-backed)
//! - **Pluggable behavior**: node data initializer and timestep function
//! - **Convergence loop**: stop when a node field's standard deviation drops
//!   to a threshold, bounded by a timestep ceiling
//! - **Reproducible randomness**: every model owns a seedable RNG that is
//!   handed to its plug-ins
//! - **Reference model**: two-armed bandit social-learning dynamics
//!
//! ## Architecture
//!
//! ```text
//!   ParameterStore ──┐
//!                    │ num_nodes, graph_type
//!                    v
//!   GraphType::build ──> AgentGraph ──> NodeDataInitializer (per node)
//!                            │
//!                            v
//!   run_to_convergence: [check dispersion] ──> TimestepFunction ──┐
//!                            ^                                    │
//!                            └────────────────────────────────────┘
//! ```
//!
//! ### Reserved Parameters
//!
//! | Key                    | Default      | Used by                    |
//! |------------------------|--------------|----------------------------|
//! | `num_nodes`            | `3`          | `initialize_graph`         |
//! | `graph_type`           | `"complete"` | `initialize_graph`         |
//! | `convergence_data_key` | `None`       | `run_to_convergence`       |
//! | `convergence_std_dev`  | `100`        | `run_to_convergence`       |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use agentmodel::{AgentModel, BanditConfig};
//!
//! let mut model = AgentModel::with_seed(42);
//! model.update_parameters([("num_nodes", 10)]);
//! BanditConfig::default().install(&mut model);
//! model.initialize_graph()?;
//!
//! model.set("convergence_data_key", "a_expectation");
//! model.set("convergence_std_dev", 0.05);
//! let t = model.run_to_convergence()?;
//! println!("converged after {t} timesteps");
//! ```
//!
//! ## Modules
//!
//! - [`params`]: Parameter store and reserved keys
//! - [`topology`]: Graph types and the agent graph
//! - [`model`]: Agent model, plug-in traits and convergence
//! - [`bandit`]: Two-armed bandit reference model
//! - [`config`]: Configuration management
//! - [`value`]: Parameter and node data values
//! - [`error`]: Error types and result aliases

pub mod bandit;
pub mod config;
pub mod error;
pub mod model;
pub mod params;
pub mod topology;
pub mod value;

// Re-exports for convenience
pub use bandit::{Arm, BanditConfig};
pub use config::{ModelSettings, SimulationConfig};
pub use error::{ModelError, Result};
pub use model::{
    AgentModel, ConvergenceCriterion, ModelParts, ModelRng, NodeDataInitializer,
    TimestepFunction, MAX_TIMESTEPS,
};
pub use params::ParameterStore;
pub use topology::{AgentGraph, GraphType};
pub use value::{NodeData, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
