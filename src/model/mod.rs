//! Agent model orchestration.
//!
//! [`AgentModel`] owns a [`ParameterStore`], an optional [`AgentGraph`] and
//! two caller-supplied plug-ins:
//!
//! - a [`NodeDataInitializer`] producing each node's starting data
//! - a [`TimestepFunction`] advancing the whole population by one step
//!
//! # Lifecycle
//!
//! ```text
//!   new() ──> update_parameters() ──> set_initializer() ──> initialize_graph()
//!                                                              │
//!                  set_timestep_function() ──> timestep() <────┘
//!                                                 │  ▲
//!                                                 ▼  │ (not converged, t < max)
//!                                          run_to_convergence()
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use agentmodel::{AgentModel, NodeData, Value};
//!
//! let mut model = AgentModel::with_seed(7);
//! model.set_initializer(|_rng: &mut agentmodel::ModelRng| {
//!     NodeData::from([("id".to_string(), Value::from(10))])
//! });
//! model.initialize_graph()?;
//! model.set_timestep_function(|m: &mut AgentModel| -> agentmodel::Result<()> {
//!     for (_, data) in m.graph_mut()?.nodes_mut() {
//!         let id = data["id"].as_i64().unwrap_or_default();
//!         data.insert("id".to_string(), Value::from(id + 1));
//!     }
//!     Ok(())
//! });
//! model.timestep()?;
//! ```

pub mod convergence;

use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;

pub use convergence::ConvergenceCriterion;

use crate::error::{ModelError, Result};
use crate::params::{ParameterStore, GRAPH_TYPE, NUM_NODES};
use crate::topology::{AgentGraph, GraphType};
use crate::value::{NodeData, Value};

/// Default ceiling on `run_to_convergence` iterations
pub const MAX_TIMESTEPS: usize = 100_000;

/// Random number generator owned by a model and handed to its plug-ins
pub type ModelRng = StdRng;

/// Produces the initial data of one node
pub trait NodeDataInitializer {
    /// Fresh data for a single node; called once per node
    fn initial_data(&mut self, rng: &mut ModelRng) -> NodeData;
}

impl<F> NodeDataInitializer for F
where
    F: FnMut(&mut ModelRng) -> NodeData,
{
    fn initial_data(&mut self, rng: &mut ModelRng) -> NodeData {
        self(rng)
    }
}

/// Advances a model by one discrete step.
///
/// Implementations may read any parameter and read or write any node's data,
/// but must not change the graph's topology.
pub trait TimestepFunction {
    /// Mutate `model` in place
    fn step(&mut self, model: &mut AgentModel) -> Result<()>;
}

impl<F> TimestepFunction for F
where
    F: FnMut(&mut AgentModel) -> Result<()>,
{
    fn step(&mut self, model: &mut AgentModel) -> Result<()> {
        self(model)
    }
}

/// Disjoint mutable views into a model, for timestep functions that sample
/// while mutating node data
pub struct ModelParts<'a> {
    /// Model parameters
    pub params: &'a mut ParameterStore,
    /// Agent graph
    pub graph: &'a mut AgentGraph,
    /// Model RNG
    pub rng: &'a mut ModelRng,
}

/// Agent-based model: parameters, graph and plug-ins
pub struct AgentModel {
    params: ParameterStore,
    graph: Option<AgentGraph>,
    initializer: Option<Box<dyn NodeDataInitializer>>,
    timestep_fn: Option<Box<dyn TimestepFunction>>,
    rng: ModelRng,
    max_timesteps: usize,
    /// Successful timesteps since the graph was last initialized
    steps: usize,
}

impl Default for AgentModel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AgentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentModel")
            .field("params", &self.params)
            .field("graph", &self.graph)
            .field("has_initializer", &self.initializer.is_some())
            .field("has_timestep_function", &self.timestep_fn.is_some())
            .field("max_timesteps", &self.max_timesteps)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

impl AgentModel {
    /// Model with default parameters, no graph and an entropy-seeded RNG
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Model whose RNG is seeded for reproducible runs
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: ModelRng) -> Self {
        Self {
            params: ParameterStore::new(),
            graph: None,
            initializer: None,
            timestep_fn: None,
            rng,
            max_timesteps: MAX_TIMESTEPS,
            steps: 0,
        }
    }

    // -------------------------------------------------------------------------
    // Parameters
    // -------------------------------------------------------------------------

    /// Parameter store
    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    /// Mutable parameter store
    pub fn params_mut(&mut self) -> &mut ParameterStore {
        &mut self.params
    }

    /// Merge `{key: value}` pairs into the parameters
    pub fn update_parameters<I, K, V>(&mut self, parameters: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.params.update(parameters);
    }

    /// Delete parameters, or reset to defaults when `keys` is empty
    pub fn delete_parameters<S: AsRef<str>>(&mut self, keys: &[S]) -> Result<bool> {
        self.params.delete(keys)
    }

    /// Parameter keys in insertion order
    pub fn list_parameters(&self) -> Vec<String> {
        self.params.list()
    }

    /// Parameter value
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.params.get(key)
    }

    /// Set a parameter value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.params.set(key, value);
    }

    /// `num_nodes`, validated as a positive integer
    pub fn num_nodes(&self) -> Result<usize> {
        let n = self.params.get_i64(NUM_NODES)?;
        usize::try_from(n)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                ModelError::invalid_parameter(NUM_NODES, format!("must be positive, got {n}"))
            })
    }

    /// Topology selected by `graph_type`
    pub fn graph_type(&self) -> Result<GraphType> {
        Ok(GraphType::parse(self.params.get_str(GRAPH_TYPE)?))
    }

    // -------------------------------------------------------------------------
    // Graph
    // -------------------------------------------------------------------------

    /// Current graph
    pub fn graph(&self) -> Result<&AgentGraph> {
        self.graph.as_ref().ok_or(ModelError::GraphNotInitialized)
    }

    /// Current graph, mutable
    pub fn graph_mut(&mut self) -> Result<&mut AgentGraph> {
        self.graph.as_mut().ok_or(ModelError::GraphNotInitialized)
    }

    /// Whether a graph exists
    pub fn has_graph(&self) -> bool {
        self.graph.is_some()
    }

    /// Replace the graph. The step counter is left alone, so a timestep
    /// function may swap in a new graph.
    pub fn set_graph(&mut self, graph: AgentGraph) {
        self.graph = Some(graph);
    }

    /// Replace the graph with a petgraph graph, checking it first
    pub fn set_graph_from<G>(&mut self, graph: G) -> Result<()>
    where
        G: TryInto<AgentGraph, Error = ModelError>,
    {
        self.set_graph(graph.try_into()?);
        Ok(())
    }

    /// Drop the graph
    pub fn clear_graph(&mut self) -> Option<AgentGraph> {
        self.steps = 0;
        self.graph.take()
    }

    /// Borrow parameters, graph and RNG at once
    pub fn parts_mut(&mut self) -> Result<ModelParts<'_>> {
        let graph = self.graph.as_mut().ok_or(ModelError::GraphNotInitialized)?;
        Ok(ModelParts {
            params: &mut self.params,
            graph,
            rng: &mut self.rng,
        })
    }

    // -------------------------------------------------------------------------
    // Plug-ins and randomness
    // -------------------------------------------------------------------------

    /// Register the node data initializer
    pub fn set_initializer(&mut self, initializer: impl NodeDataInitializer + 'static) {
        self.initializer = Some(Box::new(initializer));
    }

    /// Register the timestep function
    pub fn set_timestep_function(&mut self, timestep_fn: impl TimestepFunction + 'static) {
        self.timestep_fn = Some(Box::new(timestep_fn));
    }

    /// Model RNG
    pub fn rng_mut(&mut self) -> &mut ModelRng {
        &mut self.rng
    }

    /// Reseed the model RNG
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Iteration ceiling for `run_to_convergence`
    pub fn max_timesteps(&self) -> usize {
        self.max_timesteps
    }

    /// Override the iteration ceiling
    pub fn set_max_timesteps(&mut self, max_timesteps: usize) {
        self.max_timesteps = max_timesteps;
    }

    /// Successful timesteps since the graph was last initialized or cleared
    pub fn steps(&self) -> usize {
        self.steps
    }

    // -------------------------------------------------------------------------
    // Simulation
    // -------------------------------------------------------------------------

    /// Build the topology from `num_nodes`/`graph_type` and populate every
    /// node with freshly initialized data, replacing any existing graph.
    pub fn initialize_graph(&mut self) -> Result<()> {
        if self.initializer.is_none() {
            return Err(ModelError::MissingInitializer);
        }
        let num_nodes = self.num_nodes()?;
        let graph_type = self.graph_type()?;

        let mut graph = graph_type.build(num_nodes);
        if let Some(initializer) = self.initializer.as_mut() {
            for (_, data) in graph.nodes_mut() {
                data.extend(initializer.initial_data(&mut self.rng));
            }
        }

        tracing::debug!(
            num_nodes,
            graph_type = %graph_type,
            edges = graph.edge_count(),
            "graph initialized"
        );
        self.set_graph(graph);
        self.steps = 0;
        Ok(())
    }

    /// Run the timestep function once against this model
    pub fn timestep(&mut self) -> Result<()> {
        let mut step = self
            .timestep_fn
            .take()
            .ok_or(ModelError::MissingTimestepFunction)?;
        let result = step.step(self);
        // a function that registered its own replacement keeps it
        if self.timestep_fn.is_none() {
            self.timestep_fn = Some(step);
        }
        result?;
        self.steps += 1;
        Ok(())
    }

    /// Run exactly `steps` timesteps
    pub fn run_for(&mut self, steps: usize) -> Result<()> {
        for _ in 0..steps {
            self.timestep()?;
        }
        Ok(())
    }

    /// Whether `data_key` has standard deviation at or below `std_dev`
    /// across all nodes
    pub fn is_converged(&self, data_key: &str, std_dev: f64) -> Result<bool> {
        convergence::is_converged(self.graph()?, data_key, std_dev)
    }

    /// Step until converged or until the iteration ceiling is hit.
    ///
    /// Convergence is checked before every step, so an already converged
    /// model returns 0. The criterion is read once, before the first check.
    /// Returns the number of timesteps taken, never more than
    /// [`max_timesteps`](Self::max_timesteps).
    pub fn run_to_convergence(&mut self) -> Result<usize> {
        let criterion = ConvergenceCriterion::from_params(&self.params)?;
        let mut time = 0;

        while time < self.max_timesteps {
            let dispersion = criterion.dispersion(self.graph()?)?;
            tracing::trace!(time, dispersion, "convergence check");
            if criterion.accepts(dispersion) {
                tracing::info!(
                    time,
                    dispersion,
                    data_key = %criterion.data_key,
                    "model converged"
                );
                return Ok(time);
            }
            self.timestep()?;
            time += 1;
        }

        tracing::info!(
            time,
            data_key = %criterion.data_key,
            "timestep ceiling reached before convergence"
        );
        Ok(time)
    }
}
