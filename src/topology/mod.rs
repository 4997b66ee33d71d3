//! Network topologies for agent populations.
//!
//! Agents live on the nodes of an undirected [`petgraph`] graph. Nodes are
//! labeled `0..n` and carry a mutable [`NodeData`] map; the node and edge
//! sets are fixed once a graph is built.
//!
//! | Topology   | Edges (n ≥ 4)  | Shape                                  |
//! |------------|----------------|----------------------------------------|
//! | `complete` | n·(n−1)/2      | every pair of nodes connected          |
//! | `cycle`    | n              | ring 0-1-…-(n−1)-0                     |
//! | `wheel`    | 2·(n−1)        | hub 0 joined to a ring over 1..n−1     |
//!
//! Graphs are simple: small rings collapse instead of producing self-loops or
//! parallel edges, so `cycle(2)` is a single edge and `wheel(3)` a triangle.

use std::fmt;

use petgraph::dot::{Config as DotConfig, Dot};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::value::{NodeData, Value};

/// Canonical topology kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphType {
    /// All pairs connected
    Complete,
    /// Single ring
    Cycle,
    /// Hub plus ring
    Wheel,
}

impl GraphType {
    /// Map a `graph_type` parameter to a topology.
    ///
    /// `"complete"` and `"cycle"` select their topologies; every other string,
    /// including typos, selects [`GraphType::Wheel`]. Strings other than
    /// `"wheel"` log a warning.
    pub fn parse(s: &str) -> Self {
        match s {
            "complete" => GraphType::Complete,
            "cycle" => GraphType::Cycle,
            "wheel" => GraphType::Wheel,
            other => {
                tracing::warn!(graph_type = other, "unrecognized graph type, using wheel");
                GraphType::Wheel
            },
        }
    }

    /// Parameter spelling of this topology
    pub fn name(&self) -> &'static str {
        match self {
            GraphType::Complete => "complete",
            GraphType::Cycle => "cycle",
            GraphType::Wheel => "wheel",
        }
    }

    /// Build a graph of this topology with `num_nodes` empty-data nodes
    pub fn build(&self, num_nodes: usize) -> AgentGraph {
        match self {
            GraphType::Complete => complete_graph(num_nodes),
            GraphType::Cycle => cycle_graph(num_nodes),
            GraphType::Wheel => wheel_graph(num_nodes),
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Undirected agent graph with per-node data
#[derive(Debug, Clone)]
pub struct AgentGraph {
    graph: UnGraph<NodeData, ()>,
}

impl AgentGraph {
    fn with_nodes(n: usize) -> (UnGraph<NodeData, ()>, Vec<NodeIndex>) {
        let mut graph = UnGraph::with_capacity(n, 0);
        let nodes = (0..n).map(|_| graph.add_node(NodeData::new())).collect();
        (graph, nodes)
    }

    /// Adopt an existing petgraph graph.
    ///
    /// Node indices become labels. The graph must have at least one node and
    /// be simple (no self-loops, no parallel edges).
    pub fn from_petgraph(graph: UnGraph<NodeData, ()>) -> Result<Self> {
        if graph.node_count() == 0 {
            return Err(ModelError::InvalidGraphAssignment(
                "graph has no nodes".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::with_capacity(graph.edge_count());
        for edge in graph.edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            if a == b {
                return Err(ModelError::InvalidGraphAssignment(format!(
                    "self-loop on node {a}"
                )));
            }
            if !seen.insert((a.min(b), a.max(b))) {
                return Err(ModelError::InvalidGraphAssignment(format!(
                    "parallel edge between {a} and {b}"
                )));
            }
        }

        Ok(Self { graph })
    }

    /// Build a graph with `num_nodes` nodes from an edge list
    pub fn from_edges(num_nodes: usize, edges: &[(usize, usize)]) -> Result<Self> {
        let (mut graph, nodes) = Self::with_nodes(num_nodes);
        for &(a, b) in edges {
            if a >= num_nodes || b >= num_nodes {
                return Err(ModelError::InvalidGraphAssignment(format!(
                    "edge ({a}, {b}) references a node outside 0..{num_nodes}"
                )));
            }
            graph.add_edge(nodes[a], nodes[b], ());
        }
        Self::from_petgraph(graph)
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node labels, ascending
    pub fn labels(&self) -> Vec<usize> {
        self.graph.node_indices().map(NodeIndex::index).collect()
    }

    /// Data attached to node `label`
    pub fn node(&self, label: usize) -> Option<&NodeData> {
        self.graph.node_weight(NodeIndex::new(label))
    }

    /// Mutable data attached to node `label`
    pub fn node_mut(&mut self, label: usize) -> Option<&mut NodeData> {
        self.graph.node_weight_mut(NodeIndex::new(label))
    }

    /// Iterate `(label, data)` for every node
    pub fn nodes(&self) -> impl Iterator<Item = (usize, &NodeData)> {
        self.graph
            .node_indices()
            .map(|idx| (idx.index(), &self.graph[idx]))
    }

    /// Iterate `(label, data)` for every node, with mutable data
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = (usize, &mut NodeData)> {
        self.graph.node_weights_mut().enumerate()
    }

    /// Labels adjacent to `label`, ascending
    pub fn neighbors(&self, label: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .graph
            .neighbors(NodeIndex::new(label))
            .map(NodeIndex::index)
            .collect();
        out.sort_unstable();
        out
    }

    /// Number of neighbors of `label`
    pub fn degree(&self, label: usize) -> usize {
        self.graph.neighbors(NodeIndex::new(label)).count()
    }

    /// Whether `a` and `b` are adjacent
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.graph
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .is_some()
    }

    /// Edges as `(low, high)` label pairs
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.graph
            .edge_references()
            .map(|e| {
                let (a, b) = (e.source().index(), e.target().index());
                (a.min(b), a.max(b))
            })
            .collect()
    }

    /// Value of `key` on every node, in label order
    pub fn field_values(&self, key: &str) -> Result<Vec<&Value>> {
        self.nodes()
            .map(|(label, data)| {
                data.get(key).ok_or_else(|| ModelError::MissingDataField {
                    node: label,
                    key: key.to_string(),
                })
            })
            .collect()
    }

    /// Graphviz rendering of the topology
    pub fn to_dot(&self) -> String {
        let labelled = self.graph.map(|idx, _| idx.index(), |_, _| ());
        format!(
            "{:?}",
            Dot::with_config(&labelled, &[DotConfig::EdgeNoLabel])
        )
    }
}

impl TryFrom<UnGraph<NodeData, ()>> for AgentGraph {
    type Error = ModelError;

    fn try_from(graph: UnGraph<NodeData, ()>) -> Result<Self> {
        Self::from_petgraph(graph)
    }
}

/// Connect `ring` in order, closing the loop; collapses for fewer than three nodes
fn add_ring(graph: &mut UnGraph<NodeData, ()>, ring: &[NodeIndex]) {
    match ring.len() {
        0 | 1 => {},
        2 => {
            graph.add_edge(ring[0], ring[1], ());
        },
        m => {
            for i in 0..m {
                graph.add_edge(ring[i], ring[(i + 1) % m], ());
            }
        },
    }
}

/// Every pair of distinct nodes connected
pub fn complete_graph(n: usize) -> AgentGraph {
    let (mut graph, nodes) = AgentGraph::with_nodes(n);
    for i in 0..n {
        for j in (i + 1)..n {
            graph.add_edge(nodes[i], nodes[j], ());
        }
    }
    AgentGraph { graph }
}

/// Nodes joined in a single ring
pub fn cycle_graph(n: usize) -> AgentGraph {
    let (mut graph, nodes) = AgentGraph::with_nodes(n);
    add_ring(&mut graph, &nodes);
    AgentGraph { graph }
}

/// Hub node 0 joined to every rim node, rim nodes 1..n joined in a ring
pub fn wheel_graph(n: usize) -> AgentGraph {
    let (mut graph, nodes) = AgentGraph::with_nodes(n);
    if let Some((&hub, rim)) = nodes.split_first() {
        for &spoke in rim {
            graph.add_edge(hub, spoke, ());
        }
        add_ring(&mut graph, rim);
    }
    AgentGraph { graph }
}
