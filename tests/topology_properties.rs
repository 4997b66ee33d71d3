//! Property tests for canonical topologies and the convergence statistic.

use agentmodel::model::convergence::population_std_dev;
use agentmodel::topology::{complete_graph, cycle_graph, wheel_graph};
use agentmodel::GraphType;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_labels_are_contiguous(n in 1usize..60, kind in 0u8..3) {
        let graph_type = match kind {
            0 => GraphType::Complete,
            1 => GraphType::Cycle,
            _ => GraphType::Wheel,
        };
        let graph = graph_type.build(n);
        prop_assert_eq!(graph.node_count(), n);
        prop_assert_eq!(graph.labels(), (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn prop_complete_connects_all_pairs(n in 1usize..40) {
        let graph = complete_graph(n);
        prop_assert_eq!(graph.edge_count(), n * (n - 1) / 2);
        for node in 0..n {
            prop_assert_eq!(graph.degree(node), n - 1);
        }
    }

    #[test]
    fn prop_cycle_is_single_ring(n in 3usize..60) {
        let graph = cycle_graph(n);
        prop_assert_eq!(graph.edge_count(), n);
        for node in 0..n {
            prop_assert_eq!(graph.degree(node), 2);
            prop_assert!(graph.has_edge(node, (node + 1) % n));
        }
    }

    #[test]
    fn prop_wheel_has_hub_and_rim(n in 4usize..60) {
        let graph = wheel_graph(n);
        prop_assert_eq!(graph.edge_count(), 2 * (n - 1));
        prop_assert_eq!(graph.degree(0), n - 1);
        for rim in 1..n {
            prop_assert_eq!(graph.degree(rim), 3);
        }
    }

    #[test]
    fn prop_constant_values_have_zero_dispersion(v in -1.0e6f64..1.0e6, n in 1usize..50) {
        let values = vec![v; n];
        prop_assert_eq!(population_std_dev(&values), 0.0);
    }

    #[test]
    fn prop_dispersion_is_non_negative(values in prop::collection::vec(-1.0e3f64..1.0e3, 1..50)) {
        prop_assert!(population_std_dev(&values) >= 0.0);
    }
}
