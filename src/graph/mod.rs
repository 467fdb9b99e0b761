//! Graph representation of a base dataset instance (a molecule in ZINC).
//!
//! We only need node count, feature width of the base schema and the undirected connectivity.
//! Edges arrive as an edge_index (both orientations present), we keep each undirected edge once.

use anyhow::anyhow;

use indexmap::IndexSet;
use petgraph::graph::{NodeIndex, UnGraph};

pub mod distance;

mod laplacian;

/// dataset splits, in the order datasets are built
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    /// all splits in construction order
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    /// name used in file names (cache and csv export)
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
} // end of impl Split

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable undirected graph with nodes 0..nb_nodes
#[derive(Clone, Debug, PartialEq)]
pub struct MolGraph {
    nb_nodes: usize,
    /// width of node features declared by the base schema
    nb_features: usize,
    /// undirected edges stored once with source < target, in order of first appearance
    edges: Vec<(usize, usize)>,
} // end of MolGraph

impl MolGraph {
    /// edge_index may contain both orientations of an edge, they are merged. Self loops are dropped.
    pub fn new(nb_nodes: usize, nb_features: usize, edge_index: &[(usize, usize)]) -> anyhow::Result<Self> {
        let mut edges = IndexSet::<(usize, usize)>::with_capacity(edge_index.len() / 2 + 1);
        for &(source, target) in edge_index {
            if source >= nb_nodes || target >= nb_nodes {
                log::error!("edge ({}, {}) out of range, graph has {} nodes", source, target, nb_nodes);
                return Err(anyhow!("edge ({}, {}) out of range for {} nodes", source, target, nb_nodes));
            }
            if source == target {
                log::trace!("MolGraph::new dropping self loop on {}", source);
                continue;
            }
            edges.insert((source.min(target), source.max(target)));
        }
        Ok(MolGraph {
            nb_nodes,
            nb_features,
            edges: edges.into_iter().collect(),
        })
    } // end of new

    /// number of nodes
    pub fn get_nb_nodes(&self) -> usize {
        self.nb_nodes
    }

    /// feature width of the base schema
    pub fn get_nb_features(&self) -> usize {
        self.nb_features
    }

    /// undirected edges (source < target)
    pub fn get_edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// number of undirected edges
    pub fn get_nb_edges(&self) -> usize {
        self.edges.len()
    }


    /// petgraph representation, node of rank i is NodeIndex::new(i)
    pub fn to_ungraph(&self) -> UnGraph<(), ()> {
        let mut graph = UnGraph::<(), ()>::with_capacity(self.nb_nodes, self.edges.len());
        for _ in 0..self.nb_nodes {
            graph.add_node(());
        }
        for &(i, j) in &self.edges {
            graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), ());
        }
        graph
    }
} // end of impl MolGraph

//========================================================================================

#[cfg(test)]
mod tests {

    use super::*;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn edge_index_is_merged() {
        log_init_test();
        // both orientations and a self loop
        let edge_index = [(0, 1), (1, 0), (1, 2), (2, 1), (2, 2)];
        let graph = MolGraph::new(3, 1, &edge_index).unwrap();
        assert_eq!(graph.get_nb_edges(), 2);
        assert_eq!(graph.get_edges(), &[(0, 1), (1, 2)]);
        let ungraph = graph.to_ungraph();
        assert_eq!(ungraph.node_count(), 3);
        assert_eq!(ungraph.edge_count(), 2);
    }

    #[test]
    fn out_of_range_edge() {
        log_init_test();
        assert!(MolGraph::new(2, 1, &[(0, 2)]).is_err());
    }
} // end of mod tests
