//! Labeling of a graph from its selected node pair.
//!
//! All node features are set to 0 except on the 2 nodes of the pair which receive independent uniform
//! values f1, f2 in [0,1) (broadcast over the feature width of the base schema).
//! The graph level regression target is tanh(f1 + f2).

use ndarray::Array2;
use rand::Rng;

use crate::graph::MolGraph;

use super::sampler::NodePair;

/// A graph with its synthetic node features and graph level target
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledGraph {
    graph: MolGraph,
    /// (nb_nodes, nb_features)
    features: Array2<f32>,
    pair: NodePair,
    target: f32,
} // end of LabeledGraph

impl LabeledGraph {
    pub fn get_graph(&self) -> &MolGraph {
        &self.graph
    }

    /// node features, one row per node
    pub fn get_features(&self) -> &Array2<f32> {
        &self.features
    }

    /// the node pair carrying the signal
    pub fn get_pair(&self) -> NodePair {
        self.pair
    }

    /// the graph level target, in (-1,1)
    pub fn get_target(&self) -> f32 {
        self.target
    }
} // end of impl LabeledGraph

/// builds the labeled graph. Returns None if there is no pair, the graph is dropped by the assembler.
/// Two values are drawn from rng (first for pair.0, then for pair.1), nothing else from graph is read
/// than its shape.
pub fn label<R: Rng>(graph: &MolGraph, pair: Option<NodePair>, rng: &mut R) -> Option<LabeledGraph> {
    let pair = pair?;
    let nb_features = graph.get_nb_features().max(1);
    let mut features = Array2::<f32>::zeros((graph.get_nb_nodes(), nb_features));
    let f1: f32 = rng.gen();
    let f2: f32 = rng.gen();
    features.row_mut(pair.0).fill(f1);
    // if pair is on the diagonal the second value wins, as with an indexed assignment
    features.row_mut(pair.1).fill(f2);
    let target = (f1 + f2).tanh();
    Some(LabeledGraph {
        graph: graph.clone(),
        features,
        pair,
        target,
    })
} // end of label

//========================================================================================

// end of mod tests
