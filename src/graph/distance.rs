//! All pairs graph distances between nodes of a (small) graph.
//!
//! - shortest path distance : hop count obtained by a breadth first search from each node.
//! - commute time : expected number of steps of a random walk going from i to j and back.
//!
//! Pairs of nodes lying in different connected components have no distance, they get None.
//! They must never be taken as a match by sampling.

use std::collections::VecDeque;

use ndarray::Array2;
use petgraph::graph::NodeIndex;
use petgraph::unionfind::UnionFind;

use super::laplacian::{component_laplacian, connected_laplacian_pinv};
use super::MolGraph;

/// hop counts between nodes, None if not connected
pub type HopMatrix = Array2<Option<usize>>;

/// commute times between nodes, None if not connected
pub type CommuteMatrix = Array2<Option<f64>>;

/// all pairs shortest path hop counts by breadth first search.
pub fn shortest_distances(graph: &MolGraph) -> HopMatrix {
    let nb_nodes = graph.get_nb_nodes();
    let ungraph = graph.to_ungraph();
    let mut distances = HopMatrix::from_elem((nb_nodes, nb_nodes), None);
    let mut queue = VecDeque::<usize>::with_capacity(nb_nodes);
    for source in 0..nb_nodes {
        distances[[source, source]] = Some(0);
        queue.clear();
        queue.push_back(source);
        while let Some(node) = queue.pop_front() {
            // node has been reached before being queued
            let depth = distances[[source, node]].unwrap_or(0);
            for neighbour in ungraph.neighbors(NodeIndex::new(node)) {
                let neighbour = neighbour.index();
                if distances[[source, neighbour]].is_none() {
                    distances[[source, neighbour]] = Some(depth + 1);
                    queue.push_back(neighbour);
                }
            }
        }
    } // end of for source
    distances
} // end of shortest_distances

#[cfg_attr(doc, katexit::katexit)]
/// commute times between all pairs of nodes.
///
/// For nodes $i$ and $j$ in the same connected component, with $L^{+}$ the pseudo inverse of the laplacian
/// $$ C(i,j) = vol(G) \cdot (L^{+}_{ii} + L^{+}_{jj} - 2 L^{+}_{ij}) $$
/// where $vol(G) = 2 |E|$ is the sum of degrees of the graph.
///
/// The pseudo inverse of a block diagonal laplacian is the block diagonal of the components pseudo inverses
/// so we work component by component.
/// Only entries i < j are computed and then mirrored so that the matrix is exactly symetric.
pub fn commute_times(graph: &MolGraph) -> anyhow::Result<CommuteMatrix> {
    let nb_nodes = graph.get_nb_nodes();
    let volume = 2. * graph.get_nb_edges() as f64;
    let mut commute = CommuteMatrix::from_elem((nb_nodes, nb_nodes), None);
    //
    let components = connected_components(graph);
    let mut rank_in_component = vec![0usize; nb_nodes];
    for nodes in &components {
        for (k, &node) in nodes.iter().enumerate() {
            rank_in_component[node] = k;
        }
    }
    for nodes in &components {
        let laplacian = component_laplacian(nodes, graph.get_edges(), &rank_in_component);
        let pinv = connected_laplacian_pinv(&laplacian)?;
        for ki in 0..nodes.len() {
            commute[[nodes[ki], nodes[ki]]] = Some(0.);
            for kj in ki + 1..nodes.len() {
                let resistance = pinv[[ki, ki]] + pinv[[kj, kj]] - 2. * pinv[[ki, kj]];
                let value = volume * resistance;
                commute[[nodes[ki], nodes[kj]]] = Some(value);
                commute[[nodes[kj], nodes[ki]]] = Some(value);
            }
        }
    } // end of for nodes
    log::trace!("commute_times : {} nodes, {} components", nb_nodes, components.len());
    Ok(commute)
} // end of commute_times

/// returns connected components, each as a sorted list of node ranks.
/// Components are ordered by their smallest node.
pub fn connected_components(graph: &MolGraph) -> Vec<Vec<usize>> {
    let nb_nodes = graph.get_nb_nodes();
    let mut union_find = UnionFind::<usize>::new(nb_nodes);
    for &(i, j) in graph.get_edges() {
        union_find.union(i, j);
    }
    let labels = union_find.into_labeling();
    let mut components = Vec::<Vec<usize>>::new();
    let mut component_of_label = std::collections::HashMap::<usize, usize>::new();
    for (node, label) in labels.into_iter().enumerate() {
        let idx = *component_of_label.entry(label).or_insert_with(|| {
            components.push(Vec::new());
            components.len() - 1
        });
        components[idx].push(node);
    }
    components
} // end of connected_components

//========================================================================================

#[cfg(test)]
mod tests {

    use super::*;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn path_graph(n: usize) -> MolGraph {
        let edges: Vec<(usize, usize)> = (0..n - 1).map(|i| (i, i + 1)).collect();
        MolGraph::new(n, 1, &edges).unwrap()
    }

    #[test]
    fn hops_on_path_and_cycle() {
        log_init_test();
        let path = path_graph(5);
        let hops = shortest_distances(&path);
        for i in 0..5 {
            for j in 0..5 {
                assert_eq!(hops[[i, j]], Some((i as i64 - j as i64).unsigned_abs() as usize));
            }
        }
        // cycle of 6 nodes
        let edges: Vec<(usize, usize)> = (0..6).map(|i| (i, (i + 1) % 6)).collect();
        let cycle = MolGraph::new(6, 1, &edges).unwrap();
        let hops = shortest_distances(&cycle);
        assert_eq!(hops[[0, 3]], Some(3));
        assert_eq!(hops[[0, 5]], Some(1));
        assert_eq!(hops[[1, 4]], Some(3));
    }

    #[test]
    fn hops_disconnected() {
        log_init_test();
        let graph = MolGraph::new(4, 1, &[(0, 1), (2, 3)]).unwrap();
        let hops = shortest_distances(&graph);
        assert_eq!(hops[[0, 1]], Some(1));
        assert_eq!(hops[[0, 2]], None);
        assert_eq!(hops[[3, 1]], None);
        assert_eq!(hops[[2, 2]], Some(0));
    }

    #[test]
    fn commute_on_path() {
        log_init_test();
        // on a tree effective resistance is the hop distance, so C(i,j) = 2|E| |i-j|
        let path = path_graph(5);
        let commute = commute_times(&path).unwrap();
        let volume = 2. * 4.;
        for i in 0..5 {
            for j in 0..5 {
                let expected = volume * (i as f64 - j as f64).abs();
                let got = commute[[i, j]].unwrap();
                assert!((got - expected).abs() < 1.0E-9, "i {} j {} got {}", i, j, got);
                // exact symetry
                assert_eq!(commute[[i, j]], commute[[j, i]]);
            }
        }
    }

    #[test]
    fn commute_on_triangle() {
        log_init_test();
        // resistance between two nodes of a triangle is 2/3, volume is 6
        let triangle = MolGraph::new(3, 1, &[(0, 1), (1, 2), (2, 0)]).unwrap();
        let commute = commute_times(&triangle).unwrap();
        assert!((commute[[0, 1]].unwrap() - 4.).abs() < 1.0E-9);
        assert!((commute[[1, 2]].unwrap() - 4.).abs() < 1.0E-9);
    }

    #[test]
    fn commute_disconnected() {
        log_init_test();
        let graph = MolGraph::new(5, 1, &[(0, 1), (1, 2), (3, 4)]).unwrap();
        let commute = commute_times(&graph).unwrap();
        assert_eq!(commute[[0, 3]], None);
        assert_eq!(commute[[4, 2]], None);
        assert!(commute[[3, 4]].unwrap() > 0.);
        assert_eq!(commute[[3, 3]], Some(0.));
        let components = connected_components(&graph);
        assert_eq!(components, vec![vec![0, 1, 2], vec![3, 4]]);
    }
} // end of mod tests
