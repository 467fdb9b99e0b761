//! Synthetic graph regression datasets built from a base molecular dataset.
//!
//! For each graph a node pair is selected by a distance criterion (exact hop distance or commute time quantile),
//! the pair receives random scalar features and the graph target is a saturating function of their sum.
//! A model must therefore propagate information between the two nodes, the difficulty is driven by their distance.

/// node pair selection in a distance matrix
pub mod sampler;

/// persisted node pair manifests
pub mod cache;

/// features and target of a graph from its node pair
pub mod transform;

/// dataset assembly and batching
pub mod dataset;
