//! Selection of one node pair in a distance matrix.
//!
//! Two modes :
//! - exact distance : all pairs (i,j), i != j, at hop distance d. Both (i,j) and (j,i) are matches,
//!   the uniform choice is made over the matched matrix entries.
//! - quantile : the nearest rank quantile of the whole flattened matrix (diagonal included) is computed,
//!   then all entries exactly equal to it are matches.
//!
//! Matches are listed in row major order, the choice is uniform among them with the random stream passed by the caller.
//! No match is not an error, we return None.

use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A pair of node ranks selected in a graph
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePair(pub usize, pub usize);

impl NodePair {
    pub fn first(&self) -> usize {
        self.0
    }

    pub fn second(&self) -> usize {
        self.1
    }
} // end of impl NodePair

/// all off diagonal entries equal to distance, in row major order
pub fn matches_at_distance(hops: &Array2<Option<usize>>, distance: usize) -> Vec<(usize, usize)> {
    hops.indexed_iter()
        .filter(|((i, j), d)| i != j && **d == Some(distance))
        .map(|((i, j), _)| (i, j))
        .collect()
} // end of matches_at_distance

/// nearest rank quantile of values (interpolation 'nearest').
/// The rank is alpha * (n-1) rounded half to even. Returns None if values is empty or alpha is not in [0,1].
pub fn nearest_rank_quantile(values: &[f64], alpha: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    if !(0. ..=1.).contains(&alpha) {
        log::error!("nearest_rank_quantile : quantile must be in [0,1], got {}", alpha);
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let rank = (alpha * (sorted.len() - 1) as f64).round_ties_even() as usize;
    Some(sorted[rank.min(sorted.len() - 1)])
} // end of nearest_rank_quantile

/// all entries of the matrix equal to the nearest rank quantile alpha of the defined entries, in row major order.
pub fn matches_at_quantile(commute: &Array2<Option<f64>>, alpha: f64) -> Vec<(usize, usize)> {
    let values: Vec<f64> = commute.iter().filter_map(|v| *v).collect();
    let quantile = match nearest_rank_quantile(&values, alpha) {
        Some(quantile) => quantile,
        None => return Vec::new(),
    };
    log::trace!("matches_at_quantile alpha {} -> value {:.6e}", alpha, quantile);
    commute
        .indexed_iter()
        .filter(|(_, v)| **v == Some(quantile))
        .map(|((i, j), _)| (i, j))
        .collect()
} // end of matches_at_quantile

/// uniform choice among matches
pub fn choose_pair<R: Rng>(matches: &[(usize, usize)], rng: &mut R) -> Option<NodePair> {
    if matches.is_empty() {
        return None;
    }
    let (i, j) = matches[rng.gen_range(0..matches.len())];
    Some(NodePair(i, j))
}

/// a pair at exact hop distance, None if there is none
pub fn sample_at_distance<R: Rng>(hops: &Array2<Option<usize>>, distance: usize, rng: &mut R) -> Option<NodePair> {
    choose_pair(&matches_at_distance(hops, distance), rng)
}

/// a pair at the nearest rank quantile alpha of commute times
pub fn sample_at_quantile<R: Rng>(commute: &Array2<Option<f64>>, alpha: f64, rng: &mut R) -> Option<NodePair> {
    choose_pair(&matches_at_quantile(commute, alpha), rng)
}

//========================================================================================

// end of mod tests
