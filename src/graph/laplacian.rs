//! some utilities related to graph laplacian
//! - dense laplacian of a connected component
//! - pseudo inverse of the laplacian of a connected graph
//!
//! Matrices are small (molecules have a few dozens atoms) so we stay dense and invert with nalgebra.

use anyhow::anyhow;

use nalgebra::DMatrix;
use ndarray::Array2;

/// dense laplacian D - A of the subgraph induced by nodes.
/// nodes\[k\] is the node rank in the graph of row k.
pub(crate) fn component_laplacian(nodes: &[usize], edges: &[(usize, usize)], rank_in_component: &[usize]) -> Array2<f64> {
    let size = nodes.len();
    let mut laplacian = Array2::<f64>::zeros((size, size));
    for &(i, j) in edges {
        let (ki, kj) = (rank_in_component[i], rank_in_component[j]);
        if ki >= size || kj >= size || nodes[ki] != i || nodes[kj] != j {
            // edge belongs to another component
            continue;
        }
        laplacian[[ki, kj]] -= 1.;
        laplacian[[kj, ki]] -= 1.;
        laplacian[[ki, ki]] += 1.;
        laplacian[[kj, kj]] += 1.;
    }
    laplacian
} // end of component_laplacian

/// inverse through nalgebra, None if the matrix is singular
pub(crate) fn invert(mat: &Array2<f64>) -> Option<Array2<f64>> {
    let (nb_row, nb_col) = mat.dim();
    if nb_row != nb_col {
        log::error!("invert : non square matrix ({}, {})", nb_row, nb_col);
        return None;
    }
    let dmat = DMatrix::<f64>::from_fn(nb_row, nb_col, |i, j| mat[[i, j]]);
    let inverse = dmat.try_inverse()?;
    Some(Array2::<f64>::from_shape_fn((nb_row, nb_col), |(i, j)| inverse[(i, j)]))
} // end of invert

/// Moore-Penrose pseudo inverse of the laplacian of a connected graph.
/// As the kernel of L is spanned by the constant vector, L + J/n is invertible and
/// L⁺ = (L + J/n)⁻¹ - J/n
pub(crate) fn connected_laplacian_pinv(laplacian: &Array2<f64>) -> anyhow::Result<Array2<f64>> {
    let n = laplacian.nrows();
    if n == 0 {
        return Ok(Array2::<f64>::zeros((0, 0)));
    }
    let shift = 1. / n as f64;
    let shifted = laplacian.mapv(|x| x + shift);
    let inverse = invert(&shifted).ok_or_else(|| {
        log::error!("connected_laplacian_pinv : L + J/n is singular, size {}", n);
        anyhow!("singular shifted laplacian")
    })?;
    Ok(inverse.mapv(|x| x - shift))
} // end of connected_laplacian_pinv

//========================================================================================

#[cfg(test)]
mod tests {

    use super::*;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn invert_small() {
        log_init_test();
        let mat = ndarray::arr2(&[[0., 2.], [4., 1.]]);
        let inverse = invert(&mat).unwrap();
        let product = mat.dot(&inverse);
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1. } else { 0. };
                assert!((product[[i, j]] - expected).abs() < 1.0E-12);
            }
        }
        assert!(invert(&ndarray::arr2(&[[1., 2.], [2., 4.]])).is_none());
        assert!(invert(&Array2::<f64>::zeros((2, 3))).is_none());
    }

    #[test]
    fn pinv_is_pseudo_inverse() {
        log_init_test();
        // triangle plus a pendant node
        let nodes = [0usize, 1, 2, 3];
        let edges = [(0, 1), (1, 2), (0, 2), (2, 3)];
        let rank = [0usize, 1, 2, 3];
        let laplacian = component_laplacian(&nodes, &edges, &rank);
        let pinv = connected_laplacian_pinv(&laplacian).unwrap();
        // L L⁺ L = L
        let check = laplacian.dot(&pinv).dot(&laplacian);
        for (a, b) in check.iter().zip(laplacian.iter()) {
            assert!((a - b).abs() < 1.0E-10);
        }
        // rows of L⁺ sum to 0
        for row in pinv.rows() {
            assert!(row.sum().abs() < 1.0E-10);
        }
    }
} // end of mod tests
