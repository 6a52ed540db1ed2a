//! Eigensolvers for Hamiltonians bound to selected determinant spaces.

use anyhow::{self, ensure, format_err};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::Array2;

use crate::contraction::HamiltonianContractor;


/// A solver for the lowest eigenpair of a bound Hamiltonian. The eigenvector is
/// returned as a coefficient matrix over the contractor's `(alpha, beta)` grid,
/// normalised and with a deterministic overall sign.
pub trait Eigensolver {
    /// Computes the lowest eigenvalue and its coefficient matrix.
    fn lowest(
        &self,
        contractor: &HamiltonianContractor,
    ) -> Result<(f64, Array2<f64>), anyhow::Error>;
}

/// A dense eigensolver: materialises the Hamiltonian via
/// [`HamiltonianContractor::dense_matrix`] and performs a full symmetric
/// eigendecomposition. Selected spaces are small by construction, which keeps this
/// exact route affordable and free of subspace-iteration convergence concerns.
#[derive(Clone, Copy, Debug, Default)]
pub struct DenseEigensolver;

impl Eigensolver for DenseEigensolver {
    fn lowest(
        &self,
        contractor: &HamiltonianContractor,
    ) -> Result<(f64, Array2<f64>), anyhow::Error> {
        let (na, nb) = (contractor.alpha().len(), contractor.beta().len());
        let dim = na * nb;
        ensure!(dim > 0, "The bound determinant grid is empty.");
        let h = contractor.dense_matrix();

        // The assembled matrix is symmetric up to floating-point accumulation
        // order; fold it exactly before decomposing.
        let mut m = DMatrix::<f64>::zeros(dim, dim);
        for i in 0..dim {
            for j in 0..dim {
                m[(i, j)] = 0.5 * (h[[i, j]] + h[[j, i]]);
            }
        }
        let eig = SymmetricEigen::new(m);
        let k = eig
            .eigenvalues
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(k, _)| k)
            .ok_or_else(|| format_err!("No eigenvalues obtained."))?;
        let energy = eig.eigenvalues[k];
        let col = eig.eigenvectors.column(k);

        let norm = col.norm();
        ensure!(norm > 0.0, "Obtained a null eigenvector.");
        let dominant = (0..dim)
            .max_by(|&i, &j| col[i].abs().total_cmp(&col[j].abs()))
            .ok_or_else(|| format_err!("Obtained an empty eigenvector."))?;
        let scale = if col[dominant] < 0.0 { -norm } else { norm };
        let coeff = Array2::from_shape_fn((na, nb), |(i, j)| col[i * nb + j] / scale);
        Ok((energy, coeff))
    }
}
