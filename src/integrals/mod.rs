//! Molecular-orbital integral handling.
//!
//! The engine consumes integrals as opaque numeric arrays: a symmetric one-body matrix
//! of shape `norb × norb` and a two-body tensor addressable as `eri[[p, q, r, s]]` in
//! chemist `(pq|rs)` convention with full four-index symmetry. This module provides
//! the helpers the engine itself needs: unpacking an 8-fold symmetry-packed tensor,
//! folding the one-body matrix into the two-body tensor ahead of a direct-CI
//! contraction, and the per-orbital-pair magnitude bound consumed by the selector.

use anyhow::{self, ensure};
use ndarray::{Array2, Array4, ArrayView1, ArrayView2, ArrayView4};

#[cfg(test)]
#[path = "integrals_tests.rs"]
mod integrals_tests;

/// Returns the unordered pair index of `(p, q)`: `p(p+1)/2 + q` for `p ≥ q`.
pub fn pair_index(p: usize, q: usize) -> usize {
    if p >= q {
        p * (p + 1) / 2 + q
    } else {
        q * (q + 1) / 2 + p
    }
}

/// Unpacks a two-body tensor stored with 8-fold permutational symmetry (packed over
/// pairs of unordered orbital pairs) into the full four-index form.
pub fn restore_eri(packed: ArrayView1<f64>, norb: usize) -> Result<Array4<f64>, anyhow::Error> {
    let npair = norb * (norb + 1) / 2;
    ensure!(
        packed.len() == npair * (npair + 1) / 2,
        "Packed tensor length `{}` does not match `{}` orbitals.",
        packed.len(),
        norb
    );
    let mut eri = Array4::zeros((norb, norb, norb, norb));
    for p in 0..norb {
        for q in 0..norb {
            for r in 0..norb {
                for s in 0..norb {
                    let pq = pair_index(p, q);
                    let rs = pair_index(r, s);
                    eri[[p, q, r, s]] = packed[pair_index(pq, rs)];
                }
            }
        }
    }
    Ok(eri)
}

/// Folds the one-body matrix into the two-body tensor so that a single two-body
/// contraction pass applies the whole Hamiltonian:
///
/// ```text
/// g[k,k,p,q] += f[p,q] / nelec,   g[p,q,k,k] += f[p,q] / nelec,
/// f[p,q] = h1[p,q] − ½ Σ_r (pr|rq),
/// ```
///
/// followed by an overall scaling by `fac` (use `0.5` for the Hamiltonian, matching
/// the absent `½` prefactor of the contractor's `Σ g E E` form).
pub fn absorb_one_body(
    h1: ArrayView2<f64>,
    eri: ArrayView4<f64>,
    nelec: usize,
    fac: f64,
) -> Result<Array4<f64>, anyhow::Error> {
    let norb = h1.nrows();
    ensure!(
        h1.ncols() == norb && eri.dim() == (norb, norb, norb, norb),
        "Inconsistent one-/two-body integral dimensions."
    );
    ensure!(nelec > 0, "Cannot absorb a one-body matrix for zero electrons.");
    let mut f1e = h1.to_owned();
    for p in 0..norb {
        for q in 0..norb {
            f1e[[p, q]] -= 0.5 * (0..norb).map(|r| eri[[p, r, r, q]]).sum::<f64>();
        }
    }
    f1e /= nelec as f64;
    let mut g = eri.to_owned();
    for p in 0..norb {
        for q in 0..norb {
            for k in 0..norb {
                g[[k, k, p, q]] += f1e[[p, q]];
                g[[p, q, k, k]] += f1e[[p, q]];
            }
        }
    }
    g *= fac;
    Ok(g)
}

/// Returns the per-orbital-pair magnitude bound `max_{r,s} |eri[[p, q, r, s]]|`,
/// the cheap upper bound on two-body magnitudes used by the selector.
pub fn pair_magnitude_bound(eri: ArrayView4<f64>) -> Array2<f64> {
    let norb = eri.dim().0;
    Array2::from_shape_fn((norb, norb), |(p, q)| {
        eri.slice(ndarray::s![p, q, .., ..])
            .iter()
            .fold(0.0f64, |m, v| m.max(v.abs()))
    })
}
