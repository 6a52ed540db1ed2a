//! Importance-driven string selection and space growth.
//!
//! The selector proposes candidate determinant strings whose estimated perturbative
//! importance exceeds a threshold; the space grower merges the proposals of both spin
//! channels into the string spaces and re-embeds the coefficient matrix into the
//! enlarged grid. Growth is monotonic: no previously present string is ever removed,
//! and repeated application until no new strings are proposed is idempotent.

use anyhow::{self, ensure};
use itertools::Itertools;
use log;
use ndarray::{ArrayView2, ArrayView4};

use crate::cistring::{occupied_orbitals, virtual_orbitals, DetString, StringSpace};
use crate::civector::CIVector;
use crate::integrals::pair_magnitude_bound;

#[cfg(test)]
#[path = "selection_tests.rs"]
mod selection_tests;

/// The pair of immutable selection thresholds for a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionCutoffs {
    /// Minimum estimated perturbative importance for a candidate string to be
    /// admitted.
    pub select_cutoff: f64,

    /// Minimum amplitude magnitude for a source address to seed candidates.
    pub ci_coeff_cutoff: f64,
}

impl SelectionCutoffs {
    /// Bundles the two selection thresholds.
    pub fn new(select_cutoff: f64, ci_coeff_cutoff: f64) -> Self {
        Self {
            select_cutoff,
            ci_coeff_cutoff,
        }
    }
}

impl Default for SelectionCutoffs {
    fn default() -> Self {
        Self::new(1e-3, 1e-3)
    }
}

/// Proposes new determinant strings for one spin channel.
///
/// For each source string, every single excitation `i → a` with
/// `pair_bound[a, i] · amplitude_bound[source] > select_cutoff` is emitted. When the
/// excited pair straddles the `nelec` orbital boundary (`i < nelec ≤ a`), double
/// excitations `j → b` with `j` preceding `i` in the occupancy enumeration, `b`
/// following `a` in the virtual enumeration, and
/// `|eri[a, i, b, j]| · amplitude_bound[source] > select_cutoff` are emitted as well.
/// The output is the sorted, deduplicated set difference against `strings`; an
/// optional `filter` rejects candidates (symmetry pruning).
///
/// `amplitude_bound` holds one importance proxy per source string, typically the
/// maximum absolute amplitude over the other spin channel.
pub fn select_strings(
    select_cutoff: f64,
    eri: ArrayView4<f64>,
    pair_bound: ArrayView2<f64>,
    amplitude_bound: &[f64],
    strings: &[DetString],
    norb: usize,
    nelec: usize,
    filter: Option<&dyn Fn(DetString) -> bool>,
) -> Vec<DetString> {
    debug_assert_eq!(amplitude_bound.len(), strings.len());
    let mut proposals: Vec<DetString> = Vec::new();
    for (&s0, &bound) in strings.iter().zip(amplitude_bound) {
        let occ = occupied_orbitals(s0, norb);
        let vir = virtual_orbitals(s0, norb);
        for (i1, &i) in occ.iter().enumerate() {
            for (a1, &a) in vir.iter().enumerate() {
                if pair_bound[[a, i]] * bound > select_cutoff {
                    let s1 = (s0 ^ (1 << i)) | (1 << a);
                    proposals.push(s1);

                    // Heuristic double-excitation gate: second excitations are only
                    // considered when the first one crosses the nelec orbital
                    // boundary.
                    if i < nelec && a >= nelec {
                        for &j in &occ[..i1] {
                            for &b in &vir[a1 + 1..] {
                                if eri[[a, i, b, j]].abs() * bound > select_cutoff {
                                    proposals.push((s1 ^ (1 << j)) | (1 << b));
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    proposals
        .into_iter()
        .filter(|s| filter.map_or(true, |f| f(*s)))
        .sorted_unstable()
        .dedup()
        .filter(|s| !strings.contains(s))
        .collect()
}

/// Runs one expansion round: computes per-row/column amplitude bounds, runs the
/// selector independently for the alpha and beta channels, merges the proposals into
/// each spin's string space, and re-embeds the coefficient matrix into the enlarged
/// grid (new positions zero-filled).
///
/// `eri` is the two-body tensor used as the importance estimate; the driver passes
/// the absorbed tensor here, matching its use in the contraction.
pub fn enlarge_space(
    cutoffs: SelectionCutoffs,
    civec: &CIVector,
    eri: ArrayView4<f64>,
    filter: Option<&dyn Fn(DetString) -> bool>,
) -> Result<CIVector, anyhow::Error> {
    let norb = civec.norb();
    ensure!(
        eri.dim() == (norb, norb, norb, norb),
        "Two-body tensor shape {:?} does not match `{}` orbitals.",
        eri.dim(),
        norb
    );
    let coeff = civec.coefficients();
    let amax: Vec<f64> = coeff
        .rows()
        .into_iter()
        .map(|r| r.iter().fold(0.0f64, |m, v| m.max(v.abs())))
        .collect();
    let bmax: Vec<f64> = coeff
        .columns()
        .into_iter()
        .map(|c| c.iter().fold(0.0f64, |m, v| m.max(v.abs())))
        .collect();
    let pair_bound = pair_magnitude_bound(eri);

    let proposals_for = |space: &StringSpace, bounds: &[f64]| -> Vec<DetString> {
        let (seeds, seed_bounds): (Vec<DetString>, Vec<f64>) = space
            .iter()
            .zip(bounds)
            .filter(|(_, &b)| b > cutoffs.ci_coeff_cutoff)
            .map(|(s, &b)| (s, b))
            .unzip();
        select_strings(
            cutoffs.select_cutoff,
            eri,
            pair_bound.view(),
            &seed_bounds,
            &seeds,
            norb,
            space.nelec(),
            filter,
        )
    };

    let adds_a = proposals_for(civec.alpha(), &amax);
    let adds_b = proposals_for(civec.beta(), &bmax);
    log::debug!(
        "Selection proposed {} alpha and {} beta strings.",
        adds_a.len(),
        adds_b.len()
    );

    let alpha = civec.alpha().merged_with(adds_a)?;
    let beta = civec.beta().merged_with(adds_b)?;
    civec.embed_into(alpha, beta)
}
