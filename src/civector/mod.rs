//! Coefficient matrices tagged with their string spaces.
//!
//! An amplitude value is meaningless without the spaces its addresses refer to, so the
//! coefficient matrix of a CI vector is bundled with the pair of [`StringSpace`]s it is
//! valid against. This eliminates the address-mismatch hazard by construction: growing
//! the spaces produces a *new* [`CIVector`] through [`CIVector::embed_into`], and all
//! consumers receive the matrix and its spaces as one value.

use std::fmt;

use anyhow::{self, ensure};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::cistring::{DetString, StringSpace};


// ==================
// Struct definitions
// ==================

/// A CI coefficient matrix over an (alpha space × beta space) determinant grid.
///
/// Entry `[i, j]` is the amplitude of the determinant formed from the alpha string at
/// address `i` and the beta string at address `j`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct CIVector {
    /// The alpha-channel string space.
    alpha: StringSpace,

    /// The beta-channel string space.
    beta: StringSpace,

    /// The amplitudes, shape `(alpha.len(), beta.len())`.
    coefficients: Array2<f64>,
}

impl CIVector {
    /// Bundles a coefficient matrix with the pair of string spaces it is valid
    /// against. The two spaces must span the same orbitals, and the matrix shape must
    /// match the space sizes.
    pub fn new(
        alpha: StringSpace,
        beta: StringSpace,
        coefficients: Array2<f64>,
    ) -> Result<Self, anyhow::Error> {
        ensure!(
            alpha.norb() == beta.norb(),
            "The alpha and beta spaces span different orbital counts: {} versus {}.",
            alpha.norb(),
            beta.norb()
        );
        ensure!(
            coefficients.dim() == (alpha.len(), beta.len()),
            "Coefficient matrix shape {:?} does not match the space sizes ({}, {}).",
            coefficients.dim(),
            alpha.len(),
            beta.len()
        );
        Ok(Self {
            alpha,
            beta,
            coefficients,
        })
    }

    /// Constructs the unit-amplitude vector on a pair of single-string reference
    /// spaces.
    pub fn reference(norb: usize, neleca: usize, nelecb: usize) -> Result<Self, anyhow::Error> {
        Self::new(
            StringSpace::reference(norb, neleca)?,
            StringSpace::reference(norb, nelecb)?,
            Array2::ones((1, 1)),
        )
    }

    /// The alpha-channel string space.
    pub fn alpha(&self) -> &StringSpace {
        &self.alpha
    }

    /// The beta-channel string space.
    pub fn beta(&self) -> &StringSpace {
        &self.beta
    }

    /// The number of orbitals spanned by both spaces.
    pub fn norb(&self) -> usize {
        self.alpha.norb()
    }

    /// The amplitudes, shape `(alpha.len(), beta.len())`.
    pub fn coefficients(&self) -> &Array2<f64> {
        &self.coefficients
    }

    /// Replaces the amplitudes, keeping the spaces. The new matrix must have the same
    /// shape as the spaces it is tagged with.
    pub fn with_coefficients(&self, coefficients: Array2<f64>) -> Result<Self, anyhow::Error> {
        Self::new(self.alpha.clone(), self.beta.clone(), coefficients)
    }

    /// The Euclidean norm of the amplitudes.
    pub fn norm(&self) -> f64 {
        self.coefficients.iter().map(|c| c * c).sum::<f64>().sqrt()
    }

    /// Checks that `other` is tagged with the same pair of spaces, a precondition for
    /// any pairwise contraction (overlaps, transition density matrices).
    pub fn ensure_same_spaces(&self, other: &Self) -> Result<(), anyhow::Error> {
        ensure!(
            self.alpha == other.alpha && self.beta == other.beta,
            "The two CI vectors are tagged with different string spaces."
        );
        Ok(())
    }

    /// Re-embeds the amplitudes into a pair of enlarged spaces. Each surviving
    /// amplitude is copied to the (possibly different) address its determinant holds
    /// in the new spaces; all other positions are zero. Both new spaces must be
    /// supersets of the current ones.
    pub fn embed_into(
        &self,
        alpha: StringSpace,
        beta: StringSpace,
    ) -> Result<Self, anyhow::Error> {
        self.alpha.ensure_compatible(&alpha)?;
        self.beta.ensure_compatible(&beta)?;
        let amap = self
            .alpha
            .iter()
            .map(|s| {
                alpha.address_of(s).ok_or_else(|| {
                    anyhow::format_err!("Alpha string `{s:#b}` is absent from the target space.")
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let bmap = self
            .beta
            .iter()
            .map(|s| {
                beta.address_of(s).ok_or_else(|| {
                    anyhow::format_err!("Beta string `{s:#b}` is absent from the target space.")
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut coeff = Array2::zeros((alpha.len(), beta.len()));
        for (i, &ia) in amap.iter().enumerate() {
            for (j, &jb) in bmap.iter().enumerate() {
                coeff[[ia, jb]] = self.coefficients[[i, j]];
            }
        }
        Self::new(alpha, beta, coeff)
    }

    /// Restricts the amplitudes to a pair of subspaces, discarding everything
    /// outside. Each target string must be present in the current spaces.
    pub fn restrict_to(
        &self,
        alpha: StringSpace,
        beta: StringSpace,
    ) -> Result<Self, anyhow::Error> {
        self.alpha.ensure_compatible(&alpha)?;
        self.beta.ensure_compatible(&beta)?;
        let mut coeff = Array2::zeros((alpha.len(), beta.len()));
        for (ia, sa) in alpha.iter().enumerate() {
            let i = self.alpha.address_of(sa).ok_or_else(|| {
                anyhow::format_err!("Alpha string `{sa:#b}` is absent from the source space.")
            })?;
            for (jb, sb) in beta.iter().enumerate() {
                let j = self.beta.address_of(sb).ok_or_else(|| {
                    anyhow::format_err!("Beta string `{sb:#b}` is absent from the source space.")
                })?;
                coeff[[ia, jb]] = self.coefficients[[i, j]];
            }
        }
        Self::new(alpha, beta, coeff)
    }

    /// Embeds this vector into the complete combinatorial space for both spins.
    pub fn to_full(&self) -> Result<Self, anyhow::Error> {
        self.embed_into(
            StringSpace::full(self.alpha.norb(), self.alpha.nelec())?,
            StringSpace::full(self.beta.norb(), self.beta.nelec())?,
        )
    }

    /// Lists the dominant configurations: all determinant pairs whose amplitude
    /// magnitude exceeds `threshold`, as `(amplitude, alpha string, beta string)`
    /// tuples sorted by descending magnitude.
    pub fn dominant_configurations(&self, threshold: f64) -> Vec<(f64, DetString, DetString)> {
        let mut out: Vec<_> = self
            .coefficients
            .indexed_iter()
            .filter(|(_, c)| c.abs() > threshold)
            .map(|((i, j), &c)| (c, self.alpha.string(i), self.beta.string(j)))
            .collect();
        out.sort_by(|a, b| b.0.abs().total_cmp(&a.0.abs()));
        out
    }
}

impl fmt::Debug for CIVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CIVector({} x {} over {} orbitals)",
            self.alpha.len(),
            self.beta.len(),
            self.norb()
        )
    }
}
