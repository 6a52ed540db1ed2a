//! Hamiltonian application over selected determinant spaces.
//!
//! The contractor produces `sigma = H·C` restricted to a given (alpha × beta)
//! determinant grid using the standard direct-CI decomposition: the opposite-spin
//! term passes through the single-excitation tables of each channel, while the
//! same-spin terms pass through two-electron-removed intermediates so that no
//! in-space matrix element is lost to an out-of-space one-excitation intermediate.
//! Terms whose destination lies outside the selected space are implicitly dropped;
//! when the spaces equal the complete combinatorial enumeration this reproduces the
//! dense full-CI contraction.
//!
//! The contractor expects the one-body matrix pre-folded into the two-body tensor
//! (see [`crate::integrals::absorb_one_body`] with `fac = 0.5`); it then evaluates
//! `sigma = Σ_pqrs g_pqrs Ê_pq Ê_rs C` with spin-summed excitation operators.

use anyhow::{self, ensure, format_err};
use ndarray::{Array1, Array2, Array4, ArrayView2, ArrayView4};

use crate::cistring::{occupied_orbitals, StringSpace};
use crate::civector::CIVector;
use crate::linkage::{
    double_annihilation_table, single_excitation_table, DoubleAnnihilationTable,
    SingleExcitationTable,
};


// ==================
// Struct definitions
// ==================

/// A Hamiltonian bound to a pair of string spaces, with all linkage tables built
/// once. The tables and the spaces are owned together: growing the spaces requires
/// constructing a new contractor.
pub struct HamiltonianContractor {
    alpha: StringSpace,
    beta: StringSpace,

    /// The absorbed two-body tensor.
    g: Array4<f64>,

    /// One-body correction `j[p, s] = Σ_q g[p, q, q, s]` arising from normal-ordering
    /// the same-spin operator product.
    jmat: Array2<f64>,

    cd_a: SingleExcitationTable,
    cd_b: SingleExcitationTable,
    dd_a: DoubleAnnihilationTable,
    dd_b: DoubleAnnihilationTable,
}

impl HamiltonianContractor {
    /// Binds the absorbed two-body tensor `g` to a pair of string spaces, building
    /// the single-excitation and double-annihilation tables of both channels.
    pub fn new(
        g: Array4<f64>,
        alpha: StringSpace,
        beta: StringSpace,
    ) -> Result<Self, anyhow::Error> {
        let norb = alpha.norb();
        ensure!(
            beta.norb() == norb,
            "The alpha and beta spaces span different orbital counts."
        );
        ensure!(
            g.dim() == (norb, norb, norb, norb),
            "Two-body tensor shape {:?} does not match `{norb}` orbitals.",
            g.dim()
        );
        let jmat = Array2::from_shape_fn((norb, norb), |(p, s)| {
            (0..norb).map(|q| g[[p, q, q, s]]).sum()
        });
        let cd_a = single_excitation_table(&alpha);
        let cd_b = single_excitation_table(&beta);
        let dd_a = if alpha.nelec() >= 2 {
            double_annihilation_table(&alpha, None)?
        } else {
            DoubleAnnihilationTable::empty()
        };
        let dd_b = if beta.nelec() >= 2 {
            double_annihilation_table(&beta, None)?
        } else {
            DoubleAnnihilationTable::empty()
        };
        Ok(Self {
            alpha,
            beta,
            g,
            jmat,
            cd_a,
            cd_b,
            dd_a,
            dd_b,
        })
    }

    /// The alpha-channel string space the contractor is bound to.
    pub fn alpha(&self) -> &StringSpace {
        &self.alpha
    }

    /// The beta-channel string space the contractor is bound to.
    pub fn beta(&self) -> &StringSpace {
        &self.beta
    }

    /// Applies the bound Hamiltonian to a coefficient matrix over the bound spaces.
    pub fn contract(&self, coeff: ArrayView2<f64>) -> Result<Array2<f64>, anyhow::Error> {
        let (na, nb) = (self.alpha.len(), self.beta.len());
        ensure!(
            coeff.dim() == (na, nb),
            "Coefficient matrix shape {:?} does not match the bound spaces ({na}, {nb}).",
            coeff.dim()
        );
        let norb = self.alpha.norb();
        let n2 = norb * norb;
        let mut sigma = Array2::<f64>::zeros((na, nb));

        // Opposite-spin term: 2 Σ g_pqrs (Ê^α_pq)(Ê^β_rs) C, relying on the
        // (pq) ↔ (rs) symmetry of the absorbed tensor.
        let mut t = Array2::<f64>::zeros((n2, na * nb));
        for (j0, row) in self.cd_a.iter() {
            for e in row {
                let sign = f64::from(e.sign);
                for jb in 0..nb {
                    t[[e.cre * norb + e.des, e.address * nb + jb]] += sign * coeff[[j0, jb]];
                }
            }
        }
        let g2 = self
            .g
            .view()
            .into_shape((n2, n2))
            .map_err(|err| format_err!("Unable to flatten the two-body tensor: {err}"))?;
        let u = g2.t().dot(&t);
        for (j0, row) in self.cd_b.iter() {
            for e in row {
                let sign = 2.0 * f64::from(e.sign);
                for ka in 0..na {
                    sigma[[ka, e.address]] += sign * u[[e.cre * norb + e.des, ka * nb + j0]];
                }
            }
        }

        // Same-spin terms through two-electron-removed intermediates.
        self.same_spin(coeff, &mut sigma, true);
        self.same_spin(coeff, &mut sigma, false);

        // One-body correction Σ_ps j_ps Ê_ps from normal-ordering the same-spin
        // product, applied per spin through the single-excitation tables.
        for (j0, row) in self.cd_a.iter() {
            for e in row {
                let v = f64::from(e.sign) * self.jmat[[e.cre, e.des]];
                for o in 0..nb {
                    sigma[[e.address, o]] += v * coeff[[j0, o]];
                }
            }
        }
        for (j0, row) in self.cd_b.iter() {
            for e in row {
                let v = f64::from(e.sign) * self.jmat[[e.cre, e.des]];
                for o in 0..na {
                    sigma[[o, e.address]] += v * coeff[[o, j0]];
                }
            }
        }
        Ok(sigma)
    }

    /// Accumulates `Σ_pqrs g_pqrs a†_p a†_r a_s a_q` for one spin channel, routed
    /// through the double-annihilation intermediates.
    fn same_spin(&self, coeff: ArrayView2<f64>, sigma: &mut Array2<f64>, is_alpha: bool) {
        let norb = self.alpha.norb();
        let nother = if is_alpha {
            self.beta.len()
        } else {
            self.alpha.len()
        };
        let dd = if is_alpha { &self.dd_a } else { &self.dd_b };
        for (_, row) in dd.iter() {
            if row.is_empty() {
                continue;
            }
            // Gather ⟨I| a_p a_q |C⟩ for every annihilation pair of this
            // intermediate, resolved over the other spin's addresses.
            let mut pairs: Vec<(usize, usize)> = row.iter().map(|e| (e.p, e.q)).collect();
            pairs.sort_unstable();
            pairs.dedup();
            let mut tg = Array2::<f64>::zeros((norb * norb, nother));
            for e in row {
                let sign = f64::from(e.sign);
                for o in 0..nother {
                    let c = if is_alpha {
                        coeff[[e.address, o]]
                    } else {
                        coeff[[o, e.address]]
                    };
                    tg[[e.p * norb + e.q, o]] += sign * c;
                }
            }
            // Scatter back through the creation side: entry (p, q) realises the
            // creation pair (r, p') = (e.p, e.q) of the operator string.
            for e in row {
                let sign = f64::from(e.sign);
                for &(s, q) in &pairs {
                    let gv = self.g[[e.q, q, e.p, s]];
                    if gv == 0.0 {
                        continue;
                    }
                    for o in 0..nother {
                        let v = sign * gv * tg[[s * norb + q, o]];
                        if is_alpha {
                            sigma[[e.address, o]] += v;
                        } else {
                            sigma[[o, e.address]] += v;
                        }
                    }
                }
            }
        }
    }

    /// Materialises the bound Hamiltonian as a dense `(na·nb) × (na·nb)` matrix in
    /// row-major determinant-pair order. Intended for the dense eigensolver and for
    /// validation on small spaces.
    pub fn dense_matrix(&self) -> Array2<f64> {
        let (na, nb) = (self.alpha.len(), self.beta.len());
        let dim = na * nb;
        let mut h = Array2::<f64>::zeros((dim, dim));

        // Opposite-spin term.
        for (j0a, rowa) in self.cd_a.iter() {
            for ea in rowa {
                for (j0b, rowb) in self.cd_b.iter() {
                    for eb in rowb {
                        h[[ea.address * nb + eb.address, j0a * nb + j0b]] += 2.0
                            * f64::from(ea.sign)
                            * f64::from(eb.sign)
                            * self.g[[ea.cre, ea.des, eb.cre, eb.des]];
                    }
                }
            }
        }
        // Same-spin terms.
        for (_, row) in self.dd_a.iter() {
            for e1 in row {
                for e2 in row {
                    let gv = f64::from(e1.sign)
                        * f64::from(e2.sign)
                        * self.g[[e1.q, e2.q, e1.p, e2.p]];
                    for o in 0..nb {
                        h[[e1.address * nb + o, e2.address * nb + o]] += gv;
                    }
                }
            }
        }
        for (_, row) in self.dd_b.iter() {
            for e1 in row {
                for e2 in row {
                    let gv = f64::from(e1.sign)
                        * f64::from(e2.sign)
                        * self.g[[e1.q, e2.q, e1.p, e2.p]];
                    for o in 0..na {
                        h[[o * nb + e1.address, o * nb + e2.address]] += gv;
                    }
                }
            }
        }
        // One-body correction.
        for (j0, row) in self.cd_a.iter() {
            for e in row {
                let v = f64::from(e.sign) * self.jmat[[e.cre, e.des]];
                for o in 0..nb {
                    h[[e.address * nb + o, j0 * nb + o]] += v;
                }
            }
        }
        for (j0, row) in self.cd_b.iter() {
            for e in row {
                let v = f64::from(e.sign) * self.jmat[[e.cre, e.des]];
                for o in 0..na {
                    h[[o * nb + e.address, o * nb + j0]] += v;
                }
            }
        }
        h
    }
}

// =========
// Functions
// =========

/// Applies the Hamiltonian `(h1, eri)` to a CI vector, returning the sigma vector
/// tagged with the same spaces. This is the one-shot convenience over
/// [`HamiltonianContractor`]; drivers bind the contractor once per space instead.
pub fn contract(
    h1: ArrayView2<f64>,
    eri: ArrayView4<f64>,
    civec: &CIVector,
) -> Result<CIVector, anyhow::Error> {
    let nelec = civec.alpha().nelec() + civec.beta().nelec();
    let g = crate::integrals::absorb_one_body(h1, eri, nelec, 0.5)?;
    let contractor = HamiltonianContractor::new(g, civec.alpha().clone(), civec.beta().clone())?;
    let sigma = contractor.contract(civec.coefficients().view())?;
    civec.with_coefficients(sigma)
}

/// Computes the diagonal Hamiltonian elements over a determinant grid, in row-major
/// determinant-pair order: occupied one-body terms plus Coulomb and same-spin
/// exchange occupancy sums. Used to seed and precondition eigensolvers.
pub fn make_hdiag(
    h1: ArrayView2<f64>,
    eri: ArrayView4<f64>,
    alpha: &StringSpace,
    beta: &StringSpace,
) -> Result<Array1<f64>, anyhow::Error> {
    let norb = alpha.norb();
    ensure!(
        h1.dim() == (norb, norb) && eri.dim() == (norb, norb, norb, norb),
        "Integral dimensions do not match `{norb}` orbitals."
    );
    let occs_a: Vec<Vec<usize>> = alpha.iter().map(|s| occupied_orbitals(s, norb)).collect();
    let occs_b: Vec<Vec<usize>> = beta.iter().map(|s| occupied_orbitals(s, norb)).collect();
    let mut hdiag = Array1::zeros(alpha.len() * beta.len());
    let mut idx = 0;
    for aocc in &occs_a {
        for bocc in &occs_b {
            let e1: f64 = aocc.iter().chain(bocc).map(|&i| h1[[i, i]]).sum();
            let coulomb = |xs: &[usize], ys: &[usize]| -> f64 {
                xs.iter()
                    .flat_map(|&i| ys.iter().map(move |&j| eri[[i, i, j, j]]))
                    .sum()
            };
            let exchange = |xs: &[usize]| -> f64 {
                xs.iter()
                    .flat_map(|&i| xs.iter().map(move |&j| eri[[i, j, j, i]]))
                    .sum()
            };
            let e2 = coulomb(aocc, aocc) + coulomb(aocc, bocc) + coulomb(bocc, aocc)
                + coulomb(bocc, bocc)
                - exchange(aocc)
                - exchange(bocc);
            hdiag[idx] = e1 + 0.5 * e2;
            idx += 1;
        }
    }
    Ok(hdiag)
}
