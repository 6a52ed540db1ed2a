//! Reduced density matrices over selected determinant spaces.
//!
//! Conventions (all real arithmetic):
//! - `dm1[p, q] = ⟨bra| Σ_σ a†_pσ a_qσ |ket⟩`,
//! - `dm2[p, q, r, s] = ⟨bra| Σ_στ a†_pσ a†_rτ a_sτ a_qσ |ket⟩`,
//!
//! so that the electronic energy is recovered as
//! `E = Σ_pq h1[p,q]·dm1[p,q] + ½ Σ_pqrs (pq|rs)·dm2[p,q,r,s]`.
//! `make_*` functions are the `trans_*` ones with `bra == ket`; spin-resolved
//! variants return the (αα, ββ) or (αα, αβ, ββ) components whose sums (with the
//! `(pq) ↔ (rs)`-transposed αβ block counted once more) give the spin-summed
//! matrices.

use anyhow::{self};
use ndarray::{Array2, Array4};

use crate::civector::CIVector;
use crate::linkage::{double_annihilation_table, single_excitation_table, DoubleAnnihilationTable};


/// Computes the spin-resolved one-particle transition density matrices
/// `(dm1a, dm1b)` between two CI vectors tagged with the same spaces.
pub fn trans_rdm1s(
    bra: &CIVector,
    ket: &CIVector,
) -> Result<(Array2<f64>, Array2<f64>), anyhow::Error> {
    bra.ensure_same_spaces(ket)?;
    let norb = ket.norb();
    let (na, nb) = (ket.alpha().len(), ket.beta().len());
    let cb = bra.coefficients();
    let ck = ket.coefficients();
    let mut dma = Array2::<f64>::zeros((norb, norb));
    let mut dmb = Array2::<f64>::zeros((norb, norb));
    for (j0, row) in single_excitation_table(ket.alpha()).iter() {
        for e in row {
            let v: f64 = (0..nb).map(|o| cb[[e.address, o]] * ck[[j0, o]]).sum();
            dma[[e.cre, e.des]] += f64::from(e.sign) * v;
        }
    }
    for (j0, row) in single_excitation_table(ket.beta()).iter() {
        for e in row {
            let v: f64 = (0..na).map(|o| cb[[o, e.address]] * ck[[o, j0]]).sum();
            dmb[[e.cre, e.des]] += f64::from(e.sign) * v;
        }
    }
    Ok((dma, dmb))
}

/// Computes the spin-summed one-particle transition density matrix.
pub fn trans_rdm1(bra: &CIVector, ket: &CIVector) -> Result<Array2<f64>, anyhow::Error> {
    let (dma, dmb) = trans_rdm1s(bra, ket)?;
    Ok(dma + dmb)
}

/// Computes the spin-resolved one-particle density matrices of a CI vector.
pub fn make_rdm1s(civec: &CIVector) -> Result<(Array2<f64>, Array2<f64>), anyhow::Error> {
    trans_rdm1s(civec, civec)
}

/// Computes the spin-summed one-particle density matrix of a CI vector.
pub fn make_rdm1(civec: &CIVector) -> Result<Array2<f64>, anyhow::Error> {
    trans_rdm1(civec, civec)
}

/// Computes the spin-resolved two-particle transition density matrices
/// `(dm2aa, dm2ab, dm2bb)` between two CI vectors tagged with the same spaces.
/// The αβ block is `dm2ab[p, q, r, s] = ⟨bra| a†_pα a_qα a†_rβ a_sβ |ket⟩`.
pub fn trans_rdm2s(
    bra: &CIVector,
    ket: &CIVector,
) -> Result<(Array4<f64>, Array4<f64>, Array4<f64>), anyhow::Error> {
    bra.ensure_same_spaces(ket)?;
    let norb = ket.norb();
    let (na, nb) = (ket.alpha().len(), ket.beta().len());
    let cb = bra.coefficients();
    let ck = ket.coefficients();

    // Mixed block through the single-excitation tables of both channels:
    // ta[p, q][kb, jb] = Σ_{Ka, Ja} ⟨Ka|Ê^α_pq|Ja⟩ bra[Ka, kb] ket[Ja, jb].
    let mut ta = vec![Array2::<f64>::zeros((nb, nb)); norb * norb];
    for (j0, row) in single_excitation_table(ket.alpha()).iter() {
        for e in row {
            let acc = &mut ta[e.cre * norb + e.des];
            for kb in 0..nb {
                let b = f64::from(e.sign) * cb[[e.address, kb]];
                if b == 0.0 {
                    continue;
                }
                for jb in 0..nb {
                    acc[[kb, jb]] += b * ck[[j0, jb]];
                }
            }
        }
    }
    let mut ab = Array4::<f64>::zeros((norb, norb, norb, norb));
    for (j0, row) in single_excitation_table(ket.beta()).iter() {
        for e in row {
            let sign = f64::from(e.sign);
            for p in 0..norb {
                for q in 0..norb {
                    ab[[p, q, e.cre, e.des]] += sign * ta[p * norb + q][[e.address, j0]];
                }
            }
        }
    }

    // Same-spin blocks through the double-annihilation intermediates.
    let same_spin = |is_alpha: bool| -> Result<Array4<f64>, anyhow::Error> {
        let (space, nother) = if is_alpha {
            (ket.alpha(), nb)
        } else {
            (ket.beta(), na)
        };
        let dd = if space.nelec() >= 2 {
            double_annihilation_table(space, None)?
        } else {
            DoubleAnnihilationTable::empty()
        };
        let mut dm = Array4::<f64>::zeros((norb, norb, norb, norb));
        for (_, row) in dd.iter() {
            if row.is_empty() {
                continue;
            }
            let mut pairs: Vec<(usize, usize)> = row.iter().map(|e| (e.p, e.q)).collect();
            pairs.sort_unstable();
            pairs.dedup();
            let mut gb = Array2::<f64>::zeros((norb * norb, nother));
            let mut gk = Array2::<f64>::zeros((norb * norb, nother));
            for e in row {
                let sign = f64::from(e.sign);
                for o in 0..nother {
                    let (b, k) = if is_alpha {
                        (cb[[e.address, o]], ck[[e.address, o]])
                    } else {
                        (cb[[o, e.address]], ck[[o, e.address]])
                    };
                    gb[[e.p * norb + e.q, o]] += sign * b;
                    gk[[e.p * norb + e.q, o]] += sign * k;
                }
            }
            for &(i1, j1) in &pairs {
                for &(i2, j2) in &pairs {
                    let v: f64 = (0..nother)
                        .map(|o| gb[[i1 * norb + j1, o]] * gk[[i2 * norb + j2, o]])
                        .sum();
                    // Bra side realises creations (p, r) = (j1, i1); ket side
                    // annihilations (s, q) = (i2, j2).
                    dm[[j1, j2, i1, i2]] += v;
                }
            }
        }
        Ok(dm)
    };
    let aa = same_spin(true)?;
    let bb = same_spin(false)?;
    Ok((aa, ab, bb))
}

/// Computes the spin-summed two-particle transition density matrix.
pub fn trans_rdm2(bra: &CIVector, ket: &CIVector) -> Result<Array4<f64>, anyhow::Error> {
    let (aa, ab, bb) = trans_rdm2s(bra, ket)?;
    let norb = ket.norb();
    let mut dm2 = aa + bb;
    for p in 0..norb {
        for q in 0..norb {
            for r in 0..norb {
                for s in 0..norb {
                    dm2[[p, q, r, s]] += ab[[p, q, r, s]] + ab[[r, s, p, q]];
                }
            }
        }
    }
    Ok(dm2)
}

/// Computes the spin-resolved two-particle density matrices of a CI vector.
pub fn make_rdm2s(
    civec: &CIVector,
) -> Result<(Array4<f64>, Array4<f64>, Array4<f64>), anyhow::Error> {
    trans_rdm2s(civec, civec)
}

/// Computes the spin-summed two-particle density matrix of a CI vector.
pub fn make_rdm2(civec: &CIVector) -> Result<Array4<f64>, anyhow::Error> {
    trans_rdm2(civec, civec)
}
