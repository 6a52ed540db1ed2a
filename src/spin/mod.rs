//! Total-spin expectation values over selected determinant spaces.

use anyhow::{self};
use ndarray::Array2;

use crate::civector::CIVector;
use crate::linkage::{single_annihilation_table, single_creation_table};

#[cfg(test)]
#[path = "spin_tests.rs"]
mod spin_tests;

/// Computes `⟨Ŝ²⟩` of a CI vector together with the implied spin multiplicity
/// `2S + 1`.
///
/// Uses `Ŝ² = Ŝ₋Ŝ₊ + Ŝ_z(Ŝ_z + 1)`: the raising contribution `‖Ŝ₊C‖²` is
/// accumulated in the `(nα + 1, nβ − 1)` sector through the single-creation
/// table of the α channel and the single-annihilation table of the β channel,
/// matched on the raised orbital. Strings of the raised sector that link back
/// into the selected spaces are generated by the tables themselves, so no full
/// intermediate space is ever enumerated.
pub fn spin_square(civec: &CIVector) -> Result<(f64, f64), anyhow::Error> {
    let neleca = civec.alpha().nelec();
    let nelecb = civec.beta().nelec();
    let sz = (neleca as f64 - nelecb as f64) * 0.5;
    let norm2 = civec.coefficients().iter().map(|c| c * c).sum::<f64>();

    // Ŝ₊ annihilates every determinant when the α channel is full or the β
    // channel is empty.
    let ssp = if neleca == civec.norb() || nelecb == 0 {
        0.0
    } else {
        let cre = single_creation_table(civec.alpha(), None)?;
        let des = single_annihilation_table(civec.beta(), None)?;
        let c = civec.coefficients();
        let mut raised =
            Array2::<f64>::zeros((cre.intermediates().len(), des.intermediates().len()));
        for (ka, arow) in cre.iter() {
            for (kb, brow) in des.iter() {
                let mut amp = 0.0;
                for ea in arow {
                    for eb in brow.iter().filter(|eb| eb.orb == ea.orb) {
                        amp += f64::from(ea.sign)
                            * f64::from(eb.sign)
                            * c[[ea.address, eb.address]];
                    }
                }
                raised[[ka, kb]] = amp;
            }
        }
        raised.iter().map(|a| a * a).sum::<f64>()
    };

    let ss = ssp + sz * (sz + 1.0) * norm2;
    let multiplicity = (4.0 * ss + 1.0).sqrt();
    Ok((ss, multiplicity))
}
