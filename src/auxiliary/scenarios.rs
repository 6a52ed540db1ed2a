//! Shared seeded scenarios for regression tests.

use ndarray::{Array1, Array2, Array4};

use crate::auxiliary::prng::Mt19937;
use crate::cistring::StringSpace;
use crate::civector::CIVector;
use crate::integrals::restore_eri;

pub(crate) const NORB: usize = 6;
pub(crate) const NELECA: usize = 3;
pub(crate) const NELECB: usize = 3;

/// A six-orbital, six-electron pseudo-random system with a small hand-picked pair of
/// determinant spaces, fully determined by the MT19937 seed `12`.
pub(crate) struct SeededSystem {
    pub(crate) h1: Array2<f64>,
    pub(crate) eri: Array4<f64>,
    pub(crate) civec: CIVector,
}

/// Builds the seed-12 regression system: a 3 × 3 amplitude block drawn as
/// `(u − 0.2)³`, an eight-fold packed two-body tensor drawn the same way and a
/// symmetrised one-body matrix.
pub(crate) fn seeded_system() -> SeededSystem {
    fn cubed(rng: &mut Mt19937) -> f64 {
        let v = rng.next_f64() - 0.2;
        v * v * v
    }
    let mut rng = Mt19937::new(12);
    let coeff = Array2::from_shape_fn((3, 3), |_| cubed(&mut rng));
    let npair = NORB * (NORB + 1) / 2;
    let packed = Array1::from_shape_fn(npair * (npair + 1) / 2, |_| cubed(&mut rng));
    let h1r = Array2::from_shape_fn((NORB, NORB), |_| rng.next_f64());
    let h1 = &h1r + &h1r.t();
    let eri = restore_eri(packed.view(), NORB).expect("The packed tensor length is exact.");

    let alpha = StringSpace::new(NORB, NELECA, [0b111, 0b1011, 0b10101])
        .expect("The alpha strings are valid.");
    let beta = StringSpace::new(NORB, NELECB, [0b111, 0b1011, 0b1101])
        .expect("The beta strings are valid.");
    let civec = CIVector::new(alpha, beta, coeff).expect("The amplitude block is 3 × 3.");
    SeededSystem { h1, eri, civec }
}

/// A position-weighted checksum over a flattened array, used as a compact
/// regression probe.
pub(crate) fn finger<'a>(values: impl IntoIterator<Item = &'a f64>) -> f64 {
    values
        .into_iter()
        .enumerate()
        .map(|(k, v)| v * (k as f64).cos())
        .sum()
}
