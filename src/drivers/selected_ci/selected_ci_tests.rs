use approx::assert_relative_eq;

use crate::auxiliary::scenarios::seeded_system;
use crate::cistring::StringSpace;
use crate::contraction::HamiltonianContractor;
use crate::drivers::selected_ci::{SelectedCIDriver, SelectedCIParams};
use crate::drivers::SelciDriver;
use crate::integrals::absorb_one_body;
use crate::solver::{DenseEigensolver, Eigensolver};

#[test]
fn test_selected_ci_driver_converges_to_fci() {
    let system = seeded_system();
    let params = SelectedCIParams::builder()
        .select_cutoff(1e-4)
        .ci_coeff_cutoff(1e-4)
        .build()
        .unwrap();
    let solver = DenseEigensolver;
    let mut driver = SelectedCIDriver::builder()
        .parameters(&params)
        .one_body(&system.h1)
        .two_body(&system.eri)
        .neleca(3)
        .nelecb(3)
        .eigensolver(&solver)
        .build()
        .unwrap();
    assert!(driver.result().is_err());
    driver.run().unwrap();
    let res = driver.result().unwrap();

    assert!(res.converged);
    assert!(res.rounds >= 2 && res.rounds <= 5);
    assert_eq!(res.energies.len(), res.rounds);
    // Growth is monotonic and variational: the energy never rises.
    for w in res.energies.windows(2) {
        assert!(w[1] <= w[0] + 1e-12);
    }

    // At these cutoffs the spaces reach the complete enumeration, so the final
    // energy must equal the dense full-CI ground state.
    let g = absorb_one_body(system.h1.view(), system.eri.view(), 6, 0.5).unwrap();
    let full = HamiltonianContractor::new(
        g,
        StringSpace::full(6, 3).unwrap(),
        StringSpace::full(6, 3).unwrap(),
    )
    .unwrap();
    let (e_fci, _) = DenseEigensolver.lowest(&full).unwrap();
    assert_relative_eq!(res.energy, e_fci, epsilon = 1e-9);
    assert_relative_eq!(res.energy, -5.7251255201012, epsilon = 1e-8);
    assert_relative_eq!(res.civec.norm(), 1.0, epsilon = 1e-10);
}

#[test]
fn test_selected_ci_driver_frozen_space() {
    let system = seeded_system();
    let params = SelectedCIParams::builder().frozen_space(true).build().unwrap();
    let solver = DenseEigensolver;
    let alpha = StringSpace::full(6, 3).unwrap();
    let beta = StringSpace::full(6, 3).unwrap();
    let mut driver = SelectedCIDriver::builder()
        .parameters(&params)
        .one_body(&system.h1)
        .two_body(&system.eri)
        .neleca(3)
        .nelecb(3)
        .initial_space(Some((alpha, beta)))
        .eigensolver(&solver)
        .build()
        .unwrap();
    driver.run().unwrap();
    let res = driver.result().unwrap();
    assert!(res.converged);
    assert_eq!(res.rounds, 1);
    assert_relative_eq!(res.energy, -5.7251255201012, epsilon = 1e-8);
    assert!(res.civec.alpha().is_full());
}

#[test]
fn test_selected_ci_driver_builder_validation() {
    let system = seeded_system();
    let params = SelectedCIParams::default();
    let solver = DenseEigensolver;

    // Missing one-body integrals.
    assert!(SelectedCIDriver::builder()
        .parameters(&params)
        .two_body(&system.eri)
        .neleca(3)
        .nelecb(3)
        .eigensolver(&solver)
        .build()
        .is_err());

    // Electron count exceeding the orbital count.
    assert!(SelectedCIDriver::builder()
        .parameters(&params)
        .one_body(&system.h1)
        .two_body(&system.eri)
        .neleca(7)
        .nelecb(3)
        .eigensolver(&solver)
        .build()
        .is_err());

    // Frozen spaces without initial spaces.
    let frozen = SelectedCIParams::builder().frozen_space(true).build().unwrap();
    assert!(SelectedCIDriver::builder()
        .parameters(&frozen)
        .one_body(&system.h1)
        .two_body(&system.eri)
        .neleca(3)
        .nelecb(3)
        .eigensolver(&solver)
        .build()
        .is_err());

    // Initial spaces carrying the wrong electron counts.
    let alpha = StringSpace::full(6, 2).unwrap();
    let beta = StringSpace::full(6, 3).unwrap();
    assert!(SelectedCIDriver::builder()
        .parameters(&params)
        .one_body(&system.h1)
        .two_body(&system.eri)
        .neleca(3)
        .nelecb(3)
        .initial_space(Some((alpha, beta)))
        .eigensolver(&solver)
        .build()
        .is_err());
}

#[test]
fn test_selected_ci_params_display() {
    let params = SelectedCIParams::builder()
        .select_cutoff(5e-4)
        .max_rounds(12)
        .build()
        .unwrap();
    let text = params.to_string();
    assert!(text.contains("Selection cutoff: 5.000e-4"));
    assert!(text.contains("Maximum growth rounds: 12"));
    assert!(text.contains("Frozen determinant spaces: no"));
}
