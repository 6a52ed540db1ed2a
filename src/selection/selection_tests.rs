use crate::auxiliary::scenarios::seeded_system;
use crate::integrals::pair_magnitude_bound;
use crate::selection::{enlarge_space, select_strings, SelectionCutoffs};

#[test]
fn test_select_strings_respects_cutoff() {
    let system = seeded_system();
    let pair_bound = pair_magnitude_bound(system.eri.view());
    let strings = [0b111u64];
    // An absurdly large cutoff admits nothing.
    let none = select_strings(
        1e6,
        system.eri.view(),
        pair_bound.view(),
        &[1.0],
        &strings,
        6,
        3,
        None,
    );
    assert!(none.is_empty());
    // A vanishing cutoff admits every single excitation and more.
    let all = select_strings(
        0.0,
        system.eri.view(),
        pair_bound.view(),
        &[1.0],
        &strings,
        6,
        3,
        None,
    );
    assert!(all.len() >= 9);
    // Proposals are sorted, deduplicated, popcount-preserving and exclude the
    // sources.
    assert!(all.windows(2).all(|w| w[0] < w[1]));
    assert!(all.iter().all(|s| s.count_ones() == 3));
    assert!(!all.contains(&0b111));
}

#[test]
fn test_select_strings_filter() {
    let system = seeded_system();
    let pair_bound = pair_magnitude_bound(system.eri.view());
    let keep_odd = |s: u64| s & 1 == 1;
    let odd = select_strings(
        0.0,
        system.eri.view(),
        pair_bound.view(),
        &[1.0],
        &[0b111],
        6,
        3,
        Some(&keep_odd),
    );
    assert!(!odd.is_empty());
    assert!(odd.iter().all(|s| s & 1 == 1));
}

#[test]
fn test_enlarge_space_seeded_golden() {
    let system = seeded_system();
    let cutoffs = SelectionCutoffs::new(0.1, 0.01);
    let grown = enlarge_space(cutoffs, &system.civec, system.eri.view(), None).unwrap();
    assert_eq!(grown.alpha().len(), 17);
    assert_eq!(grown.beta().len(), 18);
    let alpha: Vec<u64> = grown.alpha().iter().collect();
    let beta: Vec<u64> = grown.beta().iter().collect();
    assert_eq!(
        alpha,
        vec![7, 11, 13, 14, 19, 21, 22, 25, 26, 28, 35, 37, 41, 42, 49, 52, 56]
    );
    assert_eq!(
        beta,
        vec![7, 11, 13, 14, 19, 21, 22, 25, 28, 35, 37, 38, 41, 44, 49, 50, 52, 56]
    );

    // The original amplitudes survive at their new addresses; everything else is
    // zero-filled.
    for (i, sa) in system.civec.alpha().iter().enumerate() {
        for (j, sb) in system.civec.beta().iter().enumerate() {
            let ia = grown.alpha().address_of(sa).unwrap();
            let jb = grown.beta().address_of(sb).unwrap();
            assert_eq!(
                grown.coefficients()[[ia, jb]],
                system.civec.coefficients()[[i, j]]
            );
        }
    }
    assert_eq!(grown.norm(), system.civec.norm());
}

#[test]
fn test_enlarge_space_monotonic_and_idempotent() {
    let system = seeded_system();
    let cutoffs = SelectionCutoffs::new(0.1, 0.01);
    let grown = enlarge_space(cutoffs, &system.civec, system.eri.view(), None).unwrap();
    for s in system.civec.alpha().iter() {
        assert!(grown.alpha().contains(s));
    }
    for s in system.civec.beta().iter() {
        assert!(grown.beta().contains(s));
    }
    // The zero-filled positions cannot seed anything, so a second round proposes
    // nothing new.
    let again = enlarge_space(cutoffs, &grown, system.eri.view(), None).unwrap();
    assert_eq!(again.alpha(), grown.alpha());
    assert_eq!(again.beta(), grown.beta());
    assert_eq!(again.coefficients(), grown.coefficients());
}

#[test]
fn test_enlarge_space_rejects_mismatched_tensor() {
    let system = seeded_system();
    let cutoffs = SelectionCutoffs::default();
    let bad = ndarray::Array4::<f64>::zeros((5, 5, 5, 5));
    assert!(enlarge_space(cutoffs, &system.civec, bad.view(), None).is_err());
}

#[test]
fn test_selection_cutoffs_default() {
    let cutoffs = SelectionCutoffs::default();
    assert_eq!(cutoffs.select_cutoff, 1e-3);
    assert_eq!(cutoffs.ci_coeff_cutoff, 1e-3);
}
