use approx::assert_relative_eq;
use ndarray::Array1;

use crate::auxiliary::scenarios::{seeded_system, NORB};
use crate::integrals::{absorb_one_body, pair_index, pair_magnitude_bound, restore_eri};

#[test]
fn test_pair_index() {
    assert_eq!(pair_index(0, 0), 0);
    assert_eq!(pair_index(1, 0), 1);
    assert_eq!(pair_index(1, 1), 2);
    assert_eq!(pair_index(3, 2), 8);
    // Unordered: both orderings collapse onto the same slot.
    for p in 0..6 {
        for q in 0..6 {
            assert_eq!(pair_index(p, q), pair_index(q, p));
        }
    }
}

#[test]
fn test_restore_eri_eightfold_symmetry() {
    let system = seeded_system();
    let eri = &system.eri;
    for p in 0..NORB {
        for q in 0..NORB {
            for r in 0..NORB {
                for s in 0..NORB {
                    let v = eri[[p, q, r, s]];
                    assert_eq!(v, eri[[q, p, r, s]]);
                    assert_eq!(v, eri[[p, q, s, r]]);
                    assert_eq!(v, eri[[r, s, p, q]]);
                }
            }
        }
    }
}

#[test]
fn test_restore_eri_rejects_wrong_length() {
    let packed = Array1::<f64>::zeros(10);
    assert!(restore_eri(packed.view(), 6).is_err());
}

#[test]
fn test_absorb_one_body_formula() {
    let system = seeded_system();
    let g = absorb_one_body(system.h1.view(), system.eri.view(), 6, 0.5).unwrap();
    // Folded tensor stays symmetric under exchange of the two excitation pairs.
    for p in 0..NORB {
        for q in 0..NORB {
            for r in 0..NORB {
                for s in 0..NORB {
                    assert_relative_eq!(g[[p, q, r, s]], g[[r, s, p, q]], max_relative = 1e-12);
                }
            }
        }
    }
    // Spot-check the fold against its definition.
    let f1e = |p: usize, q: usize| {
        system.h1[[p, q]]
            - 0.5 * (0..NORB).map(|r| system.eri[[p, r, r, q]]).sum::<f64>()
    };
    let expected = 0.5 * (system.eri[[2, 4, 1, 3]]);
    assert_relative_eq!(g[[2, 4, 1, 3]], expected, max_relative = 1e-12);
    // The (2, 4) pair is off-diagonal, so only the k = 0 diagonal of the first
    // pair contributes the folded one-body term.
    let expected_diag = 0.5 * (system.eri[[0, 0, 2, 4]] + f1e(2, 4) / 6.0);
    assert_relative_eq!(g[[0, 0, 2, 4]], expected_diag, max_relative = 1e-12);
}

#[test]
fn test_absorb_one_body_rejects_zero_electrons() {
    let system = seeded_system();
    assert!(absorb_one_body(system.h1.view(), system.eri.view(), 0, 0.5).is_err());
}

#[test]
fn test_pair_magnitude_bound() {
    let system = seeded_system();
    let bound = pair_magnitude_bound(system.eri.view());
    for p in 0..NORB {
        for q in 0..NORB {
            for r in 0..NORB {
                for s in 0..NORB {
                    assert!(bound[[p, q]] >= system.eri[[p, q, r, s]].abs());
                }
            }
        }
    }
    // The bound is attained.
    let attained = (0..NORB).flat_map(|r| (0..NORB).map(move |s| (r, s))).any(
        |(r, s)| (system.eri[[3, 1, r, s]].abs() - bound[[3, 1]]).abs() < 1e-15,
    );
    assert!(attained);
}
