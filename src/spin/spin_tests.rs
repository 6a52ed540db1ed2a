use approx::assert_relative_eq;
use ndarray::Array2;

use crate::auxiliary::scenarios::seeded_system;
use crate::cistring::StringSpace;
use crate::civector::CIVector;
use crate::spin::spin_square;

#[test]
fn test_spin_square_seeded_golden() {
    let system = seeded_system();
    let (ss, mult) = spin_square(&system.civec).unwrap();
    assert_relative_eq!(ss, 0.45886595926807505, epsilon = 1e-9);
    assert_relative_eq!(mult, (4.0 * ss + 1.0).sqrt(), epsilon = 1e-12);
}

#[test]
fn test_spin_square_selected_equals_embedded_full() {
    let system = seeded_system();
    let (ss, _) = spin_square(&system.civec).unwrap();
    let (ss_full, _) = spin_square(&system.civec.to_full().unwrap()).unwrap();
    assert_relative_eq!(ss, ss_full, epsilon = 1e-12);
}

#[test]
fn test_spin_square_closed_shell_reference() {
    let hf = CIVector::reference(6, 3, 3).unwrap();
    let (ss, mult) = spin_square(&hf).unwrap();
    assert_relative_eq!(ss, 0.0, epsilon = 1e-12);
    assert_relative_eq!(mult, 1.0, epsilon = 1e-12);
}

#[test]
fn test_spin_square_high_spin_guard() {
    // With an empty beta channel the raising operator annihilates everything, and
    // only the z-projection term survives.
    let alpha = StringSpace::reference(6, 3).unwrap();
    let beta = StringSpace::new(6, 0, [0]).unwrap();
    let quartet = CIVector::new(alpha, beta, Array2::ones((1, 1))).unwrap();
    let (ss, mult) = spin_square(&quartet).unwrap();
    assert_relative_eq!(ss, 3.75, epsilon = 1e-12);
    assert_relative_eq!(mult, 4.0, epsilon = 1e-12);

    // A completely filled alpha channel likewise has no raising contribution.
    let filled = StringSpace::full(3, 3).unwrap();
    let beta1 = StringSpace::reference(3, 1).unwrap();
    let vec = CIVector::new(filled, beta1, Array2::ones((1, 1))).unwrap();
    let (ss2, _) = spin_square(&vec).unwrap();
    assert_relative_eq!(ss2, 2.0, epsilon = 1e-12);
}
