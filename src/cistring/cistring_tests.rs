use crate::cistring::{
    cre_des_sign, cre_sign, des_sign, gen_strings, num_strings, occupied_orbitals,
    virtual_orbitals, StringSpace,
};

#[test]
fn test_cistring_occupied_virtual() {
    assert_eq!(occupied_orbitals(0b10101, 6), vec![0, 2, 4]);
    assert_eq!(virtual_orbitals(0b10101, 6), vec![1, 3, 5]);
    assert_eq!(occupied_orbitals(0, 4), Vec::<usize>::new());
}

#[test]
fn test_cistring_gen_strings() {
    assert_eq!(
        gen_strings(4, 2),
        vec![0b0011, 0b0101, 0b0110, 0b1001, 0b1010, 0b1100]
    );
    assert_eq!(gen_strings(6, 3).len(), num_strings(6, 3));
    assert_eq!(num_strings(6, 3), 20);
    assert_eq!(num_strings(10, 4), 210);
    // All generated strings have the requested popcount and are strictly increasing.
    let strs = gen_strings(7, 3);
    assert!(strs.windows(2).all(|w| w[0] < w[1]));
    assert!(strs.iter().all(|s| s.count_ones() == 3));
}

#[test]
fn test_cistring_signs_compose() {
    // The single-excitation sign must equal the composition of an annihilation
    // followed by a creation.
    for &s in &gen_strings(6, 3) {
        for i in occupied_orbitals(s, 6) {
            for a in virtual_orbitals(s, 6) {
                let composed = des_sign(i, s) * cre_sign(a, s ^ (1 << i));
                assert_eq!(cre_des_sign(a, i, s), composed, "a={a} i={i} s={s:#b}");
            }
        }
    }
}

#[test]
fn test_cistring_signs_blocked() {
    assert_eq!(cre_sign(0, 0b001), 0);
    assert_eq!(des_sign(1, 0b001), 0);
    assert_eq!(cre_des_sign(2, 1, 0b001), 0);
    assert_eq!(cre_des_sign(0, 0, 0b001), 1);
    // One occupied orbital between positions 0 and 2 flips the parity.
    assert_eq!(cre_des_sign(2, 0, 0b011), -1);
    assert_eq!(cre_des_sign(2, 0, 0b001), 1);
}

#[test]
fn test_string_space_addresses() {
    let space = StringSpace::new(6, 3, [0b10101, 0b111, 0b1011, 0b111]).unwrap();
    // Sorted, deduplicated; address = sorted position.
    assert_eq!(space.len(), 3);
    assert_eq!(space.string(0), 0b111);
    assert_eq!(space.string(1), 0b1011);
    assert_eq!(space.string(2), 0b10101);
    assert_eq!(space.address_of(0b1011), Some(1));
    assert_eq!(space.address_of(0b1101), None);
}

#[test]
fn test_string_space_validation() {
    assert!(StringSpace::new(6, 3, [0b11]).is_err());
    assert!(StringSpace::new(4, 2, [0b10001]).is_err());
    assert!(StringSpace::new(3, 4, [0b111]).is_err());
    assert!(StringSpace::new(6, 3, std::iter::empty()).is_err());
}

#[test]
fn test_string_space_merge_monotonic() {
    let space = StringSpace::new(6, 3, [0b111, 0b1011]).unwrap();
    let grown = space.merged_with([0b1101, 0b111]).unwrap();
    assert_eq!(grown.len(), 3);
    for s in space.iter() {
        assert!(grown.contains(s));
    }
    // Merging nothing new is idempotent.
    let again = grown.merged_with(std::iter::empty()).unwrap();
    assert_eq!(again, grown);
}

#[test]
fn test_string_space_reference_and_full() {
    let hf = StringSpace::reference(6, 3).unwrap();
    assert_eq!(hf.len(), 1);
    assert_eq!(hf.string(0), 0b111);
    let full = StringSpace::full(6, 3).unwrap();
    assert!(full.is_full());
    assert!(!hf.is_full());
}
