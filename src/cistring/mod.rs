//! Determinant strings and string spaces.
//!
//! A determinant string encodes the orbital occupation of one spin channel as a bit
//! pattern: bit `i` is set if and only if orbital `i` is occupied. A [`StringSpace`]
//! is an ordered, deduplicated collection of such strings for one spin channel; the
//! position of a string within the space is its *address*, and all data derived from
//! a space (linkage tables, coefficient matrices) is keyed by address. Addresses are
//! invalidated whenever the space changes, so derived data must be rebuilt or
//! re-embedded after every growth step.

use std::fmt;

use anyhow::{self, ensure, format_err};
use indexmap::IndexSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "cistring_tests.rs"]
mod cistring_tests;

/// A determinant string: a fixed-width bit pattern over orbital indices.
pub type DetString = u64;

/// Returns the occupied orbital indices of `string` in ascending order.
pub fn occupied_orbitals(string: DetString, norb: usize) -> Vec<usize> {
    (0..norb).filter(|i| string & (1 << i) != 0).collect()
}

/// Returns the unoccupied orbital indices of `string` in ascending order.
pub fn virtual_orbitals(string: DetString, norb: usize) -> Vec<usize> {
    (0..norb).filter(|i| string & (1 << i) == 0).collect()
}

/// Returns the fermionic sign of applying the creation operator for orbital `p` to
/// `string`, or `0` if orbital `p` is already occupied.
///
/// The sign convention counts the occupied orbitals above `p`, consistent with
/// [`des_sign`] and [`cre_des_sign`].
pub fn cre_sign(p: usize, string: DetString) -> i8 {
    if string & (1 << p) != 0 {
        0
    } else if (string >> (p + 1)).count_ones() % 2 == 1 {
        -1
    } else {
        1
    }
}

/// Returns the fermionic sign of applying the annihilation operator for orbital `p`
/// to `string`, or `0` if orbital `p` is unoccupied.
pub fn des_sign(p: usize, string: DetString) -> i8 {
    if string & (1 << p) == 0 {
        0
    } else if (string >> (p + 1)).count_ones() % 2 == 1 {
        -1
    } else {
        1
    }
}

/// Returns the fermionic sign of the excitation moving an electron from occupied
/// orbital `i` to virtual orbital `a` in `string`: the parity of the number of
/// occupied orbitals strictly between the two positions. Returns `1` for `a == i`
/// (the number operator) and `0` if the excitation is not applicable.
pub fn cre_des_sign(a: usize, i: usize, string: DetString) -> i8 {
    if a == i {
        return 1;
    }
    if string & (1 << a) != 0 || string & (1 << i) == 0 {
        return 0;
    }
    let (hi, lo) = if a > i { (a, i) } else { (i, a) };
    let mask = ((1u64 << hi) - 1) & !((1u64 << (lo + 1)) - 1);
    if (string & mask).count_ones() % 2 == 1 {
        -1
    } else {
        1
    }
}

/// Returns the number of determinant strings of `nelec` electrons in `norb` orbitals.
pub fn num_strings(norb: usize, nelec: usize) -> usize {
    if nelec > norb {
        return 0;
    }
    let mut n = 1usize;
    for k in 0..nelec.min(norb - nelec) {
        n = n * (norb - k) / (k + 1);
    }
    n
}

/// Enumerates all determinant strings of `nelec` electrons in `norb` orbitals in
/// ascending numeric order, which coincides with the lexicographic order of the
/// occupied-orbital lists.
pub fn gen_strings(norb: usize, nelec: usize) -> Vec<DetString> {
    (0..norb)
        .combinations(nelec)
        .map(|occ| occ.iter().fold(0u64, |s, i| s | (1 << i)))
        .sorted_unstable()
        .collect()
}

// ==================
// Struct definitions
// ==================

/// An ordered, deduplicated collection of determinant strings for one spin channel.
///
/// The stored order defines the address mapping: the address of a string is its
/// position in the space. Spaces constructed by this crate are always sorted in
/// ascending numeric string order.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringSpace {
    /// The number of orbitals spanned by the strings.
    norb: usize,

    /// The number of electrons in this spin channel. Every string in the space has
    /// exactly this popcount.
    nelec: usize,

    /// The strings, in ascending order; set index equals address.
    strings: IndexSet<DetString>,
}

impl StringSpace {
    /// Constructs a string space from an iterator of strings, sorting and
    /// deduplicating them. Every string must have exactly `nelec` bits set, all
    /// within the lowest `norb` bits.
    pub fn new(
        norb: usize,
        nelec: usize,
        strings: impl IntoIterator<Item = DetString>,
    ) -> Result<Self, anyhow::Error> {
        ensure!(
            norb <= 64,
            "The number of orbitals, `{norb}`, exceeds the 64-bit string width."
        );
        ensure!(
            nelec <= norb,
            "The electron count, `{nelec}`, exceeds the number of orbitals, `{norb}`."
        );
        let sorted: IndexSet<DetString> = strings.into_iter().sorted_unstable().collect();
        for &s in sorted.iter() {
            ensure!(
                s >> norb == 0,
                "String `{s:#b}` has bits set outside the `{norb}` orbitals."
            );
            ensure!(
                s.count_ones() as usize == nelec,
                "String `{s:#b}` does not have exactly `{nelec}` bits set."
            );
        }
        ensure!(!sorted.is_empty(), "A string space cannot be empty.");
        Ok(Self {
            norb,
            nelec,
            strings: sorted,
        })
    }

    /// Constructs the single-string reference space in which the lowest `nelec`
    /// orbitals are occupied.
    pub fn reference(norb: usize, nelec: usize) -> Result<Self, anyhow::Error> {
        ensure!(
            nelec >= 1,
            "A reference string requires at least one electron."
        );
        Self::new(norb, nelec, [(1u64 << nelec) - 1])
    }

    /// Constructs the complete combinatorial space of `nelec` electrons in `norb`
    /// orbitals.
    pub fn full(norb: usize, nelec: usize) -> Result<Self, anyhow::Error> {
        Self::new(norb, nelec, gen_strings(norb, nelec))
    }

    /// The number of orbitals spanned by the strings.
    pub fn norb(&self) -> usize {
        self.norb
    }

    /// The number of electrons in this spin channel.
    pub fn nelec(&self) -> usize {
        self.nelec
    }

    /// The number of strings in the space.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns `true` if the space contains no strings.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Returns the string at `address`.
    ///
    /// # Panics
    ///
    /// Panics if `address` is out of bounds.
    pub fn string(&self, address: usize) -> DetString {
        *self
            .strings
            .get_index(address)
            .unwrap_or_else(|| panic!("Address `{address}` is out of bounds."))
    }

    /// Returns the address of `string` within the space, if present.
    pub fn address_of(&self, string: DetString) -> Option<usize> {
        self.strings.get_index_of(&string)
    }

    /// Returns `true` if `string` is present in the space.
    pub fn contains(&self, string: DetString) -> bool {
        self.strings.contains(&string)
    }

    /// Iterates over the strings in address order.
    pub fn iter(&self) -> impl Iterator<Item = DetString> + '_ {
        self.strings.iter().copied()
    }

    /// Returns a new space holding the sorted union of this space with `extra`.
    /// Growth is monotonic: every string of the current space survives, although its
    /// address generally changes.
    pub fn merged_with(
        &self,
        extra: impl IntoIterator<Item = DetString>,
    ) -> Result<Self, anyhow::Error> {
        Self::new(self.norb, self.nelec, self.iter().chain(extra))
    }

    /// Returns `true` if this space is the complete combinatorial enumeration.
    pub fn is_full(&self) -> bool {
        self.len() == num_strings(self.norb, self.nelec)
    }

    /// Checks that `other` describes the same spin channel (orbital and electron
    /// counts) as this space.
    pub(crate) fn ensure_compatible(&self, other: &Self) -> Result<(), anyhow::Error> {
        if self.norb == other.norb && self.nelec == other.nelec {
            Ok(())
        } else {
            Err(format_err!(
                "Incompatible string spaces: ({}, {}) versus ({}, {}).",
                self.norb,
                self.nelec,
                other.norb,
                other.nelec
            ))
        }
    }
}

impl fmt::Debug for StringSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StringSpace(norb = {}, nelec = {}, {} strings)",
            self.norb,
            self.nelec,
            self.len()
        )
    }
}
