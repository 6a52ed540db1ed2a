//! Sparse linkage tables between determinant-string addresses.
//!
//! A linkage table records, for every source address of a [`StringSpace`] (or of a
//! derived intermediate string list), the destinations reachable by a fixed chain of
//! creation/annihilation operators together with the fermionic reordering sign.
//! Destinations outside the given space are *omitted*, not mapped to an error: this
//! locality is what bounds selected-CI cost to the selected space, and dropping
//! out-of-space terms is the defining approximation of the method.
//!
//! Tables are derived data: they are owned together with the space they were built
//! from and must be rebuilt whenever that space changes.

use anyhow::{self, ensure};
use itertools::Itertools;

use crate::cistring::{
    cre_des_sign, cre_sign, des_sign, occupied_orbitals, virtual_orbitals, DetString, StringSpace,
};
use crate::integrals::pair_index;


// ==================
// Struct definitions
// ==================

/// One single-excitation linkage entry: `a†_cre a_des |source⟩ = sign |destination⟩`,
/// with both strings inside the originating space. Diagonal entries (`cre == des`,
/// `sign == +1`, `destination == source`) represent the number operator on occupied
/// orbitals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SingleExcitation {
    pub cre: usize,
    pub des: usize,
    pub address: usize,
    pub sign: i8,
}

/// One triangular-packed single-excitation entry: the `(cre, des)` orbital pair is
/// collapsed into the unordered pair index [`pair_index`]`(cre, des)` for contraction
/// paths symmetric under orbital-pair exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedSingleExcitation {
    pub pair: usize,
    pub address: usize,
    pub sign: i8,
}

/// One double-annihilation linkage entry attached to a two-electron-removed
/// intermediate `|I⟩`: `⟨I| a_p a_q |destination⟩ = sign`, where `destination`
/// addresses the originating space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PairAnnihilation {
    pub p: usize,
    pub q: usize,
    pub address: usize,
    pub sign: i8,
}

/// One triangular-packed double-annihilation entry: only the canonical ordering
/// `p > q` is stored, packed as `p(p−1)/2 + q`; the consumer applies the implied
/// antisymmetry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedPairAnnihilation {
    pub pair: usize,
    pub address: usize,
    pub sign: i8,
}

/// One single-operator linkage entry attached to an odd-rank intermediate `|I⟩`, used
/// by [`AnnihilationTable`] and [`CreationTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SingleOperator {
    pub orb: usize,
    pub address: usize,
    pub sign: i8,
}

/// The single-excitation table of a string space: one row per source address.
///
/// Rows are ragged: only valid entries are stored, so no sentinel convention is
/// needed to distinguish unused slots from a genuine zero-orbital entry.
#[derive(Clone, Debug)]
pub struct SingleExcitationTable {
    rows: Vec<Vec<SingleExcitation>>,
}

impl SingleExcitationTable {
    /// The entries of the row for `address`.
    pub fn row(&self, address: usize) -> &[SingleExcitation] {
        &self.rows[address]
    }

    /// The number of rows, equal to the size of the originating space.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over `(source address, row)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[SingleExcitation])> {
        self.rows.iter().enumerate().map(|(i, r)| (i, r.as_slice()))
    }
}

/// The triangular-packed single-excitation table of a string space.
#[derive(Clone, Debug)]
pub struct PackedSingleExcitationTable {
    rows: Vec<Vec<PackedSingleExcitation>>,
}

impl PackedSingleExcitationTable {
    /// The entries of the row for `address`.
    pub fn row(&self, address: usize) -> &[PackedSingleExcitation] {
        &self.rows[address]
    }

    /// Iterates over `(source address, row)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[PackedSingleExcitation])> {
        self.rows.iter().enumerate().map(|(i, r)| (i, r.as_slice()))
    }
}

/// The double-annihilation table of a string space: one row per two-electron-removed
/// intermediate string, each entry mapping the intermediate back into the space by a
/// pair of creations. Both orderings of every pair are stored, with signs antisymmetric
/// under exchange.
#[derive(Clone, Debug)]
pub struct DoubleAnnihilationTable {
    intermediates: Vec<DetString>,
    rows: Vec<Vec<PairAnnihilation>>,
}

impl DoubleAnnihilationTable {
    /// An empty table: no intermediates, no entries. This is the correct
    /// double-annihilation structure for a spin channel holding fewer than two
    /// electrons.
    pub fn empty() -> Self {
        Self {
            intermediates: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// The sorted, deduplicated intermediate strings (electron count lowered by two).
    pub fn intermediates(&self) -> &[DetString] {
        &self.intermediates
    }

    /// The entries of the row for intermediate index `k`.
    pub fn row(&self, k: usize) -> &[PairAnnihilation] {
        &self.rows[k]
    }

    /// Iterates over `(intermediate index, row)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[PairAnnihilation])> {
        self.rows.iter().enumerate().map(|(i, r)| (i, r.as_slice()))
    }
}

/// The triangular-packed double-annihilation table.
#[derive(Clone, Debug)]
pub struct PackedDoubleAnnihilationTable {
    intermediates: Vec<DetString>,
    rows: Vec<Vec<PackedPairAnnihilation>>,
}

impl PackedDoubleAnnihilationTable {
    /// The sorted, deduplicated intermediate strings (electron count lowered by two).
    pub fn intermediates(&self) -> &[DetString] {
        &self.intermediates
    }

    /// The entries of the row for intermediate index `k`.
    pub fn row(&self, k: usize) -> &[PackedPairAnnihilation] {
        &self.rows[k]
    }
}

/// The single-annihilation table of a string space: one row per one-electron-removed
/// intermediate `|I⟩`, each entry recording `⟨I| a_orb |destination⟩ = sign` with the
/// destination inside the space.
#[derive(Clone, Debug)]
pub struct AnnihilationTable {
    intermediates: Vec<DetString>,
    rows: Vec<Vec<SingleOperator>>,
}

impl AnnihilationTable {
    /// The sorted, deduplicated intermediate strings (electron count lowered by one).
    pub fn intermediates(&self) -> &[DetString] {
        &self.intermediates
    }

    /// The entries of the row for intermediate index `k`.
    pub fn row(&self, k: usize) -> &[SingleOperator] {
        &self.rows[k]
    }

    /// Iterates over `(intermediate index, row)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[SingleOperator])> {
        self.rows.iter().enumerate().map(|(i, r)| (i, r.as_slice()))
    }
}

/// The single-creation table of a string space: one row per one-electron-raised
/// intermediate `|I⟩`, each entry recording `⟨I| a†_orb |destination⟩ = sign` with the
/// destination inside the space.
#[derive(Clone, Debug)]
pub struct CreationTable {
    intermediates: Vec<DetString>,
    rows: Vec<Vec<SingleOperator>>,
}

impl CreationTable {
    /// The sorted, deduplicated intermediate strings (electron count raised by one).
    pub fn intermediates(&self) -> &[DetString] {
        &self.intermediates
    }

    /// The entries of the row for intermediate index `k`.
    pub fn row(&self, k: usize) -> &[SingleOperator] {
        &self.rows[k]
    }

    /// Iterates over `(intermediate index, row)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[SingleOperator])> {
        self.rows.iter().enumerate().map(|(i, r)| (i, r.as_slice()))
    }
}

// =========
// Functions
// =========

/// Builds the single-excitation table of `space`: for every source string, diagonal
/// entries for each occupied orbital and, for every occupied `i` and virtual `a`,
/// an entry for the excitation `i → a` whenever the excited string is itself present
/// in the space.
pub fn single_excitation_table(space: &StringSpace) -> SingleExcitationTable {
    let norb = space.norb();
    let rows = space
        .iter()
        .enumerate()
        .map(|(source, s0)| {
            let occ = occupied_orbitals(s0, norb);
            let vir = virtual_orbitals(s0, norb);
            let mut row: Vec<SingleExcitation> = occ
                .iter()
                .map(|&i| SingleExcitation {
                    cre: i,
                    des: i,
                    address: source,
                    sign: 1,
                })
                .collect();
            for &a in &vir {
                for &i in &occ {
                    let s1 = (s0 ^ (1 << i)) | (1 << a);
                    if let Some(dest) = space.address_of(s1) {
                        row.push(SingleExcitation {
                            cre: a,
                            des: i,
                            address: dest,
                            sign: cre_des_sign(a, i, s0),
                        });
                    }
                }
            }
            row
        })
        .collect();
    SingleExcitationTable { rows }
}

/// Builds the triangular-packed variant of [`single_excitation_table`], collapsing
/// each `(cre, des)` pair into one unordered pair index.
pub fn single_excitation_table_tril(space: &StringSpace) -> PackedSingleExcitationTable {
    let full = single_excitation_table(space);
    let rows = full
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|e| PackedSingleExcitation {
                    pair: pair_index(e.cre, e.des),
                    address: e.address,
                    sign: e.sign,
                })
                .collect()
        })
        .collect();
    PackedSingleExcitationTable { rows }
}

fn double_annihilation_intermediates(
    space: &StringSpace,
    filter: Option<&dyn Fn(DetString) -> bool>,
) -> Vec<DetString> {
    let norb = space.norb();
    space
        .iter()
        .flat_map(|s0| {
            occupied_orbitals(s0, norb)
                .into_iter()
                .tuple_combinations()
                .map(move |(j, i)| s0 ^ (1 << i) ^ (1 << j))
                .collect::<Vec<_>>()
        })
        .filter(|&s| filter.map_or(true, |f| f(s)))
        .sorted_unstable()
        .dedup()
        .collect()
}

/// Builds the double-annihilation table of `space`: intermediate strings with two
/// electrons removed, and for each intermediate every ordered pair of virtual
/// orbitals whose re-creation reaches a string present in the space. Both orderings
/// of a pair are recorded with antisymmetric signs. An optional `filter` rejects
/// intermediate strings (symmetry pruning).
///
/// Fails if the space holds fewer than two electrons per string.
pub fn double_annihilation_table(
    space: &StringSpace,
    filter: Option<&dyn Fn(DetString) -> bool>,
) -> Result<DoubleAnnihilationTable, anyhow::Error> {
    ensure!(
        space.nelec() >= 2,
        "A double-annihilation table requires at least two electrons, got `{}`.",
        space.nelec()
    );
    let norb = space.norb();
    let intermediates = double_annihilation_intermediates(space, filter);
    let rows = intermediates
        .iter()
        .map(|&s1| {
            let vir = virtual_orbitals(s1, norb);
            let mut row = Vec::new();
            for (k, &i) in vir.iter().enumerate() {
                for &j in &vir[..k] {
                    let s0 = s1 | (1 << i) | (1 << j);
                    if let Some(dest) = space.address_of(s0) {
                        // Creating i then j: a†_j a†_i |s1⟩ = sign |s0⟩.
                        let sign = cre_sign(i, s1) * cre_sign(j, s1 | (1 << i));
                        row.push(PairAnnihilation {
                            p: i,
                            q: j,
                            address: dest,
                            sign,
                        });
                        row.push(PairAnnihilation {
                            p: j,
                            q: i,
                            address: dest,
                            sign: -sign,
                        });
                    }
                }
            }
            row
        })
        .collect();
    Ok(DoubleAnnihilationTable {
        intermediates,
        rows,
    })
}

/// Builds the triangular-packed variant of [`double_annihilation_table`], storing only
/// the canonical ordering `p > q` as the strict pair index `p(p−1)/2 + q`.
pub fn double_annihilation_table_tril(
    space: &StringSpace,
    filter: Option<&dyn Fn(DetString) -> bool>,
) -> Result<PackedDoubleAnnihilationTable, anyhow::Error> {
    let full = double_annihilation_table(space, filter)?;
    let rows = full
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .filter(|e| e.p > e.q)
                .map(|e| PackedPairAnnihilation {
                    pair: e.p * (e.p - 1) / 2 + e.q,
                    address: e.address,
                    sign: e.sign,
                })
                .collect()
        })
        .collect();
    Ok(PackedDoubleAnnihilationTable {
        intermediates: full.intermediates,
        rows,
    })
}

/// Builds the single-annihilation table of `space`: one-electron-removed
/// intermediates, each linked back into the space by single creations. An optional
/// `filter` rejects intermediate strings.
///
/// Fails if the space holds no electrons.
pub fn single_annihilation_table(
    space: &StringSpace,
    filter: Option<&dyn Fn(DetString) -> bool>,
) -> Result<AnnihilationTable, anyhow::Error> {
    ensure!(
        space.nelec() >= 1,
        "A single-annihilation table requires at least one electron."
    );
    let norb = space.norb();
    let intermediates: Vec<DetString> = space
        .iter()
        .flat_map(|s0| {
            occupied_orbitals(s0, norb)
                .into_iter()
                .map(move |i| s0 ^ (1 << i))
        })
        .filter(|&s| filter.map_or(true, |f| f(s)))
        .sorted_unstable()
        .dedup()
        .collect();
    let rows = intermediates
        .iter()
        .map(|&s1| {
            virtual_orbitals(s1, norb)
                .into_iter()
                .filter_map(|i| {
                    space.address_of(s1 | (1 << i)).map(|dest| SingleOperator {
                        orb: i,
                        address: dest,
                        sign: cre_sign(i, s1),
                    })
                })
                .collect()
        })
        .collect();
    Ok(AnnihilationTable {
        intermediates,
        rows,
    })
}

/// Builds the single-creation table of `space`: one-electron-raised intermediates,
/// each linked back into the space by single annihilations. An optional `filter`
/// rejects intermediate strings.
///
/// Fails if every orbital of the space is occupied.
pub fn single_creation_table(
    space: &StringSpace,
    filter: Option<&dyn Fn(DetString) -> bool>,
) -> Result<CreationTable, anyhow::Error> {
    ensure!(
        space.nelec() < space.norb(),
        "A single-creation table requires at least one virtual orbital."
    );
    let norb = space.norb();
    let intermediates: Vec<DetString> = space
        .iter()
        .flat_map(|s0| {
            virtual_orbitals(s0, norb)
                .into_iter()
                .map(move |i| s0 | (1 << i))
        })
        .filter(|&s| filter.map_or(true, |f| f(s)))
        .sorted_unstable()
        .dedup()
        .collect();
    let rows = intermediates
        .iter()
        .map(|&s1| {
            occupied_orbitals(s1, norb)
                .into_iter()
                .filter_map(|i| {
                    space.address_of(s1 ^ (1 << i)).map(|dest| SingleOperator {
                        orb: i,
                        address: dest,
                        sign: des_sign(i, s1),
                    })
                })
                .collect()
        })
        .collect();
    Ok(CreationTable {
        intermediates,
        rows,
    })
}
