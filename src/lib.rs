//! # selci: an adaptive determinant-space engine for selected configuration interaction
//!
//! `selci` computes approximate ground (and transition) eigenstates of many-electron
//! Hamiltonians by adaptively selecting the most important electron configurations
//! (CIPSI-style selected CI) instead of enumerating the full determinant space. The
//! crate provides:
//! - bitstring representation of determinant strings with fermionic sign bookkeeping,
//! - sparse linkage tables that restrict Hamiltonian application and density-matrix
//!   contraction to the *selected* space,
//! - an importance-driven string selector and iterative space grower,
//! - a direct-CI Hamiltonian contractor and one-/two-particle (transition)
//!   density-matrix builders, and
//! - a variational driver that orchestrates growth rounds and diagonalisations.
//!
//! The engine consumes a symmetric one-body matrix and a four-index two-body tensor in
//! chemist `(pq|rs)` convention, already transformed to the molecular-orbital basis.
//! Integral generation and basis-set handling are external collaborators: the engine
//! starts from the integral arrays and hands diagonalisation to a [`solver::Eigensolver`]
//! bound to a [`contraction::HamiltonianContractor`].
//!
//! For most items, their usages are illustrated in test functions.

pub mod auxiliary;
pub mod cistring;
pub mod civector;
pub mod contraction;
pub mod drivers;
pub mod integrals;
pub mod linkage;
pub mod rdm;
pub mod selection;
pub mod solver;
pub mod spin;
