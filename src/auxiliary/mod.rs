//! Auxiliary utilities for the `selci` crate.

pub mod format;
pub mod prng;

#[cfg(test)]
pub(crate) mod scenarios;
