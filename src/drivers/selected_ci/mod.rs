//! Driver for adaptive selected-CI calculations.

use std::fmt;

use anyhow::{self, format_err};
use derive_builder::Builder;
use ndarray::{Array2, Array4};

use crate::auxiliary::format::{
    log_subtitle, log_title, nice_bool, selci_output, selci_warn, SelciOutput,
};
use crate::cistring::StringSpace;
use crate::civector::CIVector;
use crate::contraction::{make_hdiag, HamiltonianContractor};
use crate::drivers::SelciDriver;
use crate::integrals::absorb_one_body;
use crate::selection::{enlarge_space, SelectionCutoffs};
use crate::solver::Eigensolver;

#[cfg(test)]
#[path = "selected_ci_tests.rs"]
mod selected_ci_tests;

// ==================
// Struct definitions
// ==================

// ----------
// Parameters
// ----------

/// A structure containing control parameters for adaptive selected-CI calculations.
#[derive(Clone, Builder, Debug)]
pub struct SelectedCIParams {
    /// The minimum estimated perturbative importance for a candidate determinant
    /// string to be admitted into the variational space.
    #[builder(default = "1e-3")]
    pub select_cutoff: f64,

    /// The minimum amplitude magnitude for a determinant of the current wavefunction
    /// to seed new candidates.
    #[builder(default = "1e-3")]
    pub ci_coeff_cutoff: f64,

    /// The maximum number of grow--diagonalise rounds.
    #[builder(default = "50")]
    pub max_rounds: usize,

    /// The convergence threshold on the energy change between consecutive rounds.
    #[builder(default = "1e-10")]
    pub energy_tolerance: f64,

    /// Boolean indicating if the determinant spaces are kept fixed: a single
    /// diagonalisation is performed over the supplied initial spaces and no growth
    /// takes place.
    #[builder(default = "false")]
    pub frozen_space: bool,

    /// The amplitude magnitude above which determinants of the converged
    /// wavefunction are reported.
    #[builder(default = "0.1")]
    pub dominant_threshold: f64,
}

impl SelectedCIParams {
    /// Returns a builder to construct a [`SelectedCIParams`] structure.
    pub fn builder() -> SelectedCIParamsBuilder {
        SelectedCIParamsBuilder::default()
    }
}

impl Default for SelectedCIParams {
    fn default() -> Self {
        Self {
            select_cutoff: 1e-3,
            ci_coeff_cutoff: 1e-3,
            max_rounds: 50,
            energy_tolerance: 1e-10,
            frozen_space: false,
            dominant_threshold: 0.1,
        }
    }
}

impl fmt::Display for SelectedCIParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Selection cutoff: {:.3e}", self.select_cutoff)?;
        writeln!(f, "Seed amplitude cutoff: {:.3e}", self.ci_coeff_cutoff)?;
        writeln!(f, "Maximum growth rounds: {}", self.max_rounds)?;
        writeln!(f, "Energy tolerance: {:.3e}", self.energy_tolerance)?;
        writeln!(f, "Frozen determinant spaces: {}", nice_bool(self.frozen_space))?;
        writeln!(
            f,
            "Dominant-determinant report threshold: {:.3e}",
            self.dominant_threshold
        )?;
        writeln!(f)?;

        Ok(())
    }
}

// ------
// Result
// ------

/// A structure to contain selected-CI results.
#[derive(Clone, Builder, Debug)]
pub struct SelectedCIResult<'a> {
    /// The control parameters used to obtain this set of selected-CI results.
    parameters: &'a SelectedCIParams,

    /// The variational energy of the final wavefunction.
    pub energy: f64,

    /// The final wavefunction over its selected determinant spaces.
    pub civec: CIVector,

    /// Boolean indicating if the grow--diagonalise loop reached the energy
    /// tolerance within the allowed number of rounds.
    pub converged: bool,

    /// The number of rounds performed.
    pub rounds: usize,

    /// The variational energy after every round.
    pub energies: Vec<f64>,
}

impl<'a> SelectedCIResult<'a> {
    fn builder() -> SelectedCIResultBuilder<'a> {
        SelectedCIResultBuilder::default()
    }
}

// ------
// Driver
// ------

/// A driver for adaptive selected-CI calculations.
///
/// Each round grows the determinant spaces by the current wavefunction's important
/// single and double excitations, rebuilds the Hamiltonian over the grown spaces and
/// diagonalises it for the lowest eigenpair. The loop ends when the energy change
/// between rounds falls below the tolerance, when the spaces stop growing, or when
/// the round budget is exhausted.
#[derive(Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct SelectedCIDriver<'a> {
    /// The control parameters for the calculation.
    parameters: &'a SelectedCIParams,

    /// The one-body integral matrix in the orthonormal orbital basis.
    one_body: &'a Array2<f64>,

    /// The two-body electron-repulsion tensor in chemists' notation `(pq|rs)`.
    two_body: &'a Array4<f64>,

    /// The number of alpha electrons.
    neleca: usize,

    /// The number of beta electrons.
    nelecb: usize,

    /// Optional initial `(alpha, beta)` determinant spaces. If `None`, the
    /// calculation starts from the aufbau reference determinant of each channel.
    #[builder(default = "None")]
    initial_space: Option<(StringSpace, StringSpace)>,

    /// The eigensolver used for every diagonalisation.
    eigensolver: &'a dyn Eigensolver,

    /// The result of the calculation.
    #[builder(setter(skip), default = "None")]
    result: Option<SelectedCIResult<'a>>,
}

impl<'a> SelectedCIDriverBuilder<'a> {
    fn validate(&self) -> Result<(), String> {
        let params = self
            .parameters
            .ok_or("No selected-CI parameters found.".to_string())?;
        let h1 = self.one_body.ok_or("No one-body integrals found.".to_string())?;
        let eri = self.two_body.ok_or("No two-body integrals found.".to_string())?;
        let norb = h1.nrows();
        if h1.ncols() != norb {
            return Err(format!(
                "One-body integral matrix has non-square shape {:?}.",
                h1.dim()
            ));
        }
        if eri.dim() != (norb, norb, norb, norb) {
            return Err(format!(
                "Two-body tensor shape {:?} does not match `{norb}` orbitals.",
                eri.dim()
            ));
        }
        let neleca = self.neleca.ok_or("No alpha electron count found.".to_string())?;
        let nelecb = self.nelecb.ok_or("No beta electron count found.".to_string())?;
        if neleca > norb || nelecb > norb {
            return Err(format!(
                "Electron counts ({neleca}, {nelecb}) exceed `{norb}` orbitals."
            ));
        }
        if let Some(Some((alpha, beta))) = self.initial_space.as_ref() {
            if alpha.norb() != norb || beta.norb() != norb {
                return Err(
                    "Initial determinant spaces span a different orbital count from the integrals."
                        .to_string(),
                );
            }
            if alpha.nelec() != neleca || beta.nelec() != nelecb {
                return Err(
                    "Initial determinant spaces carry different electron counts from the requested ones."
                        .to_string(),
                );
            }
        } else if params.frozen_space {
            return Err(
                "Frozen determinant spaces requested, but no initial spaces supplied.".to_string(),
            );
        }
        Ok(())
    }
}

impl<'a> SelectedCIDriver<'a> {
    /// Returns a builder to construct a [`SelectedCIDriver`] structure.
    pub fn builder() -> SelectedCIDriverBuilder<'a> {
        SelectedCIDriverBuilder::default()
    }

    /// Executes the grow--diagonalise loop.
    fn solve(&mut self) -> Result<(), anyhow::Error> {
        log_title("Selected Configuration Interaction");
        selci_output!("");
        let params = self.parameters;
        params.log_output_display();

        let norb = self.one_body.nrows();
        let nelec = self.neleca + self.nelecb;
        let g = absorb_one_body(self.one_body.view(), self.two_body.view(), nelec, 0.5)?;

        let (alpha0, beta0) = match self.initial_space.as_ref() {
            Some((alpha, beta)) => (alpha.clone(), beta.clone()),
            None => (
                StringSpace::reference(norb, self.neleca)?,
                StringSpace::reference(norb, self.nelecb)?,
            ),
        };
        selci_output!(
            "Initial spaces: {} alpha strings × {} beta strings over {} orbitals",
            alpha0.len(),
            beta0.len(),
            norb
        );
        selci_output!("");

        // Seed amplitude: the unit vector on the lowest-diagonal determinant of the
        // initial grid.
        let hdiag = make_hdiag(self.one_body.view(), self.two_body.view(), &alpha0, &beta0)?;
        let seed = hdiag
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(k, _)| k)
            .ok_or_else(|| format_err!("The initial determinant grid is empty."))?;
        let nb0 = beta0.len();
        let mut coeff0 = Array2::<f64>::zeros((alpha0.len(), nb0));
        coeff0[[seed / nb0, seed % nb0]] = 1.0;
        let mut civec = CIVector::new(alpha0, beta0, coeff0)?;

        let cutoffs = SelectionCutoffs::new(params.select_cutoff, params.ci_coeff_cutoff);

        log_subtitle("Iterative space growth");
        selci_output!("");
        selci_output!("{}", "┈".repeat(66));
        selci_output!(
            "{:>4} {:>8} {:>8} {:>10} {:>18} {:>12}",
            "#",
            "N(α)",
            "N(β)",
            "Dim",
            "E",
            "ΔE",
        );
        selci_output!("{}", "┈".repeat(66));

        let mut energies: Vec<f64> = Vec::new();
        let mut converged = false;
        let mut rounds = 0;
        while rounds < params.max_rounds && !converged {
            rounds += 1;
            let grown = if params.frozen_space {
                civec.clone()
            } else {
                enlarge_space(cutoffs, &civec, g.view(), None)?
            };
            let unchanged = grown.alpha().len() == civec.alpha().len()
                && grown.beta().len() == civec.beta().len()
                && rounds > 1;
            civec = grown;

            let contractor =
                HamiltonianContractor::new(g.clone(), civec.alpha().clone(), civec.beta().clone())?;
            let (energy, coeff) = self.eigensolver.lowest(&contractor)?;
            civec = civec.with_coefficients(coeff)?;

            let de = energies.last().map_or(f64::NAN, |last| energy - last);
            selci_output!(
                "{:>4} {:>8} {:>8} {:>10} {:>18.12} {:>12.3e}",
                rounds,
                civec.alpha().len(),
                civec.beta().len(),
                civec.alpha().len() * civec.beta().len(),
                energy,
                de,
            );
            converged = params.frozen_space
                || unchanged
                || energies
                    .last()
                    .is_some_and(|last| (energy - last).abs() < params.energy_tolerance);
            energies.push(energy);
        }
        selci_output!("{}", "┈".repeat(66));
        selci_output!("");

        let energy = *energies
            .last()
            .ok_or_else(|| format_err!("No diagonalisation round was performed."))?;
        if converged {
            selci_output!("Converged after {rounds} round(s): E = {energy:.12}");
        } else {
            selci_warn!(
                "No convergence after {rounds} round(s); the last energy is E = {energy:.12}."
            );
        }
        selci_output!("");

        let dominants = civec.dominant_configurations(params.dominant_threshold);
        if !dominants.is_empty() {
            selci_output!(
                "Determinants with |amplitude| ≥ {:.3e}:",
                params.dominant_threshold
            );
            for (coeff, sa, sb) in &dominants {
                selci_output!("  |{sa:0norb$b}⟩|{sb:0norb$b}⟩  {coeff:>15.10}");
            }
            selci_output!("");
        }

        self.result = Some(
            SelectedCIResult::builder()
                .parameters(params)
                .energy(energy)
                .civec(civec)
                .converged(converged)
                .rounds(rounds)
                .energies(energies)
                .build()
                .map_err(|err| format_err!("{err}"))?,
        );
        Ok(())
    }
}

impl<'a> SelciDriver for SelectedCIDriver<'a> {
    type Params = SelectedCIParams;

    type Outcome = SelectedCIResult<'a>;

    fn run(&mut self) -> Result<(), anyhow::Error> {
        self.solve()
    }

    fn result(&self) -> Result<&Self::Outcome, anyhow::Error> {
        self.result
            .as_ref()
            .ok_or_else(|| format_err!("No selected-CI result found."))
    }
}
