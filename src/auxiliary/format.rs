//! Nice output formatting for driver reports.

use std::fmt;

use log;

const SELCI_BANNER_LENGTH: usize = 103;

/// Logs a main output line to the `selci-output` logger.
macro_rules! selci_output {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::info!(target: "selci-output", $fmt, $($($arg)*)?); }
}

/// Logs a warning to the `selci-output` logger.
macro_rules! selci_warn {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::warn!(target: "selci-output", $fmt, $($($arg)*)?); }
}

pub(crate) use {selci_output, selci_warn};

/// Logs a nicely formatted section title to the `selci-output` logger.
pub(crate) fn log_title(title: &str) {
    let length = title.chars().count().max(SELCI_BANNER_LENGTH - 6);
    let bar = "─".repeat(length);
    selci_output!("┌──{bar}──┐");
    selci_output!("│§ {title:^length$} §│");
    selci_output!("└──{bar}──┘");
}

/// Logs a nicely formatted subtitle to the `selci-output` logger.
pub(crate) fn log_subtitle(subtitle: &str) {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    selci_output!("{}", subtitle);
    selci_output!("{}", bar);
}

/// Turns a boolean into a string of `yes` or `no`.
pub(crate) fn nice_bool(b: bool) -> String {
    if b {
        "yes".to_string()
    } else {
        "no".to_string()
    }
}

/// A trait for logging outputs nicely.
pub(crate) trait SelciOutput: fmt::Debug + fmt::Display {
    /// Logs display output nicely.
    fn log_output_display(&self) {
        let lines = self.to_string();
        lines.lines().for_each(|line| {
            selci_output!("{line}");
        })
    }
}

// Blanket implementation
impl<T> SelciOutput for T where T: fmt::Debug + fmt::Display {}
