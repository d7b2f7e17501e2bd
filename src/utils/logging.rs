use log::{debug, log_enabled, warn, Level};
use std::time::Instant;

use crate::solver::report::{SolveReport, SolveStatus};

/// Traces the start and end of a labelled section.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("⏱️ start {label}");
        }
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        if log_enabled!(Level::Trace) {
            let elapsed = self.start.elapsed();
            log::trace!("⏱️ end {} ({} µs)", self.label, elapsed.as_micros());
        }
    }
}

/// Emits the one-line summary of a finished solve.
///
/// Running out of iterations is only worth a warning when a tolerance was
/// actually requested.
pub fn log_solve_outcome(solver: &str, report: &SolveReport, tolerance: f64) {
    match report.status {
        SolveStatus::Trivial => {}
        SolveStatus::Converged => debug!(
            "{solver}: converged in {} iterations, residual {:.3e}",
            report.iterations, report.residual
        ),
        SolveStatus::IterationLimit if tolerance > 0.0 => warn!(
            "{solver}: iteration limit {} reached, residual {:.3e} > {:.3e}",
            report.iterations, report.residual, tolerance
        ),
        SolveStatus::IterationLimit => debug!(
            "{solver}: finished {} iterations, residual {:.3e}",
            report.iterations, report.residual
        ),
    }
}
