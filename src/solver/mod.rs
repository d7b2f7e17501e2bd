//! Iterative solvers for the dual cone complementarity problem and their
//! building blocks: right-hand side assembly, cone projection, residuals.

pub mod apgd;
pub mod pgd;
pub mod projection;
pub mod report;
pub mod residual;
pub mod schur;
pub mod settings;
pub mod shared;

pub use apgd::ApgdSolver;
pub use pgd::ProjectedGradientSolver;
pub use projection::{ConeProjector, FrictionProjection};
pub use report::{IterationRecord, SolveReport, SolveStatus};
pub use residual::{ResidualBreakdown, ResidualEvaluator, ResidualMetric};
pub use schur::SchurVectorBuilder;
pub use settings::{SolverKind, SolverSettings};
pub use shared::SharedSolver;

use crate::core::{descriptor::SystemDescriptor, error::ConfigurationError};

/// Common contract of the iterative CCP solvers.
pub trait IterativeSolver {
    /// Solves the problem described by `system` and commits the best
    /// multipliers through [`SystemDescriptor::write_solution`].
    fn solve(&mut self, system: &mut dyn SystemDescriptor) -> Result<SolveReport, ConfigurationError>;

    fn settings(&self) -> &SolverSettings;

    fn settings_mut(&mut self) -> &mut SolverSettings;

    /// Best residual of the last solve.
    fn residual(&self) -> f64;
}

/// Solver variant selected by [`SolverKind`].
#[derive(Debug, Clone)]
pub enum Solver {
    Apgd(ApgdSolver),
    ProjectedGradient(ProjectedGradientSolver),
}

impl Solver {
    pub fn new(kind: SolverKind, settings: SolverSettings) -> Self {
        match kind {
            SolverKind::Apgd => Solver::Apgd(ApgdSolver::new(settings)),
            SolverKind::ProjectedGradient => {
                Solver::ProjectedGradient(ProjectedGradientSolver::new(settings))
            }
        }
    }

    pub fn kind(&self) -> SolverKind {
        match self {
            Solver::Apgd(_) => SolverKind::Apgd,
            Solver::ProjectedGradient(_) => SolverKind::ProjectedGradient,
        }
    }

    pub fn best_solution(&self) -> &[f64] {
        match self {
            Solver::Apgd(solver) => solver.best_solution(),
            Solver::ProjectedGradient(solver) => solver.best_solution(),
        }
    }

    pub fn rhs(&self) -> &[f64] {
        match self {
            Solver::Apgd(solver) => solver.rhs(),
            Solver::ProjectedGradient(solver) => solver.rhs(),
        }
    }

    fn as_dyn_mut(&mut self) -> &mut dyn IterativeSolver {
        match self {
            Solver::Apgd(solver) => solver,
            Solver::ProjectedGradient(solver) => solver,
        }
    }

    fn as_dyn(&self) -> &dyn IterativeSolver {
        match self {
            Solver::Apgd(solver) => solver,
            Solver::ProjectedGradient(solver) => solver,
        }
    }
}

impl Default for Solver {
    fn default() -> Self {
        Solver::new(SolverKind::default(), SolverSettings::default())
    }
}

impl IterativeSolver for Solver {
    fn solve(&mut self, system: &mut dyn SystemDescriptor) -> Result<SolveReport, ConfigurationError> {
        self.as_dyn_mut().solve(system)
    }

    fn settings(&self) -> &SolverSettings {
        self.as_dyn().settings()
    }

    fn settings_mut(&mut self) -> &mut SolverSettings {
        self.as_dyn_mut().settings_mut()
    }

    fn residual(&self) -> f64 {
        self.as_dyn().residual()
    }
}
