use crate::{
    core::{descriptor::SystemDescriptor, error::ConfigurationError},
    solver::{
        apgd::ApgdSolver, report::SolveReport, settings::SolverSettings, IterativeSolver,
    },
    utils::profiling::SolverProfiler,
};

/// Projected gradient descent without momentum.
///
/// Shares the step search, best-iterate tracking and residual with
/// [`ApgdSolver`]; every iteration steps from the current iterate.
#[derive(Debug, Clone)]
pub struct ProjectedGradientSolver {
    inner: ApgdSolver,
}

impl Default for ProjectedGradientSolver {
    fn default() -> Self {
        Self::new(SolverSettings::default())
    }
}

impl ProjectedGradientSolver {
    pub fn new(settings: SolverSettings) -> Self {
        Self {
            inner: ApgdSolver::unaccelerated(settings),
        }
    }

    pub fn rhs(&self) -> &[f64] {
        self.inner.rhs()
    }

    pub fn best_solution(&self) -> &[f64] {
        self.inner.best_solution()
    }

    pub fn dump_rhs(&self, out: &mut Vec<f64>) {
        self.inner.dump_rhs(out);
    }

    pub fn dump_lambda(&self, out: &mut Vec<f64>) {
        self.inner.dump_lambda(out);
    }

    pub fn profiler(&self) -> &SolverProfiler {
        self.inner.profiler()
    }
}

impl IterativeSolver for ProjectedGradientSolver {
    fn solve(&mut self, system: &mut dyn SystemDescriptor) -> Result<SolveReport, ConfigurationError> {
        self.inner.solve(system)
    }

    fn settings(&self) -> &SolverSettings {
        self.inner.settings()
    }

    fn settings_mut(&mut self) -> &mut SolverSettings {
        self.inner.settings_mut()
    }

    fn residual(&self) -> f64 {
        self.inner.residual()
    }
}
