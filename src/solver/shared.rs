use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    core::{descriptor::SystemDescriptor, error::ConfigurationError},
    solver::{report::SolveReport, IterativeSolver, Solver},
};

/// A solver instance shared between threads.
///
/// Solver buffers are not reentrant, so every solve holds the lock for its
/// whole duration. Cloning shares the same instance.
#[derive(Debug, Clone, Default)]
pub struct SharedSolver {
    inner: Arc<Mutex<Solver>>,
}

impl SharedSolver {
    pub fn new(solver: Solver) -> Self {
        Self {
            inner: Arc::new(Mutex::new(solver)),
        }
    }

    pub fn solve(&self, system: &mut dyn SystemDescriptor) -> Result<SolveReport, ConfigurationError> {
        self.inner.lock().solve(system)
    }

    pub fn residual(&self) -> f64 {
        self.inner.lock().residual()
    }

    /// Runs `f` with exclusive access to the wrapped solver.
    pub fn with_solver<R>(&self, f: impl FnOnce(&mut Solver) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
