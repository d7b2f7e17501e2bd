use serde::{Deserialize, Serialize};

use crate::{
    config::{
        DEFAULT_BACKTRACK_FACTOR, DEFAULT_GRADIENT_PROBE, DEFAULT_MAX_BACKTRACKS,
        DEFAULT_MAX_ITERATIONS, DEFAULT_PARALLEL_THRESHOLD, DEFAULT_STEP_RELAXATION,
        DEFAULT_TOLERANCE, DEFAULT_WARM_START,
    },
    solver::{projection::FrictionProjection, residual::ResidualMetric},
};

/// Iterative solver variant, chosen by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolverKind {
    /// Nesterov-accelerated projected gradient with adaptive restart.
    #[default]
    Apgd,
    /// Plain projected gradient with the same step search.
    ProjectedGradient,
}

/// Knobs shared by every iterative solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub max_iterations: usize,
    pub warm_start: bool,
    pub tolerance: f64,
    /// Step halvings allowed per iteration before the step is frozen.
    pub max_backtracks: usize,
    pub backtrack_factor: f64,
    /// Applied to the Lipschitz estimate after every accepted iteration.
    pub step_relaxation: f64,
    pub gradient_probe: f64,
    pub residual_metric: ResidualMetric,
    pub friction_projection: FrictionProjection,
    pub parallel: bool,
    pub parallel_threshold: usize,
    /// Keep a per-iteration record in the solve report.
    pub record_history: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            warm_start: DEFAULT_WARM_START,
            tolerance: DEFAULT_TOLERANCE,
            max_backtracks: DEFAULT_MAX_BACKTRACKS,
            backtrack_factor: DEFAULT_BACKTRACK_FACTOR,
            step_relaxation: DEFAULT_STEP_RELAXATION,
            gradient_probe: DEFAULT_GRADIENT_PROBE,
            residual_metric: ResidualMetric::default(),
            friction_projection: FrictionProjection::default(),
            parallel: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            record_history: false,
        }
    }
}

impl SolverSettings {
    pub fn new(max_iterations: usize, warm_start: bool, tolerance: f64) -> Self {
        Self {
            max_iterations,
            warm_start,
            tolerance,
            ..Self::default()
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_warm_start(mut self, warm_start: bool) -> Self {
        self.warm_start = warm_start;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_history(mut self, record_history: bool) -> Self {
        self.record_history = record_history;
        self
    }

    pub fn with_residual_metric(mut self, metric: ResidualMetric) -> Self {
        self.residual_metric = metric;
        self
    }

    pub fn with_friction_projection(mut self, projection: FrictionProjection) -> Self {
        self.friction_projection = projection;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
