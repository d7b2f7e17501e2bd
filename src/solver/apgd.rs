//! Accelerated projected gradient descent over the dual CCP.
//!
//! Minimizes `f(γ) = ½ γᵀNγ − γᵀr` over the product of friction cones,
//! unilateral half-lines and free bilateral rows. Each iteration takes a
//! projected gradient step from the momentum point `y`, backtracks on the
//! Lipschitz estimate `L` until the quadratic upper bound holds, updates the
//! Nesterov momentum and restarts it whenever the step stops being a descent
//! direction. The lowest-residual iterate is kept aside as `gamma_hat` and is
//! what gets committed.

use std::time::Instant;

use log::{trace, warn};

use crate::{
    config::FALLBACK_LIPSCHITZ,
    core::{
        descriptor::{validate_descriptor, BodyWorkspace, SystemDescriptor},
        error::ConfigurationError,
    },
    solver::{
        projection::ConeProjector,
        report::{IterationRecord, SolveReport, SolveStatus},
        residual::ResidualEvaluator,
        schur::SchurVectorBuilder,
        settings::SolverSettings,
        IterativeSolver,
    },
    utils::{
        logging::{self, log_solve_outcome},
        profiling::{ScopedTimer, SolverProfiler},
        vector::{self, JobMode},
    },
};

/// Vectors of length `nc`, kept between solves so equal-size problems reuse
/// their allocations.
#[derive(Debug, Default, Clone)]
struct SolverState {
    nc: usize,
    gamma: Vec<f64>,
    gamma_new: Vec<f64>,
    y: Vec<f64>,
    y_new: Vec<f64>,
    g: Vec<f64>,
    r: Vec<f64>,
    tmp: Vec<f64>,
    gamma_hat: Vec<f64>,
    workspace: BodyWorkspace,
}

impl SolverState {
    /// Sizes every buffer to `nc` and loads the starting iterate into `gamma`.
    fn prepare(&mut self, system: &dyn SystemDescriptor, warm_start: bool) {
        let nc = system.dimension();
        let retained = self.nc == nc && self.gamma_hat.len() == nc;

        match system.warm_start_reactions() {
            Some(seed) if warm_start => {
                self.gamma.clear();
                self.gamma.extend_from_slice(seed);
            }
            _ if warm_start && retained => self.gamma.clone_from(&self.gamma_hat),
            _ => vector::reset(&mut self.gamma, nc),
        }

        for v in [
            &mut self.gamma_new,
            &mut self.y,
            &mut self.y_new,
            &mut self.g,
            &mut self.tmp,
        ] {
            vector::reset(v, nc);
        }
        self.gamma_hat.resize(nc, 0.0);
        self.nc = nc;
    }
}

/// Operator and projection calls, timed into the profiler.
struct Kernels<'a> {
    system: &'a dyn SystemDescriptor,
    projector: ConeProjector,
    mode: JobMode,
    profiler: &'a mut SolverProfiler,
}

impl Kernels<'_> {
    /// `out = N · x`.
    fn apply(&mut self, x: &[f64], out: &mut [f64], workspace: &mut BodyWorkspace) {
        self.profiler.operator_applications += 1;
        let _timer = ScopedTimer::new(&mut self.profiler.operator_time);
        self.system.apply_schur_complement(x, out, workspace);
    }

    /// `out = Π(x − t · d)`.
    fn step(&mut self, out: &mut [f64], x: &[f64], t: f64, d: &[f64]) {
        vector::axpy_into(out, x, -t, d, self.mode);
        self.project(out);
    }

    fn project(&mut self, x: &mut [f64]) {
        self.profiler.projections += 1;
        let _timer = ScopedTimer::new(&mut self.profiler.projection_time);
        self.projector
            .project(self.system.constraint_groups(), x, self.mode);
    }

    fn residual(&mut self, evaluator: &mut ResidualEvaluator, gamma: &[f64], gradient: &[f64]) -> f64 {
        let _timer = ScopedTimer::new(&mut self.profiler.residual_time);
        evaluator.evaluate_with_gradient(self.system.constraint_groups(), gamma, gradient)
    }
}

/// Dual objective `½ xᵀ(Nx) − xᵀr` from a precomputed `Nx`.
fn objective(x: &[f64], nx: &[f64], r: &[f64]) -> f64 {
    0.5 * vector::dot(x, nx) - vector::dot(x, r)
}

/// Accelerated projected gradient solver.
#[derive(Debug, Clone)]
pub struct ApgdSolver {
    settings: SolverSettings,
    accelerated: bool,
    state: SolverState,
    residual: f64,
    evaluator: ResidualEvaluator,
    profiler: SolverProfiler,
}

impl Default for ApgdSolver {
    fn default() -> Self {
        Self::new(SolverSettings::default())
    }
}

impl ApgdSolver {
    pub fn new(settings: SolverSettings) -> Self {
        Self {
            settings,
            accelerated: true,
            state: SolverState::default(),
            residual: 0.0,
            evaluator: ResidualEvaluator::new(
                settings.residual_metric,
                settings.gradient_probe,
                ConeProjector::new(settings.friction_projection),
            ),
            profiler: SolverProfiler::default(),
        }
    }

    /// Same machinery with the momentum disabled.
    pub(crate) fn unaccelerated(settings: SolverSettings) -> Self {
        Self {
            accelerated: false,
            ..Self::new(settings)
        }
    }

    fn name(&self) -> &'static str {
        if self.accelerated {
            "apgd"
        } else {
            "pgd"
        }
    }

    /// Right-hand side `r` of the last solve.
    pub fn rhs(&self) -> &[f64] {
        &self.state.r
    }

    /// Best multipliers of the last solve.
    pub fn best_solution(&self) -> &[f64] {
        &self.state.gamma_hat
    }

    /// Appends the right-hand side of the last solve to `out`.
    pub fn dump_rhs(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(&self.state.r);
    }

    /// Appends the best multipliers of the last solve to `out`.
    pub fn dump_lambda(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(&self.state.gamma_hat);
    }

    pub fn profiler(&self) -> &SolverProfiler {
        &self.profiler
    }

    /// Runs one solve and commits the best iterate to `system`.
    pub fn solve(&mut self, system: &mut dyn SystemDescriptor) -> Result<SolveReport, ConfigurationError> {
        let _trace = logging::ScopedTimer::new(self.name());

        if system.dimension() == 0 {
            self.residual = 0.0;
            return Ok(SolveReport::trivial());
        }
        validate_descriptor(system)?;

        let started = Instant::now();
        self.profiler.reset();
        self.profiler.constraint_count = system.dimension();

        let report = self.iterate(system);
        system.write_solution(&self.state.gamma_hat);

        self.profiler.total_time = started.elapsed();
        log_solve_outcome(self.name(), &report, self.settings.tolerance);
        Ok(report)
    }

    fn iterate(&mut self, system: &dyn SystemDescriptor) -> SolveReport {
        let settings = self.settings;
        let name = self.name();
        let nc = system.dimension();
        let projector = ConeProjector::new(settings.friction_projection);
        self.evaluator
            .reconfigure(settings.residual_metric, settings.gradient_probe, projector);

        self.state.prepare(system, settings.warm_start);
        let SolverState {
            gamma,
            gamma_new,
            y,
            y_new,
            g,
            r,
            tmp,
            gamma_hat,
            workspace,
            ..
        } = &mut self.state;

        {
            let _timer = ScopedTimer::new(&mut self.profiler.schur_vector_time);
            SchurVectorBuilder::build(system, r, workspace);
        }

        let mut kernels = Kernels {
            system,
            projector,
            mode: JobMode::select(settings.parallel, nc, settings.parallel_threshold),
            profiler: &mut self.profiler,
        };
        let evaluator = &mut self.evaluator;

        let mut report = SolveReport::trivial();
        report.status = SolveStatus::IterationLimit;

        // The starting point counts as the first candidate for gamma_hat.
        kernels.project(gamma);
        kernels.apply(gamma, tmp, workspace);
        vector::sub_into(g, tmp, r);
        let mut best = kernels.residual(evaluator, gamma, g);
        gamma_hat.copy_from_slice(gamma);

        if best <= settings.tolerance {
            report.status = SolveStatus::Converged;
        } else {
            // One power step along the all-ones direction.
            y_new.fill(1.0);
            kernels.apply(y_new, y, workspace);
            let mut lipschitz = vector::norm(y) / (nc as f64).sqrt();
            if !(lipschitz.is_finite() && lipschitz > 0.0) {
                lipschitz = FALLBACK_LIPSCHITZ;
            }
            let mut t = 1.0 / lipschitz;
            let mut theta = 1.0_f64;
            y.copy_from_slice(gamma);

            for iteration in 0..settings.max_iterations {
                // g = N·y − r, so f(y) = ½ yᵀ(g + r) − yᵀr.
                kernels.apply(y, g, workspace);
                for (gi, ri) in g.iter_mut().zip(r.iter()) {
                    *gi -= ri;
                }
                let objective_y = 0.5 * (vector::dot(y, g) - vector::dot(y, r));
                let g_dot_y = vector::dot(g, y);

                kernels.step(gamma_new, y, t, g);
                kernels.apply(gamma_new, tmp, workspace);

                let mut backtracks = 0;
                loop {
                    let objective_new = objective(gamma_new, tmp, r);
                    let bound = objective_y
                        + (vector::dot(g, gamma_new) - g_dot_y)
                        + 0.5 * lipschitz * vector::distance_squared(gamma_new, y);
                    let slack = f64::EPSILON * (objective_new.abs() + bound.abs());
                    if objective_new <= bound + slack {
                        break;
                    }
                    if backtracks == settings.max_backtracks {
                        warn!(
                            "{name}: no sufficient decrease after {backtracks} backtracks at iteration {iteration}, keeping t = {t:.3e}"
                        );
                        break;
                    }
                    lipschitz *= settings.backtrack_factor;
                    t = 1.0 / lipschitz;
                    backtracks += 1;
                    kernels.step(gamma_new, y, t, g);
                    kernels.apply(gamma_new, tmp, workspace);
                }
                kernels.profiler.backtracks += backtracks;

                let (theta_new, beta) = if self.accelerated {
                    let theta_sq = theta * theta;
                    let theta_new = 0.5 * (-theta_sq + theta * (theta_sq + 4.0).sqrt());
                    (theta_new, theta * (1.0 - theta) / (theta_sq + theta_new))
                } else {
                    (1.0, 0.0)
                };
                vector::extrapolate_into(y_new, gamma_new, gamma, beta, kernels.mode);

                // tmp becomes the gradient at gamma_new.
                for (ti, ri) in tmp.iter_mut().zip(r.iter()) {
                    *ti -= ri;
                }
                let residual = kernels.residual(evaluator, gamma_new, tmp);
                if !residual.is_finite() {
                    warn!("{name}: non-finite residual at iteration {iteration}");
                }
                if residual < best {
                    best = residual;
                    gamma_hat.copy_from_slice(gamma_new);
                }

                let converged = best <= settings.tolerance;
                let restarted = !converged
                    && self.accelerated
                    && vector::dot(g, gamma_new) - vector::dot(g, gamma) >= 0.0;
                if restarted {
                    y_new.copy_from_slice(gamma_new);
                    kernels.profiler.restarts += 1;
                }

                trace!(
                    "iteration {iteration}: residual {residual:.3e}, best {best:.3e}, t {t:.3e}, backtracks {backtracks}{}",
                    if restarted { ", restart" } else { "" }
                );
                report.record_iteration(
                    IterationRecord {
                        iteration,
                        residual,
                        best_residual: best,
                        step_size: t,
                        backtracks,
                        restarted,
                    },
                    settings.record_history,
                );

                if converged {
                    report.status = SolveStatus::Converged;
                    break;
                }

                lipschitz *= settings.step_relaxation;
                t = 1.0 / lipschitz;
                theta = if restarted { 1.0 } else { theta_new };
                std::mem::swap(gamma, gamma_new);
                std::mem::swap(y, y_new);
            }
        }

        report.residual = best;
        report.projections = kernels.profiler.projections;
        self.residual = best;
        report
    }
}

impl IterativeSolver for ApgdSolver {
    fn solve(&mut self, system: &mut dyn SystemDescriptor) -> Result<SolveReport, ConfigurationError> {
        ApgdSolver::solve(self, system)
    }

    fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut SolverSettings {
        &mut self.settings
    }

    fn residual(&self) -> f64 {
        self.residual
    }
}
