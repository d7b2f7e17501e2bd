//! CCP Solver – accelerated projected gradient for contact dynamics.
//!
//! This crate solves the dual cone complementarity problem that arises from
//! frictional contacts and bilateral joints in multibody simulation. A
//! [`SystemDescriptor`] exposes the constraint Jacobian, mass solve and
//! constraint groups; an [`IterativeSolver`] such as [`ApgdSolver`] finds the
//! reaction impulses and commits them back through the descriptor.

pub mod config;
pub mod core;
pub mod descriptor;
pub mod solver;
pub mod utils;

pub use glam::{DMat3, DVec2, DVec3};

pub use core::{
    constraints::{ConstraintGroup, ConstraintKind, ConstraintLayout},
    descriptor::{validate_descriptor, BodyWorkspace, SystemDescriptor},
    error::ConfigurationError,
};
pub use descriptor::{
    dense::DenseSystem,
    rigid::{BallJoint, BodyHandle, ContactPoint, RigidContactSystem, SolverBody, StabilizationParams},
};
pub use solver::{
    ApgdSolver, ConeProjector, FrictionProjection, IterationRecord, IterativeSolver,
    ProjectedGradientSolver, ResidualBreakdown, ResidualEvaluator, ResidualMetric,
    SchurVectorBuilder, SharedSolver, SolveReport, SolveStatus, Solver, SolverKind,
    SolverSettings,
};
pub use utils::{JobMode, SolverProfiler};

/// High-level convenience wrapper that owns a [`RigidContactSystem`] and the
/// solver used to resolve its constraints every step.
pub struct ContactEngine {
    system: RigidContactSystem,
    solver: Solver,
}

impl ContactEngine {
    /// Creates an engine with the provided fixed timestep and default APGD settings.
    pub fn new(timestep: f64) -> Self {
        Self::with_solver(timestep, Solver::default())
    }

    pub fn with_solver(timestep: f64, solver: Solver) -> Self {
        Self {
            system: RigidContactSystem::new(timestep),
            solver,
        }
    }

    /// Adds a rigid body and returns its handle.
    pub fn add_body(&mut self, body: SolverBody) -> BodyHandle {
        self.system.add_body(body)
    }

    /// Registers a contact for the current step and returns its offset.
    pub fn add_contact(&mut self, contact: ContactPoint) -> usize {
        self.system.add_contact(contact)
    }

    /// Registers a ball joint for the current step and returns its offset.
    pub fn add_ball_joint(&mut self, joint: BallJoint) -> usize {
        self.system.add_ball_joint(joint)
    }

    /// Solves the constraints registered since the last step, then moves the
    /// bodies and clears the constraint set.
    pub fn step(&mut self) -> Result<SolveReport, ConfigurationError> {
        let report = self.solver.solve(&mut self.system)?;
        self.system.advance_positions();
        Ok(report)
    }

    /// Enables or disables data-parallel solver kernels.
    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.solver.settings_mut().parallel = enabled;
    }

    pub fn parallel_enabled(&self) -> bool {
        self.solver.settings().parallel
    }

    pub fn system(&self) -> &RigidContactSystem {
        &self.system
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut Solver {
        &mut self.solver
    }

    /// Immutable access to a body by handle.
    pub fn get_body(&self, handle: BodyHandle) -> Option<&SolverBody> {
        self.system.body(handle)
    }
}
