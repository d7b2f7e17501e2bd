//! Global configuration constants for the CCP solver.

/// Hard cap on solver iterations per solve.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Whether a solve is seeded from the previous solution by default.
pub const DEFAULT_WARM_START: bool = false;

/// Residual threshold below which a solve is considered converged.
///
/// Zero means the solver runs its full iteration budget unless it hits an
/// exact solution.
pub const DEFAULT_TOLERANCE: f64 = 0.0;

/// Maximum number of step halvings tried inside one iteration.
pub const DEFAULT_MAX_BACKTRACKS: usize = 50;

/// Factor applied to the Lipschitz estimate on every failed sufficient-decrease test.
pub const DEFAULT_BACKTRACK_FACTOR: f64 = 2.0;

/// Factor applied to the Lipschitz estimate after an accepted iteration.
pub const DEFAULT_STEP_RELAXATION: f64 = 0.9;

/// Finite step used when measuring the projected gradient residual.
pub const DEFAULT_GRADIENT_PROBE: f64 = 1e-6;

/// Minimum constraint count before data-parallel kernels are used.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// Lipschitz estimate used when the power step degenerates.
pub const FALLBACK_LIPSCHITZ: f64 = 1.0;
