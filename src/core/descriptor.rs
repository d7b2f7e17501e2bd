//! The linear system contract consumed by the solvers.

use super::{
    constraints::{ConstraintGroup, ConstraintKind},
    error::ConfigurationError,
};

/// Body-space scratch buffers used when the Schur operator is composed from
/// its factors. Owned by the solver so repeated operator applications do not
/// allocate.
#[derive(Debug, Default, Clone)]
pub struct BodyWorkspace {
    pub impulse: Vec<f64>,
    pub velocity: Vec<f64>,
}

impl BodyWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sizes both buffers to `n` body degrees of freedom.
    pub fn resize(&mut self, n: usize) {
        self.impulse.resize(n, 0.0);
        self.velocity.resize(n, 0.0);
    }
}

/// Linearized multibody system at one simulation step.
///
/// The dual problem solved over it is
/// `min ½ γᵀNγ − γᵀr` subject to `γ ∈ K`, with `N = J M⁻¹ Jᵀ`,
/// `r = −(J M⁻¹ f_free + b)` and `K` the product of the group feasible sets.
pub trait SystemDescriptor {
    /// Number of constraint components `nc`.
    fn dimension(&self) -> usize;

    /// Number of body velocity degrees of freedom.
    fn body_dimension(&self) -> usize;

    /// `(rows, cols)` of the constraint Jacobian.
    fn jacobian_shape(&self) -> (usize, usize);

    /// Ordered groups tiling `[0, nc)`.
    fn constraint_groups(&self) -> &[ConstraintGroup];

    /// Constraint bias `b` (length `nc`) and free forces `f_free` (length `n`).
    fn bias_and_free_forces(&self) -> (&[f64], &[f64]);

    /// `out = J · v`.
    fn jacobian_mul(&self, v: &[f64], out: &mut [f64]);

    /// `out = Jᵀ · gamma`.
    fn jacobian_transpose_mul(&self, gamma: &[f64], out: &mut [f64]);

    /// `out = M⁻¹ · f`.
    fn solve_mass(&self, f: &[f64], out: &mut [f64]);

    /// `out = N · x`. Descriptors holding an explicit Schur matrix override this.
    fn apply_schur_complement(&self, x: &[f64], out: &mut [f64], workspace: &mut BodyWorkspace) {
        workspace.resize(self.body_dimension());
        self.jacobian_transpose_mul(x, &mut workspace.impulse);
        self.solve_mass(&workspace.impulse, &mut workspace.velocity);
        self.jacobian_mul(&workspace.velocity, out);
    }

    /// Multipliers cached from a previous step, preferred as warm start seed.
    fn warm_start_reactions(&self) -> Option<&[f64]> {
        None
    }

    /// Commits the final reaction impulses.
    fn write_solution(&mut self, gamma: &[f64]);
}

/// Checks sizes, group tiling, friction coefficients and input finiteness.
pub fn validate_descriptor(system: &dyn SystemDescriptor) -> Result<(), ConfigurationError> {
    let nc = system.dimension();
    let n = system.body_dimension();

    let (rows, cols) = system.jacobian_shape();
    check_len("jacobian rows", nc, rows)?;
    check_len("jacobian columns", n, cols)?;

    let (bias, free_forces) = system.bias_and_free_forces();
    check_len("bias vector", nc, bias.len())?;
    check_len("free force vector", n, free_forces.len())?;
    check_finite("bias vector", bias)?;
    check_finite("free force vector", free_forces)?;

    let mut expected = 0;
    for group in system.constraint_groups() {
        if group.offset != expected {
            return Err(ConfigurationError::GroupLayout {
                offset: group.offset,
                expected,
            });
        }
        if let ConstraintKind::Friction { mu } = group.kind {
            if !mu.is_finite() || mu < 0.0 {
                return Err(ConfigurationError::InvalidFriction {
                    offset: group.offset,
                    mu,
                });
            }
        }
        expected += group.size();
    }
    if expected != nc {
        return Err(ConfigurationError::GroupLayout {
            offset: expected,
            expected: nc,
        });
    }

    if let Some(seed) = system.warm_start_reactions() {
        check_len("warm start reactions", nc, seed.len())?;
        check_finite("warm start reactions", seed)?;
    }

    Ok(())
}

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), ConfigurationError> {
    if expected == found {
        Ok(())
    } else {
        Err(ConfigurationError::DimensionMismatch {
            what,
            expected,
            found,
        })
    }
}

fn check_finite(what: &'static str, values: &[f64]) -> Result<(), ConfigurationError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ConfigurationError::NonFiniteInput { what, index }),
        None => Ok(()),
    }
}
