use crate::core::descriptor::{BodyWorkspace, SystemDescriptor};

/// Builds the fixed right-hand side of the dual problem,
/// `r = −(J · M⁻¹ · f_free + b)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchurVectorBuilder;

impl SchurVectorBuilder {
    /// Writes `r` into `out`, resized to `nc`.
    pub fn build(system: &dyn SystemDescriptor, out: &mut Vec<f64>, workspace: &mut BodyWorkspace) {
        let nc = system.dimension();
        out.clear();
        out.resize(nc, 0.0);

        let (bias, free_forces) = system.bias_and_free_forces();
        workspace.resize(system.body_dimension());
        system.solve_mass(free_forces, &mut workspace.velocity);
        system.jacobian_mul(&workspace.velocity, out);

        for (ri, bi) in out.iter_mut().zip(bias) {
            *ri = -(*ri + bi);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::constraints::ConstraintGroup, descriptor::dense::DenseSystem};

    #[test]
    fn combines_free_motion_and_bias() {
        // Two bodies on a line, one contact between them.
        let mut system = DenseSystem::new(
            vec![vec![-1.0, 1.0]],
            vec![0.5, 0.25],
            vec![ConstraintGroup::unilateral(0)],
        );
        system.set_free_forces(vec![4.0, 8.0]);
        system.set_bias(vec![0.5]);

        let mut r = Vec::new();
        SchurVectorBuilder::build(&system, &mut r, &mut BodyWorkspace::new());
        // J M⁻¹ f = -2 + 2 = 0
        assert_eq!(r, vec![-0.5]);
    }
}
