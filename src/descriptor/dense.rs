use crate::core::{
    constraints::ConstraintGroup,
    descriptor::{BodyWorkspace, SystemDescriptor},
};

/// A system given by explicit dense matrices: Jacobian rows, a diagonal
/// inverse mass, bias and free forces.
#[derive(Debug, Clone)]
pub struct DenseSystem {
    jacobian: Vec<Vec<f64>>,
    inverse_mass: Vec<f64>,
    bias: Vec<f64>,
    free_forces: Vec<f64>,
    groups: Vec<ConstraintGroup>,
    nc: usize,
    reactions: Vec<f64>,
    warm_start: Option<Vec<f64>>,
    schur: Option<Vec<f64>>,
    parallel: bool,
}

impl DenseSystem {
    /// Builds a system with zero bias and zero free forces.
    pub fn new(
        jacobian: Vec<Vec<f64>>,
        inverse_mass: Vec<f64>,
        groups: Vec<ConstraintGroup>,
    ) -> Self {
        let nc = groups
            .last()
            .map(|group| group.offset + group.size())
            .unwrap_or(0);
        Self {
            bias: vec![0.0; jacobian.len()],
            free_forces: vec![0.0; inverse_mass.len()],
            reactions: vec![0.0; nc],
            jacobian,
            inverse_mass,
            groups,
            nc,
            warm_start: None,
            schur: None,
            parallel: false,
        }
    }

    /// Precomputes `N = J M⁻¹ Jᵀ` so operator applications become a single
    /// dense mat-vec.
    pub fn with_cached_schur(mut self) -> Self {
        let rows = self.jacobian.len();
        let mut schur = vec![0.0; rows * rows];
        for i in 0..rows {
            for j in i..rows {
                let value: f64 = self.jacobian[i]
                    .iter()
                    .zip(&self.jacobian[j])
                    .zip(&self.inverse_mass)
                    .map(|((a, b), m)| a * m * b)
                    .sum();
                schur[i * rows + j] = value;
                schur[j * rows + i] = value;
            }
        }
        self.schur = Some(schur);
        self
    }

    pub fn set_bias(&mut self, bias: Vec<f64>) {
        self.bias = bias;
    }

    pub fn set_free_forces(&mut self, free_forces: Vec<f64>) {
        self.free_forces = free_forces;
    }

    /// Multipliers offered as warm start seed.
    pub fn set_warm_start(&mut self, seed: Option<Vec<f64>>) {
        self.warm_start = seed;
    }

    /// Lets row-wise products run on the rayon pool.
    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    /// Reactions written by the last solve.
    pub fn reactions(&self) -> &[f64] {
        &self.reactions
    }

    fn row_products(&self, matrix_rows: usize, out: &mut [f64], row: impl Fn(usize) -> f64 + Sync) {
        #[cfg(feature = "parallel")]
        if self.parallel {
            use rayon::prelude::*;
            out[..matrix_rows]
                .par_iter_mut()
                .enumerate()
                .for_each(|(i, o)| *o = row(i));
            return;
        }
        for (i, o) in out[..matrix_rows].iter_mut().enumerate() {
            *o = row(i);
        }
    }
}

impl SystemDescriptor for DenseSystem {
    fn dimension(&self) -> usize {
        self.nc
    }

    fn body_dimension(&self) -> usize {
        self.inverse_mass.len()
    }

    fn jacobian_shape(&self) -> (usize, usize) {
        let n = self.inverse_mass.len();
        let cols = self
            .jacobian
            .iter()
            .map(Vec::len)
            .find(|&len| len != n)
            .unwrap_or(n);
        (self.jacobian.len(), cols)
    }

    fn constraint_groups(&self) -> &[ConstraintGroup] {
        &self.groups
    }

    fn bias_and_free_forces(&self) -> (&[f64], &[f64]) {
        (&self.bias, &self.free_forces)
    }

    fn jacobian_mul(&self, v: &[f64], out: &mut [f64]) {
        self.row_products(self.jacobian.len(), out, |i| {
            self.jacobian[i].iter().zip(v).map(|(a, b)| a * b).sum()
        });
    }

    fn jacobian_transpose_mul(&self, gamma: &[f64], out: &mut [f64]) {
        out.fill(0.0);
        for (row, g) in self.jacobian.iter().zip(gamma) {
            if *g == 0.0 {
                continue;
            }
            for (o, a) in out.iter_mut().zip(row) {
                *o += a * g;
            }
        }
    }

    fn solve_mass(&self, f: &[f64], out: &mut [f64]) {
        for ((o, fi), m) in out.iter_mut().zip(f).zip(&self.inverse_mass) {
            *o = fi * m;
        }
    }

    fn apply_schur_complement(&self, x: &[f64], out: &mut [f64], workspace: &mut BodyWorkspace) {
        match &self.schur {
            Some(schur) => {
                let rows = self.jacobian.len();
                self.row_products(rows, out, |i| {
                    schur[i * rows..(i + 1) * rows]
                        .iter()
                        .zip(x)
                        .map(|(a, b)| a * b)
                        .sum()
                });
            }
            None => {
                workspace.resize(self.body_dimension());
                self.jacobian_transpose_mul(x, &mut workspace.impulse);
                self.solve_mass(&workspace.impulse, &mut workspace.velocity);
                self.jacobian_mul(&workspace.velocity, out);
            }
        }
    }

    fn warm_start_reactions(&self) -> Option<&[f64]> {
        self.warm_start.as_deref()
    }

    fn write_solution(&mut self, gamma: &[f64]) {
        self.reactions.clear();
        self.reactions.extend_from_slice(gamma);
    }
}
