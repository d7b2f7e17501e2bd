use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        constraints::{ConstraintGroup, ConstraintKind},
        descriptor::{BodyWorkspace, SystemDescriptor},
    },
    solver::projection::ConeProjector,
    utils::vector,
};

/// Smallest probe step for a friction group relative to `‖γ‖ / ‖g‖`, so the
/// step stays well above the rounding of `γ`.
const RELATIVE_PROBE: f64 = 1e-8;

/// Scalar convergence measure reported by the solvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResidualMetric {
    /// Norm of the projected gradient step.
    #[default]
    ProjectedGradient,
    /// Largest of the projected gradient norm, the constraint velocity
    /// violation and the complementarity gap.
    Composite,
}

/// Individual convergence indicators at one iterate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResidualBreakdown {
    pub projected_gradient: f64,
    pub velocity_violation: f64,
    pub complementarity_gap: f64,
}

impl ResidualBreakdown {
    pub fn combined(&self, metric: ResidualMetric) -> f64 {
        match metric {
            ResidualMetric::ProjectedGradient => self.projected_gradient,
            ResidualMetric::Composite => self
                .projected_gradient
                .max(self.velocity_violation)
                .max(self.complementarity_gap),
        }
    }
}

/// Computes the residual of a candidate multiplier vector.
///
/// The gradient of the dual objective, `Nγ − r`, doubles as the constraint
/// velocity, so callers that already hold `Nγ` pass the gradient directly.
#[derive(Debug, Clone)]
pub struct ResidualEvaluator {
    metric: ResidualMetric,
    probe: f64,
    projector: ConeProjector,
    gradient: Vec<f64>,
    workspace: BodyWorkspace,
}

impl ResidualEvaluator {
    pub fn new(metric: ResidualMetric, probe: f64, projector: ConeProjector) -> Self {
        Self {
            metric,
            probe,
            projector,
            gradient: Vec::new(),
            workspace: BodyWorkspace::new(),
        }
    }

    /// Swaps the measure while keeping the scratch buffers.
    pub fn reconfigure(&mut self, metric: ResidualMetric, probe: f64, projector: ConeProjector) {
        self.metric = metric;
        self.probe = probe;
        self.projector = projector;
    }

    pub fn metric(&self) -> ResidualMetric {
        self.metric
    }

    /// Evaluates `gamma` against `system`, applying the Schur operator once.
    pub fn evaluate(&mut self, system: &dyn SystemDescriptor, rhs: &[f64], gamma: &[f64]) -> f64 {
        self.breakdown(system, rhs, gamma).combined(self.metric)
    }

    /// Same as [`evaluate`](Self::evaluate) but returns every indicator.
    pub fn breakdown(
        &mut self,
        system: &dyn SystemDescriptor,
        rhs: &[f64],
        gamma: &[f64],
    ) -> ResidualBreakdown {
        let mut gradient = std::mem::take(&mut self.gradient);
        vector::reset(&mut gradient, gamma.len());
        system.apply_schur_complement(gamma, &mut gradient, &mut self.workspace);
        for (gi, ri) in gradient.iter_mut().zip(rhs) {
            *gi -= ri;
        }
        let breakdown =
            self.breakdown_with_gradient(system.constraint_groups(), gamma, &gradient);
        self.gradient = gradient;
        breakdown
    }

    /// Residual from a precomputed gradient `Nγ − r`.
    pub fn evaluate_with_gradient(
        &mut self,
        groups: &[ConstraintGroup],
        gamma: &[f64],
        gradient: &[f64],
    ) -> f64 {
        match self.metric {
            ResidualMetric::ProjectedGradient => {
                self.projected_gradient_norm(groups, gamma, gradient)
            }
            ResidualMetric::Composite => self
                .breakdown_with_gradient(groups, gamma, gradient)
                .combined(self.metric),
        }
    }

    pub fn breakdown_with_gradient(
        &mut self,
        groups: &[ConstraintGroup],
        gamma: &[f64],
        gradient: &[f64],
    ) -> ResidualBreakdown {
        ResidualBreakdown {
            projected_gradient: self.projected_gradient_norm(groups, gamma, gradient),
            velocity_violation: velocity_violation(groups, gradient),
            complementarity_gap: vector::dot(gamma, gradient).abs(),
        }
    }

    /// `‖(γ − Π(γ − δ·g)) / δ‖`, evaluated group by group.
    ///
    /// Bilateral and unilateral rows use the closed forms `g` and
    /// `min(g, γ/δ)`, which never subtract `γ` from itself. Friction groups
    /// take a finite step, widened when `δ·‖g‖` would vanish in the rounding
    /// of `γ`.
    fn projected_gradient_norm(&self, groups: &[ConstraintGroup], gamma: &[f64], gradient: &[f64]) -> f64 {
        let delta = self.probe;
        groups
            .iter()
            .map(|group| {
                let x = &gamma[group.range()];
                let g = &gradient[group.range()];
                match group.kind {
                    ConstraintKind::Bilateral => g[0] * g[0],
                    ConstraintKind::Unilateral => {
                        let d = g[0].min(x[0] / delta);
                        d * d
                    }
                    ConstraintKind::Friction { mu } => self.friction_step_squared(mu, x, g),
                }
            })
            .sum::<f64>()
            .sqrt()
    }

    fn friction_step_squared(&self, mu: f64, x: &[f64], g: &[f64]) -> f64 {
        let g_norm = vector::norm(g);
        if g_norm == 0.0 {
            return 0.0;
        }
        let delta = self.probe.max(RELATIVE_PROBE * vector::norm(x) / g_norm);
        let (n, t) = self.projector.project_friction(
            mu,
            x[0] - delta * g[0],
            DVec2::new(x[1] - delta * g[1], x[2] - delta * g[2]),
        );
        let dn = (x[0] - n) / delta;
        let dt = (DVec2::new(x[1], x[2]) - t) / delta;
        dn * dn + dt.length_squared()
    }
}

/// Largest distance of a group's constraint velocity from its admissible set.
fn velocity_violation(groups: &[ConstraintGroup], velocity: &[f64]) -> f64 {
    groups
        .iter()
        .map(|group| {
            let v = &velocity[group.range()];
            match group.kind {
                ConstraintKind::Bilateral => v[0].abs(),
                ConstraintKind::Unilateral => (-v[0]).max(0.0),
                ConstraintKind::Friction { mu } => {
                    dual_cone_distance(mu, v[0], DVec2::new(v[1], v[2]))
                }
            }
        })
        .fold(0.0, f64::max)
}

/// Distance of `(n, t)` from the dual friction cone `μ‖t‖ ≤ n`.
fn dual_cone_distance(mu: f64, n: f64, t: DVec2) -> f64 {
    if mu == 0.0 {
        return (-n).max(0.0);
    }
    let slope = 1.0 / mu;
    let t_norm = t.length();
    if t_norm <= slope * n {
        0.0
    } else if slope * t_norm <= -n {
        (n * n + t_norm * t_norm).sqrt()
    } else {
        (t_norm - slope * n) / (1.0 + slope * slope).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::projection::FrictionProjection;
    use approx::assert_relative_eq;

    fn evaluator(metric: ResidualMetric) -> ResidualEvaluator {
        ResidualEvaluator::new(metric, 1e-6, ConeProjector::default())
    }

    #[test]
    fn zero_at_complementary_point() {
        let groups = [ConstraintGroup::unilateral(0), ConstraintGroup::unilateral(1)];
        // Active contact with zero velocity, inactive contact separating.
        let gamma = [2.0, 0.0];
        let gradient = [0.0, 3.0];
        let mut eval = evaluator(ResidualMetric::Composite);
        let breakdown = eval.breakdown_with_gradient(&groups, &gamma, &gradient);
        assert_relative_eq!(breakdown.projected_gradient, 0.0);
        assert_relative_eq!(breakdown.velocity_violation, 0.0);
        assert_relative_eq!(breakdown.complementarity_gap, 0.0);
    }

    #[test]
    fn penetrating_velocity_is_reported() {
        let groups = [ConstraintGroup::unilateral(0)];
        let mut eval = evaluator(ResidualMetric::Composite);
        let breakdown = eval.breakdown_with_gradient(&groups, &[0.0], &[-0.5]);
        assert_relative_eq!(breakdown.projected_gradient, 0.5, epsilon = 1e-9);
        assert_relative_eq!(breakdown.velocity_violation, 0.5);
        assert_relative_eq!(breakdown.complementarity_gap, 0.0);
    }

    #[test]
    fn small_gradients_survive_large_impulses() {
        let eval = evaluator(ResidualMetric::ProjectedGradient);
        let bilateral = [ConstraintGroup::bilateral(0)];
        assert_relative_eq!(eval.projected_gradient_norm(&bilateral, &[1e4], &[1e-7]), 1e-7);

        let unilateral = [ConstraintGroup::unilateral(0)];
        assert_relative_eq!(eval.projected_gradient_norm(&unilateral, &[1e4], &[1e-7]), 1e-7);

        let friction = [ConstraintGroup::friction(0, 0.5)];
        let inside = eval.projected_gradient_norm(&friction, &[1e4, 10.0, 0.0], &[1e-7, 0.0, 0.0]);
        assert_relative_eq!(inside, 1e-7, max_relative = 1e-6);
    }

    #[test]
    fn friction_boundary_separates_stationary_from_sliding() {
        let eval = ResidualEvaluator::new(
            ResidualMetric::ProjectedGradient,
            1e-6,
            ConeProjector::new(FrictionProjection::Euclidean),
        );
        let groups = [ConstraintGroup::friction(0, 0.5)];
        let gamma = [1e4, 5e3, 0.0];

        // Gradient along the inward cone normal: nothing left to gain.
        let stationary = eval.projected_gradient_norm(&groups, &gamma, &[0.5e-3, -1e-3, 0.0]);
        assert!(stationary < 1e-9, "{stationary}");

        // Tiny push around the cone surface must still show up.
        let sliding = eval.projected_gradient_norm(&groups, &gamma, &[0.0, 0.0, 1e-7]);
        assert_relative_eq!(sliding, 1e-7, max_relative = 1e-3);
    }

    #[test]
    fn sliding_contact_satisfies_dual_cone() {
        // Velocity pointing against the boundary of the dual cone for mu = 0.5.
        assert_relative_eq!(dual_cone_distance(0.5, 1.0, DVec2::new(2.0, 0.0)), 0.0);
        assert!(dual_cone_distance(0.5, 1.0, DVec2::new(3.0, 0.0)) > 0.0);
        assert_relative_eq!(dual_cone_distance(0.0, -2.0, DVec2::new(1.0, 0.0)), 2.0);
    }
}
