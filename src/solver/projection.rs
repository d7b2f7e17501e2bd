use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{
    core::constraints::{ConstraintGroup, ConstraintKind},
    utils::vector::JobMode,
};

/// Relative slack accepted on the cone boundary so a projected point projects
/// onto itself despite rounding.
const CONE_SLACK: f64 = 1e-12;

/// How friction groups lying outside their cone are pulled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FrictionProjection {
    /// Keeps the normal impulse and rescales the tangential part onto the
    /// disk of radius `μ·n`. Negative normals collapse to the origin.
    #[default]
    Radial,
    /// Nearest point of the cone; both normal and tangential parts move.
    Euclidean,
}

/// Projects multiplier vectors onto the product of the group feasible sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConeProjector {
    pub mode: FrictionProjection,
}

impl ConeProjector {
    pub fn new(mode: FrictionProjection) -> Self {
        Self { mode }
    }

    /// Projects `x` in place, one group at a time.
    pub fn project(&self, groups: &[ConstraintGroup], x: &mut [f64], mode: JobMode) {
        #[cfg(feature = "parallel")]
        if mode == JobMode::Parallel {
            use rayon::prelude::*;
            let chunks = split_groups(groups, x);
            groups
                .par_iter()
                .zip(chunks.into_par_iter())
                .for_each(|(group, chunk)| self.project_group(group.kind, chunk));
            return;
        }
        let _ = mode;
        for group in groups {
            self.project_group(group.kind, &mut x[group.range()]);
        }
    }

    /// Projects the components of a single group.
    pub fn project_group(&self, kind: ConstraintKind, values: &mut [f64]) {
        match kind {
            ConstraintKind::Bilateral => {}
            ConstraintKind::Unilateral => {
                values[0] = values[0].max(0.0);
            }
            ConstraintKind::Friction { mu } => {
                let (n, t) = self.project_friction(mu, values[0], DVec2::new(values[1], values[2]));
                values[0] = n;
                values[1] = t.x;
                values[2] = t.y;
            }
        }
    }

    /// Projects a `(normal, tangent)` pair onto the cone `‖t‖ ≤ μ·n`.
    pub fn project_friction(&self, mu: f64, n: f64, t: DVec2) -> (f64, DVec2) {
        let t_norm = t.length();
        if n >= 0.0 && t_norm <= mu * n * (1.0 + CONE_SLACK) {
            return (n, t);
        }

        match self.mode {
            FrictionProjection::Euclidean => {
                if mu * t_norm <= -n {
                    return (0.0, DVec2::ZERO);
                }
                let n_proj = (n + mu * t_norm) / (1.0 + mu * mu);
                (n_proj, t * (mu * n_proj / t_norm))
            }
            FrictionProjection::Radial => {
                if n < 0.0 || mu * t_norm <= -n {
                    return (0.0, DVec2::ZERO);
                }
                (n, t * (mu * n / t_norm))
            }
        }
    }

    /// Whether `x` lies in the feasible set up to `eps`.
    pub fn is_feasible(groups: &[ConstraintGroup], x: &[f64], eps: f64) -> bool {
        groups.iter().all(|group| {
            let v = &x[group.range()];
            match group.kind {
                ConstraintKind::Bilateral => true,
                ConstraintKind::Unilateral => v[0] >= -eps,
                ConstraintKind::Friction { mu } => {
                    v[0] >= -eps && DVec2::new(v[1], v[2]).length() <= mu * v[0] + eps
                }
            }
        })
    }
}

#[cfg(feature = "parallel")]
fn split_groups<'a>(groups: &[ConstraintGroup], mut x: &'a mut [f64]) -> Vec<&'a mut [f64]> {
    let mut chunks = Vec::with_capacity(groups.len());
    for group in groups {
        let (head, tail) = std::mem::take(&mut x).split_at_mut(group.size());
        chunks.push(head);
        x = tail;
    }
    chunks
}
