//! Property-based tests for the cone projection.

use ccp_solver::{ConeProjector, ConstraintGroup, FrictionProjection, JobMode};
use proptest::prelude::*;

fn arb_mode() -> impl Strategy<Value = FrictionProjection> {
    prop_oneof![
        Just(FrictionProjection::Euclidean),
        Just(FrictionProjection::Radial),
    ]
}

/// A group layout plus matching values: one bilateral row, one unilateral
/// row and `contacts` friction groups.
fn arb_problem() -> impl Strategy<Value = (Vec<ConstraintGroup>, Vec<f64>)> {
    (1usize..12).prop_flat_map(|contacts| {
        let mus = prop::collection::vec(0.0..2.0f64, contacts);
        let values = prop::collection::vec(-10.0..10.0f64, 2 + contacts * 3);
        (mus, values).prop_map(|(mus, values)| {
            let mut groups = vec![ConstraintGroup::bilateral(0), ConstraintGroup::unilateral(1)];
            groups.extend(
                mus.iter()
                    .enumerate()
                    .map(|(i, &mu)| ConstraintGroup::friction(2 + i * 3, mu)),
            );
            (groups, values)
        })
    })
}

proptest! {
    #[test]
    fn projection_is_idempotent((groups, values) in arb_problem(), mode in arb_mode()) {
        let projector = ConeProjector::new(mode);
        let mut once = values;
        projector.project(&groups, &mut once, JobMode::Serial);
        let mut twice = once.clone();
        projector.project(&groups, &mut twice, JobMode::Serial);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn projection_is_feasible((groups, values) in arb_problem(), mode in arb_mode()) {
        let projector = ConeProjector::new(mode);
        let bilateral = values[0];
        let mut x = values;
        projector.project(&groups, &mut x, JobMode::Serial);
        prop_assert!(ConeProjector::is_feasible(&groups, &x, 1e-9));
        prop_assert_eq!(x[0], bilateral);
    }

    #[test]
    fn feasible_points_are_fixed(mu in 0.0..2.0f64, n in 0.0..10.0f64, angle in 0.0..std::f64::consts::TAU, scale in 0.0..1.0f64) {
        let projector = ConeProjector::default();
        let radius = mu * n * scale;
        let groups = [ConstraintGroup::friction(0, mu)];
        let original = vec![n, radius * angle.cos(), radius * angle.sin()];
        let mut x = original.clone();
        projector.project(&groups, &mut x, JobMode::Serial);
        prop_assert_eq!(x, original);
    }

    #[test]
    fn euclidean_projection_is_nearest_point(mu in 0.05..2.0f64, n in -10.0..10.0f64, t1 in -10.0..10.0f64, t2 in -10.0..10.0f64) {
        let projector = ConeProjector::new(FrictionProjection::Euclidean);
        let (pn, pt) = projector.project_friction(mu, n, ccp_solver::DVec2::new(t1, t2));
        let distance = ((n - pn).powi(2) + (t1 - pt.x).powi(2) + (t2 - pt.y).powi(2)).sqrt();
        // The radial candidate and the origin are both feasible, so never closer.
        let radial = ConeProjector::new(FrictionProjection::Radial)
            .project_friction(mu, n, ccp_solver::DVec2::new(t1, t2));
        let radial_distance = ((n - radial.0).powi(2) + (t1 - radial.1.x).powi(2) + (t2 - radial.1.y).powi(2)).sqrt();
        let origin_distance = (n * n + t1 * t1 + t2 * t2).sqrt();
        prop_assert!(distance <= radial_distance + 1e-9);
        prop_assert!(distance <= origin_distance + 1e-9);
    }
}
