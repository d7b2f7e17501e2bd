use approx::assert_relative_eq;
use ccp_solver::*;

const DT: f64 = 0.01;
const GRAVITY: f64 = -9.81;

fn settings() -> SolverSettings {
    SolverSettings::new(5000, false, 1e-9)
}

fn ground_contact(ground: BodyHandle, body: BodyHandle, point: DVec3, friction: f64) -> ContactPoint {
    ContactPoint {
        body_a: ground,
        body_b: body,
        point,
        normal: DVec3::Y,
        depth: 0.0,
        friction,
    }
}

fn box_on_ground(velocity: DVec3) -> (RigidContactSystem, BodyHandle, BodyHandle) {
    let mut system = RigidContactSystem::new(DT);
    let ground = system.add_body(SolverBody::fixed(DVec3::ZERO));
    let body = system.add_body(
        SolverBody::cuboid(DVec3::new(0.0, 0.5, 0.0), 1.0, DVec3::splat(0.5))
            .with_velocity(velocity, DVec3::ZERO)
            .with_force(DVec3::new(0.0, GRAVITY, 0.0)),
    );
    (system, ground, body)
}

#[test]
fn box_rests_on_four_corners() {
    let (mut system, ground, body) = box_on_ground(DVec3::ZERO);
    let offsets: Vec<usize> = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)]
        .iter()
        .map(|&(x, z)| system.add_contact(ground_contact(ground, body, DVec3::new(x, 0.0, z), 0.5)))
        .collect();

    let mut solver = ApgdSolver::new(settings());
    let report = solver.solve(&mut system).expect("valid system");
    assert!(report.converged(), "residual {}", report.residual);

    let state = system.body(body).expect("body exists");
    assert!(state.linear_velocity.length() < 1e-6, "{:?}", state.linear_velocity);
    assert!(state.angular_velocity.length() < 1e-6);

    let total_normal: f64 = offsets.iter().map(|&o| system.contact_impulse(o).x).sum();
    assert_relative_eq!(total_normal, -GRAVITY * DT, epsilon = 1e-6);
    for &offset in &offsets {
        let impulse = system.contact_impulse(offset);
        assert!(impulse.x >= 0.0);
        assert!(impulse.y.hypot(impulse.z) < 1e-6);
    }
}

#[test]
fn high_friction_sticks_the_contact_point() {
    let (mut system, ground, body) = box_on_ground(DVec3::new(0.5, 0.0, 0.0));
    let point = DVec3::ZERO;
    let offset = system.add_contact(ground_contact(ground, body, point, 10.0));

    let mut solver = ApgdSolver::new(settings());
    solver.solve(&mut system).expect("valid system");

    let state = system.body(body).expect("body exists");
    assert!(state.point_velocity(point).length() < 1e-6);

    let impulse = system.contact_impulse(offset);
    assert_relative_eq!(impulse.x, -GRAVITY * DT, epsilon = 1e-6);
    assert!(impulse.y.hypot(impulse.z) < 10.0 * impulse.x);
}

#[test]
fn low_friction_slides_on_the_cone_boundary() {
    let (mut system, ground, body) = box_on_ground(DVec3::new(0.5, 0.0, 0.0));
    let mu = 0.1;
    let offset = system.add_contact(ground_contact(ground, body, DVec3::ZERO, mu));

    let mut solver = ApgdSolver::new(settings());
    solver.solve(&mut system).expect("valid system");

    let impulse = system.contact_impulse(offset);
    assert!(impulse.x > 0.0);
    assert_relative_eq!(impulse.y.hypot(impulse.z), mu * impulse.x, epsilon = 1e-6);

    let velocity = system.body(body).expect("body exists").linear_velocity;
    assert!(velocity.x > 0.0 && velocity.x < 0.5);
}

#[test]
fn ball_joint_pins_the_pendulum() {
    let mut system = RigidContactSystem::new(DT);
    let pivot = DVec3::new(0.0, 2.0, 0.0);
    let anchor = system.add_body(SolverBody::fixed(pivot));
    let bob = system.add_body(
        SolverBody::cuboid(DVec3::new(1.0, 2.0, 0.0), 1.0, DVec3::splat(0.1))
            .with_velocity(DVec3::new(0.3, -1.0, 0.2), DVec3::new(0.0, 0.0, 0.5))
            .with_force(DVec3::new(0.0, GRAVITY, 0.0)),
    );
    let offset = system.add_ball_joint(BallJoint {
        body_a: anchor,
        body_b: bob,
        anchor_a: DVec3::ZERO,
        anchor_b: DVec3::new(-1.0, 0.0, 0.0),
    });
    assert_eq!(offset, 0);
    assert_eq!(system.dimension(), 3);

    let mut solver = ApgdSolver::new(settings());
    let report = solver.solve(&mut system).expect("valid system");
    assert!(report.converged());

    let state = system.body(bob).expect("body exists");
    assert!(state.point_velocity(pivot).length() < 1e-6);
    // Bilateral rows may pull in any direction.
    assert!(system.reactions().iter().any(|&g| g < 0.0));
}

#[test]
fn euclidean_projection_stays_feasible() {
    let (mut system, ground, body) = box_on_ground(DVec3::new(0.5, 0.0, 0.2));
    for x in [-0.5, 0.5] {
        system.add_contact(ground_contact(ground, body, DVec3::new(x, 0.0, 0.0), 0.2));
    }

    let settings = settings()
        .with_max_iterations(500)
        .with_friction_projection(FrictionProjection::Euclidean);
    let mut solver = ApgdSolver::new(settings);
    solver.solve(&mut system).expect("valid system");

    assert!(ConeProjector::is_feasible(
        system.constraint_groups(),
        system.reactions(),
        1e-12
    ));
}

#[test]
fn engine_keeps_resting_box_in_place() {
    let settings = SolverSettings::new(2000, true, 1e-10);
    let mut engine = ContactEngine::with_solver(DT, Solver::new(SolverKind::Apgd, settings));
    let ground = engine.add_body(SolverBody::fixed(DVec3::ZERO));
    let body = engine.add_body(
        SolverBody::cuboid(DVec3::new(0.0, 0.5, 0.0), 2.0, DVec3::splat(0.5))
            .with_force(DVec3::new(0.0, 2.0 * GRAVITY, 0.0)),
    );

    for _ in 0..20 {
        let height = engine.get_body(body).expect("body exists").position.y;
        for (x, z) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            engine.add_contact(ContactPoint {
                depth: 0.5 - height,
                ..ground_contact(ground, body, DVec3::new(x, height - 0.5, z), 0.6)
            });
        }
        let report = engine.step().expect("valid system");
        assert!(report.converged());
        assert_eq!(engine.system().dimension(), 0);
    }

    let position = engine.get_body(body).expect("body exists").position;
    assert_relative_eq!(position.y, 0.5, epsilon = 1e-6);
    assert!(engine.solver().residual() <= 1e-10);
}

#[test]
#[should_panic(expected = "not part of this system")]
fn contact_with_unknown_body_panics() {
    let (mut system, ground, _) = box_on_ground(DVec3::ZERO);
    system.add_contact(ground_contact(ground, BodyHandle(7), DVec3::ZERO, 0.5));
}

#[test]
#[should_panic(expected = "not part of this system")]
fn joint_with_unknown_body_panics() {
    let (mut system, ground, _) = box_on_ground(DVec3::ZERO);
    system.add_ball_joint(BallJoint {
        body_a: BodyHandle(3),
        body_b: ground,
        anchor_a: DVec3::ZERO,
        anchor_b: DVec3::ZERO,
    });
}
