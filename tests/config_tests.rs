use ccp_solver::{config, FrictionProjection, ResidualMetric, Solver, SolverKind, SolverSettings};

#[test]
fn defaults_match_documented_constants() {
    let settings = SolverSettings::default();
    assert_eq!(settings.max_iterations, config::DEFAULT_MAX_ITERATIONS);
    assert_eq!(settings.warm_start, config::DEFAULT_WARM_START);
    assert_eq!(settings.tolerance, config::DEFAULT_TOLERANCE);
    assert_eq!(settings.max_backtracks, config::DEFAULT_MAX_BACKTRACKS);
    assert_eq!(settings.residual_metric, ResidualMetric::ProjectedGradient);
    assert_eq!(settings.friction_projection, FrictionProjection::Radial);
    assert_eq!(Solver::default().kind(), SolverKind::Apgd);
}

#[test]
fn settings_round_trip_through_json() {
    let settings = SolverSettings::new(250, true, 1e-7)
        .with_history(true)
        .with_residual_metric(ResidualMetric::Composite)
        .with_friction_projection(FrictionProjection::Euclidean);

    let json = serde_json::to_string(&settings).expect("serializable");
    let back: SolverSettings = serde_json::from_str(&json).expect("deserializable");

    assert_eq!(back.max_iterations, 250);
    assert!(back.warm_start);
    assert_eq!(back.tolerance, 1e-7);
    assert!(back.record_history);
    assert_eq!(back.residual_metric, ResidualMetric::Composite);
    assert_eq!(back.friction_projection, FrictionProjection::Euclidean);
}

#[test]
fn partial_json_falls_back_to_defaults() {
    let back: SolverSettings =
        serde_json::from_str(r#"{ "max_iterations": 40, "tolerance": 1e-5 }"#).expect("valid json");
    assert_eq!(back.max_iterations, 40);
    assert_eq!(back.tolerance, 1e-5);
    assert_eq!(back.warm_start, config::DEFAULT_WARM_START);
    assert_eq!(back.step_relaxation, config::DEFAULT_STEP_RELAXATION);

    let kind: SolverKind = serde_json::from_str(r#""ProjectedGradient""#).expect("valid json");
    assert_eq!(kind, SolverKind::ProjectedGradient);
}
