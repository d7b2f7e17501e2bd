use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ccp_solver::*;
use std::hint::black_box;

const DT: f64 = 1.0 / 60.0;

/// A row of boxes, each resting on the ground on four frictional corners.
fn prepare_boxes(box_count: usize) -> RigidContactSystem {
    let mut system = RigidContactSystem::new(DT);
    let ground = system.add_body(SolverBody::fixed(DVec3::ZERO));
    for i in 0..box_count {
        let x = i as f64 * 1.5;
        let body = system.add_body(
            SolverBody::cuboid(DVec3::new(x, 0.5, 0.0), 1.0, DVec3::splat(0.5))
                .with_velocity(DVec3::new(0.2, -0.1, 0.0), DVec3::ZERO)
                .with_force(DVec3::new(0.0, -9.81, 0.0)),
        );
        for (dx, dz) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            system.add_contact(ContactPoint {
                body_a: ground,
                body_b: body,
                point: DVec3::new(x + dx, 0.0, dz),
                normal: DVec3::Y,
                depth: 0.001,
                friction: 0.5,
            });
        }
    }
    system
}

fn bench_box_row(c: &mut Criterion) {
    let mut group = c.benchmark_group("box_row");
    for &count in &[64usize, 512, 2048] {
        group.bench_with_input(BenchmarkId::new("sequential", count), &count, |b, &count| {
            let mut solver = ApgdSolver::new(SolverSettings::new(100, false, 0.0).with_parallel(false));
            b.iter(|| {
                let mut system = prepare_boxes(count);
                black_box(solver.solve(&mut system).ok());
            })
        });
        group.bench_with_input(BenchmarkId::new("parallel", count), &count, |b, &count| {
            let mut settings = SolverSettings::new(100, false, 0.0).with_parallel(true);
            settings.parallel_threshold = 0;
            let mut solver = ApgdSolver::new(settings);
            b.iter(|| {
                let mut system = prepare_boxes(count);
                black_box(solver.solve(&mut system).ok());
            })
        });
    }
    group.finish();
}

fn bench_variants(c: &mut Criterion) {
    let mut group = c.benchmark_group("variants");
    for kind in [SolverKind::Apgd, SolverKind::ProjectedGradient] {
        group.bench_function(format!("{kind:?}"), |b| {
            let mut solver = Solver::new(kind, SolverSettings::new(200, false, 1e-8));
            b.iter(|| {
                let mut system = prepare_boxes(128);
                black_box(solver.solve(&mut system).ok());
            })
        });
    }
    group.finish();
}

fn bench_warm_start(c: &mut Criterion) {
    let mut solver = ApgdSolver::new(SolverSettings::new(500, true, 1e-8));
    let mut system = prepare_boxes(256);
    if solver.solve(&mut system).is_ok() {
        solver.profiler().report();
    }
    c.bench_function("warm_start_resolve", |b| {
        b.iter(|| black_box(solver.solve(&mut system).ok()))
    });
}

criterion_group!(benches, bench_box_row, bench_variants, bench_warm_start);
criterion_main!(benches);
