//! Benchmarks for the solver driver.
//!
//! Run with: cargo bench -p sim-constraint

#![allow(missing_docs, clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nalgebra::{Point3, UnitQuaternion, Vector3};

use sim_constraint::{
    constrain_angular_range, constrain_position_nailed, physics_update, Anchor, AngularRange,
    Constraints, JointFrame, SolverEnvironment, TwistAxis,
};
use sim_core::{BodySet, RigidBody};
use sim_types::{BodyHandle, BodyRef, Gravity, SolverConfig};

const LINK_LENGTH: f64 = 10.0;

/// A vertical chain of boxes hanging from the world origin.
fn build_chain(links: usize) -> (BodySet, Vec<BodyHandle>) {
    let mut bodies = BodySet::new();
    let handles = (0..links)
        .map(|i| {
            let center = Point3::new(0.0, 0.0, -(i as f64 + 0.5) * LINK_LENGTH);
            let mut body =
                RigidBody::from_box(Vector3::new(2.0, 2.0, LINK_LENGTH), center).unwrap();
            body.parent = i.checked_sub(1).map(BodyHandle::new);
            bodies.insert(body)
        })
        .collect();
    (bodies, handles)
}

fn rebuild(dt: f64, bodies: &BodySet, handles: &[BodyHandle], constraints: &mut Constraints) {
    let half = LINK_LENGTH * 0.5;
    let range = AngularRange {
        twist_axis: TwistAxis::Z,
        min: Vector3::new(-0.5, -0.5, 0.0),
        max: Vector3::new(0.5, 0.5, 0.0),
        bias: 0.5,
    };

    constraints.clear_limits();
    for &handle in handles {
        let body = bodies.get(handle).unwrap();
        let (parent_anchor, parent_frame) = match body.parent {
            Some(parent) => (
                Anchor::body(parent, Point3::new(0.0, 0.0, -half)),
                JointFrame::body(parent, UnitQuaternion::identity()),
            ),
            None => (
                Anchor::world(Point3::origin()),
                JointFrame::world(UnitQuaternion::identity()),
            ),
        };
        constrain_position_nailed(
            dt,
            bodies,
            parent_anchor,
            Anchor::body(handle, Point3::new(0.0, 0.0, half)),
            &mut constraints.linear,
        );
        constrain_angular_range(
            dt,
            bodies,
            parent_frame,
            JointFrame {
                body: BodyRef::Dynamic(handle),
                frame: UnitQuaternion::identity(),
            },
            &range,
            &mut constraints.angular,
        );
    }
}

/// Benchmark one substep on chains of increasing length.
fn bench_chain_substep(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_substep");
    let dt = 1.0 / 60.0;
    let env = SolverEnvironment::new(Gravity::custom(Vector3::new(0.0, 0.0, -980.0)));
    let config = SolverConfig::default();

    for links in [2, 8, 32] {
        let (mut bodies, handles) = build_chain(links);
        let mut constraints = Constraints::new();
        group.throughput(Throughput::Elements(links as u64));

        group.bench_with_input(BenchmarkId::new("links", links), &links, |b, _| {
            b.iter(|| {
                rebuild(dt, &bodies, &handles, &mut constraints);
                physics_update(
                    black_box(dt),
                    &mut bodies,
                    &handles,
                    &mut constraints,
                    &env,
                    &config,
                );
            });
        });
    }

    group.finish();
}

/// Benchmark the effect of iteration counts on an eight-link chain.
fn bench_iterations(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_iterations");
    let dt = 1.0 / 60.0;
    let env = SolverEnvironment::new(Gravity::custom(Vector3::new(0.0, 0.0, -980.0)));

    for (pre, post) in [(1, 1), (4, 1), (16, 4)] {
        let config = SolverConfig::default().iterations(pre, post);
        let (mut bodies, handles) = build_chain(8);
        let mut constraints = Constraints::new();

        group.bench_with_input(
            BenchmarkId::new("pre_post", format!("{pre}_{post}")),
            &config,
            |b, config| {
                b.iter(|| {
                    rebuild(dt, &bodies, &handles, &mut constraints);
                    physics_update(dt, &mut bodies, &handles, &mut constraints, &env, config);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_chain_substep, bench_iterations);
criterion_main!(benches);
