//! Integration tests for mass properties and body construction.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use approx::assert_relative_eq;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use sim_core::{compute_center_of_mass, compute_volume, RigidBody, Shape};

/// A tetrahedron with one vertex at `apex`, wound outward.
fn tetrahedron(apex: Point3<f64>) -> Shape {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        apex,
    ];
    let triangles = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
    Shape::new(vertices, triangles).unwrap()
}

fn rotated_box(
    extents: Vector3<f64>,
    rotation: UnitQuaternion<f64>,
    offset: Vector3<f64>,
) -> Shape {
    let shape = Shape::make_box(extents);
    let vertices = shape
        .vertices
        .iter()
        .map(|v| Point3::from(rotation * v.coords + offset))
        .collect();
    Shape::new(vertices, shape.triangles).unwrap()
}

#[test]
fn recentering_is_idempotent() {
    let shapes = [
        Shape::make_box(Vector3::new(1.0, 2.0, 3.0)),
        tetrahedron(Point3::new(0.2, 0.3, 1.5)),
        rotated_box(
            Vector3::new(0.5, 1.5, 0.25),
            UnitQuaternion::from_euler_angles(0.4, -0.7, 1.1),
            Vector3::new(5.0, -3.0, 2.0),
        ),
    ];

    for shape in shapes {
        assert!(shape.volume > 0.0);
        let mut recentered = shape.clone();
        recentered.translate(&-shape.center_of_mass.coords);

        let com = compute_center_of_mass(&recentered.vertices, &recentered.triangles);
        assert_relative_eq!(com.coords, Vector3::zeros(), epsilon = 1e-9);
        assert_relative_eq!(
            compute_volume(&recentered.vertices, &recentered.triangles),
            shape.volume,
            epsilon = 1e-9
        );
    }
}

#[test]
fn tetrahedron_volume_and_centroid() {
    let shape = tetrahedron(Point3::new(0.0, 0.0, 1.0));
    assert_relative_eq!(shape.volume, 1.0 / 6.0, epsilon = 1e-12);
    assert_relative_eq!(
        shape.center_of_mass.coords,
        Vector3::new(0.25, 0.25, 0.25),
        epsilon = 1e-12
    );
}

#[test]
fn rotated_box_inertia_is_rotated() {
    let rotation = UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2);
    let shape = rotated_box(Vector3::new(1.0, 3.0, 2.0), rotation, Vector3::zeros());
    let inertia = shape.inertia_about(&Point3::origin());

    // The long local Y axis now lies along world X.
    assert_relative_eq!(inertia[(0, 0)], (1.0 + 4.0) / 12.0, epsilon = 1e-9);
    assert_relative_eq!(inertia[(1, 1)], (9.0 + 4.0) / 12.0, epsilon = 1e-9);
    assert_relative_eq!(inertia[(0, 1)], 0.0, epsilon = 1e-9);
}

#[test]
fn body_from_offset_shapes_is_centered() {
    let shape = rotated_box(
        Vector3::new(1.0, 1.0, 1.0),
        UnitQuaternion::identity(),
        Vector3::new(0.0, 0.0, -2.0),
    );
    let body = RigidBody::new(vec![shape], Point3::new(10.0, 0.0, 0.0)).unwrap();

    assert_relative_eq!(
        body.pose.position.coords,
        Vector3::new(10.0, 0.0, -2.0),
        epsilon = 1e-10
    );
    let local = &body.shapes[0];
    let com = compute_center_of_mass(&local.vertices, &local.triangles);
    assert_relative_eq!(com.coords, Vector3::zeros(), epsilon = 1e-10);
}
