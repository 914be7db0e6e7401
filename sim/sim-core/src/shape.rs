//! Convex shapes and their mass properties.
//!
//! Mass properties come from a tetrahedron decomposition: every triangle forms
//! a tetrahedron with the origin, and the signed contributions are summed.
//! Negative contributions are part of the result (they cancel for concave
//! regions), not an error.
//!
//! All tensors assume unit density and are normalized to unit mass; bodies
//! scale them by their mass.

use nalgebra::{Matrix3, Point3, Vector3};
use sim_types::{Result, SimError};

/// Volumes below this are treated as degenerate.
pub const VOLUME_EPSILON: f64 = 1e-9;

/// A triangle as indices into a vertex list.
pub type Triangle = [u32; 3];

fn corners(vertices: &[Point3<f64>], tri: &Triangle) -> [Vector3<f64>; 3] {
    [
        vertices[tri[0] as usize].coords,
        vertices[tri[1] as usize].coords,
        vertices[tri[2] as usize].coords,
    ]
}

fn triple(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> f64 {
    a.dot(&b.cross(c))
}

/// Signed volume enclosed by a closed triangle mesh.
///
/// Triangles must be wound counter-clockwise when seen from outside for the
/// volume to come out positive.
#[must_use]
pub fn compute_volume(vertices: &[Point3<f64>], triangles: &[Triangle]) -> f64 {
    triangles
        .iter()
        .map(|tri| {
            let [a, b, c] = corners(vertices, tri);
            triple(&a, &b, &c)
        })
        .sum::<f64>()
        / 6.0
}

/// Volume-weighted centroid of a closed triangle mesh.
///
/// Produces non-finite components when the volume is zero; callers guard
/// against degenerate shapes before using the result.
#[must_use]
pub fn compute_center_of_mass(vertices: &[Point3<f64>], triangles: &[Triangle]) -> Point3<f64> {
    let mut weighted = Vector3::zeros();
    let mut volume = 0.0;

    for tri in triangles {
        let [a, b, c] = corners(vertices, tri);
        let det = triple(&a, &b, &c);
        // Tetrahedron centroid is (a + b + c + origin) / 4.
        weighted += (a + b + c) * det;
        volume += det;
    }

    Point3::from(weighted / (volume * 4.0))
}

/// Inertia tensor of a closed triangle mesh about `center_of_mass`, for unit
/// mass.
#[must_use]
pub fn compute_inertia_tensor(
    vertices: &[Point3<f64>],
    triangles: &[Triangle],
    center_of_mass: &Point3<f64>,
) -> Matrix3<f64> {
    let mut volume = 0.0;
    let mut diag = Vector3::zeros();
    let mut offd = Vector3::zeros();

    for tri in triangles {
        let [a, b, c] = corners(vertices, tri);
        let (a, b, c) = (
            a - center_of_mass.coords,
            b - center_of_mass.coords,
            c - center_of_mass.coords,
        );
        let det = triple(&a, &b, &c);
        volume += det;

        for j in 0..3 {
            let j1 = (j + 1) % 3;
            let j2 = (j + 2) % 3;

            diag[j] += (a[j] * b[j]
                + b[j] * c[j]
                + c[j] * a[j]
                + a[j] * a[j]
                + b[j] * b[j]
                + c[j] * c[j])
                * det;

            offd[j] += (a[j1] * b[j2]
                + b[j1] * c[j2]
                + c[j1] * a[j2]
                + a[j1] * c[j2]
                + b[j1] * a[j2]
                + c[j1] * b[j2]
                + a[j1] * a[j2] * 2.0
                + b[j1] * b[j2] * 2.0
                + c[j1] * c[j2] * 2.0)
                * det;
        }
    }

    if volume.abs() < VOLUME_EPSILON {
        return Matrix3::zeros();
    }

    // 60/6 and 120/6 fold the 1/6 tetrahedron volume factor into the integrals.
    let diag = diag / (volume * 10.0);
    let offd = offd / (volume * 20.0);

    Matrix3::new(
        diag.y + diag.z,
        -offd.z,
        -offd.y,
        -offd.z,
        diag.x + diag.z,
        -offd.x,
        -offd.y,
        -offd.x,
        diag.x + diag.y,
    )
}

/// A closed convex triangle mesh owned by a single body.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Vertices, in body-local space once the owning body is built.
    pub vertices: Vec<Point3<f64>>,
    /// Triangles as indices into `vertices`.
    pub triangles: Vec<Triangle>,
    /// Signed volume.
    pub volume: f64,
    /// Center of mass.
    pub center_of_mass: Point3<f64>,
}

impl Shape {
    /// Create a shape and cache its volume and center of mass.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] when a triangle refers to a vertex
    /// that does not exist.
    pub fn new(vertices: Vec<Point3<f64>>, triangles: Vec<Triangle>) -> Result<Self> {
        let count = vertices.len();
        if let Some(index) = triangles
            .iter()
            .flatten()
            .find(|&&i| i as usize >= count)
        {
            return Err(SimError::invalid_config(format!(
                "triangle index {index} out of range for {count} vertices"
            )));
        }
        Ok(Self::from_parts(vertices, triangles))
    }

    fn from_parts(vertices: Vec<Point3<f64>>, triangles: Vec<Triangle>) -> Self {
        let volume = compute_volume(&vertices, &triangles);
        let center_of_mass = compute_center_of_mass(&vertices, &triangles);
        Self {
            vertices,
            triangles,
            volume,
            center_of_mass,
        }
    }

    /// Axis-aligned box centered on the origin with full side lengths
    /// `extents`.
    ///
    /// # Example
    ///
    /// ```
    /// use sim_core::Shape;
    /// use nalgebra::Vector3;
    ///
    /// let shape = Shape::make_box(Vector3::new(2.0, 2.0, 2.0));
    /// assert!((shape.volume - 8.0).abs() < 1e-10);
    /// ```
    #[must_use]
    pub fn make_box(extents: Vector3<f64>) -> Self {
        let half = extents * 0.5;
        let vertices = (0..8u32)
            .map(|i| {
                Point3::new(
                    if i & 1 == 0 { -half.x } else { half.x },
                    if i & 2 == 0 { -half.y } else { half.y },
                    if i & 4 == 0 { -half.z } else { half.z },
                )
            })
            .collect();

        let triangles = vec![
            [0, 4, 6],
            [0, 6, 2],
            [1, 3, 7],
            [1, 7, 5],
            [0, 1, 5],
            [0, 5, 4],
            [2, 6, 7],
            [2, 7, 3],
            [0, 2, 3],
            [0, 3, 1],
            [4, 5, 7],
            [4, 7, 6],
        ];

        Self::from_parts(vertices, triangles)
    }

    /// Check whether the shape encloses a usable volume.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !self.volume.is_finite() || self.volume.abs() < VOLUME_EPSILON
    }

    /// Shift all vertices by `offset` and update the cached center of mass.
    pub fn translate(&mut self, offset: &Vector3<f64>) {
        for v in &mut self.vertices {
            *v += offset;
        }
        self.center_of_mass += offset;
    }

    /// Inertia tensor about `center_of_mass`, for unit mass.
    #[must_use]
    pub fn inertia_about(&self, center_of_mass: &Point3<f64>) -> Matrix3<f64> {
        compute_inertia_tensor(&self.vertices, &self.triangles, center_of_mass)
    }
}
