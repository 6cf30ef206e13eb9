//! Small fixed-size vector helpers for 3-D geometry.

/// A point or vector in 3-D space.
pub type Vec3 = [f64; 3];

/// A 3×3 tensor, row-major.
pub type Tensor3 = [[f64; 3]; 3];

/// Component-wise `a + b`.
pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// Component-wise `a - b`.
pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// `s * a`.
pub fn scale(a: Vec3, s: f64) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

/// Dot product.
pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Cross product.
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Euclidean norm.
pub fn norm(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

/// Unit vector along `a`, or `None` for a (near-)zero vector.
pub fn normalize(a: Vec3) -> Option<Vec3> {
    let n = norm(a);
    if n > f64::EPSILON && n.is_finite() {
        Some(scale(a, 1.0 / n))
    } else {
        None
    }
}

/// Tensor-vector product `t · v`.
pub fn mat_vec(t: &Tensor3, v: Vec3) -> Vec3 {
    [dot(t[0], v), dot(t[1], v), dot(t[2], v)]
}

/// Rotate `v` about the unit `axis` by `angle` radians (Rodrigues).
pub fn rotate_about(v: Vec3, axis: Vec3, angle: f64) -> Vec3 {
    let (s, c) = angle.sin_cos();
    let k_dot_v = dot(axis, v);
    let k_cross_v = cross(axis, v);
    [
        v[0] * c + k_cross_v[0] * s + axis[0] * k_dot_v * (1.0 - c),
        v[1] * c + k_cross_v[1] * s + axis[1] * k_dot_v * (1.0 - c),
        v[2] * c + k_cross_v[2] * s + axis[2] * k_dot_v * (1.0 - c),
    ]
}

/// Area of a planar polygon given by its vertices (shoelace in 3-D).
pub fn polygon_area(points: &[Vec3]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut acc = [0.0; 3];
    for i in 0..points.len() {
        let j = (i + 1) % points.len();
        acc = add(acc, cross(points[i], points[j]));
    }
    0.5 * norm(acc)
}
