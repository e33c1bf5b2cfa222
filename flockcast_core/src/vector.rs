//! 2D vector helpers on top of `nalgebra::Vector2`.

use nalgebra::Vector2;

/// World-space 2D vector (positions, velocities, accelerations).
pub type Vec2 = Vector2<f64>;

/// Lengths below this are treated as zero when a direction is needed.
pub const EPSILON: f64 = 1e-12;

/// Rescales `v` to the given length, keeping its direction.
///
/// Returns `None` for a (near) zero vector, whose direction is undefined.
pub fn scale_to_length(v: &Vec2, length: f64) -> Option<Vec2> {
    let norm = v.norm();
    if norm <= EPSILON {
        return None;
    }
    Some(v * (length / norm))
}

/// Moves `point` onto the circle of `radius` around `centre`, along the ray
/// from `centre` through `point`.
///
/// `fallback` (a unit vector) is used as the ray direction when `point`
/// coincides with `centre`.
pub fn onto_circle(centre: &Vec2, radius: f64, point: &Vec2, fallback: &Vec2) -> Vec2 {
    let offset = point - centre;
    let direction = scale_to_length(&offset, 1.0).unwrap_or(*fallback);
    centre + direction * radius
}

/// Heading of `v` in radians, measured counter-clockwise from +x.
pub fn heading(v: &Vec2) -> f64 {
    v.y.atan2(v.x)
}

/// Unit vector pointing along `angle` (radians).
pub fn unit_from_heading(angle: f64) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}
