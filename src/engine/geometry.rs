// Small 2D helpers shared by steering, perception and combat.
// All functions are pure and treat near-zero vectors as "no direction".

use glam::Vec2;
use std::f32::consts::{PI, TAU};

/// Lengths below this are treated as zero when normalizing.
pub const EPSILON: f32 = 1e-4;

/// Normalize `v`, or return `Vec2::ZERO` for a (near) zero-length vector.
#[inline]
pub fn direction_or_zero(v: Vec2) -> Vec2 {
    let len = v.length();
    if len > EPSILON { v / len } else { Vec2::ZERO }
}

/// Unit vector for a heading angle in radians (0 = +X, counter-clockwise).
#[inline]
pub fn heading_vector(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Heading angle of `v`, or `None` when `v` has no direction.
#[inline]
pub fn heading_of(v: Vec2) -> Option<f32> {
    if v.length_squared() > EPSILON * EPSILON {
        Some(v.y.atan2(v.x))
    } else {
        None
    }
}

/// Wrap an angle into (-PI, PI].
pub fn wrap_pi(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a <= -PI {
        a += TAU;
    } else if a > PI {
        a -= TAU;
    }
    a
}

/// Turn `current` toward `target` by at most `max_step` radians along the
/// shorter arc. The result is wrapped into (-PI, PI].
pub fn rotate_towards(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = wrap_pi(target - current).clamp(-max_step, max_step);
    wrap_pi(current + delta)
}

/// Squared distance from `p` to the segment `a`..`b`.
/// A degenerate segment collapses to the distance from `a`.
pub fn segment_distance_sq(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    let ab = b - a;
    let ap = p - a;
    let ab_sq = ab.length_squared();
    if ab_sq < EPSILON {
        return ap.length_squared();
    }
    let t = (ap.dot(ab) / ab_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).length_squared()
}

/// Circle vs axis-aligned rectangle overlap (`min`..`max` corners).
/// Touching counts as overlapping.
pub fn circle_overlaps_rect(center: Vec2, radius: f32, min: Vec2, max: Vec2) -> bool {
    let closest = center.clamp(min, max);
    (center - closest).length_squared() <= radius * radius
}

/// True when `dir` lies within the cone of half-angle `half_fov_rad` around
/// `forward`. Both vectors are expected to be unit length; the boundary
/// angle itself is inside the cone.
#[inline]
pub fn within_cone(forward: Vec2, dir: Vec2, half_fov_rad: f32) -> bool {
    forward.dot(dir) >= half_fov_rad.cos()
}
