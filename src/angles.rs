//! Circular-angle arithmetic in degrees.
//!
//! Every heading in this crate lives in the canonical compass range
//! `[0, 360)`. Offsets and differences live in `(-180, 180]` so that a
//! correction never takes the long way around the circle.

/// Map any finite degree value into the canonical range `[0, 360)`.
///
/// Uses modular arithmetic, not iterative subtraction, so it is exact for
/// inputs arbitrarily far outside the range.
pub fn normalize_deg(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Shortest-arc signed difference `to - from`, in `(-180, 180]`.
pub fn shortest_arc_deg(from: f64, to: f64) -> f64 {
    let diff = normalize_deg(to - from);
    if diff > 180.0 {
        diff - 360.0
    } else {
        diff
    }
}

/// Circular mean of a set of angular differences, in `(-180, 180]`.
///
/// Averaging on the unit circle keeps a pair like `+179°` and `-179°` from
/// collapsing to `0°` the way a plain arithmetic mean would.
pub fn circular_mean_deg(angles: &[f64]) -> f64 {
    let (sin_sum, cos_sum) = angles.iter().fold((0.0_f64, 0.0_f64), |(s, c), a| {
        let rad = a.to_radians();
        (s + rad.sin(), c + rad.cos())
    });
    let mean = sin_sum.atan2(cos_sum).to_degrees();
    // atan2 yields [-180, 180]; fold -180 onto +180 for a single canonical value
    if mean <= -180.0 {
        mean + 360.0
    } else {
        mean
    }
}

/// Absolute shortest-arc distance between two headings, in `[0, 180]`.
pub fn angular_distance_deg(a: f64, b: f64) -> f64 {
    shortest_arc_deg(a, b).abs()
}
