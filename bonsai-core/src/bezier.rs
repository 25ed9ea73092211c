//! Cubic Bézier curves on the logical canvas.

use glam::{Mat2, Vec2};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CubicBezier {
    pub p0: Vec2,
    pub p1: Vec2,
    pub p2: Vec2,
    pub p3: Vec2,
}

impl CubicBezier {
    pub fn new(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Evaluates the curve at `t`.
    ///
    /// `t` outside `[0, 1]` extrapolates along the cubic polynomial.
    pub fn point(&self, t: f32) -> Vec2 {
        let mt = 1.0 - t;
        self.p0 * (mt * mt * mt)
            + self.p1 * (3.0 * mt * mt * t)
            + self.p2 * (3.0 * mt * t * t)
            + self.p3 * (t * t * t)
    }

    /// Polyline through `segments + 1` evenly spaced parameter values.
    pub fn flatten(&self, segments: usize) -> Vec<Vec2> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| self.point(i as f32 / segments as f32))
            .collect()
    }

    /// Approximate arc length from a `samples`-segment polyline.
    pub fn length(&self, samples: usize) -> f32 {
        self.flatten(samples)
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum()
    }

    /// Point at fraction `f` of the arc length, `f` clamped to `[0, 1]`.
    ///
    /// Samples the curve, then interpolates linearly inside the segment
    /// that contains the target distance.
    pub fn point_at_fraction(&self, f: f32, samples: usize) -> Vec2 {
        let pts = self.flatten(samples);
        let mut cumulative = Vec::with_capacity(pts.len());
        let mut acc = 0.0;
        cumulative.push(0.0);
        for w in pts.windows(2) {
            acc += w[0].distance(w[1]);
            cumulative.push(acc);
        }

        let target = f.clamp(0.0, 1.0) * acc;
        if acc <= f32::EPSILON {
            return self.p0;
        }

        let i = cumulative
            .partition_point(|&d| d < target)
            .clamp(1, pts.len() - 1);
        let seg = cumulative[i] - cumulative[i - 1];
        let local = if seg > 0.0 {
            (target - cumulative[i - 1]) / seg
        } else {
            0.0
        };
        pts[i - 1].lerp(pts[i], local)
    }

    /// Path fragment `M p0 C p1, p2, p3`.
    pub fn to_svg(&self) -> String {
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            fmt(self.p0.x),
            fmt(self.p0.y),
            fmt(self.p1.x),
            fmt(self.p1.y),
            fmt(self.p2.x),
            fmt(self.p2.y),
            fmt(self.p3.x),
            fmt(self.p3.y),
        )
    }
}

/// Rotates `p` about `center` by `degrees`, clockwise on a y-down canvas.
pub fn rotate_about(p: Vec2, center: Vec2, degrees: f32) -> Vec2 {
    Mat2::from_angle(degrees.to_radians()) * (p - center) + center
}

/// Unit direction for an angle measured from straight up (`-y`).
pub fn direction_from_vertical(degrees: f32) -> Vec2 {
    let (s, c) = degrees.to_radians().sin_cos();
    Vec2::new(s, -c)
}

/// Shortest distance from `p` to a polyline.
pub fn distance_to_polyline(p: Vec2, pts: &[Vec2]) -> f32 {
    match pts {
        [] => f32::INFINITY,
        [only] => p.distance(*only),
        _ => pts
            .windows(2)
            .map(|w| {
                let ab = w[1] - w[0];
                let len2 = ab.length_squared();
                let t = if len2 > 0.0 {
                    ((p - w[0]).dot(ab) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                p.distance(w[0] + ab * t)
            })
            .fold(f32::INFINITY, f32::min),
    }
}

/// Even-odd point-in-polygon test.
pub fn polygon_contains(p: Vec2, poly: &[Vec2]) -> bool {
    let mut inside = false;
    let n = poly.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (poly[i], poly[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Trims float noise for path output: at most 3 decimals, no trailing zeros.
pub(crate) fn fmt(v: f32) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}
