//! # Geometry Kernel
//!
//! Stateless helpers shared by the camera, the bounds contexts and the renderers:
//! segment intersection, ellipse ray casting, approximate float comparison and
//! cubic Bezier evaluation. Everything here works in `f64`.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Default tolerance for [`approximately_equals`] (zoom and rotation comparisons).
pub const APPROX_EPSILON: f64 = 1e-4;

/// Tolerance on `|cos(angle)| == 1` below which two segments count as parallel.
pub const PARALLEL_EPSILON: f64 = 1e-8;

/// Maximum difference between a segment length and the summed distances from a
/// candidate point to both segment ends for the point to lie on the segment.
pub const SEGMENT_TOLERANCE: f64 = 0.01;

/// Scale factors closer to zero than this do not update the px/gu ratio.
pub const SCALE_EPSILON: f64 = 1e-6;

/// Vertical deltas below this are treated as horizontal when orienting arrows.
pub const ARROW_AXIS_EPSILON: f64 = 1e-5;

/// Symmetric floating point comparison: `|a - b| <= epsilon`.
pub fn approximately_equals(a: f64, b: f64, epsilon: f64) -> bool {
    if a == b {
        return true;
    }
    (a - b).abs() <= epsilon
}

/// [`approximately_equals`] with [`APPROX_EPSILON`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    approximately_equals(a, b, APPROX_EPSILON)
}

/// Intersection of the finite segments `p1-p2` and `p3-p4`.
///
/// Returns `None` when the segments are parallel (or degenerate) or when the
/// intersection of the supporting lines does not lie on both segments. The
/// on-segment check compares the segment length with the summed distances from
/// the candidate to both ends, within [`SEGMENT_TOLERANCE`].
pub fn intersect_segments(p1: DVec2, p2: DVec2, p3: DVec2, p4: DVec2) -> Option<DVec2> {
    let d1 = p2 - p1;
    let d2 = p4 - p3;
    let d3 = p1 - p3;

    let len1 = d1.length();
    let len2 = d2.length();
    if len1 == 0.0 || len2 == 0.0 {
        return None;
    }

    let cos = d1.dot(d2) / (len1 * len2);
    if approximately_equals(cos.abs(), 1.0, PARALLEL_EPSILON) {
        return None;
    }

    let div = d2.y * d1.x - d2.x * d1.y;
    let ua = (d2.x * d3.y - d2.y * d3.x) / div;
    let pt = p1 + d1 * ua;

    let on_first = pt.distance(p1) + pt.distance(p2);
    let on_second = pt.distance(p3) + pt.distance(p4);
    if (len1 - on_first).abs() > SEGMENT_TOLERANCE || (len2 - on_second).abs() > SEGMENT_TOLERANCE {
        return None;
    }

    Some(pt)
}

/// Distance from the centre of an axis-aligned ellipse to its boundary along
/// `direction`.
///
/// Equal radii return the radius itself. A zero direction has no boundary
/// crossing to speak of and yields `radius_x`.
pub fn ray_to_ellipse_boundary(radius_x: f64, radius_y: f64, direction: DVec2) -> f64 {
    if approximately_equals(radius_x, radius_y, f64::EPSILON) {
        return radius_x;
    }
    let dir = direction.normalize_or_zero();
    if dir == DVec2::ZERO || radius_x <= 0.0 || radius_y <= 0.0 {
        return radius_x;
    }
    let k = (dir.x / radius_x).powi(2) + (dir.y / radius_y).powi(2);
    1.0 / k.sqrt()
}

/// Point of a cubic Bezier at parameter `t`.
pub fn cubic_point(p0: DVec2, p1: DVec2, p2: DVec2, p3: DVec2, t: f64) -> DVec2 {
    let u = 1.0 - t;
    p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
}

/// Unit left-hand normal `(-dy, dx)` of a cubic Bezier at parameter `t`.
///
/// Falls back to the chord direction when the derivative vanishes.
pub fn cubic_perpendicular(p0: DVec2, p1: DVec2, p2: DVec2, p3: DVec2, t: f64) -> DVec2 {
    let u = 1.0 - t;
    let mut d = (p1 - p0) * (3.0 * u * u) + (p2 - p1) * (6.0 * u * t) + (p3 - p2) * (3.0 * t * t);
    if d.length_squared() == 0.0 {
        d = p3 - p0;
    }
    d.perp().normalize_or_zero()
}

/// An axis-aligned rectangle in either screen or graph space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: DVec2,
    pub max: DVec2,
}

impl Rect {
    pub fn new(pos: DVec2, size: DVec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    /// Builds a rectangle from two arbitrary corners.
    pub fn from_corners(a: DVec2, b: DVec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// A rectangle of the given half extents around `center`.
    pub fn from_center(center: DVec2, half: DVec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Non-positive width or height.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Closed overlap test: rectangles that only touch still overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.max.x < other.min.x
            || self.max.y < other.min.y
            || self.min.x > other.max.x
            || self.min.y > other.max.y)
    }

    pub fn expand(&self, amount: f64) -> Self {
        Self {
            min: self.min - DVec2::splat(amount),
            max: self.max + DVec2::splat(amount),
        }
    }

    /// The four boundary segments: left, right, top, bottom.
    pub fn edges(&self) -> [(DVec2, DVec2); 4] {
        let (lo, hi) = (self.min, self.max);
        [
            (lo, DVec2::new(lo.x, hi.y)),
            (DVec2::new(hi.x, lo.y), hi),
            (lo, DVec2::new(hi.x, lo.y)),
            (DVec2::new(lo.x, hi.y), hi),
        ]
    }
}
