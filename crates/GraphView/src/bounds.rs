//! # Element Bounds Context
//!
//! The screen-space footprint of one element as drawn in the most recent frame.
//! The camera keeps one per element id and the renderers query it for
//! hit-testing and to clip edges at node boundaries.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::CanvasError;
use crate::geometry::{self, Rect};

/// Footprint of an element in screen space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Bounds {
    /// An axis-aligned box.
    Rect(Rect),
    /// An axis-aligned ellipse around a centre.
    Ellipse { center: DVec2, radius_x: f64, radius_y: f64 },
}

impl Bounds {
    /// The axis-aligned box enclosing the shape.
    pub fn rect(&self) -> Rect {
        match *self {
            Bounds::Rect(rect) => rect,
            Bounds::Ellipse {
                center,
                radius_x,
                radius_y,
            } => Rect::from_center(center, DVec2::new(radius_x, radius_y)),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.rect().is_degenerate()
    }
}

/// Cached screen position and bounds of a rendered element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundsContext {
    id: String,
    position: DVec2,
    bounds: Bounds,
}

impl BoundsContext {
    /// Builds a context. The id must not be empty.
    pub fn new(id: impl Into<String>, position: DVec2, bounds: Bounds) -> Result<Self, CanvasError> {
        let id = id.into();
        if id.is_empty() {
            return Err(CanvasError::EmptyElementId);
        }
        Ok(Self { id, position, bounds })
    }

    /// Rectangular context of the given half extents around `position`.
    pub fn rect(id: impl Into<String>, position: DVec2, half: DVec2) -> Result<Self, CanvasError> {
        Self::new(id, position, Bounds::Rect(Rect::from_center(position, half)))
    }

    /// Elliptical context centred on `position`.
    pub fn ellipse(
        id: impl Into<String>,
        position: DVec2,
        radius_x: f64,
        radius_y: f64,
    ) -> Result<Self, CanvasError> {
        Self::new(
            id,
            position,
            Bounds::Ellipse {
                center: position,
                radius_x,
                radius_y,
            },
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Enclosing box of the bounds.
    pub fn rect_bounds(&self) -> Rect {
        self.bounds.rect()
    }

    /// Point containment against the enclosing box.
    ///
    /// Elliptical bounds are tested against their bounding box, not the ellipse
    /// itself, so the corners of a round node still count as inside.
    pub fn contains(&self, point: DVec2) -> bool {
        let rect = self.bounds.rect();
        if rect.is_degenerate() {
            return false;
        }
        rect.contains(point)
    }

    /// Where the segment `(x0, y0)-(x1, y1)` crosses the boundary, nearest to
    /// `(x0, y0)`.
    ///
    /// Boxes are clipped against their four sides. Ellipses are clipped against
    /// the true ellipse so that edges meet round nodes on their outline.
    pub fn intersects(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> Option<DVec2> {
        let from = DVec2::new(x0, y0);
        let to = DVec2::new(x1, y1);
        match self.bounds {
            Bounds::Rect(rect) => intersect_rect(&rect, from, to),
            Bounds::Ellipse {
                center,
                radius_x,
                radius_y,
            } => intersect_ellipse(center, radius_x, radius_y, from, to),
        }
    }
}

fn intersect_rect(rect: &Rect, from: DVec2, to: DVec2) -> Option<DVec2> {
    let mut best: Option<(f64, DVec2)> = None;
    for (a, b) in rect.edges() {
        if let Some(p) = geometry::intersect_segments(from, to, a, b) {
            let d = p.distance_squared(from);
            if best.is_none_or(|(min, _)| d <= min) {
                best = Some((d, p));
            }
        }
    }
    best.map(|(_, p)| p)
}

fn intersect_ellipse(center: DVec2, rx: f64, ry: f64, from: DVec2, to: DVec2) -> Option<DVec2> {
    if rx <= 0.0 || ry <= 0.0 {
        return None;
    }
    let delta = to - from;
    let length = delta.length();
    if length == 0.0 {
        return None;
    }

    // Segments leaving the centre are the common case for edges.
    if from.distance(center) <= f64::EPSILON * rx.max(ry) {
        let distance = geometry::ray_to_ellipse_boundary(rx, ry, delta);
        if distance > length + geometry::SEGMENT_TOLERANCE {
            return None;
        }
        return Some(center + delta / length * distance);
    }

    // General case: solve |((p - c) / r)|^2 = 1 for p = from + t * delta.
    let scale = DVec2::new(1.0 / rx, 1.0 / ry);
    let o = (from - center) * scale;
    let d = delta * scale;
    let a = d.dot(d);
    let b = 2.0 * o.dot(d);
    let c = o.dot(o) - 1.0;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sqrt = disc.sqrt();
    let mut roots = [(-b - sqrt) / (2.0 * a), (-b + sqrt) / (2.0 * a)];
    roots.sort_by(f64::total_cmp);
    roots
        .into_iter()
        .find(|t| (0.0..=1.0).contains(t))
        .map(|t| from + delta * t)
}
