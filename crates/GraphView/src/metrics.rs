//! # Graph Metrics
//!
//! Bounding box of the graph in graph units (GU), the viewport in pixels and
//! the px/gu ratio of the current transform. The camera owns one instance and
//! updates it while recomputing the view; everything else reads it.

use std::fmt;

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// Unit a length or a position is expressed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Units {
    /// Graph units.
    #[default]
    Gu,
    /// Screen pixels.
    Px,
    /// Percentage of the graph diagonal (lengths) or of the viewport (positions).
    Percents,
}

/// One or more lengths sharing a unit, e.g. a `(width, height)` size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lengths {
    pub units: Units,
    pub values: Vec<f64>,
}

impl Lengths {
    pub fn new(units: Units, values: impl Into<Vec<f64>>) -> Self {
        Self {
            units,
            values: values.into(),
        }
    }

    pub fn px(values: impl Into<Vec<f64>>) -> Self {
        Self::new(Units::Px, values)
    }

    pub fn gu(values: impl Into<Vec<f64>>) -> Self {
        Self::new(Units::Gu, values)
    }

    /// Value at `index`; indices past the end repeat the last value.
    pub fn get(&self, index: usize) -> f64 {
        match self.values.get(index) {
            Some(v) => *v,
            None => self.values.last().copied().unwrap_or(0.0),
        }
    }

    /// Value at `index` only if it was given explicitly.
    pub fn explicit(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for Lengths {
    fn default() -> Self {
        Self::px([0.0])
    }
}

/// Screen rectangle the graph is drawn into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn origin(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    pub fn size(&self) -> DVec2 {
        DVec2::new(self.width, self.height)
    }

    pub fn center(&self) -> DVec2 {
        self.origin() + self.size() * 0.5
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphMetrics {
    /// Lowest corner of the graph bounding box.
    pub lo: DVec3,
    /// Highest corner of the graph bounding box.
    pub hi: DVec3,
    /// `hi - lo`.
    pub size: DVec3,
    /// Length of the bounding box diagonal.
    pub diagonal: f64,
    pub viewport: Viewport,
    /// Lowest visible graph point under the current transform.
    pub lo_visible: DVec2,
    /// Highest visible graph point under the current transform.
    pub hi_visible: DVec2,
    /// Pixels per graph unit.
    pub ratio_px2gu: f64,
    /// One pixel in graph units.
    pub px1: f64,
}

impl Default for GraphMetrics {
    fn default() -> Self {
        Self {
            lo: DVec3::ZERO,
            hi: DVec3::ZERO,
            size: DVec3::ZERO,
            diagonal: 0.0,
            viewport: Viewport::default(),
            lo_visible: DVec2::ZERO,
            hi_visible: DVec2::ZERO,
            ratio_px2gu: 1.0,
            px1: 1.0,
        }
    }
}

impl GraphMetrics {
    /// Sets the graph bounding box from two corners.
    pub fn set_bounds(&mut self, lo: DVec3, hi: DVec3) {
        self.lo = lo.min(hi);
        self.hi = lo.max(hi);
        self.size = self.hi - self.lo;
        self.diagonal = self.size.length();
    }

    pub fn set_viewport(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.viewport = Viewport {
            x,
            y,
            width,
            height,
        };
    }

    pub fn set_ratio_px2gu(&mut self, ratio: f64) {
        self.ratio_px2gu = ratio;
        self.px1 = if ratio != 0.0 { 1.0 / ratio } else { 1.0 };
    }

    pub fn graph_width_gu(&self) -> f64 {
        self.size.x
    }

    pub fn graph_height_gu(&self) -> f64 {
        self.size.y
    }

    /// Centre of the bounding box in the XY plane.
    pub fn graph_center(&self) -> DVec2 {
        self.lo.truncate() + self.size.truncate() * 0.5
    }

    /// Converts a length to graph units.
    pub fn length_to_gu(&self, value: f64, units: Units) -> f64 {
        match units {
            Units::Gu => value,
            Units::Px => value * self.px1,
            Units::Percents => self.diagonal * value / 100.0,
        }
    }

    /// Converts a length to pixels.
    pub fn length_to_px(&self, value: f64, units: Units) -> f64 {
        match units {
            Units::Px => value,
            Units::Gu => value * self.ratio_px2gu,
            Units::Percents => self.diagonal * value / 100.0 * self.ratio_px2gu,
        }
    }

    /// [`length_to_gu`](Self::length_to_gu) of `lengths[index]`.
    pub fn lengths_to_gu(&self, lengths: &Lengths, index: usize) -> f64 {
        self.length_to_gu(lengths.get(index), lengths.units)
    }

    /// [`length_to_px`](Self::length_to_px) of `lengths[index]`.
    pub fn lengths_to_px(&self, lengths: &Lengths, index: usize) -> f64 {
        self.length_to_px(lengths.get(index), lengths.units)
    }

    /// Half extents in pixels of a `(width[, height])` size.
    pub fn half_extents_px(&self, size: &Lengths) -> DVec2 {
        let w2 = self.lengths_to_px(size, 0) / 2.0;
        let h2 = match size.explicit(1) {
            Some(h) => self.length_to_px(h, size.units) / 2.0,
            None => w2,
        };
        DVec2::new(w2, h2)
    }
}

impl fmt::Display for GraphMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lo={} hi={} diagonal={:.3} viewport=({}, {}, {}, {}) ratio={:.4}",
            self.lo,
            self.hi,
            self.diagonal,
            self.viewport.x,
            self.viewport.y,
            self.viewport.width,
            self.viewport.height,
            self.ratio_px2gu
        )
    }
}
