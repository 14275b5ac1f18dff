//! # Style
//!
//! Pre-resolved presentation properties for groups of elements.
//!
//! A [`StyleGroup`] is what the renderers receive per z-layer: a base [`Style`]
//! plus replacement styles for interactive events. Before drawing, a style is
//! turned into a [`ResolvedStyle`] for the current frame (lengths in pixels,
//! colours picked, text size scaled) and that value is passed explicitly down
//! the render calls.

use std::collections::BTreeMap;

use glam::{DVec2, Vec4};
use serde::{Deserialize, Serialize};

use crate::config::RendererConfig;
use crate::geometry;
use crate::metrics::{GraphMetrics, Lengths, Units};
use crate::model::{Attributes, ColorAttr};
use crate::render::Font;

const BLACK: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);

/// Which kind of element a style group applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Graph,
    Node,
    Edge,
    Sprite,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillMode {
    None,
    #[default]
    Plain,
    /// Per-element colour picked from the fill colours by the element's `color`.
    DynPlain,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrokeMode {
    #[default]
    None,
    Plain,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeMode {
    #[default]
    Normal,
    /// Per-element size read from the element's `size` attribute.
    DynSize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeShape {
    #[default]
    Circle,
    Box,
    RoundedBox,
    /// A box rotated by 45 degrees.
    Diamond,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IconMode {
    #[default]
    None,
    /// The same icon for every element of the group.
    Named(String),
    /// Icon named by each element's `icon` attribute.
    Dynamic,
}

impl IconMode {
    /// Icon name for an element with the given attributes.
    pub fn icon_for<'a>(&'a self, attributes: &'a Attributes) -> Option<&'a str> {
        match self {
            IconMode::None => None,
            IconMode::Named(name) if name.is_empty() => None,
            IconMode::Named(name) => Some(name.as_str()),
            IconMode::Dynamic => attributes.icon.as_deref(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextMode {
    #[default]
    Normal,
    Hidden,
}

/// Zoom levels at which labels are drawn. Thresholds come from
/// [`Style::text_visibility`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextVisibilityMode {
    #[default]
    Normal,
    Hidden,
    AtZoom,
    UnderZoom,
    OverZoom,
    ZoomRange,
    Zooms,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlignment {
    #[default]
    Center,
    Left,
    Right,
    AtLeft,
    AtRight,
    Under,
    Above,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextStyle {
    #[default]
    Normal,
    Bold,
    Italic,
    BoldItalic,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrowShape {
    None,
    #[default]
    Arrow,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisibilityMode {
    #[default]
    Normal,
    Hidden,
}

/// Presentation properties shared by the elements of a group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub fill_mode: FillMode,
    pub fill_colors: Vec<Vec4>,
    pub stroke_mode: StrokeMode,
    pub stroke_color: Vec4,
    pub stroke_width: Lengths,
    /// `(width[, height])`.
    pub size: Lengths,
    pub size_mode: SizeMode,
    pub shape: NodeShape,
    pub icon: IconMode,
    /// `(x[, y])`.
    pub padding: Lengths,
    pub arrow_shape: ArrowShape,
    /// `(length[, width])`.
    pub arrow_size: Lengths,
    pub visibility_mode: VisibilityMode,
    pub text_mode: TextMode,
    pub text_visibility_mode: TextVisibilityMode,
    pub text_visibility: Vec<f64>,
    pub text_alignment: TextAlignment,
    pub text_size: f64,
    pub text_color: Vec4,
    pub text_font: String,
    pub text_style: TextStyle,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill_mode: FillMode::Plain,
            fill_colors: vec![BLACK],
            stroke_mode: StrokeMode::None,
            stroke_color: BLACK,
            stroke_width: Lengths::px([1.0]),
            size: Lengths::px([10.0]),
            size_mode: SizeMode::Normal,
            shape: NodeShape::Circle,
            icon: IconMode::None,
            padding: Lengths::px([0.0]),
            arrow_shape: ArrowShape::Arrow,
            arrow_size: Lengths::px([8.0, 4.0]),
            visibility_mode: VisibilityMode::Normal,
            text_mode: TextMode::Normal,
            text_visibility_mode: TextVisibilityMode::Normal,
            text_visibility: Vec::new(),
            text_alignment: TextAlignment::Center,
            text_size: 10.0,
            text_color: BLACK,
            text_font: "default".to_string(),
            text_style: TextStyle::Normal,
        }
    }
}

impl Style {
    /// Default style of the graph itself: white background, no border.
    pub fn graph_default() -> Self {
        Self {
            fill_colors: vec![Vec4::ONE],
            ..Self::default()
        }
    }
}

/// A set of elements sharing one style, drawn together in z order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleGroup {
    pub id: String,
    pub kind: ElementKind,
    pub z_index: i32,
    pub style: Style,
    /// Replacement styles keyed by event name (e.g. `clicked`).
    #[serde(default)]
    pub event_styles: BTreeMap<String, Style>,
}

impl StyleGroup {
    pub fn new(id: impl Into<String>, kind: ElementKind, style: Style) -> Self {
        Self {
            id: id.into(),
            kind,
            z_index: 0,
            style,
            event_styles: BTreeMap::new(),
        }
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_event_style(mut self, event: impl Into<String>, style: Style) -> Self {
        self.event_styles.insert(event.into(), style);
        self
    }

    /// Style in effect while `events` are active; the last event with a
    /// registered style wins.
    pub fn style_for_events(&self, events: &[String]) -> &Style {
        events
            .iter()
            .rev()
            .find_map(|e| self.event_styles.get(e))
            .unwrap_or(&self.style)
    }
}

/// Text settings of a resolved style.
#[derive(Clone, Debug, PartialEq)]
pub struct TextPaint {
    pub mode: TextMode,
    pub visibility_mode: TextVisibilityMode,
    pub visibility: Vec<f64>,
    pub alignment: TextAlignment,
    pub color: Vec4,
    pub font: Font,
}

impl TextPaint {
    pub fn size(&self) -> f64 {
        self.font.size
    }

    /// Whether labels are drawn at `zoom`.
    ///
    /// Zoom modes without thresholds fall back to `default_threshold`.
    pub fn visible_at(&self, zoom: f64, default_threshold: f64) -> bool {
        let first = self.visibility.first().copied().unwrap_or(default_threshold);
        let near = |z: f64| geometry::approx_eq(zoom, z);
        match self.visibility_mode {
            TextVisibilityMode::Normal => true,
            TextVisibilityMode::Hidden => false,
            TextVisibilityMode::AtZoom => near(first),
            TextVisibilityMode::OverZoom => zoom >= first || near(first),
            TextVisibilityMode::UnderZoom => zoom <= first || near(first),
            TextVisibilityMode::ZoomRange => {
                let max = self.visibility.get(1).copied().unwrap_or(first);
                (first <= zoom && zoom <= max) || near(first) || near(max)
            }
            TextVisibilityMode::Zooms => {
                if self.visibility.is_empty() {
                    near(default_threshold)
                } else {
                    self.visibility.iter().any(|z| near(*z))
                }
            }
        }
    }
}

/// A style resolved against the current frame: lengths in pixels, colours
/// picked. Built once per pass by [`resolve`](Self::resolve) and refined per
/// element by [`with_dynamic`](Self::with_dynamic).
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedStyle {
    pub fill_mode: FillMode,
    pub fill: Vec4,
    pub fill_colors: Vec<Vec4>,
    pub stroke_mode: StrokeMode,
    pub stroke: Vec4,
    pub stroke_width: f64,
    pub size_mode: SizeMode,
    size_units: Units,
    /// Element extent in pixels.
    pub size: DVec2,
    /// Per-element size from the dynamic pass, in pixels.
    pub dynamic_size: Option<f64>,
    pub padding: DVec2,
    pub shape: NodeShape,
    pub icon: IconMode,
    pub arrow_shape: ArrowShape,
    pub arrow_length: f64,
    pub arrow_width: f64,
    pub text: TextPaint,
}

impl ResolvedStyle {
    pub fn resolve(style: &Style, metrics: &GraphMetrics, zoom: f64, config: &RendererConfig) -> Self {
        let width = size_to_px(metrics, style.size.get(0), style.size.units);
        let height = match style.size.explicit(1) {
            Some(h) => size_to_px(metrics, h, style.size.units),
            None => width,
        };
        let pad_x = metrics.lengths_to_px(&style.padding, 0);
        let pad_y = metrics.lengths_to_px(&style.padding, 1);
        let arrow_length = metrics.lengths_to_px(&style.arrow_size, 0);
        let arrow_width = match style.arrow_size.explicit(1) {
            Some(w) => metrics.length_to_px(w, style.arrow_size.units),
            None => arrow_length,
        };

        let text_size = if config.auto_scale {
            scaled_text_size(style.text_size, zoom, config)
        } else {
            style.text_size
        };

        Self {
            fill_mode: style.fill_mode,
            fill: style.fill_colors.first().copied().unwrap_or(BLACK),
            fill_colors: style.fill_colors.clone(),
            stroke_mode: style.stroke_mode,
            stroke: style.stroke_color,
            stroke_width: metrics.lengths_to_px(&style.stroke_width, 0),
            size_mode: style.size_mode,
            size_units: style.size.units,
            size: DVec2::new(width, height),
            dynamic_size: None,
            padding: DVec2::new(pad_x, pad_y),
            shape: style.shape,
            icon: style.icon.clone(),
            arrow_shape: style.arrow_shape,
            arrow_length,
            arrow_width,
            text: TextPaint {
                mode: style.text_mode,
                visibility_mode: style.text_visibility_mode,
                visibility: style.text_visibility.clone(),
                alignment: style.text_alignment,
                color: style.text_color,
                font: Font {
                    family: style.text_font.clone(),
                    size: text_size,
                    style: style.text_style,
                },
            },
        }
    }

    /// Applies an element's dynamic attributes: interpolated fill colour for
    /// [`FillMode::DynPlain`] and per-element size for [`SizeMode::DynSize`].
    pub fn with_dynamic(&self, attributes: &Attributes, metrics: &GraphMetrics) -> Self {
        let mut resolved = self.clone();
        if self.fill_mode == FillMode::DynPlain {
            resolved.fill = interpolate_color(&self.fill_colors, attributes.color.as_ref());
        }
        if self.size_mode == SizeMode::DynSize {
            if let Some(size) = attributes.size {
                let px = size_to_px(metrics, size, self.size_units);
                resolved.size = DVec2::splat(px);
                resolved.dynamic_size = Some(px);
            }
        }
        resolved
    }

    pub fn fills(&self) -> bool {
        self.fill_mode != FillMode::None
    }

    pub fn strokes(&self) -> bool {
        self.stroke_mode != StrokeMode::None
    }

    /// Line width for edges: the dynamic size when set, else the stroke width.
    pub fn line_width(&self) -> f64 {
        self.dynamic_size.unwrap_or(self.stroke_width)
    }
}

/// Element sizes: graph units follow the transform, other units are pixels.
fn size_to_px(metrics: &GraphMetrics, value: f64, units: Units) -> f64 {
    match units {
        Units::Gu => metrics.length_to_px(value, Units::Gu),
        Units::Px | Units::Percents => value,
    }
}

/// Label size for `zoom`: grows while zoomed out, shrinks while zoomed in,
/// clamped to the configured font range.
pub fn scaled_text_size(size: f64, zoom: f64, config: &RendererConfig) -> f64 {
    let scaled = if zoom <= 1.0 {
        (size + (1.0 - zoom) * size).min(config.max_font_size)
    } else {
        (size - (zoom - 1.0) * size).max(config.min_font_size)
    };
    scaled.round()
}

/// Node size multiplier under auto-scale: up to 1.5 when zoomed out, down to
/// 0.5 when zoomed in.
pub fn auto_scale_factor(zoom: f64) -> f64 {
    if zoom <= 1.0 {
        (1.0 + (1.0 - zoom) * 0.5).min(1.5)
    } else {
        (1.0 - (zoom - 1.0) * 0.5).max(0.5)
    }
}

/// Picks the fill colour for a dynamically coloured element.
///
/// A numeric `color` in `[0, 1]` interpolates along `colors`; an explicit
/// colour is used as is; anything else yields the first colour.
pub fn interpolate_color(colors: &[Vec4], attribute: Option<&ColorAttr>) -> Vec4 {
    let n = colors.len();
    let first = colors.first().copied().unwrap_or(BLACK);
    match attribute {
        Some(ColorAttr::Color(c)) => *c,
        Some(ColorAttr::Value(v)) if n > 1 => {
            let value = v.clamp(0.0, 1.0);
            if value >= 1.0 {
                return colors[n - 1];
            }
            if value <= 0.0 {
                return first;
            }
            let div = 1.0 / (n - 1) as f64;
            let col = ((value / div) as usize).min(n - 2);
            let t = ((value - div * col as f64) / div) as f32;
            colors[col].lerp(colors[col + 1], t)
        }
        _ => first,
    }
}
