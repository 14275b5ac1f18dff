//! # Element Renderers
//!
//! One [`ElementRenderer`] per element kind. [`render_group`] drives a renderer
//! through one style group in three passes:
//!
//! 1. **bulk** elements with the group style;
//! 2. **dynamic** elements, each with the group style refined by its own
//!    attributes (elements with active events are left to the next pass);
//! 3. **event** elements, each with the style of its active events.
//!
//! Each pass draws shapes first and labels second, so labels sit above the
//! shapes of their group. Visible elements get their screen bounds recorded in
//! the camera before they are drawn.

mod edge;
mod node;
mod sprite;

pub use edge::EdgeRenderer;
pub use node::NodeRenderer;
pub use sprite::SpriteRenderer;

use std::f64::consts::FRAC_PI_4;

use glam::{DAffine2, DVec2};

use crate::bounds::BoundsContext;
use crate::camera::Camera;
use crate::config::RendererConfig;
use crate::error::{CanvasError, SurfaceError};
use crate::icons::IconResolver;
use crate::metrics::Units;
use crate::model::{ElementKey, GraphicGraph, GroupElements, StyleGroupKey};
use crate::render::{DrawSurface, Shape};
use crate::style::{NodeShape, ResolvedStyle, Style, TextAlignment, TextMode, TextVisibilityMode};

/// Everything a renderer may touch while drawing one frame.
pub struct FrameContext<'a> {
    pub graph: &'a GraphicGraph,
    pub camera: &'a mut Camera,
    pub icons: &'a mut dyn IconResolver,
    pub config: &'a RendererConfig,
}

impl FrameContext<'_> {
    /// Resolves a style against the current transform and zoom.
    pub fn resolve_style(&self, style: &Style) -> ResolvedStyle {
        ResolvedStyle::resolve(style, self.camera.metrics(), self.camera.view_percent(), self.config)
    }

    /// Screen position of an element: node centre, sprite anchor, or edge midpoint.
    pub fn screen_position(&self, key: ElementKey) -> Option<DVec2> {
        match key {
            ElementKey::Node(k) => {
                let node = self.graph.node(k)?;
                Some(self.camera.graph_to_screen(node.position.truncate()))
            }
            ElementKey::Sprite(k) => self.camera.sprite_position(self.graph, k, Units::Px),
            ElementKey::Edge(k) => {
                let edge = self.graph.edge(k)?;
                let a = self.graph.node(edge.from)?.position.truncate();
                let b = self.graph.node(edge.to)?.position.truncate();
                Some(self.camera.graph_to_screen((a + b) * 0.5))
            }
        }
    }
}

/// Draws one kind of element.
pub trait ElementRenderer {
    /// Clears per-frame state.
    fn begin_frame(&mut self) {}

    /// Screen footprint of a visible element, recorded before it is drawn.
    /// `None` for elements that cannot be hit.
    fn compute_bounds(&self, ctx: &FrameContext<'_>, style: &ResolvedStyle, key: ElementKey) -> Option<BoundsContext>;

    fn render_element(
        &mut self,
        ctx: &mut FrameContext<'_>,
        style: &ResolvedStyle,
        key: ElementKey,
        surface: &mut dyn DrawSurface,
    ) -> Result<(), CanvasError>;

    /// Called instead of drawing when an element is culled.
    fn element_invisible(&mut self, ctx: &mut FrameContext<'_>, key: ElementKey) {
        let _ = (ctx, key);
    }
}

/// Applies a resolved style to the surface.
pub fn push_style(surface: &mut dyn DrawSurface, style: &ResolvedStyle) {
    surface.set_fill(style.fill);
    surface.set_stroke(style.stroke, style.stroke_width);
    surface.set_font(style.text.font.clone());
}

fn draw_element(
    renderer: &mut dyn ElementRenderer,
    ctx: &mut FrameContext<'_>,
    style: &ResolvedStyle,
    key: ElementKey,
    surface: &mut dyn DrawSurface,
) -> Result<(), CanvasError> {
    if let Some(bounds) = renderer.compute_bounds(ctx, style, key) {
        ctx.camera.put_element(bounds);
    }
    renderer.render_element(ctx, style, key, surface)
}

/// Renders the `elements` of a style group with the three-pass protocol.
pub fn render_group(
    renderer: &mut dyn ElementRenderer,
    ctx: &mut FrameContext<'_>,
    group: StyleGroupKey,
    elements: &GroupElements,
    surface: &mut dyn DrawSurface,
) -> Result<(), CanvasError> {
    let graph = ctx.graph;
    let style_group = graph.style_group(group).ok_or(CanvasError::UnknownStyleGroup)?;
    let base = ctx.resolve_style(&style_group.style);

    // Bulk
    push_style(surface, &base);
    let mut labels = Vec::new();
    for &key in &elements.bulk {
        if ctx.camera.is_visible(graph, key) {
            draw_element(renderer, ctx, &base, key, surface)?;
            labels.push(key);
        } else {
            renderer.element_invisible(ctx, key);
        }
    }
    for key in labels {
        render_text(ctx, &base, key, surface)?;
    }

    // Dynamic
    push_style(surface, &base);
    let mut labels = Vec::new();
    for &key in &elements.dynamic {
        if !ctx.camera.is_visible(graph, key) {
            renderer.element_invisible(ctx, key);
            continue;
        }
        let Some(element) = graph.element(key) else {
            continue;
        };
        if element.has_events() {
            continue;
        }
        let style = base.with_dynamic(element.attributes, ctx.camera.metrics());
        push_style(surface, &style);
        draw_element(renderer, ctx, &style, key, surface)?;
        labels.push((key, style));
    }
    for (key, style) in &labels {
        render_text(ctx, style, *key, surface)?;
    }

    // Events
    push_style(surface, &base);
    let mut labels = Vec::new();
    for &key in &elements.event {
        if !ctx.camera.is_visible(graph, key) {
            renderer.element_invisible(ctx, key);
            continue;
        }
        let Some(element) = graph.element(key) else {
            continue;
        };
        let active = ctx.resolve_style(style_group.style_for_events(element.events));
        let style = active.with_dynamic(element.attributes, ctx.camera.metrics());
        push_style(surface, &style);
        draw_element(renderer, ctx, &style, key, surface)?;
        labels.push((key, style));
    }
    for (key, style) in &labels {
        render_text(ctx, style, *key, surface)?;
    }

    Ok(())
}

/// Draws an element's label. Returns whether anything was drawn.
pub fn render_text(
    ctx: &FrameContext<'_>,
    style: &ResolvedStyle,
    key: ElementKey,
    surface: &mut dyn DrawSurface,
) -> Result<bool, SurfaceError> {
    let text = &style.text;
    if text.mode == TextMode::Hidden || text.visibility_mode == TextVisibilityMode::Hidden {
        return Ok(false);
    }
    if text.size() <= ctx.config.min_font_size {
        return Ok(false);
    }
    let Some(element) = ctx.graph.element(key) else {
        return Ok(false);
    };
    let Some(label) = element.label.filter(|l| !l.is_empty()) else {
        return Ok(false);
    };
    if !text.visible_at(ctx.camera.view_percent(), ctx.config.default_text_visibility) {
        return Ok(false);
    }
    let Some(pos) = ctx.screen_position(key) else {
        return Ok(false);
    };

    let extent = ctx
        .camera
        .element(element.id)
        .map(|c| c.rect_bounds().size().max(DVec2::ONE))
        .unwrap_or(DVec2::ZERO);

    surface.set_transform(DAffine2::IDENTITY);
    surface.set_font(text.font.clone());
    let width = surface.measure_text(label);
    let size = text.size();

    let mut at = DVec2::new(pos.x, pos.y + size / 3.0);
    match text.alignment {
        TextAlignment::Center => at.x -= width / 2.0,
        TextAlignment::Left => at.x -= width,
        TextAlignment::Right => {}
        TextAlignment::AtLeft => at.x -= width + extent.x / 2.0,
        TextAlignment::AtRight => at.x += extent.x / 2.0,
        TextAlignment::Under => {
            at.x -= width / 2.0;
            at.y += extent.y / 2.0 + size;
        }
        TextAlignment::Above => {
            at.x -= width / 2.0;
            at.y = pos.y - extent.y / 2.0 - size / 3.0;
        }
    }

    surface.set_fill(text.color);
    surface.fill_text(label, at)?;
    surface.set_fill(style.fill);
    Ok(true)
}

/// Shape of a node or sprite of `size`, centred on the origin.
pub(crate) fn shape_for(shape: NodeShape, size: DVec2, corner_radius: f64) -> Shape {
    match shape {
        NodeShape::Circle => Shape::centered_oval(size),
        NodeShape::Box => Shape::centered_rect(size),
        NodeShape::RoundedBox | NodeShape::Diamond => Shape::centered_round_rect(size, corner_radius),
    }
}

/// Local-to-screen transform for a shape centred on `position`.
pub(crate) fn shape_transform(shape: NodeShape, position: DVec2) -> DAffine2 {
    let translate = DAffine2::from_translation(position);
    match shape {
        NodeShape::Diamond => translate * DAffine2::from_angle(FRAC_PI_4),
        _ => translate,
    }
}
