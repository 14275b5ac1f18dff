use std::collections::HashSet;

use glam::{DAffine2, DVec2};

use super::{ElementRenderer, FrameContext};
use crate::bounds::BoundsContext;
use crate::error::CanvasError;
use crate::geometry;
use crate::icon_layout::{self, IconSlot};
use crate::model::{EdgeKey, ElementKey, GraphicEdge};
use crate::render::{DrawSurface, Shape};
use crate::style::{ArrowShape, ResolvedStyle};

/// Draws edges between the recorded bounds of their nodes.
///
/// Lines stop at node boundaries. Parallel edges (an edge group) are drawn
/// once per frame: the first member draws the line, one arrow per direction
/// and the icons of the whole group at the shared midpoint.
#[derive(Debug, Default)]
pub struct EdgeRenderer {
    rendered: HashSet<EdgeKey>,
}

impl EdgeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a grouped edge has already been drawn this frame.
    pub fn is_rendered(&self, edge: EdgeKey) -> bool {
        self.rendered.contains(&edge)
    }

    fn endpoints(ctx: &FrameContext<'_>, edge: &GraphicEdge) -> Option<(BoundsContext, BoundsContext)> {
        let from = ctx.graph.node(edge.from)?;
        let to = ctx.graph.node(edge.to)?;
        let c0 = ctx.camera.element(&from.id)?.clone();
        let c1 = ctx.camera.element(&to.id)?.clone();
        Some((c0, c1))
    }

    fn draw_arrow(
        ctx: &FrameContext<'_>,
        style: &ResolvedStyle,
        edge: &GraphicEdge,
        surface: &mut dyn DrawSurface,
    ) -> Result<(), CanvasError> {
        if !edge.directed || style.arrow_shape == ArrowShape::None {
            return Ok(());
        }
        if style.arrow_length <= 0.0 || style.arrow_width <= 0.0 {
            return Ok(());
        }
        let Some((c0, c1)) = Self::endpoints(ctx, edge) else {
            return Ok(());
        };

        let head = c1.position();
        let tail = match edge.control_points {
            Some([_, c2]) => ctx.camera.graph_to_screen(c2),
            None => c0.position(),
        };
        let Some(mut tip) = c1.intersects(tail.x, tail.y, head.x, head.y) else {
            return Ok(());
        };

        let delta = head - tail;
        tip -= delta.normalize_or_zero() * ctx.config.arrow_padding;

        let degrees = if geometry::approximately_equals(delta.y, 0.0, geometry::ARROW_AXIS_EPSILON) {
            if delta.x > 0.0 { 90.0 } else { 270.0 }
        } else {
            90.0 + delta.y.atan2(delta.x).to_degrees()
        };
        let local = DAffine2::from_translation(tip) * DAffine2::from_angle(f64::to_radians(degrees));
        let half_width = style.arrow_width / 2.0;
        let left = local.transform_point2(DVec2::new(-half_width, style.arrow_length));
        let right = local.transform_point2(DVec2::new(half_width, style.arrow_length));

        let arrow = Shape::Polygon(vec![left, tip, right]);
        surface.set_transform(DAffine2::IDENTITY);
        if style.fills() {
            surface.set_fill(style.fill);
            surface.fill_shape(&arrow)?;
        }
        if style.strokes() {
            surface.stroke_shape(&arrow)?;
        }
        Ok(())
    }

    fn draw_icons(
        ctx: &mut FrameContext<'_>,
        style: &ResolvedStyle,
        edges: &[EdgeKey],
        midpoint: DVec2,
        surface: &mut dyn DrawSurface,
    ) -> Result<(), CanvasError> {
        let graph = ctx.graph;
        let names = edges
            .iter()
            .filter_map(|k| graph.edge(*k))
            .filter_map(|e| style.icon.icon_for(&e.attributes));
        let slots = icon_layout::collect_icons(names, ctx.config.icon_cap);
        let Some(panel) = icon_layout::layout_panel(slots.len(), style.size, style.padding, midpoint) else {
            return Ok(());
        };

        let background = Shape::RoundRect {
            pos: panel.bounds.min,
            size: panel.bounds.size(),
            radius: ctx.config.icon_panel_corner_radius,
        };
        surface.set_transform(DAffine2::IDENTITY);
        if style.fills() {
            surface.set_fill(style.fill);
            surface.fill_shape(&background)?;
        }
        if style.strokes() {
            surface.stroke_shape(&background)?;
        }

        let (w, h) = (style.size.x.round() as u32, style.size.y.round() as u32);
        for (slot, cell) in slots.iter().zip(&panel.cells) {
            let name = match slot {
                IconSlot::Named(name) => name.as_str(),
                IconSlot::Overflow => ctx.config.overflow_icon.as_str(),
            };
            match ctx.icons.resolve(name, w, h) {
                Some(icon) => surface.draw_image(&icon, *cell)?,
                None if *slot == IconSlot::Overflow => {
                    surface.set_fill(style.text.color);
                    surface.fill_text("+", *cell + DVec2::new(0.0, style.size.y))?;
                    surface.set_fill(style.fill);
                }
                None => {}
            }
        }
        Ok(())
    }
}

impl ElementRenderer for EdgeRenderer {
    fn begin_frame(&mut self) {
        self.rendered.clear();
    }

    fn compute_bounds(&self, _ctx: &FrameContext<'_>, _style: &ResolvedStyle, _key: ElementKey) -> Option<BoundsContext> {
        None
    }

    fn element_invisible(&mut self, _ctx: &mut FrameContext<'_>, key: ElementKey) {
        if let ElementKey::Edge(k) = key {
            self.rendered.remove(&k);
        }
    }

    fn render_element(
        &mut self,
        ctx: &mut FrameContext<'_>,
        style: &ResolvedStyle,
        key: ElementKey,
        surface: &mut dyn DrawSurface,
    ) -> Result<(), CanvasError> {
        let ElementKey::Edge(k) = key else {
            return Ok(());
        };
        let graph = ctx.graph;
        let Some(edge) = graph.edge(k) else {
            return Ok(());
        };
        // Nodes not drawn yet this frame.
        let Some((c0, c1)) = Self::endpoints(ctx, edge) else {
            return Ok(());
        };
        let group = graph.edge_group(k);
        if group.is_some() && self.rendered.contains(&k) {
            return Ok(());
        }

        let (pos0, pos1) = (c0.position(), c1.position());
        surface.set_transform(DAffine2::IDENTITY);
        surface.set_stroke(style.stroke, style.line_width());
        match edge.control_points {
            Some([a, b]) => {
                let cp1 = ctx.camera.graph_to_screen(a);
                let cp2 = ctx.camera.graph_to_screen(b);
                let start = c0.intersects(pos0.x, pos0.y, cp1.x, cp1.y).unwrap_or(pos0);
                let end = c1.intersects(pos1.x, pos1.y, cp2.x, cp2.y).unwrap_or(pos1);
                surface.stroke_bezier(start, cp1, cp2, end)?;
            }
            None => {
                let start = c0.intersects(pos0.x, pos0.y, pos1.x, pos1.y).unwrap_or(pos0);
                let end = c1.intersects(pos1.x, pos1.y, pos0.x, pos0.y).unwrap_or(pos1);
                surface.stroke_line(start, end)?;
            }
        }

        match &group {
            Some(members) => {
                // One arrow per source node: the first directed member from it.
                let mut sources = Vec::new();
                let pending = members
                    .iter()
                    .filter(|m| **m == k || !self.rendered.contains(*m))
                    .filter_map(|m| graph.edge(*m));
                for member in pending {
                    if member.directed && !sources.contains(&member.from) {
                        sources.push(member.from);
                        Self::draw_arrow(ctx, style, member, surface)?;
                    }
                }
            }
            None => Self::draw_arrow(ctx, style, edge, surface)?,
        }

        let midpoint = (pos0 + pos1) * 0.5;
        let members = group.clone().unwrap_or_else(|| vec![k]);
        Self::draw_icons(ctx, style, &members, midpoint, surface)?;

        if let Some(members) = group {
            self.rendered.extend(members);
        }
        Ok(())
    }
}
