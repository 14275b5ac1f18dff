use std::f64::consts::SQRT_2;

use glam::{DAffine2, DVec2};

use super::{ElementRenderer, FrameContext, shape_for, shape_transform};
use crate::bounds::BoundsContext;
use crate::error::CanvasError;
use crate::model::ElementKey;
use crate::render::DrawSurface;
use crate::style::{NodeShape, ResolvedStyle, auto_scale_factor};

/// Draws nodes as circles, boxes, rounded boxes or diamonds, with an optional
/// centred icon.
#[derive(Debug, Default)]
pub struct NodeRenderer;

impl NodeRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Drawn size in pixels, before padding.
    fn extent(ctx: &FrameContext<'_>, style: &ResolvedStyle) -> DVec2 {
        if ctx.config.auto_scale {
            style.size * auto_scale_factor(ctx.camera.view_percent())
        } else {
            style.size
        }
    }
}

impl ElementRenderer for NodeRenderer {
    fn compute_bounds(&self, ctx: &FrameContext<'_>, style: &ResolvedStyle, key: ElementKey) -> Option<BoundsContext> {
        let ElementKey::Node(k) = key else {
            return None;
        };
        let node = ctx.graph.node(k)?;
        let pos = ctx.camera.graph_to_screen(node.position.truncate());
        let half = Self::extent(ctx, style) / 2.0;
        let pad = style.padding;

        let context = match style.shape {
            NodeShape::Box | NodeShape::RoundedBox => BoundsContext::rect(&node.id, pos, half + pad),
            // The rotated square reaches half * sqrt(2) along both axes.
            NodeShape::Diamond => BoundsContext::rect(&node.id, pos, half * SQRT_2 + pad),
            NodeShape::Circle => BoundsContext::ellipse(&node.id, pos, half.x + pad.x, half.y + pad.y),
        };
        context.ok()
    }

    fn element_invisible(&mut self, ctx: &mut FrameContext<'_>, key: ElementKey) {
        if let Some(id) = ctx.graph.element_id(key) {
            ctx.camera.remove_element(id);
        }
    }

    fn render_element(
        &mut self,
        ctx: &mut FrameContext<'_>,
        style: &ResolvedStyle,
        key: ElementKey,
        surface: &mut dyn DrawSurface,
    ) -> Result<(), CanvasError> {
        let ElementKey::Node(k) = key else {
            return Ok(());
        };
        let graph = ctx.graph;
        let Some(node) = graph.node(k) else {
            return Ok(());
        };
        let Some(bounds) = ctx.camera.element(&node.id).cloned() else {
            return Ok(());
        };

        let extent = Self::extent(ctx, style);
        let size = match style.shape {
            NodeShape::Diamond => extent + style.padding * 2.0,
            _ => bounds.rect_bounds().size(),
        };
        let shape = shape_for(style.shape, size, ctx.config.round_box_corner_radius);

        surface.set_transform(shape_transform(style.shape, bounds.position()));
        if style.fills() {
            surface.fill_shape(&shape)?;
        }
        if style.strokes() {
            surface.stroke_shape(&shape)?;
        }
        surface.set_transform(DAffine2::IDENTITY);

        if let Some(name) = style.icon.icon_for(&node.attributes) {
            let (w, h) = (extent.x.round() as u32, extent.y.round() as u32);
            if let Some(icon) = ctx.icons.resolve(name, w, h) {
                let half = DVec2::new(f64::from(icon.width), f64::from(icon.height)) / 2.0;
                surface.draw_image(&icon, bounds.position() - half)?;
            }
        }
        Ok(())
    }
}
