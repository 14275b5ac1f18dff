use glam::DAffine2;

use super::{ElementRenderer, FrameContext, shape_for, shape_transform};
use crate::bounds::BoundsContext;
use crate::error::CanvasError;
use crate::metrics::Units;
use crate::model::ElementKey;
use crate::render::DrawSurface;
use crate::style::ResolvedStyle;

/// Draws sprites at their attachment-aware position.
#[derive(Debug, Default)]
pub struct SpriteRenderer;

impl SpriteRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ElementRenderer for SpriteRenderer {
    fn compute_bounds(&self, ctx: &FrameContext<'_>, style: &ResolvedStyle, key: ElementKey) -> Option<BoundsContext> {
        let ElementKey::Sprite(k) = key else {
            return None;
        };
        let sprite = ctx.graph.sprite(k)?;
        let pos = ctx.camera.sprite_position(ctx.graph, k, Units::Px)?;
        let half = style.size / 2.0;
        BoundsContext::ellipse(&sprite.id, pos, half.x, half.y).ok()
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
        let ElementKey::Sprite(k) = key else {
            return Ok(());
        };
        let Some(sprite) = ctx.graph.sprite(k) else {
            return Ok(());
        };
        let Some(bounds) = ctx.camera.element(&sprite.id) else {
            return Ok(());
        };

        let shape = shape_for(style.shape, style.size, ctx.config.round_box_corner_radius);
        surface.set_transform(shape_transform(style.shape, bounds.position()));
        if style.fills() {
            surface.fill_shape(&shape)?;
        }
        if style.strokes() {
            surface.stroke_shape(&shape)?;
        }
        surface.set_transform(DAffine2::IDENTITY);
        Ok(())
    }
}
