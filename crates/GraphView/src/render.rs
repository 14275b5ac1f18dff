//! # Rendering System
//!
//! The renderers never draw pixels themselves. They talk to a [`DrawSurface`],
//! a stateful 2D context in the manner of a canvas: set a transform, a fill, a
//! stroke and a font, then issue shapes, lines, images and text.
//!
//! [`RenderList`] is the built-in surface. It records a display list of
//! [`DrawCommand`]s that the host application (Egui, WGPU, etc.) interprets.

use glam::{DAffine2, DVec2, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::SurfaceResult;
use crate::geometry::Rect;
use crate::icons::IconImage;
use crate::style::TextStyle;

/// A closed shape in the surface's current coordinate system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rect { pos: DVec2, size: DVec2 },
    RoundRect { pos: DVec2, size: DVec2, radius: f64 },
    /// Ellipse inscribed in the rectangle.
    Oval { pos: DVec2, size: DVec2 },
    Polygon(Vec<DVec2>),
}

impl Shape {
    /// Rectangle of `size` centred on the origin.
    pub fn centered_rect(size: DVec2) -> Self {
        Shape::Rect { pos: -size / 2.0, size }
    }

    pub fn centered_oval(size: DVec2) -> Self {
        Shape::Oval { pos: -size / 2.0, size }
    }

    pub fn centered_round_rect(size: DVec2, radius: f64) -> Self {
        Shape::RoundRect {
            pos: -size / 2.0,
            size,
            radius,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Font {
    /// `default` selects the surface's default family.
    pub family: String,
    /// Size in pixels.
    pub size: f64,
    pub style: TextStyle,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: "default".to_string(),
            size: 10.0,
            style: TextStyle::Normal,
        }
    }
}

/// A 2D drawing backend.
///
/// State setters never fail. Drawing operations may be refused by the backend;
/// the error travels up to the frame driver, which drops the current style
/// group and carries on with the next one.
pub trait DrawSurface {
    /// Transform applied to all following drawing operations.
    fn set_transform(&mut self, transform: DAffine2);
    fn set_fill(&mut self, color: Vec4);
    fn set_stroke(&mut self, color: Vec4, width: f64);
    fn set_font(&mut self, font: Font);

    fn fill_shape(&mut self, shape: &Shape) -> SurfaceResult;
    fn stroke_shape(&mut self, shape: &Shape) -> SurfaceResult;
    fn stroke_line(&mut self, start: DVec2, end: DVec2) -> SurfaceResult;
    fn stroke_bezier(&mut self, start: DVec2, cp1: DVec2, cp2: DVec2, end: DVec2) -> SurfaceResult;
    /// Draws an icon with its top-left corner at `top_left`.
    fn draw_image(&mut self, image: &IconImage, top_left: DVec2) -> SurfaceResult;
    /// Draws text with its baseline starting at `pos`, in the fill colour.
    fn fill_text(&mut self, text: &str, pos: DVec2) -> SurfaceResult;
    /// Resets an area to transparent.
    fn clear(&mut self, area: Rect) -> SurfaceResult;

    /// Width of `text` in pixels with the current font.
    fn measure_text(&self, text: &str) -> f64;
}

/// A single recorded drawing primitive.
///
/// Lines, curves, images and text are recorded in screen space. Shapes keep
/// the transform they were drawn with, since a rotated shape has no
/// axis-aligned screen-space form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    Fill {
        shape: Shape,
        transform: DAffine2,
        /// Fill color (RGBA, 0.0 - 1.0).
        color: Vec4,
    },
    Stroke {
        shape: Shape,
        transform: DAffine2,
        color: Vec4,
        width: f64,
    },
    Line {
        start: DVec2,
        end: DVec2,
        color: Vec4,
        width: f64,
    },
    Bezier {
        start: DVec2,
        cp1: DVec2,
        cp2: DVec2,
        end: DVec2,
        color: Vec4,
        width: f64,
    },
    Image {
        image: IconImage,
        /// Top-left position in screen pixels.
        pos: DVec2,
    },
    Text {
        pos: DVec2,
        text: String,
        color: Vec4,
        font: Font,
    },
    Clear {
        area: Rect,
    },
}

/// Recording surface: a list of draw commands representing the current frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RenderList {
    pub commands: Vec<DrawCommand>,
    transform: DAffine2,
    fill: Vec4,
    stroke: Vec4,
    stroke_width: f64,
    font: Font,
}

impl Default for RenderList {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            transform: DAffine2::IDENTITY,
            fill: Vec4::new(0.0, 0.0, 0.0, 1.0),
            stroke: Vec4::new(0.0, 0.0, 0.0, 1.0),
            stroke_width: 1.0,
            font: Font::default(),
        }
    }
}

impl RenderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DrawCommand> {
        self.commands.iter()
    }

    /// Drops the recorded commands, keeping the drawing state.
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn current_fill(&self) -> Vec4 {
        self.fill
    }

    pub fn current_transform(&self) -> DAffine2 {
        self.transform
    }

    fn to_screen(&self, p: DVec2) -> DVec2 {
        self.transform.transform_point2(p)
    }
}

impl DrawSurface for RenderList {
    fn set_transform(&mut self, transform: DAffine2) {
        self.transform = transform;
    }

    fn set_fill(&mut self, color: Vec4) {
        self.fill = color;
    }

    fn set_stroke(&mut self, color: Vec4, width: f64) {
        self.stroke = color;
        self.stroke_width = width;
    }

    fn set_font(&mut self, font: Font) {
        self.font = font;
    }

    fn fill_shape(&mut self, shape: &Shape) -> SurfaceResult {
        self.commands.push(DrawCommand::Fill {
            shape: shape.clone(),
            transform: self.transform,
            color: self.fill,
        });
        Ok(())
    }

    fn stroke_shape(&mut self, shape: &Shape) -> SurfaceResult {
        self.commands.push(DrawCommand::Stroke {
            shape: shape.clone(),
            transform: self.transform,
            color: self.stroke,
            width: self.stroke_width,
        });
        Ok(())
    }

    fn stroke_line(&mut self, start: DVec2, end: DVec2) -> SurfaceResult {
        self.commands.push(DrawCommand::Line {
            start: self.to_screen(start),
            end: self.to_screen(end),
            color: self.stroke,
            width: self.stroke_width,
        });
        Ok(())
    }

    fn stroke_bezier(&mut self, start: DVec2, cp1: DVec2, cp2: DVec2, end: DVec2) -> SurfaceResult {
        self.commands.push(DrawCommand::Bezier {
            start: self.to_screen(start),
            cp1: self.to_screen(cp1),
            cp2: self.to_screen(cp2),
            end: self.to_screen(end),
            color: self.stroke,
            width: self.stroke_width,
        });
        Ok(())
    }

    fn draw_image(&mut self, image: &IconImage, top_left: DVec2) -> SurfaceResult {
        self.commands.push(DrawCommand::Image {
            image: image.clone(),
            pos: self.to_screen(top_left),
        });
        Ok(())
    }

    fn fill_text(&mut self, text: &str, pos: DVec2) -> SurfaceResult {
        self.commands.push(DrawCommand::Text {
            pos: self.to_screen(pos),
            text: text.to_string(),
            color: self.fill,
            font: self.font.clone(),
        });
        Ok(())
    }

    fn clear(&mut self, area: Rect) -> SurfaceResult {
        self.commands.push(DrawCommand::Clear { area });
        Ok(())
    }

    /// Approximation: every glyph is 0.6 em wide.
    fn measure_text(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.font.size * 0.6
    }
}
