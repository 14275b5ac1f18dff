//! # Configuration
//!
//! This module defines the configuration struct for the graph renderer.

use glam::Vec4;
use serde::{Deserialize, Serialize};

/// Configuration parameters for the graph renderer.
///
/// Every field has a default, so hosts only need to ship the values they
/// change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Scale node sizes and label sizes with the zoom level. Default: true.
    pub auto_scale: bool,
    /// Labels at or below this size are not drawn. Default: 6.
    pub min_font_size: f64,
    /// Upper bound for auto-scaled labels. Default: 24.
    pub max_font_size: f64,
    /// Maximum number of distinct icons in an edge icon panel. Default: 15.
    pub icon_cap: usize,
    /// Icon drawn in place of the icons beyond the cap.
    pub overflow_icon: String,
    /// Corner radius of the edge icon panel. Default: 4.
    pub icon_panel_corner_radius: f64,
    /// Corner radius of rounded boxes and diamonds. Default: 4.
    pub round_box_corner_radius: f64,
    /// Distance in pixels the arrow tip is pulled back from the node boundary.
    pub arrow_padding: f64,
    /// Zoom threshold used by zoom-based label visibility without explicit
    /// values. Default: 0.25.
    pub default_text_visibility: f64,
    /// Colours of the rubber-band selection.
    pub selection: SelectionStyle,
    /// Colours of the frame drawn when there is nothing to display.
    pub empty_graph: EmptyGraphStyle,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            auto_scale: true,
            min_font_size: 6.0,
            max_font_size: 24.0,
            icon_cap: 15,
            overflow_icon: "right-arrow-next".to_string(),
            icon_panel_corner_radius: 4.0,
            round_box_corner_radius: 4.0,
            arrow_padding: 0.0,
            default_text_visibility: 0.25,
            selection: SelectionStyle::default(),
            empty_graph: EmptyGraphStyle::default(),
        }
    }
}

/// Selection rectangle colours (RGBA, 0.0 - 1.0).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionStyle {
    pub fill: Vec4,
    pub border: Vec4,
    pub border_width: f64,
}

impl Default for SelectionStyle {
    fn default() -> Self {
        Self {
            fill: Vec4::new(50.0 / 255.0, 50.0 / 255.0, 200.0 / 255.0, 0.5),
            border: Vec4::new(0.0, 0.0, 0.0, 0.5),
            border_width: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmptyGraphStyle {
    /// Colour of the cross over the viewport.
    pub cross: Vec4,
    pub message_color: Vec4,
    pub message: String,
}

impl Default for EmptyGraphStyle {
    fn default() -> Self {
        Self {
            cross: Vec4::new(1.0, 0.0, 0.0, 1.0),
            message_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            message: "Graph width/height/depth is zero !!".to_string(),
        }
    }
}
