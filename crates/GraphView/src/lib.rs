//! # GraphView
//!
//! `graph_view` draws a styled graph (nodes, edges and sprites) onto an
//! abstract 2D surface. It keeps graph coordinates and screen coordinates in
//! sync through a camera, culls what is off screen, records the screen bounds
//! of everything it draws for hit-testing, and applies style groups in a fixed
//! three-pass order every frame.
//!
//! ## Core Architecture
//! - **Model (`src/model.rs`)**: The graphic graph, stored in flat arenas (SlotMap).
//! - **Camera (`src/camera.rs`)**: Graph <-> screen transform, framing modes, culling, hit-testing.
//! - **Renderers (`src/renderer/`)**: One renderer per element kind and the three-pass protocol.
//! - **Frame driver (`src/graph_renderer.rs`)**: `open`/`render`/`close`, selection, layers.
//! - **Render (`src/render.rs`)**: The `DrawSurface` trait and a recording backend that
//!   outputs `DrawCommand`s for the host to render.

pub mod bounds;
pub mod camera;
pub mod config;
pub mod error;
pub mod geometry;
pub mod graph_renderer;
pub mod icon_layout;
pub mod icons;
pub mod metrics;
pub mod model;
pub mod render;
pub mod renderer;
pub mod style;

// Re-exports for convenience
pub use camera::Camera;
pub use config::RendererConfig;
pub use error::{CanvasError, SurfaceError};
pub use graph_renderer::{GraphRenderer, LayerRenderer, LayerView};
pub use icons::{IconManager, IconResolver, NoIcons};
pub use model::{EdgeKey, ElementKey, GraphicGraph, NodeKey, SpriteKey, StyleGroupKey};
pub use render::{DrawCommand, DrawSurface, RenderList};
