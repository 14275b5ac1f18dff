//! # Frame Driver
//!
//! [`GraphRenderer`] owns an open graph and its camera, and turns them into
//! drawing calls once per frame:
//!
//! 1. fit the camera to the graph bounds and the viewport;
//! 2. paint the background and the back layer;
//! 3. record the bounds of every visible node, so edges can clip against
//!    nodes of groups drawn later;
//! 4. render style groups in z order, each through the three-pass protocol;
//! 5. paint the graph border, the fore layer and the selection rectangle.
//!
//! A failing style group is logged and skipped; the rest of the frame is still
//! drawn.

use std::time::{Duration, Instant};

use glam::{DAffine2, DVec2, DVec3};
use tracing::{debug, warn};

use crate::camera::Camera;
use crate::config::RendererConfig;
use crate::error::{CanvasError, SurfaceResult};
use crate::geometry::Rect;
use crate::icons::IconResolver;
use crate::metrics::Units;
use crate::model::{ElementKey, GraphicGraph, GroupElements};
use crate::render::{DrawSurface, Shape};
use crate::renderer::{self, EdgeRenderer, ElementRenderer, FrameContext, NodeRenderer, SpriteRenderer};
use crate::style::{ElementKind, ResolvedStyle};

/// What a layer renderer sees of the current frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerView {
    pub px_per_gu: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Lowest visible graph point.
    pub lo_visible: DVec2,
    /// Highest visible graph point.
    pub hi_visible: DVec2,
}

/// Host drawing hook run under or over the graph.
pub trait LayerRenderer {
    fn render(&mut self, surface: &mut dyn DrawSurface, graph: &GraphicGraph, view: &LayerView) -> SurfaceResult;
}

/// Rubber-band selection in viewport pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Selection {
    from: DVec2,
    to: DVec2,
}

impl Selection {
    fn rect(&self) -> Rect {
        Rect::from_corners(self.from, self.to)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub frames: u64,
    pub last_frame: Duration,
    sum_fps: f64,
}

impl FrameStats {
    /// Average of the per-frame rates since the renderer was created.
    pub fn average_fps(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.sum_fps / self.frames as f64
        }
    }

    fn record(&mut self, elapsed: Duration) {
        self.frames += 1;
        self.last_frame = elapsed;
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            self.sum_fps += 1.0 / secs;
        }
    }
}

struct Session {
    graph: GraphicGraph,
    camera: Camera,
}

/// Renders a [`GraphicGraph`] onto a [`DrawSurface`].
pub struct GraphRenderer {
    config: RendererConfig,
    session: Option<Session>,
    icons: Box<dyn IconResolver>,
    nodes: NodeRenderer,
    edges: EdgeRenderer,
    sprites: SpriteRenderer,
    back_layer: Option<Box<dyn LayerRenderer>>,
    fore_layer: Option<Box<dyn LayerRenderer>>,
    selection: Option<Selection>,
    stats: FrameStats,
}

impl GraphRenderer {
    pub fn new(config: RendererConfig, icons: Box<dyn IconResolver>) -> Self {
        Self {
            config,
            session: None,
            icons,
            nodes: NodeRenderer::new(),
            edges: EdgeRenderer::new(),
            sprites: SpriteRenderer::new(),
            back_layer: None,
            fore_layer: None,
            selection: None,
            stats: FrameStats::default(),
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Takes ownership of a graph until [`close`](Self::close).
    pub fn open(&mut self, graph: GraphicGraph) -> Result<(), CanvasError> {
        if self.session.is_some() {
            return Err(CanvasError::AlreadyOpen);
        }
        self.session = Some(Session {
            graph,
            camera: Camera::new(),
        });
        Ok(())
    }

    /// Gives the graph back. `None` if nothing was open.
    pub fn close(&mut self) -> Option<GraphicGraph> {
        self.selection = None;
        self.session.take().map(|s| s.graph)
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn graph(&self) -> Option<&GraphicGraph> {
        self.session.as_ref().map(|s| &s.graph)
    }

    pub fn graph_mut(&mut self) -> Option<&mut GraphicGraph> {
        self.session.as_mut().map(|s| &mut s.graph)
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.session.as_ref().map(|s| &s.camera)
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.session.as_mut().map(|s| &mut s.camera)
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Whether the graph changed or the view moved since the last frame.
    pub fn needs_repaint(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.graph.is_changed() || s.camera.repaint_requested())
    }

    pub fn set_back_layer_renderer(&mut self, layer: Option<Box<dyn LayerRenderer>>) {
        self.back_layer = layer;
    }

    pub fn set_fore_layer_renderer(&mut self, layer: Option<Box<dyn LayerRenderer>>) {
        self.fore_layer = layer;
    }

    /// Draws one frame into the `width` by `height` area at `(x, y)`.
    ///
    /// Surface failures are logged and the rest of the frame is still drawn.
    /// Fails only when no graph is open.
    #[tracing::instrument(skip_all, fields(viewport_width = width, viewport_height = height))]
    pub fn render(
        &mut self,
        surface: &mut dyn DrawSurface,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), CanvasError> {
        let started = Instant::now();
        let frame = self.stats.frames;
        let Some(session) = self.session.as_mut() else {
            return Err(CanvasError::NotOpen);
        };
        let graph = &session.graph;
        let camera = &mut session.camera;

        let (lo, hi) = graph.bounds().unwrap_or((DVec3::ZERO, DVec3::ZERO));
        camera.set_bounds(lo, hi);
        camera.set_viewport(x, y, width, height);

        let empty = camera.graph_viewport().is_none()
            && camera.metrics().diagonal == 0.0
            && graph.node_count() == 0
            && graph.sprite_count() == 0;
        if empty {
            if let Err(error) = draw_nothing_to_display(surface, &self.config, x, y, width, height) {
                warn!(frame, step = "nothing_to_display", %error, "frame step failed");
            }
        } else {
            camera.set_padding(graph.style().padding.clone());
            camera.push_view();

            let graph_style = ResolvedStyle::resolve(graph.style(), camera.metrics(), camera.view_percent(), &self.config);
            if let Err(error) = draw_background(surface, &graph_style, x, y, width, height) {
                warn!(frame, step = "background", %error, "frame step failed");
            }

            if let Some(layer) = self.back_layer.as_mut() {
                if let Err(error) = layer.render(surface, graph, &layer_view(camera)) {
                    warn!(frame, layer = "back", %error, "layer render failed");
                }
            }

            camera.clear_elements();
            self.nodes.begin_frame();
            self.edges.begin_frame();
            self.sprites.begin_frame();

            let mut ctx = FrameContext {
                graph,
                camera,
                icons: self.icons.as_mut(),
                config: &self.config,
            };
            record_node_bounds(&self.nodes, &mut ctx);

            let partition = graph.partition_groups();
            let no_elements = GroupElements::default();
            for group in graph.style_groups_by_z() {
                let Some(style_group) = graph.style_group(group) else {
                    continue;
                };
                let renderer: &mut dyn ElementRenderer = match style_group.kind {
                    ElementKind::Node => &mut self.nodes,
                    ElementKind::Edge => &mut self.edges,
                    ElementKind::Sprite => &mut self.sprites,
                    ElementKind::Graph => continue,
                };
                if let Err(error) = renderer::render_group(
                    renderer,
                    &mut ctx,
                    group,
                    partition.get(&group).unwrap_or(&no_elements),
                    surface,
                ) {
                    warn!(frame, group = %style_group.id, %error, "style group render failed");
                }
            }

            let camera = ctx.camera;
            if let Err(error) = draw_graph_border(surface, &graph_style, camera) {
                warn!(frame, step = "border", %error, "frame step failed");
            }

            if let Some(layer) = self.fore_layer.as_mut() {
                if let Err(error) = layer.render(surface, graph, &layer_view(camera)) {
                    warn!(frame, layer = "fore", %error, "layer render failed");
                }
            }

            if let Some(selection) = self.selection {
                let area = selection.rect();
                let origin = camera.metrics().viewport.origin();
                if let Err(error) = draw_selection(surface, &self.config, area.min + origin, area.size()) {
                    warn!(frame, step = "selection", %error, "frame step failed");
                }
            }
        }

        session.graph.take_changed();
        session.camera.take_repaint_request();

        self.stats.record(started.elapsed());
        debug!(
            frame,
            elapsed_us = self.stats.last_frame.as_micros() as u64,
            average_fps = self.stats.average_fps(),
            "frame rendered"
        );
        Ok(())
    }

    pub fn begin_selection_at(&mut self, x: f64, y: f64) {
        let p = DVec2::new(x, y);
        self.selection = Some(Selection { from: p, to: p });
        self.request_repaint();
    }

    pub fn selection_grows_at(&mut self, x: f64, y: f64) {
        if let Some(selection) = self.selection.as_mut() {
            selection.to = DVec2::new(x, y);
            self.request_repaint();
        }
    }

    /// Ends the selection and returns its rectangle, normalised so that `min`
    /// is the top-left corner whatever the drag direction.
    pub fn end_selection_at(&mut self, x: f64, y: f64) -> Option<Rect> {
        let mut selection = self.selection.take()?;
        selection.to = DVec2::new(x, y);
        self.request_repaint();
        Some(selection.rect())
    }

    /// The selection in progress, normalised.
    pub fn selection(&self) -> Option<Rect> {
        self.selection.map(|s| s.rect())
    }

    fn request_repaint(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.graph.mark_changed();
        }
    }

    /// First node, else first sprite, drawn under a viewport pixel in the last frame.
    pub fn find_element_at(&self, x: f64, y: f64) -> Option<ElementKey> {
        let session = self.session.as_ref()?;
        session.camera.find_element_at(&session.graph, x, y)
    }

    /// Nodes and sprites drawn in the last frame overlapping a viewport rectangle.
    pub fn all_elements_in(&self, area: Rect) -> Vec<ElementKey> {
        match self.session.as_ref() {
            Some(session) => session.camera.all_elements_in(&session.graph, area),
            None => Vec::new(),
        }
    }

    /// Moves a node or sprite under a viewport pixel.
    ///
    /// Returns the new stored position, or `None` while the transform cannot
    /// be inverted.
    pub fn move_element_at_pixel(&mut self, key: ElementKey, x: f64, y: f64) -> Result<Option<DVec3>, CanvasError> {
        let session = self.session.as_mut().ok_or(CanvasError::NotOpen)?;
        let camera = &session.camera;
        let graph = &mut session.graph;
        let screen = DVec2::new(x, y) + camera.metrics().viewport.origin();

        let position = match key {
            ElementKey::Node(k) => {
                let node = graph
                    .node(k)
                    .ok_or_else(|| CanvasError::UnknownElement(format!("{k:?}")))?;
                let Some(p) = camera.screen_to_graph(screen) else {
                    return Ok(None);
                };
                p.extend(node.position.z)
            }
            ElementKey::Sprite(k) => {
                let sprite = graph
                    .sprite(k)
                    .ok_or_else(|| CanvasError::UnknownElement(format!("{k:?}")))?;
                let z = sprite.position.z;
                let p = match sprite.units {
                    Units::Gu => camera.screen_to_graph(screen),
                    Units::Px => Some(screen),
                    Units::Percents => {
                        let viewport = camera.metrics().viewport;
                        Some(DVec2::new(x, y) / viewport.size() * 100.0)
                    }
                };
                let Some(p) = p else {
                    return Ok(None);
                };
                p.extend(z)
            }
            ElementKey::Edge(_) => return Ok(None),
        };
        graph.move_element(key, position)?;
        Ok(Some(position))
    }
}

/// Style of an element as it will be drawn: event style if any, then its own
/// dynamic attributes.
fn element_style(ctx: &FrameContext<'_>, key: ElementKey) -> Option<ResolvedStyle> {
    let element = ctx.graph.element(key)?;
    let group = ctx.graph.style_group(element.group)?;
    let style = ctx.resolve_style(group.style_for_events(element.events));
    Some(style.with_dynamic(element.attributes, ctx.camera.metrics()))
}

fn record_node_bounds(nodes: &NodeRenderer, ctx: &mut FrameContext<'_>) {
    let graph = ctx.graph;
    for (k, _) in graph.nodes() {
        let key = ElementKey::Node(k);
        if !ctx.camera.is_visible(graph, key) {
            continue;
        }
        let Some(style) = element_style(ctx, key) else {
            continue;
        };
        if let Some(bounds) = nodes.compute_bounds(ctx, &style, key) {
            ctx.camera.put_element(bounds);
        }
    }
}

fn layer_view(camera: &Camera) -> LayerView {
    let metrics = camera.metrics();
    LayerView {
        px_per_gu: metrics.ratio_px2gu,
        viewport_width: metrics.viewport.width,
        viewport_height: metrics.viewport.height,
        lo_visible: metrics.lo_visible,
        hi_visible: metrics.hi_visible,
    }
}

fn draw_background(
    surface: &mut dyn DrawSurface,
    style: &ResolvedStyle,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> SurfaceResult {
    surface.set_transform(DAffine2::IDENTITY);
    if style.fills() {
        surface.set_fill(style.fill);
        surface.fill_shape(&Shape::Rect {
            pos: DVec2::new(x, y),
            size: DVec2::new(width + 1.0, height + 1.0),
        })
    } else {
        surface.clear(Rect::new(DVec2::new(x, y), DVec2::new(width, height)))
    }
}

fn draw_graph_border(surface: &mut dyn DrawSurface, style: &ResolvedStyle, camera: &Camera) -> SurfaceResult {
    if !style.strokes() || style.stroke_width <= 0.0 {
        return Ok(());
    }
    let metrics = camera.metrics();
    let lo = camera.graph_to_screen(metrics.lo.truncate());
    let hi = camera.graph_to_screen(metrics.hi.truncate());
    let border = Rect::from_corners(lo, hi);
    surface.set_transform(DAffine2::IDENTITY);
    surface.set_stroke(style.stroke, style.stroke_width);
    surface.stroke_shape(&Shape::Rect {
        pos: border.min,
        size: border.size(),
    })
}

fn draw_selection(surface: &mut dyn DrawSurface, config: &RendererConfig, pos: DVec2, size: DVec2) -> SurfaceResult {
    let rect = Shape::Rect { pos, size };
    let style = &config.selection;
    surface.set_transform(DAffine2::IDENTITY);
    surface.set_fill(style.fill);
    surface.fill_shape(&rect)?;
    surface.set_stroke(style.border, style.border_width);
    surface.stroke_shape(&rect)
}

fn draw_nothing_to_display(
    surface: &mut dyn DrawSurface,
    config: &RendererConfig,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> SurfaceResult {
    let style = &config.empty_graph;
    let (x2, y2) = (x + width, y + height);
    surface.set_transform(DAffine2::IDENTITY);
    surface.set_stroke(style.cross, 1.0);
    surface.stroke_line(DVec2::new(x, y), DVec2::new(x2, y2))?;
    surface.stroke_line(DVec2::new(x2, y), DVec2::new(x, y2))?;

    let text_width = surface.measure_text(&style.message);
    surface.set_fill(style.message_color);
    surface.fill_text(
        &style.message,
        DVec2::new(x + (width - text_width) / 2.0, y + height / 2.0),
    )
}
