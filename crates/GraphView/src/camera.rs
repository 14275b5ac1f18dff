//! # Camera
//!
//! Owns the graph-space to screen-space transform and everything derived from
//! it: the metrics, the framing mode, visibility culling and the registry of
//! element bounds recorded during the last frame.
//!
//! Graph space has Y pointing up, screen space has Y pointing down, so the
//! forward transform is
//! `translate(viewport centre) * rotate * scale(s, -s) * translate(-graph centre)`.
//!
//! Two framing modes decide `s` and the graph centre:
//! - **auto-fit**: the whole graph bounding box fills the viewport, zoom is 1;
//! - **user view**: `s` follows the zoom factor and the explicit view centre,
//!   or a pinned graph viewport.

use std::collections::BTreeMap;
use std::fmt;

use glam::{DAffine2, DVec2, DVec3};
use tracing::debug;

use crate::bounds::BoundsContext;
use crate::geometry::{self, Rect};
use crate::metrics::{GraphMetrics, Lengths, Units};
use crate::model::{EdgeKey, ElementFlags, ElementKey, GraphicGraph, NodeKey, SpriteAttachment, SpriteKey};
use crate::style::VisibilityMode;

#[derive(Clone, Debug)]
pub struct Camera {
    metrics: GraphMetrics,
    auto_fit: bool,
    center: DVec3,
    zoom: f64,
    /// Degrees, clockwise on screen.
    rotation: f64,
    padding: Lengths,
    forward: DAffine2,
    inverse: DAffine2,
    invertible: bool,
    graph_viewport: Option<Rect>,
    graph_viewport_diagonal: f64,
    elements: BTreeMap<String, BoundsContext>,
    repaint_requested: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            metrics: GraphMetrics::default(),
            auto_fit: true,
            center: DVec3::ZERO,
            zoom: 1.0,
            rotation: 0.0,
            padding: Lengths::gu([0.0]),
            forward: DAffine2::IDENTITY,
            inverse: DAffine2::IDENTITY,
            invertible: true,
            graph_viewport: None,
            graph_viewport_diagonal: 0.0,
            elements: BTreeMap::new(),
            repaint_requested: false,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> &GraphMetrics {
        &self.metrics
    }

    pub fn view_center(&self) -> DVec3 {
        self.center
    }

    /// Zoom factor, 1 shows the whole graph.
    pub fn view_percent(&self) -> f64 {
        self.zoom
    }

    pub fn view_rotation(&self) -> f64 {
        self.rotation
    }

    pub fn is_auto_fit(&self) -> bool {
        self.auto_fit
    }

    pub fn padding(&self) -> &Lengths {
        &self.padding
    }

    pub fn graph_viewport(&self) -> Option<Rect> {
        self.graph_viewport
    }

    /// Graph-to-screen transform of the last [`push_view`](Self::push_view).
    pub fn forward(&self) -> DAffine2 {
        self.forward
    }

    /// Screen-to-graph transform. Stale when [`is_invertible`](Self::is_invertible) is false.
    pub fn inverse(&self) -> DAffine2 {
        self.inverse
    }

    pub fn is_invertible(&self) -> bool {
        self.invertible
    }

    fn request_repaint(&mut self) {
        self.repaint_requested = true;
    }

    pub fn repaint_requested(&self) -> bool {
        self.repaint_requested
    }

    /// Returns whether a view setter asked for a repaint and clears the request.
    pub fn take_repaint_request(&mut self) -> bool {
        std::mem::take(&mut self.repaint_requested)
    }

    pub fn set_view_center(&mut self, x: f64, y: f64, z: f64) {
        self.set_auto_fit_view(false);
        self.center = DVec3::new(x, y, z);
        self.request_repaint();
        debug!(center = ?self.center, "view center updated");
    }

    pub fn set_view_percent(&mut self, percent: f64) {
        self.set_auto_fit_view(false);
        self.set_zoom(percent);
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
        self.request_repaint();
        debug!(zoom, "zoom value updated");
    }

    pub fn set_view_rotation(&mut self, degrees: f64) {
        self.set_auto_fit_view(false);
        self.rotation = degrees;
        self.request_repaint();
    }

    /// Switches framing mode. Leaving auto-fit starts the user view at zoom 1
    /// on the graph centre, where auto-fit left it.
    pub fn set_auto_fit_view(&mut self, on: bool) {
        if self.auto_fit && !on {
            self.zoom = 1.0;
            self.center = self.metrics.graph_center().extend(0.0);
        }
        if self.auto_fit != on {
            debug!(auto_fit = on, "camera framing mode changed");
        }
        self.auto_fit = on;
        self.request_repaint();
    }

    /// Back to auto-fit without rotation.
    pub fn reset_view(&mut self) {
        self.rotation = 0.0;
        self.set_auto_fit_view(true);
    }

    pub fn set_bounds(&mut self, lo: DVec3, hi: DVec3) {
        self.metrics.set_bounds(lo, hi);
    }

    /// Diagonal of the pinned graph viewport, else of the graph bounding box.
    pub fn graph_dimension(&self) -> f64 {
        if self.graph_viewport.is_some() {
            self.graph_viewport_diagonal
        } else {
            self.metrics.diagonal
        }
    }

    /// Pins a graph-space rectangle to the viewport, whatever the graph bounds.
    pub fn set_graph_viewport(&mut self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) {
        self.set_auto_fit_view(false);
        self.set_view_center(min_x + (max_x - min_x) / 2.0, min_y + (max_y - min_y) / 2.0, 0.0);
        let rect = Rect::from_corners(DVec2::new(min_x, min_y), DVec2::new(max_x, max_y));
        self.graph_viewport = Some(rect);
        self.graph_viewport_diagonal = rect.size().length();
        self.set_zoom(1.0);
        debug!(?rect, "graph viewport set");
    }

    pub fn remove_graph_viewport(&mut self) {
        debug!("graph viewport removed");
        self.graph_viewport = None;
        self.reset_view();
    }

    /// Screen rectangle to draw into, set before each frame.
    pub fn set_viewport(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.metrics.set_viewport(x, y, width, height);
    }

    /// Space kept free around the graph, in graph units or pixels.
    pub fn set_padding(&mut self, padding: Lengths) {
        self.padding = padding;
    }

    fn padding_in(&self, units: Units) -> DVec2 {
        if self.padding.units != units || self.padding.is_empty() {
            return DVec2::ZERO;
        }
        let x = self.padding.get(0);
        DVec2::new(x, self.padding.explicit(1).unwrap_or(x))
    }

    /// Recomputes the transform for the current framing mode.
    pub fn push_view(&mut self) {
        if self.auto_fit {
            self.auto_fit_view();
        } else {
            self.user_view();
        }
    }

    fn auto_fit_view(&mut self) {
        let pad_px = self.padding_in(Units::Px) * 2.0;
        let pad_gu = self.padding_in(Units::Gu) * 2.0;
        let viewport = self.metrics.viewport;
        let size = self.metrics.size.truncate();

        let sx = (viewport.width - pad_px.x) / (size.x + pad_gu.x);
        let sy = (viewport.height - pad_px.y) / (size.y + pad_gu.y);
        let scale = finite_scale(sx.min(sy));
        let center = self.metrics.graph_center();

        self.build_transform(viewport.center(), center, scale);

        self.zoom = 1.0;
        self.center = center.extend(0.0);
        self.update_ratio(scale);
        self.metrics.lo_visible = self.metrics.lo.truncate();
        self.metrics.hi_visible = self.metrics.hi.truncate();
    }

    fn user_view(&mut self) {
        let pad_px = self.padding_in(Units::Px) * 2.0;
        let pad_gu = self.padding_in(Units::Gu) * 2.0;
        let viewport = self.metrics.viewport;
        let graph_size = match self.graph_viewport {
            Some(rect) => rect.size(),
            None => self.metrics.size.truncate(),
        };

        let sx = (viewport.width - pad_px.x) / ((graph_size.x + pad_gu.x) * self.zoom);
        let sy = (viewport.height - pad_px.y) / ((graph_size.y + pad_gu.y) * self.zoom);
        let scale = finite_scale(sx.min(sy));

        self.build_transform(viewport.center(), self.center.truncate(), scale);
        self.update_ratio(scale);

        if self.invertible {
            let lo = viewport.origin();
            let hi = lo + viewport.size();
            let corners = [lo, DVec2::new(hi.x, lo.y), hi, DVec2::new(lo.x, hi.y)]
                .map(|c| self.inverse.transform_point2(c));
            let (min, max) = corners
                .iter()
                .fold((corners[0], corners[0]), |(min, max), c| (min.min(*c), max.max(*c)));
            self.metrics.lo_visible = min;
            self.metrics.hi_visible = max;
        }
    }

    fn build_transform(&mut self, screen_center: DVec2, graph_center: DVec2, scale: f64) {
        self.forward = DAffine2::from_translation(screen_center)
            * DAffine2::from_angle(self.rotation.to_radians())
            * DAffine2::from_scale(DVec2::new(scale, -scale))
            * DAffine2::from_translation(-graph_center);

        let det = self.forward.matrix2.determinant();
        if det.is_finite() && det != 0.0 {
            self.inverse = self.forward.inverse();
            self.invertible = true;
        } else {
            // Keep the previous inverse; screen_to_graph reports None meanwhile.
            self.invertible = false;
            debug!(scale, "cannot invert graph to screen transform");
        }
    }

    fn update_ratio(&mut self, scale: f64) {
        if scale > 0.0 && !geometry::approximately_equals(0.0, scale, geometry::SCALE_EPSILON) {
            self.metrics.set_ratio_px2gu(scale);
        }
    }

    pub fn graph_to_screen(&self, p: DVec2) -> DVec2 {
        self.forward.transform_point2(p)
    }

    /// `None` while the transform is not invertible.
    pub fn screen_to_graph(&self, p: DVec2) -> Option<DVec2> {
        self.invertible.then(|| self.inverse.transform_point2(p))
    }

    /// Graph units to pixels, keeping `z`.
    pub fn transform_gu_to_px(&self, p: DVec3) -> DVec3 {
        self.graph_to_screen(p.truncate()).extend(p.z)
    }

    pub fn transform_px_to_gu(&self, x: f64, y: f64) -> Option<DVec3> {
        self.screen_to_graph(DVec2::new(x, y)).map(|p| p.extend(0.0))
    }

    fn viewport_rect(&self) -> Rect {
        let viewport = self.metrics.viewport;
        Rect::new(viewport.origin(), viewport.size())
    }

    /// Whether an element should be drawn this frame.
    pub fn is_visible(&self, graph: &GraphicGraph, key: ElementKey) -> bool {
        let Some(element) = graph.element(key) else {
            return false;
        };
        if element.is_hidden() {
            return false;
        }
        let Some(group) = graph.style_group(element.group) else {
            return false;
        };
        if group.style.visibility_mode == VisibilityMode::Hidden {
            return false;
        }

        // Node-attached sprites follow their host, whatever the framing mode.
        if let ElementKey::Sprite(k) = key {
            if let Some(SpriteAttachment::Node(host)) = graph.sprite(k).map(|s| s.attachment) {
                return self.is_visible(graph, ElementKey::Node(host));
            }
        }

        if self.auto_fit {
            return true;
        }

        match key {
            ElementKey::Node(k) => self.is_node_visible(graph, k),
            ElementKey::Edge(k) => is_edge_drawable(graph, k),
            ElementKey::Sprite(k) => self.is_sprite_visible(graph, k),
        }
    }

    fn is_node_visible(&self, graph: &GraphicGraph, key: NodeKey) -> bool {
        let Some(node) = graph.node(key) else {
            return false;
        };
        let Some(group) = graph.style_group(node.group) else {
            return false;
        };
        let half = self.metrics.half_extents_px(&group.style.size);
        let pos = self.graph_to_screen(node.position.truncate());
        Rect::from_center(pos, half).overlaps(&self.viewport_rect())
    }

    fn is_sprite_visible(&self, graph: &GraphicGraph, key: SpriteKey) -> bool {
        let Some(sprite) = graph.sprite(key) else {
            return false;
        };
        if let SpriteAttachment::Edge(edge) = sprite.attachment {
            if !is_edge_drawable(graph, edge) {
                return false;
            }
        }
        let Some(group) = graph.style_group(sprite.group) else {
            return false;
        };
        let Some(pos) = self.sprite_position(graph, key, Units::Px) else {
            return false;
        };
        let half = self.metrics.half_extents_px(&group.style.size);
        Rect::from_center(pos, half).overlaps(&self.viewport_rect())
    }

    /// Records the bounds of an element drawn this frame.
    ///
    /// Degenerate bounds remove any previous entry for the id instead; the
    /// return value tells whether the context was stored.
    pub fn put_element(&mut self, context: BoundsContext) -> bool {
        if context.bounds().is_degenerate() {
            self.elements.remove(context.id());
            return false;
        }
        self.elements.insert(context.id().to_string(), context);
        true
    }

    pub fn remove_element(&mut self, id: &str) -> bool {
        self.elements.remove(id).is_some()
    }

    pub fn element(&self, id: &str) -> Option<&BoundsContext> {
        self.elements.get(id)
    }

    /// Recorded contexts, ordered by id.
    pub fn elements(&self) -> impl Iterator<Item = &BoundsContext> + '_ {
        self.elements.values()
    }

    pub fn clear_elements(&mut self) {
        self.elements.clear();
    }

    fn recorded_contains(&self, id: &str, p: DVec2) -> bool {
        self.element(id).is_some_and(|c| c.contains(p))
    }

    /// First node, else first sprite, under a viewport-relative point.
    pub fn find_element_at(&self, graph: &GraphicGraph, x: f64, y: f64) -> Option<ElementKey> {
        let p = DVec2::new(x, y) + self.metrics.viewport.origin();
        if let Some((k, _)) = graph.nodes().find(|(_, n)| self.recorded_contains(&n.id, p)) {
            return Some(ElementKey::Node(k));
        }
        graph
            .sprites()
            .find(|(_, s)| self.recorded_contains(&s.id, p))
            .map(|(k, _)| ElementKey::Sprite(k))
    }

    /// Nodes then sprites whose recorded bounds overlap a viewport-relative rectangle.
    pub fn all_elements_in(&self, graph: &GraphicGraph, area: Rect) -> Vec<ElementKey> {
        let offset = self.metrics.viewport.origin();
        let area = Rect::from_corners(area.min + offset, area.max + offset);
        let overlaps = |id: &str| self.element(id).is_some_and(|c| c.rect_bounds().overlaps(&area));

        let nodes = graph
            .nodes()
            .filter(|(_, n)| overlaps(&n.id))
            .map(|(k, _)| ElementKey::Node(k));
        let sprites = graph
            .sprites()
            .filter(|(_, s)| overlaps(&s.id))
            .map(|(k, _)| ElementKey::Sprite(k));
        nodes.chain(sprites).collect()
    }

    /// Position of a sprite in graph units or pixels, following its attachment.
    pub fn sprite_position(&self, graph: &GraphicGraph, key: SpriteKey, units: Units) -> Option<DVec2> {
        let sprite = graph.sprite(key)?;
        match sprite.attachment {
            SpriteAttachment::Free => self.free_sprite_position(sprite.position, sprite.units, units),
            SpriteAttachment::Node(node) => {
                let host = graph.node(node)?.position.truncate();
                let radius = self.metrics.length_to_gu(sprite.position.x, sprite.units);
                let angle = sprite.position.z.to_radians();
                let p = host + DVec2::new(angle.cos(), angle.sin()) * radius;
                self.graph_point_in(p, units)
            }
            SpriteAttachment::Edge(edge) => {
                let p = self.edge_sprite_position(graph, edge, sprite.position, sprite.units)?;
                self.graph_point_in(p, units)
            }
        }
    }

    fn graph_point_in(&self, p: DVec2, units: Units) -> Option<DVec2> {
        match units {
            Units::Gu => Some(p),
            Units::Px => Some(self.graph_to_screen(p)),
            Units::Percents => None,
        }
    }

    fn free_sprite_position(&self, position: DVec3, from: Units, to: Units) -> Option<DVec2> {
        let p = position.truncate();
        if from == to {
            return Some(p);
        }
        match (from, to) {
            (Units::Px, Units::Gu) => self.screen_to_graph(p),
            (Units::Gu, Units::Px) => Some(self.graph_to_screen(p)),
            (Units::Percents, Units::Gu) => {
                let size = self.metrics.size.truncate();
                Some(self.metrics.lo.truncate() + p / 100.0 * size)
            }
            (Units::Percents, Units::Px) => {
                let viewport = self.metrics.viewport;
                Some(viewport.origin() + p / 100.0 * viewport.size())
            }
            _ => None,
        }
    }

    fn edge_sprite_position(&self, graph: &GraphicGraph, key: EdgeKey, position: DVec3, units: Units) -> Option<DVec2> {
        let edge = graph.edge(key)?;
        let from = graph.node(edge.from)?.position.truncate();
        let to = graph.node(edge.to)?.position.truncate();
        let offset = self.metrics.length_to_gu(position.y, units);
        let t = position.x.clamp(0.0, 1.0);

        if let Some([c1, c2]) = edge.control_points {
            let point = geometry::cubic_point(from, c1, c2, to, t);
            let normal = geometry::cubic_perpendicular(from, c1, c2, to, t);
            return Some(point + normal * offset);
        }

        let delta = to - from;
        let normal = delta.perp().normalize_or_zero();
        Some(from + delta * t + normal * offset)
    }
}

/// Edges are drawn when shown and both endpoints have a position.
fn is_edge_drawable(graph: &GraphicGraph, key: EdgeKey) -> bool {
    let Some(edge) = graph.edge(key) else {
        return false;
    };
    if edge.flags.contains(ElementFlags::HIDDEN) {
        return false;
    }
    let positioned = |n: NodeKey| {
        graph
            .node(n)
            .is_some_and(|node| node.flags.contains(ElementFlags::POSITIONED))
    };
    positioned(edge.from) && positioned(edge.to)
}

/// Infinite or NaN scales (an empty graph) fall back to 1.
fn finite_scale(scale: f64) -> f64 {
    if scale.is_finite() { scale } else { 1.0 }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Camera:")?;
        writeln!(f, "  auto_fit = {}", self.auto_fit)?;
        writeln!(f, "  center   = {}", self.center)?;
        writeln!(f, "  rotation = {:.3}", self.rotation)?;
        writeln!(f, "  zoom     = {:.3}", self.zoom)?;
        writeln!(f, "  padding  = {:?} {:?}", self.padding.units, self.padding.values)?;
        write!(f, "  metrics  = {}", self.metrics)
    }
}
