use std::cell::RefCell;
use std::rc::Rc;

use glam::{DAffine2, DVec2, DVec3, Vec4};
use graph_view::error::SurfaceResult;
use graph_view::geometry::Rect;
use graph_view::icons::IconImage;
use graph_view::metrics::{Lengths, Units};
use graph_view::model::{ElementKey, GraphicGraph, NodeKey};
use graph_view::render::{DrawCommand, DrawSurface, Font, RenderList, Shape};
use graph_view::style::{ElementKind, Style, StrokeMode, StyleGroup};
use graph_view::{CanvasError, GraphRenderer, LayerRenderer, LayerView, NoIcons, RendererConfig, SurfaceError};

const POISON: Vec4 = Vec4::new(1.0, 0.0, 1.0, 1.0);
const GREEN: Vec4 = Vec4::new(0.0, 1.0, 0.0, 1.0);

fn close(a: DVec2, b: DVec2) -> bool {
    a.distance(b) < 1e-6
}

fn create_test_graph() -> (GraphicGraph, NodeKey, NodeKey) {
    let mut graph = GraphicGraph::new();
    let group = graph.add_style_group(StyleGroup::new("node", ElementKind::Node, Style::default()));
    let a = graph.add_node("A", group, DVec3::new(-50.0, -50.0, 0.0)).unwrap();
    let b = graph.add_node("B", group, DVec3::new(50.0, 50.0, 0.0)).unwrap();
    (graph, a, b)
}

fn open_renderer(graph: GraphicGraph) -> GraphRenderer {
    let mut renderer = GraphRenderer::new(RendererConfig::default(), Box::new(NoIcons));
    renderer.open(graph).unwrap();
    renderer
}

/// Records like a `RenderList` but refuses to fill anything in the poison colour,
/// and to clear when `fail_clear` is set.
#[derive(Default)]
struct FailingSurface {
    inner: RenderList,
    fail_clear: bool,
}

impl DrawSurface for FailingSurface {
    fn set_transform(&mut self, transform: DAffine2) {
        self.inner.set_transform(transform);
    }

    fn set_fill(&mut self, color: Vec4) {
        self.inner.set_fill(color);
    }

    fn set_stroke(&mut self, color: Vec4, width: f64) {
        self.inner.set_stroke(color, width);
    }

    fn set_font(&mut self, font: Font) {
        self.inner.set_font(font);
    }

    fn fill_shape(&mut self, shape: &Shape) -> SurfaceResult {
        if self.inner.current_fill() == POISON {
            return Err(SurfaceError::new("fill_shape", "poisoned colour"));
        }
        self.inner.fill_shape(shape)
    }

    fn stroke_shape(&mut self, shape: &Shape) -> SurfaceResult {
        self.inner.stroke_shape(shape)
    }

    fn stroke_line(&mut self, start: DVec2, end: DVec2) -> SurfaceResult {
        self.inner.stroke_line(start, end)
    }

    fn stroke_bezier(&mut self, start: DVec2, cp1: DVec2, cp2: DVec2, end: DVec2) -> SurfaceResult {
        self.inner.stroke_bezier(start, cp1, cp2, end)
    }

    fn draw_image(&mut self, image: &IconImage, top_left: DVec2) -> SurfaceResult {
        self.inner.draw_image(image, top_left)
    }

    fn fill_text(&mut self, text: &str, pos: DVec2) -> SurfaceResult {
        self.inner.fill_text(text, pos)
    }

    fn clear(&mut self, area: Rect) -> SurfaceResult {
        if self.fail_clear {
            return Err(SurfaceError::new("clear", "read-only surface"));
        }
        self.inner.clear(area)
    }

    fn measure_text(&self, text: &str) -> f64 {
        self.inner.measure_text(text)
    }
}

/// Layer hook that records what it was given and draws a marker line.
struct MarkerLayer {
    seen: Rc<RefCell<Option<LayerView>>>,
    marker: DVec2,
}

impl LayerRenderer for MarkerLayer {
    fn render(&mut self, surface: &mut dyn DrawSurface, _graph: &GraphicGraph, view: &LayerView) -> SurfaceResult {
        *self.seen.borrow_mut() = Some(*view);
        surface.stroke_line(self.marker, self.marker)
    }
}

#[test]
fn test_open_close_lifecycle() {
    let (graph, _, _) = create_test_graph();
    let mut renderer = GraphRenderer::new(RendererConfig::default(), Box::new(NoIcons));
    let mut list = RenderList::new();

    // 1. Not open yet
    assert!(matches!(
        renderer.render(&mut list, 0.0, 0.0, 200.0, 200.0),
        Err(CanvasError::NotOpen)
    ));

    // 2. Open once only
    renderer.open(graph).unwrap();
    assert!(matches!(renderer.open(GraphicGraph::new()), Err(CanvasError::AlreadyOpen)));
    assert!(renderer.render(&mut list, 0.0, 0.0, 200.0, 200.0).is_ok());

    // 3. Close hands the graph back
    let graph = renderer.close().unwrap();
    assert_eq!(graph.node_count(), 2);
    assert!(!renderer.is_open());
    assert!(renderer.close().is_none());
}

#[test]
fn test_selection_rectangle_is_normalised() {
    let (graph, _, _) = create_test_graph();
    let mut renderer = open_renderer(graph);

    renderer.begin_selection_at(10.0, 10.0);
    renderer.selection_grows_at(2.0, 2.0);
    let expected = Rect::from_corners(DVec2::new(2.0, 2.0), DVec2::new(10.0, 10.0));
    assert_eq!(renderer.selection(), Some(expected));
    assert_eq!(renderer.selection().unwrap().min, DVec2::new(2.0, 2.0));

    // Drawn on top of the frame
    let mut list = RenderList::new();
    renderer.render(&mut list, 0.0, 0.0, 200.0, 200.0).unwrap();
    let selection_fill = RendererConfig::default().selection.fill;
    match list.commands.iter().rev().nth(1) {
        Some(DrawCommand::Fill {
            shape: Shape::Rect { pos, size },
            color,
            ..
        }) => {
            assert_eq!(*pos, DVec2::new(2.0, 2.0));
            assert_eq!(*size, DVec2::new(8.0, 8.0));
            assert_eq!(*color, selection_fill);
        }
        other => panic!("Expected the selection fill, got {other:?}"),
    }

    assert_eq!(renderer.end_selection_at(2.0, 2.0), Some(expected));
    assert_eq!(renderer.selection(), None);
}

#[test]
fn test_hit_testing_uses_last_frame() {
    let (mut graph, a, b) = create_test_graph();
    let sprites = graph.add_style_group(StyleGroup::new("sprite", ElementKind::Sprite, Style::default()));
    let s = graph
        .add_sprite("S", sprites, DVec3::new(150.0, 50.0, 0.0), Units::Px)
        .unwrap();
    let mut renderer = open_renderer(graph);

    // Nothing recorded before the first frame
    assert_eq!(renderer.find_element_at(0.0, 200.0), None);

    let mut list = RenderList::new();
    renderer.render(&mut list, 0.0, 0.0, 200.0, 200.0).unwrap();

    assert_eq!(renderer.find_element_at(0.0, 200.0), Some(ElementKey::Node(a)));
    assert_eq!(renderer.find_element_at(198.0, 3.0), Some(ElementKey::Node(b)));
    assert_eq!(renderer.find_element_at(150.0, 50.0), Some(ElementKey::Sprite(s)));
    assert_eq!(renderer.find_element_at(100.0, 100.0), None);

    let everything = renderer.all_elements_in(Rect::new(DVec2::ZERO, DVec2::splat(200.0)));
    assert_eq!(
        everything,
        vec![ElementKey::Node(a), ElementKey::Node(b), ElementKey::Sprite(s)]
    );
    let left = renderer.all_elements_in(Rect::new(DVec2::new(0.0, 190.0), DVec2::splat(20.0)));
    assert_eq!(left, vec![ElementKey::Node(a)]);
}

#[test]
fn test_hit_testing_is_viewport_relative() {
    let (graph, a, _) = create_test_graph();
    let mut renderer = open_renderer(graph);
    let mut list = RenderList::new();
    renderer.render(&mut list, 50.0, 20.0, 200.0, 200.0).unwrap();

    // A is drawn at (50, 220) on the surface, (0, 200) in the viewport
    assert!(list.iter().any(|cmd| matches!(cmd,
        DrawCommand::Fill { transform, .. } if close(transform.translation, DVec2::new(50.0, 220.0)))));
    assert_eq!(renderer.find_element_at(0.0, 200.0), Some(ElementKey::Node(a)));
}

#[test]
fn test_move_element_at_pixel() {
    let (graph, a, _) = create_test_graph();
    let mut renderer = open_renderer(graph);
    let mut list = RenderList::new();
    renderer.render(&mut list, 0.0, 0.0, 200.0, 200.0).unwrap();

    let moved = renderer.move_element_at_pixel(ElementKey::Node(a), 100.0, 100.0).unwrap();
    let moved = moved.expect("transform is invertible");
    assert!(moved.truncate().distance(DVec2::ZERO) < 1e-9);
    let node = renderer.graph().unwrap().node(a).unwrap();
    assert_eq!(node.position, moved);
    assert!(renderer.needs_repaint());
}

#[test]
fn test_failing_group_does_not_abort_frame() {
    let mut graph = GraphicGraph::new();
    let broken = Style {
        fill_colors: vec![POISON],
        ..Style::default()
    };
    let fine = Style {
        fill_colors: vec![GREEN],
        ..Style::default()
    };
    let broken = graph.add_style_group(StyleGroup::new("broken", ElementKind::Node, broken));
    let fine = graph.add_style_group(StyleGroup::new("fine", ElementKind::Node, fine).with_z_index(1));
    graph.add_node("A", broken, DVec3::new(-50.0, -50.0, 0.0)).unwrap();
    graph.add_node("B", fine, DVec3::new(50.0, 50.0, 0.0)).unwrap();
    let mut renderer = open_renderer(graph);

    let mut surface = FailingSurface::default();
    assert!(renderer.render(&mut surface, 0.0, 0.0, 200.0, 200.0).is_ok());

    let fills: Vec<Vec4> = surface
        .inner
        .iter()
        .filter_map(|cmd| match cmd {
            DrawCommand::Fill {
                shape: Shape::Oval { .. },
                color,
                ..
            } => Some(*color),
            _ => None,
        })
        .collect();
    assert_eq!(fills, vec![GREEN]);
    assert_eq!(renderer.stats().frames, 1);
}

#[test]
fn test_failing_frame_steps_still_finish_the_frame() {
    let (mut graph, _, _) = create_test_graph();
    // No background fill: the background is cleared instead
    graph.set_style(Style {
        fill_mode: graph_view::style::FillMode::None,
        ..Style::graph_default()
    });
    let mut config = RendererConfig::default();
    config.selection.fill = POISON;
    let mut renderer = GraphRenderer::new(config, Box::new(NoIcons));
    renderer.open(graph).unwrap();
    renderer.begin_selection_at(10.0, 10.0);
    renderer.selection_grows_at(20.0, 20.0);
    assert!(renderer.needs_repaint());

    let mut surface = FailingSurface {
        fail_clear: true,
        ..FailingSurface::default()
    };
    assert!(renderer.render(&mut surface, 0.0, 0.0, 200.0, 200.0).is_ok());

    // 1. Nodes drawn despite the failed background and selection
    let ovals = surface
        .inner
        .iter()
        .filter(|cmd| matches!(cmd, DrawCommand::Fill { shape: Shape::Oval { .. }, .. }))
        .count();
    assert_eq!(ovals, 2);
    assert!(!surface.inner.iter().any(|cmd| matches!(cmd, DrawCommand::Clear { .. })));

    // 2. Frame bookkeeping still ran
    assert_eq!(renderer.stats().frames, 1);
    assert!(!renderer.needs_repaint());
}

#[test]
fn test_nothing_to_display() {
    let mut renderer = open_renderer(GraphicGraph::new());
    let mut list = RenderList::new();
    renderer.render(&mut list, 0.0, 0.0, 100.0, 50.0).unwrap();

    let config = RendererConfig::default();
    let cross: Vec<_> = list
        .iter()
        .filter_map(|cmd| match cmd {
            DrawCommand::Line { start, end, color, .. } => Some((*start, *end, *color)),
            _ => None,
        })
        .collect();
    assert_eq!(
        cross,
        vec![
            (DVec2::ZERO, DVec2::new(100.0, 50.0), config.empty_graph.cross),
            (DVec2::new(100.0, 0.0), DVec2::new(0.0, 50.0), config.empty_graph.cross),
        ]
    );
    let message = list.iter().any(|cmd| {
        matches!(cmd, DrawCommand::Text { text, color, .. }
            if *text == config.empty_graph.message && *color == config.empty_graph.message_color)
    });
    assert!(message);
}

#[test]
fn test_background_and_border() {
    let (mut graph, _, _) = create_test_graph();
    graph.set_style(Style {
        fill_colors: vec![Vec4::ONE],
        stroke_mode: StrokeMode::Plain,
        stroke_width: Lengths::px([2.0]),
        ..Style::graph_default()
    });
    let mut renderer = open_renderer(graph);
    let mut list = RenderList::new();
    renderer.render(&mut list, 0.0, 0.0, 200.0, 200.0).unwrap();

    // 1. Background first, one pixel larger than the viewport
    match &list.commands[0] {
        DrawCommand::Fill {
            shape: Shape::Rect { pos, size },
            color,
            ..
        } => {
            assert_eq!(*pos, DVec2::ZERO);
            assert_eq!(*size, DVec2::splat(201.0));
            assert_eq!(*color, Vec4::ONE);
        }
        other => panic!("Expected the background, got {other:?}"),
    }

    // 2. Border around the graph bounds
    let border = list.iter().find_map(|cmd| match cmd {
        DrawCommand::Stroke {
            shape: Shape::Rect { pos, size },
            width,
            ..
        } => Some((*pos, *size, *width)),
        _ => None,
    });
    let (pos, size, width) = border.expect("Expected the graph border");
    assert!(close(pos, DVec2::ZERO));
    assert!(close(size, DVec2::splat(200.0)));
    assert_eq!(width, 2.0);
}

#[test]
fn test_background_without_fill_clears() {
    let (mut graph, _, _) = create_test_graph();
    graph.set_style(Style {
        fill_mode: graph_view::style::FillMode::None,
        ..Style::graph_default()
    });
    let mut renderer = open_renderer(graph);
    let mut list = RenderList::new();
    renderer.render(&mut list, 0.0, 0.0, 200.0, 200.0).unwrap();
    assert!(matches!(list.commands[0], DrawCommand::Clear { .. }));
}

#[test]
fn test_layers_wrap_the_graph() {
    let (graph, _, _) = create_test_graph();
    let mut renderer = open_renderer(graph);
    let back_seen = Rc::new(RefCell::new(None));
    let fore_seen = Rc::new(RefCell::new(None));
    renderer.set_back_layer_renderer(Some(Box::new(MarkerLayer {
        seen: back_seen.clone(),
        marker: DVec2::new(1.0, 1.0),
    })));
    renderer.set_fore_layer_renderer(Some(Box::new(MarkerLayer {
        seen: fore_seen.clone(),
        marker: DVec2::new(2.0, 2.0),
    })));

    let mut list = RenderList::new();
    renderer.render(&mut list, 0.0, 0.0, 200.0, 200.0).unwrap();

    let index_of_marker = |m: DVec2| {
        list.iter()
            .position(|cmd| matches!(cmd, DrawCommand::Line { start, .. } if *start == m))
            .unwrap()
    };
    let back = index_of_marker(DVec2::new(1.0, 1.0));
    let fore = index_of_marker(DVec2::new(2.0, 2.0));
    let first_node = list
        .iter()
        .position(|cmd| matches!(cmd, DrawCommand::Fill { shape: Shape::Oval { .. }, .. }))
        .unwrap();
    assert!(back < first_node && first_node < fore);

    let view = back_seen.borrow().expect("back layer ran");
    assert!((view.px_per_gu - 2.0).abs() < 1e-12);
    assert_eq!(view.viewport_width, 200.0);
    assert_eq!(view.lo_visible, DVec2::new(-50.0, -50.0));
    assert_eq!(view.hi_visible, DVec2::new(50.0, 50.0));
    assert_eq!(*fore_seen.borrow(), Some(view));
}

#[test]
fn test_repaint_flag_follows_changes() {
    let (graph, a, _) = create_test_graph();
    let mut renderer = open_renderer(graph);
    assert!(renderer.needs_repaint());

    let mut list = RenderList::new();
    renderer.render(&mut list, 0.0, 0.0, 200.0, 200.0).unwrap();
    assert!(!renderer.needs_repaint());

    renderer.camera_mut().unwrap().set_view_percent(2.0);
    assert!(renderer.needs_repaint());
    renderer.render(&mut list, 0.0, 0.0, 200.0, 200.0).unwrap();
    assert!(!renderer.needs_repaint());

    renderer
        .graph_mut()
        .unwrap()
        .set_label(ElementKey::Node(a), "moved")
        .unwrap();
    assert!(renderer.needs_repaint());
}
