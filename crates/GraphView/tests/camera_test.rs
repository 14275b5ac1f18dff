use glam::{DVec2, DVec3};
use graph_view::bounds::BoundsContext;
use graph_view::camera::Camera;
use graph_view::metrics::Units;
use graph_view::model::{ElementKey, GraphicGraph, NodeKey};
use graph_view::style::{ElementKind, Style, StyleGroup};

fn close(a: DVec2, b: DVec2) -> bool {
    a.distance(b) < 1e-9
}

/// Two nodes spanning a 100 x 100 graph-unit box centred on the origin.
fn create_test_graph() -> (GraphicGraph, NodeKey, NodeKey) {
    let mut graph = GraphicGraph::new();
    let group = graph.add_style_group(StyleGroup::new("node", ElementKind::Node, Style::default()));
    let a = graph.add_node("A", group, DVec3::new(-50.0, -50.0, 0.0)).unwrap();
    let b = graph.add_node("B", group, DVec3::new(50.0, 50.0, 0.0)).unwrap();
    (graph, a, b)
}

/// Camera fitted to the test graph in a 200 x 200 viewport: 2 px per graph unit.
fn fitted_camera(graph: &GraphicGraph) -> Camera {
    let mut camera = Camera::new();
    let (lo, hi) = graph.bounds().unwrap();
    camera.set_bounds(lo, hi);
    camera.set_viewport(0.0, 0.0, 200.0, 200.0);
    camera.push_view();
    camera
}

#[test]
fn test_auto_fit_maps_bounds_to_viewport() {
    let (graph, _, _) = create_test_graph();
    let camera = fitted_camera(&graph);

    assert!(camera.is_auto_fit());
    assert_eq!(camera.view_percent(), 1.0);
    assert!((camera.metrics().ratio_px2gu - 2.0).abs() < 1e-12);

    // Y flips: graph "up" is screen "up"
    assert!(close(camera.graph_to_screen(DVec2::new(-50.0, -50.0)), DVec2::new(0.0, 200.0)));
    assert!(close(camera.graph_to_screen(DVec2::new(50.0, 50.0)), DVec2::new(200.0, 0.0)));
    assert!(close(camera.graph_to_screen(DVec2::ZERO), DVec2::new(100.0, 100.0)));
}

#[test]
fn test_transform_round_trip() {
    let (graph, _, _) = create_test_graph();
    let mut camera = fitted_camera(&graph);
    camera.set_view_rotation(30.0);
    camera.set_view_percent(0.5);
    camera.push_view();

    for x in [-50.0, -12.5, 0.0, 33.0, 50.0] {
        for y in [-50.0, 0.0, 7.25, 50.0] {
            let p = DVec2::new(x, y);
            let back = camera.screen_to_graph(camera.graph_to_screen(p)).unwrap();
            assert!(close(back, p), "{p} came back as {back}");
        }
    }
}

#[test]
fn test_auto_fit_is_idempotent() {
    let (graph, _, _) = create_test_graph();
    let mut camera = fitted_camera(&graph);
    let first = camera.forward();
    camera.push_view();
    assert_eq!(camera.forward(), first);
}

#[test]
fn test_visibility_under_auto_fit() {
    let (graph, a, _) = create_test_graph();
    let mut camera = fitted_camera(&graph);

    // 1. Look far away: node A is off screen
    camera.set_view_center(1000.0, 1000.0, 0.0);
    camera.push_view();
    assert!(!camera.is_visible(&graph, ElementKey::Node(a)));

    // 2. Back to auto-fit: visible immediately, before any recompute
    camera.set_auto_fit_view(true);
    assert!(camera.is_visible(&graph, ElementKey::Node(a)));
}

#[test]
fn test_hidden_elements_are_never_visible() {
    let (mut graph, a, _) = create_test_graph();
    graph.set_hidden(ElementKey::Node(a), true).unwrap();
    let camera = fitted_camera(&graph);
    assert!(!camera.is_visible(&graph, ElementKey::Node(a)));
}

#[test]
fn test_view_setters_leave_auto_fit_and_request_repaint() {
    let (graph, _, _) = create_test_graph();
    let mut camera = fitted_camera(&graph);
    assert!(!camera.take_repaint_request());

    camera.set_view_percent(2.0);
    assert!(!camera.is_auto_fit());
    assert_eq!(camera.view_percent(), 2.0);
    // Manual view starts where auto-fit left it
    assert_eq!(camera.view_center(), DVec3::ZERO);
    assert!(camera.take_repaint_request());
    assert!(!camera.take_repaint_request());

    camera.reset_view();
    camera.set_view_rotation(90.0);
    assert!(!camera.is_auto_fit());
    assert_eq!(camera.view_rotation(), 90.0);
    camera.push_view();
    // (50, 0) scales to (100, 0), rotates to (0, 100), then moves by the viewport centre
    assert!(close(camera.graph_to_screen(DVec2::new(50.0, 0.0)), DVec2::new(100.0, 200.0)));

    camera.reset_view();
    assert!(camera.is_auto_fit());
    assert_eq!(camera.view_rotation(), 0.0);
}

#[test]
fn test_zoom_shrinks_visible_region() {
    let (graph, _, _) = create_test_graph();
    let mut camera = fitted_camera(&graph);
    camera.set_view_percent(0.5);
    camera.push_view();

    // Half the graph fills the viewport
    let metrics = camera.metrics();
    assert!(close(metrics.lo_visible, DVec2::new(-25.0, -25.0)));
    assert!(close(metrics.hi_visible, DVec2::new(25.0, 25.0)));
}

#[test]
fn test_graph_viewport_pins_framing() {
    let (graph, _, _) = create_test_graph();
    let mut camera = fitted_camera(&graph);
    camera.set_graph_viewport(0.0, 0.0, 10.0, 10.0);

    assert!(!camera.is_auto_fit());
    assert_eq!(camera.view_center(), DVec3::new(5.0, 5.0, 0.0));
    assert_eq!(camera.view_percent(), 1.0);
    assert!((camera.graph_dimension() - 200f64.sqrt()).abs() < 1e-12);

    camera.push_view();
    assert!(close(camera.graph_to_screen(DVec2::ZERO), DVec2::new(0.0, 200.0)));
    assert!(close(camera.graph_to_screen(DVec2::new(10.0, 10.0)), DVec2::new(200.0, 0.0)));

    camera.remove_graph_viewport();
    assert!(camera.graph_viewport().is_none());
    assert!(camera.is_auto_fit());
    assert!((camera.graph_dimension() - camera.metrics().diagonal).abs() < 1e-12);
}

#[test]
fn test_non_invertible_transform_reports_none() {
    let (graph, _, _) = create_test_graph();
    let mut camera = fitted_camera(&graph);
    let visible = (camera.metrics().lo_visible, camera.metrics().hi_visible);

    // A zero-sized viewport collapses the scale to zero
    camera.set_view_percent(1.0);
    camera.set_viewport(0.0, 0.0, 0.0, 0.0);
    camera.push_view();

    assert!(!camera.is_invertible());
    assert_eq!(camera.screen_to_graph(DVec2::new(10.0, 10.0)), None);
    assert_eq!(camera.transform_px_to_gu(10.0, 10.0), None);
    assert_eq!((camera.metrics().lo_visible, camera.metrics().hi_visible), visible);
}

#[test]
fn test_put_element_removes_degenerate_bounds() {
    let mut camera = Camera::new();
    let valid = BoundsContext::rect("n", DVec2::ZERO, DVec2::new(4.0, 4.0)).unwrap();
    assert!(camera.put_element(valid));
    assert!(camera.element("n").is_some());

    let flat = BoundsContext::rect("n", DVec2::ZERO, DVec2::new(4.0, 0.0)).unwrap();
    assert!(!camera.put_element(flat));
    assert!(camera.element("n").is_none());

    let negative = BoundsContext::ellipse("m", DVec2::ZERO, -1.0, 3.0).unwrap();
    assert!(!camera.put_element(negative));
    assert!(camera.element("m").is_none());
}

#[test]
fn test_sprite_positions_follow_attachment() {
    let (mut graph, a, b) = create_test_graph();
    let group = graph.add_style_group(StyleGroup::new("sprite", ElementKind::Sprite, Style::default()));
    let camera = fitted_camera(&graph);

    // 1. Node-attached: polar offset, radius in x, angle in degrees in z
    let orbit = graph
        .add_sprite("orbit", group, DVec3::new(10.0, 0.0, 90.0), Units::Gu)
        .unwrap();
    graph.attach_sprite_to_node(orbit, a).unwrap();
    let p = camera.sprite_position(&graph, orbit, Units::Gu).unwrap();
    assert!(close(p, DVec2::new(-50.0, -40.0)));

    // 2. Edge-attached: halfway along, offset to the left of the edge
    let edge_group = graph.add_style_group(StyleGroup::new("edge", ElementKind::Edge, Style::default()));
    let edge = graph.add_edge("AB", a, b, false, edge_group).unwrap();
    let label = graph
        .add_sprite("label", group, DVec3::new(0.5, 0.0, 0.0), Units::Gu)
        .unwrap();
    graph.attach_sprite_to_edge(label, edge).unwrap();
    let p = camera.sprite_position(&graph, label, Units::Gu).unwrap();
    assert!(close(p, DVec2::ZERO));
    let px = camera.sprite_position(&graph, label, Units::Px).unwrap();
    assert!(close(px, DVec2::new(100.0, 100.0)));
    assert_eq!(camera.sprite_position(&graph, label, Units::Percents), None);

    // 3. Free sprite in percent of the viewport
    let corner = graph
        .add_sprite("corner", group, DVec3::new(25.0, 50.0, 0.0), Units::Percents)
        .unwrap();
    let px = camera.sprite_position(&graph, corner, Units::Px).unwrap();
    assert!(close(px, DVec2::new(50.0, 100.0)));
}

#[test]
fn test_edge_sprite_offset_is_perpendicular() {
    let mut graph = GraphicGraph::new();
    let nodes = graph.add_style_group(StyleGroup::new("node", ElementKind::Node, Style::default()));
    let edges = graph.add_style_group(StyleGroup::new("edge", ElementKind::Edge, Style::default()));
    let sprites = graph.add_style_group(StyleGroup::new("sprite", ElementKind::Sprite, Style::default()));
    let a = graph.add_node("A", nodes, DVec3::ZERO).unwrap();
    let b = graph.add_node("B", nodes, DVec3::new(100.0, 0.0, 0.0)).unwrap();
    let edge = graph.add_edge("AB", a, b, true, edges).unwrap();
    let s = graph
        .add_sprite("s", sprites, DVec3::new(0.25, 10.0, 0.0), Units::Gu)
        .unwrap();
    graph.attach_sprite_to_edge(s, edge).unwrap();

    let camera = Camera::new();
    let p = camera.sprite_position(&graph, s, Units::Gu).unwrap();
    assert!(close(p, DVec2::new(25.0, 10.0)));

    // Offsets past the ends are clamped
    graph.move_element(ElementKey::Sprite(s), DVec3::new(3.0, 0.0, 0.0)).unwrap();
    let p = camera.sprite_position(&graph, s, Units::Gu).unwrap();
    assert!(close(p, DVec2::new(100.0, 0.0)));
}

#[test]
fn test_curved_edge_sprite_follows_the_curve() {
    let mut graph = GraphicGraph::new();
    let nodes = graph.add_style_group(StyleGroup::new("node", ElementKind::Node, Style::default()));
    let edges = graph.add_style_group(StyleGroup::new("edge", ElementKind::Edge, Style::default()));
    let sprites = graph.add_style_group(StyleGroup::new("sprite", ElementKind::Sprite, Style::default()));
    let a = graph.add_node("A", nodes, DVec3::ZERO).unwrap();
    let b = graph.add_node("B", nodes, DVec3::new(100.0, 0.0, 0.0)).unwrap();
    let edge = graph.add_edge("AB", a, b, true, edges).unwrap();
    graph
        .set_control_points(edge, Some([DVec2::new(0.0, 100.0), DVec2::new(100.0, 100.0)]))
        .unwrap();
    let s = graph
        .add_sprite("s", sprites, DVec3::new(0.5, 10.0, 0.0), Units::Gu)
        .unwrap();
    graph.attach_sprite_to_edge(s, edge).unwrap();
    let camera = Camera::new();

    // Halfway: B(0.5) = (50, 75), tangent (150, 0), normal (0, 1)
    let p = camera.sprite_position(&graph, s, Units::Gu).unwrap();
    assert!(close(p, DVec2::new(50.0, 85.0)));

    // At the start the tangent points at the first control point: normal (-1, 0)
    graph.move_element(ElementKey::Sprite(s), DVec3::new(0.0, 10.0, 0.0)).unwrap();
    let p = camera.sprite_position(&graph, s, Units::Gu).unwrap();
    assert!(close(p, DVec2::new(-10.0, 0.0)));
}
