use glam::DVec2;
use graph_view::CanvasError;
use graph_view::bounds::{Bounds, BoundsContext};

fn close(a: DVec2, b: DVec2) -> bool {
    a.distance(b) < 1e-9
}

#[test]
fn test_empty_id_is_rejected() {
    let result = BoundsContext::rect("", DVec2::ZERO, DVec2::ONE);
    assert!(matches!(result, Err(CanvasError::EmptyElementId)));
}

#[test]
fn test_circle_clips_at_radius() {
    let ctx = BoundsContext::ellipse("n", DVec2::ZERO, 10.0, 10.0).unwrap();

    // Leaving the centre
    let p = ctx.intersects(0.0, 0.0, 20.0, 0.0).unwrap();
    assert!(close(p, DVec2::new(10.0, 0.0)));

    // Arriving from outside: entry point nearest the start
    let p = ctx.intersects(-30.0, 0.0, 0.0, 0.0).unwrap();
    assert!(close(p, DVec2::new(-10.0, 0.0)));

    // Segment that never reaches the outline
    assert_eq!(ctx.intersects(0.0, 0.0, 5.0, 0.0), None);
}

#[test]
fn test_ellipse_clips_on_its_outline() {
    let ctx = BoundsContext::ellipse("n", DVec2::ZERO, 20.0, 10.0).unwrap();
    let p = ctx.intersects(0.0, 0.0, 0.0, 30.0).unwrap();
    assert!(close(p, DVec2::new(0.0, 10.0)));
    let p = ctx.intersects(0.0, 0.0, -40.0, 0.0).unwrap();
    assert!(close(p, DVec2::new(-20.0, 0.0)));
}

#[test]
fn test_box_clips_at_nearest_side() {
    let ctx = BoundsContext::rect("b", DVec2::ZERO, DVec2::new(5.0, 5.0)).unwrap();
    let p = ctx.intersects(0.0, 0.0, 20.0, 0.0).unwrap();
    assert!(close(p, DVec2::new(5.0, 0.0)));

    let p = ctx.intersects(0.0, 0.0, 0.0, -20.0).unwrap();
    assert!(close(p, DVec2::new(0.0, -5.0)));
}

#[test]
fn test_ellipse_containment_uses_enclosing_box() {
    // Round bounds are hit-tested against their bounding box: the corner
    // (9, 9) lies outside the circle of radius 10 but still counts as inside.
    let ctx = BoundsContext::ellipse("n", DVec2::ZERO, 10.0, 10.0).unwrap();
    assert!(ctx.contains(DVec2::new(9.0, 9.0)));
    assert!(ctx.contains(DVec2::ZERO));
    assert!(!ctx.contains(DVec2::new(11.0, 0.0)));
}

#[test]
fn test_degenerate_bounds_contain_nothing() {
    let ctx = BoundsContext::rect("flat", DVec2::ZERO, DVec2::new(0.0, 5.0)).unwrap();
    assert!(ctx.bounds().is_degenerate());
    assert!(!ctx.contains(DVec2::ZERO));

    let ellipse = Bounds::Ellipse {
        center: DVec2::ZERO,
        radius_x: 3.0,
        radius_y: -1.0,
    };
    assert!(ellipse.is_degenerate());
}
