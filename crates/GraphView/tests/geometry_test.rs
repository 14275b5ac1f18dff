use glam::DVec2;
use graph_view::geometry::{self, Rect};

#[test]
fn test_crossing_segments_intersect() {
    let p = geometry::intersect_segments(
        DVec2::new(0.0, 0.0),
        DVec2::new(10.0, 10.0),
        DVec2::new(0.0, 10.0),
        DVec2::new(10.0, 0.0),
    );
    let p = p.expect("diagonals of a square cross");
    assert!(p.distance(DVec2::new(5.0, 5.0)) < 1e-9);
}

#[test]
fn test_parallel_and_disjoint_segments() {
    // Parallel
    let parallel = geometry::intersect_segments(
        DVec2::new(0.0, 0.0),
        DVec2::new(10.0, 0.0),
        DVec2::new(0.0, 5.0),
        DVec2::new(10.0, 5.0),
    );
    assert_eq!(parallel, None);

    // Supporting lines meet at (5, 5), outside the first segment
    let disjoint = geometry::intersect_segments(
        DVec2::new(0.0, 0.0),
        DVec2::new(1.0, 1.0),
        DVec2::new(0.0, 10.0),
        DVec2::new(10.0, 0.0),
    );
    assert_eq!(disjoint, None);

    // Zero-length segment
    let point = geometry::intersect_segments(DVec2::ONE, DVec2::ONE, DVec2::ZERO, DVec2::new(2.0, 2.0));
    assert_eq!(point, None);
}

#[test]
fn test_ray_to_ellipse_boundary() {
    // Circles answer the radius whatever the direction
    assert_eq!(geometry::ray_to_ellipse_boundary(3.0, 3.0, DVec2::new(1.0, 7.0)), 3.0);

    let along_x = geometry::ray_to_ellipse_boundary(4.0, 2.0, DVec2::X);
    let along_y = geometry::ray_to_ellipse_boundary(4.0, 2.0, DVec2::NEG_Y);
    assert!((along_x - 4.0).abs() < 1e-12);
    assert!((along_y - 2.0).abs() < 1e-12);

    // Diagonal lands between the two radii
    let diagonal = geometry::ray_to_ellipse_boundary(4.0, 2.0, DVec2::ONE);
    assert!(diagonal > 2.0 && diagonal < 4.0);
}

#[test]
fn test_approximate_equality_epsilons() {
    assert!(geometry::approx_eq(1.0, 1.00005));
    assert!(!geometry::approx_eq(1.0, 1.001));
    assert!(geometry::approximately_equals(0.5, 0.5, 0.0));
    assert!(!geometry::approximately_equals(0.0, 1e-7, geometry::PARALLEL_EPSILON));
    assert_eq!(geometry::APPROX_EPSILON, 1e-4);
    assert_eq!(geometry::SEGMENT_TOLERANCE, 0.01);
}

#[test]
fn test_cubic_helpers() {
    let (p0, p1, p2, p3) = (
        DVec2::new(0.0, 0.0),
        DVec2::new(1.0, 0.0),
        DVec2::new(2.0, 0.0),
        DVec2::new(3.0, 0.0),
    );
    assert_eq!(geometry::cubic_point(p0, p1, p2, p3, 0.0), p0);
    assert_eq!(geometry::cubic_point(p0, p1, p2, p3, 1.0), p3);
    assert!(geometry::cubic_point(p0, p1, p2, p3, 0.5).distance(DVec2::new(1.5, 0.0)) < 1e-12);

    // Left-hand normal of a curve heading along +X points along +Y
    let normal = geometry::cubic_perpendicular(p0, p1, p2, p3, 0.5);
    assert!(normal.distance(DVec2::Y) < 1e-12);
}

#[test]
fn test_rect_normalisation_and_overlap() {
    let rect = Rect::from_corners(DVec2::new(10.0, 10.0), DVec2::new(2.0, 2.0));
    assert_eq!(rect.min, DVec2::new(2.0, 2.0));
    assert_eq!(rect.max, DVec2::new(10.0, 10.0));
    assert_eq!(rect.size(), DVec2::new(8.0, 8.0));
    assert!(rect.contains(DVec2::new(2.0, 10.0)));

    let touching = Rect::new(DVec2::new(10.0, 0.0), DVec2::new(5.0, 5.0));
    assert!(rect.overlaps(&touching));
    let apart = Rect::new(DVec2::new(11.0, 0.0), DVec2::new(5.0, 5.0));
    assert!(!rect.overlaps(&apart));

    assert!(Rect::new(DVec2::ZERO, DVec2::new(0.0, 3.0)).is_degenerate());
}
