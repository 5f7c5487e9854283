use kerfnest_camtools::geometry::{
    point_in_polygon, rotate_point, simplify, three_point_circle_center, Point2D,
};
use kerfnest_core::GeometryError;

fn square_10() -> Vec<Point2D> {
    vec![
        Point2D::new(0.0, 0.0),
        Point2D::new(10.0, 0.0),
        Point2D::new(10.0, 10.0),
        Point2D::new(0.0, 10.0),
    ]
}

#[test]
fn test_point_in_square() {
    let square = square_10();
    assert!(point_in_polygon(&Point2D::new(5.0, 5.0), &square));
    assert!(!point_in_polygon(&Point2D::new(20.0, 20.0), &square));
    assert!(!point_in_polygon(&Point2D::new(-1.0, 5.0), &square));
}

#[test]
fn test_on_edge_points_are_deterministic() {
    let square = square_10();
    // Right and top edges count as inside, left and bottom as outside.
    assert!(point_in_polygon(&Point2D::new(10.0, 5.0), &square));
    assert!(point_in_polygon(&Point2D::new(5.0, 10.0), &square));
    assert!(!point_in_polygon(&Point2D::new(0.0, 5.0), &square));
    assert!(!point_in_polygon(&Point2D::new(5.0, 0.0), &square));

    for _ in 0..3 {
        assert!(point_in_polygon(&Point2D::new(10.0, 5.0), &square));
    }
}

#[test]
fn test_point_in_concave_polygon() {
    // U shape open at the top.
    let u = vec![
        Point2D::new(0.0, 0.0),
        Point2D::new(9.0, 0.0),
        Point2D::new(9.0, 9.0),
        Point2D::new(6.0, 9.0),
        Point2D::new(6.0, 3.0),
        Point2D::new(3.0, 3.0),
        Point2D::new(3.0, 9.0),
        Point2D::new(0.0, 9.0),
    ];
    assert!(point_in_polygon(&Point2D::new(1.5, 6.0), &u));
    assert!(!point_in_polygon(&Point2D::new(4.5, 6.0), &u));
}

#[test]
fn test_rotation_round_trip() {
    let center = Point2D::new(2.0, -1.0);
    let start = Point2D::new(7.5, 3.25);
    let mut p = start;
    for _ in 0..12 {
        p = rotate_point(&center, &p, 30.0);
    }
    assert!(p.distance_to(&start) < 1e-9);
}

#[test]
fn test_positive_rotation_is_clockwise() {
    let origin = Point2D::new(0.0, 0.0);
    let p = rotate_point(&origin, &Point2D::new(1.0, 0.0), 90.0);
    assert!(p.distance_to(&Point2D::new(0.0, -1.0)) < 1e-12);
}

#[test]
fn test_three_point_circle_center() {
    let c = three_point_circle_center(
        &Point2D::new(4.0, 1.0),
        &Point2D::new(1.0, 4.0),
        &Point2D::new(-2.0, 1.0),
    )
    .unwrap();
    assert!(c.distance_to(&Point2D::new(1.0, 1.0)) < 1e-9);
}

#[test]
fn test_collinear_points_have_no_center() {
    let result = three_point_circle_center(
        &Point2D::new(0.0, 0.0),
        &Point2D::new(1.0, 1.0),
        &Point2D::new(2.0, 2.0),
    );
    assert!(matches!(result, Err(GeometryError::CollinearPoints { .. })));
}

#[test]
fn test_simplify_needs_two_points() {
    let result = simplify(&[Point2D::new(1.0, 1.0)], 0.1);
    assert!(matches!(
        result,
        Err(GeometryError::NotEnoughPoints {
            required: 2,
            actual: 1,
            ..
        })
    ));
}

#[test]
fn test_simplify_keeps_corners() {
    let points = vec![
        Point2D::new(0.0, 0.0),
        Point2D::new(5.0, 0.01),
        Point2D::new(10.0, 0.0),
        Point2D::new(10.0, 5.0),
        Point2D::new(10.0, 10.0),
    ];
    let out = simplify(&points, 0.1).unwrap();
    assert_eq!(
        out,
        vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(10.0, 10.0)
        ]
    );
}
