use kerfnest_camtools::chainify::Chain;
use kerfnest_camtools::geometry::{BoundingBox, Point2D};
use kerfnest_camtools::kernel::CavalierKernel;
use kerfnest_camtools::nesting::{NestingParameters, NestingSession, NestingState};
use kerfnest_camtools::part::{Part, PartId, PartStore, PartTransform};
use kerfnest_camtools::polypart::{build_part, BuildOptions};

fn ring(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<Point2D> {
    vec![
        Point2D::new(min_x, min_y),
        Point2D::new(max_x, min_y),
        Point2D::new(max_x, max_y),
        Point2D::new(min_x, max_y),
        Point2D::new(min_x, min_y),
    ]
}

fn square_part(name: &str, half: f64) -> Part {
    let mut chain = Chain::new(ring(-half, -half, half, half), "0");
    chain.update_closed(0.01);
    Part::new(name, vec![chain])
}

fn options(kerf_radius: f64) -> BuildOptions {
    BuildOptions {
        kerf_radius,
        closed_tolerance: 0.1,
        simplify_tolerance: 0.02,
    }
}

fn strip_params() -> NestingParameters {
    NestingParameters {
        material_min: Point2D::new(0.0, 0.0),
        material_max: Point2D::new(3.0, 1.5),
        rotation_increment_deg: 90.0,
        translation_step: Point2D::new(0.15, 0.15),
        kerf_width: 0.1,
        ..Default::default()
    }
}

fn disjoint(a: &BoundingBox, b: &BoundingBox) -> bool {
    a.max.x < b.min.x || b.max.x < a.min.x || a.max.y < b.min.y || b.max.y < a.min.y
}

#[test]
fn test_outer_offset_grows_by_kerf() {
    let part = square_part("unit", 0.5);
    let poly = build_part(&CavalierKernel::default(), PartId(1), &part, &options(0.1));
    let bbox = poly.bounding_box().unwrap();
    assert!((bbox.width() - 1.2).abs() < 1e-6);
    assert!((bbox.height() - 1.2).abs() < 1e-6);
    assert!(poly.outer().unwrap().closed);
}

#[test]
fn test_hole_offset_shrinks_by_kerf() {
    let mut outer = Chain::new(ring(-3.0, -3.0, 3.0, 3.0), "0");
    outer.update_closed(0.01);
    let mut hole = Chain::new(ring(-1.0, -1.0, 1.0, 1.0), "0");
    hole.update_closed(0.01);
    let part = Part::new("frame", vec![outer, hole]);

    let poly = build_part(&CavalierKernel::default(), PartId(1), &part, &options(0.1));
    assert_eq!(poly.polygons.len(), 2);
    let hole_poly = &poly.polygons[0];
    assert!(hole_poly.is_inside);
    let hole_box = BoundingBox::from_points(&hole_poly.vertices).unwrap();
    assert!((hole_box.width() - 1.8).abs() < 1e-6);
    let outer_box = BoundingBox::from_points(&poly.outer().unwrap().vertices).unwrap();
    assert!((outer_box.width() - 6.2).abs() < 1e-6);
}

#[test]
fn test_build_is_idempotent() {
    let part = square_part("unit", 0.5);
    let mut poly = build_part(&CavalierKernel::default(), PartId(1), &part, &options(0.1));
    let transform = PartTransform {
        offset: Point2D::new(3.0, 4.0),
        angle: 30.0,
        visible: true,
    };
    poly.build(&transform);
    let first = poly.built_polygons().to_vec();
    let first_box = poly.bounding_box();
    poly.build(&transform);
    assert_eq!(poly.built_polygons(), first.as_slice());
    assert_eq!(poly.bounding_box(), first_box);
}

#[test]
fn test_two_squares_are_placed_side_by_side() {
    let mut store = PartStore::new();
    let a = store.insert(square_part("a", 0.5));
    let b = store.insert(square_part("b", 0.5));
    let params = strip_params();

    let mut session = NestingSession::for_parts(params, &store, &[a, b]).unwrap();
    let state = session.run_to_completion(&mut store);
    assert_eq!(state, NestingState::AllPlaced);
    assert_eq!(session.placed().len(), 2);

    let material = params.material();
    let boxes: Vec<BoundingBox> = session
        .placed()
        .iter()
        .map(|p| p.bounding_box().unwrap())
        .collect();
    for bbox in &boxes {
        assert!(bbox.is_strictly_inside(&material));
    }
    assert!(disjoint(&boxes[0], &boxes[1]));

    // The first part sits at its default offset.
    let first = store.transform(a).unwrap();
    assert!((first.offset.x - 0.65).abs() < 1e-9);
    assert!((first.offset.y - 0.65).abs() < 1e-9);
    assert!(store.transform(b).unwrap().visible);
}

#[test]
fn test_advance_respects_budget() {
    let mut store = PartStore::new();
    let a = store.insert(square_part("a", 0.5));
    let b = store.insert(square_part("b", 0.5));
    let mut session = NestingSession::for_parts(strip_params(), &store, &[a, b]).unwrap();

    assert!(session.advance(&mut store, 1));
    assert_eq!(session.ticks(), 1);
    assert!(!session.state().is_terminal());

    while session.advance(&mut store, 3) {}
    assert_eq!(session.state(), NestingState::AllPlaced);
    // Further ticks are no-ops.
    assert!(!session.tick(&mut store));
}

#[test]
fn test_nests_around_part_already_on_material() {
    let mut store = PartStore::new();
    let fixed = store.insert(square_part("fixed", 0.5));
    store.transform_mut(fixed).unwrap().offset = Point2D::new(0.65, 0.65);
    let fresh = store.insert(square_part("fresh", 0.5));

    let mut session = NestingSession::for_parts(strip_params(), &store, &[fresh]).unwrap();
    assert_eq!(session.placed().len(), 1);
    assert_eq!(session.run_to_completion(&mut store), NestingState::AllPlaced);

    let boxes: Vec<BoundingBox> = session
        .placed()
        .iter()
        .map(|p| p.bounding_box().unwrap())
        .collect();
    assert!(disjoint(&boxes[0], &boxes[1]));
    assert_eq!(store.transform(fixed).unwrap().offset, Point2D::new(0.65, 0.65));
}

#[test]
fn test_oversized_part_runs_out_of_material() {
    let mut store = PartStore::new();
    let big = store.insert(square_part("big", 1.0));
    store.transform_mut(big).unwrap().visible = false;

    let params = NestingParameters {
        material_min: Point2D::new(0.0, 0.0),
        material_max: Point2D::new(1.0, 1.0),
        ..Default::default()
    };
    let mut session = NestingSession::for_parts(params, &store, &[big]).unwrap();
    assert!(!session.tick(&mut store));
    assert_eq!(session.state(), NestingState::OutOfMaterial);
    assert!(store.transform(big).unwrap().visible);
    assert!(session.placed().is_empty());
}

#[test]
fn test_full_rotation_sweep_returns_to_start() {
    let mut outline = Chain::new(
        vec![
            Point2D::new(-2.0, -1.0),
            Point2D::new(3.0, -1.0),
            Point2D::new(3.0, 0.5),
            Point2D::new(0.0, 2.0),
            Point2D::new(-2.0, 2.0),
            Point2D::new(-2.0, -1.0),
        ],
        "0",
    );
    outline.update_closed(0.01);
    let part = Part::new("wedge", vec![outline]);
    let mut poly = build_part(&CavalierKernel::default(), PartId(1), &part, &options(0.1));

    for increment in [NestingParameters::default().rotation_increment_deg, 7.5] {
        let mut transform = PartTransform {
            offset: Point2D::new(3.0, 4.0),
            ..Default::default()
        };
        poly.build(&transform);
        let start = poly.built_polygons().to_vec();

        let steps = (360.0 / increment).ceil() as usize;
        for _ in 0..steps {
            transform.angle += increment;
            if transform.angle >= 360.0 {
                transform.angle -= 360.0;
            }
            poly.build(&transform);
        }

        assert!(transform.angle.abs() < 1e-9);
        let end = poly.built_polygons();
        assert_eq!(end.len(), start.len());
        for (a, b) in start.iter().zip(end) {
            assert_eq!(a.len(), b.len());
            for (p, q) in a.iter().zip(b) {
                assert!(p.distance_to(q) < 1e-9, "{:?} drifted to {:?}", p, q);
            }
        }
    }
}
