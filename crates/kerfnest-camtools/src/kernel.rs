//! Geometry kernel.
//!
//! Polygon offsetting and intersection sit behind [`GeometryKernel`] so
//! the part builder and nesting search never touch the backing library.
//! [`CavalierKernel`] is the production implementation on top of
//! `cavalier_contours`.

use crate::flatten::bulge_points;
use crate::geometry::{point_in_polygon, Point2D};
use cavalier_contours::polyline::{
    BooleanOp, PlineSource, PlineSourceMut, PlineVertex, Polyline,
};
use std::panic;
use tracing::{error, warn};

/// Vertices closer than this are merged before handing a ring to the kernel.
const DUPLICATE_TOLERANCE: f64 = 1e-4;

/// Polygon operations the builder and nesting search depend on.
///
/// Polygons are rings of points. Input rings may or may not repeat their
/// first point at the end; output rings always do.
pub trait GeometryKernel {
    /// Offset a closed polygon. Positive distances grow the enclosed area,
    /// negative ones shrink it. An empty result means the polygon vanished.
    fn offset(&self, polygon: &[Point2D], distance: f64) -> Vec<Vec<Point2D>>;

    /// Regions covered by both polygons.
    fn intersection(&self, a: &[Point2D], b: &[Point2D]) -> Vec<Vec<Point2D>>;

    /// True when the polygons overlap.
    fn intersects(&self, a: &[Point2D], b: &[Point2D]) -> bool {
        !self.intersection(a, b).is_empty()
    }
}

/// Kernel backed by `cavalier_contours`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CavalierKernel {
    /// Segments used for a full turn when flattening arcs the offset
    /// introduces at convex corners.
    pub arc_segments: usize,
}

impl Default for CavalierKernel {
    fn default() -> Self {
        Self { arc_segments: 100 }
    }
}

impl CavalierKernel {
    pub fn new(arc_segments: usize) -> Self {
        Self {
            arc_segments: arc_segments.max(4),
        }
    }

    /// Build a closed polyline with duplicate vertices removed and the
    /// requested winding. `None` when fewer than three vertices remain.
    fn prepare_polygon(vertices: &[Point2D], counter_clockwise: bool) -> Option<Polyline> {
        let mut clean: Vec<Point2D> = Vec::with_capacity(vertices.len());
        for p in vertices {
            match clean.last() {
                Some(last) if last.distance_to(p) <= DUPLICATE_TOLERANCE => {}
                _ => clean.push(*p),
            }
        }
        if clean.len() > 1 {
            if let (Some(first), Some(last)) = (clean.first(), clean.last()) {
                if first.distance_to(last) <= DUPLICATE_TOLERANCE {
                    clean.pop();
                }
            }
        }
        if clean.len() < 3 {
            return None;
        }

        let area = signed_area(&clean);
        if (area > 0.0) != counter_clockwise {
            clean.reverse();
        }

        let mut polyline = Polyline::new();
        for p in clean {
            polyline.add_vertex(PlineVertex::new(p.x, p.y, 0.0));
        }
        polyline.set_is_closed(true);
        Some(polyline)
    }

    /// Flatten a closed kernel polyline back to a point ring.
    fn polyline_to_ring(&self, pline: &Polyline) -> Vec<Point2D> {
        let count = pline.vertex_data.len();
        let mut ring = Vec::with_capacity(count + 1);
        for i in 0..count {
            let v1 = pline.vertex_data[i];
            let v2 = pline.vertex_data[(i + 1) % count];
            let p1 = Point2D::new(v1.x, v1.y);
            let p2 = Point2D::new(v2.x, v2.y);
            ring.push(p1);
            if v1.bulge.abs() > 1e-9 {
                let sweep = 4.0 * v1.bulge.abs().atan();
                let segments =
                    ((sweep / std::f64::consts::TAU) * self.arc_segments as f64).ceil() as usize;
                if let Ok(points) = bulge_points(&p1, &p2, v1.bulge, segments.max(1)) {
                    if points.len() > 2 {
                        ring.extend_from_slice(&points[1..points.len() - 1]);
                    }
                }
            }
        }
        if let Some(first) = ring.first().copied() {
            ring.push(first);
        }
        ring
    }
}

impl GeometryKernel for CavalierKernel {
    fn offset(&self, polygon: &[Point2D], distance: f64) -> Vec<Vec<Point2D>> {
        // Clockwise input: cavalier offsets to the left of travel, which is
        // outward for a clockwise ring.
        let Some(pline) = Self::prepare_polygon(polygon, false) else {
            return Vec::new();
        };
        if distance == 0.0 {
            return vec![self.polyline_to_ring(&pline)];
        }
        match panic::catch_unwind(panic::AssertUnwindSafe(|| pline.parallel_offset(distance))) {
            Ok(results) => results
                .iter()
                .filter(|p| p.vertex_count() > 1)
                .map(|p| self.polyline_to_ring(p))
                .collect(),
            Err(_) => {
                error!("Panic during parallel offset by {}", distance);
                Vec::new()
            }
        }
    }

    fn intersection(&self, a: &[Point2D], b: &[Point2D]) -> Vec<Vec<Point2D>> {
        let (Some(pa), Some(pb)) = (
            Self::prepare_polygon(a, true),
            Self::prepare_polygon(b, true),
        ) else {
            return Vec::new();
        };
        match panic::catch_unwind(panic::AssertUnwindSafe(|| pa.boolean(&pb, BooleanOp::And))) {
            Ok(result) => result
                .pos_plines
                .iter()
                .map(|r| self.polyline_to_ring(&r.pline))
                .collect(),
            Err(_) => {
                error!("Panic during polygon intersection");
                Vec::new()
            }
        }
    }

    fn intersects(&self, a: &[Point2D], b: &[Point2D]) -> bool {
        // Coincident rings can come back empty from the boolean.
        if a.iter().any(|p| point_in_polygon(p, b)) || b.iter().any(|p| point_in_polygon(p, a)) {
            return true;
        }
        let (Some(pa), Some(pb)) = (
            Self::prepare_polygon(a, true),
            Self::prepare_polygon(b, true),
        ) else {
            return false;
        };
        match panic::catch_unwind(panic::AssertUnwindSafe(|| pa.boolean(&pb, BooleanOp::And))) {
            Ok(result) => !result.pos_plines.is_empty(),
            Err(_) => {
                // Treat an unusable answer as a collision so nothing is
                // placed on top of another part.
                warn!("Panic during polygon intersection, assuming overlap");
                true
            }
        }
    }
}

/// Shoelace area. Positive for counter-clockwise rings.
pub fn signed_area(points: &[Point2D]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..points.len() {
        let p1 = &points[i];
        let p2 = &points[(i + 1) % points.len()];
        sum += p1.x * p2.y - p2.x * p1.y;
    }
    sum / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;

    fn square(min: f64, max: f64) -> Vec<Point2D> {
        vec![
            Point2D::new(min, min),
            Point2D::new(max, min),
            Point2D::new(max, max),
            Point2D::new(min, max),
        ]
    }

    #[test]
    fn test_signed_area_orientation() {
        let ccw = square(0.0, 2.0);
        assert!((signed_area(&ccw) - 4.0).abs() < 1e-12);
        let mut cw = ccw.clone();
        cw.reverse();
        assert!((signed_area(&cw) + 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_prepare_drops_closing_duplicate() {
        let mut ring = square(0.0, 1.0);
        ring.push(Point2D::new(0.0, 0.0));
        let pline = CavalierKernel::prepare_polygon(&ring, true).unwrap();
        assert_eq!(pline.vertex_count(), 4);
        assert!(pline.is_closed());
    }

    #[test]
    fn test_zero_offset_returns_closed_ring() {
        let kernel = CavalierKernel::default();
        let rings = kernel.offset(&square(0.0, 1.0), 0.0);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].first(), rings[0].last());
        let bbox = BoundingBox::from_points(&rings[0]).unwrap();
        assert!((bbox.width() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_identical_squares_intersect() {
        let kernel = CavalierKernel::default();
        let a = square(0.0, 1.0);
        assert!(kernel.intersects(&a, &a));
    }

    #[test]
    fn test_distant_squares_do_not_intersect() {
        let kernel = CavalierKernel::default();
        assert!(!kernel.intersects(&square(0.0, 1.0), &square(5.0, 6.0)));
    }

    #[test]
    fn test_degenerate_polygon_has_no_offset() {
        let kernel = CavalierKernel::default();
        let line = vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0)];
        assert!(kernel.offset(&line, 0.5).is_empty());
    }
}
