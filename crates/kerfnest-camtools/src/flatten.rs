//! Curve flattening.
//!
//! Turns arcs, circles, bulged polylines and splines into straight
//! [`LineSegment`]s. Every curve is sampled densely and then thinned with
//! Ramer-Douglas-Peucker so the result stays within the tolerance.

use crate::geometry::{
    create_polar_line, distance, measure_polar_angle, midpoint, simplify,
    three_point_circle_center, LineSegment, Point2D,
};
use crate::spline::{sample_spline, SplineDef};
use kerfnest_core::GeometryError;

/// Which way an arc runs from its start angle to its end angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArcDirection {
    /// Whichever of the two spans is at most 180 degrees.
    #[default]
    Shortest,
    /// Counter-clockwise from start to end. A zero span is a full turn.
    CounterClockwise,
}

/// Polyline vertex. `bulge` shapes the segment that leaves this vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PolylineVertex {
    pub point: Point2D,
    pub bulge: f64,
}

impl PolylineVertex {
    pub fn new(x: f64, y: f64, bulge: f64) -> Self {
        Self {
            point: Point2D::new(x, y),
            bulge,
        }
    }
}

/// Circle geometry behind a bulged polyline segment. The arc always runs
/// counter-clockwise from `start_angle` to `end_angle`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulgeArc {
    pub center: Point2D,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    /// Set when the segment itself runs clockwise, i.e. from the end angle
    /// back to the start angle.
    pub reversed: bool,
}

impl BulgeArc {
    /// Counter-clockwise span in degrees, in `(0, 360)`.
    pub fn sweep(&self) -> f64 {
        (self.end_angle - self.start_angle).rem_euclid(360.0)
    }
}

/// Solve the arc for a polyline segment from `p1` to `p2` with `bulge`.
pub fn bulge_arc(p1: &Point2D, p2: &Point2D, bulge: f64) -> Result<BulgeArc, GeometryError> {
    if bulge == 0.0 || !bulge.is_finite() {
        return Err(GeometryError::DegenerateArc {
            reason: format!("bulge {} describes no arc", bulge),
        });
    }
    if distance(p1, p2) <= f64::EPSILON {
        return Err(GeometryError::DegenerateArc {
            reason: "bulge segment has zero-length chord".to_string(),
        });
    }

    let mid = midpoint(p1, p2);
    let sagitta = bulge * distance(p1, &mid);
    let apex = create_polar_line(&mid, measure_polar_angle(p1, p2) + 270.0, sagitta);
    let center = three_point_circle_center(p1, &apex, p2)?;
    let radius = distance(&center, p1);

    let a1 = measure_polar_angle(&center, p1);
    let a2 = measure_polar_angle(&center, p2);
    let reversed = sagitta < 0.0;
    let (start_angle, end_angle) = if reversed { (a2, a1) } else { (a1, a2) };
    Ok(BulgeArc {
        center,
        radius,
        start_angle,
        end_angle,
        reversed,
    })
}

/// Points along a bulged segment from `p1` to `p2`, endpoints included and
/// exact.
pub fn bulge_points(
    p1: &Point2D,
    p2: &Point2D,
    bulge: f64,
    segments: usize,
) -> Result<Vec<Point2D>, GeometryError> {
    let arc = bulge_arc(p1, p2, bulge)?;
    let mut points = sweep_points(
        &arc.center,
        arc.radius,
        arc.start_angle,
        arc.sweep(),
        segments.max(1),
    );
    if arc.reversed {
        points.reverse();
    }
    // Pin the ends so neighbouring segments chain exactly.
    if let Some(first) = points.first_mut() {
        *first = *p1;
    }
    if let Some(last) = points.last_mut() {
        *last = *p2;
    }
    Ok(points)
}

fn sweep_points(
    center: &Point2D,
    radius: f64,
    start_angle: f64,
    span: f64,
    segments: usize,
) -> Vec<Point2D> {
    (0..=segments)
        .map(|i| {
            let angle = start_angle + span * i as f64 / segments as f64;
            create_polar_line(center, angle, radius)
        })
        .collect()
}

/// Join consecutive points into segments, skipping zero-length ones.
pub fn points_to_segments(points: &[Point2D], layer: &str) -> Vec<LineSegment> {
    points
        .windows(2)
        .filter(|w| w[0] != w[1])
        .map(|w| LineSegment::new(w[0], w[1]).on_layer(layer))
        .collect()
}

/// Converts curves to line segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveFlattener {
    /// Samples per arc before simplification.
    pub arc_segments: usize,
    /// Maximum deviation kept by the simplification pass.
    pub tolerance: f64,
    /// Subdivision limit for spline sampling.
    pub spline_max_depth: u32,
}

impl Default for CurveFlattener {
    fn default() -> Self {
        Self {
            arc_segments: 100,
            tolerance: 0.05,
            spline_max_depth: 8,
        }
    }
}

impl CurveFlattener {
    pub fn new(arc_segments: usize, tolerance: f64, spline_max_depth: u32) -> Self {
        Self {
            arc_segments: arc_segments.max(1),
            tolerance,
            spline_max_depth,
        }
    }

    fn thin(&self, points: &[Point2D]) -> Result<Vec<Point2D>, GeometryError> {
        if self.tolerance > 0.0 && points.len() > 2 {
            simplify(points, self.tolerance)
        } else {
            Ok(points.to_vec())
        }
    }

    /// Flatten an arc given by center, radius and start/end angles.
    pub fn arc(
        &self,
        center: &Point2D,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        direction: ArcDirection,
        layer: &str,
    ) -> Result<Vec<LineSegment>, GeometryError> {
        if radius <= 0.0 || !radius.is_finite() {
            return Err(GeometryError::DegenerateArc {
                reason: format!("radius {}", radius),
            });
        }
        let span = match direction {
            ArcDirection::Shortest => {
                let mut delta = (end_angle - start_angle).rem_euclid(360.0);
                if delta > 180.0 {
                    delta -= 360.0;
                }
                delta
            }
            ArcDirection::CounterClockwise => {
                let delta = (end_angle - start_angle).rem_euclid(360.0);
                if delta == 0.0 {
                    360.0
                } else {
                    delta
                }
            }
        };
        if span == 0.0 {
            return Ok(Vec::new());
        }
        let points = sweep_points(center, radius, start_angle, span, self.arc_segments);
        Ok(points_to_segments(&self.thin(&points)?, layer))
    }

    /// Flatten a full circle as two half-circle arcs.
    pub fn circle(
        &self,
        center: &Point2D,
        radius: f64,
        layer: &str,
    ) -> Result<Vec<LineSegment>, GeometryError> {
        let mut segments =
            self.arc(center, radius, 0.0, 180.0, ArcDirection::CounterClockwise, layer)?;
        segments.extend(self.arc(
            center,
            radius,
            180.0,
            360.0,
            ArcDirection::CounterClockwise,
            layer,
        )?);
        Ok(segments)
    }

    /// Flatten one bulged polyline segment.
    pub fn bulge(
        &self,
        p1: &Point2D,
        p2: &Point2D,
        bulge: f64,
        layer: &str,
    ) -> Result<Vec<LineSegment>, GeometryError> {
        let points = bulge_points(p1, p2, bulge, self.arc_segments)?;
        Ok(points_to_segments(&self.thin(&points)?, layer))
    }

    /// Flatten a polyline. Straight spans stay as they are; bulged spans
    /// become arcs. With `close` set, the last vertex is joined back to the
    /// first using the last vertex's bulge.
    pub fn polyline(
        &self,
        vertices: &[PolylineVertex],
        close: bool,
        layer: &str,
    ) -> Result<Vec<LineSegment>, GeometryError> {
        if vertices.len() < 2 {
            return Err(GeometryError::NotEnoughPoints {
                operation: "polyline",
                required: 2,
                actual: vertices.len(),
            });
        }
        let mut segments = Vec::new();
        let spans = if close {
            vertices.len()
        } else {
            vertices.len() - 1
        };
        for i in 0..spans {
            let from = &vertices[i];
            let to = &vertices[(i + 1) % vertices.len()];
            if from.point == to.point {
                continue;
            }
            if from.bulge == 0.0 {
                segments.push(LineSegment::new(from.point, to.point).on_layer(layer));
            } else {
                match self.bulge(&from.point, &to.point, from.bulge, layer) {
                    Ok(arc) => segments.extend(arc),
                    // A bulge too flat to solve is a straight span.
                    Err(GeometryError::CollinearPoints { .. }) => {
                        segments.push(LineSegment::new(from.point, to.point).on_layer(layer))
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(segments)
    }

    /// Flatten a spline. Closed splines get one extra segment back to the
    /// start.
    pub fn spline(&self, spline: &SplineDef, layer: &str) -> Result<Vec<LineSegment>, GeometryError> {
        let sampled = sample_spline(spline, self.tolerance, self.spline_max_depth)?;
        let mut points = self.thin(&sampled)?;
        if spline.closed && points.len() > 2 {
            if let (Some(first), Some(last)) = (points.first().copied(), points.last()) {
                if first != *last {
                    points.push(first);
                }
            }
        }
        Ok(points_to_segments(&points, layer))
    }
}
