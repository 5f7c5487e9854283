//! Primitive 2D geometry.
//!
//! Points, segments, bounding boxes and the handful of routines every
//! later stage relies on: polar angles, circle fitting, point-in-polygon,
//! rotation and Ramer-Douglas-Peucker simplification.
//!
//! Angles are in degrees throughout.

use kerfnest_core::GeometryError;
use serde::{Deserialize, Serialize};

/// Represents a 2D point with X and Y coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    /// Creates a new point with the given X and Y coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculates the distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

/// Straight segment between two points, tagged with the drawing layer it
/// came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSegment {
    pub start: Point2D,
    pub end: Point2D,
    pub layer: String,
}

impl LineSegment {
    /// Segment on the default layer `"0"`.
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self {
            start,
            end,
            layer: String::from("0"),
        }
    }

    pub fn on_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = layer.into();
        self
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point2D,
    pub max: Point2D,
}

impl BoundingBox {
    pub fn new(min: Point2D, max: Point2D) -> Self {
        Self { min, max }
    }

    /// Box enclosing every point, or `None` for an empty input.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point2D>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = Self::new(first, first);
        for p in iter {
            bbox.include(p);
        }
        Some(bbox)
    }

    /// Grow the box to cover `p`.
    pub fn include(&mut self, p: &Point2D) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let mut merged = *self;
        merged.include(&other.min);
        merged.include(&other.max);
        merged
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Point2D {
        midpoint(&self.min, &self.max)
    }

    /// True when the two boxes share any area or edge.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Inclusive containment of `inner` in this box.
    pub fn contains_box(&self, inner: &BoundingBox) -> bool {
        inner.min.x >= self.min.x
            && inner.min.y >= self.min.y
            && inner.max.x <= self.max.x
            && inner.max.y <= self.max.y
    }

    /// Strict containment: this box lies inside `outer` without touching
    /// its edges.
    pub fn is_strictly_inside(&self, outer: &BoundingBox) -> bool {
        self.min.x > outer.min.x
            && self.min.y > outer.min.y
            && self.max.x < outer.max.x
            && self.max.y < outer.max.y
    }
}

pub fn distance(a: &Point2D, b: &Point2D) -> f64 {
    a.distance_to(b)
}

pub fn midpoint(a: &Point2D, b: &Point2D) -> Point2D {
    Point2D::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Direction from `a` towards `b` in degrees, normalised into `[0, 360)`.
pub fn measure_polar_angle(a: &Point2D, b: &Point2D) -> f64 {
    let angle = (b.y - a.y).atan2(b.x - a.x).to_degrees();
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Point reached by walking `length` from `start` along `angle`.
pub fn create_polar_line(start: &Point2D, angle: f64, length: f64) -> Point2D {
    let rad = angle.to_radians();
    Point2D::new(start.x + length * rad.cos(), start.y + length * rad.sin())
}

/// Distance from `p` to the infinite line through `a` and `b`. Falls back
/// to the distance to `a` when the line is degenerate.
pub fn perpendicular_distance(p: &Point2D, a: &Point2D, b: &Point2D) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len <= f64::EPSILON {
        return p.distance_to(a);
    }
    ((p.x - a.x) * dy - (p.y - a.y) * dx).abs() / len
}

/// Center of the circle through three points.
pub fn three_point_circle_center(
    p1: &Point2D,
    p2: &Point2D,
    p3: &Point2D,
) -> Result<Point2D, GeometryError> {
    // Intersect the perpendicular bisectors of p1p2 and p2p3.
    let a = midpoint(p1, p2);
    let u = Point2D::new(p1.y - p2.y, p2.x - p1.x);
    let b = midpoint(p2, p3);
    let v = Point2D::new(p2.y - p3.y, p3.x - p2.x);
    let d = Point2D::new(a.x - b.x, a.y - b.y);
    let vu = v.x * u.y - v.y * u.x;
    if vu.abs() < 1e-12 {
        return Err(GeometryError::CollinearPoints {
            x1: p1.x,
            y1: p1.y,
            x2: p2.x,
            y2: p2.y,
            x3: p3.x,
            y3: p3.y,
        });
    }
    let g = (d.x * u.y - d.y * u.x) / vu;
    Ok(Point2D::new(b.x + g * v.x, b.y + g * v.y))
}

/// Even-odd point-in-polygon test.
///
/// The crossing rule is half-open, so boundary points resolve
/// deterministically: a point on a right or top edge counts as inside,
/// one on a left or bottom edge as outside.
pub fn point_in_polygon(point: &Point2D, polygon: &[Point2D]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut odd = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = &polygon[i];
        let pj = &polygon[j];
        if ((pi.y < point.y && pj.y >= point.y) || (pj.y < point.y && pi.y >= point.y))
            && (pi.x <= point.x || pj.x <= point.x)
        {
            let crossing = pi.x + (point.y - pi.y) / (pj.y - pi.y) * (pj.x - pi.x);
            odd ^= crossing < point.x;
        }
        j = i;
    }
    odd
}

/// True when any vertex of `inner` lies inside `outer`.
pub fn path_inside_path(inner: &[Point2D], outer: &[Point2D]) -> bool {
    inner.iter().any(|p| point_in_polygon(p, outer))
}

/// Rotate `point` about `center` by `angle` degrees.
///
/// Positive angles turn clockwise in a y-up frame, which is the direction
/// the nesting search sweeps.
pub fn rotate_point(center: &Point2D, point: &Point2D, angle: f64) -> Point2D {
    if angle == 0.0 {
        return *point;
    }
    let (sin, cos) = angle.to_radians().sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Point2D::new(
        cos * dx + sin * dy + center.x,
        cos * dy - sin * dx + center.y,
    )
}

/// Ramer-Douglas-Peucker simplification.
///
/// Keeps the first and last points and every point that deviates more
/// than `epsilon` from the simplified path.
pub fn simplify(points: &[Point2D], epsilon: f64) -> Result<Vec<Point2D>, GeometryError> {
    if points.len() < 2 {
        return Err(GeometryError::NotEnoughPoints {
            operation: "simplify",
            required: 2,
            actual: points.len(),
        });
    }

    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut stack = vec![(0usize, last)];
    while let Some((first, end)) = stack.pop() {
        if end <= first + 1 {
            continue;
        }
        let mut dmax = 0.0;
        let mut index = first;
        for i in (first + 1)..end {
            let d = perpendicular_distance(&points[i], &points[first], &points[end]);
            if d > dmax {
                dmax = d;
                index = i;
            }
        }
        if dmax > epsilon {
            keep[index] = true;
            stack.push((first, index));
            stack.push((index, end));
        }
    }

    Ok(points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect())
}
