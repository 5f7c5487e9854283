//! Spline evaluation.
//!
//! Control-point splines are evaluated as (rational) B-splines; splines
//! given only by fit points are interpolated with a Catmull-Rom curve.
//! Both are sampled adaptively: a parameter interval is split while its
//! midpoint strays further than the tolerance from the chord.

use crate::geometry::{perpendicular_distance, Point2D};
use kerfnest_core::GeometryError;

/// Every interval is split at least this many times before the flatness
/// test may stop it. Keeps S-shaped spans from passing on a lucky midpoint.
const MIN_SUBDIVISION_DEPTH: u32 = 2;

/// Spline as read from a drawing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplineDef {
    pub degree: usize,
    pub control_points: Vec<Point2D>,
    /// Per-control-point weights. Empty means non-rational.
    pub weights: Vec<f64>,
    /// Knot vector. Replaced by a clamped uniform vector when its length
    /// does not match `control_points.len() + degree + 1`.
    pub knots: Vec<f64>,
    pub fit_points: Vec<Point2D>,
    pub closed: bool,
}

impl SplineDef {
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            control_points: self.control_points.iter().map(|p| p.scaled(factor)).collect(),
            fit_points: self.fit_points.iter().map(|p| p.scaled(factor)).collect(),
            ..self.clone()
        }
    }
}

/// Sample `spline` into a dense point list.
pub fn sample_spline(
    spline: &SplineDef,
    tolerance: f64,
    max_depth: u32,
) -> Result<Vec<Point2D>, GeometryError> {
    if spline.control_points.len() >= 2 {
        let nurbs = Nurbs::new(spline)?;
        Ok(nurbs.sample(tolerance, max_depth))
    } else if spline.fit_points.len() >= 2 {
        Ok(sample_catmull_rom(&spline.fit_points, tolerance, max_depth))
    } else {
        Err(GeometryError::InvalidSpline {
            reason: format!(
                "{} control points and {} fit points",
                spline.control_points.len(),
                spline.fit_points.len()
            ),
        })
    }
}

struct Nurbs<'a> {
    degree: usize,
    control_points: &'a [Point2D],
    weights: Vec<f64>,
    knots: Vec<f64>,
}

impl<'a> Nurbs<'a> {
    fn new(def: &'a SplineDef) -> Result<Self, GeometryError> {
        let n = def.control_points.len();
        let degree = def.degree.clamp(1, n - 1);

        let knots_valid = def.knots.len() == n + degree + 1
            && def.knots.windows(2).all(|w| w[0] <= w[1])
            && def.knots[n] > def.knots[degree];
        let knots = if knots_valid {
            def.knots.clone()
        } else {
            clamped_uniform_knots(n, degree)
        };

        let weights = if def.weights.len() == n && def.weights.iter().all(|w| *w > 0.0) {
            def.weights.clone()
        } else {
            vec![1.0; n]
        };

        if def.control_points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(GeometryError::InvalidSpline {
                reason: "non-finite control point".to_string(),
            });
        }

        Ok(Self {
            degree,
            control_points: &def.control_points,
            weights,
            knots,
        })
    }

    fn domain(&self) -> (f64, f64) {
        (self.knots[self.degree], self.knots[self.control_points.len()])
    }

    fn find_span(&self, u: f64) -> usize {
        let n = self.control_points.len();
        let span = self.knots.partition_point(|k| *k <= u).saturating_sub(1);
        span.clamp(self.degree, n - 1)
    }

    /// Non-zero basis functions at `u` for `span`.
    fn basis(&self, span: usize, u: f64) -> Vec<f64> {
        let p = self.degree;
        let mut n = vec![0.0; p + 1];
        let mut left = vec![0.0; p + 1];
        let mut right = vec![0.0; p + 1];
        n[0] = 1.0;
        for j in 1..=p {
            left[j] = u - self.knots[span + 1 - j];
            right[j] = self.knots[span + j] - u;
            let mut saved = 0.0;
            for r in 0..j {
                let denom = right[r + 1] + left[j - r];
                let temp = if denom.abs() < f64::EPSILON {
                    0.0
                } else {
                    n[r] / denom
                };
                n[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            n[j] = saved;
        }
        n
    }

    fn point_at(&self, u: f64) -> Point2D {
        let span = self.find_span(u);
        let basis = self.basis(span, u);
        let (mut x, mut y, mut wsum) = (0.0, 0.0, 0.0);
        for (i, b) in basis.iter().enumerate() {
            let idx = span - self.degree + i;
            let w = b * self.weights[idx];
            x += self.control_points[idx].x * w;
            y += self.control_points[idx].y * w;
            wsum += w;
        }
        if wsum.abs() < f64::EPSILON {
            return self.control_points[span];
        }
        Point2D::new(x / wsum, y / wsum)
    }

    fn sample(&self, tolerance: f64, max_depth: u32) -> Vec<Point2D> {
        let (start, end) = self.domain();
        let eval = |u: f64| self.point_at(u);
        let mut out = vec![eval(start)];
        // Sample each knot interval on its own so a sharp knot is never
        // stepped over.
        let breaks: Vec<f64> = self
            .knots
            .iter()
            .copied()
            .filter(|k| *k > start && *k < end)
            .chain(std::iter::once(end))
            .collect();
        let mut t0 = start;
        for t1 in breaks {
            if t1 > t0 {
                let p0 = out.last().copied().unwrap_or_else(|| eval(t0));
                let p1 = eval(t1);
                subdivide(&eval, t0, t1, p0, p1, 0, tolerance, max_depth, &mut out);
                t0 = t1;
            }
        }
        out
    }
}

fn clamped_uniform_knots(n: usize, degree: usize) -> Vec<f64> {
    let interior = n - degree - 1;
    let mut knots = Vec::with_capacity(n + degree + 1);
    knots.extend(std::iter::repeat(0.0).take(degree + 1));
    for i in 1..=interior {
        knots.push(i as f64 / (interior + 1) as f64);
    }
    knots.extend(std::iter::repeat(1.0).take(degree + 1));
    knots
}

fn catmull_rom(p0: &Point2D, p1: &Point2D, p2: &Point2D, p3: &Point2D, t: f64) -> Point2D {
    let t2 = t * t;
    let t3 = t2 * t;
    let blend = |a: f64, b: f64, c: f64, d: f64| {
        0.5 * (2.0 * b
            + (-a + c) * t
            + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2
            + (-a + 3.0 * b - 3.0 * c + d) * t3)
    };
    Point2D::new(blend(p0.x, p1.x, p2.x, p3.x), blend(p0.y, p1.y, p2.y, p3.y))
}

fn sample_catmull_rom(points: &[Point2D], tolerance: f64, max_depth: u32) -> Vec<Point2D> {
    let n = points.len();
    let mut out = vec![points[0]];
    for i in 0..n - 1 {
        let p0 = if i == 0 { &points[0] } else { &points[i - 1] };
        let p1 = &points[i];
        let p2 = &points[i + 1];
        let p3 = points.get(i + 2).unwrap_or(p2);
        let eval = |t: f64| catmull_rom(p0, p1, p2, p3, t);
        subdivide(&eval, 0.0, 1.0, *p1, *p2, 0, tolerance, max_depth, &mut out);
    }
    out
}

#[allow(clippy::too_many_arguments)]
fn subdivide<F: Fn(f64) -> Point2D>(
    eval: &F,
    t0: f64,
    t1: f64,
    p0: Point2D,
    p1: Point2D,
    depth: u32,
    tolerance: f64,
    max_depth: u32,
    out: &mut Vec<Point2D>,
) {
    let tm = (t0 + t1) / 2.0;
    let pm = eval(tm);
    let flat = perpendicular_distance(&pm, &p0, &p1) <= tolerance;
    if depth < max_depth && (depth < MIN_SUBDIVISION_DEPTH || !flat) {
        subdivide(eval, t0, tm, p0, pm, depth + 1, tolerance, max_depth, out);
        subdivide(eval, tm, t1, pm, p1, depth + 1, tolerance, max_depth, out);
    } else {
        out.push(p1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_spline() -> SplineDef {
        SplineDef {
            degree: 3,
            control_points: vec![
                Point2D::new(0.0, 0.0),
                Point2D::new(1.0, 0.0),
                Point2D::new(2.0, 0.0),
                Point2D::new(3.0, 0.0),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_clamped_knots_shape() {
        let knots = clamped_uniform_knots(5, 3);
        assert_eq!(knots.len(), 9);
        assert_eq!(&knots[..4], &[0.0; 4]);
        assert_eq!(&knots[5..], &[1.0; 4]);
        assert!((knots[4] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_clamped_spline_hits_end_control_points() {
        let spline = line_spline();
        let pts = sample_spline(&spline, 0.01, 6).unwrap();
        let first = pts.first().unwrap();
        let last = pts.last().unwrap();
        assert!(first.distance_to(&Point2D::new(0.0, 0.0)) < 1e-9);
        assert!(last.distance_to(&Point2D::new(3.0, 0.0)) < 1e-9);
        assert!(pts.iter().all(|p| p.y.abs() < 1e-9));
    }

    #[test]
    fn test_degree_clamped_to_control_count() {
        let spline = SplineDef {
            degree: 5,
            control_points: vec![Point2D::new(0.0, 0.0), Point2D::new(2.0, 2.0)],
            ..Default::default()
        };
        let pts = sample_spline(&spline, 0.01, 4).unwrap();
        // A degree-one spline over two points is the straight segment.
        for p in &pts {
            assert!((p.x - p.y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_fit_points_are_interpolated() {
        let fit = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(2.0, 0.0),
        ];
        let spline = SplineDef {
            fit_points: fit.clone(),
            ..Default::default()
        };
        let pts = sample_spline(&spline, 0.001, 8).unwrap();
        for f in &fit {
            assert!(pts.iter().any(|p| p.distance_to(f) < 1e-9));
        }
    }

    #[test]
    fn test_empty_spline_is_rejected() {
        let spline = SplineDef::default();
        assert!(matches!(
            sample_spline(&spline, 0.1, 4),
            Err(GeometryError::InvalidSpline { .. })
        ));
    }
}
