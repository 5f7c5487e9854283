//! Kerf-offset part outlines.
//!
//! A [`PolyPart`] is the nesting view of a [`Part`]: every chain offset by
//! the kerf radius (outward for outlines, inward for holes), with the
//! single outer polygon kept last. [`PolyPart::build`] moves the polygons
//! into world space for the part's current transform and caches the
//! bounding box.

use crate::geometry::{simplify, BoundingBox, Point2D};
use crate::kernel::GeometryKernel;
use crate::part::{Part, PartId, PartTransform};
use kerfnest_core::GeometryError;
use tracing::{debug, warn};

/// Kerf-offset polygon in part-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyGon {
    pub vertices: Vec<Point2D>,
    pub closed: bool,
    pub is_inside: bool,
}

/// Settings for turning chains into offset polygons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildOptions {
    /// Half the kerf width.
    pub kerf_radius: f64,
    /// Gap below which an offset polygon counts as closed.
    pub closed_tolerance: f64,
    /// Simplification applied to each chain before offsetting. Zero keeps
    /// every vertex.
    pub simplify_tolerance: f64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            kerf_radius: 0.75,
            closed_tolerance: 0.1,
            simplify_tolerance: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolyPart {
    pub id: PartId,
    pub name: String,
    /// Offset polygons; the last one is the outer boundary.
    pub polygons: Vec<PolyGon>,
    built: Vec<Vec<Point2D>>,
    bbox: Option<BoundingBox>,
}

/// Offset every usable chain of `part` and order the result so the outer
/// boundary comes last. Chains whose offset vanishes are logged and
/// dropped; the rest of the part is kept.
pub fn build_part(
    kernel: &dyn GeometryKernel,
    id: PartId,
    part: &Part,
    options: &BuildOptions,
) -> PolyPart {
    let mut polygons = Vec::new();

    for (i, chain) in part.chains.iter().enumerate() {
        if chain.points.len() <= 2 {
            continue;
        }
        let is_inside = part
            .chains
            .iter()
            .enumerate()
            .any(|(j, other)| j != i && chain.lies_inside(other));

        let outline = if options.simplify_tolerance > 0.0 {
            simplify(&chain.points, options.simplify_tolerance).unwrap_or_else(|_| chain.points.clone())
        } else {
            chain.points.clone()
        };

        let distance = if is_inside {
            -options.kerf_radius
        } else {
            options.kerf_radius
        };
        let mut rings = kernel.offset(&outline, distance);
        if rings.is_empty() {
            warn!(
                "Dropping chain {} of part '{}': {}",
                i,
                part.name,
                GeometryError::EmptyOffset { distance }
            );
            continue;
        }
        if rings.len() > 1 {
            debug!(
                "Offset of chain {} in part '{}' split into {} rings, keeping the first",
                i,
                part.name,
                rings.len()
            );
        }
        let vertices = rings.swap_remove(0);
        let closed = match (vertices.first(), vertices.last()) {
            (Some(first), Some(last)) => first.distance_to(last) < options.closed_tolerance,
            _ => false,
        };
        polygons.push(PolyGon {
            vertices,
            closed,
            is_inside,
        });
    }

    let outer_count = polygons.iter().filter(|p| !p.is_inside).count();
    if outer_count == 0 {
        warn!("Part '{}' has no outer polygon", part.name);
    } else {
        if outer_count > 1 {
            warn!(
                "Part '{}' has {} outer polygons, using the first as its boundary",
                part.name, outer_count
            );
        }
        if let Some(pos) = polygons.iter().position(|p| !p.is_inside) {
            let outer = polygons.remove(pos);
            polygons.push(outer);
        }
    }

    let mut poly_part = PolyPart {
        id,
        name: part.name.clone(),
        polygons,
        built: Vec::new(),
        bbox: None,
    };
    poly_part.build(&part.transform);
    poly_part
}

impl PolyPart {
    /// The outer boundary polygon.
    pub fn outer(&self) -> Option<&PolyGon> {
        self.polygons.last()
    }

    /// Recompute world-space vertices and the bounding box for `transform`.
    /// Must be called after every transform change.
    pub fn build(&mut self, transform: &PartTransform) {
        self.built = self
            .polygons
            .iter()
            .map(|poly| poly.vertices.iter().map(|p| transform.apply(p)).collect())
            .collect();
        self.bbox = self
            .built
            .iter()
            .filter_map(|ring| BoundingBox::from_points(ring))
            .reduce(|a, b| a.union(&b));
    }

    /// World-space bounding box as of the last [`PolyPart::build`].
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bbox
    }

    pub fn built_polygons(&self) -> &[Vec<Point2D>] {
        &self.built
    }

    /// World-space outer boundary as of the last build.
    pub fn built_outer(&self) -> Option<&[Point2D]> {
        self.built.last().map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chainify::Chain;
    use crate::kernel::CavalierKernel;

    fn ring(min: f64, max: f64) -> Vec<Point2D> {
        vec![
            Point2D::new(min, min),
            Point2D::new(max, min),
            Point2D::new(max, max),
            Point2D::new(min, max),
            Point2D::new(min, min),
        ]
    }

    #[test]
    fn test_outer_polygon_is_last() {
        // Hole first in chain order.
        let mut hole = Chain::new(ring(-1.0, 1.0), "0");
        hole.update_closed(0.01);
        let mut outline = Chain::new(ring(-5.0, 5.0), "0");
        outline.update_closed(0.01);
        let part = Part::new("frame", vec![hole, outline]);
        let poly = build_part(&CavalierKernel::default(), PartId(1), &part, &BuildOptions::default());
        assert_eq!(poly.polygons.len(), 2);
        assert!(poly.polygons[0].is_inside);
        assert!(!poly.outer().unwrap().is_inside);
    }

    #[test]
    fn test_short_chains_are_skipped() {
        let part = Part::new(
            "stub",
            vec![Chain::new(
                vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0)],
                "0",
            )],
        );
        let poly = build_part(&CavalierKernel::default(), PartId(1), &part, &BuildOptions::default());
        assert!(poly.is_empty());
        assert!(poly.bounding_box().is_none());
    }
}
