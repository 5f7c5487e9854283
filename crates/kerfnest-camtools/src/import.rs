//! Drawing import.
//!
//! [`DrawingImporter`] collects the raw entities of one drawing, flattens
//! them to segments, chains and classifies the contours and returns a
//! [`Part`] whose chains are centered on the origin. Entities that fail
//! to flatten are logged and skipped; the rest of the drawing still
//! imports.

use crate::chainify::{center_on_origin, chainify, classify_contours};
use crate::flatten::{ArcDirection, CurveFlattener, PolylineVertex};
use crate::geometry::{LineSegment, Point2D};
use crate::part::Part;
use crate::spline::SplineDef;
use kerfnest_core::{DrawingUnits, GeometryError, ImportError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Settings for flattening and chaining a drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportParameters {
    /// Endpoint distance within which segments are joined.
    pub chain_tolerance: f64,
    /// Samples per arc before simplification.
    pub arc_segments: usize,
    /// Deviation allowed when simplifying flattened curves.
    pub spline_tolerance: f64,
    pub spline_max_depth: u32,
    /// Extra scale applied on top of the drawing's unit conversion.
    pub import_scale: f64,
}

impl Default for ImportParameters {
    fn default() -> Self {
        Self {
            chain_tolerance: 0.05,
            arc_segments: 100,
            spline_tolerance: 0.05,
            spline_max_depth: 8,
            import_scale: 1.0,
        }
    }
}

/// Geometry of a raw drawing entity.
#[derive(Debug, Clone, PartialEq)]
pub enum RawGeometry {
    Line {
        start: Point2D,
        end: Point2D,
    },
    Arc {
        center: Point2D,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        direction: ArcDirection,
    },
    Circle {
        center: Point2D,
        radius: f64,
    },
    Polyline {
        vertices: Vec<PolylineVertex>,
        closed: bool,
    },
    Spline(SplineDef),
    /// Recognised but not flattened.
    Ellipse {
        center: Point2D,
    },
}

impl RawGeometry {
    pub fn kind(&self) -> &'static str {
        match self {
            RawGeometry::Line { .. } => "line",
            RawGeometry::Arc { .. } => "arc",
            RawGeometry::Circle { .. } => "circle",
            RawGeometry::Polyline { .. } => "polyline",
            RawGeometry::Spline(_) => "spline",
            RawGeometry::Ellipse { .. } => "ellipse",
        }
    }

    /// Uniformly scaled copy. Angles and bulges are scale-invariant.
    pub fn scaled(&self, factor: f64) -> Self {
        match self {
            RawGeometry::Line { start, end } => RawGeometry::Line {
                start: start.scaled(factor),
                end: end.scaled(factor),
            },
            RawGeometry::Arc {
                center,
                radius,
                start_angle,
                end_angle,
                direction,
            } => RawGeometry::Arc {
                center: center.scaled(factor),
                radius: radius * factor,
                start_angle: *start_angle,
                end_angle: *end_angle,
                direction: *direction,
            },
            RawGeometry::Circle { center, radius } => RawGeometry::Circle {
                center: center.scaled(factor),
                radius: radius * factor,
            },
            RawGeometry::Polyline { vertices, closed } => RawGeometry::Polyline {
                vertices: vertices
                    .iter()
                    .map(|v| PolylineVertex {
                        point: v.point.scaled(factor),
                        bulge: v.bulge,
                    })
                    .collect(),
                closed: *closed,
            },
            RawGeometry::Spline(spline) => RawGeometry::Spline(spline.scaled(factor)),
            RawGeometry::Ellipse { center } => RawGeometry::Ellipse {
                center: center.scaled(factor),
            },
        }
    }
}

/// One entity of a drawing, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntity {
    pub layer: String,
    pub geometry: RawGeometry,
}

impl RawEntity {
    pub fn new(layer: impl Into<String>, geometry: RawGeometry) -> Self {
        Self {
            layer: layer.into(),
            geometry,
        }
    }
}

/// Builds a [`Part`] from a stream of raw entities.
#[derive(Debug, Clone)]
pub struct DrawingImporter {
    name: String,
    params: ImportParameters,
    units: DrawingUnits,
    entities: Vec<RawEntity>,
}

impl DrawingImporter {
    pub fn new(name: impl Into<String>, params: ImportParameters) -> Self {
        Self {
            name: name.into(),
            params,
            units: DrawingUnits::default(),
            entities: Vec::new(),
        }
    }

    pub fn set_units(&mut self, units: DrawingUnits) {
        self.units = units;
    }

    pub fn add_entity(&mut self, entity: RawEntity) {
        self.entities.push(entity);
    }

    pub fn extend<I: IntoIterator<Item = RawEntity>>(&mut self, entities: I) {
        self.entities.extend(entities);
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Flatten every entity into segments.
    ///
    /// Lines, arcs and circles go first in file order, then splines, then
    /// polylines, so a polyline's closing decision sees everything else.
    pub fn flatten(&self) -> Vec<LineSegment> {
        let scale = self.params.import_scale * self.units.to_mm_factor();
        let flattener = CurveFlattener::new(
            self.params.arc_segments,
            self.params.spline_tolerance,
            self.params.spline_max_depth,
        );
        let entities: Vec<RawEntity> = self
            .entities
            .iter()
            .map(|e| RawEntity::new(e.layer.clone(), e.geometry.scaled(scale)))
            .collect();

        let mut segments = Vec::new();
        let skip = |entity: &RawEntity, err: GeometryError| {
            warn!(
                "Skipping {} on layer '{}': {}",
                entity.geometry.kind(),
                entity.layer,
                err
            );
        };

        for entity in &entities {
            let layer = entity.layer.as_str();
            let result = match &entity.geometry {
                RawGeometry::Line { start, end } => {
                    Ok(vec![LineSegment::new(*start, *end).on_layer(layer)])
                }
                RawGeometry::Arc {
                    center,
                    radius,
                    start_angle,
                    end_angle,
                    direction,
                } => flattener.arc(center, *radius, *start_angle, *end_angle, *direction, layer),
                RawGeometry::Circle { center, radius } => flattener.circle(center, *radius, layer),
                RawGeometry::Ellipse { .. } => {
                    warn!(
                        "{}",
                        ImportError::UnsupportedEntity {
                            kind: entity.geometry.kind().to_string()
                        }
                    );
                    continue;
                }
                RawGeometry::Polyline { .. } | RawGeometry::Spline(_) => continue,
            };
            match result {
                Ok(s) => segments.extend(s),
                Err(e) => skip(entity, e),
            }
        }

        for entity in &entities {
            if let RawGeometry::Spline(spline) = &entity.geometry {
                match flattener.spline(spline, &entity.layer) {
                    Ok(s) => segments.extend(s),
                    Err(e) => skip(entity, e),
                }
            }
        }

        for entity in &entities {
            if let RawGeometry::Polyline { vertices, closed } = &entity.geometry {
                if let Err(e) = self.flatten_polyline(
                    &flattener,
                    vertices,
                    *closed,
                    &entity.layer,
                    &mut segments,
                ) {
                    skip(entity, e);
                }
            }
        }

        segments
    }

    fn flatten_polyline(
        &self,
        flattener: &CurveFlattener,
        vertices: &[PolylineVertex],
        closed_flag: bool,
        layer: &str,
        segments: &mut Vec<LineSegment>,
    ) -> Result<(), GeometryError> {
        let open = flattener.polyline(vertices, false, layer)?;
        segments.extend(open);

        let (Some(first), Some(last)) = (vertices.first(), vertices.last()) else {
            return Ok(());
        };
        let tol = self.params.chain_tolerance;
        if vertices.len() < 2 || first.point.distance_to(&last.point) <= tol {
            return Ok(());
        }
        // A straight closing span over two vertices would retrace the
        // polyline. A bulged one completes a round outline.
        if vertices.len() == 2 && last.bulge == 0.0 {
            return Ok(());
        }

        // An outline touching nothing but itself has exactly two shared
        // endpoints: its own first and last segment.
        let shared: usize = segments
            .iter()
            .map(|s| {
                [s.start, s.end]
                    .iter()
                    .map(|p| {
                        usize::from(p.distance_to(&first.point) <= tol)
                            + usize::from(p.distance_to(&last.point) <= tol)
                    })
                    .sum::<usize>()
            })
            .sum();
        if !(closed_flag || shared == 2) {
            return Ok(());
        }

        if last.bulge == 0.0 {
            segments.push(LineSegment::new(last.point, first.point).on_layer(layer));
        } else {
            match flattener.bulge(&last.point, &first.point, last.bulge, layer) {
                Ok(arc) => segments.extend(arc),
                Err(GeometryError::CollinearPoints { .. }) => {
                    segments.push(LineSegment::new(last.point, first.point).on_layer(layer))
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Produce the part: flatten, chain, classify and center.
    pub fn finish(&self) -> Result<Part, ImportError> {
        let segments = self.flatten();
        if segments.is_empty() {
            return Err(ImportError::EmptyDrawing {
                name: self.name.clone(),
            });
        }

        let mut chains = chainify(&segments, self.params.chain_tolerance);
        classify_contours(&mut chains);
        let shift = center_on_origin(&mut chains);

        let closed = chains.iter().filter(|c| c.closed).count();
        let holes = chains.iter().filter(|c| c.inside_contour).count();
        info!(
            "Imported '{}': {} entities, {} segments, {} chains ({} closed, {} inside), shifted by ({:.3}, {:.3})",
            self.name,
            self.entities.len(),
            segments.len(),
            chains.len(),
            closed,
            holes,
            shift.x,
            shift.y
        );

        Ok(Part::new(self.name.clone(), chains))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> RawEntity {
        RawEntity::new(
            "0",
            RawGeometry::Line {
                start: Point2D::new(x1, y1),
                end: Point2D::new(x2, y2),
            },
        )
    }

    #[test]
    fn test_empty_drawing_is_an_error() {
        let importer = DrawingImporter::new("blank", ImportParameters::default());
        assert!(matches!(
            importer.finish(),
            Err(ImportError::EmptyDrawing { .. })
        ));
    }

    #[test]
    fn test_ellipse_is_skipped() {
        let mut importer = DrawingImporter::new("mixed", ImportParameters::default());
        importer.add_entity(RawEntity::new(
            "0",
            RawGeometry::Ellipse {
                center: Point2D::new(0.0, 0.0),
            },
        ));
        importer.add_entity(line(0.0, 0.0, 1.0, 0.0));
        assert_eq!(importer.flatten().len(), 1);
    }

    #[test]
    fn test_isolated_open_polyline_is_closed() {
        let mut importer = DrawingImporter::new("u", ImportParameters::default());
        importer.add_entity(RawEntity::new(
            "0",
            RawGeometry::Polyline {
                vertices: vec![
                    PolylineVertex::new(0.0, 0.0, 0.0),
                    PolylineVertex::new(4.0, 0.0, 0.0),
                    PolylineVertex::new(4.0, 4.0, 0.0),
                ],
                closed: false,
            },
        ));
        assert_eq!(importer.flatten().len(), 3);
    }

    #[test]
    fn test_connected_open_polyline_stays_open() {
        let mut importer = DrawingImporter::new("u", ImportParameters::default());
        importer.add_entity(line(4.0, 4.0, 0.0, 4.0));
        importer.add_entity(RawEntity::new(
            "0",
            RawGeometry::Polyline {
                vertices: vec![
                    PolylineVertex::new(0.0, 0.0, 0.0),
                    PolylineVertex::new(4.0, 0.0, 0.0),
                    PolylineVertex::new(4.0, 4.0, 0.0),
                ],
                closed: false,
            },
        ));
        assert_eq!(importer.flatten().len(), 3);
    }

    #[test]
    fn test_units_scale_geometry() {
        let mut importer = DrawingImporter::new("inch", ImportParameters::default());
        importer.set_units(DrawingUnits::Inches);
        importer.add_entity(line(0.0, 0.0, 1.0, 0.0));
        let segments = importer.flatten();
        assert!((segments[0].length() - 25.4).abs() < 1e-9);
    }
}
