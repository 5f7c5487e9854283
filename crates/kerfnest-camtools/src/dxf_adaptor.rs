//! DXF input.
//!
//! Reads a drawing with the `dxf` crate and turns its model-space
//! entities into [`RawEntity`] values for the [`DrawingImporter`].

use crate::flatten::{ArcDirection, PolylineVertex};
use crate::geometry::Point2D;
use crate::import::{DrawingImporter, ImportParameters, RawEntity, RawGeometry};
use crate::part::Part;
use crate::spline::SplineDef;
use dxf::entities::{Entity, EntityType};
use dxf::Drawing;
use kerfnest_core::{DrawingUnits, ImportError};
use std::path::Path;
use tracing::{debug, info};

/// Entities and units read from one DXF drawing.
#[derive(Debug, Clone, Default)]
pub struct DxfContents {
    pub entities: Vec<RawEntity>,
    pub units: DrawingUnits,
}

/// Load a DXF file from disk.
pub fn load_dxf(path: &Path) -> Result<DxfContents, ImportError> {
    let mut file = std::fs::File::open(path).map_err(|source| ImportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let drawing = Drawing::load(&mut file).map_err(|e| ImportError::Dxf {
        reason: e.to_string(),
    })?;
    let contents = read_drawing(&drawing);
    info!(
        "Read {} entities from {} ({})",
        contents.entities.len(),
        path.display(),
        contents.units
    );
    Ok(contents)
}

/// Convert the entities of an in-memory drawing.
pub fn read_drawing(drawing: &Drawing) -> DxfContents {
    let units = DrawingUnits::from_insunits(drawing.header.default_drawing_units as i32);
    let entities = drawing.entities().filter_map(convert_entity).collect();
    DxfContents { entities, units }
}

/// Import a DXF file as a part named after the file stem.
pub fn import_dxf(path: &Path, params: ImportParameters) -> Result<Part, ImportError> {
    let contents = load_dxf(path)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("drawing")
        .to_string();
    let mut importer = DrawingImporter::new(name, params);
    importer.set_units(contents.units);
    importer.extend(contents.entities);
    importer.finish()
}

fn point(p: &dxf::Point) -> Point2D {
    Point2D::new(p.x, p.y)
}

fn convert_entity(entity: &Entity) -> Option<RawEntity> {
    let layer = entity.common.layer.clone();
    let geometry = match &entity.specific {
        EntityType::Line(line) => RawGeometry::Line {
            start: point(&line.p1),
            end: point(&line.p2),
        },
        EntityType::Arc(arc) => RawGeometry::Arc {
            center: point(&arc.center),
            radius: arc.radius,
            start_angle: arc.start_angle,
            end_angle: arc.end_angle,
            direction: ArcDirection::CounterClockwise,
        },
        EntityType::Circle(circle) => RawGeometry::Circle {
            center: point(&circle.center),
            radius: circle.radius,
        },
        EntityType::LwPolyline(polyline) => RawGeometry::Polyline {
            vertices: polyline
                .vertices
                .iter()
                .map(|v| PolylineVertex::new(v.x, v.y, v.bulge))
                .collect(),
            // Bit 0 (value 1) indicates closed
            closed: polyline.flags & 1 != 0,
        },
        EntityType::Polyline(polyline) => RawGeometry::Polyline {
            vertices: polyline
                .vertices()
                .map(|v| PolylineVertex::new(v.location.x, v.location.y, v.bulge))
                .collect(),
            closed: polyline.flags & 1 != 0,
        },
        EntityType::Spline(spline) => RawGeometry::Spline(SplineDef {
            degree: spline.degree_of_curve.max(1) as usize,
            control_points: spline.control_points.iter().map(point).collect(),
            weights: spline.weight_values.clone(),
            knots: spline.knot_values.clone(),
            fit_points: spline.fit_points.iter().map(point).collect(),
            closed: spline.flags & 1 != 0,
        }),
        EntityType::Ellipse(ellipse) => RawGeometry::Ellipse {
            center: point(&ellipse.center),
        },
        _ => {
            debug!("Ignoring entity on layer '{}'", layer);
            return None;
        }
    };
    Some(RawEntity::new(layer, geometry))
}
