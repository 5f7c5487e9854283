//! Layout report for a finished nesting run.

use crate::geometry::{BoundingBox, Point2D};
use crate::kernel::{signed_area, GeometryKernel};
use crate::nesting::{NestingSession, NestingState};
use crate::part::{PartId, PartStore};
use serde::{Deserialize, Serialize};

/// Where one part ended up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartPlacement {
    pub id: PartId,
    pub name: String,
    pub offset: Point2D,
    pub angle: f64,
    /// World-space bounding box of the kerf-offset outline.
    pub bounding_box: Option<BoundingBox>,
    pub placed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestingReport {
    pub state: NestingState,
    pub material: BoundingBox,
    pub ticks: u64,
    pub parts: Vec<PartPlacement>,
    /// Share of the material area covered by placed outer outlines.
    pub utilisation: f64,
}

impl NestingReport {
    pub fn from_session<K: GeometryKernel>(session: &NestingSession<K>, store: &PartStore) -> Self {
        let material = session.params().material();
        let mut parts = Vec::new();
        let mut covered = 0.0;

        let placed = session.placed().iter().map(|p| (p, true));
        let unplaced = session.unplaced().map(|p| (p, false));
        for (poly, is_placed) in placed.chain(unplaced) {
            let Some(transform) = store.transform(poly.id) else {
                continue;
            };
            if is_placed {
                covered += poly.outer().map_or(0.0, |o| signed_area(&o.vertices).abs());
            }
            parts.push(PartPlacement {
                id: poly.id,
                name: poly.name.clone(),
                offset: transform.offset,
                angle: transform.angle,
                bounding_box: poly.bounding_box(),
                placed: is_placed,
            });
        }

        let area = material.area();
        Self {
            state: session.state(),
            material,
            ticks: session.ticks(),
            parts,
            utilisation: if area > 0.0 { covered / area } else { 0.0 },
        }
    }

    pub fn placed_count(&self) -> usize {
        self.parts.iter().filter(|p| p.placed).count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
