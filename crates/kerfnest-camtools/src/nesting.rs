//! Cooperative nesting search.
//!
//! A [`NestingSession`] places parts on a rectangular sheet one small step
//! at a time. Each [`NestingSession::tick`] does a bounded amount of work
//! and reports whether the caller should schedule another, so a UI timer
//! or a batch loop can drive it without threads. Cancelling is simply not
//! calling `tick` again.
//!
//! The search for one part sweeps every rotation at the current offset,
//! then steps the offset right along a row, wrapping to the next row up
//! at the right edge of the material. A position is accepted when the
//! part's bounding box is strictly inside the material and its outer
//! polygon overlaps no placed part's outer polygon.

use crate::geometry::{BoundingBox, Point2D};
use crate::kernel::{CavalierKernel, GeometryKernel};
use crate::part::{PartId, PartStore, PartTransform};
use crate::polypart::{build_part, BuildOptions, PolyPart};
use kerfnest_core::NestingError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Search settings for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NestingParameters {
    pub material_min: Point2D,
    pub material_max: Point2D,
    /// Angle added per rotation attempt, degrees.
    pub rotation_increment_deg: f64,
    /// Offset added per translation attempt along each axis.
    pub translation_step: Point2D,
    /// Full kerf width. Outlines are offset by half of it.
    pub kerf_width: f64,
    pub closed_tolerance: f64,
    pub simplify_tolerance: f64,
    /// Ticks per [`NestingSession::advance`] call made by schedulers.
    pub steps_per_tick: usize,
    pub offset_arc_segments: usize,
}

impl Default for NestingParameters {
    fn default() -> Self {
        Self {
            material_min: Point2D::new(0.0, 0.0),
            material_max: Point2D::new(1000.0, 1000.0),
            rotation_increment_deg: 60.0,
            translation_step: Point2D::new(5.0, 5.0),
            kerf_width: 1.5,
            closed_tolerance: 0.1,
            simplify_tolerance: 0.02,
            steps_per_tick: 500,
            offset_arc_segments: 100,
        }
    }
}

impl NestingParameters {
    pub fn kerf_radius(&self) -> f64 {
        self.kerf_width / 2.0
    }

    pub fn material(&self) -> BoundingBox {
        BoundingBox::new(self.material_min, self.material_max)
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            kerf_radius: self.kerf_radius(),
            closed_tolerance: self.closed_tolerance,
            simplify_tolerance: self.simplify_tolerance,
        }
    }

    pub fn validate(&self) -> Result<(), NestingError> {
        let invalid = |reason: &str| {
            Err(NestingError::InvalidParameters {
                reason: reason.to_string(),
            })
        };
        if !(self.rotation_increment_deg > 0.0 && self.rotation_increment_deg <= 360.0) {
            return invalid("rotation increment must be in (0, 360]");
        }
        if !(self.translation_step.x > 0.0 && self.translation_step.y > 0.0) {
            return invalid("translation step must be positive on both axes");
        }
        if !(self.material_max.x > self.material_min.x && self.material_max.y > self.material_min.y)
        {
            return invalid("material must have positive width and height");
        }
        if !(self.kerf_width >= 0.0) {
            return invalid("kerf width must not be negative");
        }
        if !(self.closed_tolerance >= 0.0 && self.simplify_tolerance >= 0.0) {
            return invalid("tolerances must not be negative");
        }
        if self.steps_per_tick == 0 {
            return invalid("steps per tick must be at least 1");
        }
        Ok(())
    }
}

/// Where a session is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestingState {
    /// Created, no tick yet.
    Idle,
    /// Looking for a position for the front part.
    Searching,
    /// The front part has a valid position waiting to be committed.
    Placed,
    /// Every part was placed.
    AllPlaced,
    /// A part did not fit anywhere. It and every part after it stay
    /// where they are.
    OutOfMaterial,
}

impl NestingState {
    pub fn is_terminal(self) -> bool {
        matches!(self, NestingState::AllPlaced | NestingState::OutOfMaterial)
    }
}

pub struct NestingSession<K: GeometryKernel = CavalierKernel> {
    params: NestingParameters,
    kernel: K,
    unplaced: VecDeque<PolyPart>,
    placed: Vec<PolyPart>,
    state: NestingState,
    ticks: u64,
}

impl NestingSession<CavalierKernel> {
    pub fn new(params: NestingParameters) -> Result<Self, NestingError> {
        let kernel = CavalierKernel::new(params.offset_arc_segments);
        Self::with_kernel(params, kernel)
    }

    /// Session that nests `ids` around every other part in the store,
    /// which is treated as already placed.
    pub fn for_parts(
        params: NestingParameters,
        store: &PartStore,
        ids: &[PartId],
    ) -> Result<Self, NestingError> {
        let mut session = Self::new(params)?;
        for (id, part) in store.iter() {
            if ids.contains(&id) {
                continue;
            }
            if let Err(e) = session.push_placed(store, id) {
                warn!("Ignoring placed part '{}': {}", part.name, e);
            }
        }
        for id in ids {
            session.push_unplaced(store, *id)?;
        }
        Ok(session)
    }
}

impl<K: GeometryKernel> NestingSession<K> {
    pub fn with_kernel(params: NestingParameters, kernel: K) -> Result<Self, NestingError> {
        params.validate()?;
        Ok(Self {
            params,
            kernel,
            unplaced: VecDeque::new(),
            placed: Vec::new(),
            state: NestingState::Idle,
            ticks: 0,
        })
    }

    pub fn params(&self) -> &NestingParameters {
        &self.params
    }

    pub fn state(&self) -> NestingState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn placed(&self) -> &[PolyPart] {
        &self.placed
    }

    pub fn unplaced(&self) -> impl Iterator<Item = &PolyPart> {
        self.unplaced.iter()
    }

    fn build(&self, store: &PartStore, id: PartId) -> Result<PolyPart, NestingError> {
        let part = store.get(id).ok_or(NestingError::UnknownPart { id: id.0 })?;
        let poly = build_part(&self.kernel, id, part, &self.params.build_options());
        if poly.outer().map_or(true, |outer| outer.is_inside) {
            return Err(NestingError::NoOuterBoundary {
                name: part.name.clone(),
            });
        }
        Ok(poly)
    }

    /// Queue a part for placement.
    pub fn push_unplaced(&mut self, store: &PartStore, id: PartId) -> Result<(), NestingError> {
        let poly = self.build(store, id)?;
        debug!("Queued part '{}' for nesting", poly.name);
        self.unplaced.push_back(poly);
        Ok(())
    }

    /// Register a part that already sits on the material.
    pub fn push_placed(&mut self, store: &PartStore, id: PartId) -> Result<(), NestingError> {
        let poly = self.build(store, id)?;
        self.placed.push(poly);
        Ok(())
    }

    /// Default position for a part: its bounding box tucked into the
    /// material's minimum corner, plus a clearance of lead-in length and
    /// kerf width.
    fn default_offset(&self, store: &PartStore, poly: &PolyPart) -> Point2D {
        let lead_in = store.get(poly.id).map_or(0.0, |p| p.lead_in_length);
        let clearance = lead_in + self.params.kerf_width;
        let (w, h) = poly
            .bounding_box()
            .map_or((0.0, 0.0), |b| (b.width(), b.height()));
        Point2D::new(
            self.params.material_min.x + w / 2.0 + clearance,
            self.params.material_min.y + h / 2.0 + clearance,
        )
    }

    /// Move the front unplaced part to its default offset.
    fn seat_front(&mut self, store: &mut PartStore, only_if_at_origin: bool) {
        let Some(front) = self.unplaced.front() else {
            return;
        };
        let id = front.id;
        let Some(mut transform) = store.transform(id).copied() else {
            return;
        };
        if only_if_at_origin && !transform.is_at_origin() {
            return;
        }
        transform.offset = self.default_offset(store, front);
        self.store_transform(store, id, transform);
        if let Some(front) = self.unplaced.front_mut() {
            front.build(&transform);
        }
    }

    /// Prepare the run: refresh placed geometry, sort the queue by
    /// descending bounding-box area and seat the first part.
    pub fn begin(&mut self, store: &mut PartStore) {
        let before = self.unplaced.len();
        self.unplaced.retain(|p| store.contains(p.id));
        self.placed.retain(|p| store.contains(p.id));
        if self.unplaced.len() != before {
            warn!("{} queued parts were removed before nesting", before - self.unplaced.len());
        }
        for poly in self.placed.iter_mut().chain(self.unplaced.iter_mut()) {
            if let Some(t) = store.transform(poly.id) {
                poly.build(t);
            }
        }

        self.unplaced.make_contiguous().sort_by(|a, b| {
            let area = |p: &PolyPart| p.bounding_box().map_or(0.0, |bb| bb.area());
            area(b).total_cmp(&area(a))
        });

        self.seat_front(store, true);
        self.state = if self.unplaced.is_empty() {
            NestingState::AllPlaced
        } else {
            NestingState::Searching
        };
        info!(
            "Nesting {} parts around {} placed parts",
            self.unplaced.len(),
            self.placed.len()
        );
    }

    /// One unit of work. Returns `true` while another tick is needed.
    pub fn tick(&mut self, store: &mut PartStore) -> bool {
        self.ticks += 1;
        match self.state {
            NestingState::AllPlaced | NestingState::OutOfMaterial => false,
            NestingState::Idle => {
                self.begin(store);
                if self.state.is_terminal() {
                    return false;
                }
                self.search_step(store)
            }
            NestingState::Placed => self.commit(store),
            NestingState::Searching => self.search_step(store),
        }
    }

    /// Run up to `budget` ticks. Returns `true` while the session still
    /// has work left.
    pub fn advance(&mut self, store: &mut PartStore, budget: usize) -> bool {
        for _ in 0..budget {
            if !self.tick(store) {
                return false;
            }
        }
        true
    }

    /// Tick until the session reaches a terminal state.
    pub fn run_to_completion(&mut self, store: &mut PartStore) -> NestingState {
        while self.tick(store) {}
        self.state
    }

    fn commit(&mut self, store: &mut PartStore) -> bool {
        let Some(poly) = self.unplaced.pop_front() else {
            self.state = NestingState::AllPlaced;
            return false;
        };
        if let Some(t) = store.transform_mut(poly.id) {
            t.visible = true;
            info!(
                "Placed '{}' at ({:.3}, {:.3}) rotated {:.1}",
                poly.name, t.offset.x, t.offset.y, t.angle
            );
        }
        self.placed.push(poly);

        if self.unplaced.is_empty() {
            self.state = NestingState::AllPlaced;
            info!("All {} parts placed", self.placed.len());
            return false;
        }
        self.seat_front(store, false);
        self.state = NestingState::Searching;
        true
    }

    /// True when `poly`, as last built, may stay where it is.
    fn fits(&self, poly: &PolyPart) -> bool {
        let Some(bbox) = poly.bounding_box() else {
            return false;
        };
        if !bbox.is_strictly_inside(&self.params.material()) {
            return false;
        }
        let Some(outer) = poly.built_outer() else {
            return false;
        };
        for other in &self.placed {
            match other.bounding_box() {
                Some(other_bbox) if other_bbox.intersects(&bbox) => {}
                _ => continue,
            }
            if let Some(other_outer) = other.built_outer() {
                if self.kernel.intersects(outer, other_outer) {
                    return false;
                }
            }
        }
        true
    }

    fn search_step(&mut self, store: &mut PartStore) -> bool {
        let Some(mut poly) = self.unplaced.pop_front() else {
            self.state = NestingState::AllPlaced;
            return false;
        };
        let Some(mut transform) = store.transform(poly.id).copied() else {
            warn!("Part '{}' vanished from the store, skipping it", poly.name);
            if self.unplaced.is_empty() {
                self.state = NestingState::AllPlaced;
                return false;
            }
            return true;
        };

        let increment = self.params.rotation_increment_deg;
        let attempts = (360.0 / increment).ceil() as usize;
        for _ in 0..attempts {
            poly.build(&transform);
            if self.fits(&poly) {
                debug!(
                    "'{}' fits at ({:.3}, {:.3}) rotated {:.1}",
                    poly.name, transform.offset.x, transform.offset.y, transform.angle
                );
                self.store_transform(store, poly.id, transform);
                self.unplaced.push_front(poly);
                self.state = NestingState::Placed;
                return true;
            }
            transform.angle += increment;
            if transform.angle >= 360.0 {
                transform.angle -= 360.0;
            }
        }

        poly.build(&transform);
        let (half_w, half_h) = poly
            .bounding_box()
            .map_or((0.0, 0.0), |b| (b.width() / 2.0, b.height() / 2.0));
        let default = self.default_offset(store, &poly);

        transform.offset.x += self.params.translation_step.x;
        if transform.offset.x > self.params.material_max.x - half_w {
            transform.offset.x = default.x;
            transform.offset.y += self.params.translation_step.y;
            if transform.offset.y > self.params.material_max.y - half_h {
                self.unplaced.push_front(poly);
                self.out_of_material(store);
                return false;
            }
        }

        self.store_transform(store, poly.id, transform);
        poly.build(&transform);
        self.unplaced.push_front(poly);
        true
    }

    fn store_transform(&self, store: &mut PartStore, id: PartId, transform: PartTransform) {
        if let Some(t) = store.transform_mut(id) {
            *t = transform;
        }
    }

    fn out_of_material(&mut self, store: &mut PartStore) {
        for poly in &self.unplaced {
            if let Some(t) = store.transform_mut(poly.id) {
                t.visible = true;
            }
        }
        warn!(
            "Out of material with {} parts unplaced ({} placed)",
            self.unplaced.len(),
            self.placed.len()
        );
        self.state = NestingState::OutOfMaterial;
    }
}
