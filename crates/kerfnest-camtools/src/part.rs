//! Parts and the part store.
//!
//! A [`Part`] is one instance of an imported drawing: its chains in
//! part-local centered coordinates plus a live [`PartTransform`]. Parts
//! live in a [`PartStore`] and are addressed by [`PartId`], which is how
//! the nesting session and any renderer share transform state.

use crate::chainify::{contour_bounds, Chain};
use crate::geometry::{rotate_point, BoundingBox, Point2D};
use kerfnest_core::NestingError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Placement of a part on the material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartTransform {
    /// World position of the part's local origin.
    pub offset: Point2D,
    /// Rotation about the local origin, degrees.
    pub angle: f64,
    pub visible: bool,
}

impl Default for PartTransform {
    fn default() -> Self {
        Self {
            offset: Point2D::default(),
            angle: 0.0,
            visible: true,
        }
    }
}

impl PartTransform {
    /// Map a local point to world space: rotate, then translate.
    pub fn apply(&self, p: &Point2D) -> Point2D {
        rotate_point(&Point2D::default(), p, self.angle).translated(self.offset.x, self.offset.y)
    }

    pub fn is_at_origin(&self) -> bool {
        self.offset.x.abs() < f64::EPSILON && self.offset.y.abs() < f64::EPSILON
    }
}

/// One placed or placeable drawing instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub chains: Vec<Chain>,
    pub transform: PartTransform,
    pub lead_in_length: f64,
    pub lead_out_length: f64,
}

impl Part {
    pub fn new(name: impl Into<String>, chains: Vec<Chain>) -> Self {
        Self {
            name: name.into(),
            chains,
            transform: PartTransform::default(),
            lead_in_length: 0.0,
            lead_out_length: 0.0,
        }
    }

    /// Local bounding box of every chain.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        contour_bounds(&self.chains)
    }

    /// Chains moved to world space by the current transform.
    pub fn built_chains(&self) -> Vec<Chain> {
        self.chains
            .iter()
            .map(|chain| Chain {
                points: chain.points.iter().map(|p| self.transform.apply(p)).collect(),
                ..chain.clone()
            })
            .collect()
    }
}

/// Stable handle to a part in a [`PartStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(pub u64);

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Id-keyed part arena that remembers insertion order.
#[derive(Debug, Clone, Default)]
pub struct PartStore {
    parts: HashMap<PartId, Part>,
    order: Vec<PartId>,
    next_id: u64,
}

impl PartStore {
    pub fn new() -> Self {
        Self {
            parts: HashMap::new(),
            order: Vec::new(),
            next_id: 1,
        }
    }

    fn generate_id(&mut self) -> PartId {
        // Default-constructed stores start at zero; skip it so ids stay
        // positive either way.
        if self.next_id == 0 {
            self.next_id = 1;
        }
        let id = PartId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, part: Part) -> PartId {
        let id = self.generate_id();
        self.parts.insert(id, part);
        self.order.push(id);
        id
    }

    pub fn get(&self, id: PartId) -> Option<&Part> {
        self.parts.get(&id)
    }

    pub fn get_mut(&mut self, id: PartId) -> Option<&mut Part> {
        self.parts.get_mut(&id)
    }

    pub fn remove(&mut self, id: PartId) -> Option<Part> {
        let part = self.parts.remove(&id)?;
        self.order.retain(|other| *other != id);
        Some(part)
    }

    pub fn contains(&self, id: PartId) -> bool {
        self.parts.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> &[PartId] {
        &self.order
    }

    /// Parts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (PartId, &Part)> {
        self.order
            .iter()
            .filter_map(move |id| self.parts.get(id).map(|part| (*id, part)))
    }

    pub fn transform(&self, id: PartId) -> Option<&PartTransform> {
        self.parts.get(&id).map(|p| &p.transform)
    }

    pub fn transform_mut(&mut self, id: PartId) -> Option<&mut PartTransform> {
        self.parts.get_mut(&id).map(|p| &mut p.transform)
    }

    /// Copy a part. The copy is named `<base>:<n>`, where `n` counts the
    /// instances of the base drawing, and starts at the source's transform.
    pub fn duplicate(&mut self, id: PartId) -> Result<PartId, NestingError> {
        let source = self
            .parts
            .get(&id)
            .ok_or(NestingError::UnknownPart { id: id.0 })?;
        let base = source
            .name
            .split(':')
            .next()
            .unwrap_or(&source.name)
            .to_string();
        let prefix = format!("{}:", base);
        let instances = self
            .parts
            .values()
            .filter(|p| p.name == base || p.name.starts_with(&prefix))
            .count();
        let mut copy = source.clone();
        copy.name = format!("{}:{}", base, instances);
        Ok(self.insert(copy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_part(name: &str) -> Part {
        let points = vec![
            Point2D::new(-1.0, -1.0),
            Point2D::new(1.0, -1.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(-1.0, 1.0),
            Point2D::new(-1.0, -1.0),
        ];
        Part::new(name, vec![Chain::new(points, "0")])
    }

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let mut store = PartStore::new();
        let a = store.insert(square_part("a"));
        let b = store.insert(square_part("b"));
        assert_ne!(a, b);
        assert_eq!(store.ids(), &[a, b]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_remove_keeps_other_handles_valid() {
        let mut store = PartStore::new();
        let a = store.insert(square_part("a"));
        let b = store.insert(square_part("b"));
        assert!(store.remove(a).is_some());
        assert!(store.get(a).is_none());
        assert_eq!(store.get(b).map(|p| p.name.as_str()), Some("b"));
        assert_eq!(store.ids(), &[b]);
    }

    #[test]
    fn test_duplicate_names_and_transform() {
        let mut store = PartStore::new();
        let a = store.insert(square_part("bracket"));
        store.transform_mut(a).unwrap().offset = Point2D::new(10.0, 5.0);
        let b = store.duplicate(a).unwrap();
        let c = store.duplicate(b).unwrap();
        assert_eq!(store.get(b).unwrap().name, "bracket:1");
        assert_eq!(store.get(c).unwrap().name, "bracket:2");
        assert_eq!(store.transform(c).unwrap().offset, Point2D::new(10.0, 5.0));
    }

    #[test]
    fn test_duplicate_unknown_id() {
        let mut store = PartStore::new();
        assert_eq!(
            store.duplicate(PartId(42)),
            Err(NestingError::UnknownPart { id: 42 })
        );
    }

    #[test]
    fn test_built_chains_follow_transform() {
        let mut part = square_part("a");
        part.transform.offset = Point2D::new(5.0, 0.0);
        let built = part.built_chains();
        assert_eq!(built[0].points[0], Point2D::new(4.0, -1.0));
    }
}
