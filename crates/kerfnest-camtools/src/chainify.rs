//! Contour chaining and classification.
//!
//! Joins an unordered soup of segments into ordered point chains, marks
//! which chains are closed, decides which ones sit inside another, and
//! moves the whole set so its bounding box is centered on the origin.

use crate::geometry::{path_inside_path, BoundingBox, LineSegment, Point2D};
use std::collections::HashMap;
use tracing::debug;

/// Ordered run of connected points.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub points: Vec<Point2D>,
    /// First and last point lie within the chaining tolerance.
    pub closed: bool,
    /// Some vertex of this chain lies inside another chain of the set.
    pub inside_contour: bool,
    pub layer: String,
}

impl Chain {
    pub fn new(points: Vec<Point2D>, layer: impl Into<String>) -> Self {
        Self {
            points,
            closed: false,
            inside_contour: false,
            layer: layer.into(),
        }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.points)
    }

    /// True when `container` is a closed chain whose bounding box covers
    /// this chain's and some vertex of this chain lies inside it. Open
    /// chains never contain anything.
    pub fn lies_inside(&self, container: &Chain) -> bool {
        if !container.closed {
            return false;
        }
        match (container.bounding_box(), self.bounding_box()) {
            (Some(outer), Some(inner)) if outer.contains_box(&inner) => {
                path_inside_path(&self.points, &container.points)
            }
            _ => false,
        }
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        for p in &mut self.points {
            *p = p.translated(dx, dy);
        }
    }

    /// Re-derive `closed` from the end-to-end gap.
    pub fn update_closed(&mut self, tolerance: f64) {
        self.closed = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) if self.points.len() > 2 => {
                first.distance_to(last) <= tolerance
            }
            _ => false,
        };
    }
}

type Cell = (i64, i64);

/// Endpoint index over a segment list.
struct EndpointGrid {
    cell_size: f64,
    cells: HashMap<Cell, Vec<usize>>,
}

impl EndpointGrid {
    fn new(segments: &[LineSegment], tolerance: f64) -> Self {
        let cell_size = (tolerance * 2.0).max(1e-9);
        let mut grid = Self {
            cell_size,
            cells: HashMap::new(),
        };
        for (i, seg) in segments.iter().enumerate() {
            let a = grid.cell(&seg.start);
            let b = grid.cell(&seg.end);
            grid.cells.entry(a).or_default().push(i);
            if b != a {
                grid.cells.entry(b).or_default().push(i);
            }
        }
        grid
    }

    fn cell(&self, p: &Point2D) -> Cell {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
        )
    }

    /// Unused segment indices with an endpoint in the 3x3 neighbourhood of
    /// `p`, in ascending order.
    fn candidates(&self, p: &Point2D, used: &[bool]) -> Vec<usize> {
        let (cx, cy) = self.cell(p);
        let mut found = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(list) = self.cells.get(&(cx + dx, cy + dy)) {
                    found.extend(list.iter().copied().filter(|i| !used[*i]));
                }
            }
        }
        found.sort_unstable();
        found.dedup();
        found
    }
}

/// Join `segments` into chains.
///
/// Segments are taken in index order. Each chain starts from the first
/// unused segment, oriented so its connected end is the tail, and grows
/// at the tail by the lowest-indexed unused segment with an endpoint
/// within `tolerance`. Zero-length segments are ignored.
pub fn chainify(segments: &[LineSegment], tolerance: f64) -> Vec<Chain> {
    let mut used: Vec<bool> = segments.iter().map(|s| s.start == s.end).collect();
    let grid = EndpointGrid::new(segments, tolerance);
    let mut chains = Vec::new();
    let mut consumed = 0usize;

    let touches = |p: &Point2D, seg: &LineSegment| {
        if p.distance_to(&seg.start) <= tolerance {
            Some(seg.end)
        } else if p.distance_to(&seg.end) <= tolerance {
            Some(seg.start)
        } else {
            None
        }
    };

    for seed_index in 0..segments.len() {
        if used[seed_index] {
            continue;
        }
        used[seed_index] = true;
        consumed += 1;
        let seed = &segments[seed_index];

        let end_shared = grid
            .candidates(&seed.end, &used)
            .into_iter()
            .any(|i| touches(&seed.end, &segments[i]).is_some());
        let mut points = if end_shared {
            vec![seed.start, seed.end]
        } else {
            vec![seed.end, seed.start]
        };

        loop {
            let Some(tail) = points.last().copied() else {
                break;
            };
            let next = grid
                .candidates(&tail, &used)
                .into_iter()
                .find_map(|i| touches(&tail, &segments[i]).map(|far| (i, far)));
            let Some((index, far)) = next else {
                break;
            };
            used[index] = true;
            consumed += 1;
            if far != tail {
                points.push(far);
            }
            if consumed % 100 == 0 {
                debug!("Chained {} of {} segments", consumed, segments.len());
            }
        }

        let mut chain = Chain::new(points, seed.layer.clone());
        chain.update_closed(tolerance);
        chains.push(chain);
    }

    debug!(
        "Built {} chains from {} segments",
        chains.len(),
        segments.len()
    );
    chains
}

/// Mark every chain that lies inside some other closed chain.
pub fn classify_contours(chains: &mut [Chain]) {
    let flags: Vec<bool> = (0..chains.len())
        .map(|i| {
            chains
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && chains[i].lies_inside(other))
        })
        .collect();
    for (chain, inside) in chains.iter_mut().zip(flags) {
        chain.inside_contour = inside;
    }
}

/// Bounding box over every point of every chain.
pub fn contour_bounds(chains: &[Chain]) -> Option<BoundingBox> {
    chains
        .iter()
        .filter_map(Chain::bounding_box)
        .reduce(|a, b| a.union(&b))
}

/// Translate the chains so their combined bounding box is centered on the
/// origin. Returns the translation applied.
pub fn center_on_origin(chains: &mut [Chain]) -> Point2D {
    let Some(bounds) = contour_bounds(chains) else {
        return Point2D::default();
    };
    let center = bounds.center();
    for chain in chains.iter_mut() {
        chain.translate(-center.x, -center.y);
    }
    Point2D::new(-center.x, -center.y)
}
