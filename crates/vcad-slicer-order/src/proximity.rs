//! Spatial indexing of line segments for candidate pruning using R*-tree.
//!
//! The line optimizer asks "which paths have a segment near the head" before
//! falling back to a scan over every path. Any [`ProximityIndex`] may be
//! supplied; [`SegmentIndex`] is the stock implementation.

use rstar::{RTree, RTreeObject, AABB};
use vcad_slicer_math::{Coord, Point};

use crate::path::PathRef;

/// Answers which paths have a segment within a radius of a point.
pub trait ProximityIndex {
    /// Indices of paths with a segment whose bounding box lies within
    /// `radius` of `point`. May contain false positives, never false
    /// negatives. Order and duplicates are unspecified.
    fn nearby(&self, point: &Point, radius: Coord) -> Vec<usize>;
}

/// An entry in the segment index: one edge of one path.
#[derive(Debug, Clone)]
pub struct SegmentEntry {
    /// Index of the owning path.
    pub path: usize,
    /// Axis-aligned bounding box (min_x, min_y, max_x, max_y).
    pub aabb: [Coord; 4],
}

impl SegmentEntry {
    /// Creates an entry for the segment `a–b` of `path`.
    pub fn new(path: usize, a: &Point, b: &Point) -> Self {
        Self {
            path,
            aabb: [a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y)],
        }
    }
}

impl RTreeObject for SegmentEntry {
    type Envelope = AABB<[Coord; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.aabb[0], self.aabb[1]], [self.aabb[2], self.aabb[3]])
    }
}

/// R*-tree over the segments of a set of paths.
#[derive(Debug)]
pub struct SegmentIndex {
    tree: RTree<SegmentEntry>,
}

impl SegmentIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Bulk-loads every segment of `paths`, keyed by position in the slice.
    ///
    /// Pass the same paths, in the same order, as were added to the
    /// optimizer. Single-vertex paths are indexed as points.
    pub fn from_paths(paths: &[PathRef<'_>]) -> Self {
        let mut entries = Vec::new();
        for (idx, path) in paths.iter().enumerate() {
            match path.points() {
                [] => {}
                [p] => entries.push(SegmentEntry::new(idx, p, p)),
                _ => entries.extend(path.segments().map(|(a, b)| SegmentEntry::new(idx, a, b))),
            }
        }
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Returns the number of indexed segments.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns true if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SegmentIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ProximityIndex for SegmentIndex {
    fn nearby(&self, point: &Point, radius: Coord) -> Vec<usize> {
        let r = radius.max(0);
        let envelope = AABB::from_corners(
            [point.x.saturating_sub(r), point.y.saturating_sub(r)],
            [point.x.saturating_add(r), point.y.saturating_add(r)],
        );
        let mut found: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.path)
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }
}
