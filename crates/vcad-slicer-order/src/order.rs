//! Ordering results and optimizer lifecycle.

use vcad_slicer_math::{dist, Point};

use crate::path::PathRef;

/// Lifecycle of an optimizer instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizerState {
    /// Paths may still be added.
    #[default]
    Accumulating,
    /// `optimize` has run; the result is available.
    Optimized,
}

/// One step of an ordering: which path to trace and where to enter it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderStep {
    /// Index of the path in insertion order.
    pub path: usize,
    /// Vertex index where the path is entered. `None` for paths without
    /// vertices.
    pub entry: Option<usize>,
}

/// The result of an ordering run.
///
/// Steps are stored in visiting order; the per-path entry and rank lookups
/// are indexed by insertion position, so callers never have to correlate
/// parallel arrays themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathOrder {
    steps: Vec<OrderStep>,
    entries: Vec<Option<usize>>,
    ranks: Vec<Option<usize>>,
}

impl PathOrder {
    pub(crate) fn with_capacity(path_count: usize) -> Self {
        Self {
            steps: Vec::with_capacity(path_count),
            entries: vec![None; path_count],
            ranks: vec![None; path_count],
        }
    }

    pub(crate) fn push(&mut self, path: usize, entry: Option<usize>) {
        self.ranks[path] = Some(self.steps.len());
        self.entries[path] = entry;
        self.steps.push(OrderStep { path, entry });
    }

    /// Steps in visiting order.
    pub fn steps(&self) -> &[OrderStep] {
        &self.steps
    }

    /// Path indices in visiting order.
    pub fn order(&self) -> Vec<usize> {
        self.steps.iter().map(|s| s.path).collect()
    }

    /// Entry vertex chosen for the path inserted at `path`.
    pub fn entry_index(&self, path: usize) -> Option<usize> {
        self.entries.get(path).copied().flatten()
    }

    /// Position of the path inserted at `path` within the visiting order.
    pub fn rank_of(&self, path: usize) -> Option<usize> {
        self.ranks.get(path).copied().flatten()
    }

    /// Number of ordered paths.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether nothing was ordered.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Iterate over steps in visiting order.
    pub fn iter(&self) -> std::slice::Iter<'_, OrderStep> {
        self.steps.iter()
    }

    /// Head position after tracing every path, starting at `start`.
    pub fn end_point(&self, start: Point, paths: &[PathRef<'_>]) -> Point {
        self.steps
            .iter()
            .filter_map(|step| {
                let entry = step.entry?;
                let path = paths.get(step.path)?;
                path.get(path.exit_index(entry)).copied()
            })
            .last()
            .unwrap_or(start)
    }

    /// Total straight-line travel (non-printing) distance of this ordering
    /// when starting at `start`.
    pub fn travel_distance(&self, start: Point, paths: &[PathRef<'_>]) -> f64 {
        let mut head = start;
        let mut total = 0.0;
        for step in &self.steps {
            let (Some(entry), Some(path)) = (step.entry, paths.get(step.path)) else {
                continue;
            };
            if let (Some(enter), Some(leave)) = (path.get(entry), path.get(path.exit_index(entry))) {
                total += dist(&head, enter);
                head = *leave;
            }
        }
        total
    }
}

impl<'o> IntoIterator for &'o PathOrder {
    type Item = &'o OrderStep;
    type IntoIter = std::slice::Iter<'o, OrderStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}
