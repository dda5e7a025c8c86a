//! Ordering of open lines (infill, skin, support) and their direction.
//!
//! Each step picks the unprinted line and entry endpoint with the lowest
//! combined score:
//!
//! - travel distance from the head to the entry, inflated when the straight
//!   move would cross an obstacle boundary;
//! - an angle score rewarding lines that turn 90° from the previous one,
//!   which is gentlest on jerk-limited machines;
//! - a reversal penalty for traversing back against the previous direction.
//!
//! A straight continuation (0°) costs nothing extra: it happens when a single
//! infill line is interrupted by an obstacle.

use std::fmt;

use serde::{Deserialize, Serialize};
use vcad_slicer_math::{dist, dist2, normal, turn90_ccw, Coord, Point, Vec2};

use crate::boundary::TravelBoundary;
use crate::error::{OrderError, Result};
use crate::order::{OptimizerState, PathOrder};
use crate::path::{PathRef, Polygon, Polyline};
use crate::proximity::ProximityIndex;

/// Settings for line ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineOrderSettings {
    /// Distance-equivalent reward for a 90° turn (machine units).
    pub angle_weight: f64,
    /// Distance-equivalent penalty for a full reversal (machine units).
    pub reversal_weight: f64,
    /// Multiplier on straight distance when a move crosses the boundary.
    pub detour_factor: f64,
    /// Search radius for the proximity index (machine units).
    pub proximity_radius: Coord,
    /// Endpoints closer than this are treated as coincident (machine units).
    pub coincident_tolerance: Coord,
    /// Continue through lines that share an endpoint with the previous one.
    pub find_chains: bool,
}

impl Default for LineOrderSettings {
    fn default() -> Self {
        Self {
            angle_weight: 100.0,
            reversal_weight: 100.0,
            detour_factor: 3.0,
            proximity_radius: 2000,
            coincident_tolerance: 5,
            find_chains: true,
        }
    }
}

impl LineOrderSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.angle_weight.is_finite() && self.angle_weight >= 0.0) {
            return Err(OrderError::InvalidSettings(
                "angle_weight must be finite and non-negative".into(),
            ));
        }
        if !(self.reversal_weight.is_finite() && self.reversal_weight >= 0.0) {
            return Err(OrderError::InvalidSettings(
                "reversal_weight must be finite and non-negative".into(),
            ));
        }
        if !(self.detour_factor.is_finite() && self.detour_factor >= 1.0) {
            return Err(OrderError::InvalidSettings(
                "detour_factor must be at least 1".into(),
            ));
        }
        if self.proximity_radius < 0 || self.coincident_tolerance < 0 {
            return Err(OrderError::InvalidSettings(
                "proximity_radius and coincident_tolerance must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// One end of an open line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// The first vertex.
    Start,
    /// The last vertex.
    End,
}

/// Direction the head was moving while printing the previous line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heading {
    /// Unit direction of travel.
    pub dir: Vec2,
    /// `dir` turned 90° counter-clockwise.
    pub normal: Vec2,
}

impl Heading {
    /// Heading of a move from `from` to `to`; `None` if they coincide.
    pub fn along(from: &Point, to: &Point) -> Option<Self> {
        normal(&(to - from)).map(|dir| Self {
            dir,
            normal: turn90_ccw(&dir),
        })
    }
}

/// The best candidate found so far in a selection step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestLine {
    /// Path index.
    pub path: usize,
    /// Entry vertex index.
    pub entry: usize,
    /// Combined score; lower is better.
    pub score: f64,
}

/// How well the line `from–to` follows a previous line whose perpendicular
/// normal is `incoming_normal`, in `[-1, 0]`.
///
/// -1 for a line at 90° to the previous one, 0 for a parallel line. The
/// score is symmetric in `from` and `to`. A zero-length line or a zero
/// normal scores a neutral 0.
pub fn angle_score(incoming_normal: &Vec2, from: &Point, to: &Point) -> f64 {
    match normal(&(to - from)) {
        Some(dir) => -incoming_normal.dot(&dir).abs(),
        None => 0.0,
    }
}

/// Penalty in `[0, 1]` for traversing `entry → exit` against the incoming
/// direction: 1 for a full reversal, 0 for anything up to a right angle.
pub fn reversal_penalty(incoming_dir: &Vec2, entry: &Point, exit: &Point) -> f64 {
    match normal(&(exit - entry)) {
        Some(dir) => (-incoming_dir.dot(&dir)).max(0.0),
        None => 0.0,
    }
}

/// Boundary-aware travel distance estimate.
///
/// When the straight move crosses `boundary`, the straight distance is
/// multiplied by `detour_factor` (at least 1). The result is never less than
/// the straight distance.
pub fn obstacle_aware_distance(
    boundary: &dyn TravelBoundary,
    p0: &Point,
    p1: &Point,
    detour_factor: f64,
) -> f64 {
    let direct = dist(p0, p1);
    if boundary.crosses(p0, p1) {
        direct * detour_factor.max(1.0)
    } else {
        direct
    }
}

/// Orders open lines (and any closed contours mixed in) and chooses which
/// end each line is printed from.
pub struct LineOrderOptimizer<'a> {
    start: Point,
    boundary: Option<&'a dyn TravelBoundary>,
    proximity: Option<&'a dyn ProximityIndex>,
    settings: LineOrderSettings,
    paths: Vec<PathRef<'a>>,
    result: PathOrder,
    state: OptimizerState,
}

impl fmt::Debug for LineOrderOptimizer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineOrderOptimizer")
            .field("start", &self.start)
            .field("has_boundary", &self.boundary.is_some())
            .field("has_proximity", &self.proximity.is_some())
            .field("settings", &self.settings)
            .field("paths", &self.paths.len())
            .field("state", &self.state)
            .finish()
    }
}

impl<'a> LineOrderOptimizer<'a> {
    /// Create an optimizer starting from the head position `start`.
    pub fn new(start: Point) -> Self {
        Self {
            start,
            boundary: None,
            proximity: None,
            settings: LineOrderSettings::default(),
            paths: Vec::new(),
            result: PathOrder::default(),
            state: OptimizerState::Accumulating,
        }
    }

    /// Estimate travel around `boundary` instead of assuming straight moves.
    pub fn with_boundary(mut self, boundary: &'a dyn TravelBoundary) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Prune candidate search with `index`, which must be keyed by the same
    /// path indices as the paths added here.
    pub fn with_proximity(mut self, index: &'a dyn ProximityIndex) -> Self {
        self.proximity = Some(index);
        self
    }

    /// Use explicit settings, rejecting invalid ones.
    pub fn with_settings(mut self, settings: LineOrderSettings) -> Result<Self> {
        settings.validate()?;
        self.settings = settings;
        Ok(self)
    }

    /// Add a path. Fails once [`optimize`](Self::optimize) has run.
    pub fn add_shape(&mut self, path: PathRef<'a>) -> Result<()> {
        if self.state == OptimizerState::Optimized {
            return Err(OrderError::AlreadyOptimized);
        }
        self.paths.push(path);
        Ok(())
    }

    /// Add an open polyline.
    pub fn add_polyline(&mut self, polyline: &'a Polyline) -> Result<()> {
        self.add_shape(polyline.as_path())
    }

    /// Add every polyline in `polylines`, in order.
    pub fn add_polylines(&mut self, polylines: &'a [Polyline]) -> Result<()> {
        polylines.iter().try_for_each(|p| self.add_polyline(p))
    }

    /// Add a closed polygon.
    pub fn add_polygon(&mut self, polygon: &'a Polygon) -> Result<()> {
        self.add_shape(polygon.as_path())
    }

    /// Number of added paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no paths were added.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// The added paths, in insertion order.
    pub fn paths(&self) -> &[PathRef<'a>] {
        &self.paths
    }

    /// Current lifecycle state.
    pub fn state(&self) -> OptimizerState {
        self.state
    }

    /// Result of the last [`optimize`](Self::optimize) run.
    pub fn result(&self) -> &PathOrder {
        &self.result
    }

    /// Compute the visiting order and entry endpoint of every path.
    ///
    /// Paths without vertices are appended last with no entry. Running again
    /// reproduces the same result.
    pub fn optimize(&mut self) -> &PathOrder {
        let n = self.paths.len();
        let mut result = PathOrder::with_capacity(n);
        let mut picked = vec![false; n];
        let mut prev = self.start;
        let mut heading: Option<Heading> = None;

        while let Some(best) = self.find_next(&picked, &prev, heading.as_ref()) {
            let path = &self.paths[best.path];
            let entry = path.points()[best.entry];
            let exit = path.points()[path.exit_index(best.entry)];
            log::trace!(
                "line {}: enter at vertex {}, score {:.1}",
                best.path,
                best.entry,
                best.score
            );

            heading = if path.is_closed() {
                None
            } else {
                Heading::along(&entry, &exit)
            };
            prev = exit;
            picked[best.path] = true;
            result.push(best.path, Some(best.entry));
        }

        for (idx, _) in self.paths.iter().enumerate().filter(|(_, p)| p.is_empty()) {
            result.push(idx, None);
        }

        log::debug!(
            "ordered {} lines (boundary: {}, index: {})",
            n,
            self.boundary.is_some(),
            self.proximity.is_some()
        );

        self.result = result;
        self.state = OptimizerState::Optimized;
        &self.result
    }

    /// Select the next line to print from `prev`.
    fn find_next(
        &self,
        picked: &[bool],
        prev: &Point,
        heading: Option<&Heading>,
    ) -> Option<BestLine> {
        let n = self.paths.len();
        let mut best = None;

        let nearby: Option<Vec<usize>> = self.proximity.map(|index| {
            index
                .nearby(prev, self.settings.proximity_radius)
                .into_iter()
                .filter(|&idx| idx < n && !picked[idx])
                .collect()
        });

        if self.settings.find_chains {
            let all: Vec<usize>;
            let scope: &[usize] = match &nearby {
                Some(found) => found,
                None => {
                    all = (0..n).filter(|&idx| !picked[idx]).collect();
                    &all
                }
            };
            for &idx in scope {
                if let Some(end) = self.coincident_endpoint(idx, prev) {
                    self.update_best_line(idx, &mut best, prev, heading, Some(end));
                }
            }
            if best.is_some() {
                return best;
            }
        }

        if let Some(found) = &nearby {
            for &idx in found {
                self.update_best_line(idx, &mut best, prev, heading, None);
            }
            if best.is_some() {
                return best;
            }
        }

        for idx in (0..n).filter(|&idx| !picked[idx]) {
            self.update_best_line(idx, &mut best, prev, heading, None);
        }
        best
    }

    /// Endpoint of open line `idx` touching `prev`, if any.
    fn coincident_endpoint(&self, idx: usize, prev: &Point) -> Option<Endpoint> {
        let path = &self.paths[idx];
        if path.is_closed() || path.len() < 2 {
            return None;
        }
        let tol = self.settings.coincident_tolerance as f64;
        let touches = |p: &Point| dist2(p, prev) <= tol * tol;
        let pts = path.points();
        if touches(&pts[0]) {
            Some(Endpoint::Start)
        } else if touches(&pts[pts.len() - 1]) {
            Some(Endpoint::End)
        } else {
            None
        }
    }

    /// Replace `best` if path `idx` scores better from `prev`.
    ///
    /// Both endpoints are evaluated unless `just_point` restricts the search
    /// to one of them, as when continuing a chain through a shared endpoint.
    /// Ties keep the earlier candidate.
    pub fn update_best_line(
        &self,
        idx: usize,
        best: &mut Option<BestLine>,
        prev: &Point,
        heading: Option<&Heading>,
        just_point: Option<Endpoint>,
    ) {
        let Some(path) = self.paths.get(idx) else {
            return;
        };
        let pts = path.points();
        let (Some(first), Some(last)) = (pts.first(), pts.last()) else {
            return;
        };
        let travel_direct = self.boundary.is_none();

        let mut consider = |entry: usize, score: f64| {
            if best.is_none_or(|b| score < b.score) {
                *best = Some(BestLine {
                    path: idx,
                    entry,
                    score,
                });
            }
        };

        if path.is_closed() || pts.len() == 1 {
            let entry = path.nearest_vertex(prev).unwrap_or(0);
            consider(entry, self.travel_distance(prev, &pts[entry], travel_direct));
            return;
        }

        let weights = &self.settings;
        let angle =
            heading.map_or(0.0, |h| angle_score(&h.normal, first, last)) * weights.angle_weight;

        if just_point != Some(Endpoint::End) {
            let reversal = heading.map_or(0.0, |h| reversal_penalty(&h.dir, first, last));
            let score = self.travel_distance(prev, first, travel_direct)
                + angle
                + reversal * weights.reversal_weight;
            consider(0, score);
        }
        if just_point != Some(Endpoint::Start) {
            let reversal = heading.map_or(0.0, |h| reversal_penalty(&h.dir, last, first));
            let score = self.travel_distance(prev, last, travel_direct)
                + angle
                + reversal * weights.reversal_weight;
            consider(pts.len() - 1, score);
        }
    }

    /// Distance covered when traveling between two points.
    ///
    /// With `travel_direct`, or without a boundary, this is the straight
    /// distance; otherwise moves crossing the boundary are inflated by the
    /// detour factor.
    pub fn travel_distance(&self, p0: &Point, p1: &Point, travel_direct: bool) -> f64 {
        match self.boundary {
            Some(boundary) if !travel_direct => {
                obstacle_aware_distance(boundary, p0, p1, self.settings.detour_factor)
            }
            _ => dist(p0, p1),
        }
    }
}
