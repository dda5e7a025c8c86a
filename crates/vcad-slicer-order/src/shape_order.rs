//! Ordering of closed contours and Z-seam selection.
//!
//! Uses a nearest-neighbor heuristic: from the current head position, the
//! contour whose seam candidate is closest is printed next, and the head ends
//! where it entered because the loop closes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use vcad_slicer_math::{dist2, Coord, Point};

use crate::error::{OrderError, Result};
use crate::order::{OptimizerState, PathOrder};
use crate::path::{PathRef, Polygon};
use crate::seam::{nearest_vertex_with_preference, sharpest_vertex, SeamKind, ZSeamConfig};

/// Settings for contour ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeOrderSettings {
    /// Vertices at most this much farther than the nearest one count as
    /// tied, letting the corner preference decide (machine units).
    pub seam_tie_tolerance: Coord,
    /// Seed for [`SeamKind::Random`].
    pub seed: u64,
}

impl Default for ShapeOrderSettings {
    fn default() -> Self {
        Self {
            seam_tie_tolerance: 500,
            seed: 0,
        }
    }
}

impl ShapeOrderSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if self.seam_tie_tolerance < 0 {
            return Err(OrderError::InvalidSettings(
                "seam_tie_tolerance must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// Orders closed contours and picks each one's seam vertex.
///
/// Created per layer (or per island), filled with [`add_shape`], run once
/// with [`optimize`], then read and discarded.
///
/// [`add_shape`]: ShapeOrderOptimizer::add_shape
/// [`optimize`]: ShapeOrderOptimizer::optimize
#[derive(Debug)]
pub struct ShapeOrderOptimizer<'a> {
    start: Point,
    config: &'a ZSeamConfig,
    settings: ShapeOrderSettings,
    paths: Vec<PathRef<'a>>,
    result: PathOrder,
    state: OptimizerState,
}

impl<'a> ShapeOrderOptimizer<'a> {
    /// Create an optimizer starting from the head position `start`.
    pub fn new(start: Point, config: &'a ZSeamConfig) -> Self {
        Self {
            start,
            config,
            settings: ShapeOrderSettings::default(),
            paths: Vec::new(),
            result: PathOrder::default(),
            state: OptimizerState::Accumulating,
        }
    }

    /// Create an optimizer with explicit settings, rejecting invalid ones.
    pub fn with_settings(
        start: Point,
        config: &'a ZSeamConfig,
        settings: ShapeOrderSettings,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            ..Self::new(start, config)
        })
    }

    /// Add a path. Fails once [`optimize`](Self::optimize) has run.
    pub fn add_shape(&mut self, path: PathRef<'a>) -> Result<()> {
        if self.state == OptimizerState::Optimized {
            return Err(OrderError::AlreadyOptimized);
        }
        self.paths.push(path);
        Ok(())
    }

    /// Add a closed polygon.
    pub fn add_polygon(&mut self, polygon: &'a Polygon) -> Result<()> {
        self.add_shape(polygon.as_path())
    }

    /// Add every polygon in `polygons`, in order.
    pub fn add_polygons(&mut self, polygons: &'a [Polygon]) -> Result<()> {
        polygons.iter().try_for_each(|p| self.add_polygon(p))
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

    /// Compute the visiting order and seam vertices.
    ///
    /// Paths without vertices are appended after every other path with no
    /// entry vertex, so the order always covers every added path. Running
    /// again reproduces the same result.
    pub fn optimize(&mut self) -> &PathOrder {
        let n = self.paths.len();
        let mut result = PathOrder::with_capacity(n);
        let fixed = self.fixed_entries();
        let mut picked = vec![false; n];
        let mut prev = self.start;

        loop {
            let mut best: Option<(usize, usize, f64)> = None;
            for (idx, path) in self.paths.iter().enumerate() {
                if picked[idx] || path.is_empty() {
                    continue;
                }
                let entry = match &fixed {
                    Some(entries) => entries[idx],
                    None => self.closest_entry(path, &prev),
                };
                let Some(entry) = entry else { continue };

                let d2 = dist2(&path.points()[entry], &prev);
                if best.is_none_or(|(_, _, b)| d2 < b) {
                    best = Some((idx, entry, d2));
                }
            }

            let Some((idx, entry, d2)) = best else { break };
            log::trace!("contour {idx}: seam vertex {entry}, travel² {d2:.0}");
            picked[idx] = true;
            prev = self.paths[idx].points()[entry];
            result.push(idx, Some(entry));
        }

        for (idx, _) in self.paths.iter().enumerate().filter(|(_, p)| p.is_empty()) {
            result.push(idx, None);
        }

        log::debug!(
            "ordered {} contours ({:?} seam) from ({}, {})",
            n,
            self.config.kind,
            self.start.x,
            self.start.y
        );

        self.result = result;
        self.state = OptimizerState::Optimized;
        &self.result
    }

    /// Seam vertex of `path` when approached from `prev`, for the
    /// position-dependent policies.
    fn closest_entry(&self, path: &PathRef<'_>, prev: &Point) -> Option<usize> {
        let pref = self.config.corner_pref;
        match self.config.kind {
            SeamKind::CornerPreferring => sharpest_vertex(path, prev, pref),
            _ => nearest_vertex_with_preference(
                path,
                prev,
                pref,
                self.settings.seam_tie_tolerance as f64,
            ),
        }
    }

    /// Seam vertices that do not depend on visit order, computed once.
    fn fixed_entries(&self) -> Option<Vec<Option<usize>>> {
        match self.config.kind {
            SeamKind::UserSpecified => Some(
                self.paths
                    .iter()
                    .map(|path| {
                        nearest_vertex_with_preference(
                            path,
                            &self.config.target,
                            self.config.corner_pref,
                            0.0,
                        )
                    })
                    .collect(),
            ),
            SeamKind::Random => {
                let mut rng = StdRng::seed_from_u64(self.settings.seed);
                Some(
                    self.paths
                        .iter()
                        .map(|path| (!path.is_empty()).then(|| rng.gen_range(0..path.len())))
                        .collect(),
                )
            }
            SeamKind::ShortestTravel | SeamKind::CornerPreferring => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seam::CornerPreference;

    fn square_at(cx: i64, cy: i64, half: i64) -> Polygon {
        Polygon::new(vec![
            Point::new(cx - half, cy - half),
            Point::new(cx + half, cy - half),
            Point::new(cx + half, cy + half),
            Point::new(cx - half, cy + half),
        ])
    }

    #[test]
    fn test_three_squares_in_a_row() {
        let squares = vec![
            square_at(0, 0, 500),
            square_at(10_000, 0, 500),
            square_at(20_000, 0, 500),
        ];
        let config = ZSeamConfig::default();
        let mut opt = ShapeOrderOptimizer::new(Point::new(-5_000, 0), &config);
        opt.add_polygons(&squares).unwrap();

        let result = opt.optimize();
        assert_eq!(result.order(), vec![0, 1, 2]);
        // Entered from the left each time
        assert_eq!(result.entry_index(0), Some(0));
        assert_eq!(result.entry_index(1), Some(0));
    }

    #[test]
    fn test_order_follows_proximity_not_insertion() {
        let squares = vec![
            square_at(20_000, 0, 500),
            square_at(0, 0, 500),
            square_at(10_000, 0, 500),
        ];
        let config = ZSeamConfig::default();
        let mut opt = ShapeOrderOptimizer::new(Point::new(-5_000, 0), &config);
        opt.add_polygons(&squares).unwrap();
        assert_eq!(opt.optimize().order(), vec![1, 2, 0]);
    }

    #[test]
    fn test_empty_input() {
        let config = ZSeamConfig::default();
        let mut opt = ShapeOrderOptimizer::new(Point::origin(), &config);
        assert!(opt.is_empty());
        assert!(opt.optimize().is_empty());
        assert_eq!(opt.state(), OptimizerState::Optimized);
    }

    #[test]
    fn test_zero_vertex_shapes_go_last() {
        let empty = Polygon::default();
        let sq = square_at(1_000, 0, 100);
        let config = ZSeamConfig::default();
        let mut opt = ShapeOrderOptimizer::new(Point::origin(), &config);
        opt.add_polygon(&empty).unwrap();
        opt.add_polygon(&sq).unwrap();

        let result = opt.optimize();
        assert_eq!(result.order(), vec![1, 0]);
        assert_eq!(result.entry_index(0), None);
        assert!(result.entry_index(1).is_some());
    }

    #[test]
    fn test_add_after_optimize_fails() {
        let sq = square_at(0, 0, 100);
        let config = ZSeamConfig::default();
        let mut opt = ShapeOrderOptimizer::new(Point::origin(), &config);
        opt.optimize();
        assert_eq!(opt.add_polygon(&sq), Err(OrderError::AlreadyOptimized));
    }

    #[test]
    fn test_rerun_is_deterministic() {
        let squares: Vec<_> = (0..8)
            .map(|i| square_at((i * 7_919) % 31_000, (i * 3_301) % 17_000, 400))
            .collect();
        let config = ZSeamConfig::default();
        let mut opt = ShapeOrderOptimizer::new(Point::origin(), &config);
        opt.add_polygons(&squares).unwrap();
        let first = opt.optimize().clone();
        let second = opt.optimize().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_user_specified_seam() {
        let squares = vec![square_at(0, 0, 500), square_at(10_000, 0, 500)];
        // Top-right corner of the first square
        let config = ZSeamConfig::user_specified(Point::new(500, 500));
        let mut opt = ShapeOrderOptimizer::new(Point::new(-5_000, 0), &config);
        opt.add_polygons(&squares).unwrap();

        let result = opt.optimize();
        assert_eq!(result.entry_index(0), Some(2));
        // Nearest vertex of the second square to the target: its top-left
        assert_eq!(result.entry_index(1), Some(3));
    }

    #[test]
    fn test_favor_convex_seam() {
        // Arrowhead: sharp convex tip (0) and concave notch (2)
        let dart = Polygon::new(vec![
            Point::new(0, 200_000),
            Point::new(-30_000, -50_000),
            Point::new(0, 0),
            Point::new(30_000, -50_000),
        ]);
        let start = Point::new(60_000, 100_000);

        let convex = ZSeamConfig::shortest().with_corner_preference(CornerPreference::FavorConvex);
        let mut opt = ShapeOrderOptimizer::new(start, &convex);
        opt.add_polygon(&dart).unwrap();
        assert_eq!(opt.optimize().entry_index(0), Some(0));

        let concave = ZSeamConfig::shortest().with_corner_preference(CornerPreference::FavorConcave);
        let mut opt = ShapeOrderOptimizer::new(start, &concave);
        opt.add_polygon(&dart).unwrap();
        assert_eq!(opt.optimize().entry_index(0), Some(2));
    }

    #[test]
    fn test_random_seam_is_seeded() {
        let squares: Vec<_> = (0..6).map(|i| square_at(i * 5_000, 0, 500)).collect();
        let config = ZSeamConfig::random();
        let settings = ShapeOrderSettings {
            seed: 42,
            ..Default::default()
        };

        let run = || {
            let mut opt =
                ShapeOrderOptimizer::with_settings(Point::origin(), &config, settings).unwrap();
            opt.add_polygons(&squares).unwrap();
            opt.optimize().clone()
        };
        let a = run();
        let b = run();
        assert_eq!(a, b);
        for step in a.steps() {
            assert!(step.entry.unwrap() < 4);
        }
    }

    #[test]
    fn test_invalid_settings() {
        let settings = ShapeOrderSettings {
            seam_tie_tolerance: -1,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
        assert!(ShapeOrderSettings::default().validate().is_ok());

        let config = ZSeamConfig::default();
        let rejected = ShapeOrderOptimizer::with_settings(Point::origin(), &config, settings);
        assert!(matches!(rejected, Err(OrderError::InvalidSettings(_))));
    }

    /// Arrowhead: sharp convex tip (0), convex base corners (1, 3) and a
    /// concave notch (2).
    fn dart() -> Polygon {
        Polygon::new(vec![
            Point::new(0, 200_000),
            Point::new(-30_000, -50_000),
            Point::new(0, 0),
            Point::new(30_000, -50_000),
        ])
    }

    #[test]
    fn test_sharpest_corner_ignores_distance() {
        let dart = dart();
        // Right next to the notch, far from the tip
        let start = Point::new(0, -1_000);

        let convex = ZSeamConfig::sharpest_corner(CornerPreference::FavorConvex);
        let mut opt = ShapeOrderOptimizer::new(start, &convex);
        opt.add_polygon(&dart).unwrap();
        assert_eq!(opt.optimize().entry_index(0), Some(0));

        let any = ZSeamConfig::sharpest_corner(CornerPreference::AnyCorner);
        let mut opt = ShapeOrderOptimizer::new(start, &any);
        opt.add_polygon(&dart).unwrap();
        assert_eq!(opt.optimize().entry_index(0), Some(0));

        // Without a preference it is the nearest vertex
        let plain = ZSeamConfig::sharpest_corner(CornerPreference::None);
        let mut opt = ShapeOrderOptimizer::new(start, &plain);
        opt.add_polygon(&dart).unwrap();
        assert_eq!(opt.optimize().entry_index(0), Some(2));
    }

    #[test]
    fn test_sharpest_concave_corner() {
        let dart = dart();
        // Far above the tip
        let concave = ZSeamConfig::sharpest_corner(CornerPreference::FavorConcave);
        let mut opt = ShapeOrderOptimizer::new(Point::new(0, 300_000), &concave);
        opt.add_polygon(&dart).unwrap();
        assert_eq!(opt.optimize().entry_index(0), Some(2));
    }

    #[test]
    fn test_any_corner_breaks_near_tie() {
        let dart = dart();
        // Equidistant from the tip and the notch; the tip is sharper
        let seam = ZSeamConfig::shortest().with_corner_preference(CornerPreference::AnyCorner);
        let mut opt = ShapeOrderOptimizer::new(Point::new(60_000, 100_000), &seam);
        opt.add_polygon(&dart).unwrap();
        assert_eq!(opt.optimize().entry_index(0), Some(0));
    }
}
