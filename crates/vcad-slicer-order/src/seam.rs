//! Z-seam placement policy.
//!
//! A [`ZSeamConfig`] decides which vertex of a closed contour the print head
//! enters (and, because the loop closes, leaves) the contour at. It is a plain
//! value read by the shape optimizer, which switches on [`SeamKind`].

use serde::{Deserialize, Serialize};
use vcad_slicer_math::{cross, dist, dot, signed_area2, size, Point};

use crate::path::PathRef;

/// How the entry vertex of a contour is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeamKind {
    /// Vertex closest to the current head position.
    #[default]
    ShortestTravel,
    /// Vertex closest to [`ZSeamConfig::target`], regardless of head position.
    UserSpecified,
    /// Sharpest vertex matching the corner preference.
    CornerPreferring,
    /// Uniformly random vertex, drawn from a seeded generator.
    Random,
}

/// Which kind of corner a seam should be hidden in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CornerPreference {
    /// No corner bias.
    #[default]
    None,
    /// Sharp outward-pointing corners.
    FavorConvex,
    /// Sharp inward notches.
    FavorConcave,
    /// Any sharp corner.
    AnyCorner,
}

impl CornerPreference {
    /// How well a vertex matches this preference, in `[0, 1]`.
    pub fn score(&self, corner: &Corner) -> f64 {
        match self {
            CornerPreference::None => 0.0,
            CornerPreference::FavorConvex if corner.convex => corner.sharpness,
            CornerPreference::FavorConcave if !corner.convex => corner.sharpness,
            CornerPreference::FavorConvex | CornerPreference::FavorConcave => 0.0,
            CornerPreference::AnyCorner => corner.sharpness,
        }
    }
}

/// Seam placement settings for one ordering run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZSeamConfig {
    /// Placement strategy.
    pub kind: SeamKind,
    /// Position the seam gravitates to for [`SeamKind::UserSpecified`].
    pub target: Point,
    /// Corner bias applied on top of the strategy.
    pub corner_pref: CornerPreference,
}

impl Default for ZSeamConfig {
    fn default() -> Self {
        Self {
            kind: SeamKind::ShortestTravel,
            target: Point::origin(),
            corner_pref: CornerPreference::None,
        }
    }
}

impl ZSeamConfig {
    /// Create a seam config.
    pub fn new(kind: SeamKind, target: Point, corner_pref: CornerPreference) -> Self {
        Self {
            kind,
            target,
            corner_pref,
        }
    }

    /// Seam wherever the head arrives first.
    pub fn shortest() -> Self {
        Self::default()
    }

    /// Seam as close as possible to `target`.
    pub fn user_specified(target: Point) -> Self {
        Self::new(SeamKind::UserSpecified, target, CornerPreference::None)
    }

    /// Seam in the sharpest corner matching `corner_pref`.
    pub fn sharpest_corner(corner_pref: CornerPreference) -> Self {
        Self::new(SeamKind::CornerPreferring, Point::origin(), corner_pref)
    }

    /// Seam at a random vertex.
    pub fn random() -> Self {
        Self::new(SeamKind::Random, Point::origin(), CornerPreference::None)
    }

    /// Replace the corner preference.
    pub fn with_corner_preference(mut self, corner_pref: CornerPreference) -> Self {
        self.corner_pref = corner_pref;
        self
    }
}

/// Geometric character of a contour vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    /// 0 for a straight continuation, 1 for a needle-sharp corner.
    pub sharpness: f64,
    /// Whether the corner points out of the enclosed region.
    pub convex: bool,
}

impl Corner {
    /// A vertex with no corner at all.
    pub const FLAT: Corner = Corner {
        sharpness: 0.0,
        convex: true,
    };
}

/// Corner character of every vertex of a path.
///
/// Sharpness comes from the dot product of the two edges meeting at the
/// vertex; convexity from the turn direction relative to the contour winding.
/// Open paths and rings with fewer than three vertices have no corners.
pub fn corners(path: &PathRef<'_>) -> Vec<Corner> {
    let pts = path.points();
    let n = pts.len();
    if !path.is_closed() || n < 3 {
        return vec![Corner::FLAT; n];
    }

    let ccw = signed_area2(pts) >= 0;
    (0..n)
        .map(|i| {
            let prev = pts[(i + n - 1) % n];
            let v = pts[i];
            let next = pts[(i + 1) % n];

            let a = prev - v;
            let b = next - v;
            let (la, lb) = (size(&a), size(&b));
            if la == 0.0 || lb == 0.0 {
                return Corner::FLAT;
            }

            let cos = (dot(&a, &b) / (la * lb)).clamp(-1.0, 1.0);
            let turn = cross(&(v - prev), &(next - v));
            Corner {
                sharpness: (1.0 + cos) / 2.0,
                convex: if ccw { turn >= 0 } else { turn <= 0 },
            }
        })
        .collect()
}

/// Vertex nearest to `from`. Among vertices no more than `tolerance` farther
/// than the nearest one, the best corner match for `pref` wins, then the
/// nearer vertex, then the lower index.
pub fn nearest_vertex_with_preference(
    path: &PathRef<'_>,
    from: &Point,
    pref: CornerPreference,
    tolerance: f64,
) -> Option<usize> {
    let nearest = path.nearest_vertex(from)?;
    if pref == CornerPreference::None {
        return Some(nearest);
    }

    let pts = path.points();
    let corners = corners(path);
    let limit = dist(&pts[nearest], from) + tolerance.max(0.0);

    let mut best = nearest;
    let mut best_score = pref.score(&corners[nearest]);
    let mut best_dist = dist(&pts[nearest], from);
    for (idx, v) in pts.iter().enumerate() {
        let d = dist(v, from);
        if d > limit {
            continue;
        }
        let score = pref.score(&corners[idx]);
        if score > best_score || (score == best_score && d < best_dist) {
            best = idx;
            best_score = score;
            best_dist = d;
        }
    }
    Some(best)
}

/// Vertex best matching `pref` over the whole contour, ties broken by
/// distance to `from` and then by index.
///
/// Without a preference this is the nearest vertex.
pub fn sharpest_vertex(path: &PathRef<'_>, from: &Point, pref: CornerPreference) -> Option<usize> {
    if pref == CornerPreference::None {
        return path.nearest_vertex(from);
    }

    let corners = corners(path);
    let mut best: Option<(usize, f64, f64)> = None;
    for (idx, v) in path.points().iter().enumerate() {
        let score = pref.score(&corners[idx]);
        let d = dist(v, from);
        let better = match best {
            None => true,
            Some((_, s, bd)) => score > s || (score == s && d < bd),
        };
        if better {
            best = Some((idx, score, d));
        }
    }
    best.map(|(idx, _, _)| idx)
}
