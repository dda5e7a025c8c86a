//! Toolpath geometry and borrowed path views.
//!
//! The optimizers never own or copy geometry. Callers keep their
//! [`Polygon`]s and [`Polyline`]s alive and hand out [`PathRef`] views, whose
//! lifetime ties the optimizer to the storage it reads from.

use vcad_slicer_math::{dist2, signed_area2, size, Point};

/// A closed contour (implicitly loops back to its first vertex).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Polygon {
    /// Vertices of the polygon in order.
    pub points: Vec<Point>,
}

impl Polygon {
    /// Create a new polygon from points.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Check if the polygon is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Twice the signed area.
    /// Positive for counter-clockwise, negative for clockwise.
    pub fn signed_area2(&self) -> i128 {
        signed_area2(&self.points)
    }

    /// Is the polygon counter-clockwise?
    pub fn is_ccw(&self) -> bool {
        self.signed_area2() > 0
    }

    /// Reverse the winding order.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Perimeter length.
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| size(&(self.points[(i + 1) % n] - self.points[i])))
            .sum()
    }

    /// Borrow as a closed path.
    pub fn as_path(&self) -> PathRef<'_> {
        PathRef::closed(&self.points)
    }
}

/// An open polyline (non-closed path), e.g. a single infill line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Polyline {
    /// Points along the path.
    pub points: Vec<Point>,
}

impl Polyline {
    /// Create a new polyline.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// A two-point line segment.
    pub fn segment(from: Point, to: Point) -> Self {
        Self::new(vec![from, to])
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Total length of the polyline.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| size(&(w[1] - w[0]))).sum()
    }

    /// Borrow as an open path.
    pub fn as_path(&self) -> PathRef<'_> {
        PathRef::open(&self.points)
    }
}

/// A non-owning view of a path held in caller storage.
///
/// The referenced vertices must stay alive and unmodified for as long as any
/// optimizer holding the view exists; the borrow checker enforces this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathRef<'a> {
    points: &'a [Point],
    closed: bool,
}

impl<'a> PathRef<'a> {
    /// View of a closed contour.
    pub fn closed(points: &'a [Point]) -> Self {
        Self {
            points,
            closed: true,
        }
    }

    /// View of an open polyline.
    pub fn open(points: &'a [Point]) -> Self {
        Self {
            points,
            closed: false,
        }
    }

    /// The borrowed vertices.
    pub fn points(&self) -> &'a [Point] {
        self.points
    }

    /// Whether the path loops back to its first vertex.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the path has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Vertex at `idx`, if in range.
    pub fn get(&self, idx: usize) -> Option<&'a Point> {
        self.points.get(idx)
    }

    /// Index of the vertex nearest to `p`; the lowest index wins ties.
    pub fn nearest_vertex(&self, p: &Point) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, v) in self.points.iter().enumerate() {
            let d2 = dist2(v, p);
            if best.is_none_or(|(_, b)| d2 < b) {
                best = Some((idx, d2));
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Index of the vertex where the head leaves the path when entered at
    /// `entry`.
    ///
    /// Closed paths and single points are left where they were entered; open
    /// paths are left at the opposite end.
    pub fn exit_index(&self, entry: usize) -> usize {
        let n = self.points.len();
        if self.closed || n < 2 {
            entry
        } else if entry == 0 {
            n - 1
        } else {
            0
        }
    }

    /// Edges of the path as `(from, to)` pairs, including the closing edge
    /// of a closed path.
    pub fn segments(&self) -> impl Iterator<Item = (&'a Point, &'a Point)> + 'a {
        let points = self.points;
        let n = points.len();
        let count = match (self.closed, n) {
            (_, 0) | (_, 1) => 0,
            (true, 2) => 1,
            (true, _) => n,
            (false, _) => n - 1,
        };
        (0..count).map(move |i| (&points[i], &points[(i + 1) % n]))
    }
}

impl<'a> From<&'a Polygon> for PathRef<'a> {
    fn from(polygon: &'a Polygon) -> Self {
        polygon.as_path()
    }
}

impl<'a> From<&'a Polyline> for PathRef<'a> {
    fn from(polyline: &'a Polyline) -> Self {
        polyline.as_path()
    }
}
