//! Obstacle boundaries for travel-cost estimation.

use vcad_slicer_math::{orientation, segments_cross, strictly_between, Orientation, Point};

use crate::path::{PathRef, Polygon};

/// Already-printed material that travel moves should avoid crossing.
///
/// The line optimizer only asks whether a straight move would cross the
/// boundary; finding a route around it is left to the travel planner.
pub trait TravelBoundary {
    /// Whether the straight move `from → to` crosses the boundary.
    fn crosses(&self, from: &Point, to: &Point) -> bool;
}

/// Whether a straight move crosses `path`.
///
/// A move crosses where it properly intersects an edge, or where the path
/// passes from one side of the move to the other through a vertex lying
/// strictly inside the move. Starting or ending on the path, grazing a
/// vertex and running along an edge are not crossings.
pub fn path_crosses(path: &PathRef<'_>, from: &Point, to: &Point) -> bool {
    path.segments()
        .any(|(a, b)| segments_cross(from, to, a, b))
        || crosses_at_vertex(path, from, to)
}

fn crosses_at_vertex(path: &PathRef<'_>, from: &Point, to: &Point) -> bool {
    let pts = path.points();
    let n = pts.len();
    let on_move = |idx: usize| strictly_between(from, to, &pts[idx]);

    let neighbor = |idx: usize, forward: bool| -> Option<usize> {
        match (path.is_closed(), forward) {
            (true, true) => Some((idx + 1) % n),
            (true, false) => Some((idx + n - 1) % n),
            (false, true) => (idx + 1 < n).then_some(idx + 1),
            (false, false) => idx.checked_sub(1),
        }
    };

    // Side of the first vertex off the move line, skipping vertices that run
    // along the move. `None` if the path touches a move endpoint or runs out.
    let side_beyond = |start: usize, forward: bool| -> Option<Orientation> {
        let mut idx = start;
        for _ in 1..n {
            idx = neighbor(idx, forward)?;
            match orientation(from, to, &pts[idx]) {
                Orientation::Collinear if on_move(idx) => continue,
                Orientation::Collinear => return None,
                side => return Some(side),
            }
        }
        None
    };

    (0..n).filter(|&idx| on_move(idx)).any(|idx| {
        matches!(
            (side_beyond(idx, false), side_beyond(idx, true)),
            (Some(before), Some(after)) if before != after
        )
    })
}

impl TravelBoundary for Polygon {
    fn crosses(&self, from: &Point, to: &Point) -> bool {
        path_crosses(&self.as_path(), from, to)
    }
}

impl TravelBoundary for [Polygon] {
    fn crosses(&self, from: &Point, to: &Point) -> bool {
        self.iter().any(|polygon| polygon.crosses(from, to))
    }
}

impl TravelBoundary for Vec<Polygon> {
    fn crosses(&self, from: &Point, to: &Point) -> bool {
        self.as_slice().crosses(from, to)
    }
}

impl TravelBoundary for [PathRef<'_>] {
    fn crosses(&self, from: &Point, to: &Point) -> bool {
        self.iter().any(|path| path_crosses(path, from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: i64, y: i64, size: i64) -> Polygon {
        Polygon::new(vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ])
    }

    #[test]
    fn test_crossing_through_square() {
        let sq = square(0, 0, 10_000);
        assert!(sq.crosses(&Point::new(-5_000, 5_000), &Point::new(5_000, 5_000)));
        assert!(sq.crosses(&Point::new(-5_000, 5_000), &Point::new(15_000, 5_000)));
    }

    #[test]
    fn test_move_inside_or_outside() {
        let sq = square(0, 0, 10_000);
        // Entirely inside
        assert!(!sq.crosses(&Point::new(1_000, 1_000), &Point::new(9_000, 9_000)));
        // Entirely outside
        assert!(!sq.crosses(&Point::new(-5_000, -5_000), &Point::new(-5_000, 15_000)));
        // Starting on a vertex and leaving outward
        assert!(!sq.crosses(&Point::new(0, 0), &Point::new(-5_000, -5_000)));
    }

    #[test]
    fn test_crossing_through_corners() {
        let sq = square(0, 0, 10_000);
        // Corner to corner, straight through the square
        assert!(sq.crosses(&Point::new(-5_000, -5_000), &Point::new(15_000, 15_000)));
        // From inside, leaving through a corner
        assert!(sq.crosses(&Point::new(5_000, 5_000), &Point::new(15_000, 15_000)));
        // From outside, entering through a corner
        assert!(sq.crosses(&Point::new(-5_000, 15_000), &Point::new(5_000, 5_000)));
    }

    #[test]
    fn test_vertex_contact_without_crossing() {
        let sq = square(0, 0, 10_000);
        // Grazes the corner from outside
        assert!(!sq.crosses(&Point::new(-5_000, 5_000), &Point::new(5_000, -5_000)));
        // Runs along the bottom edge and past both corners
        assert!(!sq.crosses(&Point::new(-5_000, 0), &Point::new(15_000, 0)));
        // Ends exactly on a corner
        assert!(!sq.crosses(&Point::new(-5_000, -5_000), &Point::new(0, 0)));
    }

    #[test]
    fn test_crossing_open_path_at_vertex() {
        let wall = [Point::new(0, -1_000), Point::new(0, 0), Point::new(0, 1_000)];
        let path = PathRef::open(&wall);
        assert!(path_crosses(&path, &Point::new(-500, 0), &Point::new(500, 0)));

        let bend = [Point::new(-1_000, 1_000), Point::new(0, 0), Point::new(1_000, 1_000)];
        let path = PathRef::open(&bend);
        assert!(!path_crosses(&path, &Point::new(-500, 0), &Point::new(500, 0)));
    }

    #[test]
    fn test_boundary_set() {
        let boundary = vec![square(0, 0, 1_000), square(5_000, 0, 1_000)];
        assert!(boundary.crosses(&Point::new(4_000, 500), &Point::new(5_500, 500)));
        assert!(!boundary.crosses(&Point::new(2_000, 500), &Point::new(4_000, 500)));

        let empty: Vec<Polygon> = Vec::new();
        assert!(!empty.crosses(&Point::new(0, 0), &Point::new(10, 10)));
    }
}
