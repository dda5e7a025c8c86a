#![warn(missing_docs)]

//! Fixed-point 2D math for the vcad slicer.
//!
//! Toolpath geometry is stored in integer machine units (microns) so that
//! coordinates compare exactly and travel through the pipeline without
//! rounding drift. Lengths, angles and normalised directions are computed in
//! `f64`; orientation predicates are computed exactly in `i128`.

use nalgebra::Vector2;

/// A scalar coordinate in machine units (microns).
pub type Coord = i64;

/// A point in the fixed-point layer plane.
pub type Point = nalgebra::Point2<Coord>;

/// A displacement between two fixed-point positions.
pub type Vector = Vector2<Coord>;

/// A floating-point 2D vector, used for directions and scores.
pub type Vec2 = Vector2<f64>;

/// Machine units per millimetre.
pub const UNITS_PER_MM: f64 = 1000.0;

/// Convert millimetres to machine units, rounding to the nearest unit.
pub fn mm(value: f64) -> Coord {
    (value * UNITS_PER_MM).round() as Coord
}

/// Convert a fixed-point vector to `f64` components.
pub fn to_f64(v: &Vector) -> Vec2 {
    Vec2::new(v.x as f64, v.y as f64)
}

/// Squared length of a vector.
///
/// Computed in `f64`; `i64` products overflow for coordinates beyond a few
/// metres in micron units.
pub fn size2(v: &Vector) -> f64 {
    to_f64(v).norm_squared()
}

/// Length of a vector.
pub fn size(v: &Vector) -> f64 {
    to_f64(v).norm()
}

/// Squared distance between two points.
pub fn dist2(a: &Point, b: &Point) -> f64 {
    size2(&(b - a))
}

/// Distance between two points.
pub fn dist(a: &Point, b: &Point) -> f64 {
    size(&(b - a))
}

/// Dot product in `f64`.
pub fn dot(a: &Vector, b: &Vector) -> f64 {
    to_f64(a).dot(&to_f64(b))
}

/// Exact 2D cross product (z component of `a × b`).
pub fn cross(a: &Vector, b: &Vector) -> i128 {
    a.x as i128 * b.y as i128 - a.y as i128 * b.x as i128
}

/// Unit vector in the direction of `v`, or `None` for the zero vector.
pub fn normal(v: &Vector) -> Option<Vec2> {
    if v.x == 0 && v.y == 0 {
        return None;
    }
    Some(to_f64(v) / size(v))
}

/// Rotate a direction 90 degrees counter-clockwise.
pub fn turn90_ccw(v: &Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Orientation of an ordered point triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// `c` lies left of the directed line `a → b`.
    CounterClockwise,
    /// `c` lies right of the directed line `a → b`.
    Clockwise,
    /// The three points are collinear.
    Collinear,
}

/// Exact orientation of `c` relative to the directed line `a → b`.
pub fn orientation(a: &Point, b: &Point, c: &Point) -> Orientation {
    match cross(&(b - a), &(c - a)).signum() {
        1 => Orientation::CounterClockwise,
        -1 => Orientation::Clockwise,
        _ => Orientation::Collinear,
    }
}

/// Whether segment `a0–a1` properly crosses segment `b0–b1`.
///
/// Only transversal crossings count: touching at an endpoint or running
/// collinear along the other segment is not a crossing. A travel move that
/// starts on a contour vertex therefore does not register as crossing it.
pub fn segments_cross(a0: &Point, a1: &Point, b0: &Point, b1: &Point) -> bool {
    let o1 = orientation(a0, a1, b0);
    let o2 = orientation(a0, a1, b1);
    let o3 = orientation(b0, b1, a0);
    let o4 = orientation(b0, b1, a1);

    if [o1, o2, o3, o4].contains(&Orientation::Collinear) {
        return false;
    }
    o1 != o2 && o3 != o4
}

/// Whether `p` lies on segment `a–b`, excluding its endpoints.
pub fn strictly_between(a: &Point, b: &Point, p: &Point) -> bool {
    if orientation(a, b, p) != Orientation::Collinear || p == a || p == b {
        return false;
    }
    let ab = b - a;
    let ap = p - a;
    let along = ab.x as i128 * ap.x as i128 + ab.y as i128 * ap.y as i128;
    let len2 = ab.x as i128 * ab.x as i128 + ab.y as i128 * ab.y as i128;
    along > 0 && along < len2
}

/// Twice the signed area of a closed ring.
/// Positive for counter-clockwise, negative for clockwise.
pub fn signed_area2(points: &[Point]) -> i128 {
    let n = points.len();
    if n < 3 {
        return 0;
    }
    (0..n)
        .map(|i| {
            let p = &points[i];
            let q = &points[(i + 1) % n];
            p.x as i128 * q.y as i128 - q.x as i128 * p.y as i128
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mm_conversion() {
        assert_eq!(mm(1.0), 1000);
        assert_eq!(mm(0.4), 400);
        assert_eq!(mm(-2.5), -2500);
    }

    #[test]
    fn test_sizes() {
        let v = Vector::new(3000, 4000);
        assert_relative_eq!(size2(&v), 25_000_000.0);
        assert_relative_eq!(size(&v), 5000.0);
        assert_relative_eq!(dist(&Point::new(1, 1), &Point::new(4, 5)), 5.0);
    }

    #[test]
    fn test_size2_does_not_overflow() {
        let v = Vector::new(4_000_000_000, 4_000_000_000);
        assert!(size2(&v) > 3.0e19);
    }

    #[test]
    fn test_normal_and_turn() {
        let n = normal(&Vector::new(0, 250)).unwrap();
        assert_relative_eq!(n.x, 0.0);
        assert_relative_eq!(n.y, 1.0);

        let t = turn90_ccw(&Vec2::new(1.0, 0.0));
        assert_relative_eq!(t.x, 0.0);
        assert_relative_eq!(t.y, 1.0);

        assert!(normal(&Vector::zeros()).is_none());
    }

    #[test]
    fn test_orientation() {
        let a = Point::new(0, 0);
        let b = Point::new(10, 0);
        assert_eq!(orientation(&a, &b, &Point::new(5, 5)), Orientation::CounterClockwise);
        assert_eq!(orientation(&a, &b, &Point::new(5, -5)), Orientation::Clockwise);
        assert_eq!(orientation(&a, &b, &Point::new(20, 0)), Orientation::Collinear);
    }

    #[test]
    fn test_segments_cross() {
        let a0 = Point::new(0, 0);
        let a1 = Point::new(10, 10);
        assert!(segments_cross(&a0, &a1, &Point::new(0, 10), &Point::new(10, 0)));
        assert!(!segments_cross(&a0, &a1, &Point::new(20, 0), &Point::new(20, 10)));

        // Touching an endpoint is not a crossing
        assert!(!segments_cross(&a0, &a1, &Point::new(10, 10), &Point::new(20, 0)));
        // Collinear overlap is not a crossing
        assert!(!segments_cross(&a0, &a1, &Point::new(5, 5), &Point::new(15, 15)));
    }

    #[test]
    fn test_strictly_between() {
        let a = Point::new(0, 0);
        let b = Point::new(10, 10);
        assert!(strictly_between(&a, &b, &Point::new(5, 5)));
        assert!(!strictly_between(&a, &b, &a));
        assert!(!strictly_between(&a, &b, &b));
        assert!(!strictly_between(&a, &b, &Point::new(15, 15)));
        assert!(!strictly_between(&a, &b, &Point::new(-5, -5)));
        assert!(!strictly_between(&a, &b, &Point::new(5, 6)));
        // Degenerate segment contains nothing
        assert!(!strictly_between(&a, &a, &a));
    }

    #[test]
    fn test_signed_area() {
        let ccw = [
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(signed_area2(&ccw), 200);

        let mut cw = ccw;
        cw.reverse();
        assert_eq!(signed_area2(&cw), -200);

        assert_eq!(signed_area2(&ccw[..2]), 0);
    }
}
