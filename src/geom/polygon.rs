use glam::DAffine2;

use crate::defaults::GEOMETRY_EPSILON;
use crate::types::Point;

/// A closed ring. The last point always repeats the first.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    points: Vec<Point>,
}

/// Append the first point when the ring is open. Rings that are already
/// closed are returned untouched.
pub fn close_ring(mut points: Vec<Point>) -> Vec<Point> {
    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if points.len() > 1 && first.distance(last) > GEOMETRY_EPSILON {
            points.push(first);
        }
    }
    points
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points: close_ring(points),
        }
    }

    /// Ring points including the closing duplicate.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Distinct vertices (closing duplicate dropped).
    pub fn vertices(&self) -> &[Point] {
        match self.points.len() {
            0 | 1 => &self.points,
            n => &self.points[..n - 1],
        }
    }

    pub fn side_count(&self) -> usize {
        self.vertices().len()
    }

    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    pub fn perimeter(&self) -> f64 {
        self.edges().map(|(a, b)| a.distance(b)).sum()
    }

    /// Shoelace area; positive for counter-clockwise rings.
    pub fn signed_area(&self) -> f64 {
        signed_area(self.vertices())
    }

    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Area centroid, falling back to the vertex average for zero-area rings.
    pub fn centroid(&self) -> Point {
        let vertices = self.vertices();
        let area = signed_area(vertices);
        if area.abs() <= GEOMETRY_EPSILON {
            if vertices.is_empty() {
                return Point::ZERO;
            }
            return vertices.iter().copied().sum::<Point>() / vertices.len() as f64;
        }
        let mut acc = Point::ZERO;
        for (a, b) in self.edges() {
            acc += (a + b) * a.perp_dot(b);
        }
        acc / (6.0 * area)
    }

    pub fn map(&self, map: &DAffine2) -> Self {
        Self {
            points: self.points.iter().map(|p| map.transform_point2(*p)).collect(),
        }
    }

    pub fn atomic_values(&self) -> Vec<f64> {
        self.points.iter().flat_map(|p| [p.x, p.y]).collect()
    }
}

/// Shoelace formula over an open vertex list.
pub fn signed_area(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| vertices[i].perp_dot(vertices[(i + 1) % n]))
        .sum();
    twice * 0.5
}
