//! Bowyer–Watson Delaunay triangulation.

use crate::defaults::{DELAUNAY_EPSILON, GEOMETRY_EPSILON};
use crate::types::Point;

/// Circle through three points, or `None` when they are collinear.
pub fn circumcircle(a: Point, b: Point, c: Point) -> Option<(Point, f64)> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < GEOMETRY_EPSILON {
        return None;
    }
    let (a2, b2, c2) = (a.length_squared(), b.length_squared(), c.length_squared());
    let center = Point::new(
        (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
        (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
    );
    Some((center, center.distance(a)))
}

#[derive(Clone, Copy, Debug)]
struct Triangle {
    v: [usize; 3],
    center: Point,
    radius: f64,
}

impl Triangle {
    fn new(v: [usize; 3], pts: &[Point]) -> Option<Self> {
        let (center, radius) = circumcircle(pts[v[0]], pts[v[1]], pts[v[2]])?;
        Some(Self { v, center, radius })
    }

    /// Boundary points count as inside.
    fn circle_contains(&self, p: Point) -> bool {
        p.distance(self.center) <= self.radius + DELAUNAY_EPSILON
    }

    fn edges(&self) -> [(usize, usize); 3] {
        [(self.v[0], self.v[1]), (self.v[1], self.v[2]), (self.v[2], self.v[0])]
    }
}

fn same_edge(e: (usize, usize), f: (usize, usize)) -> bool {
    (e.0 == f.0 && e.1 == f.1) || (e.0 == f.1 && e.1 == f.0)
}

/// Triangulate `points`. Triangles are index triples into `points`, wound
/// counter-clockwise. Duplicate points are ignored.
pub fn triangulate(points: &[Point]) -> Vec<[usize; 3]> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }

    let (min, max) = points
        .iter()
        .fold((points[0], points[0]), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
    let span = (max - min).max_element().max(1.0);
    let mid = (min + max) * 0.5;

    // super-triangle vertices live after the input points
    let mut pts: Vec<Point> = points.to_vec();
    pts.push(mid + Point::new(-20.0 * span, -span));
    pts.push(mid + Point::new(0.0, 20.0 * span));
    pts.push(mid + Point::new(20.0 * span, -span));

    let mut triangles: Vec<Triangle> = Triangle::new([n, n + 1, n + 2], &pts).into_iter().collect();

    for (i, p) in points.iter().enumerate() {
        if points[..i].iter().any(|q| q.distance(*p) <= GEOMETRY_EPSILON) {
            continue;
        }

        let (bad, good): (Vec<Triangle>, Vec<Triangle>) =
            triangles.into_iter().partition(|t| t.circle_contains(*p));
        triangles = good;

        let mut boundary: Vec<(usize, usize)> = Vec::new();
        for (k, t) in bad.iter().enumerate() {
            for e in t.edges() {
                let shared = bad
                    .iter()
                    .enumerate()
                    .any(|(j, other)| j != k && other.edges().iter().any(|f| same_edge(e, *f)));
                if !shared {
                    boundary.push(e);
                }
            }
        }

        for (a, b) in boundary {
            let area = (pts[b] - pts[a]).perp_dot(pts[i] - pts[a]);
            if area.abs() <= GEOMETRY_EPSILON {
                continue;
            }
            let v = if area > 0.0 { [a, b, i] } else { [b, a, i] };
            triangles.extend(Triangle::new(v, &pts));
        }
    }

    triangles
        .into_iter()
        .filter(|t| t.v.iter().all(|v| *v < n))
        .map(|t| t.v)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    fn area(points: &[Point], t: [usize; 3]) -> f64 {
        0.5 * (points[t[1]] - points[t[0]]).perp_dot(points[t[2]] - points[t[0]])
    }

    #[test]
    fn circumcircle_of_right_triangle() {
        let (center, radius) = circumcircle(dvec2(0.0, 0.0), dvec2(2.0, 0.0), dvec2(0.0, 2.0)).unwrap();
        assert!((center - dvec2(1.0, 1.0)).length() < 1e-12);
        assert!((radius - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn collinear_points_have_no_circumcircle() {
        assert!(circumcircle(dvec2(0.0, 0.0), dvec2(1.0, 1.0), dvec2(2.0, 2.0)).is_none());
    }

    #[test]
    fn single_triangle() {
        let points = [dvec2(0.0, 0.0), dvec2(1.0, 0.0), dvec2(0.0, 1.0)];
        let tris = triangulate(&points);
        assert_eq!(tris.len(), 1);
        assert!(area(&points, tris[0]) > 0.0);
    }

    #[test]
    fn grid_is_empty_circle() {
        let points: Vec<Point> = (0..4)
            .flat_map(|x| (0..3).map(move |y| dvec2(x as f64 + 0.1 * y as f64, y as f64 * 1.3)))
            .collect();
        let tris = triangulate(&points);
        assert!(!tris.is_empty());
        for t in &tris {
            let (center, radius) = circumcircle(points[t[0]], points[t[1]], points[t[2]]).unwrap();
            for (i, p) in points.iter().enumerate() {
                if t.contains(&i) {
                    continue;
                }
                assert!(p.distance(center) >= radius - 1e-7, "point {i} inside {t:?}");
            }
        }
    }

    #[test]
    fn too_few_points() {
        assert!(triangulate(&[dvec2(0.0, 0.0), dvec2(1.0, 0.0)]).is_empty());
    }
}
