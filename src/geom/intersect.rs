//! Pairwise intersection of primitives.
//!
//! Every primitive is broken into pieces (segments, arcs, lone points) and
//! the pieces are intersected pairwise. Results keep the order in which the
//! pieces of the first shape are visited, with near-duplicates (shared
//! polygon vertices) merged.

use super::{Arc, LineSegment, Primitive};
use crate::defaults::GEOMETRY_EPSILON;
use crate::errors::GeometryError;
use crate::types::{Degrees, Point};

const MERGE_DISTANCE: f64 = 1e-7;

#[derive(Clone, Copy, Debug)]
enum Piece {
    Point(Point),
    Segment { a: Point, b: Point, infinite: bool },
    Arc(Arc),
}

fn pieces(shape: &Primitive, out: &mut Vec<Piece>) {
    match shape {
        Primitive::Point(p) => out.push(Piece::Point(*p)),
        Primitive::Line(line) => out.push(Piece::Segment {
            a: line.start,
            b: line.end,
            infinite: line.extended,
        }),
        Primitive::Arc(arc) => out.push(Piece::Arc(*arc)),
        Primitive::Polygon(poly) => out.extend(poly.edges().map(|(a, b)| Piece::Segment {
            a,
            b,
            infinite: false,
        })),
        Primitive::Spline(spline) => out.extend(spline.points.windows(2).map(|w| Piece::Segment {
            a: w[0],
            b: w[1],
            infinite: false,
        })),
        Primitive::PointPairSet(set) => out.extend(set.pairs.iter().map(|(a, b)| Piece::Segment {
            a: *a,
            b: *b,
            infinite: false,
        })),
        Primitive::Group(group) => {
            for member in group.members() {
                pieces(member, out);
            }
        }
    }
}

/// All intersection points between two shapes.
pub fn intersect(first: &Primitive, second: &Primitive) -> Vec<Point> {
    let mut lhs = Vec::new();
    let mut rhs = Vec::new();
    pieces(first, &mut lhs);
    pieces(second, &mut rhs);

    let mut found: Vec<Point> = Vec::new();
    for a in &lhs {
        for b in &rhs {
            for p in piece_intersections(a, b) {
                if !found.iter().any(|q| q.distance(p) <= MERGE_DISTANCE) {
                    found.push(p);
                }
            }
        }
    }
    found
}

fn piece_intersections(a: &Piece, b: &Piece) -> Vec<Point> {
    match (a, b) {
        (Piece::Point(p), other) | (other, Piece::Point(p)) => {
            if on_piece(*p, other) {
                vec![*p]
            } else {
                Vec::new()
            }
        }
        (
            Piece::Segment { a: a1, b: a2, infinite: ia },
            Piece::Segment { a: b1, b: b2, infinite: ib },
        ) => segment_segment(*a1, *a2, *ia, *b1, *b2, *ib).into_iter().collect(),
        (Piece::Segment { a: p1, b: p2, infinite }, Piece::Arc(arc))
        | (Piece::Arc(arc), Piece::Segment { a: p1, b: p2, infinite }) => {
            segment_arc(*p1, *p2, *infinite, arc)
        }
        (Piece::Arc(a), Piece::Arc(b)) => arc_arc(a, b),
    }
}

fn on_piece(p: Point, piece: &Piece) -> bool {
    match piece {
        Piece::Point(q) => p.distance(*q) <= MERGE_DISTANCE,
        Piece::Segment { a, b, infinite } => {
            let d = *b - *a;
            let len_sq = d.length_squared();
            if len_sq <= GEOMETRY_EPSILON {
                return p.distance(*a) <= MERGE_DISTANCE;
            }
            let t = (p - *a).dot(d) / len_sq;
            let t = if *infinite { t } else { t.clamp(0.0, 1.0) };
            p.distance(*a + d * t) <= MERGE_DISTANCE
        }
        Piece::Arc(arc) => {
            (p.distance(arc.center) - arc.radius).abs() <= MERGE_DISTANCE
                && arc.contains_angle(angle_of(arc.center, p))
        }
    }
}

fn angle_of(center: Point, p: Point) -> Degrees {
    let d = p - center;
    Degrees::from_radians(d.y.atan2(d.x))
}

fn within_unit(t: f64, infinite: bool) -> bool {
    infinite || (-1e-9..=1.0 + 1e-9).contains(&t)
}

fn segment_segment(a1: Point, a2: Point, ia: bool, b1: Point, b2: Point, ib: bool) -> Option<Point> {
    let da = a2 - a1;
    let db = b2 - b1;
    let denom = da.perp_dot(db);
    if denom.abs() <= GEOMETRY_EPSILON {
        return None;
    }
    let offset = b1 - a1;
    let t = offset.perp_dot(db) / denom;
    let u = offset.perp_dot(da) / denom;
    (within_unit(t, ia) && within_unit(u, ib)).then(|| a1 + da * t)
}

fn segment_arc(p1: Point, p2: Point, infinite: bool, arc: &Arc) -> Vec<Point> {
    let d = p2 - p1;
    let f = p1 - arc.center;
    let a = d.length_squared();
    if a <= GEOMETRY_EPSILON {
        return Vec::new();
    }
    let b = 2.0 * f.dot(d);
    let c = f.length_squared() - arc.radius * arc.radius;
    let disc = b * b - 4.0 * a * c;
    if disc < -GEOMETRY_EPSILON {
        return Vec::new();
    }
    let root = disc.max(0.0).sqrt();
    let mut ts = vec![(-b - root) / (2.0 * a)];
    if root > 0.0 {
        ts.push((-b + root) / (2.0 * a));
    }
    ts.into_iter()
        .filter(|t| within_unit(*t, infinite))
        .map(|t| p1 + d * t)
        .filter(|p| arc.contains_angle(angle_of(arc.center, *p)))
        .collect()
}

fn arc_arc(a: &Arc, b: &Arc) -> Vec<Point> {
    let delta = b.center - a.center;
    let dist = delta.length();
    if dist <= GEOMETRY_EPSILON
        || dist > a.radius + b.radius + GEOMETRY_EPSILON
        || dist < (a.radius - b.radius).abs() - GEOMETRY_EPSILON
    {
        return Vec::new();
    }
    let along = (a.radius * a.radius - b.radius * b.radius + dist * dist) / (2.0 * dist);
    let h = (a.radius * a.radius - along * along).max(0.0).sqrt();
    let base = a.center + delta * (along / dist);
    let perp = delta.perp() * (h / dist);
    let mut candidates = vec![base + perp];
    if h > 0.0 {
        candidates.push(base - perp);
    }
    candidates
        .into_iter()
        .filter(|p| a.contains_angle(angle_of(a.center, *p)) && b.contains_angle(angle_of(b.center, *p)))
        .collect()
}

/// Intersection of the infinite lines through two segments.
pub fn line_line(first: &LineSegment, second: &LineSegment) -> Result<Point, GeometryError> {
    if first.length() <= GEOMETRY_EPSILON || second.length() <= GEOMETRY_EPSILON {
        return Err(GeometryError::ZeroLengthLine);
    }
    segment_segment(first.start, first.end, true, second.start, second.end, true)
        .ok_or(GeometryError::ParallelLines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Polygon;
    use glam::dvec2;

    fn line(a: Point, b: Point) -> Primitive {
        Primitive::Line(LineSegment::new(a, b))
    }

    #[test]
    fn crossing_segments() {
        let pts = intersect(
            &line(dvec2(0.0, 0.0), dvec2(2.0, 2.0)),
            &line(dvec2(0.0, 2.0), dvec2(2.0, 0.0)),
        );
        assert_eq!(pts, vec![dvec2(1.0, 1.0)]);
    }

    #[test]
    fn short_segments_miss_unless_extended() {
        let a = LineSegment::new(dvec2(0.0, 0.0), dvec2(1.0, 0.0));
        let b = LineSegment::new(dvec2(3.0, -1.0), dvec2(3.0, 1.0));
        assert!(intersect(&a.into(), &b.into()).is_empty());
        let pts = intersect(&a.extended(true).into(), &b.into());
        assert_eq!(pts, vec![dvec2(3.0, 0.0)]);
    }

    #[test]
    fn line_through_circle_hits_twice() {
        let circle = Primitive::Arc(Arc::circle(dvec2(0.0, 0.0), 1.0));
        let pts = intersect(&line(dvec2(-2.0, 0.0), dvec2(2.0, 0.0)), &circle);
        assert_eq!(pts.len(), 2);
        assert!((pts[0] - dvec2(-1.0, 0.0)).length() < 1e-9);
        assert!((pts[1] - dvec2(1.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn half_arc_filters_hits() {
        let upper = Primitive::Arc(Arc::new(dvec2(0.0, 0.0), 1.0, Degrees(0.0), Degrees(180.0)));
        let pts = intersect(&line(dvec2(0.0, -2.0), dvec2(0.0, 2.0)), &upper);
        assert_eq!(pts.len(), 1);
        assert!((pts[0] - dvec2(0.0, 1.0)).length() < 1e-9);
    }

    #[test]
    fn two_circles() {
        let a = Primitive::Arc(Arc::circle(dvec2(0.0, 0.0), 1.0));
        let b = Primitive::Arc(Arc::circle(dvec2(1.0, 0.0), 1.0));
        let pts = intersect(&a, &b);
        assert_eq!(pts.len(), 2);
        for p in pts {
            assert!((p.x - 0.5).abs() < 1e-9);
            assert!((p.y.abs() - 0.75f64.sqrt()).abs() < 1e-9);
        }
    }

    #[test]
    fn polygon_corner_is_reported_once() {
        let square = Primitive::Polygon(Polygon::new(vec![
            dvec2(0.0, 0.0),
            dvec2(2.0, 0.0),
            dvec2(2.0, 2.0),
            dvec2(0.0, 2.0),
        ]));
        let pts = intersect(&square, &line(dvec2(-1.0, -1.0), dvec2(3.0, 3.0)));
        assert_eq!(pts.len(), 2);
    }

    #[test]
    fn parallel_lines_are_degenerate() {
        let a = LineSegment::new(dvec2(0.0, 0.0), dvec2(1.0, 0.0));
        let b = LineSegment::new(dvec2(0.0, 1.0), dvec2(1.0, 1.0));
        assert_eq!(line_line(&a, &b), Err(GeometryError::ParallelLines));
    }
}
