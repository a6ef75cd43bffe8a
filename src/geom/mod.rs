//! Geometric primitives and the algorithms built on them.
//!
//! Every primitive kind knows how to:
//! - Flatten itself into an atomic value vector
//! - Apply the five transforms (translate, rotate, reflect, dilate, project)
//! - Intersect with any other primitive
//! - Turn itself into a point list for clipping

use std::fmt;

use glam::DAffine2;

use crate::defaults::ARC_STEP_DEGREES;
use crate::errors::GeometryError;
use crate::types::{Degrees, Point, Ratio};

pub mod affine;
mod arc;
pub mod clip;
pub mod delaunay;
mod group;
pub mod intersect;
mod line;
mod pair_set;
mod polygon;
pub mod simplify;
mod spline;

pub use arc::Arc;
pub use group::{Group, PrimitiveArena, PrimitiveId};
pub use line::LineSegment;
pub use pair_set::PointPairSet;
pub use polygon::{Polygon, close_ring, signed_area};
pub use spline::{Spline, partial_polyline, polynomial, sample_parametric};

/// Stable tag for a primitive's variant, used to pick transform handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShapeKind {
    Point,
    Line,
    Arc,
    Polygon,
    Spline,
    PointPairSet,
    Group,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 7] = [
        ShapeKind::Point,
        ShapeKind::Line,
        ShapeKind::Arc,
        ShapeKind::Polygon,
        ShapeKind::Spline,
        ShapeKind::PointPairSet,
        ShapeKind::Group,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Point => "point",
            ShapeKind::Line => "line",
            ShapeKind::Arc => "arc",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Spline => "spline",
            ShapeKind::PointPairSet => "point pair set",
            ShapeKind::Group => "group",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Any drawable, transformable shape.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Point(Point),
    Line(LineSegment),
    Arc(Arc),
    Polygon(Polygon),
    Spline(Spline),
    PointPairSet(PointPairSet),
    Group(Group),
}

impl Primitive {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Primitive::Point(_) => ShapeKind::Point,
            Primitive::Line(_) => ShapeKind::Line,
            Primitive::Arc(_) => ShapeKind::Arc,
            Primitive::Polygon(_) => ShapeKind::Polygon,
            Primitive::Spline(_) => ShapeKind::Spline,
            Primitive::PointPairSet(_) => ShapeKind::PointPairSet,
            Primitive::Group(_) => ShapeKind::Group,
        }
    }

    /// Apply an arbitrary affine map.
    pub fn map(&self, map: &DAffine2) -> Primitive {
        match self {
            Primitive::Point(p) => Primitive::Point(map.transform_point2(*p)),
            Primitive::Line(line) => Primitive::Line(line.map(map)),
            Primitive::Arc(arc) => arc.map(map, ARC_STEP_DEGREES),
            Primitive::Polygon(poly) => Primitive::Polygon(poly.map(map)),
            Primitive::Spline(spline) => Primitive::Spline(spline.map(map)),
            Primitive::PointPairSet(set) => Primitive::PointPairSet(set.map(map)),
            Primitive::Group(group) => {
                Primitive::Group(Group::new(group.members().map(|m| m.map(map)).collect::<Vec<_>>()))
            }
        }
    }

    /// Apply `f` to every stored point. Arcs only move their center.
    pub fn map_points(&self, f: impl Fn(Point) -> Point + Copy) -> Primitive {
        match self {
            Primitive::Point(p) => Primitive::Point(f(*p)),
            Primitive::Line(line) => Primitive::Line(LineSegment {
                start: f(line.start),
                end: f(line.end),
                extended: line.extended,
            }),
            Primitive::Arc(arc) => Primitive::Arc(Arc {
                center: f(arc.center),
                ..*arc
            }),
            Primitive::Polygon(poly) => {
                Primitive::Polygon(Polygon::new(poly.points().iter().map(|p| f(*p)).collect()))
            }
            Primitive::Spline(spline) => {
                Primitive::Spline(Spline::new(spline.points.iter().map(|p| f(*p)).collect()))
            }
            Primitive::PointPairSet(set) => Primitive::PointPairSet(PointPairSet::new(
                set.pairs.iter().map(|(a, b)| (f(*a), f(*b))).collect(),
            )),
            Primitive::Group(group) => Primitive::Group(Group::new(
                group.members().map(|m| m.map_points(f)).collect::<Vec<_>>(),
            )),
        }
    }

    pub fn translate(&self, delta: Point) -> Primitive {
        self.map(&affine::translation(delta))
    }

    pub fn rotate(&self, angle: Degrees, about: Point) -> Primitive {
        self.map(&affine::rotation(angle, about))
    }

    pub fn dilate(&self, scale: f64, about: Point) -> Primitive {
        self.map(&affine::dilation(scale, about))
    }

    /// Mirror across the line `p1 → p2`, blended by `ratio`.
    pub fn reflect(&self, p1: Point, p2: Point, ratio: Ratio) -> Result<Primitive, GeometryError> {
        Ok(self.map(&affine::reflection(p1, p2, ratio)?))
    }

    /// Drop every point onto the line `p1 → p2`, blended by `ratio`.
    pub fn project(&self, p1: Point, p2: Point, ratio: Ratio) -> Result<Primitive, GeometryError> {
        Ok(self.map(&affine::projection(p1, p2, ratio)?))
    }

    pub fn intersect(&self, other: &Primitive) -> Vec<Point> {
        intersect::intersect(self, other)
    }

    /// Point list used by clipping and filling. Arcs are sampled every
    /// `step` degrees.
    pub fn as_poly_points(&self, step: f64) -> Vec<Point> {
        match self {
            Primitive::Point(p) => vec![*p],
            Primitive::Line(line) => vec![line.start, line.end],
            Primitive::Arc(arc) => arc.sample(step),
            Primitive::Polygon(poly) => poly.points().to_vec(),
            Primitive::Spline(spline) => spline.points.clone(),
            Primitive::PointPairSet(set) => set.points(),
            Primitive::Group(group) => group.members().flat_map(|m| m.as_poly_points(step)).collect(),
        }
    }

    /// Characteristic points: endpoints, vertices, or an arc's ends.
    pub fn key_points(&self) -> Vec<Point> {
        match self {
            Primitive::Point(p) => vec![*p],
            Primitive::Line(line) => vec![line.start, line.end],
            Primitive::Arc(arc) => vec![arc.start_point(), arc.end_point()],
            Primitive::Polygon(poly) => poly.vertices().to_vec(),
            Primitive::Spline(spline) => spline.points.clone(),
            Primitive::PointPairSet(set) => set.points(),
            Primitive::Group(group) => group.members().flat_map(Primitive::key_points).collect(),
        }
    }

    /// The point drawing starts from.
    pub fn start_point(&self) -> Option<Point> {
        match self {
            Primitive::Arc(arc) => Some(arc.start_point()),
            other => other.key_points().first().copied(),
        }
    }

    pub fn atomic_values(&self) -> Vec<f64> {
        match self {
            Primitive::Point(p) => vec![p.x, p.y],
            Primitive::Line(line) => line.atomic_values(),
            Primitive::Arc(arc) => arc.atomic_values(),
            Primitive::Polygon(poly) => poly.atomic_values(),
            Primitive::Spline(spline) => spline.atomic_values(),
            Primitive::PointPairSet(set) => set.atomic_values(),
            Primitive::Group(group) => group.atomic_values(),
        }
    }

    /// Whether every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.atomic_values().iter().all(|v| v.is_finite())
    }
}

impl From<Point> for Primitive {
    fn from(p: Point) -> Self {
        Primitive::Point(p)
    }
}

impl From<LineSegment> for Primitive {
    fn from(line: LineSegment) -> Self {
        Primitive::Line(line)
    }
}

impl From<Arc> for Primitive {
    fn from(arc: Arc) -> Self {
        Primitive::Arc(arc)
    }
}

impl From<Polygon> for Primitive {
    fn from(poly: Polygon) -> Self {
        Primitive::Polygon(poly)
    }
}

impl From<Group> for Primitive {
    fn from(group: Group) -> Self {
        Primitive::Group(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    fn assert_values_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len(), "{a:?} vs {b:?}");
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-9, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn rotate_then_unrotate_restores_polygon() {
        let poly = Primitive::Polygon(Polygon::new(vec![
            dvec2(0.0, 0.0),
            dvec2(3.0, 0.0),
            dvec2(1.0, 2.0),
        ]));
        let about = dvec2(1.0, -1.0);
        let back = poly.rotate(Degrees(37.0), about).rotate(Degrees(-37.0), about);
        assert_values_close(&back.atomic_values(), &poly.atomic_values());
    }

    #[test]
    fn translate_line() {
        let line = Primitive::Line(LineSegment::new(dvec2(0.0, 0.0), dvec2(1.0, 0.0)));
        assert_eq!(line.translate(dvec2(2.0, 3.0)).atomic_values(), vec![2.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn dilate_point_about_center() {
        let p = Primitive::Point(dvec2(2.0, 2.0));
        assert_eq!(p.dilate(3.0, dvec2(1.0, 1.0)), Primitive::Point(dvec2(4.0, 4.0)));
    }

    #[test]
    fn reflect_degenerate_axis_errors() {
        let p = Primitive::Point(dvec2(2.0, 2.0));
        let axis = dvec2(1.0, 1.0);
        assert_eq!(p.reflect(axis, axis, Ratio::ONE), Err(GeometryError::ZeroLengthLine));
    }

    #[test]
    fn project_point_onto_line() {
        let p = Primitive::Point(dvec2(1.0, 3.0));
        let out = p.project(dvec2(0.0, 0.0), dvec2(2.0, 2.0), Ratio::ONE).unwrap();
        assert_values_close(&out.atomic_values(), &[2.0, 2.0]);
    }

    #[test]
    fn group_transform_keeps_group_shape() {
        let group = Primitive::Group(Group::new([
            Primitive::Point(dvec2(1.0, 0.0)),
            Primitive::Arc(Arc::circle(dvec2(0.0, 0.0), 1.0)),
        ]));
        let moved = group.translate(dvec2(1.0, 1.0));
        assert_eq!(moved.kind(), ShapeKind::Group);
        assert_eq!(moved.atomic_values(), vec![2.0, 1.0, 1.0, 1.0, 1.0, 0.0, 360.0]);
    }

    #[test]
    fn shape_kind_names() {
        assert_eq!(ShapeKind::PointPairSet.to_string(), "point pair set");
        assert_eq!(ShapeKind::ALL.len(), 7);
    }
}
