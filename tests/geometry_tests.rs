//! Geometry kernel properties, checked through the public API.

use glam::dvec2;
use robocanvas::defaults::EQUALITY_TOLERANCE;
use robocanvas::expr::{Expr, ExpressionContext, Resolved, resolve};
use robocanvas::geom::clip::{self, BooleanOp};
use robocanvas::geom::delaunay::triangulate;
use robocanvas::geom::simplify::simplify;
use robocanvas::geom::{Arc, LineSegment, Polygon, Primitive};
use robocanvas::{Degrees, EngineConfig, GeometryError, Point, Ratio};

fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
    vec![
        dvec2(x, y),
        dvec2(x + size, y),
        dvec2(x + size, y + size),
        dvec2(x, y + size),
    ]
}

fn values_close(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() <= EQUALITY_TOLERANCE)
}

fn eval(expr: &Expr) -> Resolved {
    let mut ctx = ExpressionContext::new();
    resolve(&mut ctx, &EngineConfig::default(), expr).unwrap()
}

// ==== simplification ====

#[test]
fn rdp_is_idempotent() {
    let zigzag: Vec<Point> = (0..60)
        .map(|i| dvec2(i as f64 * 0.5, ((i % 7) as f64 * 0.9).sin() * (i % 3) as f64))
        .collect();
    let wave: Vec<Point> = (0..100)
        .map(|i| {
            let t = i as f64 / 10.0;
            dvec2(t, t.sin())
        })
        .collect();
    for points in [zigzag, wave] {
        for eps in [0.0, 0.01, 0.1, 0.5, 2.0] {
            let once = simplify(&points, eps);
            assert_eq!(simplify(&once, eps), once, "eps {eps}");
            assert_eq!(once.first(), points.first());
            assert_eq!(once.last(), points.last());
        }
    }
}

// ==== polygons ====

#[test]
fn polygon_resolution_closes_open_rings_only() {
    let open = eval(&Expr::polygon([(0.0, 0.0), (4.0, 0.0), (4.0, 3.0)]));
    assert_eq!(open.values, vec![0.0, 0.0, 4.0, 0.0, 4.0, 3.0, 0.0, 0.0]);

    let closed = eval(&Expr::polygon([(0.0, 0.0), (4.0, 0.0), (4.0, 3.0), (0.0, 0.0)]));
    assert_eq!(closed.values, open.values);
}

#[test]
fn polygon_measures_ignore_closing_point() {
    let poly = Polygon::new(square(0.0, 0.0, 2.0));
    assert_eq!(poly.side_count(), 4);
    assert!((poly.perimeter() - 8.0).abs() < 1e-12);
    assert!((poly.signed_area() - 4.0).abs() < 1e-12);
    assert!((poly.centroid() - dvec2(1.0, 1.0)).length() < 1e-12);
}

// ==== transforms ====

#[test]
fn rotation_round_trips() {
    let about = dvec2(1.5, -2.0);
    let shapes = [
        Primitive::Point(dvec2(3.0, 4.0)),
        Primitive::Line(LineSegment::new(dvec2(-1.0, 0.0), dvec2(2.0, 5.0))),
        Primitive::Polygon(Polygon::new(vec![dvec2(0.0, 0.0), dvec2(3.0, 0.0), dvec2(1.0, 2.0)])),
    ];
    for shape in &shapes {
        for theta in [15.0, 90.0, 137.5, -200.0] {
            let back = shape.rotate(Degrees(theta), about).rotate(Degrees(-theta), about);
            assert!(
                values_close(&back.atomic_values(), &shape.atomic_values()),
                "{} by {theta}",
                shape.kind()
            );
        }
    }
}

#[test]
fn half_reflection_lands_on_axis() {
    let shape = Primitive::Point(dvec2(2.0, 3.0));
    let out = shape.reflect(dvec2(0.0, 0.0), dvec2(1.0, 0.0), Ratio::try_new(0.5).unwrap()).unwrap();
    assert_eq!(out, Primitive::Point(dvec2(2.0, 0.0)));
}

#[test]
fn degenerate_axis_is_an_error_not_nan() {
    let shape = Primitive::Point(dvec2(2.0, 3.0));
    let p = dvec2(1.0, 1.0);
    assert_eq!(shape.reflect(p, p, Ratio::ONE), Err(GeometryError::ZeroLengthLine));
    assert_eq!(shape.project(p, p, Ratio::ONE), Err(GeometryError::ZeroLengthLine));
}

#[test]
fn circle_survives_rotation() {
    let circle = Primitive::Arc(Arc::circle(dvec2(1.0, 0.0), 2.0));
    let Primitive::Arc(out) = circle.rotate(Degrees(90.0), dvec2(0.0, 0.0)) else {
        panic!("rotation keeps arcs");
    };
    assert!((out.center - dvec2(0.0, 1.0)).length() < 1e-9);
    assert!((out.radius - 2.0).abs() < 1e-9);
}

// ==== intersections ====

#[test]
fn line_meets_circle_twice() {
    let line = Primitive::Line(LineSegment::new(dvec2(-5.0, 0.0), dvec2(5.0, 0.0)));
    let circle = Primitive::Arc(Arc::circle(dvec2(0.0, 0.0), 2.0));
    let hits = line.intersect(&circle);
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().any(|p| (*p - dvec2(2.0, 0.0)).length() < 1e-9));
    assert!(hits.iter().any(|p| (*p - dvec2(-2.0, 0.0)).length() < 1e-9));
}

#[test]
fn polygon_edges_intersect_line() {
    let poly = Primitive::Polygon(Polygon::new(square(0.0, 0.0, 2.0)));
    let line = Primitive::Line(LineSegment::new(dvec2(-1.0, 1.0), dvec2(3.0, 1.0)));
    assert_eq!(poly.intersect(&line).len(), 2);
}

// ==== delaunay ====

#[test]
fn unit_square_gives_two_triangles() {
    let points = square(0.0, 0.0, 1.0);
    let tris = triangulate(&points);
    assert_eq!(tris.len(), 2);
    let mut area = 0.0;
    for t in &tris {
        assert!(t.iter().all(|i| *i < points.len()), "super-triangle vertex in {t:?}");
        let a = (points[t[1]] - points[t[0]]).perp_dot(points[t[2]] - points[t[0]]) * 0.5;
        assert!(a > 0.0);
        area += a;
    }
    // no overlap: the pieces add up to exactly the square
    assert!((area - 1.0).abs() < 1e-9);
}

// ==== clipping ====

#[test]
fn union_of_overlapping_squares_is_one_octagon_ring() {
    let out = clip::union(&[square(0.0, 0.0, 2.0)], &[square(1.0, 1.0, 2.0)]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].vertices().len(), 8);
    assert!((out[0].signed_area().abs() - 7.0).abs() < 1e-9);
}

#[test]
fn boolean_dispatch_matches_named_ops() {
    let a = [square(0.0, 0.0, 2.0)];
    let b = [square(1.0, 1.0, 2.0)];
    assert_eq!(clip::boolean(&a, &b, BooleanOp::Intersection), clip::intersection(&a, &b));
    assert_eq!(clip::boolean(&a, &b, BooleanOp::Xor), clip::xor(&a, &b));
}

#[test]
fn cut_makes_a_donut() {
    let out = clip::cut(&square(0.0, 0.0, 4.0), &square(1.0, 1.0, 2.0));
    assert_eq!(out.len(), 1);
    assert!((out[0].signed_area().abs() - 12.0).abs() < 1e-9);
}

#[test]
fn fill_expression_cuts_hole() {
    let fill = Expr::Fill {
        op: BooleanOp::Difference,
        shapes: vec![
            Expr::polygon([(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]),
            Expr::polygon([(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]),
        ],
    };
    let out = eval(&fill);
    assert_eq!(out.name, "fill");
    let Some(Primitive::Group(region)) = out.primitive() else {
        panic!("fill resolves to a group of polygons");
    };
    assert_eq!(region.len(), 1);
}

// ==== equality law ====

#[test]
fn equality_law_is_reflexive_and_symmetric() {
    let values = [
        eval(&Expr::point(0.0, 0.0)),
        eval(&Expr::point(0.015, 0.0)),
        eval(&Expr::line(Expr::point(0.0, 0.0), Expr::point(1.0, 1.0))),
        eval(&Expr::num(3.0)),
        eval(&Expr::polygon([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)])),
    ];
    for a in &values {
        assert!(a.equals(a, EQUALITY_TOLERANCE));
        for b in &values {
            assert_eq!(a.equals(b, EQUALITY_TOLERANCE), b.equals(a, EQUALITY_TOLERANCE));
        }
    }
    assert!(values[0].equals(&values[1], EQUALITY_TOLERANCE));
    assert!(!values[0].equals(&values[2], EQUALITY_TOLERANCE));
}
