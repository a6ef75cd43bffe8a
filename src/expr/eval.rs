//! Expression resolution
//!
//! Walks an expression tree bottom-up against an [`ExpressionContext`],
//! producing atomic values and (for geometric nodes) a primitive.
//! Numeric input is validated here, before any geometry reaches a renderer.

use glam::DVec2;

use super::ast::{BinaryOp, Expr, Function, IntersectionFallback, Statement, TransformExpr};
use super::context::{Binding, ExpressionContext};
use super::value::{Drawable, Resolved};
use crate::defaults::{DEFAULT_DASH_OFF, DEFAULT_DASH_ON, EngineConfig};
use crate::errors::{ExpressionError, ExpressionErrorKind, GeometryError};
use crate::geom::clip::{self, BooleanOp};
use crate::geom::intersect::line_line;
use crate::geom::simplify::simplify_if_needed;
use crate::geom::{Arc, Group, LineSegment, PointPairSet, Polygon, Primitive, Spline, sample_parametric};
use crate::log::{debug, warn};
use crate::transform::TransformParams;
use crate::types::{self, Degrees, NumericError, Point, Ratio};

type Result<T> = std::result::Result<T, ExpressionErrorKind>;

/// Resolve one top-level statement, labeling the result and binding it to
/// the statement's variable name.
pub fn resolve_statement(
    ctx: &mut ExpressionContext,
    config: &EngineConfig,
    statement: &Statement,
) -> std::result::Result<Resolved, ExpressionError> {
    match resolve(ctx, config, &statement.expr) {
        Ok(value) => {
            let value = value.labeled(statement.label.clone());
            if let Some(name) = &statement.binding {
                ctx.add_reference(name.clone(), value.clone());
            }
            Ok(value)
        }
        Err(kind) => {
            let err = kind.at(statement.id);
            warn!(id = %statement.id, error = %err, "expression failed to resolve");
            Err(err)
        }
    }
}

/// Resolve an expression node
pub fn resolve(ctx: &mut ExpressionContext, config: &EngineConfig, expr: &Expr) -> Result<Resolved> {
    let name = expr.name();
    match expr {
        Expr::Number(v) => Ok(Resolved::number(checked(*v, "number")?)),

        Expr::Point(x, y) => {
            let p = DVec2::new(number(ctx, config, x, "x coordinate")?, number(ctx, config, y, "y coordinate")?);
            Ok(Resolved::shape(name, Primitive::Point(p)))
        }

        Expr::Line { from, to, extend } => {
            let line = LineSegment::new(point(ctx, config, from)?, point(ctx, config, to)?).extended(*extend);
            Ok(Resolved::shape(name, Primitive::Line(line)))
        }

        Expr::Arc {
            origin,
            radius,
            from,
            to,
        } => {
            let center = point(ctx, config, origin)?;
            let radius = length(ctx, config, radius, "radius")?;
            let from = Degrees(number(ctx, config, from, "start angle")?);
            let to = Degrees(number(ctx, config, to, "end angle")?);
            Ok(Resolved::shape(name, Primitive::Arc(Arc::new(center, radius, from, to))))
        }

        Expr::Polygon(items) => {
            let points = collect_points(ctx, config, items)?;
            if points.len() < 3 {
                return Err(ExpressionErrorKind::NotEnoughPoints {
                    what: "polygon",
                    needed: 3,
                    found: points.len(),
                });
            }
            let ring = Polygon::new(points);
            let ring = simplify_if_needed(ring.points().to_vec(), config.simplify_threshold, config.simplify_epsilon);
            Ok(Resolved::shape(name, Primitive::Polygon(Polygon::new(ring))))
        }

        Expr::Spline(items) => {
            let points = collect_points(ctx, config, items)?;
            if points.len() < 2 {
                return Err(ExpressionErrorKind::NotEnoughPoints {
                    what: "spline",
                    needed: 2,
                    found: points.len(),
                });
            }
            let points = simplify_if_needed(points, config.simplify_threshold, config.simplify_epsilon);
            Ok(Resolved::shape(name, Primitive::Spline(Spline::new(points))))
        }

        Expr::ParametricPlot {
            x_coeffs,
            y_coeffs,
            t_from,
            t_to,
            samples,
        } => {
            for c in x_coeffs.iter().chain(y_coeffs) {
                checked(*c, "coefficient")?;
            }
            let t0 = number(ctx, config, t_from, "parameter start")?;
            let t1 = number(ctx, config, t_to, "parameter end")?;
            let samples = samples.unwrap_or(config.plot_samples);
            if samples < 2 {
                return Err(ExpressionErrorKind::NotEnoughPoints {
                    what: "plot",
                    needed: 2,
                    found: samples,
                });
            }
            let points = sample_parametric(x_coeffs, y_coeffs, t0, t1, samples);
            let points = simplify_if_needed(points, config.simplify_threshold, config.simplify_epsilon);
            let shape = Primitive::Spline(Spline::new(points));
            if !shape.is_finite() {
                return Err(GeometryError::NonFinite.into());
            }
            Ok(Resolved::shape(name, shape))
        }

        Expr::DashedLine { from, to, on, off } => {
            let start = point(ctx, config, from)?;
            let end = point(ctx, config, to)?;
            let on = match on {
                Some(e) => length(ctx, config, e, "dash length")?,
                None => DEFAULT_DASH_ON,
            };
            let off = match off {
                Some(e) => length(ctx, config, e, "gap length")?,
                None => DEFAULT_DASH_OFF,
            };
            let count = PointPairSet::dash_count(start.distance(end), on, off);
            if on > 0.0 && count > config.max_dash_count as f64 {
                return Err(ExpressionErrorKind::TooManyDashes {
                    count: count as usize,
                    max: config.max_dash_count,
                });
            }
            let set = PointPairSet::dashed(start, end, on, off)?;
            Ok(Resolved::shape(name, Primitive::PointPairSet(set)))
        }

        Expr::Text { text, at } => {
            let at = point(ctx, config, at)?;
            Ok(Resolved::with_drawable(
                name,
                vec![at.x, at.y],
                Drawable::Text {
                    text: text.clone(),
                    at,
                },
            ))
        }

        Expr::Var(var) => lookup(ctx, config, var),

        Expr::Group(children) => {
            let mut group = Group::default();
            for child in children {
                group.push(shape(ctx, config, child)?);
            }
            Ok(Resolved::shape(name, Primitive::Group(group)))
        }

        Expr::Repeat {
            var,
            start,
            end,
            step,
            body,
        } => repeat(ctx, config, var, start, end, step, body),

        Expr::Intersect { a, b, nth, fallback } => {
            let first = shape(ctx, config, a)?;
            let second = shape(ctx, config, b)?;
            let p = nth_intersection(&first, &second, *nth, *fallback)?;
            Ok(Resolved::shape(name, Primitive::Point(p)))
        }

        Expr::Interpolate { a, b, ratio } => {
            let ratio = ratio_of(ctx, config, ratio)?;
            let lhs = resolve(ctx, config, a)?;
            let rhs = resolve(ctx, config, b)?;
            if let (Some(x), Some(y)) = (lhs.as_number(), rhs.as_number()) {
                return Ok(Resolved::number(ratio.lerp_f64(x, y)));
            }
            match (lhs.as_point(), rhs.as_point()) {
                (Some(p), Some(q)) => Ok(Resolved::shape(name, Primitive::Point(ratio.lerp(p, q)))),
                _ => Err(ExpressionErrorKind::TypeMismatch {
                    expected: "two points or two numbers",
                    found: if lhs.as_point().is_some() { rhs.describe() } else { lhs.describe() },
                }),
            }
        }

        Expr::Transform { target, op } => {
            let source = shape(ctx, config, target)?;
            let params = transform_params(ctx, config, op)?;
            let result = params.apply(&source, Ratio::ONE)?;
            Ok(Resolved::with_drawable(
                name,
                result.atomic_values(),
                Drawable::Transform {
                    source,
                    params,
                    result,
                },
            ))
        }

        Expr::Mid(a, b) => {
            let mid = match b {
                Some(b) => (point(ctx, config, a)? + point(ctx, config, b)?) * 0.5,
                None => match shape(ctx, config, a)? {
                    Primitive::Line(line) => line.midpoint(),
                    other => {
                        return Err(ExpressionErrorKind::TypeMismatch {
                            expected: "line",
                            found: other.kind().name(),
                        });
                    }
                },
            };
            Ok(Resolved::shape(name, Primitive::Point(mid)))
        }

        Expr::Binary(op, lhs, rhs) => binary(ctx, config, *op, lhs, rhs),

        Expr::Negate(inner) => {
            let value = resolve(ctx, config, inner)?;
            if let Some(v) = value.as_number() {
                return Ok(Resolved::number(-v));
            }
            match value.as_point() {
                Some(p) => Ok(Resolved::shape("point", Primitive::Point(-p))),
                None => Err(ExpressionErrorKind::TypeMismatch {
                    expected: "number or point",
                    found: value.describe(),
                }),
            }
        }

        Expr::Call(function, args) => call(ctx, config, function, args),

        Expr::Fill { op, shapes } => fill(ctx, config, *op, shapes),

        Expr::Effect { kind, target } => {
            let target = shape(ctx, config, target)?;
            Ok(Resolved::with_drawable(
                name,
                target.atomic_values(),
                Drawable::Effect { kind: *kind, target },
            ))
        }

        Expr::Item { target, index } => {
            let points = shape(ctx, config, target)?.key_points();
            if *index == 0 || *index > points.len() {
                return Err(ExpressionErrorKind::IndexOutOfRange {
                    index: *index,
                    len: points.len(),
                });
            }
            Ok(Resolved::shape(name, Primitive::Point(points[*index - 1])))
        }
    }
}

// ============================================================================
// Typed accessors
// ============================================================================

fn checked(v: f64, what: &'static str) -> Result<f64> {
    types::finite(v).map_err(ExpressionErrorKind::invalid(what))
}

fn number(ctx: &mut ExpressionContext, config: &EngineConfig, expr: &Expr, what: &'static str) -> Result<f64> {
    let value = resolve(ctx, config, expr)?;
    match value.as_number() {
        Some(v) => checked(v, what),
        None => Err(ExpressionErrorKind::TypeMismatch {
            expected: "number",
            found: value.describe(),
        }),
    }
}

fn length(ctx: &mut ExpressionContext, config: &EngineConfig, expr: &Expr, what: &'static str) -> Result<f64> {
    let value = number(ctx, config, expr, what)?;
    if value < 0.0 {
        return Err(ExpressionErrorKind::NegativeLength { what, value });
    }
    Ok(value)
}

fn ratio_of(ctx: &mut ExpressionContext, config: &EngineConfig, expr: &Expr) -> Result<Ratio> {
    let value = number(ctx, config, expr, "ratio")?;
    Ratio::try_new(value).map_err(|err| match err {
        NumericError::OutOfRange => ExpressionErrorKind::RatioOutOfRange { value },
        other => ExpressionErrorKind::InvalidNumeric {
            what: "ratio",
            error: other,
        },
    })
}

fn point(ctx: &mut ExpressionContext, config: &EngineConfig, expr: &Expr) -> Result<Point> {
    let value = resolve(ctx, config, expr)?;
    value.as_point().ok_or(ExpressionErrorKind::TypeMismatch {
        expected: "point",
        found: value.describe(),
    })
}

fn shape(ctx: &mut ExpressionContext, config: &EngineConfig, expr: &Expr) -> Result<Primitive> {
    let value = resolve(ctx, config, expr)?;
    if let Some(shape) = value.primitive() {
        return Ok(shape.clone());
    }
    match value.as_point() {
        Some(p) if value.as_number().is_none() => Ok(Primitive::Point(p)),
        _ => Err(ExpressionErrorKind::TypeMismatch {
            expected: "shape",
            found: value.describe(),
        }),
    }
}

fn axis(ctx: &mut ExpressionContext, config: &EngineConfig, expr: &Expr) -> Result<(Point, Point)> {
    match shape(ctx, config, expr)? {
        Primitive::Line(line) => Ok((line.start, line.end)),
        other => Err(ExpressionErrorKind::TypeMismatch {
            expected: "line",
            found: other.kind().name(),
        }),
    }
}

/// Points from a mix of point items and bare coordinate numbers.
fn collect_points(ctx: &mut ExpressionContext, config: &EngineConfig, items: &[Expr]) -> Result<Vec<Point>> {
    let mut points = Vec::with_capacity(items.len());
    let mut coords: Vec<f64> = Vec::new();
    for item in items {
        let value = resolve(ctx, config, item)?;
        if let Some(v) = value.as_number() {
            coords.push(checked(v, "coordinate")?);
            if let [x, y] = coords[..] {
                points.push(DVec2::new(x, y));
                coords.clear();
            }
            continue;
        }
        if !coords.is_empty() {
            return Err(ExpressionErrorKind::OddCoordinateCount { count: coords.len() });
        }
        match value.as_point() {
            Some(p) => points.push(p),
            None => {
                return Err(ExpressionErrorKind::TypeMismatch {
                    expected: "point",
                    found: value.describe(),
                });
            }
        }
    }
    if !coords.is_empty() {
        let count = points.len() * 2 + coords.len();
        return Err(ExpressionErrorKind::OddCoordinateCount { count });
    }
    Ok(points)
}

// ============================================================================
// Node helpers
// ============================================================================

fn lookup(ctx: &mut ExpressionContext, config: &EngineConfig, var: &str) -> Result<Resolved> {
    match ctx.get(var) {
        Some(Binding::Value(value)) => Ok(value.as_reference()),
        Some(Binding::Definition(expr)) => {
            let expr = expr.clone();
            ctx.enter(var)?;
            let result = resolve(ctx, config, &expr);
            ctx.leave();
            result
        }
        None => Err(ExpressionErrorKind::UndefinedVariable { name: var.to_string() }),
    }
}

/// Number of iterations a repeat runs.
pub fn repeat_count(start: f64, end: f64, step: f64) -> Result<usize> {
    if !step.is_finite() || step <= 0.0 {
        return Err(ExpressionErrorKind::InvalidStep { step });
    }
    // tolerate representation error such as (0.3 - 0.0) / 0.1 = 2.999...
    let span = (end - start) / step + 1e-9;
    Ok(if span <= 0.0 { 0 } else { span.floor() as usize })
}

fn repeat(
    ctx: &mut ExpressionContext,
    config: &EngineConfig,
    var: &str,
    start: &Expr,
    end: &Expr,
    step: &Expr,
    body: &Expr,
) -> Result<Resolved> {
    let start = number(ctx, config, start, "repeat start")?;
    let end = number(ctx, config, end, "repeat end")?;
    let step = number(ctx, config, step, "repeat step")?;
    let count = repeat_count(start, end, step)?;
    if count > config.max_repeat_iterations {
        return Err(ExpressionErrorKind::TooManyIterations {
            count,
            max: config.max_repeat_iterations,
        });
    }
    debug!(var, count, "repeat");

    let mut group = Group::default();
    let mut values = Vec::new();
    for k in 0..count {
        // rebinding, not shadowing: the loop variable keeps its last value
        ctx.add_reference(var, Resolved::number(start + k as f64 * step));
        let item = resolve(ctx, config, body)?;
        match item.primitive() {
            Some(shape) => group.push(shape.clone()),
            None => values.extend_from_slice(&item.values),
        }
    }
    if group.is_empty() {
        return Ok(Resolved::with_drawable("repeat", values, Drawable::Nothing));
    }
    Ok(Resolved::shape("repeat", Primitive::Group(group)))
}

fn nth_intersection(first: &Primitive, second: &Primitive, nth: usize, fallback: IntersectionFallback) -> Result<Point> {
    let points = first.intersect(second);
    if nth >= 1 && nth <= points.len() {
        return Ok(points[nth - 1]);
    }
    match fallback {
        IntersectionFallback::StartPoint => {
            warn!(nth, found = points.len(), "no such intersection, using start point");
            first.start_point().ok_or(GeometryError::EmptyShape.into())
        }
        IntersectionFallback::Error => {
            if let (Primitive::Line(a), Primitive::Line(b)) = (first, second) {
                line_line(a, b)?;
            }
            Err(ExpressionErrorKind::NoIntersection {
                index: nth,
                available: points.len(),
            })
        }
    }
}

fn transform_params(ctx: &mut ExpressionContext, config: &EngineConfig, op: &TransformExpr) -> Result<TransformParams> {
    let about = |ctx: &mut ExpressionContext, e: &Option<Box<Expr>>| -> Result<Point> {
        match e {
            Some(e) => point(ctx, config, e),
            None => Ok(Point::ZERO),
        }
    };
    let ratio = |ctx: &mut ExpressionContext, e: &Option<Box<Expr>>| -> Result<Ratio> {
        match e {
            Some(e) => ratio_of(ctx, config, e),
            None => Ok(Ratio::ONE),
        }
    };
    Ok(match op {
        TransformExpr::Translate { dx, dy } => TransformParams::Translate {
            delta: DVec2::new(number(ctx, config, dx, "dx")?, number(ctx, config, dy, "dy")?),
        },
        TransformExpr::Rotate { angle, about: center } => TransformParams::Rotate {
            angle: Degrees(number(ctx, config, angle, "angle")?),
            about: about(ctx, center)?,
        },
        TransformExpr::Reflect { axis: line, ratio: r } => {
            let (p1, p2) = axis(ctx, config, line)?;
            TransformParams::Reflect {
                p1,
                p2,
                ratio: ratio(ctx, r)?,
            }
        }
        TransformExpr::Dilate { scale, about: center } => TransformParams::Dilate {
            scale: number(ctx, config, scale, "scale")?,
            about: about(ctx, center)?,
        },
        TransformExpr::Project { onto, ratio: r } => {
            let (p1, p2) = axis(ctx, config, onto)?;
            TransformParams::Project {
                p1,
                p2,
                ratio: ratio(ctx, r)?,
            }
        }
    })
}

fn binary(ctx: &mut ExpressionContext, config: &EngineConfig, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Resolved> {
    let a = resolve(ctx, config, lhs)?;
    let b = resolve(ctx, config, rhs)?;
    if let (Some(x), Some(y)) = (a.as_number(), b.as_number()) {
        let v = match op {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            BinaryOp::Mul => x * y,
            BinaryOp::Div if y == 0.0 => return Err(ExpressionErrorKind::DivisionByZero),
            BinaryOp::Div => x / y,
        };
        return Ok(Resolved::number(checked(v, "arithmetic result")?));
    }
    let p = match (op, a.as_point(), b.as_point(), a.as_number(), b.as_number()) {
        (BinaryOp::Add, Some(p), Some(q), None, None) => p + q,
        (BinaryOp::Sub, Some(p), Some(q), None, None) => p - q,
        (BinaryOp::Mul, Some(p), _, None, Some(s)) | (BinaryOp::Mul, _, Some(p), Some(s), None) => p * s,
        (BinaryOp::Div, Some(_), _, None, Some(s)) if s == 0.0 => return Err(ExpressionErrorKind::DivisionByZero),
        (BinaryOp::Div, Some(p), _, None, Some(s)) => p / s,
        _ => {
            return Err(ExpressionErrorKind::TypeMismatch {
                expected: "numbers or points",
                found: if a.as_number().is_some() { b.describe() } else { a.describe() },
            });
        }
    };
    if !p.is_finite() {
        return Err(GeometryError::NonFinite.into());
    }
    Ok(Resolved::shape("point", Primitive::Point(p)))
}

fn call(ctx: &mut ExpressionContext, config: &EngineConfig, function: &str, args: &[Expr]) -> Result<Resolved> {
    let func = Function::from_name(function).ok_or_else(|| ExpressionErrorKind::UnknownFunction {
        name: function.to_string(),
    })?;
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(number(ctx, config, arg, "argument")?);
    }
    let unary = |values: &[f64]| -> Result<f64> {
        match values {
            [v] => Ok(*v),
            _ => Err(ExpressionErrorKind::WrongArity {
                function: func.name().to_string(),
                expected: 1,
                found: values.len(),
            }),
        }
    };
    let result = match func {
        Function::Sin => unary(&values)?.to_radians().sin(),
        Function::Cos => unary(&values)?.to_radians().cos(),
        Function::Tan => unary(&values)?.to_radians().tan(),
        Function::Sqrt => {
            let v = unary(&values)?;
            if v < 0.0 {
                return Err(ExpressionErrorKind::InvalidNumeric {
                    what: "square root argument",
                    error: NumericError::Negative,
                });
            }
            v.sqrt()
        }
        Function::Abs => unary(&values)?.abs(),
        Function::Min | Function::Max => {
            if values.is_empty() {
                return Err(ExpressionErrorKind::WrongArity {
                    function: func.name().to_string(),
                    expected: 1,
                    found: 0,
                });
            }
            let pick = if func == Function::Min { f64::min } else { f64::max };
            values.iter().copied().fold(values[0], pick)
        }
    };
    Ok(Resolved::number(checked(result, "function result")?))
}

/// Rings making up a closed shape.
fn rings_of(shape: &Primitive, arc_step: f64) -> Result<Vec<Vec<Point>>> {
    match shape {
        Primitive::Polygon(poly) => Ok(vec![poly.points().to_vec()]),
        Primitive::Arc(arc) => Ok(vec![arc.sample(arc_step)]),
        Primitive::Spline(spline) => Ok(vec![spline.points.clone()]),
        Primitive::Group(group) => {
            let mut rings = Vec::new();
            for member in group.members() {
                rings.extend(rings_of(member, arc_step)?);
            }
            Ok(rings)
        }
        other @ (Primitive::Point(_) | Primitive::Line(_) | Primitive::PointPairSet(_)) => {
            Err(ExpressionErrorKind::TypeMismatch {
                expected: "closed shape",
                found: other.kind().name(),
            })
        }
    }
}

fn fill(ctx: &mut ExpressionContext, config: &EngineConfig, op: BooleanOp, shapes: &[Expr]) -> Result<Resolved> {
    let Some((first, rest)) = shapes.split_first() else {
        return Err(ExpressionErrorKind::WrongArity {
            function: "fill".to_string(),
            expected: 1,
            found: 0,
        });
    };
    let mut acc = rings_of(&shape(ctx, config, first)?, config.arc_step)?;
    for next in rest {
        let other = rings_of(&shape(ctx, config, next)?, config.arc_step)?;
        let polys = match (op, acc.as_slice(), other.as_slice()) {
            (BooleanOp::Difference, [outer], [inner]) => clip::cut(outer, inner),
            _ => clip::boolean(&acc, &other, op),
        };
        acc = polys.iter().map(|p| p.points().to_vec()).collect();
    }
    let region = Group::new(acc.into_iter().map(|ring| Primitive::Polygon(Polygon::new(ring))));
    let region = Primitive::Group(region);
    Ok(Resolved::with_drawable(
        "fill",
        region.atomic_values(),
        Drawable::Fill { op, region },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ast::EffectKind;
    use glam::dvec2;

    fn eval(expr: &Expr) -> Result<Resolved> {
        let mut ctx = ExpressionContext::new();
        resolve(&mut ctx, &EngineConfig::default(), expr)
    }

    #[test]
    fn point_resolves_to_coordinates() {
        assert_eq!(eval(&Expr::point(1.0, 2.0)).unwrap().values, vec![1.0, 2.0]);
    }

    #[test]
    fn nan_is_rejected() {
        assert_eq!(
            eval(&Expr::num(f64::NAN)),
            Err(ExpressionErrorKind::InvalidNumeric {
                what: "number",
                error: NumericError::NaN
            })
        );
    }

    #[test]
    fn polygon_closes_ring() {
        let open = eval(&Expr::polygon([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)])).unwrap();
        assert_eq!(open.values, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let closed = eval(&Expr::polygon([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (0.0, 0.0)])).unwrap();
        assert_eq!(closed.values.len(), 8);
    }

    #[test]
    fn polygon_from_bare_coordinates() {
        let expr = Expr::Polygon([0.0, 0.0, 2.0, 0.0, 2.0, 2.0].into_iter().map(Expr::num).collect());
        assert_eq!(eval(&expr).unwrap().values.len(), 8);
        let odd = Expr::Polygon([0.0, 0.0, 2.0, 0.0, 2.0].into_iter().map(Expr::num).collect());
        assert_eq!(eval(&odd), Err(ExpressionErrorKind::OddCoordinateCount { count: 5 }));
    }

    #[test]
    fn polygon_needs_three_points() {
        let err = eval(&Expr::polygon([(0.0, 0.0), (1.0, 0.0)])).unwrap_err();
        assert!(matches!(err, ExpressionErrorKind::NotEnoughPoints { needed: 3, found: 2, .. }));
    }

    #[test]
    fn long_spline_is_simplified() {
        let points: Vec<Expr> = (0..40).map(|i| Expr::point(i as f64, 0.0)).collect();
        let out = eval(&Expr::Spline(points)).unwrap();
        assert_eq!(out.values, vec![0.0, 0.0, 39.0, 0.0]);
    }

    #[test]
    fn negative_radius_is_rejected() {
        let err = eval(&Expr::arc(Expr::point(0.0, 0.0), -1.0, 0.0, 90.0)).unwrap_err();
        assert_eq!(
            err,
            ExpressionErrorKind::NegativeLength {
                what: "radius",
                value: -1.0
            }
        );
    }

    #[test]
    fn repeat_count_floors() {
        assert_eq!(repeat_count(0.0, 3.0, 1.0), Ok(3));
        assert_eq!(repeat_count(0.0, 0.3, 0.1), Ok(3));
        assert_eq!(repeat_count(0.0, 3.5, 1.0), Ok(3));
        assert_eq!(repeat_count(5.0, 0.0, 1.0), Ok(0));
        assert_eq!(repeat_count(0.0, 1.0, 0.0), Err(ExpressionErrorKind::InvalidStep { step: 0.0 }));
    }

    #[test]
    fn repeat_rebinds_loop_variable() {
        let body = Expr::Point(Box::new(Expr::var("i")), Box::new(Expr::num(0.0)));
        let mut ctx = ExpressionContext::new();
        let out = resolve(&mut ctx, &EngineConfig::default(), &Expr::repeat("i", 0.0, 3.0, 1.0, body)).unwrap();
        assert_eq!(out.values, vec![0.0, 0.0, 1.0, 0.0, 2.0, 0.0]);
        // last value stays bound after the loop
        assert_eq!(ctx.get("i"), Some(&Binding::Value(Resolved::number(2.0))));
    }

    #[test]
    fn repeat_over_limit_fails() {
        let err = eval(&Expr::repeat("i", 0.0, 31.0, 1.0, Expr::point(0.0, 0.0))).unwrap_err();
        assert_eq!(err, ExpressionErrorKind::TooManyIterations { count: 31, max: 30 });
        assert!(eval(&Expr::repeat("i", 0.0, 30.0, 1.0, Expr::point(0.0, 0.0))).is_ok());
    }

    fn dashed(length: f64, dash: f64) -> Expr {
        Expr::DashedLine {
            from: Box::new(Expr::point(0.0, 0.0)),
            to: Box::new(Expr::point(length, 0.0)),
            on: Some(Box::new(Expr::num(dash))),
            off: Some(Box::new(Expr::num(dash))),
        }
    }

    #[test]
    fn dash_count_is_bounded_before_generation() {
        for length in [1e8, 1e17] {
            let err = eval(&dashed(length, 1e-3)).unwrap_err();
            assert!(
                matches!(err, ExpressionErrorKind::TooManyDashes { max: 10_000, .. }),
                "{length}: {err:?}"
            );
        }
        let ok = eval(&dashed(10.0, 1.0)).unwrap();
        assert_eq!(ok.values.len(), 5 * 4);

        let mut ctx = ExpressionContext::new();
        let config = EngineConfig::default().with_max_dash_count(4);
        assert_eq!(
            resolve(&mut ctx, &config, &dashed(10.0, 1.0)),
            Err(ExpressionErrorKind::TooManyDashes { count: 5, max: 4 })
        );
    }

    #[test]
    fn undefined_variable() {
        assert_eq!(
            eval(&Expr::var("nope")),
            Err(ExpressionErrorKind::UndefinedVariable { name: "nope".into() })
        );
    }

    #[test]
    fn circular_definitions_are_detected() {
        let mut ctx = ExpressionContext::new();
        ctx.define("a", Expr::var("b"));
        ctx.define("b", Expr::var("a"));
        let err = resolve(&mut ctx, &EngineConfig::default(), &Expr::var("a")).unwrap_err();
        assert_eq!(err, ExpressionErrorKind::CircularReference { name: "a".into() });
    }

    #[test]
    fn definitions_see_current_bindings() {
        let mut ctx = ExpressionContext::new();
        ctx.define("p", Expr::Point(Box::new(Expr::var("k")), Box::new(Expr::num(1.0))));
        ctx.add_reference("k", Resolved::number(4.0));
        let out = resolve(&mut ctx, &EngineConfig::default(), &Expr::var("p")).unwrap();
        assert_eq!(out.values, vec![4.0, 1.0]);
    }

    #[test]
    fn intersection_index_counts_from_one() {
        let circle = Expr::arc(Expr::point(0.0, 0.0), 1.0, 0.0, 360.0);
        let line = Expr::line(Expr::point(-2.0, 0.0), Expr::point(2.0, 0.0));
        let second = eval(&Expr::intersect(line.clone(), circle.clone(), 2)).unwrap();
        assert!((second.values[0] - 1.0).abs() < 1e-9);
        assert_eq!(
            eval(&Expr::intersect(line, circle, 3)),
            Err(ExpressionErrorKind::NoIntersection { index: 3, available: 2 })
        );
    }

    #[test]
    fn parallel_lines_are_degenerate() {
        let a = Expr::line(Expr::point(0.0, 0.0), Expr::point(1.0, 0.0));
        let b = Expr::line(Expr::point(0.0, 1.0), Expr::point(1.0, 1.0));
        assert_eq!(
            eval(&Expr::intersect(a, b, 1)),
            Err(ExpressionErrorKind::Degenerate(GeometryError::ParallelLines))
        );
    }

    #[test]
    fn start_point_fallback_is_opt_in() {
        let a = Expr::line(Expr::point(0.0, 0.0), Expr::point(1.0, 0.0));
        let b = Expr::line(Expr::point(5.0, 1.0), Expr::point(5.0, 2.0));
        let expr = Expr::Intersect {
            a: Box::new(a),
            b: Box::new(b),
            nth: 1,
            fallback: IntersectionFallback::StartPoint,
        };
        assert_eq!(eval(&expr).unwrap().values, vec![0.0, 0.0]);
    }

    #[test]
    fn reflect_across_zero_length_line_fails_early() {
        let axis = Expr::line(Expr::point(1.0, 1.0), Expr::point(1.0, 1.0));
        assert_eq!(
            eval(&Expr::reflect(Expr::point(0.0, 0.0), axis)),
            Err(ExpressionErrorKind::Degenerate(GeometryError::ZeroLengthLine))
        );
    }

    #[test]
    fn transform_keeps_source_and_params() {
        let out = eval(&Expr::translate(Expr::point(1.0, 1.0), 2.0, 0.0)).unwrap();
        assert_eq!(out.name, "translate");
        assert_eq!(out.values, vec![3.0, 1.0]);
        let Drawable::Transform { source, .. } = out.drawable else {
            panic!("expected transform drawable");
        };
        assert_eq!(source, Primitive::Point(dvec2(1.0, 1.0)));
    }

    #[test]
    fn interpolate_ratio_is_validated() {
        let expr = Expr::Interpolate {
            a: Box::new(Expr::point(0.0, 0.0)),
            b: Box::new(Expr::point(2.0, 2.0)),
            ratio: Box::new(Expr::num(1.5)),
        };
        assert_eq!(eval(&expr), Err(ExpressionErrorKind::RatioOutOfRange { value: 1.5 }));
    }

    #[test]
    fn arithmetic_and_functions() {
        let expr = Expr::binary(
            BinaryOp::Add,
            Expr::Call("sin".into(), vec![Expr::num(90.0)]),
            Expr::Call("max".into(), vec![Expr::num(1.0), Expr::num(4.0), Expr::num(2.0)]),
        );
        assert_eq!(eval(&expr).unwrap().as_number(), Some(5.0));
        assert_eq!(
            eval(&Expr::binary(BinaryOp::Div, Expr::num(1.0), Expr::num(0.0))),
            Err(ExpressionErrorKind::DivisionByZero)
        );
        assert!(matches!(
            eval(&Expr::Call("sqrt".into(), vec![])),
            Err(ExpressionErrorKind::WrongArity { expected: 1, found: 0, .. })
        ));
        assert!(matches!(
            eval(&Expr::Call("frobnicate".into(), vec![])),
            Err(ExpressionErrorKind::UnknownFunction { .. })
        ));
    }

    #[test]
    fn point_arithmetic() {
        let sum = Expr::binary(BinaryOp::Add, Expr::point(1.0, 2.0), Expr::point(3.0, 4.0));
        assert_eq!(eval(&sum).unwrap().values, vec![4.0, 6.0]);
        let scaled = Expr::binary(BinaryOp::Mul, Expr::num(2.0), Expr::point(1.0, 2.0));
        assert_eq!(eval(&scaled).unwrap().values, vec![2.0, 4.0]);
    }

    #[test]
    fn mid_of_line_and_points() {
        let line = Expr::line(Expr::point(0.0, 0.0), Expr::point(4.0, 2.0));
        assert_eq!(eval(&Expr::Mid(Box::new(line), None)).unwrap().values, vec![2.0, 1.0]);
        let mid = Expr::Mid(Box::new(Expr::point(0.0, 0.0)), Some(Box::new(Expr::point(2.0, 0.0))));
        assert_eq!(eval(&mid).unwrap().values, vec![1.0, 0.0]);
    }

    #[test]
    fn item_picks_vertex() {
        let tri = Expr::polygon([(0.0, 0.0), (3.0, 0.0), (0.0, 4.0)]);
        let item = Expr::Item {
            target: Box::new(tri.clone()),
            index: 2,
        };
        assert_eq!(eval(&item).unwrap().values, vec![3.0, 0.0]);
        let bad = Expr::Item {
            target: Box::new(tri),
            index: 4,
        };
        assert_eq!(eval(&bad), Err(ExpressionErrorKind::IndexOutOfRange { index: 4, len: 3 }));
    }

    #[test]
    fn fill_union_of_squares() {
        let expr = Expr::Fill {
            op: BooleanOp::Union,
            shapes: vec![
                Expr::polygon([(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]),
                Expr::polygon([(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]),
            ],
        };
        let out = eval(&expr).unwrap();
        let Drawable::Fill { region: Primitive::Group(group), .. } = &out.drawable else {
            panic!("expected fill region");
        };
        assert_eq!(group.len(), 1);
        // 8 vertices plus the closing point
        assert_eq!(out.values.len(), 18);
    }

    #[test]
    fn fill_rejects_open_shapes() {
        let expr = Expr::Fill {
            op: BooleanOp::Union,
            shapes: vec![Expr::line(Expr::point(0.0, 0.0), Expr::point(1.0, 1.0))],
        };
        assert!(matches!(eval(&expr), Err(ExpressionErrorKind::TypeMismatch { expected: "closed shape", .. })));
    }

    #[test]
    fn effects_always_execute() {
        let expr = Expr::Effect {
            kind: EffectKind::Fade,
            target: Box::new(Expr::point(1.0, 1.0)),
        };
        let out = eval(&expr).unwrap();
        assert!(out.always_execute());
        assert_eq!(out.name, "fade");
    }

    #[test]
    fn statement_binding_and_label() {
        let mut ctx = ExpressionContext::new();
        let config = EngineConfig::default();
        let stmt = Statement::new(1, Expr::point(1.0, 1.0)).bind("A").labeled("A");
        let out = resolve_statement(&mut ctx, &config, &stmt).unwrap();
        assert_eq!(out.label.as_deref(), Some("A"));
        assert!(ctx.contains("A"));

        let bad = Statement::new(2, Expr::var("missing"));
        let err = resolve_statement(&mut ctx, &config, &bad).unwrap_err();
        assert_eq!(err.expression_id, crate::types::ExprId(2));
    }
}
