//! Circles and circular arcs.
//!
//! An arc sweeps counter-clockwise from `from` to `to`; a sweep of 360° or
//! more is a full circle.

use glam::DAffine2;

use super::affine::as_similarity;
use super::{Primitive, Spline};
use crate::types::{Degrees, Point, Ratio};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arc {
    pub center: Point,
    pub radius: f64,
    pub from: Degrees,
    pub to: Degrees,
}

impl Arc {
    pub fn new(center: Point, radius: f64, from: Degrees, to: Degrees) -> Self {
        Self {
            center,
            radius,
            from,
            to,
        }
    }

    pub fn circle(center: Point, radius: f64) -> Self {
        Self::new(center, radius, Degrees::ZERO, Degrees(360.0))
    }

    pub fn sweep(&self) -> Degrees {
        self.to - self.from
    }

    pub fn is_full_circle(&self) -> bool {
        self.sweep().raw().abs() >= 360.0
    }

    pub fn point_at_angle(&self, angle: Degrees) -> Point {
        let (sin, cos) = angle.to_radians().sin_cos();
        self.center + Point::new(cos, sin) * self.radius
    }

    pub fn start_point(&self) -> Point {
        self.point_at_angle(self.from)
    }

    pub fn end_point(&self) -> Point {
        self.point_at_angle(self.to)
    }

    /// The part of the arc a compass has drawn after `ratio` of the sweep
    pub fn partial(&self, ratio: Ratio) -> Arc {
        Arc {
            to: self.from + self.sweep().scale(ratio.raw()),
            ..*self
        }
    }

    /// Whether `angle` lies within the swept range.
    pub fn contains_angle(&self, angle: Degrees) -> bool {
        if self.is_full_circle() {
            return true;
        }
        let (lo, hi) = if self.from.raw() <= self.to.raw() {
            (self.from.raw(), self.to.raw())
        } else {
            (self.to.raw(), self.from.raw())
        };
        let offset = (angle.raw() - lo).rem_euclid(360.0);
        offset <= hi - lo + 1e-9 || offset >= 360.0 - 1e-9
    }

    /// Sample the arc every `step` degrees, always including both ends.
    pub fn sample(&self, step: f64) -> Vec<Point> {
        let sweep = self.sweep().raw();
        let step = if step > 0.0 { step } else { 1.0 };
        let segments = ((sweep.abs() / step).ceil() as usize).max(1);
        (0..=segments)
            .map(|i| {
                let t = i as f64 / segments as f64;
                self.point_at_angle(self.from + Degrees(sweep * t))
            })
            .collect()
    }

    /// Apply a point map. Circles survive similarities; anything that
    /// squashes the circle is flattened into a spline.
    pub fn map(&self, map: &DAffine2, step: f64) -> Primitive {
        match as_similarity(map) {
            Some(sim) => {
                let center = map.transform_point2(self.center);
                let radius = self.radius * sim.scale;
                let (from, to) = if sim.mirrored {
                    (sim.angle - self.to, sim.angle - self.from)
                } else {
                    (self.from + sim.angle, self.to + sim.angle)
                };
                Primitive::Arc(Arc::new(center, radius, from, to))
            }
            None => Primitive::Spline(Spline::new(
                self.sample(step)
                    .into_iter()
                    .map(|p| map.transform_point2(p))
                    .collect(),
            )),
        }
    }

    pub fn atomic_values(&self) -> Vec<f64> {
        vec![
            self.center.x,
            self.center.y,
            self.radius,
            self.from.raw(),
            self.to.raw(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::affine;
    use glam::dvec2;

    #[test]
    fn contains_angle_handles_wraparound() {
        let arc = Arc::new(dvec2(0.0, 0.0), 1.0, Degrees(300.0), Degrees(420.0));
        assert!(arc.contains_angle(Degrees(10.0)));
        assert!(arc.contains_angle(Degrees(330.0)));
        assert!(!arc.contains_angle(Degrees(180.0)));
    }

    #[test]
    fn sample_includes_endpoints() {
        let arc = Arc::new(dvec2(0.0, 0.0), 2.0, Degrees(0.0), Degrees(90.0));
        let points = arc.sample(5.0);
        assert_eq!(points.len(), 19);
        assert!((points[0] - dvec2(2.0, 0.0)).length() < 1e-9);
        assert!((points[18] - dvec2(0.0, 2.0)).length() < 1e-9);
    }

    #[test]
    fn mirrored_arc_keeps_counter_clockwise_sweep() {
        let arc = Arc::new(dvec2(0.0, 1.0), 1.0, Degrees(0.0), Degrees(90.0));
        let mirror = affine::reflection(dvec2(0.0, 0.0), dvec2(1.0, 0.0), Ratio::ONE).unwrap();
        let Primitive::Arc(out) = arc.map(&mirror, 5.0) else {
            panic!("reflection should keep an arc");
        };
        assert!((out.center - dvec2(0.0, -1.0)).length() < 1e-9);
        assert!((out.from.raw() - -90.0).abs() < 1e-9);
        assert!((out.to.raw() - 0.0).abs() < 1e-9);
        // the mirrored start point is the image of the original end point
        assert!((out.start_point() - dvec2(0.0, -2.0)).length() < 1e-9);
    }

    #[test]
    fn projected_arc_flattens_to_spline() {
        let arc = Arc::circle(dvec2(0.0, 0.0), 1.0);
        let squash = affine::projection(dvec2(0.0, 0.0), dvec2(1.0, 0.0), Ratio::ONE).unwrap();
        assert!(matches!(arc.map(&squash, 10.0), Primitive::Spline(_)));
    }
}
