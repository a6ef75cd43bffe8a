use glam::DAffine2;

use crate::types::{Point, Ratio};

/// An open curve through its control points, drawn as a polyline.
#[derive(Clone, Debug, PartialEq)]
pub struct Spline {
    pub points: Vec<Point>,
}

impl Spline {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// Leading portion of the curve covering `ratio` of its arc length.
    pub fn partial(&self, ratio: Ratio) -> Vec<Point> {
        partial_polyline(&self.points, ratio)
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

/// Cut a polyline after `ratio` of its total length.
pub fn partial_polyline(points: &[Point], ratio: Ratio) -> Vec<Point> {
    let total: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    if ratio.is_complete() || total <= 0.0 {
        return points.to_vec();
    }
    let mut remaining = total * ratio.raw();
    let mut out = vec![first];
    for w in points.windows(2) {
        let len = w[0].distance(w[1]);
        if len >= remaining {
            if len > 0.0 {
                out.push(w[0] + (w[1] - w[0]) * (remaining / len));
            }
            return out;
        }
        remaining -= len;
        out.push(w[1]);
    }
    out
}

/// Evaluate `c0 + c1*t + c2*t^2 + ...` with Horner's scheme.
pub fn polynomial(coeffs: &[f64], t: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * t + c)
}

/// Sample the curve `(x(t), y(t))` at `samples` evenly spaced parameters.
pub fn sample_parametric(x_coeffs: &[f64], y_coeffs: &[f64], t0: f64, t1: f64, samples: usize) -> Vec<Point> {
    let samples = samples.max(2);
    (0..samples)
        .map(|i| {
            let t = t0 + (t1 - t0) * i as f64 / (samples - 1) as f64;
            Point::new(polynomial(x_coeffs, t), polynomial(y_coeffs, t))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    #[test]
    fn horner_evaluates_polynomial() {
        // 1 + 2t + 3t^2 at t = 2
        assert_eq!(polynomial(&[1.0, 2.0, 3.0], 2.0), 17.0);
        assert_eq!(polynomial(&[], 5.0), 0.0);
    }

    #[test]
    fn parametric_parabola() {
        let points = sample_parametric(&[0.0, 1.0], &[0.0, 0.0, 1.0], -1.0, 1.0, 3);
        assert_eq!(points, vec![dvec2(-1.0, 1.0), dvec2(0.0, 0.0), dvec2(1.0, 1.0)]);
    }

    #[test]
    fn partial_polyline_stops_mid_segment() {
        let points = [dvec2(0.0, 0.0), dvec2(2.0, 0.0), dvec2(2.0, 2.0)];
        let half = partial_polyline(&points, Ratio::try_new(0.75).unwrap());
        assert_eq!(half, vec![dvec2(0.0, 0.0), dvec2(2.0, 0.0), dvec2(2.0, 1.0)]);
    }
}
