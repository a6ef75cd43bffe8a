//! Ramer–Douglas–Peucker polyline simplification.

use crate::log::debug;
use crate::types::Point;

/// Simplify `points`, keeping every point farther than `epsilon` from the
/// chord of the range it splits. Endpoints are always kept.
pub fn simplify(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let epsilon = epsilon.max(0.0);
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;
    rdp_recursive(points, epsilon, 0, points.len() - 1, &mut keep);

    points
        .iter()
        .zip(&keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

fn rdp_recursive(points: &[Point], epsilon: f64, start: usize, end: usize, keep: &mut [bool]) {
    if end <= start + 1 {
        return;
    }
    let (a, b) = (points[start], points[end]);
    let mut max_idx = start;
    let mut max_distance = -1.0;
    for (i, p) in points.iter().enumerate().take(end).skip(start + 1) {
        let d = point_segment_distance(*p, a, b);
        // strict comparison keeps the first farthest point, which makes
        // repeated simplification stable
        if d > max_distance {
            max_distance = d;
            max_idx = i;
        }
    }
    if max_distance > epsilon {
        keep[max_idx] = true;
        rdp_recursive(points, epsilon, start, max_idx, keep);
        rdp_recursive(points, epsilon, max_idx, end, keep);
    }
}

fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= 1e-12 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Simplify only when the raw coordinate count (two per point) exceeds
/// `threshold`.
pub fn simplify_if_needed(points: Vec<Point>, threshold: usize, epsilon: f64) -> Vec<Point> {
    if points.len() * 2 <= threshold {
        return points;
    }
    let simplified = simplify(&points, epsilon);
    debug!(input = points.len(), output = simplified.len(), "simplified polyline");
    simplified
}
