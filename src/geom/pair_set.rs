use glam::DAffine2;

use crate::errors::GeometryError;
use crate::types::Point;

/// Disjoint segments drawn as one shape (the dashes of a dashed line).
#[derive(Clone, Debug, PartialEq, Default)]
pub struct PointPairSet {
    pub pairs: Vec<(Point, Point)>,
}

impl PointPairSet {
    pub fn new(pairs: Vec<(Point, Point)>) -> Self {
        Self { pairs }
    }

    /// How many dashes [`dashed`](Self::dashed) makes for a segment of
    /// `length`. Kept as a float so callers can bound it before allocating.
    pub fn dash_count(length: f64, on: f64, off: f64) -> f64 {
        (length / (on + off.max(0.0))).ceil()
    }

    /// Split `start → end` into dashes of length `on` separated by gaps of
    /// length `off`. The final dash is clipped to the segment.
    pub fn dashed(start: Point, end: Point, on: f64, off: f64) -> Result<Self, GeometryError> {
        let length = start.distance(end);
        if !length.is_finite() || !on.is_finite() || !off.is_finite() {
            return Err(GeometryError::NonFinite);
        }
        if on <= 0.0 {
            return Err(GeometryError::EmptyShape);
        }
        if length == 0.0 {
            return Err(GeometryError::ZeroLengthLine);
        }
        let dir = (end - start) / length;
        let period = on + off.max(0.0);
        let count = Self::dash_count(length, on, off) as usize;
        let pairs = (0..count)
            .map(|i| i as f64 * period)
            .filter(|at| *at < length)
            .map(|at| (start + dir * at, start + dir * (at + on).min(length)))
            .collect();
        Ok(Self { pairs })
    }

    pub fn map(&self, map: &DAffine2) -> Self {
        Self {
            pairs: self
                .pairs
                .iter()
                .map(|(a, b)| (map.transform_point2(*a), map.transform_point2(*b)))
                .collect(),
        }
    }

    pub fn points(&self) -> Vec<Point> {
        self.pairs.iter().flat_map(|(a, b)| [*a, *b]).collect()
    }

    pub fn atomic_values(&self) -> Vec<f64> {
        self.pairs
            .iter()
            .flat_map(|(a, b)| [a.x, a.y, b.x, b.y])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    #[test]
    fn dashes_cover_segment() {
        let set = PointPairSet::dashed(dvec2(0.0, 0.0), dvec2(5.0, 0.0), 1.0, 1.0).unwrap();
        assert_eq!(
            set.pairs,
            vec![
                (dvec2(0.0, 0.0), dvec2(1.0, 0.0)),
                (dvec2(2.0, 0.0), dvec2(3.0, 0.0)),
                (dvec2(4.0, 0.0), dvec2(5.0, 0.0)),
            ]
        );
    }

    #[test]
    fn last_dash_is_clipped() {
        let set = PointPairSet::dashed(dvec2(0.0, 0.0), dvec2(0.0, 2.5), 1.0, 0.5).unwrap();
        assert_eq!(set.pairs.len(), 2);
        assert_eq!(set.pairs[1], (dvec2(0.0, 1.5), dvec2(0.0, 2.5)));
    }

    #[test]
    fn dash_count_matches_generated_pairs() {
        let set = PointPairSet::dashed(dvec2(0.0, 0.0), dvec2(4.0, 0.0), 1.0, 1.0).unwrap();
        assert_eq!(set.pairs.len(), 2);
        assert_eq!(PointPairSet::dash_count(4.0, 1.0, 1.0), 2.0);
    }

    #[test]
    fn zero_length_dash_is_rejected() {
        let err = PointPairSet::dashed(dvec2(0.0, 0.0), dvec2(1.0, 0.0), 0.0, 1.0);
        assert_eq!(err, Err(GeometryError::EmptyShape));
    }
}
