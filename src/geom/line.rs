use glam::DAffine2;

use crate::types::{Point, Ratio};

/// A straight segment. When `extended`, intersection tests treat it as the
/// infinite line through both endpoints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment {
    pub start: Point,
    pub end: Point,
    pub extended: bool,
}

impl LineSegment {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            extended: false,
        }
    }

    pub fn extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    pub fn midpoint(&self) -> Point {
        (self.start + self.end) * 0.5
    }

    /// Point reached after drawing `ratio` of the segment
    pub fn point_at(&self, ratio: Ratio) -> Point {
        ratio.lerp(self.start, self.end)
    }

    pub fn map(&self, map: &DAffine2) -> Self {
        Self {
            start: map.transform_point2(self.start),
            end: map.transform_point2(self.end),
            extended: self.extended,
        }
    }

    pub fn atomic_values(&self) -> Vec<f64> {
        vec![self.start.x, self.start.y, self.end.x, self.end.y]
    }
}
