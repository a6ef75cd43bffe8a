//! Point maps behind the five transforms.
//!
//! Translate, rotate, dilate, reflect and project are all affine, and so is
//! the partial ("ratio") version of each. Building them here keeps every
//! primitive's transform a single `map` over its points.

use glam::{DAffine2, DMat2};

use crate::defaults::GEOMETRY_EPSILON;
use crate::errors::GeometryError;
use crate::types::{Degrees, Point, Ratio};

pub fn translation(delta: Point) -> DAffine2 {
    DAffine2::from_translation(delta)
}

/// Counter-clockwise rotation about `about`.
pub fn rotation(angle: Degrees, about: Point) -> DAffine2 {
    DAffine2::from_translation(about)
        * DAffine2::from_angle(angle.to_radians())
        * DAffine2::from_translation(-about)
}

pub fn dilation(scale: f64, about: Point) -> DAffine2 {
    DAffine2::from_translation(about)
        * DAffine2::from_scale(Point::splat(scale))
        * DAffine2::from_translation(-about)
}

fn axis_direction(p1: Point, p2: Point) -> Result<Point, GeometryError> {
    let d = p2 - p1;
    if !d.is_finite() {
        return Err(GeometryError::NonFinite);
    }
    if d.length() <= GEOMETRY_EPSILON {
        return Err(GeometryError::ZeroLengthLine);
    }
    Ok(d / d.length())
}

/// Map fixing every point of the line through `p1`, `p2`.
fn about_line(matrix: DMat2, p1: Point) -> DAffine2 {
    DAffine2::from_mat2_translation(matrix, p1 - matrix * p1)
}

/// Blend between the identity (`ratio = 0`) and `full` (`ratio = 1`).
pub fn partial(full: DAffine2, ratio: Ratio) -> DAffine2 {
    let r = ratio.raw();
    let matrix = DMat2::IDENTITY + (full.matrix2 - DMat2::IDENTITY) * r;
    DAffine2::from_mat2_translation(matrix, full.translation * r)
}

/// Mirror across the line through `p1` and `p2`, blended by `ratio`.
pub fn reflection(p1: Point, p2: Point, ratio: Ratio) -> Result<DAffine2, GeometryError> {
    let d = axis_direction(p1, p2)?;
    let matrix = DMat2::from_cols(
        Point::new(2.0 * d.x * d.x - 1.0, 2.0 * d.x * d.y),
        Point::new(2.0 * d.x * d.y, 2.0 * d.y * d.y - 1.0),
    );
    Ok(partial(about_line(matrix, p1), ratio))
}

/// Foot of the perpendicular onto the line through `p1` and `p2`, blended by `ratio`.
pub fn projection(p1: Point, p2: Point, ratio: Ratio) -> Result<DAffine2, GeometryError> {
    let d = axis_direction(p1, p2)?;
    let matrix = DMat2::from_cols(
        Point::new(d.x * d.x, d.x * d.y),
        Point::new(d.x * d.y, d.y * d.y),
    );
    Ok(partial(about_line(matrix, p1), ratio))
}

/// A map that sends circles to circles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Similarity {
    pub scale: f64,
    /// Angle the x axis is turned to.
    pub angle: Degrees,
    pub mirrored: bool,
}

/// Decompose `map` if it is a similarity (uniform scale, optional mirror).
pub fn as_similarity(map: &DAffine2) -> Option<Similarity> {
    let a = map.matrix2.x_axis;
    let b = map.matrix2.y_axis;
    let tolerance = 1e-9 * (1.0 + a.length().max(b.length()));
    if a.dot(b).abs() > tolerance || (a.length() - b.length()).abs() > tolerance {
        return None;
    }
    Some(Similarity {
        scale: a.length(),
        angle: Degrees::from_radians(a.y.atan2(a.x)),
        mirrored: map.matrix2.determinant() < 0.0,
    })
}
