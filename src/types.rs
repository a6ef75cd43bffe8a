//! Validated numeric primitives shared by the geometry and expression layers.
//!
//! - Coordinates are plain `glam::DVec2` (aliased as [`Point`])
//! - Angles and animation ratios are newtypes that reject bad input on construction

use std::fmt;
use std::ops::{Add, Neg, Sub};

use glam::DVec2;

/// A point (or displacement) on the sheet.
pub type Point = DVec2;

/// Error type for invalid numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
    /// Value is negative when non-negative required
    Negative,
    /// Value falls outside the accepted range
    OutOfRange,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
            NumericError::Negative => write!(f, "value is negative"),
            NumericError::OutOfRange => write!(f, "value is out of range"),
        }
    }
}

impl std::error::Error for NumericError {}

/// Reject NaN and infinities.
#[inline]
pub fn finite(val: f64) -> Result<f64, NumericError> {
    if val.is_nan() {
        Err(NumericError::NaN)
    } else if val.is_infinite() {
        Err(NumericError::Infinite)
    } else {
        Ok(val)
    }
}

/// Reject NaN, infinities and negative values.
#[inline]
pub fn non_negative(val: f64) -> Result<f64, NumericError> {
    let val = finite(val)?;
    if val < 0.0 {
        Err(NumericError::Negative)
    } else {
        Ok(val)
    }
}

/// Identity of a top-level expression in a program.
///
/// Stable across re-evaluations: the editor hands the same id back for the
/// same source statement, which is what lets evaluation passes be diffed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExprId(pub u32);

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Angle in degrees. Positive is counter-clockwise.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
#[repr(transparent)]
pub struct Degrees(pub f64);

impl Degrees {
    pub const ZERO: Degrees = Degrees(0.0);

    /// Create an angle with validation (rejects NaN/infinite)
    #[inline]
    pub fn try_new(val: f64) -> Result<Degrees, NumericError> {
        finite(val).map(Degrees)
    }

    #[inline]
    pub fn raw(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn to_radians(self) -> f64 {
        self.0.to_radians()
    }

    #[inline]
    pub fn from_radians(rad: f64) -> Degrees {
        Degrees(rad.to_degrees())
    }

    /// Scale the angle, e.g. by an animation ratio
    #[inline]
    pub fn scale(self, factor: f64) -> Degrees {
        Degrees(self.0 * factor)
    }
}

impl Add for Degrees {
    type Output = Degrees;
    fn add(self, rhs: Degrees) -> Degrees { Degrees(self.0 + rhs.0) }
}
impl Sub for Degrees {
    type Output = Degrees;
    fn sub(self, rhs: Degrees) -> Degrees { Degrees(self.0 - rhs.0) }
}
impl Neg for Degrees {
    type Output = Degrees;
    fn neg(self) -> Degrees { Degrees(-self.0) }
}

impl fmt::Display for Degrees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// Progress or interpolation parameter in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct Ratio(f64);

impl Ratio {
    pub const ZERO: Ratio = Ratio(0.0);
    pub const ONE: Ratio = Ratio(1.0);

    /// Create a ratio with validation (rejects NaN/infinite and values outside `[0, 1]`)
    #[inline]
    pub fn try_new(val: f64) -> Result<Ratio, NumericError> {
        let val = finite(val)?;
        if (0.0..=1.0).contains(&val) {
            Ok(Ratio(val))
        } else {
            Err(NumericError::OutOfRange)
        }
    }

    /// Clamp any finite value into range; NaN maps to zero.
    #[inline]
    pub fn clamped(val: f64) -> Ratio {
        if val.is_nan() {
            Ratio::ZERO
        } else {
            Ratio(val.clamp(0.0, 1.0))
        }
    }

    #[inline]
    pub fn raw(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_complete(self) -> bool {
        self.0 >= 1.0
    }

    /// Product of two ratios, still in range.
    #[inline]
    pub fn of(self, other: Ratio) -> Ratio {
        Ratio(self.0 * other.0)
    }

    /// Linear interpolation between two points
    #[inline]
    pub fn lerp(self, from: Point, to: Point) -> Point {
        from + (to - from) * self.0
    }

    #[inline]
    pub fn lerp_f64(self, from: f64, to: f64) -> f64 {
        from + (to - from) * self.0
    }
}

impl Default for Ratio {
    fn default() -> Self {
        Ratio::ONE
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Round a coordinate for stable textual output (recorded call logs).
pub fn display_num(val: f64) -> f64 {
    let rounded = (val * 1000.0).round() / 1000.0;
    // avoid printing "-0"
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Format a point as `(x, y)` with [`display_num`] rounding.
pub fn display_point(p: Point) -> String {
    format!("({}, {})", display_num(p.x), display_num(p.y))
}
