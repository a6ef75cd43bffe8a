//! Transform families and their resolved parameters.
//!
//! A transform expression resolves to [`TransformParams`]. The handler for
//! the target's [`ShapeKind`](crate::geom::ShapeKind) (see [`registry`])
//! turns those into preview strokes, committed geometry and 2D exports.

use std::fmt;

use glam::DAffine2;

use crate::backend::{Tool, ToolKind};
use crate::defaults::OffsetFn;
use crate::errors::GeometryError;
use crate::geom::{Arc, Primitive, affine};
use crate::types::{Degrees, Point, Ratio};

mod handler;
pub mod registry;

pub use handler::{
    ArcHandler, GroupHandler, Handler, LineHandler, PointHandler, PointPairSetHandler, PolygonHandler,
    PreviewSlot, ShapeHandler, SplineHandler, TransformJob,
};
pub use registry::HandlerRegistry;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransformFamily {
    Translate,
    Rotate,
    Reflect,
    Dilate,
    Project,
}

impl TransformFamily {
    pub const ALL: [TransformFamily; 5] = [
        TransformFamily::Translate,
        TransformFamily::Rotate,
        TransformFamily::Reflect,
        TransformFamily::Dilate,
        TransformFamily::Project,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TransformFamily::Translate => "translate",
            TransformFamily::Rotate => "rotate",
            TransformFamily::Reflect => "reflect",
            TransformFamily::Dilate => "dilate",
            TransformFamily::Project => "project",
        }
    }

    /// Instrument that draws the guide strokes
    pub fn tool(self) -> ToolKind {
        match self {
            TransformFamily::Translate | TransformFamily::Dilate => ToolKind::Ruler,
            TransformFamily::Rotate => ToolKind::Protractor,
            TransformFamily::Reflect | TransformFamily::Project => ToolKind::SetSquare,
        }
    }
}

impl fmt::Display for TransformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fully resolved transform parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformParams {
    Translate { delta: Point },
    Rotate { angle: Degrees, about: Point },
    /// Mirror across `p1 → p2`; `ratio` blends from the source
    Reflect { p1: Point, p2: Point, ratio: Ratio },
    Dilate { scale: f64, about: Point },
    Project { p1: Point, p2: Point, ratio: Ratio },
}

impl TransformParams {
    pub fn family(&self) -> TransformFamily {
        match self {
            TransformParams::Translate { .. } => TransformFamily::Translate,
            TransformParams::Rotate { .. } => TransformFamily::Rotate,
            TransformParams::Reflect { .. } => TransformFamily::Reflect,
            TransformParams::Dilate { .. } => TransformFamily::Dilate,
            TransformParams::Project { .. } => TransformFamily::Project,
        }
    }

    /// The point map after `progress` of the animation.
    pub fn map_at(&self, progress: Ratio) -> Result<DAffine2, GeometryError> {
        let r = progress.raw();
        Ok(match *self {
            TransformParams::Translate { delta } => affine::translation(delta * r),
            TransformParams::Rotate { angle, about } => affine::rotation(angle.scale(r), about),
            TransformParams::Dilate { scale, about } => affine::dilation(1.0 + (scale - 1.0) * r, about),
            TransformParams::Reflect { p1, p2, ratio } => affine::reflection(p1, p2, ratio.of(progress))?,
            TransformParams::Project { p1, p2, ratio } => affine::projection(p1, p2, ratio.of(progress))?,
        })
    }

    /// Transform `shape` as it looks after `progress` of the animation.
    pub fn apply(&self, shape: &Primitive, progress: Ratio) -> Result<Primitive, GeometryError> {
        let out = shape.map(&self.map_at(progress)?);
        if out.is_finite() {
            Ok(out)
        } else {
            Err(GeometryError::NonFinite)
        }
    }

    /// Stroke the path `from` travels under this transform. The guide is
    /// built in sheet coordinates and every emitted point goes through
    /// `offset`.
    pub fn trace_guide(
        &self,
        from: Point,
        offset: OffsetFn,
        tool: &mut dyn Tool,
        progress: Ratio,
    ) -> Result<(), GeometryError> {
        let target = self.map_at(Ratio::ONE)?.transform_point2(from);
        match *self {
            TransformParams::Rotate { angle, about } => {
                let radius = from.distance(about);
                if radius > 0.0 {
                    let d = from - about;
                    let start = Degrees::from_radians(d.y.atan2(d.x));
                    let arc = Arc::new(about, radius, start, start + angle);
                    tool.draw_arc(
                        &Arc {
                            center: offset(arc.center),
                            ..arc
                        },
                        progress,
                    );
                }
            }
            TransformParams::Dilate { about, .. } => tool.draw_line(offset(about), offset(target), progress),
            _ => tool.draw_line(offset(from), offset(target), progress),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    #[test]
    fn half_rotation_is_half_angle() {
        let params = TransformParams::Rotate {
            angle: Degrees(90.0),
            about: dvec2(0.0, 0.0),
        };
        let half = Ratio::try_new(0.5).unwrap();
        let out = params.apply(&Primitive::Point(dvec2(1.0, 0.0)), half).unwrap();
        let Primitive::Point(p) = out else { panic!("expected point") };
        let s = 0.5f64.sqrt();
        assert!((p - dvec2(s, s)).length() < 1e-9);
    }

    #[test]
    fn dilate_at_zero_progress_is_identity() {
        let params = TransformParams::Dilate {
            scale: 3.0,
            about: dvec2(1.0, 1.0),
        };
        let shape = Primitive::Point(dvec2(2.0, 5.0));
        assert_eq!(params.apply(&shape, Ratio::ZERO).unwrap(), shape);
    }

    #[test]
    fn reflect_ratio_scales_with_progress() {
        let params = TransformParams::Reflect {
            p1: dvec2(0.0, 0.0),
            p2: dvec2(1.0, 0.0),
            ratio: Ratio::try_new(0.5).unwrap(),
        };
        let out = params.apply(&Primitive::Point(dvec2(0.0, 2.0)), Ratio::ONE).unwrap();
        assert_eq!(out, Primitive::Point(dvec2(0.0, 0.0)));
    }

    #[test]
    fn families_pick_tools() {
        assert_eq!(TransformFamily::Rotate.tool(), ToolKind::Protractor);
        assert_eq!(TransformFamily::Project.tool(), ToolKind::SetSquare);
        assert_eq!(TransformFamily::Translate.to_string(), "translate");
    }
}
