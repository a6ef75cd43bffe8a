//! Which shape kinds each transform family accepts.
//!
//! One function per family, each an exhaustive match over [`ShapeKind`], so
//! a new shape kind does not compile until every family has decided on it.

use super::handler::{
    ArcHandler, GroupHandler, Handler, LineHandler, PointHandler, PointPairSetHandler, PolygonHandler,
    SplineHandler,
};
use super::TransformFamily;
use crate::errors::UnsupportedShapeError;
use crate::geom::ShapeKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandlerRegistry {
    family: TransformFamily,
}

impl HandlerRegistry {
    pub fn for_family(family: TransformFamily) -> Self {
        Self { family }
    }

    pub fn family(&self) -> TransformFamily {
        self.family
    }

    pub fn lookup(&self, kind: ShapeKind) -> Result<Handler, UnsupportedShapeError> {
        let found = match self.family {
            TransformFamily::Translate => translate_handler(kind),
            TransformFamily::Rotate => rotate_handler(kind),
            TransformFamily::Reflect => reflect_handler(kind),
            TransformFamily::Dilate => dilate_handler(kind),
            TransformFamily::Project => project_handler(kind),
        };
        found.ok_or(UnsupportedShapeError {
            family: self.family,
            kind,
        })
    }

    pub fn supports(&self, kind: ShapeKind) -> bool {
        self.lookup(kind).is_ok()
    }
}

fn translate_handler(kind: ShapeKind) -> Option<Handler> {
    Some(match kind {
        ShapeKind::Point => PointHandler.into(),
        ShapeKind::Line => LineHandler.into(),
        ShapeKind::Arc => ArcHandler.into(),
        ShapeKind::Polygon => PolygonHandler.into(),
        ShapeKind::Spline => SplineHandler.into(),
        ShapeKind::PointPairSet => PointPairSetHandler.into(),
        ShapeKind::Group => GroupHandler.into(),
    })
}

fn rotate_handler(kind: ShapeKind) -> Option<Handler> {
    Some(match kind {
        ShapeKind::Point => PointHandler.into(),
        ShapeKind::Line => LineHandler.into(),
        ShapeKind::Arc => ArcHandler.into(),
        ShapeKind::Polygon => PolygonHandler.into(),
        ShapeKind::Spline => SplineHandler.into(),
        ShapeKind::PointPairSet => PointPairSetHandler.into(),
        ShapeKind::Group => GroupHandler.into(),
    })
}

fn reflect_handler(kind: ShapeKind) -> Option<Handler> {
    Some(match kind {
        ShapeKind::Point => PointHandler.into(),
        ShapeKind::Line => LineHandler.into(),
        ShapeKind::Arc => ArcHandler.into(),
        ShapeKind::Polygon => PolygonHandler.into(),
        ShapeKind::Spline => SplineHandler.into(),
        ShapeKind::PointPairSet => PointPairSetHandler.into(),
        ShapeKind::Group => GroupHandler.into(),
    })
}

fn dilate_handler(kind: ShapeKind) -> Option<Handler> {
    Some(match kind {
        ShapeKind::Point => PointHandler.into(),
        ShapeKind::Line => LineHandler.into(),
        ShapeKind::Arc => ArcHandler.into(),
        ShapeKind::Polygon => PolygonHandler.into(),
        ShapeKind::Spline => SplineHandler.into(),
        ShapeKind::PointPairSet => PointPairSetHandler.into(),
        ShapeKind::Group => GroupHandler.into(),
    })
}

/// A projected circle is no longer a circle; arcs (and groups, which may
/// hold arcs) are not projected.
fn project_handler(kind: ShapeKind) -> Option<Handler> {
    match kind {
        ShapeKind::Point => Some(PointHandler.into()),
        ShapeKind::Line => Some(LineHandler.into()),
        ShapeKind::Polygon => Some(PolygonHandler.into()),
        ShapeKind::Spline => Some(SplineHandler.into()),
        ShapeKind::PointPairSet => Some(PointPairSetHandler.into()),
        ShapeKind::Arc | ShapeKind::Group => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::ShapeHandler;

    #[test]
    fn every_family_maps_kinds_to_matching_handlers() {
        for family in TransformFamily::ALL {
            let registry = HandlerRegistry::for_family(family);
            for kind in ShapeKind::ALL {
                if let Ok(handler) = registry.lookup(kind) {
                    assert_eq!(handler.kind(), kind, "{family} / {kind}");
                }
            }
        }
    }

    #[test]
    fn project_rejects_arcs() {
        let registry = HandlerRegistry::for_family(TransformFamily::Project);
        assert_eq!(
            registry.lookup(ShapeKind::Arc),
            Err(UnsupportedShapeError {
                family: TransformFamily::Project,
                kind: ShapeKind::Arc,
            })
        );
        assert!(registry.supports(ShapeKind::Line));
    }

    #[test]
    fn rotate_supports_everything() {
        let registry = HandlerRegistry::for_family(TransformFamily::Rotate);
        assert!(ShapeKind::ALL.iter().all(|k| registry.supports(*k)));
    }
}
