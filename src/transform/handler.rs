//! Per-shape transform handlers.
//!
//! Each handler knows which points of its shape kind carry a guide stroke
//! (the path a vertex travels while the transform animates) and how to
//! preview, commit and export the transformed shape.

use enum_dispatch::enum_dispatch;

use super::TransformParams;
use crate::backend::{ExportSurface, Renderer, RendererHandle, commit_primitive, export_primitive};
use crate::defaults::OffsetFn;
use crate::errors::GeometryError;
use crate::geom::{Primitive, ShapeKind};
use crate::types::{Point, Ratio};

/// A transform to play on one shape.
#[derive(Clone, Debug)]
pub struct TransformJob {
    pub source: Primitive,
    pub params: TransformParams,
    /// Sheet offset applied to everything sent to a backend
    pub offset: OffsetFn,
}

impl TransformJob {
    fn at(&self, progress: Ratio) -> Result<Primitive, GeometryError> {
        Ok(self.params.apply(&self.source, progress)?.map_points(self.offset))
    }
}

/// Transient renderer objects owned by one command's preview.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreviewSlot {
    handles: Vec<RendererHandle>,
}

impl PreviewSlot {
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn replace(&mut self, handles: Vec<RendererHandle>) {
        self.handles = handles;
    }

    /// Remove every transient object from the renderer.
    pub fn release(&mut self, renderer: &mut dyn Renderer) {
        for handle in self.handles.drain(..) {
            renderer.remove_handle(handle);
        }
    }
}

#[enum_dispatch]
pub trait ShapeHandler {
    /// The shape kind this handler serves
    fn kind(&self) -> ShapeKind;

    /// Points whose travel is stroked while the transform animates
    fn guide_points(&self, shape: &Primitive) -> Vec<Point>;

    /// Replace the previous preview with the shape at `ratio`, plus guides.
    fn draw_preview(
        &self,
        job: &TransformJob,
        renderer: &mut dyn Renderer,
        preview: &mut PreviewSlot,
        ratio: Ratio,
    ) -> Result<(), GeometryError> {
        preview.release(renderer);
        let partial = job.at(ratio)?;
        preview.replace(commit_primitive(&partial, renderer));
        let tool = renderer.tool(job.params.family().tool());
        for p in self.guide_points(&job.source) {
            job.params.trace_guide(p, job.offset, tool, ratio)?;
        }
        Ok(())
    }

    /// Clear the preview and commit the final shape.
    fn commit(
        &self,
        job: &TransformJob,
        renderer: &mut dyn Renderer,
        preview: &mut PreviewSlot,
    ) -> Result<Vec<RendererHandle>, GeometryError> {
        let done = job.at(Ratio::ONE)?;
        preview.release(renderer);
        Ok(commit_primitive(&done, renderer))
    }

    /// Commit the final shape without any preview phase.
    fn direct_commit(&self, job: &TransformJob, renderer: &mut dyn Renderer) -> Result<Vec<RendererHandle>, GeometryError> {
        Ok(commit_primitive(&job.at(Ratio::ONE)?, renderer))
    }

    fn draw_on_2d(&self, job: &TransformJob, surface: &mut dyn ExportSurface) -> Result<(), GeometryError> {
        export_primitive(&job.at(Ratio::ONE)?, surface);
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointHandler;

impl ShapeHandler for PointHandler {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Point
    }

    fn guide_points(&self, shape: &Primitive) -> Vec<Point> {
        shape.key_points()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineHandler;

impl ShapeHandler for LineHandler {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Line
    }

    fn guide_points(&self, shape: &Primitive) -> Vec<Point> {
        shape.key_points()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArcHandler;

impl ShapeHandler for ArcHandler {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Arc
    }

    // only the center travels; the rim follows it
    fn guide_points(&self, shape: &Primitive) -> Vec<Point> {
        match shape {
            Primitive::Arc(arc) => vec![arc.center],
            other => other.key_points(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PolygonHandler;

impl ShapeHandler for PolygonHandler {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Polygon
    }

    fn guide_points(&self, shape: &Primitive) -> Vec<Point> {
        shape.key_points()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SplineHandler;

impl ShapeHandler for SplineHandler {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Spline
    }

    /// Splines carry many samples; only the ends get guides.
    fn guide_points(&self, shape: &Primitive) -> Vec<Point> {
        let points = shape.key_points();
        match (points.first(), points.last()) {
            (Some(first), Some(last)) if points.len() > 1 => vec![*first, *last],
            _ => points,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointPairSetHandler;

impl ShapeHandler for PointPairSetHandler {
    fn kind(&self) -> ShapeKind {
        ShapeKind::PointPairSet
    }

    fn guide_points(&self, shape: &Primitive) -> Vec<Point> {
        match shape {
            Primitive::PointPairSet(set) => match (set.pairs.first(), set.pairs.last()) {
                (Some(first), Some(last)) => vec![first.0, last.1],
                _ => Vec::new(),
            },
            other => other.key_points(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GroupHandler;

impl ShapeHandler for GroupHandler {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Group
    }

    /// Each member contributes the guides its own handler would draw.
    fn guide_points(&self, shape: &Primitive) -> Vec<Point> {
        match shape {
            Primitive::Group(group) => group
                .members()
                .flat_map(|m| Handler::for_kind(m.kind()).guide_points(m))
                .collect(),
            other => other.key_points(),
        }
    }
}

/// One handler per shape kind
#[enum_dispatch(ShapeHandler)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handler {
    PointHandler,
    LineHandler,
    ArcHandler,
    PolygonHandler,
    SplineHandler,
    PointPairSetHandler,
    GroupHandler,
}

impl Handler {
    /// The handler that draws shapes of `kind`, regardless of family.
    pub fn for_kind(kind: ShapeKind) -> Handler {
        match kind {
            ShapeKind::Point => PointHandler.into(),
            ShapeKind::Line => LineHandler.into(),
            ShapeKind::Arc => ArcHandler.into(),
            ShapeKind::Polygon => PolygonHandler.into(),
            ShapeKind::Spline => SplineHandler.into(),
            ShapeKind::PointPairSet => PointPairSetHandler.into(),
            ShapeKind::Group => GroupHandler.into(),
        }
    }
}
