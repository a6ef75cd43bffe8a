//! Commands: one per drawable statement, turning a resolved value into
//! incremental renderer calls.
//!
//! A command moves `Idle → Previewing → Committed` and never goes back.
//! Editing the statement builds a fresh command instead of resetting this
//! one.

use std::collections::BTreeSet;
use std::fmt;

use crate::backend::{
    ExportSurface, Renderer, RendererHandle, ToolKind, commit_primitive, export_primitive, trace_primitive,
};
use crate::defaults::{EngineConfig, OffsetFn};
use crate::errors::CommandError;
use crate::expr::{Drawable, EffectKind, Resolved};
use crate::geom::{Group, LineSegment, Primitive, ShapeKind, Spline, partial_polyline};
use crate::log::{debug, trace, warn};
use crate::transform::{Handler, HandlerRegistry, PreviewSlot, ShapeHandler, TransformJob};
use crate::types::{ExprId, Point, Ratio};

mod engine;
mod sequencer;
mod summary;

pub use engine::Engine;
pub use sequencer::{SequenceStep, Sequencer, SequencerState};
pub use summary::CommandSummary;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandState {
    Idle,
    Previewing,
    Committed,
}

impl fmt::Display for CommandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommandState::Idle => "idle",
            CommandState::Previewing => "previewing",
            CommandState::Committed => "committed",
        })
    }
}

/// Instrument that draws a plain shape of `kind`.
pub fn tool_for_kind(kind: ShapeKind) -> ToolKind {
    match kind {
        ShapeKind::Point => ToolKind::Pen,
        ShapeKind::Arc => ToolKind::Compass,
        ShapeKind::Line | ShapeKind::Polygon | ShapeKind::Spline | ShapeKind::PointPairSet | ShapeKind::Group => {
            ToolKind::Ruler
        }
    }
}

/// What playing a command amounts to.
#[derive(Clone, Debug)]
enum Plan {
    Nothing,
    Shape(Primitive),
    Text { text: String, at: Point },
    Transform { handler: Handler, job: TransformJob },
    Effect { kind: EffectKind, target: Primitive },
    Fill(Primitive),
}

impl Plan {
    fn build(drawable: &Drawable, offset: OffsetFn) -> Result<Plan, CommandError> {
        Ok(match drawable {
            Drawable::Nothing => Plan::Nothing,
            Drawable::Shape(shape) => Plan::Shape(shape.clone()),
            Drawable::Text { text, at } => Plan::Text {
                text: text.clone(),
                at: *at,
            },
            Drawable::Transform { source, params, .. } => {
                let handler = HandlerRegistry::for_family(params.family()).lookup(source.kind())?;
                Plan::Transform {
                    handler,
                    job: TransformJob {
                        source: source.clone(),
                        params: *params,
                        offset,
                    },
                }
            }
            Drawable::Effect { kind, target } => Plan::Effect {
                kind: *kind,
                target: target.clone(),
            },
            Drawable::Fill { region, .. } => Plan::Fill(region.clone()),
        })
    }
}

fn tools_for(drawable: &Drawable) -> BTreeSet<ToolKind> {
    match drawable {
        Drawable::Nothing => BTreeSet::new(),
        Drawable::Shape(shape) => BTreeSet::from([tool_for_kind(shape.kind())]),
        Drawable::Transform { params, .. } => BTreeSet::from([params.family().tool()]),
        Drawable::Text { .. } | Drawable::Effect { .. } | Drawable::Fill { .. } => BTreeSet::from([ToolKind::Pen]),
    }
}

/// The first `ratio` of a shape's outline.
fn partial_shape(shape: &Primitive, ratio: Ratio) -> Primitive {
    match shape {
        Primitive::Line(line) => Primitive::Line(LineSegment::new(line.start, line.point_at(ratio))),
        Primitive::Arc(arc) => Primitive::Arc(arc.partial(ratio)),
        Primitive::Polygon(poly) => Primitive::Spline(Spline::new(partial_polyline(poly.points(), ratio))),
        Primitive::Spline(spline) => Primitive::Spline(Spline::new(spline.partial(ratio))),
        Primitive::Group(group) => Primitive::Group(Group::new(group.members().map(|m| partial_shape(m, ratio)))),
        Primitive::Point(_) | Primitive::PointPairSet(_) => shape.clone(),
    }
}

fn fill_rings(region: &Primitive, offset: OffsetFn) -> Vec<Vec<Point>> {
    match region {
        Primitive::Polygon(poly) => vec![poly.points().iter().map(|p| offset(*p)).collect()],
        Primitive::Group(group) => group.members().flat_map(|m| fill_rings(m, offset)).collect(),
        _ => Vec::new(),
    }
}

fn draw_frame(
    plan: &Plan,
    offset: OffsetFn,
    renderer: &mut dyn Renderer,
    preview: &mut PreviewSlot,
    ratio: Ratio,
) -> Result<(), CommandError> {
    match plan {
        Plan::Nothing => {}
        Plan::Shape(shape) => {
            preview.release(renderer);
            preview.replace(commit_primitive(&partial_shape(shape, ratio).map_points(offset), renderer));
            let tool = renderer.tool(tool_for_kind(shape.kind()));
            trace_primitive(&shape.map_points(offset), tool, ratio);
        }
        Plan::Text { at, .. } => renderer.tool(ToolKind::Pen).draw_point(offset(*at), ratio),
        Plan::Transform { handler, job } => handler.draw_preview(job, renderer, preview, ratio)?,
        Plan::Effect { kind, target } => renderer.apply_effect(*kind, &target.map_points(offset), ratio),
        Plan::Fill(region) => trace_primitive(&region.map_points(offset), renderer.tool(ToolKind::Pen), ratio),
    }
    Ok(())
}

fn commit_plan(
    plan: &Plan,
    offset: OffsetFn,
    renderer: &mut dyn Renderer,
    preview: &mut PreviewSlot,
) -> Result<Vec<RendererHandle>, CommandError> {
    if let Plan::Transform { handler, job } = plan {
        return Ok(handler.commit(job, renderer, preview)?);
    }
    preview.release(renderer);
    Ok(match plan {
        Plan::Nothing | Plan::Transform { .. } => Vec::new(),
        Plan::Shape(shape) => commit_primitive(&shape.map_points(offset), renderer),
        Plan::Text { text, at } => vec![renderer.commit_text(text, offset(*at))],
        Plan::Effect { kind, target } => {
            renderer.apply_effect(*kind, &target.map_points(offset), Ratio::ONE);
            Vec::new()
        }
        Plan::Fill(region) => fill_rings(region, offset)
            .iter()
            .map(|ring| renderer.commit_fill(ring))
            .collect(),
    })
}

/// Playback state for one top-level statement.
#[derive(Debug)]
pub struct Command {
    id: ExprId,
    resolved: Resolved,
    tools: BTreeSet<ToolKind>,
    state: CommandState,
    plan: Result<Plan, CommandError>,
    offset: OffsetFn,
    preview: PreviewSlot,
    committed: Vec<RendererHandle>,
    error: Option<CommandError>,
}

impl Command {
    pub fn new(id: ExprId, resolved: Resolved, config: &EngineConfig) -> Self {
        let plan = Plan::build(&resolved.drawable, config.offset);
        if let Err(err) = &plan {
            warn!(%id, error = %err, "command cannot play");
        }
        Self {
            id,
            tools: tools_for(&resolved.drawable),
            resolved,
            state: CommandState::Idle,
            error: plan.as_ref().err().cloned(),
            plan,
            offset: config.offset,
            preview: PreviewSlot::default(),
            committed: Vec::new(),
        }
    }

    pub fn id(&self) -> ExprId {
        self.id
    }

    pub fn state(&self) -> CommandState {
        self.state
    }

    pub fn resolved(&self) -> &Resolved {
        &self.resolved
    }

    /// Instruments this command draws with
    pub fn tools(&self) -> &BTreeSet<ToolKind> {
        &self.tools
    }

    pub fn committed_handles(&self) -> &[RendererHandle] {
        &self.committed
    }

    /// Last failure, including a shape no handler accepts.
    pub fn error(&self) -> Option<&CommandError> {
        self.error.as_ref()
    }

    pub fn is_committed(&self) -> bool {
        self.state == CommandState::Committed
    }

    fn invalid(&self, action: &'static str) -> CommandError {
        CommandError::InvalidState {
            id: self.id,
            action,
            state: self.state,
        }
    }

    fn record<T>(&mut self, result: Result<T, CommandError>) -> Result<T, CommandError> {
        if let Err(err) = &result {
            warn!(id = %self.id, error = %err, "command failed");
            self.error = Some(err.clone());
        }
        result
    }

    /// Reset transient geometry and get ready for `play`.
    pub fn pre_play(&mut self, renderer: &mut dyn Renderer) -> Result<(), CommandError> {
        if self.state == CommandState::Committed {
            return Err(self.invalid("prepare"));
        }
        self.preview.release(renderer);
        self.state = CommandState::Previewing;
        Ok(())
    }

    /// Draw one frame. Below 1 only the preview changes; at 1 the final
    /// geometry is committed, once.
    pub fn play(&mut self, renderer: &mut dyn Renderer, ratio: Ratio) -> Result<(), CommandError> {
        match self.state {
            CommandState::Idle => Err(self.invalid("play")),
            CommandState::Committed => {
                trace!(id = %self.id, "already committed");
                Ok(())
            }
            CommandState::Previewing => {
                let result = self.plan.as_ref().map_err(Clone::clone).and_then(|plan| {
                    if ratio.is_complete() {
                        commit_plan(plan, self.offset, renderer, &mut self.preview).map(Some)
                    } else {
                        draw_frame(plan, self.offset, renderer, &mut self.preview, ratio).map(|()| None)
                    }
                });
                if let Some(handles) = self.record(result)? {
                    debug!(id = %self.id, handles = handles.len(), "commit");
                    self.committed = handles;
                    self.state = CommandState::Committed;
                }
                Ok(())
            }
        }
    }

    /// Release per-frame temporaries.
    pub fn post_play(&mut self, renderer: &mut dyn Renderer) {
        self.preview.release(renderer);
    }

    /// Commit the final geometry straight away, skipping any preview.
    pub fn direct_play(&mut self, renderer: &mut dyn Renderer) -> Result<(), CommandError> {
        if self.state == CommandState::Committed {
            return Ok(());
        }
        self.preview.release(renderer);
        let result = self.plan.as_ref().map_err(Clone::clone).and_then(|plan| match plan {
            Plan::Transform { handler, job } => Ok(handler.direct_commit(job, renderer)?),
            other => commit_plan(other, self.offset, renderer, &mut self.preview),
        });
        let handles = self.record(result)?;
        debug!(id = %self.id, handles = handles.len(), "direct commit");
        self.committed = handles;
        self.state = CommandState::Committed;
        Ok(())
    }

    /// Prepare, play to completion and clean up in one step.
    pub fn play_through(&mut self, renderer: &mut dyn Renderer) -> Result<(), CommandError> {
        if self.state == CommandState::Committed {
            return Ok(());
        }
        self.pre_play(renderer)?;
        let result = self.play(renderer, Ratio::ONE);
        self.post_play(renderer);
        result
    }

    /// Draw the final geometry on a flat export surface.
    pub fn draw_on_2d(&self, surface: &mut dyn ExportSurface) -> Result<(), CommandError> {
        match self.plan.as_ref().map_err(Clone::clone)? {
            Plan::Nothing | Plan::Effect { .. } => {}
            Plan::Shape(shape) => export_primitive(&shape.map_points(self.offset), surface),
            Plan::Text { text, at } => surface.draw_text(text, (self.offset)(*at)),
            Plan::Transform { handler, job } => handler.draw_on_2d(job, surface)?,
            Plan::Fill(region) => {
                for ring in fill_rings(region, self.offset) {
                    surface.draw_polygon_with_fill(&ring);
                }
            }
        }
        Ok(())
    }

    /// Give up the committed renderer objects, for removal by the caller.
    pub fn into_committed(self) -> Vec<RendererHandle> {
        self.committed
    }
}
