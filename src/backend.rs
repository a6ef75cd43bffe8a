//! Interfaces to the rendering collaborators, plus recording implementations.
//!
//! The engine never draws anything itself. Committed geometry goes to a
//! [`Renderer`], in-progress strokes go to one of its [`Tool`]s and flat
//! exports go to an [`ExportSurface`].

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::expr::EffectKind;
use crate::geom::{Arc, Primitive};
use crate::types::{Degrees, Point, Ratio, display_num, display_point};

/// Opaque id of something a renderer has drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RendererHandle(pub u64);

impl fmt::Display for RendererHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

/// Drawing instruments on the virtual sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ToolKind {
    Ruler,
    Compass,
    Protractor,
    SetSquare,
    Pen,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::Ruler,
        ToolKind::Compass,
        ToolKind::Protractor,
        ToolKind::SetSquare,
        ToolKind::Pen,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Ruler => "ruler",
            ToolKind::Compass => "compass",
            ToolKind::Protractor => "protractor",
            ToolKind::SetSquare => "setsquare",
            ToolKind::Pen => "pen",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An instrument that draws incrementally. `ratio` is how much of the
/// stroke is done.
pub trait Tool {
    fn kind(&self) -> ToolKind;
    fn draw_line(&mut self, from: Point, to: Point, ratio: Ratio);
    fn draw_arc(&mut self, arc: &Arc, ratio: Ratio);
    fn draw_polyline(&mut self, points: &[Point], ratio: Ratio);
    fn draw_point(&mut self, at: Point, ratio: Ratio);
}

/// The scene that committed geometry lives in.
pub trait Renderer {
    fn commit_point(&mut self, at: Point) -> RendererHandle;
    fn commit_line(&mut self, from: Point, to: Point) -> RendererHandle;
    fn commit_arc(&mut self, arc: &Arc) -> RendererHandle;
    fn commit_polyline(&mut self, points: &[Point], closed: bool) -> RendererHandle;
    fn commit_fill(&mut self, points: &[Point]) -> RendererHandle;
    fn commit_text(&mut self, text: &str, at: Point) -> RendererHandle;
    fn remove_handle(&mut self, handle: RendererHandle);
    /// Play a visual effect over a shape already on the sheet
    fn apply_effect(&mut self, kind: EffectKind, target: &Primitive, ratio: Ratio);
    fn tool(&mut self, kind: ToolKind) -> &mut dyn Tool;
}

/// Flat 2D output (print, thumbnails).
pub trait ExportSurface {
    fn draw_line(&mut self, from: Point, to: Point);
    fn draw_arc(&mut self, origin: Point, radius: f64, from: Degrees, to: Degrees);
    fn draw_point(&mut self, at: Point);
    fn draw_polygon_with_fill(&mut self, points: &[Point]);

    fn draw_text(&mut self, _text: &str, at: Point) {
        self.draw_point(at);
    }
}

// ============================================================================
// Primitive → backend
// ============================================================================

/// Commit every part of `shape`, returning the handles created.
pub fn commit_primitive(shape: &Primitive, renderer: &mut dyn Renderer) -> Vec<RendererHandle> {
    match shape {
        Primitive::Point(p) => vec![renderer.commit_point(*p)],
        Primitive::Line(line) => vec![renderer.commit_line(line.start, line.end)],
        Primitive::Arc(arc) => vec![renderer.commit_arc(arc)],
        Primitive::Polygon(poly) => vec![renderer.commit_polyline(poly.points(), true)],
        Primitive::Spline(spline) => vec![renderer.commit_polyline(&spline.points, false)],
        Primitive::PointPairSet(set) => set
            .pairs
            .iter()
            .map(|(a, b)| renderer.commit_line(*a, *b))
            .collect(),
        Primitive::Group(group) => group
            .members()
            .flat_map(|m| commit_primitive(m, renderer))
            .collect(),
    }
}

/// Stroke `shape` with a tool, `ratio` of the way.
pub fn trace_primitive(shape: &Primitive, tool: &mut dyn Tool, ratio: Ratio) {
    match shape {
        Primitive::Point(p) => tool.draw_point(*p, ratio),
        Primitive::Line(line) => tool.draw_line(line.start, line.end, ratio),
        Primitive::Arc(arc) => tool.draw_arc(arc, ratio),
        Primitive::Polygon(poly) => tool.draw_polyline(poly.points(), ratio),
        Primitive::Spline(spline) => tool.draw_polyline(&spline.points, ratio),
        Primitive::PointPairSet(set) => {
            for (a, b) in &set.pairs {
                tool.draw_line(*a, *b, ratio);
            }
        }
        Primitive::Group(group) => {
            for member in group.members() {
                trace_primitive(member, tool, ratio);
            }
        }
    }
}

/// Draw the outline of `shape` on an export surface.
pub fn export_primitive(shape: &Primitive, surface: &mut dyn ExportSurface) {
    match shape {
        Primitive::Point(p) => surface.draw_point(*p),
        Primitive::Line(line) => surface.draw_line(line.start, line.end),
        Primitive::Arc(arc) => surface.draw_arc(arc.center, arc.radius, arc.from, arc.to),
        Primitive::Polygon(poly) => {
            for (a, b) in poly.edges() {
                surface.draw_line(a, b);
            }
        }
        Primitive::Spline(spline) => {
            for w in spline.points.windows(2) {
                surface.draw_line(w[0], w[1]);
            }
        }
        Primitive::PointPairSet(set) => {
            for (a, b) in &set.pairs {
                surface.draw_line(*a, *b);
            }
        }
        Primitive::Group(group) => {
            for member in group.members() {
                export_primitive(member, surface);
            }
        }
    }
}

// ============================================================================
// Recording implementations
// ============================================================================

type Log = Rc<RefCell<Vec<String>>>;

fn fmt_arc(arc: &Arc) -> String {
    format!(
        "center {} r {} from {} to {}",
        display_point(arc.center),
        display_num(arc.radius),
        display_num(arc.from.raw()),
        display_num(arc.to.raw())
    )
}

/// A tool that appends every stroke to a shared log.
#[derive(Debug)]
pub struct RecordingTool {
    kind: ToolKind,
    log: Log,
}

impl RecordingTool {
    fn record(&self, entry: String) {
        self.log.borrow_mut().push(format!("{} {}", self.kind, entry));
    }
}

impl Tool for RecordingTool {
    fn kind(&self) -> ToolKind {
        self.kind
    }

    fn draw_line(&mut self, from: Point, to: Point, ratio: Ratio) {
        self.record(format!("line {} -> {} @{}", display_point(from), display_point(to), display_num(ratio.raw())));
    }

    fn draw_arc(&mut self, arc: &Arc, ratio: Ratio) {
        self.record(format!("arc {} @{}", fmt_arc(arc), display_num(ratio.raw())));
    }

    fn draw_polyline(&mut self, points: &[Point], ratio: Ratio) {
        self.record(format!("polyline {} pts @{}", points.len(), display_num(ratio.raw())));
    }

    fn draw_point(&mut self, at: Point, ratio: Ratio) {
        self.record(format!("point {} @{}", display_point(at), display_num(ratio.raw())));
    }
}

/// Renderer that records every call as a line of text.
///
/// Useful for testing lessons: the log is deterministic and `live_handles`
/// shows what is still on the sheet.
#[derive(Debug)]
pub struct RecordingBackend {
    log: Log,
    tools: Vec<RecordingTool>,
    next_handle: u64,
    live: BTreeSet<RendererHandle>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        let log: Log = Rc::default();
        let tools = ToolKind::ALL
            .iter()
            .map(|kind| RecordingTool {
                kind: *kind,
                log: Rc::clone(&log),
            })
            .collect();
        Self {
            log,
            tools,
            next_handle: 1,
            live: BTreeSet::new(),
        }
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, one call per line.
    pub fn log(&self) -> String {
        self.log.borrow().join("\n")
    }

    pub fn entries(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn clear_log(&mut self) {
        self.log.borrow_mut().clear();
    }

    pub fn live_handles(&self) -> Vec<RendererHandle> {
        self.live.iter().copied().collect()
    }

    fn commit(&mut self, entry: String) -> RendererHandle {
        let handle = RendererHandle(self.next_handle);
        self.next_handle += 1;
        self.live.insert(handle);
        self.log.borrow_mut().push(format!("commit {handle} {entry}"));
        handle
    }
}

impl Renderer for RecordingBackend {
    fn commit_point(&mut self, at: Point) -> RendererHandle {
        self.commit(format!("point {}", display_point(at)))
    }

    fn commit_line(&mut self, from: Point, to: Point) -> RendererHandle {
        self.commit(format!("line {} -> {}", display_point(from), display_point(to)))
    }

    fn commit_arc(&mut self, arc: &Arc) -> RendererHandle {
        self.commit(format!("arc {}", fmt_arc(arc)))
    }

    fn commit_polyline(&mut self, points: &[Point], closed: bool) -> RendererHandle {
        let kind = if closed { "polygon" } else { "polyline" };
        let pts: Vec<String> = points.iter().map(|p| display_point(*p)).collect();
        self.commit(format!("{kind} {}", pts.join(" ")))
    }

    fn commit_fill(&mut self, points: &[Point]) -> RendererHandle {
        self.commit(format!("fill {} pts", points.len()))
    }

    fn commit_text(&mut self, text: &str, at: Point) -> RendererHandle {
        self.commit(format!("text {text:?} at {}", display_point(at)))
    }

    fn remove_handle(&mut self, handle: RendererHandle) {
        self.live.remove(&handle);
        self.log.borrow_mut().push(format!("remove {handle}"));
    }

    fn apply_effect(&mut self, kind: EffectKind, target: &Primitive, ratio: Ratio) {
        self.log.borrow_mut().push(format!(
            "effect {} {} @{}",
            kind.name(),
            target.kind(),
            display_num(ratio.raw())
        ));
    }

    fn tool(&mut self, kind: ToolKind) -> &mut dyn Tool {
        let idx = ToolKind::ALL.iter().position(|k| *k == kind).unwrap_or(0);
        &mut self.tools[idx]
    }
}

/// Export surface that records every call as a line of text.
#[derive(Debug, Default)]
pub struct RecordingExporter {
    entries: Vec<String>,
}

impl RecordingExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> String {
        self.entries.join("\n")
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl ExportSurface for RecordingExporter {
    fn draw_line(&mut self, from: Point, to: Point) {
        self.entries.push(format!("line {} -> {}", display_point(from), display_point(to)));
    }

    fn draw_arc(&mut self, origin: Point, radius: f64, from: Degrees, to: Degrees) {
        self.entries.push(format!(
            "arc {}",
            fmt_arc(&Arc::new(origin, radius, from, to))
        ));
    }

    fn draw_point(&mut self, at: Point) {
        self.entries.push(format!("point {}", display_point(at)));
    }

    fn draw_polygon_with_fill(&mut self, points: &[Point]) {
        let pts: Vec<String> = points.iter().map(|p| display_point(*p)).collect();
        self.entries.push(format!("fill {}", pts.join(" ")));
    }

    fn draw_text(&mut self, text: &str, at: Point) {
        self.entries.push(format!("text {text:?} at {}", display_point(at)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Group, LineSegment};
    use glam::dvec2;

    #[test]
    fn handles_are_tracked() {
        let mut backend = RecordingBackend::new();
        let a = backend.commit_point(dvec2(1.0, 2.0));
        let b = backend.commit_line(dvec2(0.0, 0.0), dvec2(1.0, 1.0));
        backend.remove_handle(a);
        assert_eq!(backend.live_handles(), vec![b]);
        insta::assert_snapshot!(backend.log(), @r"
        commit h1 point (1, 2)
        commit h2 line (0, 0) -> (1, 1)
        remove h1
        ");
    }

    #[test]
    fn tools_share_the_log() {
        let mut backend = RecordingBackend::new();
        backend
            .tool(ToolKind::Compass)
            .draw_arc(&Arc::new(dvec2(0.0, 0.0), 1.0, Degrees(0.0), Degrees(90.0)), Ratio::ONE);
        backend.tool(ToolKind::Pen).draw_point(dvec2(0.5, 0.5), Ratio::ZERO);
        assert_eq!(backend.tool(ToolKind::Ruler).kind(), ToolKind::Ruler);
        insta::assert_snapshot!(backend.log(), @r"
        compass arc center (0, 0) r 1 from 0 to 90 @1
        pen point (0.5, 0.5) @0
        ");
    }

    #[test]
    fn group_commits_each_member() {
        let mut backend = RecordingBackend::new();
        let group = Primitive::Group(Group::new([
            Primitive::Point(dvec2(0.0, 0.0)),
            Primitive::Line(LineSegment::new(dvec2(0.0, 0.0), dvec2(2.0, 0.0))),
        ]));
        let handles = commit_primitive(&group, &mut backend);
        assert_eq!(handles.len(), 2);
    }

    #[test]
    fn export_polygon_as_edges() {
        let mut exporter = RecordingExporter::new();
        let tri = Primitive::Polygon(crate::geom::Polygon::new(vec![
            dvec2(0.0, 0.0),
            dvec2(1.0, 0.0),
            dvec2(0.0, 1.0),
        ]));
        export_primitive(&tri, &mut exporter);
        insta::assert_snapshot!(exporter.log(), @r"
        line (0, 0) -> (1, 0)
        line (1, 0) -> (0, 1)
        line (0, 1) -> (0, 0)
        ");
    }
}
