pub mod backend;
pub mod command;
pub mod defaults;
pub mod errors;
pub mod expr;
pub mod geom;
mod log;
pub mod transform;
pub mod types;

pub use backend::{ExportSurface, RecordingBackend, RecordingExporter, Renderer, RendererHandle, Tool, ToolKind};
pub use command::{Command, CommandState, CommandSummary, Engine, SequenceStep, Sequencer, SequencerState};
pub use defaults::EngineConfig;
pub use errors::{CommandError, ExpressionError, ExpressionErrorKind, GeometryError, SequencerError, UnsupportedShapeError};
pub use expr::{Expr, Program, Resolved, Statement};
pub use geom::{Primitive, ShapeKind};
pub use types::{Degrees, ExprId, Point, Ratio};

/// Resolve `program` and draw its final state on a flat surface.
///
/// Returns the first error, with diagnostics, if a statement fails to
/// resolve or a command cannot be drawn.
pub fn draw_program(program: &Program, surface: &mut dyn ExportSurface) -> Result<(), miette::Report> {
    let mut engine = Engine::default();
    engine.evaluate(program)?;
    match engine.export_2d(surface).into_iter().next() {
        Some((_, err)) => Err(err.into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn draw_simple_program() {
        let program = Program::new(vec![
            Statement::new(1, Expr::point(1.0, 2.0)).bind("A"),
            Statement::new(2, Expr::line(Expr::var("A"), Expr::point(3.0, 2.0))),
        ]);
        let mut exporter = RecordingExporter::new();
        draw_program(&program, &mut exporter).unwrap();
        insta::assert_snapshot!(exporter.log(), @r"
        point (1, 2)
        line (1, 2) -> (3, 2)
        ");
    }

    #[test]
    fn resolution_errors_carry_diagnostics() {
        let program = Program::new(vec![Statement::new(7, Expr::var("nope"))]);
        let mut exporter = RecordingExporter::new();
        let err = draw_program(&program, &mut exporter).unwrap_err();
        assert_eq!(err.to_string(), "expression #7: undefined variable: nope");
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("robocanvas::expr::undefined_variable"));
    }

    #[test]
    fn unsupported_commands_surface_as_errors() {
        let arc = Expr::arc(Expr::point(0.0, 0.0), 1.0, 0.0, 90.0);
        let axis = Expr::line(Expr::point(0.0, -1.0), Expr::point(1.0, -1.0));
        let program = Program::new(vec![Statement::new(1, Expr::project(arc, axis))]);
        let mut exporter = RecordingExporter::new();
        let err = draw_program(&program, &mut exporter).unwrap_err();
        assert_eq!(err.to_string(), "project cannot be applied to arc");
    }
}
