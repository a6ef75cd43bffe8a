//! Error types with diagnostics using miette
//!
//! Every error carries a stable diagnostic code. Expression errors also carry
//! the id of the offending statement so an editor can highlight it.

use miette::Diagnostic;
use thiserror::Error;

use crate::command::{CommandState, SequencerState};
use crate::geom::ShapeKind;
use crate::transform::TransformFamily;
use crate::types::{ExprId, NumericError};

// ============================================================================
// Geometry Errors
// ============================================================================

/// Degenerate geometric input. Raised instead of producing NaN coordinates.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("line has zero length")]
    #[diagnostic(code(robocanvas::geom::zero_length_line))]
    ZeroLengthLine,

    #[error("points coincide")]
    #[diagnostic(code(robocanvas::geom::coincident_points))]
    CoincidentPoints,

    #[error("lines are parallel")]
    #[diagnostic(code(robocanvas::geom::parallel_lines))]
    ParallelLines,

    #[error("shapes do not intersect")]
    #[diagnostic(code(robocanvas::geom::no_intersection))]
    NoIntersection,

    #[error("shape has no points")]
    #[diagnostic(code(robocanvas::geom::empty_shape))]
    EmptyShape,

    #[error("computation produced a non-finite coordinate")]
    #[diagnostic(code(robocanvas::geom::non_finite))]
    NonFinite,
}

// ============================================================================
// Expression Errors
// ============================================================================

/// Error raised while resolving one top-level expression.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
#[error("expression {expression_id}: {kind}")]
#[diagnostic(forward(kind))]
pub struct ExpressionError {
    pub expression_id: ExprId,
    pub kind: ExpressionErrorKind,
}

impl ExpressionError {
    pub fn new(expression_id: ExprId, kind: ExpressionErrorKind) -> Self {
        Self { expression_id, kind }
    }
}

/// What went wrong while resolving an expression
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ExpressionErrorKind {
    #[error("undefined variable: {name}")]
    #[diagnostic(code(robocanvas::expr::undefined_variable))]
    UndefinedVariable { name: String },

    #[error("circular reference through `{name}`")]
    #[diagnostic(code(robocanvas::expr::circular_reference))]
    CircularReference { name: String },

    #[error("unknown function: {name}")]
    #[diagnostic(code(robocanvas::expr::unknown_function))]
    UnknownFunction { name: String },

    #[error("{function} expects {expected} argument(s), got {found}")]
    #[diagnostic(code(robocanvas::expr::wrong_arity))]
    WrongArity {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("expected {expected}, found {found}")]
    #[diagnostic(code(robocanvas::expr::type_mismatch))]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid {what}: {error}")]
    #[diagnostic(code(robocanvas::expr::invalid_numeric))]
    InvalidNumeric {
        what: &'static str,
        error: NumericError,
    },

    #[error("{what} must not be negative (got {value})")]
    #[diagnostic(code(robocanvas::expr::negative_length))]
    NegativeLength { what: &'static str, value: f64 },

    #[error("ratio {value} is outside [0, 1]")]
    #[diagnostic(code(robocanvas::expr::ratio_out_of_range))]
    RatioOutOfRange { value: f64 },

    #[error("invalid step {step}")]
    #[diagnostic(
        code(robocanvas::expr::invalid_step),
        help("the step of a repeat must be a positive number")
    )]
    InvalidStep { step: f64 },

    #[error("repeat would run {count} iterations (at most {max} allowed)")]
    #[diagnostic(
        code(robocanvas::expr::too_many_iterations),
        help("increase the step or narrow the range")
    )]
    TooManyIterations { count: usize, max: usize },

    #[error("dashed line would split into {count} dashes (at most {max} allowed)")]
    #[diagnostic(
        code(robocanvas::expr::too_many_dashes),
        help("use longer dashes or a shorter line")
    )]
    TooManyDashes { count: usize, max: usize },

    #[error("{what} needs at least {needed} points, got {found}")]
    #[diagnostic(code(robocanvas::expr::not_enough_points))]
    NotEnoughPoints {
        what: &'static str,
        needed: usize,
        found: usize,
    },

    #[error("odd number of coordinates ({count})")]
    #[diagnostic(code(robocanvas::expr::odd_coordinate_count))]
    OddCoordinateCount { count: usize },

    #[error("intersection point {index} requested but only {available} exist")]
    #[diagnostic(code(robocanvas::expr::no_intersection))]
    NoIntersection { index: usize, available: usize },

    #[error("index {index} out of range (1..={len})")]
    #[diagnostic(code(robocanvas::expr::index_out_of_range))]
    IndexOutOfRange { index: usize, len: usize },

    #[error("degenerate geometry: {0}")]
    #[diagnostic(code(robocanvas::expr::degenerate))]
    Degenerate(#[from] GeometryError),

    #[error("division by zero")]
    #[diagnostic(code(robocanvas::expr::division_by_zero))]
    DivisionByZero,
}

impl ExpressionErrorKind {
    pub fn invalid(what: &'static str) -> impl FnOnce(NumericError) -> ExpressionErrorKind {
        move |error| ExpressionErrorKind::InvalidNumeric { what, error }
    }

    /// Attach the id of the statement being resolved
    pub fn at(self, expression_id: ExprId) -> ExpressionError {
        ExpressionError::new(expression_id, self)
    }
}

// ============================================================================
// Dispatch / Command Errors
// ============================================================================

/// No handler is registered for a shape kind in a transform family.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
#[error("{family} cannot be applied to {kind}")]
#[diagnostic(code(robocanvas::transform::unsupported_shape))]
pub struct UnsupportedShapeError {
    pub family: TransformFamily,
    pub kind: ShapeKind,
}

/// Failure while a single command plays. Sibling commands keep going.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Unsupported(#[from] UnsupportedShapeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Geometry(#[from] GeometryError),

    #[error("command {id} cannot {action} while {state}")]
    #[diagnostic(code(robocanvas::command::invalid_state))]
    InvalidState {
        id: ExprId,
        action: &'static str,
        state: CommandState,
    },

    #[error("no command for expression {0}")]
    #[diagnostic(code(robocanvas::command::unknown_expression))]
    UnknownExpression(ExprId),
}

/// Sequencer mutators called from a state that does not allow them.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
#[error("cannot {action} a sequence that is {state}")]
#[diagnostic(code(robocanvas::command::sequencer_transition))]
pub struct SequencerError {
    pub action: &'static str,
    pub state: SequencerState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_error_message_includes_id() {
        let err = ExpressionErrorKind::UndefinedVariable { name: "a".into() }.at(ExprId(3));
        assert_eq!(err.to_string(), "expression #3: undefined variable: a");
    }

    #[test]
    fn expression_error_forwards_code() {
        let err = ExpressionErrorKind::DivisionByZero.at(ExprId(1));
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("robocanvas::expr::division_by_zero"));
    }

    #[test]
    fn geometry_error_converts_into_kind() {
        let kind: ExpressionErrorKind = GeometryError::ParallelLines.into();
        assert_eq!(kind.to_string(), "degenerate geometry: lines are parallel");
    }

    #[test]
    fn unsupported_shape_message() {
        let err = UnsupportedShapeError {
            family: TransformFamily::Project,
            kind: ShapeKind::Arc,
        };
        assert_eq!(err.to_string(), "project cannot be applied to arc");
    }
}
