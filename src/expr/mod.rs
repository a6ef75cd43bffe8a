//! Geometric expressions: the tree, its bindings, and resolution.

pub mod ast;
mod context;
mod eval;
mod value;

pub use ast::{
    BinaryOp, EffectKind, Expr, Function, IntersectionFallback, Program, Statement, TransformExpr,
};
pub use context::{Binding, ExpressionContext};
pub use eval::{repeat_count, resolve, resolve_statement};
pub use value::{Drawable, Resolved};
