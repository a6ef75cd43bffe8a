//! Variable bindings for one resolution pass.
//!
//! A single mutable table: `add_reference` replaces whatever was bound
//! under the same name. Repeat loops rely on this to rebind their loop
//! variable on every iteration; there are no nested scopes.

use std::collections::HashMap;

use glam::dvec2;

use super::ast::Expr;
use super::value::Resolved;
use crate::errors::ExpressionErrorKind;
use crate::geom::Primitive;

/// What a name is bound to
#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    /// An already resolved value
    Value(Resolved),
    /// An expression resolved afresh at every lookup
    Definition(Expr),
}

#[derive(Clone, Debug)]
pub struct ExpressionContext {
    bindings: HashMap<String, Binding>,
    /// Definitions currently being expanded, innermost last
    expanding: Vec<String>,
}

impl Default for ExpressionContext {
    fn default() -> Self {
        let mut ctx = Self {
            bindings: HashMap::new(),
            expanding: Vec::new(),
        };
        ctx.init_builtin_bindings();
        ctx
    }
}

impl ExpressionContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn init_builtin_bindings(&mut self) {
        macro_rules! builtin_bindings {
            ($($name:ident => $value:expr),* $(,)?) => {
                $(
                    self.bindings.insert(stringify!($name).to_string(), Binding::Value($value));
                )*
            };
        }

        builtin_bindings! {
            pi     => Resolved::number(std::f64::consts::PI),
            e      => Resolved::number(std::f64::consts::E),
            origin => Resolved::shape("point", Primitive::Point(dvec2(0.0, 0.0))),
        }
    }

    /// Drop every user binding, keeping the built-ins.
    pub fn reset(&mut self) {
        self.bindings.clear();
        self.expanding.clear();
        self.init_builtin_bindings();
    }

    /// Bind `name` to a resolved value, replacing any prior binding.
    pub fn add_reference(&mut self, name: impl Into<String>, value: Resolved) {
        self.bindings.insert(name.into(), Binding::Value(value));
    }

    /// Bind `name` to an expression that is resolved on each lookup.
    pub fn define(&mut self, name: impl Into<String>, expr: Expr) {
        self.bindings.insert(name.into(), Binding::Definition(expr));
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Mark `name` as being expanded; fails if it already is.
    pub(crate) fn enter(&mut self, name: &str) -> Result<(), ExpressionErrorKind> {
        if self.expanding.iter().any(|n| n == name) {
            return Err(ExpressionErrorKind::CircularReference { name: name.to_string() });
        }
        self.expanding.push(name.to_string());
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.expanding.pop();
    }
}
