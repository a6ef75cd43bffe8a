//! Resolved expression values and the equality law used to diff passes.

use glam::DVec2;

use crate::expr::ast::EffectKind;
use crate::geom::clip::BooleanOp;
use crate::geom::Primitive;
use crate::transform::TransformParams;
use crate::types::Point;

/// What a command does with a resolved value.
#[derive(Clone, Debug, PartialEq)]
pub enum Drawable {
    /// Plain numbers; nothing to draw
    Nothing,
    Shape(Primitive),
    Text { text: String, at: Point },
    Transform {
        source: Primitive,
        params: TransformParams,
        result: Primitive,
    },
    Effect { kind: EffectKind, target: Primitive },
    /// Boolean region, a group of polygons
    Fill { op: BooleanOp, region: Primitive },
}

/// Result of resolving one expression: the flattened atomic values plus the
/// richer geometric object when there is one.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved {
    /// Node name (kind) the value came from
    pub name: &'static str,
    /// Display label
    pub label: Option<String>,
    pub values: Vec<f64>,
    pub drawable: Drawable,
}

impl Resolved {
    pub fn number(value: f64) -> Self {
        Self {
            name: "number",
            label: None,
            values: vec![value],
            drawable: Drawable::Nothing,
        }
    }

    pub fn shape(name: &'static str, shape: Primitive) -> Self {
        Self {
            name,
            label: None,
            values: shape.atomic_values(),
            drawable: Drawable::Shape(shape),
        }
    }

    pub fn with_drawable(name: &'static str, values: Vec<f64>, drawable: Drawable) -> Self {
        Self {
            name,
            label: None,
            values,
            drawable,
        }
    }

    pub fn labeled(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    /// The transformable object, if the value has one.
    pub fn primitive(&self) -> Option<&Primitive> {
        match &self.drawable {
            Drawable::Nothing | Drawable::Text { .. } => None,
            Drawable::Shape(shape) => Some(shape),
            Drawable::Transform { result, .. } => Some(result),
            Drawable::Effect { target, .. } => Some(target),
            Drawable::Fill { region, .. } => Some(region),
        }
    }

    /// The scalar, when the value is a single plain number.
    pub fn as_number(&self) -> Option<f64> {
        match (&self.drawable, self.values.as_slice()) {
            (Drawable::Nothing, [v]) => Some(*v),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self.primitive() {
            Some(Primitive::Point(p)) => Some(*p),
            Some(_) => None,
            None => match (&self.drawable, self.values.as_slice()) {
                (Drawable::Text { at, .. }, _) => Some(*at),
                (Drawable::Nothing, [x, y]) => Some(DVec2::new(*x, *y)),
                _ => None,
            },
        }
    }

    /// Effects replay on every pass regardless of value equality.
    pub fn always_execute(&self) -> bool {
        matches!(self.drawable, Drawable::Effect { .. })
    }

    /// The value as seen through a variable: transforms and effects are
    /// already done, so a reference only draws the final shape.
    pub fn as_reference(&self) -> Resolved {
        let drawable = match &self.drawable {
            Drawable::Transform { result, .. } => Drawable::Shape(result.clone()),
            Drawable::Effect { target, .. } => Drawable::Shape(target.clone()),
            other => other.clone(),
        };
        Resolved {
            drawable,
            ..self.clone()
        }
    }

    /// Same node name, same label, and equal-length atomic vectors whose
    /// values pairwise differ by at most `tolerance`.
    pub fn equals(&self, other: &Resolved, tolerance: f64) -> bool {
        self.name == other.name
            && self.label == other.label
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    /// Short human readable kind, for type errors.
    pub fn describe(&self) -> &'static str {
        match &self.drawable {
            Drawable::Nothing if self.values.len() == 1 => "number",
            Drawable::Nothing => "values",
            Drawable::Text { .. } => "text",
            _ => match self.primitive().map(Primitive::kind) {
                Some(kind) => kind.name(),
                None => "value",
            },
        }
    }
}
