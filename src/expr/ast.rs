//! Expression tree for geometric constructions.
//!
//! Produced by an upstream parser; this crate only resolves it.

use crate::geom::clip::BooleanOp;
use crate::types::ExprId;

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Built-in numeric functions. Trigonometry works in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Sqrt,
    Abs,
    Min,
    Max,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Function> {
        Some(match name {
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "sqrt" => Function::Sqrt,
            "abs" => Function::Abs,
            "min" => Function::Min,
            "max" => Function::Max,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Sqrt => "sqrt",
            Function::Abs => "abs",
            Function::Min => "min",
            Function::Max => "max",
        }
    }
}

/// What to do when an intersection point does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntersectionFallback {
    /// Fail with an expression error
    #[default]
    Error,
    /// Use the start point of the first shape instead
    StartPoint,
}

/// Visual effects that replay on every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Stroke,
    Fade,
    Highlight,
}

impl EffectKind {
    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Stroke => "stroke",
            EffectKind::Fade => "fade",
            EffectKind::Highlight => "highlight",
        }
    }
}

/// Transform applied to a target shape, with unresolved parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformExpr {
    Translate { dx: Box<Expr>, dy: Box<Expr> },
    /// Rotation about `about` (origin when omitted)
    Rotate {
        angle: Box<Expr>,
        about: Option<Box<Expr>>,
    },
    /// Reflection across a line expression
    Reflect {
        axis: Box<Expr>,
        ratio: Option<Box<Expr>>,
    },
    Dilate {
        scale: Box<Expr>,
        about: Option<Box<Expr>>,
    },
    /// Projection onto a line expression
    Project {
        onto: Box<Expr>,
        ratio: Option<Box<Expr>>,
    },
}

/// An expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Point(Box<Expr>, Box<Expr>),
    Line {
        from: Box<Expr>,
        to: Box<Expr>,
        extend: bool,
    },
    Arc {
        origin: Box<Expr>,
        radius: Box<Expr>,
        from: Box<Expr>,
        to: Box<Expr>,
    },
    Polygon(Vec<Expr>),
    Spline(Vec<Expr>),
    ParametricPlot {
        x_coeffs: Vec<f64>,
        y_coeffs: Vec<f64>,
        t_from: Box<Expr>,
        t_to: Box<Expr>,
        samples: Option<usize>,
    },
    DashedLine {
        from: Box<Expr>,
        to: Box<Expr>,
        on: Option<Box<Expr>>,
        off: Option<Box<Expr>>,
    },
    Text {
        text: String,
        at: Box<Expr>,
    },
    Var(String),
    Group(Vec<Expr>),
    /// Evaluates `body` once per value of `var` in `start, start + step, ...`
    Repeat {
        var: String,
        start: Box<Expr>,
        end: Box<Expr>,
        step: Box<Expr>,
        body: Box<Expr>,
    },
    /// `nth` intersection point of two shapes, counting from 1
    Intersect {
        a: Box<Expr>,
        b: Box<Expr>,
        nth: usize,
        fallback: IntersectionFallback,
    },
    Interpolate {
        a: Box<Expr>,
        b: Box<Expr>,
        ratio: Box<Expr>,
    },
    Transform {
        target: Box<Expr>,
        op: TransformExpr,
    },
    Mid(Box<Expr>, Option<Box<Expr>>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Negate(Box<Expr>),
    Call(String, Vec<Expr>),
    Fill {
        op: BooleanOp,
        shapes: Vec<Expr>,
    },
    Effect {
        kind: EffectKind,
        target: Box<Expr>,
    },
    /// `index`-th point (from 1) of a point-producing shape
    Item {
        target: Box<Expr>,
        index: usize,
    },
}

impl Expr {
    /// Node name used by the equality law.
    pub fn name(&self) -> &'static str {
        match self {
            Expr::Number(_) => "number",
            Expr::Point(..) => "point",
            Expr::Line { .. } => "line",
            Expr::Arc { .. } => "arc",
            Expr::Polygon(_) => "polygon",
            Expr::Spline(_) => "spline",
            Expr::ParametricPlot { .. } => "plot",
            Expr::DashedLine { .. } => "dashedline",
            Expr::Text { .. } => "text",
            Expr::Var(_) => "variable",
            Expr::Group(_) => "group",
            Expr::Repeat { .. } => "repeat",
            Expr::Intersect { .. } => "intersect",
            Expr::Interpolate { .. } => "interpolate",
            Expr::Transform { op, .. } => match op {
                TransformExpr::Translate { .. } => "translate",
                TransformExpr::Rotate { .. } => "rotate",
                TransformExpr::Reflect { .. } => "reflect",
                TransformExpr::Dilate { .. } => "dilate",
                TransformExpr::Project { .. } => "project",
            },
            Expr::Mid(..) => "mid",
            Expr::Binary(..) | Expr::Negate(_) | Expr::Call(..) => "arithmetic",
            Expr::Fill { .. } => "fill",
            Expr::Effect { kind, .. } => kind.name(),
            Expr::Item { .. } => "item",
        }
    }

    // Shorthand constructors, handy for building trees in tests and hosts

    pub fn num(v: f64) -> Expr {
        Expr::Number(v)
    }

    pub fn point(x: f64, y: f64) -> Expr {
        Expr::Point(Box::new(Expr::Number(x)), Box::new(Expr::Number(y)))
    }

    pub fn var(name: impl Into<String>) -> Expr {
        Expr::Var(name.into())
    }

    pub fn line(from: Expr, to: Expr) -> Expr {
        Expr::Line {
            from: Box::new(from),
            to: Box::new(to),
            extend: false,
        }
    }

    pub fn polygon(points: impl IntoIterator<Item = (f64, f64)>) -> Expr {
        Expr::Polygon(points.into_iter().map(|(x, y)| Expr::point(x, y)).collect())
    }

    pub fn arc(origin: Expr, radius: f64, from: f64, to: f64) -> Expr {
        Expr::Arc {
            origin: Box::new(origin),
            radius: Box::new(Expr::Number(radius)),
            from: Box::new(Expr::Number(from)),
            to: Box::new(Expr::Number(to)),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn rotate(target: Expr, angle: f64, about: Option<Expr>) -> Expr {
        Expr::Transform {
            target: Box::new(target),
            op: TransformExpr::Rotate {
                angle: Box::new(Expr::Number(angle)),
                about: about.map(Box::new),
            },
        }
    }

    pub fn translate(target: Expr, dx: f64, dy: f64) -> Expr {
        Expr::Transform {
            target: Box::new(target),
            op: TransformExpr::Translate {
                dx: Box::new(Expr::Number(dx)),
                dy: Box::new(Expr::Number(dy)),
            },
        }
    }

    pub fn reflect(target: Expr, axis: Expr) -> Expr {
        Expr::Transform {
            target: Box::new(target),
            op: TransformExpr::Reflect {
                axis: Box::new(axis),
                ratio: None,
            },
        }
    }

    pub fn project(target: Expr, onto: Expr) -> Expr {
        Expr::Transform {
            target: Box::new(target),
            op: TransformExpr::Project {
                onto: Box::new(onto),
                ratio: None,
            },
        }
    }

    pub fn dilate(target: Expr, scale: f64, about: Option<Expr>) -> Expr {
        Expr::Transform {
            target: Box::new(target),
            op: TransformExpr::Dilate {
                scale: Box::new(Expr::Number(scale)),
                about: about.map(Box::new),
            },
        }
    }

    pub fn repeat(var: impl Into<String>, start: f64, end: f64, step: f64, body: Expr) -> Expr {
        Expr::Repeat {
            var: var.into(),
            start: Box::new(Expr::Number(start)),
            end: Box::new(Expr::Number(end)),
            step: Box::new(Expr::Number(step)),
            body: Box::new(body),
        }
    }

    pub fn intersect(a: Expr, b: Expr, nth: usize) -> Expr {
        Expr::Intersect {
            a: Box::new(a),
            b: Box::new(b),
            nth,
            fallback: IntersectionFallback::Error,
        }
    }
}

/// One top-level statement of a program.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub id: ExprId,
    /// Variable the result is bound to, if any
    pub binding: Option<String>,
    /// Display label shown next to the drawn shape
    pub label: Option<String>,
    pub expr: Expr,
}

impl Statement {
    pub fn new(id: u32, expr: Expr) -> Self {
        Self {
            id: ExprId(id),
            binding: None,
            label: None,
            expr,
        }
    }

    pub fn bind(mut self, name: impl Into<String>) -> Self {
        self.binding = Some(name.into());
        self
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A whole construction, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}
