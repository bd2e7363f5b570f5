//! The three function kinds a [`super::registry::FunctionRegistry`] entry
//! can be, per `spec.md` §3 "Function (registry entry)".

use crate::core::{ParserContext, VerifyError};
use crate::parser::Parser;

/// Cartesian sub-kind: which axis is the independent variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartesianSubtype {
    /// `y = f(x)`.
    XToY,
    /// `x = f(y)`.
    YToX,
}

impl Default for CartesianSubtype {
    fn default() -> Self {
        Self::XToY
    }
}

/// An optional domain bound with its own enabled flag, per §3.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bound {
    /// Whether this bound currently clips the domain.
    pub enabled: bool,
    /// The bound's value, meaningful only when `enabled`.
    pub value: f64,
}

impl Bound {
    /// An enabled bound at `value`.
    #[must_use]
    pub fn at(value: f64) -> Self {
        Self { enabled: true, value }
    }
}

/// The tag of a [`FunctionKind`], without its data — used by
/// [`super::registry::FunctionRegistry::add`] and the document codec's
/// `<type>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionType {
    /// `y = f(x)` or `x = f(y)`.
    Cartesian,
    /// `(x(t), y(t))`.
    Parametric,
    /// `f(x,y) = 0`.
    Implicit,
}

/// Kind-specific state and parsers of one registry entry.
pub enum FunctionKind {
    /// `y = f(x)` or `x = f(y)`, with one formula parser and optional clip
    /// bounds on the independent variable.
    Cartesian { subtype: CartesianSubtype, formula: Parser, min: Bound, max: Bound },
    /// `(x(t), y(t))`, with two formula parsers and a parameter sweep range.
    Parametric { x_formula: Parser, y_formula: Parser, min_param: f64, max_param: f64, param_step: f64 },
    /// `f(x,y) = 0`, with one formula parser and a draw-accuracy step in
    /// pixels.
    Implicit { formula: Parser, draw_accuracy: u32 },
}

impl FunctionKind {
    /// A Cartesian entry with an unset, always-valid `"0"` formula.
    #[must_use]
    pub fn new_cartesian(ctx: &ParserContext) -> Self {
        let mut formula = Parser::new(ctx.clone());
        let _ = formula.set_expression("0");
        Self::Cartesian { subtype: CartesianSubtype::XToY, formula, min: Bound::default(), max: Bound::default() }
    }

    /// A Parametric entry with unset, always-valid `"0"` component formulas.
    #[must_use]
    pub fn new_parametric(ctx: &ParserContext) -> Self {
        let mut x_formula = Parser::new(ctx.clone());
        let mut y_formula = Parser::new(ctx.clone());
        let _ = x_formula.set_expression("0");
        let _ = y_formula.set_expression("0");
        Self::Parametric { x_formula, y_formula, min_param: 0.0, max_param: 1.0, param_step: 0.01 }
    }

    /// An Implicit entry with an unset, always-valid `"0"` formula.
    #[must_use]
    pub fn new_implicit(ctx: &ParserContext) -> Self {
        let mut formula = Parser::new(ctx.clone());
        let _ = formula.set_expression("0");
        Self::Implicit { formula, draw_accuracy: 4 }
    }

    /// A Cartesian entry restored from stored source text, e.g. by the
    /// document codec. A formula that fails to parse is kept with its
    /// [`crate::parser::Parser::status`] error rather than rejected outright.
    #[must_use]
    pub fn cartesian_from_source(
        ctx: &ParserContext,
        subtype: CartesianSubtype,
        source: &str,
        min: Bound,
        max: Bound,
    ) -> Self {
        let mut formula = Parser::new(ctx.clone());
        let _ = formula.set_expression(source);
        Self::Cartesian { subtype, formula, min, max }
    }

    /// A Parametric entry restored from stored source text.
    #[must_use]
    pub fn parametric_from_source(
        ctx: &ParserContext,
        x_source: &str,
        y_source: &str,
        min_param: f64,
        max_param: f64,
        param_step: f64,
    ) -> Self {
        let mut x_formula = Parser::new(ctx.clone());
        let mut y_formula = Parser::new(ctx.clone());
        let _ = x_formula.set_expression(x_source);
        let _ = y_formula.set_expression(y_source);
        Self::Parametric { x_formula, y_formula, min_param, max_param, param_step }
    }

    /// An Implicit entry restored from stored source text.
    #[must_use]
    pub fn implicit_from_source(ctx: &ParserContext, source: &str, draw_accuracy: u32) -> Self {
        let mut formula = Parser::new(ctx.clone());
        let _ = formula.set_expression(source);
        Self::Implicit { formula, draw_accuracy }
    }

    /// This entry's [`FunctionType`] tag.
    #[must_use]
    pub fn function_type(&self) -> FunctionType {
        match self {
            Self::Cartesian { .. } => FunctionType::Cartesian,
            Self::Parametric { .. } => FunctionType::Parametric,
            Self::Implicit { .. } => FunctionType::Implicit,
        }
    }

    /// Re-lexes and rebuilds every formula parser owned by this entry.
    pub fn reparse_all(&mut self) {
        match self {
            Self::Cartesian { formula, .. } | Self::Implicit { formula, .. } => {
                let _ = formula.reparse();
            }
            Self::Parametric { x_formula, y_formula, .. } => {
                let _ = x_formula.reparse();
                let _ = y_formula.reparse();
            }
        }
    }

    /// Static free-variable check against this kind's expected variable
    /// set, per `spec.md` §4.4 `verify` and the original `check()` methods.
    #[must_use]
    pub fn verify(&self) -> VerifyError {
        match self {
            Self::Cartesian { subtype, formula, .. } => {
                if formula.status().is_some() {
                    return VerifyError::OtherError;
                }
                let expected = match subtype {
                    CartesianSubtype::XToY => "x",
                    CartesianSubtype::YToX => "y",
                };
                for var in formula.variables_in_expression() {
                    if &*var != expected {
                        return VerifyError::UnresolvedVariable;
                    }
                }
                VerifyError::None
            }
            Self::Parametric { x_formula, y_formula, .. } => {
                if x_formula.status().is_some() || y_formula.status().is_some() {
                    return VerifyError::OtherError;
                }
                for var in x_formula.variables_in_expression().into_iter().chain(y_formula.variables_in_expression())
                {
                    if &*var != "t" {
                        return VerifyError::UnresolvedVariable;
                    }
                }
                VerifyError::None
            }
            Self::Implicit { formula, .. } => {
                if formula.status().is_some() {
                    return VerifyError::OtherError;
                }
                let vars = formula.variables_in_expression();
                if vars.is_empty() {
                    return VerifyError::MissingVariable;
                }
                for var in vars {
                    if &*var != "x" && &*var != "y" {
                        return VerifyError::UnresolvedVariable;
                    }
                }
                VerifyError::None
            }
        }
    }
}

/// Render color as three 8-bit channels, matching the XML document schema's
/// `<color><r/><g/><b/></color>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Builds a color from `(r, g, b)`.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// One named entry owned by the [`super::registry::FunctionRegistry`].
pub struct Function {
    /// Unique, identifier-rule name.
    pub name: Box<str>,
    /// Whether this function currently participates in rendering/recursion
    /// resolution.
    pub enabled: bool,
    /// Render color.
    pub color: Color,
    /// Render line width, in pixels.
    pub width: f32,
    /// The kind-specific parsers and parameters.
    pub kind: FunctionKind,
}

impl Function {
    /// A newly created entry: enabled, width 1.0, colored by the caller's
    /// choice (the registry cycles the color wheel for new entries).
    #[must_use]
    pub fn new(name: impl Into<Box<str>>, color: Color, kind: FunctionKind) -> Self {
        Self { name: name.into(), enabled: true, color, width: 1.0, kind }
    }
}
