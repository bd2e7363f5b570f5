//! Token kinds and priorities for the expression grammar.

use std::fmt;

/// A single lexical unit produced by [`crate::parser::lexer`].
///
/// Carries enough information to both drive tree construction and to
/// reproduce a faithful source position in diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The tagged kind of this token.
    pub kind: TokenKind,
    /// Byte offset into the original source string where this token starts.
    pub position: usize,
    /// Numeric payload, populated only for [`TokenKind::Number`].
    pub number: f64,
    /// Textual payload, populated for [`TokenKind::Identifier`] and
    /// [`TokenKind::ExternalFunction`], and for glyphs that need their
    /// original spelling preserved (e.g. `tg` vs `tan`) when stringified.
    pub name: Box<str>,
}

impl Token {
    /// Builds a bare operator/punctuation token with no payload.
    #[must_use]
    pub fn simple(kind: TokenKind, position: usize) -> Self {
        Self { kind, position, number: 0.0, name: Box::from("") }
    }

    /// Builds a [`TokenKind::Number`] token.
    #[must_use]
    pub fn number(value: f64, position: usize) -> Self {
        Self { kind: TokenKind::Number, position, number: value, name: Box::from("") }
    }

    /// Builds a token carrying a textual name (identifier, external function).
    #[must_use]
    pub fn named(kind: TokenKind, name: impl Into<Box<str>>, position: usize) -> Self {
        Self { kind, position, number: 0.0, name: name.into() }
    }

    /// The token's split priority: higher splits earlier, i.e. sits closer to
    /// the tree root. See `spec.md` §3 "Token priority".
    #[must_use]
    pub fn priority(&self) -> u8 {
        use TokenKind::{
            Abs, Acos, Add, Asin, Atan, Ceil, Comma, Cos, Cosh, Divide, Exp, ExternalFunction,
            Factorial, Floor, Identifier, LeftBracket, Ln, Log, Max, Min, Modulus, Multiply,
            Number, Plus, Power, RightBracket, Signum, Sin, Sinh, Sqrt, Subtract, Tan, Tanh,
            UnaryMinus, UnaryPlus,
        };
        match self.kind {
            Comma => 6,
            Add | Subtract => 5,
            UnaryPlus | UnaryMinus => 4,
            Multiply | Divide | Modulus => 3,
            Power | Factorial => 2,
            Abs | Sqrt | Exp | Ln | Log | Sin | Cos | Tan | Asin | Acos | Atan | Sinh | Cosh
            | Tanh | Signum | Ceil | Floor | Min | Max | ExternalFunction => 1,
            Number | Identifier | LeftBracket | RightBracket | Plus | Minus => 0,
        }
    }

    /// The [`ArgShape`] implied by this token's kind, once the tree has been
    /// built (brackets never survive to this stage as nodes in their own
    /// right, so they have no shape).
    #[must_use]
    pub fn arg_shape(&self) -> ArgShape {
        use TokenKind::{
            Abs, Acos, Add, Asin, Atan, Ceil, Cos, Cosh, Divide, Exp, ExternalFunction,
            Factorial, Floor, Identifier, Ln, Log, Max, Min, Modulus, Multiply, Number, Power,
            Signum, Sin, Sinh, Sqrt, Subtract, Tan, Tanh, UnaryMinus, UnaryPlus,
        };
        match self.kind {
            Number | Identifier => ArgShape::Standalone,
            Add | Subtract | Multiply | Divide | Modulus | Power => ArgShape::Binary,
            UnaryPlus | UnaryMinus | Abs | Sqrt | Exp | Ln | Log | Sin | Cos | Tan | Asin | Acos
            | Atan | Sinh | Cosh | Tanh | Signum | Ceil | Floor | ExternalFunction => {
                ArgShape::RightUnary
            }
            Factorial => ArgShape::LeftUnary,
            Min | Max => ArgShape::CommaBinary,
            TokenKind::Comma | TokenKind::LeftBracket | TokenKind::RightBracket
            | TokenKind::Plus | TokenKind::Minus => ArgShape::Standalone,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Number => write!(f, "{}", self.number),
            TokenKind::Identifier | TokenKind::ExternalFunction => write!(f, "{}", self.name),
            _ => write!(f, "{}", self.kind.glyph()),
        }
    }
}

/// The tag of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TokenKind {
    /// A numeric literal.
    Number,
    /// A variable name, or an unresolved external-function call site before
    /// `is_function` classified it.
    Identifier,
    /// An identifier that `is_function` classified as an external function.
    ExternalFunction,
    /// Any of `(`, `[`, `{`.
    LeftBracket,
    /// Any of `)`, `]`, `}`.
    RightBracket,
    /// `,` or `;`.
    Comma,
    /// Leading `+`, before being retyped to [`TokenKind::UnaryPlus`].
    Plus,
    /// Leading `-`, before being retyped to [`TokenKind::UnaryMinus`].
    Minus,
    /// Binary `+`.
    Add,
    /// Binary `-`.
    Subtract,
    /// `*`, explicit or implicit.
    Multiply,
    /// `/`.
    Divide,
    /// `|` (modulus / absolute-value-like infix, per `spec.md` lexer table).
    Modulus,
    /// `^`.
    Power,
    /// `!`.
    Factorial,
    /// Unary `+`, retyped from a leading [`TokenKind::Plus`].
    UnaryPlus,
    /// Unary `-`, retyped from a leading [`TokenKind::Minus`].
    UnaryMinus,
    /// `abs`.
    Abs,
    /// `sqrt`.
    Sqrt,
    /// `exp`.
    Exp,
    /// `ln`.
    Ln,
    /// `log` (base 10).
    Log,
    /// `sin`.
    Sin,
    /// `cos`.
    Cos,
    /// `tan` / `tg`.
    Tan,
    /// `asin` / `arcsin`.
    Asin,
    /// `acos` / `arccos`.
    Acos,
    /// `atan` / `arctan`.
    Atan,
    /// `sinh`.
    Sinh,
    /// `cosh`.
    Cosh,
    /// `tanh`.
    Tanh,
    /// `sgn` / `signum`.
    Signum,
    /// `ceil`.
    Ceil,
    /// `floor`.
    Floor,
    /// `min` — takes a [`ArgShape::CommaBinary`] argument.
    Min,
    /// `max` — takes a [`ArgShape::CommaBinary`] argument.
    Max,
}

impl TokenKind {
    /// The canonical glyph used when stringifying a token back to source.
    #[must_use]
    pub fn glyph(self) -> &'static str {
        match self {
            Self::LeftBracket => "(",
            Self::RightBracket => ")",
            Self::Comma => ",",
            Self::Plus | Self::UnaryPlus | Self::Add => "+",
            Self::Minus | Self::UnaryMinus | Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulus => "|",
            Self::Power => "^",
            Self::Factorial => "!",
            Self::Abs => "abs",
            Self::Sqrt => "sqrt",
            Self::Exp => "exp",
            Self::Ln => "ln",
            Self::Log => "log",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Sinh => "sinh",
            Self::Cosh => "cosh",
            Self::Tanh => "tanh",
            Self::Signum => "sgn",
            Self::Ceil => "ceil",
            Self::Floor => "floor",
            Self::Min => "min",
            Self::Max => "max",
            Self::Number | Self::Identifier | Self::ExternalFunction => "",
        }
    }

    /// Looks up a built-in function keyword, folding known spelling
    /// variants (`tg`→`tan`, `arcsin`→`asin`, `sgn`→`signum`'s token, ...).
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "abs" => Self::Abs,
            "sqrt" => Self::Sqrt,
            "exp" => Self::Exp,
            "ln" => Self::Ln,
            "log" => Self::Log,
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" | "tg" => Self::Tan,
            "asin" | "arcsin" => Self::Asin,
            "acos" | "arccos" => Self::Acos,
            "atan" | "arctan" => Self::Atan,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "sgn" | "signum" => Self::Signum,
            "ceil" => Self::Ceil,
            "floor" => Self::Floor,
            "min" => Self::Min,
            "max" => Self::Max,
            _ => return None,
        })
    }
}

/// The shape of arguments a token's node expects once parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    /// A leaf: no children.
    Standalone,
    /// Both a left and a right child.
    Binary,
    /// Only a right child (prefix unary operators and named functions).
    RightUnary,
    /// Only a left child (postfix `!`).
    LeftUnary,
    /// A pair of children lifted from a [`TokenKind::Comma`] node
    /// (`min(a, b)`, `max(a, b)`).
    CommaBinary,
}
