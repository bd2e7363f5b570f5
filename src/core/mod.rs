//! Core types shared by the parser, evaluator and function registry.
//!
//! - `Token` / `TokenKind` — lexical units with source positions.
//! - `Node` — the binary expression tree.
//! - `ParseError` / `ComputeResult` / `VerifyError` — the three orthogonal
//!   error channels.
//! - `ParserContext` — injected configuration (constants, number format,
//!   the function-resolution hooks).

pub mod context;
pub mod error;
pub mod format;
pub mod identifier;
pub mod node;
pub mod token;

pub use context::{FunctionResolver, NoFunctions, ParserContext};
pub use error::{ComputeResult, MathError, ParseError, Span, VerifyError};
pub use format::NumberFormat;
pub use identifier::is_valid_identifier;
pub use node::Node;
pub use token::{ArgShape, Token, TokenKind};
