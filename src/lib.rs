#![forbid(unsafe_code)]
//! Expression parsing, evaluation and rendering core for a desktop function
//! plotter.
//!
//! # Pipeline
//!
//! - [`parser`] — lexes and builds the expression tree for one formula slot
//!   and exposes the stateful [`parser::Parser`] facade every other layer
//!   drives.
//! - [`evaluator`] — walks a built tree against a variable [`evaluator::Environment`],
//!   producing a number or a typed error.
//! - [`functions`] — the ordered [`functions::FunctionRegistry`] of plotted
//!   entries, with cross-function call resolution and recursion detection.
//! - [`render`] — paints Cartesian, Parametric and Implicit entries into a
//!   [`render::Canvas`], and exports a rendered view to a fixed-size raster.
//! - [`axis`] — adaptive axis-unit selection and grid/label layout for the
//!   viewport a [`render::Viewport`] describes.
//! - [`document`] — the `<mplotdoc>` XML format a registry is loaded from
//!   and saved to.
//!
//! # Example
//!
//! ```
//! use plotcore::functions::{FunctionKind, FunctionRegistry, FunctionType};
//!
//! let registry = FunctionRegistry::new();
//! let name = registry.add(FunctionType::Cartesian);
//! registry.with_function_mut(&name, |f| {
//!     if let FunctionKind::Cartesian { formula, .. } = &mut f.kind {
//!         formula.set_expression("x ^ 2").expect("valid expression");
//!     }
//! });
//! registry.reparse_all();
//! assert_eq!(registry.names(), vec![name]);
//! ```

pub mod axis;
pub mod core;
pub mod document;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod render;

pub use core::{ComputeResult, MathError, ParseError, ParserContext, VerifyError};
pub use document::{open, save, DocumentError};
pub use functions::{Bound, CartesianSubtype, Color, Function, FunctionKind, FunctionRegistry, FunctionType, RegistryError};
pub use parser::Parser;
pub use render::{render_all, Canvas, DomainClip, RecursionDetected, Style, Viewport};
