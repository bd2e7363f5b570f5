//! `ParserContext` — the injected configuration object described in
//! `spec.md` §3 ("process-wide parser state") and §9 ("package them as a
//! `ParserContext` value injected at parser construction rather than
//! process-wide mutables").

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::format::NumberFormat;

/// Capability a [`super::super::parser::facade::Parser`] calls back into to
/// resolve identifiers that are not constants or built-in functions.
///
/// The registry (`functions::registry::FunctionRegistry`) is the only
/// implementer in this crate, but the seam is a trait so the parser stays
/// decoupled from it, per `spec.md` §9's "injected capability object".
pub trait FunctionResolver {
    /// Returns `true` if `name` names an external function this resolver
    /// can evaluate.
    fn is_function(&self, name: &str) -> bool;

    /// Evaluates `name(arg)`. A `false` first element means the call is a
    /// domain failure (treated as a curve discontinuity, never fatal).
    fn call_function(&self, name: &str, arg: f64) -> (bool, f64);
}

/// A resolver that recognises no external functions. Used as the default
/// context for parsers not wired into a function registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFunctions;

impl FunctionResolver for NoFunctions {
    fn is_function(&self, _name: &str) -> bool {
        false
    }

    fn call_function(&self, _name: &str, _arg: f64) -> (bool, f64) {
        (false, 0.0)
    }
}

struct ParserContextInner {
    constants: FxHashMap<Box<str>, f64>,
    format: NumberFormat,
    precision: u8,
    resolver: Rc<dyn FunctionResolver>,
}

/// Shared, process-wide-in-spirit parser configuration: the constants
/// table, number format/precision, and the function-resolution hooks.
///
/// Cloning a `ParserContext` clones the handle, not the data — every clone
/// observes later mutations (`set_constant`, `set_format`), matching the
/// original's process-wide singleton semantics without an actual global.
#[derive(Clone)]
pub struct ParserContext {
    inner: Rc<RefCell<ParserContextInner>>,
}

impl ParserContext {
    /// Builds a context seeded with `pi` and `e`, `Auto` formatting, and no
    /// function resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::with_resolver(Rc::new(NoFunctions))
    }

    /// Builds a context seeded with `pi` and `e`, wired to `resolver` for
    /// external-function calls.
    #[must_use]
    pub fn with_resolver(resolver: Rc<dyn FunctionResolver>) -> Self {
        let mut constants = FxHashMap::default();
        constants.insert(Box::from("pi"), std::f64::consts::PI);
        constants.insert(Box::from("e"), std::f64::consts::E);
        Self {
            inner: Rc::new(RefCell::new(ParserContextInner {
                constants,
                format: NumberFormat::Auto,
                precision: 6,
                resolver,
            })),
        }
    }

    /// Looks up a constant by (already-lowercased) name.
    #[must_use]
    pub fn constant(&self, name: &str) -> Option<f64> {
        self.inner.borrow().constants.get(name).copied()
    }

    /// Defines or overwrites a constant. Returns `false` without mutating
    /// anything if `name` fails the corrected identifier predicate (§9).
    pub fn set_constant(&self, name: impl Into<Box<str>>, value: f64) -> bool {
        let name = name.into();
        if !super::identifier::is_valid_identifier(&name) {
            return false;
        }
        self.inner.borrow_mut().constants.insert(name, value);
        true
    }

    /// Removes a constant, if present.
    pub fn unset_constant(&self, name: &str) {
        self.inner.borrow_mut().constants.remove(name);
    }

    /// The active number format.
    #[must_use]
    pub fn format(&self) -> NumberFormat {
        self.inner.borrow().format
    }

    /// The active stringification precision.
    #[must_use]
    pub fn precision(&self) -> u8 {
        self.inner.borrow().precision
    }

    /// Sets the number format and precision used by `Parser::expression`.
    pub fn set_format(&self, format: NumberFormat, precision: u8) {
        let mut inner = self.inner.borrow_mut();
        inner.format = format;
        inner.precision = precision;
    }

    /// `true` if `name` is recognised by the installed [`FunctionResolver`].
    #[must_use]
    pub fn is_function(&self, name: &str) -> bool {
        self.inner.borrow().resolver.is_function(name)
    }

    /// Calls through to the installed [`FunctionResolver`].
    #[must_use]
    pub fn call_function(&self, name: &str, arg: f64) -> (bool, f64) {
        self.inner.borrow().resolver.call_function(name, arg)
    }

    /// Replaces the installed resolver (used when wiring a parser into a
    /// freshly constructed registry).
    pub fn set_resolver(&self, resolver: Rc<dyn FunctionResolver>) {
        self.inner.borrow_mut().resolver = resolver;
    }
}

impl Default for ParserContext {
    fn default() -> Self {
        Self::new()
    }
}
