//! C5: the function registry described in `spec.md` §3 "Function registry"
//! and §5 "Recursion detection".
//!
//! Entries are kept in an [`IndexMap`] so iteration order matches insertion
//! order — functions are painted in registry order, per `spec.md` §6. The
//! registry also implements [`FunctionResolver`] so a formula parser can call
//! back into another entry by name without the parser knowing the registry
//! exists.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::core::{is_valid_identifier, FunctionResolver, ParserContext, VerifyError};

use super::kinds::{Color, Function, FunctionKind, FunctionType};

/// The 12-color cycle new entries are assigned from, in order, grounded on
/// the original's `COLOR_WHEEL`.
const COLOR_WHEEL: [Color; 12] = [
    Color::rgb(0, 0, 255),
    Color::rgb(0, 255, 0),
    Color::rgb(255, 0, 0),
    Color::rgb(0, 255, 255),
    Color::rgb(255, 0, 255),
    Color::rgb(160, 160, 164),
    Color::rgb(128, 0, 0),
    Color::rgb(0, 0, 128),
    Color::rgb(0, 128, 0),
    Color::rgb(0, 128, 128),
    Color::rgb(128, 0, 128),
    Color::rgb(128, 128, 0),
];

/// The order single-letter names are tried in before falling back to
/// multi-letter names, per `spec.md` §4.4's documented `f, g, h, …, z, a, …,
/// e` sequence.
const SINGLE_LETTER_ORDER: &str = "fghijklmnopqrstuvwxyzabcde";

/// A registry operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
    /// No entry with this name exists.
    UnknownFunction {
        /// The name that was looked up.
        name: Box<str>,
    },
    /// An entry with this name already exists.
    NameTaken {
        /// The name that collided.
        name: Box<str>,
    },
    /// The name fails the identifier predicate.
    InvalidName {
        /// The name that was rejected.
        name: Box<str>,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFunction { name } => write!(f, "no function named '{name}'"),
            Self::NameTaken { name } => write!(f, "a function named '{name}' already exists"),
            Self::InvalidName { name } => write!(f, "'{name}' is not a valid function name"),
        }
    }
}

impl std::error::Error for RegistryError {}

struct RegistryInner {
    functions: IndexMap<Box<str>, Function>,
    color_index: usize,
    ctx: ParserContext,
}

/// Shared handle to the ordered collection of plotted functions.
///
/// Cloning a `FunctionRegistry` clones the handle, not the data, so the
/// resolver installed on the shared [`ParserContext`] and every caller
/// holding a registry all observe the same entries. Every accessor takes
/// `&self` — [`super::kinds::Function`] and its formula [`crate::parser::Parser`]s
/// use interior mutability internally, so rendering a function that calls
/// back into another (or itself) never needs an exclusive borrow and can
/// never panic on a re-entrant borrow.
#[derive(Clone)]
pub struct FunctionRegistry {
    inner: Rc<RefCell<RegistryInner>>,
    recursion_error: Rc<Cell<bool>>,
}

impl FunctionRegistry {
    /// Builds an empty registry with its own [`ParserContext`], wired so
    /// that `ExternalFunction` identifiers resolve through this registry.
    #[must_use]
    pub fn new() -> Self {
        let ctx = ParserContext::new();
        let registry = Self {
            inner: Rc::new(RefCell::new(RegistryInner {
                functions: IndexMap::new(),
                color_index: 0,
                ctx: ctx.clone(),
            })),
            recursion_error: Rc::new(Cell::new(false)),
        };
        ctx.set_resolver(Rc::new(registry.clone()));
        registry
    }

    /// The shared context every entry's formula parsers are bound to.
    #[must_use]
    pub fn context(&self) -> ParserContext {
        self.inner.borrow().ctx.clone()
    }

    /// Adds a new entry of `function_type` with an auto-generated name and
    /// the next color off the wheel, and returns the name.
    pub fn add(&self, function_type: FunctionType) -> Box<str> {
        let mut inner = self.inner.borrow_mut();
        let name = generate_name(&inner.functions);
        let ctx = inner.ctx.clone();
        let kind = match function_type {
            FunctionType::Cartesian => FunctionKind::new_cartesian(&ctx),
            FunctionType::Parametric => FunctionKind::new_parametric(&ctx),
            FunctionType::Implicit => FunctionKind::new_implicit(&ctx),
        };
        let color = COLOR_WHEEL[inner.color_index % COLOR_WHEEL.len()];
        inner.color_index += 1;
        let function = Function::new(name.clone(), color, kind);
        inner.functions.insert(name.clone(), function);
        debug!(name = %name, "function added");
        name
    }

    /// Inserts a fully constructed entry under its own name, rejecting a
    /// name collision or an invalid name rather than overwriting or
    /// renaming. Used by the document codec to restore a saved entry
    /// exactly as it was written, bypassing the auto-naming and color-wheel
    /// assignment [`Self::add`] applies to brand-new entries.
    pub fn insert(&self, function: Function) -> Result<(), RegistryError> {
        if !is_valid_identifier(&function.name) {
            return Err(RegistryError::InvalidName { name: function.name });
        }
        let mut inner = self.inner.borrow_mut();
        if inner.functions.contains_key(&function.name) {
            return Err(RegistryError::NameTaken { name: function.name });
        }
        inner.functions.insert(function.name.clone(), function);
        Ok(())
    }

    /// Removes the named entry.
    pub fn remove(&self, name: &str) -> Result<(), RegistryError> {
        let mut inner = self.inner.borrow_mut();
        if inner.functions.shift_remove(name).is_none() {
            return Err(RegistryError::UnknownFunction { name: name.into() });
        }
        debug!(name, "function removed");
        Ok(())
    }

    /// Removes every entry and resets the color wheel.
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.functions.clear();
        inner.color_index = 0;
    }

    /// Renames an entry, preserving its position in iteration order.
    pub fn rename(&self, old: &str, new: &str) -> Result<(), RegistryError> {
        if !is_valid_identifier(new) {
            return Err(RegistryError::InvalidName { name: new.into() });
        }
        let mut inner = self.inner.borrow_mut();
        if old != new && inner.functions.contains_key(new) {
            return Err(RegistryError::NameTaken { name: new.into() });
        }
        let Some(idx) = inner.functions.get_index_of(old) else {
            return Err(RegistryError::UnknownFunction { name: old.into() });
        };
        let Some((_, mut function)) = inner.functions.shift_remove_index(idx) else {
            return Err(RegistryError::UnknownFunction { name: old.into() });
        };
        function.name = new.into();
        inner.functions.shift_insert(idx, Box::from(new), function);
        Ok(())
    }

    /// Every entry's name, in painting order.
    #[must_use]
    pub fn names(&self) -> Vec<Box<str>> {
        self.inner.borrow().functions.keys().cloned().collect()
    }

    /// Runs `f` against the named entry, if it exists.
    pub fn with_function<T>(&self, name: &str, f: impl FnOnce(&Function) -> T) -> Option<T> {
        self.inner.borrow().functions.get(name).map(f)
    }

    /// Runs `f` against the named entry with exclusive access, if it exists.
    pub fn with_function_mut<T>(&self, name: &str, f: impl FnOnce(&mut Function) -> T) -> Option<T> {
        self.inner.borrow_mut().functions.get_mut(name).map(f)
    }

    /// Calls `f` once per entry, in painting order, with a shared reference.
    /// A renderer may evaluate each function's formulas from inside `f`:
    /// doing so only ever needs shared access, so this never conflicts with
    /// a nested call back into this same registry through
    /// [`FunctionResolver::call_function`].
    pub fn for_each<F: FnMut(&Function)>(&self, mut f: F) {
        for function in self.inner.borrow().functions.values() {
            f(function);
        }
    }

    /// Re-lexes and rebuilds every entry's formula parsers against the
    /// current context — call after the set of function names changes, so
    /// identifiers can be reclassified as `ExternalFunction`.
    pub fn reparse_all(&self) {
        let mut inner = self.inner.borrow_mut();
        for function in inner.functions.values_mut() {
            function.kind.reparse_all();
        }
    }

    /// Disables every entry, e.g. after an unrecoverable recursion error.
    pub fn disable_all(&self) {
        let mut inner = self.inner.borrow_mut();
        for function in inner.functions.values_mut() {
            function.enabled = false;
        }
    }

    /// Runs the named entry's static free-variable check.
    #[must_use]
    pub fn verify(&self, name: &str) -> VerifyError {
        self.inner.borrow().functions.get(name).map_or(VerifyError::OtherError, |f| f.kind.verify())
    }

    /// `true` if a self- or mutually-recursive call was detected and
    /// rejected since the last [`Self::clear_recursion_error`].
    #[must_use]
    pub fn recursion_error(&self) -> bool {
        self.recursion_error.get()
    }

    /// Clears the recursion-error flag, typically before starting a new
    /// render pass.
    pub fn clear_recursion_error(&self) {
        self.recursion_error.set(false);
    }

    fn call_with_bind(&self, formula: &crate::parser::Parser, var: &str, arg: f64) -> (bool, f64) {
        if !formula.bind_variable(var, arg) {
            trace!(var, arg, "recursive call rejected");
            self.recursion_error.set(true);
            return (false, 0.0);
        }
        let result = formula.value();
        formula.unbind_variable(var);
        if result.all_ok() { (true, result.value) } else { (false, 0.0) }
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionResolver for FunctionRegistry {
    fn is_function(&self, name: &str) -> bool {
        let inner = self.inner.borrow();
        if let Some(f) = inner.functions.get(name) {
            if f.enabled && matches!(f.kind, FunctionKind::Cartesian { .. }) {
                return true;
            }
        }
        let (base, suffix) = split_suffix(name);
        if suffix.is_none() {
            return false;
        }
        inner.functions.get(base).is_some_and(|f| f.enabled && matches!(f.kind, FunctionKind::Parametric { .. }))
    }

    fn call_function(&self, name: &str, arg: f64) -> (bool, f64) {
        let inner = self.inner.borrow();
        if let Some(function) = inner.functions.get(name) {
            if function.enabled {
                if let FunctionKind::Cartesian { subtype, formula, .. } = &function.kind {
                    let var = match subtype {
                        super::kinds::CartesianSubtype::XToY => "x",
                        super::kinds::CartesianSubtype::YToX => "y",
                    };
                    return self.call_with_bind(formula, var, arg);
                }
            }
        }
        let (base, suffix) = split_suffix(name);
        let Some(suffix) = suffix else { return (false, 0.0) };
        let Some(function) = inner.functions.get(base) else {
            return (false, 0.0);
        };
        if !function.enabled {
            return (false, 0.0);
        }
        match (&function.kind, suffix) {
            (FunctionKind::Parametric { x_formula, .. }, Suffix::X) => self.call_with_bind(x_formula, "t", arg),
            (FunctionKind::Parametric { y_formula, .. }, Suffix::Y) => self.call_with_bind(y_formula, "t", arg),
            _ => (false, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suffix {
    X,
    Y,
}

fn split_suffix(name: &str) -> (&str, Option<Suffix>) {
    if let Some(base) = name.strip_suffix("_x") {
        (base, Some(Suffix::X))
    } else if let Some(base) = name.strip_suffix("_y") {
        (base, Some(Suffix::Y))
    } else {
        (name, None)
    }
}

fn generate_name(functions: &IndexMap<Box<str>, Function>) -> Box<str> {
    for ch in SINGLE_LETTER_ORDER.chars() {
        let candidate = ch.to_string();
        if !functions.contains_key(candidate.as_str()) {
            return candidate.into_boxed_str();
        }
    }
    let mut len = 2_usize;
    loop {
        let limit = 26_u64.saturating_pow(u32::try_from(len).unwrap_or(u32::MAX));
        for n in 0..limit {
            let candidate = base26_name(n, len);
            if !functions.contains_key(candidate.as_str()) {
                return candidate.into_boxed_str();
            }
        }
        len += 1;
    }
}

#[allow(clippy::integer_division, reason = "base-26 digit extraction, not a precision-losing division")]
fn base26_name(mut n: u64, len: usize) -> String {
    let mut chars = vec!['a'; len];
    for slot in chars.iter_mut().rev() {
        *slot = char::from(b'a' + u8::try_from(n % 26).unwrap_or(0));
        n /= 26;
    }
    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::kinds::CartesianSubtype;

    #[test]
    fn add_assigns_names_in_the_documented_order() {
        let registry = FunctionRegistry::new();
        let first = registry.add(FunctionType::Cartesian);
        assert_eq!(&*first, "f");
        let second = registry.add(FunctionType::Cartesian);
        assert_eq!(&*second, "g");
    }

    #[test]
    fn rename_preserves_iteration_order() {
        let registry = FunctionRegistry::new();
        registry.add(FunctionType::Cartesian);
        registry.add(FunctionType::Cartesian);
        registry.rename("f", "myfn").expect("rename ok");
        assert_eq!(registry.names(), vec![Box::from("myfn"), Box::from("g")]);
    }

    #[test]
    fn colors_cycle_through_the_wheel() {
        let registry = FunctionRegistry::new();
        let name = registry.add(FunctionType::Cartesian);
        let color = registry.with_function(&name, |f| f.color).expect("present");
        assert_eq!(color, COLOR_WHEEL[0]);
    }

    #[test]
    fn self_reference_is_detected_as_recursion() {
        let registry = FunctionRegistry::new();
        let name = registry.add(FunctionType::Cartesian);
        registry.with_function_mut(&name, |f| {
            if let FunctionKind::Cartesian { formula, .. } = &mut f.kind {
                formula.set_expression(&format!("{name}(x)")).expect("parse ok");
            }
        });
        registry.reparse_all();
        let (ok, _) = registry.with_function(&name, |f| {
            if let FunctionKind::Cartesian { formula, .. } = &f.kind {
                formula.bind_variable("x", 1.0);
                let result = formula.value();
                formula.unbind_variable("x");
                result.all_ok()
            } else {
                false
            }
        }).unwrap_or(false);
        assert!(!ok);
        assert!(registry.recursion_error());
    }

    #[test]
    fn cross_reference_between_two_functions_evaluates() {
        let registry = FunctionRegistry::new();
        let f = registry.add(FunctionType::Cartesian);
        let g = registry.add(FunctionType::Cartesian);
        registry.with_function_mut(&f, |fun| {
            if let FunctionKind::Cartesian { formula, .. } = &mut fun.kind {
                formula.set_expression("x * 2").expect("parse ok");
            }
        });
        registry.with_function_mut(&g, |fun| {
            if let FunctionKind::Cartesian { subtype, formula, .. } = &mut fun.kind {
                *subtype = CartesianSubtype::XToY;
                formula.set_expression(&format!("{f}(x) + 1")).expect("parse ok");
            }
        });
        registry.reparse_all();
        let result = registry
            .with_function(&g, |fun| {
                if let FunctionKind::Cartesian { formula, .. } = &fun.kind {
                    formula.bind_variable("x", 3.0);
                    let r = formula.value();
                    formula.unbind_variable("x");
                    Some(r)
                } else {
                    None
                }
            })
            .flatten()
            .expect("g is cartesian");
        assert!(result.all_ok());
        assert!((result.value - 7.0).abs() < 1e-12);
    }

    #[test]
    fn exact_name_ending_in_suffix_resolves_as_its_own_cartesian_entry() {
        use crate::core::FunctionResolver;

        let registry = FunctionRegistry::new();
        let f = registry.add(FunctionType::Cartesian);
        registry.rename(&f, "foo_x").expect("rename ok");
        registry.with_function_mut("foo_x", |fun| {
            if let FunctionKind::Cartesian { formula, .. } = &mut fun.kind {
                formula.set_expression("x * 10").expect("parse ok");
            }
        });
        registry.reparse_all();

        assert!(registry.is_function("foo_x"));
        let (ok, value) = registry.call_function("foo_x", 3.0);
        assert!(ok);
        assert!((value - 30.0).abs() < 1e-12);
    }

    #[test]
    fn suffix_fallback_still_resolves_parametric_components() {
        use crate::core::FunctionResolver;

        let registry = FunctionRegistry::new();
        let p = registry.add(FunctionType::Parametric);
        registry.with_function_mut(&p, |fun| {
            if let FunctionKind::Parametric { x_formula, y_formula, .. } = &mut fun.kind {
                x_formula.set_expression("t * 2").expect("parse ok");
                y_formula.set_expression("t * 3").expect("parse ok");
            }
        });
        registry.reparse_all();

        let suffixed_x = format!("{p}_x");
        let suffixed_y = format!("{p}_y");
        assert!(registry.is_function(&suffixed_x));
        assert!(registry.is_function(&suffixed_y));
        let (ok_x, value_x) = registry.call_function(&suffixed_x, 2.0);
        let (ok_y, value_y) = registry.call_function(&suffixed_y, 2.0);
        assert!(ok_x && ok_y);
        assert!((value_x - 4.0).abs() < 1e-12);
        assert!((value_y - 6.0).abs() < 1e-12);
    }
}
