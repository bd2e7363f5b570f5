//! C5: the ordered collection of plotted functions and the kinds they can
//! be, per `spec.md` §3 "Function (registry entry)" and "Function registry".

pub mod kinds;
pub mod registry;

pub use kinds::{Bound, CartesianSubtype, Color, Function, FunctionKind, FunctionType};
pub use registry::{FunctionRegistry, RegistryError};
