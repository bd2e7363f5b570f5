//! Expression parsing pipeline: characters to tokens (C1), tokens to tree
//! (C2), and the stateful facade (C4) a function registry owns one of per
//! formula slot.

pub mod facade;
pub mod lexer;
pub mod tree;

pub use facade::Parser;
pub use lexer::lex;
pub use tree::build;
