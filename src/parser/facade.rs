//! C4: the stateful parser object a [`crate::functions::registry::FunctionRegistry`]
//! owns one of per formula slot.
//!
//! Holds a tree, a per-instance variable environment, and a handle to the
//! shared [`ParserContext`] (process-wide constants, number format, function
//! hooks). Provides re-parse, stringify, partial evaluation through
//! [`crate::evaluator`], and the shallow/deep copy split described in
//! `spec.md` §4.6 and §9.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use crate::core::{ArgShape, ComputeResult, Node, ParseError, ParserContext, Token, TokenKind};
use crate::evaluator::{self, Environment};

use super::{lex, tree};

/// How `Parser` owns its tree: exclusively (mutation and expansion allowed),
/// or shared with at least one sibling produced by [`Parser::clone_shared`]
/// (read-only: `expand`/`expand_step` are refused).
#[derive(Clone)]
enum TreeStorage {
    Empty,
    Owned(Node),
    Shared(Rc<Node>),
}

/// A parsed expression bound to one [`ParserContext`], with its own variable
/// environment and parse status.
///
/// Deliberately not `Clone`: `clone_shared`/`clone_deep` are the two
/// sanctioned ways to copy one, and a blanket derive would blur which
/// semantics a plain `.clone()` call gets.
pub struct Parser {
    ctx: ParserContext,
    source: String,
    tree: TreeStorage,
    status: Option<ParseError>,
    env: RefCell<Environment>,
}

impl Parser {
    /// An empty parser (status `EmptyExpression`, no tree) bound to `ctx`.
    #[must_use]
    pub fn new(ctx: ParserContext) -> Self {
        Self {
            ctx,
            source: String::new(),
            tree: TreeStorage::Empty,
            status: Some(ParseError::EmptyExpression),
            env: RefCell::new(Environment::default()),
        }
    }

    /// Lexes and builds `source` into a fresh, exclusively owned tree.
    ///
    /// On success, `status()` becomes `None`; on failure the previous tree
    /// is dropped and `status()` reports the error (also returned here).
    pub fn set_expression(&mut self, source: &str) -> Result<(), ParseError> {
        self.source = source.to_owned();
        self.rebuild_from_source()
    }

    /// Re-lexes and rebuilds the last source string against the current
    /// `ParserContext` — useful after the registry's function set changes,
    /// which can reclassify identifiers as `ExternalFunction`.
    pub fn reparse(&mut self) -> Result<(), ParseError> {
        self.rebuild_from_source()
    }

    fn rebuild_from_source(&mut self) -> Result<(), ParseError> {
        let result = lex(&self.source, &self.ctx).and_then(|tokens| tree::build(tokens, &self.ctx));
        match result {
            Ok(node) => {
                self.tree = TreeStorage::Owned(node);
                self.status = None;
                Ok(())
            }
            Err(err) => {
                self.tree = TreeStorage::Empty;
                self.status = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Builds directly from a token list, bypassing the lexer (used when a
    /// caller has already tokenised, e.g. a tokens-aware editor widget).
    pub fn set_tokens(&mut self, tokens: Vec<Token>) -> Result<(), ParseError> {
        self.source.clear();
        match tree::build(tokens, &self.ctx) {
            Ok(node) => {
                self.tree = TreeStorage::Owned(node);
                self.status = None;
                Ok(())
            }
            Err(err) => {
                self.tree = TreeStorage::Empty;
                self.status = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Flattens the current tree back into the token list that would lex to
    /// an equivalent tree (not necessarily identical to the original lex,
    /// since implicit multiplies become explicit and constants are already
    /// substituted).
    #[must_use]
    pub fn tokens(&self) -> Vec<Token> {
        let mut out = Vec::new();
        if let Some(node) = self.node() {
            flatten_tokens(node, &mut out);
        }
        out
    }

    /// Re-stringifies the current tree using the context's active number
    /// format and precision, with a single space between tokens and minimal
    /// brackets re-emitted from each node's bracket hint.
    #[must_use]
    pub fn expression(&self) -> String {
        match self.node() {
            Some(node) => stringify(node, &self.ctx),
            None => String::new(),
        }
    }

    /// The last parse status: `None` means the current tree parsed cleanly.
    #[must_use]
    pub fn status(&self) -> Option<ParseError> {
        self.status.clone()
    }

    /// Every free-variable name referenced in the current tree, in
    /// left-to-right order, without deduplicating call sites.
    #[must_use]
    pub fn variables_in_expression(&self) -> Vec<Box<str>> {
        let mut out = Vec::new();
        if let Some(node) = self.node() {
            node.collect_identifiers(&mut out);
        }
        out
    }

    /// Every external-function call site name in the current tree.
    #[must_use]
    pub fn external_functions_in_expression(&self) -> Vec<Box<str>> {
        let mut out = Vec::new();
        if let Some(node) = self.node() {
            node.collect_external_functions(&mut out);
        }
        out
    }

    fn node(&self) -> Option<&Node> {
        match &self.tree {
            TreeStorage::Empty => None,
            TreeStorage::Owned(node) => Some(node),
            TreeStorage::Shared(node) => Some(node),
        }
    }

    /// Binds `name` to `value` in this parser's own environment, but only if
    /// it is not already bound (the "no-replace bind" of `spec.md` §5).
    /// Returns `false` without mutating anything if `name` was already
    /// bound — the registry uses that signal to detect self-recursion.
    ///
    /// Takes `&self`: the environment uses interior mutability so that a
    /// [`crate::functions::registry::FunctionRegistry`] can call back into a
    /// formula's parser (to bind its scanning variable) while the caller
    /// still holds a shared reference to the same parser, without ever
    /// needing two overlapping exclusive borrows of one [`Parser`].
    pub fn bind_variable(&self, name: &str, value: f64) -> bool {
        self.bind_variable_cell(name, Rc::new(Cell::new(value)))
    }

    /// Like [`Parser::bind_variable`], but binds an existing shared cell
    /// rather than creating a fresh one — used by the parametric renderer to
    /// drive both component formulas' `t` from a single cell.
    pub fn bind_variable_cell(&self, name: &str, cell: Rc<Cell<f64>>) -> bool {
        let mut env = self.env.borrow_mut();
        if env.contains_key(name) {
            trace!(name, "no-replace bind refused: already bound");
            return false;
        }
        env.insert(Box::from(name), cell);
        true
    }

    /// Removes `name` from this parser's environment, if bound.
    pub fn unbind_variable(&self, name: &str) {
        self.env.borrow_mut().remove(name);
    }

    /// `true` if `name` is currently bound in this parser's environment.
    #[must_use]
    pub fn is_bound(&self, name: &str) -> bool {
        self.env.borrow().contains_key(name)
    }

    /// The shared cell bound to `name`, if any — for a renderer to mutate
    /// directly across repeated evaluations without rebinding each step.
    #[must_use]
    pub fn cell(&self, name: &str) -> Option<Rc<Cell<f64>>> {
        self.env.borrow().get(name).map(Rc::clone)
    }

    /// Read-only evaluation of the current tree against this parser's
    /// environment.
    #[must_use]
    pub fn value(&self) -> ComputeResult {
        match self.node() {
            Some(node) => evaluator::value(node, &self.env.borrow(), &self.ctx),
            None => ComputeResult { value: 0.0, logic_error: true, ..ComputeResult::default() },
        }
    }

    /// Fully expands (destructively folds) the current tree. Refused — with
    /// a `logic_error` result and no mutation — on a tree shared with a
    /// sibling `clone_shared` copy; see `spec.md` §9's "must not be run on a
    /// shared tree".
    pub fn expand(&mut self) -> ComputeResult {
        let env = self.env.borrow();
        match &mut self.tree {
            TreeStorage::Owned(node) => evaluator::expand(node, &env, &self.ctx),
            TreeStorage::Empty => {
                ComputeResult { value: 0.0, logic_error: true, ..ComputeResult::default() }
            }
            TreeStorage::Shared(_) => {
                debug_assert!(false, "expand attempted on a tree shared via clone_shared");
                ComputeResult { value: 0.0, logic_error: true, ..ComputeResult::default() }
            }
        }
    }

    /// Like [`Parser::expand`], but folds at most one subtree.
    pub fn expand_step(&mut self) -> ComputeResult {
        let env = self.env.borrow();
        match &mut self.tree {
            TreeStorage::Owned(node) => evaluator::expand_step(node, &env, &self.ctx),
            TreeStorage::Empty => {
                ComputeResult { value: 0.0, logic_error: true, ..ComputeResult::default() }
            }
            TreeStorage::Shared(_) => {
                debug_assert!(false, "expand_step attempted on a tree shared via clone_shared");
                ComputeResult { value: 0.0, logic_error: true, ..ComputeResult::default() }
            }
        }
    }

    /// Produces a sibling that shares this parser's tree immutably (wrapping
    /// it in an `Rc` if it is not already shared) and starts with its own,
    /// empty variable environment. Neither copy can run `expand`/`expand_step`
    /// after this call.
    #[must_use]
    pub fn clone_shared(&mut self) -> Self {
        let shared = match std::mem::replace(&mut self.tree, TreeStorage::Empty) {
            TreeStorage::Empty => TreeStorage::Empty,
            TreeStorage::Owned(node) => TreeStorage::Shared(Rc::new(node)),
            TreeStorage::Shared(rc) => TreeStorage::Shared(rc),
        };
        self.tree = shared.clone();
        Self {
            ctx: self.ctx.clone(),
            source: self.source.clone(),
            tree: shared,
            status: self.status.clone(),
            env: RefCell::new(Environment::default()),
        }
    }

    /// Produces a fully independent copy: the tree is recursively cloned and
    /// the variable environment is copied by value (new cells, same
    /// contents), so mutating either copy never affects the other.
    #[must_use]
    pub fn clone_deep(&self) -> Self {
        let tree = match self.node() {
            Some(node) => TreeStorage::Owned(node.clone()),
            None => TreeStorage::Empty,
        };
        let env = self
            .env
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), Rc::new(Cell::new(v.get()))))
            .collect();
        Self {
            ctx: self.ctx.clone(),
            source: self.source.clone(),
            tree,
            status: self.status.clone(),
            env: RefCell::new(env),
        }
    }
}

fn flatten_tokens(node: &Node, out: &mut Vec<Token>) {
    let open = node.brackets;
    if open {
        out.push(Token::simple(TokenKind::LeftBracket, node.token.position));
    }
    match node.token.arg_shape() {
        ArgShape::Standalone => out.push(node.token.clone()),
        ArgShape::Binary => {
            if let Some(left) = &node.left {
                flatten_tokens(left, out);
            }
            out.push(node.token.clone());
            if let Some(right) = &node.right {
                flatten_tokens(right, out);
            }
        }
        ArgShape::RightUnary if is_named_function(node.token.kind) => {
            out.push(node.token.clone());
            out.push(Token::simple(TokenKind::LeftBracket, node.token.position));
            if let Some(right) = &node.right {
                flatten_tokens(right, out);
            }
            out.push(Token::simple(TokenKind::RightBracket, node.token.position));
        }
        ArgShape::RightUnary => {
            out.push(node.token.clone());
            if let Some(right) = &node.right {
                flatten_tokens(right, out);
            }
        }
        ArgShape::LeftUnary => {
            if let Some(left) = &node.left {
                flatten_tokens(left, out);
            }
            out.push(node.token.clone());
        }
        ArgShape::CommaBinary => {
            out.push(node.token.clone());
            out.push(Token::simple(TokenKind::LeftBracket, node.token.position));
            if let Some(left) = &node.left {
                flatten_tokens(left, out);
            }
            out.push(Token::simple(TokenKind::Comma, node.token.position));
            if let Some(right) = &node.right {
                flatten_tokens(right, out);
            }
            out.push(Token::simple(TokenKind::RightBracket, node.token.position));
        }
    }
    if open {
        out.push(Token::simple(TokenKind::RightBracket, node.token.position));
    }
}

fn stringify(node: &Node, ctx: &ParserContext) -> String {
    let inner = match node.token.arg_shape() {
        ArgShape::Standalone => token_text(node, ctx),
        ArgShape::Binary => {
            let left = node.left.as_ref().map_or_else(String::new, |n| stringify(n, ctx));
            let right = node.right.as_ref().map_or_else(String::new, |n| stringify(n, ctx));
            format!("{left} {} {right}", node.token.kind.glyph())
        }
        ArgShape::RightUnary if is_named_function(node.token.kind) => {
            let right = node.right.as_ref().map_or_else(String::new, |n| stringify(n, ctx));
            format!("{} ( {right} )", node.token.kind.glyph())
        }
        ArgShape::RightUnary => {
            let right = node.right.as_ref().map_or_else(String::new, |n| stringify(n, ctx));
            format!("{} {right}", node.token.kind.glyph())
        }
        ArgShape::LeftUnary => {
            let left = node.left.as_ref().map_or_else(String::new, |n| stringify(n, ctx));
            format!("{left} {}", node.token.kind.glyph())
        }
        ArgShape::CommaBinary => {
            let left = node.left.as_ref().map_or_else(String::new, |n| stringify(n, ctx));
            let right = node.right.as_ref().map_or_else(String::new, |n| stringify(n, ctx));
            format!("{} ( {left} , {right} )", node.token.kind.glyph())
        }
    };
    if node.brackets { format!("( {inner} )") } else { inner }
}

fn token_text(node: &Node, ctx: &ParserContext) -> String {
    match node.token.kind {
        TokenKind::Number => {
            crate::core::format::format_number(node.token.number, ctx.format(), ctx.precision())
        }
        TokenKind::Identifier | TokenKind::ExternalFunction => node.token.name.to_owned(),
        _ => node.token.kind.glyph().to_owned(),
    }
}

fn is_named_function(kind: TokenKind) -> bool {
    use TokenKind::{
        Abs, Acos, Asin, Atan, Ceil, Cos, Cosh, Exp, ExternalFunction, Floor, Ln, Log, Signum,
        Sin, Sinh, Sqrt, Tan, Tanh,
    };
    matches!(
        kind,
        Abs | Sqrt
            | Exp
            | Ln
            | Log
            | Sin
            | Cos
            | Tan
            | Asin
            | Acos
            | Atan
            | Sinh
            | Cosh
            | Tanh
            | Signum
            | Ceil
            | Floor
            | ExternalFunction
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_canonicalises_implicit_multiply() {
        let ctx = ParserContext::new();
        let mut parser = Parser::new(ctx);
        parser.set_expression("2(x+1)").expect("parse ok");
        assert_eq!(parser.expression(), "2 * ( x + 1 )");
        assert!(parser.bind_variable("x", 3.0));
        assert!((parser.value().value - 8.0).abs() < 1e-12);
    }

    #[test]
    fn status_reports_parse_errors() {
        let ctx = ParserContext::new();
        let mut parser = Parser::new(ctx);
        assert!(parser.set_expression("()").is_err());
        assert!(matches!(parser.status(), Some(ParseError::EmptyBrackets { .. })));
    }

    #[test]
    fn variables_and_external_functions_are_collected() {
        let ctx = ParserContext::new();
        let mut parser = Parser::new(ctx);
        parser.set_expression("x + y").expect("parse ok");
        let vars = parser.variables_in_expression();
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn no_replace_bind_refuses_rebinding() {
        let ctx = ParserContext::new();
        let mut parser = Parser::new(ctx);
        parser.set_expression("x").expect("parse ok");
        assert!(parser.bind_variable("x", 1.0));
        assert!(!parser.bind_variable("x", 2.0));
    }

    #[test]
    fn clone_shared_refuses_expand() {
        let ctx = ParserContext::new();
        let mut parser = Parser::new(ctx);
        parser.set_expression("1+1").expect("parse ok");
        let mut sibling = parser.clone_shared();
        let r = sibling.expand();
        assert!(r.logic_error);
    }

    #[test]
    fn clone_deep_is_independent() {
        let ctx = ParserContext::new();
        let mut parser = Parser::new(ctx);
        parser.set_expression("1+1").expect("parse ok");
        let mut deep = parser.clone_deep();
        deep.expand();
        assert_ne!(parser.tokens().len(), 0);
    }
}
