//! The binary tree produced by [`crate::parser::tree`].

use super::token::Token;

/// One node of a parsed expression tree.
///
/// During parsing a flat token list collapses step by step into a single
/// node; after a successful parse every node holds exactly one token and a
/// child configuration matching that token's [`crate::core::token::ArgShape`].
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// The token this node was built from.
    pub token: Token,
    /// Left child, present for `Binary` and `LeftUnary` shapes.
    pub left: Option<Box<Node>>,
    /// Right child, present for `Binary`, `RightUnary` and `CommaBinary`
    /// shapes (for `CommaBinary`, holds the second operand; the first is
    /// `left`).
    pub right: Option<Box<Node>>,
    /// Set when this node was parsed from inside a pair of enclosing
    /// brackets that were stripped by the tree builder; stringification
    /// re-emits them.
    pub brackets: bool,
}

impl Node {
    /// A leaf node carrying just `token`.
    #[must_use]
    pub fn leaf(token: Token) -> Self {
        Self { token, left: None, right: None, brackets: false }
    }

    /// Wraps `self` as if it had been written inside one extra pair of
    /// brackets in the source.
    #[must_use]
    pub fn with_brackets(mut self) -> Self {
        self.brackets = true;
        self
    }

    /// Number of tokens covered by this subtree. Used by stepwise expansion
    /// to verify "reduces node count by exactly one per non-error step".
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.left.as_ref().map_or(0, |n| n.node_count())
            + self.right.as_ref().map_or(0, |n| n.node_count())
    }

    /// Visits every [`super::token::TokenKind::Identifier`] leaf name in this
    /// subtree, in left-to-right order, without deduplicating.
    pub fn collect_identifiers(&self, out: &mut Vec<Box<str>>) {
        use super::token::TokenKind;
        if self.token.kind == TokenKind::Identifier {
            out.push(self.token.name.clone());
        }
        if let Some(left) = &self.left {
            left.collect_identifiers(out);
        }
        if let Some(right) = &self.right {
            right.collect_identifiers(out);
        }
    }

    /// Visits every [`super::token::TokenKind::ExternalFunction`] call-site
    /// name in this subtree, in left-to-right order, without deduplicating.
    pub fn collect_external_functions(&self, out: &mut Vec<Box<str>>) {
        use super::token::TokenKind;
        if self.token.kind == TokenKind::ExternalFunction {
            out.push(self.token.name.clone());
        }
        if let Some(left) = &self.left {
            left.collect_external_functions(out);
        }
        if let Some(right) = &self.right {
            right.collect_external_functions(out);
        }
    }
}
