//! C3: walks a [`Node`] tree against a variable environment, producing a
//! number or a typed error.
//!
//! Two entry points, per `spec.md` §4.3:
//!
//! - [`value`]: read-only post-order evaluation.
//! - [`expand`] / [`expand_step`]: destructive constant folding — subtrees
//!   that evaluate without error are rewritten in place into `Number`
//!   leaves, compressing repeated evaluation of constant sub-expressions.
//!   Must never run on a tree shared by more than one parser facade (see
//!   `parser::facade::Parser::clone_shared`).

use std::cell::Cell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::core::{ComputeResult, MathError, Node, ParserContext, Token, TokenKind};

/// A parser's variable environment: identifier name to a shared, mutable
/// cell the renderer writes into between evaluations.
pub type Environment = FxHashMap<Box<str>, Rc<Cell<f64>>>;

/// Read-only post-order evaluation of `node` against `env` and `ctx`.
#[must_use]
pub fn value(node: &Node, env: &Environment, ctx: &ParserContext) -> ComputeResult {
    if node.token.kind == TokenKind::Number {
        return ComputeResult::value(node.token.number);
    }

    let mut variable_error = false;

    let left_value = match &node.left {
        Some(left) => {
            let r = value(left, env, ctx);
            if !r.ok() {
                return r;
            }
            variable_error |= r.variable_error;
            Some(r.value)
        }
        None => None,
    };

    let right_value = match &node.right {
        Some(right) => {
            let r = value(right, env, ctx);
            if !r.ok() {
                return r;
            }
            variable_error |= r.variable_error;
            Some(r.value)
        }
        None => None,
    };

    let mut result = apply(node, left_value, right_value, env, ctx);
    result.variable_error |= variable_error;
    result
}

/// Destructive constant folding: evaluates `node`, and for every subtree
/// that folds without a math- or logic-error and without an unresolved
/// variable, replaces it with a `Number` leaf. Returns the aggregate result
/// of the whole walk; its `expansions` counts how many subtrees were
/// folded.
#[must_use]
pub fn expand(node: &mut Node, env: &Environment, ctx: &ParserContext) -> ComputeResult {
    let mut budget = u32::MAX;
    fold(node, env, ctx, &mut budget)
}

/// Like [`expand`], but folds at most one subtree per call, enabling
/// stepwise display of the reduction.
#[must_use]
pub fn expand_step(node: &mut Node, env: &Environment, ctx: &ParserContext) -> ComputeResult {
    let mut budget = 1_u32;
    fold(node, env, ctx, &mut budget)
}

/// Post-order walk shared by `expand`/`expand_step`.
///
/// `budget` is the number of subtrees still allowed to fold this call,
/// decremented in place as folds happen so siblings and ancestors see an
/// exhausted budget.
fn fold(node: &mut Node, env: &Environment, ctx: &ParserContext, budget: &mut u32) -> ComputeResult {
    if node.token.kind == TokenKind::Number {
        return ComputeResult::value(node.token.number);
    }

    let mut expansions = 0_u32;
    let mut variable_error = false;

    let left_value = match &mut node.left {
        Some(left) => {
            let r = fold(left, env, ctx, budget);
            expansions += r.expansions;
            if !r.ok() {
                return ComputeResult { expansions, ..r };
            }
            variable_error |= r.variable_error;
            Some(r.value)
        }
        None => None,
    };

    let right_value = match &mut node.right {
        Some(right) => {
            let r = fold(right, env, ctx, budget);
            expansions += r.expansions;
            if !r.ok() {
                return ComputeResult { expansions, ..r };
            }
            variable_error |= r.variable_error;
            Some(r.value)
        }
        None => None,
    };

    let mut result = apply(node, left_value, right_value, env, ctx);
    result.variable_error |= variable_error;
    result.expansions = expansions;

    if !result.ok() {
        return result;
    }

    if result.variable_error {
        return result;
    }

    if *budget > 0 {
        *budget -= 1;
        node.left = None;
        node.right = None;
        node.token = Token::number(result.value, node.token.position);
        result.expansions += 1;
    }

    result
}

fn apply(
    node: &Node,
    left: Option<f64>,
    right: Option<f64>,
    env: &Environment,
    ctx: &ParserContext,
) -> ComputeResult {
    use TokenKind::{
        Abs, Acos, Add, Asin, Atan, Ceil, Cos, Cosh, Divide, Exp, ExternalFunction, Factorial,
        Identifier, Ln, Log, Max, Min, Modulus, Multiply, Number, Power, Signum, Sin, Sinh,
        Subtract, Tan, Tanh, UnaryMinus, UnaryPlus,
    };

    match node.token.kind {
        Number => ComputeResult::value(node.token.number),
        Identifier => match env.get(&node.token.name) {
            Some(cell) => ComputeResult::value(cell.get()),
            None => ComputeResult { value: 0.0, variable_error: true, ..ComputeResult::default() },
        },
        ExternalFunction => match right {
            Some(arg) => {
                let (ok, call_value) = ctx.call_function(&node.token.name, arg);
                if ok {
                    ComputeResult::value(call_value)
                } else {
                    math_err(MathError::DomainError)
                }
            }
            None => logic_err(),
        },
        Add => binary(left, right, |a, b| Ok(a + b)),
        Subtract => binary(left, right, |a, b| Ok(a - b)),
        Multiply => binary(left, right, |a, b| Ok(a * b)),
        Divide => binary(left, right, |a, b| {
            if b == 0.0 { Err(MathError::DivisionByZero) } else { Ok(a / b) }
        }),
        Modulus => binary(left, right, |a, b| {
            if b == 0.0 { Err(MathError::DivisionByZero) } else { Ok(a % b) }
        }),
        Power => binary(left, right, |a, b| {
            let result = a.powf(b);
            if result.is_nan() {
                Err(MathError::DomainError)
            } else if result.is_infinite() && a.is_finite() && b.is_finite() {
                Err(MathError::RangeError)
            } else {
                Ok(result)
            }
        }),
        Factorial => unary(left, |a| {
            if a < 0.0 {
                return Err(MathError::DomainError);
            }
            let mut product = 1.0_f64;
            let mut i = 1.0_f64;
            while i < a + 1.0 {
                product *= i;
                i += 1.0;
            }
            if product.is_infinite() { Err(MathError::RangeError) } else { Ok(product) }
        }),
        UnaryPlus => unary(right, Ok),
        UnaryMinus => unary(right, |a| Ok(-a)),
        Abs => unary(right, |a| Ok(a.abs())),
        TokenKind::Sqrt => {
            unary(right, |a| if a < 0.0 { Err(MathError::DomainError) } else { Ok(a.sqrt()) })
        }
        Exp => unary(right, |a| {
            let r = a.exp();
            if r.is_infinite() { Err(MathError::RangeError) } else { Ok(r) }
        }),
        Ln => unary(right, |a| if a <= 0.0 { Err(MathError::DomainError) } else { Ok(a.ln()) }),
        Log => unary(right, |a| if a <= 0.0 { Err(MathError::DomainError) } else { Ok(a.log10()) }),
        Sin => unary(right, |a| Ok(a.sin())),
        Cos => unary(right, |a| Ok(a.cos())),
        Tan => unary(right, |a| Ok(a.tan())),
        Asin => unary(
            right,
            |a| if (-1.0..=1.0).contains(&a) { Ok(a.asin()) } else { Err(MathError::DomainError) },
        ),
        Acos => unary(
            right,
            |a| if (-1.0..=1.0).contains(&a) { Ok(a.acos()) } else { Err(MathError::DomainError) },
        ),
        Atan => unary(right, |a| Ok(a.atan())),
        Sinh => unary(right, |a| Ok(a.sinh())),
        Cosh => unary(right, |a| Ok(a.cosh())),
        Tanh => unary(right, |a| Ok(a.tanh())),
        Signum => unary(right, |a| {
            Ok(if a > 0.0 {
                1.0
            } else if a < 0.0 {
                -1.0
            } else {
                0.0
            })
        }),
        Ceil => unary(right, |a| Ok(a.ceil())),
        TokenKind::Floor => unary(right, |a| Ok(a.floor())),
        Min => binary(left, right, |a, b| Ok(a.min(b))),
        Max => binary(left, right, |a, b| Ok(a.max(b))),
        TokenKind::Comma
        | TokenKind::LeftBracket
        | TokenKind::RightBracket
        | TokenKind::Plus
        | TokenKind::Minus => {
            debug_assert!(false, "token kind unreachable after a successful parse");
            logic_err()
        }
    }
}

fn logic_err() -> ComputeResult {
    ComputeResult { value: 0.0, logic_error: true, ..ComputeResult::default() }
}

fn math_err(err: MathError) -> ComputeResult {
    ComputeResult { value: 0.0, math_error: Some(err), ..ComputeResult::default() }
}

fn unary(arg: Option<f64>, op: impl FnOnce(f64) -> Result<f64, MathError>) -> ComputeResult {
    let Some(a) = arg else {
        debug_assert!(false, "unary node missing its child");
        return logic_err();
    };
    match op(a) {
        Ok(result) => ComputeResult::value(result),
        Err(err) => math_err(err),
    }
}

fn binary(
    left: Option<f64>,
    right: Option<f64>,
    op: impl FnOnce(f64, f64) -> Result<f64, MathError>,
) -> ComputeResult {
    let (Some(a), Some(b)) = (left, right) else {
        debug_assert!(false, "binary node missing a child");
        return logic_err();
    };
    match op(a, b) {
        Ok(result) => ComputeResult::value(result),
        Err(err) => math_err(err),
    }
}
