//! C2: token list to binary operator tree, by rightmost-highest-priority
//! split, per `spec.md` §4.2.

use crate::core::{ArgShape, Node, ParseError, ParserContext, Span, Token, TokenKind};

/// Builds a tree from `tokens`, fully validated against each token's
/// [`ArgShape`], with constants already substituted in.
pub fn build(tokens: Vec<Token>, ctx: &ParserContext) -> Result<Node, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::EmptyExpression);
    }

    let bracket_level: i64 = tokens.iter().fold(0, |acc, t| match t.kind {
        TokenKind::LeftBracket => acc + 1,
        TokenKind::RightBracket => acc - 1,
        _ => acc,
    });
    if bracket_level != 0 {
        return Err(ParseError::MismatchedBrackets);
    }

    let mut root = divide(tokens)?;

    if root.token.kind == TokenKind::Comma {
        return Err(ParseError::MisplacedComma { span: Span::at(root.token.position) });
    }

    check(&mut root)?;
    substitute_constants(&mut root, ctx);
    Ok(root)
}

/// Recursively collapses a token slice into a single node: implicit
/// multiplication insertion, enclosing-bracket stripping, leading-unary
/// retyping, then the rightmost-highest-priority split.
fn divide(mut tokens: Vec<Token>) -> Result<Node, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::EmptyExpression);
    }

    insert_implicit_multiply(&mut tokens);

    let mut brackets = false;
    loop {
        if tokens.first().is_some_and(|t| t.kind == TokenKind::LeftBracket) {
            let mut depth = 0_i64;
            let mut close = None;
            for (i, t) in tokens.iter().enumerate() {
                match t.kind {
                    TokenKind::LeftBracket => depth += 1,
                    TokenKind::RightBracket => {
                        depth -= 1;
                        if depth == 0 {
                            close = Some(i);
                            break;
                        }
                    }
                    _ => {}
                }
            }
            if close == Some(tokens.len() - 1) {
                tokens.remove(0);
                tokens.pop();
                brackets = true;
                continue;
            }
        }
        break;
    }

    if tokens.is_empty() {
        return Err(ParseError::EmptyBrackets { span: Span::at(0) });
    }

    if tokens.len() == 1 {
        let mut node = Node::leaf(tokens.swap_remove(0));
        if brackets {
            node = node.with_brackets();
        }
        return Ok(node);
    }

    if let Some(first) = tokens.first_mut() {
        match first.kind {
            TokenKind::Add => first.kind = TokenKind::UnaryPlus,
            TokenKind::Subtract => first.kind = TokenKind::UnaryMinus,
            _ => {}
        }
    }

    let mut depth = 0_i64;
    let mut best_priority = 0_u8;
    let mut midpoint = None;
    for (i, t) in tokens.iter().enumerate().rev() {
        match t.kind {
            TokenKind::LeftBracket => depth -= 1,
            TokenKind::RightBracket => depth += 1,
            _ if depth == 0 && t.priority() > best_priority => {
                best_priority = t.priority();
                midpoint = Some(i);
            }
            _ => {}
        }
    }

    let Some(mid) = midpoint else {
        let span = Span::at(tokens.first().map_or(0, |t| t.position));
        return Err(ParseError::GeneralError { span });
    };

    let mid_token = tokens[mid].clone();
    let right_tokens: Vec<Token> = tokens.split_off(mid + 1);
    tokens.pop();
    let left_tokens = tokens;

    if left_tokens.is_empty() && right_tokens.is_empty() {
        return Err(ParseError::MissingArgument { span: Span::at(mid_token.position) });
    }

    let left = if left_tokens.is_empty() { None } else { Some(Box::new(divide(left_tokens)?)) };
    let right =
        if right_tokens.is_empty() { None } else { Some(Box::new(divide(right_tokens)?)) };

    Ok(Node { token: mid_token, left, right, brackets })
}

/// Repeatedly inserts an implicit `Multiply` token wherever `spec.md` §4.2
/// step 2 requires one, to a fixpoint.
fn insert_implicit_multiply(tokens: &mut Vec<Token>) {
    loop {
        let mut insert_at = None;
        for i in 0..tokens.len().saturating_sub(1) {
            let left_ok = matches!(
                tokens[i].kind,
                TokenKind::Number | TokenKind::Identifier | TokenKind::RightBracket
            );
            let right_ok =
                matches!(tokens[i + 1].kind, TokenKind::Identifier | TokenKind::LeftBracket);
            if left_ok && right_ok {
                insert_at = Some(i + 1);
                break;
            }
        }
        match insert_at {
            Some(pos) => {
                let position = tokens[pos].position;
                tokens.insert(pos, Token::simple(TokenKind::Multiply, position));
            }
            None => break,
        }
    }
}

/// Validates arg shapes bottom-up, rewriting `RightUnary`-with-numeric-left
/// into an implicit multiply and lifting `CommaBinary` arguments out of
/// their `Comma` wrapper, per `spec.md` §4.2's validation pass.
fn check(node: &mut Node) -> Result<(), ParseError> {
    if let Some(left) = &mut node.left {
        check(left)?;
    }
    if let Some(right) = &mut node.right {
        check(right)?;
    }

    let pos = node.token.position;
    match node.token.arg_shape() {
        ArgShape::Standalone => {
            if node.left.is_some() || node.right.is_some() {
                debug_assert!(false, "standalone token parsed with children");
                return Err(ParseError::LogicError);
            }
        }
        ArgShape::Binary => {
            if node.left.is_none() || node.right.is_none() {
                return Err(ParseError::MissingArgument { span: Span::at(pos) });
            }
        }
        ArgShape::RightUnary => {
            if node.right.is_none() {
                return Err(ParseError::MissingArgument { span: Span::at(pos) });
            }
            if let Some(left) = node.left.take() {
                let (Some(right), true) = (node.right.take(), left.token.kind == TokenKind::Number)
                else {
                    return Err(ParseError::ExtraArgument { span: Span::at(pos) });
                };
                let operator = node.token.clone();
                let inner = Node { token: operator, left: None, right: Some(right), brackets: false };
                node.token = Token::simple(TokenKind::Multiply, pos);
                node.left = Some(left);
                node.right = Some(Box::new(inner));
            }
        }
        ArgShape::LeftUnary => {
            if node.left.is_none() {
                return Err(ParseError::MissingArgument { span: Span::at(pos) });
            }
            if node.right.is_some() {
                return Err(ParseError::ExtraArgument { span: Span::at(pos) });
            }
        }
        ArgShape::CommaBinary => {
            if node.right.is_none() {
                return Err(ParseError::MissingArgument { span: Span::at(pos) });
            }
            if node.left.is_some() {
                return Err(ParseError::ExtraArgument { span: Span::at(pos) });
            }
        }
    }

    if node.token.arg_shape() == ArgShape::CommaBinary {
        let Some(comma) = node.right.take() else {
            debug_assert!(false, "CommaBinary validated right child vanished");
            return Err(ParseError::LogicError);
        };
        if comma.token.kind != TokenKind::Comma {
            return Err(ParseError::InvalidArgument { span: Span::at(pos) });
        }
        let comma_left = comma.left.as_ref().is_some_and(|n| n.token.kind == TokenKind::Comma);
        let comma_right = comma.right.as_ref().is_some_and(|n| n.token.kind == TokenKind::Comma);
        if comma_left || comma_right {
            return Err(ParseError::ExtraArgument { span: Span::at(pos) });
        }
        node.left = comma.left;
        node.right = comma.right;
    } else {
        if let Some(left) = &node.left {
            if left.token.kind == TokenKind::Comma {
                return Err(ParseError::MisplacedComma { span: Span::at(left.token.position) });
            }
        }
        if let Some(right) = &node.right {
            if right.token.kind == TokenKind::Comma {
                return Err(ParseError::MisplacedComma { span: Span::at(right.token.position) });
            }
        }
    }

    Ok(())
}

/// Replaces every `Identifier` leaf whose (already lower-cased) name matches
/// a constant in `ctx` with a `Number` leaf carrying that value.
fn substitute_constants(node: &mut Node, ctx: &ParserContext) {
    if node.token.kind == TokenKind::Identifier {
        if let Some(value) = ctx.constant(&node.token.name) {
            node.token = Token::number(value, node.token.position);
        }
    }
    if let Some(left) = &mut node.left {
        substitute_constants(left, ctx);
    }
    if let Some(right) = &mut node.right {
        substitute_constants(right, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::lex;

    fn parse(src: &str) -> Result<Node, ParseError> {
        let ctx = ParserContext::new();
        let tokens = lex(src, &ctx).expect("lex ok");
        build(tokens, &ctx)
    }

    #[test]
    fn simple_precedence() {
        let node = parse("2+3*4").expect("parse ok");
        assert_eq!(node.token.kind, TokenKind::Add);
    }

    #[test]
    fn implicit_multiply_before_bracket() {
        let node = parse("2(x+1)").expect("parse ok");
        assert_eq!(node.token.kind, TokenKind::Multiply);
    }

    #[test]
    fn min_max_comma_binary() {
        let node = parse("min(2,3)").expect("parse ok");
        assert_eq!(node.token.kind, TokenKind::Min);
        assert!(node.left.is_some());
        assert!(node.right.is_some());
    }

    #[test]
    fn mismatched_brackets_rejected() {
        assert!(matches!(parse("(2+3"), Err(ParseError::MismatchedBrackets)));
    }

    #[test]
    fn double_unary_minus_without_brackets_is_an_error() {
        // Faithful to the original algorithm: "3 - -2" without an explicit
        // bracket around the second minus cannot be split into a valid
        // binary-minus shape; "3-(-2)" is required instead.
        assert!(parse("3 - -2").is_err());
        assert!(parse("3-(-2)").is_ok());
    }

    #[test]
    fn empty_expression_rejected() {
        assert!(matches!(parse(""), Err(ParseError::EmptyExpression)));
    }

    #[test]
    fn empty_brackets_rejected() {
        assert!(matches!(parse("()"), Err(ParseError::EmptyBrackets { .. })));
    }

    #[test]
    fn constants_are_substituted() {
        let node = parse("pi").expect("parse ok");
        assert_eq!(node.token.kind, TokenKind::Number);
        assert!((node.token.number - std::f64::consts::PI).abs() < 1e-12);
    }
}
