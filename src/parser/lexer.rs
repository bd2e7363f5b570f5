//! C1: character stream to token stream.

use crate::core::{ParseError, ParserContext, Span, Token, TokenKind};

/// Turns `source` into an ordered token list, or the first lexical error
/// encountered.
///
/// `ctx` is consulted for `is_function` classification of any identifier
/// that doesn't match a built-in keyword.
pub fn lex(source: &str, ctx: &ParserContext) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0_usize;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            ' ' | '\t' | '\r' | '\n' => {
                i += 1;
            }
            '(' | '[' | '{' => {
                tokens.push(Token::simple(TokenKind::LeftBracket, i));
                i += 1;
            }
            ')' | ']' | '}' => {
                tokens.push(Token::simple(TokenKind::RightBracket, i));
                i += 1;
            }
            ',' | ';' => {
                tokens.push(Token::simple(TokenKind::Comma, i));
                i += 1;
            }
            '+' => {
                tokens.push(Token::simple(TokenKind::Add, i));
                i += 1;
            }
            '-' => {
                tokens.push(Token::simple(TokenKind::Subtract, i));
                i += 1;
            }
            '*' => {
                tokens.push(Token::simple(TokenKind::Multiply, i));
                i += 1;
            }
            '/' => {
                tokens.push(Token::simple(TokenKind::Divide, i));
                i += 1;
            }
            '|' => {
                tokens.push(Token::simple(TokenKind::Modulus, i));
                i += 1;
            }
            '^' => {
                tokens.push(Token::simple(TokenKind::Power, i));
                i += 1;
            }
            '!' => {
                tokens.push(Token::simple(TokenKind::Factorial, i));
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let (token, next) = lex_number(&chars, i)?;
                tokens.push(token);
                i = next;
            }
            c if c.is_alphabetic() => {
                let (token, next) = lex_identifier(&chars, i, ctx);
                tokens.push(token);
                i = next;
            }
            other => {
                return Err(ParseError::InvalidCharacter { ch: other, span: Span::at(i) });
            }
        }
    }

    Ok(tokens)
}

fn lex_number(chars: &[char], start: usize) -> Result<(Token, usize), ParseError> {
    let mut i = start;
    let mut text = String::new();
    let mut seen_dot = false;
    let mut seen_exp = false;

    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() {
            text.push(c);
            i += 1;
        } else if c == '.' {
            if seen_dot || seen_exp {
                return Err(invalid_number(chars, start, i));
            }
            seen_dot = true;
            text.push(c);
            i += 1;
        } else if c == 'e' || c == 'E' {
            if seen_exp {
                return Err(invalid_number(chars, start, i));
            }
            seen_exp = true;
            text.push(c);
            i += 1;
            if i < chars.len() && (chars[i] == '+' || chars[i] == '-') {
                text.push(chars[i]);
                i += 1;
            }
            if i >= chars.len() || !chars[i].is_ascii_digit() {
                return Err(invalid_number(chars, start, i));
            }
        } else {
            break;
        }
    }

    match text.parse::<f64>() {
        Ok(value) => Ok((Token::number(value, start), i)),
        Err(_) => Err(invalid_number(chars, start, i)),
    }
}

fn invalid_number(chars: &[char], start: usize, end: usize) -> ParseError {
    let clamped_end = end.max(start + 1).min(chars.len());
    let text: String = chars[start..clamped_end].iter().collect();
    ParseError::InvalidNumber { text: Box::from(text), span: Span::new(start, end) }
}

fn lex_identifier(chars: &[char], start: usize, ctx: &ParserContext) -> (Token, usize) {
    let mut i = start;
    let mut text = String::new();
    while i < chars.len() && (chars[i].is_alphabetic() || (chars[i] == '_' && i != start)) {
        text.push(chars[i].to_ascii_lowercase());
        i += 1;
    }

    if let Some(kind) = TokenKind::from_keyword(&text) {
        return (Token::simple(kind, start), i);
    }

    let kind =
        if ctx.is_function(&text) { TokenKind::ExternalFunction } else { TokenKind::Identifier };
    (Token::named(kind, text, start), i)
}
