//! Lexer for presence-condition formulas
//!
//! Tokenizes source into a stream for the parser.

use chumsky::prelude::*;
use std::ops::Range;

/// Token types for the presence-condition grammar
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    /// The reserved constant `True`
    True,
    /// The reserved constant `False`
    False,
    /// A feature identifier: `[A-Za-z_][A-Za-z0-9_]*`
    Ident(String),
    /// `/\` or `&&`
    And,
    /// `\/` or `||`
    Or,
    /// `!`
    Not,
    LParen,
    RParen,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::True => write!(f, "True"),
            Token::False => write!(f, "False"),
            Token::Ident(s) => write!(f, "{}", s),
            Token::And => write!(f, r"/\"),
            Token::Or => write!(f, r"\/"),
            Token::Not => write!(f, "!"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

/// Type alias for spans
pub type Span = Range<usize>;

/// Create a lexer for presence-condition formulas.
///
/// Whitespace (space, tab, CR, LF) separates tokens and is otherwise ignored.
/// `&&` and `||` are accepted as synonyms of `/\` and `\/`.
pub fn lexer() -> impl Parser<char, Vec<(Token, Span)>, Error = Simple<char>> {
    let keyword_or_ident = text::ident().map(|s: String| match s.as_str() {
        "True" => Token::True,
        "False" => Token::False,
        _ => Token::Ident(s),
    });

    let operator = choice((
        just(r"/\").to(Token::And),
        just("&&").to(Token::And),
        just(r"\/").to(Token::Or),
        just("||").to(Token::Or),
        just('!').to(Token::Not),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
    ));

    keyword_or_ident
        .or(operator)
        .map_with_span(|tok, span| (tok, span))
        .padded()
        .repeated()
        .then_ignore(end())
}
