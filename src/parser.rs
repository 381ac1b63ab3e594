//! Parser for presence-condition formulas
//!
//! Parses token streams into [`PcExpr`] trees. The grammar is
//!
//! ```text
//! pc   := term ((AND|OR) term)*
//! term := ID | 'True' | 'False' | NOT term | '(' pc ')'
//! ```
//!
//! There is no precedence between `/\` and `\/`; chains fold left and
//! parentheses disambiguate. The printer in [`crate::ast`] always re-inserts
//! parentheses, so printed formulas re-parse unambiguously.

use chumsky::prelude::*;
use chumsky::Stream;

use crate::ast::PcExpr;
use crate::error::{format_lexer_errors, format_parser_errors};
use crate::lexer::{lexer, Token};

/// Create a parser for a complete presence-condition formula.
pub fn parser() -> impl Parser<Token, PcExpr, Error = Simple<Token>> + Clone {
    recursive(|pc| {
        let term = recursive(|term| {
            let atom = select! {
                Token::True => PcExpr::True,
                Token::False => PcExpr::False,
                Token::Ident(name) => PcExpr::Feat(name),
            };

            let negation = just(Token::Not)
                .ignore_then(term)
                .map(|sub| PcExpr::not(sub));

            let group = pc
                .clone()
                .delimited_by(just(Token::LParen), just(Token::RParen));

            choice((atom, negation, group))
        });

        let op = choice((just(Token::And).to(true), just(Token::Or).to(false)));

        term.clone()
            .then(op.then(term).repeated())
            .foldl(|lhs, (is_and, rhs)| {
                if is_and {
                    PcExpr::and(lhs, rhs)
                } else {
                    PcExpr::or(lhs, rhs)
                }
            })
    })
    .then_ignore(end())
}

/// Parse a presence-condition source string into an AST.
///
/// On failure returns the rendered diagnostics; callers decide the channel
/// (the presence-condition layer logs them and treats the input as
/// unparseable).
pub fn parse_expr(input: &str) -> Result<PcExpr, String> {
    let tokens = lexer()
        .parse(input)
        .map_err(|errs| format_lexer_errors(input, errs))?;

    let len = input.len();
    let token_spans = tokens.clone();
    parser()
        .parse(Stream::from_iter(len..len + 1, tokens.into_iter()))
        .map_err(|errs| format_parser_errors(input, errs, &token_spans))
}
