//! Diagnostic formatting for presence-condition parse failures
//!
//! Renders lexer and parser errors with ariadne. The engine never prints
//! these itself: [`crate::pc`] routes them through the `log` facade and the
//! offending input is skipped.

use ariadne::{Color, Label, Report, ReportKind, Source};
use chumsky::prelude::Simple;
use std::ops::Range;

use crate::lexer::Token;

/// Format lexer errors into a user-facing string.
pub fn format_lexer_errors(source: &str, errors: Vec<Simple<char>>) -> String {
    let mut output = Vec::new();

    for error in errors {
        let span = error.span();
        let report = Report::build(ReportKind::Error, (), span.start)
            .with_message("Malformed presence condition")
            .with_label(
                Label::new(span.clone())
                    .with_message(describe_lexer_error(&error))
                    .with_color(Color::Red),
            );

        if report
            .finish()
            .write(Source::from(source), &mut output)
            .is_err()
        {
            return fallback(source);
        }
    }

    String::from_utf8(output).unwrap_or_else(|_| fallback(source))
}

fn describe_lexer_error(error: &Simple<char>) -> String {
    match error.found() {
        Some(c) => format!("Unexpected character '{}'", c),
        None => "Unexpected end of input".to_string(),
    }
}

/// Format parser errors into a user-facing string.
///
/// Parser spans count tokens, not characters; `token_spans` maps them back to
/// byte ranges in the source.
pub fn format_parser_errors(
    source: &str,
    errors: Vec<Simple<Token>>,
    token_spans: &[(Token, Range<usize>)],
) -> String {
    let mut output = Vec::new();

    for error in errors {
        let span = error.span();
        let char_span = if span.start < token_spans.len() {
            token_spans[span.start].1.clone()
        } else if let Some((_, last)) = token_spans.last() {
            last.end..last.end
        } else {
            0..0
        };

        let report = Report::build(ReportKind::Error, (), char_span.start)
            .with_message("Malformed presence condition")
            .with_label(
                Label::new(char_span.clone())
                    .with_message(describe_parser_error(&error))
                    .with_color(Color::Red),
            );

        if report
            .finish()
            .write(Source::from(source), &mut output)
            .is_err()
        {
            return fallback(source);
        }
    }

    String::from_utf8(output).unwrap_or_else(|_| fallback(source))
}

fn describe_parser_error(error: &Simple<Token>) -> String {
    let found = error
        .found()
        .map(|t| format!("'{}'", t))
        .unwrap_or_else(|| "end of input".to_string());

    let expected: Vec<String> = error
        .expected()
        .filter_map(|opt| opt.as_ref())
        .map(|t| format!("'{}'", t))
        .collect();

    if expected.is_empty() {
        format!("Unexpected {}", found)
    } else {
        format!("Unexpected {}, expected one of: {}", found, expected.join(", "))
    }
}

fn fallback(source: &str) -> String {
    format!("Cannot parse presence condition: {:?}", source)
}
