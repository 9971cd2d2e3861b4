//! Block marker lines.
//!
//! A marker opens a new block:
//!
//! ```text
//! # --- (id) [option] [@if condition]
//! ```
//!
//! Any line whose first non-blank characters are `# ---` is a marker; if it
//! does not follow the grammar the template is rejected.

use winnow::{
    Parser as _,
    ascii::space0,
    combinator::{cut_err, eof, opt, preceded},
    error::{ContextError, ErrMode, ModalResult, ParserError},
    stream::{LocatingSlice, Location},
    token::{one_of, take_while},
};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    span::Span,
};

/// Prefix identifying marker lines.
pub(crate) const MARKER_PREFIX: &str = "# ---";

/// A parsed marker line. Spans are absolute template offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Marker<'a> {
    pub id: &'a str,
    pub option: Option<&'a str>,
    pub condition: Option<(&'a str, Span)>,
    /// The whole marker, without leading blanks.
    pub span: Span,
}

/// Diagnostic context attached to winnow errors.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MarkerDiagnostic {
    message: &'static str,
    help: Option<&'static str>,
}

pub(crate) type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<MarkerDiagnostic>>;

/// Whether `line` should be read as a marker.
pub(crate) fn is_marker(line: &str) -> bool {
    line.trim_start().starts_with(MARKER_PREFIX)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Block or decision identifier: `[A-Za-z][A-Za-z0-9_]*`.
pub(crate) fn identifier<'a, E: ParserError<Input<'a>>>(
    input: &mut Input<'a>,
) -> ModalResult<&'a str, E> {
    (
        one_of(|c: char| c.is_ascii_alphabetic()),
        take_while(0.., is_name_char),
    )
        .take()
        .parse_next(input)
}

fn marker<'a>(input: &mut Input<'a>) -> IResult<Marker<'a>> {
    space0.parse_next(input)?;
    let start = input.current_token_start();
    MARKER_PREFIX.parse_next(input)?;
    space0.parse_next(input)?;

    cut_err('(')
        .context(MarkerDiagnostic {
            message: "expected `(` after `# ---`",
            help: Some("block markers look like `# --- (name)`"),
        })
        .parse_next(input)?;
    space0.parse_next(input)?;
    let id = cut_err(identifier)
        .context(MarkerDiagnostic {
            message: "invalid block name",
            help: Some("block names start with a letter and contain letters, digits and `_`"),
        })
        .parse_next(input)?;
    space0.parse_next(input)?;
    cut_err(')')
        .context(MarkerDiagnostic {
            message: "expected `)` after block name",
            help: None,
        })
        .parse_next(input)?;
    space0.parse_next(input)?;

    let option = opt(take_while(1.., is_name_char)).parse_next(input)?;
    space0.parse_next(input)?;

    let condition = opt(preceded(
        ("@if", space0),
        cut_err(take_while(1.., |_: char| true).with_span()).context(MarkerDiagnostic {
            message: "missing condition after `@if`",
            help: Some("for example `@if A == a1`"),
        }),
    ))
    .parse_next(input)?;

    cut_err(eof)
        .context(MarkerDiagnostic {
            message: "unexpected text in block marker",
            help: Some("only one option name may follow the block name"),
        })
        .parse_next(input)?;
    let end = input.current_token_start();

    let condition = condition.map(|(text, range): (&str, _)| {
        let text = text.trim_end();
        (text, Span::new(range.start..range.start + text.len()))
    });

    Ok(Marker {
        id,
        option,
        condition,
        span: Span::new(start..end),
    })
}

/// Parse a marker line (without its line terminator) starting at template
/// offset `offset`.
pub(crate) fn parse_marker(line: &str, offset: usize) -> Result<Marker<'_>> {
    let mut input = LocatingSlice::new(line.trim_end());
    match marker.parse_next(&mut input) {
        Ok(mut marker) => {
            marker.span = marker.span.shift(offset);
            marker.condition = marker
                .condition
                .map(|(text, span)| (text, span.shift(offset)));
            Ok(marker)
        }
        Err(err) => {
            let error_pos = input.current_token_start();
            let start = line.len() - line.trim_start().len();
            Err(convert_err_mode(err, start, error_pos).relocate(Some(offset)))
        }
    }
}

fn convert_err_mode(
    err: ErrMode<ContextError<MarkerDiagnostic>>,
    start: usize,
    error_pos: usize,
) -> Diagnostic {
    let context_error = match err {
        ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
        ErrMode::Incomplete(_) => ContextError::new(),
    };
    let span = Span::new(start..error_pos.max(start + 1));

    if let Some(MarkerDiagnostic { message, help }) = context_error.context().next() {
        let mut diag = Diagnostic::error(*message)
            .with_code(ErrorCode::E001)
            .with_label(span, ErrorCode::E001.description());
        if let Some(h) = help {
            diag = diag.with_help(*h);
        }
        return diag;
    }

    Diagnostic::error("malformed block marker")
        .with_code(ErrorCode::E001)
        .with_label(span, ErrorCode::E001.description())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_marker() {
        let m = parse_marker("# --- (B)", 0).unwrap();
        assert_eq!(m.id, "B");
        assert_eq!(m.option, None);
        assert_eq!(m.condition, None);
        assert_eq!(m.span, Span::new(0..9));
    }

    #[test]
    fn test_option_marker_with_indent() {
        let m = parse_marker("    # ---  ( A )  std  ", 10).unwrap();
        assert_eq!(m.id, "A");
        assert_eq!(m.option, Some("std"));
        assert_eq!(m.span.start(), 14);
    }

    #[test]
    fn test_option_may_start_with_digit() {
        let m = parse_marker("# --- (A) 2_x", 0).unwrap();
        assert_eq!(m.option, Some("2_x"));
    }

    #[test]
    fn test_condition() {
        let line = "# --- (B) b1 @if A == a1  ";
        let m = parse_marker(line, 100).unwrap();
        assert_eq!(m.option, Some("b1"));
        let (text, span) = m.condition.unwrap();
        assert_eq!(text, "A == a1");
        assert_eq!(span, Span::new(117..124));
    }

    #[test]
    fn test_condition_without_option() {
        let m = parse_marker("# --- (C) @if cutoff >= 2.5", 0).unwrap();
        assert_eq!(m.option, None);
        assert_eq!(m.condition.unwrap().0, "cutoff >= 2.5");
    }

    #[test]
    fn test_errors() {
        for line in [
            "# --- B",
            "# --- (1B)",
            "# --- (_B)",
            "# --- (B",
            "# --- (B) a b",
            "# --- (B) a-b",
            "# --- (B) @if",
            "# --- ()",
        ] {
            let err = parse_marker(line, 0).unwrap_err();
            assert_eq!(err.code(), Some(ErrorCode::E001), "line {line:?}");
            assert_eq!(err.labels().len(), 1);
        }
    }

    #[test]
    fn test_is_marker() {
        assert!(is_marker("# --- (A)"));
        assert!(is_marker("   # ---(A)"));
        assert!(!is_marker("x = 1 # --- (A)"));
        assert!(!is_marker("# -- (A)"));
    }
}
