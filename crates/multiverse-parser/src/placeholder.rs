//! Placeholder scanning within code lines.
//!
//! Placeholders are `{{name}}` or, for inline definitions,
//! `{{name=v1,v2,...}}` where the options are the body of a JSON array.
//! Anything that does not complete the grammar is kept as literal code, so
//! `{{{a}}` is a literal `{` followed by placeholder `a`.

use std::ops::Range;

use serde_json::Value;
use winnow::{
    Parser as _,
    combinator::{cut_err, opt, preceded},
    error::{ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location},
    token::take_until,
};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    marker::{Input, identifier},
    span::Span,
};

/// A piece of a scanned line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment<'a> {
    Text(&'a str),
    Placeholder(Placeholder<'a>),
}

/// A recognized placeholder. Ranges are relative to the scanned line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Placeholder<'a> {
    pub name: &'a str,
    /// Options of an inline definition.
    pub options: Option<Vec<Value>>,
    pub range: Range<usize>,
}

type IResult<O> = ModalResult<O, ContextError<&'static str>>;

/// `{{name}}` or `{{name=body}}`; returns the name and the body with its range.
fn placeholder<'a>(input: &mut Input<'a>) -> IResult<(&'a str, Option<(&'a str, Range<usize>)>)> {
    "{{".parse_next(input)?;
    let name = identifier.parse_next(input)?;
    let body = opt(preceded(
        '=',
        cut_err(take_until(0.., "}}").with_span()).context("unterminated placeholder"),
    ))
    .parse_next(input)?;
    "}}".parse_next(input)?;
    Ok((name, body))
}

fn parse_options(name: &str, body: &str, range: Range<usize>) -> Result<Vec<Value>> {
    let span = Span::new(range);
    let options: Vec<Value> = serde_json::from_str(&format!("[{body}]")).map_err(|err| {
        Diagnostic::error(format!("invalid options for inline decision `{name}`: {err}"))
            .with_code(ErrorCode::E002)
            .with_label(span, "expected comma-separated JSON values")
            .with_help("quote string options, e.g. `{{model=\"ols\",\"glm\"}}`")
    })?;
    if options.is_empty() {
        return Err(Diagnostic::error(format!(
            "inline decision `{name}` has no options"
        ))
        .with_code(ErrorCode::E002)
        .with_label(span, "empty option list"));
    }
    Ok(options)
}

/// Split `line` into literal text and placeholders.
///
/// Diagnostics carry spans relative to the line.
pub(crate) fn scan(line: &str) -> Result<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while let Some(found) = line[pos..].find("{{") {
        let at = pos + found;
        let mut input = LocatingSlice::new(&line[at..]);
        match placeholder.parse_next(&mut input) {
            Ok((name, body)) => {
                let end = at + input.current_token_start();
                let options = match body {
                    Some((body, range)) => Some(parse_options(
                        name,
                        body,
                        at + range.start..at + range.end,
                    )?),
                    None => None,
                };
                if text_start < at {
                    segments.push(Segment::Text(&line[text_start..at]));
                }
                segments.push(Segment::Placeholder(Placeholder {
                    name,
                    options,
                    range: at..end,
                }));
                text_start = end;
                pos = end;
            }
            Err(ErrMode::Backtrack(_)) => pos = at + 1,
            Err(_) => {
                return Err(Diagnostic::error("unterminated placeholder")
                    .with_code(ErrorCode::E002)
                    .with_label(Span::new(at..line.len()), "missing closing `}}`")
                    .with_help("placeholders must open and close on the same line"));
            }
        }
    }

    if text_start < line.len() {
        segments.push(Segment::Text(&line[text_start..]));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn names<'a>(segments: &'a [Segment<'a>]) -> Vec<String> {
        segments
            .iter()
            .map(|s| match s {
                Segment::Text(t) => format!("'{t}'"),
                Segment::Placeholder(p) => p.name.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_plain_line() {
        let segments = scan("x = 1\n").unwrap();
        assert_eq!(segments, vec![Segment::Text("x = 1\n")]);
    }

    #[test]
    fn test_reference_and_definition() {
        let segments = scan("df = f({{cutoff=2,2.5,3}}, {{b}})\n").unwrap();
        assert_eq!(names(&segments), vec!["'df = f('", "cutoff", "', '", "b", "')\n'"]);
        let Segment::Placeholder(p) = &segments[1] else {
            panic!("expected placeholder");
        };
        assert_eq!(p.options, Some(vec![json!(2), json!(2.5), json!(3)]));
        assert_eq!(p.range, 7..25);
    }

    #[test]
    fn test_literal_braces() {
        assert_eq!(names(&scan("{{{b}}").unwrap()), vec!["'{'", "b"]);
        assert_eq!(names(&scan("{{a}{{a}}").unwrap()), vec!["'{{a}'", "a"]);
        assert_eq!(names(&scan("{{a}}}{{b}}").unwrap()), vec!["a", "'}'", "b"]);
        assert_eq!(names(&scan("{{}} {{_a}} {{a} {{a").unwrap()), vec![
            "'{{}} {{_a}} {{a} {{a'"
        ]);
    }

    #[test]
    fn test_nested_list_options() {
        let segments = scan("{{c=[1, 2], [3, 4]}}").unwrap();
        let Segment::Placeholder(p) = &segments[0] else {
            panic!("expected placeholder");
        };
        assert_eq!(p.options, Some(vec![json!([1, 2]), json!([3, 4])]));
    }

    #[test]
    fn test_invalid_options() {
        let err = scan("x = {{m=ols,glm}}").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E002));
        assert_eq!(err.labels()[0].span(), Span::new(8..15));

        let err = scan("x = {{m=}}").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E002));
    }

    #[test]
    fn test_unterminated_definition() {
        let err = scan("x = {{m=1,2").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E002));
    }
}
