//! Condition language.
//!
//! ```text
//! expr       := and_expr ("or" and_expr)*
//! and_expr   := primary ("and" primary)*
//! primary    := "(" expr ")" | comparison
//! comparison := operand op literal
//! operand    := identifier | identifier ".index"
//! op         := "==" | "!=" | "<=" | ">=" | "<" | ">"
//! literal    := number | quoted string | option name
//! ```
//!
//! A bare name on the right-hand side is always a literal: `B == b1`
//! compares block `B` against its option `b1`.

use winnow::{
    Parser as _,
    ascii::multispace0,
    combinator::{alt, cut_err, delimited, eof, not, opt},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{one_of, take_till, take_while},
};

use multiverse_core::condition::{Atom, CompareOp, Condition, Expr, Literal, Operand};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    marker::{Input, identifier},
    span::Span,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct ConditionDiagnostic {
    message: &'static str,
    help: Option<&'static str>,
}

type IResult<O> = ModalResult<O, ContextError<ConditionDiagnostic>>;

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn fail<O>(
    input: &mut Input<'_>,
    message: &'static str,
    help: Option<&'static str>,
) -> IResult<O> {
    Err(ErrMode::Cut(ContextError::new().add_context(
        input,
        &input.checkpoint(),
        ConditionDiagnostic { message, help },
    )))
}

fn keyword<'a>(word: &'static str) -> impl FnMut(&mut Input<'a>) -> IResult<()> {
    move |input: &mut Input<'a>| {
        (multispace0, word, not(one_of(is_name_char)))
            .void()
            .parse_next(input)
    }
}

fn expr(input: &mut Input<'_>) -> IResult<Expr> {
    let mut lhs = and_expr(input)?;
    while opt(keyword("or")).parse_next(input)?.is_some() {
        let rhs = and_expr(input)?;
        lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn and_expr(input: &mut Input<'_>) -> IResult<Expr> {
    let mut lhs = primary(input)?;
    while opt(keyword("and")).parse_next(input)?.is_some() {
        let rhs = primary(input)?;
        lhs = Expr::And(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn primary(input: &mut Input<'_>) -> IResult<Expr> {
    multispace0.parse_next(input)?;
    if opt('(').parse_next(input)?.is_some() {
        let inner = expr(input)?;
        multispace0.parse_next(input)?;
        cut_err(')')
            .context(ConditionDiagnostic {
                message: "expected `)`",
                help: None,
            })
            .parse_next(input)?;
        return Ok(inner);
    }
    comparison(input)
}

fn comparison(input: &mut Input<'_>) -> IResult<Expr> {
    let lhs = operand(input)?;
    multispace0.parse_next(input)?;
    let op = cut_err(compare_op)
        .context(ConditionDiagnostic {
            message: "expected a comparison operator",
            help: Some("use one of `==`, `!=`, `<`, `<=`, `>`, `>=`"),
        })
        .parse_next(input)?;
    multispace0.parse_next(input)?;
    let rhs = literal(input)?;
    Ok(Expr::Compare { lhs, op, rhs })
}

fn operand(input: &mut Input<'_>) -> IResult<Operand> {
    let Some(name) = opt(identifier).parse_next(input)? else {
        return fail(
            input,
            "expected a decision or block name",
            Some("the left-hand side of a comparison names a decision or block, e.g. `cutoff == 2`"),
        );
    };
    if opt('.').parse_next(input)?.is_some() {
        cut_err(("index", not(one_of(is_name_char))))
            .context(ConditionDiagnostic {
                message: "expected `index` after `.`",
                help: None,
            })
            .parse_next(input)?;
        return Ok(Operand::Index(name.into()));
    }
    Ok(Operand::Value(name.into()))
}

fn compare_op(input: &mut Input<'_>) -> IResult<CompareOp> {
    alt((
        "==".value(CompareOp::Eq),
        "!=".value(CompareOp::Ne),
        "<=".value(CompareOp::Le),
        ">=".value(CompareOp::Ge),
        "<".value(CompareOp::Lt),
        ">".value(CompareOp::Gt),
    ))
    .parse_next(input)
}

fn quoted<'a>(quote: char) -> impl FnMut(&mut Input<'a>) -> IResult<&'a str> {
    move |input: &mut Input<'a>| delimited(quote, take_till(0.., quote), quote).parse_next(input)
}

fn literal(input: &mut Input<'_>) -> IResult<Literal> {
    if let Some(text) = opt(alt((quoted('"'), quoted('\'')))).parse_next(input)? {
        return Ok(Literal::Text(text.to_string()));
    }

    let token = opt(take_while(1.., |c: char| {
        is_name_char(c) || matches!(c, '.' | '-' | '+')
    }))
    .parse_next(input)?;
    let Some(token) = token else {
        return fail(
            input,
            "expected a value",
            Some("compare against a number, an option name or a quoted string"),
        );
    };

    if token.ends_with(".index") {
        return fail(
            input,
            "`.index` is only allowed on the left-hand side",
            Some("write `b.index == 0` rather than `0 == b.index`"),
        );
    }
    let numeric_start =
        token.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
    if numeric_start {
        if let Some(value) = token.parse::<f64>().ok().filter(|v| v.is_finite()) {
            return Ok(Literal::Number {
                value,
                text: token.to_string(),
            });
        }
    }
    if token.chars().all(is_name_char) {
        return Ok(Literal::Text(token.to_string()));
    }
    fail(input, "invalid value", Some("quote values containing other characters"))
}

fn condition(input: &mut Input<'_>) -> IResult<Expr> {
    let expr = expr(input)?;
    multispace0.parse_next(input)?;
    cut_err(eof)
        .context(ConditionDiagnostic {
            message: "unexpected text after condition",
            help: Some("join comparisons with `and` or `or`"),
        })
        .parse_next(input)?;
    Ok(expr)
}

/// Atoms of an expression in source order.
fn collect_atoms(expr: &Expr, atoms: &mut Vec<Atom>) {
    match expr {
        Expr::Compare { lhs, rhs, .. } => {
            atoms.push(match lhs {
                Operand::Value(name) => Atom::Variable(*name),
                Operand::Index(name) => Atom::IndexVariable(*name),
            });
            atoms.push(Atom::Literal(rhs.clone()));
        }
        Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => {
            collect_atoms(lhs, atoms);
            collect_atoms(rhs, atoms);
        }
    }
}

/// Build a condition from an expression assembled in code.
pub(crate) fn from_expr(source: String, expr: Expr) -> Condition {
    let mut atoms = Vec::new();
    collect_atoms(&expr, &mut atoms);
    Condition::new(source, expr, atoms)
}

/// Parse a condition string.
///
/// Diagnostics carry spans relative to `text`.
pub(crate) fn parse_condition(text: &str) -> Result<Condition> {
    if text.trim().is_empty() {
        return Err(Diagnostic::error("empty condition")
            .with_code(ErrorCode::E003)
            .with_help("for example `A == a1 and cutoff >= 2`"));
    }

    let mut input = LocatingSlice::new(text);
    match condition.parse_next(&mut input) {
        Ok(expr) => Ok(from_expr(text.to_string(), expr)),
        Err(err) => {
            let error_pos = input.current_token_start();
            Err(convert_err_mode(err, text, error_pos))
        }
    }
}

fn convert_err_mode(
    err: ErrMode<ContextError<ConditionDiagnostic>>,
    text: &str,
    error_pos: usize,
) -> Diagnostic {
    let context_error = match err {
        ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
        ErrMode::Incomplete(_) => ContextError::new(),
    };
    let span = if error_pos < text.len() {
        Span::new(error_pos..error_pos + 1)
    } else {
        Span::new(error_pos.saturating_sub(1)..text.len())
    };

    let (message, help) = match context_error.context().next() {
        Some(ConditionDiagnostic { message, help }) => (*message, *help),
        None => ("malformed condition", None),
    };
    let mut diag = Diagnostic::error(format!("invalid condition `{text}`: {message}"))
        .with_code(ErrorCode::E003)
        .with_label(span, message);
    if let Some(help) = help {
        diag = diag.with_help(help);
    }
    diag
}

#[cfg(test)]
mod tests {
    use multiverse_core::identifier::Id;

    use super::*;

    fn cmp(lhs: Operand, op: CompareOp, rhs: Literal) -> Expr {
        Expr::Compare { lhs, op, rhs }
    }

    fn text(s: &str) -> Literal {
        Literal::Text(s.to_string())
    }

    fn num(value: f64, text: &str) -> Literal {
        Literal::Number {
            value,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_simple_comparison() {
        let c = parse_condition("A == a1").unwrap();
        assert_eq!(
            c.expr(),
            &cmp(Operand::Value(Id::new("A")), CompareOp::Eq, text("a1"))
        );
        assert_eq!(
            c.atoms(),
            &[Atom::Variable(Id::new("A")), Atom::Literal(text("a1"))]
        );
        assert_eq!(c.source(), "A == a1");
    }

    #[test]
    fn test_operators_and_numbers() {
        for (source, op) in [
            ("b != 0", CompareOp::Ne),
            ("b<0", CompareOp::Lt),
            ("b <= 0", CompareOp::Le),
            ("b > 0", CompareOp::Gt),
            ("b >= 0", CompareOp::Ge),
        ] {
            let c = parse_condition(source).unwrap();
            assert_eq!(c.expr(), &cmp(Operand::Value(Id::new("b")), op, num(0.0, "0")));
        }
        let c = parse_condition("a == -2.5").unwrap();
        assert_eq!(c.expr(), &cmp(Operand::Value(Id::new("a")), CompareOp::Eq, num(-2.5, "-2.5")));
    }

    #[test]
    fn test_index_and_quoted() {
        let c = parse_condition("b.index >= 1 or m == \"lm fit\"").unwrap();
        assert_eq!(
            c.atoms(),
            &[
                Atom::IndexVariable(Id::new("b")),
                Atom::Literal(num(1.0, "1")),
                Atom::Variable(Id::new("m")),
                Atom::Literal(text("lm fit")),
            ]
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let c = parse_condition("a == 1 or b == 2 and c == 3").unwrap();
        let a = cmp(Operand::Value(Id::new("a")), CompareOp::Eq, num(1.0, "1"));
        let b = cmp(Operand::Value(Id::new("b")), CompareOp::Eq, num(2.0, "2"));
        let cc = cmp(Operand::Value(Id::new("c")), CompareOp::Eq, num(3.0, "3"));
        assert_eq!(
            c.expr(),
            &Expr::Or(
                Box::new(a.clone()),
                Box::new(Expr::And(Box::new(b.clone()), Box::new(cc.clone())))
            )
        );

        let c = parse_condition("(a == 1 or b == 2) and c == 3").unwrap();
        assert_eq!(
            c.expr(),
            &Expr::And(
                Box::new(Expr::Or(Box::new(a), Box::new(b))),
                Box::new(cc)
            )
        );
    }

    #[test]
    fn test_option_names_starting_with_digit() {
        let c = parse_condition("A == 2_x").unwrap();
        assert_eq!(c.atoms()[1], Atom::Literal(text("2_x")));

        // `nan` and `inf` are option names, not numbers.
        let c = parse_condition("B == nan or b == inf").unwrap();
        assert_eq!(c.atoms()[1], Atom::Literal(text("nan")));
        assert_eq!(c.atoms()[3], Atom::Literal(text("inf")));
    }

    #[test]
    fn test_rejected_conditions() {
        for source in [
            "",
            "   ",
            "a = 1",
            "a ==",
            "1 == a",
            "a == b.index",
            "a.idx == 1",
            "a == 1 and",
            "(a == 1",
            "a == 1 b == 2",
            "a == 1 xor b == 2",
            "a == 1) ",
            "a == x/y",
            "a == -inf",
        ] {
            let err = parse_condition(source).unwrap_err();
            assert_eq!(err.code(), Some(ErrorCode::E003), "condition {source:?}");
        }
    }

    #[test]
    fn test_error_span() {
        let err = parse_condition("a = 1").unwrap_err();
        assert_eq!(err.labels()[0].span(), Span::new(2..3));
        assert!(err.message().contains("comparison operator"));
    }
}
