//! Constraint conditions.
//!
//! A [`Condition`] is the parsed form of a condition string such as
//! `a == if and (B == b1 or b.index >= 1)`. It is evaluated directly from its
//! expression tree against a [`Bindings`] view of the partial universe.

use std::{cmp::Ordering, fmt};

use crate::{
    identifier::Id,
    value::{OptionValue, parse_finite},
};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn holds(self, ordering: Option<Ordering>) -> bool {
        match (self, ordering) {
            (CompareOp::Ne, None) => true,
            (_, None) => false,
            (CompareOp::Eq, Some(o)) => o == Ordering::Equal,
            (CompareOp::Ne, Some(o)) => o != Ordering::Equal,
            (CompareOp::Lt, Some(o)) => o == Ordering::Less,
            (CompareOp::Le, Some(o)) => o != Ordering::Greater,
            (CompareOp::Gt, Some(o)) => o == Ordering::Greater,
            (CompareOp::Ge, Some(o)) => o != Ordering::Less,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        f.write_str(symbol)
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// A number, with the text it was written as.
    Number { value: f64, text: String },
    /// An option name or a (possibly quoted) string.
    Text(String),
}

impl Literal {
    fn text(&self) -> &str {
        match self {
            Literal::Number { text, .. } => text,
            Literal::Text(text) => text,
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            Literal::Number { value, .. } => Some(*value),
            Literal::Text(text) => parse_finite(text),
        }
    }
}

/// Left-hand side of a comparison: a decision or block, by value or by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// The chosen option itself.
    Value(Id),
    /// Zero-based position of the chosen option; `-1` while unmade.
    Index(Id),
}

impl Operand {
    /// Decision or block named by the operand.
    pub fn name(&self) -> Id {
        match self {
            Operand::Value(name) | Operand::Index(name) => *name,
        }
    }
}

/// Atom referenced by a condition, in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Variable(Id),
    IndexVariable(Id),
    Literal(Literal),
}

/// Boolean expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Compare {
        lhs: Operand,
        op: CompareOp,
        rhs: Literal,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// What a name is bound to in the current partial universe.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    /// The decision has not been made (or the block not visited) yet.
    Unmade,
    /// A placeholder decision bound to one of its options.
    Value(&'a OptionValue),
    /// A visited block: its chosen option, or its own name for plain blocks.
    Label(Id),
}

/// Binding view consulted while evaluating a condition.
pub trait Bindings {
    /// Value currently bound to `name`.
    fn resolve(&self, name: Id) -> Resolved<'_>;

    /// Index of the option bound to `name`, `-1` when unmade.
    fn index(&self, name: Id) -> i64;
}

/// A parsed condition with its source text and referenced atoms.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    source: String,
    expr: Expr,
    atoms: Vec<Atom>,
}

impl Condition {
    /// Assemble a condition from its parts.
    pub fn new(source: impl Into<String>, expr: Expr, atoms: Vec<Atom>) -> Self {
        Self {
            source: source.into(),
            expr,
            atoms,
        }
    }

    /// The condition string as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The expression tree.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Referenced atoms in source order.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// Names appearing on the left-hand side of a comparison, deduplicated,
    /// in source order.
    pub fn referenced_names(&self) -> Vec<Id> {
        let mut names = Vec::new();
        for atom in &self.atoms {
            if let Atom::Variable(name) | Atom::IndexVariable(name) = atom {
                if !names.contains(name) {
                    names.push(*name);
                }
            }
        }
        names
    }

    /// Evaluate against the current bindings.
    pub fn evaluate(&self, bindings: &impl Bindings) -> bool {
        eval(&self.expr, bindings)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn eval(expr: &Expr, bindings: &impl Bindings) -> bool {
    match expr {
        Expr::And(lhs, rhs) => eval(lhs, bindings) && eval(rhs, bindings),
        Expr::Or(lhs, rhs) => eval(lhs, bindings) || eval(rhs, bindings),
        Expr::Compare { lhs, op, rhs } => op.holds(compare(*lhs, rhs, bindings)),
    }
}

/// Order the bound value against the literal.
///
/// Both sides are compared as numbers when both have a numeric reading,
/// otherwise as text. An unmade value is unordered against everything.
fn compare(lhs: Operand, rhs: &Literal, bindings: &impl Bindings) -> Option<Ordering> {
    match lhs {
        Operand::Index(name) => {
            let index = bindings.index(name) as f64;
            rhs.number().and_then(|value| index.partial_cmp(&value))
        }
        Operand::Value(name) => {
            let text = match bindings.resolve(name) {
                Resolved::Unmade => return None,
                Resolved::Value(value) => {
                    if let (Some(l), Some(r)) = (value.as_number(), rhs.number()) {
                        return l.partial_cmp(&r);
                    }
                    value.to_string()
                }
                Resolved::Label(label) => label.to_string(),
            };
            match (parse_finite(&text), rhs.number()) {
                (Some(l), Some(r)) => l.partial_cmp(&r),
                _ => Some(text.as_str().cmp(rhs.text())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct Table {
        values: HashMap<Id, (OptionValue, i64)>,
        labels: HashMap<Id, (Id, i64)>,
    }

    impl Bindings for Table {
        fn resolve(&self, name: Id) -> Resolved<'_> {
            if let Some((value, _)) = self.values.get(&name) {
                return Resolved::Value(value);
            }
            if let Some((label, _)) = self.labels.get(&name) {
                return Resolved::Label(*label);
            }
            Resolved::Unmade
        }

        fn index(&self, name: Id) -> i64 {
            self.values
                .get(&name)
                .map(|(_, i)| *i)
                .or_else(|| self.labels.get(&name).map(|(_, i)| *i))
                .unwrap_or(-1)
        }
    }

    fn cmp(name: &str, op: CompareOp, rhs: Literal) -> Expr {
        Expr::Compare {
            lhs: Operand::Value(Id::new(name)),
            op,
            rhs,
        }
    }

    fn num(value: f64) -> Literal {
        Literal::Number {
            value,
            text: value.to_string(),
        }
    }

    fn condition(expr: Expr) -> Condition {
        Condition::new("test", expr, Vec::new())
    }

    fn table() -> Table {
        let mut table = Table::default();
        table
            .values
            .insert(Id::new("a"), (OptionValue::new(json!("if")), 0));
        table
            .values
            .insert(Id::new("b"), (OptionValue::new(json!(1.5)), 1));
        table.labels.insert(Id::new("B"), (Id::new("b1"), 0));
        table
    }

    #[test]
    fn test_text_equality() {
        let t = table();
        let c = condition(cmp("a", CompareOp::Eq, Literal::Text("if".into())));
        assert!(c.evaluate(&t));
        let c = condition(cmp("a", CompareOp::Ne, Literal::Text("if".into())));
        assert!(!c.evaluate(&t));
    }

    #[test]
    fn test_numeric_comparison() {
        let t = table();
        assert!(condition(cmp("b", CompareOp::Eq, num(1.5))).evaluate(&t));
        assert!(condition(cmp("b", CompareOp::Gt, num(1.0))).evaluate(&t));
        assert!(!condition(cmp("b", CompareOp::Le, num(1.0))).evaluate(&t));
    }

    #[test]
    fn test_block_label() {
        let t = table();
        assert!(condition(cmp("B", CompareOp::Eq, Literal::Text("b1".into()))).evaluate(&t));
        assert!(!condition(cmp("B", CompareOp::Eq, Literal::Text("b2".into()))).evaluate(&t));
    }

    #[test]
    fn test_non_finite_spellings_compare_as_text() {
        let mut t = table();
        t.labels.insert(Id::new("N"), (Id::new("nan"), 0));
        t.values
            .insert(Id::new("i"), (OptionValue::new(json!("inf")), 0));

        assert!(condition(cmp("N", CompareOp::Eq, Literal::Text("nan".into()))).evaluate(&t));
        assert!(!condition(cmp("N", CompareOp::Ne, Literal::Text("nan".into()))).evaluate(&t));
        assert!(condition(cmp("i", CompareOp::Eq, Literal::Text("inf".into()))).evaluate(&t));
        assert!(!condition(cmp("i", CompareOp::Eq, Literal::Text("infinity".into()))).evaluate(&t));
    }

    #[test]
    fn test_unmade_values() {
        let t = table();
        assert!(!condition(cmp("z", CompareOp::Eq, num(0.0))).evaluate(&t));
        assert!(condition(cmp("z", CompareOp::Ne, num(0.0))).evaluate(&t));
        assert!(!condition(cmp("z", CompareOp::Ge, num(0.0))).evaluate(&t));

        let unmade = Expr::Compare {
            lhs: Operand::Index(Id::new("z")),
            op: CompareOp::Eq,
            rhs: num(-1.0),
        };
        assert!(condition(unmade).evaluate(&t));
    }

    #[test]
    fn test_index_comparison() {
        let t = table();
        let expr = Expr::Compare {
            lhs: Operand::Index(Id::new("b")),
            op: CompareOp::Ge,
            rhs: num(1.0),
        };
        assert!(condition(expr).evaluate(&t));
    }

    #[test]
    fn test_and_or() {
        let t = table();
        let a_if = cmp("a", CompareOp::Eq, Literal::Text("if".into()));
        let b_two = cmp("b", CompareOp::Eq, num(2.0));
        let and = Expr::And(Box::new(a_if.clone()), Box::new(b_two.clone()));
        let or = Expr::Or(Box::new(a_if), Box::new(b_two));
        assert!(!condition(and).evaluate(&t));
        assert!(condition(or).evaluate(&t));
    }

    #[test]
    fn test_referenced_names_deduplicated() {
        let c = Condition::new(
            "a == 1 or a.index == 0 or B == b1",
            cmp("a", CompareOp::Eq, num(1.0)),
            vec![
                Atom::Variable(Id::new("a")),
                Atom::Literal(num(1.0)),
                Atom::IndexVariable(Id::new("a")),
                Atom::Literal(num(0.0)),
                Atom::Variable(Id::new("B")),
                Atom::Literal(Literal::Text("b1".into())),
            ],
        );
        assert_eq!(c.referenced_names(), vec![Id::new("a"), Id::new("B")]);
    }
}
