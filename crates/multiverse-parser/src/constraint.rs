//! Constraint registry.
//!
//! Validates the `constraints` section of the specification together with
//! the `@if` conditions of block markers, and expands `link` groups into
//! per-option constraints.

use serde_json::Value;

use multiverse_core::{
    condition::{CompareOp, Condition, Expr, Literal, Operand},
    constraint::{Constraint, ConstraintOrigin, ConstraintSet, ConstraintTarget},
    identifier::Id,
    template::Template,
    value::OptionValue,
};

use crate::{
    condition::{from_expr, parse_condition},
    decision::DecisionRegistry,
    error::{Diagnostic, DiagnosticCollector, ErrorCode, Result},
    span::Span,
    spec::RawConstraint,
    template::MarkerCondition,
};

fn shape_error(entry: usize, message: impl std::fmt::Display) -> Diagnostic {
    Diagnostic::error(format!("constraint #{entry}: {message}")).with_code(ErrorCode::E400)
}

struct Registry<'r> {
    template: &'r Template,
    decisions: &'r DecisionRegistry,
    collector: &'r mut DiagnosticCollector,
    constraints: ConstraintSet,
}

impl Registry<'_> {
    /// Reject conditions that mention names which are neither decisions nor
    /// blocks. `span` locates the condition in the template, when it is there.
    fn check_names(&self, condition: &Condition, span: Option<Span>) -> Result<()> {
        for name in condition.referenced_names() {
            if self.decisions.contains(name) || self.template.has_name(name) {
                continue;
            }
            let mut diag = Diagnostic::error(format!(
                "condition `{condition}` references unknown name `{name}`"
            ))
            .with_code(ErrorCode::E100)
            .with_help("conditions may compare decisions and blocks");
            if let Some(span) = span {
                diag = diag.with_label(span, "in this condition");
            }
            return Err(diag);
        }
        Ok(())
    }

    fn marker(&mut self, marker: &MarkerCondition<'_>) -> Result<()> {
        let condition =
            parse_condition(marker.text).map_err(|diag| diag.relocate(Some(marker.span.start())))?;
        self.check_names(&condition, Some(marker.span))?;
        self.constraints.add(Constraint::new(
            ConstraintTarget::Block { node: marker.node },
            condition,
            ConstraintOrigin::Marker,
        ));
        Ok(())
    }

    fn declared(&mut self, entry: usize, raw: RawConstraint) -> Result<()> {
        if let Some(link) = raw.link {
            if raw.block.is_some()
                || raw.variable.is_some()
                || raw.option.is_some()
                || raw.index.is_some()
                || raw.condition.is_some()
            {
                return Err(shape_error(entry, "a link takes no other fields"));
            }
            return self.link(entry, &link);
        }

        let target = match (&raw.block, &raw.variable) {
            (Some(_), Some(_)) => {
                return Err(shape_error(entry, "give either `block` or `variable`, not both"));
            }
            (None, None) => {
                return Err(shape_error(entry, "missing `block` or `variable`")
                    .with_help(r#"for example {"block": "B", "condition": "a == 1"}"#));
            }
            (Some(block), None) => self.block_target(entry, block, &raw)?,
            (None, Some(variable)) => self.option_target(entry, variable, &raw)?,
        };

        let Some(text) = raw.condition.as_deref() else {
            return Err(shape_error(entry, "missing `condition`"));
        };
        let condition = parse_condition(text).map_err(|diag| diag.relocate(None))?;
        self.check_names(&condition, None)?;

        let mut skip = raw.skip.unwrap_or(false);
        if skip && matches!(target, ConstraintTarget::Option { .. }) {
            self.collector.emit(
                Diagnostic::warning(format!(
                    "constraint #{entry}: `skip` has no effect on option constraints"
                ))
                .with_code(ErrorCode::E400),
            );
            skip = false;
        }

        self.constraints.add(
            Constraint::new(target, condition, ConstraintOrigin::Declared).with_skip(skip),
        );
        Ok(())
    }

    fn block_target(
        &self,
        entry: usize,
        block: &str,
        raw: &RawConstraint,
    ) -> Result<ConstraintTarget> {
        let name = Id::new(block);
        if !self.template.has_name(name) {
            return Err(Diagnostic::error(format!(
                "constraint #{entry}: block `{block}` does not exist"
            ))
            .with_code(ErrorCode::E101));
        }
        let options = self.template.block_decisions().get(&name).cloned();

        let node = match (&raw.option, raw.index) {
            (Some(_), Some(_)) => {
                return Err(shape_error(entry, "give either `option` or `index`, not both"));
            }
            (None, None) => name,
            (Some(option), None) => {
                let text = option_text(option);
                let node = name.with_option(Id::new(&text));
                if self.template.block(node).is_none() {
                    return Err(Diagnostic::error(format!(
                        "constraint #{entry}: block `{block}` has no option `{text}`"
                    ))
                    .with_code(ErrorCode::E102));
                }
                node
            }
            (None, Some(index)) => {
                let nodes = options.unwrap_or_default();
                match usize::try_from(index).ok().and_then(|i| nodes.get(i)) {
                    Some(node) => *node,
                    None => {
                        return Err(Diagnostic::error(format!(
                            "constraint #{entry}: block `{block}` has no option at index {index}"
                        ))
                        .with_code(ErrorCode::E102));
                    }
                }
            }
        };
        Ok(ConstraintTarget::Block { node })
    }

    fn option_target(
        &self,
        entry: usize,
        variable: &str,
        raw: &RawConstraint,
    ) -> Result<ConstraintTarget> {
        let Some(decision) = self.decisions.get(Id::new(variable)) else {
            return Err(Diagnostic::error(format!(
                "constraint #{entry}: decision `{variable}` is not declared"
            ))
            .with_code(ErrorCode::E100));
        };

        let index = match (&raw.option, raw.index) {
            (Some(_), Some(_)) => {
                return Err(shape_error(entry, "give either `option` or `index`, not both"));
            }
            (None, None) => {
                return Err(shape_error(
                    entry,
                    format!("constraint on decision `{variable}` must name an `option` or `index`"),
                ));
            }
            (Some(option), None) => {
                let text = option_text(option);
                decision.position_of(&text).ok_or_else(|| {
                    Diagnostic::error(format!(
                        "constraint #{entry}: decision `{variable}` has no option `{text}`"
                    ))
                    .with_code(ErrorCode::E102)
                })?
            }
            (None, Some(index)) => usize::try_from(index)
                .ok()
                .filter(|i| *i < decision.len())
                .ok_or_else(|| {
                    Diagnostic::error(format!(
                        "constraint #{entry}: decision `{variable}` has no option at index {index}"
                    ))
                    .with_code(ErrorCode::E102)
                })?,
        };
        Ok(ConstraintTarget::Option {
            variable: decision.var(),
            index,
        })
    }

    /// Expand `{"link": [a, b, ...]}`: option `k` of each member requires every
    /// other member to be unmade or at option `k`.
    fn link(&mut self, entry: usize, members: &[String]) -> Result<()> {
        if members.len() < 2 {
            return Err(shape_error(entry, "a link needs at least two decisions"));
        }

        if let Some(twice) = members
            .iter()
            .enumerate()
            .find_map(|(i, m)| members[..i].contains(m).then_some(m))
        {
            return Err(shape_error(entry, format!("`{twice}` appears twice in the link")));
        }

        let block_decisions = self.template.block_decisions();
        let mut resolved: Vec<(Id, Vec<ConstraintTarget>)> = Vec::new();
        for member in members {
            let name = Id::new(member);
            let targets: Vec<ConstraintTarget> = if let Some(decision) = self.decisions.get(name) {
                (0..decision.len())
                    .map(|index| ConstraintTarget::Option {
                        variable: name,
                        index,
                    })
                    .collect()
            } else if let Some(nodes) = block_decisions.get(&name) {
                nodes
                    .iter()
                    .map(|node| ConstraintTarget::Block { node: *node })
                    .collect()
            } else {
                return Err(Diagnostic::error(format!(
                    "constraint #{entry}: linked decision `{member}` does not exist"
                ))
                .with_code(ErrorCode::E100)
                .with_help("links accept placeholder decisions and blocks with options"));
            };
            resolved.push((name, targets));
        }

        let count = resolved[0].1.len();
        if let Some((name, targets)) = resolved.iter().find(|(_, t)| t.len() != count) {
            return Err(Diagnostic::error(format!(
                "constraint #{entry}: linked decisions have different option counts: `{}` has {count}, `{name}` has {}",
                resolved[0].0,
                targets.len()
            ))
            .with_code(ErrorCode::E401));
        }

        for (name, targets) in &resolved {
            for (index, target) in targets.iter().enumerate() {
                let others: Vec<Id> = resolved
                    .iter()
                    .map(|(other, _)| *other)
                    .filter(|other| other != name)
                    .collect();
                self.constraints.add(Constraint::new(
                    *target,
                    linked_condition(others[0], &others[1..], index),
                    ConstraintOrigin::Link,
                ));
            }
        }
        Ok(())
    }
}

/// Rendered text of an option given in the specification.
fn option_text(option: &Value) -> String {
    OptionValue::new(option.clone()).to_string()
}

fn index_is(name: Id, index: i64) -> Expr {
    Expr::Compare {
        lhs: Operand::Index(name),
        op: CompareOp::Eq,
        rhs: Literal::Number {
            value: index as f64,
            text: index.to_string(),
        },
    }
}

/// `(b.index == k or b.index == -1) and (c.index == k or c.index == -1) ...`
fn linked_condition(first: Id, rest: &[Id], index: usize) -> Condition {
    let index = index as i64;
    let clause = |name: Id| {
        Expr::Or(
            Box::new(index_is(name, index)),
            Box::new(index_is(name, -1)),
        )
    };
    let text = |name: Id| format!("{name}.index == {index} or {name}.index == -1");

    if rest.is_empty() {
        return from_expr(text(first), clause(first));
    }
    let mut expr = clause(first);
    let mut source = vec![format!("({})", text(first))];
    for name in rest {
        expr = Expr::And(Box::new(expr), Box::new(clause(*name)));
        source.push(format!("({})", text(*name)));
    }
    from_expr(source.join(" and "), expr)
}

/// Validate all constraints.
///
/// Marker conditions come first in template order, then the declared
/// constraints in document order. Invalid entries are reported to `collector`.
pub(crate) fn build_constraints(
    raw: Vec<RawConstraint>,
    markers: &[MarkerCondition<'_>],
    template: &Template,
    decisions: &DecisionRegistry,
    collector: &mut DiagnosticCollector,
) -> ConstraintSet {
    let mut registry = Registry {
        template,
        decisions,
        collector,
        constraints: ConstraintSet::new(),
    };
    for marker in markers {
        if let Err(diag) = registry.marker(marker) {
            registry.collector.emit(diag);
        }
    }
    for (entry, raw) in raw.into_iter().enumerate() {
        if let Err(diag) = registry.declared(entry + 1, raw) {
            registry.collector.emit(diag);
        }
    }
    registry.constraints
}
