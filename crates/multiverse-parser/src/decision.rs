//! Decision registry.
//!
//! Collects placeholder decisions from the specification and from inline
//! definitions in the template, and rejects duplicates.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

use multiverse_core::{decision::Decision, identifier::Id, value::OptionValue};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    sample::sample_options,
    span::Span,
    spec::RawDecision,
};

/// Where a decision was declared.
#[derive(Debug, Clone, Copy)]
enum Origin {
    Spec,
    Inline(Span),
}

#[derive(Debug, Default)]
pub(crate) struct DecisionRegistry {
    decisions: IndexMap<Id, Decision>,
    origins: HashMap<Id, Origin>,
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl DecisionRegistry {
    /// Register the decisions of the specification document.
    ///
    /// Invalid entries are reported to `collector` and skipped.
    pub fn from_spec(
        raw: Vec<RawDecision>,
        default_seed: u64,
        collector: &mut DiagnosticCollector,
    ) -> Self {
        let mut registry = Self::default();
        for RawDecision { var, options, desc } in raw {
            if !is_identifier(&var) {
                collector.emit(
                    Diagnostic::error(format!("invalid decision name `{var}`"))
                        .with_code(ErrorCode::E005)
                        .with_help("decision names start with a letter and contain letters, digits and `_`"),
                );
                continue;
            }
            let id = Id::new(&var);
            if registry.decisions.contains_key(&id) {
                collector.emit(
                    Diagnostic::error(format!("decision `{var}` is declared more than once"))
                        .with_code(ErrorCode::E201),
                );
                continue;
            }

            let options = match options {
                Value::Array(values) if !values.is_empty() => {
                    values.into_iter().map(OptionValue::new).collect()
                }
                Value::Array(_) => {
                    collector.emit(
                        Diagnostic::error(format!("decision `{var}` has no options"))
                            .with_code(ErrorCode::E005),
                    );
                    continue;
                }
                descriptor @ Value::Object(_) => {
                    match sample_options(&var, descriptor, default_seed) {
                        Ok(options) => options,
                        Err(diag) => {
                            collector.emit(diag);
                            continue;
                        }
                    }
                }
                other => {
                    collector.emit(
                        Diagnostic::error(format!(
                            "decision `{var}`: options must be a list or a sampling descriptor, found `{other}`"
                        ))
                        .with_code(ErrorCode::E005),
                    );
                    continue;
                }
            };

            let mut decision = Decision::new(id, options);
            if let Some(desc) = desc {
                decision = decision.with_desc(desc);
            }
            registry.decisions.insert(id, decision);
            registry.origins.insert(id, Origin::Spec);
        }
        registry
    }

    /// Register an inline definition `{{name=...}}` found at `span`.
    pub fn define_inline(
        &mut self,
        name: &str,
        options: Vec<Value>,
        span: Span,
    ) -> Result<(), Diagnostic> {
        let id = Id::new(name);
        if let Some(origin) = self.origins.get(&id) {
            let diag = Diagnostic::error(format!("decision `{name}` is defined more than once"))
                .with_code(ErrorCode::E201)
                .with_label(span, "redefined here");
            return Err(match origin {
                Origin::Inline(first) => diag.with_secondary_label(*first, "first defined here"),
                Origin::Spec => diag.with_help(format!(
                    "`{name}` is declared in the specification; reference it as `{{{{{name}}}}}`"
                )),
            });
        }
        let options = options.into_iter().map(OptionValue::new).collect();
        self.decisions.insert(id, Decision::new(id, options));
        self.origins.insert(id, Origin::Inline(span));
        Ok(())
    }

    pub fn contains(&self, name: Id) -> bool {
        self.decisions.contains_key(&name)
    }

    pub fn get(&self, name: Id) -> Option<&Decision> {
        self.decisions.get(&name)
    }

    /// Span of the inline definition of `name`, if it was defined inline.
    pub fn inline_span(&self, name: Id) -> Option<Span> {
        match self.origins.get(&name) {
            Some(Origin::Inline(span)) => Some(*span),
            _ => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = Id> + '_ {
        self.decisions.keys().copied()
    }

    pub fn into_decisions(self) -> IndexMap<Id, Decision> {
        self.decisions
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw(var: &str, options: Value) -> RawDecision {
        RawDecision {
            var: var.to_string(),
            options,
            desc: None,
        }
    }

    #[test]
    fn test_spec_decisions() {
        let mut collector = DiagnosticCollector::new();
        let registry = DecisionRegistry::from_spec(
            vec![
                raw("a", json!([2, 2.5, "x"])),
                raw(
                    "s",
                    json!({"sample": "uniform", "count": 4, "min": 0, "max": 1}),
                ),
            ],
            0,
            &mut collector,
        );
        assert!(collector.finish().is_ok());

        let a = registry.get(Id::new("a")).unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(a.position_of("x"), Some(2));
        assert_eq!(registry.get(Id::new("s")).unwrap().len(), 4);
        assert_eq!(registry.inline_span(Id::new("a")), None);
    }

    #[test]
    fn test_invalid_spec_decisions() {
        let mut collector = DiagnosticCollector::new();
        let registry = DecisionRegistry::from_spec(
            vec![
                raw("a", json!([1])),
                raw("a", json!([2])),
                raw("1b", json!([1])),
                raw("c", json!([])),
                raw("d", json!("oops")),
                raw("e", json!({"sample": "poisson", "count": 2})),
            ],
            0,
            &mut collector,
        );
        assert_eq!(registry.names().count(), 1);

        let err = collector.finish().unwrap_err();
        let codes: Vec<_> = err.diagnostics().iter().map(|d| d.code()).collect();
        assert_eq!(codes, vec![
            Some(ErrorCode::E201),
            Some(ErrorCode::E005),
            Some(ErrorCode::E005),
            Some(ErrorCode::E005),
            Some(ErrorCode::E501),
        ]);
    }

    #[test]
    fn test_inline_redefinition() {
        let mut collector = DiagnosticCollector::new();
        let mut registry =
            DecisionRegistry::from_spec(vec![raw("a", json!([1, 2]))], 0, &mut collector);

        registry
            .define_inline("b", vec![json!(1), json!(2)], Span::new(0..10))
            .unwrap();
        assert_eq!(registry.inline_span(Id::new("b")), Some(Span::new(0..10)));

        let err = registry
            .define_inline("b", vec![json!(3)], Span::new(20..30))
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E201));
        assert_eq!(err.labels().len(), 2);

        let err = registry
            .define_inline("a", vec![json!(3)], Span::new(40..50))
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E201));
        assert!(err.help().is_some());
    }
}
