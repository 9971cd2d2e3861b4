//! Universe generation.
//!
//! Each path is expanded depth first over its `(node, chunk)` sequence. A
//! branch owns its text and [`History`]; both are cloned where the
//! recursion forks over the options of a decision.

use std::mem;

use indexmap::IndexMap;
use log::{debug, info, trace};

use multiverse_core::{
    condition::{Bindings, Resolved},
    constraint::Constraint,
    history::{History, Universe},
    identifier::Id,
    program::Program,
    template::Chunk,
};

use crate::analyze::Path;

/// Outcome of the block constraints of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    /// Every constraint holds: emit the node's code.
    Enter,
    /// A skipping constraint failed: omit the code, keep the path.
    Skip,
    /// A constraint failed: discard the branch.
    Abort,
}

/// Binding view for one point of the recursion.
///
/// Placeholder decisions resolve through the history. Block names resolve to
/// the option their node takes on the path, wherever it lies, unless that
/// node has been skipped.
struct Scope<'a> {
    program: &'a Program,
    block_decisions: &'a IndexMap<Id, Vec<Id>>,
    path: &'a [Id],
    history: &'a History,
}

impl Scope<'_> {
    /// The path node standing for block name `name`.
    fn visited(&self, name: Id) -> Option<Id> {
        self.path.iter().copied().find(|node| {
            !self.history.is_skipped(*node) && block_name(self.program, *node) == name
        })
    }
}

impl Bindings for Scope<'_> {
    fn resolve(&self, name: Id) -> Resolved<'_> {
        if let Some(binding) = self.history.binding(name) {
            return Resolved::Value(&binding.option);
        }
        match self.visited(name) {
            Some(node) => Resolved::Label(
                self.program
                    .template()
                    .block(node)
                    .map(|block| block.option().unwrap_or(block.name()))
                    .unwrap_or(node),
            ),
            None => Resolved::Unmade,
        }
    }

    fn index(&self, name: Id) -> i64 {
        if let Some(binding) = self.history.binding(name) {
            return binding.index as i64;
        }
        let Some(node) = self.visited(name) else {
            return -1;
        };
        self.block_decisions
            .get(&name)
            .and_then(|options| options.iter().position(|option| *option == node))
            .map_or(0, |index| index as i64)
    }
}

/// Block name of a flow graph node; nodes without a block stand for
/// themselves.
fn block_name(program: &Program, node: Id) -> Id {
    program
        .template()
        .block(node)
        .map_or(node, |block| block.name())
}

/// Expands the paths of one program.
struct Generator<'a> {
    program: &'a Program,
    block_decisions: IndexMap<Id, Vec<Id>>,
    universes: Vec<Universe>,
}

impl<'a> Generator<'a> {
    fn new(program: &'a Program) -> Self {
        Self {
            program,
            block_decisions: program.template().block_decisions(),
            universes: Vec::new(),
        }
    }

    fn scope<'s>(&'s self, path: &'s [Id], history: &'s History) -> Scope<'s> {
        Scope {
            program: self.program,
            block_decisions: &self.block_decisions,
            path,
            history,
        }
    }

    /// Evaluate the block constraints of the node at `position`: those of the
    /// node itself, then those of its block-level decision.
    fn gate(&self, path: &[Id], position: usize, history: &History) -> Gate {
        let node = path[position];
        let constraints = self.program.constraints();
        let parameter = self
            .program
            .template()
            .block(node)
            .and_then(|block| block.parameter());

        let scope = self.scope(path, history);
        let mut checks: Vec<&Constraint> = constraints.for_block(node).iter().collect();
        if let Some(parameter) = parameter {
            checks.extend(constraints.for_block(parameter));
        }
        for constraint in checks {
            if !constraint.condition().evaluate(&scope) {
                trace!(
                    node:% = node,
                    condition:% = constraint.condition(),
                    skip = constraint.skip();
                    "Block constraint failed"
                );
                return if constraint.skip() {
                    Gate::Skip
                } else {
                    Gate::Abort
                };
            }
        }
        Gate::Enter
    }

    fn node(&mut self, path: &[Id], position: usize, text: String, mut history: History) {
        if position == path.len() {
            self.universes.push(Universe::new(text, history));
            return;
        }

        match self.gate(path, position, &history) {
            Gate::Enter => self.chunk(path, position, 0, text, history),
            Gate::Skip => {
                history.skip(path[position]);
                self.node(path, position + 1, text, history);
            }
            Gate::Abort => {}
        }
    }

    fn chunk(
        &mut self,
        path: &[Id],
        position: usize,
        index: usize,
        mut text: String,
        mut history: History,
    ) {
        let program = self.program;
        let chunks: &[Chunk] = program
            .template()
            .block(path[position])
            .map(|block| block.chunks())
            .unwrap_or_default();
        let Some(chunk) = chunks.get(index) else {
            self.node(path, position + 1, text, history);
            return;
        };

        text.push_str(chunk.code());
        let Some(variable) = chunk.variable() else {
            self.chunk(path, position, index + 1, text, history);
            return;
        };

        let bound = history
            .binding(variable)
            .map(|binding| binding.option.to_string());
        if let Some(value) = bound {
            text.push_str(&value);
            self.chunk(path, position, index + 1, text, history);
            return;
        }

        let Some(decision) = program.decision(variable) else {
            self.chunk(path, position, index + 1, text, history);
            return;
        };
        let constraints = program.constraints();
        let allowed: Vec<usize> = {
            let scope = self.scope(path, &history);
            (0..decision.len())
                .filter(|k| {
                    constraints
                        .for_option(variable, *k)
                        .iter()
                        .all(|constraint| constraint.condition().evaluate(&scope))
                })
                .collect()
        };
        trace!(
            decision:% = variable,
            options = decision.len(),
            allowed = allowed.len();
            "Expanding decision"
        );

        let last = allowed.len().saturating_sub(1);
        for (n, k) in allowed.iter().copied().enumerate() {
            let Some(option) = decision.option(k) else {
                continue;
            };
            let (mut text, mut history) = if n == last {
                (mem::take(&mut text), mem::take(&mut history))
            } else {
                (text.clone(), history.clone())
            };
            text.push_str(&option.to_string());
            history.bind(variable, option.clone(), k);
            self.chunk(path, position, index + 1, text, history);
        }
    }
}

/// Generate every universe of `program` along `paths`.
///
/// Universes are produced path by path, then in option order of each
/// decision as it is first met along the path.
pub fn generate(program: &Program, paths: &[Path]) -> Vec<Universe> {
    let mut generator = Generator::new(program);
    for (index, path) in paths.iter().enumerate() {
        let before = generator.universes.len();
        generator.node(path, 0, String::new(), History::new(index));
        debug!(
            path = index,
            universes = generator.universes.len() - before;
            "Path expanded"
        );
    }
    info!(universes = generator.universes.len(); "Universes generated");
    generator.universes
}

/// Upper bound on the number of universes: the product of the option
/// counts of all placeholder decisions times the number of paths.
pub fn cardinality(program: &Program, paths: &[Path]) -> u64 {
    program
        .decisions()
        .values()
        .fold(paths.len() as u64, |total, decision| {
            total.saturating_mul(decision.len() as u64)
        })
}

#[cfg(test)]
mod tests {
    use multiverse_parser::{ParseConfig, parse};

    use super::*;
    use crate::analyze::paths;

    fn run(template: &str, spec: Option<&str>) -> Vec<Universe> {
        let program = parse(template, spec, ParseConfig::default()).expect("Failed to parse");
        let paths = paths(&program).expect("Failed to analyze");
        generate(&program, &paths)
    }

    fn texts(universes: &[Universe]) -> Vec<&str> {
        universes.iter().map(Universe::text).collect()
    }

    #[test]
    fn test_placeholders_expand_in_order() {
        let universes = run("x = {{a=1,2}}\ny = {{b=\"p\",\"q\"}}\n", None);
        assert_eq!(texts(&universes), vec![
            "x = 1\ny = p\n",
            "x = 1\ny = q\n",
            "x = 2\ny = p\n",
            "x = 2\ny = q\n",
        ]);
    }

    #[test]
    fn test_reused_decision_is_single_valued() {
        let universes = run("x = {{a=1,2}}\n# --- (B)\ny = {{a}} + {{a}}\n", None);
        assert_eq!(texts(&universes), vec![
            "x = 1\ny = 1 + 1\n",
            "x = 2\ny = 2 + 2\n"
        ]);
        assert_eq!(universes[1].history().bindings().len(), 1);
    }

    #[test]
    fn test_option_constraint_prunes() {
        let spec = r#"{"constraints": [{"variable": "b", "index": 0, "condition": "a == 2"}]}"#;
        let universes = run("{{a=1,2}} {{b=3,4}}\n", Some(spec));
        assert_eq!(texts(&universes), vec!["1 4\n", "2 3\n", "2 4\n"]);
    }

    #[test]
    fn test_block_option_labels() {
        let template = "\
# --- (A) a1
# --- (A) a2
# --- (B) @if A == a2
b
";
        let universes = run(template, None);
        assert_eq!(texts(&universes), vec!["b\n"]);
        assert_eq!(universes[0].history().path(), 1);
    }

    #[test]
    fn test_block_index() {
        let template = "\
# --- (A) a1
# --- (A) a2
# --- (A) a3
# --- (B) @if A.index >= 1
b
";
        assert_eq!(run(template, None).len(), 2);
    }

    #[test]
    fn test_condition_sees_later_block() {
        let template = "\
# --- (A) @if B == b1
a
# --- (B) b1
x
# --- (B) b2
y
";
        let universes = run(template, None);
        assert_eq!(texts(&universes), vec!["a\nx\n"]);

        // A skipped block is not bound, so the later condition sees it unmade.
        let template = "\
# --- (A) a1
# --- (A) a2
# --- (B)
b
# --- (C) @if B != B
c
";
        let spec = r#"{"constraints": [{"block": "B", "condition": "A == a1", "skip": true}]}"#;
        let universes = run(template, Some(spec));
        assert_eq!(texts(&universes), vec!["c\n"]);
        assert_eq!(universes[0].history().skipped(), &[Id::new("B")]);
    }

    #[test]
    fn test_unmade_decision_fails_block_constraint() {
        let template = "\
# --- (A)
a
# --- (B)
{{b=1,2}}
";
        let spec = r#"{"constraints": [{"block": "A", "condition": "b.index == 0"}]}"#;
        assert!(run(template, Some(spec)).is_empty());
        let spec = r#"{"constraints": [{"block": "B", "condition": "b.index == 0"}]}"#;
        assert!(run(template, Some(spec)).is_empty());
    }

    #[test]
    fn test_cardinality() {
        let template = "\
# --- (A) a1
{{x=1,2,3}}
# --- (A) a2
{{y=1,2}}
";
        let program = parse(template, None, ParseConfig::default()).unwrap();
        let paths = paths(&program).unwrap();
        assert_eq!(cardinality(&program, &paths), 12);
        assert_eq!(generate(&program, &paths).len(), 5);
    }
}
