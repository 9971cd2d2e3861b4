//! Flow graph builder.
//!
//! The `graph` section lists chains such as `A->B->C`; several chains may
//! share one entry when separated by blanks. Without a `graph` section the
//! blocks are chained in template order.
//!
//! Blocks with options are expanded: an edge `A->B` where `A` has options
//! `a1` and `a2` becomes `A:a1->B` and `A:a2->B`.
//!
//! Leading code (`_start`) joins the default graph as its first node. An
//! explicit graph leaves it out unless it names `_start` itself; the analyzer
//! then prepends it to every path.

use indexmap::IndexSet;
use winnow::{
    Parser as _,
    ascii::{multispace0, space0},
    combinator::{cut_err, opt, preceded, repeat},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{one_of, take_while},
};

use multiverse_core::{graph::FlowGraph, identifier::Id, template::Template};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, Result},
    marker::Input,
};

type IResult<O> = ModalResult<O, ContextError<&'static str>>;

fn fail<O>(input: &mut Input<'_>, message: &'static str) -> IResult<O> {
    Err(ErrMode::Cut(ContextError::new().add_context(
        input,
        &input.checkpoint(),
        message,
    )))
}

fn node<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

fn arrow(input: &mut Input<'_>) -> IResult<()> {
    ('-', cut_err('>').context("expected `->`"))
        .void()
        .parse_next(input)
}

fn chain<'a>(input: &mut Input<'a>) -> IResult<Vec<&'a str>> {
    let mut nodes = vec![node.parse_next(input)?];
    loop {
        let checkpoint = input.checkpoint();
        space0.parse_next(input)?;
        if opt(arrow).parse_next(input)?.is_none() {
            input.reset(&checkpoint);
            break;
        }
        space0.parse_next(input)?;
        let next = cut_err(node)
            .context("no target node for edge")
            .parse_next(input)?;
        nodes.push(next);
    }
    Ok(nodes)
}

fn graph_entry<'a>(input: &mut Input<'a>) -> IResult<Vec<Vec<&'a str>>> {
    let chains = repeat(0.., preceded(multispace0, chain)).parse_next(input)?;
    multispace0.parse_next(input)?;
    if input.starts_with("->") {
        return fail(input, "no source node for edge");
    }
    if !input.is_empty() {
        return fail(input, "unexpected character");
    }
    Ok(chains)
}

/// Parse one `graph` entry into its chains.
fn parse_entry(entry: &str) -> Result<Vec<Vec<&str>>> {
    let mut input = LocatingSlice::new(entry);
    graph_entry.parse_next(&mut input).map_err(|err| {
        let message = match &err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx.context().next().copied(),
            ErrMode::Incomplete(_) => None,
        }
        .unwrap_or("malformed graph");
        let column = input.current_token_start();
        Diagnostic::error(format!(
            "graph entry `{entry}`: {message} at character {}",
            column + 1
        ))
        .with_code(ErrorCode::E004)
        .with_help(r#"graph entries are chains like "A->B->C""#)
    })
}

/// The block-level flow graph before options are expanded.
fn block_graph(
    entries: &[String],
    template: &Template,
    collector: &mut DiagnosticCollector,
) -> FlowGraph {
    let mut graph = FlowGraph::new();
    if entries.is_empty() {
        let order = template.order();
        for name in order {
            graph.add_node(*name);
        }
        for pair in order.windows(2) {
            graph.add_edge(pair[0], pair[1]);
        }
        return graph;
    }

    for entry in entries {
        match parse_entry(entry) {
            Ok(chains) => {
                for chain in chains {
                    let ids: Vec<Id> = chain.into_iter().map(Id::new).collect();
                    for id in &ids {
                        graph.add_node(*id);
                    }
                    for pair in ids.windows(2) {
                        graph.add_edge(pair[0], pair[1]);
                    }
                }
            }
            Err(diag) => collector.emit(diag),
        }
    }

    for name in graph.nodes() {
        if !template.has_name(name) {
            collector.emit(
                Diagnostic::warning(format!(
                    "graph node `{name}` has no block; it contributes no code"
                ))
                .with_code(ErrorCode::E300),
            );
        }
    }
    for name in template.order() {
        if !graph.contains(*name) && !name.to_string().starts_with('_') {
            collector.emit(
                Diagnostic::warning(format!(
                    "block `{name}` is not in the graph and will never be emitted"
                ))
                .with_code(ErrorCode::E301),
            );
        }
    }

    graph
}

/// The flow graph and the names it was written with.
#[derive(Debug)]
pub(crate) struct BuiltGraph {
    pub graph: FlowGraph,
    /// Block-level node names, before expansion.
    pub names: IndexSet<Id>,
}

/// Build the expanded flow graph.
pub(crate) fn build_graph(
    entries: &[String],
    template: &Template,
    collector: &mut DiagnosticCollector,
) -> BuiltGraph {
    let blocks = block_graph(entries, template, collector);
    let options = template.block_decisions();
    let expand = |name: Id| -> Vec<Id> {
        match options.get(&name) {
            Some(nodes) => nodes.clone(),
            None => vec![name],
        }
    };

    let mut graph = FlowGraph::new();
    for name in blocks.nodes() {
        for node in expand(name) {
            graph.add_node(node);
        }
    }
    for (source, target) in blocks.edges() {
        for from in expand(source) {
            for to in expand(target) {
                graph.add_edge(from, to);
            }
        }
    }

    BuiltGraph {
        graph,
        names: blocks.nodes().collect(),
    }
}
