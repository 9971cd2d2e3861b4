//! Template reading.
//!
//! Two passes over the template lines. [`split_config`] lifts the embedded
//! configuration block out of the code:
//!
//! ```text
//! # --- (MULTIVERSE_CONFIG)
//! # {"graph": ["A->B"]}
//! # --- (END)
//! ```
//!
//! Configuration lines may carry a leading `#` so the template stays valid
//! source code. [`build_template`] then cuts the remaining lines into blocks
//! at marker lines and splits each block into chunks at placeholders.

use std::{collections::HashMap, mem};

use indexmap::IndexMap;
use log::debug;

use multiverse_core::{
    identifier::Id,
    template::{Block, Chunk, START_BLOCK, Template},
};

use crate::{
    decision::DecisionRegistry,
    error::{Diagnostic, DiagnosticCollector, ErrorCode, Result},
    marker::{Marker, is_marker, parse_marker},
    placeholder::{Segment, scan},
    span::Span,
};

const CONFIG_BLOCK: &str = "MULTIVERSE_CONFIG";
const CONFIG_END: &str = "END";

/// A template line, terminator included, with its offset in the template.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Line<'a> {
    pub text: &'a str,
    pub offset: usize,
}

impl<'a> Line<'a> {
    fn content(&self) -> &'a str {
        self.text.trim_end_matches(['\n', '\r'])
    }
}

/// The configuration block found in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConfigBlock {
    /// The configuration text with comment prefixes blanked out.
    pub text: String,
    /// Offset of the first configuration line in the template.
    pub offset: usize,
    /// The opening marker.
    pub span: Span,
}

/// Template lines with the configuration block removed.
#[derive(Debug)]
pub(crate) struct SplitTemplate<'a> {
    pub config: Option<ConfigBlock>,
    pub lines: Vec<Line<'a>>,
}

/// Replace a leading `#` with a blank so JSON offsets stay aligned with the
/// template.
fn uncomment(line: &str) -> String {
    let indent = line.len() - line.trim_start().len();
    if line[indent..].starts_with('#') {
        format!("{} {}", &line[..indent], &line[indent + 1..])
    } else {
        line.to_string()
    }
}

fn marker_with_id<'a>(line: &Line<'a>, id: &str) -> Option<Marker<'a>> {
    if !is_marker(line.text) {
        return None;
    }
    parse_marker(line.content(), line.offset)
        .ok()
        .filter(|marker| marker.id == id && marker.option.is_none() && marker.condition.is_none())
}

/// Separate the configuration block from the code lines.
pub(crate) fn split_config(source: &str) -> Result<SplitTemplate<'_>> {
    let mut lines = Vec::new();
    let mut config: Option<ConfigBlock> = None;
    let mut open: Option<(Span, usize, String)> = None;
    let mut offset = 0;

    for text in source.split_inclusive('\n') {
        let line = Line { text, offset };
        offset += text.len();

        if let Some((span, start, body)) = open.as_mut() {
            if marker_with_id(&line, CONFIG_END).is_some() {
                config = Some(ConfigBlock {
                    text: mem::take(body),
                    offset: *start,
                    span: *span,
                });
                open = None;
            } else {
                body.push_str(&uncomment(line.text));
            }
            continue;
        }

        match marker_with_id(&line, CONFIG_BLOCK) {
            Some(marker) => {
                if let Some(first) = &config {
                    return Err(Diagnostic::error("configuration block appears more than once")
                        .with_code(ErrorCode::E203)
                        .with_label(marker.span, "second configuration block")
                        .with_secondary_label(first.span, "first configuration block"));
                }
                open = Some((marker.span, offset, String::new()));
            }
            None => lines.push(line),
        }
    }

    if let Some((span, _, _)) = open {
        return Err(Diagnostic::error("unterminated configuration block")
            .with_code(ErrorCode::E006)
            .with_label(span, "opened here")
            .with_help("close the block with `# --- (END)`"));
    }

    Ok(SplitTemplate { config, lines })
}

/// A `@if` condition attached to a block marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MarkerCondition<'a> {
    pub node: Id,
    pub text: &'a str,
    pub span: Span,
}

/// Result of the block pass.
#[derive(Debug)]
pub(crate) struct ParsedTemplate<'a> {
    pub template: Template,
    pub conditions: Vec<MarkerCondition<'a>>,
    /// Marker span of every declared block, by node id.
    pub block_spans: IndexMap<Id, Span>,
}

#[derive(Debug, Clone, Copy)]
struct Header {
    name: Id,
    option: Option<Id>,
    span: Span,
}

impl Header {
    fn node(&self) -> Id {
        match self.option {
            Some(option) => self.name.with_option(option),
            None => self.name,
        }
    }
}

/// The block currently receiving lines.
#[derive(Debug, Clone, Copy)]
enum Current {
    Start,
    Block(Header),
    /// After a bad marker; lines are dropped until the next marker.
    Discarded,
}

struct Builder<'a, 'r> {
    decisions: &'r mut DecisionRegistry,
    collector: &'r mut DiagnosticCollector,
    template: Template,
    conditions: Vec<MarkerCondition<'a>>,
    block_spans: IndexMap<Id, Span>,
    /// Whether each block name was declared with options, and where first.
    kinds: HashMap<Id, (bool, Span)>,
    current: Current,
    chunks: Vec<Chunk>,
    code: String,
}

impl<'a> Builder<'a, '_> {
    fn close(&mut self) {
        let mut chunks = mem::take(&mut self.chunks);
        chunks.push(Chunk::plain(mem::take(&mut self.code)));

        let block = match self.current {
            Current::Start => {
                if chunks.len() == 1 && chunks[0].code().is_empty() {
                    return;
                }
                Block::new(Id::new(START_BLOCK), chunks)
            }
            Current::Block(Header {
                name,
                option: Some(option),
                ..
            }) => Block::new_option(name, option, chunks),
            Current::Block(Header { name, .. }) => Block::new(name, chunks),
            Current::Discarded => return,
        };
        debug!(block:% = block.id(), chunks = block.chunks().len(); "block read");
        let inserted = self.template.insert(block);
        debug_assert!(
            inserted.is_ok(),
            "duplicate blocks are rejected when their marker is read"
        );
    }

    fn open(&mut self, marker: Marker<'a>) {
        let header = Header {
            name: Id::new(marker.id),
            option: marker.option.map(Id::new),
            span: marker.span,
        };
        let node = header.node();

        if let Some(first) = self.block_spans.get(&node) {
            self.collector.emit(
                Diagnostic::error(format!("block `{node}` is defined multiple times"))
                    .with_code(ErrorCode::E200)
                    .with_label(header.span, "duplicate block")
                    .with_secondary_label(*first, "first defined here"),
            );
            self.current = Current::Discarded;
            return;
        }

        let has_option = header.option.is_some();
        let (first_kind, first_span) = *self
            .kinds
            .entry(header.name)
            .or_insert((has_option, header.span));
        if first_kind != has_option {
            self.collector.emit(
                Diagnostic::error(format!(
                    "block `{}` is declared both with and without an option",
                    header.name
                ))
                .with_code(ErrorCode::E200)
                .with_label(header.span, "conflicting declaration")
                .with_secondary_label(first_span, "first declared here"),
            );
            self.current = Current::Discarded;
            return;
        }

        self.block_spans.insert(node, header.span);
        if let Some((text, span)) = marker.condition {
            self.conditions.push(MarkerCondition { node, text, span });
        }
        self.current = Current::Block(header);
    }

    fn code_line(&mut self, line: Line<'a>) {
        let segments = match scan(line.text) {
            Ok(segments) => segments,
            Err(diag) => {
                self.collector.emit(diag.relocate(Some(line.offset)));
                self.code.push_str(line.text);
                return;
            }
        };

        for segment in segments {
            let placeholder = match segment {
                Segment::Text(text) => {
                    self.code.push_str(text);
                    continue;
                }
                Segment::Placeholder(placeholder) => placeholder,
            };
            let span = Span::new(placeholder.range).shift(line.offset);
            let id = Id::new(placeholder.name);
            match placeholder.options {
                Some(options) => {
                    if let Err(diag) = self.decisions.define_inline(placeholder.name, options, span)
                    {
                        self.collector.emit(diag);
                    }
                }
                None if !self.decisions.contains(id) => {
                    self.collector.emit(
                        Diagnostic::error(format!(
                            "decision `{}` is not declared",
                            placeholder.name
                        ))
                        .with_code(ErrorCode::E100)
                        .with_label(span, "undefined decision")
                        .with_help(format!(
                            "declare it in the specification or define it inline as `{{{{{}=...}}}}`",
                            placeholder.name
                        )),
                    );
                }
                None => {}
            }
            self.chunks
                .push(Chunk::with_variable(id, mem::take(&mut self.code)));
        }
    }
}

/// Cut `lines` into blocks.
///
/// Inline decisions are added to `decisions`; problems are reported to
/// `collector` and reading continues.
pub(crate) fn build_template<'a>(
    lines: &[Line<'a>],
    decisions: &mut DecisionRegistry,
    collector: &mut DiagnosticCollector,
) -> ParsedTemplate<'a> {
    let mut builder = Builder {
        decisions,
        collector,
        template: Template::new(),
        conditions: Vec::new(),
        block_spans: IndexMap::new(),
        kinds: HashMap::new(),
        current: Current::Start,
        chunks: Vec::new(),
        code: String::new(),
    };

    for line in lines {
        if is_marker(line.text) {
            builder.close();
            match parse_marker(line.content(), line.offset) {
                Ok(marker) => builder.open(marker),
                Err(diag) => {
                    builder.collector.emit(diag);
                    builder.current = Current::Discarded;
                }
            }
        } else if !matches!(builder.current, Current::Discarded) {
            builder.code_line(*line);
        }
    }
    builder.close();

    ParsedTemplate {
        template: builder.template,
        conditions: builder.conditions,
        block_spans: builder.block_spans,
    }
}
