use multiverse_core::constraint::{ConstraintOrigin, ConstraintTarget};
use multiverse_core::identifier::Id;
use multiverse_parser::error::ErrorCode;
use multiverse_parser::{ParseConfig, ParseError, parse};

const TEMPLATE: &str = "\
import pandas as pd
# --- (A) a1
x = {{a=1,2,3}}
# --- (A) a2
x = {{a}} * 2
# --- (B) b1
y = x
# --- (B) b2
y = -x
";

fn codes(err: &ParseError) -> Vec<Option<ErrorCode>> {
    err.diagnostics()
        .iter()
        .filter(|d| d.severity().is_error())
        .map(|d| d.code())
        .collect()
}

#[test]
fn test_template_without_spec() {
    let program = parse(TEMPLATE, None, ParseConfig::default()).expect("Failed to parse");

    let blocks: Vec<String> = program
        .template()
        .blocks()
        .map(|b| b.id().to_string())
        .collect();
    assert_eq!(blocks, vec!["_start", "A:a1", "A:a2", "B:b1", "B:b2"]);

    assert_eq!(program.decisions().len(), 1);
    assert_eq!(program.decision(Id::new("a")).unwrap().len(), 3);

    let graph = program.graph();
    assert_eq!(graph.node_count(), 5);
    assert_eq!(graph.sources(), vec![Id::new("_start")]);
    assert_eq!(graph.sinks(), vec![Id::new("B:b1"), Id::new("B:b2")]);
    assert_eq!(graph.edges().count(), 6);
}

#[test]
fn test_out_of_band_spec() {
    let spec = r#"{
        "decisions": [{"var": "cutoff", "options": [2, 2.5], "desc": "outliers"}],
        "graph": ["A->B"],
        "constraints": [
            {"block": "B", "option": "b2", "condition": "A == a1"},
            {"variable": "a", "index": 2, "condition": "cutoff == 2.5"}
        ]
    }"#;
    let program = parse(TEMPLATE, Some(spec), ParseConfig::default()).expect("Failed to parse");

    let names: Vec<String> = program.decisions().keys().map(|k| k.to_string()).collect();
    assert_eq!(names, vec!["cutoff", "a"]);
    assert_eq!(
        program.decision(Id::new("cutoff")).unwrap().desc(),
        Some("outliers")
    );

    let constraints = program.constraints();
    assert_eq!(constraints.len(), 2);
    assert_eq!(constraints.for_block(Id::new("B:b2")).len(), 1);
    assert_eq!(constraints.for_option(Id::new("a"), 2).len(), 1);

    // `_start` is not part of an explicit graph.
    assert_eq!(program.graph().sources(), vec![Id::new("A:a1"), Id::new("A:a2")]);
}

#[test]
fn test_config_block() {
    let template = "\
# --- (MULTIVERSE_CONFIG)
# {
#   \"decisions\": [{\"var\": \"m\", \"options\": [\"ols\", \"glm\"]}],
#   \"constraints\": [{\"link\": [\"m\", \"A\"]}]
# }
# --- (END)
# --- (A) a1
f({{m}})
# --- (A) a2
g({{m}})
";
    let program = parse(template, None, ParseConfig::default()).expect("Failed to parse");
    assert!(program.template().start_block().is_none());
    assert_eq!(program.constraints().len(), 4);
    assert!(
        program
            .constraints()
            .iter()
            .all(|c| c.origin() == ConstraintOrigin::Link)
    );
    assert!(program.constraints().iter().any(|c| c.target()
        == ConstraintTarget::Option {
            variable: Id::new("m"),
            index: 1
        }));

    let err = parse(template, Some("{}"), ParseConfig::default()).unwrap_err();
    assert_eq!(codes(&err), vec![Some(ErrorCode::E203)]);
}

#[test]
fn test_config_block_syntax_error_is_located() {
    let template = "x\n# --- (MULTIVERSE_CONFIG)\n# {\"graph\": [\"A->B\",]}\n# --- (END)\n";
    let err = parse(template, None, ParseConfig::default()).unwrap_err();
    assert_eq!(codes(&err), vec![Some(ErrorCode::E005)]);
    let span = err.diagnostics()[0].labels()[0].span();
    assert!(span.start() > template.find("{\"graph").unwrap());
    assert!(span.end() <= template.find("# --- (END)").unwrap());
}

#[test]
fn test_marker_condition_constraint() {
    let template = "\
# --- (A) a1
# --- (A) a2
# --- (B) @if A == a1
print(1)
";
    let program = parse(template, None, ParseConfig::default()).expect("Failed to parse");
    let constraints = program.constraints().for_block(Id::new("B"));
    assert_eq!(constraints.len(), 1);
    assert_eq!(constraints[0].origin(), ConstraintOrigin::Marker);
    assert_eq!(constraints[0].condition().source(), "A == a1");
}

#[test]
fn test_sampled_decision_uses_default_seed() {
    let template = "x = {{s}}\n";
    let spec = r#"{"decisions": [{"var": "s", "options": {"sample": "uniform", "count": 3, "min": 0, "max": 1}}]}"#;

    let first = parse(template, Some(spec), ParseConfig::new(7)).unwrap();
    let again = parse(template, Some(spec), ParseConfig::new(7)).unwrap();
    let other = parse(template, Some(spec), ParseConfig::new(8)).unwrap();

    let options = |p: &multiverse_core::program::Program| {
        p.decision(Id::new("s")).unwrap().options().to_vec()
    };
    assert_eq!(options(&first), options(&again));
    assert_ne!(options(&first), options(&other));
}

#[test]
fn test_errors_are_collected() {
    let template = "\
# --- (A)
x = {{missing}}
# --- (A)
y = 1
";
    let spec = r#"{"constraints": [{"block": "Z", "condition": "a == 1"}]}"#;
    let err = parse(template, Some(spec), ParseConfig::default()).unwrap_err();
    assert_eq!(codes(&err), vec![
        Some(ErrorCode::E100),
        Some(ErrorCode::E200),
        Some(ErrorCode::E101),
    ]);
    // Template diagnostics point into the template.
    let label = &err.diagnostics()[0].labels()[0];
    assert_eq!(&template[label.span().start()..label.span().end()], "{{missing}}");
}

#[test]
fn test_name_collision() {
    let template = "# --- (A)\nx = {{A=1,2}}\n";
    let err = parse(template, None, ParseConfig::default()).unwrap_err();
    assert_eq!(codes(&err), vec![Some(ErrorCode::E202)]);
    assert_eq!(err.diagnostics()[0].labels().len(), 2);

    let err = parse(
        "x = {{g=1}}\n",
        Some(r#"{"graph": ["_start->g"]}"#),
        ParseConfig::default(),
    )
    .unwrap_err();
    assert_eq!(codes(&err), vec![Some(ErrorCode::E202)]);
}

#[test]
fn test_spec_errors_have_no_labels() {
    let err = parse("x\n", Some(r#"{"graph": ["A->"]}"#), ParseConfig::default()).unwrap_err();
    assert_eq!(codes(&err), vec![Some(ErrorCode::E004)]);
    assert!(err.diagnostics()[0].labels().is_empty());

    let err = parse("x\n", Some("{"), ParseConfig::default()).unwrap_err();
    assert_eq!(codes(&err), vec![Some(ErrorCode::E005)]);
    assert!(err.diagnostics()[0].labels().is_empty());
}

#[test]
fn test_graph_warnings_do_not_fail() {
    let template = "# --- (A)\na\n# --- (B)\nb\n";
    let program = parse(template, Some(r#"{"graph": ["A->C"]}"#), ParseConfig::default())
        .expect("warnings should not fail parsing");
    assert!(program.graph().contains(Id::new("C")));
    assert!(!program.graph().contains(Id::new("B")));
}
