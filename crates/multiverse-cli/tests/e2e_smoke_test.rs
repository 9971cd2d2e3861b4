use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;
use tempfile::tempdir;

use multiverse_cli::{Args, Outcome, run, run_with_prompt};

fn demos_path() -> PathBuf {
    // Demos are at workspace root, relative to workspace not the crate
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

/// Collects all template files directly under a directory
fn collect_templates(dir: PathBuf) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

fn args(template: &Path, output: &Path) -> Args {
    Args {
        template: template.to_string_lossy().to_string(),
        spec: None,
        output: Some(output.to_string_lossy().to_string()),
        config: None,
        yes: true,
        non_interactive: false,
        log_level: "off".to_string(),
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// Checks the files written for one template and returns the universe count.
fn check_output(output: &Path, extension: &str) -> usize {
    let summary = read_json(&output.join("summary.json"));
    let entries = summary.as_array().expect("summary is a list");
    for (index, entry) in entries.iter().enumerate() {
        let filename = format!("universe_{}{extension}", index + 1);
        assert_eq!(entry["filename"], filename.as_str());
        assert!(entry["path"].is_array());
        assert!(entry["decisions"].is_object());
        assert!(output.join("code").join(&filename).is_file());
    }
    assert_eq!(fs::read_dir(output.join("code")).unwrap().count(), entries.len());

    let overview = read_json(&output.join("overview.json"));
    assert!(overview["nodes"].is_array());
    assert!(overview["edges"].is_array());
    assert!(overview["decisions"].is_array());
    entries.len()
}

#[test]
fn e2e_smoke_test_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let templates = collect_templates(demos_path());
    assert!(!templates.is_empty(), "No templates found in demos/");

    let mut failed = Vec::new();
    for template in &templates {
        let output = temp_dir
            .path()
            .join(template.file_stem().unwrap().to_string_lossy().as_ref());

        match run(&args(template, &output)) {
            Ok(Outcome::Generated { universes }) => {
                let extension = format!(
                    ".{}",
                    template.extension().unwrap().to_string_lossy()
                );
                assert_eq!(check_output(&output, &extension), universes);
                assert!(universes > 0, "{} produced no universes", template.display());
            }
            Ok(outcome) => failed.push(format!("{}: {outcome:?}", template.display())),
            Err(err) => failed.push(format!("{}: {err}", template.display())),
        }
    }

    assert!(failed.is_empty(), "Failed templates: {failed:#?}");
}

#[test]
fn e2e_simple_demo_contents() {
    let temp_dir = tempdir().unwrap();
    let output = temp_dir.path().join("out");
    let outcome = run(&args(&demos_path().join("simple.py"), &output)).unwrap();
    assert_eq!(outcome, Outcome::Generated { universes: 6 });

    let first = fs::read_to_string(output.join("code/universe_1.py")).unwrap();
    assert!(first.contains("<= (2 * df.y.std())"));
    assert!(!first.contains("# ---"));
    assert!(!first.contains("{{"));

    let summary = read_json(&output.join("summary.json"));
    assert_eq!(summary[0]["path"], serde_json::json!(["_start", "A", "B"]));
    assert_eq!(summary[0]["decisions"], serde_json::json!({"cutoff": 2, "A": "std"}));
    assert_eq!(summary[5]["decisions"], serde_json::json!({"cutoff": 3, "A": "iqr"}));

    let overview = read_json(&output.join("overview.json"));
    assert_eq!(
        overview["decisions"],
        serde_json::json!([
            {"var": "A", "options": ["std", "iqr"]},
            {"var": "cutoff", "options": [2, 2.5, 3]}
        ])
    );
}

#[test]
fn e2e_out_of_band_spec() {
    let temp_dir = tempdir().unwrap();
    let output = temp_dir.path().join("out");
    let demo = demos_path().join("with_spec");
    let mut args = args(&demo.join("template.py"), &output);
    args.spec = Some(demo.join("spec.json").to_string_lossy().to_string());

    // Filter=std: 3 cutoffs x 2 formulas; Filter=none: the first formula only.
    assert_eq!(run(&args).unwrap(), Outcome::Generated { universes: 7 });
    assert_eq!(check_output(&output, ".py"), 7);
}

#[test]
fn e2e_limit_is_enforced() {
    let temp_dir = tempdir().unwrap();
    let config = temp_dir.path().join("config.toml");
    fs::write(&config, "[generation]\nmax_universes = 4\n").unwrap();
    let output = temp_dir.path().join("out");

    let mut args = args(&demos_path().join("simple.py"), &output);
    args.config = Some(config.to_string_lossy().to_string());
    args.yes = false;
    args.non_interactive = true;
    assert_eq!(run(&args).unwrap(), Outcome::Cancelled { estimate: 6 });
    assert!(!output.exists());

    // Declined at the prompt.
    args.non_interactive = false;
    let mut prompt = Vec::new();
    let outcome = run_with_prompt(&args, &mut "n\n".as_bytes(), &mut prompt).unwrap();
    assert_eq!(outcome, Outcome::Cancelled { estimate: 6 });
    assert!(!output.exists());

    // Accepted at the prompt.
    let outcome = run_with_prompt(&args, &mut "y\n".as_bytes(), &mut prompt).unwrap();
    assert_eq!(outcome, Outcome::Generated { universes: 6 });

    // Forced.
    args.yes = true;
    assert_eq!(run(&args).unwrap(), Outcome::Generated { universes: 6 });
}

#[test]
fn e2e_errors_are_reported() {
    let temp_dir = tempdir().unwrap();
    let template = temp_dir.path().join("broken.py");
    fs::write(&template, "x = {{missing}}\n").unwrap();
    let output = temp_dir.path().join("out");

    let err = run(&args(&template, &output)).unwrap_err();
    let reports = multiverse_cli::error_adapter::reports(&err);
    assert_eq!(reports.len(), 1);
    assert!(reports[0].to_string().contains("missing"));
    assert!(!output.exists());
}
