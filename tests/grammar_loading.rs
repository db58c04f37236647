//! Grammar loading from strings and files

use rstest::rstest;
use std::fs;
use tempfile::tempdir;
use zoner::grammar::{Grammar, GrammarFormat, LoadOptions};
use zoner::{GrammarError, Zoner, ZoningOptions};

const CYCLIC: &str = r#"
fragments:
  - name: prolog
    expansion: '^[ \t]*'
  - name: eoh
    expansion: '[ \t]*:'
  - name: ping
    expansion: ['a', { ref: pong }]
  - name: pong
    expansion: ['b', { ref: ping }]
  - name: l1
    expansion: [{ ref: l2 }]
  - name: l2
    expansion: [{ ref: l3 }]
  - name: l3
    expansion: 'deep'
sections:
  - label: looping
    regex: [{ ref: prolog }, { ref: ping }, { ref: eoh }]
  - label: chained
    regex: [{ ref: prolog }, { ref: l1 }, { ref: eoh }]
  - label: plan
    regex: [{ ref: prolog }, 'plan', { ref: eoh }]
"#;

fn labels(grammar: &Grammar) -> Vec<&str> {
    grammar.sections.iter().map(|d| d.label.as_str()).collect()
}

#[rstest(
    depth,
    expected,
    case(5, vec!["chained", "plan"]),
    case(3, vec!["chained", "plan"]),
    case(2, vec!["plan"]),
    case(1, vec!["plan"])
)]
fn test_over_deep_definitions_are_dropped(depth: usize, expected: Vec<&str>) {
    let options = LoadOptions {
        max_fragment_depth: depth,
    };
    let grammar = Grammar::load(CYCLIC, GrammarFormat::Yaml, &options).unwrap();
    assert_eq!(labels(&grammar), expected);
}

#[test]
fn test_remaining_definitions_still_zone() {
    let grammar = Grammar::load(CYCLIC, GrammarFormat::Yaml, &LoadOptions::default()).unwrap();
    let zoner = Zoner::new(grammar.into());
    let result = zoner
        .zone("deep: x\nplan: y\n", &ZoningOptions::default())
        .unwrap();
    let found: Vec<(&str, &str)> = result
        .headings
        .iter()
        .map(|h| (h.label.as_str(), h.text.as_str()))
        .collect();
    assert_eq!(found, vec![("chained", "deep: x"), ("plan", "plan: y\n")]);
}

#[test]
fn test_json_grammar_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("grammar.json");
    fs::write(
        &path,
        r#"{
            "fragments": [{ "name": "eoh", "expansion": "[ \\t]*:" }],
            "sections": [
                {
                    "label": "allergies",
                    "regex": ["^allergies", { "ref": "eoh" }],
                    "medical": "allergy"
                }
            ]
        }"#,
    )
    .unwrap();

    let grammar = Grammar::from_path(&path, &LoadOptions::default()).unwrap();
    assert_eq!(labels(&grammar), vec!["allergies"]);
    assert_eq!(grammar.sections[0].source(), "^allergies[ \\t]*:");
    assert_eq!(
        grammar.sections[0].attributes.medical.as_deref(),
        Some("allergy")
    );
}

#[test]
fn test_file_errors() {
    let dir = tempdir().unwrap();

    let missing = dir.path().join("absent.yaml");
    assert!(matches!(
        Grammar::from_path(&missing, &LoadOptions::default()),
        Err(GrammarError::Io { .. })
    ));

    let xml = dir.path().join("grammar.xml");
    fs::write(&xml, "<sections/>").unwrap();
    assert!(matches!(
        Grammar::from_path(&xml, &LoadOptions::default()),
        Err(GrammarError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_invalid_pattern_fails_whole_load() {
    let source = r#"
sections:
  - label: fine
    regex: 'ok'
  - label: broken
    regex: '[a-'
"#;
    let err = Grammar::load(source, GrammarFormat::Yaml, &LoadOptions::default()).unwrap_err();
    assert!(err.to_string().contains("broken"));
}

#[test]
fn test_load_options_from_config() {
    let config = zoner_config::Loader::new()
        .set_override("grammar.max_fragment_depth", 2)
        .unwrap()
        .build()
        .unwrap();
    let options = LoadOptions::from(&config.grammar);
    assert_eq!(options.max_fragment_depth, 2);
    let grammar = Grammar::load(CYCLIC, GrammarFormat::Yaml, &options).unwrap();
    assert_eq!(labels(&grammar), vec!["plan"]);
}
