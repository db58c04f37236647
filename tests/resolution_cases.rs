//! Boundary and tie-break cases for overlap resolution, plus catch-all
//! deduplication through the full engine

use rstest::rstest;
use std::sync::Arc;
use zoner::grammar::{Grammar, GrammarFormat, LoadOptions};
use zoner::zoning::{resolve, GenericCandidates, Range};
use zoner::{Zoner, ZoningOptions};

fn spans(ranges: &[Range]) -> Vec<(&str, usize, usize, bool)> {
    ranges
        .iter()
        .map(|r| (r.label.as_str(), r.begin, r.end, r.truncated))
        .collect()
}

#[test]
fn test_trailing_whitespace_is_excluded() {
    let text = "SECTION A: fo  SECTION B: rest of b";
    let ranges = [Range::new(0, 10, "A"), Range::new(15, 25, "B")];
    let resolution = resolve(&ranges, text, text.len());
    // A ends after "fo", not at B's begin
    assert_eq!(
        spans(&resolution.zones),
        vec![("A", 0, 13, false), ("B", 15, text.len(), false)]
    );
}

#[rstest(
    ranges,
    expected,
    // longer first range swallows the contained one
    case(
        vec![Range::new(0, 20, "HISTORY"), Range::new(15, 18, "HX")],
        vec![("HISTORY", 0, 40, false)]
    ),
    // shorter first range is cut at the longer one
    case(
        vec![Range::new(0, 6, "HX"), Range::new(4, 20, "HISTORY")],
        vec![("HX", 0, 4, true), ("HISTORY", 4, 40, false)]
    ),
    // equal lengths keep the first
    case(
        vec![Range::new(0, 8, "one"), Range::new(4, 12, "two")],
        vec![("one", 0, 40, false)]
    ),
    // the range after an ignored one bounds the survivor
    case(
        vec![Range::new(0, 20, "HISTORY"), Range::new(15, 18, "HX"), Range::new(27, 35, "NEXT")],
        vec![("HISTORY", 0, 26, false), ("NEXT", 27, 40, false)]
    )
)]
fn test_overlap_tie_breaks(ranges: Vec<Range>, expected: Vec<(&str, usize, usize, bool)>) {
    let text = "abcdefghijklmnopqrstuvwxyz abcdefghijklm";
    assert_eq!(text.len(), 40);
    let resolution = resolve(&ranges, text, text.len());
    assert_eq!(spans(&resolution.zones), expected);
}

#[test]
fn test_subsection_bound_is_parent_end() {
    let text = "Exam:\nLungs: clear\nHeart: ok\nPlan: x";
    let subs = [Range::new(6, 12, "lungs"), Range::new(19, 25, "heart")];
    let resolution = resolve(&subs, text, 28);
    assert_eq!(
        spans(&resolution.zones),
        vec![("lungs", 6, 18, false), ("heart", 19, 28, false)]
    );
}

#[test]
fn test_identical_catch_all_text_is_one_candidate() {
    let mut candidates = GenericCandidates::new();
    let mut first = Range::new(3, 10, "generic");
    first.generic = true;
    let mut second = Range::new(50, 57, "generic");
    second.generic = true;

    assert!(candidates.insert("NOTES: ", first, None));
    assert!(!candidates.insert("  NOTES:", second, None));
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates.get("NOTES:").map(|c| c.range.begin), Some(3));
}

#[test]
fn test_repeated_catch_all_heading_promoted_once() {
    let source = r#"
sections:
  - label: plan
    regex: '^plan:'
  - label: generic
    regex: '^[A-Z]{4,}:'
    ignore_case: false
"#;
    let grammar = Grammar::load(source, GrammarFormat::Yaml, &LoadOptions::default()).unwrap();
    let zoner = Zoner::new(Arc::new(grammar));
    let text = "plan: a\nNOTES: b\nmore\nNOTES: c\n";
    let options = ZoningOptions {
        include_generics: true,
        suggest_generics: true,
        ..Default::default()
    };
    let result = zoner.zone(text, &options).unwrap();

    let found: Vec<(&str, usize)> = result
        .headings
        .iter()
        .map(|h| (h.label.as_str(), h.begin))
        .collect();
    assert_eq!(found, vec![("plan", 0), ("generic", 8)]);
    assert_eq!(result.suggestions.len(), 1);
}
