//! Pattern compiler
//!
//! Turns the flat regex source produced by fragment expansion into a compiled,
//! line-oriented matcher. Headings live at line starts, so `^` and `$` always
//! match at line boundaries.
//!
//! ## Example
//!
//! ```text
//! Source:   "^[ \t]*(?P<plan>plan)[ \t]*:"
//! Text:     "Assessment:\n  Plan: rest"
//! Match:    13..20 ("  Plan:") with group "plan"
//! ```

use crate::error::PatternError;
use regex::{Regex, RegexBuilder};

/// One hit of a compiled section pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    /// Byte offset of the match start in the searched text
    pub begin: usize,
    /// Byte offset just past the match
    pub end: usize,
    /// Names of the named groups that participated in the match
    pub groups: Vec<String>,
}

impl PatternMatch {
    pub fn has_group(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g == name)
    }
}

/// A compiled section, subsection or template pattern.
#[derive(Debug, Clone)]
pub struct SectionMatcher {
    pattern: String,
    case_insensitive: bool,
    regex: Regex,
}

impl SectionMatcher {
    /// Compile `source` with multi-line anchoring.
    pub fn compile(source: &str, case_insensitive: bool) -> Result<Self, PatternError> {
        let regex = RegexBuilder::new(source)
            .multi_line(true)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| PatternError {
                message: e.to_string(),
            })?;

        Ok(Self {
            pattern: source.to_string(),
            case_insensitive,
            regex,
        })
    }

    /// Run the pattern over `haystack`. With `find_all` unset only the first
    /// match is returned. Empty matches never delimit a zone and are skipped.
    pub fn find_matches(&self, haystack: &str, find_all: bool) -> Vec<PatternMatch> {
        let names: Vec<&str> = self.regex.capture_names().flatten().collect();
        let mut out = Vec::new();

        for caps in self.regex.captures_iter(haystack) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if whole.start() == whole.end() {
                continue;
            }
            let groups = names
                .iter()
                .filter(|name| caps.name(name).is_some())
                .map(|name| name.to_string())
                .collect();
            out.push(PatternMatch {
                begin: whole.start(),
                end: whole.end(),
                groups,
            });
            if !find_all {
                break;
            }
        }

        out
    }

    /// Get the pattern string
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }
}
