//! Catch-all heading candidates and their promotion
//!
//! The `generic` and `generic_sub` rules match anything that looks like a
//! heading. Their hits are collected here, keyed by trimmed heading text so
//! that boilerplate repeated throughout a note yields one candidate. After the
//! grammar's own headings are resolved, candidates found in the gaps between
//! them can be promoted to real headings and turned into grammar suggestions.

use super::range::{HeadingRange, Range};
use super::resolve::trim_span;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Default midpoint distance under which a candidate duplicates a heading
pub const DEFAULT_MIDPOINT_TOLERANCE: usize = 6;

const SUBSECTION_KEY_SUFFIX: &str = "_sub";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericCandidate {
    /// Trimmed heading text, suffixed `_sub` for subsection candidates
    pub key: String,
    pub range: Range,
    /// Resolved zone the hit was found in, for subsection candidates
    pub parent: Option<Range>,
}

/// Candidates in first-seen order, at most one per key.
#[derive(Debug, Clone, Default)]
pub struct GenericCandidates {
    entries: Vec<GenericCandidate>,
    index: HashMap<String, usize>,
}

impl GenericCandidates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hit. Returns `false` when its text was already seen.
    pub fn insert(&mut self, text: &str, range: Range, parent: Option<&Range>) -> bool {
        let mut key = text.trim().to_string();
        if parent.is_some() {
            key.push_str(SUBSECTION_KEY_SUFFIX);
        }
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(GenericCandidate {
            key,
            range,
            parent: parent.cloned(),
        });
        true
    }

    pub fn get(&self, key: &str) -> Option<&GenericCandidate> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenericCandidate> {
        self.entries.iter()
    }

    /// Drop every subsection candidate, keeping section candidates.
    pub fn clear_subsections(&mut self) {
        self.entries.retain(|c| c.parent.is_none());
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, c)| (c.key.clone(), i))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromotionOptions {
    pub midpoint_tolerance: usize,
}

impl Default for PromotionOptions {
    fn default() -> Self {
        Self {
            midpoint_tolerance: DEFAULT_MIDPOINT_TOLERANCE,
        }
    }
}

impl From<&zoner_config::GenericsConfig> for PromotionOptions {
    fn from(config: &zoner_config::GenericsConfig) -> Self {
        Self {
            midpoint_tolerance: config.midpoint_tolerance,
        }
    }
}

/// A grammar entry a grammar author could add for a discovered heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrammarSuggestion {
    /// Heading text without digits and punctuation, upper-cased
    pub heading: String,
    /// Label of the zone a subsection candidate was found in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub begin: usize,
    pub end: usize,
    /// YAML definition entry, ready to paste into `sections` or `subsections`
    pub snippet: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Promotion {
    /// Candidates that became headings, flagged `promoted`
    pub promoted: Vec<GenericCandidate>,
    pub suggestions: Vec<GrammarSuggestion>,
}

/// A stretch of text between resolved headings. `end == None` is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    pub begin: usize,
    pub end: Option<usize>,
}

impl Gap {
    pub fn holds(&self, range: &Range) -> bool {
        range.begin >= self.begin && self.end.map_or(true, |end| range.end <= end)
    }
}

/// Gaps around the heading extents of the non-generic `headings`.
pub fn heading_gaps(headings: &[HeadingRange]) -> Vec<Gap> {
    let mut extents: Vec<(usize, usize)> = headings
        .iter()
        .filter(|h| !h.generic)
        .map(|h| (h.heading_begin, h.heading_end))
        .collect();
    extents.sort_unstable();

    let mut gaps = Vec::with_capacity(extents.len() + 1);
    let mut offset = 0;
    for (begin, end) in extents {
        gaps.push(Gap {
            begin: offset,
            end: Some(begin),
        });
        offset = end;
    }
    gaps.push(Gap {
        begin: offset,
        end: None,
    });
    gaps
}

/// Decide which candidates become headings and describe the ones that sit in
/// gaps as grammar suggestions.
///
/// Candidate ranges are clipped to their trimmed text first, so whitespace
/// a catch-all pattern swallowed never reaches into a neighbouring heading.
pub fn promote_generics(
    candidates: &GenericCandidates,
    headings: &[HeadingRange],
    text: &str,
    options: &PromotionOptions,
) -> Promotion {
    let gaps = heading_gaps(headings);
    let mut midpoints: Vec<usize> =
        headings.iter().map(HeadingRange::heading_midpoint).collect();

    let mut sorted: Vec<GenericCandidate> = candidates
        .iter()
        .filter_map(|c| clip_to_text(c, text))
        .collect();
    sorted.sort_by_key(|c| c.range.span());

    let mut promotion = Promotion::default();
    for candidate in sorted {
        if !gaps.iter().any(|gap| gap.holds(&candidate.range)) {
            continue;
        }
        promotion.suggestions.push(suggest(&candidate, text));

        let midpoint = (candidate.range.begin + candidate.range.end) / 2;
        if midpoints
            .iter()
            .any(|&m| m.abs_diff(midpoint) < options.midpoint_tolerance)
        {
            debug!(range = %candidate.range, "candidate sits on an existing heading");
            continue;
        }
        midpoints.push(midpoint);

        let mut promoted = candidate;
        promoted.range.promoted = true;
        debug!(range = %promoted.range, "promoting catch-all heading");
        promotion.promoted.push(promoted);
    }
    promotion
}

/// The candidate with its range trimmed of surrounding whitespace, or `None`
/// if nothing but whitespace was matched.
fn clip_to_text(candidate: &GenericCandidate, text: &str) -> Option<GenericCandidate> {
    let (begin, end) = trim_span(text, candidate.range.begin, candidate.range.end);
    if begin == end {
        return None;
    }
    let mut clipped = candidate.clone();
    clipped.range.begin = begin;
    clipped.range.end = end;
    Some(clipped)
}

fn suggest(candidate: &GenericCandidate, text: &str) -> GrammarSuggestion {
    let heading: String = candidate
        .range
        .text(text)
        .chars()
        .filter(|c| !matches!(c, '#' | '*' | ':' | ',') && !c.is_ascii_digit())
        .collect::<String>()
        .trim()
        .to_string();
    let slug = heading
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    let pattern = regex::escape(&heading.to_lowercase()).replace('\'', "''");
    let parent = candidate.parent.as_ref().map(|p| p.label.clone());

    let mut snippet = format!(
        "# {} ({}-{})\n- label: {}\n  regex: [{{ ref: prolog }}, '(?:{})', {{ ref: eoh }}]\n",
        heading.to_uppercase(),
        candidate.range.begin,
        candidate.range.end,
        if slug.is_empty() { "generic" } else { &slug },
        pattern
    );
    if let Some(parent) = &parent {
        snippet.push_str(&format!("  subsection_of: {parent}\n"));
    }

    GrammarSuggestion {
        heading: heading.to_uppercase(),
        parent,
        begin: candidate.range.begin,
        end: candidate.range.end,
        snippet,
    }
}
