//! Matching phase
//!
//! Runs compiled definitions over the document, or over the text of one
//! resolved parent zone, and turns every hit into a [`Range`] in document
//! coordinates. Catch-all hits are also recorded in [`GenericCandidates`].

use super::generics::GenericCandidates;
use super::range::Range;
use crate::error::ZoningError;
use crate::grammar::{AttributeHints, FragmentTable, PatternMatch, SectionDefinition};
use std::time::Instant;
use tracing::{debug, trace};

/// Boundary fragments that never carry hints.
const PROLOG_FRAGMENT: &str = "prolog";
const EOH_FRAGMENT: &str = "eoh";

/// Where a set of definitions is searched.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// Whole document; only unscoped definitions apply
    Document,
    /// One resolved zone; only definitions listing its label apply
    Zone(&'a Range),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    /// Keep catch-all hits in the returned list, flagged `generic`
    pub include_generics: bool,
    pub deadline: Option<Instant>,
}

/// Run `definitions` over `text` within `scope`.
pub fn match_definitions(
    definitions: &[SectionDefinition],
    fragments: &FragmentTable,
    text: &str,
    scope: Scope<'_>,
    candidates: &mut GenericCandidates,
    options: &MatchOptions,
) -> Result<Vec<Range>, ZoningError> {
    let mut out = Vec::new();

    for definition in definitions {
        let (haystack, offset, parent) = match scope {
            Scope::Document if definition.subsection_of.is_none() => (text, 0, None),
            Scope::Zone(parent) if definition.applies_to(&parent.label) => {
                (parent.text(text), parent.begin, Some(parent))
            }
            _ => continue,
        };

        if let Some(deadline) = options.deadline {
            if Instant::now() >= deadline {
                return Err(ZoningError::Deadline {
                    label: definition.label.clone(),
                });
            }
        }

        trace!(label = %definition.label, "trying definition");
        for hit in definition.matcher.find_matches(haystack, definition.find_all) {
            let label = match parent {
                Some(parent) => format!("{}::{}", parent.label, definition.label),
                None => definition.label.clone(),
            };
            let mut range = Range::new(hit.begin + offset, hit.end + offset, label)
                .with_attributes(match_attributes(definition, fragments, &hit));
            debug!(range = %range, "match found");

            if definition.is_generic() {
                if parent.is_some_and(|p| p.begin == range.begin) {
                    trace!(range = %range, "catch-all hit is the parent heading, skipping");
                    continue;
                }
                range.generic = true;
                candidates.insert(range.text(text), range.clone(), parent);
                if !options.include_generics {
                    continue;
                }
            }
            out.push(range);
        }
    }

    Ok(out)
}

/// Hints for one hit: the innermost matched fragment wins each slot, then the
/// definition's own hints fill whatever is left.
pub fn match_attributes(
    definition: &SectionDefinition,
    fragments: &FragmentTable,
    hit: &PatternMatch,
) -> AttributeHints {
    let mut attributes = AttributeHints::new();
    for names in definition.fragment_levels.values().rev() {
        for name in names.iter().rev() {
            if name == PROLOG_FRAGMENT || name == EOH_FRAGMENT || !hit.has_group(name) {
                continue;
            }
            if let Some(hints) = fragments.attributes(name) {
                trace!(fragment = %name, %hints, "matched fragment contributes hints");
                attributes.merge_prefer_existing(hints);
            }
        }
    }
    attributes.merge_prefer_existing(&definition.attributes);
    attributes
}
