//! The zoning orchestrator
//!
//! [`Zoner::zone`] runs the passes in order:
//!
//! 1. match section definitions over the document and resolve them
//! 2. match subsection definitions inside each section zone and resolve them
//!    per parent, bounded by the parent's end
//! 3. optionally promote catch-all headings found between known headings,
//!    re-resolving whatever they land in
//! 4. match templates, document-wide and inside section zones
//! 5. optionally attach line/token coordinates
//!
//! A `Zoner` only holds the shared grammar. Every document gets its own local
//! state, so one `Zoner` can serve many threads.

use super::generics::{promote_generics, GenericCandidate, GenericCandidates, PromotionOptions};
use super::matching::{match_definitions, MatchOptions, Scope};
use super::range::{HeadingRange, LineTokenSpan, Range, ZoneChildren};
use super::resolve::{resolve, Resolution};
use super::GrammarSuggestion;
use crate::error::{GrammarError, ZoningError};
use crate::grammar::{Grammar, SectionDefinition};
use crate::offsets::OffsetConverter;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Per-call switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoningOptions {
    pub subsections: bool,
    pub templates: bool,
    /// Promote catch-all headings found between known headings
    pub include_generics: bool,
    /// Report catch-all headings as grammar suggestions
    pub suggest_generics: bool,
    pub convert_offsets: bool,
    pub promotion: PromotionOptions,
    /// Abort between definitions once this instant has passed
    pub deadline: Option<Instant>,
}

impl Default for ZoningOptions {
    fn default() -> Self {
        Self {
            subsections: true,
            templates: true,
            include_generics: false,
            suggest_generics: false,
            convert_offsets: false,
            promotion: PromotionOptions::default(),
            deadline: None,
        }
    }
}

impl From<&zoner_config::ZonerConfig> for ZoningOptions {
    fn from(config: &zoner_config::ZonerConfig) -> Self {
        Self {
            subsections: config.zoning.subsections,
            templates: config.zoning.templates,
            include_generics: config.zoning.include_generics,
            suggest_generics: config.zoning.suggest_generics,
            convert_offsets: config.zoning.convert_offsets,
            promotion: PromotionOptions::from(&config.generics),
            deadline: None,
        }
    }
}

/// Everything found in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ZoningResult {
    /// Top-level zones, ordered by begin
    pub headings: Vec<HeadingRange>,
    /// Resolved subsection zones per section zone that has any
    pub subsections: Vec<ZoneChildren<HeadingRange>>,
    /// Template matches per section zone that has any
    pub templates: Vec<ZoneChildren<Range>>,
    /// Template matches not tied to a section
    pub document_templates: Vec<Range>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<GrammarSuggestion>,
}

impl ZoningResult {
    /// Section and subsection headings together, ordered by begin.
    pub fn all_headings(&self) -> Vec<&HeadingRange> {
        let mut all: Vec<&HeadingRange> = self
            .headings
            .iter()
            .chain(self.subsections.iter().flat_map(|s| s.children.iter()))
            .collect();
        all.sort_by_key(|h| (h.begin, h.heading_begin, h.end));
        all
    }

    pub fn subsections_of(&self, zone: &HeadingRange) -> &[HeadingRange] {
        self.subsections
            .iter()
            .find(|s| s.parent.begin == zone.begin && s.parent.label == zone.label)
            .map(|s| s.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn templates_of(&self, zone: &HeadingRange) -> &[Range] {
        self.templates
            .iter()
            .find(|s| s.parent.begin == zone.begin && s.parent.label == zone.label)
            .map(|s| s.children.as_slice())
            .unwrap_or(&[])
    }
}

impl fmt::Display for ZoningResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn line(f: &mut fmt::Formatter<'_>, indent: &str, heading: &HeadingRange) -> fmt::Result {
            write!(f, "{indent}{heading}")?;
            if !heading.attributes.is_empty() {
                write!(f, " {}", heading.attributes)?;
            }
            if let Some(positions) = heading.positions {
                write!(f, " {}-{}", positions.begin, positions.end)?;
            }
            writeln!(f)
        }

        for heading in &self.headings {
            line(f, "", heading)?;
            for sub in self.subsections_of(heading) {
                line(f, "  ", sub)?;
            }
            for template in self.templates_of(heading) {
                writeln!(f, "  template {template}")?;
            }
        }
        for template in &self.document_templates {
            writeln!(f, "template {template}")?;
        }
        Ok(())
    }
}

/// Subsection state for one section zone.
struct SubsectionZone {
    parent: Range,
    raw: Vec<Range>,
    resolution: Resolution,
}

/// Runs a shared grammar over documents.
#[derive(Debug, Clone)]
pub struct Zoner {
    grammar: Arc<Grammar>,
}

impl Zoner {
    pub fn new(grammar: Arc<Grammar>) -> Self {
        Self { grammar }
    }

    /// A zoner over the bundled grammar.
    pub fn builtin() -> Result<Self, GrammarError> {
        Ok(Self::new(Grammar::builtin()?))
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn zone(&self, text: &str, options: &ZoningOptions) -> Result<ZoningResult, ZoningError> {
        let grammar = &*self.grammar;
        let bound = text.len();
        let run_generics = options.include_generics || options.suggest_generics;
        let matching = MatchOptions {
            include_generics: options.include_generics,
            deadline: options.deadline,
        };
        let mut candidates = GenericCandidates::new();

        let mut section_ranges = self.match_in(
            &grammar.sections,
            text,
            Scope::Document,
            &mut candidates,
            &matching,
        )?;
        section_ranges.extend(self.match_in(
            catch_all(&grammar.generic_section, run_generics),
            text,
            Scope::Document,
            &mut candidates,
            &matching,
        )?);
        let mut sections = resolve(&section_ranges, text, bound);
        debug!(zones = sections.zones.len(), "sections resolved");

        let mut subsections = if options.subsections {
            self.zone_subsections(text, &sections.zones, &mut candidates, &matching, run_generics)?
        } else {
            Vec::new()
        };

        let mut suggestions = Vec::new();
        if run_generics {
            let known = known_headings(&sections, &subsections);
            let promotion = promote_generics(&candidates, &known, text, &options.promotion);
            if options.suggest_generics {
                suggestions = promotion.suggestions;
            }

            if options.include_generics {
                let (promoted_sections, mut promoted_subsections): (Vec<_>, Vec<_>) = promotion
                    .promoted
                    .into_iter()
                    .partition(|c| c.parent.is_none());
                let promoted_sections = without_collisions(promoted_sections, &section_ranges);

                if !promoted_sections.is_empty() {
                    section_ranges.extend(promoted_sections.into_iter().map(|c| c.range));
                    sections = resolve(&section_ranges, text, bound);
                    debug!(zones = sections.zones.len(), "sections re-resolved after promotion");

                    if options.subsections {
                        candidates.clear_subsections();
                        subsections = self.zone_subsections(
                            text,
                            &sections.zones,
                            &mut candidates,
                            &matching,
                            run_generics,
                        )?;
                        let known = known_headings(&sections, &subsections);
                        promoted_subsections =
                            promote_generics(&candidates, &known, text, &options.promotion)
                                .promoted
                                .into_iter()
                                .filter(|c| c.parent.is_some())
                                .collect();
                    }
                }

                promote_into_subsections(&mut subsections, promoted_subsections, text);
            }
        }

        let (templates, document_templates) = if options.templates {
            self.zone_templates(text, &sections.zones, &matching)?
        } else {
            (Vec::new(), Vec::new())
        };

        let mut result = ZoningResult {
            headings: sections.headings,
            subsections: subsections
                .into_iter()
                .filter(|s| !s.resolution.headings.is_empty())
                .map(|s| ZoneChildren {
                    parent: s.parent,
                    children: s.resolution.headings,
                })
                .collect(),
            templates,
            document_templates,
            suggestions,
        };

        if options.convert_offsets {
            let converter = OffsetConverter::new(text);
            let headings = result
                .headings
                .iter_mut()
                .chain(result.subsections.iter_mut().flat_map(|s| s.children.iter_mut()));
            for heading in headings {
                heading.positions = Some(LineTokenSpan {
                    begin: converter.offset_to_line_token(heading.begin)?,
                    end: converter.offset_to_line_token(heading.end)?,
                });
            }
        }

        Ok(result)
    }

    fn match_in(
        &self,
        definitions: &[SectionDefinition],
        text: &str,
        scope: Scope<'_>,
        candidates: &mut GenericCandidates,
        matching: &MatchOptions,
    ) -> Result<Vec<Range>, ZoningError> {
        match_definitions(definitions, &self.grammar.fragments, text, scope, candidates, matching)
    }

    fn zone_subsections(
        &self,
        text: &str,
        parents: &[Range],
        candidates: &mut GenericCandidates,
        matching: &MatchOptions,
        run_generics: bool,
    ) -> Result<Vec<SubsectionZone>, ZoningError> {
        let grammar = &*self.grammar;
        let mut zones = Vec::with_capacity(parents.len());
        for parent in parents {
            let scope = Scope::Zone(parent);
            let mut raw = self.match_in(&grammar.subsections, text, scope, candidates, matching)?;
            raw.extend(self.match_in(
                catch_all(&grammar.generic_subsection, run_generics),
                text,
                scope,
                candidates,
                matching,
            )?);
            let resolution = resolve(&raw, text, parent.end);
            zones.push(SubsectionZone {
                parent: parent.clone(),
                raw,
                resolution,
            });
        }
        Ok(zones)
    }

    fn zone_templates(
        &self,
        text: &str,
        parents: &[Range],
        matching: &MatchOptions,
    ) -> Result<(Vec<ZoneChildren<Range>>, Vec<Range>), ZoningError> {
        // templates never feed generic promotion
        let mut ignored = GenericCandidates::new();
        let templates = &self.grammar.templates;

        let document = self.match_in(templates, text, Scope::Document, &mut ignored, matching)?;
        let mut scoped = Vec::new();
        for parent in parents {
            let children =
                self.match_in(templates, text, Scope::Zone(parent), &mut ignored, matching)?;
            if !children.is_empty() {
                scoped.push(ZoneChildren {
                    parent: parent.clone(),
                    children,
                });
            }
        }
        Ok((scoped, document))
    }
}

fn catch_all(rule: &Option<SectionDefinition>, enabled: bool) -> &[SectionDefinition] {
    match rule {
        Some(rule) if enabled => std::slice::from_ref(rule),
        _ => &[],
    }
}

fn known_headings(sections: &Resolution, subsections: &[SubsectionZone]) -> Vec<HeadingRange> {
    let mut known: Vec<HeadingRange> = sections.headings.clone();
    known.extend(
        subsections
            .iter()
            .flat_map(|s| s.resolution.headings.iter().cloned()),
    );
    known.sort_by_key(|h| h.heading_begin);
    known
}

fn collides(raw: &[Range], range: &Range) -> bool {
    raw.iter().any(|r| r.is_live() && r.overlaps(range))
}

/// Promoted candidates that leave every live raw heading untouched.
/// Promotion only ever adds zones.
fn without_collisions(promoted: Vec<GenericCandidate>, raw: &[Range]) -> Vec<GenericCandidate> {
    promoted
        .into_iter()
        .filter(|c| {
            let hit = collides(raw, &c.range);
            if hit {
                debug!(range = %c.range, "candidate overlaps a section heading, dropping");
            }
            !hit
        })
        .collect()
}

/// Add promoted subsection candidates to their parent zones and re-resolve
/// the zones that changed.
fn promote_into_subsections(
    subsections: &mut [SubsectionZone],
    promoted: Vec<GenericCandidate>,
    text: &str,
) {
    let mut changed = vec![false; subsections.len()];
    for candidate in promoted {
        let Some(parent) = candidate.parent.as_ref() else {
            continue;
        };
        match subsections.iter().position(|s| &s.parent == parent) {
            Some(i) if collides(&subsections[i].raw, &candidate.range) => {
                debug!(range = %candidate.range, "overlaps a subsection heading, dropping");
            }
            Some(i) => {
                subsections[i].raw.push(candidate.range);
                changed[i] = true;
            }
            None => debug!(range = %candidate.range, "parent zone no longer exists, dropping"),
        }
    }
    for (zone, _) in subsections.iter_mut().zip(changed).filter(|(_, c)| *c) {
        zone.resolution = resolve(&zone.raw, text, zone.parent.end);
    }
}
