//! Grammar loader
//!
//! Builds a [`Grammar`] from a grammar document: the fragment table is filled
//! first, then every definition is expanded, compiled and routed into one of
//! the ordered definition lists. Catch-all rules (`generic` among sections,
//! `generic_sub` among subsections) each get a single dedicated slot.
//!
//! Over-deep definitions are dropped with a warning and the rest of the
//! grammar still loads. Unknown fragment references and invalid patterns fail
//! the whole load.

use super::attributes::AttributeHints;
use super::document::{DefinitionEntry, GrammarDocument, GrammarFormat};
use super::fragments::{FragmentDefinition, FragmentTable, DEFAULT_MAX_DEPTH};
use super::pattern::SectionMatcher;
use crate::error::{ExpansionError, GrammarError};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Label of the catch-all section rule
pub const GENERIC_SECTION: &str = "generic";
/// Label of the catch-all subsection rule
pub const GENERIC_SUBSECTION: &str = "generic_sub";

const BUILTIN_GRAMMAR: &str = include_str!("../../grammars/sections.yaml");

/// Whether a label names a catch-all rule or a match produced by one.
pub fn is_generic_label(label: &str) -> bool {
    label.contains(GENERIC_SECTION)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub max_fragment_depth: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_fragment_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl From<&zoner_config::GrammarConfig> for LoadOptions {
    fn from(config: &zoner_config::GrammarConfig) -> Self {
        Self {
            max_fragment_depth: config.max_fragment_depth,
        }
    }
}

/// A compiled definition ready for matching.
#[derive(Debug, Clone)]
pub struct SectionDefinition {
    pub label: String,
    pub matcher: SectionMatcher,
    pub find_all: bool,
    /// Parent labels this definition is searched in, `None` for the whole text
    pub subsection_of: Option<Vec<String>>,
    pub attributes: AttributeHints,
    /// Expansion level → fragment names substituted at that level
    pub fragment_levels: BTreeMap<usize, Vec<String>>,
}

impl SectionDefinition {
    pub fn case_insensitive(&self) -> bool {
        self.matcher.is_case_insensitive()
    }

    /// Expanded regex source
    pub fn source(&self) -> &str {
        self.matcher.pattern()
    }

    pub fn is_generic(&self) -> bool {
        is_generic_label(&self.label)
    }

    /// Whether this definition searches inside zones labeled `parent`.
    pub fn applies_to(&self, parent: &str) -> bool {
        self.subsection_of
            .as_ref()
            .is_some_and(|labels| labels.iter().any(|l| l == parent))
    }
}

/// A loaded grammar. Immutable after construction and safe to share.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    pub sections: Vec<SectionDefinition>,
    pub subsections: Vec<SectionDefinition>,
    pub templates: Vec<SectionDefinition>,
    pub generic_section: Option<SectionDefinition>,
    pub generic_subsection: Option<SectionDefinition>,
    pub fragments: FragmentTable,
}

#[derive(Clone, Copy)]
enum Collection {
    Sections,
    Subsections,
    Templates,
}

impl Collection {
    fn name(self) -> &'static str {
        match self {
            Collection::Sections => "sections",
            Collection::Subsections => "subsections",
            Collection::Templates => "templates",
        }
    }

    /// Label of the catch-all slot this collection routes into, if any.
    fn generic_slot(self) -> Option<&'static str> {
        match self {
            Collection::Sections => Some(GENERIC_SECTION),
            Collection::Subsections => Some(GENERIC_SUBSECTION),
            Collection::Templates => None,
        }
    }
}

impl Grammar {
    /// Parse and compile a grammar document.
    pub fn load(
        source: &str,
        format: GrammarFormat,
        options: &LoadOptions,
    ) -> Result<Self, GrammarError> {
        let document = GrammarDocument::parse(source, format)?;
        Self::from_document(document, options)
    }

    /// Read a grammar file, choosing the format from its extension.
    pub fn from_path(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self, GrammarError> {
        let path = path.as_ref();
        let format = GrammarFormat::from_path(path)?;
        let source = fs::read_to_string(path).map_err(|source| GrammarError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loading grammar");
        Self::load(&source, format, options)
    }

    /// The grammar bundled with the crate, compiled once per process.
    pub fn builtin() -> Result<Arc<Grammar>, GrammarError> {
        static BUILTIN: OnceCell<Arc<Grammar>> = OnceCell::new();
        BUILTIN
            .get_or_try_init(|| {
                Grammar::load(BUILTIN_GRAMMAR, GrammarFormat::Yaml, &LoadOptions::default())
                    .map(Arc::new)
            })
            .cloned()
    }

    pub fn from_document(
        document: GrammarDocument,
        options: &LoadOptions,
    ) -> Result<Self, GrammarError> {
        let mut grammar = Grammar::default();

        for entry in document.fragments {
            grammar.fragments.insert(FragmentDefinition {
                name: entry.name.trim().to_string(),
                expansion: entry.expansion.to_expansion(),
                attributes: entry.attributes.normalized(),
            });
        }

        for (collection, entries) in [
            (Collection::Sections, document.sections),
            (Collection::Subsections, document.subsections),
            (Collection::Templates, document.templates),
        ] {
            for entry in entries {
                let Some(definition) = grammar.compile_definition(&entry, options)? else {
                    continue;
                };
                grammar.route(collection, definition);
            }
        }

        debug!(
            sections = grammar.sections.len(),
            subsections = grammar.subsections.len(),
            templates = grammar.templates.len(),
            fragments = grammar.fragments.len(),
            "grammar loaded"
        );
        Ok(grammar)
    }

    /// Expand and compile one entry. `Ok(None)` means it was dropped.
    fn compile_definition(
        &self,
        entry: &DefinitionEntry,
        options: &LoadOptions,
    ) -> Result<Option<SectionDefinition>, GrammarError> {
        let label = entry.label.trim().to_string();
        let expanded = match self
            .fragments
            .expand(&entry.regex.to_expansion(), options.max_fragment_depth)
        {
            Ok(expanded) => expanded,
            Err(ExpansionError::TooDeep { limit }) => {
                warn!(%label, limit, "fragment nesting too deep, dropping definition");
                return Ok(None);
            }
            Err(ExpansionError::UnknownFragment { name }) => {
                return Err(GrammarError::UnknownFragment {
                    label,
                    fragment: name,
                });
            }
        };

        let case_insensitive = entry.ignore_case.unwrap_or(true);
        let matcher = SectionMatcher::compile(&expanded.source, case_insensitive).map_err(
            |source| GrammarError::InvalidPattern {
                label: label.clone(),
                source,
            },
        )?;

        let mut attributes = AttributeHints::new();
        attributes.maybe_set_medical(entry.attributes.medical.as_deref());
        attributes.maybe_set_temporal(entry.attributes.temporal.as_deref());
        attributes.maybe_set_subject(entry.attributes.subject.as_deref());
        attributes.maybe_set_uncertain(entry.attributes.uncertain.as_deref());
        attributes.maybe_set_negated(entry.attributes.negated.as_deref());

        Ok(Some(SectionDefinition {
            label,
            matcher,
            find_all: entry.find_all.unwrap_or(true),
            subsection_of: entry.subsection_of.as_deref().and_then(parse_parent_labels),
            attributes,
            fragment_levels: expanded.levels,
        }))
    }

    fn route(&mut self, collection: Collection, definition: SectionDefinition) {
        let Some(slot_label) = collection.generic_slot() else {
            self.templates.push(definition);
            return;
        };
        if !definition.is_generic() {
            match collection {
                Collection::Sections => self.sections.push(definition),
                _ => self.subsections.push(definition),
            }
            return;
        }

        let slot = match collection {
            Collection::Sections => &mut self.generic_section,
            _ => &mut self.generic_subsection,
        };
        if definition.label != slot_label {
            warn!(
                label = %definition.label,
                collection = collection.name(),
                expected = slot_label,
                "catch-all rule has unexpected label, ignoring"
            );
        } else if slot.is_some() {
            warn!(
                label = %definition.label,
                collection = collection.name(),
                "duplicate catch-all rule, keeping the first"
            );
        } else {
            *slot = Some(definition);
        }
    }
}

/// Split a comma-separated parent list, trimming and de-duplicating labels.
fn parse_parent_labels(raw: &str) -> Option<Vec<String>> {
    let mut labels: Vec<String> = Vec::new();
    for label in raw.split(',').map(str::trim).filter(|l| !l.is_empty()) {
        if !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
    }
    if labels.is_empty() {
        None
    } else {
        Some(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(source: &str) -> Result<Grammar, GrammarError> {
        Grammar::load(source, GrammarFormat::Yaml, &LoadOptions::default())
    }

    const GRAMMAR: &str = r#"
fragments:
  - name: prolog
    expansion: '^[ \t]*'
  - name: eoh
    expansion: '[ \t]*:'
  - name: loop
    expansion: ['x', { ref: loop }]
sections:
  - label: plan
    regex: [{ ref: prolog }, 'plan', { ref: eoh }]
    temporal: ' future '
  - label: broken
    regex: [{ ref: loop }]
  - label: generic
    regex: '^[A-Z]{4,}:'
    ignore_case: false
  - label: generic
    regex: '^[A-Z]{2,}:'
  - label: generic_other
    regex: '^x'
subsections:
  - label: lungs
    regex: 'lungs'
    subsection_of: 'physical_exam, review_of_systems,physical_exam'
  - label: generic_sub
    regex: '^[a-z]+:'
templates:
  - label: signature
    regex: '^signed'
  - label: generic
    regex: '^y'
"#;

    #[test]
    fn test_routes_definitions() {
        let grammar = load(GRAMMAR).unwrap();
        let labels: Vec<&str> = grammar.sections.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["plan"]);
        assert_eq!(grammar.subsections.len(), 1);
        assert_eq!(grammar.templates.len(), 2);

        let generic = grammar.generic_section.as_ref().unwrap();
        assert_eq!(generic.source(), "^[A-Z]{4,}:");
        assert!(!generic.case_insensitive());
        assert!(grammar.generic_subsection.is_some());
    }

    #[test]
    fn test_definition_defaults_and_hints() {
        let grammar = load(GRAMMAR).unwrap();
        let plan = &grammar.sections[0];
        assert!(plan.case_insensitive());
        assert!(plan.find_all);
        assert_eq!(plan.subsection_of, None);
        assert_eq!(plan.attributes.temporal.as_deref(), Some("future"));
        assert_eq!(plan.source(), "^[ \\t]*plan[ \\t]*:");
        assert_eq!(
            plan.fragment_levels[&0],
            vec!["prolog".to_string(), "eoh".into()]
        );
    }

    #[test]
    fn test_parent_labels_are_deduplicated() {
        let grammar = load(GRAMMAR).unwrap();
        let lungs = &grammar.subsections[0];
        assert_eq!(
            lungs.subsection_of,
            Some(vec!["physical_exam".to_string(), "review_of_systems".into()])
        );
        assert!(lungs.applies_to("review_of_systems"));
        assert!(!lungs.applies_to("plan"));
    }

    #[test]
    fn test_unknown_fragment_fails_load() {
        let err = load("sections:\n  - label: a\n    regex: [{ ref: missing }]\n").unwrap_err();
        match err {
            GrammarError::UnknownFragment { label, fragment } => {
                assert_eq!(label, "a");
                assert_eq!(fragment, "missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_pattern_names_label() {
        let err = load("sections:\n  - label: bad\n    regex: '(oops'\n").unwrap_err();
        assert!(matches!(err, GrammarError::InvalidPattern { label, .. } if label == "bad"));
    }

    #[test]
    fn test_builtin_grammar_is_shared() {
        let a = Grammar::builtin().unwrap();
        let b = Grammar::builtin().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!a.sections.is_empty());
        assert!(a.generic_section.is_some());
    }
}
