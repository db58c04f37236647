//! Declarative zoning grammar
//!
//! A grammar is a set of named regex fragments plus three ordered lists of
//! definitions built from them:
//!
//! - `sections` are searched across the whole document
//! - `subsections` are searched inside resolved section zones named by their
//!   `subsection_of` list
//! - `templates` mark boilerplate, either document-wide or inside sections
//!
//! Loading goes document → fragment expansion → pattern compilation. See
//! [`loader::Grammar`].

pub mod attributes;
pub mod document;
pub mod fragments;
pub mod loader;
pub mod pattern;

pub use attributes::AttributeHints;
pub use document::{GrammarDocument, GrammarFormat};
pub use fragments::{Expansion, FragmentDefinition, FragmentTable, Node, DEFAULT_MAX_DEPTH};
pub use loader::{
    is_generic_label, Grammar, LoadOptions, SectionDefinition, GENERIC_SECTION, GENERIC_SUBSECTION,
};
pub use pattern::{PatternMatch, SectionMatcher};
