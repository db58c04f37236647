//! Grammar document schema
//!
//! The on-disk grammar is YAML (or JSON with the same shape). A regex body is
//! either a single string or a list whose items are literal regex text or
//! `{ ref: name }` fragment references:
//!
//! ```yaml
//! fragments:
//!   - name: prolog
//!     expansion: '^[ \t]*'
//!   - name: family
//!     expansion: ['(?P<family>', 'family (?:medical )?history', ')']
//!     subject: family_member
//! sections:
//!   - label: family_history
//!     regex: [{ ref: prolog }, { ref: family }, { ref: eoh }]
//!     temporal: historical
//! subsections:
//!   - label: heent
//!     regex: [{ ref: prolog }, 'heent', { ref: eoh }]
//!     subsection_of: physical_exam, review_of_systems
//! ```

use super::attributes::AttributeHints;
use super::fragments::{Expansion, Node};
use crate::error::GrammarError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serialization dialect of a grammar document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarFormat {
    Yaml,
    Json,
}

impl GrammarFormat {
    /// Pick the dialect from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, GrammarError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "yaml" | "yml" => Ok(GrammarFormat::Yaml),
            "json" => Ok(GrammarFormat::Json),
            _ => Err(GrammarError::UnsupportedFormat(ext)),
        }
    }
}

/// Top-level grammar document: three definition collections plus the
/// fragments they share.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrammarDocument {
    #[serde(default)]
    pub fragments: Vec<FragmentEntry>,
    #[serde(default)]
    pub sections: Vec<DefinitionEntry>,
    #[serde(default)]
    pub subsections: Vec<DefinitionEntry>,
    #[serde(default)]
    pub templates: Vec<DefinitionEntry>,
}

impl GrammarDocument {
    pub fn parse(source: &str, format: GrammarFormat) -> Result<Self, GrammarError> {
        let doc = match format {
            GrammarFormat::Yaml => serde_yaml::from_str(source)?,
            GrammarFormat::Json => serde_json::from_str(source)?,
        };
        Ok(doc)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentEntry {
    pub name: String,
    pub expansion: Body,
    #[serde(flatten)]
    pub attributes: AttributeHints,
}

/// A section, subsection or template definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionEntry {
    #[serde(default)]
    pub label: String,
    pub regex: Body,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_case: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub find_all: Option<bool>,
    /// Comma-separated labels of the zones this definition is searched in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsection_of: Option<String>,
    #[serde(flatten)]
    pub attributes: AttributeHints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Body {
    Text(String),
    Pieces(Vec<Piece>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Piece {
    Text(String),
    Ref {
        #[serde(rename = "ref")]
        name: String,
    },
}

impl Body {
    pub fn to_expansion(&self) -> Expansion {
        let nodes = match self {
            Body::Text(text) => vec![Node::Text(text.clone())],
            Body::Pieces(pieces) => pieces
                .iter()
                .map(|piece| match piece {
                    Piece::Text(text) => Node::Text(text.clone()),
                    Piece::Ref { name } => Node::Ref(name.trim().to_string()),
                })
                .collect(),
        };
        Expansion::new(nodes)
    }
}
