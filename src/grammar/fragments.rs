//! Fragment table and bounded fragment expansion
//!
//! A fragment is a named regex snippet whose expansion may reference further
//! fragments. Expansion works level by level: every reference at level 0 (the
//! references written directly in a definition) is replaced by its referent's
//! expansion, then every reference that replacement introduced (level 1), and
//! so on. Each pass produces a new tree; nodes are never shared or edited in
//! place, so one fragment referenced from many places expands independently.
//!
//! The level at which each fragment was substituted is recorded. The matching
//! phase walks those levels to decide which fragment hints apply to a match.

use super::attributes::AttributeHints;
use crate::error::ExpansionError;
use std::collections::{BTreeMap, HashMap};
use tracing::{trace, warn};

/// Default maximum nesting of fragment references
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// One node of an expansion tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal regex source
    Text(String),
    /// Unexpanded reference to a named fragment
    Ref(String),
    /// A reference that has been replaced by its fragment's expansion
    Expanded { fragment: String, children: Vec<Node> },
}

/// A regex body: literal text interleaved with fragment references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    nodes: Vec<Node>,
}

impl Expansion {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn text(source: &str) -> Self {
        Self::new(vec![Node::Text(source.to_string())])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Names of the unexpanded references anywhere in the tree, in order.
    pub fn pending_refs(&self) -> Vec<&str> {
        fn walk<'a>(nodes: &'a [Node], out: &mut Vec<&'a str>) {
            for node in nodes {
                match node {
                    Node::Ref(name) => out.push(name),
                    Node::Expanded { children, .. } => walk(children, out),
                    Node::Text(_) => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    /// Concatenate all literal text, ignoring any references left unexpanded.
    pub fn flatten(&self) -> String {
        fn walk(nodes: &[Node], out: &mut String) {
            for node in nodes {
                match node {
                    Node::Text(text) => out.push_str(text),
                    Node::Expanded { children, .. } => walk(children, out),
                    Node::Ref(_) => {}
                }
            }
        }
        let mut out = String::new();
        walk(&self.nodes, &mut out);
        out
    }
}

/// A named, immutable regex snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentDefinition {
    pub name: String,
    pub expansion: Expansion,
    pub attributes: AttributeHints,
}

/// Result of fully expanding one definition's body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedPattern {
    /// Flat regex source with every reference substituted
    pub source: String,
    /// Expansion level → fragment names substituted at that level
    pub levels: BTreeMap<usize, Vec<String>>,
}

/// Fragments by name. Rebuilding the table never invalidates compiled
/// grammars, which only hold fragment names.
#[derive(Debug, Clone, Default)]
pub struct FragmentTable {
    fragments: HashMap<String, FragmentDefinition>,
}

impl FragmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fragment. A later definition with the same name replaces the
    /// earlier one.
    pub fn insert(&mut self, fragment: FragmentDefinition) {
        if self.fragments.contains_key(&fragment.name) {
            warn!(name = %fragment.name, "duplicate fragment definition replaces earlier one");
        }
        self.fragments.insert(fragment.name.clone(), fragment);
    }

    pub fn get(&self, name: &str) -> Option<&FragmentDefinition> {
        self.fragments.get(name)
    }

    pub fn attributes(&self, name: &str) -> Option<&AttributeHints> {
        self.fragments.get(name).map(|f| &f.attributes)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Expand every reference in `body`, at most `depth_limit` levels deep.
    pub fn expand(
        &self,
        body: &Expansion,
        depth_limit: usize,
    ) -> Result<ExpandedPattern, ExpansionError> {
        let mut levels: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        let mut current = body.clone();
        let mut level = 0;

        while !current.pending_refs().is_empty() {
            if level >= depth_limit {
                return Err(ExpansionError::TooDeep { limit: depth_limit });
            }
            let mut substituted = Vec::new();
            let nodes = self.substitute(current.nodes(), &mut substituted)?;
            trace!(level, fragments = ?substituted, "expanded fragment level");
            levels.entry(level).or_default().extend(substituted);
            current = Expansion::new(nodes);
            level += 1;
        }

        Ok(ExpandedPattern {
            source: current.flatten(),
            levels,
        })
    }

    /// One expansion pass: replace each pending reference with a copy of its
    /// referent. References inside the copies are left for the next pass.
    fn substitute(
        &self,
        nodes: &[Node],
        substituted: &mut Vec<String>,
    ) -> Result<Vec<Node>, ExpansionError> {
        nodes
            .iter()
            .map(|node| match node {
                Node::Text(_) => Ok(node.clone()),
                Node::Ref(name) => {
                    let fragment =
                        self.get(name)
                            .ok_or_else(|| ExpansionError::UnknownFragment {
                                name: name.clone(),
                            })?;
                    substituted.push(name.clone());
                    Ok(Node::Expanded {
                        fragment: name.clone(),
                        children: fragment.expansion.nodes().to_vec(),
                    })
                }
                Node::Expanded { fragment, children } => Ok(Node::Expanded {
                    fragment: fragment.clone(),
                    children: self.substitute(children, substituted)?,
                }),
            })
            .collect()
    }
}
