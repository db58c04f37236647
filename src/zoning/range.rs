//! Value types produced by matching and resolution
//!
//! All offsets are half-open byte offsets into the full document.

use crate::grammar::AttributeHints;
use crate::offsets::LineTokenPosition;
use serde::Serialize;
use std::fmt;

/// A labeled span of the document: a raw match, or a resolved zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Range {
    pub begin: usize,
    pub end: usize,
    /// Definition label, `parent::child` for scoped matches
    pub label: String,
    #[serde(skip_serializing_if = "AttributeHints::is_empty")]
    pub attributes: AttributeHints,
    #[serde(skip)]
    pub ignore: bool,
    pub truncated: bool,
    /// Produced by a catch-all rule
    pub generic: bool,
    /// A catch-all match that was promoted to a real heading
    pub promoted: bool,
}

impl Range {
    pub fn new(begin: usize, end: usize, label: impl Into<String>) -> Self {
        Self {
            begin,
            end,
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_attributes(mut self, attributes: AttributeHints) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sort key: begin, then end.
    pub fn span(&self) -> (usize, usize) {
        (self.begin, self.end)
    }

    pub fn overlaps(&self, other: &Range) -> bool {
        self.begin < other.end && other.begin < self.end
    }

    pub fn contains(&self, other: &Range) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }

    /// Whether overlap resolution treats this range as a heading.
    pub fn is_live(&self) -> bool {
        !self.ignore && (!self.generic || self.promoted)
    }

    /// The covered text, or `""` if the span does not fit `text`.
    pub fn text<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.begin..self.end).unwrap_or("")
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}, {})", self.label, self.begin, self.end)?;
        if self.truncated {
            write!(f, " truncated")?;
        }
        if self.generic {
            write!(f, " generic")?;
        }
        Ok(())
    }
}

/// Line/token coordinates of a zone's begin and end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineTokenSpan {
    pub begin: LineTokenPosition,
    pub end: LineTokenPosition,
}

/// Snapshot of a surviving zone and the heading that opened it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingRange {
    pub label: String,
    /// Zone begin, equal to `heading_begin`
    pub begin: usize,
    pub end: usize,
    /// Text of the whole zone
    pub text: String,
    pub heading_begin: usize,
    pub heading_end: usize,
    /// Matched heading with surrounding whitespace trimmed
    pub heading_text: String,
    #[serde(skip_serializing_if = "AttributeHints::is_empty")]
    pub attributes: AttributeHints,
    pub truncated: bool,
    pub generic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions: Option<LineTokenSpan>,
}

impl HeadingRange {
    pub fn heading_midpoint(&self) -> usize {
        (self.heading_begin + self.heading_end) / 2
    }
}

impl fmt::Display for HeadingRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}, {}) {:?}",
            self.label, self.begin, self.end, self.heading_text
        )
    }
}

/// Children found inside one resolved parent zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneChildren<T> {
    pub parent: Range,
    pub children: Vec<T>,
}

impl<T> ZoneChildren<T> {
    pub fn new(parent: Range) -> Self {
        Self {
            parent,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_and_containment() {
        let a = Range::new(0, 10, "a");
        let b = Range::new(5, 15, "b");
        let c = Range::new(10, 12, "c");
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(Range::new(0, 20, "p").contains(&b));
        assert!(!a.contains(&b));
    }

    #[test]
    fn test_liveness() {
        let mut r = Range::new(0, 4, "generic");
        r.generic = true;
        assert!(!r.is_live());
        r.promoted = true;
        assert!(r.is_live());
        r.ignore = true;
        assert!(!r.is_live());
    }

    #[test]
    fn test_text_out_of_range_is_empty() {
        let r = Range::new(2, 40, "x");
        assert_eq!(r.text("short"), "");
        assert_eq!(Range::new(1, 3, "x").text("short"), "ho");
        assert_eq!(r.to_string(), "x [2, 40)");
    }
}
