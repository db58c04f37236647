//! Semantic attribute hints attached to zones
//!
//! A grammar can say that a zone is about medications, that it describes the
//! past, or that its findings concern someone other than the patient. Hints
//! come from three places: the definition itself, and any fragment whose named
//! capture group took part in a match. Every merge here keeps the value that
//! was set first; callers control precedence purely by merge order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The five optional hint slots. Empty strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negated: Option<String>,
}

fn fill(slot: &mut Option<String>, value: Option<&str>) {
    if slot.is_some() {
        return;
    }
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        *slot = Some(value.to_string());
    }
}

impl AttributeHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn maybe_set_medical(&mut self, value: Option<&str>) {
        fill(&mut self.medical, value);
    }

    pub fn maybe_set_temporal(&mut self, value: Option<&str>) {
        fill(&mut self.temporal, value);
    }

    pub fn maybe_set_subject(&mut self, value: Option<&str>) {
        fill(&mut self.subject, value);
    }

    pub fn maybe_set_uncertain(&mut self, value: Option<&str>) {
        fill(&mut self.uncertain, value);
    }

    pub fn maybe_set_negated(&mut self, value: Option<&str>) {
        fill(&mut self.negated, value);
    }

    /// Fill every slot that is still unset from `other`.
    pub fn merge_prefer_existing(&mut self, other: &AttributeHints) {
        self.maybe_set_medical(other.medical.as_deref());
        self.maybe_set_temporal(other.temporal.as_deref());
        self.maybe_set_subject(other.subject.as_deref());
        self.maybe_set_uncertain(other.uncertain.as_deref());
        self.maybe_set_negated(other.negated.as_deref());
    }

    /// Copy with blank values normalized away.
    pub fn normalized(&self) -> Self {
        let mut hints = Self::new();
        hints.merge_prefer_existing(self);
        hints
    }

    pub fn is_empty(&self) -> bool {
        self.medical.is_none()
            && self.temporal.is_none()
            && self.subject.is_none()
            && self.uncertain.is_none()
            && self.negated.is_none()
    }
}

impl fmt::Display for AttributeHints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |slot: &Option<String>| slot.clone().unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "med={} temp={} subj={} unc={} neg={}",
            show(&self.medical),
            show(&self.temporal),
            show(&self.subject),
            show(&self.uncertain),
            show(&self.negated)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints(medical: &str, temporal: &str) -> AttributeHints {
        let mut h = AttributeHints::new();
        h.maybe_set_medical(Some(medical));
        h.maybe_set_temporal(Some(temporal));
        h
    }

    #[test]
    fn first_value_wins() {
        let mut h = AttributeHints::new();
        h.maybe_set_subject(Some("family"));
        h.maybe_set_subject(Some("patient"));
        assert_eq!(h.subject.as_deref(), Some("family"));
    }

    #[test]
    fn empty_values_do_not_claim_a_slot() {
        let mut h = AttributeHints::new();
        h.maybe_set_temporal(Some("  "));
        h.maybe_set_temporal(None);
        h.maybe_set_temporal(Some("historical"));
        assert_eq!(h.temporal.as_deref(), Some("historical"));
    }

    #[test]
    fn merge_fills_only_unset_slots() {
        let mut specific = hints("medication", "");
        let general = hints("condition", "current");
        specific.merge_prefer_existing(&general);
        assert_eq!(specific.medical.as_deref(), Some("medication"));
        assert_eq!(specific.temporal.as_deref(), Some("current"));
    }

    #[test]
    fn normalized_drops_blank_values() {
        let raw = AttributeHints {
            negated: Some(String::new()),
            uncertain: Some("hedged".into()),
            ..Default::default()
        };
        let clean = raw.normalized();
        assert!(clean.negated.is_none());
        assert_eq!(clean.uncertain.as_deref(), Some("hedged"));
        assert!(!clean.is_empty());
        assert!(AttributeHints::new().is_empty());
    }
}
