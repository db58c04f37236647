//! Zoning engine
//!
//! Runs a compiled [`Grammar`](crate::grammar::Grammar) over document text
//! and produces labeled, non-overlapping zones.
//!
//! ## Pipeline
//!
//! ```text
//! text ─► matching ─► resolve ─► (subsections per zone) ─► generics ─► templates
//! ```
//!
//! - [`matching`] turns definition hits into raw [`Range`]s
//! - [`resolve`] settles overlaps and assigns zone boundaries
//! - [`generics`] collects catch-all headings and promotes them
//! - [`engine`] drives the passes and assembles the [`ZoningResult`]

pub mod engine;
pub mod generics;
pub mod matching;
pub mod range;
pub mod resolve;

pub use engine::{Zoner, ZoningOptions, ZoningResult};
pub use generics::{
    promote_generics, GenericCandidate, GenericCandidates, GrammarSuggestion, Promotion,
    PromotionOptions,
};
pub use matching::{match_definitions, MatchOptions, Scope};
pub use range::{HeadingRange, LineTokenSpan, Range, ZoneChildren};
pub use resolve::{resolve, Resolution};
