//! # zoner
//!
//! A zoning engine for clinical notes: it splits raw document text into
//! labeled sections, subsections and boilerplate templates.
//!
//! ## Overview
//!
//! A declarative grammar of named, nestable regex fragments is loaded once and
//! compiled into line-oriented matchers. Each document is matched against the
//! grammar, overlapping headings are resolved, and every surviving heading
//! opens a zone that runs up to the next one.
//!
//! ```ignore
//! use zoner::{Zoner, ZoningOptions};
//!
//! let zoner = Zoner::builtin()?;
//! let result = zoner.zone("Chief Complaint: cough\nPlan: rest\n", &ZoningOptions::default())?;
//! for heading in &result.headings {
//!     println!("{heading}");
//! }
//! ```
//!
//! ## Modules
//!
//! - [`grammar`] - grammar documents, fragment expansion and pattern compilation
//! - [`zoning`] - matching, overlap resolution and generic promotion
//! - [`offsets`] - byte offset to line/token conversion
//! - [`error`] - error types

pub mod error;
pub mod grammar;
pub mod offsets;
pub mod zoning;

pub use error::{CoordinateError, ExpansionError, GrammarError, PatternError, ZoningError};
pub use grammar::{AttributeHints, Grammar, GrammarFormat, LoadOptions};
pub use offsets::{LineTokenPosition, OffsetConverter};
pub use zoning::{HeadingRange, Range, Zoner, ZoningOptions, ZoningResult};
