//! # visor-core
//!
//! Core types for visor: the data model shared by the visibility engine and
//! its collaborators.
//!
//! - **Positions**: [`Offset`], a validated half-open character range
//! - **Suggestions**: [`Suggestion`] (span or relation), [`Visibility`],
//!   [`HidingReason`], [`SuggestionGroup`]
//! - **Document state**: [`Annotation`], [`OverlapMode`]
//! - **Decisions**: [`LearningRecord`], [`DecisionKey`], [`Decision`]

#![warn(missing_docs)]

pub mod annotation;
pub mod error;
pub mod group;
pub mod layer;
pub mod learning;
pub mod offset;
pub mod suggestion;

pub use annotation::{labels_match, normalize_label, Annotation, AnnotationId};
pub use error::{Error, Result};
pub use group::SuggestionGroup;
pub use layer::{LayerId, OverlapMode};
pub use learning::{Decision, DecisionKey, LearningRecord, LearningRecordType};
pub use offset::Offset;
pub use suggestion::{
    HidingReason, RecommenderId, RelationSuggestion, SpanSuggestion, Suggestion,
    SuggestionBuilder, SuggestionId, SuggestionMeta, Visibility,
};
