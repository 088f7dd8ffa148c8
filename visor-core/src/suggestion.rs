//! Machine-generated annotation suggestions.
//!
//! A suggestion is created fresh on every prediction pass and never
//! persisted. Its [`Visibility`] is recomputed from scratch each time the
//! visibility engine runs; nothing about a previous pass is remembered on the
//! suggestion itself.
//!
//! # Variants
//!
//! ```text
//! Span:      "Dies ist ein Testtext"
//!             └LOC┘                     position = [0,4)
//!
//! Relation:  "Dies ist ein Testtext"
//!             └src┘        └─target─┘   position = target = [13,21)
//! ```
//!
//! A relation is anchored at its target span, the same place a committed
//! relation annotation sits. Code that decides visibility only ever looks at
//! [`Suggestion::position`] and [`Suggestion::label`].

use crate::layer::LayerId;
use crate::offset::Offset;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a suggestion within one recommendation run.
pub type SuggestionId = u64;

/// Identifier of the recommender that produced a suggestion.
pub type RecommenderId = u64;

// =============================================================================
// Visibility
// =============================================================================

/// Why a suggestion is hidden. A closed set with stable strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HidingReason {
    /// The user rejected a suggestion at exactly this position.
    Rejected,
    /// A committed annotation conflicts with the suggestion, or the position
    /// lies outside the document.
    Overlapping,
}

impl HidingReason {
    /// Stable identifier used by the UI and in tests.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            HidingReason::Rejected => "REJECTED",
            HidingReason::Overlapping => "OVERLAPPING",
        }
    }
}

impl fmt::Display for HidingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a suggestion may be shown to the annotator right now.
///
/// A hiding reason exists only in the hidden state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    /// Eligible for display.
    #[default]
    Visible,
    /// Suppressed.
    Hidden(HidingReason),
}

impl Visibility {
    /// True for [`Visibility::Visible`].
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        matches!(self, Visibility::Visible)
    }

    /// Reason, if hidden.
    #[must_use]
    pub const fn reason(&self) -> Option<HidingReason> {
        match self {
            Visibility::Visible => None,
            Visibility::Hidden(reason) => Some(*reason),
        }
    }
}

// =============================================================================
// Suggestion
// =============================================================================

/// Fields every suggestion carries, regardless of kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionMeta {
    /// Id, unique within one run
    pub id: SuggestionId,
    /// Recommender that produced it
    pub recommender_id: RecommenderId,
    /// Recommender display name
    pub recommender_name: String,
    /// Target layer
    pub layer_id: LayerId,
    /// Target feature
    pub feature: String,
    /// Document the suggestion was made for
    pub document_name: String,
    /// Proposed feature value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Recommender confidence
    pub score: f64,
    /// Free-form explanation from the recommender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_explanation: Option<String>,
    /// Current visibility
    #[serde(default)]
    pub visibility: Visibility,
}

/// A suggested span annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanSuggestion {
    /// Shared fields
    #[serde(flatten)]
    pub meta: SuggestionMeta,
    /// Suggested span
    pub position: Offset,
}

/// A suggested relation between two spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationSuggestion {
    /// Shared fields
    #[serde(flatten)]
    pub meta: SuggestionMeta,
    /// Governor span
    pub source: Offset,
    /// Dependent span; also the anchor position
    pub target: Offset,
}

/// Any suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suggestion {
    /// Span suggestion
    Span(SpanSuggestion),
    /// Relation suggestion
    Relation(RelationSuggestion),
}

impl Suggestion {
    /// Start building a suggestion.
    #[must_use]
    pub fn builder() -> SuggestionBuilder {
        SuggestionBuilder::default()
    }

    /// Shared fields.
    #[must_use]
    pub fn meta(&self) -> &SuggestionMeta {
        match self {
            Suggestion::Span(s) => &s.meta,
            Suggestion::Relation(r) => &r.meta,
        }
    }

    fn meta_mut(&mut self) -> &mut SuggestionMeta {
        match self {
            Suggestion::Span(s) => &mut s.meta,
            Suggestion::Relation(r) => &mut r.meta,
        }
    }

    /// Anchor position: the span itself, or a relation's target.
    #[must_use]
    pub fn position(&self) -> Offset {
        match self {
            Suggestion::Span(s) => s.position,
            Suggestion::Relation(r) => r.target,
        }
    }

    /// Id within the run.
    #[must_use]
    pub fn id(&self) -> SuggestionId {
        self.meta().id
    }

    /// Producing recommender.
    #[must_use]
    pub fn recommender_id(&self) -> RecommenderId {
        self.meta().recommender_id
    }

    /// Producing recommender's name.
    #[must_use]
    pub fn recommender_name(&self) -> &str {
        &self.meta().recommender_name
    }

    /// Target layer.
    #[must_use]
    pub fn layer_id(&self) -> LayerId {
        self.meta().layer_id
    }

    /// Target feature.
    #[must_use]
    pub fn feature(&self) -> &str {
        &self.meta().feature
    }

    /// Document name.
    #[must_use]
    pub fn document_name(&self) -> &str {
        &self.meta().document_name
    }

    /// Proposed label, `None` if unset.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.meta().label.as_deref()
    }

    /// Recommender confidence.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.meta().score
    }

    /// Recommender explanation.
    #[must_use]
    pub fn score_explanation(&self) -> Option<&str> {
        self.meta().score_explanation.as_deref()
    }

    /// Current visibility.
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.meta().visibility
    }

    /// True if currently visible.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visibility().is_visible()
    }

    /// Reason for hiding, if hidden.
    #[must_use]
    pub fn hiding_reason(&self) -> Option<HidingReason> {
        self.visibility().reason()
    }

    /// Overwrite the visibility.
    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.meta_mut().visibility = visibility;
    }

    /// Mark visible, clearing any reason.
    pub fn show(&mut self) {
        self.set_visibility(Visibility::Visible);
    }

    /// Mark hidden.
    pub fn hide(&mut self, reason: HidingReason) {
        self.set_visibility(Visibility::Hidden(reason));
    }
}

impl From<SpanSuggestion> for Suggestion {
    fn from(s: SpanSuggestion) -> Self {
        Suggestion::Span(s)
    }
}

impl From<RelationSuggestion> for Suggestion {
    fn from(r: RelationSuggestion) -> Self {
        Suggestion::Relation(r)
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Suggestion`].
///
/// # Example
///
/// ```rust
/// use visor_core::{Offset, Suggestion};
///
/// let s = Suggestion::builder()
///     .id(1)
///     .document("doc")
///     .layer(42)
///     .feature("value")
///     .label("LOC")
///     .span(Offset::new(0, 3).unwrap());
/// assert!(s.is_visible());
/// assert_eq!(s.label(), Some("LOC"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SuggestionBuilder {
    id: SuggestionId,
    recommender_id: RecommenderId,
    recommender_name: String,
    layer_id: LayerId,
    feature: String,
    document_name: String,
    label: Option<String>,
    score: f64,
    score_explanation: Option<String>,
}

impl SuggestionBuilder {
    /// Set the id.
    #[must_use]
    pub fn id(mut self, id: SuggestionId) -> Self {
        self.id = id;
        self
    }

    /// Set the producing recommender.
    #[must_use]
    pub fn recommender(mut self, id: RecommenderId, name: impl Into<String>) -> Self {
        self.recommender_id = id;
        self.recommender_name = name.into();
        self
    }

    /// Set the layer.
    #[must_use]
    pub fn layer(mut self, layer: LayerId) -> Self {
        self.layer_id = layer;
        self
    }

    /// Set the feature.
    #[must_use]
    pub fn feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = feature.into();
        self
    }

    /// Set the document name.
    #[must_use]
    pub fn document(mut self, name: impl Into<String>) -> Self {
        self.document_name = name.into();
        self
    }

    /// Set the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the score.
    #[must_use]
    pub fn score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    /// Set the score explanation.
    #[must_use]
    pub fn score_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.score_explanation = Some(explanation.into());
        self
    }

    fn meta(self) -> SuggestionMeta {
        SuggestionMeta {
            id: self.id,
            recommender_id: self.recommender_id,
            recommender_name: self.recommender_name,
            layer_id: self.layer_id,
            feature: self.feature,
            document_name: self.document_name,
            label: self.label,
            score: self.score,
            score_explanation: self.score_explanation,
            visibility: Visibility::Visible,
        }
    }

    /// Finish as a span suggestion at `position`.
    #[must_use]
    pub fn span(self, position: Offset) -> Suggestion {
        Suggestion::Span(SpanSuggestion {
            meta: self.meta(),
            position,
        })
    }

    /// Finish as a relation suggestion from `source` to `target`.
    #[must_use]
    pub fn relation(self, source: Offset, target: Offset) -> Suggestion {
        Suggestion::Relation(RelationSuggestion {
            meta: self.meta(),
            source,
            target,
        })
    }
}
