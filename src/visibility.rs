//! The visibility engine: which suggestions may be shown right now.
//!
//! # The Decision Chain
//!
//! Every suggestion whose position intersects the rendering window runs
//! through the same fixed chain. The first rule that fires decides.
//!
//! ```text
//!                 suggestion s in window, on the requested layer
//!                                  │
//!                                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │ 1. REJECTED                                                       │
//! │    latest learning record at exactly (user, layer, document,      │
//! │    feature, s.position) is a rejection?          ──yes──► HIDDEN  │
//! │                                                        REJECTED   │
//! ├───────────────────────────────────────────────────────────────────┤
//! │ 2. UNRESOLVABLE                                                   │
//! │    s.position ends past the end of the document?  ──yes──► HIDDEN │
//! │                                                        OVERLAPPING│
//! ├───────────────────────────────────────────────────────────────────┤
//! │ 3. OVERLAPPING                                                    │
//! │    a committed annotation on the layer conflicts with s          │
//! │    under the layer's overlap mode?                ──yes──► HIDDEN │
//! │                                                        OVERLAPPING│
//! ├───────────────────────────────────────────────────────────────────┤
//! │ 4. default                                            ──► VISIBLE │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An accepted suggestion needs no rule of its own: accepting it created an
//! annotation at the same position, which rule 3 then finds.
//!
//! # Conflicts Under Each Overlap Mode
//!
//! ```text
//!                        stacked               crossing
//!                  annotation == position   annotation overlaps
//!                                            but differs
//! ┌──────────────┬────────────────────────┬────────────────────────┐
//! │ NoOverlap    │ hide                   │ hide                   │
//! │ StackingOnly │ hide if same label     │ hide                   │
//! │ OverlapOnly  │ hide                   │ hide if same label     │
//! │ AnyOverlap   │ hide if same label     │ hide if same label     │
//! └──────────────┴────────────────────────┴────────────────────────┘
//! ```
//!
//! "Same label" means same feature and equal value, with unset and empty
//! values equal to each other and to nothing else.
//!
//! # Statelessness
//!
//! The engine keeps nothing between calls. Each in-scope suggestion's state
//! is overwritten from the full chain, so removing the annotation that hid a
//! suggestion and recomputing makes it visible again. Suggestions outside the
//! window, or on another layer, are left untouched.

use crate::config::{RejectionScope, VisibilityConfig};
use crate::index::AnnotationIndex;
use crate::records::LearningRecordStore;
use crate::{
    labels_match, Annotation, DecisionKey, HidingReason, LayerId, LearningRecordType, Offset,
    OverlapMode, Suggestion, SuggestionGroup, Visibility,
};

/// Who is looking at which layer through which window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityRequest<'a> {
    /// Owner of the annotations; learning records are looked up for this user
    pub user: &'a str,
    /// User currently logged in. Informational: the rules never read it,
    /// since a curator viewing `user`'s work must see `user`'s decisions.
    /// Callers use it for logging.
    pub session_owner: &'a str,
    /// Layer being rendered
    pub layer: LayerId,
    /// Stacking policy of `layer`, resolved by the caller
    pub overlap_mode: OverlapMode,
    /// Rendering window
    pub window: Offset,
}

/// Stamps every in-window suggestion visible or hidden-with-reason.
///
/// The engine is a pure function of its inputs and is `Send + Sync`; it can
/// serve concurrent render passes as long as each brings its own group.
///
/// # Example
///
/// ```rust
/// use visor::{
///     AnnotationDocument, InMemoryLearningRecords, Offset, OverlapMode, Suggestion,
///     SuggestionGroup, VisibilityEngine, VisibilityRequest,
/// };
///
/// let off = |b, e| Offset::new(b, e).unwrap();
/// let mut doc = AnnotationDocument::with_length("doc", 25);
/// doc.add_labeled(42, "value", off(0, 3), "LOC").unwrap();
///
/// let mut group = SuggestionGroup::from_suggestions("doc", [
///     Suggestion::builder().id(1).document("doc").layer(42).feature("value").span(off(0, 3)),
///     Suggestion::builder().id(2).document("doc").layer(42).feature("value").span(off(5, 10)),
/// ]).unwrap();
///
/// let request = VisibilityRequest {
///     user: "anna",
///     session_owner: "anna",
///     layer: 42,
///     overlap_mode: OverlapMode::NoOverlap,
///     window: off(0, 25),
/// };
/// VisibilityEngine::default().compute_visibility(
///     &request, &doc, &InMemoryLearningRecords::new(), &mut group,
/// );
///
/// assert!(!group.get(1).unwrap().is_visible());
/// assert!(group.get(2).unwrap().is_visible());
/// ```
#[derive(Debug, Clone, Default)]
pub struct VisibilityEngine {
    config: VisibilityConfig,
}

impl VisibilityEngine {
    /// Engine with the given settings.
    #[must_use]
    pub fn new(config: VisibilityConfig) -> Self {
        Self { config }
    }

    /// Current settings.
    #[must_use]
    pub fn config(&self) -> &VisibilityConfig {
        &self.config
    }

    /// Recompute visibility of every suggestion in `group` that lies on
    /// `request.layer` and intersects `request.window`.
    ///
    /// Returns `group` for chaining. Never fails: malformed configuration is
    /// the caller's concern, and unresolvable positions are hidden.
    pub fn compute_visibility<'g>(
        &self,
        request: &VisibilityRequest<'_>,
        annotations: &dyn AnnotationIndex,
        records: &dyn LearningRecordStore,
        group: &'g mut SuggestionGroup,
    ) -> &'g mut SuggestionGroup {
        // One index query for everything any in-scope suggestion can touch;
        // suggestions may stick out of the window.
        let Some(extent) = group
            .overlapping(request.window)
            .filter(|s| s.layer_id() == request.layer)
            .map(Suggestion::position)
            .reduce(|a, b| a.union(&b))
        else {
            return group;
        };

        let committed =
            CommittedSpans::new(annotations.annotations_overlapping(request.layer, extent));
        let document = group.document().to_owned();
        let document_length = annotations.document_length();

        for suggestion in group
            .overlapping_mut(request.window)
            .filter(|s| s.layer_id() == request.layer)
        {
            let visibility = self.evaluate(
                request,
                &document,
                document_length,
                &committed,
                records,
                suggestion,
            );
            suggestion.set_visibility(visibility);
        }

        group
    }

    fn evaluate(
        &self,
        request: &VisibilityRequest<'_>,
        document: &str,
        document_length: usize,
        committed: &CommittedSpans,
        records: &dyn LearningRecordStore,
        suggestion: &Suggestion,
    ) -> Visibility {
        let position = suggestion.position();

        if self.is_rejected(request, document, records, suggestion) {
            return Visibility::Hidden(HidingReason::Rejected);
        }

        if position.end() > document_length {
            return Visibility::Hidden(HidingReason::Overlapping);
        }

        let conflicting = committed
            .overlapping(position)
            .any(|a| conflicts(request.overlap_mode, suggestion, a));
        if conflicting {
            return Visibility::Hidden(HidingReason::Overlapping);
        }

        Visibility::Visible
    }

    fn is_rejected(
        &self,
        request: &VisibilityRequest<'_>,
        document: &str,
        records: &dyn LearningRecordStore,
        suggestion: &Suggestion,
    ) -> bool {
        let key = DecisionKey {
            user: request.user.to_owned(),
            layer: request.layer,
            document: document.to_owned(),
            feature: suggestion.feature().to_owned(),
            offset: suggestion.position(),
        };
        let Some(decision) = records.most_recent_decision(&key) else {
            return false;
        };
        if decision.action != LearningRecordType::Rejected {
            return false;
        }
        match self.config.rejection_scope {
            RejectionScope::Position => true,
            RejectionScope::PositionAndLabel => {
                labels_match(decision.label.as_deref(), suggestion.label())
            }
        }
    }
}

/// Does `annotation` (already known to overlap) rule out `suggestion`?
///
/// Also decides whether accepting `suggestion` would put a second annotation
/// where the layer's overlap mode forbids one.
pub(crate) fn conflicts(
    mode: OverlapMode,
    suggestion: &Suggestion,
    annotation: &Annotation,
) -> bool {
    let stacked = annotation.offset == suggestion.position();
    let permitted = if stacked {
        mode.allows_stacking()
    } else {
        mode.allows_crossing()
    };
    if !permitted {
        return true;
    }
    annotation.feature == suggestion.feature()
        && labels_match(annotation.value.as_deref(), suggestion.label())
}

// =============================================================================
// Committed span index
// =============================================================================

/// Annotations sorted by begin, with the longest length remembered so an
/// overlap query can skip everything that ends too early.
struct CommittedSpans {
    annotations: Vec<Annotation>,
    max_len: usize,
}

impl CommittedSpans {
    fn new(mut annotations: Vec<Annotation>) -> Self {
        annotations.sort_by_key(|a| a.offset);
        let max_len = annotations.iter().map(|a| a.offset.len()).max().unwrap_or(0);
        Self {
            annotations,
            max_len,
        }
    }

    fn overlapping(&self, position: Offset) -> impl Iterator<Item = &Annotation> {
        // An annotation ends at most `max_len` after it begins, so anything
        // beginning at or before `position.begin() - max_len` cannot reach it.
        let lower = self.annotations.partition_point(|a| {
            a.offset.begin().saturating_add(self.max_len) <= position.begin()
        });
        let upper = self
            .annotations
            .partition_point(|a| a.offset.begin() < position.end());
        self.annotations[lower..upper.max(lower)]
            .iter()
            .filter(move |a| a.offset.overlaps(&position))
    }
}
