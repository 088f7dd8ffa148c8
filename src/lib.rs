//! # visor
//!
//! Suggestion visibility for collaborative text annotation.
//!
//! Recommenders propose annotations; a human annotator accepts, rejects or
//! ignores them while editing the document. visor decides, for every
//! suggestion in the rendering window, whether it should be shown right now:
//!
//! - **Rejections**: a suggestion the user rejected at exactly this position
//!   stays hidden
//! - **Conflicts**: a suggestion clashing with a committed annotation is
//!   hidden, according to the layer's [`OverlapMode`]
//! - **Restoration**: visibility is recomputed from scratch on every pass, so
//!   deleting an annotation brings its suggestions back
//!
//! ## Quick Start
//!
//! ```rust
//! use visor::{
//!     AnnotationDocument, Config, LayerConfig, Offset, RecommendationService, SessionKey,
//!     SharedDocument, Suggestion, SuggestionGroup,
//! };
//!
//! let off = |b, e| Offset::new(b, e).unwrap();
//! let config = Config::default().with_layer(LayerConfig::new(42, "NamedEntity"));
//! let service = RecommendationService::from_config(&config);
//! let key = SessionKey::new("anna", "project");
//!
//! let document = SharedDocument::new(AnnotationDocument::new("doc", "Dies ist ein Testtext"));
//! let predictions = SuggestionGroup::from_suggestions("doc", [
//!     Suggestion::builder().id(1).document("doc").layer(42).feature("value")
//!         .label("LOC").span(off(0, 4)),
//! ])?;
//! service.put_predictions(&key, 42, predictions)?;
//!
//! let visible = service.render(&key, "anna", &document, 42, off(0, 21))?;
//! assert_eq!(visible.len(), 1);
//!
//! // Accepting creates the annotation, which now hides the suggestion.
//! service.accept(&key, "anna", &document, 42, 1)?;
//! assert!(service.render(&key, "anna", &document, 42, off(0, 21))?.is_empty());
//! # Ok::<(), visor::Error>(())
//! ```
//!
//! ## Modules
//!
//! | Module | Role |
//! |--------|------|
//! | [`visibility`] | The engine: rule chain and conflict matrix |
//! | [`index`] | Committed annotations of a live document |
//! | [`records`] | Log of accept/reject/skip decisions |
//! | [`policy`] | Per-layer overlap mode |
//! | [`session`] | Per-user state, one lock per session |
//! | [`service`] | Orchestration of the above per render pass |
//! | [`config`] | TOML configuration |
//!
//! Core data types live in `visor-core` and are re-exported here.

#![warn(missing_docs)]

pub mod config;
mod error;
pub mod index;
pub mod policy;
pub mod records;
pub mod service;
pub mod session;
pub mod sync;
pub mod visibility;

pub use error::{Error, Result};

pub use visor_core::{
    labels_match, normalize_label, Annotation, AnnotationId, Decision, DecisionKey,
    HidingReason, LayerId, LearningRecord, LearningRecordType, Offset, OverlapMode,
    RecommenderId, RelationSuggestion, SpanSuggestion, Suggestion, SuggestionBuilder,
    SuggestionGroup, SuggestionId, SuggestionMeta, Visibility,
};

pub use config::{Config, LayerConfig, RejectionScope, SessionConfig, VisibilityConfig};
pub use index::{AnnotationDocument, AnnotationIndex, SharedDocument};
pub use policy::{LayerPolicy, StaticLayerPolicy};
pub use records::{InMemoryLearningRecords, LearningRecordStore};
pub use service::RecommendationService;
pub use session::{RecommendationSession, SessionKey, SessionStore};
pub use visibility::{VisibilityEngine, VisibilityRequest};
