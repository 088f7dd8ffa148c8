//! Recommendation orchestration: sessions, render passes, user decisions.
//!
//! This is the boundary where configuration errors surface. By the time the
//! [`VisibilityEngine`] runs, the layer is known, its overlap mode has been
//! read, and the predictions belong to the document being rendered.
//!
//! # Lock Order
//!
//! Session mutex first, then the document lock. Render passes hold the
//! document read guard for the whole computation, so an edit is seen either
//! entirely or not at all.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::index::{AnnotationIndex, SharedDocument};
use crate::policy::{LayerPolicy, StaticLayerPolicy};
use crate::records::{InMemoryLearningRecords, LearningRecordStore};
use crate::session::{RecommendationSession, SessionKey, SessionStore};
use crate::sync::lock;
use crate::visibility::{conflicts, VisibilityEngine, VisibilityRequest};
use crate::{
    AnnotationId, HidingReason, LayerId, LearningRecord, LearningRecordType, Offset,
    OverlapMode, RecommenderId, Suggestion, SuggestionGroup, SuggestionId,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Owns sessions and runs the visibility engine once per render pass.
pub struct RecommendationService {
    engine: VisibilityEngine,
    policy: Arc<dyn LayerPolicy>,
    records: Arc<dyn LearningRecordStore>,
    sessions: SessionStore,
}

impl std::fmt::Debug for RecommendationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationService")
            .field("engine", &self.engine)
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

impl RecommendationService {
    /// Service over the given collaborators.
    #[must_use]
    pub fn new(
        config: &Config,
        policy: Arc<dyn LayerPolicy>,
        records: Arc<dyn LearningRecordStore>,
    ) -> Self {
        Self {
            engine: VisibilityEngine::new(config.visibility.clone()),
            policy,
            records,
            sessions: SessionStore::new(config.session.clone()),
        }
    }

    /// Service with the layers from `config` and an in-memory record store.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config,
            Arc::new(StaticLayerPolicy::from_config(config)),
            Arc::new(InMemoryLearningRecords::new()),
        )
    }

    /// The learning record store.
    #[must_use]
    pub fn records(&self) -> &Arc<dyn LearningRecordStore> {
        &self.records
    }

    /// Live sessions.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn overlap_mode(&self, layer: LayerId) -> Result<OverlapMode> {
        self.policy
            .overlap_mode(layer)
            .ok_or(Error::UnknownLayer(layer))
    }

    /// Switch in a fresh prediction run for `layer`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownLayer`] if the policy does not know `layer`, or
    /// [`Error::InvalidInput`] if a suggestion targets another layer.
    pub fn put_predictions(
        &self,
        key: &SessionKey,
        layer: LayerId,
        mut group: SuggestionGroup,
    ) -> Result<()> {
        self.overlap_mode(layer)?;
        if let Some(stray) = group.iter().find(|s| s.layer_id() != layer) {
            return Err(Error::invalid_input(format!(
                "suggestion {} targets layer {}, not {}",
                stray.id(),
                stray.layer_id(),
                layer
            )));
        }
        // A new run starts from scratch; nothing from an old pass carries over.
        for suggestion in group.iter_mut() {
            suggestion.show();
        }

        let session = self.sessions.get_or_create(key);
        let mut session = lock(&session);
        log::info!(
            "Switching {} predictions for {} on layer {} ({})",
            group.len(),
            group.document(),
            layer,
            key.user
        );
        if let Some((document, evicted)) = session.put_predictions(layer, group) {
            log::debug!("Evicted cached predictions for {document} on layer {evicted}");
        }
        Ok(())
    }

    /// Recompute visibility for `window` and return the visible suggestions
    /// from enabled recommenders, ordered by position.
    ///
    /// `data_owner` is the user whose annotations and decisions count; it
    /// differs from `key.user` when a curator looks at someone else's work.
    /// A document without predictions renders nothing.
    pub fn render(
        &self,
        key: &SessionKey,
        data_owner: &str,
        document: &SharedDocument,
        layer: LayerId,
        window: Offset,
    ) -> Result<Vec<Suggestion>> {
        let overlap_mode = self.overlap_mode(layer)?;
        let session = self.sessions.get_or_create(key);
        let mut session = lock(&session);
        let snapshot = document.read();

        let disabled: HashSet<RecommenderId> = session.disabled_recommenders().collect();
        let Some(group) = session.predictions_mut(snapshot.name(), layer) else {
            return Ok(Vec::new());
        };

        let request = VisibilityRequest {
            user: data_owner,
            session_owner: &key.user,
            layer,
            overlap_mode,
            window,
        };
        self.engine
            .compute_visibility(&request, &*snapshot, self.records.as_ref(), group);

        log_render_summary(group, &request, snapshot.document_length());

        Ok(group
            .overlapping(window)
            .filter(|s| s.layer_id() == layer && s.is_visible())
            .filter(|s| !disabled.contains(&s.recommender_id()))
            .cloned()
            .collect())
    }

    /// Turn a suggestion into an annotation and record the acceptance.
    ///
    /// Relation suggestions are committed at their anchor (target) span.
    ///
    /// # Errors
    ///
    /// [`Error::AnnotationConflict`] if the document already holds an
    /// annotation that the layer's overlap mode does not allow next to the
    /// new one. This covers accepting the same suggestion twice and accepting
    /// a competitor of one already accepted. Nothing is recorded then.
    pub fn accept(
        &self,
        key: &SessionKey,
        data_owner: &str,
        document: &SharedDocument,
        layer: LayerId,
        suggestion: SuggestionId,
    ) -> Result<AnnotationId> {
        let overlap_mode = self.overlap_mode(layer)?;
        let session = self.sessions.get_or_create(key);
        let session = lock(&session);
        let accepted = find_suggestion(&session, document.name(), layer, suggestion)?;

        let id = {
            let mut doc = document.write();
            let position = accepted.position();
            let occupied = doc
                .annotations_overlapping(layer, position)
                .iter()
                .any(|a| conflicts(overlap_mode, &accepted, a));
            if occupied {
                log::warn!(
                    "{} cannot accept suggestion {} at {} on {}: layer {} is occupied ({})",
                    key.user,
                    accepted.id(),
                    position,
                    doc.name(),
                    layer,
                    overlap_mode
                );
                return Err(Error::AnnotationConflict {
                    layer,
                    offset: position,
                });
            }
            match accepted.label() {
                Some(label) => {
                    doc.add_labeled(layer, accepted.feature(), accepted.position(), label)?
                }
                None => doc.add(layer, accepted.feature(), accepted.position())?,
            }
        };

        self.record(key, data_owner, &accepted, LearningRecordType::Accepted);
        Ok(id)
    }

    /// Record that the user rejected a suggestion.
    pub fn reject(
        &self,
        key: &SessionKey,
        data_owner: &str,
        document: &SharedDocument,
        layer: LayerId,
        suggestion: SuggestionId,
    ) -> Result<()> {
        self.decide(key, data_owner, document, layer, suggestion, LearningRecordType::Rejected)
    }

    /// Record that the user skipped a suggestion.
    pub fn skip(
        &self,
        key: &SessionKey,
        data_owner: &str,
        document: &SharedDocument,
        layer: LayerId,
        suggestion: SuggestionId,
    ) -> Result<()> {
        self.decide(key, data_owner, document, layer, suggestion, LearningRecordType::Skipped)
    }

    fn decide(
        &self,
        key: &SessionKey,
        data_owner: &str,
        document: &SharedDocument,
        layer: LayerId,
        suggestion: SuggestionId,
        action: LearningRecordType,
    ) -> Result<()> {
        self.overlap_mode(layer)?;
        let session = self.sessions.get_or_create(key);
        let session = lock(&session);
        let decided = find_suggestion(&session, document.name(), layer, suggestion)?;
        self.record(key, data_owner, &decided, action);
        Ok(())
    }

    fn record(
        &self,
        key: &SessionKey,
        data_owner: &str,
        suggestion: &Suggestion,
        action: LearningRecordType,
    ) {
        log::info!(
            "{} {} suggestion {} at {} on {} for {}",
            key.user,
            action,
            suggestion.id(),
            suggestion.position(),
            suggestion.document_name(),
            data_owner
        );
        self.records.append(LearningRecord {
            user: data_owner.to_owned(),
            session_owner: key.user.clone(),
            layer: suggestion.layer_id(),
            feature: suggestion.feature().to_owned(),
            source_document: suggestion.document_name().to_owned(),
            offset: suggestion.position(),
            label: suggestion.label().map(str::to_owned),
            action,
        });
    }

    /// Stop rendering suggestions from `recommender` in this session.
    pub fn disable_recommender(&self, key: &SessionKey, recommender: RecommenderId) {
        let session = self.sessions.get_or_create(key);
        lock(&session).disable_recommender(recommender);
    }

    /// Render suggestions from `recommender` again.
    pub fn enable_recommender(&self, key: &SessionKey, recommender: RecommenderId) {
        let session = self.sessions.get_or_create(key);
        lock(&session).enable_recommender(recommender);
    }

    /// Whether `recommender` is enabled in this session.
    #[must_use]
    pub fn is_enabled(&self, key: &SessionKey, recommender: RecommenderId) -> bool {
        self.sessions
            .get(key)
            .map_or(true, |session| lock(&session).is_enabled(recommender))
    }

    /// Whether new predictions were switched in since the last call.
    ///
    /// The editor polls this after each request and re-renders when it
    /// returns true. Reading resets the flag; an unknown session reports
    /// false.
    pub fn take_predictions_switched(&self, key: &SessionKey) -> bool {
        self.sessions
            .get(key)
            .is_some_and(|session| lock(&session).take_predictions_switched())
    }

    /// End a session, dropping its cached predictions.
    pub fn clear_session(&self, key: &SessionKey) -> bool {
        self.sessions.remove(key)
    }
}

fn find_suggestion(
    session: &RecommendationSession,
    document: &str,
    layer: LayerId,
    id: SuggestionId,
) -> Result<Suggestion> {
    session
        .predictions(document, layer)
        .ok_or_else(|| Error::unknown_document(document))?
        .get(id)
        .cloned()
        .ok_or(Error::UnknownSuggestion(id))
}

fn log_render_summary(group: &SuggestionGroup, request: &VisibilityRequest<'_>, length: usize) {
    let (mut visible, mut rejected, mut overlapping) = (0usize, 0usize, 0usize);
    for suggestion in group
        .overlapping(request.window)
        .filter(|s| s.layer_id() == request.layer)
    {
        match suggestion.hiding_reason() {
            None => visible += 1,
            Some(HidingReason::Rejected) => rejected += 1,
            Some(HidingReason::Overlapping) => overlapping += 1,
        }
        if suggestion.position().end() > length {
            log::warn!(
                "Suggestion {} at {} lies outside {} (length {}); hidden",
                suggestion.id(),
                suggestion.position(),
                group.document(),
                length
            );
        }
    }
    log::debug!(
        "Visibility for {} layer {} window {} ({} as {}): {} visible, {} rejected, {} overlapping",
        group.document(),
        request.layer,
        request.window,
        request.session_owner,
        request.user,
        visible,
        rejected,
        overlapping
    );
}
