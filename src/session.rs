//! Per-user recommendation sessions.
//!
//! A browser session fires render and accept/reject requests in quick
//! succession, often concurrently. Everything belonging to one
//! `(user, project)` pair lives in a [`RecommendationSession`] behind its own
//! mutex; the [`SessionStore`] map is only locked long enough to find or
//! create that mutex, never while a session is being worked on.

use crate::config::SessionConfig;
use crate::sync::{read, write, Mutex, RwLock};
use crate::{LayerId, RecommenderId, SuggestionGroup};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Identifies a session: the logged-in user working in a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// Logged-in user
    pub user: String,
    /// Project name
    pub project: String,
}

impl SessionKey {
    /// Key for `user` in `project`.
    #[must_use]
    pub fn new(user: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            project: project.into(),
        }
    }
}

type GroupKey = (String, LayerId);

/// Mutable state of one session.
#[derive(Debug)]
pub struct RecommendationSession {
    key: SessionKey,
    max_cached_groups: usize,
    predictions: HashMap<GroupKey, SuggestionGroup>,
    arrival: VecDeque<GroupKey>,
    disabled: HashSet<RecommenderId>,
    predictions_switched: bool,
}

impl RecommendationSession {
    /// Fresh session.
    #[must_use]
    pub fn new(key: SessionKey, config: &SessionConfig) -> Self {
        Self {
            key,
            max_cached_groups: config.max_cached_groups.max(1),
            predictions: HashMap::new(),
            arrival: VecDeque::new(),
            disabled: HashSet::new(),
            predictions_switched: false,
        }
    }

    /// The session's key.
    #[must_use]
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Replace the predictions for `(group.document(), layer)` with a new
    /// run. Evicts the oldest cached group when over capacity and returns
    /// its key.
    pub fn put_predictions(
        &mut self,
        layer: LayerId,
        group: SuggestionGroup,
    ) -> Option<(String, LayerId)> {
        let key = (group.document().to_owned(), layer);
        if self.predictions.insert(key.clone(), group).is_some() {
            self.arrival.retain(|k| k != &key);
        }
        self.arrival.push_back(key);
        self.predictions_switched = true;

        if self.predictions.len() > self.max_cached_groups {
            let oldest = self.arrival.pop_front()?;
            self.predictions.remove(&oldest);
            return Some(oldest);
        }
        None
    }

    /// Current predictions for a document and layer.
    #[must_use]
    pub fn predictions(&self, document: &str, layer: LayerId) -> Option<&SuggestionGroup> {
        self.predictions.get(&(document.to_owned(), layer))
    }

    /// Current predictions, mutably.
    pub fn predictions_mut(
        &mut self,
        document: &str,
        layer: LayerId,
    ) -> Option<&mut SuggestionGroup> {
        self.predictions.get_mut(&(document.to_owned(), layer))
    }

    /// Number of cached groups.
    #[must_use]
    pub fn cached_groups(&self) -> usize {
        self.predictions.len()
    }

    /// Drop all cached predictions.
    pub fn clear_predictions(&mut self) {
        self.predictions.clear();
        self.arrival.clear();
    }

    /// Whether new predictions arrived since the last call; resets the flag.
    pub fn take_predictions_switched(&mut self) -> bool {
        std::mem::take(&mut self.predictions_switched)
    }

    /// Stop showing suggestions from `recommender`.
    pub fn disable_recommender(&mut self, recommender: RecommenderId) {
        self.disabled.insert(recommender);
    }

    /// Show suggestions from `recommender` again.
    pub fn enable_recommender(&mut self, recommender: RecommenderId) {
        self.disabled.remove(&recommender);
    }

    /// Recommenders switched off in this session.
    pub fn disabled_recommenders(&self) -> impl Iterator<Item = RecommenderId> + '_ {
        self.disabled.iter().copied()
    }

    /// Recommenders are enabled unless explicitly disabled.
    #[must_use]
    pub fn is_enabled(&self, recommender: RecommenderId) -> bool {
        !self.disabled.contains(&recommender)
    }
}

/// All live sessions, one lock each.
#[derive(Debug, Default)]
pub struct SessionStore {
    config: SessionConfig,
    sessions: RwLock<HashMap<SessionKey, Arc<Mutex<RecommendationSession>>>>,
}

impl SessionStore {
    /// Empty store.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The session for `key`, created on first use.
    pub fn get_or_create(&self, key: &SessionKey) -> Arc<Mutex<RecommendationSession>> {
        if let Some(session) = read(&self.sessions).get(key) {
            return Arc::clone(session);
        }
        let mut sessions = write(&self.sessions);
        let session = sessions.entry(key.clone()).or_insert_with(|| {
            log::debug!("Creating recommendation session for {} in {}", key.user, key.project);
            Arc::new(Mutex::new(RecommendationSession::new(key.clone(), &self.config)))
        });
        Arc::clone(session)
    }

    /// The session for `key`, if it exists.
    #[must_use]
    pub fn get(&self, key: &SessionKey) -> Option<Arc<Mutex<RecommendationSession>>> {
        read(&self.sessions).get(key).cloned()
    }

    /// End a session. Holders of its `Arc` keep a detached copy.
    pub fn remove(&self, key: &SessionKey) -> bool {
        write(&self.sessions).remove(key).is_some()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        read(&self.sessions).len()
    }

    /// True if there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::lock;

    fn key() -> SessionKey {
        SessionKey::new("anna", "project")
    }

    #[test]
    fn test_put_replaces_and_flags() {
        let mut session = RecommendationSession::new(key(), &SessionConfig::default());
        assert!(!session.take_predictions_switched());

        session.put_predictions(42, SuggestionGroup::new("doc"));
        session.put_predictions(42, SuggestionGroup::new("doc"));
        assert_eq!(session.cached_groups(), 1);
        assert!(session.take_predictions_switched());
        assert!(!session.take_predictions_switched());
        assert!(session.predictions("doc", 42).is_some());
        assert!(session.predictions("doc", 7).is_none());
    }

    #[test]
    fn test_oldest_group_evicted() {
        let config = SessionConfig::default().with_max_cached_groups(2);
        let mut session = RecommendationSession::new(key(), &config);

        assert_eq!(session.put_predictions(42, SuggestionGroup::new("a")), None);
        assert_eq!(session.put_predictions(42, SuggestionGroup::new("b")), None);
        // Refreshing "a" makes "b" the oldest.
        assert_eq!(session.put_predictions(42, SuggestionGroup::new("a")), None);
        assert_eq!(
            session.put_predictions(42, SuggestionGroup::new("c")),
            Some(("b".to_string(), 42))
        );
        assert!(session.predictions("a", 42).is_some());
        assert!(session.predictions("b", 42).is_none());
    }

    #[test]
    fn test_recommender_toggle() {
        let mut session = RecommendationSession::new(key(), &SessionConfig::default());
        assert!(session.is_enabled(3));
        session.disable_recommender(3);
        assert!(!session.is_enabled(3));
        session.enable_recommender(3);
        assert!(session.is_enabled(3));
    }

    #[test]
    fn test_store_returns_same_session() {
        let store = SessionStore::new(SessionConfig::default());
        let a = store.get_or_create(&key());
        let b = store.get_or_create(&key());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.len(), 1);

        lock(&a).disable_recommender(1);
        assert!(!lock(&b).is_enabled(1));

        assert!(store.remove(&key()));
        assert!(store.get(&key()).is_none());
        assert!(store.is_empty());
    }
}
