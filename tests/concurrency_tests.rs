//! Thread-safety of the service: sessions are isolated, documents are read
//! as consistent snapshots.

use std::sync::Arc;
use std::thread;

use visor::{
    AnnotationDocument, Config, InMemoryLearningRecords, LayerConfig, LayerId, Offset,
    RecommendationService, SessionKey, SessionStore, SharedDocument, StaticLayerPolicy,
    Suggestion, SuggestionGroup, VisibilityEngine,
};

const LAYER: LayerId = 7;
const LEN: usize = 200;

fn off(begin: usize, end: usize) -> Offset {
    Offset::new(begin, end).unwrap()
}

fn predictions(document: &str) -> SuggestionGroup {
    SuggestionGroup::from_suggestions(
        document,
        (0..20u64).map(|i| {
            let begin = (i as usize) * 10;
            Suggestion::builder()
                .id(i)
                .document(document)
                .layer(LAYER)
                .feature("value")
                .label("X")
                .span(off(begin, begin + 5))
        }),
    )
    .unwrap()
}

fn service() -> Arc<RecommendationService> {
    let config = Config::default().with_layer(LayerConfig::new(LAYER, "Layer"));
    Arc::new(RecommendationService::from_config(&config))
}

#[test]
fn test_types_are_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RecommendationService>();
    assert_send_sync::<SessionStore>();
    assert_send_sync::<SharedDocument>();
    assert_send_sync::<InMemoryLearningRecords>();
    assert_send_sync::<StaticLayerPolicy>();
    assert_send_sync::<VisibilityEngine>();
}

#[test]
fn test_concurrent_sessions_are_isolated() {
    let service = service();
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                let key = SessionKey::new(format!("user{t}"), "p");
                let doc = SharedDocument::new(AnnotationDocument::with_length("doc", LEN));
                service.put_predictions(&key, LAYER, predictions("doc")).unwrap();

                // Each user rejects a different suggestion.
                service.reject(&key, &key.user, &doc, LAYER, t).unwrap();
                let visible = service.render(&key, &key.user, &doc, LAYER, off(0, LEN)).unwrap();
                assert_eq!(visible.len(), 19);
                assert!(visible.iter().all(|s| s.id() != t));
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(service.sessions().len(), 8);
}

#[test]
fn test_render_sees_consistent_snapshot_while_editing() {
    let service = service();
    let doc = SharedDocument::new(AnnotationDocument::with_length("doc", LEN));
    let key = SessionKey::new("anna", "p");
    service.put_predictions(&key, LAYER, predictions("doc")).unwrap();

    let writer = {
        let doc = doc.clone();
        thread::spawn(move || {
            // Annotations are added and removed in pairs under one write
            // guard, so a reader sees either none or both.
            for _ in 0..200 {
                let mut guard = doc.write();
                let a = guard.add(LAYER, "value", off(0, 5)).unwrap();
                let b = guard.add(LAYER, "value", off(10, 15)).unwrap();
                drop(guard);

                let mut guard = doc.write();
                guard.remove(a).unwrap();
                guard.remove(b).unwrap();
            }
        })
    };

    for _ in 0..200 {
        let visible = service.render(&key, "anna", &doc, LAYER, off(0, LEN)).unwrap();
        assert!(
            visible.len() == 20 || visible.len() == 18,
            "torn snapshot: {} visible",
            visible.len()
        );
    }
    writer.join().unwrap();

    let visible = service.render(&key, "anna", &doc, LAYER, off(0, LEN)).unwrap();
    assert_eq!(visible.len(), 20);
}

#[test]
fn test_same_session_from_many_threads() {
    let service = service();
    let doc = SharedDocument::new(AnnotationDocument::with_length("doc", LEN));
    let key = SessionKey::new("anna", "p");
    service.put_predictions(&key, LAYER, predictions("doc")).unwrap();

    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let service = Arc::clone(&service);
            let doc = doc.clone();
            let key = key.clone();
            thread::spawn(move || {
                for i in (t..20).step_by(4) {
                    service.reject(&key, "anna", &doc, LAYER, i).unwrap();
                    service.render(&key, "anna", &doc, LAYER, off(0, LEN)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(service.render(&key, "anna", &doc, LAYER, off(0, LEN)).unwrap().is_empty());
    assert_eq!(service.sessions().len(), 1);
}
