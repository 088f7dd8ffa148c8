//! Read access to the committed annotations of a live document.
//!
//! [`AnnotationIndex`] is what the visibility engine consumes. It must
//! reflect the current document state: an annotation removed by the user is
//! gone on the very next query, with no caching in between.
//!
//! [`AnnotationDocument`] is the in-memory document the rest of visor works
//! against, and [`SharedDocument`] is how it is shared between the editor and
//! render passes. A render pass holds the read guard for its whole duration,
//! so it sees each edit either completely or not at all.

use crate::error::{Error, Result};
use crate::sync::{read, write, RwLock, RwLockReadGuard, RwLockWriteGuard};
use crate::{Annotation, AnnotationId, LayerId, Offset};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Committed annotations of one document, queried by layer and range.
pub trait AnnotationIndex {
    /// Name of the document.
    fn document_name(&self) -> &str;

    /// Length of the document text in characters.
    fn document_length(&self) -> usize;

    /// Annotations on `layer` overlapping `range`, ordered by offset.
    fn annotations_overlapping(&self, layer: LayerId, range: Offset) -> Vec<Annotation>;
}

// =============================================================================
// AnnotationDocument
// =============================================================================

/// An annotated document held in memory.
///
/// Annotations are indexed per layer by `(offset, id)`, so a range query only
/// walks annotations that begin before the end of the range.
#[derive(Debug, Clone)]
pub struct AnnotationDocument {
    name: String,
    length: usize,
    next_id: AnnotationId,
    layers: HashMap<LayerId, BTreeMap<(Offset, AnnotationId), Annotation>>,
    positions: HashMap<AnnotationId, (LayerId, Offset)>,
}

impl AnnotationDocument {
    /// Document for `text`; its length is the number of characters.
    #[must_use]
    pub fn new(name: impl Into<String>, text: &str) -> Self {
        Self::with_length(name, text.chars().count())
    }

    /// Document of `length` characters whose text is not needed.
    #[must_use]
    pub fn with_length(name: impl Into<String>, length: usize) -> Self {
        Self {
            name: name.into(),
            length,
            next_id: 1,
            layers: HashMap::new(),
            positions: HashMap::new(),
        }
    }

    /// Document name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of annotations across all layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True if there are no annotations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Add an annotation without a value.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if `offset` extends past the end of the text.
    pub fn add(
        &mut self,
        layer: LayerId,
        feature: impl Into<String>,
        offset: Offset,
    ) -> Result<AnnotationId> {
        self.insert(layer, feature.into(), offset, None)
    }

    /// Add an annotation with a value.
    pub fn add_labeled(
        &mut self,
        layer: LayerId,
        feature: impl Into<String>,
        offset: Offset,
        value: impl Into<String>,
    ) -> Result<AnnotationId> {
        self.insert(layer, feature.into(), offset, Some(value.into()))
    }

    fn insert(
        &mut self,
        layer: LayerId,
        feature: String,
        offset: Offset,
        value: Option<String>,
    ) -> Result<AnnotationId> {
        if offset.end() > self.length {
            return Err(Error::invalid_input(format!(
                "annotation {} exceeds document '{}' of length {}",
                offset, self.name, self.length
            )));
        }
        let id = self.next_id;
        self.next_id += 1;
        let annotation = Annotation {
            id,
            layer,
            feature,
            value,
            offset,
        };
        self.layers
            .entry(layer)
            .or_default()
            .insert((offset, id), annotation);
        self.positions.insert(id, (layer, offset));
        Ok(id)
    }

    /// Look up an annotation.
    #[must_use]
    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        let (layer, offset) = self.positions.get(&id)?;
        self.layers.get(layer)?.get(&(*offset, id))
    }

    /// Change the value of an annotation; `None` unsets it.
    pub fn set_value(&mut self, id: AnnotationId, value: Option<String>) -> Result<()> {
        let (layer, offset) = *self
            .positions
            .get(&id)
            .ok_or_else(|| Error::invalid_input(format!("no annotation with id {id}")))?;
        let annotation = self
            .layers
            .get_mut(&layer)
            .and_then(|l| l.get_mut(&(offset, id)))
            .ok_or_else(|| Error::invalid_input(format!("no annotation with id {id}")))?;
        annotation.value = value;
        Ok(())
    }

    /// Remove an annotation, returning it.
    pub fn remove(&mut self, id: AnnotationId) -> Result<Annotation> {
        let (layer, offset) = self
            .positions
            .remove(&id)
            .ok_or_else(|| Error::invalid_input(format!("no annotation with id {id}")))?;
        self.layers
            .get_mut(&layer)
            .and_then(|l| l.remove(&(offset, id)))
            .ok_or_else(|| Error::invalid_input(format!("no annotation with id {id}")))
    }

    /// Remove every annotation on `layer`, returning how many were removed.
    pub fn remove_layer(&mut self, layer: LayerId) -> usize {
        let Some(removed) = self.layers.remove(&layer) else {
            return 0;
        };
        for (_, id) in removed.keys() {
            self.positions.remove(id);
        }
        removed.len()
    }

    /// All annotations on `layer`, ordered by offset.
    pub fn annotations(&self, layer: LayerId) -> impl Iterator<Item = &Annotation> {
        self.layers.get(&layer).into_iter().flat_map(|l| l.values())
    }
}

impl AnnotationIndex for AnnotationDocument {
    fn document_name(&self) -> &str {
        &self.name
    }

    fn document_length(&self) -> usize {
        self.length
    }

    fn annotations_overlapping(&self, layer: LayerId, range: Offset) -> Vec<Annotation> {
        let Some(annotations) = self.layers.get(&layer) else {
            return Vec::new();
        };
        annotations
            .range(..(Offset::point(range.end()), 0))
            .map(|(_, a)| a)
            .filter(|a| a.offset.overlaps(&range))
            .cloned()
            .collect()
    }
}

// =============================================================================
// SharedDocument
// =============================================================================

/// An [`AnnotationDocument`] shared between the editor and render passes.
#[derive(Debug, Clone)]
pub struct SharedDocument {
    name: Arc<str>,
    inner: Arc<RwLock<AnnotationDocument>>,
}

impl SharedDocument {
    /// Share `document`.
    #[must_use]
    pub fn new(document: AnnotationDocument) -> Self {
        Self {
            name: Arc::from(document.name()),
            inner: Arc::new(RwLock::new(document)),
        }
    }

    /// Document name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consistent read view; edits wait until it is dropped.
    pub fn read(&self) -> RwLockReadGuard<'_, AnnotationDocument> {
        read(&self.inner)
    }

    /// Exclusive edit access.
    pub fn write(&self) -> RwLockWriteGuard<'_, AnnotationDocument> {
        write(&self.inner)
    }
}

impl From<AnnotationDocument> for SharedDocument {
    fn from(document: AnnotationDocument) -> Self {
        Self::new(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NE: LayerId = 42;
    const POS: LayerId = 3;

    fn off(begin: usize, end: usize) -> Offset {
        Offset::new(begin, end).unwrap()
    }

    fn offsets(annotations: &[Annotation]) -> Vec<Offset> {
        annotations.iter().map(|a| a.offset).collect()
    }

    #[test]
    fn test_length_counts_chars() {
        let doc = AnnotationDocument::new("doc", "Preis €50");
        assert_eq!(doc.document_length(), 9);
    }

    #[test]
    fn test_rejects_annotation_past_end() {
        let mut doc = AnnotationDocument::with_length("doc", 10);
        assert!(doc.add(NE, "value", off(5, 10)).is_ok());
        assert!(matches!(
            doc.add(NE, "value", off(5, 11)),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_query_is_layer_scoped() {
        let mut doc = AnnotationDocument::with_length("doc", 30);
        doc.add_labeled(NE, "value", off(0, 3), "LOC").unwrap();
        doc.add(POS, "PosValue", off(0, 3)).unwrap();

        let found = doc.annotations_overlapping(NE, off(0, 30));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label(), Some("LOC"));
        assert!(doc.annotations_overlapping(99, off(0, 30)).is_empty());
    }

    #[test]
    fn test_query_overlap_semantics() {
        let mut doc = AnnotationDocument::with_length("doc", 30);
        doc.add(NE, "value", off(0, 3)).unwrap();
        doc.add(NE, "value", off(13, 20)).unwrap();
        doc.add(NE, "value", off(3, 5)).unwrap();
        doc.add(NE, "value", off(0, 25)).unwrap();

        assert_eq!(
            offsets(&doc.annotations_overlapping(NE, off(3, 13))),
            vec![off(0, 25), off(3, 5)]
        );
        assert_eq!(
            offsets(&doc.annotations_overlapping(NE, off(19, 20))),
            vec![off(0, 25), off(13, 20)]
        );
    }

    #[test]
    fn test_stacked_annotations_both_found() {
        let mut doc = AnnotationDocument::with_length("doc", 10);
        let a = doc.add_labeled(NE, "value", off(0, 1), "PER").unwrap();
        let b = doc.add_labeled(NE, "value", off(0, 1), "LOC").unwrap();
        assert_ne!(a, b);
        assert_eq!(doc.annotations_overlapping(NE, off(0, 1)).len(), 2);
    }

    #[test]
    fn test_edits_visible_immediately() {
        let mut doc = AnnotationDocument::with_length("doc", 10);
        let id = doc.add(NE, "value", off(0, 1)).unwrap();
        assert_eq!(doc.annotations_overlapping(NE, off(0, 1))[0].label(), None);

        doc.set_value(id, Some("blah".into())).unwrap();
        assert_eq!(
            doc.annotations_overlapping(NE, off(0, 1))[0].label(),
            Some("blah")
        );

        let removed = doc.remove(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(doc.annotations_overlapping(NE, off(0, 1)).is_empty());
        assert!(doc.get(id).is_none());
        assert!(doc.remove(id).is_err());
    }

    #[test]
    fn test_remove_layer() {
        let mut doc = AnnotationDocument::with_length("doc", 10);
        doc.add(NE, "value", off(0, 1)).unwrap();
        doc.add(NE, "value", off(2, 3)).unwrap();
        doc.add(POS, "PosValue", off(2, 3)).unwrap();

        assert_eq!(doc.remove_layer(NE), 2);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.remove_layer(NE), 0);
        assert_eq!(doc.annotations(POS).count(), 1);
    }

    #[test]
    fn test_shared_document_edits() {
        let shared = SharedDocument::new(AnnotationDocument::with_length("doc", 10));
        let id = shared.write().add(NE, "value", off(0, 1)).unwrap();
        assert_eq!(shared.read().len(), 1);
        shared.write().remove(id).unwrap();
        assert!(shared.read().is_empty());
        assert_eq!(shared.name(), "doc");
    }
}
