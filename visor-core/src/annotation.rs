//! Committed human annotations, as seen by the visibility engine.

use crate::layer::LayerId;
use crate::offset::Offset;
use serde::{Deserialize, Serialize};

/// Identifier of an annotation within a document.
pub type AnnotationId = u64;

/// A human-made annotation already committed to the document.
///
/// The engine only ever reads these. `value` is `None` when the feature was
/// never set; an empty string counts as unset too (see [`Annotation::label`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Id within the owning document
    pub id: AnnotationId,
    /// Layer the annotation lives on
    pub layer: LayerId,
    /// Feature carrying the label
    pub feature: String,
    /// Feature value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Position in the document
    pub offset: Offset,
}

impl Annotation {
    /// Create an annotation without a feature value.
    #[must_use]
    pub fn new(
        id: AnnotationId,
        layer: LayerId,
        feature: impl Into<String>,
        offset: Offset,
    ) -> Self {
        Self {
            id,
            layer,
            feature: feature.into(),
            value: None,
            offset,
        }
    }

    /// Set the feature value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Normalized label: `None` for both unset and empty values.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        normalize_label(self.value.as_deref())
    }
}

/// Collapse `Some("")` to `None`.
///
/// Unset and empty labels are the same fact; a non-empty label is never
/// equal to either.
#[must_use]
pub fn normalize_label(label: Option<&str>) -> Option<&str> {
    label.filter(|l| !l.is_empty())
}

/// Label equality with unset and empty treated alike.
#[must_use]
pub fn labels_match(a: Option<&str>, b: Option<&str>) -> bool {
    normalize_label(a) == normalize_label(b)
}
