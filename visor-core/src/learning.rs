//! Human decisions on suggestions.
//!
//! Every accept, reject or skip is appended as a [`LearningRecord`]. Records
//! are never updated in place: a later decision at the same position simply
//! shadows the earlier one.

use crate::layer::LayerId;
use crate::offset::Offset;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the user did with a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LearningRecordType {
    /// Turned into a real annotation.
    Accepted,
    /// Explicitly declined.
    Rejected,
    /// Looked at and passed over.
    Skipped,
}

impl LearningRecordType {
    /// Stable identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LearningRecordType::Accepted => "ACCEPTED",
            LearningRecordType::Rejected => "REJECTED",
            LearningRecordType::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for LearningRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted user decision about one suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningRecord {
    /// Owner of the annotations the decision applies to
    pub user: String,
    /// User who was logged in when the decision was made
    pub session_owner: String,
    /// Layer of the suggestion
    pub layer: LayerId,
    /// Feature of the suggestion
    pub feature: String,
    /// Document name
    pub source_document: String,
    /// Exact position of the suggestion
    pub offset: Offset,
    /// Label of the suggestion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// The decision
    pub action: LearningRecordType,
}

impl LearningRecord {
    /// Key identifying the position this record decides.
    #[must_use]
    pub fn key(&self) -> DecisionKey {
        DecisionKey {
            user: self.user.clone(),
            layer: self.layer,
            document: self.source_document.clone(),
            feature: self.feature.clone(),
            offset: self.offset,
        }
    }

    /// The decision carried by this record.
    #[must_use]
    pub fn decision(&self) -> Decision {
        Decision {
            action: self.action,
            label: self.label.clone(),
        }
    }
}

/// Identifies one decidable position.
///
/// Matching is exact: a decision at `[5,10)` says nothing about `[5,9)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecisionKey {
    /// Annotation owner
    pub user: String,
    /// Layer
    pub layer: LayerId,
    /// Document name
    pub document: String,
    /// Feature
    pub feature: String,
    /// Exact position
    pub offset: Offset,
}

/// The most recent decision found for a [`DecisionKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// What the user did
    pub action: LearningRecordType,
    /// Label the decision was about
    pub label: Option<String>,
}
