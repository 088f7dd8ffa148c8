//! Annotation layers and their stacking policy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an annotation layer within a project.
pub type LayerId = u64;

/// How annotations on a layer may share text.
///
/// Two annotations are *stacked* when they occupy exactly the same offset and
/// *crossing* when they overlap without being identical.
///
/// ```text
/// stacked:   [=====A=====]      crossing:  [====A====]
///            [=====B=====]                      [====B====]
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapMode {
    /// Exclusive spans: nothing may overlap.
    #[default]
    NoOverlap,
    /// Stacking is allowed, crossing is not.
    StackingOnly,
    /// Crossing is allowed, stacking is not.
    OverlapOnly,
    /// Anything goes.
    AnyOverlap,
}

impl OverlapMode {
    /// True if two annotations may occupy exactly the same offset.
    #[must_use]
    pub const fn allows_stacking(&self) -> bool {
        matches!(self, OverlapMode::StackingOnly | OverlapMode::AnyOverlap)
    }

    /// True if two annotations may overlap without being identical.
    #[must_use]
    pub const fn allows_crossing(&self) -> bool {
        matches!(self, OverlapMode::OverlapOnly | OverlapMode::AnyOverlap)
    }

    /// Stable identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            OverlapMode::NoOverlap => "no_overlap",
            OverlapMode::StackingOnly => "stacking_only",
            OverlapMode::OverlapOnly => "overlap_only",
            OverlapMode::AnyOverlap => "any_overlap",
        }
    }
}

impl fmt::Display for OverlapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_exclusive() {
        let mode = OverlapMode::default();
        assert_eq!(mode, OverlapMode::NoOverlap);
        assert!(!mode.allows_stacking());
        assert!(!mode.allows_crossing());
    }

    #[test]
    fn test_permissions() {
        assert!(OverlapMode::AnyOverlap.allows_stacking());
        assert!(OverlapMode::AnyOverlap.allows_crossing());
        assert!(OverlapMode::StackingOnly.allows_stacking());
        assert!(!OverlapMode::StackingOnly.allows_crossing());
        assert!(!OverlapMode::OverlapOnly.allows_stacking());
        assert!(OverlapMode::OverlapOnly.allows_crossing());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&OverlapMode::AnyOverlap).unwrap();
        assert_eq!(json, "\"any_overlap\"");
        let mode: OverlapMode = serde_json::from_str("\"stacking_only\"").unwrap();
        assert_eq!(mode, OverlapMode::StackingOnly);
    }
}
