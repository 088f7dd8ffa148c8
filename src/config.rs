//! Configuration for the visibility engine and the recommendation service.
//!
//! Loaded from TOML:
//!
//! ```toml
//! [visibility]
//! rejection_scope = "position"
//!
//! [session]
//! max_cached_groups = 32
//!
//! [[layers]]
//! id = 42
//! name = "NamedEntity"
//! overlap_mode = "any_overlap"
//! ```
//!
//! Every section is optional; missing values fall back to [`Default`].

use crate::error::{Error, Result};
use crate::{LayerId, OverlapMode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// =============================================================================
// Visibility
// =============================================================================

/// Which learning records count as a rejection of a suggestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionScope {
    /// Same feature at exactly the same offset, whatever the label.
    #[default]
    Position,
    /// As [`RejectionScope::Position`], and the recorded label must equal
    /// the suggestion's label.
    PositionAndLabel,
}

/// Settings for [`crate::VisibilityEngine`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VisibilityConfig {
    /// How rejections are matched
    #[serde(default)]
    pub rejection_scope: RejectionScope,
}

impl VisibilityConfig {
    /// Default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rejection scope.
    #[must_use]
    pub fn with_rejection_scope(mut self, scope: RejectionScope) -> Self {
        self.rejection_scope = scope;
        self
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// Settings for per-user recommendation sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Prediction groups kept per session before the oldest is evicted
    #[serde(default = "default_max_cached_groups")]
    pub max_cached_groups: usize,
}

fn default_max_cached_groups() -> usize {
    32
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_cached_groups: default_max_cached_groups(),
        }
    }
}

impl SessionConfig {
    /// Set the cache bound.
    #[must_use]
    pub fn with_max_cached_groups(mut self, max: usize) -> Self {
        self.max_cached_groups = max;
        self
    }
}

// =============================================================================
// Layers
// =============================================================================

/// One annotation layer as configured by a project administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerConfig {
    /// Layer id
    pub id: LayerId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Stacking policy
    #[serde(default)]
    pub overlap_mode: OverlapMode,
}

impl LayerConfig {
    /// Layer with the default (exclusive) overlap mode.
    #[must_use]
    pub fn new(id: LayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            overlap_mode: OverlapMode::default(),
        }
    }

    /// Set the overlap mode.
    #[must_use]
    pub fn with_overlap_mode(mut self, mode: OverlapMode) -> Self {
        self.overlap_mode = mode;
        self
    }
}

// =============================================================================
// Top level
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Engine settings
    #[serde(default)]
    pub visibility: VisibilityConfig,
    /// Session settings
    #[serde(default)]
    pub session: SessionConfig,
    /// Known layers
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

impl Config {
    /// Parse and validate TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        log::debug!("Loading configuration from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Add a layer.
    #[must_use]
    pub fn with_layer(mut self, layer: LayerConfig) -> Self {
        self.layers.push(layer);
        self
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.session.max_cached_groups == 0 {
            return Err(Error::config("session.max_cached_groups must be at least 1"));
        }
        let mut seen = HashSet::new();
        for layer in &self.layers {
            if !seen.insert(layer.id) {
                return Err(Error::config(format!("duplicate layer id {}", layer.id)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.visibility.rejection_scope, RejectionScope::Position);
        assert_eq!(config.session.max_cached_groups, 32);
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml_str(
            r#"
            [visibility]
            rejection_scope = "position_and_label"

            [session]
            max_cached_groups = 4

            [[layers]]
            id = 42
            name = "NamedEntity"
            overlap_mode = "any_overlap"

            [[layers]]
            id = 7
            "#,
        )
        .unwrap();

        assert_eq!(
            config.visibility.rejection_scope,
            RejectionScope::PositionAndLabel
        );
        assert_eq!(config.session.max_cached_groups, 4);
        assert_eq!(
            config.layers,
            vec![
                LayerConfig::new(42, "NamedEntity").with_overlap_mode(OverlapMode::AnyOverlap),
                LayerConfig::new(7, ""),
            ]
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::from_toml_str("[visibility]\nhide_skipped = true\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{err:?}");
    }

    #[test]
    fn test_duplicate_layer_rejected() {
        let err = Config::from_toml_str("[[layers]]\nid = 1\n[[layers]]\nid = 1\n").unwrap_err();
        assert!(err.to_string().contains("duplicate layer id 1"));
    }

    #[test]
    fn test_zero_cache_rejected() {
        let err = Config::from_toml_str("[session]\nmax_cached_groups = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
