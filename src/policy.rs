//! Per-layer overlap policy.

use crate::config::{Config, LayerConfig};
use crate::error::{Error, Result};
use crate::sync::{read, write, RwLock};
use crate::{LayerId, OverlapMode};
use std::collections::HashMap;

/// Source of the stacking policy for each layer.
///
/// The engine treats the answer as fixed for the duration of one
/// computation; the orchestration layer reads it once per render pass.
pub trait LayerPolicy: Send + Sync {
    /// Overlap mode of `layer`, or `None` if the layer is unknown.
    fn overlap_mode(&self, layer: LayerId) -> Option<OverlapMode>;
}

/// Layer policy backed by a table, usually built from [`Config`].
///
/// Administrators may change a layer's mode at runtime; a render pass that
/// already read the mode is unaffected.
#[derive(Debug, Default)]
pub struct StaticLayerPolicy {
    layers: RwLock<HashMap<LayerId, LayerConfig>>,
}

impl StaticLayerPolicy {
    /// Empty policy: every layer is unknown.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy for the given layers.
    #[must_use]
    pub fn from_layers(layers: impl IntoIterator<Item = LayerConfig>) -> Self {
        let layers = layers.into_iter().map(|l| (l.id, l)).collect();
        Self {
            layers: RwLock::new(layers),
        }
    }

    /// Policy for the layers in `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::from_layers(config.layers.iter().cloned())
    }

    /// Add or replace a layer.
    pub fn insert(&self, layer: LayerConfig) {
        write(&self.layers).insert(layer.id, layer);
    }

    /// Change the mode of a known layer.
    pub fn set_overlap_mode(&self, layer: LayerId, mode: OverlapMode) -> Result<()> {
        let mut layers = write(&self.layers);
        let config = layers.get_mut(&layer).ok_or(Error::UnknownLayer(layer))?;
        if config.overlap_mode != mode {
            log::info!(
                "Layer {} ({}) overlap mode {} -> {}",
                layer,
                config.name,
                config.overlap_mode,
                mode
            );
            config.overlap_mode = mode;
        }
        Ok(())
    }

    /// Configuration of a layer.
    #[must_use]
    pub fn layer(&self, layer: LayerId) -> Option<LayerConfig> {
        read(&self.layers).get(&layer).cloned()
    }
}

impl LayerPolicy for StaticLayerPolicy {
    fn overlap_mode(&self, layer: LayerId) -> Option<OverlapMode> {
        read(&self.layers).get(&layer).map(|l| l.overlap_mode)
    }
}
