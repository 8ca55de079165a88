use crate::error::Result;
use crate::error::SyncError;
use facets_filter_core::SelectionPolicy;
use facets_filter_core::TreeOptions;
use serde::Deserialize;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Settings shared by every filter parameter a registry manages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Quiet period after the last filter edit before counts are refetched.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Meaning of an absent constraint when deciding whether an edit is kept.
    #[serde(default)]
    pub selection_policy: SelectionPolicy,

    #[serde(default)]
    pub tree: TreeOptions,

    /// Parsed parameter values kept in memory.
    #[serde(default = "default_parse_cache_capacity")]
    pub parse_cache_capacity: usize,

    /// Built ontology trees kept in memory.
    #[serde(default = "default_tree_cache_capacity")]
    pub tree_cache_capacity: usize,

    /// Default y-axis outlier truncation for new histograms.
    #[serde(default)]
    pub truncate_y_axis: bool,
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_parse_cache_capacity() -> usize {
    32
}

fn default_tree_cache_capacity() -> usize {
    8
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            selection_policy: SelectionPolicy::default(),
            tree: TreeOptions::default(),
            parse_cache_capacity: default_parse_cache_capacity(),
            tree_cache_capacity: default_tree_cache_capacity(),
            truncate_y_axis: false,
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<()> {
        self.parse_cache_capacity()?;
        self.tree_cache_capacity()?;
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub(crate) fn parse_cache_capacity(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.parse_cache_capacity)
            .ok_or_else(|| SyncError::InvalidConfig("parse cache capacity must be > 0".to_string()))
    }

    pub(crate) fn tree_cache_capacity(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.tree_cache_capacity)
            .ok_or_else(|| SyncError::InvalidConfig("tree cache capacity must be > 0".to_string()))
    }
}
