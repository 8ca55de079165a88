use facets_filter_core::AggregateCounts;
use facets_filter_core::BinState;
use facets_filter_core::FieldSummary;
use facets_filter_core::FilterList;
use facets_filter_core::OntologyNode;
use facets_filter_core::SortSpec;
use serde::Serialize;
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Where a field's cached summary stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Uninitialized,
    Loading,
    Ready,
    /// Summary kept but stale until the field is next loaded.
    Invalid,
    Error,
}

/// Per-field cache and display settings.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldUiState {
    pub summary: Option<FieldSummary>,
    pub loading: bool,
    pub invalid: bool,
    pub error_message: Option<String>,
    pub sort: Option<SortSpec>,
    pub search_term: Option<String>,
    pub bin_state: Option<BinState>,
}

impl FieldUiState {
    pub fn status(&self) -> FieldStatus {
        if self.loading {
            FieldStatus::Loading
        } else if self.error_message.is_some() {
            FieldStatus::Error
        } else if self.summary.is_none() {
            FieldStatus::Uninitialized
        } else if self.invalid {
            FieldStatus::Invalid
        } else {
            FieldStatus::Ready
        }
    }

    /// No usable summary: never loaded or marked stale.
    pub fn needs_summary(&self) -> bool {
        self.summary.is_none() || self.invalid
    }
}

/// Point-in-time copy of a filter parameter's state.
#[derive(Clone, Debug)]
pub struct ParamSnapshot {
    pub question_id: String,
    pub parameter_id: String,
    pub tree: Arc<OntologyNode>,
    pub filters: FilterList,
    pub active_field: Option<String>,
    pub field_states: BTreeMap<String, FieldUiState>,
    pub counts: Option<AggregateCounts>,
    pub group_visible: bool,
}

impl ParamSnapshot {
    pub fn field_state(&self, field: &str) -> Option<&FieldUiState> {
        self.field_states.get(field)
    }
}
