use crate::state::FieldUiState;
use facets_filter_core::AggregateCounts;
use facets_filter_core::Filter;
use facets_filter_core::FilterList;
use serde::Serialize;

/// State changes published by a filter parameter, in the order they happen.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ParamEvent {
    #[serde(rename_all = "camelCase")]
    ActiveFieldSet { field: String },

    /// `value` is the new persisted parameter value.
    #[serde(rename_all = "camelCase")]
    FiltersUpdated {
        prev: FilterList,
        filters: FilterList,
        value: String,
    },

    #[serde(rename_all = "camelCase")]
    FieldStateUpdated { field: String, state: FieldUiState },

    CountsLoaded { counts: AggregateCounts },

    /// Every cached summary except `retained` was marked stale.
    #[serde(rename_all = "camelCase")]
    FieldsInvalidated { retained: Vec<String> },

    /// Stored constraints that could not be honored: entries that did not
    /// parse (verbatim) and filters on fields missing from the ontology.
    #[serde(rename_all = "camelCase")]
    InvalidFilters {
        unreadable: Vec<String>,
        unknown_fields: Vec<Filter>,
        message: String,
    },

    ParamError { message: String },
}
