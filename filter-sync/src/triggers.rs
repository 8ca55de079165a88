//! What each trigger asks to be fetched. Pure functions over current state.

use crate::state::FieldUiState;
use facets_filter_core::FilterList;
use facets_filter_core::OntologyNode;
use std::collections::BTreeMap;

/// Fetches implied by one trigger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadPlan {
    pub load_counts: bool,
    pub summary_for: Option<String>,
}

impl LoadPlan {
    pub fn is_empty(&self) -> bool {
        !self.load_counts && self.summary_for.is_none()
    }

    fn counts_and_summary(field: &str) -> Self {
        Self {
            load_counts: true,
            summary_for: Some(field.to_string()),
        }
    }
}

fn needs_summary(states: &BTreeMap<String, FieldUiState>, field: &str) -> bool {
    states.get(field).is_none_or(FieldUiState::needs_summary)
}

/// A filter edit always refreshes the counts. The active field's summary is
/// refetched only when it has none or a constraint on another field changed.
pub fn on_filters_changed(
    prev: &FilterList,
    next: &FilterList,
    active_field: Option<&str>,
    states: &BTreeMap<String, FieldUiState>,
) -> LoadPlan {
    let summary_for = active_field
        .filter(|field| needs_summary(states, field) || prev.differs_outside(next, field))
        .map(str::to_string);
    LoadPlan {
        load_counts: true,
        summary_for,
    }
}

/// Activating a field, or revealing the group holding it, loads whatever
/// that field is missing.
pub fn on_field_shown(
    active_field: Option<&str>,
    states: &BTreeMap<String, FieldUiState>,
) -> LoadPlan {
    match active_field {
        Some(field) if needs_summary(states, field) => LoadPlan::counts_and_summary(field),
        _ => LoadPlan::default(),
    }
}

pub fn on_summary_refresh(field: &str) -> LoadPlan {
    LoadPlan {
        load_counts: false,
        summary_for: Some(field.to_string()),
    }
}

pub fn on_dependency_updated(active_field: Option<&str>) -> LoadPlan {
    LoadPlan {
        load_counts: true,
        summary_for: active_field.map(str::to_string),
    }
}

/// Keeps `current` while the tree still has it, otherwise falls back to the
/// first filtered field and then to the first leaf.
pub fn resolve_active_field(
    current: Option<&str>,
    tree: &OntologyNode,
    filters: &FilterList,
) -> Option<String> {
    let is_filter_field = |term: &str| {
        tree.find(term)
            .is_some_and(|node| node.field.is_filter_field())
    };
    current
        .filter(|term| is_filter_field(*term))
        .map(str::to_string)
        .or_else(|| {
            filters
                .iter()
                .map(|filter| filter.field())
                .find(|term| is_filter_field(*term))
                .map(str::to_string)
        })
        .or_else(|| tree.first_leaf().map(|field| field.term.clone()))
}
