//! Rules deciding which constraints are kept in the canonical filter list.

use crate::error::FilterError;
use crate::error::Result;
use crate::model::Filter;
use crate::model::MemberFilter;
use crate::model::RangeFilter;
use crate::model::ValueCount;
use crate::ontology::OntologyNode;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashSet;

/// What an absent constraint means for a field.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// An absent constraint selects nothing; any explicit choice is kept.
    #[default]
    SelectNothing,
    /// An absent constraint selects every record; only deviations are kept.
    SelectEverything,
}

/// Whether `filter` differs from "no constraint" under `policy` and should
/// therefore be stored.
pub fn should_persist(filter: &Filter, value_counts: &[ValueCount], policy: SelectionPolicy) -> bool {
    match (filter, policy) {
        (Filter::Multi(multi), _) => !multi.value.filters.is_empty(),
        (Filter::Range(range), SelectionPolicy::SelectNothing) => range
            .value
            .as_ref()
            .is_some_and(|value| value.has_bound()),
        (Filter::Member(member), SelectionPolicy::SelectNothing) => match &member.value {
            None => false,
            Some(values) if values.is_empty() => member.include_unknown,
            Some(_) => true,
        },
        (Filter::Range(range), SelectionPolicy::SelectEverything) => {
            range_narrows_known_values(range, value_counts)
        }
        (Filter::Member(member), SelectionPolicy::SelectEverything) => {
            member_excludes_known_values(member, value_counts)
        }
    }
}

fn member_excludes_known_values(member: &MemberFilter, value_counts: &[ValueCount]) -> bool {
    let Some(values) = &member.value else {
        return false;
    };
    let selected = values.iter().filter(|value| value.is_some()).count();
    let known = value_counts
        .iter()
        .filter(|entry| entry.value.is_some())
        .count();
    selected != known
}

fn range_narrows_known_values(range: &RangeFilter, value_counts: &[ValueCount]) -> bool {
    let Some(value) = &range.value else {
        return false;
    };
    let observed = value_counts
        .iter()
        .filter_map(|entry| entry.value.as_ref()?.axis_value(range.field_type))
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        });
    let Some((observed_min, observed_max)) = observed else {
        return value.has_bound();
    };
    let min = value.min.as_ref().and_then(|bound| bound.axis_value());
    let max = value.max.as_ref().and_then(|bound| bound.axis_value());
    min.is_some_and(|min| min > observed_min) || max.is_some_and(|max| max < observed_max)
}

/// Ordered constraints with at most one entry per field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Filter>", into = "Vec<Filter>")]
pub struct FilterList {
    filters: Vec<Filter>,
}

impl FilterList {
    pub fn new(filters: Vec<Filter>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(filters.len());
        for filter in &filters {
            if !seen.insert(filter.field()) {
                return Err(FilterError::DuplicateFilterField(filter.field().to_string()));
            }
        }
        Ok(Self { filters })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Filter> {
        self.filters.iter()
    }

    pub fn as_slice(&self) -> &[Filter] {
        &self.filters
    }

    pub fn into_vec(self) -> Vec<Filter> {
        self.filters
    }

    pub fn get(&self, field: &str) -> Option<&Filter> {
        self.filters.iter().find(|filter| filter.field() == field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Copy of the list without the entry for `field`.
    pub fn without(&self, field: &str) -> Self {
        Self {
            filters: self
                .filters
                .iter()
                .filter(|filter| filter.field() != field)
                .cloned()
                .collect(),
        }
    }

    /// New list reflecting a user edit: the edited entry replaces the old
    /// one in place (or is appended) when it persists, otherwise the field's
    /// entry is dropped.
    pub fn apply_edit(
        &self,
        edited: Filter,
        value_counts: &[ValueCount],
        policy: SelectionPolicy,
    ) -> Self {
        if !should_persist(&edited, value_counts, policy) {
            return self.without(edited.field());
        }
        let mut filters = self.filters.clone();
        match filters
            .iter_mut()
            .find(|filter| filter.field() == edited.field())
        {
            Some(slot) => *slot = edited,
            None => filters.push(edited),
        }
        Self { filters }
    }

    /// Splits into filters on filterable fields of `ontology` and the rest.
    pub fn retain_known(&self, ontology: &OntologyNode) -> (Self, Vec<Filter>) {
        let (known, unknown): (Vec<Filter>, Vec<Filter>) =
            self.filters.iter().cloned().partition(|filter| {
                ontology
                    .find(filter.field())
                    .is_some_and(|node| node.field.is_filter_field())
            });
        (Self { filters: known }, unknown)
    }

    /// Whether any entry other than the one for `field` differs between the
    /// two lists.
    pub fn differs_outside(&self, other: &FilterList, field: &str) -> bool {
        self.without(field) != other.without(field)
    }
}

impl TryFrom<Vec<Filter>> for FilterList {
    type Error = FilterError;

    fn try_from(filters: Vec<Filter>) -> Result<Self> {
        Self::new(filters)
    }
}

impl From<FilterList> for Vec<Filter> {
    fn from(list: FilterList) -> Self {
        list.filters
    }
}

impl<'a> IntoIterator for &'a FilterList {
    type Item = &'a Filter;
    type IntoIter = std::slice::Iter<'a, Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.filters.iter()
    }
}
