//! Ordering and narrowing of per-value counts for display.

use crate::display::display_value;
use crate::model::Filter;
use crate::model::FilterValue;
use crate::model::ValueCount;
use serde::Deserialize;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ColumnKey {
    #[default]
    Value,
    Count,
    FilteredCount,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub column_key: ColumnKey,
    pub direction: SortDirection,
    pub group_by_selected: bool,
}

/// Sorts value counts for display.
///
/// The first pass orders by `spec.column_key` (falling back to a natural
/// comparison of the values) in `spec.direction`. A second stable pass that
/// ignores the direction moves entries with no remaining records to the end
/// and, with `group_by_selected`, pulls entries selected by `filter` ahead of
/// the unselected ones.
pub fn sort_distribution(
    entries: &[ValueCount],
    spec: SortSpec,
    filter: Option<&Filter>,
) -> Vec<ValueCount> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| {
        let primary = match spec.column_key {
            ColumnKey::Value => Ordering::Equal,
            ColumnKey::Count => a.count.cmp(&b.count),
            ColumnKey::FilteredCount => a.filtered_count.cmp(&b.filtered_count),
        };
        let ordering = primary.then_with(|| natural_cmp(a.value.as_ref(), b.value.as_ref()));
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    sorted.sort_by_key(|entry| {
        let exhausted = entry.filtered_count == 0;
        let unselected = spec.group_by_selected && !is_selected(filter, entry.value.as_ref());
        (exhausted, unselected)
    });
    sorted
}

/// Natural ordering of two values: numbers numerically, text by runs of
/// digits (compared as numbers) and case-insensitive text. Null sorts as the
/// empty string.
pub fn natural_cmp(a: Option<&FilterValue>, b: Option<&FilterValue>) -> Ordering {
    if let (Some(FilterValue::Number(a)), Some(FilterValue::Number(b))) = (a, b) {
        return a.total_cmp(b);
    }
    let a = a.map(ToString::to_string).unwrap_or_default();
    let b = b.map(ToString::to_string).unwrap_or_default();
    natural_str_cmp(&a, &b)
}

fn natural_str_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks { rest: a };
    let mut right = Chunks { rest: b };
    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = chunk_cmp(x, y);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

fn chunk_cmp(a: &str, b: &str) -> Ordering {
    let a_digits = a.starts_with(|c: char| c.is_ascii_digit());
    let b_digits = b.starts_with(|c: char| c.is_ascii_digit());
    match (a_digits, b_digits) {
        (true, true) => {
            let a = a.trim_start_matches('0');
            let b = b.trim_start_matches('0');
            a.len().cmp(&b.len()).then_with(|| a.cmp(b))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(b.chars().flat_map(char::to_lowercase)),
    }
}

/// Alternating runs of ASCII digits and everything else.
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(chunk)
    }
}

/// Whether the value bucket is selected by `filter`. No filter selects
/// nothing.
pub fn is_selected(filter: Option<&Filter>, value: Option<&FilterValue>) -> bool {
    match filter {
        None | Some(Filter::Multi(_)) => false,
        Some(Filter::Member(member)) => match (&member.value, value) {
            (_, None) if member.include_unknown => true,
            (None, value) => value.is_some(),
            (Some(values), value) => values.iter().any(|selected| selected.as_ref() == value),
        },
        Some(Filter::Range(range)) => {
            let Some(value) = value else {
                return range.include_unknown;
            };
            let Some(bounds) = &range.value else {
                return true;
            };
            let Some(position) = value.axis_value(range.field_type) else {
                return false;
            };
            let above_min = bounds
                .min
                .as_ref()
                .and_then(|min| min.axis_value())
                .is_none_or(|min| position >= min);
            let below_max = bounds
                .max
                .as_ref()
                .and_then(|max| max.axis_value())
                .is_none_or(|max| position <= max);
            above_min && below_max
        }
    }
}

/// Entries whose displayed value contains `term`, ignoring case. An empty
/// term keeps everything.
pub fn filter_by_search_term<'a>(entries: &'a [ValueCount], term: &str) -> Vec<&'a ValueCount> {
    let needle = term.trim().to_lowercase();
    entries
        .iter()
        .filter(|entry| {
            needle.is_empty()
                || display_value(entry.value.as_ref())
                    .to_lowercase()
                    .contains(&needle)
        })
        .collect()
}
