//! The persisted `{ "filters": [...] }` parameter value.

use crate::decision::FilterList;
use crate::error::Result;
use crate::model::Filter;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// Outcome of reading a stored parameter value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedFilters {
    pub filters: FilterList,
    /// Stored constraints that could not be honored, verbatim.
    pub invalid: Vec<String>,
    pub message: Option<String>,
}

#[derive(Serialize)]
struct ParamValueRef<'a> {
    filters: &'a [Filter],
}

/// Reads a stored value. Never fails: unreadable input degrades to no
/// filters with the offending text reported back.
pub fn parse_param_value(raw: &str) -> ParsedFilters {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ParsedFilters::default();
    }

    let entries = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(mut object)) => match object.remove("filters") {
            Some(Value::Array(entries)) => entries,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => return unreadable(trimmed),
        },
        _ => return unreadable(trimmed),
    };

    let mut seen = HashSet::new();
    let mut filters = Vec::with_capacity(entries.len());
    let mut invalid = Vec::new();
    for entry in entries {
        match serde_json::from_value::<Filter>(entry.clone()) {
            Ok(filter) if seen.insert(filter.field().to_string()) => filters.push(filter),
            Ok(filter) => {
                warn!(field = filter.field(), "ignoring repeated stored filter");
                invalid.push(entry.to_string());
            }
            Err(err) => {
                warn!(error = %err, "ignoring unreadable stored filter");
                invalid.push(entry.to_string());
            }
        }
    }

    let message = invalid_message(&invalid);
    ParsedFilters {
        // Duplicates were filtered above.
        filters: FilterList::new(filters).unwrap_or_default(),
        invalid,
        message,
    }
}

fn unreadable(raw: &str) -> ParsedFilters {
    warn!("stored filter value is not readable; starting without filters");
    let invalid = vec![raw.to_string()];
    let message = invalid_message(&invalid);
    ParsedFilters {
        filters: FilterList::empty(),
        invalid,
        message,
    }
}

fn invalid_message(invalid: &[String]) -> Option<String> {
    if invalid.is_empty() {
        return None;
    }
    Some(format!(
        "The following stored filters could not be applied: {}",
        invalid.join("; ")
    ))
}

pub fn to_param_value(filters: &FilterList) -> Result<String> {
    let value = ParamValueRef {
        filters: filters.as_slice(),
    };
    Ok(serde_json::to_string(&value)?)
}
