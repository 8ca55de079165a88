use crate::model::Filter;
use crate::model::FilterValue;
use crate::model::MultiOperation;
use crate::model::RangeValue;

const UNKNOWN_LABEL: &str = "Unknown";

/// Display text for a value bucket; the null bucket reads as "Unknown".
pub fn display_value(value: Option<&FilterValue>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => UNKNOWN_LABEL.to_string(),
    }
}

/// Human readable summary of what a filter selects.
pub fn describe(filter: &Filter) -> String {
    match filter {
        Filter::Multi(multi) => {
            let separator = match multi.value.operation {
                MultiOperation::Union => " OR ",
                MultiOperation::Intersect => " AND ",
            };
            multi
                .value
                .filters
                .iter()
                .map(describe)
                .collect::<Vec<_>>()
                .join(separator)
        }
        Filter::Range(range) => describe_range(range.value.as_ref(), range.include_unknown),
        Filter::Member(member) => {
            let include_unknown = member.include_unknown;
            match member.value.as_deref() {
                Some([]) if !include_unknown => "No value selected".to_string(),
                Some([]) => "unspecified".to_string(),
                Some(values) => {
                    let joined = values
                        .iter()
                        .map(|value| display_value(value.as_ref()))
                        .collect::<Vec<_>>()
                        .join(", ");
                    with_unknown_suffix(joined, include_unknown)
                }
                None => with_unknown_suffix("has a value".to_string(), include_unknown),
            }
        }
    }
}

fn describe_range(value: Option<&RangeValue>, include_unknown: bool) -> String {
    let text = match value {
        None => "has a value".to_string(),
        Some(RangeValue { min: None, max: None }) if !include_unknown => {
            return "No value selected".to_string();
        }
        Some(RangeValue { min: None, max: None }) => String::new(),
        Some(RangeValue { min: None, max: Some(max) }) => format!("less than {max}"),
        Some(RangeValue { min: Some(min), max: None }) => format!("greater than {min}"),
        Some(RangeValue {
            min: Some(min),
            max: Some(max),
        }) => format!("from {min} to {max}"),
    };
    if !include_unknown {
        text
    } else if text.is_empty() {
        "unspecified".to_string()
    } else {
        with_unknown_suffix(text, true)
    }
}

fn with_unknown_suffix(text: String, include_unknown: bool) -> String {
    if include_unknown {
        format!("{text}, or is unspecified")
    } else {
        text
    }
}

/// Word used in the UI for a multi-filter operation.
pub fn operation_display(operation: MultiOperation) -> &'static str {
    match operation {
        MultiOperation::Union => "any",
        MultiOperation::Intersect => "all",
    }
}

/// Share of `denom` as a whole percentage, with the extremes bucketed so a
/// tiny share never reads as 0 and a near-total share never reads as 100.
pub fn to_percentage(num: u64, denom: u64) -> String {
    if num == 0 {
        return "0".to_string();
    }
    if num == denom {
        return "100".to_string();
    }
    let percent = num as f64 / denom as f64 * 100.0;
    if percent > 99.4 {
        ">99".to_string()
    } else if percent < 0.5 {
        "< 1".to_string()
    } else {
        format!("{}", percent.round())
    }
}
