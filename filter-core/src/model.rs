use crate::dates::parse_date_days;
use crate::error::FilterError;
use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use serde_with::skip_serializing_none;
use std::fmt;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    String,
    Number,
    Date,
    MultiFilter,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::MultiFilter => "multiFilter",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ontology entry. Entries without a `type` only group other entries.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub term: String,
    #[serde(default)]
    pub display: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_range: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl Field {
    pub fn new(term: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            display: display.into(),
            parent: None,
            field_type: None,
            is_range: false,
            description: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn ranged(mut self) -> Self {
        self.is_range = true;
        self
    }

    /// Fields carrying a type can hold a constraint; the rest are grouping nodes.
    pub fn is_filter_field(&self) -> bool {
        self.field_type.is_some()
    }

    pub fn is_multi(&self) -> bool {
        self.field_type == Some(FieldType::MultiFilter)
    }

    pub fn is_range(&self) -> bool {
        self.is_range
    }

    /// Membership fields are filterable, not ranged and not multi filters.
    pub fn is_member(&self) -> bool {
        self.is_filter_field() && !self.is_range && !self.is_multi()
    }
}

/// A discrete value as it appears in value counts and membership filters.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FilterValue {
    Number(f64),
    Text(String),
}

impl FilterValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FilterValue::Number(value) => Some(*value),
            FilterValue::Text(_) => None,
        }
    }

    /// Numeric position on a histogram axis for the given field type.
    pub fn axis_value(&self, field_type: FieldType) -> Option<f64> {
        match (self, field_type) {
            (FilterValue::Number(value), _) => Some(*value),
            (FilterValue::Text(text), FieldType::Date) => parse_date_days(text),
            (FilterValue::Text(text), FieldType::Number) => text.trim().parse().ok(),
            (FilterValue::Text(_), _) => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Number(value) => write!(f, "{value}"),
            FilterValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Number(value as f64)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RangeBound {
    Number(f64),
    Date(String),
}

impl RangeBound {
    pub fn axis_value(&self) -> Option<f64> {
        match self {
            RangeBound::Number(value) => Some(*value),
            RangeBound::Date(text) => parse_date_days(text),
        }
    }
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeBound::Number(value) => write!(f, "{value}"),
            RangeBound::Date(text) => f.write_str(text),
        }
    }
}

impl From<f64> for RangeBound {
    fn from(value: f64) -> Self {
        RangeBound::Number(value)
    }
}

impl From<&str> for RangeBound {
    fn from(value: &str) -> Self {
        RangeBound::Date(value.to_string())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RangeValue {
    #[serde(default)]
    pub min: Option<RangeBound>,
    #[serde(default)]
    pub max: Option<RangeBound>,
}

impl RangeValue {
    pub fn has_bound(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemberFilter {
    pub field: String,
    pub field_type: FieldType,
    /// `None` selects every known value.
    pub value: Option<Vec<Option<FilterValue>>>,
    pub include_unknown: bool,
    pub field_display_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RangeFilter {
    pub field: String,
    pub field_type: FieldType,
    /// `None` selects every known value.
    pub value: Option<RangeValue>,
    pub include_unknown: bool,
    pub field_display_name: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MultiOperation {
    Union,
    Intersect,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MultiFilterValue {
    pub operation: MultiOperation,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MultiFilter {
    pub field: String,
    pub value: MultiFilterValue,
    pub field_display_name: Option<String>,
}

/// A constraint on one field.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawFilter")]
pub enum Filter {
    Member(MemberFilter),
    Range(RangeFilter),
    Multi(MultiFilter),
}

impl Filter {
    pub fn member(
        field: impl Into<String>,
        field_type: FieldType,
        value: Option<Vec<Option<FilterValue>>>,
        include_unknown: bool,
    ) -> Self {
        Filter::Member(MemberFilter {
            field: field.into(),
            field_type,
            value,
            include_unknown,
            field_display_name: None,
        })
    }

    pub fn range(
        field: impl Into<String>,
        field_type: FieldType,
        value: Option<RangeValue>,
        include_unknown: bool,
    ) -> Self {
        Filter::Range(RangeFilter {
            field: field.into(),
            field_type,
            value,
            include_unknown,
            field_display_name: None,
        })
    }

    pub fn multi(field: impl Into<String>, operation: MultiOperation, filters: Vec<Filter>) -> Self {
        Filter::Multi(MultiFilter {
            field: field.into(),
            value: MultiFilterValue {
                operation,
                filters,
            },
            field_display_name: None,
        })
    }

    pub fn field(&self) -> &str {
        match self {
            Filter::Member(filter) => &filter.field,
            Filter::Range(filter) => &filter.field,
            Filter::Multi(filter) => &filter.field,
        }
    }

    pub fn field_display_name(&self) -> Option<&str> {
        match self {
            Filter::Member(filter) => filter.field_display_name.as_deref(),
            Filter::Range(filter) => filter.field_display_name.as_deref(),
            Filter::Multi(filter) => filter.field_display_name.as_deref(),
        }
    }

    pub fn with_display_name(mut self, display: impl Into<String>) -> Self {
        let display = Some(display.into());
        match &mut self {
            Filter::Member(filter) => filter.field_display_name = display,
            Filter::Range(filter) => filter.field_display_name = display,
            Filter::Multi(filter) => filter.field_display_name = display,
        }
        self
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFilter {
    field: String,
    #[serde(rename = "type")]
    field_type: FieldType,
    #[serde(default)]
    is_range: bool,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    include_unknown: bool,
    #[serde(default)]
    field_display_name: Option<String>,
}

impl TryFrom<RawFilter> for Filter {
    type Error = FilterError;

    fn try_from(raw: RawFilter) -> Result<Self, Self::Error> {
        let RawFilter {
            field,
            field_type,
            is_range,
            value,
            include_unknown,
            field_display_name,
        } = raw;
        let malformed = |err: serde_json::Error| FilterError::MalformedFilter(format!("{field}: {err}"));
        let filter = match field_type {
            FieldType::MultiFilter => {
                let value: MultiFilterValue = serde_json::from_value(value).map_err(malformed)?;
                Filter::Multi(MultiFilter {
                    field,
                    value,
                    field_display_name,
                })
            }
            _ if is_range => {
                let value: Option<RangeValue> = serde_json::from_value(value).map_err(malformed)?;
                Filter::Range(RangeFilter {
                    field,
                    field_type,
                    value,
                    include_unknown,
                    field_display_name,
                })
            }
            _ => {
                let value: Option<Vec<Option<FilterValue>>> =
                    serde_json::from_value(value).map_err(malformed)?;
                Filter::Member(MemberFilter {
                    field,
                    field_type,
                    value,
                    include_unknown,
                    field_display_name,
                })
            }
        };
        Ok(filter)
    }
}

#[skip_serializing_none]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireFilter<'a, V: Serialize> {
    field: &'a str,
    #[serde(rename = "type")]
    field_type: FieldType,
    is_range: Option<bool>,
    value: &'a V,
    include_unknown: Option<bool>,
    field_display_name: Option<&'a str>,
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Filter::Member(filter) => WireFilter {
                field: &filter.field,
                field_type: filter.field_type,
                is_range: Some(false),
                value: &filter.value,
                include_unknown: Some(filter.include_unknown),
                field_display_name: filter.field_display_name.as_deref(),
            }
            .serialize(serializer),
            Filter::Range(filter) => WireFilter {
                field: &filter.field,
                field_type: filter.field_type,
                is_range: Some(true),
                value: &filter.value,
                include_unknown: Some(filter.include_unknown),
                field_display_name: filter.field_display_name.as_deref(),
            }
            .serialize(serializer),
            Filter::Multi(filter) => WireFilter {
                field: &filter.field,
                field_type: FieldType::MultiFilter,
                is_range: None,
                value: &filter.value,
                include_unknown: None,
                field_display_name: filter.field_display_name.as_deref(),
            }
            .serialize(serializer),
        }
    }
}

/// Per-value record counts for one field.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValueCount {
    pub value: Option<FilterValue>,
    pub count: u64,
    pub filtered_count: u64,
}

impl ValueCount {
    pub fn new(value: Option<FilterValue>, count: u64, filtered_count: u64) -> Self {
        Self {
            value,
            count,
            filtered_count,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldSummary {
    #[serde(default)]
    pub value_counts: Vec<ValueCount>,
    pub internals_count: u64,
    pub internals_filtered_count: u64,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateCounts {
    pub filtered: u64,
    pub unfiltered: u64,
    pub native_filtered: u64,
    pub native_unfiltered: u64,
}
