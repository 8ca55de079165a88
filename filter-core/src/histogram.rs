//! Fixed-width binning of range distributions and the default plot state.
//!
//! Values are positions on a linear axis: numbers as-is, dates as whole days
//! since 1970-01-01 (see [`crate::dates`]). Bins are left-inclusive and
//! phase-aligned to `bin_start`, so with width `w` the bins are
//! `[bin_start + k*w, bin_start + (k+1)*w)`.

use crate::model::FieldType;
use crate::model::ValueCount;
use serde::Deserialize;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;

const PROBABILITY_MAXIMA: [f64; 2] = [1.0, 100.0];
const Y_AXIS_HEADROOM: f64 = 1.1;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Number,
    Date,
}

impl ChartType {
    pub fn for_field(field_type: FieldType) -> Option<Self> {
        match field_type {
            FieldType::Number => Some(ChartType::Number),
            FieldType::Date => Some(ChartType::Date),
            FieldType::String | FieldType::MultiFilter => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramPoint {
    pub value: f64,
    pub count: u64,
    pub filtered_count: u64,
}

/// Converts value counts to axis points, dropping the null bucket and
/// values that do not parse for `field_type`.
pub fn numeric_distribution(entries: &[ValueCount], field_type: FieldType) -> Vec<HistogramPoint> {
    entries
        .iter()
        .filter_map(|entry| {
            let value = entry.value.as_ref()?.axis_value(field_type)?;
            Some(HistogramPoint {
                value,
                count: entry.count,
                filtered_count: entry.filtered_count,
            })
        })
        .collect()
}

/// Lower edge of the bin holding `value`, or `None` when the value lies
/// before `bin_start` or the width is not a positive number.
pub fn assign_bin(bin_size: f64, bin_start: f64, value: f64) -> Option<f64> {
    if !(bin_size.is_finite() && bin_size > 0.0) || value < bin_start {
        return None;
    }
    let shift = bin_start % bin_size;
    Some(((value - shift) / bin_size).floor() * bin_size + shift)
}

/// Sums counts per bin. Points before `bin_start` are dropped. Output is
/// ordered by bin edge.
pub fn create_binned_distribution(
    bin_size: f64,
    bin_start: f64,
    points: &[HistogramPoint],
) -> Vec<HistogramPoint> {
    let mut bins: HashMap<u64, HistogramPoint> = HashMap::new();
    for point in points {
        let Some(edge) = assign_bin(bin_size, bin_start, point.value) else {
            continue;
        };
        // Fold -0.0 into 0.0 so both land in one bucket.
        let edge = edge + 0.0;
        let bin = bins.entry(edge.to_bits()).or_insert(HistogramPoint {
            value: edge,
            count: 0,
            filtered_count: 0,
        });
        bin.count += point.count;
        bin.filtered_count += point.filtered_count;
    }
    let mut binned: Vec<HistogramPoint> = bins.into_values().collect();
    binned.sort_by(|a, b| a.value.total_cmp(&b.value));
    binned
}

pub fn value_range(points: &[HistogramPoint]) -> Option<(f64, f64)> {
    points.iter().fold(None, |range, point| match range {
        None => Some((point.value, point.value)),
        Some((min, max)) => Some((min.min(point.value), max.max(point.value))),
    })
}

/// Non-negative data topping out at exactly 1 or 100.
pub fn is_probability(points: &[HistogramPoint]) -> bool {
    value_range(points).is_some_and(|(min, max)| min >= 0.0 && PROBABILITY_MAXIMA.contains(&max))
}

/// Default bin width: one day for dates, a hundredth of the scale for
/// probabilities, otherwise Sturges' rule rounded up for integer data.
pub fn default_bin_size(points: &[HistogramPoint], chart_type: ChartType) -> f64 {
    if chart_type == ChartType::Date {
        return 1.0;
    }
    let Some((min, max)) = value_range(points) else {
        return 1.0;
    };
    if is_probability(points) {
        return max / 100.0;
    }
    let total: u64 = points.iter().map(|point| point.count).sum();
    let padding = (max - min) / 100.0;
    let num_bins = (total as f64).log2().ceil() + 1.0;
    let mut bin_size = (padding + max - min) / num_bins;
    if !is_positive(bin_size) {
        bin_size = (max - min.min(0.0)) / 10.0;
    }
    if !is_positive(bin_size) {
        bin_size = 1.0;
    }
    if points.iter().all(|point| point.value.fract() == 0.0) {
        bin_size.ceil()
    } else {
        bin_size
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Default x-axis bounds. Numeric axes always show zero; date axes start at
/// the earliest value. A degenerate range is widened by one unit.
pub fn x_axis_range(points: &[HistogramPoint], chart_type: ChartType) -> (f64, f64) {
    let Some((min, max)) = value_range(points) else {
        return (0.0, 1.0);
    };
    let axis_min = match chart_type {
        ChartType::Date => min,
        ChartType::Number => min.min(0.0),
    };
    let axis_max = if max == axis_min { axis_min + 1.0 } else { max };
    (axis_min, axis_max)
}

/// Highest count, or with `truncate` the second highest plus headroom when
/// the highest is at least double it.
pub fn y_axis_max(points: &[HistogramPoint], truncate: bool) -> f64 {
    let mut counts: Vec<u64> = points.iter().map(|point| point.count).collect();
    counts.sort_unstable_by_key(|count| Reverse(*count));
    let max = counts.first().copied().unwrap_or(0) as f64;
    if !truncate {
        return max;
    }
    let next = counts.get(1).copied().unwrap_or(0) as f64;
    if next > 0.0 && max >= next * 2.0 {
        next * Y_AXIS_HEADROOM
    } else {
        max
    }
}

/// Points within the inclusive window; a missing bound is open.
pub fn clamp_to_axis(
    points: &[HistogramPoint],
    min: Option<f64>,
    max: Option<f64>,
) -> Vec<HistogramPoint> {
    points
        .iter()
        .filter(|point| {
            min.is_none_or(|min| point.value >= min) && max.is_none_or(|max| point.value <= max)
        })
        .copied()
        .collect()
}

/// Y-axis scale transform.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum YAxisScale {
    #[default]
    None,
    Log,
    Log2,
    Log10,
}

impl YAxisScale {
    pub fn transform(self, value: f64) -> f64 {
        match self {
            YAxisScale::None => value,
            YAxisScale::Log => (value + 1.0).ln(),
            YAxisScale::Log2 => (value + 1.0).log2(),
            YAxisScale::Log10 => (value + 1.0).log10(),
        }
    }

    pub fn inverse(self, value: f64) -> f64 {
        match self {
            YAxisScale::None => value,
            YAxisScale::Log => value.exp() - 1.0,
            YAxisScale::Log2 => value.exp2() - 1.0,
            YAxisScale::Log10 => 10f64.powf(value) - 1.0,
        }
    }
}

/// Plot settings for a range field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinState {
    pub bin_size: f64,
    pub bin_start: f64,
    pub xaxis_min: f64,
    pub xaxis_max: f64,
    #[serde(default)]
    pub yaxis_min: f64,
    pub yaxis_max: f64,
    #[serde(default)]
    pub scale_y_axis: YAxisScale,
}

impl BinState {
    pub fn default_for(points: &[HistogramPoint], chart_type: ChartType, truncate: bool) -> Self {
        let (xaxis_min, axis_max) = x_axis_range(points, chart_type);
        let bin_start = xaxis_min;
        let bin_size = default_bin_size(points, chart_type);
        let binned = create_binned_distribution(bin_size, bin_start, points);
        let last_edge = assign_bin(bin_size, bin_start, axis_max).unwrap_or(axis_max);
        Self {
            bin_size,
            bin_start,
            xaxis_min,
            xaxis_max: last_edge + bin_size,
            yaxis_min: 0.0,
            yaxis_max: y_axis_max(&binned, truncate),
            scale_y_axis: YAxisScale::None,
        }
    }

    /// Same view with a new bin layout; the y-axis follows the new bins.
    pub fn rebin(
        &self,
        points: &[HistogramPoint],
        bin_size: f64,
        bin_start: f64,
        truncate: bool,
    ) -> Self {
        let binned = create_binned_distribution(bin_size, bin_start, points);
        Self {
            bin_size,
            bin_start,
            yaxis_max: y_axis_max(&binned, truncate),
            ..*self
        }
    }
}
