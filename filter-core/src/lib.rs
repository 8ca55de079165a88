/*!
# Facets Filter Core

Synchronous building blocks of a faceted filter: the field hierarchy, the
rules for which constraints are kept, display ordering of value counts and
histogram binning for range fields.

## Features

- **Ontology tree**: flat field descriptors become a navigable tree
- **Filter decisions**: decide whether an edited constraint is kept or dropped
- **Distribution sorting**: stable, selection-aware ordering of value counts
- **Histogram binning**: phase-aligned fixed-width bins and default plot state
- **Persisted values**: tolerant parsing of the stored `{ "filters": [...] }` value

## Example

```rust
use facets_filter_core::{
    build_tree, Field, FieldType, Filter, FilterList, RangeValue, SelectionPolicy, TreeOptions,
};

let fields = vec![
    Field::new("demographics", "Demographics"),
    Field::new("age", "Age")
        .with_parent("demographics")
        .with_type(FieldType::Number)
        .ranged(),
];
let tree = build_tree(&fields, TreeOptions::default()).unwrap();
assert_eq!(tree.field.term, "demographics");

let edit = Filter::range(
    "age",
    FieldType::Number,
    Some(RangeValue { min: Some(18.0.into()), max: None }),
    false,
);
let filters = FilterList::empty().apply_edit(edit, &[], SelectionPolicy::SelectNothing);
assert_eq!(filters.len(), 1);
```
*/

mod cache;
pub mod dates;
mod decision;
mod display;
mod distribution;
mod error;
mod histogram;
mod model;
mod ontology;
mod param_value;

pub use cache::OntologyCache;
pub use cache::ParamValueCache;
pub use decision::FilterList;
pub use decision::SelectionPolicy;
pub use decision::should_persist;
pub use display::describe;
pub use display::display_value;
pub use display::operation_display;
pub use display::to_percentage;
pub use distribution::ColumnKey;
pub use distribution::SortDirection;
pub use distribution::SortSpec;
pub use distribution::filter_by_search_term;
pub use distribution::is_selected;
pub use distribution::natural_cmp;
pub use distribution::sort_distribution;
pub use error::FilterError;
pub use error::Result;
pub use histogram::BinState;
pub use histogram::ChartType;
pub use histogram::HistogramPoint;
pub use histogram::YAxisScale;
pub use histogram::assign_bin;
pub use histogram::clamp_to_axis;
pub use histogram::create_binned_distribution;
pub use histogram::default_bin_size;
pub use histogram::is_probability;
pub use histogram::numeric_distribution;
pub use histogram::value_range;
pub use histogram::x_axis_range;
pub use histogram::y_axis_max;
pub use model::AggregateCounts;
pub use model::Field;
pub use model::FieldSummary;
pub use model::FieldType;
pub use model::Filter;
pub use model::FilterValue;
pub use model::MemberFilter;
pub use model::MultiFilter;
pub use model::MultiFilterValue;
pub use model::MultiOperation;
pub use model::RangeBound;
pub use model::RangeFilter;
pub use model::RangeValue;
pub use model::ValueCount;
pub use ontology::GENERATED_ROOT_TERM;
pub use ontology::OntologyNode;
pub use ontology::Preorder;
pub use ontology::TreeOptions;
pub use ontology::build_tree;
pub use ontology::fingerprint;
pub use ontology::leaves_of_subtree;
pub use ontology::remove_intermediate_nodes_with_single_child;
pub use ontology::sort_leaves_before_branches;
pub use param_value::ParsedFilters;
pub use param_value::parse_param_value;
pub use param_value::to_param_value;
