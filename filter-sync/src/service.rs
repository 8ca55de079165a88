use async_trait::async_trait;
use facets_filter_core::AggregateCounts;
use facets_filter_core::FieldSummary;
use facets_filter_core::FilterList;

/// Request for one field's value distribution. `filters` never contains the
/// target field's own constraint: a summary reflects the other fields only.
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryRequest {
    pub question_id: String,
    pub parameter_id: String,
    pub filters: FilterList,
    pub field: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CountsRequest {
    pub question_id: String,
    pub parameter_id: String,
    pub filters: FilterList,
}

/// Backend answering summary and count queries for filter parameters.
#[async_trait]
pub trait FilterParamService: Send + Sync {
    async fn field_summary(&self, request: SummaryRequest) -> anyhow::Result<FieldSummary>;

    async fn aggregate_counts(&self, request: CountsRequest) -> anyhow::Result<AggregateCounts>;
}
