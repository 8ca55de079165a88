/*!
# Facets Filter Sync

Keeps the filter parameters of a loaded question consistent with their
backend. Each parameter owns its filter list, active field and per-field
summary cache. The backend is asked only for what is missing or stale, and
replies that arrive after a newer request are dropped.

## Features

- **Debounced edits**: counts are refetched once edits go quiet
- **Switch to latest**: a newer load aborts and discards the older one
- **Visibility gating**: hidden groups never fetch
- **Dependency invalidation**: upstream changes mark cached summaries stale
- **Clean teardown**: unloading cancels timers and in-flight fetches

## Example

```rust,no_run
use async_trait::async_trait;
use facets_filter_core::{AggregateCounts, Field, FieldSummary, FieldType};
use facets_filter_sync::{
    CountsRequest, FilterParamRegistry, FilterParamService, ParamSpec, SummaryRequest, SyncConfig,
};
use std::sync::Arc;

struct Backend;

#[async_trait]
impl FilterParamService for Backend {
    async fn field_summary(&self, _request: SummaryRequest) -> anyhow::Result<FieldSummary> {
        Ok(FieldSummary::default())
    }

    async fn aggregate_counts(&self, _request: CountsRequest) -> anyhow::Result<AggregateCounts> {
        Ok(AggregateCounts::default())
    }
}

# async fn run() -> anyhow::Result<()> {
let registry = FilterParamRegistry::new(SyncConfig::default(), Arc::new(Backend))?;
let spec = ParamSpec {
    parameter_id: "filters".to_string(),
    group: "main".to_string(),
    fields: vec![Field::new("color", "Color").with_type(FieldType::String)],
    value: r#"{"filters":[]}"#.to_string(),
};
let mut streams = registry.load_question("q1", &[spec], &["main".to_string()])?;
if let Some(events) = streams.get_mut("filters") {
    while let Some(event) = events.recv().await {
        println!("{event:?}");
    }
}
# Ok(())
# }
```
*/

mod config;
mod error;
mod event;
mod instance;
mod registry;
mod service;
mod state;
mod triggers;

pub use config::SyncConfig;
pub use error::Result;
pub use error::SyncError;
pub use event::ParamEvent;
pub use instance::Caches;
pub use instance::FilterParamInstance;
pub use instance::ParamKey;
pub use instance::ParamSpec;
pub use registry::DependencyUpdate;
pub use registry::FilterParamRegistry;
pub use service::CountsRequest;
pub use service::FilterParamService;
pub use service::SummaryRequest;
pub use state::FieldStatus;
pub use state::FieldUiState;
pub use state::ParamSnapshot;
pub use triggers::LoadPlan;
pub use triggers::resolve_active_field;
