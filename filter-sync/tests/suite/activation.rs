use super::support::AGE_FROM_18;
use super::support::Call;
use super::support::EMPTY_VALUE;
use super::support::FakeService;
use super::support::displayed_values;
use super::support::drain;
use super::support::field_updates;
use super::support::settle;
use super::support::settle_and_drain;
use super::support::start_param;
use anyhow::Result;
use facets_filter_core::AggregateCounts;
use facets_filter_core::ColumnKey;
use facets_filter_core::SortDirection;
use facets_filter_core::SortSpec;
use facets_filter_sync::FieldStatus;
use facets_filter_sync::ParamEvent;
use facets_filter_sync::SyncError;
use pretty_assertions::assert_eq;

#[tokio::test(start_paused = true)]
async fn initial_load_fetches_first_leaf_summary_and_counts() -> Result<()> {
    let service = FakeService::new();
    let (param, mut events) = start_param(&service, EMPTY_VALUE, true)?;

    let announced = drain(&mut events);
    assert_eq!(announced.len(), 2);
    let loading = field_updates(&announced, "color");
    assert_eq!(loading.len(), 1);
    assert_eq!(loading[0].status(), FieldStatus::Loading);
    assert_eq!(
        announced[1],
        ParamEvent::ActiveFieldSet {
            field: "color".to_string()
        }
    );

    let loaded = settle_and_drain(&mut events).await;
    let color = field_updates(&loaded, "color");
    assert_eq!(color.len(), 1);
    assert_eq!(color[0].status(), FieldStatus::Ready);
    assert_eq!(displayed_values(&color[0]), vec!["green", "red", "blue"]);
    assert_eq!(color[0].sort, Some(SortSpec::default()));
    assert_eq!(color[0].search_term.as_deref(), Some(""));
    assert!(loaded.contains(&ParamEvent::CountsLoaded {
        counts: AggregateCounts {
            filtered: 100,
            unfiltered: 100,
            native_filtered: 50,
            native_unfiltered: 50,
        }
    }));

    let mut calls = service.calls();
    calls.sort_by_key(|call| matches!(call, Call::Counts { .. }));
    assert_eq!(
        calls,
        vec![
            Call::Summary {
                field: "color".to_string(),
                filtered_fields: Vec::new(),
            },
            Call::Counts {
                filtered_fields: Vec::new(),
            },
        ]
    );

    let snapshot = param.snapshot();
    assert_eq!(snapshot.active_field.as_deref(), Some("color"));
    assert!(snapshot.counts.is_some());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stored_filter_selects_active_field_and_is_excluded_from_its_summary() -> Result<()> {
    let service = FakeService::new();
    let (param, mut events) = start_param(&service, AGE_FROM_18, true)?;
    settle().await;

    assert!(service.calls().contains(&Call::Summary {
        field: "age".to_string(),
        filtered_fields: Vec::new(),
    }));
    assert!(service.calls().contains(&Call::Counts {
        filtered_fields: vec!["age".to_string()],
    }));

    let snapshot = param.snapshot();
    assert_eq!(snapshot.active_field.as_deref(), Some("age"));
    let age = snapshot.field_state("age").cloned().unwrap_or_default();
    assert_eq!(age.status(), FieldStatus::Ready);
    assert!(age.sort.is_none());
    let bins = age.bin_state.expect("range fields get default bins");
    assert!(bins.bin_size > 0.0);
    assert!(bins.xaxis_min <= 18.0);
    assert!(bins.xaxis_max >= 22.0);

    let events = drain(&mut events);
    assert!(events.contains(&ParamEvent::ActiveFieldSet {
        field: "age".to_string()
    }));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn hidden_group_defers_loading_until_shown() -> Result<()> {
    let service = FakeService::new();
    let (param, mut events) = start_param(&service, EMPTY_VALUE, false)?;

    let quiet = settle_and_drain(&mut events).await;
    assert_eq!(
        quiet,
        vec![ParamEvent::ActiveFieldSet {
            field: "color".to_string()
        }]
    );
    assert!(service.calls().is_empty());

    param.set_group_visible(true)?;
    settle().await;
    assert_eq!(service.summary_calls("color"), 1);
    assert_eq!(service.counts_calls(), 1);

    // Hiding and showing again with a fresh summary fetches nothing.
    param.set_group_visible(false)?;
    param.set_group_visible(true)?;
    settle().await;
    assert_eq!(service.calls().len(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn returning_to_a_loaded_field_does_not_refetch() -> Result<()> {
    let service = FakeService::new();
    let (param, mut events) = start_param(&service, EMPTY_VALUE, true)?;
    settle().await;

    param.set_active_field("age")?;
    settle().await;
    assert_eq!(service.summary_calls("age"), 1);
    drain(&mut events);

    param.set_active_field("color")?;
    let switched = settle_and_drain(&mut events).await;
    assert_eq!(
        switched,
        vec![ParamEvent::ActiveFieldSet {
            field: "color".to_string()
        }]
    );
    assert_eq!(service.summary_calls("color"), 1);
    assert_eq!(service.counts_calls(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn grouping_nodes_cannot_be_activated() -> Result<()> {
    let service = FakeService::new();
    let (param, _events) = start_param(&service, EMPTY_VALUE, true)?;

    let err = param.set_active_field("demographics").unwrap_err();
    assert!(matches!(err, SyncError::UnknownField(field) if field == "demographics"));
    let err = param.set_active_field("missing").unwrap_err();
    assert!(matches!(err, SyncError::UnknownField(_)));
    assert_eq!(param.snapshot().active_field.as_deref(), Some("color"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn sort_and_search_update_the_cached_distribution() -> Result<()> {
    let service = FakeService::new();
    let (param, mut events) = start_param(&service, EMPTY_VALUE, true)?;
    settle().await;
    drain(&mut events);

    let by_count = SortSpec {
        column_key: ColumnKey::Count,
        direction: SortDirection::Desc,
        group_by_selected: false,
    };
    param.set_sort("color", by_count)?;
    param.set_search_term("color", "re")?;

    let updates = field_updates(&drain(&mut events), "color");
    assert_eq!(updates.len(), 2);
    assert_eq!(displayed_values(&updates[0]), vec!["red", "green", "blue"]);
    assert_eq!(updates[1].sort, Some(by_count));
    assert_eq!(updates[1].search_term.as_deref(), Some("re"));

    assert_eq!(service.summary_calls("color"), 1);
    Ok(())
}
