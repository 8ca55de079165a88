use super::support::Call;
use super::support::EMPTY_VALUE;
use super::support::FakeService;
use super::support::SHAPE_ROUND;
use super::support::drain;
use super::support::field_updates;
use super::support::fields;
use super::support::settle;
use super::support::start_param;
use anyhow::Result;
use facets_filter_sync::FieldStatus;
use facets_filter_sync::ParamEvent;
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::time::advance;

#[tokio::test(start_paused = true)]
async fn dependency_update_reloads_active_field_and_keeps_retained() -> Result<()> {
    let service = FakeService::new();
    let (param, mut events) = start_param(&service, EMPTY_VALUE, true)?;
    settle().await;
    param.set_active_field("age")?;
    settle().await;
    param.set_active_field("color")?;
    drain(&mut events);
    service.clear_calls();

    param.dependency_updated(None, &["age".to_string()])?;
    let immediate = drain(&mut events);
    assert_eq!(
        immediate[0],
        ParamEvent::FieldsInvalidated {
            retained: vec!["age".to_string()]
        }
    );
    let color = field_updates(&immediate, "color");
    assert_eq!(color.len(), 1);
    assert!(color[0].loading);
    assert!(color[0].invalid);
    assert!(!immediate
        .iter()
        .any(|event| matches!(event, ParamEvent::ActiveFieldSet { .. })));

    settle().await;
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
    let status = |field: &str| snapshot.field_state(field).map(|state| state.status());
    assert_eq!(status("color"), Some(FieldStatus::Ready));
    assert_eq!(status("age"), Some(FieldStatus::Ready));

    service.clear_calls();
    param.set_active_field("age")?;
    settle().await;
    assert!(service.calls().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stale_fields_reload_when_next_activated() -> Result<()> {
    let service = FakeService::new();
    let (param, _events) = start_param(&service, EMPTY_VALUE, true)?;
    settle().await;
    param.set_active_field("age")?;
    settle().await;
    param.set_active_field("color")?;

    param.dependency_updated(None, &[])?;
    settle().await;
    let snapshot = param.snapshot();
    assert_eq!(
        snapshot.field_state("age").map(|state| state.status()),
        Some(FieldStatus::Invalid)
    );

    service.clear_calls();
    param.set_active_field("age")?;
    settle().await;
    assert_eq!(service.summary_calls("age"), 1);
    assert_eq!(
        param.snapshot().field_state("age").map(|state| state.status()),
        Some(FieldStatus::Ready)
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn hidden_group_invalidates_without_fetching() -> Result<()> {
    let service = FakeService::new();
    let (param, _events) = start_param(&service, EMPTY_VALUE, true)?;
    settle().await;
    param.set_group_visible(false)?;
    service.clear_calls();

    param.dependency_updated(None, &[])?;
    settle().await;
    assert!(service.calls().is_empty());

    param.set_group_visible(true)?;
    settle().await;
    assert_eq!(service.summary_calls("color"), 1);
    assert_eq!(service.counts_calls(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn new_ontology_drops_filters_on_missing_fields() -> Result<()> {
    let service = FakeService::new();
    let (param, mut events) = start_param(&service, SHAPE_ROUND, true)?;
    settle().await;
    assert_eq!(param.snapshot().active_field.as_deref(), Some("shape"));
    drain(&mut events);

    let remaining: Vec<_> = fields()
        .into_iter()
        .filter(|field| field.term != "shape")
        .collect();
    param.dependency_updated(Some(&remaining), &[])?;
    let published = drain(&mut events);

    let ParamEvent::FiltersUpdated { prev, filters, .. } = &published[0] else {
        panic!("expected a filter update, got {:?}", published[0]);
    };
    assert!(prev.contains("shape"));
    assert!(filters.is_empty());
    let ParamEvent::InvalidFilters {
        unreadable,
        unknown_fields,
        message,
    } = &published[1]
    else {
        panic!("expected invalid filters, got {:?}", published[1]);
    };
    assert!(unreadable.is_empty());
    assert_eq!(unknown_fields.len(), 1);
    assert!(message.contains("shape"));
    assert_eq!(
        published.last(),
        Some(&ParamEvent::ActiveFieldSet {
            field: "color".to_string()
        })
    );

    settle().await;
    let snapshot = param.snapshot();
    assert!(!snapshot.tree.contains("shape"));
    assert_eq!(snapshot.active_field.as_deref(), Some("color"));
    assert_eq!(service.summary_calls("color"), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn switching_fields_mid_load_keeps_both_loads() -> Result<()> {
    let service = FakeService::new();
    service.set_latency("color", Duration::from_secs(5));
    let (param, mut events) = start_param(&service, EMPTY_VALUE, true)?;
    advance(Duration::from_secs(1)).await;
    drain(&mut events);

    param.set_active_field("age")?;
    assert!(field_updates(&drain(&mut events), "color").is_empty());

    settle().await;
    let late = field_updates(&drain(&mut events), "color");
    assert_eq!(late.len(), 1);
    assert!(late[0].summary.is_some());
    let snapshot = param.snapshot();
    let status = |field: &str| snapshot.field_state(field).map(|state| state.status());
    assert_eq!(status("color"), Some(FieldStatus::Ready));
    assert_eq!(status("age"), Some(FieldStatus::Ready));
    assert_eq!(service.summary_calls("color"), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn dependency_update_abandons_loads_for_other_fields() -> Result<()> {
    let service = FakeService::new();
    service.set_latency("color", Duration::from_secs(5));
    let (param, mut events) = start_param(&service, EMPTY_VALUE, true)?;
    advance(Duration::from_secs(1)).await;
    param.set_active_field("age")?;
    drain(&mut events);

    param.dependency_updated(None, &[])?;
    let color = field_updates(&drain(&mut events), "color");
    assert_eq!(color.len(), 1);
    assert!(!color[0].loading);

    settle().await;
    assert!(field_updates(&drain(&mut events), "color").is_empty());
    let snapshot = param.snapshot();
    let status = |field: &str| snapshot.field_state(field).map(|state| state.status());
    assert_eq!(status("color"), Some(FieldStatus::Uninitialized));
    assert_eq!(status("age"), Some(FieldStatus::Ready));
    assert_eq!(service.summary_calls("color"), 1);
    Ok(())
}
