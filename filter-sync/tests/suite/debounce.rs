use super::support::COLOR_RED;
use super::support::Call;
use super::support::EMPTY_VALUE;
use super::support::FakeService;
use super::support::drain;
use super::support::next_event;
use super::support::settle;
use super::support::settle_and_drain;
use super::support::start_param;
use anyhow::Result;
use facets_filter_core::FieldType;
use facets_filter_core::Filter;
use facets_filter_core::FilterList;
use facets_filter_core::FilterValue;
use facets_filter_core::RangeValue;
use facets_filter_sync::FieldStatus;
use facets_filter_sync::ParamEvent;
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::time::advance;
use tokio::time::sleep;

fn color(value: &str) -> Filter {
    Filter::member(
        "color",
        FieldType::String,
        Some(vec![Some(FilterValue::from(value))]),
        false,
    )
}

fn member(field: &str, value: &str) -> Filter {
    Filter::member(
        field,
        FieldType::String,
        Some(vec![Some(FilterValue::from(value))]),
        false,
    )
}

fn age_from(min: f64) -> Filter {
    Filter::range(
        "age",
        FieldType::Number,
        Some(RangeValue {
            min: Some(min.into()),
            max: None,
        }),
        false,
    )
}

#[tokio::test(start_paused = true)]
async fn rapid_edits_collapse_into_one_fetch() -> Result<()> {
    let service = FakeService::new();
    let (param, mut events) = start_param(&service, EMPTY_VALUE, true)?;
    settle().await;
    drain(&mut events);
    service.clear_calls();

    param.edit_filter(color("red"))?;
    advance(Duration::from_millis(500)).await;
    param.edit_filter(color("green"))?;
    advance(Duration::from_millis(900)).await;
    assert!(service.calls().is_empty());

    let edits = drain(&mut events);
    assert_eq!(edits.len(), 2);
    let ParamEvent::FiltersUpdated { prev, filters, value } = &edits[1] else {
        panic!("expected a filter update, got {:?}", edits[1]);
    };
    assert_eq!(prev.get("color"), Some(&color("red")));
    assert_eq!(filters.get("color"), Some(&color("green")));
    assert!(value.contains("green"));

    settle().await;
    assert_eq!(
        service.calls(),
        vec![Call::Counts {
            filtered_fields: vec!["color".to_string()],
        }]
    );
    let counted = drain(&mut events);
    assert!(matches!(
        counted.as_slice(),
        [ParamEvent::CountsLoaded { counts }] if counts.filtered == 90
    ));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn editing_another_field_refreshes_the_active_summary() -> Result<()> {
    let service = FakeService::new();
    let (param, _events) = start_param(&service, EMPTY_VALUE, true)?;
    settle().await;
    service.clear_calls();

    param.edit_filter(age_from(30.0))?;
    settle().await;

    let calls = service.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.contains(&Call::Summary {
        field: "color".to_string(),
        filtered_fields: vec!["age".to_string()],
    }));
    assert!(calls.contains(&Call::Counts {
        filtered_fields: vec!["age".to_string()],
    }));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn clearing_a_selection_removes_the_filter() -> Result<()> {
    let service = FakeService::new();
    let (param, mut events) = start_param(&service, COLOR_RED, true)?;
    settle().await;
    drain(&mut events);

    param.edit_filter(Filter::member("color", FieldType::String, Some(Vec::new()), false))?;
    let event = next_event(&mut events).await?;
    let ParamEvent::FiltersUpdated { filters, value, .. } = event else {
        panic!("expected a filter update, got {event:?}");
    };
    assert!(filters.is_empty());
    assert_eq!(value, EMPTY_VALUE);
    assert!(param.snapshot().filters.is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn removing_a_filter_persists_the_remaining_list() -> Result<()> {
    let service = FakeService::new();
    let (param, mut events) = start_param(&service, COLOR_RED, true)?;
    settle().await;
    drain(&mut events);
    service.clear_calls();

    param.remove_filter("color")?;
    let updates = settle_and_drain(&mut events).await;
    assert!(updates.iter().any(|event| matches!(
        event,
        ParamEvent::FiltersUpdated { value, .. } if value == EMPTY_VALUE
    )));
    assert_eq!(service.counts_calls(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn summary_refresh_leaves_pending_counts_running() -> Result<()> {
    let service = FakeService::new();
    let (param, mut events) = start_param(&service, EMPTY_VALUE, true)?;
    settle().await;
    drain(&mut events);
    service.set_counts_latency(Duration::from_secs(5));
    service.clear_calls();

    param.edit_filter(age_from(30.0))?;
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(service.counts_calls(), 1);
    param.request_field_summary_refresh("shape")?;

    let published = settle_and_drain(&mut events).await;
    assert!(published.iter().any(|event| matches!(
        event,
        ParamEvent::CountsLoaded { counts } if counts.filtered == 90
    )));
    let snapshot = param.snapshot();
    assert_eq!(snapshot.counts.map(|counts| counts.filtered), Some(90));
    let status = |field: &str| snapshot.field_state(field).map(|state| state.status());
    assert_eq!(status("color"), Some(FieldStatus::Ready));
    assert_eq!(status("shape"), Some(FieldStatus::Ready));
    assert_eq!(service.counts_calls(), 1);
    assert_eq!(service.summary_calls("color"), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn field_activated_during_the_quiet_period_keeps_its_load() -> Result<()> {
    let service = FakeService::new();
    service.set_latency("age", Duration::from_secs(2));
    let (param, mut events) = start_param(&service, EMPTY_VALUE, true)?;
    settle().await;
    drain(&mut events);
    service.clear_calls();

    param.edit_filter(member("shape", "round"))?;
    sleep(Duration::from_millis(500)).await;
    param.set_active_field("age")?;
    sleep(Duration::from_millis(600)).await;

    let age = param.snapshot().field_state("age").cloned().unwrap_or_default();
    assert!(age.loading);

    settle().await;
    let snapshot = param.snapshot();
    assert_eq!(snapshot.active_field.as_deref(), Some("age"));
    assert_eq!(
        snapshot.field_state("age").map(|state| state.status()),
        Some(FieldStatus::Ready)
    );
    assert_eq!(service.summary_calls("age"), 1);
    assert_eq!(service.summary_calls("color"), 0);
    assert!(service.calls().contains(&Call::Summary {
        field: "age".to_string(),
        filtered_fields: vec!["shape".to_string()],
    }));
    assert_eq!(snapshot.counts.map(|counts| counts.filtered), Some(90));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn filters_on_unknown_fields_are_dropped() -> Result<()> {
    let service = FakeService::new();
    let (param, mut events) = start_param(&service, EMPTY_VALUE, true)?;
    settle().await;
    drain(&mut events);
    service.clear_calls();

    param.update_filters(FilterList::new(vec![color("red"), member("ghost", "x")])?)?;
    param.edit_filter(member("ghost2", "y"))?;

    let published = drain(&mut events);
    let dropped: Vec<Vec<String>> = published
        .iter()
        .filter_map(|event| match event {
            ParamEvent::InvalidFilters {
                unreadable,
                unknown_fields,
                message,
            } => {
                assert!(unreadable.is_empty());
                assert!(message.starts_with("Filters on fields that are not available"));
                Some(
                    unknown_fields
                        .iter()
                        .map(|filter| filter.field().to_string())
                        .collect(),
                )
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        dropped,
        vec![vec!["ghost".to_string()], vec!["ghost2".to_string()]]
    );
    let ParamEvent::FiltersUpdated { filters, value, .. } = &published[0] else {
        panic!("expected a filter update, got {:?}", published[0]);
    };
    assert_eq!(filters.as_slice(), &[color("red")]);
    assert!(!value.contains("ghost"));

    settle().await;
    assert_eq!(param.snapshot().filters.as_slice(), &[color("red")]);
    assert_eq!(
        service.calls(),
        vec![Call::Counts {
            filtered_fields: vec!["color".to_string()],
        }]
    );
    Ok(())
}
