use super::support::COLOR_RED;
use super::support::EMPTY_VALUE;
use super::support::FakeService;
use super::support::QUESTION;
use super::support::drain;
use super::support::is_disconnected;
use super::support::param_spec;
use super::support::settle;
use anyhow::Result;
use facets_filter_sync::DependencyUpdate;
use facets_filter_sync::FilterParamRegistry;
use facets_filter_sync::FilterParamService;
use facets_filter_sync::ParamEvent;
use facets_filter_sync::SyncConfig;
use facets_filter_sync::SyncError;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn registry(service: &Arc<FakeService>) -> Result<FilterParamRegistry> {
    let service: Arc<dyn FilterParamService> = service.clone();
    Ok(FilterParamRegistry::new(SyncConfig::default(), service)?)
}

#[tokio::test(start_paused = true)]
async fn only_visible_groups_load() -> Result<()> {
    let service = FakeService::new();
    let registry = registry(&service)?;
    let specs = vec![
        param_spec("primary", "main", EMPTY_VALUE),
        param_spec("advanced", "more", COLOR_RED),
    ];
    let mut streams = registry.load_question(QUESTION, &specs, &["main".to_string()])?;
    assert_eq!(streams.len(), 2);
    settle().await;
    assert_eq!(service.counts_calls(), 1);

    let shown = registry.change_group_visibility(QUESTION, "more", true)?;
    assert_eq!(shown, 1);
    settle().await;
    assert_eq!(service.counts_calls(), 2);

    let advanced = registry.instance(QUESTION, "advanced")?;
    assert_eq!(advanced.snapshot().filters.len(), 1);
    assert!(advanced.snapshot().group_visible);
    if let Some(events) = streams.get_mut("advanced") {
        assert!(drain(events)
            .iter()
            .any(|event| matches!(event, ParamEvent::CountsLoaded { .. })));
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn dependency_updates_are_checked_before_applying() -> Result<()> {
    let service = FakeService::new();
    let registry = registry(&service)?;
    let specs = vec![param_spec("primary", "main", EMPTY_VALUE)];
    let mut streams = registry.load_question(QUESTION, &specs, &["main".to_string()])?;
    settle().await;
    let mut events = streams.remove("primary").unwrap_or_else(|| panic!("missing stream"));
    drain(&mut events);

    let updates = vec![
        DependencyUpdate {
            parameter_id: "primary".to_string(),
            ..DependencyUpdate::default()
        },
        DependencyUpdate {
            parameter_id: "missing".to_string(),
            ..DependencyUpdate::default()
        },
    ];
    let err = registry
        .dependent_params_updated(QUESTION, &updates)
        .unwrap_err();
    assert!(matches!(err, SyncError::UnknownParameter { parameter_id, .. } if parameter_id == "missing"));
    assert!(drain(&mut events).is_empty());

    registry.dependent_params_updated(QUESTION, &updates[..1])?;
    assert_eq!(
        drain(&mut events).first(),
        Some(&ParamEvent::FieldsInvalidated {
            retained: Vec::new()
        })
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn unloading_a_question_closes_its_parameters() -> Result<()> {
    let service = FakeService::new();
    let registry = registry(&service)?;
    let specs = vec![param_spec("primary", "main", EMPTY_VALUE)];
    let mut streams = registry.load_question(QUESTION, &specs, &["main".to_string()])?;
    let param = registry.instance(QUESTION, "primary")?;
    assert_eq!(registry.loaded_questions(), vec![QUESTION.to_string()]);

    assert!(registry.unload_question(QUESTION));
    assert!(!registry.unload_question(QUESTION));
    assert!(param.is_closed());
    assert!(matches!(
        registry.instance(QUESTION, "primary"),
        Err(SyncError::UnknownQuestion(_))
    ));
    assert!(matches!(
        registry.change_group_visibility(QUESTION, "main", false),
        Err(SyncError::UnknownQuestion(_))
    ));

    settle().await;
    if let Some(events) = streams.get_mut("primary") {
        drain(events);
        assert!(is_disconnected(events));
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn reloading_a_question_replaces_its_parameters() -> Result<()> {
    let service = FakeService::new();
    let registry = registry(&service)?;
    let specs = vec![param_spec("primary", "main", EMPTY_VALUE)];
    registry.load_question(QUESTION, &specs, &["main".to_string()])?;
    let first = registry.instance(QUESTION, "primary")?;

    let specs = vec![param_spec("primary", "main", COLOR_RED)];
    registry.load_question(QUESTION, &specs, &["main".to_string()])?;
    let second = registry.instance(QUESTION, "primary")?;

    assert!(first.is_closed());
    assert!(!second.is_closed());
    assert_eq!(second.snapshot().filters.len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn unreadable_stored_filters_are_reported_and_skipped() -> Result<()> {
    let service = FakeService::new();
    let registry = registry(&service)?;
    let value = r#"{"filters":[{"field":"color","type":"string","value":["red"]},{"field":"size"}]}"#;
    let specs = vec![param_spec("primary", "main", value)];
    let mut streams = registry.load_question(QUESTION, &specs, &["main".to_string()])?;

    let events = streams
        .get_mut("primary")
        .map(drain)
        .unwrap_or_default();
    let ParamEvent::InvalidFilters {
        unreadable,
        unknown_fields,
        message,
    } = &events[0]
    else {
        panic!("expected invalid filters first, got {:?}", events.first());
    };
    assert_eq!(unreadable, &vec![r#"{"field":"size"}"#.to_string()]);
    assert!(unknown_fields.is_empty());
    assert!(message.starts_with("The following stored filters could not be applied"));

    let snapshot = registry.instance(QUESTION, "primary")?.snapshot();
    assert_eq!(snapshot.filters.len(), 1);
    assert_eq!(snapshot.active_field.as_deref(), Some("color"));
    Ok(())
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let service: Arc<dyn FilterParamService> = FakeService::new();
    let config = SyncConfig {
        tree_cache_capacity: 0,
        ..SyncConfig::default()
    };
    assert!(matches!(
        FilterParamRegistry::new(config, service),
        Err(SyncError::InvalidConfig(_))
    ));
}
