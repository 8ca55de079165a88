//! One filter parameter of a loaded question: its filters, active field,
//! per-field cache and the fetches that keep them current.
//!
//! Triggers are handled synchronously under the state lock and translated
//! into a [`LoadPlan`]. Loads are tracked per target: one for the aggregate
//! counts and one per field summary. Starting a load aborts the previous load
//! of the same target only, and a result is applied only while its generation
//! is still the target's current one. Filter edits go through a debounce
//! timer first; a newer edit restarts it and the plan is worked out when it
//! fires, against the active field at that moment.

use crate::config::SyncConfig;
use crate::error::Result;
use crate::error::SyncError;
use crate::event::ParamEvent;
use crate::service::CountsRequest;
use crate::service::FilterParamService;
use crate::service::SummaryRequest;
use crate::state::FieldUiState;
use crate::state::ParamSnapshot;
use crate::triggers;
use crate::triggers::LoadPlan;
use facets_filter_core::AggregateCounts;
use facets_filter_core::BinState;
use facets_filter_core::ChartType;
use facets_filter_core::Field;
use facets_filter_core::FieldSummary;
use facets_filter_core::Filter;
use facets_filter_core::FilterList;
use facets_filter_core::OntologyCache;
use facets_filter_core::OntologyNode;
use facets_filter_core::ParamValueCache;
use facets_filter_core::SortSpec;
use facets_filter_core::ValueCount;
use facets_filter_core::numeric_distribution;
use facets_filter_core::sort_distribution;
use facets_filter_core::to_param_value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamKey {
    pub question_id: String,
    pub parameter_id: String,
}

impl ParamKey {
    pub fn new(question_id: impl Into<String>, parameter_id: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            parameter_id: parameter_id.into(),
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.question_id, self.parameter_id)
    }
}

/// Definition of a filter parameter as loaded with its question.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    pub parameter_id: String,
    /// UI group holding the parameter; loads only run while it is visible.
    pub group: String,
    pub fields: Vec<Field>,
    /// Stored `{ "filters": [...] }` value.
    pub value: String,
}

/// Memo caches shared by the parameters of one registry. Entries are keyed
/// by content, so sharing never leaks state between parameters.
#[derive(Clone)]
pub struct Caches {
    pub param_values: Arc<ParamValueCache>,
    pub ontologies: Arc<OntologyCache>,
}

impl Caches {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        Ok(Self {
            param_values: Arc::new(ParamValueCache::new(config.parse_cache_capacity()?)),
            ontologies: Arc::new(OntologyCache::new(config.tree_cache_capacity()?)),
        })
    }
}

/// An in-flight fetch and the filter list it was requested with.
struct Load {
    generation: u64,
    filters: FilterList,
    task: JoinHandle<()>,
}

/// A debounce window. `prev` is the filter list from before its first edit.
struct PendingEdit {
    generation: u64,
    prev: FilterList,
    task: JoinHandle<()>,
}

struct ParamState {
    tree: Arc<OntologyNode>,
    filters: FilterList,
    active_field: Option<String>,
    field_states: BTreeMap<String, FieldUiState>,
    counts: Option<AggregateCounts>,
    group_visible: bool,
    /// Dropped on unload, which also ends the subscriber's stream.
    events: Option<mpsc::UnboundedSender<ParamEvent>>,
    next_generation: u64,
    counts_load: Option<Load>,
    summary_loads: BTreeMap<String, Load>,
    debounce: Option<PendingEdit>,
}

impl ParamState {
    fn is_closed(&self) -> bool {
        self.events.is_none()
    }

    fn emit(&self, event: ParamEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is listening.
            let _ = events.send(event);
        }
    }

    fn publish_field(&self, field: &str) {
        if let Some(state) = self.field_states.get(field) {
            self.emit(ParamEvent::FieldStateUpdated {
                field: field.to_string(),
                state: state.clone(),
            });
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    fn abort_loads(&mut self) {
        if let Some(load) = self.counts_load.take() {
            load.task.abort();
        }
        for load in std::mem::take(&mut self.summary_loads).into_values() {
            load.task.abort();
        }
    }

    /// Drops the parts of `plan` that are already being fetched for the
    /// current filter list.
    fn skip_current_loads(&self, plan: LoadPlan) -> LoadPlan {
        let load_counts = plan.load_counts
            && self
                .counts_load
                .as_ref()
                .is_none_or(|load| load.filters != self.filters);
        let summary_for = plan.summary_for.filter(|field| {
            self.summary_loads
                .get(field)
                .is_none_or(|load| load.filters != self.filters.without(field))
        });
        LoadPlan {
            load_counts,
            summary_for,
        }
    }

    fn field(&self, term: &str) -> Option<&Field> {
        self.tree.find(term).map(|node| &node.field)
    }

    fn require_filter_field(&self, term: &str) -> Result<()> {
        match self.field(term) {
            Some(field) if field.is_filter_field() => Ok(()),
            _ => Err(SyncError::UnknownField(term.to_string())),
        }
    }

    fn value_counts(&self, term: &str) -> &[ValueCount] {
        self.field_states
            .get(term)
            .and_then(|state| state.summary.as_ref())
            .map(|summary| summary.value_counts.as_slice())
            .unwrap_or_default()
    }
}

struct Inner {
    key: ParamKey,
    config: SyncConfig,
    service: Arc<dyn FilterParamService>,
    caches: Caches,
    shutdown: CancellationToken,
    state: Mutex<ParamState>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Handle to a running filter parameter. Clones share the same state.
#[derive(Clone)]
pub struct FilterParamInstance {
    inner: Arc<Inner>,
}

impl FilterParamInstance {
    /// Builds the ontology, reads the stored value and activates the initial
    /// field. Must be called from within a Tokio runtime.
    pub fn start(
        question_id: &str,
        spec: &ParamSpec,
        group_visible: bool,
        config: SyncConfig,
        service: Arc<dyn FilterParamService>,
        caches: Caches,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ParamEvent>)> {
        config.validate()?;
        let key = ParamKey::new(question_id, spec.parameter_id.clone());
        let tree = caches.ontologies.get_or_build(&spec.fields, config.tree)?;
        let parsed = caches.param_values.parse(&spec.value);
        let (filters, unknown) = parsed.filters.retain_known(&tree);
        let active_field = triggers::resolve_active_field(None, &tree, &filters);
        let (events, receiver) = mpsc::unbounded_channel();

        let state = ParamState {
            tree,
            filters,
            active_field: None,
            field_states: BTreeMap::new(),
            counts: None,
            group_visible,
            events: Some(events),
            next_generation: 0,
            counts_load: None,
            summary_loads: BTreeMap::new(),
            debounce: None,
        };
        let inner = Arc::new(Inner {
            key,
            config,
            service,
            caches,
            shutdown: CancellationToken::new(),
            state: Mutex::new(state),
        });

        {
            let mut guard = inner.lock();
            let state = &mut *guard;
            if !parsed.invalid.is_empty() || !unknown.is_empty() {
                warn!(
                    param = %inner.key,
                    unreadable = parsed.invalid.len(),
                    unknown = unknown.len(),
                    "stored filters could not all be applied"
                );
                let message = invalid_filters_message(parsed.message.as_deref(), &unknown);
                state.emit(ParamEvent::InvalidFilters {
                    unreadable: parsed.invalid.clone(),
                    unknown_fields: unknown,
                    message,
                });
            }
            if let Some(field) = active_field {
                inner.activate(state, field);
            }
            info!(
                param = %inner.key,
                filters = state.filters.len(),
                active = state.active_field.as_deref().unwrap_or_default(),
                "filter parameter loaded"
            );
        }

        Ok((Self { inner }, receiver))
    }

    pub fn key(&self) -> &ParamKey {
        &self.inner.key
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().is_closed()
    }

    pub fn snapshot(&self) -> ParamSnapshot {
        let state = self.inner.lock();
        ParamSnapshot {
            question_id: self.inner.key.question_id.clone(),
            parameter_id: self.inner.key.parameter_id.clone(),
            tree: Arc::clone(&state.tree),
            filters: state.filters.clone(),
            active_field: state.active_field.clone(),
            field_states: state.field_states.clone(),
            counts: state.counts,
            group_visible: state.group_visible,
        }
    }

    pub fn set_active_field(&self, field: &str) -> Result<()> {
        let mut guard = self.inner.open()?;
        let state = &mut *guard;
        state.require_filter_field(field)?;
        self.inner.activate(state, field.to_string());
        Ok(())
    }

    /// Replaces the whole filter list. Entries on fields missing from the
    /// ontology are dropped and reported.
    pub fn update_filters(&self, filters: FilterList) -> Result<()> {
        let mut guard = self.inner.open()?;
        self.inner.replace_filters(&mut guard, filters)
    }

    /// Applies one edited constraint, keeping it only when it differs from
    /// "no constraint" under the configured selection policy.
    pub fn edit_filter(&self, filter: Filter) -> Result<()> {
        let mut guard = self.inner.open()?;
        let state = &mut *guard;
        let value_counts = state.value_counts(filter.field());
        let next = state
            .filters
            .apply_edit(filter, value_counts, self.inner.config.selection_policy);
        self.inner.replace_filters(state, next)
    }

    pub fn remove_filter(&self, field: &str) -> Result<()> {
        let mut guard = self.inner.open()?;
        let next = guard.filters.without(field);
        self.inner.replace_filters(&mut guard, next)
    }

    /// Reloads one field's summary without touching the aggregate counts.
    pub fn request_field_summary_refresh(&self, field: &str) -> Result<()> {
        let mut guard = self.inner.open()?;
        guard.require_filter_field(field)?;
        self.inner
            .dispatch(&mut guard, triggers::on_summary_refresh(field));
        Ok(())
    }

    /// Stores the sort and reorders the cached distribution right away.
    pub fn set_sort(&self, field: &str, sort: SortSpec) -> Result<()> {
        let mut guard = self.inner.open()?;
        let state = &mut *guard;
        state.require_filter_field(field)?;
        let filter = state.filters.get(field);
        let field_state = state.field_states.entry(field.to_string()).or_default();
        field_state.sort = Some(sort);
        if let Some(summary) = field_state.summary.as_mut() {
            summary.value_counts = sort_distribution(&summary.value_counts, sort, filter);
        }
        state.publish_field(field);
        Ok(())
    }

    pub fn set_search_term(&self, field: &str, term: impl Into<String>) -> Result<()> {
        let mut guard = self.inner.open()?;
        let state = &mut *guard;
        state.require_filter_field(field)?;
        state
            .field_states
            .entry(field.to_string())
            .or_default()
            .search_term = Some(term.into());
        state.publish_field(field);
        Ok(())
    }

    pub fn set_bin_state(&self, field: &str, bin_state: BinState) -> Result<()> {
        let mut guard = self.inner.open()?;
        let state = &mut *guard;
        state.require_filter_field(field)?;
        state
            .field_states
            .entry(field.to_string())
            .or_default()
            .bin_state = Some(bin_state);
        state.publish_field(field);
        Ok(())
    }

    /// Revealing the group loads whatever the active field is missing.
    pub fn set_group_visible(&self, visible: bool) -> Result<()> {
        let mut guard = self.inner.open()?;
        let state = &mut *guard;
        state.group_visible = visible;
        if visible {
            let plan = triggers::on_field_shown(state.active_field.as_deref(), &state.field_states);
            self.inner.dispatch(state, plan);
        }
        Ok(())
    }

    /// An upstream parameter changed: every cached summary except `retained`
    /// becomes stale, the active field is re-resolved (against `fields` when
    /// the ontology was replaced) and it is reloaded together with the counts.
    /// Other fetches started before the change are abandoned.
    pub fn dependency_updated(&self, fields: Option<&[Field]>, retained: &[String]) -> Result<()> {
        let tree = match fields {
            Some(fields) => Some(
                self.inner
                    .caches
                    .ontologies
                    .get_or_build(fields, self.inner.config.tree)?,
            ),
            None => None,
        };
        let mut guard = self.inner.open()?;
        let state = &mut *guard;

        if let Some(tree) = tree {
            state.tree = tree;
            let (known, unknown) = state.filters.retain_known(&state.tree);
            if !unknown.is_empty() {
                warn!(
                    param = %self.inner.key,
                    dropped = unknown.len(),
                    "filters reference fields missing from the new ontology"
                );
                let value = to_param_value(&known)?;
                let prev = std::mem::replace(&mut state.filters, known);
                state.emit(ParamEvent::FiltersUpdated {
                    prev,
                    filters: state.filters.clone(),
                    value,
                });
                let message = invalid_filters_message(None, &unknown);
                state.emit(ParamEvent::InvalidFilters {
                    unreadable: Vec::new(),
                    unknown_fields: unknown,
                    message,
                });
            }
        }

        for (term, field_state) in state.field_states.iter_mut() {
            if !retained.contains(term) {
                field_state.invalid = true;
            }
        }
        info!(
            param = %self.inner.key,
            retained = retained.len(),
            "invalidated cached field summaries"
        );
        state.emit(ParamEvent::FieldsInvalidated {
            retained: retained.to_vec(),
        });

        let previous = state.active_field.take();
        let active = triggers::resolve_active_field(previous.as_deref(), &state.tree, &state.filters);
        if let Some(term) = &active {
            state.field_states.entry(term.clone()).or_default();
        }
        state.active_field = active.clone();
        let reloading = active.as_deref().filter(|_| state.group_visible);
        self.inner.abort_stale_loads(state, retained, reloading);
        self.inner
            .dispatch(state, triggers::on_dependency_updated(active.as_deref()));
        if let Some(term) = active
            && previous.as_deref() != Some(term.as_str())
        {
            state.emit(ParamEvent::ActiveFieldSet { field: term });
        }
        Ok(())
    }

    /// Cancels every pending fetch and timer. No event is published after
    /// this returns and later intents fail with [`SyncError::Closed`].
    pub fn unload(&self) {
        let mut state = self.inner.lock();
        if state.is_closed() {
            return;
        }
        self.inner.shutdown.cancel();
        state.events = None;
        state.abort_loads();
        if let Some(pending) = state.debounce.take() {
            pending.task.abort();
        }
        info!(param = %self.inner.key, "filter parameter unloaded");
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, ParamState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn open(&self) -> Result<MutexGuard<'_, ParamState>> {
        let guard = self.lock();
        if guard.is_closed() {
            return Err(SyncError::Closed(self.key.to_string()));
        }
        Ok(guard)
    }

    /// Makes `field` active. The announcement follows the loads it implies.
    fn activate(self: &Arc<Self>, state: &mut ParamState, field: String) {
        state.field_states.entry(field.clone()).or_default();
        state.active_field = Some(field.clone());
        let plan = triggers::on_field_shown(Some(&field), &state.field_states);
        self.dispatch(state, plan);
        state.emit(ParamEvent::ActiveFieldSet { field });
    }

    fn replace_filters(self: &Arc<Self>, state: &mut ParamState, filters: FilterList) -> Result<()> {
        let (filters, unknown) = filters.retain_known(&state.tree);
        let value = to_param_value(&filters)?;
        let prev = std::mem::replace(&mut state.filters, filters);
        let window_start = match state.debounce.take() {
            Some(pending) => {
                pending.task.abort();
                pending.prev
            }
            None => prev.clone(),
        };
        state.emit(ParamEvent::FiltersUpdated {
            prev,
            filters: state.filters.clone(),
            value,
        });
        if !unknown.is_empty() {
            warn!(
                param = %self.key,
                dropped = unknown.len(),
                "filters on fields missing from the ontology were dropped"
            );
            let message = invalid_filters_message(None, &unknown);
            state.emit(ParamEvent::InvalidFilters {
                unreadable: Vec::new(),
                unknown_fields: unknown,
                message,
            });
        }

        let generation = state.next_generation();
        state.debounce = Some(PendingEdit {
            generation,
            prev: window_start,
            task: self.spawn_debounced(generation),
        });
        Ok(())
    }

    fn spawn_debounced(self: &Arc<Self>, generation: u64) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let shutdown = self.shutdown.clone();
        let delay = self.config.debounce();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = sleep(delay) => {}
            }
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut guard = inner.lock();
            let state = &mut *guard;
            if state.is_closed() {
                return;
            }
            // A newer edit may have landed while this task waited for the lock.
            let Some(pending) = state
                .debounce
                .take_if(|pending| pending.generation == generation)
            else {
                return;
            };
            let plan = triggers::on_filters_changed(
                &pending.prev,
                &state.filters,
                state.active_field.as_deref(),
                &state.field_states,
            );
            let plan = state.skip_current_loads(plan);
            inner.dispatch(state, plan);
        })
    }

    /// Starts the fetches in `plan`. Each one supersedes the in-flight fetch
    /// for the same target and leaves the others running.
    fn dispatch(self: &Arc<Self>, state: &mut ParamState, plan: LoadPlan) {
        if plan.is_empty() {
            return;
        }
        if !state.group_visible {
            debug!(param = %self.key, ?plan, "group hidden; skipping load");
            return;
        }

        if let Some(field) = plan.summary_for {
            let generation = state.next_generation();
            let filters = state.filters.without(&field);
            state.field_states.entry(field.clone()).or_default().loading = true;
            state.publish_field(&field);
            let request = SummaryRequest {
                question_id: self.key.question_id.clone(),
                parameter_id: self.key.parameter_id.clone(),
                filters: filters.clone(),
                field: field.clone(),
            };
            let task = self.spawn_summary(generation, request);
            let load = Load {
                generation,
                filters,
                task,
            };
            if let Some(superseded) = state.summary_loads.insert(field, load) {
                superseded.task.abort();
            }
        }
        if plan.load_counts {
            let generation = state.next_generation();
            let request = CountsRequest {
                question_id: self.key.question_id.clone(),
                parameter_id: self.key.parameter_id.clone(),
                filters: state.filters.clone(),
            };
            let task = self.spawn_counts(generation, request);
            let load = Load {
                generation,
                filters: state.filters.clone(),
                task,
            };
            if let Some(superseded) = state.counts_load.replace(load) {
                superseded.task.abort();
            }
        }
    }

    /// Aborts fetches started before an upstream change. Summaries of
    /// `retained` fields survive; `reloading` is about to be superseded.
    fn abort_stale_loads(&self, state: &mut ParamState, retained: &[String], reloading: Option<&str>) {
        if let Some(load) = state.counts_load.take() {
            load.task.abort();
        }
        let mut stale = Vec::new();
        state.summary_loads.retain(|term, load| {
            if retained.contains(term) || reloading == Some(term.as_str()) {
                return true;
            }
            load.task.abort();
            stale.push(term.clone());
            false
        });
        for term in stale {
            debug!(param = %self.key, field = %term, "field summary load abandoned");
            if let Some(field_state) = state.field_states.get_mut(&term) {
                field_state.loading = false;
            }
            state.publish_field(&term);
        }
    }

    fn spawn_summary(self: &Arc<Self>, generation: u64, request: SummaryRequest) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let service = Arc::clone(&self.service);
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let field = request.field.clone();
            let result = tokio::select! {
                _ = shutdown.cancelled() => return,
                result = service.field_summary(request) => result,
            };
            if let Some(inner) = weak.upgrade() {
                inner.finish_summary(generation, &field, result);
            }
        })
    }

    fn spawn_counts(self: &Arc<Self>, generation: u64, request: CountsRequest) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let service = Arc::clone(&self.service);
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = shutdown.cancelled() => return,
                result = service.aggregate_counts(request) => result,
            };
            if let Some(inner) = weak.upgrade() {
                inner.finish_counts(generation, result);
            }
        })
    }

    fn finish_summary(&self, generation: u64, field: &str, result: anyhow::Result<FieldSummary>) {
        let mut guard = self.lock();
        let state = &mut *guard;
        let current = state
            .summary_loads
            .get(field)
            .is_some_and(|load| load.generation == generation);
        if state.is_closed() || !current {
            debug!(param = %self.key, field, "discarding stale field summary");
            return;
        }
        state.summary_loads.remove(field);
        match result {
            Ok(summary) => {
                debug!(
                    param = %self.key,
                    field,
                    values = summary.value_counts.len(),
                    "field summary loaded"
                );
                let loaded = self.loaded_field_state(state, field, summary);
                state.field_states.insert(field.to_string(), loaded);
            }
            Err(err) => {
                warn!(param = %self.key, field, error = %err, "failed to load field summary");
                let field_state = state.field_states.entry(field.to_string()).or_default();
                field_state.loading = false;
                field_state.invalid = false;
                field_state.error_message = Some(format!("Unable to load summary for \"{field}\"."));
            }
        }
        state.publish_field(field);
    }

    /// Fresh state for a field whose summary just arrived. Membership fields
    /// get the default sort applied; range fields keep their plot settings or
    /// get defaults derived from the new distribution.
    fn loaded_field_state(&self, state: &ParamState, term: &str, summary: FieldSummary) -> FieldUiState {
        let field = state.field(term);
        if field.is_some_and(Field::is_member) {
            let sort = SortSpec::default();
            let value_counts = sort_distribution(&summary.value_counts, sort, state.filters.get(term));
            return FieldUiState {
                summary: Some(FieldSummary {
                    value_counts,
                    ..summary
                }),
                sort: Some(sort),
                search_term: Some(String::new()),
                ..FieldUiState::default()
            };
        }

        let previous = state
            .field_states
            .get(term)
            .and_then(|field_state| field_state.bin_state);
        let bin_state = previous.or_else(|| {
            let field = field.filter(|field| field.is_range())?;
            let field_type = field.field_type?;
            let chart_type = ChartType::for_field(field_type)?;
            let points = numeric_distribution(&summary.value_counts, field_type);
            Some(BinState::default_for(&points, chart_type, self.config.truncate_y_axis))
        });
        FieldUiState {
            summary: Some(summary),
            bin_state,
            ..FieldUiState::default()
        }
    }

    fn finish_counts(&self, generation: u64, result: anyhow::Result<AggregateCounts>) {
        let mut state = self.lock();
        let current = state
            .counts_load
            .as_ref()
            .is_some_and(|load| load.generation == generation);
        if state.is_closed() || !current {
            debug!(param = %self.key, "discarding stale counts");
            return;
        }
        state.counts_load = None;
        match result {
            Ok(counts) => {
                state.counts = Some(counts);
                state.emit(ParamEvent::CountsLoaded { counts });
            }
            Err(err) => {
                error!(param = %self.key, error = %err, "failed to load filter counts");
                state.emit(ParamEvent::ParamError {
                    message: format!("Unable to load counts: {err}"),
                });
            }
        }
    }
}

fn invalid_filters_message(parse_message: Option<&str>, unknown: &[Filter]) -> String {
    let mut parts: Vec<String> = parse_message.map(str::to_string).into_iter().collect();
    if !unknown.is_empty() {
        let fields = unknown
            .iter()
            .map(|filter| filter.field_display_name().unwrap_or(filter.field()))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("Filters on fields that are not available were removed: {fields}"));
    }
    parts.join(" ")
}
