use crate::config::SyncConfig;
use crate::error::Result;
use crate::error::SyncError;
use crate::event::ParamEvent;
use crate::instance::Caches;
use crate::instance::FilterParamInstance;
use crate::instance::ParamSpec;
use crate::service::FilterParamService;
use facets_filter_core::Field;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;
use tracing::info;

/// Upstream change reported for one filter parameter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DependencyUpdate {
    pub parameter_id: String,
    /// Replacement ontology, when the upstream change altered it.
    pub fields: Option<Vec<Field>>,
    /// Fields whose cached summaries are still valid.
    pub retained: Vec<String>,
}

struct LoadedParam {
    group: String,
    instance: FilterParamInstance,
}

/// Owns the filter parameters of every loaded question and routes
/// question-level notifications to them.
pub struct FilterParamRegistry {
    config: SyncConfig,
    service: Arc<dyn FilterParamService>,
    caches: Caches,
    questions: Mutex<HashMap<String, BTreeMap<String, LoadedParam>>>,
}

impl FilterParamRegistry {
    pub fn new(config: SyncConfig, service: Arc<dyn FilterParamService>) -> Result<Self> {
        config.validate()?;
        let caches = Caches::new(&config)?;
        Ok(Self {
            config,
            service,
            caches,
            questions: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn caches(&self) -> &Caches {
        &self.caches
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, BTreeMap<String, LoadedParam>>> {
        match self.questions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Starts every filter parameter of `question_id` and returns their event
    /// streams keyed by parameter id. Parameters already loaded for the
    /// question are unloaded first. If any parameter fails to start, the ones
    /// already started are unloaded again and the error is returned.
    pub fn load_question(
        &self,
        question_id: &str,
        params: &[ParamSpec],
        visible_groups: &[String],
    ) -> Result<HashMap<String, UnboundedReceiver<ParamEvent>>> {
        self.unload_question(question_id);

        let mut loaded: BTreeMap<String, LoadedParam> = BTreeMap::new();
        let mut receivers = HashMap::new();
        for spec in params {
            let visible = visible_groups.contains(&spec.group);
            let started = FilterParamInstance::start(
                question_id,
                spec,
                visible,
                self.config.clone(),
                Arc::clone(&self.service),
                self.caches.clone(),
            );
            let (instance, events) = match started {
                Ok(started) => started,
                Err(err) => {
                    for param in loaded.values() {
                        param.instance.unload();
                    }
                    return Err(err);
                }
            };
            let replaced = loaded.insert(
                spec.parameter_id.clone(),
                LoadedParam {
                    group: spec.group.clone(),
                    instance,
                },
            );
            if let Some(replaced) = replaced {
                debug!(question_id, parameter = %spec.parameter_id, "duplicate parameter id; keeping the last");
                replaced.instance.unload();
            }
            receivers.insert(spec.parameter_id.clone(), events);
        }

        info!(question_id, params = loaded.len(), "question filter parameters loaded");
        self.lock().insert(question_id.to_string(), loaded);
        Ok(receivers)
    }

    pub fn instance(&self, question_id: &str, parameter_id: &str) -> Result<FilterParamInstance> {
        let questions = self.lock();
        let params = questions
            .get(question_id)
            .ok_or_else(|| SyncError::UnknownQuestion(question_id.to_string()))?;
        params
            .get(parameter_id)
            .map(|param| param.instance.clone())
            .ok_or_else(|| SyncError::UnknownParameter {
                question_id: question_id.to_string(),
                parameter_id: parameter_id.to_string(),
            })
    }

    /// Shows or hides `group`, returning how many parameters it holds.
    pub fn change_group_visibility(&self, question_id: &str, group: &str, visible: bool) -> Result<usize> {
        let instances: Vec<FilterParamInstance> = {
            let questions = self.lock();
            let params = questions
                .get(question_id)
                .ok_or_else(|| SyncError::UnknownQuestion(question_id.to_string()))?;
            params
                .values()
                .filter(|param| param.group == group)
                .map(|param| param.instance.clone())
                .collect()
        };
        for instance in &instances {
            instance.set_group_visible(visible)?;
        }
        debug!(question_id, group, visible, params = instances.len(), "group visibility changed");
        Ok(instances.len())
    }

    /// Forwards upstream changes to the named parameters. Every parameter id is
    /// checked before any update is applied.
    pub fn dependent_params_updated(&self, question_id: &str, updates: &[DependencyUpdate]) -> Result<()> {
        let targets = updates
            .iter()
            .map(|update| {
                self.instance(question_id, &update.parameter_id)
                    .map(|instance| (instance, update))
            })
            .collect::<Result<Vec<_>>>()?;
        for (instance, update) in targets {
            instance.dependency_updated(update.fields.as_deref(), &update.retained)?;
        }
        Ok(())
    }

    /// Unloads every parameter of the question. Returns whether it was loaded.
    pub fn unload_question(&self, question_id: &str) -> bool {
        let Some(params) = self.lock().remove(question_id) else {
            return false;
        };
        for param in params.values() {
            param.instance.unload();
        }
        info!(question_id, "question filter parameters unloaded");
        true
    }

    pub fn loaded_questions(&self) -> Vec<String> {
        let mut questions: Vec<String> = self.lock().keys().cloned().collect();
        questions.sort();
        questions
    }
}
