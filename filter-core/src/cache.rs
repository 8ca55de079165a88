use crate::error::Result;
use crate::model::Field;
use crate::ontology::OntologyNode;
use crate::ontology::TreeOptions;
use crate::ontology::build_tree;
use crate::ontology::fingerprint;
use crate::param_value::ParsedFilters;
use crate::param_value::parse_param_value;
use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(32) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

struct Memo<K: Hash + Eq, V> {
    entries: Mutex<LruCache<K, Arc<V>>>,
}

impl<K: Hash + Eq, V> Memo<K, V> {
    fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<K, Arc<V>>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Bounded memo of parsed parameter values keyed by the raw stored text.
pub struct ParamValueCache {
    memo: Memo<String, ParsedFilters>,
}

impl ParamValueCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            memo: Memo::new(capacity),
        }
    }

    pub fn parse(&self, raw: &str) -> Arc<ParsedFilters> {
        if let Some(hit) = self.memo.lock().get(raw) {
            return Arc::clone(hit);
        }
        let parsed = Arc::new(parse_param_value(raw));
        self.memo.lock().put(raw.to_string(), Arc::clone(&parsed));
        parsed
    }

    pub fn len(&self) -> usize {
        self.memo.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ParamValueCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Bounded memo of built trees keyed by field-list fingerprint and options.
pub struct OntologyCache {
    memo: Memo<(String, TreeOptions), OntologyNode>,
}

impl OntologyCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            memo: Memo::new(capacity),
        }
    }

    pub fn get_or_build(&self, fields: &[Field], options: TreeOptions) -> Result<Arc<OntologyNode>> {
        let key = (fingerprint(fields), options);
        if let Some(hit) = self.memo.lock().get(&key) {
            return Ok(Arc::clone(hit));
        }
        let tree = Arc::new(build_tree(fields, options)?);
        self.memo.lock().put(key, Arc::clone(&tree));
        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.memo.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OntologyCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
