use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::errors::GenerationError;
use crate::provider::GenerationService;
use crate::request::{Generation, RepairRequest};
use crate::usage::UsageTracker;

/// Bounded in-memory cache of generated text keyed by request digest.
///
/// When full, the oldest entry is evicted.
#[derive(Debug)]
pub struct ResponseCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, String>,
    order: VecDeque<String>,
}

impl ResponseCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Stable digest of a request's content.
    pub fn key_for(request: &RepairRequest) -> String {
        let bytes = serde_json::to_vec(request).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.state.lock().entries.get(key).cloned()
    }

    pub fn insert(&self, key: String, value: String) {
        if self.capacity == 0 {
            return;
        }
        let mut state = self.state.lock();
        if state.entries.insert(key.clone(), value).is_some() {
            return;
        }
        state.order.push_back(key);
        while state.order.len() > self.capacity {
            if let Some(oldest) = state.order.pop_front() {
                state.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Decorator that serves repeated requests from a [`ResponseCache`] and
/// records usage for every request.
pub struct CachedGenerationService {
    inner: Arc<dyn GenerationService>,
    cache: Arc<ResponseCache>,
    usage: Arc<UsageTracker>,
}

impl CachedGenerationService {
    pub fn new(
        inner: Arc<dyn GenerationService>,
        cache: Arc<ResponseCache>,
        usage: Arc<UsageTracker>,
    ) -> Self {
        Self {
            inner,
            cache,
            usage,
        }
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

#[async_trait]
impl GenerationService for CachedGenerationService {
    async fn generate(&self, request: &RepairRequest) -> Result<Generation, GenerationError> {
        let key = ResponseCache::key_for(request);
        if let Some(text) = self.cache.get(&key) {
            debug!(provider = self.inner.name(), key = %&key[..12], "generation cache hit");
            self.usage.record_cache_hit();
            return Ok(Generation::text(text));
        }

        let generation = self.inner.generate(request).await?;
        self.usage.record(request, &generation);
        self.cache.insert(key, generation.text.clone());
        Ok(generation)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
