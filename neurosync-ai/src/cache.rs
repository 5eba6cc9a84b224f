use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::provider::{ProviderPayload, ProviderRequest, ResponseShape};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    shape: ResponseShape,
    system: String,
    prompt: String,
}

impl CacheKey {
    fn of(req: &ProviderRequest) -> Self {
        Self {
            shape: req.shape,
            system: req.system.clone(),
            prompt: req.prompt.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    stored_at: Instant,
    provider: String,
    payload: ProviderPayload,
}

/// In-memory completion cache owned by one gateway.
///
/// Expired entries are swept on every insert, and at most `max_entries`
/// are held; the oldest goes first when full.
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    max_entries: usize,
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Returns `(provider, payload)` for a live entry. Expired entries are evicted.
    pub fn get(&self, req: &ProviderRequest, now: Instant) -> Option<(String, ProviderPayload)> {
        let key = CacheKey::of(req);
        let mut map = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        let fresh = match map.get(&key) {
            Some(e) => now.saturating_duration_since(e.stored_at) < self.ttl,
            None => return None,
        };
        if !fresh {
            map.remove(&key);
            return None;
        }
        map.get(&key).map(|e| (e.provider.clone(), e.payload.clone()))
    }

    pub fn put(
        &self,
        req: &ProviderRequest,
        provider: &str,
        payload: &ProviderPayload,
        now: Instant,
    ) {
        let key = CacheKey::of(req);
        let mut map = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        map.retain(|_, e| now.saturating_duration_since(e.stored_at) < self.ttl);
        while map.len() >= self.max_entries && !map.contains_key(&key) {
            let oldest = map.iter().min_by_key(|(_, e)| e.stored_at).map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    map.remove(&k);
                }
                None => break,
            }
        }
        map.insert(
            key,
            Entry {
                stored_at: now,
                provider: provider.to_string(),
                payload: payload.clone(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
