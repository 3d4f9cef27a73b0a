//! Bounded query embedding cache with TTL.
//!
//! Chat traffic repeats the same handful of questions; caching their
//! embeddings skips a model forward pass. Defaults: 1000 entries, 1 hour.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use ndarray::Array1;
use parking_lot::Mutex;
use serde::Serialize;

struct Slot {
    embedding: Array1<f32>,
    inserted_at: Instant,
    last_used: u64,
}

/// Hit/miss counters, reported by the health endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Thread-safe least-recently-used embedding cache.
pub struct EmbeddingCache {
    inner: Mutex<Inner>,
    capacity: usize,
    ttl: Duration,
}

struct Inner {
    slots: HashMap<String, Slot>,
    tick: u64,
    hits: u64,
    misses: u64,
}

impl Inner {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .slots
            .iter()
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.slots.remove(&key);
        }
    }
}

impl EmbeddingCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: HashMap::with_capacity(capacity.min(4096)),
                tick: 0,
                hits: 0,
                misses: 0,
            }),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Look up `text`. Expired entries count as misses and are dropped.
    pub fn get(&self, text: &str) -> Option<Array1<f32>> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let tick = inner.next_tick();

        let expired = inner
            .slots
            .get(text)
            .map(|slot| slot.inserted_at.elapsed() >= self.ttl);
        if expired == Some(true) {
            inner.slots.remove(text);
        }

        let fresh = inner.slots.get_mut(text).map(|slot| {
            slot.last_used = tick;
            slot.embedding.clone()
        });

        match fresh {
            Some(_) => inner.hits += 1,
            None => inner.misses += 1,
        }
        fresh
    }

    /// Store an embedding, evicting the least recently used entry when full.
    pub fn insert(&self, text: &str, embedding: Array1<f32>) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let tick = inner.next_tick();

        if !inner.slots.contains_key(text) && inner.slots.len() >= self.capacity {
            inner.evict_lru();
        }
        inner.slots.insert(
            text.to_string(),
            Slot {
                embedding,
                inserted_at: Instant::now(),
                last_used: tick,
            },
        );
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entries: inner.slots.len(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(1000, Duration::from_secs(3600))
    }
}
