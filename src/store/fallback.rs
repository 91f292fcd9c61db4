//! Store wrapper that degrades to memory on failure
//!
//! The first failing call logs a warning and flips the wrapper into
//! memory-only mode for the rest of its lifetime. Every write is mirrored
//! into the shadow, so values written before the failure remain readable.

use crate::metrics::recorder;
use crate::store::error::{StoreError, StoreResult};
use crate::store::memory::MemoryStore;
use crate::store::types::KeyValueStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct FallbackStore {
    name: &'static str,
    inner: Arc<dyn KeyValueStore>,
    shadow: MemoryStore,
    degraded: AtomicBool,
}

impl FallbackStore {
    pub fn new(name: &'static str, inner: Arc<dyn KeyValueStore>) -> Self {
        Self {
            name,
            inner,
            shadow: MemoryStore::new(),
            degraded: AtomicBool::new(false),
        }
    }

    /// True once the inner store has failed
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    fn degrade(&self, op: &str, key: &str, err: &StoreError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            tracing::warn!(
                store = self.name,
                op,
                key,
                error = %err,
                "Store unavailable, continuing in memory for this session"
            );
            recorder::record_store_degraded(self.name);
        }
    }
}

impl KeyValueStore for FallbackStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        if !self.is_degraded() {
            match self.inner.get(key) {
                Ok(value) => {
                    if let Some(ref v) = value {
                        self.shadow.set(key, v)?;
                    }
                    return Ok(value);
                }
                Err(e) => self.degrade("get", key, &e),
            }
        }
        self.shadow.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.shadow.set(key, value)?;
        if !self.is_degraded() {
            if let Err(e) = self.inner.set(key, value) {
                self.degrade("set", key, &e);
            }
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.shadow.remove(key)?;
        if !self.is_degraded() {
            if let Err(e) = self.inner.remove(key) {
                self.degrade("remove", key, &e);
            }
        }
        Ok(())
    }
}
