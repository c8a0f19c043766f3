//! Offscreen target pool
//!
//! Layer targets are expensive to allocate, so they are recycled across
//! layers and frames keyed by size and format.

use rustc_hash::FxHashMap;

use crate::backend::{Backend, TargetFormat, TargetId, TargetSize};
use crate::error::BackendError;

type PoolKey = (TargetSize, TargetFormat);

/// Pool usage counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TargetPoolStats {
    /// Acquisitions served from the free list
    pub hits: u64,
    /// Acquisitions that allocated a new target
    pub misses: u64,
    /// Targets currently handed out
    pub live: usize,
    /// Targets waiting in the free list
    pub pooled: usize,
}

impl TargetPoolStats {
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        }
    }
}

/// Free list of backend targets
#[derive(Debug, Default)]
pub struct TargetPool {
    free: FxHashMap<PoolKey, Vec<TargetId>>,
    /// Key of every target this pool created and still owns
    owned: FxHashMap<TargetId, PoolKey>,
    hits: u64,
    misses: u64,
    live: usize,
}

impl TargetPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a pooled target of this size and format, or create one
    pub fn acquire(
        &mut self,
        backend: &mut dyn Backend,
        size: TargetSize,
        format: TargetFormat,
    ) -> Result<TargetId, BackendError> {
        let key = (size, format);
        if let Some(id) = self.free.get_mut(&key).and_then(Vec::pop) {
            self.hits += 1;
            self.live += 1;
            return Ok(id);
        }

        let id = backend.create_target(size, format)?;
        self.misses += 1;
        self.live += 1;
        self.owned.insert(id, key);
        tracing::trace!(?id, width = size.width, height = size.height, "render target created");
        Ok(id)
    }

    /// Return a target to the free list.
    ///
    /// Ids this pool did not create are ignored.
    pub fn release(&mut self, id: TargetId) {
        let Some(key) = self.owned.get(&id).copied() else {
            tracing::debug!(?id, "released a target the pool does not own");
            return;
        };
        let free = self.free.entry(key).or_default();
        if free.contains(&id) {
            return;
        }
        free.push(id);
        self.live = self.live.saturating_sub(1);
    }

    /// Destroy every pooled target; handed-out targets are kept.
    ///
    /// A target leaves the pool only once the backend destroyed it, so a
    /// failure keeps the rest pooled.
    pub fn trim(&mut self, backend: &mut dyn Backend) -> Result<usize, BackendError> {
        let mut destroyed = 0;
        for ids in self.free.values_mut() {
            while let Some(&id) = ids.last() {
                backend.destroy_target(id)?;
                ids.pop();
                self.owned.remove(&id);
                destroyed += 1;
            }
        }
        self.free.retain(|_, ids| !ids.is_empty());
        if destroyed > 0 {
            tracing::debug!(destroyed, "render target pool trimmed");
        }
        Ok(destroyed)
    }

    /// Destroy every target the pool owns and reset the counters
    pub fn clear(&mut self, backend: &mut dyn Backend) -> Result<(), BackendError> {
        let owned: Vec<TargetId> = self.owned.keys().copied().collect();
        for id in owned {
            backend.destroy_target(id)?;
            if let Some(key) = self.owned.remove(&id) {
                if let Some(ids) = self.free.get_mut(&key) {
                    ids.retain(|pooled| *pooled != id);
                }
            }
        }
        self.free.clear();
        self.hits = 0;
        self.misses = 0;
        self.live = 0;
        Ok(())
    }

    pub fn stats(&self) -> TargetPoolStats {
        TargetPoolStats {
            hits: self.hits,
            misses: self.misses,
            live: self.live,
            pooled: self.free.values().map(Vec::len).sum(),
        }
    }
}
