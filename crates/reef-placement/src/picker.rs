//! Per-archetype pools of pending instances.
//!
//! Pending instances are spawned but inactive and detached. Placing one
//! moves it out of its pool; an empty pool gets a fresh instance the next
//! time the placer draws from it.

use std::collections::VecDeque;

use tracing::warn;

use crate::{BeingArchetype, BeingHost, InstanceHandle};

#[derive(Debug, Default)]
pub struct Picker {
    pools: Vec<VecDeque<InstanceHandle>>,
}

impl Picker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pools, one per archetype once laid out.
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Pending instances in the pool at `index`, 0 for an unknown index.
    pub fn pool_len(&self, index: usize) -> usize {
        self.pools.get(index).map_or(0, VecDeque::len)
    }

    /// Total pending instances across all pools.
    pub fn pending_count(&self) -> usize {
        self.pools.iter().map(VecDeque::len).sum()
    }

    /// Make sure there is exactly one pool per archetype. Pools are rebuilt
    /// from scratch when the count changed or `force` is set.
    pub fn ensure_layout<H: BeingHost>(
        &mut self,
        archetype_count: usize,
        force: bool,
        host: &mut H,
    ) {
        if self.pools.len() != archetype_count || force {
            self.clear(host);
            self.pools = vec![VecDeque::new(); archetype_count];
        }
    }

    /// Spawn one pending instance into every empty pool.
    pub fn refill<H: BeingHost>(&mut self, catalogue: &[BeingArchetype], host: &mut H) {
        for (pool, archetype) in self.pools.iter_mut().zip(catalogue) {
            pool.retain(|&h| host.is_alive(h));
            if !pool.is_empty() {
                continue;
            }
            match host.spawn(archetype) {
                Some(handle) => {
                    host.set_active(handle, false);
                    pool.push_back(handle);
                }
                None => warn!("Host could not spawn a '{}' instance", archetype.id),
            }
        }
    }

    /// Return a live instance to the pool at `index`, hiding and detaching it.
    pub fn add<H: BeingHost>(&mut self, index: usize, handle: InstanceHandle, host: &mut H) {
        let Some(pool) = self.pools.get_mut(index) else {
            return;
        };
        host.detach(handle);
        host.set_active(handle, false);
        pool.push_back(handle);
    }

    pub fn front(&self, index: usize) -> Option<InstanceHandle> {
        self.pools.get(index).and_then(|p| p.front().copied())
    }

    pub fn take_front(&mut self, index: usize) -> Option<InstanceHandle> {
        self.pools.get_mut(index)?.pop_front()
    }

    /// Remove `handle` from whichever pool holds it.
    pub fn take(&mut self, handle: InstanceHandle) -> bool {
        for pool in &mut self.pools {
            if let Some(pos) = pool.iter().position(|&h| h == handle) {
                pool.remove(pos);
                return true;
            }
        }
        false
    }

    /// Destroy every pending instance and empty the pools.
    pub fn clear<H: BeingHost>(&mut self, host: &mut H) {
        for pool in &mut self.pools {
            for handle in pool.drain(..).rev() {
                if host.is_alive(handle) {
                    host.destroy(handle);
                }
            }
        }
    }

    /// Forget every pending instance without destroying it.
    pub fn release(&mut self) {
        for pool in &mut self.pools {
            pool.clear();
        }
    }
}
