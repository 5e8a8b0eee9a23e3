//! Bounded pool of warm engine instances keyed by schema.
//!
//! Every instance handed out is logically fresh: a reused instance is reset
//! and reseeded on acquire, never trusted in the state its last user left.
//! Idle instances are reused LIFO so the most recently active one goes first.

use crate::engine::instance::EngineInstance;
use crate::errors::GymError;
use crate::model::{PoolSettings, SchemaId};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub struct InstancePool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    settings: PoolSettings,
    state: Mutex<PoolState>,
    next_id: AtomicU64,
}

#[derive(Default)]
struct PoolState {
    idle: HashMap<SchemaId, Vec<EngineInstance>>,
    /// Idle plus checked out (including slots whose engine is still starting).
    total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub total_instances: usize,
    pub max_total_instances: usize,
    pub idle: BTreeMap<SchemaId, usize>,
}

impl PoolStats {
    pub fn idle_total(&self) -> usize {
        self.idle.values().sum()
    }
}

enum Checkout {
    Reused(PooledInstance),
    Fresh(Reservation),
}

impl InstancePool {
    pub fn new(settings: PoolSettings) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                settings,
                state: Mutex::new(PoolState::default()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.inner.settings
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        // bookkeeping stays consistent even if a holder panicked
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check out a freshly seeded instance for `schema`.
    ///
    /// Capacity is claimed synchronously on the first poll; the engine work
    /// (open or reset, then seed) runs on the blocking pool. If the caller
    /// stops awaiting, the lease is still released when that work finishes.
    pub async fn acquire(&self, schema: SchemaId) -> Result<PooledInstance, GymError> {
        let checkout = self.checkout(schema)?;
        tokio::task::spawn_blocking(move || prepare(checkout, schema)).await?
    }

    /// Blocking variant of [`acquire`](Self::acquire) for synchronous callers.
    pub fn acquire_blocking(&self, schema: SchemaId) -> Result<PooledInstance, GymError> {
        let checkout = self.checkout(schema)?;
        prepare(checkout, schema)
    }

    fn checkout(&self, schema: SchemaId) -> Result<Checkout, GymError> {
        let mut state = self.lock();
        if let Some(instance) = state.idle.get_mut(&schema).and_then(Vec::pop) {
            return Ok(Checkout::Reused(PooledInstance::new(self.clone(), schema, instance)));
        }

        let max = self.inner.settings.max_total_instances;
        if state.total >= max {
            tracing::warn!(
                event = "pool.exhausted",
                schema = %schema,
                total = state.total,
                max = max,
                "instance pool exhausted"
            );
            return Err(GymError::PoolExhausted { max });
        }

        state.total += 1;
        Ok(Checkout::Fresh(Reservation {
            pool: self.clone(),
            committed: false,
        }))
    }

    /// Put an instance back, or close it when the idle stack is full.
    ///
    /// Close failures are logged and swallowed.
    pub fn release(&self, schema: SchemaId, instance: EngineInstance) {
        let evicted = {
            let mut state = self.lock();
            let stack = state.idle.entry(schema).or_default();
            if stack.len() < self.inner.settings.max_pool_size {
                stack.push(instance);
                None
            } else {
                state.total = state.total.saturating_sub(1);
                Some(instance)
            }
        };

        if let Some(instance) = evicted {
            tracing::debug!(event = "pool.evicted", schema = %schema, instance = instance.id());
            close_logged(instance);
        }
    }

    /// Close an instance that must not be reused and free its slot.
    fn discard(&self, instance: EngineInstance) {
        {
            let mut state = self.lock();
            state.total = state.total.saturating_sub(1);
        }
        close_logged(instance);
    }

    fn forget_slot(&self) {
        let mut state = self.lock();
        state.total = state.total.saturating_sub(1);
    }

    /// Close every idle instance and clear the pool. Meant for shutdown.
    ///
    /// Leases still checked out keep their slot until dropped; the count of
    /// such leases is returned and logged.
    pub fn drain_all(&self) -> usize {
        let drained: Vec<EngineInstance> = {
            let mut state = self.lock();
            let drained: Vec<EngineInstance> = state
                .idle
                .drain()
                .flat_map(|(_, stack)| stack)
                .collect();
            state.total = state.total.saturating_sub(drained.len());
            drained
        };

        let closed = drained.len();
        for instance in drained {
            close_logged(instance);
        }

        let outstanding = self.lock().total;
        if outstanding > 0 {
            tracing::warn!(
                event = "pool.drained",
                closed = closed,
                outstanding = outstanding,
                "pool drained with leases still checked out"
            );
        } else {
            tracing::info!(event = "pool.drained", closed = closed);
        }
        outstanding
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.lock();
        PoolStats {
            total_instances: state.total,
            max_total_instances: self.inner.settings.max_total_instances,
            idle: state
                .idle
                .iter()
                .map(|(schema, stack)| (*schema, stack.len()))
                .collect(),
        }
    }

    fn next_id(&self) -> u64 {
        self.inner.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

fn close_logged(instance: EngineInstance) {
    let id = instance.id();
    if let Err(e) = instance.close() {
        tracing::warn!(
            event = "pool.release_close_failed",
            instance = id,
            error = %e,
            "failed to close engine instance"
        );
    }
}

/// Turn a checkout into a ready lease: open or reset, then seed.
///
/// On failure the instance is closed and its slot freed before returning.
fn prepare(checkout: Checkout, schema: SchemaId) -> Result<PooledInstance, GymError> {
    let (mut lease, reused) = match checkout {
        Checkout::Reused(lease) => (lease, true),
        Checkout::Fresh(reservation) => {
            let id = reservation.pool.next_id();
            let instance = EngineInstance::open(id)?;
            tracing::debug!(event = "pool.instance_created", schema = %schema, instance = id);
            (reservation.fill(schema, instance), false)
        }
    };

    let refreshed = {
        let instance = lease.instance_mut();
        if reused {
            instance.reset().and_then(|_| instance.seed(schema))
        } else {
            instance.seed(schema)
        }
    };

    match refreshed {
        Ok(()) => Ok(lease),
        Err(e) => {
            lease.discard();
            Err(e)
        }
    }
}

/// A counted slot whose engine has not been opened yet.
///
/// Dropping it unfilled gives the slot back.
struct Reservation {
    pool: InstancePool,
    committed: bool,
}

impl Reservation {
    fn fill(mut self, schema: SchemaId, instance: EngineInstance) -> PooledInstance {
        self.committed = true;
        PooledInstance::new(self.pool.clone(), schema, instance)
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if !self.committed {
            self.pool.forget_slot();
        }
    }
}

/// A checked-out instance. Returned to the pool when dropped.
pub struct PooledInstance {
    pool: InstancePool,
    schema: SchemaId,
    instance: Option<EngineInstance>,
}

impl PooledInstance {
    fn new(pool: InstancePool, schema: SchemaId, instance: EngineInstance) -> Self {
        Self {
            pool,
            schema,
            instance: Some(instance),
        }
    }

    fn instance_mut(&mut self) -> &mut EngineInstance {
        self.instance
            .as_mut()
            .expect("pooled instance used after release")
    }

    /// Close instead of returning to the pool.
    pub fn discard(mut self) {
        if let Some(instance) = self.instance.take() {
            self.pool.discard(instance);
        }
    }
}

impl std::fmt::Debug for PooledInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledInstance")
            .field("schema", &self.schema)
            .field("instance", &self.instance)
            .finish()
    }
}

impl std::ops::Deref for PooledInstance {
    type Target = EngineInstance;

    fn deref(&self) -> &EngineInstance {
        self.instance
            .as_ref()
            .expect("pooled instance used after release")
    }
}

impl Drop for PooledInstance {
    fn drop(&mut self) {
        if let Some(instance) = self.instance.take() {
            self.pool.release(self.schema, instance);
        }
    }
}
