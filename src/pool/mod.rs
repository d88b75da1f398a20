//! Bounded object pool with lifetime and idle eviction.
//!
//! Capacity is a bounded channel holding exactly `pool_size` slots. A slot
//! is either empty (no resource created yet, or the previous one was
//! discarded) or an idle resource. Borrowing takes a slot out of the
//! channel, so the number of live resources can never exceed the pool
//! size. Slots are reused in FIFO order.

use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use log::debug;
use parking_lot::Mutex;
use thiserror::Error;

use crate::builders::{ConfigError, ensure_positive};

#[cfg(test)]
mod tests;

pub const DEFAULT_POOL_SIZE: usize = 2;
pub const DEFAULT_POOL_MAX_WAIT: Duration = Duration::from_secs(5);
pub const DEFAULT_POOL_MAX_LIFETIME: Duration = Duration::from_secs(60);

/// Errors raised by [`SimpleObjectPool::borrow_object`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("couldn't acquire connection from pool")]
    Exhausted,
    #[error("pool is closed")]
    Closed,
}

/// Pool sizing and eviction settings. `None` disables a limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    pub pool_size: usize,
    /// Longest a borrower blocks for a free slot.
    pub max_wait: Option<Duration>,
    /// Resources older than this are discarded on return or borrow.
    pub max_lifetime: Option<Duration>,
    /// Resources idle longer than this are discarded on borrow.
    pub max_idle: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            max_wait: Some(DEFAULT_POOL_MAX_WAIT),
            max_lifetime: Some(DEFAULT_POOL_MAX_LIFETIME),
            max_idle: None,
        }
    }
}

struct Entry<T> {
    resource: T,
    created: Instant,
    last_returned: Instant,
}

type Slot<T> = Option<Entry<T>>;

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// Thread-safe pool of lazily created resources.
pub struct SimpleObjectPool<T> {
    factory: Factory<T>,
    config: PoolConfig,
    slots_tx: Mutex<Option<Sender<Slot<T>>>>,
    slots_rx: Receiver<Slot<T>>,
    closed: AtomicBool,
}

impl<T> SimpleObjectPool<T> {
    pub fn new<F>(factory: F, config: PoolConfig) -> Result<Self, ConfigError>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        ensure_positive!(config.pool_size, "pool_size")?;
        let (tx, rx) = bounded(config.pool_size);
        for _ in 0..config.pool_size {
            tx.send(None)
                .map_err(|_| ConfigError::InvalidConfig("pool channel disconnected".into()))?;
        }
        Ok(Self {
            factory: Box::new(factory),
            config,
            slots_tx: Mutex::new(Some(tx)),
            slots_rx: rx,
            closed: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Take a resource, creating one if the slot is empty or its resource
    /// has expired. Blocks up to `max_wait` for a free slot.
    pub fn borrow_object(&self) -> Result<PooledObject<'_, T>, PoolError> {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }
        let slot = match self.config.max_wait {
            Some(wait) => self.slots_rx.recv_timeout(wait).map_err(|err| match err {
                RecvTimeoutError::Timeout => PoolError::Exhausted,
                RecvTimeoutError::Disconnected => PoolError::Closed,
            })?,
            None => self.slots_rx.recv().map_err(|_| PoolError::Closed)?,
        };
        if self.is_closed() {
            return Err(PoolError::Closed);
        }
        let entry = match slot {
            Some(entry) if !self.is_expired(&entry) => entry,
            stale => {
                if stale.is_some() {
                    debug!("discarding expired pooled object");
                }
                self.create()
            }
        };
        Ok(PooledObject {
            pool: self,
            entry: Some(entry),
        })
    }

    /// Hand a resource back for reuse. Resources past their lifetime are
    /// discarded instead.
    pub fn return_object(&self, mut obj: PooledObject<'_, T>) {
        debug_assert!(std::ptr::eq(obj.pool, self), "object returned to foreign pool");
        let Some(mut entry) = obj.entry.take() else {
            return;
        };
        if self.lifetime_exceeded(&entry) {
            debug!("discarding pooled object past its lifetime");
            self.release(None);
        } else {
            entry.last_returned = Instant::now();
            self.release(Some(entry));
        }
    }

    /// Discard a resource and free its slot.
    pub fn invalidate_object(&self, obj: PooledObject<'_, T>) {
        debug_assert!(std::ptr::eq(obj.pool, self), "object invalidated in foreign pool");
        drop(obj);
    }

    /// Borrow, run `action`, then return on success or invalidate on error.
    pub fn execute<R, E>(&self, action: impl FnOnce(&mut T) -> Result<R, E>) -> Result<R, E>
    where
        E: From<PoolError>,
    {
        let mut obj = self.borrow_object()?;
        match action(&mut obj) {
            Ok(value) => {
                self.return_object(obj);
                Ok(value)
            }
            Err(err) => {
                self.invalidate_object(obj);
                Err(err)
            }
        }
    }

    /// Close idle resources and reject further borrows. Borrowers blocked
    /// on a slot wake with [`PoolError::Closed`]. Objects returned after
    /// closing are dropped. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        let tx = self.slots_tx.lock().take();
        if tx.is_none() {
            return;
        }
        drop(tx);
        let drained = self.slots_rx.try_iter().flatten().count();
        debug!("pool closed; released {drained} idle objects");
    }

    fn create(&self) -> Entry<T> {
        let now = Instant::now();
        Entry {
            resource: (self.factory)(),
            created: now,
            last_returned: now,
        }
    }

    fn release(&self, slot: Slot<T>) {
        let guard = self.slots_tx.lock();
        if let Some(tx) = guard.as_ref() {
            // Capacity equals the number of slots in circulation.
            let _ = tx.try_send(slot);
        }
    }

    fn lifetime_exceeded(&self, entry: &Entry<T>) -> bool {
        exceeds(entry.created, self.config.max_lifetime)
    }

    fn is_expired(&self, entry: &Entry<T>) -> bool {
        self.lifetime_exceeded(entry) || exceeds(entry.last_returned, self.config.max_idle)
    }
}

fn exceeds(since: Instant, limit: Option<Duration>) -> bool {
    limit.is_some_and(|limit| since.elapsed() > limit)
}

impl<T> Drop for SimpleObjectPool<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T> fmt::Debug for SimpleObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleObjectPool")
            .field("config", &self.config)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// A borrowed resource. Dropping it without returning it to the pool
/// invalidates it.
pub struct PooledObject<'a, T> {
    pool: &'a SimpleObjectPool<T>,
    entry: Option<Entry<T>>,
}

impl<T> PooledObject<'_, T> {
    /// When the underlying resource was created.
    pub fn created(&self) -> Option<Instant> {
        self.entry.as_ref().map(|entry| entry.created)
    }
}

impl<T> Deref for PooledObject<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.entry {
            Some(entry) => &entry.resource,
            None => unreachable!("pooled object accessed after release"),
        }
    }
}

impl<T> DerefMut for PooledObject<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.entry {
            Some(entry) => &mut entry.resource,
            None => unreachable!("pooled object accessed after release"),
        }
    }
}

impl<T> Drop for PooledObject<'_, T> {
    fn drop(&mut self) {
        if self.entry.take().is_some() {
            self.pool.release(None);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PooledObject<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PooledObject").field(&**self).finish()
    }
}
