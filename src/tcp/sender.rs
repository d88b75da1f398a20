//! Pooled GELF TCP/TLS sender.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use log::debug;

use super::connection::{ConnectionSettings, TcpConnection};
use crate::{
    builders::ConfigError,
    pool::{PoolConfig, PoolError, SimpleObjectPool},
    resolver::AddressResolver,
    retry::{Interrupt, RetryPolicy, retry},
    sender::{GelfSender, SendError},
};

/// Sends null-delimited GELF frames over a pool of TCP or TLS connections.
///
/// A failed write invalidates its connection and the send is retried on a
/// fresh one, up to the configured number of retries.
#[derive(Debug)]
pub struct GelfTcpSender {
    pool: SimpleObjectPool<TcpConnection>,
    retry: RetryPolicy,
    interrupt: Interrupt,
    closed: AtomicBool,
}

impl GelfTcpSender {
    pub(crate) fn new(
        resolver: AddressResolver,
        settings: ConnectionSettings,
        pool: PoolConfig,
        retry: RetryPolicy,
    ) -> Result<Self, ConfigError> {
        let resolver = Arc::new(resolver);
        let settings = Arc::new(settings);
        let pool = SimpleObjectPool::new(
            move || TcpConnection::new(Arc::clone(&resolver), Arc::clone(&settings)),
            pool,
        )?;
        Ok(Self {
            pool,
            retry,
            interrupt: Interrupt::new(),
            closed: AtomicBool::new(false),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn pool_config(&self) -> &PoolConfig {
        self.pool.config()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }
}

impl GelfSender for GelfTcpSender {
    fn send(&self, payload: &[u8]) -> Result<(), SendError> {
        if self.is_closed() {
            return Err(SendError::Closed);
        }
        retry(
            || self.pool.execute(|conn| conn.write(payload)),
            || !self.is_closed(),
            self.retry,
            &self.interrupt,
        )
        .map_err(|err| match err {
            SendError::Pool(PoolError::Closed) => SendError::Closed,
            other => other,
        })
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.interrupt.interrupt();
        self.pool.close();
        debug!("GELF TCP sender closed");
    }
}
