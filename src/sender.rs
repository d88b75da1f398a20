//! Transport abstraction shared by the UDP, TCP and HTTP senders.

use std::io;

use thiserror::Error;

use crate::{pool::PoolError, tls::CertificateError};

/// Errors surfaced by [`GelfSender::send`].
#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("TLS handshake failed: {0}")]
    Tls(String),
    #[error("certificate rejected: {0}")]
    Certificate(#[from] CertificateError),
    /// The collector answered with a client error; not retried.
    #[error("HTTP request failed with status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("payload needs {count} chunks; at most {max} are allowed")]
    TooManyChunks { count: usize, max: usize },
    #[error("compression failed: {0}")]
    Compression(io::Error),
    #[error("sender is closed")]
    Closed,
}

/// A transport delivering already-encoded GELF payloads.
///
/// Implementations are internally synchronized; `send` may be called from
/// any thread, concurrently with `close`.
pub trait GelfSender: Send + Sync {
    /// Deliver one encoded message. Compression, framing and retries are
    /// the sender's concern.
    fn send(&self, payload: &[u8]) -> Result<(), SendError>;

    /// Release transport resources. Idempotent; later sends fail.
    fn close(&self);
}

impl<S: GelfSender + ?Sized> GelfSender for Box<S> {
    fn send(&self, payload: &[u8]) -> Result<(), SendError> {
        (**self).send(payload)
    }

    fn close(&self) {
        (**self).close()
    }
}
