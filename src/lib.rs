//! Deliver structured log events to a Graylog-compatible collector using
//! GELF 1.1 over UDP, TCP, TLS-wrapped TCP or HTTP.
//!
//! A [`GelfAppender`] pairs a [`GelfEncoder`] with one of the senders built
//! by [`UdpSenderBuilder`], [`TcpSenderBuilder`] or [`HttpSenderBuilder`].

pub mod appender;
pub mod builders;
pub mod compression;
pub mod encoder;
pub mod event;
pub mod http;
pub mod level;
pub mod pool;
pub mod rate_limited_warner;
pub mod resolver;
pub mod retry;
pub mod sender;
pub mod tcp;
pub mod tls;
pub mod udp;

#[cfg(test)]
mod test_utils;

pub use appender::GelfAppender;
pub use builders::{
    ConfigError, DEFAULT_GELF_PORT, HttpAuth, HttpSenderBuilder, SenderBuilderTrait,
    TcpSenderBuilder, UdpSenderBuilder,
};
pub use compression::Compression;
pub use encoder::{
    AdditionalFields, EncoderConfig, FieldError, FieldMapper, FieldValue, GelfEncoder, GelfMessage,
};
pub use event::{CallerData, EventMetadata, ExceptionInfo, GelfEvent, Marker};
pub use http::GelfHttpSender;
pub use level::GelfLevel;
pub use pool::{PoolConfig, PoolError, PooledObject, SimpleObjectPool};
pub use retry::{Interrupt, RetryPolicy, retry, retry_if};
pub use sender::{GelfSender, SendError};
pub use tcp::GelfTcpSender;
pub use tls::{CertificateError, TrustManager, verify_hostname};
pub use udp::{GelfUdpChunker, GelfUdpSender, MessageIdSupplier, RandomMessageIdSupplier};
