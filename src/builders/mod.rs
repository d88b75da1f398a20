//! Sender builders and associated traits.
//!
//! Each transport has a fluent builder that validates its options and
//! produces an immutable sender. Builders implement [`SenderBuilderTrait`]
//! so callers can construct a sender without naming its concrete type.

use std::io;

use thiserror::Error;

use crate::sender::GelfSender;

mod macros;
pub mod http_builder;
pub mod tcp_builder;
pub mod udp_builder;

pub(crate) use macros::{ensure_positive, option_setter};

pub use http_builder::{HttpAuth, HttpSenderBuilder};
pub use tcp_builder::TcpSenderBuilder;
pub use udp_builder::UdpSenderBuilder;

/// Default GELF port for UDP and TCP inputs.
pub const DEFAULT_GELF_PORT: u16 = 12201;

/// Errors that may occur while building an encoder, pool or sender.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid user supplied configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// TLS context could not be created.
    #[error("TLS setup failed: {0}")]
    Tls(#[from] openssl::error::ErrorStack),
    /// Underlying I/O error whilst creating the sender.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Trait implemented by all sender builders.
pub trait SenderBuilderTrait: Send + Sync {
    /// Concrete sender produced by this builder.
    type Sender: GelfSender + 'static;

    /// Build the concrete sender.
    fn build_inner(&self) -> Result<Self::Sender, ConfigError>;

    /// Build the sender behind a trait object.
    fn build(&self) -> Result<Box<dyn GelfSender>, ConfigError> {
        Ok(Box::new(self.build_inner()?))
    }
}

pub(crate) fn require_host(host: Option<&str>) -> Result<String, ConfigError> {
    match host.map(str::trim) {
        Some(host) if !host.is_empty() => Ok(host.to_owned()),
        _ => Err(ConfigError::InvalidConfig("host must not be empty".into())),
    }
}
