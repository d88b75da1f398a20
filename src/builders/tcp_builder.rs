//! Builder for [`GelfTcpSender`](crate::tcp::GelfTcpSender).
//!
//! Exposes the collector address, socket timeouts, pooling, retry and TLS
//! settings. Durations are given in milliseconds.

use std::time::Duration;

use openssl::x509::X509;

use crate::{
    pool::PoolConfig,
    resolver::AddressResolver,
    retry::RetryPolicy,
    tcp::{ConnectionSettings, GelfTcpSender},
    tls::{TlsConnector, TlsSettings},
};

use super::{
    ConfigError, DEFAULT_GELF_PORT, SenderBuilderTrait, ensure_positive, option_setter,
    require_host,
};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_secs(5);

/// Builder for constructing [`GelfTcpSender`] instances.
#[derive(Clone, Debug, Default)]
pub struct TcpSenderBuilder {
    host: Option<String>,
    port: Option<u16>,
    connect_timeout_ms: Option<u64>,
    socket_timeout_ms: Option<u64>,
    reconnect_interval_ms: Option<u64>,
    max_retries: Option<u32>,
    retry_delay_ms: Option<u64>,
    pool_size: Option<usize>,
    pool_max_wait_ms: Option<u64>,
    pool_wait_unbounded: bool,
    pool_max_idle_ms: Option<u64>,
    tls: Option<TlsSettings>,
}

impl TcpSenderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector host name or address. Required.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    option_setter!(with_port, port, u16);
    option_setter!(with_connect_timeout_ms, connect_timeout_ms, u64);
    option_setter!(
        #[doc = "Read and write timeout of an established connection."]
        with_socket_timeout_ms,
        socket_timeout_ms,
        u64
    );
    option_setter!(
        #[doc = "Connections older than this are replaced; zero disables recycling."]
        with_reconnect_interval_ms,
        reconnect_interval_ms,
        u64
    );
    option_setter!(with_max_retries, max_retries, u32);
    option_setter!(with_retry_delay_ms, retry_delay_ms, u64);
    option_setter!(with_pool_size, pool_size, usize);

    /// Longest a send blocks waiting for a free pooled connection.
    pub fn with_pool_max_wait_ms(mut self, wait: u64) -> Self {
        self.pool_max_wait_ms = Some(wait);
        self.pool_wait_unbounded = false;
        self
    }

    /// Block sends until a pooled connection is free, however long it takes.
    pub fn with_unbounded_pool_wait(mut self) -> Self {
        self.pool_max_wait_ms = None;
        self.pool_wait_unbounded = true;
        self
    }

    option_setter!(
        #[doc = "Idle connections older than this are replaced on borrow."]
        with_pool_max_idle_ms,
        pool_max_idle_ms,
        u64
    );

    /// Wrap connections in TLS, validating the server against the system
    /// roots and the collector host name.
    pub fn with_tls(mut self) -> Self {
        self.tls.get_or_insert_with(TlsSettings::default);
        self
    }

    /// Enable TLS without validating the server certificate.
    pub fn with_insecure_tls(mut self) -> Self {
        self.tls.get_or_insert_with(TlsSettings::default).insecure = true;
        self
    }

    /// Enable TLS and trust `cert` in addition to the system roots.
    pub fn with_trusted_certificate(mut self, cert: X509) -> Self {
        self.tls
            .get_or_insert_with(TlsSettings::default)
            .trusted_certificates
            .push(cert);
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(port) = self.port {
            ensure_positive!(port, "port")?;
        }
        if let Some(timeout) = self.connect_timeout_ms {
            ensure_positive!(timeout, "connect_timeout_ms")?;
        }
        if let Some(timeout) = self.socket_timeout_ms {
            ensure_positive!(timeout, "socket_timeout_ms")?;
        }
        if let Some(wait) = self.pool_max_wait_ms {
            ensure_positive!(wait, "pool_max_wait_ms")?;
        }
        if let Some(size) = self.pool_size {
            ensure_positive!(size, "pool_size")?;
        }
        if let Some(tls) = &self.tls {
            tls.validate()?;
        }
        Ok(())
    }

    fn pool_config(&self) -> PoolConfig {
        let mut config = PoolConfig::default();
        if let Some(size) = self.pool_size {
            config.pool_size = size;
        }
        if self.pool_wait_unbounded {
            config.max_wait = None;
        } else if let Some(wait) = self.pool_max_wait_ms {
            config.max_wait = Some(Duration::from_millis(wait));
        }
        if let Some(interval) = self.reconnect_interval_ms {
            config.max_lifetime = (interval > 0).then(|| Duration::from_millis(interval));
        }
        if let Some(idle) = self.pool_max_idle_ms {
            config.max_idle = Some(Duration::from_millis(idle));
        }
        config
    }

    fn retry_policy(&self) -> RetryPolicy {
        let mut policy = RetryPolicy::default();
        if let Some(retries) = self.max_retries {
            policy.max_retries = retries;
        }
        if let Some(delay) = self.retry_delay_ms {
            policy.delay = Duration::from_millis(delay);
        }
        policy
    }

    fn connection_settings(&self, host: &str) -> Result<ConnectionSettings, ConfigError> {
        let tls = match &self.tls {
            Some(settings) => Some(TlsConnector::new(host, settings)?),
            None => None,
        };
        Ok(ConnectionSettings {
            connect_timeout: self
                .connect_timeout_ms
                .map_or(DEFAULT_CONNECT_TIMEOUT, Duration::from_millis),
            socket_timeout: self
                .socket_timeout_ms
                .map_or(DEFAULT_SOCKET_TIMEOUT, Duration::from_millis),
            tls,
        })
    }
}

impl SenderBuilderTrait for TcpSenderBuilder {
    type Sender = GelfTcpSender;

    fn build_inner(&self) -> Result<Self::Sender, ConfigError> {
        self.validate()?;
        let host = require_host(self.host.as_deref())?;
        let settings = self.connection_settings(&host)?;
        let resolver = AddressResolver::new(host, self.port.unwrap_or(DEFAULT_GELF_PORT));
        GelfTcpSender::new(resolver, settings, self.pool_config(), self.retry_policy())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::test_utils::certs::certificate_authority;

    fn base() -> TcpSenderBuilder {
        TcpSenderBuilder::new().with_host("graylog.example.org")
    }

    #[rstest]
    fn requires_host() {
        let err = TcpSenderBuilder::new()
            .with_host("  ")
            .build_inner()
            .expect_err("blank host");
        assert!(matches!(err, ConfigError::InvalidConfig(msg) if msg.contains("host")));
    }

    #[rstest]
    #[case(base().with_connect_timeout_ms(0), "connect_timeout_ms")]
    #[case(base().with_socket_timeout_ms(0), "socket_timeout_ms")]
    #[case(base().with_pool_size(0), "pool_size")]
    #[case(base().with_pool_max_wait_ms(0), "pool_max_wait_ms")]
    #[case(base().with_port(0), "port")]
    fn rejects_zero_values(#[case] builder: TcpSenderBuilder, #[case] field: &str) {
        let err = builder.build_inner().expect_err("zero value");
        assert!(matches!(err, ConfigError::InvalidConfig(msg) if msg.contains(field)));
    }

    #[rstest]
    fn rejects_insecure_with_trusted_certificates() {
        let err = base()
            .with_trusted_certificate(certificate_authority().cert)
            .with_insecure_tls()
            .build_inner()
            .expect_err("conflicting TLS options");
        assert!(matches!(err, ConfigError::InvalidConfig(msg) if msg.contains("insecure")));
    }

    #[rstest]
    fn applies_defaults() {
        let sender = base().build_inner().expect("valid builder");
        assert_eq!(sender.pool_config(), &PoolConfig::default());
        assert_eq!(sender.retry_policy(), RetryPolicy::default());
    }

    #[rstest]
    fn maps_overrides_onto_pool_and_retry() {
        let sender = base()
            .with_pool_size(4)
            .with_pool_max_wait_ms(250)
            .with_pool_max_idle_ms(1_000)
            .with_reconnect_interval_ms(0)
            .with_max_retries(0)
            .with_retry_delay_ms(5)
            .build_inner()
            .expect("valid builder");
        assert_eq!(sender.pool_config(), &PoolConfig {
            pool_size: 4,
            max_wait: Some(Duration::from_millis(250)),
            max_lifetime: None,
            max_idle: Some(Duration::from_secs(1)),
        });
        assert_eq!(sender.retry_policy(), RetryPolicy {
            max_retries: 0,
            delay: Duration::from_millis(5),
        });
    }

    #[rstest]
    fn unbounded_pool_wait_clears_max_wait() {
        let sender = base()
            .with_pool_max_wait_ms(250)
            .with_unbounded_pool_wait()
            .build_inner()
            .expect("valid builder");
        assert_eq!(sender.pool_config().max_wait, None);

        let sender = base()
            .with_unbounded_pool_wait()
            .with_pool_max_wait_ms(250)
            .build_inner()
            .expect("valid builder");
        assert_eq!(sender.pool_config().max_wait, Some(Duration::from_millis(250)));
    }

    #[rstest]
    fn builds_tls_sender() {
        assert!(base().with_tls().build().is_ok());
    }
}
