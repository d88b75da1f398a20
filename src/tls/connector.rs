//! OpenSSL client connector driven by a [`TrustManager`].

use std::{
    fmt,
    io::{Read, Write},
    sync::Arc,
};

use log::warn;
use openssl::{
    ssl::{HandshakeError, SslConnector, SslMethod, SslStream, SslVerifyMode},
    x509::X509,
};
use parking_lot::Mutex;

use super::trust::{
    CertificateError, HostnameTrustManager, NoopTrustManager, StoreTrustManager, TrustManager,
};
use crate::{builders::ConfigError, sender::SendError};

/// User facing TLS options for stream transports.
#[derive(Clone, Default)]
pub struct TlsSettings {
    /// Skip certificate and hostname validation entirely.
    pub insecure: bool,
    /// Certificates trusted in addition to the system roots.
    pub trusted_certificates: Vec<X509>,
}

impl fmt::Debug for TlsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsSettings")
            .field("insecure", &self.insecure)
            .field("trusted_certificates", &self.trusted_certificates.len())
            .finish()
    }
}

impl TlsSettings {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.insecure && !self.trusted_certificates.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "insecure TLS cannot be combined with trusted certificates".into(),
            ));
        }
        Ok(())
    }
}

type FailureSlot = Arc<Mutex<Option<CertificateError>>>;

/// Wraps client streams in TLS, verifying the server through a
/// [`TrustManager`] rather than OpenSSL's own hostname check.
#[derive(Clone)]
pub struct TlsConnector {
    connector: SslConnector,
    trust: Arc<dyn TrustManager>,
}

impl TlsConnector {
    /// Build a connector for `hostname` from user settings.
    pub fn new(hostname: &str, settings: &TlsSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let trust: Arc<dyn TrustManager> = if settings.insecure {
            Arc::new(NoopTrustManager::new())
        } else {
            let store = StoreTrustManager::new(settings.trusted_certificates.clone())?;
            Arc::new(HostnameTrustManager::new(store, hostname))
        };
        Self::with_trust_manager(trust)
    }

    /// Build a connector around a caller supplied trust manager.
    pub fn with_trust_manager(trust: Arc<dyn TrustManager>) -> Result<Self, ConfigError> {
        let connector = SslConnector::builder(SslMethod::tls_client())?.build();
        Ok(Self { connector, trust })
    }

    /// Perform a blocking client handshake over `stream`.
    pub fn connect<S>(&self, domain: &str, stream: S) -> Result<SslStream<S>, SendError>
    where
        S: Read + Write,
    {
        let mut config = self
            .connector
            .configure()
            .map_err(|err| SendError::Tls(err.to_string()))?;
        config.set_verify_hostname(false);

        let failure: FailureSlot = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&failure);
        let trust = Arc::clone(&self.trust);
        config.set_verify_callback(SslVerifyMode::PEER, move |_preverified, ctx| {
            // Intermediate depths are judged as part of the leaf's chain.
            if ctx.error_depth() != 0 {
                return true;
            }
            let chain: Vec<X509> = match ctx.chain() {
                Some(chain) => chain.iter().map(ToOwned::to_owned).collect(),
                None => ctx.current_cert().map(ToOwned::to_owned).into_iter().collect(),
            };
            match trust.check_server_trusted(&chain) {
                Ok(()) => true,
                Err(err) => {
                    *slot.lock() = Some(err);
                    false
                }
            }
        });

        config.connect(domain, stream).map_err(|err| {
            if let Some(rejected) = failure.lock().take() {
                warn!("TLS peer {domain} rejected: {rejected}");
                return SendError::Certificate(rejected);
            }
            match err {
                HandshakeError::SetupFailure(stack) => SendError::Tls(stack.to_string()),
                HandshakeError::Failure(mid) => SendError::Tls(mid.error().to_string()),
                HandshakeError::WouldBlock(_) => {
                    SendError::Tls("handshake would block on a blocking socket".into())
                }
            }
        })
    }
}

impl fmt::Debug for TlsConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConnector").finish_non_exhaustive()
    }
}
