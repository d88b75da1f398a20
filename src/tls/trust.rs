//! Server certificate trust decisions.
//!
//! A [`TrustManager`] judges the peer's certificate chain. The connector
//! installs one in the OpenSSL verify callback, so it is the only
//! authority deciding whether a handshake may proceed.

use std::fmt;

use delegate::delegate;
use log::warn;
use openssl::{
    error::ErrorStack,
    nid::Nid,
    stack::Stack,
    x509::{X509, X509Ref, X509StoreContext, store::X509Store, store::X509StoreBuilder},
};
use thiserror::Error;

use super::hostname::verify_hostname;

/// Why a certificate chain was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CertificateError {
    #[error("certificate chain rejected: {0}")]
    Chain(String),
    #[error("server certificate mismatch; tried to verify {hostname} against {names}")]
    HostnameMismatch { hostname: String, names: String },
    #[error("certificate has neither DNS subject alternative names nor a common name")]
    NoCommonName,
    #[error("{0} is not supported")]
    Unsupported(&'static str),
    #[error("could not read certificate: {0}")]
    Parse(String),
}

impl From<ErrorStack> for CertificateError {
    fn from(err: ErrorStack) -> Self {
        CertificateError::Chain(err.to_string())
    }
}

/// Decides whether a certificate chain is trusted.
pub trait TrustManager: Send + Sync {
    /// Validate a server chain, leaf first.
    fn check_server_trusted(&self, chain: &[X509]) -> Result<(), CertificateError>;

    /// Validate a client chain, leaf first.
    fn check_client_trusted(&self, chain: &[X509]) -> Result<(), CertificateError>;

    /// Certificate authorities this manager trusts.
    fn accepted_issuers(&self) -> Vec<X509>;
}

/// Validates chains against an OpenSSL certificate store.
pub struct StoreTrustManager {
    store: X509Store,
    trusted: Vec<X509>,
}

impl StoreTrustManager {
    /// Trust the system roots plus `trusted`.
    pub fn new(trusted: Vec<X509>) -> Result<Self, ErrorStack> {
        Self::build(trusted, true)
    }

    /// Trust only `trusted`.
    pub fn with_trusted_only(trusted: Vec<X509>) -> Result<Self, ErrorStack> {
        Self::build(trusted, false)
    }

    fn build(trusted: Vec<X509>, system_roots: bool) -> Result<Self, ErrorStack> {
        let mut builder = X509StoreBuilder::new()?;
        if system_roots {
            builder.set_default_paths()?;
        }
        for cert in &trusted {
            builder.add_cert(cert.clone())?;
        }
        Ok(Self {
            store: builder.build(),
            trusted,
        })
    }

    fn verify_chain(&self, chain: &[X509]) -> Result<(), CertificateError> {
        let (leaf, intermediates) = chain
            .split_first()
            .ok_or_else(|| CertificateError::Chain("empty certificate chain".into()))?;
        let mut untrusted = Stack::new()?;
        for cert in intermediates {
            untrusted.push(cert.clone())?;
        }
        let mut context = X509StoreContext::new()?;
        context.init(&self.store, leaf, &untrusted, |ctx| {
            Ok(if ctx.verify_cert()? {
                Ok(())
            } else {
                Err(CertificateError::Chain(ctx.error().error_string().to_owned()))
            })
        })?
    }
}

impl TrustManager for StoreTrustManager {
    fn check_server_trusted(&self, chain: &[X509]) -> Result<(), CertificateError> {
        self.verify_chain(chain)
    }

    fn check_client_trusted(&self, chain: &[X509]) -> Result<(), CertificateError> {
        self.verify_chain(chain)
    }

    fn accepted_issuers(&self) -> Vec<X509> {
        self.trusted.clone()
    }
}

impl fmt::Debug for StoreTrustManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreTrustManager")
            .field("trusted", &self.trusted.len())
            .finish_non_exhaustive()
    }
}

/// Accepts every chain. Only for test environments.
#[derive(Debug, Default)]
pub struct NoopTrustManager;

impl NoopTrustManager {
    pub fn new() -> Self {
        warn!("TLS certificate validation is DISABLED; connections are open to interception");
        Self
    }
}

impl TrustManager for NoopTrustManager {
    fn check_server_trusted(&self, _chain: &[X509]) -> Result<(), CertificateError> {
        Ok(())
    }

    fn check_client_trusted(&self, _chain: &[X509]) -> Result<(), CertificateError> {
        Ok(())
    }

    fn accepted_issuers(&self) -> Vec<X509> {
        Vec::new()
    }
}

/// Adds hostname verification on top of a delegate's chain validation.
///
/// DNS subject alternative names take precedence: when the leaf carries
/// any, one of them must match and the common name is never consulted.
#[derive(Debug)]
pub struct HostnameTrustManager<T> {
    delegate: T,
    hostname: String,
}

impl<T: TrustManager> HostnameTrustManager<T> {
    pub fn new(delegate: T, hostname: impl Into<String>) -> Self {
        Self {
            delegate,
            hostname: hostname.into(),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    fn check_alternative_names(&self, leaf: &X509Ref) -> Result<bool, CertificateError> {
        let names = dns_alternative_names(leaf);
        if names.is_empty() {
            return Ok(false);
        }
        if names.iter().any(|name| verify_hostname(&self.hostname, name)) {
            return Ok(true);
        }
        Err(CertificateError::HostnameMismatch {
            hostname: self.hostname.clone(),
            names: format!("subject alternative names: [{}]", names.join(", ")),
        })
    }

    fn check_common_name(&self, leaf: &X509Ref) -> Result<(), CertificateError> {
        let common_name = common_name(leaf)?;
        if verify_hostname(&self.hostname, &common_name) {
            Ok(())
        } else {
            Err(CertificateError::HostnameMismatch {
                hostname: self.hostname.clone(),
                names: format!("common name: {common_name}"),
            })
        }
    }
}

impl<T: TrustManager> TrustManager for HostnameTrustManager<T> {
    fn check_server_trusted(&self, chain: &[X509]) -> Result<(), CertificateError> {
        self.delegate.check_server_trusted(chain)?;
        let leaf = chain
            .first()
            .ok_or_else(|| CertificateError::Chain("empty certificate chain".into()))?;
        if self.check_alternative_names(leaf)? {
            return Ok(());
        }
        self.check_common_name(leaf)
    }

    fn check_client_trusted(&self, _chain: &[X509]) -> Result<(), CertificateError> {
        Err(CertificateError::Unsupported("client certificate validation"))
    }

    delegate! {
        to self.delegate {
            fn accepted_issuers(&self) -> Vec<X509>;
        }
    }
}

fn dns_alternative_names(cert: &X509Ref) -> Vec<String> {
    cert.subject_alt_names()
        .map(|names| {
            names
                .iter()
                .filter_map(|name| name.dnsname().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

fn common_name(cert: &X509Ref) -> Result<String, CertificateError> {
    let entry = cert
        .subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .ok_or(CertificateError::NoCommonName)?;
    entry
        .data()
        .to_string()
        .map_err(|err| CertificateError::Parse(err.to_string()))
}
