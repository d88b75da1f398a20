//! TLS support for stream transports.
//!
//! Server certificates are judged by a [`TrustManager`]; the connector
//! disables OpenSSL's built-in hostname check so that manager is the single
//! authority over the handshake.

mod connector;
pub mod hostname;
pub mod trust;

pub use connector::{TlsConnector, TlsSettings};
pub use hostname::verify_hostname;
pub use trust::{
    CertificateError, HostnameTrustManager, NoopTrustManager, StoreTrustManager, TrustManager,
};
