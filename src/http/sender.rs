//! GELF over HTTP POST.
//!
//! Each send is one blocking request on a shared ureq agent. Server errors
//! and transport failures are retried; client errors are surfaced at once.

use std::{
    fmt, io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use log::{debug, warn};
use ureq::{Agent, AgentBuilder};

use crate::{
    builders::ConfigError,
    compression::Compression,
    retry::{Interrupt, RetryPolicy, retry_if},
    sender::{GelfSender, SendError},
};

/// Authorization sent with every request.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum HttpAuth {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    Bearer {
        token: String,
    },
}

impl fmt::Debug for HttpAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpAuth::None => f.write_str("None"),
            HttpAuth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            HttpAuth::Bearer { .. } => f.debug_struct("Bearer").finish_non_exhaustive(),
        }
    }
}

/// Validated settings for [`GelfHttpSender`].
#[derive(Clone, Debug)]
pub struct HttpSenderConfig {
    pub uri: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub insecure: bool,
    pub auth: HttpAuth,
    pub headers: Vec<(String, String)>,
    pub compression: Compression,
    pub retry: RetryPolicy,
}

pub struct GelfHttpSender {
    agent: Agent,
    config: HttpSenderConfig,
    interrupt: Interrupt,
    closed: AtomicBool,
}

impl GelfHttpSender {
    pub(crate) fn new(config: HttpSenderConfig) -> Result<Self, ConfigError> {
        let mut tls = native_tls::TlsConnector::builder();
        if config.insecure {
            warn!("HTTPS certificate validation is DISABLED for {}", config.uri);
            tls.danger_accept_invalid_certs(true);
            tls.danger_accept_invalid_hostnames(true);
        }
        let tls = tls.build().map_err(io::Error::other)?;
        let agent = AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout(config.request_timeout)
            .tls_connector(Arc::new(tls))
            .build();
        Ok(Self {
            agent,
            config,
            interrupt: Interrupt::new(),
            closed: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &HttpSenderConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn post(&self, body: &[u8]) -> Result<(), SendError> {
        let mut req = self
            .agent
            .post(&self.config.uri)
            .set("Content-Type", "application/json");
        if let Some(encoding) = self.config.compression.content_encoding() {
            req = req.set("Content-Encoding", encoding);
        }
        req = self.apply_auth(req);
        req = self.apply_headers(req);
        match req.send_bytes(body) {
            Ok(response) => {
                // Reading the body returns the connection to the agent's pool.
                let _ = response.into_string();
                Ok(())
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(SendError::Http { status, body })
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(SendError::Io(io::Error::other(transport.to_string())))
            }
        }
    }

    fn apply_auth(&self, req: ureq::Request) -> ureq::Request {
        match &self.config.auth {
            HttpAuth::None => req,
            HttpAuth::Basic { username, password } => {
                let encoded = BASE64_STANDARD.encode(format!("{username}:{password}"));
                req.set("Authorization", &format!("Basic {encoded}"))
            }
            HttpAuth::Bearer { token } => req.set("Authorization", &format!("Bearer {token}")),
        }
    }

    fn apply_headers(&self, mut req: ureq::Request) -> ureq::Request {
        for (key, value) in &self.config.headers {
            req = req.set(key, value);
        }
        req
    }
}

/// Server errors and transport failures are worth another attempt.
pub(crate) fn is_retryable(err: &SendError) -> bool {
    match err {
        SendError::Http { status, .. } => *status >= 500,
        _ => true,
    }
}

impl GelfSender for GelfHttpSender {
    fn send(&self, payload: &[u8]) -> Result<(), SendError> {
        if self.is_closed() {
            return Err(SendError::Closed);
        }
        let body = self
            .config
            .compression
            .compress(payload)
            .map_err(SendError::Compression)?;
        retry_if(
            || self.post(&body),
            is_retryable,
            || !self.is_closed(),
            self.config.retry,
            &self.interrupt,
        )
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.interrupt.interrupt();
        debug!("GELF HTTP sender closed");
    }
}

impl fmt::Debug for GelfHttpSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GelfHttpSender")
            .field("config", &self.config)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
