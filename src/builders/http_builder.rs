//! Builder for [`GelfHttpSender`](crate::http::GelfHttpSender).

use std::time::Duration;

use crate::{
    compression::Compression,
    http::{GelfHttpSender, HttpSenderConfig},
    retry::RetryPolicy,
};

pub use crate::http::HttpAuth;

use super::{ConfigError, SenderBuilderTrait, ensure_positive, option_setter};

pub const DEFAULT_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Builder for constructing [`GelfHttpSender`] instances.
#[derive(Clone, Debug, Default)]
pub struct HttpSenderBuilder {
    uri: Option<String>,
    connect_timeout_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    max_retries: Option<u32>,
    retry_delay_ms: Option<u64>,
    insecure: bool,
    compression: Option<Compression>,
    auth: HttpAuth,
    headers: Vec<(String, String)>,
}

impl HttpSenderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target URI, e.g. `https://graylog.example.org:12201/gelf`. Required.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    option_setter!(with_connect_timeout_ms, connect_timeout_ms, u64);
    option_setter!(with_request_timeout_ms, request_timeout_ms, u64);
    option_setter!(with_max_retries, max_retries, u32);
    option_setter!(with_retry_delay_ms, retry_delay_ms, u64);
    option_setter!(with_compression, compression, Compression);

    /// Accept any server certificate. Only for test environments.
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = HttpAuth::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = HttpAuth::Bearer {
            token: token.into(),
        };
        self
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    fn validate_uri(&self) -> Result<String, ConfigError> {
        let uri = self
            .uri
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| ConfigError::InvalidConfig("uri must not be empty".into()))?;
        if !(uri.starts_with("http://") || uri.starts_with("https://")) {
            return Err(ConfigError::InvalidConfig(format!(
                "uri must use http or https: {uri}"
            )));
        }
        Ok(uri.to_owned())
    }

    fn validate_headers(&self) -> Result<(), ConfigError> {
        for (name, _) in &self.headers {
            let valid = !name.is_empty()
                && name
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b));
            if !valid {
                return Err(ConfigError::InvalidConfig(format!(
                    "invalid header name: {name:?}"
                )));
            }
        }
        Ok(())
    }

    fn build_config(&self) -> Result<HttpSenderConfig, ConfigError> {
        let uri = self.validate_uri()?;
        self.validate_headers()?;
        if let Some(timeout) = self.connect_timeout_ms {
            ensure_positive!(timeout, "connect_timeout_ms")?;
        }
        if let Some(timeout) = self.request_timeout_ms {
            ensure_positive!(timeout, "request_timeout_ms")?;
        }
        let mut retry = RetryPolicy::default();
        if let Some(retries) = self.max_retries {
            retry.max_retries = retries;
        }
        if let Some(delay) = self.retry_delay_ms {
            retry.delay = Duration::from_millis(delay);
        }
        Ok(HttpSenderConfig {
            uri,
            connect_timeout: self
                .connect_timeout_ms
                .map_or(DEFAULT_HTTP_CONNECT_TIMEOUT, Duration::from_millis),
            request_timeout: self
                .request_timeout_ms
                .map_or(DEFAULT_HTTP_REQUEST_TIMEOUT, Duration::from_millis),
            insecure: self.insecure,
            auth: self.auth.clone(),
            headers: self.headers.clone(),
            compression: self.compression.unwrap_or_default(),
            retry,
        })
    }
}

impl SenderBuilderTrait for HttpSenderBuilder {
    type Sender = GelfHttpSender;

    fn build_inner(&self) -> Result<Self::Sender, ConfigError> {
        GelfHttpSender::new(self.build_config()?)
    }
}
