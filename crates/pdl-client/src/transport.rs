//! Authenticated HTTP transport with retry and timeouts.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::basis::ProcessingBasis;
use crate::config::TimeoutConfig;
use crate::error::PdlError;
use crate::operation::RawEnvelope;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::token::AccessTokenProvider;

/// Header carrying the processing basis code.
pub const BEHANDLINGSNUMMER: &str = "behandlingsnummer";
/// Legacy header naming the sickness benefit theme.
pub const TEMA: &str = "tema";

/// Transport counters.
#[derive(Debug, Default)]
#[allow(clippy::struct_field_names)]
pub struct TransportMetrics {
    requests_total: AtomicU64,
    requests_failed: AtomicU64,
    requests_retried: AtomicU64,
}

impl TransportMetrics {
    pub(crate) fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub(crate) fn requests_failed(&self) -> u64 {
        self.requests_failed.load(Ordering::Relaxed)
    }

    pub(crate) fn requests_retried(&self) -> u64 {
        self.requests_retried.load(Ordering::Relaxed)
    }
}

/// Sends query bodies to the registry.
#[derive(Clone)]
pub struct Transport {
    endpoint: String,
    http: reqwest::Client,
    token_provider: Arc<dyn AccessTokenProvider>,
    retry: RetryPolicy,
    socket_timeout: Duration,
    metrics: Arc<TransportMetrics>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("endpoint", &self.endpoint)
            .field("retry", &self.retry)
            .field("socket_timeout", &self.socket_timeout)
            .finish_non_exhaustive()
    }
}

impl Transport {
    /// Create a transport for an endpoint.
    pub fn new(
        endpoint: impl Into<String>,
        processing_basis: ProcessingBasis,
        legacy_tema_header: bool,
        timeouts: TimeoutConfig,
        retry: RetryPolicy,
        token_provider: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self, PdlError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static(BEHANDLINGSNUMMER),
            HeaderValue::from_static(processing_basis.code()),
        );
        if legacy_tema_header {
            headers.insert(HeaderName::from_static(TEMA), HeaderValue::from_static("SYK"));
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .build()
            .map_err(|err| PdlError::Config {
                message: format!("failed to build HTTP client: {err}"),
            })?;

        Ok(Self {
            endpoint: endpoint.into(),
            http,
            token_provider,
            retry,
            socket_timeout: timeouts.socket,
            metrics: Arc::new(TransportMetrics::default()),
        })
    }

    /// Transport counters.
    #[must_use]
    pub fn metrics(&self) -> &TransportMetrics {
        &self.metrics
    }

    /// POST a serialized request body, retrying per the policy.
    pub async fn execute(&self, body: String) -> Result<RawEnvelope, PdlError> {
        self.metrics.requests_total.fetch_add(1, Ordering::Relaxed);
        let mut attempt = 1;
        loop {
            match self.send_once(&body).await {
                Ok(envelope) => return Ok(envelope),
                Err(err) => match self.retry.decide(&err, attempt) {
                    RetryDecision::RetryAfter(delay) => {
                        self.metrics
                            .requests_retried
                            .fetch_add(1, Ordering::Relaxed);
                        debug!(attempt, ?delay, error = %err, "retrying PDL request");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    RetryDecision::DoNotRetry => {
                        self.metrics.requests_failed.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                },
            }
        }
    }

    async fn send_once(&self, body: &str) -> Result<RawEnvelope, PdlError> {
        let token = self.token_provider.access_token().await?;
        let mut authorization =
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| PdlError::Config {
                message: "access token is not a valid header value".to_string(),
            })?;
        authorization.set_sensitive(true);

        let response = self
            .http
            .post(&self.endpoint)
            .header(AUTHORIZATION, authorization)
            .body(body.to_owned())
            .send()
            .await?;

        let status = response.status();
        let bytes = tokio::time::timeout(self.socket_timeout, response.bytes())
            .await
            .map_err(|_| PdlError::Timeout {
                message: format!("no response body within {:?}", self.socket_timeout),
            })??;

        if !status.is_success() {
            return Err(PdlError::from_status(status, truncate_body(&bytes)));
        }

        RawEnvelope::parse(&bytes)
    }
}

fn truncate_body(bytes: &[u8]) -> String {
    const MAX_LEN: usize = 4096;
    let mut body = String::from_utf8_lossy(bytes).to_string();
    if body.len() > MAX_LEN {
        let mut end = MAX_LEN;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push('…');
    }
    body
}
