//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::basis::ProcessingBasis;
use crate::error::PdlError;
use crate::retry::RetryPolicy;

/// Configuration for the PDL client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdlClientConfig {
    /// GraphQL endpoint of the registry.
    pub url: String,

    /// Legal basis sent with every request.
    pub processing_basis: ProcessingBasis,

    /// Send the legacy `Tema: SYK` header alongside `Behandlingsnummer`.
    #[serde(default = "default_legacy_tema_header")]
    pub legacy_tema_header: bool,

    /// Read query documents from this directory instead of the bundled ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_dir: Option<PathBuf>,

    /// Timeouts per attempt.
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Retry configuration.
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Response cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl PdlClientConfig {
    /// Configuration with defaults for everything but endpoint and basis.
    #[must_use]
    pub fn new(url: impl Into<String>, processing_basis: ProcessingBasis) -> Self {
        Self {
            url: url.into(),
            processing_basis,
            legacy_tema_header: default_legacy_tema_header(),
            query_dir: None,
            timeouts: TimeoutConfig::default(),
            retry: RetryPolicy::default(),
            cache: CacheConfig::default(),
        }
    }

    /// Reject configurations the client cannot run with.
    pub fn validate(&self) -> Result<(), PdlError> {
        if self.url.trim().is_empty() {
            return Err(PdlError::Config {
                message: "url must not be empty".to_string(),
            });
        }
        let timeouts = [
            ("connect", self.timeouts.connect),
            ("request", self.timeouts.request),
            ("socket", self.timeouts.socket),
        ];
        for (name, timeout) in timeouts {
            if timeout.is_zero() {
                return Err(PdlError::Config {
                    message: format!("{name} timeout must be greater than zero"),
                });
            }
        }
        Ok(())
    }
}

const fn default_legacy_tema_header() -> bool {
    true
}

/// Timeouts applied to every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Time allowed to establish a connection.
    #[serde(default = "default_timeout", with = "duration_ms")]
    pub connect: Duration,
    /// Time allowed for the whole request.
    #[serde(default = "default_timeout", with = "duration_ms")]
    pub request: Duration,
    /// Time allowed to read the response body.
    #[serde(default = "default_timeout", with = "duration_ms")]
    pub socket: Duration,
}

const fn default_timeout() -> Duration {
    Duration::from_millis(500)
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: default_timeout(),
            request: default_timeout(),
            socket: default_timeout(),
        }
    }
}

/// Response cache configuration. A zero lifetime or size disables the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long an entry stays valid.
    #[serde(default = "default_entry_duration", with = "duration_ms")]
    pub entry_duration: Duration,
    /// Maximum number of entries.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Also cache responses that carry GraphQL errors.
    #[serde(default = "default_cache_error_responses")]
    pub cache_error_responses: bool,
}

const fn default_entry_duration() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

const fn default_max_entries() -> usize {
    1000
}

const fn default_cache_error_responses() -> bool {
    true
}

impl CacheConfig {
    /// Configuration that turns caching off.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            entry_duration: Duration::ZERO,
            max_entries: 0,
            cache_error_responses: true,
        }
    }

    /// Returns `true` if entries can be stored at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !self.entry_duration.is_zero() && self.max_entries > 0
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            entry_duration: default_entry_duration(),
            max_entries: default_max_entries(),
            cache_error_responses: default_cache_error_responses(),
        }
    }
}

/// Durations as integer milliseconds.
pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
