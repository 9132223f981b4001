//! PDL client: the public lookup operations.

use std::sync::Arc;

use tracing::instrument;

use crate::basis::ProcessingBasis;
use crate::cache::ResponseCache;
use crate::catalog::{DirectoryQueries, EmbeddedQueries, QueryCatalog, QuerySource};
use crate::config::{CacheConfig, PdlClientConfig, TimeoutConfig};
use crate::domain::{FullPerson, IdentKind, PersonName};
use crate::error::PdlError;
use crate::mapper;
use crate::operation::{
    BatchVariables, GraphqlRequest, HentFullPerson, HentIdenter, HentPersonBolk, HentPersonNavn,
    IdentResolutionVariables, IdentVariables, PdlQuery,
};
use crate::retry::RetryPolicy;
use crate::token::AccessTokenProvider;
use crate::transport::Transport;

/// Client metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_field_names)]
pub struct PdlClientMetricsSnapshot {
    /// Requests handed to the transport.
    pub requests_total: u64,
    /// Requests that failed after all attempts.
    pub requests_failed: u64,
    /// Retries performed.
    pub requests_retried: u64,
    /// Lookups answered from the cache.
    pub cache_hits: u64,
    /// Lookups that missed the cache.
    pub cache_misses: u64,
}

/// PDL client builder.
pub struct PdlClientBuilder {
    config: PdlClientConfig,
    token_provider: Arc<dyn AccessTokenProvider>,
    query_source: Option<Box<dyn QuerySource>>,
}

impl PdlClientBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        processing_basis: ProcessingBasis,
        token_provider: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self {
            config: PdlClientConfig::new(url, processing_basis),
            token_provider,
            query_source: None,
        }
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: PdlClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set timeouts.
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.config.timeouts = timeouts;
        self
    }

    /// Set retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set cache configuration.
    #[must_use]
    pub const fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.config.cache = cache;
        self
    }

    /// Toggle the legacy `Tema` header.
    #[must_use]
    pub const fn with_legacy_tema_header(mut self, enabled: bool) -> Self {
        self.config.legacy_tema_header = enabled;
        self
    }

    /// Load query documents from a custom source.
    #[must_use]
    pub fn with_query_source(mut self, source: impl QuerySource + 'static) -> Self {
        self.query_source = Some(Box::new(source));
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<PdlClient, PdlError> {
        self.config.validate()?;

        let catalog = match (&self.query_source, &self.config.query_dir) {
            (Some(source), _) => QueryCatalog::load(source.as_ref())?,
            (None, Some(dir)) => QueryCatalog::load(&DirectoryQueries::new(dir))?,
            (None, None) => QueryCatalog::load(&EmbeddedQueries)?,
        };

        let transport = Transport::new(
            self.config.url.clone(),
            self.config.processing_basis,
            self.config.legacy_tema_header,
            self.config.timeouts,
            self.config.retry.clone(),
            self.token_provider,
        )?;

        Ok(PdlClient {
            inner: Arc::new(Inner {
                catalog,
                transport,
                cache: ResponseCache::new(self.config.cache),
            }),
        })
    }
}

#[derive(Debug)]
struct Inner {
    catalog: QueryCatalog,
    transport: Transport,
    cache: ResponseCache,
}

/// Client for person lookups in PDL.
///
/// Cheap to clone; clones share the transport and the response cache.
#[derive(Debug, Clone)]
pub struct PdlClient {
    inner: Arc<Inner>,
}

impl PdlClient {
    /// Start building a client.
    #[must_use]
    pub fn builder(
        url: impl Into<String>,
        processing_basis: ProcessingBasis,
        token_provider: Arc<dyn AccessTokenProvider>,
    ) -> PdlClientBuilder {
        PdlClientBuilder::new(url, processing_basis, token_provider)
    }

    /// Create a client from configuration.
    pub fn new(
        config: PdlClientConfig,
        token_provider: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self, PdlError> {
        PdlClientBuilder::new(config.url.clone(), config.processing_basis, token_provider)
            .with_config(config)
            .build()
    }

    /// Return client metrics snapshot.
    #[must_use]
    pub fn metrics(&self) -> PdlClientMetricsSnapshot {
        let transport = self.inner.transport.metrics();
        let cache = self.inner.cache.stats();
        PdlClientMetricsSnapshot {
            requests_total: transport.requests_total(),
            requests_failed: transport.requests_failed(),
            requests_retried: transport.requests_retried(),
            cache_hits: cache.hits,
            cache_misses: cache.misses,
        }
    }

    /// Name of the person with the given identifier.
    #[instrument(skip_all)]
    pub async fn person_name(&self, ident: &str) -> Result<Option<PersonName>, PdlError> {
        let data = self
            .query::<HentPersonNavn>(IdentVariables {
                ident: ident.to_string(),
            })
            .await?;
        Ok(mapper::person_name(data))
    }

    /// Name, birth date, protection code and geographic affiliation.
    ///
    /// `None` when the person is unknown or lacks name or birth date.
    #[instrument(skip_all)]
    pub async fn full_person(&self, ident: &str) -> Result<Option<FullPerson>, PdlError> {
        let data = self
            .query::<HentFullPerson>(IdentVariables {
                ident: ident.to_string(),
            })
            .await?;
        Ok(mapper::full_person(data))
    }

    /// Persons for many identifiers in one request.
    ///
    /// Identifiers the registry could not resolve are left out.
    #[instrument(skip_all, fields(count = idents.len()))]
    pub async fn person_batch<S: AsRef<str>>(
        &self,
        idents: &[S],
    ) -> Result<Vec<FullPerson>, PdlError> {
        if idents.is_empty() {
            return Ok(Vec::new());
        }
        let data = self
            .query::<HentPersonBolk>(BatchVariables {
                identer: idents.iter().map(|ident| ident.as_ref().to_string()).collect(),
            })
            .await?;
        Ok(mapper::person_batch(data))
    }

    /// First identifier of `kind` registered for the person.
    #[instrument(skip_all, fields(kind = ?kind))]
    pub async fn resolve_identifier(
        &self,
        ident: &str,
        kind: IdentKind,
    ) -> Result<Option<String>, PdlError> {
        let data = self
            .query::<HentIdenter>(IdentResolutionVariables {
                ident: ident.to_string(),
                grupper: vec![kind],
            })
            .await?;
        Ok(mapper::identifier(data, kind))
    }

    /// Internal actor id of the person.
    pub async fn actor_id(&self, ident: &str) -> Result<Option<String>, PdlError> {
        self.resolve_identifier(ident, IdentKind::Aktorid).await
    }

    async fn query<Q: PdlQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Option<Q::ResponseData>, PdlError> {
        let body = GraphqlRequest::new(self.inner.catalog.get(Q::NAME), variables).to_body()?;

        let transport = self.inner.transport.clone();
        let request = body.clone();
        let envelope = self
            .inner
            .cache
            .get_or_compute(&body, move || async move { transport.execute(request).await })
            .await?;

        envelope.data::<Q::ResponseData>()
    }
}
