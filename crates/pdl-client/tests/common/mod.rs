#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use pdl_client::{
    AccessTokenProvider, CacheConfig, PdlClient, PdlClientBuilder, PdlError, ProcessingBasis,
    RetryPolicy, StaticTokenProvider, TimeoutConfig, TokenError,
};

pub const MOCK_FNR: &str = "test-ident";
pub const TOKEN: &str = "fake token";
pub const GRAPHQL_PATH: &str = "/graphql";

pub mod fixtures {
    pub const PERSON_NAME: &str = include_str!("../fixtures/hent-person-navn-response.json");
    pub const FULL_PERSON: &str = include_str!("../fixtures/hent-full-person-response.json");
    pub const PERSON_BATCH: &str = include_str!("../fixtures/hent-personbolk-response.json");
    pub const ACTOR_ID: &str = include_str!("../fixtures/hent-aktoer-id-response.json");
    pub const ERROR: &str = include_str!("../fixtures/error-response.json");
}

static INIT: Once = Once::new();

fn init_test_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,pdl_client=debug"));

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .compact(),
            )
            .init();
    });
}

/// One of the four public lookups, so transport behaviour can be checked for each.
#[derive(Debug, Clone, Copy)]
pub enum Lookup {
    PersonName,
    FullPerson,
    PersonBatch,
    ActorId,
}

impl Lookup {
    pub const ALL: [Self; 4] = [
        Self::PersonName,
        Self::FullPerson,
        Self::PersonBatch,
        Self::ActorId,
    ];

    pub const fn ok_response(self) -> &'static str {
        match self {
            Self::PersonName => fixtures::PERSON_NAME,
            Self::FullPerson => fixtures::FULL_PERSON,
            Self::PersonBatch => fixtures::PERSON_BATCH,
            Self::ActorId => fixtures::ACTOR_ID,
        }
    }

    /// Run the lookup, keeping only whether it produced a value.
    pub async fn run(self, client: &PdlClient) -> Result<bool, PdlError> {
        match self {
            Self::PersonName => client.person_name("12345678910").await.map(|v| v.is_some()),
            Self::FullPerson => client.full_person("12345678910").await.map(|v| v.is_some()),
            Self::PersonBatch => client
                .person_batch(&["12345678910", "12345678911"])
                .await
                .map(|v| !v.is_empty()),
            Self::ActorId => client.actor_id("12345678910").await.map(|v| v.is_some()),
        }
    }
}

/// Answers with the scripted responses in order, repeating the last one.
pub struct ScriptedResponder {
    counter: Arc<AtomicUsize>,
    responses: Vec<ResponseTemplate>,
}

impl ScriptedResponder {
    pub fn new(counter: &Arc<AtomicUsize>, responses: Vec<ResponseTemplate>) -> Self {
        assert!(!responses.is_empty(), "script needs at least one response");
        Self {
            counter: Arc::clone(counter),
            responses,
        }
    }
}

impl Respond for ScriptedResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let attempt = self.counter.fetch_add(1, Ordering::SeqCst);
        let index = attempt.min(self.responses.len() - 1);
        self.responses[index].clone()
    }
}

pub fn ok(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "application/json")
}

pub fn status(code: u16) -> ResponseTemplate {
    ResponseTemplate::new(code)
}

/// Mount a scripted responder on the GraphQL path and return its call counter.
pub async fn mount_script(server: &MockServer, responses: Vec<ResponseTemplate>) -> Arc<AtomicUsize> {
    let counter = Arc::new(AtomicUsize::new(0));
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ScriptedResponder::new(&counter, responses))
        .mount(server)
        .await;
    counter
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 5,
        base_delay: Duration::from_millis(1),
        max_jitter: Duration::ZERO,
    }
}

pub fn short_timeouts() -> TimeoutConfig {
    TimeoutConfig {
        connect: Duration::from_millis(500),
        request: Duration::from_millis(100),
        socket: Duration::from_millis(100),
    }
}

/// Builder with fast retries and no cache.
pub fn client_builder(server: &MockServer) -> PdlClientBuilder {
    PdlClient::builder(
        format!("{}{GRAPHQL_PATH}", server.uri()),
        ProcessingBasis::Inntektsmelding,
        Arc::new(StaticTokenProvider::new(TOKEN)),
    )
    .with_retry_policy(fast_retry())
    .with_cache(CacheConfig::disabled())
}

pub fn test_client(server: &MockServer) -> PdlClient {
    client_builder(server).build().expect("client")
}

/// Counts how often a token is requested.
pub struct CountingTokenProvider {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl AccessTokenProvider for CountingTokenProvider {
    async fn access_token(&self) -> Result<String, TokenError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("token-{call}"))
    }
}

pub struct FailingTokenProvider;

#[async_trait]
impl AccessTokenProvider for FailingTokenProvider {
    async fn access_token(&self) -> Result<String, TokenError> {
        Err(TokenError::new("token endpoint unavailable"))
    }
}

pub struct TestContext {
    test_name: String,
    module: String,
    correlation_id: String,
    start_time: Instant,
    assertions: u32,
}

impl TestContext {
    pub fn new(test_name: &str) -> Self {
        init_test_tracing();
        Self {
            test_name: test_name.to_string(),
            module: "pdl-client".to_string(),
            correlation_id: format!("pdl-{}", std::process::id()),
            start_time: Instant::now(),
            assertions: 0,
        }
    }

    pub fn assert_true(&mut self, condition: bool, msg: &str) {
        assert!(condition, "{msg}");
        self.assertions += 1;
    }

    pub fn assert_eq<T: std::fmt::Debug + PartialEq>(&mut self, actual: T, expected: T, msg: &str) {
        assert!(actual == expected, "{msg}: expected {expected:?}, got {actual:?}");
        self.assertions += 1;
    }

    pub fn finalize(&self, result: &str, details: Option<serde_json::Value>) {
        let duration_ms = u64::try_from(self.start_time.elapsed().as_millis()).unwrap_or(u64::MAX);
        let mut entry = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": "info",
            "test_name": self.test_name,
            "module": self.module,
            "phase": "verify",
            "correlation_id": self.correlation_id,
            "result": result,
            "duration_ms": duration_ms,
            "assertions": self.assertions
        });

        if let Some(extra) = details {
            entry["details"] = extra;
        }

        tracing::info!(target: "pdl_client::tests", %entry, "test finished");
    }
}
