//! PDL client - person lookups against the national population registry.
//!
//! This crate provides:
//! - Four typed GraphQL lookups: name, full person, batch and identifier resolution.
//! - Bearer token and processing basis headers on every request.
//! - Fixed retry and timeout policy with transport error classification.
//! - An optional response cache keyed by the exact request.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use pdl_client::{PdlClient, ProcessingBasis, StaticTokenProvider};
//!
//! # async fn run() -> Result<(), pdl_client::PdlError> {
//! let client = PdlClient::builder(
//!     "https://pdl-api.intern.nav.no/graphql",
//!     ProcessingBasis::Inntektsmelding,
//!     Arc::new(StaticTokenProvider::new("token")),
//! )
//! .build()?;
//!
//! if let Some(name) = client.person_name("12345678910").await? {
//!     println!("{}", name.full_name());
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]

mod basis;
mod cache;
mod catalog;
mod client;
mod config;
mod domain;
mod error;
mod mapper;
mod operation;
mod response;
mod retry;
mod token;
mod transport;

pub use basis::ProcessingBasis;
pub use cache::{CacheStats, ResponseCache};
pub use catalog::{DirectoryQueries, EmbeddedQueries, QueryCatalog, QueryName, QuerySource};
pub use client::{PdlClient, PdlClientBuilder, PdlClientMetricsSnapshot};
pub use config::{CacheConfig, PdlClientConfig, TimeoutConfig};
pub use domain::{FORTROLIG, FullPerson, IdentKind, PersonName, STRENGT_FORTROLIG, protection_code};
pub use error::{
    GraphqlError, GraphqlErrorExtensions, GraphqlErrorLocation, GraphqlPathSegment, HttpErrorInfo,
    PdlError, PdlResult, TokenError,
};
pub use operation::RawEnvelope;
pub use retry::{RetryDecision, RetryPolicy};
pub use token::{AccessTokenProvider, StaticTokenProvider};
pub use transport::{BEHANDLINGSNUMMER, TEMA, Transport};
