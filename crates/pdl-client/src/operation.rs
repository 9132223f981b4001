//! Request and envelope types and the typed query definitions.

use std::sync::Arc;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

use crate::catalog::QueryName;
use crate::domain::IdentKind;
use crate::error::{GraphqlError, PdlError};
use crate::response::{FullPersonData, IdentData, PersonBatchData, PersonNameData};

/// Typed query against the registry.
///
/// Each query pairs a catalog document with its variables and result shape.
pub trait PdlQuery {
    /// Variables type.
    type Variables: Serialize + Send + Sync;
    /// Response data type.
    type ResponseData: DeserializeOwned;

    /// Catalog document for this query.
    const NAME: QueryName;
}

/// Name lookup by identifier.
#[derive(Debug)]
pub struct HentPersonNavn;

impl PdlQuery for HentPersonNavn {
    type Variables = IdentVariables;
    type ResponseData = PersonNameData;

    const NAME: QueryName = QueryName::HentPersonNavn;
}

/// Full person lookup by identifier.
#[derive(Debug)]
pub struct HentFullPerson;

impl PdlQuery for HentFullPerson {
    type Variables = IdentVariables;
    type ResponseData = FullPersonData;

    const NAME: QueryName = QueryName::HentFullPerson;
}

/// Person lookup for many identifiers in one request.
#[derive(Debug)]
pub struct HentPersonBolk;

impl PdlQuery for HentPersonBolk {
    type Variables = BatchVariables;
    type ResponseData = PersonBatchData;

    const NAME: QueryName = QueryName::HentPersonBolk;
}

/// Identifier resolution by kind.
#[derive(Debug)]
pub struct HentIdenter;

impl PdlQuery for HentIdenter {
    type Variables = IdentResolutionVariables;
    type ResponseData = IdentData;

    const NAME: QueryName = QueryName::HentIdenter;
}

/// Variables for single-person queries.
#[derive(Debug, Clone, Serialize)]
pub struct IdentVariables {
    pub ident: String,
}

/// Variables for the batch query.
#[derive(Debug, Clone, Serialize)]
pub struct BatchVariables {
    pub identer: Vec<String>,
}

/// Variables for identifier resolution.
#[derive(Debug, Clone, Serialize)]
pub struct IdentResolutionVariables {
    pub ident: String,
    pub grupper: Vec<IdentKind>,
}

/// GraphQL request payload.
#[derive(Debug, Clone, Serialize)]
pub struct GraphqlRequest<'a, V> {
    /// Single-line query document.
    pub query: &'a str,
    /// Variables.
    pub variables: V,
}

impl<'a, V: Serialize> GraphqlRequest<'a, V> {
    /// Create a new request.
    #[must_use]
    pub const fn new(query: &'a str, variables: V) -> Self {
        Self { query, variables }
    }

    /// Serialize the request body. The result doubles as the cache fingerprint.
    pub fn to_body(&self) -> Result<String, PdlError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// GraphQL response container.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct GraphqlResponse<T> {
    /// GraphQL errors.
    #[serde(default)]
    pub errors: Option<Vec<GraphqlError>>,
    /// Response data.
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> GraphqlResponse<T> {
    /// Data when no errors were returned, otherwise the full error list.
    ///
    /// A non-empty error list wins over any data present.
    pub fn into_result(self) -> Result<Option<T>, PdlError> {
        match self.errors {
            Some(errors) if !errors.is_empty() => Err(PdlError::Graphql { errors }),
            _ => Ok(self.data),
        }
    }
}

#[derive(Deserialize)]
struct EnvelopeProbe {
    #[serde(default)]
    errors: Option<Vec<IgnoredAny>>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

/// Undecoded response body from a successful HTTP exchange.
#[derive(Debug, Clone)]
pub struct RawEnvelope {
    body: Arc<[u8]>,
    has_errors: bool,
}

impl RawEnvelope {
    /// Check that the body is a GraphQL envelope and note whether it carries errors.
    pub fn parse(body: &[u8]) -> Result<Self, PdlError> {
        let probe: EnvelopeProbe = serde_json::from_slice(body)?;
        Ok(Self {
            body: Arc::from(body),
            has_errors: probe.errors.is_some_and(|errors| !errors.is_empty()),
        })
    }

    /// Returns `true` if the envelope contains GraphQL errors.
    #[must_use]
    pub const fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Decode into the typed envelope for a query.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<GraphqlResponse<T>, PdlError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Typed data, or `PdlError::Graphql` with the full error list.
    ///
    /// When errors are present `data` is never decoded, whatever its shape.
    pub fn data<T: DeserializeOwned>(&self) -> Result<Option<T>, PdlError> {
        if self.has_errors {
            let envelope: ErrorEnvelope = serde_json::from_slice(&self.body)?;
            return Err(PdlError::Graphql {
                errors: envelope.errors,
            });
        }
        self.decode::<T>()?.into_result()
    }
}
