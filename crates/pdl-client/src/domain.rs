//! Person data returned to callers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Protection marking for strictly confidential addresses.
pub const STRENGT_FORTROLIG: &str = "STRENGT_FORTROLIG";
/// Protection marking for confidential addresses.
pub const FORTROLIG: &str = "FORTROLIG";

/// A person's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
}

impl PersonName {
    /// Non-blank name parts joined by a single space.
    #[must_use]
    pub fn full_name(&self) -> String {
        [
            Some(self.first_name.as_str()),
            self.middle_name.as_deref(),
            Some(self.last_name.as_str()),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Person record with the attributes needed for case handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullPerson {
    pub name: PersonName,
    pub birth_date: NaiveDate,
    /// Identifier the record was looked up with (batch lookups only).
    pub ident: Option<String>,
    /// Civil registry code derived from the protection marking.
    pub protection_code: Option<String>,
    /// Municipality, district or country the person belongs to.
    pub geographic_affiliation: Option<String>,
}

/// Kinds of identifiers the registry knows a person by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdentKind {
    /// Internal actor id.
    Aktorid,
    /// National identity number.
    Folkeregisterident,
    /// Temporary id for persons without a national identity number.
    Npid,
}

/// Map a protection marking to the two-letter civil code.
#[must_use]
pub fn protection_code(gradering: &str) -> Option<&'static str> {
    match gradering {
        STRENGT_FORTROLIG => Some("SPSF"),
        FORTROLIG => Some("SPFO"),
        _ => None,
    }
}
