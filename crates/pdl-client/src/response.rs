//! Wire shapes of the query results.
//!
//! Field names follow the registry schema. Lists default to empty so a missing
//! or `null` attribute reads the same as an empty one.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::domain::IdentKind;

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Result of `hentPersonNavn`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonNameData {
    #[serde(default)]
    pub hent_person: Option<NameList>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NameList {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub navn: Vec<WireName>,
}

/// Result of `hentFullPerson`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullPersonData {
    #[serde(default)]
    pub hent_person: Option<WirePerson>,
    #[serde(default)]
    pub hent_geografisk_tilknytning: Option<GeographicAffiliation>,
}

/// Person node shared by the full and batch queries.
#[derive(Debug, Clone, Deserialize)]
pub struct WirePerson {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub navn: Vec<WireName>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub foedselsdato: Vec<BirthDate>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub adressebeskyttelse: Vec<AddressProtection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireName {
    pub fornavn: String,
    #[serde(default)]
    pub mellomnavn: Option<String>,
    pub etternavn: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BirthDate {
    #[serde(default)]
    pub foedselsdato: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressProtection {
    #[serde(default)]
    pub gradering: Option<String>,
}

/// Kind of geographic affiliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GtType {
    Kommune,
    Bydel,
    Utland,
    #[serde(other)]
    Udefinert,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographicAffiliation {
    pub gt_type: GtType,
    #[serde(default)]
    pub gt_kommune: Option<String>,
    #[serde(default)]
    pub gt_bydel: Option<String>,
    #[serde(default)]
    pub gt_land: Option<String>,
}

/// Result of `hentPersonBolk`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonBatchData {
    #[serde(default)]
    pub hent_person_bolk: Option<Vec<BatchEntry>>,
}

/// One identifier's outcome within a batch.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchEntry {
    pub ident: String,
    #[serde(default)]
    pub person: Option<WirePerson>,
    /// Per-entry status, `ok` on success.
    pub code: String,
}

/// Result of `hentIdenter`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentData {
    #[serde(default)]
    pub hent_identer: Option<IdentList>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentList {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub identer: Vec<WireIdent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireIdent {
    #[serde(default)]
    pub ident: Option<String>,
    #[serde(default)]
    pub gruppe: Option<IdentGroup>,
}

/// Identifier group as sent by the registry; groups this client does not know are kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdentGroup {
    Aktorid,
    Folkeregisterident,
    Npid,
    #[serde(other)]
    Unknown,
}

impl IdentGroup {
    /// Returns `true` if this group is `kind`.
    pub const fn is(self, kind: IdentKind) -> bool {
        matches!(
            (self, kind),
            (Self::Aktorid, IdentKind::Aktorid)
                | (Self::Folkeregisterident, IdentKind::Folkeregisterident)
                | (Self::Npid, IdentKind::Npid)
        )
    }
}
