//! Mapping from wire shapes to domain objects.
//!
//! Missing attributes are absence, never errors: an empty list yields `None`,
//! and a person without name or birth date is no person at all.

use tracing::warn;

use crate::domain::{FullPerson, IdentKind, PersonName, protection_code};
use crate::response::{
    BatchEntry, FullPersonData, GeographicAffiliation, GtType, IdentData, PersonBatchData,
    PersonNameData, WireName, WirePerson,
};

/// Batch status marking a found person.
const BATCH_OK: &str = "ok";

impl From<&WireName> for PersonName {
    fn from(name: &WireName) -> Self {
        Self {
            first_name: name.fornavn.clone(),
            middle_name: name.mellomnavn.clone(),
            last_name: name.etternavn.clone(),
        }
    }
}

impl GeographicAffiliation {
    /// The field selected by `gtType`.
    #[must_use]
    pub fn affiliation(&self) -> Option<&str> {
        match self.gt_type {
            GtType::Kommune => self.gt_kommune.as_deref(),
            GtType::Bydel => self.gt_bydel.as_deref(),
            GtType::Utland => self.gt_land.as_deref(),
            GtType::Udefinert => None,
        }
    }
}

impl WirePerson {
    fn name(&self) -> Option<PersonName> {
        self.navn.first().map(PersonName::from)
    }

    fn protection_code(&self) -> Option<String> {
        self.adressebeskyttelse
            .first()
            .and_then(|protection| protection.gradering.as_deref())
            .and_then(protection_code)
            .map(str::to_string)
    }

    fn to_full_person(
        &self,
        ident: Option<String>,
        geographic_affiliation: Option<String>,
    ) -> Option<FullPerson> {
        let name = self.name()?;
        let birth_date = self.foedselsdato.first()?.foedselsdato?;
        Some(FullPerson {
            name,
            birth_date,
            ident,
            protection_code: self.protection_code(),
            geographic_affiliation,
        })
    }
}

/// First name record of a name lookup.
pub fn person_name(data: Option<PersonNameData>) -> Option<PersonName> {
    data?.hent_person?.navn.first().map(PersonName::from)
}

/// Full person, or `None` when name or birth date is missing.
pub fn full_person(data: Option<FullPersonData>) -> Option<FullPerson> {
    let data = data?;
    let affiliation = data
        .hent_geografisk_tilknytning
        .as_ref()
        .and_then(GeographicAffiliation::affiliation)
        .map(str::to_string);
    data.hent_person?.to_full_person(None, affiliation)
}

/// Persons for every batch entry with status `ok` and a complete record.
pub fn person_batch(data: Option<PersonBatchData>) -> Vec<FullPerson> {
    data.and_then(|data| data.hent_person_bolk)
        .unwrap_or_default()
        .into_iter()
        .filter_map(batch_entry)
        .collect()
}

fn batch_entry(entry: BatchEntry) -> Option<FullPerson> {
    if !entry.code.eq_ignore_ascii_case(BATCH_OK) {
        warn!(code = %entry.code, "skipping batch entry without person data");
        return None;
    }
    let Some(person) = entry.person else {
        warn!("skipping batch entry with status ok but no person");
        return None;
    };
    person.to_full_person(Some(entry.ident), None)
}

/// First identifier of the requested kind.
pub fn identifier(data: Option<IdentData>, kind: IdentKind) -> Option<String> {
    data?
        .hent_identer?
        .identer
        .into_iter()
        .filter(|ident| ident.gruppe.is_none_or(|gruppe| gruppe.is(kind)))
        .find_map(|ident| ident.ident)
}
