//! Query documents, resolved by name once at construction.

use std::fmt;
use std::path::PathBuf;

use crate::error::PdlError;

/// Name of one of the fixed query documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryName {
    HentPersonNavn,
    HentFullPerson,
    HentPersonBolk,
    HentIdenter,
}

impl QueryName {
    /// Every document the client needs.
    pub const ALL: [Self; 4] = [
        Self::HentPersonNavn,
        Self::HentFullPerson,
        Self::HentPersonBolk,
        Self::HentIdenter,
    ];

    /// Document name, also the file stem of the `.graphql` resource.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HentPersonNavn => "hentPersonNavn",
            Self::HentFullPerson => "hentFullPerson",
            Self::HentPersonBolk => "hentPersonBolk",
            Self::HentIdenter => "hentIdenter",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::HentPersonNavn => 0,
            Self::HentFullPerson => 1,
            Self::HentPersonBolk => 2,
            Self::HentIdenter => 3,
        }
    }
}

impl fmt::Display for QueryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where query documents come from.
pub trait QuerySource: Send + Sync {
    /// Raw document text, or `None` if the source has no such document.
    fn load(&self, name: QueryName) -> Option<String>;
}

/// Documents bundled with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedQueries;

impl QuerySource for EmbeddedQueries {
    fn load(&self, name: QueryName) -> Option<String> {
        let text = match name {
            QueryName::HentPersonNavn => include_str!("../queries/hentPersonNavn.graphql"),
            QueryName::HentFullPerson => include_str!("../queries/hentFullPerson.graphql"),
            QueryName::HentPersonBolk => include_str!("../queries/hentPersonBolk.graphql"),
            QueryName::HentIdenter => include_str!("../queries/hentIdenter.graphql"),
        };
        Some(text.to_string())
    }
}

/// Documents read from `<dir>/<name>.graphql`.
#[derive(Debug, Clone)]
pub struct DirectoryQueries {
    dir: PathBuf,
}

impl DirectoryQueries {
    /// Read documents from a directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl QuerySource for DirectoryQueries {
    fn load(&self, name: QueryName) -> Option<String> {
        let path = self.dir.join(format!("{name}.graphql"));
        std::fs::read_to_string(path).ok()
    }
}

/// The four normalized query documents.
#[derive(Debug, Clone)]
pub struct QueryCatalog {
    documents: [String; 4],
}

impl QueryCatalog {
    /// Load every document from a source; any missing document is an error.
    pub fn load(source: &dyn QuerySource) -> Result<Self, PdlError> {
        let mut documents: [String; 4] = Default::default();
        for name in QueryName::ALL {
            let text = source.load(name).ok_or_else(|| PdlError::QueryNotFound {
                name: name.to_string(),
            })?;
            documents[name.index()] = normalize(&text);
        }
        Ok(Self { documents })
    }

    /// Single-line document text.
    #[must_use]
    pub fn get(&self, name: QueryName) -> &str {
        &self.documents[name.index()]
    }
}

/// Queries travel as a single line.
fn normalize(document: &str) -> String {
    document.replace(['\n', '\r'], "")
}
