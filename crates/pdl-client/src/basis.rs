//! Legal processing bases (behandlingsgrunnlag) sent with every request.

use serde::{Deserialize, Serialize};

/// Legal basis for processing person data, registered in the processing
/// catalogue for sickness benefits.
///
/// Each basis carries a fixed code assigned by the registry. A new basis is a
/// new variant with its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingBasis {
    /// Handling of income reports (inntektsmelding) from employers.
    Inntektsmelding,
}

impl ProcessingBasis {
    /// Registry code sent in the `Behandlingsnummer` header.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Inntektsmelding => "B190",
        }
    }
}
