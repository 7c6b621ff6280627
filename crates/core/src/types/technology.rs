//! Print technologies offered on every quote.

use serde::{Deserialize, Serialize};

/// A printing method. Every quote carries one pricing option per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Technology {
    /// Fused deposition modelling (filament extrusion).
    Fdm,
    /// Photopolymer resin (SLA/MSLA).
    Resin,
}

impl Technology {
    /// All technologies, in display order.
    pub const ALL: [Self; 2] = [Self::Fdm, Self::Resin];

    /// Wire name, as used in `printer_type`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fdm => "fdm",
            Self::Resin => "resin",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fdm => "FDM Printing",
            Self::Resin => "Resin Printing",
        }
    }
}

impl std::fmt::Display for Technology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known technology.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown print technology: {0}")]
pub struct TechnologyParseError(pub String);

impl std::str::FromStr for Technology {
    type Err = TechnologyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fdm" => Ok(Self::Fdm),
            "resin" => Ok(Self::Resin),
            _ => Err(TechnologyParseError(s.to_owned())),
        }
    }
}
