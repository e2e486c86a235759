//! Business domains served by separate backends

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the two independent business contexts.
///
/// Each domain has its own backend endpoint and its own slice of the cache.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Graduation inventory
    #[default]
    Wisuda,
    /// Promotional goods inventory
    Sosprom,
}

impl Domain {
    pub const ALL: [Domain; 2] = [Domain::Wisuda, Domain::Sosprom];

    /// Tag used in cache keys, request keys and session storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Wisuda => "wisuda",
            Domain::Sosprom => "sosprom",
        }
    }

    /// Capitalized name for human-readable audit details
    pub fn title(&self) -> &'static str {
        match self {
            Domain::Wisuda => "Wisuda",
            Domain::Sosprom => "Sosprom",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wisuda" => Ok(Domain::Wisuda),
            "sosprom" => Ok(Domain::Sosprom),
            other => Err(format!("unknown domain '{}'", other)),
        }
    }
}
