use std::fmt;

use serde::{Deserialize, Serialize};

/// A wallet's registered role on the lending contract.
///
/// The contract is the source of truth; `Unknown` means the address has
/// never registered (or the contract could not be reached and no cached
/// value exists).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Business,
    Investor,
    Unknown,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Business => "business",
            UserRole::Investor => "investor",
            UserRole::Unknown => "unknown",
        }
    }

    /// Lenient parse for values coming back from the contract or the
    /// cache file; anything unrecognized maps to `Unknown`.
    pub fn parse(value: &str) -> UserRole {
        match value.trim().to_lowercase().as_str() {
            "business" => UserRole::Business,
            "investor" => UserRole::Investor,
            _ => UserRole::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, UserRole::Unknown)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
