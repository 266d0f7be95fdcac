use std::fmt;

use serde::{Deserialize, Serialize};

/// Business category embedded in loan metadata by the borrower client.
///
/// Unrecognized values decode as `Other` so a malformed or newer category
/// never fails a metadata decode.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LoanCategory {
    Agriculture,
    Technology,
    Crafts,
    Retail,
    Healthcare,
    Education,
    #[default]
    #[serde(other)]
    Other,
}

impl LoanCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanCategory::Agriculture => "agriculture",
            LoanCategory::Technology => "technology",
            LoanCategory::Crafts => "crafts",
            LoanCategory::Retail => "retail",
            LoanCategory::Healthcare => "healthcare",
            LoanCategory::Education => "education",
            LoanCategory::Other => "other",
        }
    }

    pub fn parse(value: &str) -> LoanCategory {
        match value.trim().to_lowercase().as_str() {
            "agriculture" => LoanCategory::Agriculture,
            "technology" => LoanCategory::Technology,
            "crafts" => LoanCategory::Crafts,
            "retail" => LoanCategory::Retail,
            "healthcare" => LoanCategory::Healthcare,
            "education" => LoanCategory::Education,
            _ => LoanCategory::Other,
        }
    }
}

impl fmt::Display for LoanCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
