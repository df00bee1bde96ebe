use std::fmt;

use serde::{Deserialize, Serialize};

/// Federal filing status. Each one selects its own federal bracket table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FilingStatus {
    Single,
    MarriedFilingJointly,
    HeadOfHousehold,
}

impl FilingStatus {
    pub const ALL: [FilingStatus; 3] = [
        Self::Single,
        Self::MarriedFilingJointly,
        Self::HeadOfHousehold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "S",
            Self::MarriedFilingJointly => "MFJ",
            Self::HeadOfHousehold => "HOH",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::MarriedFilingJointly => "Married Filing Jointly",
            Self::HeadOfHousehold => "Head of Household",
        }
    }

    /// Parses a status code. Accepts the short codes (`S`, `MFJ`, `HOH`) and
    /// the calculator form values (`single`, `married`, `hoh`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "single" => Some(Self::Single),
            "mfj" | "married" | "married_filing_jointly" => Some(Self::MarriedFilingJointly),
            "hoh" | "head_of_household" => Some(Self::HeadOfHousehold),
            _ => None,
        }
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.label())
    }
}
