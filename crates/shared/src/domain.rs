use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseDomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexagramNumber(pub u32);

impl fmt::Display for HexagramNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Model flavor selecting which dataset the backend serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    #[default]
    Abstract,
    Concrete,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Abstract, Variant::Concrete];

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Abstract => "abstract",
            Variant::Concrete => "concrete",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Variant::Abstract => "추상적 모델",
            Variant::Concrete => "구체적 모델",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ParseDomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "abstract" => Ok(Variant::Abstract),
            "concrete" => Ok(Variant::Concrete),
            other => Err(ParseDomainError::UnknownVariant(other.to_string())),
        }
    }
}

/// A named mathematical demonstration computed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Concept {
    Pi,
    GoldenRatio,
    Probability,
    Calculus,
    Binary,
    Primes,
    Symmetry,
    E,
}

impl Concept {
    pub const ALL: [Concept; 8] = [
        Concept::Pi,
        Concept::GoldenRatio,
        Concept::Probability,
        Concept::Calculus,
        Concept::Binary,
        Concept::Primes,
        Concept::Symmetry,
        Concept::E,
    ];

    /// Path segment under `/math/api/verification/`.
    pub fn slug(self) -> &'static str {
        match self {
            Concept::Pi => "pi",
            Concept::GoldenRatio => "golden-ratio",
            Concept::Probability => "probability",
            Concept::Calculus => "calculus",
            Concept::Binary => "binary",
            Concept::Primes => "primes",
            Concept::Symmetry => "symmetry",
            Concept::E => "e",
        }
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Concept {
    type Err = ParseDomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        Concept::ALL
            .into_iter()
            .find(|concept| concept.slug() == normalized)
            .ok_or_else(|| ParseDomainError::UnknownConcept(value.to_string()))
    }
}

/// Dashboard tabs. Only the active selection is tracked, never its styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    Dashboard,
    Concept(Concept),
}
