//! Candidate (restaurant) model

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Identifier assigned by the places provider (e.g. `ChIJN1t_tDeuEmsRUsoyG83frY4`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    /// Create an id, rejecting blank values
    pub fn new(value: impl Into<String>) -> Result<Self, Error> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("candidate id must not be empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CandidateId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Price tier, 0 (free) through 4 (very expensive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PriceLevel(u8);

impl PriceLevel {
    pub const MAX: u8 = 4;

    /// Build a tier from its numeric value
    #[must_use]
    pub const fn new(level: u8) -> Option<Self> {
        if level <= Self::MAX {
            Some(Self(level))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Parse the places API enum name (`PRICE_LEVEL_MODERATE`, ...)
    #[must_use]
    pub fn from_api_name(name: &str) -> Option<Self> {
        let level = match name.trim() {
            "PRICE_LEVEL_FREE" => 0,
            "PRICE_LEVEL_INEXPENSIVE" => 1,
            "PRICE_LEVEL_MODERATE" => 2,
            "PRICE_LEVEL_EXPENSIVE" => 3,
            "PRICE_LEVEL_VERY_EXPENSIVE" => 4,
            _ => return None,
        };
        Some(Self(level))
    }
}

impl Serialize for PriceLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for PriceLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u8),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(level) => Self::new(level)
                .ok_or_else(|| serde::de::Error::custom(format!("price level {level} out of range"))),
            Raw::Name(name) => Self::from_api_name(&name)
                .or_else(|| name.parse::<u8>().ok().and_then(Self::new))
                .ok_or_else(|| serde::de::Error::custom(format!("unknown price level '{name}'"))),
        }
    }
}

/// A restaurant returned by a places search; immutable once fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ratings_total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_level: Option<PriceLevel>,
}

impl Candidate {
    /// Create a candidate with only the required fields set
    #[must_use]
    pub fn new(id: CandidateId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            rating: None,
            user_ratings_total: None,
            address: None,
            photo_reference: None,
            price_level: None,
        }
    }

    /// Dollar-sign price label; unknown and free tiers render as `$$$`
    #[must_use]
    pub fn price_label(&self) -> String {
        let tier = self
            .price_level
            .map(PriceLevel::value)
            .filter(|tier| *tier > 0)
            .unwrap_or(3);
        "$".repeat(usize::from(tier))
    }
}
