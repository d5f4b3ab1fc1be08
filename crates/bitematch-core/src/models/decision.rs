//! Decision, match and sync queue models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Candidate, CandidateId};
use crate::error::Error;

/// Result of a resolved swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "like")]
    Liked,
    #[serde(rename = "dislike")]
    Disliked,
}

impl Outcome {
    /// Wire name stored locally and in the remote `interactions` documents
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Liked => "like",
            Self::Disliked => "dislike",
        }
    }

    #[must_use]
    pub const fn is_like(self) -> bool {
        matches!(self, Self::Liked)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "like" | "liked" => Ok(Self::Liked),
            "dislike" | "disliked" | "pass" => Ok(Self::Disliked),
            other => Err(Error::InvalidInput(format!("unknown outcome '{other}'"))),
        }
    }
}

/// A recorded like/dislike for one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub candidate_id: CandidateId,
    pub outcome: Outcome,
    /// Unix ms
    pub decided_at: i64,
}

/// A liked candidate kept with its full payload for offline display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub candidate: Candidate,
    /// Unix ms
    pub matched_at: i64,
}

/// A decision waiting to be written to the remote store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncQueueEntry {
    /// Append order assigned by the local store
    pub seq: i64,
    pub candidate_id: CandidateId,
    pub outcome: Outcome,
    pub decided_at: i64,
    /// Present for likes so the remote match copy can be written
    pub candidate: Option<Candidate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_wire_names() {
        assert_eq!(serde_json::to_string(&Outcome::Liked).unwrap(), "\"like\"");
        assert_eq!(
            serde_json::to_string(&Outcome::Disliked).unwrap(),
            "\"dislike\""
        );
    }

    #[test]
    fn test_outcome_parse_accepts_aliases() {
        assert_eq!("pass".parse::<Outcome>().unwrap(), Outcome::Disliked);
        assert_eq!(" LIKE ".parse::<Outcome>().unwrap(), Outcome::Liked);
        assert!("maybe".parse::<Outcome>().is_err());
    }
}
