//! In-app feedback model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// Longest accepted free-text comment, in characters
pub const MAX_COMMENT_CHARS: usize = 500;

/// Unique feedback identifier (UUID v7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedbackId(Uuid);

impl FeedbackId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for FeedbackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FeedbackId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Emoji mood scale, 1 (Angry) through 5 (Loved)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Mood {
    Angry = 1,
    Confused = 2,
    Neutral = 3,
    Happy = 4,
    Loved = 5,
}

impl Mood {
    pub const ALL: [Self; 5] = [
        Self::Angry,
        Self::Confused,
        Self::Neutral,
        Self::Happy,
        Self::Loved,
    ];

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Angry => "😡",
            Self::Confused => "😕",
            Self::Neutral => "😐",
            Self::Happy => "🙂",
            Self::Loved => "😍",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Angry => "Angry",
            Self::Confused => "Confused",
            Self::Neutral => "Neutral",
            Self::Happy => "Happy",
            Self::Loved => "Loved",
        }
    }
}

impl TryFrom<u8> for Mood {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|mood| *mood as u8 == value)
            .ok_or_else(|| Error::InvalidInput(format!("rating must be between 1 and 5, got {value}")))
    }
}

impl From<Mood> for u8 {
    fn from(value: Mood) -> Self {
        value as Self
    }
}

/// Areas a user can flag for improvement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementArea {
    UiDesign,
    AppSpeed,
    SwipeLogic,
    Matches,
    Chat,
    Other,
}

impl ImprovementArea {
    pub const ALL: [Self; 6] = [
        Self::UiDesign,
        Self::AppSpeed,
        Self::SwipeLogic,
        Self::Matches,
        Self::Chat,
        Self::Other,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::UiDesign => "UI/Design",
            Self::AppSpeed => "App Speed",
            Self::SwipeLogic => "Swipe Logic",
            Self::Matches => "Matches",
            Self::Chat => "Chat",
            Self::Other => "Other",
        }
    }
}

impl FromStr for ImprovementArea {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        Self::ALL
            .into_iter()
            .find(|area| normalize_label(area.label()) == wanted)
            .ok_or_else(|| Error::InvalidInput(format!("unknown improvement area '{}'", s.trim())))
    }
}

fn normalize_label(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// A submitted feedback form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: FeedbackId,
    pub mood: Mood,
    pub areas: Vec<ImprovementArea>,
    pub comment: Option<String>,
    /// Unix ms
    pub created_at: i64,
}

impl Feedback {
    /// Validate and build a feedback submission
    pub fn new(
        mood: Mood,
        areas: impl IntoIterator<Item = ImprovementArea>,
        comment: Option<String>,
    ) -> Result<Self, Error> {
        let comment = crate::util::normalize_text_option(comment);
        if let Some(text) = &comment {
            if text.chars().count() > MAX_COMMENT_CHARS {
                return Err(Error::InvalidInput(format!(
                    "comment must be at most {MAX_COMMENT_CHARS} characters"
                )));
            }
        }

        let mut unique = Vec::new();
        for area in areas {
            if !unique.contains(&area) {
                unique.push(area);
            }
        }

        Ok(Self {
            id: FeedbackId::new(),
            mood,
            areas: unique,
            comment,
            created_at: crate::util::unix_millis_now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_bounds() {
        assert_eq!(Mood::try_from(5).unwrap(), Mood::Loved);
        assert!(Mood::try_from(0).is_err());
        assert!(Mood::try_from(6).is_err());
    }

    #[test]
    fn test_area_parse_ignores_punctuation() {
        assert_eq!(
            "ui-design".parse::<ImprovementArea>().unwrap(),
            ImprovementArea::UiDesign
        );
        assert_eq!(
            "Swipe Logic".parse::<ImprovementArea>().unwrap(),
            ImprovementArea::SwipeLogic
        );
        assert!("pricing".parse::<ImprovementArea>().is_err());
    }

    #[test]
    fn test_feedback_dedups_areas_and_trims_comment() {
        let feedback = Feedback::new(
            Mood::Happy,
            [ImprovementArea::Chat, ImprovementArea::Chat],
            Some("  more cafes please ".to_string()),
        )
        .unwrap();
        assert_eq!(feedback.areas, vec![ImprovementArea::Chat]);
        assert_eq!(feedback.comment.as_deref(), Some("more cafes please"));
    }

    #[test]
    fn test_feedback_rejects_long_comment() {
        let comment = "x".repeat(MAX_COMMENT_CHARS + 1);
        assert!(Feedback::new(Mood::Neutral, [], Some(comment)).is_err());
    }
}
