//! Help center content

/// Quick-action tiles on the help center screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Account,
    Payments,
    AppGuide,
    Safety,
}

impl HelpTopic {
    pub const ALL: [Self; 4] = [Self::Account, Self::Payments, Self::AppGuide, Self::Safety];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::Payments => "Payments",
            Self::AppGuide => "App Guide",
            Self::Safety => "Safety",
        }
    }
}

pub const SEARCH_PLACEHOLDER: &str = "How can we help?";

/// Frequently asked questions, in display order
pub const FAQ_QUESTIONS: [&str; 3] = [
    "How do I change my location?",
    "What is a 'Bite Match'?",
    "How to cancel a reservation?",
];

/// Questions containing `query`, ignoring case; a blank query lists all
#[must_use]
pub fn search_faq(query: &str) -> Vec<&'static str> {
    let needle = query.trim().to_lowercase();
    FAQ_QUESTIONS
        .into_iter()
        .filter(|question| needle.is_empty() || question.to_lowercase().contains(&needle))
        .collect()
}

/// Topics whose label contains `query`, ignoring case
#[must_use]
pub fn search_topics(query: &str) -> Vec<HelpTopic> {
    let needle = query.trim().to_lowercase();
    HelpTopic::ALL
        .into_iter()
        .filter(|topic| needle.is_empty() || topic.label().to_lowercase().contains(&needle))
        .collect()
}
