//! Data models for BiteMatch

mod candidate;
mod decision;
mod feedback;
mod preferences;
mod profile;

pub use candidate::{Candidate, CandidateId, PriceLevel};
pub use decision::{Decision, Match, Outcome, SyncQueueEntry};
pub use feedback::{Feedback, FeedbackId, ImprovementArea, Mood, MAX_COMMENT_CHARS};
pub use preferences::{DietaryGoal, DietaryPreferences, SpiceLevel, ALLERGIES};
pub use profile::UserProfile;
