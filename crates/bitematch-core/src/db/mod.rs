//! Database layer for BiteMatch

mod connection;
mod feedback_repository;
mod migrations;
mod repository;
mod settings_repository;

pub use connection::Database;
pub use feedback_repository::{FeedbackRepository, LibSqlFeedbackRepository};
pub use repository::{LibSqlSwipeRepository, SwipeRepository};
pub use settings_repository::{LibSqlSettingsRepository, SettingsRepository};
