pub mod auth_cmd;
pub mod common;
pub mod completions;
pub mod config;
pub mod discover;
pub mod export;
pub mod feedback;
pub mod matches;
pub mod prefs;
pub mod profile;
pub mod swipe;
pub mod sync;
