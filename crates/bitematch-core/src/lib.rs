//! bitematch-core - Core library for BiteMatch
//!
//! This crate contains the shared models, local store, swipe controller,
//! sync engine and cloud clients used by the BiteMatch front ends.

pub mod account;
pub mod auth;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod photo;
pub mod places;
pub mod remote;
pub mod services;
pub mod state;
pub mod swipe;
pub mod sync;
pub mod util;

pub use account::AccountService;
pub use error::{Error, Result};
pub use models::{Candidate, CandidateId, Decision, Match, Outcome};
pub use state::SyncState;
pub use sync::SyncEngine;
