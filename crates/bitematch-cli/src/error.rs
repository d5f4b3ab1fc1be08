use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] bitematch_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Candidate ID cannot be empty")]
    EmptyCandidateId,
    #[error("No loaded restaurant with id {0}. Run `bitematch discover` first.")]
    CandidateNotFound(String),
    #[error("You already swiped on {0}")]
    AlreadySwiped(String),
    #[error("No match with id {0}")]
    MatchNotFound(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error(
        "Firebase is not configured. Run `bitematch config init --firebase-api-key <KEY> --firebase-project-id <ID>` or set BITEMATCH_FIREBASE_API_KEY and BITEMATCH_FIREBASE_PROJECT_ID."
    )]
    FirebaseNotConfigured,
    #[error("{0}")]
    Discovery(String),
    #[error("Location required: pass --lat and --lng")]
    LocationRequired,
    #[error("Aborted")]
    Aborted,
}
