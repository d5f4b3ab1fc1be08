use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "bitematch")]
#[command(about = "Swipe through nearby restaurants from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name for Firebase and Places configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load restaurants around a location
    Discover {
        /// Search center latitude
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Search center longitude
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Start a new search instead of loading the next page
        #[arg(long = "new")]
        new_search: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Drag a card and release it
    Swipe {
        /// Candidate id from `bitematch discover`
        id: String,
        /// Horizontal drag distance in pixels; negative drags left
        #[arg(long, allow_negative_numbers = true)]
        dx: f64,
        /// Card viewport width in pixels
        #[arg(long, default_value = "400")]
        width: f64,
    },
    /// Like a card without swiping
    Like {
        /// Candidate id
        id: String,
    },
    /// Pass on a card without swiping
    #[command(alias = "nope")]
    Pass {
        /// Candidate id
        id: String,
    },
    /// List liked restaurants
    Matches {
        /// Number of matches to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a match
    Unmatch {
        /// Candidate id
        id: String,
    },
    /// Print a Google Maps link for a match
    Directions {
        /// Candidate id
        id: String,
    },
    /// Push queued swipes to the cloud
    Sync {
        #[command(subcommand)]
        command: Option<SyncCommands>,
    },
    /// Clear local matches, swipe history and the sync queue
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Manage the BiteMatch account
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Show or edit the account profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Dietary preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommands,
    },
    /// Send feedback about the app
    Feedback {
        /// Mood from 1 (angry) to 5 (loved)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,
        /// What could be better; repeat for several areas
        #[arg(long = "area", value_name = "AREA")]
        areas: Vec<String>,
        /// Free-form comment
        #[arg(long)]
        comment: Option<String>,
    },
    /// Browse help topics and frequently asked questions
    HelpCenter {
        /// Filter questions and topics
        query: Option<String>,
    },
    /// Export matches
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl From<ExportFormat> for bitematch_core::export::ExportFormat {
    fn from(value: ExportFormat) -> Self {
        match value {
            ExportFormat::Json => Self::Json,
            ExportFormat::Markdown => Self::Markdown,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ApiModeArg {
    Mock,
    Real,
}

impl From<ApiModeArg> for bitematch_core::config::ApiMode {
    fn from(value: ApiModeArg) -> Self {
        match value {
            ApiModeArg::Mock => Self::Mock,
            ApiModeArg::Real => Self::Real,
        }
    }
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Show queued swipes and the last sync state
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Create an account; a guest account is upgraded in place
    Signup {
        #[arg(long, value_name = "EMAIL")]
        email: String,
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Sign in with email and password
    Login {
        #[arg(long, value_name = "EMAIL")]
        email: String,
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Sign out, clear local data and continue as a guest
    Logout,
    /// Show who is signed in
    Status,
    /// Email a password reset link
    ResetPassword {
        #[arg(long, value_name = "EMAIL")]
        email: String,
    },
    /// Delete the account and all of its data
    DeleteAccount {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show profile details
    Show,
    /// Update display name and photo URL
    Edit {
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
        #[arg(long, value_name = "URL")]
        photo_url: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PrefsCommands {
    /// Show saved preferences
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change preferences
    Set {
        /// Toggle a dietary goal (vegan, vegetarian, gluten-free, halal)
        #[arg(long = "goal", value_name = "GOAL")]
        goals: Vec<String>,
        /// Add an allergy from the catalog
        #[arg(long = "allergy", value_name = "ALLERGY")]
        allergies: Vec<String>,
        /// Remove a saved allergy
        #[arg(long = "remove-allergy", value_name = "ALLERGY")]
        remove_allergies: Vec<String>,
        /// Spice tolerance from 1 (mild) to 4 (extra hot)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
        spice: Option<u8>,
    },
    /// Search the allergy catalog
    Allergies {
        /// Text to look for
        #[arg(default_value = "")]
        query: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Firebase Web API key
        #[arg(long, value_name = "KEY")]
        firebase_api_key: Option<String>,
        /// Firebase project id
        #[arg(long, value_name = "ID")]
        firebase_project_id: Option<String>,
        /// Google Places API key
        #[arg(long, value_name = "KEY")]
        places_api_key: Option<String>,
        /// Serve mock restaurants or query the Places API
        #[arg(long, value_enum)]
        api_mode: Option<ApiModeArg>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
}
