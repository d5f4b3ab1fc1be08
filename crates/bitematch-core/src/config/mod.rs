//! Client configuration.
//!
//! Provides a unified `AppConfig` struct that tells clients which Firebase
//! project and Places API key to talk to, and whether to serve mock data.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::normalize_text_option;

pub const ENV_FIREBASE_API_KEY: &str = "BITEMATCH_FIREBASE_API_KEY";
pub const ENV_FIREBASE_PROJECT_ID: &str = "BITEMATCH_FIREBASE_PROJECT_ID";
pub const ENV_PLACES_API_KEY: &str = "BITEMATCH_PLACES_API_KEY";
pub const ENV_API_MODE: &str = "BITEMATCH_API_MODE";

/// Whether candidates come from the Places API or the built-in mock list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    Mock,
    #[default]
    Real,
}

impl ApiMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Real => "real",
        }
    }
}

impl fmt::Display for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "real" | "live" => Ok(Self::Real),
            other => Err(Error::InvalidInput(format!(
                "API mode must be 'mock' or 'real', got '{other}'"
            ))),
        }
    }
}

/// Build-provisioned client configuration.
///
/// These values are public client keys. Secret credentials must never be
/// stored here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub firebase_api_key: Option<String>,
    #[serde(default)]
    pub firebase_project_id: Option<String>,
    #[serde(default)]
    pub places_api_key: Option<String>,
    #[serde(default)]
    pub api_mode: Option<ApiMode>,
}

impl AppConfig {
    /// Read configuration through a key lookup, e.g. the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_mode = normalize_text_option(lookup(ENV_API_MODE))
            .map(|raw| raw.parse::<ApiMode>())
            .transpose()?;

        Ok(Self {
            firebase_api_key: normalize_text_option(lookup(ENV_FIREBASE_API_KEY)),
            firebase_project_id: normalize_text_option(lookup(ENV_FIREBASE_PROJECT_ID)),
            places_api_key: normalize_text_option(lookup(ENV_PLACES_API_KEY)),
            api_mode,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Fill unset fields from `base`
    #[must_use]
    pub fn or(self, base: Self) -> Self {
        Self {
            firebase_api_key: normalize_text_option(self.firebase_api_key)
                .or(base.firebase_api_key),
            firebase_project_id: normalize_text_option(self.firebase_project_id)
                .or(base.firebase_project_id),
            places_api_key: normalize_text_option(self.places_api_key).or(base.places_api_key),
            api_mode: self.api_mode.or(base.api_mode),
        }
    }

    #[must_use]
    pub fn api_mode(&self) -> ApiMode {
        self.api_mode.unwrap_or_default()
    }

    /// Firebase Web API key, required for any auth call
    pub fn require_firebase_api_key(&self) -> Result<&str> {
        self.firebase_api_key.as_deref().ok_or_else(|| {
            Error::InvalidInput(format!(
                "Firebase is not configured; set {ENV_FIREBASE_API_KEY} or run `bitematch config init`"
            ))
        })
    }

    /// Firebase project id, required for the remote store
    pub fn require_firebase_project_id(&self) -> Result<&str> {
        self.firebase_project_id.as_deref().ok_or_else(|| {
            Error::InvalidInput(format!(
                "Firebase project is not configured; set {ENV_FIREBASE_PROJECT_ID}"
            ))
        })
    }

    /// Places API key, required in real mode and for photo URLs
    pub fn require_places_api_key(&self) -> Result<&str> {
        self.places_api_key.as_deref().ok_or_else(|| {
            Error::InvalidInput(format!(
                "Places API key is not configured; set {ENV_PLACES_API_KEY}"
            ))
        })
    }

    #[must_use]
    pub const fn has_firebase(&self) -> bool {
        self.firebase_api_key.is_some() && self.firebase_project_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn from_lookup_trims_and_drops_empty_values() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_FIREBASE_API_KEY, "  web-key "),
            (ENV_FIREBASE_PROJECT_ID, ""),
            (ENV_API_MODE, "MOCK"),
        ]))
        .unwrap();

        assert_eq!(config.firebase_api_key.as_deref(), Some("web-key"));
        assert_eq!(config.firebase_project_id, None);
        assert_eq!(config.api_mode(), ApiMode::Mock);
        assert!(!config.has_firebase());
    }

    #[test]
    fn api_mode_defaults_to_real() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.api_mode(), ApiMode::Real);
        assert!(config.require_places_api_key().is_err());
    }

    #[test]
    fn from_lookup_rejects_unknown_mode() {
        let error = AppConfig::from_lookup(lookup(&[(ENV_API_MODE, "staging")])).unwrap_err();
        assert!(error.to_string().contains("staging"));
    }

    #[test]
    fn or_prefers_own_values() {
        let profile = AppConfig {
            places_api_key: Some("profile-key".to_string()),
            api_mode: Some(ApiMode::Mock),
            ..Default::default()
        };
        let env = AppConfig {
            places_api_key: Some("env-key".to_string()),
            firebase_project_id: Some("env-project".to_string()),
            ..Default::default()
        };

        let merged = profile.or(env);
        assert_eq!(merged.places_api_key.as_deref(), Some("profile-key"));
        assert_eq!(merged.firebase_project_id.as_deref(), Some("env-project"));
        assert_eq!(merged.api_mode(), ApiMode::Mock);
    }

    #[test]
    fn config_rejects_unknown_fields() {
        let error = serde_json::from_str::<AppConfig>(r#"{"places_endpoint":"x"}"#).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }
}
