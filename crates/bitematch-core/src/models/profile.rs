//! Editable user profile fields

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::util::{is_http_url, normalize_text_option};

/// Profile details shown on the profile screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl UserProfile {
    /// Trim fields and check that a photo URL is an http(s) link
    pub fn normalized(self) -> Result<Self, Error> {
        let display_name = normalize_text_option(self.display_name);
        let photo_url = normalize_text_option(self.photo_url);
        if let Some(url) = &photo_url {
            if !is_http_url(url) {
                return Err(Error::InvalidInput(
                    "photo URL must include http:// or https://".into(),
                ));
            }
        }
        Ok(Self {
            display_name,
            photo_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_drops_blank_fields() {
        let profile = UserProfile {
            display_name: Some("  ".to_string()),
            photo_url: None,
        }
        .normalized()
        .unwrap();
        assert_eq!(profile, UserProfile::default());
    }

    #[test]
    fn test_normalized_rejects_non_http_photo() {
        let result = UserProfile {
            display_name: Some("Sam".to_string()),
            photo_url: Some("file:///tmp/me.png".to_string()),
        }
        .normalized();
        assert!(result.is_err());
    }
}
