//! Places photo URLs

use crate::util::{is_http_url, normalize_text_option, trim_slashes};

/// Restaurant-themed image shown when a candidate has no photo
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1517248135467-4c7edcad34c4?q=80&w=800&auto=format&fit=crop";

const PLACES_MEDIA_BASE_URL: &str = "https://places.googleapis.com/v1";
const MAX_WIDTH_PX: u32 = 800;

/// Displayable URL for a candidate photo reference.
///
/// Full URLs pass through, `places/...` resource names are used as-is and
/// bare photo ids are wrapped under an unknown place.
#[must_use]
pub fn photo_uri(reference: Option<&str>, api_key: &str) -> String {
    let Some(reference) = normalize_text_option(reference.map(str::to_string)) else {
        return PLACEHOLDER_IMAGE_URL.to_string();
    };
    if is_http_url(&reference) {
        return reference;
    }

    let name = if reference.starts_with("places/") {
        reference
    } else {
        format!("places/unknown/photos/{}", trim_slashes(&reference))
    };
    media_url(&name, api_key)
}

/// Rebuild the signed media URL after the previous one expired
#[must_use]
pub fn fresh_photo_uri(reference: &str, api_key: &str) -> String {
    let name = trim_slashes(reference);
    if name.is_empty() || is_http_url(name) {
        return PLACEHOLDER_IMAGE_URL.to_string();
    }
    media_url(name, api_key)
}

fn media_url(name: &str, api_key: &str) -> String {
    format!(
        "{PLACES_MEDIA_BASE_URL}/{name}/media?key={}&maxWidthPx={MAX_WIDTH_PX}",
        urlencoding::encode(api_key.trim())
    )
}
