//! Nearby restaurant discovery over the Google Places API

mod discovery;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::{Candidate, CandidateId, PriceLevel};
use crate::util::{is_http_url, normalize_text_option};

pub use discovery::{mock_candidates, Discovery, DiscoveryState, FetchStatus, FETCH_ERROR_MESSAGE};

const SEARCH_NEARBY_URL: &str = "https://places.googleapis.com/v1/places:searchNearby";

/// Fields requested from `searchNearby`
pub const FIELD_MASK: &str = "places.id,places.displayName,places.rating,places.userRatingCount,places.formattedAddress,places.priceLevel,places.photos,nextPageToken";

pub const SEARCH_RADIUS_METERS: f64 = 5000.0;
pub const MAX_RESULT_COUNT: u32 = 20;

#[derive(Debug, Error)]
pub enum PlacesError {
    #[error("Invalid places configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("Places HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Places API error: {0}")]
    Api(String),
}

pub type PlacesResult<T> = Result<T, PlacesError>;

/// Search center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> PlacesResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(PlacesError::InvalidCoordinates(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(PlacesError::InvalidCoordinates(format!(
                "longitude {longitude} is outside [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacesPage {
    pub candidates: Vec<Candidate>,
    pub next_page_token: Option<String>,
}

#[derive(Clone)]
pub struct PlacesClient {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl PlacesClient {
    pub fn new(api_key: impl Into<String>) -> PlacesResult<Self> {
        Self::with_endpoint(SEARCH_NEARBY_URL, api_key)
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> PlacesResult<Self> {
        let endpoint = normalize_text_option(Some(endpoint.into()))
            .filter(|endpoint| is_http_url(endpoint))
            .ok_or_else(|| {
                PlacesError::InvalidConfiguration(
                    "endpoint must include http:// or https://".to_string(),
                )
            })?;
        let api_key = normalize_text_option(Some(api_key.into())).ok_or_else(|| {
            PlacesError::InvalidConfiguration("API key must not be empty".to_string())
        })?;

        Ok(Self {
            endpoint,
            api_key,
            client: reqwest::Client::builder().build()?,
        })
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Restaurants around `center`, continuing from `page_token` when given
    pub async fn search_nearby(
        &self,
        center: Coordinates,
        page_token: Option<&str>,
    ) -> PlacesResult<PlacesPage> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&search_body(center, page_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PlacesError::Api(crate::remote::parse_api_error(status, &body)));
        }

        let payload = response.json::<SearchNearbyResponse>().await?;
        Ok(payload.into_page())
    }
}

fn search_body(center: Coordinates, page_token: Option<&str>) -> Value {
    let mut body = json!({
        "includedTypes": ["restaurant"],
        "maxResultCount": MAX_RESULT_COUNT,
        "locationRestriction": {
            "circle": {
                "center": { "latitude": center.latitude, "longitude": center.longitude },
                "radius": SEARCH_RADIUS_METERS,
            },
        },
    });
    if let Some(token) = page_token.map(str::trim).filter(|token| !token.is_empty()) {
        body["pageToken"] = Value::String(token.to_string());
    }
    body
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNearbyResponse {
    #[serde(default)]
    places: Vec<PlaceDto>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceDto {
    id: String,
    display_name: Option<LocalizedText>,
    rating: Option<f64>,
    user_rating_count: Option<u32>,
    formatted_address: Option<String>,
    price_level: Option<String>,
    #[serde(default)]
    photos: Vec<PhotoDto>,
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: String,
}

#[derive(Debug, Deserialize)]
struct PhotoDto {
    name: String,
}

impl SearchNearbyResponse {
    fn into_page(self) -> PlacesPage {
        let candidates = self
            .places
            .into_iter()
            .filter_map(|place| {
                let id = match CandidateId::new(place.id) {
                    Ok(id) => id,
                    Err(error) => {
                        tracing::debug!("Skipping place without id: {error}");
                        return None;
                    }
                };
                let name = place
                    .display_name
                    .map(|name| name.text)
                    .unwrap_or_else(|| id.to_string());

                let mut candidate = Candidate::new(id, name);
                candidate.rating = place.rating;
                candidate.user_ratings_total = place.user_rating_count;
                candidate.address = normalize_text_option(place.formatted_address);
                candidate.price_level = place
                    .price_level
                    .as_deref()
                    .and_then(PriceLevel::from_api_name);
                candidate.photo_reference = place.photos.into_iter().next().map(|photo| photo.name);
                Some(candidate)
            })
            .collect();

        PlacesPage {
            candidates,
            next_page_token: normalize_text_option(self.next_page_token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn coordinates_are_range_checked() {
        assert!(Coordinates::new(25.03, 121.56).is_ok());
        assert!(Coordinates::new(90.0, -180.0).is_ok());
        assert!(Coordinates::new(90.1, 0.0).is_err());
        assert!(Coordinates::new(0.0, 180.5).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn client_rejects_blank_key() {
        assert!(PlacesClient::new("  ").is_err());
        assert!(PlacesClient::with_endpoint("places.local", "key").is_err());
    }

    #[test]
    fn search_body_includes_page_token_only_when_continuing() {
        let center = Coordinates::new(1.0, 2.0).unwrap();

        let first = search_body(center, None);
        assert_eq!(first["includedTypes"][0], "restaurant");
        assert_eq!(first["maxResultCount"], 20);
        assert_eq!(first["locationRestriction"]["circle"]["radius"], 5000.0);
        assert!(first.get("pageToken").is_none());

        let next = search_body(center, Some("token-2"));
        assert_eq!(next["pageToken"], "token-2");
    }

    #[test]
    fn response_maps_to_candidates() {
        let body = r#"{
            "places": [
                {
                    "id": "ChIJ123",
                    "displayName": {"text": "Noodle Bar", "languageCode": "en"},
                    "rating": 4.4,
                    "userRatingCount": 310,
                    "formattedAddress": "1 Noodle Ln",
                    "priceLevel": "PRICE_LEVEL_MODERATE",
                    "photos": [{"name": "places/ChIJ123/photos/p1"}, {"name": "places/ChIJ123/photos/p2"}]
                },
                {
                    "id": "ChIJ456",
                    "displayName": {"text": "Corner Cafe"},
                    "priceLevel": "PRICE_LEVEL_UNSPECIFIED"
                }
            ],
            "nextPageToken": "next"
        }"#;

        let page = serde_json::from_str::<SearchNearbyResponse>(body)
            .unwrap()
            .into_page();

        assert_eq!(page.next_page_token.as_deref(), Some("next"));
        assert_eq!(page.candidates.len(), 2);

        let noodle = &page.candidates[0];
        assert_eq!(noodle.name, "Noodle Bar");
        assert_eq!(noodle.user_ratings_total, Some(310));
        assert_eq!(noodle.price_level, PriceLevel::new(2));
        assert_eq!(
            noodle.photo_reference.as_deref(),
            Some("places/ChIJ123/photos/p1")
        );

        let cafe = &page.candidates[1];
        assert_eq!(cafe.price_level, None);
        assert_eq!(cafe.photo_reference, None);
    }

    #[test]
    fn empty_response_has_no_candidates() {
        let page = serde_json::from_str::<SearchNearbyResponse>("{}")
            .unwrap()
            .into_page();
        assert_eq!(page, PlacesPage::default());
    }
}
