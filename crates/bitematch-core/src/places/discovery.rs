//! Accumulated candidate list with swiped-id filtering

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Coordinates, PlacesClient, PlacesPage};
use crate::config::ApiMode;
use crate::models::{Candidate, CandidateId, PriceLevel};

/// Message shown to the user when a search fails
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch restaurants";

/// What a fetch did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Candidates were loaded; `added` survived the swiped filter
    Loaded { added: usize },
    /// Real mode without a location
    SkippedNoLocation,
    /// Continuing a search that has no further pages
    Exhausted,
    /// The request failed; see [`Discovery::error`]
    Failed,
}

/// Persistable part of a discovery session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryState {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Candidate source for the swipe deck
pub struct Discovery {
    mode: ApiMode,
    client: Option<PlacesClient>,
    state: DiscoveryState,
    error: Option<String>,
}

impl Discovery {
    /// Serve the built-in mock restaurants
    #[must_use]
    pub fn mock() -> Self {
        Self {
            mode: ApiMode::Mock,
            client: None,
            state: DiscoveryState::default(),
            error: None,
        }
    }

    /// Search the Places API
    #[must_use]
    pub fn real(client: PlacesClient) -> Self {
        Self {
            mode: ApiMode::Real,
            client: Some(client),
            state: DiscoveryState::default(),
            error: None,
        }
    }

    /// Resume a previous session
    #[must_use]
    pub fn with_state(mut self, state: DiscoveryState) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub const fn mode(&self) -> ApiMode {
        self.mode
    }

    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        &self.state.candidates
    }

    #[must_use]
    pub const fn state(&self) -> &DiscoveryState {
        &self.state
    }

    #[must_use]
    pub fn next_page_token(&self) -> Option<&str> {
        self.state.next_page_token.as_deref()
    }

    /// User-facing message for the last failed fetch
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Look up a loaded candidate
    #[must_use]
    pub fn find(&self, id: &CandidateId) -> Option<&Candidate> {
        self.state.candidates.iter().find(|candidate| &candidate.id == id)
    }

    /// Drop candidates that have since been swiped
    pub fn retain_unswiped(&mut self, swiped: &HashSet<CandidateId>) {
        self.state
            .candidates
            .retain(|candidate| !swiped.contains(&candidate.id));
    }

    /// Load candidates, skipping any id in `swiped`.
    ///
    /// A new search replaces the list; otherwise results are appended.
    pub async fn fetch(
        &mut self,
        location: Option<Coordinates>,
        new_search: bool,
        swiped: &HashSet<CandidateId>,
    ) -> FetchStatus {
        self.error = None;

        let Some(client) = self.client.as_ref().filter(|_| self.mode == ApiMode::Real) else {
            self.state = DiscoveryState {
                candidates: filter_unswiped(mock_candidates(), swiped),
                next_page_token: None,
            };
            return FetchStatus::Loaded {
                added: self.state.candidates.len(),
            };
        };

        let Some(location) = location else {
            tracing::info!("Location missing in real mode; skipping fetch");
            return FetchStatus::SkippedNoLocation;
        };

        let page_token = if new_search {
            None
        } else {
            self.state.next_page_token.clone()
        };
        if !new_search && page_token.is_none() && !self.state.candidates.is_empty() {
            return FetchStatus::Exhausted;
        }

        match client.search_nearby(location, page_token.as_deref()).await {
            Ok(page) => {
                let added = self.apply_page(page, new_search, swiped);
                tracing::debug!("Loaded {added} new candidates");
                FetchStatus::Loaded { added }
            }
            Err(error) => {
                tracing::warn!("Places search failed: {error}");
                self.error = Some(FETCH_ERROR_MESSAGE.to_string());
                FetchStatus::Failed
            }
        }
    }

    /// Merge a fetched page into the list, returning how many candidates were added
    fn apply_page(
        &mut self,
        page: PlacesPage,
        new_search: bool,
        swiped: &HashSet<CandidateId>,
    ) -> usize {
        let mut fresh = filter_unswiped(page.candidates, swiped);
        if new_search {
            self.state.candidates.clear();
        } else {
            fresh.retain(|candidate| self.find(&candidate.id).is_none());
        }

        let added = fresh.len();
        self.state.candidates.extend(fresh);
        self.state.next_page_token = page.next_page_token;
        added
    }
}

fn filter_unswiped(candidates: Vec<Candidate>, swiped: &HashSet<CandidateId>) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|candidate| !swiped.contains(&candidate.id))
        .collect()
}

/// Restaurants served in mock mode
#[must_use]
pub fn mock_candidates() -> Vec<Candidate> {
    [
        ("1", "Burger Haven", 4.5, 120, "123 Burger St, Food City", 2),
        ("2", "Sushi Zen", 4.8, 85, "456 Maki Ave, Kyoto Dist", 3),
        ("3", "Pizza Palace", 4.2, 200, "789 Dough Rd, Little Italy", 1),
    ]
    .into_iter()
    .filter_map(|(id, name, rating, total, address, price)| {
        let mut candidate = Candidate::new(CandidateId::new(id).ok()?, name);
        candidate.rating = Some(rating);
        candidate.user_ratings_total = Some(total);
        candidate.address = Some(address.to_string());
        candidate.price_level = PriceLevel::new(price);
        Some(candidate)
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(discovery: &Discovery) -> Vec<&str> {
        discovery
            .candidates()
            .iter()
            .map(|candidate| candidate.id.as_str())
            .collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn mock_mode_filters_swiped_ids() {
        let mut discovery = Discovery::mock();
        let swiped: HashSet<_> = [CandidateId::new("2").unwrap()].into_iter().collect();

        let status = discovery.fetch(None, true, &swiped).await;
        assert_eq!(status, FetchStatus::Loaded { added: 2 });
        assert_eq!(ids(&discovery), vec!["1", "3"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn real_mode_without_location_skips() {
        let client = PlacesClient::with_endpoint("http://127.0.0.1:9/places", "key").unwrap();
        let mut discovery = Discovery::real(client);

        let status = discovery.fetch(None, true, &HashSet::new()).await;
        assert_eq!(status, FetchStatus::SkippedNoLocation);
        assert!(discovery.error().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_request_sets_user_message() {
        // Nothing listens on the discard port
        let client = PlacesClient::with_endpoint("http://127.0.0.1:9/places", "key").unwrap();
        let mut discovery = Discovery::real(client).with_state(DiscoveryState {
            candidates: mock_candidates(),
            next_page_token: Some("more".to_string()),
        });

        let location = Coordinates::new(25.0, 121.5).unwrap();
        let status = discovery.fetch(Some(location), false, &HashSet::new()).await;
        assert_eq!(status, FetchStatus::Failed);
        assert_eq!(discovery.error(), Some(FETCH_ERROR_MESSAGE));
        // Previously loaded candidates survive a failed page
        assert_eq!(discovery.candidates().len(), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn continuing_without_token_is_exhausted() {
        let client = PlacesClient::with_endpoint("http://127.0.0.1:9/places", "key").unwrap();
        let mut discovery = Discovery::real(client).with_state(DiscoveryState {
            candidates: mock_candidates(),
            next_page_token: None,
        });

        let location = Coordinates::new(25.0, 121.5).unwrap();
        let status = discovery.fetch(Some(location), false, &HashSet::new()).await;
        assert_eq!(status, FetchStatus::Exhausted);
    }

    fn page(ids: &[&str], next_page_token: Option<&str>) -> PlacesPage {
        PlacesPage {
            candidates: ids
                .iter()
                .map(|id| Candidate::new(CandidateId::new(*id).unwrap(), format!("Place {id}")))
                .collect(),
            next_page_token: next_page_token.map(str::to_string),
        }
    }

    fn loaded(ids: &[&str], next_page_token: Option<&str>) -> Discovery {
        let state = DiscoveryState {
            candidates: page(ids, None).candidates,
            next_page_token: next_page_token.map(str::to_string),
        };
        Discovery::mock().with_state(state)
    }

    #[test]
    fn page_skips_swiped_candidates() {
        let mut discovery = loaded(&[], None);
        let swiped: HashSet<_> = [CandidateId::new("b").unwrap()].into_iter().collect();

        let added = discovery.apply_page(page(&["a", "b", "c"], Some("next")), true, &swiped);
        assert_eq!(added, 2);
        assert_eq!(ids(&discovery), vec!["a", "c"]);
    }

    #[test]
    fn continuation_skips_loaded_candidates() {
        let mut discovery = loaded(&["a", "b"], Some("page-2"));

        let added = discovery.apply_page(page(&["b"], None), false, &HashSet::new());
        assert_eq!(added, 0);
        assert_eq!(ids(&discovery), vec!["a", "b"]);
        assert_eq!(discovery.state().next_page_token, None);

        let added = discovery.apply_page(page(&["a", "c"], None), false, &HashSet::new());
        assert_eq!(added, 1);
        assert_eq!(ids(&discovery), vec!["a", "b", "c"]);
    }

    #[test]
    fn new_search_replaces_candidates_and_token() {
        let mut discovery = loaded(&["a", "b"], Some("old"));

        let added = discovery.apply_page(page(&["x", "a"], Some("fresh")), true, &HashSet::new());
        assert_eq!(added, 2);
        assert_eq!(ids(&discovery), vec!["x", "a"]);
        assert_eq!(discovery.state().next_page_token.as_deref(), Some("fresh"));
    }

    #[test]
    fn retain_unswiped_drops_decided_cards() {
        let mut discovery = Discovery::mock().with_state(DiscoveryState {
            candidates: mock_candidates(),
            next_page_token: None,
        });
        let swiped: HashSet<_> = [CandidateId::new("1").unwrap()].into_iter().collect();
        discovery.retain_unswiped(&swiped);
        assert_eq!(ids(&discovery), vec!["2", "3"]);
    }

    #[test]
    fn mock_candidates_match_catalog() {
        let mock = mock_candidates();
        assert_eq!(mock.len(), 3);
        assert_eq!(mock[0].name, "Burger Haven");
        assert_eq!(mock[2].price_label(), "$");
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "requires BITEMATCH_PLACES_API_KEY"]
    async fn live_search_nearby() {
        let _ = dotenvy::dotenv();
        let key = std::env::var("BITEMATCH_PLACES_API_KEY").unwrap();
        let mut discovery = Discovery::real(PlacesClient::new(key).unwrap());
        let location = Coordinates::new(25.0330, 121.5654).unwrap();

        let status = discovery.fetch(Some(location), true, &HashSet::new()).await;
        assert!(matches!(status, FetchStatus::Loaded { .. }));
    }
}
