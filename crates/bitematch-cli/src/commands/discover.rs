use bitematch_core::config::ApiMode;
use bitematch_core::places::{Coordinates, Discovery, FetchStatus, PlacesClient};

use crate::commands::common::{
    candidate_to_list_item, format_candidate_lines, load_discovery_cache, mode_label,
    save_discovery_cache, CandidateListItem, CliContext,
};
use crate::error::CliError;

pub async fn run_discover(
    ctx: &CliContext,
    location: Option<(f64, f64)>,
    new_search: bool,
    as_json: bool,
) -> Result<(), CliError> {
    let mut cache = load_discovery_cache(&ctx.db).await?;
    let location = match location {
        Some((lat, lng)) => {
            Some(Coordinates::new(lat, lng).map_err(bitematch_core::Error::from)?)
        }
        None => cache.location,
    };
    // Moving the search center starts over
    let new_search = new_search || location != cache.location || cache.state.candidates.is_empty();

    let mode = ctx.config.api_mode();
    let mut discovery = match mode {
        ApiMode::Mock => Discovery::mock(),
        ApiMode::Real => {
            let key = ctx.config.require_places_api_key()?;
            Discovery::real(PlacesClient::new(key).map_err(bitematch_core::Error::from)?)
        }
    }
    .with_state(cache.state.clone());

    let swiped = ctx.db.swiped_ids().await?;
    discovery.retain_unswiped(&swiped);

    match discovery.fetch(location, new_search, &swiped).await {
        FetchStatus::Loaded { added } => {
            tracing::debug!("Loaded {added} restaurants from {}", mode_label(mode));
        }
        FetchStatus::SkippedNoLocation => return Err(CliError::LocationRequired),
        FetchStatus::Exhausted => {
            if !as_json {
                println!("No more restaurants nearby. Use --new to search again.");
            }
        }
        FetchStatus::Failed => {
            let message = discovery.error().unwrap_or_default().to_string();
            return Err(CliError::Discovery(message));
        }
    }

    cache.state = discovery.state().clone();
    cache.location = location;
    save_discovery_cache(&ctx.db, &cache).await?;

    let candidates = discovery.candidates();
    if as_json {
        let places_key = ctx.config.places_api_key.as_deref().unwrap_or_default();
        let items = candidates
            .iter()
            .map(|candidate| candidate_to_list_item(candidate, places_key))
            .collect::<Vec<CandidateListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if candidates.is_empty() {
        println!("You've seen everything nearby.");
        return Ok(());
    }
    for line in format_candidate_lines(candidates) {
        println!("{line}");
    }
    Ok(())
}
