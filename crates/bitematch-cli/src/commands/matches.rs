use bitematch_core::export::directions_url;

use crate::commands::common::{
    find_match, format_match_lines, match_to_list_item, normalize_candidate_id, CliContext,
    MatchListItem,
};
use crate::error::CliError;

pub async fn run_matches(ctx: &CliContext, limit: usize, as_json: bool) -> Result<(), CliError> {
    let matches = ctx.db.list_matches(limit, 0).await?;

    if as_json {
        let json_items = matches
            .iter()
            .map(match_to_list_item)
            .collect::<Vec<MatchListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("No matches yet. Swipe right on a restaurant you like.");
        return Ok(());
    }
    for line in format_match_lines(&matches) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_unmatch(ctx: &CliContext, id: &str) -> Result<(), CliError> {
    let id = normalize_candidate_id(id)?;
    if ctx.db.get_match(&id).await?.is_none() {
        return Err(CliError::MatchNotFound(id.to_string()));
    }

    let report = if let Some((account, user)) = ctx.connect().await? {
        account.sync().unmatch(&id, user.as_ref()).await?
    } else {
        let removed_locally = ctx.db.remove_match(&id).await?;
        bitematch_core::sync::UnmatchReport {
            removed_locally,
            removed_remotely: false,
        }
    };

    println!("Removed {id} from your matches");
    if !report.removed_remotely {
        println!("The cloud copy was not removed; it may reappear after signing in again.");
    }
    Ok(())
}

pub async fn run_directions(ctx: &CliContext, id: &str) -> Result<(), CliError> {
    let item = find_match(&ctx.db, id).await?;
    println!("{}", directions_url(&item));
    Ok(())
}
