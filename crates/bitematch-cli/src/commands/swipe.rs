use bitematch_core::swipe::{Release, SwipeDeck};
use bitematch_core::{Candidate, Outcome};

use crate::commands::common::{find_swipeable_candidate, record_and_sync, CliContext};
use crate::error::CliError;

/// Card width assumed when no gesture geometry is given
pub const DEFAULT_VIEWPORT_WIDTH: f64 = 400.0;

/// How one simulated gesture ended
#[derive(Debug, Clone, PartialEq)]
pub struct GestureOutcome {
    pub rotation_degrees: f64,
    pub like_opacity: f64,
    pub nope_opacity: f64,
    pub decision: Option<Outcome>,
}

/// Drag a single card by `dx` on a `width`-wide viewport and release it
pub fn simulate_gesture(
    candidate: Candidate,
    dx: f64,
    width: f64,
) -> Result<GestureOutcome, CliError> {
    let mut deck = SwipeDeck::new(width)?;
    deck.extend([candidate]);
    deck.drag(dx);

    let controller = deck.controller();
    let rotation_degrees = controller.rotation_degrees();
    let like_opacity = controller.like_opacity();
    let nope_opacity = controller.nope_opacity();

    if let Some(Release::FlingOut { target_x, .. }) = deck.release() {
        tracing::debug!("Card flies out to x={target_x:.0}");
    }
    let decision = deck.settle(|_, outcome| outcome);

    Ok(GestureOutcome {
        rotation_degrees,
        like_opacity,
        nope_opacity,
        decision,
    })
}

pub async fn run_swipe(ctx: &CliContext, id: &str, dx: f64, width: f64) -> Result<(), CliError> {
    let candidate = find_swipeable_candidate(&ctx.db, id).await?;
    let gesture = simulate_gesture(candidate.clone(), dx, width)?;
    tracing::debug!(
        "Released at rotation {:.1} deg (like {:.2}, nope {:.2})",
        gesture.rotation_degrees,
        gesture.like_opacity,
        gesture.nope_opacity
    );

    let Some(outcome) = gesture.decision else {
        println!("{} springs back. Drag further to decide.", candidate.name);
        return Ok(());
    };

    record_and_sync(ctx, &candidate, outcome).await?;
    print_decision(&candidate, outcome);
    Ok(())
}

pub async fn run_decide(ctx: &CliContext, id: &str, outcome: Outcome) -> Result<(), CliError> {
    let candidate = find_swipeable_candidate(&ctx.db, id).await?;
    let mut deck = SwipeDeck::new(DEFAULT_VIEWPORT_WIDTH)?;
    deck.extend([candidate]);

    let Some(candidate) = deck.decide(outcome, |card, _| card.clone()) else {
        return Ok(());
    };
    record_and_sync(ctx, &candidate, outcome).await?;
    print_decision(&candidate, outcome);
    Ok(())
}

fn print_decision(candidate: &Candidate, outcome: Outcome) {
    match outcome {
        Outcome::Liked => println!("It's a match! {} saved to your matches.", candidate.name),
        Outcome::Disliked => println!("Passed on {}", candidate.name),
    }
}
