//! Card deck driven by a single swipe controller

use crate::error::Result;
use crate::models::{Candidate, Outcome};

use super::{Release, SwipeController, SwipePhase};

/// How many cards are rendered at once (top card plus the one beneath)
const VISIBLE_CARDS: usize = 2;

/// Ordered candidates with one active card
#[derive(Debug, Clone)]
pub struct SwipeDeck {
    cards: Vec<Candidate>,
    index: usize,
    controller: SwipeController,
}

impl SwipeDeck {
    pub fn new(viewport_width: f64) -> Result<Self> {
        Ok(Self {
            cards: Vec::new(),
            index: 0,
            controller: SwipeController::new(viewport_width)?,
        })
    }

    /// Append candidates, skipping ids the deck already holds. Returns how many were added.
    pub fn extend(&mut self, candidates: impl IntoIterator<Item = Candidate>) -> usize {
        let mut added = 0;
        for candidate in candidates {
            if self.cards.iter().any(|card| card.id == candidate.id) {
                continue;
            }
            self.cards.push(candidate);
            added += 1;
        }
        added
    }

    /// The top card followed by the one beneath it
    #[must_use]
    pub fn visible(&self) -> &[Candidate] {
        let start = self.index.min(self.cards.len());
        let end = (start + VISIBLE_CARDS).min(self.cards.len());
        &self.cards[start..end]
    }

    /// The card currently accepting gestures
    #[must_use]
    pub fn current(&self) -> Option<&Candidate> {
        self.cards.get(self.index)
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.index)
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    #[must_use]
    pub const fn controller(&self) -> &SwipeController {
        &self.controller
    }

    /// Forward drag displacement to the top card
    pub fn drag(&mut self, translation_x: f64) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.controller.update(translation_x)
    }

    pub fn release(&mut self) -> Option<Release> {
        self.controller.release()
    }

    /// Complete the running animation.
    ///
    /// On a resolved swipe `on_decision` runs with the top card and the
    /// outcome, and the deck advances to the next card.
    pub fn settle<T>(&mut self, on_decision: impl FnOnce(&Candidate, Outcome) -> T) -> Option<T> {
        let outcome = self.controller.finish_animation()?;
        self.advance(outcome, on_decision)
    }

    /// Like or pass the top card from a button, without a gesture
    pub fn decide<T>(
        &mut self,
        outcome: Outcome,
        on_decision: impl FnOnce(&Candidate, Outcome) -> T,
    ) -> Option<T> {
        if self.controller.phase() != SwipePhase::Idle {
            return None;
        }
        self.advance(outcome, on_decision)
    }

    fn advance<T>(
        &mut self,
        outcome: Outcome,
        on_decision: impl FnOnce(&Candidate, Outcome) -> T,
    ) -> Option<T> {
        let card = self.cards.get(self.index)?;
        let result = on_decision(card, outcome);
        self.index += 1;
        self.controller.reset();
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateId;

    fn card(id: &str) -> Candidate {
        Candidate::new(CandidateId::new(id).unwrap(), format!("Place {id}"))
    }

    fn deck() -> SwipeDeck {
        let mut deck = SwipeDeck::new(400.0).unwrap();
        deck.extend([card("1"), card("2"), card("3")]);
        deck
    }

    #[test]
    fn test_visible_is_top_two() {
        let deck = deck();
        let ids: Vec<_> = deck.visible().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_extend_skips_known_ids() {
        let mut deck = deck();
        assert_eq!(deck.extend([card("2"), card("4")]), 1);
        assert_eq!(deck.remaining(), 4);
    }

    #[test]
    fn test_swipe_invokes_callback_once_and_advances() {
        let mut deck = deck();
        let mut decided = Vec::new();

        deck.drag(250.0);
        deck.release();
        deck.settle(|candidate, outcome| decided.push((candidate.id.clone(), outcome)));
        assert!(deck.settle(|_, _| ()).is_none());

        assert_eq!(decided.len(), 1);
        assert_eq!(decided[0].0.as_str(), "1");
        assert_eq!(decided[0].1, Outcome::Liked);
        assert_eq!(deck.current().unwrap().id.as_str(), "2");
        assert_eq!(deck.controller().phase(), SwipePhase::Idle);
    }

    #[test]
    fn test_spring_back_keeps_card() {
        let mut deck = deck();
        deck.drag(-20.0);
        assert_eq!(deck.release(), Some(Release::SpringBack));
        assert!(deck.settle(|_, _| ()).is_none());
        assert_eq!(deck.current().unwrap().id.as_str(), "1");
    }

    #[test]
    fn test_decide_from_button() {
        let mut deck = deck();
        let outcome = deck.decide(Outcome::Disliked, |_, outcome| outcome);
        assert_eq!(outcome, Some(Outcome::Disliked));
        assert_eq!(deck.remaining(), 2);
    }

    #[test]
    fn test_decide_blocked_mid_gesture() {
        let mut deck = deck();
        deck.drag(30.0);
        assert!(deck.decide(Outcome::Liked, |_, _| ()).is_none());
    }

    #[test]
    fn test_exhausted_deck_ignores_drag() {
        let mut deck = SwipeDeck::new(400.0).unwrap();
        assert!(deck.is_exhausted());
        assert!(!deck.drag(300.0));
        assert!(deck.visible().is_empty());
    }
}
