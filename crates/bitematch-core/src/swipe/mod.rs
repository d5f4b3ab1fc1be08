//! Swipe gesture state machine for the top card of the deck
//!
//! The controller is fed horizontal displacement while a drag is active and
//! decides on release whether the card springs back or flies off as a like
//! (positive direction) or a pass (negative direction). Animation timing is
//! left to the front end; it reports completion through
//! [`SwipeController::finish_animation`].

mod deck;

use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::Outcome;

pub use deck::SwipeDeck;

/// Fraction of the viewport width a card must travel to resolve
pub const THRESHOLD_FRACTION: f64 = 0.35;

/// Exit animation target, as a multiple of the viewport width
pub const EXIT_DISTANCE_FACTOR: f64 = 1.5;

/// Exit animation duration
pub const EXIT_DURATION: Duration = Duration::from_millis(300);

/// Card tilt at one full viewport width of travel
pub const MAX_ROTATION_DEGREES: f64 = 15.0;

/// Displacement before the LIKE / NOPE labels start fading in
const LABEL_FADE_START: f64 = 50.0;

/// Where the top card is in its gesture lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwipePhase {
    #[default]
    Idle,
    Dragging,
    SpringingBack,
    Exiting(Outcome),
    Resolved(Outcome),
}

/// What the front end should animate after the finger lifts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Release {
    /// Return to center
    SpringBack,
    /// Fly off toward the resolved side
    FlingOut {
        outcome: Outcome,
        target_x: f64,
        duration: Duration,
    },
}

/// Single-card swipe controller
#[derive(Debug, Clone)]
pub struct SwipeController {
    width: f64,
    threshold: f64,
    translation_x: f64,
    phase: SwipePhase,
    enabled: bool,
}

impl SwipeController {
    /// Create a controller for a viewport of the given width (in points)
    pub fn new(viewport_width: f64) -> Result<Self> {
        if !viewport_width.is_finite() || viewport_width <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "viewport width must be a positive number, got {viewport_width}"
            )));
        }

        Ok(Self {
            width: viewport_width,
            threshold: viewport_width * THRESHOLD_FRACTION,
            translation_x: 0.0,
            phase: SwipePhase::Idle,
            enabled: true,
        })
    }

    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Displacement needed to resolve a swipe
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub const fn translation_x(&self) -> f64 {
        self.translation_x
    }

    #[must_use]
    pub const fn phase(&self) -> SwipePhase {
        self.phase
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Only the top card of a deck accepts gestures
    pub const fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Feed the current drag displacement. Returns whether it was accepted.
    pub fn update(&mut self, translation_x: f64) -> bool {
        if !self.enabled || !translation_x.is_finite() {
            return false;
        }
        if !matches!(self.phase, SwipePhase::Idle | SwipePhase::Dragging) {
            return false;
        }

        self.translation_x = translation_x;
        self.phase = SwipePhase::Dragging;
        true
    }

    /// End the drag. `None` when no drag was active.
    pub fn release(&mut self) -> Option<Release> {
        if self.phase != SwipePhase::Dragging {
            return None;
        }

        if self.translation_x.abs() < self.threshold {
            self.phase = SwipePhase::SpringingBack;
            return Some(Release::SpringBack);
        }

        let outcome = if self.translation_x > 0.0 {
            Outcome::Liked
        } else {
            Outcome::Disliked
        };
        let direction = if outcome.is_like() { 1.0 } else { -1.0 };

        self.phase = SwipePhase::Exiting(outcome);
        Some(Release::FlingOut {
            outcome,
            target_x: direction * self.width * EXIT_DISTANCE_FACTOR,
            duration: EXIT_DURATION,
        })
    }

    /// Complete the running animation.
    ///
    /// Yields the outcome once when an exit finishes; a spring-back returns
    /// the card to center and yields nothing.
    pub fn finish_animation(&mut self) -> Option<Outcome> {
        match self.phase {
            SwipePhase::SpringingBack => {
                self.translation_x = 0.0;
                self.phase = SwipePhase::Idle;
                None
            }
            SwipePhase::Exiting(outcome) => {
                let direction = if outcome.is_like() { 1.0 } else { -1.0 };
                self.translation_x = direction * self.width * EXIT_DISTANCE_FACTOR;
                self.phase = SwipePhase::Resolved(outcome);
                Some(outcome)
            }
            _ => None,
        }
    }

    /// Put the controller back to center for the next card
    pub const fn reset(&mut self) {
        self.translation_x = 0.0;
        self.phase = SwipePhase::Idle;
    }

    /// Card tilt in degrees for the current displacement
    #[must_use]
    pub fn rotation_degrees(&self) -> f64 {
        interpolate(
            self.translation_x,
            [-self.width, 0.0, self.width],
            [-MAX_ROTATION_DEGREES, 0.0, MAX_ROTATION_DEGREES],
        )
    }

    /// LIKE label opacity
    #[must_use]
    pub fn like_opacity(&self) -> f64 {
        interpolate(
            self.translation_x,
            [0.0, LABEL_FADE_START, self.threshold],
            [0.0, 0.0, 1.0],
        )
    }

    /// NOPE label opacity
    #[must_use]
    pub fn nope_opacity(&self) -> f64 {
        interpolate(
            -self.translation_x,
            [0.0, LABEL_FADE_START, self.threshold],
            [0.0, 0.0, 1.0],
        )
    }
}

/// Piecewise-linear interpolation over three stops, clamped to the ends
fn interpolate(value: f64, input: [f64; 3], output: [f64; 3]) -> f64 {
    if value <= input[0] {
        return output[0];
    }
    if value >= input[2] {
        return output[2];
    }

    let (from, to, out_from, out_to) = if value <= input[1] {
        (input[0], input[1], output[0], output[1])
    } else {
        (input[1], input[2], output[1], output[2])
    };

    let span = to - from;
    if span <= f64::EPSILON {
        return out_to;
    }
    (value - from) / span * (out_to - out_from) + out_from
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> SwipeController {
        SwipeController::new(400.0).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_rejects_bad_width() {
        assert!(SwipeController::new(0.0).is_err());
        assert!(SwipeController::new(-10.0).is_err());
        assert!(SwipeController::new(f64::NAN).is_err());
    }

    #[test]
    fn test_threshold_is_fraction_of_width() {
        assert!(approx(controller().threshold(), 140.0));
    }

    #[test]
    fn test_below_threshold_springs_back_without_outcome() {
        let mut swipe = controller();
        assert!(swipe.update(139.9));
        assert_eq!(swipe.release(), Some(Release::SpringBack));
        assert_eq!(swipe.phase(), SwipePhase::SpringingBack);
        assert_eq!(swipe.finish_animation(), None);
        assert_eq!(swipe.phase(), SwipePhase::Idle);
        assert!(approx(swipe.translation_x(), 0.0));
    }

    #[test]
    fn test_right_swipe_at_threshold_likes() {
        let mut swipe = controller();
        swipe.update(140.0);
        let release = swipe.release().unwrap();
        assert_eq!(
            release,
            Release::FlingOut {
                outcome: Outcome::Liked,
                target_x: 600.0,
                duration: EXIT_DURATION,
            }
        );
        assert_eq!(swipe.finish_animation(), Some(Outcome::Liked));
        assert_eq!(swipe.phase(), SwipePhase::Resolved(Outcome::Liked));
    }

    #[test]
    fn test_left_swipe_dislikes_once() {
        let mut swipe = controller();
        swipe.update(-300.0);
        assert!(matches!(
            swipe.release(),
            Some(Release::FlingOut {
                outcome: Outcome::Disliked,
                ..
            })
        ));
        assert_eq!(swipe.finish_animation(), Some(Outcome::Disliked));
        assert_eq!(swipe.finish_animation(), None);
        assert!(swipe.release().is_none());
    }

    #[test]
    fn test_no_gesture_during_exit() {
        let mut swipe = controller();
        swipe.update(200.0);
        swipe.release();
        assert!(!swipe.update(10.0));
        assert!(swipe.release().is_none());
    }

    #[test]
    fn test_release_without_drag_is_ignored() {
        let mut swipe = controller();
        assert!(swipe.release().is_none());
    }

    #[test]
    fn test_disabled_controller_ignores_input() {
        let mut swipe = controller();
        swipe.set_enabled(false);
        assert!(!swipe.update(300.0));
        assert!(swipe.release().is_none());
    }

    #[test]
    fn test_rotation_and_label_opacity() {
        let mut swipe = controller();
        swipe.update(200.0);
        assert!(approx(swipe.rotation_degrees(), 7.5));
        assert!(approx(swipe.like_opacity(), 1.0));
        assert!(approx(swipe.nope_opacity(), 0.0));

        swipe.update(95.0);
        assert!(approx(swipe.like_opacity(), 0.5));

        swipe.update(30.0);
        assert!(approx(swipe.like_opacity(), 0.0));

        swipe.update(-1000.0);
        assert!(approx(swipe.rotation_degrees(), -MAX_ROTATION_DEGREES));
        assert!(approx(swipe.nope_opacity(), 1.0));
    }
}
