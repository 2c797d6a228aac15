//! May I rules engine.
//!
//! Everything in here is synchronous and owns no clock. A [`Game`] is one
//! room's complete state, and every operation on it either succeeds or
//! returns a [`GameError`] without touching that state.

pub mod constants;
pub mod deck;
pub mod entities;
pub mod errors;
pub mod meld;
pub mod requirements;
pub mod state_machine;
pub mod views;
pub mod windows;

pub use errors::{GameError, MeldError};
pub use state_machine::{
    AutoDiscard, DiscardOutcome, Game, GameEvent, GameSettings, Phase, Purchase, RoundSummary,
};
pub use views::{GameView, GameViews, MeldView, PlayerView};
pub use windows::{WindowKind, WindowToken};
