//! Rules engine error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{CardId, PlayerId};

/// Reasons a card group can't be, or can't stay, a meld.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum MeldError {
    #[error("a meld needs at least {min} cards, got {got}")]
    TooFewCards { min: usize, got: usize },
    #[error("cards are neither a set nor a run")]
    NotSetOrRun,
    #[error("card {0} is not a wildcard")]
    NotAWildcard(CardId),
    #[error("card {0} is not part of that meld")]
    CardNotInMeld(CardId),
    #[error("meld has no wildcard that card can replace")]
    NoSwappableWildcard,
}

/// Errors surfaced by room operations. Every error leaves the room unchanged.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("invalid meld: {0}")]
    InvalidMeld(#[from] MeldError),
    #[error("room is full")]
    CapacityReached,
    #[error("player {0} is not in the room")]
    UnknownPlayer(PlayerId),
    #[error("player {0} is already in the room")]
    PlayerAlreadyExists(PlayerId),
    #[error("not your turn")]
    OutOfTurnAction,
    #[error("card {0} is not in your hand")]
    CardNotInHand(CardId),
    #[error("card {0} was named more than once")]
    DuplicateCard(CardId),
    #[error("meld {0} does not exist")]
    UnknownMeld(usize),
    #[error("no buys remaining")]
    NoBuysRemaining,
    #[error("discard pile is empty")]
    DiscardPileEmpty,
    #[error("not enough cards left to draw {requested}")]
    DrawPileExhausted { requested: usize },
    #[error("you must draw before melding")]
    MustDrawFirst,
    #[error("you need a meld of your own first")]
    MeldRequired,
    #[error("round {round} needs {groups} group(s) of at least {min_length} cards")]
    RoundRequirementNotMet {
        round: u8,
        groups: usize,
        min_length: usize,
    },
    #[error("a first meld may not contain runs this round")]
    InitialRunNotAllowed,
    #[error("melding may not empty your hand")]
    WouldEmptyHand,
    #[error("no round is being played")]
    RoundNotActive,
    #[error("game is over")]
    GameOver,
}
