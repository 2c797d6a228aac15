//! # May I
//!
//! A rules engine for May I, a two-deck rummy variant played over six rounds.
//!
//! Players are dealt eleven cards each round, draw and discard in turn, and
//! race to lay down the round's required groups of sets before going out.
//! Twos are wild. Anyone may spend one of their six buys to grab a discard
//! out of turn, taking an extra card from the draw pile as the price. Cards
//! left in hand when someone goes out count against their holder, and the
//! lowest total after six rounds wins.
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, the deck, meld validation, round requirements and the
//!   [`Game`] orchestrator that enforces the rules on every move
//! - [`room`]: An async actor per room with buy and discard timers, plus a
//!   registry for creating and closing rooms
//!
//! ## Example
//!
//! ```
//! use may_i::{Game, GameSettings};
//! use may_i::game::entities::{ConnectionId, PlayerId};
//!
//! let mut game = Game::with_seed(GameSettings::new(2), 7);
//! game.add_player(PlayerId::new("ann"), ConnectionId::new_v4(), "Ann").unwrap();
//! game.add_player(PlayerId::new("ben"), ConnectionId::new_v4(), "Ben").unwrap();
//!
//! // The second seat filled, so round one is dealt and Ann acts first.
//! assert_eq!(game.round(), 1);
//! assert_eq!(game.current_player(), Some(&PlayerId::new("ann")));
//! ```

/// Core game logic, entities, and rules enforcement.
pub mod game;
pub use game::{
    DiscardOutcome, Game, GameError, GameEvent, GameSettings, GameView, MeldError, Phase,
    RoundSummary,
    constants::{self, HAND_SIZE, LAST_ROUND, MAX_PLAYERS, STARTING_BUYS},
    entities::{self, Card, CardId, ConnectionId, PlayerId, Rank, Suit},
};

/// Async room actors and their registry.
pub mod room;
pub use room::{RoomActor, RoomConfig, RoomHandle, RoomManager, RoomResponse};
