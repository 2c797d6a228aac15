//! Fixed sizing for the two-deck May I variant.

/// Number of full 52-card decks shuffled together each round.
pub const DECK_COPIES: usize = 2;

/// Cards in a single standard deck.
pub const CARDS_PER_DECK: usize = 52;

/// Total cards created for every round.
pub const TOTAL_CARDS: usize = DECK_COPIES * CARDS_PER_DECK;

/// Cards dealt to each player at the start of a round.
pub const HAND_SIZE: usize = 11;

/// Buys each player starts the game with.
pub const STARTING_BUYS: u8 = 6;

/// Final round of the game. A round counter past this means the game is over.
pub const LAST_ROUND: u8 = 6;

/// Smallest group that may ever be melded.
pub const MIN_MELD_LEN: usize = 3;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 8;
pub const DEFAULT_PLAYERS: usize = 4;

/// Limit applied to display names coming from clients.
pub const MAX_NAME_LENGTH: usize = 32;
