use serde::{Deserialize, Deserializer, Serialize};
use std::{borrow::Borrow, fmt};
use uuid::Uuid;

use super::constants::{MAX_NAME_LENGTH, STARTING_BUYS};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Sequence position used for run adjacency and set equality (ace low).
    #[must_use]
    pub const fn order(self) -> u8 {
        self as u8 + 1
    }

    /// Twos are wild.
    #[must_use]
    pub const fn is_wild(self) -> bool {
        matches!(self, Rank::Two)
    }

    /// Points charged for holding this rank when a round ends.
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Rank::Two => 20,
            Rank::Jack | Rank::Queen | Rank::King => 10,
            other => other.order(),
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Ace => "A",
            Self::Jack => "J",
            Self::Queen => "Q",
            Self::King => "K",
            other => return write!(f, "{}", other.order()),
        };
        write!(f, "{repr}")
    }
}

/// Identifier of a physical card. Both copies of the same rank and suit get
/// different ids.
pub type CardId = u16;

/// A card is immutable once created. `value`, `order` and `is_wild` are
/// derived from the rank when the card is built so the validator and scoring
/// never have to re-derive them.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Card {
    pub id: CardId,
    pub rank: Rank,
    pub suit: Suit,
    pub value: u8,
    pub order: u8,
    pub is_wild: bool,
}

impl Card {
    #[must_use]
    pub const fn new(id: CardId, rank: Rank, suit: Suit) -> Self {
        Self {
            id,
            rank,
            suit,
            value: rank.value(),
            order: rank.order(),
            is_wild: rank.is_wild(),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = format!("{}/{}", self.rank, self.suit);
        write!(f, "{repr:>4}")
    }
}

/// External-facing player identifier supplied by the session layer.
///
/// This is what clients know a player by. It can change when a client
/// reconnects, so nothing inside the engine keeps it as an ownership key.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(s: &str) -> Self {
        let id = s
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .take(MAX_NAME_LENGTH)
            .collect();
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Borrow<str> for PlayerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Opaque handle of the connection a player is currently reachable on.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    #[must_use]
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stable slot of a player within a room. Seats never change once assigned,
/// so turn order and meld ownership are expressed in seats.
pub type Seat = usize;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub connection: Option<ConnectionId>,
    pub name: String,
    pub buys: u8,
    pub points: u32,
    pub hand: Vec<Card>,
    /// Whether the player has drawn at least once this round. Melding is
    /// locked until they have.
    pub has_drawn: bool,
}

impl Player {
    pub fn new(id: PlayerId, connection: Option<ConnectionId>, name: &str) -> Self {
        let name = name.trim().chars().take(MAX_NAME_LENGTH).collect();
        Self {
            id,
            connection,
            name,
            buys: STARTING_BUYS,
            points: 0,
            hand: Vec::new(),
            has_drawn: false,
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    #[must_use]
    pub fn holds(&self, card_id: CardId) -> bool {
        self.hand.iter().any(|c| c.id == card_id)
    }

    #[must_use]
    pub fn find_card(&self, card_id: CardId) -> Option<Card> {
        self.hand.iter().copied().find(|c| c.id == card_id)
    }

    /// Remove a card from the hand by identity, preserving the display order
    /// of everything else.
    pub fn take_card(&mut self, card_id: CardId) -> Option<Card> {
        let idx = self.hand.iter().position(|c| c.id == card_id)?;
        Some(self.hand.remove(idx))
    }

    /// Sum of the values of every card still in hand.
    #[must_use]
    pub fn hand_value(&self) -> u32 {
        self.hand.iter().map(|c| u32::from(c.value)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Card Tests ===

    #[test]
    fn test_rank_orders_are_ace_low() {
        let orders: Vec<u8> = Rank::ALL.iter().map(|r| r.order()).collect();
        assert_eq!(orders, (1..=13).collect::<Vec<u8>>());
    }

    #[test]
    fn test_only_twos_are_wild() {
        for rank in Rank::ALL {
            assert_eq!(rank.is_wild(), rank == Rank::Two);
        }
    }

    #[test]
    fn test_rank_values() {
        assert_eq!(Rank::Ace.value(), 1);
        assert_eq!(Rank::Two.value(), 20);
        assert_eq!(Rank::Seven.value(), 7);
        assert_eq!(Rank::Ten.value(), 10);
        assert_eq!(Rank::Jack.value(), 10);
        assert_eq!(Rank::King.value(), 10);
    }

    #[test]
    fn test_card_derives_fields_from_rank() {
        let card = Card::new(7, Rank::Two, Suit::Heart);
        assert!(card.is_wild);
        assert_eq!(card.order, 2);
        assert_eq!(card.value, 20);

        let card = Card::new(8, Rank::Queen, Suit::Club);
        assert!(!card.is_wild);
        assert_eq!(card.order, 12);
        assert_eq!(card.value, 10);
    }

    #[test]
    fn test_card_display() {
        assert_eq!(format!("{}", Card::new(0, Rank::Ace, Suit::Spade)), " A/♠");
        assert_eq!(format!("{}", Card::new(0, Rank::Ten, Suit::Heart)), "10/♥");
    }

    // === PlayerId Tests ===

    #[test]
    fn test_player_id_sanitizes_whitespace() {
        assert_eq!(PlayerId::new("al ice").as_str(), "al_ice");
    }

    #[test]
    fn test_player_id_truncates() {
        let long = "x".repeat(MAX_NAME_LENGTH * 2);
        assert_eq!(PlayerId::new(&long).as_str().len(), MAX_NAME_LENGTH);
    }

    #[test]
    fn test_player_id_truncates_multibyte_on_char_boundary() {
        let long = "€".repeat(MAX_NAME_LENGTH + 1);
        let id = PlayerId::new(&long);
        assert_eq!(id.as_str().chars().count(), MAX_NAME_LENGTH);
        assert!(id.as_str().chars().all(|c| c == '€'));

        let id: PlayerId = serde_json::from_str(&format!("\"{}\"", "é".repeat(40))).unwrap();
        assert_eq!(id.as_str().chars().count(), MAX_NAME_LENGTH);
    }

    #[test]
    fn test_player_id_deserialize_sanitizes() {
        let id: PlayerId = serde_json::from_str("\"bob smith\"").unwrap();
        assert_eq!(id, PlayerId::new("bob_smith"));
    }

    // === Player Tests ===

    #[test]
    fn test_new_player_defaults() {
        let player = Player::new(PlayerId::new("alice"), None, "  Alice ");
        assert_eq!(player.name, "Alice");
        assert_eq!(player.buys, STARTING_BUYS);
        assert_eq!(player.points, 0);
        assert!(player.hand.is_empty());
        assert!(!player.is_connected());
    }

    #[test]
    fn test_player_name_truncates_multibyte() {
        let player = Player::new(PlayerId::new("ann"), None, &"€".repeat(11));
        assert_eq!(player.name, "€".repeat(11));

        let player = Player::new(PlayerId::new("ann"), None, &"日本".repeat(MAX_NAME_LENGTH));
        assert_eq!(player.name.chars().count(), MAX_NAME_LENGTH);
    }

    #[test]
    fn test_take_card_by_identity() {
        let mut player = Player::new(PlayerId::new("alice"), None, "Alice");
        player.hand = vec![
            Card::new(1, Rank::Five, Suit::Club),
            Card::new(53, Rank::Five, Suit::Club),
            Card::new(9, Rank::King, Suit::Heart),
        ];

        let taken = player.take_card(53).unwrap();
        assert_eq!(taken.id, 53);
        assert_eq!(player.hand.len(), 2);
        assert!(player.holds(1));
        assert!(!player.holds(53));
        assert!(player.take_card(53).is_none());
    }

    #[test]
    fn test_hand_value() {
        let mut player = Player::new(PlayerId::new("alice"), None, "Alice");
        player.hand = vec![
            Card::new(1, Rank::Two, Suit::Club),
            Card::new(2, Rank::King, Suit::Club),
            Card::new(3, Rank::Ace, Suit::Club),
        ];
        assert_eq!(player.hand_value(), 31);
    }
}
