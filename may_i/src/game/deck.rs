use log::debug;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::collections::VecDeque;

use super::{
    constants::{DECK_COPIES, TOTAL_CARDS},
    entities::{Card, CardId, Rank, Suit},
    errors::GameError,
};

/// The draw pile and the discard pile of one room.
///
/// The front of the draw pile is the next card drawn. The back of the discard
/// pile is the visible top discard.
#[derive(Debug)]
pub struct Deck {
    draw_pile: VecDeque<Card>,
    discard_pile: Vec<Card>,
    rng: StdRng,
}

impl Default for Deck {
    fn default() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }
}

impl Deck {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A deck whose shuffles are reproducible.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            draw_pile: VecDeque::with_capacity(TOTAL_CARDS),
            discard_pile: Vec::with_capacity(TOTAL_CARDS),
            rng,
        }
    }

    /// Every card of a round in creation order. Ids are positional, so a
    /// given id names the same physical card in every round.
    #[must_use]
    pub fn fresh_cards() -> Vec<Card> {
        let mut cards = Vec::with_capacity(TOTAL_CARDS);
        for _ in 0..DECK_COPIES {
            for suit in Suit::ALL {
                for rank in Rank::ALL {
                    let id = cards.len() as CardId;
                    cards.push(Card::new(id, rank, suit));
                }
            }
        }
        cards
    }

    /// Cards a deal takes out of a fresh deck, hands plus the opening
    /// discard. `None` when that exceeds the deck.
    #[must_use]
    pub fn deal_size(player_count: usize, hand_size: usize) -> Option<usize> {
        player_count
            .checked_mul(hand_size)
            .and_then(|n| n.checked_add(1))
            .filter(|&n| n <= TOTAL_CARDS)
    }

    /// Rebuild and shuffle all cards, deal `hand_size` cards to each of
    /// `player_count` hands round-robin, then turn one card face up as the
    /// opening discard. Hands come back in dealing order.
    pub fn deal(
        &mut self,
        player_count: usize,
        hand_size: usize,
    ) -> Result<Vec<Vec<Card>>, GameError> {
        if Self::deal_size(player_count, hand_size).is_none() {
            return Err(GameError::DrawPileExhausted {
                requested: player_count.saturating_mul(hand_size).saturating_add(1),
            });
        }

        let mut cards = Self::fresh_cards();
        cards.shuffle(&mut self.rng);
        self.draw_pile = cards.into();
        self.discard_pile.clear();

        let mut hands: Vec<Vec<Card>> = (0..player_count)
            .map(|_| Vec::with_capacity(hand_size + 2))
            .collect();
        for _ in 0..hand_size {
            for hand in &mut hands {
                if let Some(card) = self.draw_pile.pop_front() {
                    hand.push(card);
                }
            }
        }
        if let Some(card) = self.draw_pile.pop_front() {
            self.discard_pile.push(card);
        }

        debug!(
            "dealt {player_count} hands of {hand_size}, {} cards left to draw",
            self.draw_pile.len()
        );
        Ok(hands)
    }

    /// Cards obtainable by drawing, counting a reshuffle of everything under
    /// the top discard.
    #[must_use]
    pub fn available_draws(&self) -> usize {
        self.draw_pile.len() + self.discard_pile.len().saturating_sub(1)
    }

    /// Draw `qty` cards from the front of the draw pile. When the draw pile
    /// runs short the discard pile (minus its top card) is shuffled back in
    /// first. Nothing moves if even that is not enough.
    pub fn draw(&mut self, qty: usize) -> Result<Vec<Card>, GameError> {
        if qty > self.available_draws() {
            return Err(GameError::DrawPileExhausted { requested: qty });
        }
        if qty > self.draw_pile.len() {
            self.reshuffle_from_discard();
        }
        Ok(self.draw_pile.drain(..qty).collect())
    }

    pub fn draw_one(&mut self) -> Result<Card, GameError> {
        let mut cards = self.draw(1)?;
        cards.pop().ok_or(GameError::DrawPileExhausted { requested: 1 })
    }

    pub fn discard(&mut self, card: Card) {
        self.discard_pile.push(card);
    }

    #[must_use]
    pub fn top_discard(&self) -> Option<&Card> {
        self.discard_pile.last()
    }

    pub fn take_top_discard(&mut self) -> Option<Card> {
        self.discard_pile.pop()
    }

    /// Move every discard except the visible top one back under the draw
    /// pile and shuffle them. Returns how many cards moved.
    pub fn reshuffle_from_discard(&mut self) -> usize {
        let Some(top) = self.discard_pile.pop() else {
            return 0;
        };
        let mut recycled: Vec<Card> = self.discard_pile.drain(..).collect();
        self.discard_pile.push(top);
        recycled.shuffle(&mut self.rng);
        let moved = recycled.len();
        self.draw_pile.extend(recycled);
        debug!("reshuffled {moved} discards into the draw pile");
        moved
    }

    /// Pick a uniformly random index below `len`. Shares the deck's RNG so
    /// a seeded room stays reproducible.
    pub(crate) fn random_index(&mut self, len: usize) -> Option<usize> {
        use rand::Rng;
        (len > 0).then(|| self.rng.random_range(0..len))
    }

    #[must_use]
    pub fn draw_pile_len(&self) -> usize {
        self.draw_pile.len()
    }

    #[must_use]
    pub fn discard_pile_len(&self) -> usize {
        self.discard_pile.len()
    }

    pub fn draw_pile(&self) -> impl Iterator<Item = &Card> {
        self.draw_pile.iter()
    }

    pub fn discard_pile(&self) -> impl Iterator<Item = &Card> {
        self.discard_pile.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.draw_pile.clear();
        self.discard_pile.clear();
    }
}
