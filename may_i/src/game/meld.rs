//! Meld validation.
//!
//! The checks here are pure: they look at a card group and decide whether it
//! is a set, a run, or both. Committing a meld, extending one and swapping a
//! wildcard out of one all go through [`classify`] before anything changes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    constants::MIN_MELD_LEN,
    entities::{Card, CardId, Seat},
    errors::MeldError,
};

pub type MeldId = usize;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum MeldKind {
    Set,
    Run,
    /// Satisfies both set and run rules. Only possible with heavy wildcard use.
    Either,
}

impl fmt::Display for MeldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Set => "set",
            Self::Run => "run",
            Self::Either => "set/run",
        };
        write!(f, "{repr}")
    }
}

/// Every natural card shares one order value. Wildcards match anything, so
/// a group of only wildcards is a set.
#[must_use]
pub fn is_set(cards: &[Card]) -> bool {
    let mut naturals = cards.iter().filter(|c| !c.is_wild);
    match naturals.next() {
        Some(first) => naturals.all(|c| c.order == first.order),
        None => true,
    }
}

/// Natural cards share one suit and, sorted by order, their gaps can all be
/// filled by the available wildcards. Spare wildcards extend the run.
#[must_use]
pub fn is_run(cards: &[Card]) -> bool {
    let wilds = cards.iter().filter(|c| c.is_wild).count();
    let mut naturals: Vec<&Card> = cards.iter().filter(|c| !c.is_wild).collect();
    let Some(first) = naturals.first() else {
        return true;
    };
    let suit = first.suit;
    if naturals.iter().any(|c| c.suit != suit) {
        return false;
    }

    naturals.sort_by_key(|c| c.order);
    let mut gaps = 0usize;
    for pair in naturals.windows(2) {
        let step = pair[1].order - pair[0].order;
        if step == 0 {
            return false;
        }
        gaps += usize::from(step - 1);
    }
    gaps <= wilds
}

/// Decide what kind of meld a group would be, or why it can't be one.
pub fn classify(cards: &[Card]) -> Result<MeldKind, MeldError> {
    if cards.len() < MIN_MELD_LEN {
        return Err(MeldError::TooFewCards {
            min: MIN_MELD_LEN,
            got: cards.len(),
        });
    }
    match (is_set(cards), is_run(cards)) {
        (true, true) => Ok(MeldKind::Either),
        (true, false) => Ok(MeldKind::Set),
        (false, true) => Ok(MeldKind::Run),
        (false, false) => Err(MeldError::NotSetOrRun),
    }
}

fn sort_by_order(cards: &mut [Card]) {
    cards.sort_by_key(|c| c.order);
}

/// A validated group of cards on the table.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Meld {
    pub id: MeldId,
    pub kind: MeldKind,
    cards: Vec<Card>,
    /// Seat of the player who laid it down. `None` for probe melds that are
    /// never placed on the table.
    pub owner: Option<Seat>,
}

impl Meld {
    pub fn new(id: MeldId, mut cards: Vec<Card>, owner: Option<Seat>) -> Result<Self, MeldError> {
        let kind = classify(&cards)?;
        sort_by_order(&mut cards);
        Ok(Self {
            id,
            kind,
            cards,
            owner,
        })
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// What the meld would become with `card` appended.
    pub fn check_add(&self, card: Card) -> Result<MeldKind, MeldError> {
        let mut candidate = self.cards.clone();
        candidate.push(card);
        classify(&candidate)
    }

    pub fn add_card(&mut self, card: Card) -> Result<(), MeldError> {
        self.kind = self.check_add(card)?;
        self.cards.push(card);
        sort_by_order(&mut self.cards);
        Ok(())
    }

    /// What the meld would become with the wildcard `meld_card` replaced by
    /// `replacement`.
    pub fn check_swap(&self, meld_card: CardId, replacement: Card) -> Result<MeldKind, MeldError> {
        let idx = self.position(meld_card)?;
        if !self.cards[idx].is_wild {
            return Err(MeldError::NotAWildcard(meld_card));
        }
        let mut candidate = self.cards.clone();
        candidate[idx] = replacement;
        classify(&candidate)
    }

    /// Replace a wildcard in place and hand it back.
    pub fn swap(&mut self, meld_card: CardId, replacement: Card) -> Result<Card, MeldError> {
        let kind = self.check_swap(meld_card, replacement)?;
        let idx = self.position(meld_card)?;
        let displaced = std::mem::replace(&mut self.cards[idx], replacement);
        self.kind = kind;
        sort_by_order(&mut self.cards);
        Ok(displaced)
    }

    /// First wildcard in the meld that `replacement` can legally stand in for.
    pub fn find_swappable_wildcard(&self, replacement: Card) -> Result<CardId, MeldError> {
        self.cards
            .iter()
            .filter(|c| c.is_wild)
            .map(|c| c.id)
            .find(|&id| self.check_swap(id, replacement).is_ok())
            .ok_or(MeldError::NoSwappableWildcard)
    }

    fn position(&self, card_id: CardId) -> Result<usize, MeldError> {
        self.cards
            .iter()
            .position(|c| c.id == card_id)
            .ok_or(MeldError::CardNotInMeld(card_id))
    }
}
