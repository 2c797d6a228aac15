//! May I room orchestrator.
//!
//! [`Game`] is the single entry point for everything that happens in a room.
//! It owns the deck, the players, the turn order and the melds on the table,
//! and it validates every move completely before changing anything, so a
//! rejected call leaves the room exactly as it was.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet, VecDeque},
    fmt,
};

use super::{
    constants::{
        DEFAULT_PLAYERS, HAND_SIZE, LAST_ROUND, MAX_PLAYERS, MIN_PLAYERS, STARTING_BUYS, TOTAL_CARDS,
    },
    deck::Deck,
    entities::{Card, CardId, ConnectionId, Player, PlayerId, Seat},
    errors::GameError,
    meld::{Meld, MeldId, MeldKind, classify},
    requirements::{is_playable_round, requirement_for},
    windows::{WindowKind, WindowToken, WindowTracker},
};

/// Game configuration settings
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSettings {
    /// Players needed before the first deal.
    pub player_count: usize,
    pub starting_buys: u8,
    pub hand_size: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::new(DEFAULT_PLAYERS)
    }
}

impl GameSettings {
    #[must_use]
    pub const fn new(player_count: usize) -> Self {
        Self {
            player_count,
            starting_buys: STARTING_BUYS,
            hand_size: HAND_SIZE,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.player_count) {
            return Err(format!(
                "Player count must be between {MIN_PLAYERS} and {MAX_PLAYERS}"
            ));
        }
        if self.hand_size == 0 {
            return Err("Hand size must be positive".to_string());
        }
        if Deck::deal_size(self.player_count, self.hand_size).is_none() {
            return Err(format!(
                "{} hands of {} do not fit in a {TOTAL_CARDS}-card deck",
                self.player_count, self.hand_size
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Phase {
    /// Waiting for seats to fill.
    Lobby,
    Playing,
    GameOver,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Lobby => "lobby",
            Self::Playing => "playing",
            Self::GameOver => "game over",
        };
        write!(f, "{repr}")
    }
}

/// Events that occur during gameplay
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum GameEvent {
    Joined(PlayerId),
    Dealt { round: u8 },
    Drew { player: PlayerId, count: usize },
    Discarded { player: PlayerId, card: Card },
    AutoDiscarded { player: PlayerId, card: Card },
    Bought { player: PlayerId, card: Card },
    Melded { player: PlayerId, melds: Vec<MeldId> },
    Swapped { player: PlayerId, meld: MeldId },
    AddedToMeld { player: PlayerId, meld: MeldId },
    RoundEnded { round: u8 },
    GameOver,
    Reconnected { old: PlayerId, new: PlayerId },
    Disconnected(PlayerId),
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Joined(player) => format!("{player} joined the room"),
            Self::Dealt { round } => format!("round {round} dealt"),
            Self::Drew { player, count } => format!("{player} drew {count}"),
            Self::Discarded { player, card } => format!("{player} discarded {card}"),
            Self::AutoDiscarded { player, card } => {
                format!("{player} ran out of time and discarded {card}")
            }
            Self::Bought { player, card } => format!("{player} bought {card}"),
            Self::Melded { player, melds } => format!("{player} laid down {} meld(s)", melds.len()),
            Self::Swapped { player, meld } => format!("{player} swapped into meld {meld}"),
            Self::AddedToMeld { player, meld } => format!("{player} added to meld {meld}"),
            Self::RoundEnded { round } => format!("round {round} over"),
            Self::GameOver => "game over".to_string(),
            Self::Reconnected { old, new } => format!("{old} reconnected as {new}"),
            Self::Disconnected(player) => format!("{player} disconnected"),
        };
        write!(f, "{repr}")
    }
}

/// Cards moved by a successful buy.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Purchase {
    pub bought: Card,
    pub extra: Card,
}

/// Scoring for a finished round.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundSummary {
    pub round: u8,
    /// Points each player picked up this round, in turn order.
    pub scores: Vec<(PlayerId, u32)>,
    pub game_over: bool,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum DiscardOutcome {
    Continued,
    /// The discard emptied the player's hand.
    RoundEnded(RoundSummary),
}

/// A discard made for a player whose discard window ran out.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AutoDiscard {
    pub player: PlayerId,
    pub card: Card,
    pub outcome: DiscardOutcome,
}

/// One May I room: seats, deck, melds and the turn/round counters.
///
/// Players live in an arena indexed by [`Seat`]. Turn order and meld
/// ownership point at seats, and the external [`PlayerId`] is only a lookup
/// key, so reconnecting under a new id rebinds one map entry.
#[derive(Debug)]
pub struct Game {
    players: Vec<Player>,
    seats: HashMap<PlayerId, Seat>,
    turn_order: Vec<Seat>,
    /// Index into `turn_order` of the player to act.
    turn: usize,
    round: u8,
    phase: Phase,
    deck: Deck,
    melds: Vec<Meld>,
    next_meld_id: MeldId,
    last_discarder: Option<Seat>,
    connected: usize,
    windows: WindowTracker,
    events: VecDeque<GameEvent>,
    settings: GameSettings,
}

impl Default for Game {
    fn default() -> Self {
        GameSettings::default().into()
    }
}

impl From<GameSettings> for Game {
    fn from(settings: GameSettings) -> Self {
        Self::with_deck(settings, Deck::new())
    }
}

impl Game {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A game whose shuffles and auto-discards are reproducible.
    #[must_use]
    pub fn with_seed(settings: GameSettings, seed: u64) -> Self {
        Self::with_deck(settings, Deck::with_seed(seed))
    }

    fn with_deck(settings: GameSettings, deck: Deck) -> Self {
        Self {
            players: Vec::with_capacity(settings.player_count),
            seats: HashMap::with_capacity(settings.player_count),
            turn_order: Vec::with_capacity(settings.player_count),
            turn: 0,
            round: 1,
            phase: Phase::Lobby,
            deck,
            melds: Vec::new(),
            next_meld_id: 0,
            last_discarder: None,
            connected: 0,
            windows: WindowTracker::default(),
            events: VecDeque::new(),
            settings,
        }
    }

    // === Queries ===

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current round. Past [`LAST_ROUND`] once the game is over.
    #[must_use]
    pub fn round(&self) -> u8 {
        self.round
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.round > LAST_ROUND
    }

    #[must_use]
    pub fn turn(&self) -> usize {
        self.turn
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn connected_count(&self) -> usize {
        self.connected
    }

    #[must_use]
    pub fn contains_player(&self, id: &PlayerId) -> bool {
        self.seats.contains_key(id)
    }

    #[must_use]
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.seats.get(id).map(|&seat| &self.players[seat])
    }

    /// Players in turn order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.turn_order.iter().map(|&seat| &self.players[seat])
    }

    #[must_use]
    pub fn turn_order(&self) -> Vec<&PlayerId> {
        self.players().map(|p| &p.id).collect()
    }

    /// Player whose turn it is, once cards are dealt.
    #[must_use]
    pub fn current_player(&self) -> Option<&PlayerId> {
        if self.phase != Phase::Playing {
            return None;
        }
        self.turn_order
            .get(self.turn)
            .map(|&seat| &self.players[seat].id)
    }

    #[must_use]
    pub fn melds(&self) -> &[Meld] {
        &self.melds
    }

    #[must_use]
    pub fn meld_by_id(&self, id: MeldId) -> Option<&Meld> {
        self.melds.iter().find(|m| m.id == id)
    }

    /// External id of a meld's owner.
    #[must_use]
    pub fn meld_owner(&self, meld: &Meld) -> Option<&PlayerId> {
        meld.owner.map(|seat| &self.players[seat].id)
    }

    #[must_use]
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    #[must_use]
    pub fn has_meld(&self, player: &PlayerId) -> bool {
        self.seats
            .get(player)
            .is_some_and(|&seat| self.seat_has_meld(seat))
    }

    fn seat_has_meld(&self, seat: Seat) -> bool {
        self.melds.iter().any(|m| m.owner == Some(seat))
    }

    /// Every card currently in play: draw pile, discard pile, hands and melds.
    #[must_use]
    pub fn cards_in_play(&self) -> usize {
        self.deck.draw_pile_len()
            + self.deck.discard_pile_len()
            + self.players.iter().map(|p| p.hand.len()).sum::<usize>()
            + self.melds.iter().map(Meld::len).sum::<usize>()
    }

    /// Players ordered by points, fewest first. Ties keep turn order.
    #[must_use]
    pub fn standings(&self) -> Vec<(&PlayerId, u32)> {
        let mut standings: Vec<(&PlayerId, u32)> =
            self.players().map(|p| (&p.id, p.points)).collect();
        standings.sort_by_key(|&(_, points)| points);
        standings
    }

    /// Lowest score once the game is over.
    #[must_use]
    pub fn winner(&self) -> Option<&PlayerId> {
        if !self.is_over() {
            return None;
        }
        self.standings().first().map(|&(id, _)| id)
    }

    pub fn drain_events(&mut self) -> VecDeque<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn seat_of(&self, id: &PlayerId) -> Result<Seat, GameError> {
        self.seats
            .get(id)
            .copied()
            .ok_or_else(|| GameError::UnknownPlayer(id.clone()))
    }

    fn current_seat(&self) -> Option<Seat> {
        self.turn_order.get(self.turn).copied()
    }

    fn ensure_playing(&self) -> Result<(), GameError> {
        match self.phase {
            Phase::Playing => Ok(()),
            Phase::Lobby => Err(GameError::RoundNotActive),
            Phase::GameOver => Err(GameError::GameOver),
        }
    }

    /// Seat of a player allowed to touch the table: the round is live and
    /// they have drawn at least once this round.
    fn ensure_can_meld(&self, id: &PlayerId) -> Result<Seat, GameError> {
        self.ensure_playing()?;
        let seat = self.seat_of(id)?;
        if !self.players[seat].has_drawn {
            return Err(GameError::MustDrawFirst);
        }
        Ok(seat)
    }

    // === Seating ===

    /// Seat a new player. Joining twice with the same id is a no-op and
    /// returns `Ok(false)`. Filling the last seat deals the first round.
    pub fn add_player(
        &mut self,
        id: PlayerId,
        connection: ConnectionId,
        name: &str,
    ) -> Result<bool, GameError> {
        if self.seats.contains_key(&id) {
            return Ok(false);
        }
        if self.players.len() >= self.settings.player_count {
            return Err(GameError::CapacityReached);
        }
        // The last seat deals, so make sure the deal fits before seating.
        let fills_room = self.players.len() + 1 == self.settings.player_count;
        let (players, hand_size) = (self.settings.player_count, self.settings.hand_size);
        if fills_room && Deck::deal_size(players, hand_size).is_none() {
            return Err(GameError::DrawPileExhausted {
                requested: players.saturating_mul(hand_size).saturating_add(1),
            });
        }

        let seat = self.players.len();
        let mut player = Player::new(id.clone(), Some(connection), name);
        player.buys = self.settings.starting_buys;
        self.players.push(player);
        self.seats.insert(id.clone(), seat);
        self.turn_order.push(seat);
        self.connected += 1;
        info!("{id} took seat {seat}");
        self.events.push_back(GameEvent::Joined(id));

        if fills_room {
            self.deal()?;
        }
        Ok(true)
    }

    /// Point a seat at a new id and connection. Hand, buys, points and melds
    /// stay with the seat.
    pub fn reconnect(
        &mut self,
        old: &PlayerId,
        new: PlayerId,
        connection: ConnectionId,
    ) -> Result<(), GameError> {
        let seat = self.seat_of(old)?;
        if &new != old && self.seats.contains_key(&new) {
            return Err(GameError::PlayerAlreadyExists(new));
        }

        self.seats.remove(old);
        self.seats.insert(new.clone(), seat);
        let player = &mut self.players[seat];
        player.id = new.clone();
        if player.connection.replace(connection).is_none() {
            self.connected += 1;
        }
        info!("{old} reconnected as {new} on seat {seat}");
        self.events.push_back(GameEvent::Reconnected {
            old: old.clone(),
            new,
        });
        Ok(())
    }

    /// Drop a player's connection but keep their seat. Returns whether they
    /// were connected.
    pub fn disconnect(&mut self, id: &PlayerId) -> Result<bool, GameError> {
        let seat = self.seat_of(id)?;
        if self.players[seat].connection.take().is_none() {
            return Ok(false);
        }
        self.connected -= 1;
        info!("{id} disconnected from seat {seat}");
        self.events.push_back(GameEvent::Disconnected(id.clone()));
        Ok(true)
    }

    // === Round flow ===

    /// Deal the current round: fresh shuffled cards, a full hand per player
    /// in turn order, and one opening discard.
    pub fn deal(&mut self) -> Result<(), GameError> {
        if !is_playable_round(self.round) {
            return Err(GameError::GameOver);
        }
        let hands = self
            .deck
            .deal(self.turn_order.len(), self.settings.hand_size)?;
        for (&seat, hand) in self.turn_order.iter().zip(hands) {
            let player = &mut self.players[seat];
            player.hand = hand;
            player.has_drawn = false;
        }
        self.melds.clear();
        self.next_meld_id = 0;
        self.last_discarder = None;
        self.windows.cancel_all();
        self.phase = Phase::Playing;
        info!("round {} dealt to {} players", self.round, self.players.len());
        self.events.push_back(GameEvent::Dealt { round: self.round });
        Ok(())
    }

    /// Move `qty` cards from the draw pile into a player's hand. Turn order
    /// is the caller's concern here because buys draw out of turn.
    pub fn draw(&mut self, id: &PlayerId, qty: usize) -> Result<Vec<Card>, GameError> {
        self.ensure_playing()?;
        let seat = self.seat_of(id)?;
        let drawn = self.deck.draw(qty)?;
        let player = &mut self.players[seat];
        player.hand.extend_from_slice(&drawn);
        player.has_drawn = true;
        debug!("{id} drew {qty}");
        self.events.push_back(GameEvent::Drew {
            player: id.clone(),
            count: qty,
        });
        Ok(drawn)
    }

    /// Discard a card and pass the turn. Emptying the hand ends the round.
    pub fn discard(&mut self, id: &PlayerId, card_id: CardId) -> Result<DiscardOutcome, GameError> {
        let (card, outcome) = self.discard_inner(id, card_id)?;
        self.events.push_back(GameEvent::Discarded {
            player: id.clone(),
            card,
        });
        Ok(outcome)
    }

    fn discard_inner(
        &mut self,
        id: &PlayerId,
        card_id: CardId,
    ) -> Result<(Card, DiscardOutcome), GameError> {
        self.ensure_playing()?;
        let seat = self.seat_of(id)?;
        if self.current_seat() != Some(seat) {
            return Err(GameError::OutOfTurnAction);
        }
        let card = self.players[seat]
            .take_card(card_id)
            .ok_or(GameError::CardNotInHand(card_id))?;

        self.deck.discard(card);
        self.last_discarder = Some(seat);
        self.turn = (self.turn + 1) % self.turn_order.len();
        self.windows.cancel_all();
        debug!("{id} discarded {card}");

        if self.players[seat].hand.is_empty() {
            info!("{id} went out in round {}", self.round);
            let summary = self.end_round()?;
            return Ok((card, DiscardOutcome::RoundEnded(summary)));
        }
        Ok((card, DiscardOutcome::Continued))
    }

    /// Who gets the top discard among `candidates`.
    ///
    /// Priority walks the table from the player about to act, skipping the
    /// player who made the discard, and goes to the first candidate that
    /// still has buys.
    #[must_use]
    pub fn determine_buy(&self, candidates: &[PlayerId]) -> Option<PlayerId> {
        self.buy_priority(candidates).into_iter().next()
    }

    /// Every eligible candidate, highest priority first.
    fn buy_priority(&self, candidates: &[PlayerId]) -> Vec<PlayerId> {
        let n = self.turn_order.len();
        (0..n)
            .map(|offset| self.turn_order[(self.turn + offset) % n])
            .filter(|&seat| Some(seat) != self.last_discarder)
            .map(|seat| &self.players[seat])
            .filter(|p| p.buys > 0 && candidates.contains(&p.id))
            .map(|p| p.id.clone())
            .collect()
    }

    /// Spend a buy: take the top discard plus one extra card from the draw
    /// pile.
    pub fn buy(&mut self, id: &PlayerId) -> Result<Purchase, GameError> {
        self.ensure_playing()?;
        let seat = self.seat_of(id)?;
        if self.players[seat].buys == 0 {
            return Err(GameError::NoBuysRemaining);
        }
        let discards = self.deck.discard_pile_len();
        if discards == 0 {
            return Err(GameError::DiscardPileEmpty);
        }
        // After the top discard leaves, whatever sits under the new top can
        // still be recycled.
        if self.deck.draw_pile_len() + discards.saturating_sub(2) == 0 {
            return Err(GameError::DrawPileExhausted { requested: 1 });
        }

        let bought = self
            .deck
            .take_top_discard()
            .ok_or(GameError::DiscardPileEmpty)?;
        let extra = self.deck.draw_one()?;
        let player = &mut self.players[seat];
        player.buys -= 1;
        player.hand.push(bought);
        player.hand.push(extra);
        player.has_drawn = true;
        info!("{id} bought {bought}, {} buys left", player.buys);
        self.events.push_back(GameEvent::Bought {
            player: id.clone(),
            card: bought,
        });
        Ok(Purchase { bought, extra })
    }

    /// Lay down one or more groups from a player's hand.
    ///
    /// A player's first meld of the round has to match the round's
    /// requirement exactly and may not contain runs. After that, any valid
    /// groups are accepted. Melding can never empty a hand.
    pub fn meld(&mut self, id: &PlayerId, groups: &[Vec<CardId>]) -> Result<Vec<MeldId>, GameError> {
        let seat = self.ensure_can_meld(id)?;
        let player = &self.players[seat];

        let mut seen = HashSet::new();
        let mut card_groups = Vec::with_capacity(groups.len());
        let mut kinds = Vec::with_capacity(groups.len());
        for group in groups {
            let mut cards = Vec::with_capacity(group.len());
            for &card_id in group {
                if !seen.insert(card_id) {
                    return Err(GameError::DuplicateCard(card_id));
                }
                cards.push(
                    player
                        .find_card(card_id)
                        .ok_or(GameError::CardNotInHand(card_id))?,
                );
            }
            kinds.push(classify(&cards)?);
            card_groups.push(cards);
        }
        if card_groups.is_empty() {
            return Err(GameError::RoundRequirementNotMet {
                round: self.round,
                groups: 1,
                min_length: 0,
            });
        }
        if seen.len() >= player.hand.len() {
            return Err(GameError::WouldEmptyHand);
        }

        if !self.seat_has_meld(seat) {
            let requirement = requirement_for(self.round).ok_or(GameError::RoundNotActive)?;
            let shape_ok = card_groups.len() == requirement.group_count
                && card_groups.iter().all(|g| g.len() >= requirement.min_length);
            if !shape_ok {
                return Err(GameError::RoundRequirementNotMet {
                    round: self.round,
                    groups: requirement.group_count,
                    min_length: requirement.min_length,
                });
            }
            if !requirement.initial_run_allowed && kinds.contains(&MeldKind::Run) {
                return Err(GameError::InitialRunNotAllowed);
            }
        }

        let mut ids = Vec::with_capacity(card_groups.len());
        for cards in card_groups {
            let meld = Meld::new(self.next_meld_id, cards, Some(seat))?;
            self.next_meld_id += 1;
            ids.push(meld.id);
            self.melds.push(meld);
        }
        self.players[seat].hand.retain(|c| !seen.contains(&c.id));
        info!("{id} melded {ids:?} in round {}", self.round);
        self.events.push_back(GameEvent::Melded {
            player: id.clone(),
            melds: ids.clone(),
        });
        Ok(ids)
    }

    /// Trade a card from hand for a wildcard sitting in any meld. Only
    /// players who already melded this round may do this. Returns the
    /// wildcard now in their hand.
    pub fn swap_with_meld(
        &mut self,
        id: &PlayerId,
        card_id: CardId,
        meld_id: MeldId,
    ) -> Result<Card, GameError> {
        let seat = self.ensure_can_meld(id)?;
        if !self.seat_has_meld(seat) {
            return Err(GameError::MeldRequired);
        }
        let card = self.players[seat]
            .find_card(card_id)
            .ok_or(GameError::CardNotInHand(card_id))?;
        let idx = self.meld_index(meld_id)?;
        let wildcard = self.melds[idx].find_swappable_wildcard(card)?;

        let displaced = self.melds[idx].swap(wildcard, card)?;
        let player = &mut self.players[seat];
        player.take_card(card_id);
        player.hand.push(displaced);
        debug!("{id} swapped {card} for {displaced} in meld {meld_id}");
        self.events.push_back(GameEvent::Swapped {
            player: id.clone(),
            meld: meld_id,
        });
        Ok(displaced)
    }

    /// Play a single card onto any meld. The player has to have melded this
    /// round and must keep at least one card.
    pub fn add_to_meld(
        &mut self,
        id: &PlayerId,
        card_id: CardId,
        meld_id: MeldId,
    ) -> Result<(), GameError> {
        let seat = self.ensure_can_meld(id)?;
        if !self.seat_has_meld(seat) {
            return Err(GameError::MeldRequired);
        }
        let player = &self.players[seat];
        let card = player
            .find_card(card_id)
            .ok_or(GameError::CardNotInHand(card_id))?;
        if player.hand.len() <= 1 {
            return Err(GameError::WouldEmptyHand);
        }
        let idx = self.meld_index(meld_id)?;

        self.melds[idx].add_card(card)?;
        self.players[seat].take_card(card_id);
        debug!("{id} added {card} to meld {meld_id}");
        self.events.push_back(GameEvent::AddedToMeld {
            player: id.clone(),
            meld: meld_id,
        });
        Ok(())
    }

    fn meld_index(&self, meld_id: MeldId) -> Result<usize, GameError> {
        self.melds
            .iter()
            .position(|m| m.id == meld_id)
            .ok_or(GameError::UnknownMeld(meld_id))
    }

    /// Score what is left in every hand, clear the table and move to the next
    /// round, dealing it unless the game just finished.
    pub fn end_round(&mut self) -> Result<RoundSummary, GameError> {
        self.ensure_playing()?;
        let finished = self.round;

        let mut scores = Vec::with_capacity(self.players.len());
        for &seat in &self.turn_order {
            let player = &mut self.players[seat];
            let scored = player.hand_value();
            player.points += scored;
            player.hand.clear();
            player.has_drawn = false;
            scores.push((player.id.clone(), scored));
        }
        self.melds.clear();
        self.deck.clear();
        self.last_discarder = None;
        self.windows.cancel_all();
        self.round += 1;
        info!("round {finished} over: {scores:?}");
        self.events.push_back(GameEvent::RoundEnded { round: finished });

        let game_over = self.is_over();
        if game_over {
            self.phase = Phase::GameOver;
            info!("game over after {finished} rounds");
            self.events.push_back(GameEvent::GameOver);
        } else {
            self.deal()?;
        }
        Ok(RoundSummary {
            round: finished,
            scores,
            game_over,
        })
    }

    // === Timed windows ===

    /// Open the buy window for the discard that just landed.
    pub fn open_buy_window(&mut self) -> Option<WindowToken> {
        if self.phase != Phase::Playing || self.deck.top_discard().is_none() {
            return None;
        }
        Some(self.windows.open(WindowKind::Buy))
    }

    /// Open the window in which the acting player has to discard.
    pub fn open_discard_window(&mut self) -> Option<WindowToken> {
        if self.phase != Phase::Playing {
            return None;
        }
        Some(self.windows.open(WindowKind::Discard))
    }

    /// Drop a pending window without running its expiry.
    pub fn cancel_window(&mut self, token: WindowToken) -> bool {
        self.windows.close(token)
    }

    #[must_use]
    pub fn open_window(&self) -> Option<WindowToken> {
        self.windows.current()
    }

    /// Close a buy window and hand the discard to whoever has priority
    /// among `candidates`. A candidate whose purchase is refused is passed
    /// over for the next one. Does nothing for a stale token.
    ///
    /// Returns the last refusal when every eligible candidate was refused,
    /// e.g. because there is nothing left to draw as the extra card. The
    /// window is closed either way.
    pub fn resolve_buy_window(
        &mut self,
        token: WindowToken,
        candidates: &[PlayerId],
    ) -> Result<Option<(PlayerId, Purchase)>, GameError> {
        if token.kind != WindowKind::Buy || !self.windows.close(token) {
            return Ok(None);
        }
        let mut refusal = None;
        for buyer in self.buy_priority(candidates) {
            match self.buy(&buyer) {
                Ok(purchase) => return Ok(Some((buyer, purchase))),
                Err(e) => {
                    debug!("{buyer} could not buy: {e}");
                    refusal = Some(e);
                }
            }
        }
        match refusal {
            Some(e) => Err(e),
            None => {
                debug!("buy window closed with no eligible buyer");
                Ok(None)
            }
        }
    }

    /// Discard a uniformly random card for the acting player once their
    /// discard window runs out. Does nothing for a stale token, which is
    /// what a manual discard leaves behind.
    pub fn expire_discard_window(
        &mut self,
        token: WindowToken,
    ) -> Result<Option<AutoDiscard>, GameError> {
        if token.kind != WindowKind::Discard || !self.windows.close(token) {
            return Ok(None);
        }
        let Some(seat) = self.current_seat() else {
            return Ok(None);
        };
        let hand_len = self.players[seat].hand.len();
        let Some(idx) = self.deck.random_index(hand_len) else {
            return Ok(None);
        };
        let player = self.players[seat].id.clone();
        let card_id = self.players[seat].hand[idx].id;

        let (card, outcome) = self.discard_inner(&player, card_id)?;
        info!("{player} timed out, discarded {card}");
        self.events.push_back(GameEvent::AutoDiscarded {
            player: player.clone(),
            card,
        });
        Ok(Some(AutoDiscard {
            player,
            card,
            outcome,
        }))
    }
}
