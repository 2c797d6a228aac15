//! Per-player snapshots of a room.
//!
//! A view shows everything on the table but only the viewer's own hand.
//! Other hands are reduced to their size.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{
    entities::{Card, PlayerId},
    meld::{MeldId, MeldKind},
    state_machine::{Game, Phase},
};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub connected: bool,
    pub buys: u8,
    pub points: u32,
    pub hand_size: usize,
    pub has_melded: bool,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MeldView {
    pub id: MeldId,
    pub kind: MeldKind,
    pub owner: Option<PlayerId>,
    pub cards: Vec<Card>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameView {
    pub round: u8,
    pub phase: Phase,
    /// Player to act, in turn order position.
    pub turn: Option<PlayerId>,
    pub players: Vec<PlayerView>,
    pub melds: Vec<MeldView>,
    pub top_discard: Option<Card>,
    pub draw_pile_size: usize,
    pub discard_pile_size: usize,
    /// The viewer's own cards.
    pub hand: Vec<Card>,
}

pub type GameViews = HashMap<PlayerId, GameView>;

impl Game {
    /// Snapshot of the room as `viewer` is allowed to see it.
    #[must_use]
    pub fn view_for(&self, viewer: &PlayerId) -> Option<GameView> {
        let hand = self.player(viewer)?.hand.clone();
        let players = self
            .players()
            .map(|p| PlayerView {
                id: p.id.clone(),
                name: p.name.clone(),
                connected: p.is_connected(),
                buys: p.buys,
                points: p.points,
                hand_size: p.hand.len(),
                has_melded: self.has_meld(&p.id),
            })
            .collect();
        let melds = self
            .melds()
            .iter()
            .map(|m| MeldView {
                id: m.id,
                kind: m.kind,
                owner: self.meld_owner(m).cloned(),
                cards: m.cards().to_vec(),
            })
            .collect();

        Some(GameView {
            round: self.round(),
            phase: self.phase(),
            turn: self.current_player().cloned(),
            players,
            melds,
            top_discard: self.deck().top_discard().copied(),
            draw_pile_size: self.deck().draw_pile_len(),
            discard_pile_size: self.deck().discard_pile_len(),
            hand,
        })
    }

    /// One view per seated player.
    #[must_use]
    pub fn views(&self) -> GameViews {
        self.players()
            .filter_map(|p| self.view_for(&p.id).map(|view| (p.id.clone(), view)))
            .collect()
    }
}
