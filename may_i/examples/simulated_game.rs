//! Simulated Game Example
//!
//! Plays a full seeded game of May I between greedy bots and prints the
//! final standings. Run with `RUST_LOG=info` (or `debug`) to follow along.

use may_i::{
    DiscardOutcome, Game, GameSettings,
    entities::{Card, CardId, ConnectionId, PlayerId},
    game::requirements::requirement_for,
};
use std::collections::BTreeMap;

/// Turns a round may last before it is called off and scored as is.
const TURN_LIMIT: usize = 400;

/// Pick card groups satisfying the round's first-meld requirement, if the
/// hand holds them. Only sets are tried since runs can't open a round.
fn find_first_meld(game: &Game, hand: &[Card]) -> Option<Vec<Vec<CardId>>> {
    let requirement = requirement_for(game.round())?;
    let mut by_order: BTreeMap<u8, Vec<CardId>> = BTreeMap::new();
    let mut wilds: Vec<CardId> = Vec::new();
    for card in hand {
        if card.is_wild {
            wilds.push(card.id);
        } else {
            by_order.entry(card.order).or_default().push(card.id);
        }
    }

    let mut piles: Vec<Vec<CardId>> = by_order.into_values().collect();
    piles.sort_by_key(|pile| std::cmp::Reverse(pile.len()));

    let mut groups = Vec::with_capacity(requirement.group_count);
    for mut pile in piles.into_iter().take(requirement.group_count) {
        // Keep at least two naturals so the group still reads as a set.
        if pile.len() < 2 {
            return None;
        }
        while pile.len() < requirement.min_length {
            pile.push(wilds.pop()?);
        }
        groups.push(pile);
    }
    if groups.len() < requirement.group_count {
        return None;
    }
    let used: usize = groups.iter().map(Vec::len).sum();
    (used < hand.len()).then_some(groups)
}

/// Card least likely to help: a lone natural if possible, never a wildcard
/// unless nothing else is left.
fn pick_discard(hand: &[Card]) -> Option<CardId> {
    let copies = |order: u8| hand.iter().filter(|c| !c.is_wild && c.order == order).count();
    hand.iter()
        .filter(|c| !c.is_wild)
        .min_by_key(|c| (copies(c.order), std::cmp::Reverse(c.value)))
        .or_else(|| hand.first())
        .map(|c| c.id)
}

/// Players who would like the top discard: it pairs with something in hand.
fn buy_candidates(game: &Game) -> Vec<PlayerId> {
    let Some(top) = game.deck().top_discard() else {
        return Vec::new();
    };
    game.players()
        .filter(|p| {
            top.is_wild
                || p.hand
                    .iter()
                    .filter(|c| !c.is_wild && c.order == top.order)
                    .count()
                    >= 2
        })
        .map(|p| p.id.clone())
        .collect()
}

/// Lay off every card that fits an existing meld, keeping one card back.
fn lay_off(game: &mut Game, player: &PlayerId) {
    loop {
        let Some(hand) = game.player(player).map(|p| p.hand.clone()) else {
            return;
        };
        if hand.len() <= 1 {
            return;
        }
        let fit = hand.iter().find_map(|card| {
            game.melds()
                .iter()
                .find(|m| m.check_add(*card).is_ok())
                .map(|m| (card.id, m.id))
        });
        match fit {
            Some((card, meld)) => {
                if game.add_to_meld(player, card, meld).is_err() {
                    return;
                }
            }
            None => return,
        }
    }
}

/// Play one turn for whoever is up. Returns true if the round ended.
fn play_turn(game: &mut Game) -> Result<bool, may_i::GameError> {
    if let Some(token) = game.open_buy_window() {
        let candidates = buy_candidates(game);
        match game.resolve_buy_window(token, &candidates) {
            Ok(Some((buyer, purchase))) => println!("  {buyer} buys {}", purchase.bought),
            Ok(None) => {}
            Err(e) => println!("  discard unsold: {e}"),
        }
    }

    let Some(current) = game.current_player().cloned() else {
        return Ok(true);
    };
    game.draw(&current, 1)?;

    let hand = game.player(&current).map(|p| p.hand.clone()).unwrap_or_default();
    if !game.has_meld(&current)
        && let Some(groups) = find_first_meld(game, &hand)
    {
        let ids = game.meld(&current, &groups)?;
        println!("  {current} lays down {} meld(s)", ids.len());
    }
    if game.has_meld(&current) {
        lay_off(game, &current);
    }

    let hand = game.player(&current).map(|p| p.hand.clone()).unwrap_or_default();
    let Some(card) = pick_discard(&hand) else {
        return Ok(false);
    };
    match game.discard(&current, card)? {
        DiscardOutcome::Continued => Ok(false),
        DiscardOutcome::RoundEnded(summary) => {
            println!("  {current} goes out! Scores: {:?}", summary.scores);
            Ok(true)
        }
    }
}

fn main() -> Result<(), may_i::GameError> {
    env_logger::init();

    println!("=== May I Simulated Game ===\n");

    let mut game = Game::with_seed(GameSettings::new(4), 2024);
    for name in ["Ada", "Bea", "Cal", "Dot"] {
        game.add_player(PlayerId::new(name), ConnectionId::new_v4(), name)?;
    }

    while !game.is_over() {
        let round = game.round();
        println!("Round {round}");

        let mut ended = false;
        for _ in 0..TURN_LIMIT {
            if play_turn(&mut game)? {
                ended = true;
                break;
            }
        }
        if !ended {
            let summary = game.end_round()?;
            println!("  Nobody went out, scores: {:?}", summary.scores);
        }
    }

    println!("\nFinal standings:");
    for (place, (player, points)) in game.standings().into_iter().enumerate() {
        println!("  {}. {player} - {points}", place + 1);
    }
    if let Some(winner) = game.winner() {
        println!("\n{winner} wins!");
    }

    Ok(())
}
