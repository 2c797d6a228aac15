/// Property-based tests for meld validation and card conservation
///
/// The validator is checked against generated sets and runs with wildcards
/// mixed in, and whole rooms are driven with random move sequences to make
/// sure no move loses or duplicates a card.
use may_i::{
    Game, GameError, GameSettings, Phase,
    constants::{STARTING_BUYS, TOTAL_CARDS},
    entities::{Card, CardId, ConnectionId, PlayerId, Rank, Suit},
    game::{
        MeldError,
        meld::{MeldKind, classify},
    },
};
use proptest::prelude::*;

fn suit_strategy() -> impl Strategy<Value = Suit> {
    prop::sample::select(Suit::ALL.to_vec())
}

fn natural_rank_strategy() -> impl Strategy<Value = Rank> {
    let naturals: Vec<Rank> = Rank::ALL.into_iter().filter(|r| !r.is_wild()).collect();
    prop::sample::select(naturals)
}

fn wildcards(count: usize, first_id: CardId) -> Vec<Card> {
    (0..count)
        .map(|i| Card::new(first_id + i as CardId, Rank::Two, Suit::ALL[i % 4]))
        .collect()
}

proptest! {
    #[test]
    fn test_same_rank_naturals_are_a_set(
        rank in natural_rank_strategy(),
        suits in prop::collection::vec(suit_strategy(), 3..=8),
    ) {
        let cards: Vec<Card> = suits
            .iter()
            .enumerate()
            .map(|(i, &suit)| Card::new(i as CardId, rank, suit))
            .collect();
        prop_assert_eq!(classify(&cards), Ok(MeldKind::Set));
    }

    #[test]
    fn test_wildcards_fill_sets(
        rank in natural_rank_strategy(),
        suits in prop::collection::vec(suit_strategy(), 1..=5),
        wild_count in 0usize..=3,
    ) {
        prop_assume!(suits.len() + wild_count >= 3);
        let mut cards: Vec<Card> = suits
            .iter()
            .enumerate()
            .map(|(i, &suit)| Card::new(i as CardId, rank, suit))
            .collect();
        cards.extend(wildcards(wild_count, 100));

        let kind = classify(&cards);
        prop_assert!(
            matches!(kind, Ok(MeldKind::Set | MeldKind::Either)),
            "got {:?}", kind
        );
    }

    #[test]
    fn test_consecutive_suited_cards_are_a_run(
        suit in suit_strategy(),
        start in 0usize..11,
        len in 3usize..=8,
    ) {
        let end = (start + len).min(Rank::ALL.len());
        prop_assume!(end - start >= 3);
        let cards: Vec<Card> = Rank::ALL[start..end]
            .iter()
            .enumerate()
            .map(|(i, &rank)| Card::new(i as CardId, rank, suit))
            .collect();
        prop_assert_eq!(classify(&cards), Ok(MeldKind::Run));
    }

    #[test]
    fn test_wildcards_stand_in_for_run_cards(
        suit in suit_strategy(),
        start in 2usize..8,
        replaced in prop::collection::vec(any::<bool>(), 5),
    ) {
        // Threes through Kings only, so the sole wildcards are the stand-ins.
        let cards: Vec<Card> = Rank::ALL[start..start + 5]
            .iter()
            .zip(&replaced)
            .enumerate()
            .map(|(i, (&rank, &wild))| {
                let rank = if wild { Rank::Two } else { rank };
                Card::new(i as CardId, rank, suit)
            })
            .collect();

        let kind = classify(&cards);
        prop_assert!(
            matches!(kind, Ok(MeldKind::Run | MeldKind::Either)),
            "got {:?}", kind
        );
    }

    #[test]
    fn test_short_groups_are_rejected(
        rank in natural_rank_strategy(),
        suits in prop::collection::vec(suit_strategy(), 0..3),
    ) {
        let cards: Vec<Card> = suits
            .iter()
            .enumerate()
            .map(|(i, &suit)| Card::new(i as CardId, rank, suit))
            .collect();
        prop_assert_eq!(
            classify(&cards),
            Err(MeldError::TooFewCards { min: 3, got: cards.len() })
        );
    }

    #[test]
    fn test_classify_is_order_independent(
        rank in natural_rank_strategy(),
        suit in suit_strategy(),
        wild_count in 0usize..=2,
    ) {
        let mut cards = vec![
            Card::new(0, rank, suit),
            Card::new(1, rank, Suit::Heart),
            Card::new(2, rank, Suit::Club),
        ];
        cards.extend(wildcards(wild_count, 10));
        let forward = classify(&cards);
        cards.reverse();
        prop_assert_eq!(classify(&cards), forward);
    }
}

fn seated_game(players: usize, seed: u64) -> Game {
    let mut game = Game::with_seed(GameSettings::new(players), seed);
    for i in 0..players {
        let name = format!("p{i}");
        game.add_player(PlayerId::new(&name), ConnectionId::new_v4(), &name)
            .unwrap();
    }
    game
}

/// Apply one generated move. Moves are allowed to be illegal.
fn apply_move(game: &mut Game, kind: u8, who: usize, pick: usize) -> Result<(), GameError> {
    let seats: Vec<PlayerId> = game.turn_order().into_iter().cloned().collect();
    let actor = seats[who % seats.len()].clone();
    let hand: Vec<CardId> = game
        .player(&actor)
        .map(|p| p.hand.iter().map(|c| c.id).collect())
        .unwrap_or_default();
    let card = hand.get(pick % hand.len().max(1)).copied().unwrap_or(0);

    match kind {
        0 => game.draw(&actor, 1 + pick % 2).map(drop),
        1 => game.discard(&actor, card).map(drop),
        2 => game.buy(&actor).map(drop),
        3 => game.add_to_meld(&actor, card, pick % 4).map(drop),
        4 => game.swap_with_meld(&actor, card, pick % 4).map(drop),
        _ => {
            let split = hand.len() / 2;
            let groups = vec![hand[..split.min(3)].to_vec(), hand[split..].iter().take(3).copied().collect()];
            game.meld(&actor, &groups).map(drop)
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_random_play_conserves_cards(
        seed in any::<u64>(),
        players in 2usize..=8,
        moves in prop::collection::vec((0u8..6, 0usize..8, 0usize..16), 1..150),
    ) {
        let mut game = seated_game(players, seed);

        for (kind, who, pick) in moves {
            let before = game.views();
            let result = apply_move(&mut game, kind, who, pick);

            if result.is_err() {
                prop_assert_eq!(&game.views(), &before, "rejected move changed the room");
            }
            if game.phase() == Phase::Playing {
                prop_assert_eq!(game.cards_in_play(), TOTAL_CARDS);
            }
            prop_assert!(game.players().all(|p| p.buys <= STARTING_BUYS));
            prop_assert!(game.melds().iter().all(|m| classify(m.cards()).is_ok()));
            prop_assert!(game.melds().iter().all(|m| m.len() >= 3));
        }
    }
}
