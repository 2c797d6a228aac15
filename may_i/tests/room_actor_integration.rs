//! Integration tests for the room actor's timed windows.
//!
//! All tests run on a paused tokio clock, so window expiries happen as soon
//! as every task is idle and nothing here waits in real time.

use may_i::{
    Game, GameSettings, HAND_SIZE,
    entities::{ConnectionId, PlayerId},
    room::{RoomActor, RoomConfig, RoomHandle, RoomResponse, StateChangeNotification},
};
use std::time::Duration;
use tokio::sync::mpsc;

fn pid(name: &str) -> PlayerId {
    PlayerId::new(name)
}

fn config() -> RoomConfig {
    RoomConfig {
        name: "Timers".to_string(),
        settings: GameSettings::new(2),
        buy_window_ms: Some(1_000),
        discard_window_ms: Some(5_000),
        ..RoomConfig::default()
    }
}

/// Spawn a seeded two-player room with ann and ben seated and dealt.
async fn dealt_room() -> RoomHandle {
    let game = Game::with_seed(GameSettings::new(2), 21);
    let (actor, handle) = RoomActor::with_game(1, config(), game);
    tokio::spawn(actor.run());

    for name in ["ann", "ben"] {
        let response = handle
            .join(pid(name), name.to_string(), ConnectionId::new_v4())
            .await
            .unwrap();
        assert_eq!(response, RoomResponse::Success);
    }
    handle
}

async fn hand_of(handle: &RoomHandle, name: &str) -> Vec<may_i::Card> {
    handle.view(pid(name)).await.unwrap().unwrap().hand
}

/// Ann draws and discards the first card in hand, opening the buy window.
async fn ann_plays(handle: &RoomHandle) {
    let drawn = handle.draw(pid("ann"), 1).await.unwrap();
    assert!(drawn.is_success());
    let card = hand_of(handle, "ann").await[0].id;
    assert_eq!(
        handle.discard(pid("ann"), card).await.unwrap(),
        RoomResponse::Success
    );
}

fn drain(rx: &mut mpsc::Receiver<StateChangeNotification>) -> Vec<StateChangeNotification> {
    let mut seen = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        seen.push(notification);
    }
    seen
}

#[tokio::test(start_paused = true)]
async fn test_buy_window_awards_discard_on_expiry() {
    let handle = dealt_room().await;
    let (tx, mut rx) = mpsc::channel(32);
    handle.subscribe(pid("ben"), tx).await.unwrap();

    ann_plays(&handle).await;
    assert!(handle.state().await.unwrap().buy_window_open);

    assert_eq!(
        handle.request_buy(pid("ben")).await.unwrap(),
        RoomResponse::Success
    );
    tokio::time::sleep(Duration::from_millis(1_100)).await;

    let state = handle.state().await.unwrap();
    assert!(!state.buy_window_open);
    assert_eq!(hand_of(&handle, "ben").await.len(), HAND_SIZE + 2);
    let ben = handle.view(pid("ben")).await.unwrap().unwrap();
    assert_eq!(ben.players[1].buys, 5);
    assert!(drain(&mut rx).contains(&StateChangeNotification::BuyResolved {
        buyer: Some(pid("ben"))
    }));
}

#[tokio::test(start_paused = true)]
async fn test_drawing_closes_buy_window_early() {
    let handle = dealt_room().await;

    ann_plays(&handle).await;
    handle.request_buy(pid("ben")).await.unwrap();

    // Ben is next to act. His draw settles the pending buy first, and he was
    // the only one asking, so he gets the discard and then draws.
    let drawn = handle.draw(pid("ben"), 1).await.unwrap();
    assert!(matches!(drawn, RoomResponse::Cards(ref cards) if cards.len() == 1));

    let state = handle.state().await.unwrap();
    assert!(!state.buy_window_open);
    assert_eq!(hand_of(&handle, "ben").await.len(), HAND_SIZE + 3);
}

#[tokio::test(start_paused = true)]
async fn test_buy_request_outside_window_is_rejected() {
    let handle = dealt_room().await;
    let response = handle.request_buy(pid("ben")).await.unwrap();
    assert!(!response.is_success());
    assert!(response.error_message().is_some());

    let stranger = handle.request_buy(pid("zed")).await.unwrap();
    assert_eq!(stranger, RoomResponse::NotInRoom);
}

#[tokio::test(start_paused = true)]
async fn test_discard_window_expiry_discards_for_player() {
    let handle = dealt_room().await;
    let (tx, mut rx) = mpsc::channel(32);
    handle.subscribe(pid("ann"), tx).await.unwrap();

    tokio::time::sleep(Duration::from_millis(5_100)).await;

    let state = handle.state().await.unwrap();
    assert_eq!(state.turn.as_deref(), Some("ben"));
    assert!(state.buy_window_open);
    assert_eq!(hand_of(&handle, "ann").await.len(), HAND_SIZE - 1);
    assert!(drain(&mut rx).iter().any(|n| matches!(
        n,
        StateChangeNotification::AutoDiscarded { player, .. } if player == &pid("ann")
    )));
}

#[tokio::test(start_paused = true)]
async fn test_manual_discard_prevents_auto_discard() {
    let handle = dealt_room().await;

    tokio::time::sleep(Duration::from_millis(4_000)).await;
    ann_plays(&handle).await;

    // Well past ann's original deadline. Nobody asked to buy, then ben's own
    // discard window is running.
    tokio::time::sleep(Duration::from_millis(2_000)).await;

    assert_eq!(hand_of(&handle, "ann").await.len(), HAND_SIZE);
    let state = handle.state().await.unwrap();
    assert_eq!(state.turn.as_deref(), Some("ben"));
    assert!(!state.buy_window_open);
}

#[tokio::test(start_paused = true)]
async fn test_out_of_turn_draw_is_rejected() {
    let handle = dealt_room().await;
    assert_eq!(
        handle.draw(pid("ben"), 1).await.unwrap(),
        RoomResponse::NotYourTurn
    );
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_keeps_seat() {
    let handle = dealt_room().await;
    let before = hand_of(&handle, "ben").await;

    let response = handle
        .request(|response| may_i::room::RoomMessage::Reconnect {
            old_id: pid("ben"),
            new_id: pid("ben2"),
            connection: ConnectionId::new_v4(),
            response,
        })
        .await
        .unwrap();
    assert_eq!(response, RoomResponse::Success);

    assert_eq!(hand_of(&handle, "ben2").await, before);
    assert!(handle.view(pid("ben")).await.unwrap().is_none());
    let state = handle.state().await.unwrap();
    assert_eq!(state.players, vec!["ann".to_string(), "ben2".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_one_draw_of_one_card_per_turn() {
    let handle = dealt_room().await;

    let too_many = handle.draw(pid("ann"), 3).await.unwrap();
    assert!(matches!(too_many, RoomResponse::InvalidAction(_)));
    assert_eq!(hand_of(&handle, "ann").await.len(), HAND_SIZE);

    assert!(handle.draw(pid("ann"), 1).await.unwrap().is_success());
    for count in [1, 40] {
        let again = handle.draw(pid("ann"), count).await.unwrap();
        assert!(matches!(again, RoomResponse::InvalidAction(_)));
    }
    assert_eq!(hand_of(&handle, "ann").await.len(), HAND_SIZE + 1);
}

#[tokio::test(start_paused = true)]
async fn test_discard_requires_draw() {
    let handle = dealt_room().await;
    let card = hand_of(&handle, "ann").await[0].id;

    let response = handle.discard(pid("ann"), card).await.unwrap();
    assert!(matches!(response, RoomResponse::InvalidAction(_)));
    assert_eq!(hand_of(&handle, "ann").await.len(), HAND_SIZE);
    assert_eq!(handle.state().await.unwrap().turn.as_deref(), Some("ann"));
}

#[tokio::test(start_paused = true)]
async fn test_early_discard_keeps_pending_buy() {
    let handle = dealt_room().await;
    ann_plays(&handle).await;
    handle.request_buy(pid("ben")).await.unwrap();

    // Ben has not drawn yet, so his discard is refused and the buy window
    // keeps his request.
    let card = hand_of(&handle, "ben").await[0].id;
    let response = handle.discard(pid("ben"), card).await.unwrap();
    assert!(matches!(response, RoomResponse::InvalidAction(_)));
    assert!(handle.state().await.unwrap().buy_window_open);

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert_eq!(hand_of(&handle, "ben").await.len(), HAND_SIZE + 2);
}

#[tokio::test(start_paused = true)]
async fn test_draw_allowed_again_next_turn() {
    let handle = dealt_room().await;
    ann_plays(&handle).await;

    assert!(handle.draw(pid("ben"), 1).await.unwrap().is_success());
    let card = hand_of(&handle, "ben").await[0].id;
    assert_eq!(
        handle.discard(pid("ben"), card).await.unwrap(),
        RoomResponse::Success
    );

    assert!(handle.draw(pid("ann"), 1).await.unwrap().is_success());
}
