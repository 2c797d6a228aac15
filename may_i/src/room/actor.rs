//! Room actor implementation with async message handling.

use super::{
    RoomId,
    config::RoomConfig,
    messages::{RoomMessage, RoomResponse, RoomStateResponse, StateChangeNotification},
};
use crate::game::{
    DiscardOutcome, Game, GameView, Phase, RoundSummary, WindowKind, WindowToken,
    entities::{CardId, ConnectionId, PlayerId},
    meld::MeldId,
};
use std::{collections::HashMap, time::Duration};
use tokio::{
    sync::{mpsc, oneshot},
    time::{Instant, sleep_until},
};

/// Room actor handle for sending messages
#[derive(Clone, Debug)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomMessage>,
    room_id: RoomId,
}

impl RoomHandle {
    /// Create a new room handle
    pub fn new(sender: mpsc::Sender<RoomMessage>, room_id: RoomId) -> Self {
        Self { sender, room_id }
    }

    /// Get room ID
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Send a message to the room
    pub async fn send(&self, message: RoomMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Room is closed".to_string())
    }

    /// Send a message carrying a response channel and wait for the reply.
    pub async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RoomMessage,
    ) -> Result<T, String> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await
            .map_err(|_| "Failed to receive response".to_string())
    }

    pub async fn join(
        &self,
        player_id: PlayerId,
        name: String,
        connection: ConnectionId,
    ) -> Result<RoomResponse, String> {
        self.request(|response| RoomMessage::Join {
            player_id,
            name,
            connection,
            response,
        })
        .await
    }

    pub async fn draw(&self, player_id: PlayerId, count: usize) -> Result<RoomResponse, String> {
        self.request(|response| RoomMessage::Draw {
            player_id,
            count,
            response,
        })
        .await
    }

    pub async fn discard(&self, player_id: PlayerId, card: CardId) -> Result<RoomResponse, String> {
        self.request(|response| RoomMessage::Discard {
            player_id,
            card,
            response,
        })
        .await
    }

    pub async fn request_buy(&self, player_id: PlayerId) -> Result<RoomResponse, String> {
        self.request(|response| RoomMessage::RequestBuy {
            player_id,
            response,
        })
        .await
    }

    pub async fn state(&self) -> Result<RoomStateResponse, String> {
        self.request(|response| RoomMessage::GetState { response })
            .await
    }

    pub async fn view(&self, player_id: PlayerId) -> Result<Option<GameView>, String> {
        self.request(|response| RoomMessage::GetGameView {
            player_id,
            response,
        })
        .await
    }

    pub async fn subscribe(
        &self,
        player_id: PlayerId,
        sender: mpsc::Sender<StateChangeNotification>,
    ) -> Result<(), String> {
        self.send(RoomMessage::Subscribe { player_id, sender })
            .await
    }
}

/// A timed window the actor is waiting on.
#[derive(Clone, Copy, Debug)]
struct Deadline {
    token: WindowToken,
    at: Instant,
}

/// Room actor owning a single May I game
///
/// All moves for the room go through this actor's inbox, so they are applied
/// one at a time. Buy and discard windows are driven from the same loop.
pub struct RoomActor {
    /// Room ID
    id: RoomId,

    /// Room configuration
    config: RoomConfig,

    /// Game state
    game: Game,

    /// Message inbox
    inbox: mpsc::Receiver<RoomMessage>,

    /// Players who asked for the discard under the open buy window
    buy_requests: Vec<PlayerId>,

    /// Pending window expiry
    deadline: Option<Deadline>,

    /// Whether the acting player has taken their draw this turn
    turn_drawn: bool,

    /// Is room closed
    is_closed: bool,

    /// Subscribers for state change notifications
    subscribers: HashMap<PlayerId, mpsc::Sender<StateChangeNotification>>,
}

impl RoomActor {
    /// Create a new room actor with an OS-seeded game
    pub fn new(id: RoomId, config: RoomConfig) -> (Self, RoomHandle) {
        let game = Game::from(config.settings.clone());
        Self::with_game(id, config, game)
    }

    /// Create a room actor around an existing game, e.g. a seeded one
    pub fn with_game(id: RoomId, config: RoomConfig, game: Game) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(100);

        let actor = Self {
            id,
            config,
            game,
            inbox,
            buy_requests: Vec::new(),
            deadline: None,
            turn_drawn: false,
            is_closed: false,
            subscribers: HashMap::new(),
        };

        let handle = RoomHandle::new(sender, id);

        (actor, handle)
    }

    /// Run the room actor event loop
    pub async fn run(mut self) {
        log::info!("Room {} '{}' starting", self.id, self.config.name);

        loop {
            let deadline = self.deadline;
            tokio::select! {
                message = self.inbox.recv() => {
                    let Some(message) = message else {
                        break;
                    };
                    self.handle_message(message);

                    if self.is_closed {
                        break;
                    }
                }

                () = wait_for(deadline) => {
                    self.on_deadline();
                }
            }
        }

        log::info!("Room {} '{}' closed", self.id, self.config.name);
    }

    /// Handle a room message
    fn handle_message(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Join {
                player_id,
                name,
                connection,
                response,
            } => {
                let result = self.handle_join(player_id, &name, connection);
                let _ = response.send(result);
            }

            RoomMessage::Reconnect {
                old_id,
                new_id,
                connection,
                response,
            } => {
                let result = self.handle_reconnect(&old_id, new_id, connection);
                let _ = response.send(result);
            }

            RoomMessage::Disconnect {
                player_id,
                response,
            } => {
                let result = match self.game.disconnect(&player_id) {
                    Ok(_) => {
                        self.notify_state_change(StateChangeNotification::PlayerListChanged);
                        RoomResponse::Success
                    }
                    Err(e) => e.into(),
                };
                let _ = response.send(result);
            }

            RoomMessage::Draw {
                player_id,
                count,
                response,
            } => {
                let result = self.handle_draw(&player_id, count);
                let _ = response.send(result);
            }

            RoomMessage::Discard {
                player_id,
                card,
                response,
            } => {
                let result = self.handle_discard(&player_id, card);
                let _ = response.send(result);
            }

            RoomMessage::RequestBuy {
                player_id,
                response,
            } => {
                let result = self.handle_request_buy(player_id);
                let _ = response.send(result);
            }

            RoomMessage::Meld {
                player_id,
                groups,
                response,
            } => {
                let result = match self.game.meld(&player_id, &groups) {
                    Ok(ids) => {
                        self.notify_state_change(StateChangeNotification::StateChanged);
                        RoomResponse::Melded(ids)
                    }
                    Err(e) => e.into(),
                };
                let _ = response.send(result);
            }

            RoomMessage::SwapWithMeld {
                player_id,
                card,
                meld,
                response,
            } => {
                let result = self.handle_swap(&player_id, card, meld);
                let _ = response.send(result);
            }

            RoomMessage::AddToMeld {
                player_id,
                card,
                meld,
                response,
            } => {
                let result = match self.game.add_to_meld(&player_id, card, meld) {
                    Ok(()) => {
                        self.notify_state_change(StateChangeNotification::StateChanged);
                        RoomResponse::Success
                    }
                    Err(e) => e.into(),
                };
                let _ = response.send(result);
            }

            RoomMessage::GetState { response } => {
                let _ = response.send(self.get_state());
            }

            RoomMessage::GetGameView {
                player_id,
                response,
            } => {
                let _ = response.send(self.game.view_for(&player_id));
            }

            RoomMessage::Subscribe { player_id, sender } => {
                log::debug!("{} subscribed to room {} state changes", player_id, self.id);
                self.subscribers.insert(player_id, sender);
            }

            RoomMessage::Unsubscribe { player_id } => {
                self.subscribers.remove(&player_id);
                log::debug!(
                    "{} unsubscribed from room {} state changes",
                    player_id,
                    self.id
                );
            }

            RoomMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(RoomResponse::Success);
            }
        }
    }

    /// Broadcast state change notification to all subscribers
    fn notify_state_change(&mut self, notification: StateChangeNotification) {
        self.subscribers.retain(|player_id, sender| {
            match sender.try_send(notification.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("Subscriber {player_id} channel full, dropping notification");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Subscriber {player_id} disconnected, removing");
                    false
                }
            }
        });
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: &str,
        connection: ConnectionId,
    ) -> RoomResponse {
        let was_lobby = self.game.phase() == Phase::Lobby;
        match self.game.add_player(player_id.clone(), connection, name) {
            Ok(true) => {
                log::info!("{} joined room {}", player_id, self.id);
                self.notify_state_change(StateChangeNotification::PlayerListChanged);
                if was_lobby && self.game.phase() == Phase::Playing {
                    self.notify_state_change(StateChangeNotification::StateChanged);
                    self.schedule_discard_window();
                }
                RoomResponse::Success
            }
            Ok(false) => RoomResponse::SuccessWithMessage("Already seated".to_string()),
            Err(e) => e.into(),
        }
    }

    fn handle_reconnect(
        &mut self,
        old_id: &PlayerId,
        new_id: PlayerId,
        connection: ConnectionId,
    ) -> RoomResponse {
        if let Err(e) = self.game.reconnect(old_id, new_id.clone(), connection) {
            return e.into();
        }
        if let Some(sender) = self.subscribers.remove(old_id) {
            self.subscribers.insert(new_id.clone(), sender);
        }
        for requester in &mut self.buy_requests {
            if requester == old_id {
                *requester = new_id.clone();
            }
        }
        self.notify_state_change(StateChangeNotification::PlayerListChanged);
        RoomResponse::Success
    }

    fn handle_draw(&mut self, player_id: &PlayerId, count: usize) -> RoomResponse {
        if !self.game.contains_player(player_id) {
            return RoomResponse::NotInRoom;
        }
        if self.game.current_player() != Some(player_id) {
            return RoomResponse::NotYourTurn;
        }
        if count != 1 {
            return RoomResponse::InvalidAction("A turn draws exactly one card".to_string());
        }
        if self.turn_drawn {
            return RoomResponse::InvalidAction("Already drew this turn".to_string());
        }

        // The acting player drawing ends the wait for buyers.
        self.settle_buy_window();

        match self.game.draw(player_id, count) {
            Ok(cards) => {
                self.turn_drawn = true;
                self.notify_state_change(StateChangeNotification::StateChanged);
                RoomResponse::Cards(cards)
            }
            Err(e) => e.into(),
        }
    }

    fn handle_discard(&mut self, player_id: &PlayerId, card: CardId) -> RoomResponse {
        if !self.game.contains_player(player_id) {
            return RoomResponse::NotInRoom;
        }
        if self.game.current_player() != Some(player_id) {
            return RoomResponse::NotYourTurn;
        }
        if !self.turn_drawn {
            return RoomResponse::InvalidAction("Draw before discarding".to_string());
        }
        self.settle_buy_window();

        match self.game.discard(player_id, card) {
            Ok(DiscardOutcome::Continued) => {
                self.turn_drawn = false;
                self.deadline = None;
                self.notify_state_change(StateChangeNotification::StateChanged);
                self.schedule_buy_window();
                RoomResponse::Success
            }
            Ok(DiscardOutcome::RoundEnded(summary)) => {
                self.after_round(summary.clone());
                RoomResponse::RoundEnded(summary)
            }
            Err(e) => e.into(),
        }
    }

    fn handle_request_buy(&mut self, player_id: PlayerId) -> RoomResponse {
        if !self.game.contains_player(&player_id) {
            return RoomResponse::NotInRoom;
        }
        let buy_open = self
            .deadline
            .is_some_and(|d| d.token.kind == WindowKind::Buy);
        if !buy_open {
            return RoomResponse::InvalidAction("No discard is up for sale".to_string());
        }
        if self.game.player(&player_id).is_some_and(|p| p.buys == 0) {
            return RoomResponse::InvalidAction("no buys remaining".to_string());
        }
        if !self.buy_requests.contains(&player_id) {
            log::debug!("{} asked to buy in room {}", player_id, self.id);
            self.buy_requests.push(player_id);
        }
        RoomResponse::Success
    }

    fn handle_swap(&mut self, player_id: &PlayerId, card: CardId, meld: MeldId) -> RoomResponse {
        match self.game.swap_with_meld(player_id, card, meld) {
            Ok(wildcard) => {
                self.notify_state_change(StateChangeNotification::StateChanged);
                RoomResponse::Cards(vec![wildcard])
            }
            Err(e) => e.into(),
        }
    }

    fn get_state(&self) -> RoomStateResponse {
        RoomStateResponse {
            room_id: self.id,
            room_name: self.config.name.clone(),
            player_count: self.game.player_count(),
            max_players: self.game.settings().player_count,
            connected_count: self.game.connected_count(),
            round: self.game.round(),
            phase: self.game.phase().to_string(),
            turn: self.game.current_player().map(ToString::to_string),
            players: self
                .game
                .turn_order()
                .into_iter()
                .map(ToString::to_string)
                .collect(),
            speed: self.config.speed.to_string(),
            buy_window_open: self
                .deadline
                .is_some_and(|d| d.token.kind == WindowKind::Buy),
        }
    }

    // === Windows ===

    fn schedule(&mut self, token: Option<WindowToken>, after: Duration) {
        self.deadline = token.map(|token| Deadline {
            token,
            at: Instant::now() + after,
        });
    }

    fn schedule_buy_window(&mut self) {
        self.buy_requests.clear();
        let token = self.game.open_buy_window();
        self.schedule(token, self.config.buy_window());
    }

    fn schedule_discard_window(&mut self) {
        let token = self.game.open_discard_window();
        self.schedule(token, self.config.discard_window());
    }

    /// Resolve a buy window that is still waiting, so queued buyers are
    /// served before the acting player moves on.
    fn settle_buy_window(&mut self) {
        if let Some(deadline) = self.deadline
            && deadline.token.kind == WindowKind::Buy
        {
            self.resolve_buy_window(deadline.token);
        }
    }

    fn on_deadline(&mut self) {
        let Some(deadline) = self.deadline.take() else {
            return;
        };
        match deadline.token.kind {
            WindowKind::Buy => self.resolve_buy_window(deadline.token),
            WindowKind::Discard => self.expire_discard_window(deadline.token),
        }
    }

    /// Hand the discard to whoever has priority, then start the acting
    /// player's discard clock.
    fn resolve_buy_window(&mut self, token: WindowToken) {
        let requests = std::mem::take(&mut self.buy_requests);
        match self.game.resolve_buy_window(token, &requests) {
            Ok(result) => {
                let buyer = result.map(|(buyer, _)| buyer);
                log::debug!("Room {}: buy window closed, buyer {:?}", self.id, buyer);
                self.notify_state_change(StateChangeNotification::BuyResolved { buyer });
            }
            Err(e) => {
                log::warn!("Room {}: discard went unsold: {}", self.id, e);
                self.notify_state_change(StateChangeNotification::BuyResolved { buyer: None });
            }
        }
        self.schedule_discard_window();
    }

    fn expire_discard_window(&mut self, token: WindowToken) {
        match self.game.expire_discard_window(token) {
            Ok(Some(auto)) => {
                self.turn_drawn = false;
                self.notify_state_change(StateChangeNotification::AutoDiscarded {
                    player: auto.player,
                    card: auto.card,
                });
                match auto.outcome {
                    DiscardOutcome::Continued => self.schedule_buy_window(),
                    DiscardOutcome::RoundEnded(summary) => self.after_round(summary),
                }
            }
            Ok(None) => {
                log::debug!("Room {}: stale discard window", self.id);
            }
            Err(e) => {
                log::error!("Room {}: failed to auto-discard: {}", self.id, e);
            }
        }
    }

    fn after_round(&mut self, summary: RoundSummary) {
        self.deadline = None;
        self.turn_drawn = false;
        self.buy_requests.clear();
        let game_over = summary.game_over;
        self.notify_state_change(StateChangeNotification::RoundEnded(summary));
        if game_over {
            log::info!("Room {}: game over, winner {:?}", self.id, self.game.winner());
            self.notify_state_change(StateChangeNotification::GameOver);
        } else {
            self.schedule_discard_window();
        }
    }
}

/// Resolves at `deadline`, or never when nothing is pending.
async fn wait_for(deadline: Option<Deadline>) {
    match deadline {
        Some(deadline) => sleep_until(deadline.at).await,
        None => std::future::pending().await,
    }
}
