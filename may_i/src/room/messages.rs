//! Room actor message types.

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use super::RoomId;
use crate::game::{
    GameError, GameView, RoundSummary,
    entities::{Card, CardId, ConnectionId, PlayerId},
    meld::MeldId,
};

/// Messages that can be sent to a RoomActor
#[derive(Debug)]
pub enum RoomMessage {
    /// Take a seat
    Join {
        player_id: PlayerId,
        name: String,
        connection: ConnectionId,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Rebind a seat to a new id and connection
    Reconnect {
        old_id: PlayerId,
        new_id: PlayerId,
        connection: ConnectionId,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Connection dropped; the seat stays
    Disconnect {
        player_id: PlayerId,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Draw from the draw pile
    Draw {
        player_id: PlayerId,
        count: usize,
        response: oneshot::Sender<RoomResponse>,
    },

    Discard {
        player_id: PlayerId,
        card: CardId,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Ask for the top discard while the buy window is open
    RequestBuy {
        player_id: PlayerId,
        response: oneshot::Sender<RoomResponse>,
    },

    Meld {
        player_id: PlayerId,
        groups: Vec<Vec<CardId>>,
        response: oneshot::Sender<RoomResponse>,
    },

    SwapWithMeld {
        player_id: PlayerId,
        card: CardId,
        meld: MeldId,
        response: oneshot::Sender<RoomResponse>,
    },

    AddToMeld {
        player_id: PlayerId,
        card: CardId,
        meld: MeldId,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Get room summary
    GetState {
        response: oneshot::Sender<RoomStateResponse>,
    },

    /// Get game view for a specific player
    GetGameView {
        player_id: PlayerId,
        response: oneshot::Sender<Option<GameView>>,
    },

    /// Subscribe to state change notifications
    Subscribe {
        player_id: PlayerId,
        sender: mpsc::Sender<StateChangeNotification>,
    },

    /// Unsubscribe from state change notifications
    Unsubscribe { player_id: PlayerId },

    /// Stop the actor
    Close {
        response: oneshot::Sender<RoomResponse>,
    },
}

/// Notification sent when room state changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChangeNotification {
    /// A move changed hands, piles or melds
    StateChanged,
    /// Player joined, left or reconnected
    PlayerListChanged,
    /// Buy window closed
    BuyResolved { buyer: Option<PlayerId> },
    /// Discard window ran out and a card was played for the player
    AutoDiscarded { player: PlayerId, card: Card },
    RoundEnded(RoundSummary),
    GameOver,
}

/// Response from room operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomResponse {
    /// Operation succeeded
    Success,

    /// Operation succeeded with message
    SuccessWithMessage(String),

    /// Cards that landed in the player's hand
    Cards(Vec<Card>),

    /// Ids of newly created melds
    Melded(Vec<MeldId>),

    /// The discard emptied the hand and closed the round
    RoundEnded(RoundSummary),

    /// Operation failed
    Error(String),

    /// Room is full
    RoomFull,

    /// Not your turn
    NotYourTurn,

    /// Move rejected by the rules
    InvalidAction(String),

    /// Player not in room
    NotInRoom,
}

impl RoomResponse {
    /// Check if response is success
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            RoomResponse::Success
                | RoomResponse::SuccessWithMessage(_)
                | RoomResponse::Cards(_)
                | RoomResponse::Melded(_)
                | RoomResponse::RoundEnded(_)
        )
    }

    /// Get error message if response is error
    pub fn error_message(&self) -> Option<String> {
        match self {
            RoomResponse::Error(msg) => Some(msg.clone()),
            RoomResponse::RoomFull => Some("Room is full".to_string()),
            RoomResponse::NotYourTurn => Some("Not your turn".to_string()),
            RoomResponse::InvalidAction(msg) => Some(format!("Invalid action: {msg}")),
            RoomResponse::NotInRoom => Some("Not in room".to_string()),
            _ => None,
        }
    }
}

impl From<GameError> for RoomResponse {
    fn from(error: GameError) -> Self {
        match error {
            GameError::CapacityReached => RoomResponse::RoomFull,
            GameError::OutOfTurnAction => RoomResponse::NotYourTurn,
            GameError::UnknownPlayer(_) => RoomResponse::NotInRoom,
            other => RoomResponse::InvalidAction(other.to_string()),
        }
    }
}

/// Room state response
#[derive(Debug, Clone, Serialize)]
pub struct RoomStateResponse {
    /// Room ID
    pub room_id: RoomId,

    /// Room name
    pub room_name: String,

    /// Seated players
    pub player_count: usize,

    /// Seats before the first deal
    pub max_players: usize,

    /// Seated players with a live connection
    pub connected_count: usize,

    pub round: u8,

    /// Current game phase
    pub phase: String,

    /// Player to act
    pub turn: Option<String>,

    /// Player ids in turn order
    pub players: Vec<String>,

    /// Room speed
    pub speed: String,

    /// Whether other players may currently ask for the discard
    pub buy_window_open: bool,
}
