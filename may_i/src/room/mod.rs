//! Room module running each game behind an async actor.
//!
//! This module implements:
//! - RoomActor: Async actor owning a single May I game
//! - RoomManager: Registry creating, listing and closing rooms
//! - Message-based communication with tokio channels
//! - Buy and discard window timers
//!
//! ## Architecture
//!
//! Each room runs in a separate Tokio task with an mpsc message inbox, so
//! moves for one room are applied strictly one at a time. The actor owns the
//! clock for the room's timed windows and feeds expiries back into the
//! engine through window tokens.
//!
//! ## Example
//!
//! ```no_run
//! use may_i::room::{RoomConfig, RoomManager};
//! use may_i::game::entities::{ConnectionId, PlayerId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let manager = RoomManager::new();
//!     let room = manager.create_room(RoomConfig::default()).await?;
//!
//!     manager
//!         .join_room(room, PlayerId::new("ann"), "Ann".into(), ConnectionId::new_v4())
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;

/// Identifier the manager assigns to each room.
pub type RoomId = u64;

pub use actor::{RoomActor, RoomHandle};
pub use config::{RoomConfig, RoomSpeed};
pub use manager::{RoomManager, RoomMetadata};
pub use messages::{RoomMessage, RoomResponse, RoomStateResponse, StateChangeNotification};
