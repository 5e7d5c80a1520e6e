//! The WebSocket wire protocol: JSON envelope `{"type": ..., "payload": ...}`
//! exchanged between clients and the referee. See [`messages`] for the
//! message catalogue and [`types`] for the value types embedded in them.

pub mod messages;
pub mod types;
pub mod validation;

pub use messages::{ClientMessage, ServerMessage};
pub use types::{Card, PlayerId, PlayerView, RoomId, SongTitle};
pub use validation::{validate_name_unique, validate_player_name, validate_room_id};
