//! Client-visible rejections from room membership operations.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomError {
    #[error("room not found")]
    NotFound,
    #[error("room full")]
    RoomFull,
    #[error("name taken")]
    NameTaken,
    #[error("no room id available")]
    RegistryFull,
}
