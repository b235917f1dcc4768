//! Domain layer - core types and the message store boundary.
//!
//! This layer contains pure domain models and error types
//! without any external dependencies (DB, IO, etc.).

pub mod config;
pub mod error;
pub mod models;
pub mod store;

pub use config::{AppConfig, DEFAULT_PAGE_SIZE};
pub use error::{AppError, Result};
pub use models::{
    ConversationUser, Message, MessageExtra, MessageKind, MessagePage, MiscMessage,
    SearchDirection, Session, SessionList, CHATROOM_SUFFIX,
};
pub use store::MessageStore;
