//! Message store boundary.
//!
//! The exporter only talks to the store through this trait, so any backend
//! holding decrypted conversation data can be plugged in.

use super::error::Result;
use super::models::{ConversationUser, MessagePage, SearchDirection, SessionList};

/// Read access to decrypted conversation data.
pub trait MessageStore {
    /// User name of the identity that owns the data.
    fn self_user_name(&self) -> &str;

    /// Looks up a user or group by its stable name.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the name is unknown.
    fn user_by_name(&self, name: &str) -> Result<ConversationUser>;

    /// Lists conversations, most recently active first.
    ///
    /// # Errors
    /// Returns error if the query fails.
    fn session_list(&self, offset: usize, limit: usize) -> Result<SessionList>;

    /// Fetches up to `limit` messages of `talker` on one side of `cursor`.
    ///
    /// # Errors
    /// Returns `AppError::PageRetrieval` if the query fails.
    fn messages_by_time(
        &self,
        talker: &str,
        cursor: i64,
        limit: usize,
        direction: SearchDirection,
    ) -> Result<MessagePage>;
}
