//! `SQLite` message store over a decrypted WeChat database.
//!
//! Reads contacts, sessions and messages; message payloads are stored as a
//! JSON `extra` column next to the raw type codes.

use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};

use crate::domain::{
    AppError, ConversationUser, Message, MessageExtra, MessageKind, MessagePage, MessageStore,
    Result, SearchDirection, Session, SessionList, CHATROOM_SUFFIX,
};

/// Schema of the decrypted store.
#[cfg(test)]
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contacts (
    user_name TEXT PRIMARY KEY,
    nick_name TEXT NOT NULL DEFAULT '',
    remark TEXT,
    is_group INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS sessions (
    user_name TEXT PRIMARY KEY,
    content TEXT NOT NULL DEFAULT '',
    last_time INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    talker TEXT NOT NULL,
    sender TEXT NOT NULL DEFAULT '',
    create_time INTEGER NOT NULL,
    is_sender INTEGER NOT NULL DEFAULT 0,
    type INTEGER NOT NULL,
    sub_type INTEGER NOT NULL DEFAULT 0,
    content TEXT NOT NULL DEFAULT '',
    extra TEXT
);

CREATE INDEX IF NOT EXISTS idx_messages_talker_time
    ON messages(talker, create_time);
";

const SELF_USER_KEY: &str = "self_user_name";

const MESSAGE_COLUMNS: &str = "m.id, m.create_time, m.is_sender,
    COALESCE(NULLIF(m.sender, ''), m.talker), c.nick_name, c.remark, c.is_group,
    m.type, m.sub_type, m.content, m.extra
    FROM messages m
    LEFT JOIN contacts c ON c.user_name = COALESCE(NULLIF(m.sender, ''), m.talker)";

/// Read-only message store backed by `SQLite`.
pub struct SqliteMessageStore {
    conn: Connection,
    self_user_name: String,
}

impl SqliteMessageStore {
    /// Opens a store database in read-only mode.
    ///
    /// # Errors
    /// Returns `StoreUnavailable` if the database cannot be opened or has no
    /// readable metadata.
    pub fn open(path: &Path) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| AppError::store_unavailable(path, e))?;

        conn.execute_batch(
            "PRAGMA query_only = ON;
             PRAGMA temp_store = MEMORY;",
        )
        .map_err(|e| AppError::store_unavailable(path, e))?;

        let self_user_name: String = conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                [SELF_USER_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| AppError::store_unavailable(path, e))?
            .unwrap_or_default();

        tracing::debug!(path = %path.display(), self_user = %self_user_name, "Opened message store");

        Ok(Self {
            conn,
            self_user_name,
        })
    }
}

impl MessageStore for SqliteMessageStore {
    fn self_user_name(&self) -> &str {
        &self.self_user_name
    }

    fn user_by_name(&self, name: &str) -> Result<ConversationUser> {
        self.conn
            .query_row(
                "SELECT user_name, nick_name, remark, is_group FROM contacts WHERE user_name = ?1",
                [name],
                |row| {
                    let user_name: String = row.get(0)?;
                    let is_group: bool = row.get(3)?;
                    Ok(ConversationUser {
                        is_group: is_group || user_name.ends_with(CHATROOM_SUFFIX),
                        user_name,
                        nick_name: row.get(1)?,
                        remark: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::NotFound { name: name.into() })
    }

    fn session_list(&self, offset: usize, limit: usize) -> Result<SessionList> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            .map_err(AppError::database)?;

        let mut stmt = self
            .conn
            .prepare(
                "SELECT s.user_name, s.content, c.nick_name, c.remark, c.is_group
                 FROM sessions s
                 LEFT JOIN contacts c ON c.user_name = s.user_name
                 ORDER BY s.last_time DESC
                 LIMIT ?1 OFFSET ?2",
            )
            .map_err(AppError::database)?;

        let rows = stmt
            .query_map(params![to_sql_int(limit), to_sql_int(offset)], |row| {
                let user_name: String = row.get(0)?;
                let is_group = row.get::<_, Option<bool>>(4)?.unwrap_or(false)
                    || user_name.ends_with(CHATROOM_SUFFIX);
                Ok(Session {
                    user_info: ConversationUser {
                        user_name: user_name.clone(),
                        nick_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                        remark: row.get(3)?,
                        is_group,
                    },
                    user_name,
                    is_group,
                    content: row.get(1)?,
                })
            })
            .map_err(AppError::database)?;

        let mut sessions = Vec::new();
        for row in rows {
            match row {
                Ok(session) => sessions.push(session),
                Err(e) => tracing::warn!("Failed to read session row: {}", e),
            }
        }

        Ok(SessionList {
            total: usize::try_from(total).unwrap_or_default(),
            rows: sessions,
        })
    }

    fn messages_by_time(
        &self,
        talker: &str,
        cursor: i64,
        limit: usize,
        direction: SearchDirection,
    ) -> Result<MessagePage> {
        let window = match direction {
            SearchDirection::Forward => "m.create_time < ?2 ORDER BY m.create_time DESC, m.id DESC",
            SearchDirection::Backward => "m.create_time > ?2 ORDER BY m.create_time ASC, m.id ASC",
        };
        let sql = format!("SELECT {MESSAGE_COLUMNS} WHERE m.talker = ?1 AND {window} LIMIT ?3");

        let mut stmt = self.conn.prepare(&sql).map_err(AppError::page_retrieval)?;
        let mut rows = stmt
            .query(params![talker, cursor, to_sql_int(limit)])
            .map_err(AppError::page_retrieval)?;

        let mut messages = Vec::new();
        let mut skipped = 0;
        let mut oldest_skipped: Option<i64> = None;
        while let Some(row) = rows.next().map_err(AppError::page_retrieval)? {
            // A row without a usable time cannot be stepped over by the cursor.
            let create_time: i64 = row.get(1).map_err(AppError::page_retrieval)?;
            match read_message(row) {
                Ok(msg) => messages.push(msg),
                Err(e) => {
                    tracing::warn!(talker, create_time, "Skipping unreadable message row: {}", e);
                    skipped += 1;
                    oldest_skipped = Some(oldest_skipped.map_or(create_time, |t| t.min(create_time)));
                }
            }
        }

        let page = MessagePage::new(messages).with_skipped(skipped, oldest_skipped);
        tracing::debug!(talker, cursor, rows = page.total, skipped, "Fetched messages");

        Ok(page)
    }
}

/// Maps one message row into a domain message.
fn read_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    let seq: i64 = row.get(0)?;
    let sender_name: String = row.get(3)?;
    let extra: Option<String> = row.get(10)?;

    let sender = ConversationUser {
        is_group: row.get::<_, Option<bool>>(6)?.unwrap_or(false),
        user_name: sender_name,
        nick_name: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        remark: row.get(5)?,
    };

    Ok(Message {
        seq,
        create_time: row.get(1)?,
        is_sender: row.get(2)?,
        sender,
        kind: MessageKind::from_codes(
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
            parse_extra(seq, extra.as_deref()),
        ),
    })
}

/// Parses the payload column, degrading to empty fields on bad data.
fn parse_extra(seq: i64, raw: Option<&str>) -> MessageExtra {
    match raw.filter(|s| !s.trim().is_empty()) {
        None => MessageExtra::default(),
        Some(json) => serde_json::from_str(json).unwrap_or_else(|e| {
            tracing::debug!(seq, "Ignoring malformed message extra: {}", e);
            MessageExtra::default()
        }),
    }
}

fn to_sql_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
