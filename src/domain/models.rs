//! Domain models for exported chat data.
//!
//! These models represent conversations and messages as surfaced by the
//! message store, with message kinds decoded into a closed sum type.

use serde::{Deserialize, Serialize};

/// Suffix carried by group chat user names.
pub const CHATROOM_SUFFIX: &str = "@chatroom";

/// Raw message type codes as stored by WeChat.
pub mod type_code {
    pub const TEXT: i64 = 1;
    pub const PICTURE: i64 = 3;
    pub const VOICE: i64 = 34;
    pub const VISIT_CARD: i64 = 42;
    pub const VIDEO: i64 = 43;
    pub const EMOJI: i64 = 47;
    pub const LOCATION: i64 = 48;
    pub const MISC: i64 = 49;
    pub const VOIP: i64 = 50;
    pub const SYSTEM: i64 = 10000;
}

/// Raw sub-type codes for messages of type [`type_code::MISC`].
pub mod misc_code {
    pub const MUSIC: i64 = 3;
    pub const CARD_LINK: i64 = 5;
    pub const FILE: i64 = 6;
    pub const APPLET: i64 = 33;
    pub const APPLET_ALT: i64 = 36;
    pub const CHANNELS: i64 = 51;
    pub const REFER: i64 = 57;
    pub const LIVE: i64 = 63;
    pub const LIVE_ALT: i64 = 88;
    pub const TRANSFER: i64 = 2000;
}

/// A user or group as known to the message store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationUser {
    /// Stable identifier (`wxid_...`, `...@chatroom`).
    pub user_name: String,
    /// Nickname chosen by the user.
    #[serde(default)]
    pub nick_name: String,
    /// Locally assigned display override.
    #[serde(default)]
    pub remark: Option<String>,
    /// Whether this is a group chat.
    #[serde(default)]
    pub is_group: bool,
}

impl ConversationUser {
    /// Non-empty remark, if any.
    #[must_use]
    pub fn remark(&self) -> Option<&str> {
        self.remark.as_deref().filter(|r| !r.is_empty())
    }

    /// First non-empty of remark, nickname and user name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.remark()
            .or_else(|| Some(self.nick_name.as_str()).filter(|n| !n.is_empty()))
            .unwrap_or(self.user_name.as_str())
    }

    /// Chat type label used in transcripts and listings.
    #[must_use]
    pub const fn chat_type_label(&self) -> &'static str {
        if self.is_group {
            "群聊"
        } else {
            "单聊"
        }
    }
}

/// A conversation entry in the session list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_name: String,
    pub is_group: bool,
    pub user_info: ConversationUser,
    /// Preview of the last message.
    pub content: String,
}

/// One page of sessions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionList {
    /// Number of sessions in the store, regardless of paging.
    pub total: usize,
    pub rows: Vec<Session>,
}

/// Direction of a time-windowed message query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDirection {
    /// Messages strictly older than the cursor, newest first.
    #[default]
    Forward,
    /// Messages strictly newer than the cursor, oldest first.
    // Exporting only walks forward; other store clients page the other way.
    #[cfg_attr(not(test), allow(dead_code))]
    Backward,
}

/// Kind-specific payload fields, stored as JSON next to each message.
///
/// Every field defaults to empty so that partially populated records
/// still decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageExtra {
    pub image_path: String,
    pub voice_path: String,
    pub video_path: String,
    pub emoji_path: String,
    pub location_label: String,
    pub poi_name: String,
    pub card_nick_name: String,
    pub voip_msg: String,
    pub file_name: String,
    pub link_title: String,
    pub pay_desc: String,
    pub music_title: String,
    pub music_description: String,
    pub channels_description: String,
}

/// Sub-kinds of the catch-all Misc message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiscMessage {
    File { file_name: String },
    CardLink { title: String },
    Applet { title: String },
    Transfer { description: String },
    Music { title: String, description: String },
    Channels { description: String },
    Live { description: String },
    Refer { content: String },
    /// Sub-type outside the known set.
    Unknown { sub_type: i64, content: String },
}

/// Message kind together with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Text { content: String },
    Picture { path: String },
    Voice { path: String },
    Video { path: String },
    Emoji { path: String },
    Location { label: String, poi_name: String },
    VisitCard { nick_name: String },
    Voip { description: String },
    System { content: String },
    Misc(MiscMessage),
    /// Type outside the known set.
    Unknown { msg_type: i64, content: String },
}

impl MessageKind {
    /// Decodes raw type codes and payload into a message kind.
    ///
    /// Never fails: unknown codes map to the `Unknown` variants with the raw
    /// value preserved.
    #[must_use]
    pub fn from_codes(msg_type: i64, sub_type: i64, content: String, extra: MessageExtra) -> Self {
        match msg_type {
            type_code::TEXT => Self::Text { content },
            type_code::PICTURE => Self::Picture {
                path: extra.image_path,
            },
            type_code::VOICE => Self::Voice {
                path: extra.voice_path,
            },
            type_code::VIDEO => Self::Video {
                path: extra.video_path,
            },
            type_code::EMOJI => Self::Emoji {
                path: extra.emoji_path,
            },
            type_code::LOCATION => Self::Location {
                label: extra.location_label,
                poi_name: extra.poi_name,
            },
            type_code::VISIT_CARD => Self::VisitCard {
                nick_name: extra.card_nick_name,
            },
            type_code::VOIP => Self::Voip {
                description: extra.voip_msg,
            },
            type_code::SYSTEM => Self::System { content },
            type_code::MISC => Self::Misc(MiscMessage::from_code(sub_type, content, extra)),
            other => Self::Unknown {
                msg_type: other,
                content,
            },
        }
    }
}

impl MiscMessage {
    fn from_code(sub_type: i64, content: String, extra: MessageExtra) -> Self {
        match sub_type {
            misc_code::FILE => Self::File {
                file_name: extra.file_name,
            },
            misc_code::CARD_LINK => Self::CardLink {
                title: extra.link_title,
            },
            misc_code::APPLET | misc_code::APPLET_ALT => Self::Applet {
                title: extra.link_title,
            },
            misc_code::TRANSFER => Self::Transfer {
                description: extra.pay_desc,
            },
            misc_code::MUSIC => Self::Music {
                title: extra.music_title,
                description: extra.music_description,
            },
            misc_code::CHANNELS => Self::Channels {
                description: extra.channels_description,
            },
            misc_code::LIVE | misc_code::LIVE_ALT => Self::Live {
                description: extra.channels_description,
            },
            misc_code::REFER => Self::Refer { content },
            other => Self::Unknown {
                sub_type: other,
                content,
            },
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Store-local sequence position, used only for ordering.
    pub seq: i64,
    /// Unix timestamp in seconds.
    pub create_time: i64,
    /// Whether the exporting identity authored this message.
    pub is_sender: bool,
    /// Author of the message.
    pub sender: ConversationUser,
    pub kind: MessageKind,
}

/// One page of messages returned by a time-windowed query.
#[derive(Debug, Clone, Default)]
pub struct MessagePage {
    /// Number of rows the store matched, including skipped ones.
    pub total: usize,
    pub rows: Vec<Message>,
    /// Rows that matched but could not be decoded.
    pub skipped: usize,
    oldest: Option<i64>,
}

impl MessagePage {
    /// Builds a page from rows.
    #[must_use]
    pub fn new(rows: Vec<Message>) -> Self {
        Self {
            total: rows.len(),
            oldest: rows.iter().map(|m| m.create_time).min(),
            rows,
            skipped: 0,
        }
    }

    /// Records undecodable rows so the page still spans their timestamps.
    #[must_use]
    pub fn with_skipped(mut self, skipped: usize, oldest_skipped: Option<i64>) -> Self {
        self.skipped += skipped;
        self.total += skipped;
        self.oldest = self.oldest.into_iter().chain(oldest_skipped).min();
        self
    }

    /// Oldest timestamp among all matched rows, independent of row order.
    ///
    /// `None` only when the store matched nothing.
    #[must_use]
    pub const fn oldest_time(&self) -> Option<i64> {
        self.oldest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(remark: Option<&str>, nick: &str, name: &str) -> ConversationUser {
        ConversationUser {
            user_name: name.to_string(),
            nick_name: nick.to_string(),
            remark: remark.map(str::to_string),
            is_group: false,
        }
    }

    #[test]
    fn test_display_name_precedence() {
        assert_eq!(user(Some("A"), "B", "C").display_name(), "A");
        assert_eq!(user(None, "B", "C").display_name(), "B");
        assert_eq!(user(Some(""), "B", "C").display_name(), "B");
        assert_eq!(user(None, "", "C").display_name(), "C");
    }

    #[test]
    fn test_from_codes_known_types() {
        let extra = MessageExtra {
            image_path: "img/1.jpg".into(),
            location_label: "Shanghai".into(),
            poi_name: "Bund".into(),
            ..Default::default()
        };

        assert_eq!(
            MessageKind::from_codes(type_code::PICTURE, 0, String::new(), extra.clone()),
            MessageKind::Picture {
                path: "img/1.jpg".into()
            }
        );
        assert_eq!(
            MessageKind::from_codes(type_code::LOCATION, 0, String::new(), extra),
            MessageKind::Location {
                label: "Shanghai".into(),
                poi_name: "Bund".into()
            }
        );
    }

    #[test]
    fn test_from_codes_misc_aliases() {
        let extra = MessageExtra {
            link_title: "mini".into(),
            channels_description: "stream".into(),
            ..Default::default()
        };

        for code in [misc_code::APPLET, misc_code::APPLET_ALT] {
            assert_eq!(
                MessageKind::from_codes(type_code::MISC, code, String::new(), extra.clone()),
                MessageKind::Misc(MiscMessage::Applet {
                    title: "mini".into()
                })
            );
        }
        for code in [misc_code::LIVE, misc_code::LIVE_ALT] {
            assert_eq!(
                MessageKind::from_codes(type_code::MISC, code, String::new(), extra.clone()),
                MessageKind::Misc(MiscMessage::Live {
                    description: "stream".into()
                })
            );
        }
    }

    #[test]
    fn test_from_codes_unknown_keeps_raw_values() {
        assert_eq!(
            MessageKind::from_codes(9999, 0, "hi".into(), MessageExtra::default()),
            MessageKind::Unknown {
                msg_type: 9999,
                content: "hi".into()
            }
        );
        assert_eq!(
            MessageKind::from_codes(type_code::MISC, 2001, "red".into(), MessageExtra::default()),
            MessageKind::Misc(MiscMessage::Unknown {
                sub_type: 2001,
                content: "red".into()
            })
        );
    }

    #[test]
    fn test_page_oldest_time_ignores_order() {
        let msg = |t| Message {
            seq: t,
            create_time: t,
            is_sender: false,
            sender: ConversationUser::default(),
            kind: MessageKind::Text {
                content: String::new(),
            },
        };
        let page = MessagePage::new(vec![msg(200), msg(100), msg(300)]);
        assert_eq!(page.oldest_time(), Some(100));
        assert_eq!(page.total, 3);
        assert_eq!(MessagePage::default().oldest_time(), None);
    }

    #[test]
    fn test_skipped_rows_extend_page_span() {
        let skipped_only = MessagePage::new(Vec::new()).with_skipped(3, Some(40));
        assert!(skipped_only.rows.is_empty());
        assert_eq!(skipped_only.total, 3);
        assert_eq!(skipped_only.skipped, 3);
        assert_eq!(skipped_only.oldest_time(), Some(40));
    }
}
