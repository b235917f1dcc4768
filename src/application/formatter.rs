//! Plain-text rendering of messages and transcript framing.
//!
//! Each message renders to exactly one line of the form
//! `[YYYY-MM-DD HH:MM:SS] sender: content`.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};

use crate::domain::{ConversationUser, Message, MessageKind, MiscMessage};

/// Sender label for messages written by the exporting identity.
pub const SELF_LABEL: &str = "我";

/// Timestamp format used in transcripts.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const RULE_WIDTH: usize = 50;

/// Formats a message as a transcript line in local time.
#[must_use]
pub fn format_message(msg: &Message, self_user_name: &str) -> String {
    format_message_in(msg, self_user_name, &Local)
}

/// Formats a message as a transcript line in the given time zone.
#[must_use]
pub fn format_message_in<Tz>(msg: &Message, self_user_name: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "[{}] {}: {}",
        format_timestamp(msg.create_time, tz),
        sender_label(msg, self_user_name),
        format_content(&msg.kind)
    )
}

/// Renders a Unix timestamp, falling back to the raw number when out of range.
fn format_timestamp<Tz>(secs: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    DateTime::from_timestamp(secs, 0).map_or_else(
        || secs.to_string(),
        |dt| dt.with_timezone(tz).format(TIME_FORMAT).to_string(),
    )
}

fn sender_label<'a>(msg: &'a Message, self_user_name: &str) -> &'a str {
    let own = !self_user_name.is_empty() && msg.sender.user_name == self_user_name;
    if msg.is_sender || own {
        SELF_LABEL
    } else {
        msg.sender.display_name()
    }
}

/// Renders the content part of a message.
#[must_use]
pub fn format_content(kind: &MessageKind) -> String {
    match kind {
        MessageKind::Text { content } => content.clone(),
        MessageKind::Picture { path } => media("[图片]", path),
        MessageKind::Voice { path } => media("[语音]", path),
        MessageKind::Video { path } => media("[视频]", path),
        MessageKind::Emoji { path } => media("[表情]", path),
        MessageKind::Location { label, poi_name } => {
            if poi_name.is_empty() {
                format!("[位置] {label}")
            } else {
                format!("[位置] {label} ({poi_name})")
            }
        }
        MessageKind::VisitCard { nick_name } => format!("[名片] {nick_name}"),
        MessageKind::Voip { description } => format!("[通话] {description}"),
        MessageKind::System { content } => format!("[系统消息] {content}"),
        MessageKind::Misc(misc) => format_misc(misc),
        MessageKind::Unknown { msg_type, content } => {
            format!("[未知消息类型:{msg_type}] {content}")
        }
    }
}

fn format_misc(misc: &MiscMessage) -> String {
    match misc {
        MiscMessage::File { file_name } => format!("[文件] {file_name}"),
        MiscMessage::CardLink { title } => format!("[链接] {title}"),
        MiscMessage::Applet { title } => format!("[小程序] {title}"),
        MiscMessage::Transfer { description } => format!("[转账] {description}"),
        MiscMessage::Music { title, description } => format!("[音乐] {title} - {description}"),
        MiscMessage::Channels { description } => format!("[视频号] {description}"),
        MiscMessage::Live { description } => format!("[直播] {description}"),
        MiscMessage::Refer { content } => format!("[引用消息] {content}"),
        MiscMessage::Unknown { sub_type, content } => format!("[其他消息:{sub_type}] {content}"),
    }
}

fn media(tag: &str, path: &str) -> String {
    if path.is_empty() {
        tag.to_string()
    } else {
        format!("{tag} (路径: {path})")
    }
}

/// Renders the transcript header, including the trailing blank line.
#[must_use]
pub fn format_header<Tz>(user: &ConversationUser, exported_at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::from("微信聊天记录导出\n");
    out.push_str(&format!("导出时间: {}\n", exported_at.format(TIME_FORMAT)));
    out.push_str(&format!("聊天对象: {}", user.nick_name));
    if let Some(remark) = user.remark() {
        out.push_str(&format!(" ({remark})"));
    }
    out.push('\n');
    out.push_str(&format!("聊天类型: {}\n", user.chat_type_label()));
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push_str("\n\n");
    out
}

/// Renders the transcript footer.
///
/// Undecodable rows are recorded on an extra line.
#[must_use]
pub fn format_footer(message_count: usize, skipped_count: usize) -> String {
    let mut out = format!(
        "\n{}\n导出完成，共导出 {message_count} 条消息\n",
        "=".repeat(RULE_WIDTH)
    );
    if skipped_count > 0 {
        out.push_str(&format!("跳过 {skipped_count} 条无法解析的消息\n"));
    }
    out
}
