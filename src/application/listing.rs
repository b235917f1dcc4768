//! Session listing for the `--list` mode.

use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::{MessageStore, Result, SessionList};

/// Fetches one page of sessions from the store.
///
/// # Errors
/// Returns error if the store query fails.
pub fn list_sessions(store: &dyn MessageStore, offset: usize, limit: usize) -> Result<SessionList> {
    let sessions = store.session_list(offset, limit)?;
    tracing::debug!(
        total = sessions.total,
        rows = sessions.rows.len(),
        "Loaded session list"
    );
    Ok(sessions)
}

/// Formats a table listing of sessions, numbered from 1.
pub fn format_sessions_table(sessions: &SessionList) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "用户名", "显示名", "类型", "最后消息"]);

    for (i, session) in sessions.rows.iter().enumerate() {
        let chat_type = if session.is_group { "群聊" } else { "单聊" };
        table.add_row(vec![
            (i + 1).to_string(),
            session.user_name.clone(),
            truncate(session.user_info.display_name(), 20),
            chat_type.to_string(),
            truncate(&session.content, 30),
        ]);
    }

    table.to_string()
}

/// Truncates the first line of a string to `max_chars` characters.
fn truncate(s: &str, max_chars: usize) -> String {
    let s = s.lines().next().unwrap_or(s);
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
