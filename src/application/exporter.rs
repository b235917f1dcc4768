//! Transcript export engine.
//!
//! Walks a conversation backwards through the message store one page at a
//! time, rendering every message into the output as it arrives.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::domain::{
    AppError, ConversationUser, MessageStore, Result, SearchDirection, DEFAULT_PAGE_SIZE,
};

use super::formatter::{format_footer, format_header, format_message};

/// How an export run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportCompletion {
    /// The store reported no older messages.
    Complete,
    /// A page could not be fetched; everything before it was written.
    Truncated { reason: String },
}

/// Outcome of writing one transcript.
///
/// The cursor has whole-second resolution and steps to one second before the
/// oldest message of each page. When a full page ends partway through a
/// second, the remaining messages of that second are not fetched and are
/// absent from `message_count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// Messages written, equal to the count in the footer.
    pub message_count: usize,
    /// Rows the store matched but could not decode.
    pub skipped_count: usize,
    /// Non-empty pages fetched.
    pub pages_fetched: usize,
    pub completion: ExportCompletion,
}

/// A transcript written to disk.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub report: ExportReport,
}

/// Exports conversations from a message store as plain text.
pub struct Exporter<'a> {
    store: &'a dyn MessageStore,
    page_size: usize,
    progress: Option<Box<dyn Fn(usize) + 'a>>,
}

impl<'a> Exporter<'a> {
    /// Create an exporter with the default page size.
    #[must_use]
    pub fn new(store: &'a dyn MessageStore) -> Self {
        Self {
            store,
            page_size: DEFAULT_PAGE_SIZE,
            progress: None,
        }
    }

    /// Set the number of messages requested per page (at least 1).
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Register a callback receiving the running message count after each page.
    #[must_use]
    pub fn with_progress(mut self, progress: impl Fn(usize) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Export a conversation into a new file inside `dir`.
    ///
    /// The file is named `wechat_chat_<user>_<YYYYMMDD_HHMMSS>.txt`. Nothing is
    /// created if the user cannot be resolved.
    ///
    /// # Errors
    /// Returns `NotFound` for unknown users, `Io` if the file cannot be
    /// created and `OutputWrite` if writing fails.
    pub fn export_to_dir(&self, user_name: &str, dir: &Path) -> Result<ExportedFile> {
        let user = self.store.user_by_name(user_name)?;
        let now = Local::now();
        let path = dir.join(transcript_file_name(user_name, &now));

        let file = File::create(&path)
            .map_err(|e| AppError::io(format!("Failed to create {}", path.display()), e))?;
        let report = self.write_transcript(&user, BufWriter::new(file), &now)?;

        tracing::info!(
            path = %path.display(),
            messages = report.message_count,
            skipped = report.skipped_count,
            pages = report.pages_fetched,
            "Transcript written"
        );

        Ok(ExportedFile { path, report })
    }

    /// Export a conversation into an arbitrary writer.
    ///
    /// # Errors
    /// Returns `NotFound` for unknown users (before any write) and
    /// `OutputWrite` if writing fails.
    pub fn export_to_writer<W: Write>(&self, user_name: &str, out: W) -> Result<ExportReport> {
        let user = self.store.user_by_name(user_name)?;
        self.write_transcript(&user, out, &Local::now())
    }

    fn write_transcript<W: Write>(
        &self,
        user: &ConversationUser,
        mut out: W,
        now: &DateTime<Local>,
    ) -> Result<ExportReport> {
        tracing::info!(user = %user.user_name, "Exporting {}", user.display_name());

        write_out(&mut out, &format_header(user, now))?;

        let self_user_name = self.store.self_user_name();
        let mut cursor = now.timestamp();
        let mut message_count = 0;
        let mut skipped_count = 0;
        let mut pages_fetched = 0;
        let mut completion = ExportCompletion::Complete;

        loop {
            let page = match self.store.messages_by_time(
                &user.user_name,
                cursor,
                self.page_size,
                SearchDirection::Forward,
            ) {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(cursor, "Stopping export early: {}", e);
                    completion = ExportCompletion::Truncated {
                        reason: e.to_string(),
                    };
                    break;
                }
            };

            let Some(oldest) = page.oldest_time() else {
                break;
            };

            for msg in &page.rows {
                let mut line = format_message(msg, self_user_name);
                line.push('\n');
                write_out(&mut out, &line)?;
                message_count += 1;
            }
            skipped_count += page.skipped;
            pages_fetched += 1;

            tracing::debug!(
                cursor,
                rows = page.total,
                skipped = page.skipped,
                oldest,
                first_seq = page.rows.first().map(|m| m.seq),
                last_seq = page.rows.last().map(|m| m.seq),
                "Fetched page"
            );
            if let Some(progress) = &self.progress {
                progress(message_count);
            }

            let Some(next) = oldest.checked_sub(1) else {
                break;
            };
            cursor = next;
        }

        if skipped_count > 0 {
            tracing::warn!(skipped = skipped_count, "Some messages could not be decoded");
        }
        write_out(&mut out, &format_footer(message_count, skipped_count))?;
        out.flush()
            .map_err(|e| AppError::output_write("Failed to flush transcript", e))?;

        Ok(ExportReport {
            message_count,
            skipped_count,
            pages_fetched,
            completion,
        })
    }
}

fn write_out<W: Write>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .map_err(|e| AppError::output_write("Failed to write transcript", e))
}

/// Builds the transcript file name for a user at the given time.
#[must_use]
pub fn transcript_file_name(user_name: &str, at: &DateTime<Local>) -> String {
    let safe: String = user_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("wechat_chat_{safe}_{}.txt", at.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io;

    use tempfile::tempdir;

    use super::*;
    use crate::domain::{Message, MessageKind, MessagePage, SessionList};

    /// In-memory store with scripted failures that records every cursor.
    struct ScriptedStore {
        user: ConversationUser,
        messages: Vec<Message>,
        fail_on_call: Option<usize>,
        cursors: RefCell<Vec<i64>>,
    }

    impl ScriptedStore {
        fn with_times(times: impl IntoIterator<Item = i64>) -> Self {
            let messages = times
                .into_iter()
                .map(|t| Message {
                    seq: t,
                    create_time: t,
                    is_sender: t % 100 == 50,
                    sender: ConversationUser {
                        user_name: "wxid_friend".into(),
                        nick_name: "Friend".into(),
                        remark: None,
                        is_group: false,
                    },
                    kind: MessageKind::Text {
                        content: format!("msg {t}"),
                    },
                })
                .collect();
            Self {
                user: ConversationUser {
                    user_name: "wxid_friend".into(),
                    nick_name: "Friend".into(),
                    remark: Some("Buddy".into()),
                    is_group: false,
                },
                messages,
                fail_on_call: None,
                cursors: RefCell::new(Vec::new()),
            }
        }

        fn failing_on(mut self, call: usize) -> Self {
            self.fail_on_call = Some(call);
            self
        }
    }

    impl MessageStore for ScriptedStore {
        fn self_user_name(&self) -> &str {
            "wxid_self"
        }

        fn user_by_name(&self, name: &str) -> Result<ConversationUser> {
            if name == self.user.user_name {
                Ok(self.user.clone())
            } else {
                Err(AppError::NotFound { name: name.into() })
            }
        }

        fn session_list(&self, _offset: usize, _limit: usize) -> Result<SessionList> {
            Ok(SessionList::default())
        }

        fn messages_by_time(
            &self,
            _talker: &str,
            cursor: i64,
            limit: usize,
            _direction: SearchDirection,
        ) -> Result<MessagePage> {
            self.cursors.borrow_mut().push(cursor);
            if self.fail_on_call == Some(self.cursors.borrow().len()) {
                return Err(AppError::PageRetrieval {
                    message: "disk I/O error".into(),
                    source: None,
                });
            }

            let mut rows: Vec<Message> = self
                .messages
                .iter()
                .filter(|m| m.create_time < cursor)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.create_time.cmp(&a.create_time));
            rows.truncate(limit);
            Ok(MessagePage::new(rows))
        }
    }

    fn export(store: &ScriptedStore, page_size: usize) -> (ExportReport, String) {
        let mut out = Vec::new();
        let report = Exporter::new(store)
            .with_page_size(page_size)
            .export_to_writer("wxid_friend", &mut out)
            .unwrap();
        (report, String::from_utf8(out).unwrap())
    }

    fn message_lines(transcript: &str) -> Vec<&str> {
        transcript
            .lines()
            .filter(|l| l.starts_with('[') && l.contains("] "))
            .collect()
    }

    #[test]
    fn test_three_messages_single_page() {
        let store = ScriptedStore::with_times([100, 200, 300]);
        let (report, transcript) = export(&store, 500);

        assert_eq!(report.message_count, 3);
        assert_eq!(report.pages_fetched, 1);
        assert_eq!(report.completion, ExportCompletion::Complete);

        let cursors = store.cursors.borrow();
        assert_eq!(cursors.len(), 2);
        assert_eq!(cursors[1], 99);

        let lines = message_lines(&transcript);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("Friend: msg 300"));
        assert!(lines[1].ends_with("Friend: msg 200"));
        assert!(lines[2].ends_with("Friend: msg 100"));
        assert!(transcript.ends_with("导出完成，共导出 3 条消息\n"));
    }

    #[test]
    fn test_header_names_conversation() {
        let store = ScriptedStore::with_times([100]);
        let (_, transcript) = export(&store, 500);

        let mut lines = transcript.lines();
        assert_eq!(lines.next(), Some("微信聊天记录导出"));
        assert!(lines.next().unwrap().starts_with("导出时间: "));
        assert_eq!(lines.next(), Some("聊天对象: Friend (Buddy)"));
        assert_eq!(lines.next(), Some("聊天类型: 单聊"));
    }

    #[test]
    fn test_single_message_pages_terminate() {
        let total = 25;
        let store = ScriptedStore::with_times(1..=total);
        let (report, transcript) = export(&store, 1);

        assert_eq!(report.message_count, 25);
        assert_eq!(report.pages_fetched, 25);
        assert_eq!(store.cursors.borrow().len(), 26);
        assert_eq!(message_lines(&transcript).len(), 25);
    }

    #[test]
    fn test_short_pages_do_not_stop_export() {
        let store = ScriptedStore::with_times(1..=7);
        let (report, _) = export(&store, 3);

        assert_eq!(report.message_count, 7);
        assert_eq!(report.pages_fetched, 3);
        assert_eq!(store.cursors.borrow().len(), 4);
    }

    #[test]
    fn test_cursor_strictly_below_previous_page_minimum() {
        let store = ScriptedStore::with_times((1..=40).map(|t| t * 10));
        let (report, _) = export(&store, 6);
        assert_eq!(report.message_count, 40);

        let cursors = store.cursors.borrow();
        for pair in cursors.windows(2) {
            let page_min = store
                .messages
                .iter()
                .map(|m| m.create_time)
                .filter(|&t| t < pair[0])
                .rev()
                .take(6)
                .min()
                .unwrap();
            assert!(pair[1] < page_min);
        }
    }

    #[test]
    fn test_retrieval_error_keeps_partial_transcript() {
        let store = ScriptedStore::with_times(1..=600).failing_on(2);
        let (report, transcript) = export(&store, 500);

        assert_eq!(report.message_count, 500);
        assert!(matches!(report.completion, ExportCompletion::Truncated { .. }));
        assert_eq!(message_lines(&transcript).len(), 500);
        assert!(transcript.ends_with(&format!(
            "{}\n导出完成，共导出 500 条消息\n",
            "=".repeat(50)
        )));
    }

    #[test]
    fn test_oldest_possible_timestamp_terminates() {
        let store = ScriptedStore::with_times([i64::MIN, 10]);
        let (report, transcript) = export(&store, 500);

        assert_eq!(report.message_count, 2);
        assert_eq!(report.completion, ExportCompletion::Complete);
        assert_eq!(store.cursors.borrow().len(), 1);
        assert!(transcript.ends_with("导出完成，共导出 2 条消息\n"));
    }

    #[test]
    fn test_page_ending_inside_a_second_drops_its_remainder() {
        let store = ScriptedStore::with_times([50, 50, 50, 10]);
        let (report, transcript) = export(&store, 2);

        assert_eq!(report.message_count, 3);
        assert_eq!(report.pages_fetched, 2);
        assert_eq!(store.cursors.borrow()[1], 49);
        assert_eq!(message_lines(&transcript).len(), 3);
        assert!(transcript.contains("msg 10"));
    }

    #[test]
    fn test_empty_conversation() {
        let store = ScriptedStore::with_times([]);
        let (report, transcript) = export(&store, 500);

        assert_eq!(report.message_count, 0);
        assert_eq!(report.pages_fetched, 0);
        assert!(transcript.ends_with("导出完成，共导出 0 条消息\n"));
    }

    #[test]
    fn test_unknown_user_writes_nothing() {
        let store = ScriptedStore::with_times([100]);
        let mut out = Vec::new();
        let err = Exporter::new(&store)
            .export_to_writer("wxid_nobody", &mut out)
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
        assert!(out.is_empty());
        assert!(store.cursors.borrow().is_empty());
    }

    #[test]
    fn test_unknown_user_creates_no_file() {
        let store = ScriptedStore::with_times([100]);
        let dir = tempdir().unwrap();

        let result = Exporter::new(&store).export_to_dir("wxid_nobody", dir.path());

        assert!(matches!(result, Err(AppError::NotFound { .. })));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_export_to_dir_writes_named_file() {
        let store = ScriptedStore::with_times([100, 200]);
        let dir = tempdir().unwrap();

        let exported = Exporter::new(&store)
            .export_to_dir("wxid_friend", dir.path())
            .unwrap();

        let name = exported.path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("wechat_chat_wxid_friend_"));
        assert!(name.ends_with(".txt"));
        let content = std::fs::read_to_string(&exported.path).unwrap();
        assert_eq!(message_lines(&content).len(), 2);
        assert_eq!(exported.report.message_count, 2);
    }

    #[test]
    fn test_progress_reports_running_count() {
        let store = ScriptedStore::with_times(1..=5);
        let seen = RefCell::new(Vec::new());
        let mut out = Vec::new();

        Exporter::new(&store)
            .with_page_size(2)
            .with_progress(|n| seen.borrow_mut().push(n))
            .export_to_writer("wxid_friend", &mut out)
            .unwrap();

        assert_eq!(*seen.borrow(), vec![2, 4, 5]);
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_fatal() {
        let store = ScriptedStore::with_times([100]);
        let err = Exporter::new(&store)
            .export_to_writer("wxid_friend", FailingWriter)
            .unwrap_err();
        assert!(matches!(err, AppError::OutputWrite { .. }));
    }

    #[test]
    fn test_file_name_replaces_separators() {
        let at = Local::now();
        let name = transcript_file_name("a/b\\c", &at);
        assert!(name.starts_with("wechat_chat_a_b_c_"));
    }
}
