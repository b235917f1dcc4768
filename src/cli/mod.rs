//! CLI interface using clap.
//!
//! Provides command-line flags for exporting and listing conversations.

use std::path::PathBuf;

use clap::Parser;

/// WeChat TXT Export - write a chat history to a plain-text transcript.
///
/// Export:  wechat-txt-export --data <dir> --user <wxid> --output <dir>
/// List:    wechat-txt-export --data <dir> --list
#[derive(Parser, Debug)]
#[command(name = "wechat-txt-export")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Decrypted WeChat data directory or store database file.
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// User or group name whose chat history to export.
    #[arg(short, long)]
    pub user: Option<String>,

    /// Directory to write the transcript to.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// List available conversations instead of exporting.
    #[arg(short, long)]
    pub list: bool,

    /// Messages fetched per store query.
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Configuration file (defaults to ~/.wechat-txt-export/config.toml).
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
