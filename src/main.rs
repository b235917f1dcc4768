//! WeChat TXT Export - write WeChat chat history to plain-text transcripts.
//!
//! Reads a decrypted WeChat message store and pages backwards through a
//! conversation, rendering every message as one line of text.
//!
//!   wechat-txt-export --data <dir> --list
//!   wechat-txt-export --data <dir> --user <wxid> --output <dir>

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::io::Write;
use std::path::Path;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{format_sessions_table, list_sessions, ExportCompletion, Exporter};
use cli::Cli;
use domain::{AppConfig, AppError, MessageStore};
use infrastructure::{load_config, load_config_from_file, resolve_store_database, SqliteMessageStore};

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
fn run(cli: Cli) -> domain::Result<()> {
    println!("{}", "=== 微信聊天记录txt导出工具 ===".bold());

    let config = match &cli.config {
        Some(path) => load_config_from_file(path)?,
        None => load_config()?,
    };

    let data_path = cli
        .data
        .clone()
        .or_else(|| config.store.data_path.clone())
        .ok_or_else(|| AppError::Config {
            message: "请指定微信数据路径 (--data)".into(),
        })?;

    let store = SqliteMessageStore::open(&resolve_store_database(&data_path)?)?;

    if cli.list {
        return cmd_list(&store, &data_path, config.store.session_limit);
    }

    let user = cli.user.as_deref().ok_or_else(|| AppError::Config {
        message: "请指定要导出的用户名 (--user)，使用 --list 查看所有可用用户".into(),
    })?;

    cmd_export(&store, user, &cli, &config)
}

/// List conversations command.
fn cmd_list(store: &dyn MessageStore, data_path: &Path, limit: usize) -> domain::Result<()> {
    let sessions = list_sessions(store, 0, limit)?;

    println!();
    println!("{}", "=== 可用的聊天对象 ===".bold());
    println!("找到 {} 个聊天对象:", sessions.total.to_string().cyan());
    println!("{}", format_sessions_table(&sessions));

    println!();
    println!("💡 使用示例:");
    println!(
        "   wechat-txt-export --data \"{}\" --user <用户名> --output <导出路径>",
        data_path.display()
    );

    Ok(())
}

/// Export a single conversation command.
fn cmd_export(
    store: &dyn MessageStore,
    user: &str,
    cli: &Cli,
    config: &AppConfig,
) -> domain::Result<()> {
    let output_dir = cli
        .output
        .clone()
        .unwrap_or_else(|| config.export.output_dir.clone());
    let page_size = cli.page_size.unwrap_or(config.export.page_size);

    std::fs::create_dir_all(&output_dir).map_err(|e| {
        AppError::io(format!("Failed to create directory {}", output_dir.display()), e)
    })?;

    println!("正在导出 {} 的聊天记录...", user.cyan());

    let exported = Exporter::new(store)
        .with_page_size(page_size)
        .with_progress(|count| {
            print!("已处理 {count} 条消息...\r");
            std::io::stdout().flush().ok();
        })
        .export_to_dir(user, &output_dir)?;

    println!();
    if let ExportCompletion::Truncated { reason } = &exported.report.completion {
        println!("{} 导出提前结束: {}", "⚠".yellow().bold(), reason);
    }
    println!("{} 导出成功！", "✓".green().bold());
    println!("文件保存在: {}", exported.path.display());
    println!("共导出 {} 条消息", exported.report.message_count);
    if exported.report.skipped_count > 0 {
        println!(
            "{} 跳过 {} 条无法解析的消息",
            "⚠".yellow().bold(),
            exported.report.skipped_count
        );
    }

    Ok(())
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
