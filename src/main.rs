use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use qiita_pocket::api::{build_http_client, QiitaClient};
use qiita_pocket::app::App;
use qiita_pocket::config::Config;
use qiita_pocket::feed::{FetchCompletion, SettingsStore};
use qiita_pocket::storage::{Database, DatabaseError};
use qiita_pocket::ui;
use qiita_pocket::util::MAX_TAG_LENGTH;

/// Get the config directory path (~/.config/qiita-pocket/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("qiita-pocket"))
}

#[derive(Parser, Debug)]
#[command(name = "qpocket", about = "Terminal Qiita reader with a read-later list")]
struct Args {
    /// Reset database (delete and recreate)
    #[arg(long)]
    reset_db: bool,

    /// Start with this tag instead of the last searched one
    #[arg(long, value_name = "TAG")]
    tag: Option<String>,

    /// Print the read-later list and exit
    #[arg(long)]
    read_later: bool,

    /// Forget all previously searched tags and exit
    #[arg(long)]
    clear_history: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never land in the alternate screen buffer.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o700);
        if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
            tracing::warn!(
                path = %config_dir.display(),
                error = %e,
                "Failed to set config directory permissions to 0700"
            );
        }
    }

    let config = Config::load(&config_dir.join("config.toml")).context("Failed to load config")?;
    tracing::debug!(?config, "Effective configuration");

    let db_path = config_dir.join("pocket.db");
    if args.reset_db && db_path.exists() {
        std::fs::remove_file(&db_path).context("Failed to delete database")?;
        println!("Database reset.");
    }

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db.with_history_limit(config.history_limit),
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of qpocket appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };

    if args.read_later {
        return print_read_later(&db).await;
    }

    if args.clear_history {
        db.clear_search_history()
            .await
            .context("Failed to clear search history")?;
        println!("Search history cleared.");
        return Ok(());
    }

    if let Some(tag) = &args.tag {
        let tag = tag.trim();
        if tag.chars().count() > MAX_TAG_LENGTH {
            anyhow::bail!("Tag is too long (max {} characters)", MAX_TAG_LENGTH);
        }
        db.set_current_tag(tag)
            .await
            .context("Failed to store start-up tag")?;
    }

    let http_client = build_http_client().context("Failed to build HTTP client")?;
    let source = QiitaClient::new(
        http_client,
        &config.api_base_url,
        config.access_token(),
        config.clamped_per_page(),
        config.request_timeout(),
    )
    .context("Invalid api_base_url in config")?;

    let (completion_tx, completion_rx) = mpsc::channel::<FetchCompletion>(32);
    let mut app = App::new(db, Arc::new(source), completion_tx);

    ui::run(&mut app, completion_rx).await?;

    println!("Goodbye!");
    Ok(())
}

async fn print_read_later(db: &Database) -> Result<()> {
    let saved = db
        .list_read_later()
        .await
        .context("Failed to load read-later list")?;

    if saved.is_empty() {
        println!("Read Later is empty.");
        return Ok(());
    }

    for entry in saved {
        let age = ui::format_relative_time(Some(entry.saved_at));
        println!("{}  ({}, saved {})", entry.article.title, entry.article.author, age);
        println!("    {}", entry.article.url);
    }
    Ok(())
}
