//! `casebook` - CLI for the practice blog
//!
//! This binary provides the command-line interface for managing posts through
//! the hybrid store.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;

use anyhow::{bail, Context};
use clap::Parser;

use casebook::cli::{
    render_post, render_posts, Cli, Command, ConfigCommand, CreateCommand, DeleteCommand,
    ListCommand, OutputFormat, SearchCommand, ShowCommand, StatusCommand, UpdateCommand,
};
use casebook::{init_logging, Config, HybridStore, PostPatch, PostStatus, PostStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Validation reports its own errors instead of failing to start
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        handle_validate(file.clone().or_else(|| cli.config.clone()));
        return Ok(());
    }

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    if let Command::Config(config_cmd) = &cli.command {
        return handle_config(&config, config_cmd);
    }

    let store = HybridStore::from_config(&config).context("opening post stores")?;

    match cli.command {
        Command::List(cmd) => handle_list(&store, &cmd).await,
        Command::Show(cmd) => handle_show(&store, &cmd).await,
        Command::Search(cmd) => handle_search(&store, &cmd).await,
        Command::Create(cmd) => handle_create(&store, &cmd).await,
        Command::Update(cmd) => handle_update(&store, &cmd).await,
        Command::Publish(cmd) => set_status(&store, &cmd.id, PostStatus::Published).await,
        Command::Unpublish(cmd) => set_status(&store, &cmd.id, PostStatus::Draft).await,
        Command::Delete(cmd) => handle_delete(&store, &cmd).await,
        Command::View(cmd) => handle_view(&store, &cmd.id).await,
        Command::Sync(cmd) => handle_sync(&store, &cmd).await,
        Command::Status(cmd) => handle_status(&store, &config, &cmd),
        Command::Config(_) => Ok(()),
    }
}

async fn handle_list(store: &HybridStore, cmd: &ListCommand) -> anyhow::Result<()> {
    let posts = match cmd.status {
        Some(status) => store.get_by_status(status.into()).await?,
        None => store.get_all().await?,
    };
    print!("{}", render_posts(&posts, cmd.format)?);
    Ok(())
}

async fn handle_show(store: &HybridStore, cmd: &ShowCommand) -> anyhow::Result<()> {
    let post = match store.get_by_id(&cmd.post).await? {
        Some(post) => Some(post),
        None => store.get_by_slug(&cmd.post).await?,
    };
    let Some(post) = post else {
        bail!("no post with id or slug '{}'", cmd.post);
    };
    print!("{}", render_post(&post, cmd.format)?);
    Ok(())
}

async fn handle_search(store: &HybridStore, cmd: &SearchCommand) -> anyhow::Result<()> {
    let posts = store.search(&cmd.query).await?;
    print!("{}", render_posts(&posts, cmd.format)?);
    Ok(())
}

fn read_content(inline: Option<&String>, file: Option<&Path>) -> anyhow::Result<Option<String>> {
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        return Ok(Some(content));
    }
    Ok(inline.cloned())
}

async fn handle_create(store: &HybridStore, cmd: &CreateCommand) -> anyhow::Result<()> {
    let content = read_content(cmd.content.as_ref(), cmd.content_file.as_deref())?;
    let post = store.save(&cmd.to_draft(content.unwrap_or_default())).await?;

    if cmd.json {
        print!("{}", render_post(&post, OutputFormat::Json)?);
    } else {
        println!("Created post {} ({})", post.id, post.slug);
    }
    Ok(())
}

async fn handle_update(store: &HybridStore, cmd: &UpdateCommand) -> anyhow::Result<()> {
    let content = read_content(cmd.content.as_ref(), cmd.content_file.as_deref())?;
    let patch = cmd.to_patch(content);
    if patch.is_empty() {
        bail!("nothing to update; pass at least one field");
    }

    let Some(post) = store.update(&cmd.id, &patch).await? else {
        bail!("no post with id '{}'", cmd.id);
    };
    if cmd.json {
        print!("{}", render_post(&post, OutputFormat::Json)?);
    } else {
        println!("Updated post {} ({})", post.id, post.slug);
    }
    Ok(())
}

async fn set_status(store: &HybridStore, id: &str, status: PostStatus) -> anyhow::Result<()> {
    let Some(post) = store.update(id, &PostPatch::status(status)).await? else {
        bail!("no post with id '{id}'");
    };
    println!("Post {} is now {}", post.id, post.status);
    Ok(())
}

async fn handle_delete(store: &HybridStore, cmd: &DeleteCommand) -> anyhow::Result<()> {
    if !cmd.yes {
        println!("This will permanently delete post {}.", cmd.id);
        println!("Use --yes to confirm.");
        return Ok(());
    }

    if store.delete(&cmd.id).await? {
        println!("Deleted post {}", cmd.id);
    } else {
        bail!("no post with id '{}'", cmd.id);
    }
    Ok(())
}

async fn handle_view(store: &HybridStore, id: &str) -> anyhow::Result<()> {
    store.increment_views(id).await?;
    match store.get_by_id(id).await? {
        Some(post) => println!("Post {} has {} views", post.id, post.views),
        None => println!("No post with id '{id}'; nothing recorded"),
    }
    Ok(())
}

async fn handle_sync(store: &HybridStore, cmd: &StatusCommand) -> anyhow::Result<()> {
    if !store.has_remote() {
        println!("Remote store is disabled; nothing to sync.");
        return Ok(());
    }

    let report = store.retry_pending().await?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Replayed {} queued writes", report.attempted);
        println!("  Succeeded: {}", report.succeeded);
        println!("  Skipped:   {}", report.skipped);
        println!("  Failed:    {}", report.failed);
        println!("  Dropped:   {}", report.dropped);
    }
    Ok(())
}

fn handle_status(store: &HybridStore, config: &Config, cmd: &StatusCommand) -> anyhow::Result<()> {
    let stats = store.local().stats()?;
    let remote = if !config.remote.enabled {
        "disabled"
    } else if config.remote.base_url.is_some() {
        "enabled"
    } else {
        "enabled (no base_url; reads fall back to local)"
    };

    if cmd.json {
        let status = serde_json::json!({
            "database_path": store.local().path(),
            "remote": remote,
            "collection": config.remote.collection,
            "total_posts": stats.total_posts,
            "published_posts": stats.published_posts,
            "draft_posts": stats.draft_posts,
            "total_views": stats.total_views,
            "pending_sync": stats.pending_sync,
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("casebook status");
        println!("---------------");
        println!("Database:      {}", store.local().path().display());
        println!("Remote:        {remote}");
        println!("Posts:         {}", stats.total_posts);
        println!("  Published:   {}", stats.published_posts);
        println!("  Drafts:      {}", stats.draft_posts);
        println!("Total views:   {}", stats.total_views);
        println!("Pending sync:  {}", stats.pending_sync);
    }
    Ok(())
}

fn handle_validate(path: Option<std::path::PathBuf>) {
    let path = path.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path)) {
        Ok(_) => println!("Configuration is valid."),
        Err(e) => println!("Configuration error: {e}"),
    }
}

fn handle_config(config: &Config, cmd: &ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if *json {
                let mut shown = config.clone();
                if shown.remote.api_key.is_some() {
                    shown.remote.api_key = Some("(redacted)".to_string());
                }
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Local]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Seed samples:       {}", config.local.seed_samples);
                println!();
                println!("[Remote]");
                println!("  Enabled:            {}", config.remote.enabled);
                println!(
                    "  Base URL:           {}",
                    config.remote.base_url.as_deref().unwrap_or("(not set)")
                );
                println!("  Collection:         {}", config.remote.collection);
                println!(
                    "  API key:            {}",
                    if config.remote.api_key.is_some() {
                        "(set)"
                    } else {
                        "(not set)"
                    }
                );
                println!("  Timeout (secs):     {}", config.remote.timeout_secs);
                println!();
                println!("[Sync]");
                println!("  Max attempts:       {}", config.sync.max_attempts);
                println!(
                    "  Sample fallback:    {}",
                    config.sync.fallback_to_samples
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { .. } => {}
    }
    Ok(())
}
