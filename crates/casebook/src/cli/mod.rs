//! Command-line interface for casebook.
//!
//! This module provides the CLI structure for the `casebook` binary, an
//! admin tool over the hybrid post store.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, CreateCommand, DeleteCommand, ListCommand, OutputFormat, PostIdCommand,
    SearchCommand, ShowCommand, StatusArg, StatusCommand, UpdateCommand,
};
pub use output::{render_post, render_posts};

/// casebook - Manage the practice's blog posts
///
/// Reads and writes posts through the hybrid store: the remote document
/// store when it is enabled and reachable, the local database otherwise.
#[derive(Debug, Parser)]
#[command(name = "casebook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List posts, newest first
    List(ListCommand),

    /// Show one post by id or slug
    Show(ShowCommand),

    /// Search posts
    Search(SearchCommand),

    /// Create a post
    Create(CreateCommand),

    /// Edit a post
    Update(UpdateCommand),

    /// Mark a post as published
    Publish(PostIdCommand),

    /// Move a post back to draft
    Unpublish(PostIdCommand),

    /// Delete a post
    Delete(DeleteCommand),

    /// Record a view of a post
    View(PostIdCommand),

    /// Replay remote writes that failed earlier
    Sync(StatusCommand),

    /// Show store status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                2 => crate::logging::Verbosity::Debug,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn status_cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "casebook");
    }

    #[test]
    fn test_verbosity_levels() {
        use crate::logging::Verbosity;

        assert_eq!(status_cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(status_cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(status_cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(status_cli(2, false).verbosity(), Verbosity::Debug);
        assert_eq!(status_cli(3, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_with_status() {
        let cli = Cli::try_parse_from(["casebook", "list", "--status", "published"]).unwrap();
        match cli.command {
            Command::List(cmd) => {
                assert_eq!(cmd.status, Some(StatusArg::Published));
                assert_eq!(cmd.format, OutputFormat::Table);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_create() {
        let cli = Cli::try_parse_from([
            "casebook",
            "create",
            "--title",
            "Wills and Trusts",
            "--status",
            "published",
            "--publish-date",
            "2024-06-01",
        ])
        .unwrap();
        match cli.command {
            Command::Create(cmd) => {
                assert_eq!(cmd.title, "Wills and Trusts");
                assert_eq!(cmd.status, StatusArg::Published);
                assert_eq!(
                    cmd.publish_date,
                    chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_create_rejects_bad_date() {
        let result = Cli::try_parse_from([
            "casebook",
            "create",
            "--title",
            "x",
            "--publish-date",
            "June 1st",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_content_and_file_conflict() {
        let result = Cli::try_parse_from([
            "casebook",
            "create",
            "--title",
            "x",
            "--content",
            "<p>a</p>",
            "--content-file",
            "body.html",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_update_clear_image_conflict() {
        let result = Cli::try_parse_from([
            "casebook",
            "update",
            "p1",
            "--clear-image",
            "--image-url",
            "https://example.com/x.png",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_publish() {
        let cli = Cli::try_parse_from(["casebook", "publish", "01HX"]).unwrap();
        assert!(matches!(cli.command, Command::Publish(ref c) if c.id == "01HX"));
    }

    #[test]
    fn test_parse_delete_requires_id() {
        assert!(Cli::try_parse_from(["casebook", "delete"]).is_err());
        let cli = Cli::try_parse_from(["casebook", "delete", "p1", "--yes"]).unwrap();
        assert!(matches!(cli.command, Command::Delete(ref c) if c.yes));
    }

    #[test]
    fn test_parse_with_config() {
        let cli =
            Cli::try_parse_from(["casebook", "-c", "/custom/config.toml", "status"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_config_validate() {
        let cli = Cli::try_parse_from(["casebook", "config", "validate", "-f", "x.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }
}
