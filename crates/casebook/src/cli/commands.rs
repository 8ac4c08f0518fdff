//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::post::{PostDraft, PostPatch, PostStatus};

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only show posts with this status
    #[arg(short, long, value_enum)]
    pub status: Option<StatusArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Post id or slug
    pub post: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Text to look for in title, excerpt, content and category
    pub query: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Create command arguments.
#[derive(Debug, Args)]
pub struct CreateCommand {
    /// Post title; the slug is derived from it
    #[arg(short, long)]
    pub title: String,

    /// Short summary
    #[arg(short, long, default_value = "")]
    pub excerpt: String,

    /// HTML body
    #[arg(long, conflicts_with = "content_file")]
    pub content: Option<String>,

    /// Read the HTML body from a file
    #[arg(long, value_name = "FILE")]
    pub content_file: Option<PathBuf>,

    /// Initial status
    #[arg(short, long, value_enum, default_value = "draft")]
    pub status: StatusArg,

    /// Author byline
    #[arg(short, long, default_value = "")]
    pub author: String,

    /// Category
    #[arg(long, default_value = "")]
    pub category: String,

    /// Publication date (YYYY-MM-DD); defaults to today
    #[arg(long, value_name = "DATE")]
    pub publish_date: Option<NaiveDate>,

    /// Header image URL
    #[arg(long)]
    pub image_url: Option<String>,

    /// Header image alt text
    #[arg(long)]
    pub image_alt: Option<String>,

    /// Title for search engines
    #[arg(long)]
    pub meta_title: Option<String>,

    /// Description for search engines
    #[arg(long)]
    pub meta_description: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl CreateCommand {
    /// Build the draft, with the body already resolved.
    #[must_use]
    pub fn to_draft(&self, content: String) -> PostDraft {
        PostDraft {
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            content,
            status: self.status.into(),
            author: self.author.clone(),
            category: self.category.clone(),
            publish_date: self.publish_date,
            image_url: self.image_url.clone(),
            image_alt: self.image_alt.clone(),
            meta_title: self.meta_title.clone(),
            meta_description: self.meta_description.clone(),
        }
    }
}

/// Update command arguments.
#[derive(Debug, Args)]
pub struct UpdateCommand {
    /// Post id
    pub id: String,

    /// New title (the slug is kept)
    #[arg(short, long)]
    pub title: Option<String>,

    /// New slug
    #[arg(long)]
    pub slug: Option<String>,

    /// New summary
    #[arg(short, long)]
    pub excerpt: Option<String>,

    /// New HTML body
    #[arg(long, conflicts_with = "content_file")]
    pub content: Option<String>,

    /// Read the new HTML body from a file
    #[arg(long, value_name = "FILE")]
    pub content_file: Option<PathBuf>,

    /// New status
    #[arg(short, long, value_enum)]
    pub status: Option<StatusArg>,

    /// New author byline
    #[arg(short, long)]
    pub author: Option<String>,

    /// New category
    #[arg(long)]
    pub category: Option<String>,

    /// New publication date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub publish_date: Option<NaiveDate>,

    /// New header image URL
    #[arg(long)]
    pub image_url: Option<String>,

    /// New header image alt text
    #[arg(long)]
    pub image_alt: Option<String>,

    /// Remove the header image
    #[arg(long, conflicts_with_all = ["image_url", "image_alt"])]
    pub clear_image: bool,

    /// New title for search engines
    #[arg(long)]
    pub meta_title: Option<String>,

    /// New description for search engines
    #[arg(long)]
    pub meta_description: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl UpdateCommand {
    /// Build the patch, with the body already resolved.
    #[must_use]
    pub fn to_patch(&self, content: Option<String>) -> PostPatch {
        let (image_url, image_alt) = if self.clear_image {
            (Some(None), Some(None))
        } else {
            (
                self.image_url.clone().map(Some),
                self.image_alt.clone().map(Some),
            )
        };

        PostPatch {
            title: self.title.clone(),
            slug: self.slug.clone(),
            excerpt: self.excerpt.clone(),
            content,
            status: self.status.map(Into::into),
            author: self.author.clone(),
            category: self.category.clone(),
            publish_date: self.publish_date,
            image_url,
            image_alt,
            meta_title: self.meta_title.clone().map(Some),
            meta_description: self.meta_description.clone().map(Some),
        }
    }
}

/// Arguments for commands that act on one post.
#[derive(Debug, Args)]
pub struct PostIdCommand {
    /// Post id
    pub id: String,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Post id
    pub id: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Status and sync command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Post status argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    /// Admin-only posts
    Draft,
    /// Publicly listed posts
    Published,
}

impl From<StatusArg> for PostStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Draft => Self::Draft,
            StatusArg::Published => Self::Published,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(id: &str) -> UpdateCommand {
        UpdateCommand {
            id: id.to_string(),
            title: None,
            slug: None,
            excerpt: None,
            content: None,
            content_file: None,
            status: None,
            author: None,
            category: None,
            publish_date: None,
            image_url: None,
            image_alt: None,
            clear_image: false,
            meta_title: None,
            meta_description: None,
            json: false,
        }
    }

    #[test]
    fn test_status_arg_conversion() {
        assert_eq!(PostStatus::from(StatusArg::Draft), PostStatus::Draft);
        assert_eq!(PostStatus::from(StatusArg::Published), PostStatus::Published);
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_create_to_draft() {
        let cmd = CreateCommand {
            title: "Trusts Explained".to_string(),
            excerpt: "Short".to_string(),
            content: None,
            content_file: None,
            status: StatusArg::Published,
            author: "A. Lawyer".to_string(),
            category: "Estate Planning".to_string(),
            publish_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            image_url: None,
            image_alt: None,
            meta_title: Some("Trusts".to_string()),
            meta_description: None,
            json: false,
        };

        let draft = cmd.to_draft("<p>Body</p>".to_string());
        assert_eq!(draft.title, "Trusts Explained");
        assert_eq!(draft.content, "<p>Body</p>");
        assert_eq!(draft.status, PostStatus::Published);
        assert_eq!(draft.meta_title.as_deref(), Some("Trusts"));
    }

    #[test]
    fn test_empty_update_is_empty_patch() {
        assert!(update("p1").to_patch(None).is_empty());
    }

    #[test]
    fn test_update_to_patch() {
        let mut cmd = update("p1");
        cmd.status = Some(StatusArg::Published);
        cmd.meta_description = Some("About wills".to_string());

        let patch = cmd.to_patch(Some("<p>New</p>".to_string()));
        assert_eq!(patch.status, Some(PostStatus::Published));
        assert_eq!(patch.content.as_deref(), Some("<p>New</p>"));
        assert_eq!(patch.meta_description, Some(Some("About wills".to_string())));
        assert_eq!(patch.image_url, None);
    }

    #[test]
    fn test_clear_image_clears_both_fields() {
        let mut cmd = update("p1");
        cmd.clear_image = true;

        let patch = cmd.to_patch(None);
        assert_eq!(patch.image_url, Some(None));
        assert_eq!(patch.image_alt, Some(None));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
