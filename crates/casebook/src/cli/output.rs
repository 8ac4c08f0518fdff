//! Rendering posts for the terminal.

use std::fmt::Write as _;

use crate::error::Result;
use crate::post::BlogPost;

use super::OutputFormat;

const TITLE_WIDTH: usize = 48;

/// Render a list of posts.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_posts(posts: &[BlogPost], format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => return Ok(serde_json::to_string_pretty(posts)?),
        OutputFormat::Plain => {
            for post in posts {
                let _ = writeln!(out, "{}\t{}", post.slug, post.title);
            }
        }
        OutputFormat::Table => {
            let _ = writeln!(
                out,
                "{:<26}  {:<9}  {:>6}  {:<10}  TITLE",
                "ID", "STATUS", "VIEWS", "DATE"
            );
            for post in posts {
                let _ = writeln!(
                    out,
                    "{:<26}  {:<9}  {:>6}  {:<10}  {}",
                    post.id,
                    post.status,
                    post.views,
                    post.publish_date,
                    truncate(&post.title, TITLE_WIDTH)
                );
            }
            if posts.is_empty() {
                out.push_str("(no posts)\n");
            }
        }
    }
    Ok(out)
}

/// Render one post in full.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_post(post: &BlogPost, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(post)?);
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", post.title);
    let _ = writeln!(out, "{}", "=".repeat(post.title.chars().count()));
    let _ = writeln!(out, "Id:         {}", post.id);
    let _ = writeln!(out, "Slug:       {}", post.slug);
    let _ = writeln!(out, "Status:     {}", post.status);
    let _ = writeln!(out, "Author:     {}", post.author);
    let _ = writeln!(out, "Category:   {}", post.category);
    let _ = writeln!(out, "Published:  {}", post.publish_date);
    let _ = writeln!(out, "Views:      {}", post.views);
    let _ = writeln!(out, "Created:    {}", post.created_at.to_rfc3339());
    let _ = writeln!(out, "Updated:    {}", post.updated_at.to_rfc3339());
    if let Some(url) = &post.image_url {
        let _ = writeln!(
            out,
            "Image:      {} ({})",
            url,
            post.image_alt.as_deref().unwrap_or("no alt text")
        );
    }
    if let Some(title) = &post.meta_title {
        let _ = writeln!(out, "Meta title: {title}");
    }
    if let Some(description) = &post.meta_description {
        let _ = writeln!(out, "Meta desc:  {description}");
    }
    out.push('\n');
    if !post.excerpt.is_empty() {
        let _ = writeln!(out, "{}\n", post.excerpt);
    }
    let _ = writeln!(out, "{}", post.content);
    Ok(out)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::sample_posts;

    #[test]
    fn test_render_posts_plain() {
        let posts = sample_posts();
        let out = render_posts(&posts, OutputFormat::Plain).unwrap();
        assert_eq!(out.lines().count(), posts.len());
        assert!(out.starts_with(&posts[0].slug));
    }

    #[test]
    fn test_render_posts_table() {
        let posts = sample_posts();
        let out = render_posts(&posts, OutputFormat::Table).unwrap();
        assert!(out.lines().next().unwrap().starts_with("ID"));
        assert_eq!(out.lines().count(), posts.len() + 1);
    }

    #[test]
    fn test_render_empty_table() {
        let out = render_posts(&[], OutputFormat::Table).unwrap();
        assert!(out.contains("(no posts)"));
    }

    #[test]
    fn test_render_posts_json() {
        let posts = sample_posts();
        let out = render_posts(&posts, OutputFormat::Json).unwrap();
        let parsed: Vec<BlogPost> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, posts);
    }

    #[test]
    fn test_render_post_plain() {
        let post = &sample_posts()[0];
        let out = render_post(post, OutputFormat::Plain).unwrap();
        assert!(out.starts_with(&post.title));
        assert!(out.contains(&format!("Slug:       {}", post.slug)));
        assert!(out.contains(&post.content));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer title", 10), "a much ...");
    }
}
