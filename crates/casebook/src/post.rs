//! Core blog post types.
//!
//! This module defines the post record shared by every store, plus the
//! inputs used to create and edit posts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::slug;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Visible only in the admin surface.
    #[default]
    Draft,
    /// Visible in public listings.
    Published,
}

impl PostStatus {
    /// The lowercase wire name of this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PostStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            other => Err(Error::validation(format!("unknown post status: {other}"))),
        }
    }
}

/// A blog post as held by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    /// Store-assigned identifier. Never changes.
    pub id: String,
    /// Headline.
    pub title: String,
    /// URL-safe identifier derived from the title at creation.
    pub slug: String,
    /// Short summary for listings.
    pub excerpt: String,
    /// HTML body.
    pub content: String,
    /// Publication state.
    pub status: PostStatus,
    /// Author byline.
    pub author: String,
    /// Free-text category.
    pub category: String,
    /// Date shown as the publication date.
    pub publish_date: NaiveDate,
    /// When the post was created.
    pub created_at: DateTime<Utc>,
    /// When the post was last edited.
    pub updated_at: DateTime<Utc>,
    /// Number of recorded page views.
    pub views: u64,
    /// Header image location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Header image alt text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,
    /// Title override for search engines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    /// Description for search engines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
}

impl BlogPost {
    /// Build a fresh post from a draft.
    ///
    /// Views start at zero, both timestamps are `now`, and the slug is
    /// derived from the title. Stores are responsible for making the slug
    /// unique before persisting.
    #[must_use]
    pub fn from_draft(id: String, draft: &PostDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            slug: slug::slugify_or_fallback(&draft.title),
            excerpt: draft.excerpt.clone(),
            content: draft.content.clone(),
            status: draft.status,
            author: draft.author.clone(),
            category: draft.category.clone(),
            publish_date: draft.publish_date.unwrap_or_else(|| now.date_naive()),
            created_at: now,
            updated_at: now,
            views: 0,
            image_url: draft.image_url.clone(),
            image_alt: draft.image_alt.clone(),
            meta_title: draft.meta_title.clone(),
            meta_description: draft.meta_description.clone(),
        }
    }

    /// Merge the fields set in `patch` into this post.
    ///
    /// Does not touch `id`, `created_at`, `views` or `updated_at`.
    pub fn apply(&mut self, patch: &PostPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(slug) = &patch.slug {
            self.slug.clone_from(slug);
        }
        if let Some(excerpt) = &patch.excerpt {
            self.excerpt.clone_from(excerpt);
        }
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(author) = &patch.author {
            self.author.clone_from(author);
        }
        if let Some(category) = &patch.category {
            self.category.clone_from(category);
        }
        if let Some(date) = patch.publish_date {
            self.publish_date = date;
        }
        if let Some(image_url) = &patch.image_url {
            self.image_url.clone_from(image_url);
        }
        if let Some(image_alt) = &patch.image_alt {
            self.image_alt.clone_from(image_alt);
        }
        if let Some(meta_title) = &patch.meta_title {
            self.meta_title.clone_from(meta_title);
        }
        if let Some(meta_description) = &patch.meta_description {
            self.meta_description.clone_from(meta_description);
        }
    }

    /// Whether this post is visible in public listings.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Case-insensitive substring match against title, excerpt, content and category.
    ///
    /// An empty query matches every post.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        [&self.title, &self.excerpt, &self.content, &self.category]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Everything a caller supplies to create a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostDraft {
    /// Headline; the slug is derived from it.
    pub title: String,
    /// Short summary.
    pub excerpt: String,
    /// HTML body.
    pub content: String,
    /// Initial publication state.
    pub status: PostStatus,
    /// Author byline.
    pub author: String,
    /// Free-text category.
    pub category: String,
    /// Publication date; today when absent.
    pub publish_date: Option<NaiveDate>,
    /// Header image location.
    pub image_url: Option<String>,
    /// Header image alt text.
    pub image_alt: Option<String>,
    /// Title override for search engines.
    pub meta_title: Option<String>,
    /// Description for search engines.
    pub meta_description: Option<String>,
}

impl PostDraft {
    /// Start a draft with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the initial status.
    #[must_use]
    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the summary.
    #[must_use]
    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = excerpt.into();
        self
    }

    /// Set the author byline.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Reject drafts no store should accept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the title is blank.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("title must not be empty"));
        }
        Ok(())
    }
}

/// A partial edit. `None` leaves a field untouched.
///
/// Optional post fields use a nested option: `Some(None)` clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    /// New headline. Does not re-derive the slug.
    pub title: Option<String>,
    /// Explicit slug override.
    pub slug: Option<String>,
    /// New summary.
    pub excerpt: Option<String>,
    /// New body.
    pub content: Option<String>,
    /// New publication state.
    pub status: Option<PostStatus>,
    /// New author byline.
    pub author: Option<String>,
    /// New category.
    pub category: Option<String>,
    /// New publication date.
    pub publish_date: Option<NaiveDate>,
    /// New header image location.
    pub image_url: Option<Option<String>>,
    /// New header image alt text.
    pub image_alt: Option<Option<String>>,
    /// New search-engine title.
    pub meta_title: Option<Option<String>>,
    /// New search-engine description.
    pub meta_description: Option<Option<String>>,
}

impl PostPatch {
    /// A patch that only changes the status.
    #[must_use]
    pub fn status(status: PostStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Normalize an explicit slug override.
    ///
    /// The override is run through the slug transform so stored slugs stay
    /// URL-safe.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the override has no usable characters
    /// or the new title is blank.
    pub fn normalized(&self) -> Result<Self> {
        let mut patch = self.clone();
        if let Some(raw) = &self.slug {
            let slug = slug::slugify(raw);
            if slug.is_empty() {
                return Err(Error::validation(format!("slug '{raw}' has no usable characters")));
            }
            patch.slug = Some(slug);
        }
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(Error::validation("title must not be empty"));
            }
        }
        Ok(patch)
    }

    /// Names of the wire fields this patch sets, in camelCase.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.title.is_some() {
            names.push("title");
        }
        if self.slug.is_some() {
            names.push("slug");
        }
        if self.excerpt.is_some() {
            names.push("excerpt");
        }
        if self.content.is_some() {
            names.push("content");
        }
        if self.status.is_some() {
            names.push("status");
        }
        if self.author.is_some() {
            names.push("author");
        }
        if self.category.is_some() {
            names.push("category");
        }
        if self.publish_date.is_some() {
            names.push("publishDate");
        }
        if self.image_url.is_some() {
            names.push("imageUrl");
        }
        if self.image_alt.is_some() {
            names.push("imageAlt");
        }
        if self.meta_title.is_some() {
            names.push("metaTitle");
        }
        if self.meta_description.is_some() {
            names.push("metaDescription");
        }
        names
    }
}

/// Sort posts newest first.
pub fn sort_newest_first(posts: &mut [BlogPost]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> BlogPost {
        let draft = PostDraft::new("Understanding Probate")
            .with_excerpt("What happens after a death")
            .with_content("<p>Probate is the court process...</p>")
            .with_author("Jane Counsel")
            .with_category("Estate Planning");
        BlogPost::from_draft("p1".to_string(), &draft, Utc::now())
    }

    #[test]
    fn test_status_display_and_parse() {
        assert_eq!(PostStatus::Draft.to_string(), "draft");
        assert_eq!(PostStatus::Published.to_string(), "published");
        assert_eq!("published".parse::<PostStatus>().unwrap(), PostStatus::Published);
        assert!("archived".parse::<PostStatus>().is_err());
    }

    #[test]
    fn test_status_default_is_draft() {
        assert_eq!(PostStatus::default(), PostStatus::Draft);
    }

    #[test]
    fn test_from_draft() {
        let post = sample_post();
        assert_eq!(post.id, "p1");
        assert_eq!(post.slug, "understanding-probate");
        assert_eq!(post.views, 0);
        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.created_at, post.updated_at);
        assert_eq!(post.publish_date, post.created_at.date_naive());
    }

    #[test]
    fn test_from_draft_keeps_publish_date() {
        let mut draft = PostDraft::new("Dated");
        draft.publish_date = NaiveDate::from_ymd_opt(2023, 5, 1);
        let post = BlogPost::from_draft("p".to_string(), &draft, Utc::now());
        assert_eq!(post.publish_date, NaiveDate::from_ymd_opt(2023, 5, 1).unwrap());
    }

    #[test]
    fn test_apply_title_keeps_slug() {
        let mut post = sample_post();
        post.apply(&PostPatch {
            title: Some("Probate, Explained".to_string()),
            ..PostPatch::default()
        });
        assert_eq!(post.title, "Probate, Explained");
        assert_eq!(post.slug, "understanding-probate");
    }

    #[test]
    fn test_apply_preserves_untouched_fields() {
        let mut post = sample_post();
        post.apply(&PostPatch {
            excerpt: Some("new excerpt".to_string()),
            ..PostPatch::default()
        });
        post.apply(&PostPatch {
            category: Some("Probate".to_string()),
            ..PostPatch::default()
        });
        assert_eq!(post.excerpt, "new excerpt");
        assert_eq!(post.category, "Probate");
        assert_eq!(post.author, "Jane Counsel");
    }

    #[test]
    fn test_apply_clears_optional_fields() {
        let mut post = sample_post();
        post.image_url = Some("https://example.com/a.jpg".to_string());
        post.apply(&PostPatch {
            image_url: Some(None),
            ..PostPatch::default()
        });
        assert!(post.image_url.is_none());
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let post = sample_post();
        assert!(post.matches("PROBATE"));
        assert!(post.matches("estate planning"));
        assert!(post.matches(""));
        assert!(!post.matches("bankruptcy"));
    }

    #[test]
    fn test_draft_validate() {
        assert!(PostDraft::new("ok").validate().is_ok());
        assert!(PostDraft::new("   ").validate().is_err());
    }

    #[test]
    fn test_patch_normalized_slug() {
        let patch = PostPatch {
            slug: Some("My Custom Slug!".to_string()),
            ..PostPatch::default()
        };
        let normalized = patch.normalized().unwrap();
        assert_eq!(normalized.slug.as_deref(), Some("my-custom-slug"));

        let bad = PostPatch {
            slug: Some("???".to_string()),
            ..PostPatch::default()
        };
        assert!(bad.normalized().is_err());
    }

    #[test]
    fn test_patch_field_names() {
        let patch = PostPatch {
            status: Some(PostStatus::Published),
            meta_title: Some(None),
            ..PostPatch::default()
        };
        assert_eq!(patch.field_names(), vec!["status", "metaTitle"]);
        assert!(PostPatch::default().is_empty());
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_post_serialization_uses_camel_case() {
        let post = sample_post();
        let json = serde_json::to_value(&post).unwrap();
        assert!(json.get("publishDate").is_some());
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["status"], "draft");
        assert!(json.get("imageUrl").is_none());
    }

    #[test]
    fn test_sort_newest_first() {
        let older = sample_post();
        let mut newer = sample_post();
        newer.id = "p2".to_string();
        newer.created_at = older.created_at + chrono::Duration::seconds(5);
        let mut posts = vec![older, newer];
        sort_newest_first(&mut posts);
        assert_eq!(posts[0].id, "p2");
    }
}
