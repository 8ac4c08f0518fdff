//! The post store capability shared by every backend.

use async_trait::async_trait;

use crate::error::Result;
use crate::post::{BlogPost, PostDraft, PostPatch, PostStatus};

/// Create/read/update/delete against one physical backend.
///
/// Not-found is data (`None` / `false`), never an error. Errors mean the
/// backend itself failed.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// All posts, newest first.
    async fn get_all(&self) -> Result<Vec<BlogPost>>;

    /// Look a post up by id.
    async fn get_by_id(&self, id: &str) -> Result<Option<BlogPost>>;

    /// Look a post up by slug.
    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>>;

    /// Posts with the given status, newest first.
    async fn get_by_status(&self, status: PostStatus) -> Result<Vec<BlogPost>> {
        let mut posts = self.get_all().await?;
        posts.retain(|p| p.status == status);
        Ok(posts)
    }

    /// Posts whose title, excerpt, content or category contain `query`.
    async fn search(&self, query: &str) -> Result<Vec<BlogPost>> {
        let mut posts = self.get_all().await?;
        posts.retain(|p| p.matches(query));
        Ok(posts)
    }

    /// Create a post from a draft, assigning id, slug and timestamps.
    async fn save(&self, draft: &PostDraft) -> Result<BlogPost>;

    /// Store a complete record under its own id, inserting or replacing.
    ///
    /// An existing view counter never goes down: only
    /// [`increment_views`](Self::increment_views) moves it forward. Returns
    /// the record as stored.
    async fn put(&self, post: &BlogPost) -> Result<BlogPost>;

    /// Merge a patch into an existing post. `None` when the id is unknown.
    async fn update(&self, id: &str, patch: &PostPatch) -> Result<Option<BlogPost>>;

    /// Remove a post. Returns whether anything was removed.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Add one to a post's view counter. No-op when the id is unknown.
    async fn increment_views(&self, id: &str) -> Result<()>;
}
