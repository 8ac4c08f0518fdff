//! Hybrid coordinator over the local and remote stores.
//!
//! Reads try the remote store first and fall back to the local store when the
//! remote answer is empty or fails. Writes keep both stores in step: a remote
//! write that cannot be completed is queued in the local outbox and replayed
//! by [`HybridStore::retry_pending`].
//!
//! Remote failures are logged, never returned. Only local failures reach the
//! caller.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{Config, SyncConfig};
use crate::error::{Error, Result};
use crate::post::{BlogPost, PostDraft, PostPatch, PostStatus};
use crate::remote::RemoteStore;
use crate::seed::sample_posts;
use crate::storage::{LocalStore, PendingSync, SyncOperation};
use crate::store::PostStore;

/// Outcome of one outbox replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Entries looked at.
    pub attempted: usize,
    /// Entries the remote store accepted.
    pub succeeded: usize,
    /// Entries whose post no longer exists locally.
    pub skipped: usize,
    /// Entries that failed and stay queued.
    pub failed: usize,
    /// Entries abandoned after too many attempts.
    pub dropped: usize,
}

/// Post store that composes a local store and an optional remote store.
pub struct HybridStore {
    local: Arc<LocalStore>,
    remote: Option<Arc<dyn PostStore>>,
    sync: SyncConfig,
}

impl fmt::Debug for HybridStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HybridStore")
            .field("local", &self.local.path())
            .field("remote", &self.remote.as_ref().map(|r| r.name()))
            .field("sync", &self.sync)
            .finish()
    }
}

impl HybridStore {
    /// Compose the given stores. `None` runs local-only.
    #[must_use]
    pub fn new(
        local: Arc<LocalStore>,
        remote: Option<Arc<dyn PostStore>>,
        sync: SyncConfig,
    ) -> Self {
        Self {
            local,
            remote,
            sync,
        }
    }

    /// Open the stores described by the configuration.
    ///
    /// Seeds a fresh local database with the sample posts when configured,
    /// and attaches the remote store only when `remote.enabled` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the local database cannot be opened or seeded, or
    /// the remote configuration is unusable.
    pub fn from_config(config: &Config) -> Result<Self> {
        let local = LocalStore::open(config.database_path())?;
        if config.local.seed_samples {
            let seeded = local.seed_samples()?;
            if seeded > 0 {
                info!("Seeded {} sample posts", seeded);
            }
        }

        let remote: Option<Arc<dyn PostStore>> = if config.remote.enabled {
            Some(Arc::new(RemoteStore::new(&config.remote)?))
        } else {
            debug!("Remote store disabled; running local-only");
            None
        };

        Ok(Self::new(Arc::new(local), remote, config.sync.clone()))
    }

    /// The local store.
    #[must_use]
    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// Whether a remote store is attached.
    #[must_use]
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Published posts for the public listing, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local store fails.
    pub async fn get_published_posts(&self) -> Result<Vec<BlogPost>> {
        self.get_by_status(PostStatus::Published).await
    }

    /// Number of remote writes waiting for replay.
    ///
    /// # Errors
    ///
    /// Returns an error if the local database fails.
    pub fn pending_sync_count(&self) -> Result<i64> {
        self.local.pending_sync_count()
    }

    /// Queued remote writes, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the local database fails.
    pub fn pending_syncs(&self) -> Result<Vec<PendingSync>> {
        self.local.pending_syncs()
    }

    /// Replay queued remote writes, oldest first.
    ///
    /// `Put` entries upload the local record as it is now, minus its view
    /// count, which only `IncrementViews` entries carry. An entry that keeps
    /// failing is dropped once it reaches `sync.max_attempts`.
    ///
    /// # Errors
    ///
    /// Returns an error if the local database fails. Remote failures are
    /// counted in the report.
    pub async fn retry_pending(&self) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        let Some(remote) = &self.remote else {
            debug!("No remote store attached; nothing to replay");
            return Ok(report);
        };

        for entry in self.local.pending_syncs()? {
            report.attempted += 1;

            let outcome = match entry.operation {
                SyncOperation::Put => match self.local.get_by_id(&entry.post_id).await? {
                    Some(post) => remote.put(&post).await.map(|_| ()),
                    None => {
                        debug!(
                            "Post {} is gone locally; discarding queued put",
                            entry.post_id
                        );
                        self.local.complete_sync(entry.seq)?;
                        report.skipped += 1;
                        continue;
                    }
                },
                SyncOperation::Delete => match remote.delete(&entry.post_id).await {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(Error::RemoteRequest {
                        operation: "delete",
                        message: "remote store reported the delete as failed".to_string(),
                    }),
                    Err(e) => Err(e),
                },
                SyncOperation::IncrementViews => remote.increment_views(&entry.post_id).await,
            };

            match outcome {
                Ok(()) => {
                    self.local.complete_sync(entry.seq)?;
                    report.succeeded += 1;
                }
                Err(e) => {
                    let attempts = self.local.record_sync_failure(entry.seq, &e.to_string())?;
                    if attempts >= self.sync.max_attempts {
                        warn!(
                            "Dropping queued {} for post {} after {} attempts: {}",
                            entry.operation, entry.post_id, attempts, e
                        );
                        self.local.complete_sync(entry.seq)?;
                        report.dropped += 1;
                    } else {
                        debug!(
                            "Replay of {} for post {} failed (attempt {}): {}",
                            entry.operation, entry.post_id, attempts, e
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        if report.attempted > 0 {
            info!(
                "Replayed outbox: {} succeeded, {} skipped, {} failed, {} dropped",
                report.succeeded, report.skipped, report.failed, report.dropped
            );
        }
        Ok(report)
    }

    /// Record a remote write for later replay. Never fails the caller.
    fn queue(&self, post_id: &str, operation: SyncOperation, error: &str) {
        if let Err(e) = self.local.enqueue_sync(post_id, operation, error) {
            warn!(
                "Could not queue {} for post {}: {}",
                operation, post_id, e
            );
        }
    }

    /// Copy a locally written record to the remote store.
    async fn mirror(&self, post: &BlogPost) {
        let Some(remote) = &self.remote else {
            return;
        };
        match remote.put(post).await {
            Ok(_) => debug!("Mirrored post {} to {}", post.id, remote.name()),
            Err(e) => {
                warn!("Mirroring post {} to {} failed: {}", post.id, remote.name(), e);
                self.queue(&post.id, SyncOperation::Put, &e.to_string());
            }
        }
    }

    fn or_samples(&self, posts: Vec<BlogPost>, keep: impl Fn(&BlogPost) -> bool) -> Vec<BlogPost> {
        if posts.is_empty() && self.sync.fallback_to_samples {
            debug!("Both stores are empty; serving sample posts");
            return sample_posts().into_iter().filter(keep).collect();
        }
        posts
    }
}

/// A remote list answer worth returning as is.
fn remote_list(store: &dyn PostStore, what: &str, result: Result<Vec<BlogPost>>) -> Option<Vec<BlogPost>> {
    match result {
        Ok(posts) if !posts.is_empty() => Some(posts),
        Ok(_) => {
            debug!("{} {} is empty; falling back to local", store.name(), what);
            None
        }
        Err(e) => {
            warn!("{} {} failed, falling back to local: {}", store.name(), what, e);
            None
        }
    }
}

/// A remote single-record answer worth returning as is.
fn remote_one(store: &dyn PostStore, what: &str, result: Result<Option<BlogPost>>) -> Option<BlogPost> {
    match result {
        Ok(Some(post)) => Some(post),
        Ok(None) => {
            debug!("{} has no {}; checking local", store.name(), what);
            None
        }
        Err(e) => {
            warn!("{} {} lookup failed, falling back to local: {}", store.name(), what, e);
            None
        }
    }
}

#[async_trait]
impl PostStore for HybridStore {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    async fn get_all(&self) -> Result<Vec<BlogPost>> {
        if let Some(remote) = &self.remote {
            if let Some(posts) = remote_list(remote.as_ref(), "listing", remote.get_all().await) {
                return Ok(posts);
            }
        }
        let posts = self.local.get_all().await?;
        Ok(self.or_samples(posts, |_| true))
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<BlogPost>> {
        if let Some(remote) = &self.remote {
            if let Some(post) = remote_one(remote.as_ref(), "post by id", remote.get_by_id(id).await)
            {
                return Ok(Some(post));
            }
        }
        self.local.get_by_id(id).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        if let Some(remote) = &self.remote {
            if let Some(post) =
                remote_one(remote.as_ref(), "post by slug", remote.get_by_slug(slug).await)
            {
                return Ok(Some(post));
            }
        }
        self.local.get_by_slug(slug).await
    }

    async fn get_by_status(&self, status: PostStatus) -> Result<Vec<BlogPost>> {
        if let Some(remote) = &self.remote {
            let result = remote.get_by_status(status).await;
            if let Some(posts) = remote_list(remote.as_ref(), "status listing", result) {
                return Ok(posts);
            }
        }
        let posts = self.local.get_by_status(status).await?;
        Ok(self.or_samples(posts, |p| p.status == status))
    }

    async fn search(&self, query: &str) -> Result<Vec<BlogPost>> {
        if let Some(remote) = &self.remote {
            if let Some(posts) = remote_list(remote.as_ref(), "search", remote.search(query).await)
            {
                return Ok(posts);
            }
        }
        let posts = self.local.search(query).await?;
        Ok(self.or_samples(posts, |p| p.matches(query)))
    }

    async fn save(&self, draft: &PostDraft) -> Result<BlogPost> {
        let post = self.local.save(draft).await?;
        self.mirror(&post).await;
        Ok(post)
    }

    async fn put(&self, post: &BlogPost) -> Result<BlogPost> {
        let stored = self.local.put(post).await?;
        self.mirror(&stored).await;
        Ok(stored)
    }

    async fn update(&self, id: &str, patch: &PostPatch) -> Result<Option<BlogPost>> {
        let mut remote_error = None;

        if let Some(remote) = &self.remote {
            match remote.update(id, patch).await {
                Ok(Some(post)) => {
                    // Queued increments can leave the remote counter behind
                    // the local one; the local upsert keeps the higher count.
                    return match self.local.put(&post).await {
                        Ok(stored) => Ok(Some(stored)),
                        Err(e) => {
                            warn!("Could not refresh local copy of post {}: {}", id, e);
                            Ok(Some(post))
                        }
                    };
                }
                Ok(None) => debug!("{} has no post {}; updating locally", remote.name(), id),
                Err(e) => {
                    warn!("{} update of post {} failed: {}", remote.name(), id, e);
                    remote_error = Some(e.to_string());
                }
            }
        }

        let updated = self.local.update(id, patch).await?;
        if let (Some(post), Some(error)) = (&updated, &remote_error) {
            self.queue(&post.id, SyncOperation::Put, error);
        }
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        // The remote store reports an absent document as deleted.
        if self.remote.is_some() && self.get_by_id(id).await?.is_none() {
            debug!("Delete skipped, post {} not found in either store", id);
            return Ok(false);
        }

        if let Some(remote) = &self.remote {
            let remote_deleted = remote.delete(id).await.unwrap_or_else(|e| {
                warn!("{} delete of post {} failed: {}", remote.name(), id, e);
                false
            });
            if remote_deleted {
                if let Err(e) = self.local.delete(id).await {
                    warn!("Local delete of post {} failed: {}", id, e);
                }
                return Ok(true);
            }
        }

        let removed = self.local.delete(id).await?;
        if removed && self.remote.is_some() {
            self.queue(id, SyncOperation::Delete, "remote delete failed");
        }
        Ok(removed)
    }

    async fn increment_views(&self, id: &str) -> Result<()> {
        self.local.increment_views(id).await?;

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.increment_views(id).await {
                warn!("{} view increment for post {} failed: {}", remote.name(), id, e);
                self.queue(id, SyncOperation::IncrementViews, &e.to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_only(fallback_to_samples: bool) -> HybridStore {
        let local = LocalStore::open_in_memory().unwrap();
        HybridStore::new(
            Arc::new(local),
            None,
            SyncConfig {
                fallback_to_samples,
                ..SyncConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_empty_listing_serves_samples() {
        let store = local_only(true);

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), sample_posts().len());

        let published = store.get_published_posts().await.unwrap();
        assert!(!published.is_empty());
        assert!(published.iter().all(BlogPost::is_published));
    }

    #[tokio::test]
    async fn test_samples_disabled() {
        let store = local_only(false);
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_reads_never_use_samples() {
        let store = local_only(true);
        let sample = &sample_posts()[0];

        assert!(store.get_by_id(&sample.id).await.unwrap().is_none());
        assert!(store.get_by_slug(&sample.slug).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_only_writes_do_not_queue() {
        let store = local_only(true);
        let post = store.save(&PostDraft::new("Wills 101")).await.unwrap();

        store.increment_views(&post.id).await.unwrap();
        assert!(store.delete(&post.id).await.unwrap());
        assert_eq!(store.pending_sync_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_retry_without_remote_is_noop() {
        let store = local_only(true);
        store
            .local()
            .enqueue_sync("x", SyncOperation::Put, "down")
            .unwrap();

        let report = store.retry_pending().await.unwrap();
        assert_eq!(report, SyncReport::default());
        assert_eq!(store.pending_sync_count().unwrap(), 1);
    }

    #[test]
    fn test_debug_names_backends() {
        let store = local_only(true);
        let debug = format!("{store:?}");
        assert!(debug.contains("HybridStore"));
        assert!(debug.contains("None"));
    }

    #[test]
    fn test_from_config_seeds_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.local.database_path = Some(dir.path().join("posts.db"));

        let store = HybridStore::from_config(&config).unwrap();
        assert!(!store.has_remote());
        assert_eq!(store.local().count().unwrap(), 3);
    }

    #[test]
    fn test_from_config_with_remote_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.local.database_path = Some(dir.path().join("posts.db"));
        config.local.seed_samples = false;
        config.remote.enabled = true;

        let store = HybridStore::from_config(&config).unwrap();
        assert!(store.has_remote());
        assert_eq!(store.local().count().unwrap(), 0);
    }
}
