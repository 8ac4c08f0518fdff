//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use casebook::config::SyncConfig;
use casebook::post::sort_newest_first;
use casebook::slug::{slugify_or_fallback, unique_slug};
use casebook::{
    BlogPost, Error, HybridStore, LocalStore, PostDraft, PostPatch, PostStore, Result,
};

/// In-memory stand-in for the remote document store.
///
/// Can be switched into a failing mode where every call errors, except
/// `delete`, which reports `false` the way the real adapter does.
#[derive(Debug, Default)]
pub struct FakeRemote {
    posts: Mutex<Vec<BlogPost>>,
    failing: AtomicBool,
    calls: AtomicUsize,
    next_id: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let remote = Self::new();
        remote.set_failing(true);
        remote
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn insert(&self, post: BlogPost) {
        self.posts.lock().unwrap().push(post);
    }

    pub fn posts(&self) -> Vec<BlogPost> {
        self.posts.lock().unwrap().clone()
    }

    pub fn find(&self, id: &str) -> Option<BlogPost> {
        self.posts().into_iter().find(|p| p.id == id)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::RemoteRequest {
                operation,
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PostStore for FakeRemote {
    fn name(&self) -> &'static str {
        "fake-remote"
    }

    async fn get_all(&self) -> Result<Vec<BlogPost>> {
        self.check("list")?;
        let mut posts = self.posts();
        sort_newest_first(&mut posts);
        Ok(posts)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<BlogPost>> {
        self.check("get")?;
        Ok(self.find(id))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        self.check("query")?;
        Ok(self.posts().into_iter().find(|p| p.slug == slug))
    }

    async fn save(&self, draft: &PostDraft) -> Result<BlogPost> {
        self.check("create")?;
        draft.validate()?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut post = BlogPost::from_draft(format!("remote-{n}"), draft, Utc::now());
        let mut posts = self.posts.lock().unwrap();
        post.slug = unique_slug(&slugify_or_fallback(&draft.title), |s| {
            posts.iter().any(|p| p.slug == s)
        });
        posts.push(post.clone());
        Ok(post)
    }

    async fn put(&self, post: &BlogPost) -> Result<BlogPost> {
        self.check("put")?;
        let mut posts = self.posts.lock().unwrap();
        // Like the real adapter, an upsert never carries the view count.
        let views = posts.iter().find(|p| p.id == post.id).map_or(0, |p| p.views);
        posts.retain(|p| p.id != post.id);
        let mut stored = post.clone();
        stored.views = views;
        posts.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: &str, patch: &PostPatch) -> Result<Option<BlogPost>> {
        self.check("update")?;
        let patch = patch.normalized()?;
        let mut posts = self.posts.lock().unwrap();
        let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.apply(&patch);
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        if self.check("delete").is_err() {
            return Ok(false);
        }
        self.posts.lock().unwrap().retain(|p| p.id != id);
        Ok(true)
    }

    async fn increment_views(&self, id: &str) -> Result<()> {
        self.check("increment_views")?;
        if let Some(post) = self.posts.lock().unwrap().iter_mut().find(|p| p.id == id) {
            post.views += 1;
        }
        Ok(())
    }
}

/// A hybrid store over a fresh in-memory local store and the given remote.
pub fn hybrid(remote: Option<Arc<FakeRemote>>) -> (HybridStore, Arc<LocalStore>) {
    hybrid_with(remote, SyncConfig::default())
}

pub fn hybrid_with(
    remote: Option<Arc<FakeRemote>>,
    sync: SyncConfig,
) -> (HybridStore, Arc<LocalStore>) {
    let local = Arc::new(LocalStore::open_in_memory().expect("in-memory store"));
    let remote = remote.map(|r| r as Arc<dyn PostStore>);
    (HybridStore::new(Arc::clone(&local), remote, sync), local)
}

pub fn draft(title: &str) -> PostDraft {
    PostDraft::new(title)
        .with_excerpt("A short summary")
        .with_content("<p>Body text</p>")
        .with_author("The Firm")
        .with_category("Estate Planning")
}
