//! Remote document-store adapter.
//!
//! Talks to a JSON document collection over HTTP. Each post is one document
//! whose `fields` hold the post attributes; the server assigns document ids
//! and the `createTime`/`updateTime` stamps that become `created_at` and
//! `updated_at`.
//!
//! Without a configured base URL the store still constructs, but every call
//! fails with [`Error::RemoteUnavailable`] so callers can fall back.

mod document;

use std::fmt;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::post::{sort_newest_first, BlogPost, PostDraft, PostPatch, PostStatus};
use crate::slug::slugify_or_fallback;
use crate::store::PostStore;

use document::{patch_fields, ContentFields, Document, DocumentList, PostFields, WriteRequest};

/// Post store backed by a remote document collection.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    endpoint: Option<Endpoint>,
    increment_retries: u32,
}

#[derive(Clone)]
struct Endpoint {
    client: Client,
    documents: Url,
    api_key: Option<String>,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("documents", &self.documents.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl RemoteStore {
    /// Build a store from the remote section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client
    /// cannot be built.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let Some(base_url) = config.base_url.as_deref() else {
            info!("No remote base URL configured; remote store is uninitialized");
            return Ok(Self {
                endpoint: None,
                increment_retries: config.increment_retries,
            });
        };

        let raw = format!(
            "{}/collections/{}/documents",
            base_url.trim_end_matches('/'),
            config.collection
        );
        let documents = Url::parse(&raw).map_err(|e| Error::ConfigValidation {
            message: format!("remote.base_url '{base_url}' is not a valid URL: {e}"),
        })?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::remote_request("connect", &e))?;

        debug!("Remote store targets {}", documents);
        Ok(Self {
            endpoint: Some(Endpoint {
                client,
                documents,
                api_key: config.api_key.clone(),
            }),
            increment_retries: config.increment_retries,
        })
    }

    /// Whether a base URL was configured.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.endpoint.is_some()
    }

    fn endpoint(&self) -> Result<&Endpoint> {
        self.endpoint.as_ref().ok_or(Error::RemoteUnavailable)
    }

    async fn try_delete(&self, id: &str) -> Result<()> {
        let ep = self.endpoint()?;
        let response = send("delete", ep.request(Method::DELETE, ep.document_url(id)?)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Remote post {} was already gone", id);
            return Ok(());
        }
        check("delete", response).await?;
        Ok(())
    }
}

impl Endpoint {
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn document_url(&self, id: &str) -> Result<Url> {
        let mut url = self.documents.clone();
        url.path_segments_mut()
            .map_err(|()| Error::internal("remote base URL cannot hold a path"))?
            .push(id);
        Ok(url)
    }

    async fn list(&self, operation: &'static str, query: &[(&str, &str)]) -> Result<Vec<BlogPost>> {
        let request = self
            .request(Method::GET, self.documents.clone())
            .query(query);
        let response = check(operation, send(operation, request).await?).await?;
        let list: DocumentList = decode(operation, response).await?;

        let mut posts: Vec<BlogPost> = list
            .documents
            .into_iter()
            .map(Document::into_post)
            .collect();
        sort_newest_first(&mut posts);
        Ok(posts)
    }

    async fn fetch(&self, id: &str) -> Result<Option<Document>> {
        let response = send("get", self.request(Method::GET, self.document_url(id)?)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document = decode("get", check("get", response).await?).await?;
        Ok(Some(document))
    }

    /// Id of the document currently holding `slug`.
    async fn slug_owner(&self, slug: &str) -> Result<Option<String>> {
        let found = self
            .list("query", &[("field", "slug"), ("equals", slug), ("limit", "1")])
            .await?;
        Ok(found.into_iter().next().map(|post| post.id))
    }

    async fn ensure_slug_free(&self, slug: &str, id: &str) -> Result<()> {
        match self.slug_owner(slug).await? {
            Some(owner) if owner != id => Err(Error::SlugConflict {
                slug: slug.to_string(),
                existing_id: owner,
            }),
            _ => Ok(()),
        }
    }
}

async fn send(operation: &'static str, request: RequestBuilder) -> Result<Response> {
    request
        .send()
        .await
        .map_err(|e| Error::remote_request(operation, &e))
}

async fn check(operation: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::RemoteStatus {
        operation,
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(operation: &'static str, response: Response) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| Error::remote_decode(operation, e.to_string()))
}

#[async_trait]
impl PostStore for RemoteStore {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn get_all(&self) -> Result<Vec<BlogPost>> {
        self.endpoint()?
            .list("list", &[("orderBy", "createTime"), ("direction", "desc")])
            .await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<BlogPost>> {
        let document = self.endpoint()?.fetch(id).await?;
        Ok(document.map(Document::into_post))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        let found = self
            .endpoint()?
            .list("query", &[("field", "slug"), ("equals", slug), ("limit", "1")])
            .await?;
        Ok(found.into_iter().next())
    }

    async fn get_by_status(&self, status: PostStatus) -> Result<Vec<BlogPost>> {
        self.endpoint()?
            .list(
                "query",
                &[
                    ("field", "status"),
                    ("equals", status.as_str()),
                    ("orderBy", "createTime"),
                    ("direction", "desc"),
                ],
            )
            .await
    }

    async fn save(&self, draft: &PostDraft) -> Result<BlogPost> {
        draft.validate()?;
        let ep = self.endpoint()?;

        let base = slugify_or_fallback(&draft.title);
        let mut slug = base.clone();
        let mut suffix = 2u32;
        while ep.slug_owner(&slug).await?.is_some() {
            slug = format!("{base}-{suffix}");
            suffix += 1;
        }

        let mut fields = PostFields::from_post(&BlogPost::from_draft(String::new(), draft, Utc::now()));
        fields.slug = slug;

        let request = ep
            .request(Method::POST, ep.documents.clone())
            .json(&WriteRequest { fields });
        let response = check("create", send("create", request).await?).await?;
        let document: Document = decode("create", response).await?;

        info!("Created remote post {} ({})", document.id, document.fields.slug);
        Ok(document.into_post())
    }

    async fn put(&self, post: &BlogPost) -> Result<BlogPost> {
        let ep = self.endpoint()?;
        ep.ensure_slug_free(&post.slug, &post.id).await?;

        let mask: Vec<(&str, &str)> = ContentFields::MASK
            .iter()
            .map(|field| ("updateMask.fieldPaths", *field))
            .collect();
        let request = ep
            .request(Method::PATCH, ep.document_url(&post.id)?)
            .query(&mask)
            .json(&WriteRequest {
                fields: ContentFields::from_post(post),
            });
        let response = check("put", send("put", request).await?).await?;
        let document: Document = decode("put", response).await?;

        debug!("Stored remote post {}", document.id);
        Ok(document.into_post())
    }

    async fn update(&self, id: &str, patch: &PostPatch) -> Result<Option<BlogPost>> {
        let patch = patch.normalized()?;
        let ep = self.endpoint()?;

        if !patch.is_empty() {
            if let Some(slug) = &patch.slug {
                ep.ensure_slug_free(slug, id).await?;
            }

            let mut query: Vec<(&str, &str)> = patch
                .field_names()
                .into_iter()
                .map(|field| ("updateMask.fieldPaths", field))
                .collect();
            query.push(("currentDocument.exists", "true"));

            let request = ep
                .request(Method::PATCH, ep.document_url(id)?)
                .query(&query)
                .json(&WriteRequest {
                    fields: patch_fields(&patch),
                });
            let response = send("update", request).await?;
            if response.status() == StatusCode::NOT_FOUND {
                debug!("Remote update skipped, post {} not found", id);
                return Ok(None);
            }
            check("update", response).await?;
        }

        let document = ep.fetch(id).await?;
        Ok(document.map(Document::into_post))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        match self.try_delete(id).await {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("Remote delete of post {} failed: {}", id, e);
                Ok(false)
            }
        }
    }

    async fn increment_views(&self, id: &str) -> Result<()> {
        let ep = self.endpoint()?;

        for attempt in 1..=self.increment_retries {
            let Some(document) = ep.fetch(id).await? else {
                debug!("View increment skipped, remote post {} not found", id);
                return Ok(());
            };

            let stamp = document
                .update_time
                .to_rfc3339_opts(SecondsFormat::AutoSi, true);
            let body = WriteRequest {
                fields: json!({ "views": document.fields.views.saturating_add(1) }),
            };
            let request = ep
                .request(Method::PATCH, ep.document_url(id)?)
                .query(&[
                    ("updateMask.fieldPaths", "views"),
                    ("currentDocument.updateTime", stamp.as_str()),
                ])
                .json(&body);
            let response = send("increment_views", request).await?;

            match response.status() {
                StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
                    debug!(
                        "View increment on {} lost a race (attempt {}/{})",
                        id, attempt, self.increment_retries
                    );
                }
                StatusCode::NOT_FOUND => return Ok(()),
                _ => {
                    check("increment_views", response).await?;
                    return Ok(());
                }
            }
        }

        Err(Error::RemoteConflict {
            id: id.to_string(),
            attempts: self.increment_retries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: Option<&str>) -> RemoteConfig {
        RemoteConfig {
            enabled: true,
            base_url: base_url.map(String::from),
            ..RemoteConfig::default()
        }
    }

    #[test]
    fn test_uninitialized_without_base_url() {
        let store = RemoteStore::new(&config(None)).unwrap();
        assert!(!store.is_initialized());
        assert_eq!(store.name(), "remote");
    }

    #[tokio::test]
    async fn test_uninitialized_calls_fail() {
        let store = RemoteStore::new(&config(None)).unwrap();

        assert!(matches!(
            store.get_all().await,
            Err(Error::RemoteUnavailable)
        ));
        assert!(matches!(
            store.get_by_id("x").await,
            Err(Error::RemoteUnavailable)
        ));
        assert!(matches!(
            store.save(&PostDraft::new("Title")).await,
            Err(Error::RemoteUnavailable)
        ));
        assert!(matches!(
            store.increment_views("x").await,
            Err(Error::RemoteUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_uninitialized_delete_reports_false() {
        let store = RemoteStore::new(&config(None)).unwrap();
        assert!(!store.delete("x").await.unwrap());
    }

    #[test]
    fn test_document_url_escapes_id() {
        let store = RemoteStore::new(&config(Some("https://docs.example.com/v1/"))).unwrap();
        let ep = store.endpoint().unwrap();

        assert_eq!(
            ep.documents.as_str(),
            "https://docs.example.com/v1/collections/posts/documents"
        );
        let url = ep.document_url("a b/c").unwrap();
        assert_eq!(
            url.as_str(),
            "https://docs.example.com/v1/collections/posts/documents/a%20b%2Fc"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = RemoteStore::new(&config(Some("not a url"))).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let mut cfg = config(Some("https://docs.example.com"));
        cfg.api_key = Some("secret-token".into());
        let store = RemoteStore::new(&cfg).unwrap();

        let debug = format!("{store:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("redacted"));
    }
}
