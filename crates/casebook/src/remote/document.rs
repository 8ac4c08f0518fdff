//! Wire types for the remote document collection.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::post::{BlogPost, PostPatch, PostStatus};

/// The post attributes stored in a document's `fields`.
///
/// Identity and timestamps live on the document itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostFields {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub status: PostStatus,
    pub author: String,
    pub category: String,
    pub publish_date: NaiveDate,
    pub views: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
}

impl PostFields {
    pub fn from_post(post: &BlogPost) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            excerpt: post.excerpt.clone(),
            content: post.content.clone(),
            status: post.status,
            author: post.author.clone(),
            category: post.category.clone(),
            publish_date: post.publish_date,
            views: post.views,
            image_url: post.image_url.clone(),
            image_alt: post.image_alt.clone(),
            meta_title: post.meta_title.clone(),
            meta_description: post.meta_description.clone(),
        }
    }
}

/// The `fields` object of a full upsert.
///
/// Carries everything except `views`: the counter only moves through view
/// increments, so a replayed upsert can never count a view twice. A new
/// document created this way reads back with `views` at 0.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFields<'a> {
    title: &'a str,
    slug: &'a str,
    excerpt: &'a str,
    content: &'a str,
    status: PostStatus,
    author: &'a str,
    category: &'a str,
    publish_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_alt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta_title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta_description: Option<&'a str>,
}

impl<'a> ContentFields<'a> {
    /// Update mask of a full upsert. Optional fields missing from the body
    /// are cleared on the server.
    pub const MASK: [&'static str; 12] = [
        "title",
        "slug",
        "excerpt",
        "content",
        "status",
        "author",
        "category",
        "publishDate",
        "imageUrl",
        "imageAlt",
        "metaTitle",
        "metaDescription",
    ];

    pub fn from_post(post: &'a BlogPost) -> Self {
        Self {
            title: &post.title,
            slug: &post.slug,
            excerpt: &post.excerpt,
            content: &post.content,
            status: post.status,
            author: &post.author,
            category: &post.category,
            publish_date: post.publish_date,
            image_url: post.image_url.as_deref(),
            image_alt: post.image_alt.as_deref(),
            meta_title: post.meta_title.as_deref(),
            meta_description: post.meta_description.as_deref(),
        }
    }
}

/// A document as returned by the collection API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub fields: PostFields,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl Document {
    pub fn into_post(self) -> BlogPost {
        let f = self.fields;
        BlogPost {
            id: self.id,
            title: f.title,
            slug: f.slug,
            excerpt: f.excerpt,
            content: f.content,
            status: f.status,
            author: f.author,
            category: f.category,
            publish_date: f.publish_date,
            created_at: self.create_time,
            updated_at: self.update_time,
            views: f.views,
            image_url: f.image_url,
            image_alt: f.image_alt,
            meta_title: f.meta_title,
            meta_description: f.meta_description,
        }
    }
}

/// Response body of list and query calls.
#[derive(Debug, Default, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub documents: Vec<Document>,
}

/// Request body of create and patch calls.
#[derive(Debug, Serialize)]
pub struct WriteRequest<T> {
    pub fields: T,
}

/// The `fields` object for a masked merge: only what the patch sets.
///
/// Cleared optional fields are sent as `null`.
pub fn patch_fields(patch: &PostPatch) -> Map<String, Value> {
    fn opt(value: Option<&String>) -> Value {
        value.map_or(Value::Null, |v| Value::String(v.clone()))
    }

    let mut fields = Map::new();
    if let Some(title) = &patch.title {
        fields.insert("title".into(), Value::String(title.clone()));
    }
    if let Some(slug) = &patch.slug {
        fields.insert("slug".into(), Value::String(slug.clone()));
    }
    if let Some(excerpt) = &patch.excerpt {
        fields.insert("excerpt".into(), Value::String(excerpt.clone()));
    }
    if let Some(content) = &patch.content {
        fields.insert("content".into(), Value::String(content.clone()));
    }
    if let Some(status) = patch.status {
        fields.insert("status".into(), Value::String(status.as_str().to_string()));
    }
    if let Some(author) = &patch.author {
        fields.insert("author".into(), Value::String(author.clone()));
    }
    if let Some(category) = &patch.category {
        fields.insert("category".into(), Value::String(category.clone()));
    }
    if let Some(date) = patch.publish_date {
        fields.insert(
            "publishDate".into(),
            Value::String(date.format("%Y-%m-%d").to_string()),
        );
    }
    if let Some(image_url) = &patch.image_url {
        fields.insert("imageUrl".into(), opt(image_url.as_ref()));
    }
    if let Some(image_alt) = &patch.image_alt {
        fields.insert("imageAlt".into(), opt(image_alt.as_ref()));
    }
    if let Some(meta_title) = &patch.meta_title {
        fields.insert("metaTitle".into(), opt(meta_title.as_ref()));
    }
    if let Some(meta_description) = &patch.meta_description {
        fields.insert("metaDescription".into(), opt(meta_description.as_ref()));
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_into_post() {
        let doc: Document = serde_json::from_value(serde_json::json!({
            "id": "abc123",
            "fields": {
                "title": "Remote Post",
                "slug": "remote-post",
                "status": "published",
                "publishDate": "2024-04-01",
                "views": 12,
                "imageUrl": "https://example.com/x.png"
            },
            "createTime": "2024-04-01T10:00:00Z",
            "updateTime": "2024-04-02T10:00:00Z"
        }))
        .unwrap();

        let post = doc.into_post();
        assert_eq!(post.id, "abc123");
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.views, 12);
        assert_eq!(post.excerpt, "");
        assert_eq!(post.image_url.as_deref(), Some("https://example.com/x.png"));
        assert!(post.updated_at > post.created_at);
    }

    #[test]
    fn test_document_list_missing_documents_key() {
        let list: DocumentList = serde_json::from_str("{}").unwrap();
        assert!(list.documents.is_empty());
    }

    #[test]
    fn test_patch_fields_only_set_fields() {
        let patch = PostPatch {
            status: Some(PostStatus::Published),
            image_alt: Some(None),
            ..PostPatch::default()
        };
        let fields = patch_fields(&patch);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["status"], "published");
        assert!(fields["imageAlt"].is_null());
    }

    #[test]
    fn test_patch_fields_keys_match_field_names() {
        let patch = PostPatch {
            title: Some("t".into()),
            publish_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            meta_description: Some(Some("d".into())),
            ..PostPatch::default()
        };
        let fields = patch_fields(&patch);
        let mut keys: Vec<_> = fields.keys().map(String::as_str).collect();
        let mut names = patch.field_names();
        keys.sort_unstable();
        names.sort_unstable();
        assert_eq!(keys, names);
    }

    #[test]
    fn test_post_fields_omit_empty_optionals() {
        let fields = PostFields::default();
        let json = serde_json::to_value(WriteRequest { fields }).unwrap();
        assert!(json["fields"].get("imageUrl").is_none());
        assert_eq!(json["fields"]["views"], 0);
    }

    #[test]
    fn test_content_fields_leave_out_views() {
        let doc: Document = serde_json::from_value(serde_json::json!({
            "id": "abc123",
            "fields": { "title": "Viewed", "slug": "viewed", "views": 9, "metaTitle": "M" },
            "createTime": "2024-04-01T10:00:00Z",
            "updateTime": "2024-04-01T10:00:00Z"
        }))
        .unwrap();
        let post = doc.into_post();

        let json = serde_json::to_value(ContentFields::from_post(&post)).unwrap();
        let fields = json.as_object().unwrap();
        assert!(fields.get("views").is_none());
        assert_eq!(fields["metaTitle"], "M");
        assert!(fields.get("imageUrl").is_none());
        assert!(fields
            .keys()
            .all(|key| ContentFields::MASK.contains(&key.as_str())));
    }
}
