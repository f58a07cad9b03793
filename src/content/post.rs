//! Post models projected from CMS documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::reading_time;
use super::richtext::RichText;
use crate::cms::types::null_as_default;
use crate::cms::{CmsError, Document};

/// A post as shown in the listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A post with its full content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    /// Empty when the post has no banner
    pub banner_url: String,
    pub content: Vec<ContentBlock>,
}

/// One section of a post: a heading followed by rich text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default, deserialize_with = "null_as_default")]
    pub heading: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: RichText,
}

/// The `data` fields of a `posts` document
#[derive(Debug, Default, Deserialize)]
struct PostFields {
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    subtitle: String,
    #[serde(default, deserialize_with = "null_as_default")]
    author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    banner: Banner,
    #[serde(default, deserialize_with = "null_as_default")]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct Banner {
    #[serde(default)]
    url: Option<String>,
}

fn post_fields(doc: &Document) -> Result<PostFields, CmsError> {
    if doc.data.is_null() {
        return Ok(PostFields::default());
    }
    PostFields::deserialize(&doc.data).map_err(|e| {
        CmsError::Parse(format!(
            "document {} ({}): {}",
            doc.id,
            doc.uid.as_deref().unwrap_or("no uid"),
            e
        ))
    })
}

impl TryFrom<Document> for PostSummary {
    type Error = CmsError;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        let fields = post_fields(&doc)?;
        Ok(Self {
            uid: doc.uid.unwrap_or_default(),
            first_publication_date: doc.first_publication_date,
            title: fields.title,
            subtitle: fields.subtitle,
            author: fields.author,
        })
    }
}

impl TryFrom<Document> for PostDetail {
    type Error = CmsError;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        let fields = post_fields(&doc)?;
        Ok(Self {
            uid: doc.uid.unwrap_or_default(),
            first_publication_date: doc.first_publication_date,
            title: fields.title,
            subtitle: fields.subtitle,
            author: fields.author,
            banner_url: fields.banner.url.unwrap_or_default(),
            content: fields.content,
        })
    }
}

impl PostDetail {
    /// Estimated reading time in minutes
    pub fn reading_time(&self) -> usize {
        reading_time::estimate_minutes(&self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: serde_json::Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_summary_from_document() {
        let doc = document(json!({
            "id": "YE9n",
            "uid": "como-utilizar-hooks",
            "type": "posts",
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "data": {
                "title": "Como utilizar Hooks",
                "subtitle": "Pensando em sincronização em vez de ciclos de vida",
                "author": "Joseph Oliveira"
            }
        }));

        let summary = PostSummary::try_from(doc).unwrap();
        assert_eq!(summary.uid, "como-utilizar-hooks");
        assert_eq!(summary.title, "Como utilizar Hooks");
        assert_eq!(summary.author, "Joseph Oliveira");
        assert!(summary.first_publication_date.is_some());
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let doc = document(json!({
            "id": "YE9n",
            "uid": "draft",
            "type": "posts",
            "first_publication_date": null,
            "data": {"title": null, "banner": {}, "content": null}
        }));

        let detail = PostDetail::try_from(doc).unwrap();
        assert_eq!(detail.title, "");
        assert_eq!(detail.banner_url, "");
        assert!(detail.content.is_empty());
        assert!(detail.first_publication_date.is_none());
        assert_eq!(detail.reading_time(), 0);
    }

    #[test]
    fn test_detail_keeps_block_order() {
        let doc = document(json!({
            "id": "YE9n",
            "uid": "hooks",
            "type": "posts",
            "data": {
                "title": "Hooks",
                "banner": {"url": "https://images.prismic.io/banner.png"},
                "content": [
                    {"heading": "Primeiro", "body": []},
                    {"heading": "Segundo", "body": [{"type": "paragraph", "text": "x", "spans": []}]},
                    {"heading": "Terceiro", "body": []}
                ]
            }
        }));

        let detail = PostDetail::try_from(doc).unwrap();
        let headings: Vec<_> = detail.content.iter().map(|b| b.heading.as_str()).collect();
        assert_eq!(headings, ["Primeiro", "Segundo", "Terceiro"]);
        assert_eq!(detail.banner_url, "https://images.prismic.io/banner.png");
        assert_eq!(detail.title, "Hooks");
    }

    #[test]
    fn test_malformed_data_is_a_parse_error() {
        let doc = document(json!({
            "id": "YE9n",
            "uid": "broken",
            "type": "posts",
            "data": {"content": "not a list"}
        }));

        let err = PostDetail::try_from(doc).unwrap_err();
        assert!(matches!(err, CmsError::Parse(_)));
    }
}
