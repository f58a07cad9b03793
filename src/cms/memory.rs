//! In-memory [`ContentSource`] used by tests

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::error::{CmsError, Result};
use super::types::{Document, Predicate, QueryOptions, SearchResponse};
use super::ContentSource;

pub(crate) struct MemorySource {
    pages: Vec<SearchResponse>,
    documents: Vec<Document>,
    fetched: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl MemorySource {
    /// Serve `documents` in pages of `page_size`, linked by `memory://` pointers
    pub fn paged(documents: Vec<Document>, page_size: usize) -> Self {
        let chunks: Vec<Vec<Document>> = documents
            .chunks(page_size.max(1))
            .map(|c| c.to_vec())
            .collect();
        let total_pages = chunks.len().max(1);

        let mut pages: Vec<SearchResponse> = chunks
            .into_iter()
            .enumerate()
            .map(|(i, results)| SearchResponse {
                page: i as u32 + 1,
                total_pages: total_pages as u32,
                next_page: (i + 1 < total_pages).then(|| page_url(i + 2)),
                results,
                ..Default::default()
            })
            .collect();
        if pages.is_empty() {
            pages.push(SearchResponse {
                page: 1,
                total_pages: 1,
                ..Default::default()
            });
        }

        Self {
            pages,
            documents,
            fetched: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Every pointer passed to `fetch_page`, in call order
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_failing(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CmsError::Network("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn query(&self, _predicates: &[Predicate], _options: &QueryOptions) -> Result<SearchResponse> {
        self.check_failing()?;
        Ok(self.pages[0].clone())
    }

    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Document> {
        self.check_failing()?;
        self.documents
            .iter()
            .find(|d| d.doc_type == doc_type && d.uid.as_deref() == Some(uid))
            .cloned()
            .ok_or_else(|| CmsError::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
    }

    async fn fetch_page(&self, url: &str) -> Result<SearchResponse> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.check_failing()?;
        url.strip_prefix("memory://posts?page=")
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| self.pages.get(n.wrapping_sub(1)))
            .cloned()
            .ok_or_else(|| CmsError::Api {
                status: 404,
                message: format!("no page at {}", url),
            })
    }
}

pub(crate) fn page_url(page: usize) -> String {
    format!("memory://posts?page={}", page)
}

/// A `posts` document whose single content block carries `words` body words
pub(crate) fn post_document(uid: &str, title: &str, words: usize) -> Document {
    let body = vec!["palavra"; words].join(" ");
    serde_json::from_value(json!({
        "id": format!("id-{}", uid),
        "uid": uid,
        "type": "posts",
        "first_publication_date": "2021-03-15T19:25:28+0000",
        "data": {
            "title": title,
            "subtitle": format!("Subtitle of {}", title),
            "author": "Joseph Oliveira",
            "banner": {"url": format!("https://images.prismic.io/{}.png", uid)},
            "content": [{
                "heading": "Intro",
                "body": [{"type": "paragraph", "text": body, "spans": []}]
            }]
        }
    }))
    .unwrap()
}
