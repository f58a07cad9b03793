//! Content loader - fetches posts from the CMS

use super::{PostDetail, PostPagination};
use crate::cms::{CmsError, ContentSource, Predicate, QueryOptions};
use crate::config::CmsConfig;

/// Loads listing pages and posts through a [`ContentSource`]
pub struct ContentLoader<'a> {
    source: &'a dyn ContentSource,
    cms: &'a CmsConfig,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(source: &'a dyn ContentSource, cms: &'a CmsConfig) -> Self {
        Self { source, cms }
    }

    pub fn source(&self) -> &'a dyn ContentSource {
        self.source
    }

    /// Listing query: summary fields only, newest first
    fn listing_options(&self) -> QueryOptions {
        let doc_type = &self.cms.document_type;
        QueryOptions::default()
            .page_size(self.cms.page_size)
            .fetch(
                ["title", "subtitle", "author"]
                    .iter()
                    .map(|field| format!("{}.{}", doc_type, field)),
            )
            .order_by("document.first_publication_date desc")
    }

    /// Load the first listing page
    pub async fn load_first_page(&self) -> Result<PostPagination, CmsError> {
        let resp = self
            .source
            .query(
                &[Predicate::document_type(&self.cms.document_type)],
                &self.listing_options(),
            )
            .await?;

        let page = PostPagination::from_response(resp)?;
        tracing::debug!(
            posts = page.results.len(),
            has_more = page.has_more(),
            "Loaded first listing page"
        );
        Ok(page)
    }

    /// Load one post by uid
    pub async fn load_post(&self, uid: &str) -> Result<PostDetail, CmsError> {
        let doc = self
            .source
            .get_by_uid(&self.cms.document_type, uid)
            .await?;
        PostDetail::try_from(doc)
    }
}
