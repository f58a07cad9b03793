//! Incremental "load more" pagination over the post listing

use serde::Serialize;

use super::post::PostSummary;
use crate::cms::{CmsError, ContentSource, SearchResponse};

/// Whether more pages can be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    HasMore,
    Exhausted,
}

/// Accumulated listing results plus the pointer to the next page.
///
/// `results` only ever grows, in fetch order. `next_page` is `None` exactly
/// when the CMS reported no further pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostPagination {
    pub next_page: Option<String>,
    pub results: Vec<PostSummary>,
}

impl PostPagination {
    pub fn new(results: Vec<PostSummary>, next_page: Option<String>) -> Self {
        Self { next_page, results }
    }

    /// Build a page from a raw search response
    pub fn from_response(resp: SearchResponse) -> Result<Self, CmsError> {
        let results = resp
            .results
            .into_iter()
            .map(PostSummary::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(results, resp.next_page))
    }

    pub fn state(&self) -> CursorState {
        if self.next_page.is_some() {
            CursorState::HasMore
        } else {
            CursorState::Exhausted
        }
    }

    pub fn has_more(&self) -> bool {
        self.state() == CursorState::HasMore
    }

    /// Append a freshly fetched page and adopt its next pointer
    pub fn append_page(&mut self, page: PostPagination) {
        self.results.extend(page.results);
        self.next_page = page.next_page;
    }

    /// Fetch the page at `next_page` and append it.
    ///
    /// Returns the number of appended posts. When exhausted nothing is
    /// fetched and `Ok(0)` is returned. On error the cursor is unchanged.
    pub async fn load_more<S>(&mut self, source: &S) -> Result<usize, CmsError>
    where
        S: ContentSource + ?Sized,
    {
        let Some(url) = self.next_page.as_deref() else {
            return Ok(0);
        };

        let page = PostPagination::from_response(source.fetch_page(url).await?)?;
        let added = page.results.len();
        tracing::debug!(added, has_more = page.next_page.is_some(), "Loaded more posts");

        self.append_page(page);
        Ok(added)
    }

    /// Keep loading until the CMS reports no further pages
    pub async fn load_all<S>(&mut self, source: &S) -> Result<(), CmsError>
    where
        S: ContentSource + ?Sized,
    {
        while self.has_more() {
            self.load_more(source).await?;
        }
        Ok(())
    }
}
