//! Headless CMS access
//!
//! [`ContentSource`] is the paged-fetch capability the rest of the crate
//! depends on; [`PrismicClient`] implements it over HTTP.

mod client;
mod error;
#[cfg(test)]
pub(crate) mod memory;
pub mod types;

use async_trait::async_trait;

pub use client::PrismicClient;
pub use error::{CmsError, Result};
pub use types::{Document, Predicate, QueryOptions, SearchResponse};

/// Read-only, paged access to CMS documents
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Search documents matching every predicate
    async fn query(&self, predicates: &[Predicate], options: &QueryOptions)
        -> Result<SearchResponse>;

    /// Fetch a single document by custom type and uid
    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Document>;

    /// Follow a `next_page` pointer returned by an earlier search
    async fn fetch_page(&self, url: &str) -> Result<SearchResponse>;
}
