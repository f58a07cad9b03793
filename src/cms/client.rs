//! Prismic REST API client

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::error::{CmsError, Result};
use super::types::{predicates_to_query, ApiInfo, Document, Predicate, QueryOptions, SearchResponse};
use super::ContentSource;
use crate::config::CmsConfig;

/// Stateless client for one Prismic repository.
///
/// The master ref is resolved on every query, so content published after the
/// client was created is picked up without restarting.
pub struct PrismicClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

impl PrismicClient {
    /// Create a client for `endpoint`, e.g. `https://repo.cdn.prismic.io/api/v2`
    pub fn new(endpoint: impl Into<String>, access_token: Option<String>) -> Result<Self> {
        let endpoint = endpoint.into().trim().trim_end_matches('/').to_string();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(CmsError::InvalidEndpoint(endpoint));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            access_token: access_token.filter(|t| !t.is_empty()),
        })
    }

    /// Create a client from the `cms` section of the site configuration
    pub fn from_config(config: &CmsConfig) -> Result<Self> {
        Self::new(config.endpoint.clone(), config.access_token.clone())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn search_url(&self) -> String {
        format!("{}/documents/search", self.endpoint)
    }

    fn token_params(&self) -> Vec<(&'static str, String)> {
        self.access_token
            .iter()
            .map(|t| ("access_token", t.clone()))
            .collect()
    }

    /// Query parameters for a document search against `reference`
    fn search_params(
        &self,
        reference: &str,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("ref", reference.to_string()),
            ("q", predicates_to_query(predicates)),
        ];
        if let Some(size) = options.page_size {
            params.push(("pageSize", size.to_string()));
        }
        if !options.fetch.is_empty() {
            params.push(("fetch", options.fetch.join(",")));
        }
        if !options.orderings.is_empty() {
            params.push(("orderings", format!("[{}]", options.orderings.join(","))));
        }
        params.extend(self.token_params());
        params
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&'static str, String)],
    ) -> Result<T> {
        let resp = self.client.get(url).query(params).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CmsError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Resolve the ref of the currently published content
    pub async fn master_ref(&self) -> Result<String> {
        let info: ApiInfo = self.get_json(&self.endpoint, &self.token_params()).await?;
        info.master_ref()
            .map(str::to_string)
            .ok_or(CmsError::MissingMasterRef)
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<SearchResponse> {
        let reference = self.master_ref().await?;
        let params = self.search_params(&reference, predicates, options);
        tracing::debug!(q = %predicates_to_query(predicates), "Querying CMS");

        let resp: SearchResponse = self.get_json(&self.search_url(), &params).await?;
        tracing::debug!(
            page = resp.page,
            results = resp.results.len(),
            has_next = resp.next_page.is_some(),
            "CMS query returned"
        );
        Ok(resp)
    }

    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Document> {
        let options = QueryOptions::default().page_size(1);
        let resp = self
            .query(&[Predicate::uid(doc_type, uid)], &options)
            .await?;

        resp.results
            .into_iter()
            .next()
            .ok_or_else(|| CmsError::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
    }

    async fn fetch_page(&self, url: &str) -> Result<SearchResponse> {
        tracing::debug!(url, "Fetching next CMS page");
        self.get_json(url, &[]).await
    }
}
