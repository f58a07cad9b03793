//! spacetraveling: a blog front-end for a headless CMS
//!
//! Posts live in a Prismic repository. This crate fetches them, renders the
//! post listing (with incremental "load more" pagination) and individual post
//! pages with an estimated reading time, either ahead of time into static
//! files or on demand from a small HTTP server.

pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod server;
pub mod templates;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use cms::{ContentSource, PrismicClient};
use i18n::I18n;
use templates::PageRenderer;

/// The main application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Public (output) directory
    pub public_dir: std::path::PathBuf,
    /// Static assets copied or served as-is
    pub static_dir: std::path::PathBuf,
}

impl Blog {
    /// Create a new instance from a directory, reading `_config.yml` if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config_path = base_dir.as_ref().join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No _config.yml in {:?}, using defaults", base_dir.as_ref());
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a new instance with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);

        Self {
            config,
            base_dir,
            public_dir,
            static_dir,
        }
    }

    /// Build the CMS client described by the configuration
    pub fn content_source(&self) -> Result<Arc<dyn ContentSource>> {
        if self.config.cms.endpoint.is_empty() {
            anyhow::bail!(
                "No CMS endpoint configured. Set cms.endpoint in _config.yml or {}",
                config::ENDPOINT_ENV
            );
        }
        let client = PrismicClient::from_config(&self.config.cms)
            .context("Failed to create CMS client")?;
        Ok(Arc::new(client))
    }

    /// Translations for the configured language, with site overrides
    pub fn i18n(&self) -> Result<I18n> {
        let mut i18n = I18n::new(&self.config.language);
        i18n.load_languages(self.base_dir.join(&self.config.i18n_dir))?;
        Ok(i18n)
    }

    /// Page renderer for this site
    pub fn renderer(&self) -> Result<PageRenderer> {
        PageRenderer::new(self.config.clone(), self.i18n()?)
    }

    /// Generate the static site
    pub async fn generate(&self, source: &dyn ContentSource) -> Result<()> {
        commands::generate::run(self, source).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.public_dir, dir.path().join("public"));
        assert_eq!(blog.static_dir, dir.path().join("static"));
        assert!(blog.content_source().is_err());
    }

    #[test]
    fn test_new_reads_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("_config.yml"),
            "public_dir: dist\ncms:\n  endpoint: https://blog.cdn.prismic.io/api/v2\n",
        )
        .unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.public_dir, dir.path().join("dist"));
        assert!(blog.content_source().is_ok());
    }
}
