//! Generator module - renders the whole site into static HTML files

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::cms::ContentSource;
use crate::content::{ContentLoader, PostPagination};
use crate::templates::{PageRenderer, STYLESHEET};
use crate::Blog;

/// Static site generator
pub struct Generator {
    blog: Blog,
    renderer: PageRenderer,
}

/// What a generation run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateSummary {
    pub posts: usize,
    pub skipped: usize,
    pub assets: usize,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            renderer: blog.renderer()?,
        })
    }

    /// Generate the entire site. Any CMS failure aborts the run.
    pub async fn generate(&self, source: &dyn ContentSource) -> Result<GenerateSummary> {
        let public_dir = &self.blog.public_dir;
        fs::create_dir_all(public_dir)
            .with_context(|| format!("Failed to create {:?}", public_dir))?;

        let mut summary = GenerateSummary {
            assets: self.copy_static_assets()?,
            ..Default::default()
        };
        write_file(&public_dir.join("style.css"), STYLESHEET)?;

        let loader = ContentLoader::new(source, &self.blog.config.cms);

        let first_page = loader
            .load_first_page()
            .await
            .context("Failed to fetch the post listing")?;
        self.generate_index_page(&first_page)?;

        // Every post route comes from walking the listing to its end
        let mut cursor = first_page;
        cursor
            .load_all(source)
            .await
            .context("Failed to enumerate posts")?;
        tracing::info!("Found {} posts", cursor.results.len());

        let mut seen = HashSet::new();
        for post in &cursor.results {
            if !is_safe_uid(&post.uid) {
                tracing::warn!(uid = %post.uid, title = %post.title, "Skipping post without a usable uid");
                summary.skipped += 1;
                continue;
            }
            if !seen.insert(post.uid.as_str()) {
                continue;
            }

            let detail = loader
                .load_post(&post.uid)
                .await
                .with_context(|| format!("Failed to fetch post {:?}", post.uid))?;
            self.generate_post_page(&detail)?;
            summary.posts += 1;
        }

        self.generate_not_found_page()?;

        Ok(summary)
    }

    /// Generate `index.html` from the first listing page
    fn generate_index_page(&self, listing: &PostPagination) -> Result<()> {
        let html = self.renderer.render_index(listing)?;
        let output_path = self.blog.public_dir.join("index.html");
        write_file(&output_path, &html)?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }

    /// Generate `post/{uid}/index.html`
    fn generate_post_page(&self, post: &crate::content::PostDetail) -> Result<()> {
        let html = self.renderer.render_post(post)?;
        let output_path = self.post_output_path(&post.uid);
        write_file(&output_path, &html)?;
        tracing::debug!("Generated post: {:?}", output_path);
        Ok(())
    }

    fn generate_not_found_page(&self) -> Result<()> {
        let html = self.renderer.render_not_found()?;
        write_file(&self.blog.public_dir.join("404.html"), &html)
    }

    fn post_output_path(&self, uid: &str) -> PathBuf {
        self.blog
            .public_dir
            .join("post")
            .join(uid)
            .join("index.html")
    }

    /// Copy static assets (images, fonts, etc.) to the public directory
    fn copy_static_assets(&self) -> Result<usize> {
        let static_dir = &self.blog.static_dir;
        if !static_dir.exists() {
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = self.blog.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)
                .with_context(|| format!("Failed to copy {:?} to {:?}", path, dest))?;
            copied += 1;
        }

        Ok(copied)
    }
}

/// A uid must map to exactly one directory below `post/`
fn is_safe_uid(uid: &str) -> bool {
    !uid.is_empty()
        && uid != "."
        && uid != ".."
        && !uid.contains(['/', '\\'])
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
    }
    fs::write(path, contents).map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", path, e))
}
