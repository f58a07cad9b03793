//! List posts published in the CMS

use anyhow::{Context, Result};
use std::io::Write;

use crate::cms::ContentSource;
use crate::content::{ContentLoader, PostPagination};
use crate::helpers::{full_url_for, post_path};
use crate::Blog;

/// Print the post listing. Only the first page unless `all` is set.
pub async fn run(blog: &Blog, source: &dyn ContentSource, all: bool, json: bool) -> Result<()> {
    let listing = fetch(blog, source, all).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &listing)?;
        writeln!(out)?;
    } else {
        print_listing(blog, &listing, &mut out)?;
    }

    Ok(())
}

async fn fetch(blog: &Blog, source: &dyn ContentSource, all: bool) -> Result<PostPagination> {
    let loader = ContentLoader::new(source, &blog.config.cms);
    let mut listing = loader
        .load_first_page()
        .await
        .context("Failed to fetch the post listing")?;

    if all {
        listing
            .load_all(loader.source())
            .await
            .context("Failed to fetch the remaining listing pages")?;
    }

    Ok(listing)
}

fn print_listing<W: Write>(blog: &Blog, listing: &PostPagination, out: &mut W) -> Result<()> {
    writeln!(out, "Posts ({}):", listing.results.len())?;
    for post in &listing.results {
        let date = post
            .first_publication_date
            .map(|d| d.with_timezone(&blog.config.tz()).format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "----------".to_string());
        writeln!(
            out,
            "  {} - {} [{}]",
            date,
            post.title,
            full_url_for(&blog.config, &post_path(&post.uid))
        )?;
    }
    if listing.has_more() {
        writeln!(out, "More posts available (use --all)")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::memory::{post_document, MemorySource};
    use crate::config::SiteConfig;

    fn source() -> MemorySource {
        let docs = (1..=3)
            .map(|i| post_document(&format!("post-{}", i), &format!("Post {}", i), 10))
            .collect();
        MemorySource::paged(docs, 2)
    }

    fn blog() -> Blog {
        let mut config = SiteConfig::default();
        config.url = "https://blog.example.com".to_string();
        Blog::with_config("/tmp/blog", config)
    }

    #[tokio::test]
    async fn test_fetch_first_page_only() {
        let blog = blog();
        let listing = fetch(&blog, &source(), false).await.unwrap();
        assert_eq!(listing.results.len(), 2);
        assert!(listing.has_more());

        let mut out = Vec::new();
        print_listing(&blog, &listing, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Posts (2):"));
        assert!(text.contains("Post 1 [https://blog.example.com/post/post-1]"));
        assert!(text.contains("--all"));
    }

    #[tokio::test]
    async fn test_fetch_all_pages() {
        let blog = blog();
        let source = source();
        let listing = fetch(&blog, &source, true).await.unwrap();
        assert_eq!(listing.results.len(), 3);
        assert!(!listing.has_more());
        assert_eq!(source.fetched().len(), 1);
    }
}
