//! Generate static files

use anyhow::Result;

use crate::cms::ContentSource;
use crate::generator::Generator;
use crate::Blog;

/// Generate the static site from the CMS
pub async fn run(blog: &Blog, source: &dyn ContentSource) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog)?;
    let summary = generator.generate(source).await?;

    if summary.skipped > 0 {
        tracing::warn!("{} posts were skipped", summary.skipped);
    }
    tracing::info!(
        "Generated {} posts and copied {} assets in {:.2}s",
        summary.posts,
        summary.assets,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
