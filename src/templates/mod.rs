//! Built-in theme templates using the Tera template engine
//!
//! Templates are embedded in the binary. [`PageRenderer`] turns posts and
//! listing pages into complete HTML documents and is shared by static
//! generation and the on-demand server.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{ContentBlock, PostDetail, PostPagination, PostSummary};
use crate::helpers::{date_xml, format_date, post_path, truncate, url_for};
use crate::i18n::I18n;

/// Built-in stylesheet, written next to the generated pages
pub const STYLESHEET: &str = include_str!("default/style.css");

/// Template renderer with the embedded theme
pub struct PageRenderer {
    tera: Tera,
    config: SiteConfig,
    i18n: I18n,
    tz: chrono_tz::Tz,
}

impl PageRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new(config: SiteConfig, i18n: I18n) -> Result<Self> {
        // Autoescaping stays on for `.html`: every field comes from the CMS
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("default/layout.html")),
            ("index.html", include_str!("default/index.html")),
            ("post.html", include_str!("default/post.html")),
            ("not_found.html", include_str!("default/not_found.html")),
            ("error.html", include_str!("default/error.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("default/partials/header.html"),
            ),
            (
                "partials/post_card.html",
                include_str!("default/partials/post_card.html"),
            ),
        ])?;

        let tz = config.tz();
        Ok(Self {
            tera,
            config,
            i18n,
            tz,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Render the listing page for the first page of a cursor
    pub fn render_index(&self, listing: &PostPagination) -> Result<String> {
        let posts: Vec<PostCard> = listing.results.iter().map(|p| self.post_card(p)).collect();
        let months: Vec<String> = (1..=12).map(|m| self.i18n.month_name(m, false)).collect();
        let months_long: Vec<String> = (1..=12).map(|m| self.i18n.month_name(m, true)).collect();

        let mut context = self.base_context(&self.config.description);
        context.insert("posts", &posts);
        context.insert("next_page", &listing.next_page);
        context.insert("months", &months);
        context.insert("months_long", &months_long);
        context.insert("date_format", &self.config.date_format);
        context.insert("timezone", self.tz.name());

        self.render("index.html", &context)
    }

    /// Render a post page
    pub fn render_post(&self, post: &PostDetail) -> Result<String> {
        let view = self.post_view(post);
        let mut context = self.base_context(&view.description);
        context.insert("post", &view);
        self.render("post.html", &context)
    }

    /// Render the not-found page
    pub fn render_not_found(&self) -> Result<String> {
        let context = self.base_context("");
        self.render("not_found.html", &context)
    }

    /// Render the page shown when the CMS cannot be reached
    pub fn render_error(&self) -> Result<String> {
        let context = self.base_context("");
        self.render("error.html", &context)
    }

    fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Context variables shared by every page
    fn base_context(&self, description: &str) -> Context {
        let site = SiteData {
            title: self.config.title.clone(),
            description: self.config.description.clone(),
            language: self.i18n.language().to_string(),
            url: self.config.url.clone(),
            root: url_for(&self.config, "/"),
        };

        let mut context = Context::new();
        context.insert("site", &site);
        context.insert("t", &self.i18n.get_all_translations());
        context.insert("description", description);
        context.insert("version", env!("CARGO_PKG_VERSION"));
        context
    }

    fn display_date(&self, date: Option<DateTime<Utc>>) -> (String, String) {
        match date {
            Some(date) => {
                let local = date.with_timezone(&self.tz);
                (
                    format_date(&local, &self.config.date_format, &self.i18n),
                    date_xml(&local),
                )
            }
            None => (String::new(), String::new()),
        }
    }

    fn post_card(&self, post: &PostSummary) -> PostCard {
        let (date, datetime) = self.display_date(post.first_publication_date);
        PostCard {
            path: url_for(&self.config, &post_path(&post.uid)),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            date,
            datetime,
        }
    }

    fn post_view(&self, post: &PostDetail) -> PostView {
        let (date, datetime) = self.display_date(post.first_publication_date);
        let summary = if post.subtitle.is_empty() {
            post.content
                .first()
                .map(|b| b.body.as_text())
                .unwrap_or_default()
        } else {
            post.subtitle.clone()
        };

        PostView {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            date,
            datetime,
            banner_url: post.banner_url.clone(),
            reading_time: self.i18n.get_count("reading_time", post.reading_time()),
            description: truncate(&summary, 160, "..."),
            blocks: render_blocks(&post.content, &url_for(&self.config, "/")),
        }
    }
}

/// Convert each block on its own; a block that fails keeps its heading and
/// gets an empty body. Document links resolve below `root`.
pub fn render_blocks(blocks: &[ContentBlock], root: &str) -> Vec<BlockView> {
    blocks
        .iter()
        .enumerate()
        .map(|(index, block)| {
            let html = block.body.as_html(root).unwrap_or_else(|e| {
                tracing::warn!(block = index, heading = %block.heading, "Failed to render block: {}", e);
                String::new()
            });
            BlockView {
                heading: block.heading.clone(),
                html,
            }
        })
        .collect()
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub language: String,
    pub url: String,
    pub root: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
    pub datetime: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
    pub datetime: String,
    pub banner_url: String,
    pub reading_time: String,
    pub description: String,
    pub blocks: Vec<BlockView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockView {
    pub heading: String,
    pub html: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::RichText;
    use chrono::TimeZone;
    use serde_json::json;

    fn renderer() -> PageRenderer {
        PageRenderer::new(SiteConfig::default(), I18n::new("pt-BR")).unwrap()
    }

    fn summary(uid: &str, title: &str) -> PostSummary {
        PostSummary {
            uid: uid.to_string(),
            first_publication_date: Some(Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap()),
            title: title.to_string(),
            subtitle: "Pensando em sincronização".to_string(),
            author: "Joseph Oliveira".to_string(),
        }
    }

    fn block(heading: &str, body: serde_json::Value) -> ContentBlock {
        ContentBlock {
            heading: heading.to_string(),
            body: serde_json::from_value::<RichText>(body).unwrap(),
        }
    }

    #[test]
    fn test_render_index_with_more() {
        let listing = PostPagination::new(
            vec![summary("hooks", "Como utilizar Hooks")],
            Some("https://repo.cdn.prismic.io/api/v2/documents/search?page=2".to_string()),
        );
        let html = renderer().render_index(&listing).unwrap();

        assert!(html.contains("<title>Home | spacetraveling</title>"));
        assert!(html.contains(r#"href="/post/hooks""#));
        assert!(html.contains("Como utilizar Hooks"));
        assert!(html.contains("15 mar 2021"));
        assert!(html.contains("Carregar mais posts"));
        assert!(html.contains("data-next-page="));
    }

    #[test]
    fn test_load_more_script_uses_configured_format() {
        let config = SiteConfig {
            date_format: "D MMMM YYYY HH:mm".to_string(),
            timezone: "America/Sao_Paulo".to_string(),
            ..Default::default()
        };
        let renderer = PageRenderer::new(config, I18n::new("pt-BR")).unwrap();
        let listing = PostPagination::new(
            vec![summary("hooks", "Hooks")],
            Some("https://repo.cdn.prismic.io/api/v2/documents/search?page=2".to_string()),
        );
        let html = renderer.render_index(&listing).unwrap();

        assert!(html.contains(r#"var dateFormat = "D MMMM YYYY HH:mm";"#));
        assert!(html.contains(r#"var timeZone = "America/Sao_Paulo";"#));
        assert!(html.contains("\"março\""));
        // Server-rendered card uses the same format
        assert!(html.contains("15 março 2021 16:25"));
    }

    #[test]
    fn test_render_index_exhausted_hides_load_more() {
        let listing = PostPagination::new(vec![summary("hooks", "Hooks")], None);
        let html = renderer().render_index(&listing).unwrap();
        assert!(!html.contains("load-more"));
    }

    #[test]
    fn test_render_index_escapes_titles() {
        let listing = PostPagination::new(vec![summary("x", "<script>alert(1)</script>")], None);
        let html = renderer().render_index(&listing).unwrap();
        assert!(!html.contains("<script>alert(1)"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_render_post() {
        let post = PostDetail {
            uid: "hooks".to_string(),
            first_publication_date: Some(Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap()),
            title: "Como utilizar Hooks".to_string(),
            subtitle: String::new(),
            author: "Joseph Oliveira".to_string(),
            banner_url: String::new(),
            content: vec![
                block("Proin et varius", json!([{"type": "paragraph", "text": "Lorem ipsum", "spans": [{"start": 0, "end": 5, "type": "strong"}]}])),
                block("Cras laoreet", json!([])),
            ],
        };
        let html = renderer().render_post(&post).unwrap();

        assert!(html.contains("<h1>Como utilizar Hooks</h1>"));
        assert!(html.contains("Joseph Oliveira"));
        assert!(html.contains("15 mar 2021"));
        assert!(html.contains("1 min"));
        assert!(html.contains("<strong>Lorem</strong> ipsum"));
        assert!(!html.contains("class=\"banner\""));
        let first = html.find("Proin et varius").unwrap();
        let second = html.find("Cras laoreet").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_failed_block_does_not_abort_others() {
        let blocks = vec![
            block("Broken", json!([{"type": "paragraph", "text": "ab", "spans": [{"start": 0, "end": 9, "type": "em"}]}])),
            block("Fine", json!([{"type": "paragraph", "text": "ok", "spans": []}])),
        ];
        let views = render_blocks(&blocks, "/");
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].heading, "Broken");
        assert_eq!(views[0].html, "");
        assert_eq!(views[1].html, "<p>ok</p>");
    }

    #[test]
    fn test_render_not_found() {
        let html = renderer().render_not_found().unwrap();
        assert!(html.contains("Post não encontrado"));
    }
}
