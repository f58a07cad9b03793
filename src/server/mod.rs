//! HTTP server rendering pages on demand from the CMS

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cms::ContentSource;
use crate::content::ContentLoader;
use crate::templates::{PageRenderer, STYLESHEET};
use crate::Blog;

/// Shared by every request
pub struct ServerState {
    renderer: PageRenderer,
    source: Arc<dyn ContentSource>,
    static_dir: PathBuf,
}

impl ServerState {
    pub fn new(renderer: PageRenderer, source: Arc<dyn ContentSource>, static_dir: PathBuf) -> Self {
        Self {
            renderer,
            source,
            static_dir,
        }
    }

    fn loader(&self) -> ContentLoader<'_> {
        ContentLoader::new(self.source.as_ref(), &self.renderer.config().cms)
    }

    fn not_found(&self) -> Response {
        html_response(StatusCode::NOT_FOUND, self.renderer.render_not_found())
    }

    fn bad_gateway(&self) -> Response {
        html_response(StatusCode::BAD_GATEWAY, self.renderer.render_error())
    }
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16, open: bool) -> Result<()> {
    let state = Arc::new(ServerState::new(
        blog.renderer()?,
        blog.content_source()?,
        blog.static_dir.clone(),
    ));
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Routes: listing, post pages, stylesheet, then static files
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/post/:uid", get(post_handler))
        .route("/style.css", get(stylesheet_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index_handler(State(state): State<Arc<ServerState>>) -> Response {
    match state.loader().load_first_page().await {
        Ok(listing) => html_response(StatusCode::OK, state.renderer.render_index(&listing)),
        Err(e) => {
            tracing::error!("Failed to load post listing: {}", e);
            state.bad_gateway()
        }
    }
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(uid): Path<String>,
) -> Response {
    match state.loader().load_post(&uid).await {
        Ok(post) => html_response(StatusCode::OK, state.renderer.render_post(&post)),
        Err(e) if e.is_not_found() => {
            tracing::debug!(uid = %uid, "Post not found");
            state.not_found()
        }
        Err(e) => {
            tracing::error!(uid = %uid, "Failed to load post: {}", e);
            state.bad_gateway()
        }
    }
}

async fn stylesheet_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLESHEET)
}

/// Serve files from the static directory, the not-found page otherwise
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let mut service = ServeDir::new(&state.static_dir);
    match service.try_call(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => state.not_found(),
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::error!("Failed to serve static file: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

fn html_response(status: StatusCode, rendered: Result<String>) -> Response {
    match rendered {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render page: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
