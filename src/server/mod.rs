//! HTTP server exposing the content queries
//!
//! Two read-only queries plus an admin cache-clear endpoint. The
//! pipeline does blocking file I/O, so every handler offloads to the
//! blocking pool; observable semantics are unchanged.

pub mod auth;
pub mod query;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::cache::{CacheService, HttpSharedCache, SharedCache};
use crate::config::BlogConfig;
use crate::content::{ContentRepository, MarkdownRenderer, PostSummary};
use crate::Blog;

/// Server state shared across handlers
pub struct AppState {
    repo: ContentRepository,
    cache: CacheService,
    admin_token: Option<String>,
    per_page: usize,
}

#[derive(Debug, Deserialize)]
struct ListParams {
    q: Option<String>,
    tag: Option<String>,
    page: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ListResponse {
    posts: Vec<PostSummary>,
    page: usize,
    total_pages: usize,
}

/// Start the blog server
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    let blog = blog.clone();
    // Syntax definitions and the shared-cache client are built off the
    // async runtime.
    let state = tokio::task::spawn_blocking(move || build_state(&blog)).await?;

    let app = Router::new()
        .route("/api/posts", get(list_posts))
        .route("/api/posts/:slug", get(get_post))
        .route("/api/admin/cache/clear", post(clear_cache))
        .route("/static/syntax.css", get(syntax_css))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    tracing::info!("blog server listening on http://{}:{}", ip, port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(blog: &Blog) -> Arc<AppState> {
    let renderer = MarkdownRenderer::new(&blog.config.highlight_theme);
    let repo = ContentRepository::new(blog.content_dir.clone(), renderer);

    let shared: Option<Box<dyn SharedCache>> = BlogConfig::shared_cache_url()
        .and_then(|url| {
            tracing::info!("using shared cache at {}", url);
            HttpSharedCache::connect(&url)
        })
        .map(|c| Box::new(c) as Box<dyn SharedCache>);

    let admin_token = BlogConfig::admin_token();
    if admin_token.is_none() {
        tracing::info!("no admin token configured, cache-clear endpoint disabled");
    }

    Arc::new(AppState {
        repo,
        cache: CacheService::new(&blog.config.cache, shared),
        admin_token,
        per_page: blog.config.per_page,
    })
}

async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, StatusCode> {
    let response = tokio::task::spawn_blocking(move || {
        let posts = state.cache.list_posts(|| state.repo.list_posts());

        let posts = match params.q.as_deref() {
            Some(q) => query::apply_filter(q, &posts),
            None => posts,
        };
        let posts = match params.tag.as_deref() {
            Some(tag) => query::filter_by_tag(tag, &posts),
            None => posts,
        };

        let page = params.page.unwrap_or(1);
        let (posts, total_pages) = query::paginate(&posts, page, state.per_page);
        ListResponse { posts, page: page.clamp(1, total_pages), total_pages }
    })
    .await
    .map_err(|e| {
        tracing::error!("listing task failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(response))
}

async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Response, StatusCode> {
    let post = tokio::task::spawn_blocking(move || {
        state.cache.get_post(&slug, || state.repo.get_post(&slug))
    })
    .await
    .map_err(|e| {
        tracing::error!("post task failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match post {
        Some(post) => Ok(Json(post).into_response()),
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn clear_cache(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> StatusCode {
    let token = params.get("token").map(|s| s.as_str());
    if !auth::is_authorized(token, state.admin_token.as_deref()) {
        tracing::warn!("unauthorized cache-clear attempt");
        return StatusCode::UNAUTHORIZED;
    }

    match tokio::task::spawn_blocking(move || state.cache.clear()).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            tracing::error!("cache clear task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn syntax_css(State(state): State<Arc<AppState>>) -> Response {
    match state.repo.renderer().theme_css() {
        Some(css) => ([(header::CONTENT_TYPE, "text/css")], css).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
