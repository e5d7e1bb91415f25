use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::article::{Article, ManualArticle};
use crate::fetcher::FetchError;
use crate::highlight::highlight;
use crate::session::FeedSession;
use crate::store::Theme;
use crate::trends::{top_keywords, KeywordCount, DEFAULT_TREND_LIMIT};

pub struct AppState {
    pub session: Arc<FeedSession>,
    /// Default for the `highlight` query parameter
    pub highlight: bool,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/articles", get(list_articles).delete(clear_articles))
        .route("/api/articles/manual", post(submit_manual))
        .route("/api/articles/:id/share", get(share_article))
        .route("/api/trends", get(trends))
        .route("/api/theme", get(get_theme).put(put_theme))
        .route("/refresh", post(refresh))
        .route("/refresh/status", get(refresh_status))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Custom error type
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Upstream(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, format!("Bad request: {}", message)).into_response()
            }
            AppError::NotFound(what) => {
                (StatusCode::NOT_FOUND, format!("Not found: {}", what)).into_response()
            }
            AppError::Upstream(message) => {
                (StatusCode::BAD_GATEWAY, format!("Upstream error: {}", message)).into_response()
            }
            AppError::Internal(err) => {
                error!("Request failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error: {}", err),
                )
                    .into_response()
            }
        }
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError::Internal(err.into())
    }
}

/// An article as handed to the rendering layer.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleCard {
    #[serde(flatten)]
    pub article: Article,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighted_summary: Option<String>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub highlight: Option<bool>,
}

// Route handlers
pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<ArticleCard>> {
    let articles = match query.q.as_deref() {
        Some(q) => state.session.search(q).await,
        None => state.session.articles().await,
    };
    let with_highlight = query.highlight.unwrap_or(state.highlight);

    let cards = articles
        .into_iter()
        .map(|article| {
            let highlighted_summary =
                with_highlight.then(|| highlight(&article.summary, &article.keywords));
            ArticleCard {
                article,
                highlighted_summary,
            }
        })
        .collect();

    Json(cards)
}

pub async fn clear_articles(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    state.session.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit_manual(
    State(state): State<Arc<AppState>>,
    Json(manual): Json<ManualArticle>,
) -> Result<impl IntoResponse, AppError> {
    if manual.title.trim().is_empty() || manual.content.trim().is_empty() {
        return Err(AppError::BadRequest(
            "title and content are required".to_string(),
        ));
    }

    let outcome = state
        .session
        .add_manual(manual)
        .await
        .map_err(|e: FetchError| AppError::Upstream(e.to_string()))?;

    // An article already in the feed is returned as it stands
    let status = if outcome.added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}

#[derive(Serialize)]
pub struct ShareText {
    pub share: String,
    pub speech: String,
}

pub async fn share_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ShareText>, AppError> {
    let article = state
        .session
        .find(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("article {}", id)))?;

    Ok(Json(ShareText {
        share: article.share_text(),
        speech: article.speech_text(),
    }))
}

#[derive(Deserialize)]
pub struct TrendsQuery {
    #[serde(default = "default_trend_limit")]
    pub limit: usize,
}

fn default_trend_limit() -> usize {
    DEFAULT_TREND_LIMIT
}

pub async fn trends(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrendsQuery>,
) -> Json<Vec<KeywordCount>> {
    let articles = state.session.articles().await;
    Json(top_keywords(&articles, query.limit))
}

#[derive(Serialize, Deserialize)]
pub struct ThemeBody {
    pub theme: Theme,
}

pub async fn get_theme(State(state): State<Arc<AppState>>) -> Result<Json<ThemeBody>, AppError> {
    let theme = state.session.theme().await?;
    Ok(Json(ThemeBody { theme }))
}

pub async fn put_theme(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ThemeBody>,
) -> Result<Json<ThemeBody>, AppError> {
    state.session.set_theme(body.theme).await?;
    Ok(Json(body))
}

#[derive(Serialize)]
pub struct RefreshStatus {
    pub syncing: bool,
    pub articles: usize,
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Spawn the sync cycle
    let session = state.session.clone();
    tokio::spawn(async move {
        session.sync_once().await;
    });

    StatusCode::ACCEPTED
}

pub async fn refresh_status(State(state): State<Arc<AppState>>) -> Json<RefreshStatus> {
    Json(RefreshStatus {
        syncing: state.session.is_syncing(),
        articles: state.session.len().await,
    })
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
