use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{Html, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ConfigService;
use crate::domain::{AppError, CertConfig};
use crate::infrastructure::config_store::ConfigStore;
use crate::infrastructure::runtime_assets::DEFAULT_INDEX_HTML;
use crate::interface::auth;
use crate::runtime::scheduler::Scheduler;

#[derive(Clone)]
pub struct AppState {
    pub config: ConfigService,
    pub scheduler: Arc<Scheduler>,
    pub web_index_path: PathBuf,
}

impl AppState {
    pub fn new(store: ConfigStore, scheduler: Arc<Scheduler>, web_index_path: PathBuf) -> Self {
        Self {
            config: ConfigService::new(store),
            scheduler,
            web_index_path,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/config", get(get_config).post(replace_config))
        .route("/api/issue", post(issue))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_credentials,
        ));

    Router::new()
        .route("/", get(index))
        .merge(api)
        .layer(middleware::from_fn_with_state(state.clone(), require_enabled))
        .with_state(state)
}

async fn require_enabled(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.config.get().await.web_enable {
        tracing::debug!(path = %request.uri().path(), "control api disabled; rejecting");
        return Err(AppError::forbidden("control API is disabled"));
    }
    Ok(next.run(request).await)
}

async fn require_credentials(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let config = state.config.get().await;
    auth::authorize(request.headers(), &config)?;
    Ok(next.run(request).await)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    match tokio::fs::read_to_string(&state.web_index_path).await {
        Ok(page) => Html(page),
        Err(error) => {
            tracing::warn!(
                web_index = %state.web_index_path.display(),
                error = %error,
                "failed to read control page; serving embedded copy"
            );
            Html(DEFAULT_INDEX_HTML.to_string())
        }
    }
}

async fn get_config(State(state): State<AppState>) -> Json<CertConfig> {
    Json(state.config.get().await)
}

/// Always 200: the body is `ok` or the reason the document was rejected,
/// including bodies that could not be buffered (over the size limit).
async fn replace_config(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> String {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "config body rejected");
            return rejection.body_text();
        }
    };
    match state.config.replace(&body).await {
        Ok(_) => "ok".to_string(),
        Err(error) => error.to_string(),
    }
}

async fn issue(State(state): State<AppState>) -> &'static str {
    drop(state.scheduler.trigger_manual());
    "started"
}
