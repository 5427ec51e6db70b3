use crate::config::AppConfig;
use crate::export;
use crate::markers::{select_markers, Action};
use crate::processing;
use crate::render::{error_page, render_page, PageView};
use crate::request::{CheckRequest, RawForm, ValidationError};
use anyhow::{Context, Result};
use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub struct AppState {
    pub config: AppConfig,
}

pub enum AppError {
    Validation(ValidationError),
    Internal(anyhow::Error),
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(e) => {
                warn!(error = %e, "rejected form input");
                (StatusCode::BAD_REQUEST, Html(error_page("Invalid input", &e.to_string()))).into_response()
            }
            AppError::Internal(e) => {
                error!(error = ?e, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(error_page(
                        "Something went wrong",
                        "The comparison could not be computed. Details are in the server log.",
                    )),
                )
                    .into_response()
            }
        }
    }
}

pub fn router(config: AppConfig) -> Router {
    let static_service = ServeDir::new(&config.server.static_dir);
    let state = Arc::new(AppState { config });

    Router::new()
        .route("/", get(index_get).post(index_post))
        .nest_service("/static", static_service)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    let addr = config.server.addr()?;
    info!(
        survey = ?config.input.survey_tsv,
        reference = ?config.input.reference,
        crs = %config.matching.crs,
        "starting server on http://{}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, router(config)).await?;
    Ok(())
}

async fn index_get(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let request = CheckRequest::defaults(&state.config)?;
    respond(state, request).await
}

async fn index_post(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RawForm>,
) -> Result<Response, AppError> {
    let request = CheckRequest::from_form(form, &state.config)?;
    respond(state, request).await
}

/// Recomputes everything from the input files and answers with either the page
/// or the export download.
async fn respond(state: Arc<AppState>, request: CheckRequest) -> Result<Response, AppError> {
    let radius = request.radius;
    let comparison = tokio::task::spawn_blocking(move || processing::compare(&state.config, radius))
        .await
        .context("Comparison task panicked")??;

    match request.action {
        Action::Export => {
            let export = comparison.export();
            let body = export.to_json()?;
            info!(count = export.count, "serving export");
            let headers = [
                (header::CONTENT_TYPE, export::CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", export.filename()),
                ),
            ];
            Ok((headers, body).into_response())
        }
        Action::Show(view) => {
            let markers = select_markers(&comparison.outcome, view, &request.filter);
            let html = render_page(&PageView {
                radius,
                filter: &request.filter,
                concepts: &comparison.outcome.concepts,
                rows: &comparison.rows,
                markers: &markers,
            });
            Ok(Html(html).into_response())
        }
    }
}
