//! HTTP surface over [`DocQa`].
//!
//! Document endpoints take multipart bodies with either a `file` part or an
//! `existing` part naming an earlier upload. `/ask` and `/evaluate` take
//! url-encoded forms. Failures become `{error, traceback}` JSON.

use anyhow::{Context, Result};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::FormRejection,
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use docqa_core::config::{ServerSettings, Settings};
use docqa_core::error::Error;

use crate::handlers::{DocQa, DocumentSource};
use crate::responses::{
    AskResponse, DocumentsResponse, EmbedResponse, ErrorResponse, EvaluateResponse, QuestionsResponse,
    SummaryResponse,
};

type AppState = Arc<DocQa>;

#[derive(Debug, Deserialize)]
pub struct AskForm {
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateForm {
    pub answer: String,
}

/// Handler failure carried to the client as JSON.
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(err: E) -> Self { Self(err.into()) }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.chain().find_map(|e| e.downcast_ref::<Error>()) {
            Some(Error::UnsupportedFileType(_) | Error::NoExtractableText | Error::InvalidRequest(_)) => {
                StatusCode::BAD_REQUEST
            }
            Some(Error::IndexNotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse { error: format!("{:#}", self.0), traceback: format!("{:?}", self.0) };
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %body.error, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %body.error, "request rejected");
        }
        (status, Json(body)).into_response()
    }
}

pub fn router(app: AppState) -> Router {
    let body_limit = app.settings().server.max_upload_bytes;
    Router::new()
        .route("/embed", post(embed))
        .route("/summarize", post(summarize))
        .route("/generate_questions", post(generate_questions))
        .route("/ask", post(ask))
        .route("/evaluate", post(evaluate))
        .route("/documents", get(documents))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

/// Build the handlers from `settings` and serve until Ctrl-C.
pub async fn serve(settings: Settings) -> Result<()> {
    let listener = bind_listener(&settings.server).await?;
    let app = Arc::new(DocQa::from_settings(settings)?);
    axum::serve(listener, router(app)).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

/// Bind `host:port`, resolving hostnames such as `localhost`.
pub async fn bind_listener(server: &ServerSettings) -> Result<TcpListener> {
    let listener = TcpListener::bind((server.host.as_str(), server.port))
        .await
        .with_context(|| format!("binding {}:{}", server.host, server.port))?;
    tracing::info!(addr = %listener.local_addr()?, "docqa server listening");
    Ok(listener)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

async fn health_check() -> &'static str {
    "OK"
}

async fn embed(
    State(app): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let source = document_source(multipart.map_err(|r| Error::InvalidRequest(r.body_text()))?).await?;
    Ok(Json(app.embed(source).await?))
}

async fn summarize(
    State(app): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let source = document_source(multipart.map_err(|r| Error::InvalidRequest(r.body_text()))?).await?;
    Ok(Json(app.summarize(source).await?))
}

async fn generate_questions(
    State(app): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<QuestionsResponse>, ApiError> {
    let source = document_source(multipart.map_err(|r| Error::InvalidRequest(r.body_text()))?).await?;
    Ok(Json(app.generate_questions(source).await?))
}

async fn ask(
    State(app): State<AppState>,
    form: Result<Form<AskForm>, FormRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Form(form) = form.map_err(|r| Error::InvalidRequest(r.body_text()))?;
    Ok(Json(app.ask(&form.question).await?))
}

async fn evaluate(
    State(app): State<AppState>,
    form: Result<Form<EvaluateForm>, FormRejection>,
) -> Result<Json<EvaluateResponse>, ApiError> {
    let Form(form) = form.map_err(|r| Error::InvalidRequest(r.body_text()))?;
    Ok(Json(app.evaluate(&form.answer).await?))
}

async fn documents(State(app): State<AppState>) -> Json<DocumentsResponse> {
    Json(app.list_documents())
}

async fn document_source(mut multipart: Multipart) -> Result<DocumentSource, Error> {
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| Error::InvalidRequest("the file part needs a filename".into()))?;
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                return Ok(DocumentSource::Upload { file_name, bytes: bytes.to_vec() });
            }
            Some("existing") => {
                let existing = field.text().await.map_err(bad_multipart)?;
                return Ok(DocumentSource::Existing(existing));
            }
            _ => {}
        }
    }
    Err(Error::InvalidRequest("expected a `file` or `existing` field".into()))
}

fn bad_multipart(err: MultipartError) -> Error {
    Error::InvalidRequest(err.body_text())
}
