use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Json, Response};
use axum::routing::{delete, get, post};
use tokio_util::io::ReaderStream;
use tower_http::trace::TraceLayer;

use crate::api::{ArticleStore, UploadImageRequest, UploadImageResponse};
use crate::app::store::LocalFsArticleStore;
use crate::error::SeoError;
use crate::formats::{NewSavedArticle, SavedArticle};

const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LocalFsArticleStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/api/articles", get(list_articles).post(create_article))
        .route("/api/articles/:id", delete(delete_article))
        .route("/api/images/upload", post(upload_image))
        .route("/images/:file", get(download_image))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

type HandlerError = (StatusCode, String);

fn error_response(err: SeoError) -> HandlerError {
    let status = match &err {
        SeoError::Validation(_) | SeoError::NoContent => StatusCode::BAD_REQUEST,
        SeoError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    }
    (status, err.to_string())
}

async fn list_articles(
    State(state): State<AppState>,
) -> Result<Json<Vec<SavedArticle>>, HandlerError> {
    state.store.list().await.map(Json).map_err(error_response)
}

async fn create_article(
    State(state): State<AppState>,
    Json(article): Json<NewSavedArticle>,
) -> Result<(StatusCode, Json<SavedArticle>), HandlerError> {
    let saved = state.store.create(&article).await.map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, HandlerError> {
    state
        .store
        .delete(id.trim())
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn upload_image(
    State(state): State<AppState>,
    Json(request): Json<UploadImageRequest>,
) -> Result<Json<UploadImageResponse>, HandlerError> {
    let url = state
        .store
        .upload_image(&request.image_data)
        .await
        .map_err(error_response)?;
    Ok(Json(UploadImageResponse { url }))
}

async fn download_image(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, StatusCode> {
    let Some((path, content_type)) = state.store.image_path(&file) else {
        return Err(StatusCode::NOT_FOUND);
    };

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;
    let stream = ReaderStream::new(file);
    let body = axum::body::Body::from_stream(stream);

    let mut resp = Response::new(body);
    resp.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    resp.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );
    Ok(resp)
}
