//! Axum request handlers for the HTTP API.
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use crate::api::routes::AppState;
use crate::error::AppError;
use crate::evaluation::types::{
    ComparisonRequest, ComparisonResponse, EvaluationRequest, EvaluationResponse,
};
use crate::image::codec::ImageResource;

pub async fn root() -> &'static str {
    "Dify Image Scorer"
}

/// Multipart form: `image1` and `image2` files, optional `context` text.
pub async fn evaluate(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<EvaluationResponse>, ApiError> {
    let mut context = None;
    let mut image1 = None;
    let mut image2 = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image1" | "image2" => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| name.clone());
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read field '{}': {}", name, e))
                })?;
                let resource = ImageResource::from_bytes(file_name, bytes.to_vec());
                if name == "image1" {
                    image1 = Some(resource);
                } else {
                    image2 = Some(resource);
                }
            }
            "context" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read context: {}", e)))?;
                if !text.trim().is_empty() {
                    context = Some(text);
                }
            }
            other => tracing::debug!("Ignoring unknown multipart field '{}'", other),
        }
    }

    let (Some(image1), Some(image2)) = (image1, image2) else {
        return Err(ApiError::BadRequest(
            "Both 'image1' and 'image2' are required".to_string(),
        ));
    };
    let request = EvaluationRequest { context, image1, image2 };
    state
        .evaluator
        .evaluate(&request)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Failed to evaluate images: {:?}", e);
            e.into()
        })
}

pub async fn compare(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ComparisonRequest>, JsonRejection>,
) -> Result<Json<ComparisonResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    if request.target_images.is_empty() {
        return Err(ApiError::BadRequest("'targetImages' must not be empty".to_string()));
    }
    state
        .evaluator
        .compare(&request)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Failed to compare images: {:?}", e);
            e.into()
        })
}

/// Errors as rendered by the HTTP layer.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    App(AppError),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError::App(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({"error": "bad_request", "message": message}))
            }
            ApiError::App(err) => {
                let status = match &err {
                    AppError::Configuration => StatusCode::SERVICE_UNAVAILABLE,
                    AppError::Read { .. } => StatusCode::BAD_REQUEST,
                    AppError::Upload { .. } | AppError::Workflow { .. } => StatusCode::BAD_GATEWAY,
                    AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let mut body = json!({"error": err.kind(), "message": err.to_string()});
                if let Some(upstream) = err.status_code() {
                    body["status"] = json!(upstream);
                }
                (status, body)
            }
        };
        (status, Json(body)).into_response()
    }
}
