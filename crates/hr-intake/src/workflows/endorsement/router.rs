use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::batch::BatchOutcome;
use super::repository::{BlobStorage, EndorsementStore, NotificationSink};
use super::service::{EndorsementService, ImportRequest, SubmitRequest, ValidateRequest};
use crate::error::AppError;
use crate::workflows::bulk_import::template_csv;

pub const TEMPLATE_FILE_NAME: &str = "endorsement-template.csv";

/// Router builder exposing the endorsement endpoints.
pub fn endorsement_router<S, B, N>(service: Arc<EndorsementService<S, B, N>>) -> Router
where
    S: EndorsementStore + 'static,
    B: BlobStorage + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route("/api/v1/endorsements/template", get(template_handler))
        .route(
            "/api/v1/endorsements/import",
            post(import_handler::<S, B, N>),
        )
        .route(
            "/api/v1/endorsements/validate",
            post(validate_handler::<S, B, N>),
        )
        .route(
            "/api/v1/endorsements/submit",
            post(submit_handler::<S, B, N>),
        )
        .with_state(service)
}

pub(crate) async fn template_handler() -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{TEMPLATE_FILE_NAME}\""),
            ),
        ],
        template_csv(),
    )
        .into_response()
}

pub(crate) async fn import_handler<S, B, N>(
    State(service): State<Arc<EndorsementService<S, B, N>>>,
    Json(request): Json<ImportRequest>,
) -> Response
where
    S: EndorsementStore + 'static,
    B: BlobStorage + 'static,
    N: NotificationSink + 'static,
{
    match service.import(request) {
        Ok(imported) => (StatusCode::OK, Json(imported)).into_response(),
        Err(error) => AppError::from(error).into_response(),
    }
}

pub(crate) async fn validate_handler<S, B, N>(
    State(service): State<Arc<EndorsementService<S, B, N>>>,
    Json(request): Json<ValidateRequest>,
) -> Response
where
    S: EndorsementStore + 'static,
    B: BlobStorage + 'static,
    N: NotificationSink + 'static,
{
    let result = service.validate(&request);
    (StatusCode::OK, Json(result)).into_response()
}

pub(crate) async fn submit_handler<S, B, N>(
    State(service): State<Arc<EndorsementService<S, B, N>>>,
    Json(request): Json<SubmitRequest>,
) -> Response
where
    S: EndorsementStore + 'static,
    B: BlobStorage + 'static,
    N: NotificationSink + 'static,
{
    match service.submit(request).await {
        Ok(summary) => {
            let status = match summary.outcome {
                BatchOutcome::AllEndorsed => StatusCode::OK,
                BatchOutcome::PartiallyEndorsed => StatusCode::MULTI_STATUS,
                BatchOutcome::NoneEndorsed => StatusCode::CONFLICT,
            };
            (status, Json(summary)).into_response()
        }
        Err(error) => AppError::from(error).into_response(),
    }
}
