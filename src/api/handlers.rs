use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::logic::{CloneError, CloneResult, EntityGraph, HubService, KindedRow, ServiceError};
use crate::model::{EntityKind, HubAccess, Id, Row};
use crate::store::EntityStore;

pub type AppState<S> = Arc<HubService<S>>;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CloneResponse {
    pub top: KindedRow,
    pub children: Vec<KindedRow>,
    pub counts: BTreeMap<EntityKind, usize>,
}

impl From<CloneResult> for CloneResponse {
    fn from(result: CloneResult) -> Self {
        Self {
            counts: result.counts(),
            top: result.top().clone(),
            children: result.child_clones().to_vec(),
        }
    }
}

fn error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

fn parse_kind(segment: &str) -> Result<EntityKind, ApiError> {
    segment
        .parse()
        .map_err(|e: anyhow::Error| error(StatusCode::BAD_REQUEST, &e.to_string()))
}

fn service_error(err: ServiceError) -> ApiError {
    let status = match &err {
        ServiceError::Clone(clone) => match clone {
            CloneError::NotFound { .. } => StatusCode::NOT_FOUND,
            CloneError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CloneError::ParentNotAccessible { .. } => StatusCode::FORBIDDEN,
            CloneError::NotCloneable { .. } => StatusCode::BAD_REQUEST,
            CloneError::DependencyOrderViolation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            CloneError::StoreFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
        },
        ServiceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
        ServiceError::NotARoot { .. } => StatusCode::BAD_REQUEST,
        ServiceError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
    };

    let message = match &err {
        ServiceError::Clone(clone) => clone.public_message(),
        ServiceError::Store(_) => "Content store unavailable, try again later".to_string(),
        other => other.to_string(),
    };

    if status.is_server_error() {
        log::error!("Request failed: {}", err);
    }
    error(status, &message)
}

/// `POST /:kind/:id/clone` with the partial attributes of the copy as the body
pub async fn clone_entity<S: EntityStore>(
    State(service): State<AppState<S>>,
    access: HubAccess,
    Path((kind, id)): Path<(String, Id)>,
    RequestJson(body): RequestJson<Value>,
) -> Result<(StatusCode, Json<CloneResponse>), ApiError> {
    let kind = parse_kind(&kind)?;
    if !body.is_object() && !body.is_null() {
        return Err(error(
            StatusCode::BAD_REQUEST,
            "Clone body must be a JSON object of attributes",
        ));
    }
    let partial = if body.is_null() {
        Row::partial()
    } else {
        Row::from_flat_json(body).map_err(|e| error(StatusCode::BAD_REQUEST, &e.to_string()))?
    };

    log::info!("User {} cloning {} '{}'", access.user_id, kind, id);
    let result = service
        .clone_root(&access, kind, &id, partial)
        .await
        .map_err(service_error)?;

    Ok((StatusCode::CREATED, Json(result.into())))
}

/// `GET /:kind/:id`, the row as flat JSON
pub async fn get_entity<S: EntityStore>(
    State(service): State<AppState<S>>,
    access: HubAccess,
    Path((kind, id)): Path<(String, Id)>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_kind(&kind)?;
    let row = service
        .read_one(&access, kind, &id)
        .await
        .map_err(service_error)?;
    Ok(Json(row.to_flat_json()))
}

/// `GET /:kind/:id/graph`, a root and every row beneath it
pub async fn get_entity_graph<S: EntityStore>(
    State(service): State<AppState<S>>,
    access: HubAccess,
    Path((kind, id)): Path<(String, Id)>,
) -> Result<Json<EntityGraph>, ApiError> {
    let kind = parse_kind(&kind)?;
    let graph = service
        .read_graph(&access, kind, &id)
        .await
        .map_err(service_error)?;
    Ok(Json(graph))
}
