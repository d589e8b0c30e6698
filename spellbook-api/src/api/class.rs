//! Class API Handlers
//!
//! Classes and the note pages uploaded to them.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
};
use spellbook_core::domain::class::{ClassRecord, ClassSummary};
use spellbook_core::dto::class::{
    ClassPage, CreateClass, NotePage, PageQuery, ProcessingStatus, RequestUploads, UploadSlots,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::api::owner::OwnerId;

/// POST /classes
pub async fn create_class(
    State(state): State<AppState>,
    owner: OwnerId,
    payload: Result<Json<CreateClass>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ClassRecord>)> {
    let Json(req) = payload?;

    let class = state.classes.create_class(owner.as_str(), &req.name).await?;

    Ok((StatusCode::CREATED, Json(class)))
}

/// GET /classes?page=&limit=
pub async fn list_classes(
    State(state): State<AppState>,
    owner: OwnerId,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<ClassPage>> {
    let Query(query) = query?;

    let page = state.classes.list_classes(owner.as_str(), query).await?;
    Ok(Json(page))
}

/// GET /classes/{id}
pub async fn get_class(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(class_id): Path<Uuid>,
) -> ApiResult<Json<ClassSummary>> {
    let summary = state.classes.class_summary(owner.as_str(), class_id).await?;
    Ok(Json(summary))
}

/// POST /classes/{id}/notes
/// Hand out write URLs for new note pages
pub async fn request_uploads(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(class_id): Path<Uuid>,
    payload: Result<Json<RequestUploads>, JsonRejection>,
) -> ApiResult<Json<UploadSlots>> {
    let Json(req) = payload?;
    tracing::info!("Requesting {} upload URLs for class {}", req.number_of_files, class_id);

    let uploads = state
        .classes
        .request_uploads(owner.as_str(), class_id, req.number_of_files)
        .await?;

    Ok(Json(UploadSlots { uploads }))
}

/// GET /classes/{id}/notes?page=&limit=
pub async fn list_notes(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(class_id): Path<Uuid>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<NotePage>> {
    let Query(query) = query?;

    let page = state
        .classes
        .list_notes(owner.as_str(), class_id, query)
        .await?;

    Ok(Json(page))
}

/// DELETE /classes/{id}/notes/{key}
pub async fn delete_note(
    State(state): State<AppState>,
    owner: OwnerId,
    Path((class_id, key)): Path<(Uuid, String)>,
) -> ApiResult<StatusCode> {
    state
        .classes
        .delete_note(owner.as_str(), class_id, &key)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /classes/{id}/notes/status
/// How many notes the OCR stage has processed
pub async fn processing_status(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(class_id): Path<Uuid>,
) -> ApiResult<Json<ProcessingStatus>> {
    let status = state
        .classes
        .processing_status(owner.as_str(), class_id)
        .await?;

    Ok(Json(status))
}
