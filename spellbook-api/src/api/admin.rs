//! Administrative endpoints

use axum::{Json, extract::State};
use spellbook_core::dto::job::QueueSnapshot;

use crate::api::AppState;
use crate::api::error::ApiResult;

/// GET /admin/queue
/// Size and head of the job queue; never consumes an entry
pub async fn queue_snapshot(State(state): State<AppState>) -> ApiResult<Json<QueueSnapshot>> {
    Ok(Json(state.jobs.queue_snapshot().await?))
}
