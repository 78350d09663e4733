//! Annotation API endpoints
//!
//! The JSON feed and the form writes the annotation session talks to.
//! Refusals from the store come back as 403 with the host message in
//! `message`.

use axum::{
    extract::{Path, Query, State},
    routing::delete,
    Json, Router,
};
use serde::Deserialize;

use super::submissions::find_submission;
use super::UserId;
use crate::annotations::{Annotation, AnnotationBackend, AnnotationForm, AnnotationSummary, Notice};
use crate::error::Result;
use crate::state::AppState;

/// Create the annotations router
pub fn router() -> Router<AppState> {
    Router::new().route("/:id", delete(delete_annotation))
}

/// Query parameters for listing annotations
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Only annotations by this user
    userid: Option<u64>,
}

/// Annotations of one submission
pub async fn list_annotations(
    State(state): State<AppState>,
    Path(submission): Path<u64>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Annotation>>> {
    find_submission(&state, submission)?;
    let annotations = state
        .store()
        .fetch_annotations(submission, params.userid)
        .await?;
    Ok(Json(annotations))
}

/// Annotation counts of one submission per type and participant
pub async fn annotation_summary(
    State(state): State<AppState>,
    Path(submission): Path<u64>,
    Query(params): Query<ListParams>,
) -> Result<Json<AnnotationSummary>> {
    find_submission(&state, submission)?;
    Ok(Json(state.store().summary(submission, params.userid)))
}

/// Create (`annotationid` 0) or update an annotation
pub async fn submit_annotation(
    State(state): State<AppState>,
    Path(submission): Path<u64>,
    UserId(user): UserId,
    Json(mut form): Json<AnnotationForm>,
) -> Result<Json<Notice>> {
    form.submission = submission;
    let notice = state.store().submit(user, &form).await?;
    Ok(Json(notice))
}

async fn delete_annotation(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    UserId(user): UserId,
) -> Result<Json<Notice>> {
    let notice = state.store().delete(user, id).await?;
    Ok(Json(notice))
}
