//! Submission endpoints
//!
//! Uploads, edits, raw retrieval, statistics, selection description and
//! server-rendered highlights.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{annotations, UserId};
use crate::anchoring::{describe, SelectorTriple, TextIndex};
use crate::annotations::{Submission, MSG_SUBMISSION_UPDATED};
use crate::dom::{Document, DomRange};
use crate::error::{AppError, Result};
use crate::html::{render_annotated, sanitize_html, RenderError, RenderResult};
use crate::state::AppState;
use crate::stats::SubmissionStats;

/// Create the submissions router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_submission))
        .route("/:id", get(get_submission).put(update_submission))
        .route("/:id/annotated", get(get_annotated))
        .route("/:id/stats", get(get_stats))
        .route("/:id/describe", post(describe_selection))
        .route("/:id/summary", get(annotations::annotation_summary))
        .route(
            "/:id/annotations",
            get(annotations::list_annotations).post(annotations::submit_annotation),
        )
}

/// Request body for uploading a text
#[derive(Debug, Deserialize)]
pub struct CreateSubmissionRequest {
    #[serde(default)]
    pub title: String,
    pub content: String,
}

/// Request body for editing a text
#[derive(Debug, Deserialize)]
pub struct UpdateSubmissionRequest {
    pub title: Option<String>,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SubmissionUpdated {
    pub message: String,
    pub submission: Submission,
}

/// A selection as offsets into the submission's flattened text
#[derive(Debug, Deserialize)]
pub struct DescribeRequest {
    pub start: usize,
    pub end: usize,
}

async fn create_submission(
    State(state): State<AppState>,
    UserId(user): UserId,
    Json(req): Json<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<Submission>)> {
    if req.content.trim().is_empty() {
        return Err(AppError::BadRequest("Submission text is empty".to_string()));
    }

    let submission = state.store().add_submission(user, &req.title, &req.content);
    tracing::info!(submission = submission.id, user, "Submission created");
    Ok((StatusCode::CREATED, Json(submission)))
}

pub(crate) fn find_submission(state: &AppState, id: u64) -> Result<Submission> {
    state
        .store()
        .submission(id)
        .ok_or_else(|| AppError::NotFound(format!("Submission not found: {}", id)))
}

async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Submission>> {
    Ok(Json(find_submission(&state, id)?))
}

/// Replace the text; existing annotations re-anchor on the next render
async fn update_submission(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    UserId(user): UserId,
    Json(req): Json<UpdateSubmissionRequest>,
) -> Result<Json<SubmissionUpdated>> {
    find_submission(&state, id)?;
    if req.content.trim().is_empty() {
        return Err(AppError::BadRequest("Submission text is empty".to_string()));
    }

    let submission = state
        .store()
        .update_submission(id, user, req.title.as_deref(), &req.content)?;
    Ok(Json(SubmissionUpdated {
        message: MSG_SUBMISSION_UPDATED.to_string(),
        submission,
    }))
}

async fn get_stats(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<SubmissionStats>> {
    let submission = find_submission(&state, id)?;
    let stats = SubmissionStats::compute(&submission.content, submission.timecreated)?;
    Ok(Json(stats))
}

/// Selector triple for a selection of the sanitized text, with the
/// configured quote context length
async fn describe_selection(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<DescribeRequest>,
) -> Result<Json<SelectorTriple>> {
    let submission = find_submission(&state, id)?;
    let sanitized = sanitize_html(&submission.content)?;
    let doc = Document::parse_fragment(&sanitized).map_err(RenderError::from)?;
    let root = doc.root();

    let index = TextIndex::build(&doc, root);
    let (start, end) = index
        .point_at(req.start, false)
        .zip(index.point_at(req.end, true))
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Selection {}..{} is outside the text",
                req.start, req.end
            ))
        })?;

    let triple = describe(&doc, root, &DomRange::new(start, end), &state.config().anchoring())?;
    Ok(Json(triple))
}

/// Render the submission with every annotation highlighted
async fn get_annotated(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<RenderResult>> {
    let submission = find_submission(&state, id)?;
    let annotations = state.store().annotations_for(id, None);

    let result = {
        let categories = state.store().categories().read();
        render_annotated(
            &submission.content,
            &annotations,
            &categories,
            state.highlighter(),
        )?
    };

    if !result.failed_annotations.is_empty() {
        tracing::debug!(
            submission = id,
            failed = ?result.failed_annotations,
            "Some annotations could not be anchored"
        );
    }
    Ok(Json(result))
}
