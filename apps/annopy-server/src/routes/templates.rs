//! Annotation type template endpoints
//!
//! Default templates are visible to everyone. Custom templates are only
//! listed for, and changed by, the user who created them.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use super::UserId;
use crate::annotations::{AnnotationTypeTemplate, TemplateChanges};
use crate::error::Result;
use crate::state::AppState;

/// Create the templates router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_templates).post(create_template))
        .route("/:id", put(update_template).delete(delete_template))
}

#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub color: String,
    #[serde(default, rename = "defaulttype")]
    pub default_type: bool,
}

async fn list_templates(
    State(state): State<AppState>,
    UserId(user): UserId,
) -> Json<Vec<AnnotationTypeTemplate>> {
    let templates = state.store().templates().read();
    Json(templates.available(user).into_iter().cloned().collect())
}

async fn create_template(
    State(state): State<AppState>,
    UserId(user): UserId,
    Json(req): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<AnnotationTypeTemplate>)> {
    let created = state
        .store()
        .templates()
        .write()
        .add(user, &req.name, &req.color, req.default_type)?
        .clone();
    tracing::info!(id = created.id, user, default = created.default_type, "Template created");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    UserId(user): UserId,
    Json(changes): Json<TemplateChanges>,
) -> Result<Json<AnnotationTypeTemplate>> {
    let updated = state
        .store()
        .templates()
        .write()
        .update(user, id, &changes)?
        .clone();
    Ok(Json(updated))
}

async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    UserId(user): UserId,
) -> Result<Json<AnnotationTypeTemplate>> {
    let removed = state.store().templates().write().remove(user, id)?;
    tracing::info!(id, user, "Template deleted");
    Ok(Json(removed))
}
