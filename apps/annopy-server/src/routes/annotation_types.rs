//! Annotation type (category) endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::UserId;
use crate::annotations::{AnnotationType, CategoryRegistry, Direction, Notice, MSG_TYPE_DELETED};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the annotation types router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_types).post(create_type))
        .route("/:id", put(update_type).delete(delete_type))
        .route("/:id/priority/:direction", post(move_type))
        .route("/from-template/:id", post(add_from_template))
        .route("/seed", post(seed_types))
}

#[derive(Debug, Deserialize)]
pub struct CreateTypeRequest {
    pub name: String,
    pub color: String,
}

/// Templates to seed from; the default templates when empty
#[derive(Debug, Default, Deserialize)]
pub struct SeedRequest {
    #[serde(default)]
    pub templates: Vec<u64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTypeRequest {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// Types in priority order
async fn list_types(State(state): State<AppState>) -> Json<Vec<AnnotationType>> {
    Json(state.store().categories().read().list().to_vec())
}

async fn create_type(
    State(state): State<AppState>,
    Json(req): Json<CreateTypeRequest>,
) -> Result<(StatusCode, Json<AnnotationType>)> {
    let created = state
        .store()
        .categories()
        .write()
        .add(&req.name, &req.color)?
        .clone();
    tracing::info!(id = created.id, name = %created.name, "Annotation type created");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_type(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<UpdateTypeRequest>,
) -> Result<Json<AnnotationType>> {
    let updated = state
        .store()
        .categories()
        .write()
        .update(id, req.name.as_deref(), req.color.as_deref())?
        .clone();
    Ok(Json(updated))
}

/// Remove a type; annotations using it keep their records
async fn delete_type(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Notice>> {
    let removed = state.store().categories().write().remove(id)?;
    tracing::info!(id, name = %removed.name, "Annotation type deleted");
    Ok(Json(Notice::new(MSG_TYPE_DELETED, None)))
}

/// Move a type one step up or down and return the new order
async fn move_type(
    State(state): State<AppState>,
    Path((id, direction)): Path<(u64, String)>,
) -> Result<Json<Vec<AnnotationType>>> {
    let direction: Direction = direction.parse()?;
    let mut categories = state.store().categories().write();
    categories.shift(id, direction)?;
    Ok(Json(categories.list().to_vec()))
}

/// Append a copy of a template at the lowest priority
async fn add_from_template(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    UserId(user): UserId,
) -> Result<(StatusCode, Json<AnnotationType>)> {
    let template = state.store().templates().read().usable(user, id)?;
    let added = state
        .store()
        .categories()
        .write()
        .add(&template.name, template.color.as_str())?
        .clone();
    tracing::info!(template = id, user, type_id = added.id, "Annotation type added from template");
    Ok((StatusCode::CREATED, Json(added)))
}

/// Fill an empty type list from templates, priorities following their order
async fn seed_types(
    State(state): State<AppState>,
    UserId(user): UserId,
    Json(req): Json<SeedRequest>,
) -> Result<Json<Vec<AnnotationType>>> {
    let templates = {
        let library = state.store().templates().read();
        if req.templates.is_empty() {
            library.defaults()
        } else {
            library.select(user, &req.templates)?
        }
    };

    let mut categories = state.store().categories().write();
    if !categories.is_empty() {
        return Err(AppError::BadRequest(
            "Annotation types already exist".to_string(),
        ));
    }
    *categories = CategoryRegistry::from_templates(&templates);
    tracing::info!(count = categories.len(), user, "Annotation types seeded");
    Ok(Json(categories.list().to_vec()))
}
