//! Annopy Server Library
//!
//! Text submissions annotated with anchored, categorized highlights.
//! The server binary is in main.rs.
//!
//! # Modules
//!
//! - `dom`: arena document tree parsed from submission HTML
//! - `anchoring`: selector generation and resolution against a document
//! - `html`: highlight markers, sanitization and server-side rendering
//! - `annotations`: annotation records, categories, templates and stores
//! - `stats`: word, sentence and character counts of a submission
//! - `session`: interactive annotation of one document view
//! - `routes`: HTTP endpoints

pub mod anchoring;
pub mod annotations;
pub mod config;
pub mod dom;
pub mod error;
pub mod html;
pub mod routes;
pub mod session;
pub mod state;
pub mod stats;

use axum::Router;

use state::AppState;

/// Build the router with every endpoint mounted
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/health", routes::health::router())
        .nest("/api/v1/health", routes::health::router())
        .nest("/api/v1/submissions", routes::submissions::router())
        .nest("/api/v1/annotations", routes::annotations::router())
        .nest("/api/v1/types", routes::annotation_types::router())
        .nest("/api/v1/templates", routes::templates::router())
        .with_state(state)
}
