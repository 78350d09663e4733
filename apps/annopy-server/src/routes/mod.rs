//! Route modules for the annopy server

pub mod annotation_types;
pub mod annotations;
pub mod health;
pub mod submissions;
pub mod templates;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::annotations::USER_HEADER;
use crate::error::AppError;

/// Acting user, taken from the `X-User-Id` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub u64);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_HEADER)
            .ok_or_else(|| AppError::BadRequest(format!("Missing {} header", USER_HEADER)))?;

        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .map(UserId)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid {} header", USER_HEADER)))
    }
}
