//! API route handlers

pub mod bets;
pub mod health;
pub mod markets;
pub mod users;

use crate::error::{ApiError, FieldError};
use axum::extract::{FromRequest, FromRequestParts};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// `Json` whose rejections (bad syntax, wrong content type) render as [`ApiError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Path` whose rejections (e.g. a non-numeric id) render as [`ApiError`]
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Decode a JSON body into a payload, reporting shape errors as 400s
pub(crate) fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| {
        ApiError::invalid_fields(vec![FieldError::new("body", e.to_string())])
    })
}

/// Run a field validator and map its failures to a 400
pub(crate) fn check<T>(
    payload: &T,
    validate: fn(&T) -> Result<(), Vec<FieldError>>,
) -> Result<(), ApiError> {
    validate(payload).map_err(ApiError::invalid_fields)
}
