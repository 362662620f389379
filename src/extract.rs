//! Request extractors.

use std::borrow::Cow;

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::AppError;

/// JSON body that has been deserialized *and* validated.
///
/// Handlers taking a `ValidatedJson<T>` never run for bodies that fail
/// either step, so no persistence work happens for invalid input.
///
/// # Rejections
///
/// - malformed JSON, missing `Content-Type` → `AppError::InvalidRequest` (400)
/// - well-formed JSON of the wrong shape → `AppError::Validation` on `body` (422)
/// - `Validate` failures → `AppError::Validation` per field (422)
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;

        value.validate().map_err(|errors| {
            tracing::warn!(%errors, "request body failed validation");
            AppError::Validation(errors)
        })?;

        Ok(Self(value))
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let mut errors = ValidationErrors::new();
            errors.add(
                "body",
                ValidationError::new("invalid_type").with_message(Cow::Owned(err.body_text())),
            );
            AppError::Validation(errors)
        }
        other => AppError::InvalidRequest(other.body_text()),
    }
}

/// Path parameters whose rejection is an `AppError::InvalidRequest` (400),
/// so a malformed ID answers with the usual JSON error body.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;

        Ok(Self(value))
    }
}
