//! Request extractors.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use bankwire_core::IdempotencyKey;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// Name of the optional header carrying a client idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// JSON body that has passed field validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// The `Idempotency-Key` header, if the client sent one.
#[derive(Debug, Clone, Default)]
pub struct OptionalIdempotencyKey(pub Option<IdempotencyKey>);

impl<S> FromRequestParts<S> for OptionalIdempotencyKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(IDEMPOTENCY_KEY_HEADER) else {
            return Ok(Self(None));
        };

        value
            .to_str()
            .ok()
            .and_then(IdempotencyKey::new)
            .map(|key| Self(Some(key)))
            .ok_or_else(|| {
                ApiError::invalid(format!(
                    "Idempotency-Key must be 1 to {} visible characters",
                    IdempotencyKey::MAX_LEN
                ))
            })
    }
}
