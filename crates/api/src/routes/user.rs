//! Caller identity extractor

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Id of the calling user, read from the `x-user-id` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized(format!("missing {USER_ID_HEADER} header")))?;
        let user_id = value
            .to_str()
            .map(str::trim)
            .map_err(|_| ApiError::bad_request(format!("{USER_ID_HEADER} must be visible ASCII")))?;

        if user_id.is_empty() {
            return Err(ApiError::unauthorized(format!("empty {USER_ID_HEADER} header")));
        }
        Ok(Self(user_id.to_string()))
    }
}
