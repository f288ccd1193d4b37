use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use uuid::Uuid;

/// Requesting user's id, taken from the `X-User-Id` header that the
/// fronting gateway injects after authenticating the request.
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub user_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for UserIdentity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get("x-user-id").ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing X-User-Id header".to_string(),
        ))?;

        let value = header.to_str().map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                "Invalid X-User-Id header".to_string(),
            )
        })?;

        let user_id = Uuid::parse_str(value).map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                "X-User-Id is not a valid UUID".to_string(),
            )
        })?;

        Ok(UserIdentity { user_id })
    }
}
