use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use tracing::warn;

pub const CALLER_ID_HEADER: &str = "x-user-id";

/// Caller identity taken from the `x-user-id` header.
///
/// The value is trusted as-is: nothing binds it to a session or credential,
/// so any client can claim any id. Only the self-service password change uses
/// it, and that route still demands the current password.
pub struct CallerId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CALLER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                format!("Missing {CALLER_ID_HEADER} header"),
            ))?;

        let id = raw.trim().parse::<i64>().map_err(|_| {
            warn!(value = %raw, "malformed caller id header");
            (
                StatusCode::UNAUTHORIZED,
                format!("Invalid {CALLER_ID_HEADER} header"),
            )
        })?;

        Ok(CallerId(id))
    }
}
