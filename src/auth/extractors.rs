use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use tracing::warn;

use super::{claims::Claims, verifier::TokenVerifier};
use crate::error::{AppError, TokenError};

/// Verified caller identity. Rejects with 401 when no token is sent and 403
/// when the token is unknown, expired, forged or unreadable.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenVerifier: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(axum::http::header::AUTHORIZATION) {
            Some(value) => Some(value.to_str().map_err(|_| {
                warn!("authorization header is not valid text");
                TokenError::InvalidSignature
            })?),
            None => None,
        };

        let claims = TokenVerifier::from_ref(state).verify(header).await?;
        Ok(AuthUser(claims))
    }
}
