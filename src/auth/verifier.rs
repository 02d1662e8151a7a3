use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{debug, instrument, warn};

use crate::{
    auth::{claims::Claims, jwt::JwtKeys, repo::UserStore},
    error::{AppError, TokenError},
    state::AppState,
};

/// Validates presented bearer tokens against the signing key and the
/// per-user active token.
#[derive(Clone)]
pub struct TokenVerifier {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl FromRef<AppState> for TokenVerifier {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.users.clone(), state.keys.clone())
    }
}

/// Strips an optional `Bearer` scheme (any case). Returns `None` when nothing
/// is left, so a bare `"Bearer "` counts as no token at all.
pub fn normalize(header: &str) -> Option<&str> {
    let header = header.trim();
    let token = match header.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if header.eq_ignore_ascii_case("bearer") => "",
        _ => header,
    };
    (!token.is_empty()).then_some(token)
}

impl TokenVerifier {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    /// Store membership is checked before the signature and expiry, so a
    /// logged-out or replaced token is always reported as unknown.
    #[instrument(skip_all)]
    pub async fn verify(&self, authorization: Option<&str>) -> Result<Claims, AppError> {
        let token = authorization
            .and_then(normalize)
            .ok_or(TokenError::Missing)?;

        let user = match self.users.find_by_active_token(token).await? {
            Some(u) => u,
            None => {
                warn!("token is not an active session");
                return Err(TokenError::Unknown.into());
            }
        };

        let claims = self.keys.decode(token).map_err(|e| {
            warn!(username = %user.username, error = %e, "token rejected");
            e
        })?;

        if claims.username != user.username {
            warn!(username = %user.username, claimed = %claims.username, "claim does not match session owner");
            return Err(TokenError::InvalidSignature.into());
        }

        debug!(username = %claims.username, "token verified");
        Ok(claims)
    }
}
