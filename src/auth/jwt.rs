use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error};
use uuid::Uuid;

use crate::{
    auth::claims::Claims,
    config::JwtConfig,
    error::{AppError, TokenError},
};

/// HS256 signing and verification keys, built once from [`JwtConfig`].
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TimeDuration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: TimeDuration::seconds(cfg.ttl_minutes.clamp(0, i64::MAX / 60) * 60),
        }
    }

    /// Mints a token for `username`, valid from now for the configured TTL.
    pub fn issue(&self, username: &str) -> Result<String, AppError> {
        self.issue_at(username, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(&self, username: &str, now: OffsetDateTime) -> Result<String, AppError> {
        let exp = now.checked_add(self.ttl).ok_or_else(|| {
            error!(ttl = %self.ttl, "token expiry out of range");
            AppError::Issuance("expiry out of range".into())
        })?;
        let claims = Claims {
            username: username.to_string(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            jti: Uuid::new_v4(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            error!(error = %e, "jwt encode failed");
            AppError::Issuance(e.to_string())
        })?;
        debug!(username = %username, "jwt signed");
        Ok(token)
    }

    /// Checks the signature and expiry of `token` and returns its claims.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidSignature,
            }
        })?;
        debug!(username = %data.claims.username, "jwt verified");
        Ok(data.claims)
    }
}
