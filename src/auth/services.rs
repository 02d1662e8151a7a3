use std::sync::Arc;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        claims::Claims,
        dto::PublicUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::UserStore,
    },
    error::AppError,
    state::AppState,
};

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.-]{1,64}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

/// Signup, login and logout over a [`UserStore`].
///
/// No locking is done around login: two concurrent logins for one user both
/// succeed, and whichever saves last owns the active token.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.users.clone(), state.keys.clone())
    }
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    #[instrument(skip(self, password))]
    pub async fn signup(&self, username: &str, password: &str) -> Result<PublicUser, AppError> {
        let username = username.trim();
        if !is_valid_username(username) {
            warn!("invalid username");
            return Err(AppError::Validation(
                "Username must be 1-64 letters, digits, '_', '.' or '-'".into(),
            ));
        }
        if password.is_empty() {
            return Err(AppError::Validation("Password is required".into()));
        }

        if self.users.find_by_username(username).await?.is_some() {
            warn!("username already registered");
            return Err(AppError::Duplicate);
        }

        let hash = hash_password(password)?;
        // The store's unique constraint still catches a racing signup.
        let user = self.users.create(username, &hash).await?;

        info!(username = %user.username, "user registered");
        Ok(user.into())
    }

    /// Returns a fresh access token, replacing any previous session.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AppError> {
        let username = username.trim();
        let mut user = match self.users.find_by_username(username).await? {
            Some(u) => u,
            None => {
                warn!("login unknown username");
                return Err(AppError::NotFound("Account not found"));
            }
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(username = %user.username, "login invalid password");
            return Err(AppError::InvalidPassword);
        }

        let token = self.keys.issue(&user.username)?;
        user.active_token = Some(token.clone());
        self.users.save(&user).await?;

        info!(username = %user.username, "user logged in");
        Ok(token)
    }

    #[instrument(skip_all, fields(username = %claims.username))]
    pub async fn logout(&self, claims: &Claims) -> Result<(), AppError> {
        let mut user = self
            .users
            .find_by_username(&claims.username)
            .await?
            .ok_or_else(|| {
                AppError::Storage(anyhow::anyhow!(
                    "verified user {} missing from store",
                    claims.username
                ))
            })?;

        user.active_token = None;
        self.users.save(&user).await?;

        info!("user logged out");
        Ok(())
    }
}
