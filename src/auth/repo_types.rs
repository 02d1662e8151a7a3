use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database. Never serialized directly; responses go
/// through `PublicUser`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub username: String,             // unique, case-sensitive
    pub password_hash: String,        // Argon2 PHC string
    pub active_token: Option<String>, // the one bearer token currently accepted
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
