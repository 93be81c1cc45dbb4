use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,                           // unique user ID
    pub name: String,                       // display name
    pub email: String,                      // unique, as registered
    pub password_hash: String,              // Argon2 PHC string
    pub is_verified: bool,
    pub verification_token: Option<String>, // cleared once verified
    pub version: i64,                       // optimistic lock
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    /// A freshly registered, unverified user.
    pub fn pending(name: String, email: String, password_hash: String, token: String) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            is_verified: false,
            verification_token: Some(token),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to verified, dropping the stored token.
    pub fn mark_verified(&mut self) {
        self.is_verified = true;
        self.verification_token = None;
        self.updated_at = OffsetDateTime::now_utc();
    }
}
