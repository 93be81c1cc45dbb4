use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::repo_types::User;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    Duplicate,
    #[error("user record was modified concurrently")]
    Conflict,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence for user records. `insert` must enforce email uniqueness itself,
/// a prior `find_by_email` is not enough under concurrency.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn insert(&self, user: &User) -> Result<(), StoreError>;
    /// Compare-and-swap on `version`; returns the stored record with the bumped version.
    async fn update(&self, user: &User) -> Result<User, StoreError>;
}

const USER_COLUMNS: &str = "id, name, email, password_hash, is_verified, verification_token, \
                            version, created_at, updated_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users
                (id, name, email, password_hash, is_verified, verification_token,
                 version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_verified)
        .bind(&user.verification_token)
        .bind(user.version)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.db)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = $3, is_verified = $4, verification_token = $5,
                updated_at = $6, version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(user.version)
        .bind(&user.name)
        .bind(user.is_verified)
        .bind(&user.verification_token)
        .bind(user.updated_at)
        .fetch_optional(&self.db)
        .await?;
        updated.ok_or(StoreError::Conflict)
    }
}

/// Process-local store keyed by email. Used when no database is configured.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(StoreError::Duplicate);
        }
        users.insert(user.email.clone(), user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let stored = users
            .get_mut(&user.email)
            .filter(|stored| stored.id == user.id && stored.version == user.version)
            .ok_or(StoreError::Conflict)?;
        stored.name = user.name.clone();
        stored.is_verified = user.is_verified;
        stored.verification_token = user.verification_token.clone();
        stored.updated_at = OffsetDateTime::now_utc();
        stored.version += 1;
        Ok(stored.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(email: &str) -> User {
        User::pending("Alice".into(), email.into(), "hash".into(), "tok".into())
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email_without_overwriting() {
        let store = MemoryUserStore::new();
        let first = sample("a@x.com");
        store.insert(&first).await.expect("first insert");

        let mut second = sample("a@x.com");
        second.name = "Mallory".into();
        let err = store.insert(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));

        let stored = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.name, "Alice");
    }

    #[tokio::test]
    async fn email_lookup_is_case_sensitive() {
        let store = MemoryUserStore::new();
        store.insert(&sample("a@x.com")).await.unwrap();
        assert!(store.find_by_email("A@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_bumps_version_and_rejects_stale_writes() {
        let store = MemoryUserStore::new();
        let user = sample("a@x.com");
        store.insert(&user).await.unwrap();

        let mut verified = user.clone();
        verified.mark_verified();
        let stored = store.update(&verified).await.expect("update");
        assert_eq!(stored.version, 1);
        assert!(stored.is_verified);
        assert!(stored.verification_token.is_none());

        // second writer still holds version 0
        let err = store.update(&verified).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[tokio::test]
    async fn find_by_id_returns_inserted_user() {
        let store = MemoryUserStore::new();
        let user = sample("b@x.com");
        store.insert(&user).await.unwrap();
        let found = store.find_by_id(user.id).await.unwrap().expect("found");
        assert_eq!(found.email, "b@x.com");
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }
}
