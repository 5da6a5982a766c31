//! PostgreSQL session store
//!
//! Identities and sessions live in two tables. `sessions.identity_id` is both
//! the primary key and a foreign key to `identities`, which gives the
//! single-session-per-identity shape and the `NotFound` on unknown identities.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

use crate::store::{SessionStore, StoreError};
use crate::{Identity, SessionRecord};

/// PostgreSQL session store
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Create a new store connection
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Backend(format!("PostgreSQL connection failed: {e}")))?;

        Ok(Self { pool })
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("Migration failed: {e}")))?;

        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to return
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Identity row from database
#[derive(Debug, FromRow)]
struct IdentityRow {
    id: Uuid,
    username: String,
    password_hash: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<IdentityRow> for Identity {
    fn from(row: IdentityRow) -> Self {
        Identity {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Session row from database
#[derive(Debug, FromRow)]
struct SessionRow {
    identity_id: Uuid,
    refresh_token: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    refresh_expires_at: DateTime<Utc>,
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        SessionRecord {
            identity_id: row.identity_id,
            refresh_token: row.refresh_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
            refresh_expires_at: row.refresh_expires_at,
        }
    }
}

/// Classify a sqlx error by constraint violation
fn map_sqlx_error(err: sqlx::Error, context: &str) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::AlreadyExists,
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StoreError::NotFound,
        _ => {
            tracing::debug!(error = %err, "{}", context);
            StoreError::Backend(format!("{context}: {err}"))
        }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create_identity(
        &self,
        username: &str,
        password_hash: &str,
        email: &str,
    ) -> Result<Uuid, StoreError> {
        let row: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO identities (id, username, password_hash, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to create identity"))?;

        Ok(row.0)
    }

    async fn find_identity_by_username(&self, username: &str) -> Result<Identity, StoreError> {
        let row: Option<IdentityRow> = sqlx::query_as(
            r#"
            SELECT id, username, password_hash, email, created_at, updated_at
            FROM identities
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to get identity by username"))?;

        row.map(Identity::from).ok_or(StoreError::NotFound)
    }

    async fn fetch_password_hash(&self, identity_id: Uuid) -> Result<String, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT password_hash FROM identities WHERE id = $1")
                .bind(identity_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e, "Failed to get password hash"))?;

        row.map(|(hash,)| hash).ok_or(StoreError::NotFound)
    }

    async fn put_session(
        &self,
        identity_id: Uuid,
        refresh_token: &str,
        refresh_expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (identity_id, refresh_token, created_at, updated_at, refresh_expires_at)
            VALUES ($1, $2, NOW(), NOW(), $3)
            ON CONFLICT (identity_id) DO UPDATE
            SET refresh_token = EXCLUDED.refresh_token,
                created_at = NOW(),
                updated_at = NOW(),
                refresh_expires_at = EXCLUDED.refresh_expires_at
            "#,
        )
        .bind(identity_id)
        .bind(refresh_token)
        .bind(refresh_expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to store session"))?;

        Ok(())
    }

    async fn get_session(&self, identity_id: Uuid) -> Result<SessionRecord, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT identity_id, refresh_token, created_at, updated_at, refresh_expires_at
            FROM sessions
            WHERE identity_id = $1
            "#,
        )
        .bind(identity_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to get session"))?;

        row.map(SessionRecord::from).ok_or(StoreError::NotFound)
    }

    async fn compare_and_swap_session(
        &self,
        identity_id: Uuid,
        expected: &str,
        new_token: &str,
    ) -> Result<(), StoreError> {
        // Comparison and update happen in one statement.
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET refresh_token = $1, updated_at = NOW()
            WHERE identity_id = $2 AND refresh_token = $3
            "#,
        )
        .bind(new_token)
        .bind(identity_id)
        .bind(expected)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to rotate session"))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM sessions WHERE identity_id = $1)")
                .bind(identity_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e, "Failed to check session"))?;

        if exists.0 {
            Err(StoreError::Conflict)
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn delete_session(&self, identity_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE identity_id = $1")
            .bind(identity_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to delete session"))?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Ping failed"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn connect() -> PgSessionStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let store = PgSessionStore::connect(&url, 2).await.unwrap();
        store.migrate().await.unwrap();
        store
    }

    fn unique_username() -> String {
        format!("user_{}", Uuid::new_v4().simple())
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn test_identity_roundtrip() {
        let store = connect().await;
        let username = unique_username();

        let id = store
            .create_identity(&username, "hash", "a@x.com")
            .await
            .unwrap();
        let identity = store.find_identity_by_username(&username).await.unwrap();

        assert_eq!(identity.id, id);
        assert_eq!(store.fetch_password_hash(id).await.unwrap(), "hash");
        assert_eq!(
            store.create_identity(&username, "hash", "b@x.com").await,
            Err(StoreError::AlreadyExists)
        );
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn test_session_lifecycle() {
        let store = connect().await;
        let id = store
            .create_identity(&unique_username(), "hash", "a@x.com")
            .await
            .unwrap();
        let window = Utc::now() + Duration::days(30);

        store.put_session(id, "r1", window).await.unwrap();
        store.put_session(id, "r2", window).await.unwrap();
        assert_eq!(store.get_session(id).await.unwrap().refresh_token, "r2");

        assert_eq!(
            store.compare_and_swap_session(id, "r1", "r3").await,
            Err(StoreError::Conflict)
        );
        store.compare_and_swap_session(id, "r2", "r3").await.unwrap();
        assert_eq!(store.get_session(id).await.unwrap().refresh_token, "r3");

        store.delete_session(id).await.unwrap();
        store.delete_session(id).await.unwrap();
        assert_eq!(store.get_session(id).await, Err(StoreError::NotFound));
        assert_eq!(
            store.compare_and_swap_session(id, "r3", "r4").await,
            Err(StoreError::NotFound)
        );
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn test_put_session_unknown_identity() {
        let store = connect().await;
        assert_eq!(
            store
                .put_session(Uuid::new_v4(), "r1", Utc::now() + Duration::days(1))
                .await,
            Err(StoreError::NotFound)
        );
    }
}
