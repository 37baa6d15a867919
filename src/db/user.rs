//! Credential storage: users, password hashes and the current refresh token.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// A stored user. The password hash never leaves the server.
#[derive(Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub refresh_token: Option<String>,
    pub refresh_token_expires_at: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    refresh_token: Option<String>,
    refresh_token_expires_at: Option<i64>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            refresh_token: row.refresh_token,
            refresh_token_expires_at: row.refresh_token_expires_at,
        }
    }
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user. Returns the user ID.
    pub async fn create(&self, email: &str, password_hash: &str) -> Result<i64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO users (email, password_hash) VALUES (?, ?)")
            .bind(email)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, password_hash, refresh_token, refresh_token_expires_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, password_hash, refresh_token, refresh_token_expires_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Check if an email is not yet registered.
    pub async fn is_email_available(&self, email: &str) -> Result<bool, sqlx::Error> {
        let count: (i32,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 == 0)
    }

    /// Replace the user's current refresh token. The previous value stops being valid.
    pub async fn set_refresh_token(
        &self,
        id: i64,
        token: &str,
        expires_at: u64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = ?, refresh_token_expires_at = ? WHERE id = ?",
        )
        .bind(token)
        .bind(expires_at as i64)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Forget the user's refresh token (logout).
    pub async fn clear_refresh_token(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = NULL, refresh_token_expires_at = NULL WHERE id = ?",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear refresh tokens that expired before `now` (Unix seconds).
    pub async fn clear_expired_refresh_tokens(&self, now: u64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = NULL, refresh_token_expires_at = NULL
             WHERE refresh_token IS NOT NULL AND refresh_token_expires_at < ?",
        )
        .bind(now as i64)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete a user by ID. Their todos go with them.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[tokio::test]
    async fn test_set_refresh_token_overwrites_previous() {
        let db = Database::open(":memory:").await.unwrap();
        let id = db.users().create("alice@example.com", "hash").await.unwrap();

        db.users().set_refresh_token(id, "first", 100).await.unwrap();
        db.users().set_refresh_token(id, "second", 200).await.unwrap();

        let user = db.users().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.refresh_token.as_deref(), Some("second"));
        assert_eq!(user.refresh_token_expires_at, Some(200));
    }

    #[tokio::test]
    async fn test_clear_refresh_token_is_idempotent() {
        let db = Database::open(":memory:").await.unwrap();
        let id = db.users().create("alice@example.com", "hash").await.unwrap();
        db.users().set_refresh_token(id, "token", 100).await.unwrap();

        assert!(db.users().clear_refresh_token(id).await.unwrap());
        assert!(db.users().clear_refresh_token(id).await.unwrap());

        let user = db.users().get_by_id(id).await.unwrap().unwrap();
        assert!(user.refresh_token.is_none());
        assert!(user.refresh_token_expires_at.is_none());
    }

    #[tokio::test]
    async fn test_clear_expired_refresh_tokens() {
        let db = Database::open(":memory:").await.unwrap();
        let stale = db.users().create("stale@example.com", "hash").await.unwrap();
        let fresh = db.users().create("fresh@example.com", "hash").await.unwrap();

        db.users().set_refresh_token(stale, "old", 1_000).await.unwrap();
        db.users().set_refresh_token(fresh, "new", 5_000).await.unwrap();

        let cleared = db.users().clear_expired_refresh_tokens(2_000).await.unwrap();
        assert_eq!(cleared, 1);

        let stale = db.users().get_by_id(stale).await.unwrap().unwrap();
        let fresh = db.users().get_by_id(fresh).await.unwrap().unwrap();
        assert!(stale.refresh_token.is_none());
        assert_eq!(fresh.refresh_token.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_get_by_email_is_case_insensitive() {
        let db = Database::open(":memory:").await.unwrap();
        let id = db.users().create("alice@example.com", "hash").await.unwrap();

        let user = db
            .users()
            .get_by_email("Alice@Example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, id);
    }
}
