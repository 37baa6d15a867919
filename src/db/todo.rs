//! Todo storage. Every query is scoped to the owning user.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct TodoStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Todo {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct TodoChanges<'a> {
    pub title: Option<&'a str>,
    pub completed: Option<bool>,
}

impl TodoStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List a user's todos in creation order.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Todo>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, user_id, title, completed, created_at, updated_at FROM todos WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Get a todo only if it belongs to `user_id`.
    pub async fn get_for_user(&self, id: i64, user_id: i64) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, user_id, title, completed, created_at, updated_at FROM todos WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Create a todo. Returns `None` if `user_id` does not name an existing user.
    pub async fn create(&self, user_id: i64, title: &str) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as(
            "INSERT INTO todos (user_id, title) SELECT id, ? FROM users WHERE id = ?
             RETURNING id, user_id, title, completed, created_at, updated_at",
        )
        .bind(title)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Apply `changes` to a todo owned by `user_id`.
    /// Returns the updated todo, or `None` if the owner lookup fails.
    pub async fn update(
        &self,
        id: i64,
        user_id: i64,
        changes: TodoChanges<'_>,
    ) -> Result<Option<Todo>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<Todo> = sqlx::query_as(
            "SELECT id, user_id, title, completed, created_at, updated_at FROM todos WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        let title = changes.title.unwrap_or(&existing.title);
        let completed = changes.completed.unwrap_or(existing.completed);

        let updated: Todo = sqlx::query_as(
            "UPDATE todos SET title = ?, completed = ?, updated_at = datetime('now') WHERE id = ?
             RETURNING id, user_id, title, completed, created_at, updated_at",
        )
        .bind(title)
        .bind(completed)
        .bind(existing.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// Delete a todo owned by `user_id`. Returns false if the owner lookup fails.
    pub async fn delete(&self, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<(i64,)> = sqlx::query_as("SELECT id FROM todos WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some((owned_id,)) = owned else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(owned_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
