//! SQLite database layer (embedded, no external dependencies)

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use taskhub_types::Task;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_path: &str) -> Result<Self> {
        tracing::info!("Opening SQLite database at: {}", database_path);

        // Create parent directory if needed
        if let Some(parent) = std::path::Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| {
                format!("Failed to connect to SQLite database at: {}", database_path)
            })?;

        Self::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        Ok(Self { pool })
    }

    /// Open an in-memory database (for tests). A single pooled connection
    /// that never expires, so the database outlives individual queries.
    pub async fn new_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory SQLite database")?;

        Self::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        Ok(Self { pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'Pending',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Insert a task and return the generated id.
    ///
    /// A missing name is bound as SQL NULL; the NOT NULL constraint surfaces
    /// it as a store error rather than a handler-level validation failure.
    pub async fn create_task(&self, name: Option<&str>, status: &str) -> sqlx::Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO tasks (name, status) VALUES (?1, ?2)
            "#,
        )
        .bind(name)
        .bind(status)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Full table contents, no filtering or pagination.
    pub async fn list_tasks(&self) -> sqlx::Result<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            r#"
            SELECT id, name, status, created_at FROM tasks
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub async fn get_task(&self, id: i64) -> sqlx::Result<Option<Task>> {
        let row: Option<TaskRow> = sqlx::query_as(
            r#"
            SELECT id, name, status, created_at FROM tasks WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    /// Full replace of name and status. Returns false when the id does not
    /// exist (zero rows affected). Missing fields are bound as SQL NULL and
    /// surface as a store error, the same passthrough as create.
    pub async fn update_task(
        &self,
        id: i64,
        name: Option<&str>,
        status: Option<&str>,
    ) -> sqlx::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tasks SET name = ?1, status = ?2 WHERE id = ?3
            "#,
        )
        .bind(name)
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns false when the id does not exist (zero rows affected).
    pub async fn delete_task(&self, id: i64) -> sqlx::Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM tasks WHERE id = ?1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

// Helper struct for sqlx query_as
#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i64,
    name: String,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<TaskRow> for Task {
    fn from(r: TaskRow) -> Self {
        Task {
            id: r.id,
            name: r.name,
            status: r.status,
            created_at: r.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_assigns_unique_retrievable_ids() {
        let db = Database::new_in_memory().await.unwrap();

        let first = db.create_task(Some("Buy milk"), "Pending").await.unwrap();
        let second = db.create_task(Some("Walk dog"), "Done").await.unwrap();
        assert_ne!(first, second);

        let task = db.get_task(first).await.unwrap().unwrap();
        assert_eq!(task.id, first);
        assert_eq!(task.name, "Buy milk");
        assert_eq!(task.status, "Pending");
    }

    #[tokio::test]
    async fn missing_name_is_a_store_error() {
        let db = Database::new_in_memory().await.unwrap();

        let result = db.create_task(None, "Pending").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn update_replaces_name_and_status() {
        let db = Database::new_in_memory().await.unwrap();

        let id = db.create_task(Some("Buy milk"), "Pending").await.unwrap();
        let updated = db
            .update_task(id, Some("Buy oat milk"), Some("Done"))
            .await
            .unwrap();
        assert!(updated);

        let task = db.get_task(id).await.unwrap().unwrap();
        assert_eq!(task.name, "Buy oat milk");
        assert_eq!(task.status, "Done");
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_ids() {
        let db = Database::new_in_memory().await.unwrap();

        assert!(!db.update_task(999, Some("x"), Some("Done")).await.unwrap());
        assert!(!db.delete_task(999).await.unwrap());
    }

    #[tokio::test]
    async fn missing_update_field_is_a_store_error() {
        let db = Database::new_in_memory().await.unwrap();

        let id = db.create_task(Some("Buy milk"), "Pending").await.unwrap();
        let result = db.update_task(id, Some("Buy milk"), None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn list_reflects_creates_and_deletes() {
        let db = Database::new_in_memory().await.unwrap();

        let first = db.create_task(Some("Buy milk"), "Pending").await.unwrap();
        let second = db.create_task(Some("Walk dog"), "Pending").await.unwrap();
        assert!(db.delete_task(first).await.unwrap());

        let tasks = db.list_tasks().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, second);

        assert!(db.get_task(first).await.unwrap().is_none());
    }
}
