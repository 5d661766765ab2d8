// ABOUTME: Database connection management and schema initialization
// ABOUTME: Provides the shared SQLite pool used by every storage layer

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{debug, info};

use crate::{StorageError, StorageResult};

/// Connect to the default Questline database (~/.questline/questline.db)
pub async fn connect() -> StorageResult<SqlitePool> {
    connect_with_path(questline_core::database_path()).await
}

/// Connect to a SQLite database at the given path, creating it if needed.
/// Every pooled connection runs with WAL journaling and foreign keys
/// enforced; task-group deletion relies on the `ON DELETE CASCADE` rules.
pub async fn connect_with_path(database_path: impl AsRef<Path>) -> StorageResult<SqlitePool> {
    let database_path = database_path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = database_path.parent() {
        std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
    }

    debug!("Connecting to database: {}", database_path.display());

    let options = SqliteConnectOptions::new()
        .filename(database_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect_with(options)
        .await
        .map_err(StorageError::Sqlx)?;

    init_schema(&pool).await?;

    info!("Database connection established");
    Ok(pool)
}

/// Connect to a private in-memory database. The pool is capped at a single
/// connection because an in-memory SQLite database lives and dies with it.
pub async fn connect_memory() -> StorageResult<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(StorageError::Sqlx)?;

    init_schema(&pool).await?;
    Ok(pool)
}

/// Create the Questline tables if they do not exist yet
pub async fn init_schema(pool: &SqlitePool) -> StorageResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quests (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL DEFAULT 'draft',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(StorageError::Sqlx)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS task_groups (
            id TEXT PRIMARY KEY,
            quest_id TEXT NOT NULL REFERENCES quests(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            pub_time TEXT,
            order_idx INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(StorageError::Sqlx)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            group_id TEXT NOT NULL REFERENCES task_groups(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            question TEXT NOT NULL,
            answer TEXT,
            verification TEXT NOT NULL DEFAULT 'auto',
            hints TEXT,
            max_score INTEGER NOT NULL DEFAULT 0,
            order_idx INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(StorageError::Sqlx)?;

    // Ordered lookups within a container
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_task_groups_quest_order ON task_groups(quest_id, order_idx)",
    )
    .execute(pool)
    .await
    .map_err(StorageError::Sqlx)?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_group_order ON tasks(group_id, order_idx)")
        .execute(pool)
        .await
        .map_err(StorageError::Sqlx)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_creates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let pool = connect_with_path(dir.path().join("test.db")).await.unwrap();

        let tables: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(&pool)
                .await
                .unwrap();

        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert!(names.contains(&"quests"));
        assert!(names.contains(&"task_groups"));
        assert!(names.contains(&"tasks"));
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let pool = connect_memory().await.unwrap();
        init_schema(&pool).await.unwrap();
        init_schema(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_foreign_keys_are_enforced() {
        let pool = connect_memory().await.unwrap();
        let result = sqlx::query(
            "INSERT INTO task_groups (id, quest_id, name, order_idx, created_at, updated_at)
             VALUES ('g1', 'missing-quest', 'group', 0, '2024-01-01', '2024-01-01')",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }
}
