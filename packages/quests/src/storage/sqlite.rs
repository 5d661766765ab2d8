// ABOUTME: SQLite storage for quests, task groups, and tasks
// ABOUTME: Transactional store used by the reconciliation engine, plus quest CRUD

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tokio::sync::Mutex;
use tracing::debug;

use questline_core::{
    generate_id, Quest, QuestCreateInput, Task, TaskCreateInput, TaskGroup, TaskGroupCreateInput,
    TaskGroupUpdateInput, TaskUpdateInput,
};
use questline_storage::{StorageError, StorageResult};

use super::OrderedStore;

/// Quest-level CRUD against the shared pool
pub struct QuestStorage {
    pool: SqlitePool,
}

impl QuestStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_quest(&self, input: QuestCreateInput) -> StorageResult<Quest> {
        let quest_id = generate_id();
        let now = Utc::now();
        let status = input.status.unwrap_or_default();

        debug!("Creating quest: {}", quest_id);

        sqlx::query(
            r#"
            INSERT INTO quests (id, name, description, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&quest_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&status)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        self.get_quest(&quest_id).await?.ok_or_else(|| {
            StorageError::Database(format!("quest '{quest_id}' vanished after insert"))
        })
    }

    pub async fn get_quest(&self, quest_id: &str) -> StorageResult<Option<Quest>> {
        let row = sqlx::query("SELECT * FROM quests WHERE id = ?")
            .bind(quest_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        row.as_ref().map(row_to_quest).transpose()
    }

    pub async fn list_quests(&self) -> StorageResult<Vec<Quest>> {
        let rows = sqlx::query("SELECT * FROM quests ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_quest).collect()
    }

    /// Committed task groups of a quest, ordered
    pub async fn list_task_groups(&self, quest_id: &str) -> StorageResult<Vec<TaskGroup>> {
        let rows = sqlx::query("SELECT * FROM task_groups WHERE quest_id = ? ORDER BY order_idx")
            .bind(quest_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_task_group).collect()
    }

    /// Committed tasks of a group, ordered
    pub async fn list_tasks(&self, group_id: &str) -> StorageResult<Vec<Task>> {
        let rows = sqlx::query("SELECT * FROM tasks WHERE group_id = ? ORDER BY order_idx")
            .bind(group_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_task).collect()
    }

    pub async fn delete_quest(&self, quest_id: &str) -> StorageResult<()> {
        debug!("Deleting quest: {}", quest_id);

        let result = sqlx::query("DELETE FROM quests WHERE id = ?")
            .bind(quest_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("quest '{quest_id}'")));
        }
        Ok(())
    }
}

/// One SQLite transaction wrapping a whole bulk reconciliation. Implements
/// the ordered-store interface for both collections (task groups within a
/// quest, tasks within a group); `commit` or `rollback` consumes it.
pub struct SqliteQuestTx {
    tx: Mutex<Transaction<'static, Sqlite>>,
}

impl SqliteQuestTx {
    pub async fn begin(pool: &SqlitePool) -> StorageResult<Self> {
        let tx = pool.begin().await.map_err(StorageError::Sqlx)?;
        Ok(Self { tx: Mutex::new(tx) })
    }

    pub async fn commit(self) -> StorageResult<()> {
        self.tx
            .into_inner()
            .commit()
            .await
            .map_err(StorageError::Sqlx)
    }

    pub async fn rollback(self) -> StorageResult<()> {
        self.tx
            .into_inner()
            .rollback()
            .await
            .map_err(StorageError::Sqlx)
    }
}

#[async_trait]
impl OrderedStore<TaskGroup> for SqliteQuestTx {
    type CreateFields = TaskGroupCreateInput;
    type UpdateFields = TaskGroupUpdateInput;

    async fn container_exists(&self, quest_id: &str) -> StorageResult<bool> {
        let mut tx = self.tx.lock().await;
        let row = sqlx::query("SELECT 1 FROM quests WHERE id = ?")
            .bind(quest_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(StorageError::Sqlx)?;
        Ok(row.is_some())
    }

    async fn list_items(&self, quest_id: &str) -> StorageResult<Vec<TaskGroup>> {
        debug!("Fetching task groups for quest: {}", quest_id);

        let mut tx = self.tx.lock().await;
        let rows = sqlx::query("SELECT * FROM task_groups WHERE quest_id = ? ORDER BY order_idx")
            .bind(quest_id)
            .fetch_all(&mut **tx)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_task_group).collect()
    }

    async fn delete_item(&self, id: &str) -> StorageResult<()> {
        debug!("Deleting task group: {}", id);

        let mut tx = self.tx.lock().await;
        sqlx::query("DELETE FROM task_groups WHERE id = ?")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(StorageError::Sqlx)?;
        Ok(())
    }

    async fn update_item(
        &self,
        id: &str,
        order_idx: i64,
        input: &TaskGroupUpdateInput,
    ) -> StorageResult<TaskGroup> {
        debug!("Updating task group: {}", id);

        // Build dynamic UPDATE query based on provided fields
        let mut query = String::from("UPDATE task_groups SET updated_at = ?, order_idx = ?");
        if input.name.is_some() {
            query.push_str(", name = ?");
        }
        if input.pub_time.is_some() {
            query.push_str(", pub_time = ?");
        }
        query.push_str(" WHERE id = ?");

        let now = Utc::now();
        let mut q = sqlx::query(&query).bind(now).bind(order_idx);
        if let Some(name) = &input.name {
            q = q.bind(name);
        }
        if let Some(pub_time) = &input.pub_time {
            q = q.bind(pub_time);
        }
        q = q.bind(id);

        let mut tx = self.tx.lock().await;
        let result = q.execute(&mut **tx).await.map_err(StorageError::Sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("task group '{id}'")));
        }

        let row = sqlx::query("SELECT * FROM task_groups WHERE id = ?")
            .bind(id)
            .fetch_one(&mut **tx)
            .await
            .map_err(StorageError::Sqlx)?;
        row_to_task_group(&row)
    }

    async fn create_item(
        &self,
        quest_id: &str,
        order_idx: i64,
        input: &TaskGroupCreateInput,
    ) -> StorageResult<TaskGroup> {
        let group_id = generate_id();
        let now = Utc::now();

        debug!("Creating task group: {} for quest: {}", group_id, quest_id);

        let mut tx = self.tx.lock().await;
        sqlx::query(
            r#"
            INSERT INTO task_groups (id, quest_id, name, pub_time, order_idx, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&group_id)
        .bind(quest_id)
        .bind(&input.name)
        .bind(input.pub_time)
        .bind(order_idx)
        .bind(now)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(StorageError::Sqlx)?;

        let row = sqlx::query("SELECT * FROM task_groups WHERE id = ?")
            .bind(&group_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(StorageError::Sqlx)?;
        row_to_task_group(&row)
    }
}

#[async_trait]
impl OrderedStore<Task> for SqliteQuestTx {
    type CreateFields = TaskCreateInput;
    type UpdateFields = TaskUpdateInput;

    async fn container_exists(&self, group_id: &str) -> StorageResult<bool> {
        let mut tx = self.tx.lock().await;
        let row = sqlx::query("SELECT 1 FROM task_groups WHERE id = ?")
            .bind(group_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(StorageError::Sqlx)?;
        Ok(row.is_some())
    }

    async fn list_items(&self, group_id: &str) -> StorageResult<Vec<Task>> {
        debug!("Fetching tasks for group: {}", group_id);

        let mut tx = self.tx.lock().await;
        let rows = sqlx::query("SELECT * FROM tasks WHERE group_id = ? ORDER BY order_idx")
            .bind(group_id)
            .fetch_all(&mut **tx)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_task).collect()
    }

    async fn delete_item(&self, id: &str) -> StorageResult<()> {
        debug!("Deleting task: {}", id);

        let mut tx = self.tx.lock().await;
        sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(StorageError::Sqlx)?;
        Ok(())
    }

    async fn update_item(
        &self,
        id: &str,
        order_idx: i64,
        input: &TaskUpdateInput,
    ) -> StorageResult<Task> {
        debug!("Updating task: {}", id);

        // Build dynamic UPDATE query based on provided fields
        let mut query = String::from("UPDATE tasks SET updated_at = ?, order_idx = ?");
        if input.name.is_some() {
            query.push_str(", name = ?");
        }
        if input.question.is_some() {
            query.push_str(", question = ?");
        }
        if input.answer.is_some() {
            query.push_str(", answer = ?");
        }
        if input.verification.is_some() {
            query.push_str(", verification = ?");
        }
        if input.hints.is_some() {
            query.push_str(", hints = ?");
        }
        if input.max_score.is_some() {
            query.push_str(", max_score = ?");
        }
        query.push_str(" WHERE id = ?");

        let now = Utc::now();
        let mut q = sqlx::query(&query).bind(now).bind(order_idx);
        if let Some(name) = &input.name {
            q = q.bind(name);
        }
        if let Some(question) = &input.question {
            q = q.bind(question);
        }
        if let Some(answer) = &input.answer {
            q = q.bind(answer);
        }
        if let Some(verification) = &input.verification {
            q = q.bind(verification);
        }
        if let Some(hints) = &input.hints {
            q = q.bind(serde_json::to_string(hints)?);
        }
        if let Some(max_score) = input.max_score {
            q = q.bind(max_score);
        }
        q = q.bind(id);

        let mut tx = self.tx.lock().await;
        let result = q.execute(&mut **tx).await.map_err(StorageError::Sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("task '{id}'")));
        }

        let row = sqlx::query("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_one(&mut **tx)
            .await
            .map_err(StorageError::Sqlx)?;
        row_to_task(&row)
    }

    async fn create_item(
        &self,
        group_id: &str,
        order_idx: i64,
        input: &TaskCreateInput,
    ) -> StorageResult<Task> {
        let task_id = generate_id();
        let now = Utc::now();
        let verification = input.verification.unwrap_or_default();
        let hints = input.hints.clone().unwrap_or_default();

        debug!("Creating task: {} for group: {}", task_id, group_id);

        let mut tx = self.tx.lock().await;
        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, group_id, name, question, answer, verification,
                hints, max_score, order_idx, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task_id)
        .bind(group_id)
        .bind(&input.name)
        .bind(&input.question)
        .bind(&input.answer)
        .bind(verification)
        .bind(serde_json::to_string(&hints)?)
        .bind(input.max_score.unwrap_or(0))
        .bind(order_idx)
        .bind(now)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(StorageError::Sqlx)?;

        let row = sqlx::query("SELECT * FROM tasks WHERE id = ?")
            .bind(&task_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(StorageError::Sqlx)?;
        row_to_task(&row)
    }
}

fn row_to_quest(row: &SqliteRow) -> StorageResult<Quest> {
    Ok(Quest {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_task_group(row: &SqliteRow) -> StorageResult<TaskGroup> {
    Ok(TaskGroup {
        id: row.try_get("id")?,
        quest_id: row.try_get("quest_id")?,
        name: row.try_get("name")?,
        pub_time: row.try_get("pub_time")?,
        order_idx: row.try_get("order_idx")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_task(row: &SqliteRow) -> StorageResult<Task> {
    Ok(Task {
        id: row.try_get("id")?,
        group_id: row.try_get("group_id")?,
        name: row.try_get("name")?,
        question: row.try_get("question")?,
        answer: row.try_get("answer")?,
        verification: row.try_get("verification")?,
        hints: match row.try_get::<Option<String>, _>("hints")? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        },
        max_score: row.try_get("max_score")?,
        order_idx: row.try_get("order_idx")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
