// ABOUTME: Quest service layer owning transactions around bulk operations
// ABOUTME: Entry points consumed by transport handlers; all-or-nothing semantics

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

use questline_core::{
    Quest, QuestCreateInput, Task, TaskCreateInput, TaskGroup, TaskGroupCreateInput,
    TaskGroupUpdateInput, TaskUpdateInput,
};
use questline_storage::StorageError;

use crate::content::{self, QuestContent, TaskGroupWithTasks};
use crate::ordering::{reconcile, BulkRequest, OrderingError};
use crate::storage::{QuestStorage, SqliteQuestTx};

/// Service errors. `Ordering(InvalidRequest)` is the client's fault
/// (transports map it to a 400-class status), `NotFound` variants map to
/// 404, everything else is internal.
#[derive(Error, Debug)]
pub enum QuestError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Ordering(#[from] OrderingError),
    #[error("Quest not found: {0}")]
    NotFound(String),
}

pub type QuestResult<T> = Result<T, QuestError>;

/// Quest management service. Bulk operations run fully inside one SQLite
/// transaction: the reconciliation either commits as a whole or rolls back
/// and leaves the collection untouched.
pub struct QuestService {
    pool: SqlitePool,
    quests: QuestStorage,
}

impl QuestService {
    pub fn new(pool: SqlitePool) -> Self {
        let quests = QuestStorage::new(pool.clone());
        Self { pool, quests }
    }

    pub async fn create_quest(&self, input: QuestCreateInput) -> QuestResult<Quest> {
        let quest = self.quests.create_quest(input).await?;
        info!("Created quest {}", quest.id);
        Ok(quest)
    }

    pub async fn get_quest(&self, quest_id: &str) -> QuestResult<Quest> {
        self.quests
            .get_quest(quest_id)
            .await?
            .ok_or_else(|| QuestError::NotFound(quest_id.to_string()))
    }

    pub async fn list_quests(&self) -> QuestResult<Vec<Quest>> {
        Ok(self.quests.list_quests().await?)
    }

    /// Committed task groups of a quest, ordered by index.
    pub async fn list_task_groups(&self, quest_id: &str) -> QuestResult<Vec<TaskGroup>> {
        Ok(self.quests.list_task_groups(quest_id).await?)
    }

    /// Committed tasks of a group, ordered by index.
    pub async fn list_tasks(&self, group_id: &str) -> QuestResult<Vec<Task>> {
        Ok(self.quests.list_tasks(group_id).await?)
    }

    pub async fn delete_quest(&self, quest_id: &str) -> QuestResult<()> {
        match self.quests.delete_quest(quest_id).await {
            Ok(()) => Ok(()),
            Err(StorageError::NotFound(_)) => Err(QuestError::NotFound(quest_id.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    /// Apply one bulk request against a quest's task groups.
    pub async fn bulk_update_task_groups(
        &self,
        quest_id: &str,
        request: &BulkRequest<TaskGroupCreateInput, TaskGroupUpdateInput>,
    ) -> QuestResult<Vec<TaskGroup>> {
        let tx = SqliteQuestTx::begin(&self.pool).await?;
        match reconcile(&tx, quest_id, request).await {
            Ok(groups) => {
                tx.commit().await?;
                info!(
                    "Reconciled {} task groups for quest {}",
                    groups.len(),
                    quest_id
                );
                Ok(groups)
            }
            Err(err) => {
                roll_back(tx).await;
                Err(err.into())
            }
        }
    }

    /// Apply one bulk request against a task group's tasks.
    pub async fn bulk_update_tasks(
        &self,
        group_id: &str,
        request: &BulkRequest<TaskCreateInput, TaskUpdateInput>,
    ) -> QuestResult<Vec<Task>> {
        let tx = SqliteQuestTx::begin(&self.pool).await?;
        match reconcile(&tx, group_id, request).await {
            Ok(tasks) => {
                tx.commit().await?;
                info!("Reconciled {} tasks for group {}", tasks.len(), group_id);
                Ok(tasks)
            }
            Err(err) => {
                roll_back(tx).await;
                Err(err.into())
            }
        }
    }

    /// Replace a quest's whole content (groups and tasks) with the document.
    pub async fn replace_quest_content(
        &self,
        quest_id: &str,
        document: &QuestContent,
    ) -> QuestResult<Vec<TaskGroupWithTasks>> {
        let tx = SqliteQuestTx::begin(&self.pool).await?;
        match content::replace_quest_content(&tx, quest_id, document).await {
            Ok(groups) => {
                tx.commit().await?;
                info!(
                    "Replaced content of quest {} with {} groups",
                    quest_id,
                    groups.len()
                );
                Ok(groups)
            }
            Err(err) => {
                roll_back(tx).await;
                Err(err.into())
            }
        }
    }
}

/// The original error is what the caller needs to see; a failing rollback
/// on top of it is only logged.
async fn roll_back(tx: SqliteQuestTx) {
    if let Err(err) = tx.rollback().await {
        warn!("Transaction rollback failed: {}", err);
    }
}
