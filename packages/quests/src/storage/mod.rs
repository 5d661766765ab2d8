// ABOUTME: Ordered-storage interface consumed by the reconciliation engine
// ABOUTME: Trait definition plus OrderedItem impls for task groups and tasks

use async_trait::async_trait;

use questline_core::{Task, TaskGroup};
use questline_storage::StorageResult;

use crate::ordering::OrderedItem;

pub mod sqlite;

pub use sqlite::{QuestStorage, SqliteQuestTx};

/// Storage seam for one ordered collection. Implementations must run inside
/// the caller's transaction: the engine persists phase by phase and relies
/// on a rollback to undo everything when a later phase fails.
#[async_trait]
pub trait OrderedStore<I: OrderedItem>: Send + Sync {
    type CreateFields: Send + Sync;
    type UpdateFields: Send + Sync;

    async fn container_exists(&self, container_id: &str) -> StorageResult<bool>;

    /// Items of one container, sorted by order index ascending.
    async fn list_items(&self, container_id: &str) -> StorageResult<Vec<I>>;

    async fn delete_item(&self, id: &str) -> StorageResult<()>;

    /// Apply field changes and the new order index, returning the updated row.
    async fn update_item(
        &self,
        id: &str,
        order_idx: i64,
        fields: &Self::UpdateFields,
    ) -> StorageResult<I>;

    /// Persist a new item at the given order index, returning the created row.
    async fn create_item(
        &self,
        container_id: &str,
        order_idx: i64,
        fields: &Self::CreateFields,
    ) -> StorageResult<I>;
}

impl OrderedItem for TaskGroup {
    fn id(&self) -> &str {
        &self.id
    }
    fn order_idx(&self) -> i64 {
        self.order_idx
    }
}

impl OrderedItem for Task {
    fn id(&self) -> &str {
        &self.id
    }
    fn order_idx(&self) -> i64 {
        self.order_idx
    }
}
