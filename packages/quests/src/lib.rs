// ABOUTME: Quest content management for Questline
// ABOUTME: Ordered-collection reconciliation engine, storage layer, and bulk content facade

pub mod content;
pub mod manager;
pub mod ordering;
pub mod storage;

pub use content::{GroupContent, QuestContent, TaskContent, TaskGroupWithTasks};
pub use manager::{QuestError, QuestResult, QuestService};
pub use ordering::{
    BulkRequest, CreateRequest, DeleteRequest, OrderedItem, OrderingError, OrderingResult,
    UpdateRequest,
};
pub use storage::OrderedStore;
