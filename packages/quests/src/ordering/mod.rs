// ABOUTME: Ordered-collection reconciliation engine
// ABOUTME: Resolves bulk create/update/delete requests into a contiguous 0..n-1 ordering

use serde::{Deserialize, Serialize};
use thiserror::Error;

use questline_storage::StorageError;

pub mod permutation;
pub mod reconcile;
pub mod union_find;

pub use reconcile::reconcile;

/// One slot in an ordered container. Implemented by task groups (ordered
/// within a quest) and tasks (ordered within a group).
pub trait OrderedItem {
    fn id(&self) -> &str;
    fn order_idx(&self) -> i64;
}

/// A single desired index move, derived from an update request whose target
/// index differs from the item's current one. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderChange {
    pub prev: usize,
    pub next: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest<U> {
    pub id: String,
    pub order_idx: i64,
    pub fields: U,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequest<C> {
    pub order_idx: i64,
    pub fields: C,
}

/// One bulk operation against one ordered container: deletions, updates
/// (including reorders), and creations, applied together or not at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkRequest<C, U> {
    #[serde(default)]
    pub delete: Vec<DeleteRequest>,
    #[serde(default)]
    pub update: Vec<UpdateRequest<U>>,
    #[serde(default)]
    pub create: Vec<CreateRequest<C>>,
}

impl<C, U> Default for BulkRequest<C, U> {
    fn default() -> Self {
        Self {
            delete: Vec::new(),
            update: Vec::new(),
            create: Vec::new(),
        }
    }
}

/// Reconciliation errors
#[derive(Error, Debug)]
pub enum OrderingError {
    /// The container itself does not exist.
    #[error("container '{0}' not found")]
    ContainerNotFound(String),
    /// Caller-supplied request is inconsistent; carries every cause found in
    /// the failing phase, joined with "; ".
    #[error("invalid bulk request: {0}")]
    InvalidRequest(String),
    /// The permutation invariant was violated mid-algorithm. Indicates
    /// corrupted stored ordering or a broken edge set, never valid input.
    #[error("order permutation corrupted: {0}")]
    Corrupted(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type OrderingResult<T> = Result<T, OrderingError>;

/// Collapse a phase's accumulated validation errors into a single
/// `InvalidRequest`, or pass if the phase found none.
pub(crate) fn invalid_if(errors: Vec<String>) -> OrderingResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(OrderingError::InvalidRequest(errors.join("; ")))
    }
}
