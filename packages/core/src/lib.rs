// ABOUTME: Core types, constants, and utilities for Questline
// ABOUTME: Foundational package shared across all Questline packages

pub mod constants;
pub mod types;
pub mod utils;

// Re-export main types
pub use types::{
    Quest, QuestCreateInput, QuestStatus, Task, TaskCreateInput, TaskGroup, TaskGroupCreateInput,
    TaskGroupUpdateInput, TaskUpdateInput, VerificationType,
};

// Re-export constants
pub use constants::{database_path, questline_dir, MAX_TASK_HINTS};

// Re-export utilities
pub use utils::generate_id;
