// ABOUTME: Bulk quest-content facade
// ABOUTME: Translates a full quest document into primitive reconciliation requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use questline_core::{
    Task, TaskCreateInput, TaskGroup, TaskGroupCreateInput, TaskGroupUpdateInput, TaskUpdateInput,
    VerificationType, MAX_TASK_HINTS,
};

use crate::ordering::{
    invalid_if, reconcile, BulkRequest, CreateRequest, DeleteRequest, OrderingResult,
};
use crate::storage::OrderedStore;

/// A human-authored full quest definition: ordered groups, each with
/// ordered tasks. Positions are implied by document order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestContent {
    pub groups: Vec<GroupContent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupContent {
    pub name: String,
    pub pub_time: Option<DateTime<Utc>>,
    pub tasks: Vec<TaskContent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskContent {
    pub name: String,
    pub question: String,
    pub answer: Option<String>,
    pub verification: Option<VerificationType>,
    pub hints: Vec<String>,
    pub max_score: Option<i64>,
}

/// One committed group together with its committed tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskGroupWithTasks {
    pub group: TaskGroup,
    pub tasks: Vec<Task>,
}

/// Replace a quest's entire content with the given document.
///
/// This is a full replace, not a diff: every existing top-level group is
/// deleted (tasks cascade with their group) and the document is re-created
/// in order, one reconciliation for the groups and one per group for its
/// tasks. Runs inside the caller's transaction like every bulk operation.
pub async fn replace_quest_content<S>(
    store: &S,
    quest_id: &str,
    content: &QuestContent,
) -> OrderingResult<Vec<TaskGroupWithTasks>>
where
    S: OrderedStore<TaskGroup, CreateFields = TaskGroupCreateInput, UpdateFields = TaskGroupUpdateInput>
        + OrderedStore<Task, CreateFields = TaskCreateInput, UpdateFields = TaskUpdateInput>,
{
    invalid_if(validate_content(content))?;

    debug!(
        "Replacing content of quest {}: {} groups",
        quest_id,
        content.groups.len()
    );

    let existing: Vec<TaskGroup> = OrderedStore::<TaskGroup>::list_items(store, quest_id).await?;

    let group_request = BulkRequest {
        delete: existing
            .iter()
            .map(|group| DeleteRequest {
                id: group.id.clone(),
            })
            .collect(),
        update: Vec::new(),
        create: content
            .groups
            .iter()
            .enumerate()
            .map(|(position, group)| CreateRequest {
                order_idx: position as i64,
                fields: TaskGroupCreateInput {
                    name: group.name.clone(),
                    pub_time: group.pub_time,
                },
            })
            .collect(),
    };
    let groups: Vec<TaskGroup> = reconcile(store, quest_id, &group_request).await?;

    let mut result = Vec::with_capacity(groups.len());
    for (group, document) in groups.into_iter().zip(&content.groups) {
        let task_request = BulkRequest {
            delete: Vec::new(),
            update: Vec::new(),
            create: document
                .tasks
                .iter()
                .enumerate()
                .map(|(position, task)| CreateRequest {
                    order_idx: position as i64,
                    fields: TaskCreateInput {
                        name: task.name.clone(),
                        question: task.question.clone(),
                        answer: task.answer.clone(),
                        verification: Some(task.verification.unwrap_or_default()),
                        hints: Some(task.hints.clone()),
                        max_score: task.max_score,
                    },
                })
                .collect(),
        };
        let tasks: Vec<Task> = reconcile(store, &group.id, &task_request).await?;
        result.push(TaskGroupWithTasks { group, tasks });
    }

    Ok(result)
}

/// Business-rule validation of the document itself; storage is not touched.
fn validate_content(content: &QuestContent) -> Vec<String> {
    let mut errors = Vec::new();
    for (group_position, group) in content.groups.iter().enumerate() {
        if group.name.trim().is_empty() {
            errors.push(format!("group at position {group_position} has an empty name"));
        }
        for (task_position, task) in group.tasks.iter().enumerate() {
            if task.hints.len() > MAX_TASK_HINTS {
                errors.push(format!(
                    "task '{}' at position {task_position} of group {group_position} carries {} hints (limit {MAX_TASK_HINTS})",
                    task.name,
                    task.hints.len()
                ));
            }
        }
    }
    errors
}
