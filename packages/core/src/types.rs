// ABOUTME: Domain type definitions for quests, task groups, and tasks
// ABOUTME: Structures for entities, bulk-edit inputs, and answer verification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QuestStatus {
    Draft,
    Published,
    Finished,
}

impl Default for QuestStatus {
    fn default() -> Self {
        QuestStatus::Draft
    }
}

/// How a task answer is checked: automatically against the stored answer,
/// or manually by a quest moderator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VerificationType {
    Auto,
    Manual,
}

impl Default for VerificationType {
    fn default() -> Self {
        VerificationType::Auto
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: QuestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An ordered group of tasks inside a quest. `order_idx` is zero-based and
/// contiguous within the owning quest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskGroup {
    pub id: String,
    pub quest_id: String,
    pub name: String,
    pub pub_time: Option<DateTime<Utc>>,
    pub order_idx: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One task inside a task group. `order_idx` is zero-based and contiguous
/// within the owning group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub group_id: String,
    pub name: String,
    pub question: String,
    pub answer: Option<String>,
    pub verification: VerificationType,
    pub hints: Vec<String>,
    pub max_score: i64,
    pub order_idx: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestCreateInput {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<QuestStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskGroupCreateInput {
    pub name: String,
    pub pub_time: Option<DateTime<Utc>>,
}

/// Partial update of a task group; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskGroupUpdateInput {
    pub name: Option<String>,
    pub pub_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskCreateInput {
    pub name: String,
    pub question: String,
    pub answer: Option<String>,
    pub verification: Option<VerificationType>,
    pub hints: Option<Vec<String>>,
    pub max_score: Option<i64>,
}

/// Partial update of a task; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdateInput {
    pub name: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
    pub verification: Option<VerificationType>,
    pub hints: Option<Vec<String>>,
    pub max_score: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_type_defaults_to_auto() {
        assert_eq!(VerificationType::default(), VerificationType::Auto);
    }

    #[test]
    fn test_verification_type_serializes_lowercase() {
        let json = serde_json::to_string(&VerificationType::Manual).unwrap();
        assert_eq!(json, "\"manual\"");
    }

    #[test]
    fn test_quest_status_round_trip() {
        let json = serde_json::to_string(&QuestStatus::Published).unwrap();
        let back: QuestStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, QuestStatus::Published);
    }
}
