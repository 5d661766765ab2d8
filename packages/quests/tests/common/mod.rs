// ABOUTME: Shared helpers for questline-quests integration tests
// ABOUTME: In-memory database setup and bulk-request builders

use questline_core::{
    QuestCreateInput, TaskCreateInput, TaskGroupCreateInput, TaskGroupUpdateInput, TaskUpdateInput,
};
use questline_quests::{CreateRequest, DeleteRequest, QuestService, UpdateRequest};

/// Fresh service over a private in-memory database
pub async fn service() -> QuestService {
    let pool = questline_storage::connect_memory()
        .await
        .expect("in-memory database");
    QuestService::new(pool)
}

pub async fn seed_quest(service: &QuestService, name: &str) -> String {
    service
        .create_quest(QuestCreateInput {
            name: name.to_string(),
            ..Default::default()
        })
        .await
        .expect("create quest")
        .id
}

pub fn delete(id: &str) -> DeleteRequest {
    DeleteRequest { id: id.to_string() }
}

pub fn create_group(name: &str, order_idx: i64) -> CreateRequest<TaskGroupCreateInput> {
    CreateRequest {
        order_idx,
        fields: TaskGroupCreateInput {
            name: name.to_string(),
            pub_time: None,
        },
    }
}

pub fn move_group(id: &str, order_idx: i64) -> UpdateRequest<TaskGroupUpdateInput> {
    UpdateRequest {
        id: id.to_string(),
        order_idx,
        fields: TaskGroupUpdateInput::default(),
    }
}

pub fn create_task(name: &str, order_idx: i64) -> CreateRequest<TaskCreateInput> {
    CreateRequest {
        order_idx,
        fields: TaskCreateInput {
            name: name.to_string(),
            question: format!("question for {name}"),
            ..Default::default()
        },
    }
}

pub fn move_task(id: &str, order_idx: i64) -> UpdateRequest<TaskUpdateInput> {
    UpdateRequest {
        id: id.to_string(),
        order_idx,
        fields: TaskUpdateInput::default(),
    }
}
