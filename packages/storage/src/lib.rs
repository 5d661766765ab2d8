// ABOUTME: Data layer and persistence for Questline
// ABOUTME: Storage error taxonomy and SQLite connection management

use thiserror::Error;

pub mod db;

pub use db::{connect, connect_memory, connect_with_path, init_schema};

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Not found: {0}")]
    NotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;
