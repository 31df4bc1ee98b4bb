//! Error types for hydromate-core.
//!
//! The shake and reminder paths never fail; they degrade to "do nothing this
//! cycle". Errors here cover the ledger, the config file and user input.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config round-trips through `serde_json::Value` for dot-path access.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ledger errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("cannot open ledger at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("ledger migration failed: {0}")]
    MigrationFailed(String),

    /// Another process holds the write lock.
    #[error("Database is locked")]
    Locked,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("cannot write config {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Dot-path that names no leaf setting.
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Value that does not parse as the setting's type.
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("'{field}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        value: i64,
    },

    #[error("invalid '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == rusqlite::ErrorCode::DatabaseBusy
                    || failure.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                DatabaseError::Locked
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
