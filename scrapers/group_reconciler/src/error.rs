use serde::Serialize;
use std::fmt;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                StoreError::UniqueViolation {
                    constraint: db.constraint().unwrap_or("unknown").to_string(),
                }
            }
            sqlx::Error::RowNotFound => StoreError::NotFound(err.to_string()),
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Snapshot is missing the group field '{0}'")]
    MissingGroupField(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Result report {0} not found")]
    ReportNotFound(String),
    #[error("Result import failed: {0}")]
    Upstream(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<reqwest::Error> for ImportError {
    fn from(err: reqwest::Error) -> Self {
        ImportError::Upstream(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IssueKind {
    NotFound,
    AmbiguousMatch,
    CategoryConflict,
    ConstraintRace,
    UpstreamUnavailable,
    /// A label lacks a field needed to create a row, e.g. a fixture without a date.
    IncompleteLabel,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Non-fatal problem reported alongside reconcile counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileIssue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub context: String,
    pub message: String,
}

impl ReconcileIssue {
    pub fn new(kind: IssueKind, context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            context: context.into(),
            message: message.into(),
        }
    }
}
