use thiserror::Error;

/// Coarse classification of [`CoreError`], used by callers to pick
/// exit codes and messages without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidTransition,
    Storage,
    Config,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{op}: {reason}")]
    Validation { op: &'static str, reason: String },

    #[error("{op}: {what} not found")]
    NotFound { op: &'static str, what: String },

    #[error("{op}: invalid transition for thought {id}: {reason}")]
    InvalidTransition {
        op: &'static str,
        id: i64,
        reason: String,
    },

    #[error("{op}: storage failure: {source}")]
    Storage {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Corrupt row in {table}.{column}: {detail}")]
    CorruptRow {
        table: &'static str,
        column: &'static str,
        detail: String,
    },

    #[error("Database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: u32, supported: u32 },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation { .. } => ErrorKind::Validation,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            CoreError::Storage { .. }
            | CoreError::CorruptRow { .. }
            | CoreError::SchemaTooNew { .. }
            | CoreError::Io(_) => ErrorKind::Storage,
            CoreError::Config(_) | CoreError::Json(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn validation(op: &'static str, reason: impl Into<String>) -> Self {
        CoreError::Validation {
            op,
            reason: reason.into(),
        }
    }

    pub(crate) fn thought_not_found(op: &'static str, id: i64) -> Self {
        CoreError::NotFound {
            op,
            what: format!("thought {id}"),
        }
    }
}

/// Attaches the failing operation's name to a raw SQLite error.
pub(crate) trait StorageContext<T> {
    fn during(self, op: &'static str) -> Result<T, CoreError>;
}

impl<T> StorageContext<T> for Result<T, rusqlite::Error> {
    fn during(self, op: &'static str) -> Result<T, CoreError> {
        self.map_err(|source| CoreError::Storage { op, source })
    }
}
