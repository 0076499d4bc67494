use thiserror::Error;

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(format!("JSON serialization error: {}", err))
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(format!("Database error: {}", err))
    }
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Key already exists: {0}")]
    DuplicateKey(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Integrity check failed for {result_id}: stored hash {stored}, recomputed {recomputed}")]
    Integrity {
        result_id: String,
        stored: String,
        recomputed: String,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Missing key field: {0}")]
    MissingKey(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid payload: {0}")]
    Validation(String),

    #[error("Transaction conflict on key: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    pub fn parse_at(key: &str, err: impl std::fmt::Display) -> Self {
        Self::Parse(format!("{}: {}", key, err))
    }

    /// Short machine-readable kind, used by the HTTP gateway.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateKey(_) => "duplicate_key",
            Self::NotFound(_) => "not_found",
            Self::Parse(_) => "parse",
            Self::Integrity { .. } => "integrity",
            Self::InvalidState(_) => "invalid_state",
            Self::MissingKey(_) => "missing_key",
            Self::InvalidKey(_) => "invalid_key",
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
        }
    }
}
