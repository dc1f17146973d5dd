use std::fmt;

use crate::model::{ArticleId, HistoryId, MAX_COUNT};

/// Payload could not be turned into a usable scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No LOT, REF or GTIN could be extracted. The operator should re-scan.
    NoIdentifyingField,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoIdentifyingField => write!(f, "no LOT, REF or GTIN found in payload"),
        }
    }
}

impl std::error::Error for DecodeError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// Decoded identity has no row in the inventory list.
    ArticleNotFound { lot: String, reference: String },
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArticleNotFound { lot, reference } => {
                write!(f, "article not in list (LOT '{lot}', REF '{reference}')")
            }
        }
    }
}

impl std::error::Error for MatchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoError {
    /// History is empty.
    NoScansToUndo,
    /// The most recent entry points at an article that no longer exists.
    ArticleNotFound { entry_id: HistoryId, article_id: ArticleId },
}

impl fmt::Display for UndoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoScansToUndo => write!(f, "no scans to undo"),
            Self::ArticleNotFound { entry_id, article_id } => {
                write!(f, "history entry {entry_id}: article {article_id} not found")
            }
        }
    }
}

impl std::error::Error for UndoError {}

/// Rejected input. Raised before any mutation; the article is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NegativeCount { field: &'static str, value: i64 },
    CountTooLarge { field: &'static str, value: i64 },
    UnknownArticle(ArticleId),
    DuplicateArticleId(ArticleId),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeCount { field, value } => {
                write!(f, "{field} must not be negative, got {value}")
            }
            Self::CountTooLarge { field, value } => {
                write!(f, "{field} must not exceed {MAX_COUNT}, got {value}")
            }
            Self::UnknownArticle(id) => write!(f, "unknown article {id}"),
            Self::DuplicateArticleId(id) => write!(f, "duplicate article id {id}"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Failure anywhere in decode → match → apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    Decode(DecodeError),
    Match(MatchError),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "scan error: {e}"),
            Self::Match(e) => write!(f, "scan error: {e}"),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            Self::Match(e) => Some(e),
        }
    }
}

impl From<DecodeError> for ScanError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<MatchError> for ScanError {
    fn from(e: MatchError) -> Self {
        Self::Match(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// TOML parse / deserialization error.
    Parse(String),
    /// Out-of-range or empty setting.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::Validation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound(u64),
    /// The write was refused before anything changed.
    Rejected(ValidationError),
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "record {id} not found"),
            Self::Rejected(e) => write!(f, "store rejected write: {e}"),
            Self::Backend(msg) => write!(f, "store error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Rejected(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(e: ValidationError) -> Self {
        Self::Rejected(e)
    }
}
