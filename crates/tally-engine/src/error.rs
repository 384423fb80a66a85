//! # Engine Error Type
//!
//! Unified error type for engine operations.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Error Flow in Tally                                │
//! │                                                                         │
//! │  Caller (UI / automation)          Engine                               │
//! │  ────────────────────────          ──────                               │
//! │                                                                         │
//! │  engine.add_item(...)                                                   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Engine Operation                                                │  │
//! │  │  Result<T, EngineError>                                          │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Validation failed? ── CoreError::Validation ──────┐            │  │
//! │  │  Status illegal?    ── CoreError::InvalidCountStatus│           │  │
//! │  │  Duplicate line?    ── CoreError::DuplicateProduct ─┼─► EngineError │
//! │  │  Ledger write died? ── EngineError::Ledger ─────────┘            │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ───────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  The caller branches on `error.code()`:                                │
//! │    INVALID_STATE → "this inventory can no longer be edited"            │
//! │    LEDGER_ERROR  → "adjustments could not be applied, nothing changed" │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All checks run before any mutation; a failed operation leaves no partial
//! writes (its transaction rolls back on drop).

use serde::Serialize;
use thiserror::Error;

use tally_core::CoreError;
use tally_db::DbError;

/// Error type for all engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Domain rule violation (validation, not-found, conflict, status).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Infrastructure failure in the session/ledger store.
    #[error(transparent)]
    Db(#[from] DbError),

    /// An adjustment could not be committed to the stock ledger during
    /// `validate`. The whole validation transaction has been rolled back:
    /// the count is still `completed` and no movement was written.
    #[error("Ledger adjustment failed for stock count {count_id}: {source}")]
    Ledger {
        count_id: String,
        #[source]
        source: DbError,
    },
}

/// Machine-readable error codes for callers and transport bindings.
///
/// ## Usage
/// ```rust,ignore
/// match engine.validate(&id).await {
///     Err(e) if e.code() == ErrorCode::InvalidState => retry_later(),
///     Err(e) if e.code() == ErrorCode::LedgerError => alert_ops(e),
///     other => other?,
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed or missing input fields, negative quantities (400)
    InvalidInput,

    /// Unknown session/item/product/warehouse (404)
    NotFound,

    /// Duplicate product line in a session (409)
    Conflict,

    /// Operation not legal for the session's current status (422)
    InvalidState,

    /// Adjustment commit failed in the stock ledger (502)
    LedgerError,

    /// Session/ledger store infrastructure failure (500)
    DatabaseError,
}

impl EngineError {
    /// Maps this error onto the caller-facing taxonomy.
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Core(core) => match core {
                CoreError::Validation(_) => ErrorCode::InvalidInput,
                CoreError::CountNotFound(_)
                | CoreError::ItemNotFound(_)
                | CoreError::WarehouseNotFound(_)
                | CoreError::ProductNotFound(_) => ErrorCode::NotFound,
                CoreError::DuplicateProduct { .. } => ErrorCode::Conflict,
                CoreError::InvalidCountStatus { .. } => ErrorCode::InvalidState,
            },
            EngineError::Db(db) => match db {
                DbError::NotFound { .. } => ErrorCode::NotFound,
                DbError::UniqueViolation { .. } => ErrorCode::Conflict,
                _ => ErrorCode::DatabaseError,
            },
            EngineError::Ledger { .. } => ErrorCode::LedgerError,
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{CountStatus, ValidationError};

    #[test]
    fn test_code_mapping() {
        let err: EngineError = CoreError::Validation(ValidationError::Required {
            field: "warehouse_id".to_string(),
        })
        .into();
        assert_eq!(err.code(), ErrorCode::InvalidInput);

        let err: EngineError = CoreError::CountNotFound("c-1".to_string()).into();
        assert_eq!(err.code(), ErrorCode::NotFound);

        let err: EngineError = CoreError::DuplicateProduct {
            count_id: "c-1".to_string(),
            product_id: "p-1".to_string(),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::Conflict);

        let err: EngineError = CoreError::InvalidCountStatus {
            count_id: "c-1".to_string(),
            status: CountStatus::Validated,
            operation: "add item",
        }
        .into();
        assert_eq!(err.code(), ErrorCode::InvalidState);

        let err = EngineError::Ledger {
            count_id: "c-1".to_string(),
            source: DbError::QueryFailed("disk I/O error".to_string()),
        };
        assert_eq!(err.code(), ErrorCode::LedgerError);

        let err: EngineError = DbError::PoolExhausted.into();
        assert_eq!(err.code(), ErrorCode::DatabaseError);
    }

    #[test]
    fn test_ledger_error_keeps_underlying_failure() {
        let err = EngineError::Ledger {
            count_id: "c-1".to_string(),
            source: DbError::QueryFailed("disk I/O error".to_string()),
        };
        assert!(err.to_string().contains("c-1"));
        assert!(err.to_string().contains("disk I/O error"));
    }

    #[test]
    fn test_error_code_serialization() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::InvalidState).unwrap(),
            "\"INVALID_STATE\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorCode::LedgerError).unwrap(),
            "\"LEDGER_ERROR\""
        );
    }
}
