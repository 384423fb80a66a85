//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Count/ledger domain rule violations            │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  tally-engine errors (boundary)                                        │
//! │  └── EngineError      - What collaborators see (with ErrorCode)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → EngineError → Caller    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (count id, product id, status)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to one caller-facing failure kind

use thiserror::Error;

use crate::types::CountStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Count-domain rule violations.
///
/// These errors represent business rule failures: operating on a missing
/// record, counting the same product twice, or attempting an operation the
/// session's status does not permit.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Stock count session cannot be found.
    #[error("Stock count not found: {0}")]
    CountNotFound(String),

    /// Count item cannot be found within its session.
    #[error("Count item not found: {0}")]
    ItemNotFound(String),

    /// Warehouse cannot be found.
    #[error("Warehouse not found: {0}")]
    WarehouseNotFound(String),

    /// Product cannot be found in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A product already has a line in the session.
    ///
    /// ## When This Occurs
    /// - `add_item` for a product_id already present in the count
    ///
    /// Bulk generation does NOT raise this: it silently skips existing
    /// products and reports them in `GenerateReport::skipped`.
    #[error("Product {product_id} is already counted in stock count {count_id}")]
    DuplicateProduct {
        count_id: String,
        product_id: String,
    },

    /// The session's status does not permit the requested operation.
    ///
    /// ## When This Occurs
    /// - Editing items after `complete`
    /// - `validate` before `complete`
    /// - Any transition out of `validated` or `cancelled`
    #[error("Stock count {count_id} is {status}, cannot {operation}")]
    InvalidCountStatus {
        count_id: String,
        status: CountStatus,
        operation: &'static str,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::DuplicateProduct {
            count_id: "c-1".to_string(),
            product_id: "p-9".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Product p-9 is already counted in stock count c-1"
        );

        let err = CoreError::InvalidCountStatus {
            count_id: "c-1".to_string(),
            status: CountStatus::Validated,
            operation: "add item",
        };
        assert_eq!(err.to_string(), "Stock count c-1 is validated, cannot add item");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "warehouse_id".to_string(),
        };
        assert_eq!(err.to_string(), "warehouse_id is required");

        let err = ValidationError::MustBeNonNegative {
            field: "counted_quantity".to_string(),
        };
        assert_eq!(err.to_string(), "counted_quantity must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "warehouse_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
